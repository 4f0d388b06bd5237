//! Caller Identity - run a login pipeline for a given caller
//!
//! Loads a pipeline definition, runs one authentication attempt against the
//! supplied ambient caller and prints the resulting subject. Secrets are
//! never printed.

use anyhow::Context;
use caller_identity::auth::{Role, RunAsIdentity, SecurityAssociation, SimplePrincipal};
use caller_identity::{config::Config, telemetry, LoginPipeline};
use clap::Parser;
use secrecy::SecretString;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Caller Identity - propagate the calling principal to resource connections
#[derive(Parser, Debug)]
#[command(name = "caller-identity")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to pipeline configuration file
    #[arg(short, long, default_value = "pipeline.yaml")]
    config: PathBuf,

    /// Name of the calling principal (no caller when omitted)
    #[arg(long)]
    caller: Option<String>,

    /// Credential of the calling principal
    #[arg(long, env = "CALLER_IDENTITY_CALLER_SECRET", hide_env_values = true)]
    caller_secret: Option<String>,

    /// Run-as roles active for the call, comma separated
    #[arg(long, value_delimiter = ',')]
    run_as: Vec<String>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Print metrics after the attempt
    #[arg(long)]
    metrics: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let mut logging = config.logging.clone();
    if let Some(level) = &args.log_level {
        logging.level = level.clone();
    }
    telemetry::init_subscriber(&logging)?;

    info!("Starting Caller Identity v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded configuration from {:?}", args.config);

    let mut ambient = SecurityAssociation::new();
    ambient.set_principal(args.caller.as_deref().map(SimplePrincipal::new));
    ambient.set_credential(args.caller_secret.as_deref().map(SecretString::from));
    if !args.run_as.is_empty() {
        let roles = args.run_as.iter().map(|r| Role::new(r.trim()));
        ambient.push_run_as(RunAsIdentity::new("run-as", roles));
    }

    let mut pipeline = LoginPipeline::from_config(&config)?;
    let code = match pipeline.login(&ambient) {
        Ok(subject) => {
            println!("{}", serde_json::to_string_pretty(&subject.summary())?);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Authentication failed");
            eprintln!("authentication failed: {}", e);
            ExitCode::FAILURE
        }
    };

    if args.metrics {
        print!("{}", caller_identity::metrics::gather_text());
    }

    Ok(code)
}
