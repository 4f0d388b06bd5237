//! Login pipeline driver
//!
//! Runs configured login modules in order and decides the overall outcome
//! from their control flags:
//!
//! - `required`: must succeed; later stages still run
//! - `requisite`: must succeed; a failure stops the pipeline
//! - `sufficient`: a success stops the pipeline unless a required stage
//!   already failed; a failure is ignored
//! - `optional`: ignored
//!
//! The attempt succeeds when no required or requisite stage failed and at
//! least one stage succeeded. Every stage is then committed in order;
//! otherwise every stage is aborted and no subject is produced.
//!
//! A pipeline serves one caller. Build one per attempt; modules are cheap.

use crate::auth::caller_identity::{CallerIdentityLoginModule, MODULE_CODE};
use crate::auth::{AmbientIdentityContext, LoginError, LoginModule, SharedState, Subject};
use crate::config::{Config, ConfigError, ModuleConfig};
use crate::metrics;
use thiserror::Error;

pub use crate::config::ControlFlag;

/// Codes of the login modules this crate can build from configuration
pub const REGISTERED_MODULES: &[&str] = &[MODULE_CODE];

/// Whether `code` names a registered login module
pub fn is_registered(code: &str) -> bool {
    REGISTERED_MODULES.contains(&code)
}

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown login module: {0}")]
    UnknownModule(String),

    #[error("Login module '{code}' failed: {source}")]
    Login {
        code: &'static str,
        #[source]
        source: LoginError,
    },

    #[error("Authentication failed: {0}")]
    Failed(String),

    #[error("Pipeline already holds an authenticated subject")]
    AlreadyLoggedIn,
}

/// Build a login module for one attempt from its configuration
pub fn create_module(config: &ModuleConfig) -> Result<Box<dyn LoginModule>, PipelineError> {
    match config.code.as_str() {
        MODULE_CODE => Ok(Box::new(CallerIdentityLoginModule::initialize(
            &config.options,
        ))),
        other => Err(PipelineError::UnknownModule(other.to_string())),
    }
}

struct Stage {
    flag: ControlFlag,
    module: Box<dyn LoginModule>,
}

/// Sequential driver over a list of login modules
#[derive(Default)]
pub struct LoginPipeline {
    stages: Vec<Stage>,
    shared: SharedState,
    subject: Option<Subject>,
}

impl LoginPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pipeline with fresh modules for every configured stage
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        config.validate()?;
        let mut pipeline = Self::new();
        for module in &config.modules {
            pipeline = pipeline.with_stage(module.flag, create_module(module)?);
        }
        Ok(pipeline)
    }

    /// Append a stage
    #[must_use]
    pub fn with_stage(mut self, flag: ControlFlag, module: Box<dyn LoginModule>) -> Self {
        self.stages.push(Stage { flag, module });
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Subject of the last successful login
    pub fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    /// Shared state of the current attempt
    pub fn shared_state(&self) -> &SharedState {
        &self.shared
    }

    /// Run one authentication attempt for the caller in `ambient`
    #[tracing::instrument(name = "pipeline.login", skip_all, fields(stages = self.stages.len()))]
    pub fn login(
        &mut self,
        ambient: &dyn AmbientIdentityContext,
    ) -> Result<&Subject, PipelineError> {
        if self.subject.is_some() {
            return Err(PipelineError::AlreadyLoggedIn);
        }
        if self.stages.is_empty() {
            return Err(PipelineError::Failed("no login modules configured".into()));
        }

        self.shared = SharedState::new();
        let mut first_error: Option<PipelineError> = None;
        let mut any_success = false;

        for stage in &mut self.stages {
            let code = stage.module.code();
            let (ok, error) = match stage.module.login(ambient, &mut self.shared) {
                Ok(ok) => (ok, None),
                Err(source) => {
                    tracing::warn!(module = code, error = %source, "Login module failed");
                    (false, Some(PipelineError::Login { code, source }))
                }
            };
            let failure = || {
                error.unwrap_or_else(|| PipelineError::Failed(format!("{} rejected login", code)))
            };

            match stage.flag {
                ControlFlag::Required => {
                    if ok {
                        any_success = true;
                    } else if first_error.is_none() {
                        first_error = Some(failure());
                    }
                }
                ControlFlag::Requisite => {
                    if ok {
                        any_success = true;
                    } else {
                        first_error.get_or_insert_with(failure);
                        break;
                    }
                }
                ControlFlag::Sufficient => {
                    if ok && first_error.is_none() {
                        any_success = true;
                        break;
                    }
                }
                ControlFlag::Optional => {
                    any_success |= ok;
                }
            }
        }

        if first_error.is_none() && !any_success {
            first_error = Some(PipelineError::Failed("no login module succeeded".into()));
        }

        if let Some(err) = first_error {
            self.abort_all();
            metrics::record_pipeline_outcome(false);
            return Err(err);
        }

        let mut subject = Subject::new();
        let mut commit_error = None;
        for stage in &mut self.stages {
            if let Err(source) = stage.module.commit(&mut self.shared, &mut subject) {
                let code = stage.module.code();
                tracing::warn!(module = code, error = %source, "Commit failed");
                commit_error = Some(PipelineError::Login { code, source });
                break;
            }
        }
        if let Some(err) = commit_error {
            self.abort_all();
            metrics::record_pipeline_outcome(false);
            return Err(err);
        }

        tracing::info!(
            principals = subject.principals().len(),
            credentials = subject.credentials().len(),
            "Login pipeline succeeded"
        );
        metrics::record_pipeline_outcome(true);
        Ok(self.subject.insert(subject))
    }

    /// Remove every stage's contribution and drop the subject
    pub fn logout(&mut self) -> Result<(), PipelineError> {
        let Some(mut subject) = self.subject.take() else {
            return Ok(());
        };
        for stage in &mut self.stages {
            stage
                .module
                .logout(&mut subject)
                .map_err(|source| PipelineError::Login {
                    code: stage.module.code(),
                    source,
                })?;
        }
        self.shared = SharedState::new();
        Ok(())
    }

    fn abort_all(&mut self) {
        for stage in &mut self.stages {
            if let Err(e) = stage.module.abort() {
                tracing::warn!(module = stage.module.code(), error = %e, "Abort failed");
            }
        }
    }
}
