//! Caller Identity Login Module Integration Tests
//!
//! Tests cover default fallback, ambient caller override, run-as role
//! propagation and failure of the ambient context.

#[cfg(test)]
mod tests {
    use caller_identity::auth::{
        AmbientIdentityContext, CallerIdentityLoginModule, ContextError, LoginError, LoginModule,
        ModuleState, Role, RunAsIdentity, SecurityAssociation, SharedState, SimplePrincipal,
        Subject, LOGIN_NAME_KEY,
    };
    use secrecy::SecretString;
    use std::collections::{BTreeSet, HashMap};

    // ========================================================================
    // Helpers
    // ========================================================================

    fn module(pairs: &[(&str, &str)]) -> CallerIdentityLoginModule {
        let options: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CallerIdentityLoginModule::initialize(&options)
    }

    fn run(
        module: &mut CallerIdentityLoginModule,
        ambient: &dyn AmbientIdentityContext,
    ) -> (SharedState, Subject) {
        let mut shared = SharedState::new();
        let mut subject = Subject::new();
        assert!(module.login(ambient, &mut shared).unwrap());
        assert!(module.commit(&mut shared, &mut subject).unwrap());
        (shared, subject)
    }

    fn admin_run_as() -> RunAsIdentity {
        RunAsIdentity::new("internal", [Role::new("admin")])
    }

    /// Context whose mechanism is broken
    struct BrokenContext;

    impl AmbientIdentityContext for BrokenContext {
        fn current_principal(&self) -> Result<Option<SimplePrincipal>, ContextError> {
            Err(ContextError::Corrupted("association stack underflow".into()))
        }

        fn current_credential(&self) -> Result<Option<SecretString>, ContextError> {
            Err(ContextError::Corrupted("association stack underflow".into()))
        }

        fn peek_run_as(&self) -> Result<Option<RunAsIdentity>, ContextError> {
            Err(ContextError::Corrupted("association stack underflow".into()))
        }
    }

    /// Context with a caller whose run-as lookup fails
    struct BrokenRunAs;

    impl AmbientIdentityContext for BrokenRunAs {
        fn current_principal(&self) -> Result<Option<SimplePrincipal>, ContextError> {
            Ok(Some(SimplePrincipal::new("alice")))
        }

        fn current_credential(&self) -> Result<Option<SecretString>, ContextError> {
            Ok(None)
        }

        fn peek_run_as(&self) -> Result<Option<RunAsIdentity>, ContextError> {
            Err(ContextError::Unavailable("run-as stack not bound".into()))
        }
    }

    // ========================================================================
    // TEST: Identity resolution
    // ========================================================================

    #[test]
    fn test_default_fallback_without_caller() {
        let mut m = module(&[("userName", "svc"), ("password", "p")]);
        let (shared, subject) = run(&mut m, &SecurityAssociation::new());

        let cred = subject.credential_for("svc").expect("credential for svc");
        assert_eq!(cred.expose_secret(), Some("p"));
        assert_eq!(shared.login_name(), Some("svc"));
        assert!(subject.principals().contains(&SimplePrincipal::new("svc")));
    }

    #[test]
    fn test_caller_overrides_principal_secret_falls_back() {
        let mut m = module(&[("userName", "svc"), ("password", "p")]);
        let (_, subject) = run(&mut m, &SecurityAssociation::for_caller("alice", None));

        let cred = subject.credential_for("alice").expect("credential for alice");
        assert_eq!(cred.expose_secret(), Some("p"));
        assert!(subject.credential_for("svc").is_none());
    }

    #[test]
    fn test_caller_overrides_principal_and_secret() {
        let mut m = module(&[("userName", "svc"), ("password", "p")]);
        let ambient = SecurityAssociation::for_caller("alice", Some(SecretString::from("secret2")));
        let (_, subject) = run(&mut m, &ambient);

        let cred = subject.credential_for("alice").expect("credential for alice");
        assert_eq!(cred.expose_secret(), Some("secret2"));
        assert_eq!(subject.credentials().len(), 1);
    }

    #[test]
    fn test_caller_secret_without_principal_still_overrides() {
        let mut m = module(&[("userName", "svc"), ("password", "p")]);
        let mut ambient = SecurityAssociation::new();
        ambient.set_credential(Some(SecretString::from("ambient-only")));
        let (_, subject) = run(&mut m, &ambient);

        let cred = subject.credential_for("svc").expect("credential for svc");
        assert_eq!(cred.expose_secret(), Some("ambient-only"));
    }

    #[test]
    fn test_no_defaults_and_no_caller() {
        let mut m = module(&[]);
        let (shared, subject) = run(&mut m, &SecurityAssociation::new());

        let cred = subject.credential_for("").expect("credential with empty name");
        assert!(!cred.has_secret());
        assert_eq!(shared.login_name(), Some(""));
    }

    // ========================================================================
    // TEST: Run-as roles
    // ========================================================================

    #[test]
    fn test_run_as_roles_propagated_when_enabled() {
        let mut m = module(&[("userName", "svc"), ("addRunAsRoles", "true")]);
        let ambient = SecurityAssociation::for_caller("alice", None).with_run_as(admin_run_as());
        let (_, subject) = run(&mut m, &ambient);

        let expected: BTreeSet<Role> = [Role::new("admin")].into_iter().collect();
        assert_eq!(subject.roles(), expected);
        assert!(m.role_sets().is_empty());
    }

    #[test]
    fn test_run_as_roles_not_propagated_when_disabled() {
        let mut m = module(&[("userName", "svc"), ("addRunAsRoles", "false")]);
        let ambient = SecurityAssociation::for_caller("alice", None).with_run_as(admin_run_as());
        let (_, subject) = run(&mut m, &ambient);

        assert!(subject.roles().is_empty());
        assert!(m.role_sets().is_empty());
        // Captured, just not granted
        assert!(m.resolved().unwrap().run_as_roles().is_some());
    }

    #[test]
    fn test_run_as_roles_merge_with_existing_grants() {
        let mut m = module(&[("addRunAsRoles", "TRUE")]);
        let ambient = SecurityAssociation::for_caller("alice", None).with_run_as(admin_run_as());
        let mut shared = SharedState::new();
        let mut subject = Subject::new();
        subject.add_roles(&[Role::new("reader")]);

        m.login(&ambient, &mut shared).unwrap();
        m.commit(&mut shared, &mut subject).unwrap();

        let roles = subject.roles();
        assert!(roles.contains(&Role::new("reader")));
        assert!(roles.contains(&Role::new("admin")));
    }

    #[test]
    fn test_no_run_as_capture_without_caller() {
        let mut m = module(&[("userName", "svc"), ("addRunAsRoles", "true")]);
        let ambient = SecurityAssociation::new().with_run_as(admin_run_as());
        let (_, subject) = run(&mut m, &ambient);

        assert!(m.resolved().unwrap().run_as_roles().is_none());
        assert!(subject.roles().is_empty());
    }

    #[test]
    fn test_peek_leaves_run_as_stack_intact() {
        let mut m = module(&[("addRunAsRoles", "true")]);
        let ambient = SecurityAssociation::for_caller("alice", None).with_run_as(admin_run_as());
        run(&mut m, &ambient);

        assert_eq!(ambient.run_as_depth(), 1);
    }

    // ========================================================================
    // TEST: Ambient context failures
    // ========================================================================

    #[test]
    fn test_context_failure_is_single_error_kind() {
        let mut m = module(&[("userName", "svc"), ("password", "p")]);
        let mut shared = SharedState::new();

        let err = m.login(&BrokenContext, &mut shared).unwrap_err();
        assert!(matches!(err, LoginError::ProcessingFailed { .. }));
        assert!(err.to_string().starts_with("Processing failed"));
    }

    #[test]
    fn test_run_as_failure_is_processing_failed() {
        let mut m = module(&[("addRunAsRoles", "true")]);
        let mut shared = SharedState::new();

        let err = m.login(&BrokenRunAs, &mut shared).unwrap_err();
        assert!(matches!(err, LoginError::ProcessingFailed { .. }));
        assert!(shared.login_name().is_none());
    }

    #[test]
    fn test_failed_login_then_abort_leaves_subject_empty() {
        let mut m = module(&[("userName", "svc"), ("password", "p")]);
        let mut shared = SharedState::new();
        let mut subject = Subject::new();

        assert!(m.login(&BrokenContext, &mut shared).is_err());
        assert!(!m.abort().unwrap());
        assert!(!m.commit(&mut shared, &mut subject).unwrap());

        assert!(subject.principals().is_empty());
        assert!(subject.credentials().is_empty());
        assert_eq!(m.state(), ModuleState::Aborted);
    }

    // ========================================================================
    // TEST: Shared state publication
    // ========================================================================

    #[test]
    fn test_commit_reasserts_login_name() {
        let mut m = module(&[("userName", "svc")]);
        let mut shared = SharedState::new();
        let mut subject = Subject::new();

        m.login(&SecurityAssociation::for_caller("alice", None), &mut shared)
            .unwrap();
        shared.put(LOGIN_NAME_KEY, "mallory");
        m.commit(&mut shared, &mut subject).unwrap();

        assert_eq!(m.resolved().unwrap().principal_name(), "alice");
        assert_eq!(shared.login_name(), Some("alice"));
        assert_eq!(m.identity(), Some(SimplePrincipal::new("alice")));
    }

    #[test]
    fn test_attempts_on_threads_are_independent() {
        let mut options = HashMap::new();
        options.insert("userName".to_string(), "svc".to_string());
        options.insert("password".to_string(), "p".to_string());
        let options = std::sync::Arc::new(
            caller_identity::config::CallerIdentityOptions::from_options(&options),
        );

        let handles: Vec<_> = ["alice", "bob", "carol"]
            .into_iter()
            .map(|caller| {
                let options = options.clone();
                std::thread::spawn(move || {
                    let mut m = CallerIdentityLoginModule::with_options(options);
                    let ambient = SecurityAssociation::for_caller(caller, None);
                    let mut shared = SharedState::new();
                    let mut subject = Subject::new();
                    m.login(&ambient, &mut shared).unwrap();
                    m.commit(&mut shared, &mut subject).unwrap();
                    (caller, subject)
                })
            })
            .collect();

        for handle in handles {
            let (caller, subject) = handle.join().unwrap();
            assert_eq!(subject.credentials().len(), 1);
            assert!(subject.credential_for(caller).is_some());
        }
    }
}
