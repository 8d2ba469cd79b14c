
    use super::*;

    fn config() -> DaemonConfig {
        DaemonConfig {
            state_dir: PathBuf::from("/tmp/browserd-test"),
            grace_period_ms: 1000,
            restart_delay_ms: 1000,
        }
    }

    #[test]
    fn test_duration_getters() {
        let config = DaemonConfig {
            grace_period_ms: 250,
            restart_delay_ms: 75,
            ..config()
        };
        assert_eq!(config.grace_period(), Duration::from_millis(250));
        assert_eq!(config.restart_delay(), Duration::from_millis(75));
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_grace_period() {
        let config = DaemonConfig {
            grace_period_ms: 0,
            ..config()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("grace_period_ms"));
    }

    #[test]
    fn test_validate_empty_state_dir() {
        let config = DaemonConfig {
            state_dir: PathBuf::new(),
            ..config()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("state_dir"));
    }

    #[test]
    fn test_zero_restart_delay_allowed() {
        let config = DaemonConfig {
            restart_delay_ms: 0,
            ..config()
        };
        assert!(config.validate().is_ok());
    }
