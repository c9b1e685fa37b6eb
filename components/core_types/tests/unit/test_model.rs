//! Unit tests for the shared data model

use core_types::{ConsoleLevel, ConsoleLog, FailureKind, Implementation, Library};

#[cfg(test)]
mod model_tests {
    use super::*;

    #[test]
    fn test_implementation_from_json() {
        let json = r#"{"id": "a1", "filename": "impl.ts", "content": "export const run = () => 1"}"#;
        let implementation: Implementation = serde_json::from_str(json).unwrap();
        assert_eq!(implementation, Implementation::new("a1", "impl.ts", "export const run = () => 1"));
    }

    #[test]
    fn test_library_without_url_uses_cdn() {
        let library: Library = serde_json::from_str(r#"{"name": "nanoid"}"#).unwrap();
        assert_eq!(library.resolved_url(), "https://esm.sh/nanoid");
    }

    #[test]
    fn test_console_log_matches_same_pair_only() {
        let entry = ConsoleLog {
            level: ConsoleLevel::Warn,
            message: "slow".to_string(),
            count: 1,
        };
        assert!(entry.matches(ConsoleLevel::Warn, "slow"));
        assert!(!entry.matches(ConsoleLevel::Log, "slow"));
        assert!(!entry.matches(ConsoleLevel::Warn, "fast"));
    }

    #[test]
    fn test_failure_kind_names() {
        assert_eq!(FailureKind::InvalidCode.as_str(), "INVALID_CODE");
        assert_eq!(FailureKind::ExecutionError.as_str(), "EXECUTION_ERROR");
        assert_eq!(FailureKind::Cancelled.as_str(), "CANCELLED");
    }
}
