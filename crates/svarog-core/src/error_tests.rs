//! Tests for the `error` module

use super::error::Error;

#[test]
fn test_error_codes_are_stable() {
    let err = Error::DimensionMismatch {
        expected: 4,
        actual: 3,
    };
    assert_eq!(err.code(), "SVAROG-001");
    assert_eq!(Error::VertexNotFound("x".into()).code(), "SVAROG-002");
    assert_eq!(Error::UniqueViolation("x".into()).code(), "SVAROG-003");
}

#[test]
fn test_message_carries_code_prefix() {
    let err = Error::DimensionMismatch {
        expected: 4,
        actual: 3,
    };
    let message = err.to_string();
    assert!(message.starts_with("[SVAROG-001]"));
    assert!(message.contains("expected 4"));
    assert!(message.contains("got 3"));
}

#[test]
fn test_recoverability() {
    assert!(Error::Storage("disk".into()).is_recoverable());
    assert!(Error::UniqueViolation("x".into()).is_recoverable());
    assert!(!Error::Internal("bug".into()).is_recoverable());
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: Error = io.into();
    assert_eq!(err.code(), "SVAROG-009");
}
