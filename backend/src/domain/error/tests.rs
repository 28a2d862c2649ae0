//! Tests for the error payload construction and serialisation.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn base_error() -> Error {
    Error::validation("bad")
}

#[rstest]
fn validation_constructor_sets_code(base_error: Error) {
    assert_eq!(base_error.code(), ErrorCode::ValidationError);
    assert_eq!(base_error.message(), "bad");
    assert!(base_error.details().is_none());
}

#[rstest]
#[case("")]
#[case("   ")]
fn try_new_rejects_empty_messages(#[case] message: &str) {
    let result = Error::try_new(ErrorCode::Conflict, message);
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
#[case(ErrorCode::NotFound, "not_found")]
#[case(ErrorCode::Unauthorized, "unauthorized")]
#[case(ErrorCode::InvalidStateTransition, "invalid_state_transition")]
#[case(ErrorCode::ValidationError, "validation_error")]
#[case(ErrorCode::Conflict, "conflict")]
#[case(ErrorCode::Timeout, "timeout")]
#[case(ErrorCode::InternalError, "internal_error")]
fn error_code_string_matches_serde(#[case] code: ErrorCode, #[case] expected: &str) {
    assert_eq!(code.as_str(), expected);
    let serialised = serde_json::to_value(code).expect("serialise code");
    assert_eq!(serialised, json!(expected));
}

#[rstest]
fn invalid_transition_lists_allowed_states() {
    let err = Error::invalid_transition(ScanAction::Print, PackageState::Collected);

    assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
    assert_eq!(
        err.details(),
        Some(&json!({
            "action": "print",
            "currentState": "collected",
            "allowedStates": ["pending", "submitted", "in_transit", "delivered"],
        }))
    );
}

#[rstest]
fn serialises_with_camel_case_and_skips_missing_details(base_error: Error) {
    let value = serde_json::to_value(&base_error).expect("serialise error");
    assert_eq!(value, json!({ "code": "validation_error", "message": "bad" }));
}

#[rstest]
fn deserialisation_rejects_blank_message() {
    let payload = json!({ "code": "conflict", "message": "  " });
    let result = serde_json::from_value::<Error>(payload);
    assert!(result.is_err());
}

#[rstest]
fn deserialisation_keeps_details() {
    let payload = json!({
        "code": "not_found",
        "message": "package PKG-1 not found",
        "details": { "packageCode": "PKG-1" }
    });
    let error: Error = serde_json::from_value(payload).expect("valid payload");
    assert_eq!(error.code(), ErrorCode::NotFound);
    assert_eq!(error.details(), Some(&json!({ "packageCode": "PKG-1" })));
}
