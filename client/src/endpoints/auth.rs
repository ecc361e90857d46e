//! Account and session endpoints.

use serde_json::{Map, Value};

use super::require_text;
use crate::domain::{EndpointDescriptor, EndpointTable, OperationKey, ValidationError};

const MIN_PASSWORD_CHARS: usize = 8;

pub(super) fn table() -> EndpointTable {
    EndpointTable::new(
        "auth",
        vec![
            EndpointDescriptor::post(OperationKey::CreateSession, "/auth/login")
                .public()
                .validated_by(validate_login),
            EndpointDescriptor::post(OperationKey::RegisterAccount, "/auth/register")
                .public()
                .validated_by(validate_registration),
            EndpointDescriptor::get(OperationKey::GetCurrentUser, "/users/me"),
        ],
    )
}

fn validate_login(fields: &Map<String, Value>) -> Result<(), ValidationError> {
    require_text(fields, "username")?;
    require_text(fields, "password")?;
    Ok(())
}

fn validate_registration(fields: &Map<String, Value>) -> Result<(), ValidationError> {
    require_text(fields, "username")?;
    let email = require_text(fields, "email")?;
    if !looks_like_email(email) {
        return Err(ValidationError::for_field(
            "email",
            "email must be a valid address",
        ));
    }
    let password = require_text(fields, "password")?;
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ValidationError::for_field(
            "password",
            format!("password must be at least {MIN_PASSWORD_CHARS} characters"),
        ));
    }
    Ok(())
}

/// `local@domain.tld` with no whitespace.
fn looks_like_email(candidate: &str) -> bool {
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !candidate.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[rstest]
    #[case("ada@example.com", true)]
    #[case("ada@example", false)]
    #[case("@example.com", false)]
    #[case("ada lovelace@example.com", false)]
    #[case("ada.example.com", false)]
    fn recognises_plausible_emails(#[case] email: &str, #[case] expected: bool) {
        assert_eq!(looks_like_email(email), expected);
    }

    #[test]
    fn login_requires_both_credentials() {
        assert!(validate_login(&fields(json!({"username": "ada", "password": "pw"}))).is_ok());
        let err = validate_login(&fields(json!({"username": "ada"}))).expect_err("no password");
        assert_eq!(err.field(), Some("password"));
    }

    #[test]
    fn registration_enforces_password_length() {
        let err = validate_registration(&fields(json!({
            "username": "ada",
            "email": "ada@example.com",
            "password": "short"
        })))
        .expect_err("short password");
        assert_eq!(err.field(), Some("password"));
    }

    #[test]
    fn session_endpoints_are_public() {
        let table = table();
        let login = table
            .descriptors()
            .iter()
            .find(|descriptor| descriptor.key() == OperationKey::CreateSession)
            .expect("login");
        assert!(!login.requires_auth());
    }
}
