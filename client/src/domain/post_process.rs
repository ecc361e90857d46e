//! Per-operation side effects applied to successful responses.
//!
//! The table is deliberately small: every operation passes its payload
//! through untouched unless it appears in [`hook_for`].

use serde_json::{Map, Value};

use super::normalizer::Failure;
use super::{Credentials, OperationKey, Payload, Session};

/// Identity fields allowed to leave a session-issuing response.
const IDENTITY_FIELDS: [&str; 5] = ["username", "email", "firstName", "lastName", "role"];

/// Fields that must be non-blank for a profile to count as complete when the
/// server does not say so explicitly.
const REQUIRED_PROFILE_FIELDS: [&str; 3] = ["firstName", "lastName", "bio"];

/// Side effect attached to one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PostProcess {
    /// Return the payload unchanged.
    PassThrough,
    /// Store the issued credential, then return a sanitised identity.
    EstablishSession {
        /// Whether a missing token is an error (login) or tolerated
        /// (registration without auto-login).
        token_required: bool,
    },
    /// Refresh the session's derived profile state, then return the payload.
    RefreshProfile,
}

/// Look up the hook for an operation.
pub(crate) const fn hook_for(key: OperationKey) -> PostProcess {
    match key {
        OperationKey::CreateSession => PostProcess::EstablishSession {
            token_required: true,
        },
        OperationKey::RegisterAccount => PostProcess::EstablishSession {
            token_required: false,
        },
        OperationKey::GetCurrentUser => PostProcess::RefreshProfile,
        _ => PostProcess::PassThrough,
    }
}

/// Run `hook` against a successful payload.
pub(crate) fn apply(hook: PostProcess, payload: Payload, session: &Session) -> Result<Payload, Failure> {
    match (hook, payload) {
        (PostProcess::EstablishSession { token_required }, Payload::Json(body)) => {
            establish_session(&body, token_required, session).map(Payload::Json)
        }
        (PostProcess::RefreshProfile, Payload::Json(body)) => {
            session.record_profile(profile_complete(&body), body.clone());
            Ok(Payload::Json(body))
        }
        (PostProcess::EstablishSession { .. } | PostProcess::RefreshProfile, Payload::Binary(_)) => {
            Err(Failure::decode("expected a JSON identity document"))
        }
        (_, payload) => Ok(payload),
    }
}

fn establish_session(body: &Value, token_required: bool, session: &Session) -> Result<Value, Failure> {
    let user = identity_source(body);
    let token = body
        .get("token")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|token| !token.is_empty());

    match token {
        Some(token) => session.set_token(Credentials::new(
            token,
            text_field(user, "username"),
            identifier(user),
        )),
        None if token_required => {
            return Err(Failure::decode("session response did not include a token"));
        }
        None => {}
    }

    Ok(sanitize_identity(body))
}

/// Project an identity response onto the allow-listed fields.
///
/// The token, password hashes and any other server-internal field are
/// dropped.
pub(crate) fn sanitize_identity(body: &Value) -> Value {
    let user = identity_source(body);
    let mut projection = Map::new();
    if let Some(id) = identifier(user) {
        projection.insert("id".to_owned(), Value::String(id));
    }
    for field in IDENTITY_FIELDS {
        if let Some(value) = user.get(field).filter(|value| value.is_string()) {
            projection.insert(field.to_owned(), value.clone());
        }
    }
    projection.insert(
        "profileComplete".to_owned(),
        Value::Bool(profile_complete(user)),
    );
    Value::Object(projection)
}

/// Explicit `profileComplete` flag, or derived from required fields.
pub(crate) fn profile_complete(profile: &Value) -> bool {
    if let Some(flag) = profile.get("profileComplete").and_then(Value::as_bool) {
        return flag;
    }
    REQUIRED_PROFILE_FIELDS.iter().all(|field| {
        profile
            .get(*field)
            .and_then(Value::as_str)
            .is_some_and(|text| !text.trim().is_empty())
    })
}

fn identity_source(body: &Value) -> &Value {
    match body.get("user") {
        Some(user @ Value::Object(_)) => user,
        _ => body,
    }
}

fn identifier(user: &Value) -> Option<String> {
    match user.get("id").or_else(|| user.get("_id"))? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn text_field(user: &Value, name: &str) -> Option<String> {
    user.get(name).and_then(Value::as_str).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the post-processing table.

    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn login_body() -> Value {
        json!({
            "token": "T",
            "user": {
                "_id": "u-42",
                "username": "ada",
                "email": "ada@example.com",
                "password": "hunter2",
                "passwordHash": "$argon2id$...",
                "salt": "pepper",
                "role": "worker",
                "firstName": "Ada",
                "lastName": "Lovelace",
                "bio": "Engines",
                "__v": 3
            }
        })
    }

    #[rstest]
    #[case(OperationKey::CreateSession, PostProcess::EstablishSession { token_required: true })]
    #[case(OperationKey::RegisterAccount, PostProcess::EstablishSession { token_required: false })]
    #[case(OperationKey::GetCurrentUser, PostProcess::RefreshProfile)]
    #[case(OperationKey::ListJobs, PostProcess::PassThrough)]
    #[case(OperationKey::GetProfile, PostProcess::PassThrough)]
    fn table_assigns_expected_hooks(#[case] key: OperationKey, #[case] expected: PostProcess) {
        assert_eq!(hook_for(key), expected);
    }

    #[test]
    fn create_session_stores_token_and_sanitises_identity() {
        let session = Session::in_memory();
        let result = apply(
            hook_for(OperationKey::CreateSession),
            Payload::Json(login_body()),
            &session,
        )
        .expect("post-process");

        let credentials = session.credentials().expect("stored");
        assert_eq!(credentials.token(), "T");
        assert_eq!(credentials.username(), Some("ada"));
        assert_eq!(credentials.user_id(), Some("u-42"));

        let Payload::Json(projection) = result else {
            panic!("expected JSON projection");
        };
        let rendered = projection.to_string().to_lowercase();
        assert!(!rendered.contains("password"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("salt"));
        assert!(projection.get("token").is_none());
        assert_eq!(projection["id"], json!("u-42"));
        assert_eq!(projection["username"], json!("ada"));
        assert_eq!(projection["profileComplete"], json!(true));
    }

    #[test]
    fn flat_token_only_response_still_establishes_session() {
        let session = Session::in_memory();
        apply(
            hook_for(OperationKey::CreateSession),
            Payload::Json(json!({"token": "T"})),
            &session,
        )
        .expect("post-process");
        assert_eq!(session.credentials().expect("stored").token(), "T");
    }

    #[test]
    fn login_without_token_is_a_decode_failure() {
        let session = Session::in_memory();
        let err = apply(
            hook_for(OperationKey::CreateSession),
            Payload::Json(json!({"user": {"username": "ada"}})),
            &session,
        )
        .expect_err("token required");
        assert!(matches!(err, Failure::Decode { .. }));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn registration_without_token_does_not_log_in() {
        let session = Session::in_memory();
        let result = apply(
            hook_for(OperationKey::RegisterAccount),
            Payload::Json(json!({"id": 7, "username": "bob", "password": "x"})),
            &session,
        )
        .expect("post-process");
        assert!(!session.is_authenticated());
        assert_eq!(result.as_json().expect("json")["id"], json!("7"));
        assert!(result.as_json().expect("json").get("password").is_none());
    }

    #[rstest]
    #[case(json!({"profileComplete": false, "firstName": "A", "lastName": "B", "bio": "C"}), false)]
    #[case(json!({"profileComplete": true}), true)]
    #[case(json!({"firstName": "A", "lastName": "B", "bio": "C"}), true)]
    #[case(json!({"firstName": "A", "lastName": " ", "bio": "C"}), false)]
    #[case(json!({}), false)]
    fn profile_fetch_refreshes_completion_flag(#[case] body: Value, #[case] expected: bool) {
        let session = Session::in_memory();
        let result = apply(
            hook_for(OperationKey::GetCurrentUser),
            Payload::Json(body.clone()),
            &session,
        )
        .expect("post-process");
        assert_eq!(session.profile_complete(), expected);
        assert_eq!(session.cached_profile(), Some(body.clone()));
        assert_eq!(result, Payload::Json(body));
    }

    #[test]
    fn pass_through_leaves_payload_untouched() {
        let session = Session::in_memory();
        let payload = Payload::Json(json!({"password": "kept as-is"}));
        let result = apply(PostProcess::PassThrough, payload.clone(), &session).expect("ok");
        assert_eq!(result, payload);
    }
}
