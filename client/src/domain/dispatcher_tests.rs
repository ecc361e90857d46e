//! Tests for the request dispatcher.

use std::sync::Arc;

use bytes::Bytes;
use rstest::rstest;
use serde_json::json;

use super::*;
use crate::domain::models::Job;
use crate::domain::operations::{GetJob, JobQuery, JobRef, ListJobs};
use crate::domain::ports::{MockTransport, RequestBody, TransportError};
use crate::domain::{Credentials, EndpointDescriptor, EndpointTable, HttpMethod};

fn dispatcher_with(transport: MockTransport) -> Dispatcher {
    Dispatcher::new(
        Arc::new(EndpointRegistry::standard().expect("standard registry")),
        Arc::new(transport),
        Arc::new(Session::in_memory()),
    )
}

fn signed_in(transport: MockTransport) -> Dispatcher {
    let dispatcher = dispatcher_with(transport);
    dispatcher
        .session()
        .set_token(Credentials::new("T", Some("ada".to_owned()), None));
    dispatcher
}

fn idle_transport() -> MockTransport {
    let mut transport = MockTransport::new();
    transport.expect_execute().never();
    transport
}

#[tokio::test]
async fn unregistered_key_fails_without_network() {
    let dispatcher = Dispatcher::new(
        Arc::new(EndpointRegistry::default()),
        Arc::new(idle_transport()),
        Arc::new(Session::in_memory()),
    );

    let err = dispatcher
        .dispatch(OperationKey::ListJobs, Params::new())
        .await
        .expect_err("unregistered");

    assert_eq!(err.kind(), ErrorKind::UnknownOperation);
    assert_eq!(err.endpoint_key(), "list-jobs");
}

#[tokio::test]
async fn unknown_names_fail_without_network() {
    let dispatcher = dispatcher_with(idle_transport());

    let err = dispatcher
        .dispatch_named("launch-rockets", Params::new())
        .await
        .expect_err("unknown");

    assert_eq!(err.kind(), ErrorKind::UnknownOperation);
    assert_eq!(err.endpoint_key(), "launch-rockets");
}

#[rstest]
#[case(OperationKey::ListJobs)]
#[case(OperationKey::GetCurrentUser)]
#[case(OperationKey::ListConversations)]
#[tokio::test]
async fn protected_operations_short_circuit_without_session(#[case] key: OperationKey) {
    let dispatcher = dispatcher_with(idle_transport());

    let err = dispatcher
        .dispatch(key, Params::new())
        .await
        .expect_err("requires auth");

    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert_eq!(err.http_status(), None);
}

#[tokio::test]
async fn placeholders_are_consumed_not_repeated() {
    let registry = EndpointRegistry::assemble([EndpointTable::new(
        "widgets",
        vec![EndpointDescriptor::patch(OperationKey::UpdateJob, "/widgets/{widget_id}").public()],
    )])
    .expect("registry");
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .times(1)
        .withf(|request| {
            request.path == "/widgets/abc-123"
                && request.query.is_empty()
                && request.body == RequestBody::Json(json!({"colour": "red"}))
        })
        .returning(|_| Ok(HttpResponse::new(204, Bytes::new())));
    let dispatcher = Dispatcher::new(
        Arc::new(registry),
        Arc::new(transport),
        Arc::new(Session::in_memory()),
    );

    let payload = dispatcher
        .dispatch(
            OperationKey::UpdateJob,
            Params::new().with("widget_id", "abc-123").with("colour", "red"),
        )
        .await
        .expect("dispatch");

    assert!(payload.is_no_content());
}

#[tokio::test]
async fn read_queries_omit_null_fields() {
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .times(1)
        .withf(|request| {
            request.method == HttpMethod::Get
                && request.path_and_query() == "/jobs?status=open"
                && request.body == RequestBody::Empty
        })
        .returning(|_| Ok(HttpResponse::new(200, "[]")));
    let dispatcher = signed_in(transport);

    let jobs = dispatcher
        .call::<ListJobs>(JobQuery {
            status: Some(crate::domain::models::JobStatus::Open),
            ..JobQuery::default()
        })
        .await
        .expect("jobs");

    assert!(jobs.is_empty());
}

#[tokio::test]
async fn public_operations_never_carry_credentials() {
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .times(1)
        .withf(|request| request.authorization.is_none())
        .returning(|_| Ok(HttpResponse::new(200, "[]")));
    let dispatcher = signed_in(transport);

    dispatcher
        .dispatch(OperationKey::ListCategories, Params::new())
        .await
        .expect("categories");
}

#[tokio::test]
async fn protected_operations_carry_bearer_header() {
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .times(1)
        .withf(|request| {
            request
                .authorization
                .as_ref()
                .is_some_and(|header| header.expose() == "Bearer T")
        })
        .returning(|_| Ok(HttpResponse::new(200, r#"{"id": "j1", "title": "Paint shed"}"#)));
    let dispatcher = signed_in(transport);

    let job: Job = dispatcher
        .call::<GetJob>(JobRef::new("j1"))
        .await
        .expect("job");

    assert_eq!(job.title, "Paint shed");
}

#[tokio::test]
async fn binary_reads_return_raw_bytes() {
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .times(1)
        .withf(|request| request.response_kind == ResponseKind::Binary)
        .returning(|_| Ok(HttpResponse::new(200, vec![0x89_u8, b'P', b'N', b'G'])));
    let dispatcher = dispatcher_with(transport);

    let payload = dispatcher
        .dispatch(
            OperationKey::GetCategoryIcon,
            Params::new().with("category_id", "c1"),
        )
        .await
        .expect("icon");

    assert_eq!(payload, Payload::Binary(Bytes::from_static(b"\x89PNG")));
}

#[rstest]
#[case(401, ErrorKind::Authentication)]
#[case(404, ErrorKind::NotFound)]
#[case(409, ErrorKind::Validation)]
#[case(500, ErrorKind::Network)]
#[tokio::test]
async fn error_statuses_map_to_kinds(#[case] status: u16, #[case] expected: ErrorKind) {
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .times(1)
        .returning(move |_| Ok(HttpResponse::new(status, r#"{"message": "nope"}"#)));
    let dispatcher = signed_in(transport);

    let err = dispatcher
        .dispatch(OperationKey::ListJobs, Params::new())
        .await
        .expect_err("status error");

    assert_eq!(err.kind(), expected);
    assert_eq!(err.http_status(), Some(status));
    assert_eq!(err.message(), "nope");
}

#[tokio::test]
async fn dropped_connections_are_network_errors() {
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .times(1)
        .returning(|_| Err(TransportError::connection("connection reset by peer")));
    let dispatcher = signed_in(transport);

    let err = dispatcher
        .dispatch(OperationKey::ListJobs, Params::new())
        .await
        .expect_err("dropped");

    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(!err.user_message().contains("reset by peer"));
}

#[tokio::test]
async fn validator_failures_abort_before_io() {
    let dispatcher = signed_in(idle_transport());

    let err = dispatcher
        .dispatch(OperationKey::CreateJob, Params::new().with("budget", 10))
        .await
        .expect_err("missing title");

    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn missing_path_values_abort_before_io() {
    let dispatcher = signed_in(idle_transport());

    let err = dispatcher
        .dispatch(OperationKey::GetJob, Params::new().with("job_id", None::<String>))
        .await
        .expect_err("missing job id");

    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn create_session_stores_token_and_hides_secrets() {
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .times(1)
        .withf(|request| request.authorization.is_none())
        .returning(|_| {
            Ok(HttpResponse::new(
                200,
                r#"{"token": "T", "user": {"id": "u1", "username": "ada", "password": "$2b$hash"}}"#,
            ))
        });
    let dispatcher = dispatcher_with(transport);

    let payload = dispatcher
        .dispatch(
            OperationKey::CreateSession,
            Params::new().with("username", "ada").with("password", "pw"),
        )
        .await
        .expect("login");

    let credentials = dispatcher.session().credentials().expect("stored");
    assert_eq!(credentials.token(), "T");
    let projection = payload.as_json().expect("json").to_string();
    assert!(!projection.contains("password"));
    assert!(!projection.contains("$2b$hash"));
}

#[tokio::test]
async fn undecodable_typed_output_is_unknown() {
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .times(1)
        .returning(|_| Ok(HttpResponse::new(200, r#"{"unexpected": true}"#)));
    let dispatcher = signed_in(transport);

    let err = dispatcher
        .call::<GetJob>(JobRef::new("j1"))
        .await
        .expect_err("decode");

    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert_eq!(err.endpoint_key(), "get-job");
}

#[tokio::test]
async fn malformed_json_is_unknown() {
    let mut transport = MockTransport::new();
    transport
        .expect_execute()
        .times(1)
        .returning(|_| Ok(HttpResponse::new(200, "<html>")));
    let dispatcher = signed_in(transport);

    let err = dispatcher
        .dispatch(OperationKey::ListJobs, Params::new())
        .await
        .expect_err("decode");

    assert_eq!(err.kind(), ErrorKind::Unknown);
}

#[tokio::test]
async fn logout_clears_the_session() {
    let dispatcher = signed_in(idle_transport());
    assert!(dispatcher.session().is_authenticated());

    dispatcher.logout();

    assert!(!dispatcher.session().is_authenticated());
    let err = dispatcher
        .dispatch(OperationKey::ListJobs, Params::new())
        .await
        .expect_err("signed out");
    assert_eq!(err.kind(), ErrorKind::Authentication);
}
