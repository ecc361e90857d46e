//! Integration tests for the cache layer over a recording transport.
//!
//! Each test wires a full `MarketplaceClient` with the standard endpoint
//! registry and counts what actually reaches the wire.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use marketplace_client::domain::models::{ApplicationStatus, JobStatus};
use marketplace_client::domain::operations::{JobQuery, ListJobs};
use marketplace_client::domain::ports::{InMemoryCredentialStore, TransportError};
use marketplace_client::domain::{Credentials, HttpMethod};
use marketplace_client::test_support::{MutableClock, RecordingTransport};
use marketplace_client::{ErrorKind, MarketplaceClient};
use rstest::{fixture, rstest};
use serde_json::json;

const LATENCY: Duration = Duration::from_millis(20);

#[fixture]
fn signed_in() -> Arc<InMemoryCredentialStore> {
    Arc::new(InMemoryCredentialStore::with_credentials(Credentials::new(
        "T",
        Some("ada".to_owned()),
        Some("u1".to_owned()),
    )))
}

fn client_over(
    transport: &RecordingTransport,
    credentials: Arc<InMemoryCredentialStore>,
) -> MarketplaceClient {
    MarketplaceClient::builder()
        .transport(Arc::new(transport.clone()))
        .credential_store(credentials)
        .build()
        .expect("client builds")
}

fn jobs_transport() -> RecordingTransport {
    RecordingTransport::new()
        .with_latency(LATENCY)
        .respond_json(
            HttpMethod::Get,
            "/jobs",
            200,
            json!([
                {"_id": "j1", "title": "Fix sink", "status": "open", "category": "plumbing"},
                {"_id": "j2", "title": "Paint fence", "status": "assigned", "category": "painting"}
            ]),
        )
}

#[rstest]
#[tokio::test]
async fn concurrent_fetches_share_one_request(signed_in: Arc<InMemoryCredentialStore>) {
    let transport = jobs_transport();
    let client = client_over(&transport, signed_in);

    let (first, second) = tokio::join!(client.jobs().fetch(false), client.jobs().fetch(false));

    let first_jobs = first.expect("first caller");
    let second_jobs = second.expect("second caller");
    assert_eq!(transport.calls_to(HttpMethod::Get, "/jobs"), 1);
    assert!(Arc::ptr_eq(&first_jobs, &second_jobs));
    assert_eq!(first_jobs.len(), 2);
}

#[rstest]
#[tokio::test]
async fn forced_fetch_joins_a_pending_call(signed_in: Arc<InMemoryCredentialStore>) {
    let transport = jobs_transport();
    let client = client_over(&transport, signed_in);

    let (plain, forced) = tokio::join!(client.jobs().fetch(false), client.jobs().fetch(true));

    let plain_jobs = plain.expect("plain caller");
    let forced_jobs = forced.expect("forcing caller");
    assert_eq!(transport.calls_to(HttpMethod::Get, "/jobs"), 1);
    assert!(Arc::ptr_eq(&plain_jobs, &forced_jobs));
}

#[rstest]
#[tokio::test]
async fn settled_fetches_are_served_from_cache_until_forced(
    signed_in: Arc<InMemoryCredentialStore>,
) {
    let transport = jobs_transport();
    let client = client_over(&transport, signed_in);

    client.jobs().fetch(false).await.expect("initial fetch");
    client.jobs().fetch(false).await.expect("cached fetch");
    assert_eq!(transport.calls_to(HttpMethod::Get, "/jobs"), 1);

    client.jobs().fetch(true).await.expect("forced fetch");
    assert_eq!(transport.calls_to(HttpMethod::Get, "/jobs"), 2);

    let open: Vec<_> = client.jobs().open_jobs().into_iter().map(|job| job.id).collect();
    assert_eq!(open, vec!["j1".to_owned()]);
    assert_eq!(client.jobs().jobs_by_category("painting").len(), 1);
}

#[rstest]
#[tokio::test]
async fn shared_failures_reach_every_caller(signed_in: Arc<InMemoryCredentialStore>) {
    let transport = RecordingTransport::new().with_latency(LATENCY).fail(
        HttpMethod::Get,
        "/conversations",
        TransportError::connection("refused"),
    );
    let client = client_over(&transport, signed_in);

    let (first, second) = tokio::join!(
        client.conversations().fetch(false),
        client.conversations().fetch(false)
    );

    let first_err = first.expect_err("first caller fails");
    let second_err = second.expect_err("second caller fails");
    assert_eq!(first_err, second_err);
    assert_eq!(first_err.kind(), ErrorKind::Network);
    assert!(!first_err.message().contains("refused"));
    assert_eq!(transport.call_count(), 1);
    assert!(client.conversations().snapshot().is_empty());
}

#[rstest]
#[tokio::test]
async fn rejecting_an_application_evicts_its_conversation(
    signed_in: Arc<InMemoryCredentialStore>,
) {
    let transport = RecordingTransport::new()
        .respond_json(
            HttpMethod::Get,
            "/conversations",
            200,
            json!([
                {"_id": "c1", "participants": ["u1", "u2"], "unreadCount": 2},
                {"_id": "c2", "participants": ["u1", "u3"], "unreadCount": 1}
            ]),
        )
        .respond_json(
            HttpMethod::Get,
            "/applications/mine",
            200,
            json!([{"_id": "a1", "jobId": "j1", "conversationId": "c1"}]),
        )
        .respond_json(
            HttpMethod::Post,
            "/applications/a1/reject",
            200,
            json!({}),
        );
    let client = client_over(&transport, signed_in);
    client.conversations().fetch(false).await.expect("conversations");
    client.applications().fetch(false).await.expect("applications");
    assert_eq!(client.conversations().total_unread(), 3);

    client.applications().reject("a1").await.expect("reject");

    let remaining: Vec<_> = client
        .conversations()
        .snapshot()
        .iter()
        .map(|conversation| conversation.id.clone())
        .collect();
    assert_eq!(remaining, vec!["c2".to_owned()]);
    assert_eq!(client.conversations().total_unread(), 1);
    assert_eq!(transport.calls_to(HttpMethod::Get, "/conversations"), 1);
    assert_eq!(
        client.applications().snapshot().first().map(|a| a.status),
        Some(ApplicationStatus::Rejected)
    );
}

#[rstest]
#[tokio::test]
async fn accepting_an_application_records_the_assignment(
    signed_in: Arc<InMemoryCredentialStore>,
) {
    let transport = RecordingTransport::new().respond_json(
        HttpMethod::Post,
        "/applications/a1/accept",
        200,
        json!({
            "application": {"_id": "a1", "jobId": "j1", "status": "accepted"},
            "assignment": {"_id": "as1", "jobId": "j1", "status": "active"}
        }),
    );
    let client = client_over(&transport, signed_in);

    let outcome = client.applications().accept("a1").await.expect("accept");

    assert_eq!(outcome.application.status, ApplicationStatus::Accepted);
    let active: Vec<_> = client
        .assignments()
        .active()
        .into_iter()
        .map(|assignment| assignment.id)
        .collect();
    assert_eq!(active, vec!["as1".to_owned()]);
    assert_eq!(transport.calls_to(HttpMethod::Get, "/assignments"), 0);
}

#[rstest]
#[tokio::test]
async fn profile_lookups_deduplicate_per_username(signed_in: Arc<InMemoryCredentialStore>) {
    let transport = RecordingTransport::new()
        .with_latency(LATENCY)
        .respond_json(
            HttpMethod::Get,
            "/profiles/ada",
            200,
            json!({"username": "ada", "firstName": "Ada"}),
        )
        .respond_json(
            HttpMethod::Get,
            "/profiles/bob",
            200,
            json!({"username": "bob"}),
        );
    let client = client_over(&transport, signed_in);

    let (ada, ada_again, bob) = tokio::join!(
        client.profiles().get("ada", false),
        client.profiles().get("ada", false),
        client.profiles().get("bob", false)
    );

    assert_eq!(ada.expect("ada"), ada_again.expect("ada again"));
    assert_eq!(bob.expect("bob").username, "bob");
    assert_eq!(transport.calls_to(HttpMethod::Get, "/profiles/ada"), 1);
    assert_eq!(transport.calls_to(HttpMethod::Get, "/profiles/bob"), 1);
    assert!(client.profiles().cached("ada").is_some());
}

#[tokio::test]
async fn login_stores_the_token_and_strips_it_from_the_result() {
    let transport = RecordingTransport::new()
        .respond_json(
            HttpMethod::Post,
            "/auth/login",
            200,
            json!({
                "token": "secret-token",
                "user": {"_id": "u1", "username": "ada", "passwordHash": "x", "role": "worker"}
            }),
        )
        .respond_json(HttpMethod::Get, "/assignments", 200, json!([]));
    let client = client_over(&transport, Arc::new(InMemoryCredentialStore::new()));

    let identity = client.login("ada", "hunter2").await.expect("login");

    assert_eq!(identity.id.as_deref(), Some("u1"));
    assert_eq!(identity.role.as_deref(), Some("worker"));
    assert_eq!(client.session().username().as_deref(), Some("ada"));

    client.assignments().fetch(false).await.expect("assignments");
    let requests = transport.requests();
    let authorised = requests.last().expect("assignments request");
    assert_eq!(
        authorised.authorization.as_ref().map(|header| header.expose()),
        Some("Bearer secret-token")
    );
}

#[rstest]
#[tokio::test]
async fn unset_query_filters_are_left_out(signed_in: Arc<InMemoryCredentialStore>) {
    let transport = jobs_transport();
    let client = client_over(&transport, signed_in);

    client
        .dispatcher()
        .call::<ListJobs>(JobQuery {
            status: Some(JobStatus::Open),
            ..JobQuery::default()
        })
        .await
        .expect("list jobs");

    let requests = transport.requests();
    let sent = requests.first().expect("one request");
    assert_eq!(sent.query, vec![("status".to_owned(), "open".to_owned())]);
}

#[rstest]
#[tokio::test]
async fn focus_refreshes_are_throttled(signed_in: Arc<InMemoryCredentialStore>) {
    let transport = jobs_transport().with_latency(Duration::ZERO);
    let clock = Arc::new(MutableClock::new(Utc::now()));
    let client = MarketplaceClient::builder()
        .transport(Arc::new(transport.clone()))
        .credential_store(signed_in)
        .clock(clock.clone())
        .focus_refresh_interval(Duration::from_secs(30))
        .build()
        .expect("client builds");

    assert!(client.jobs().refresh_on_focus().await.expect("first").is_some());
    assert!(client.jobs().refresh_on_focus().await.expect("second").is_none());

    clock.advance_seconds(30);
    assert!(client.jobs().refresh_on_focus().await.expect("third").is_some());
    assert_eq!(transport.calls_to(HttpMethod::Get, "/jobs"), 2);
}

#[rstest]
#[tokio::test]
async fn logout_drops_user_data_and_credentials(signed_in: Arc<InMemoryCredentialStore>) {
    let transport = jobs_transport();
    let client = client_over(&transport, signed_in);
    client.jobs().fetch(false).await.expect("jobs");

    client.logout();

    assert!(!client.is_authenticated());
    assert!(client.jobs().snapshot().is_empty());
    let err = client.jobs().fetch(false).await.expect_err("signed out");
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert_eq!(transport.calls_to(HttpMethod::Get, "/jobs"), 1);
}

#[rstest]
#[tokio::test]
async fn logout_during_a_fetch_discards_the_late_response(
    signed_in: Arc<InMemoryCredentialStore>,
) {
    let transport = jobs_transport();
    let client = client_over(&transport, signed_in);

    let (fetched, after_logout) = tokio::join!(client.jobs().fetch(false), async {
        tokio::time::sleep(LATENCY / 2).await;
        client.logout();
        client.jobs().fetch(false).await
    });

    assert_eq!(fetched.expect("waiting caller still answered").len(), 2);
    let err = after_logout.expect_err("post-logout caller does not join");
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(client.jobs().snapshot().is_empty());
    let later = client.jobs().fetch(false).await.expect_err("still signed out");
    assert_eq!(later.kind(), ErrorKind::Authentication);
    assert_eq!(transport.calls_to(HttpMethod::Get, "/jobs"), 1);
}

#[rstest]
#[tokio::test]
async fn logout_during_a_profile_lookup_leaves_no_profile_behind(
    signed_in: Arc<InMemoryCredentialStore>,
) {
    let transport = RecordingTransport::new().with_latency(LATENCY).respond_json(
        HttpMethod::Get,
        "/profiles/ada",
        200,
        json!({"username": "ada"}),
    );
    let client = client_over(&transport, signed_in);

    let (looked_up, ()) = tokio::join!(client.profiles().get("ada", false), async {
        tokio::time::sleep(LATENCY / 2).await;
        client.logout();
    });

    assert_eq!(looked_up.expect("waiting caller still answered").username, "ada");
    assert!(client.profiles().cached("ada").is_none());
    assert!(client.profiles().snapshot().is_empty());
}
