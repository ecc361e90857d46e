//! Marketplace resources as returned by the backend.
//!
//! Field names follow the server's camelCase JSON; identifiers accept both
//! `id` and `_id`. Status enums tolerate values this client does not know
//! about by decoding them as `Unknown`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FromPayload, json_from_payload};

/// Resource with a stable identifier, storable in a domain cache.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Stable identifier.
    fn id(&self) -> &str;
}

/// Lifecycle of a posted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepting applications.
    #[default]
    Open,
    /// A worker has been assigned.
    Assigned,
    /// Work finished.
    Completed,
    /// Withdrawn by the poster.
    Cancelled,
    /// Status not known to this client.
    #[serde(other)]
    Unknown,
}

/// Posted job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Identifier.
    #[serde(alias = "_id")]
    pub id: String,
    /// Short title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Category identifier.
    #[serde(default)]
    pub category: Option<String>,
    /// Offered budget.
    #[serde(default)]
    pub budget: f64,
    /// Lifecycle status.
    #[serde(default)]
    pub status: JobStatus,
    /// Human-readable location.
    #[serde(default)]
    pub location: Option<String>,
    /// Identifier of the posting user.
    #[serde(default)]
    pub posted_by: Option<String>,
    /// Image identifiers in upload order.
    #[serde(default)]
    pub images: Vec<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Job category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Identifier.
    #[serde(alias = "_id")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Icon identifier, when the category has one.
    #[serde(default)]
    pub icon: Option<String>,
}

/// State of an application to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    /// Awaiting a decision.
    #[default]
    Pending,
    /// Accepted by the poster.
    Accepted,
    /// Rejected by the poster.
    Rejected,
    /// Withdrawn by the applicant.
    Withdrawn,
    /// Status not known to this client.
    #[serde(other)]
    Unknown,
}

/// Application to a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Identifier.
    #[serde(alias = "_id")]
    pub id: String,
    /// Job applied to.
    pub job_id: String,
    /// Applicant identifier.
    #[serde(default)]
    pub applicant: Option<String>,
    /// Cover letter.
    #[serde(default)]
    pub cover_letter: Option<String>,
    /// Rate proposed by the applicant.
    #[serde(default)]
    pub proposed_rate: Option<f64>,
    /// Decision state.
    #[serde(default)]
    pub status: ApplicationStatus,
    /// Conversation opened for this application, if any.
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Submission timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// State of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Work in progress.
    #[default]
    Active,
    /// Work finished.
    Completed,
    /// Cancelled before completion.
    Cancelled,
    /// Status not known to this client.
    #[serde(other)]
    Unknown,
}

/// Worker assigned to a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Identifier.
    #[serde(alias = "_id")]
    pub id: String,
    /// Job being worked on.
    pub job_id: String,
    /// Assigned worker.
    #[serde(default)]
    pub worker: Option<String>,
    /// Progress state.
    #[serde(default)]
    pub status: AssignmentStatus,
    /// Start timestamp.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    /// Completion timestamp.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Message thread between users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Identifier.
    #[serde(alias = "_id")]
    pub id: String,
    /// Participant identifiers.
    #[serde(default)]
    pub participants: Vec<String>,
    /// Job the thread belongs to.
    #[serde(default)]
    pub job_id: Option<String>,
    /// Preview of the latest message.
    #[serde(default)]
    pub last_message: Option<String>,
    /// Time of the latest activity.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Messages not yet read by the current user.
    #[serde(default)]
    pub unread_count: u32,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Identifier.
    #[serde(alias = "_id")]
    pub id: String,
    /// Owning conversation.
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Sender identifier.
    #[serde(default)]
    pub sender: Option<String>,
    /// Text body.
    #[serde(default)]
    pub body: String,
    /// Attachment identifier.
    #[serde(default)]
    pub attachment: Option<String>,
    /// Send timestamp.
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
}

/// Public profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Username, unique per user.
    pub username: String,
    /// Given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Short biography.
    #[serde(default)]
    pub bio: Option<String>,
    /// Picture identifier.
    #[serde(default)]
    pub picture: Option<String>,
    /// Average rating.
    #[serde(default)]
    pub rating: Option<f64>,
    /// Whether the profile has every required field.
    #[serde(default)]
    pub profile_complete: bool,
}

/// Sanitised identity returned by login and registration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// User identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// Username.
    #[serde(default)]
    pub username: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Marketplace role, e.g. `client` or `worker`.
    #[serde(default)]
    pub role: Option<String>,
    /// Whether the profile has every required field.
    #[serde(default)]
    pub profile_complete: bool,
}

/// Result of accepting an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptanceOutcome {
    /// Updated application.
    pub application: Application,
    /// Assignment created by the acceptance.
    #[serde(default)]
    pub assignment: Option<Assignment>,
}

/// Result of rejecting an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionOutcome {
    /// Updated application, when the server echoes it.
    #[serde(default)]
    pub application: Option<Application>,
    /// Conversation closed by the rejection.
    #[serde(default)]
    pub conversation_id: Option<String>,
}

macro_rules! entity_by_id {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Entity for $ty {
                fn id(&self) -> &str {
                    self.id.as_str()
                }
            }
        )*
    };
}

entity_by_id!(Job, Category, Application, Assignment, Conversation, Message);

impl Entity for Profile {
    fn id(&self) -> &str {
        self.username.as_str()
    }
}

json_from_payload!(
    Job,
    Category,
    Application,
    Assignment,
    Conversation,
    Message,
    Profile,
    Identity,
    AcceptanceOutcome,
    RejectionOutcome,
);

impl<T: FromPayload> FromPayload for Option<T> {
    fn from_payload(payload: super::Payload) -> Result<Self, super::PayloadError> {
        if payload.is_no_content() {
            Ok(None)
        } else {
            T::from_payload(payload).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for model decoding.

    use super::*;
    use crate::domain::Payload;
    use serde_json::json;

    #[test]
    fn decodes_underscore_ids_and_unknown_statuses() {
        let job = Job::from_payload(Payload::Json(json!({
            "_id": "j1",
            "title": "Fix fence",
            "budget": 120.5,
            "status": "on_hold"
        })))
        .expect("job");
        assert_eq!(job.id(), "j1");
        assert_eq!(job.status, JobStatus::Unknown);
        assert!(job.images.is_empty());
    }

    #[test]
    fn decodes_job_lists() {
        let jobs = Vec::<Job>::from_payload(Payload::Json(json!([
            {"id": "a", "title": "A"},
            {"id": "b", "title": "B", "createdAt": "2026-01-02T03:04:05Z"}
        ])))
        .expect("jobs");
        assert_eq!(jobs.len(), 2);
        assert!(jobs[1].created_at.is_some());
    }

    #[test]
    fn rejection_outcome_tolerates_missing_application() {
        let outcome = RejectionOutcome::from_payload(Payload::Json(json!({
            "conversationId": "c9"
        })))
        .expect("outcome");
        assert!(outcome.application.is_none());
        assert_eq!(outcome.conversation_id.as_deref(), Some("c9"));
    }

    #[test]
    fn optional_outputs_accept_no_content() {
        let value = Option::<Job>::from_payload(Payload::NoContent).expect("none");
        assert!(value.is_none());
    }

    #[test]
    fn profiles_are_keyed_by_username() {
        let profile = Profile::from_payload(Payload::Json(json!({"username": "ada"})))
            .expect("profile");
        assert_eq!(profile.id(), "ada");
        assert!(!profile.profile_complete);
    }
}
