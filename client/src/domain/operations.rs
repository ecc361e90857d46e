//! Compile-time mapping from operation key to request and response types.
//!
//! Each operation is a zero-sized marker type implementing [`Operation`].
//! [`crate::Dispatcher::call`] uses the associated types to encode input and
//! decode output, so a mismatched shape is a type error rather than a
//! runtime surprise.
//!
//! # Examples
//! ```rust,ignore
//! use marketplace_client::domain::operations::{GetJob, JobRef};
//!
//! let job = dispatcher.call::<GetJob>(JobRef::new("j-1")).await?;
//! ```

use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use super::models::{
    AcceptanceOutcome, Application, Assignment, Category, Conversation, Identity, Job, JobStatus,
    Message, Profile, RejectionOutcome,
};
use super::{FromPayload, IntoParams, OperationKey, Upload, serialize_into_params};

/// Typed view of one registered operation.
pub trait Operation {
    /// Registry key.
    const KEY: OperationKey;
    /// Input encoded into the parameter bag.
    type Input: IntoParams + Send + 'static;
    /// Output decoded from the response payload.
    type Output: FromPayload + Send + 'static;
}

/// Credentials for `create-session`.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    /// Username or email.
    pub username: String,
    /// Plain-text password.
    pub password: String,
}

impl LoginRequest {
    /// Build a login request.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// New account details for `register-account`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    /// Desired username.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
    /// Given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Marketplace role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Profile addressed by username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileRef {
    /// Username.
    pub username: String,
}

impl ProfileRef {
    /// Reference `username`'s profile.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// Partial update to the current user's profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// Given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Short biography.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Category addressed by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRef {
    /// Category identifier.
    pub category_id: String,
}

impl CategoryRef {
    /// Reference category `category_id`.
    pub fn new(category_id: impl Into<String>) -> Self {
        Self {
            category_id: category_id.into(),
        }
    }
}

/// Filters for `list-jobs`. Unset filters are left out of the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobQuery {
    /// Only jobs in this state.
    pub status: Option<JobStatus>,
    /// Only jobs in this category.
    pub category: Option<String>,
    /// Page size.
    pub limit: Option<u32>,
}

/// Job addressed by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRef {
    /// Job identifier.
    pub job_id: String,
}

impl JobRef {
    /// Reference job `job_id`.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }
}

/// Details for `create-job`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Category identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Offered budget, must be positive.
    pub budget: f64,
    /// Human-readable location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Replacement fields for `update-job`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdate {
    /// Job identifier.
    #[serde(rename = "job_id")]
    pub job_id: String,
    /// Short title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Category identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Offered budget, must be positive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    /// Lifecycle status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
}

impl JobUpdate {
    /// Empty update for job `job_id`.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            title: None,
            description: None,
            category: None,
            budget: None,
            status: None,
        }
    }
}

/// One image attached to a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobImageRef {
    /// Job identifier.
    pub job_id: String,
    /// Image identifier.
    pub image_id: String,
}

/// Application addressed by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationRef {
    /// Application identifier.
    pub application_id: String,
}

impl ApplicationRef {
    /// Reference application `application_id`.
    pub fn new(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
        }
    }
}

/// Details for `submit-application`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    /// Job applied to.
    #[serde(rename = "job_id")]
    pub job_id: String,
    /// Cover letter, must not be blank.
    pub cover_letter: String,
    /// Proposed rate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposed_rate: Option<f64>,
}

/// Assignment addressed by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentRef {
    /// Assignment identifier.
    pub assignment_id: String,
}

impl AssignmentRef {
    /// Reference assignment `assignment_id`.
    pub fn new(assignment_id: impl Into<String>) -> Self {
        Self {
            assignment_id: assignment_id.into(),
        }
    }
}

/// Conversation addressed by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationRef {
    /// Conversation identifier.
    pub conversation_id: String,
}

impl ConversationRef {
    /// Reference conversation `conversation_id`.
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
        }
    }
}

/// Text message for `send-message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMessage {
    /// Target conversation.
    pub conversation_id: String,
    /// Message text, must not be blank.
    pub body: String,
}

serialize_into_params!(
    LoginRequest,
    Registration,
    ProfileRef,
    ProfileUpdate,
    CategoryRef,
    JobQuery,
    JobRef,
    NewJob,
    JobUpdate,
    JobImageRef,
    ApplicationRef,
    NewApplication,
    AssignmentRef,
    ConversationRef,
    NewMessage,
);

macro_rules! define_operations {
    ($($(#[$meta:meta])* $name:ident: $input:ty => $output:ty;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            pub struct $name;

            impl Operation for $name {
                const KEY: OperationKey = OperationKey::$name;
                type Input = $input;
                type Output = $output;
            }
        )*
    };
}

define_operations! {
    /// Log in and store the issued token.
    CreateSession: LoginRequest => Identity;
    /// Create an account, logging in if the server issues a token.
    RegisterAccount: Registration => Identity;
    /// Fetch the signed-in user's own profile.
    GetCurrentUser: () => Profile;
    /// Fetch another user's profile.
    GetProfile: ProfileRef => Profile;
    /// Update the signed-in user's profile.
    UpdateProfile: ProfileUpdate => Profile;
    /// Replace the signed-in user's picture.
    UploadProfilePicture: Upload<()> => Profile;
    /// Download a profile picture.
    GetProfilePicture: ProfileRef => Bytes;
    /// List job categories.
    ListCategories: () => Vec<Category>;
    /// Download a category icon.
    GetCategoryIcon: CategoryRef => Bytes;
    /// List jobs matching a filter.
    ListJobs: JobQuery => Vec<Job>;
    /// Fetch one job.
    GetJob: JobRef => Job;
    /// Post a job.
    CreateJob: NewJob => Job;
    /// Replace fields of a job.
    UpdateJob: JobUpdate => Job;
    /// Delete a job.
    DeleteJob: JobRef => ();
    /// Attach images to a job.
    UploadJobImages: Upload<JobRef> => Job;
    /// Download one job image.
    GetJobImage: JobImageRef => Bytes;
    /// List applications submitted by the signed-in user.
    ListMyApplications: () => Vec<Application>;
    /// List applications received for a job.
    ListJobApplications: JobRef => Vec<Application>;
    /// Apply to a job.
    SubmitApplication: NewApplication => Application;
    /// Withdraw an application.
    WithdrawApplication: ApplicationRef => ();
    /// Accept an application, creating an assignment.
    AcceptApplication: ApplicationRef => AcceptanceOutcome;
    /// Reject an application, closing its conversation.
    RejectApplication: ApplicationRef => RejectionOutcome;
    /// List the signed-in user's assignments.
    ListAssignments: () => Vec<Assignment>;
    /// Mark an assignment as done.
    CompleteAssignment: AssignmentRef => Assignment;
    /// List conversations.
    ListConversations: () => Vec<Conversation>;
    /// List messages in a conversation.
    ListMessages: ConversationRef => Vec<Message>;
    /// Send a text message.
    SendMessage: NewMessage => Message;
    /// Send a file into a conversation.
    SendAttachment: Upload<ConversationRef> => Message;
    /// Mark a conversation as read.
    MarkConversationRead: ConversationRef => ();
}
