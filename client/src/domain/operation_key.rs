//! Closed set of operation keys understood by the dispatcher.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Raised when a string does not name any known operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation `{0}`")]
pub struct UnknownOperationKey(pub String);

macro_rules! operation_keys {
    (
        $(
            $(#[$meta:meta])*
            $variant:ident => $key:literal
        ),* $(,)?
    ) => {
        /// Identifier selecting one registered endpoint descriptor.
        ///
        /// Every variant has a stable kebab-case wire name, used in logs and
        /// in [`crate::ApiError::endpoint_key`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum OperationKey {
            $(
                $(#[$meta])*
                $variant,
            )*
        }

        impl OperationKey {
            /// Every operation key, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            /// Stable string form of the key.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $key,)*
                }
            }
        }

        impl FromStr for OperationKey {
            type Err = UnknownOperationKey;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($key => Ok(Self::$variant),)*
                    other => Err(UnknownOperationKey(other.to_owned())),
                }
            }
        }
    };
}

operation_keys! {
    /// Exchange credentials for a session token.
    CreateSession => "create-session",
    /// Create a new account.
    RegisterAccount => "register-account",
    /// Fetch the signed-in user's own profile.
    GetCurrentUser => "get-current-user",
    /// Fetch another user's public profile.
    GetProfile => "get-profile",
    /// Partially update the signed-in user's profile.
    UpdateProfile => "update-profile",
    /// Upload a new profile picture.
    UploadProfilePicture => "upload-profile-picture",
    /// Download a user's profile picture.
    GetProfilePicture => "get-profile-picture",
    /// List job categories.
    ListCategories => "list-categories",
    /// Download a category icon.
    GetCategoryIcon => "get-category-icon",
    /// List jobs matching optional filters.
    ListJobs => "list-jobs",
    /// Fetch one job.
    GetJob => "get-job",
    /// Post a new job.
    CreateJob => "create-job",
    /// Replace a job's editable fields.
    UpdateJob => "update-job",
    /// Delete a job.
    DeleteJob => "delete-job",
    /// Attach images to a job.
    UploadJobImages => "upload-job-images",
    /// Download one job image.
    GetJobImage => "get-job-image",
    /// List applications submitted by the signed-in user.
    ListMyApplications => "list-my-applications",
    /// List applications received for a job.
    ListJobApplications => "list-job-applications",
    /// Apply to a job.
    SubmitApplication => "submit-application",
    /// Withdraw a pending application.
    WithdrawApplication => "withdraw-application",
    /// Accept an application, creating an assignment.
    AcceptApplication => "accept-application",
    /// Reject an application, closing its conversation.
    RejectApplication => "reject-application",
    /// List assignments for the signed-in user.
    ListAssignments => "list-assignments",
    /// Mark an assignment as completed.
    CompleteAssignment => "complete-assignment",
    /// List conversation threads.
    ListConversations => "list-conversations",
    /// List messages in one thread.
    ListMessages => "list-messages",
    /// Post a text message to a thread.
    SendMessage => "send-message",
    /// Post a file attachment to a thread.
    SendAttachment => "send-attachment",
    /// Reset a thread's unread counter.
    MarkConversationRead => "mark-conversation-read",
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
