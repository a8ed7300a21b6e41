pub mod contact;
pub mod response;

pub use contact::{ContactForm, ContactSubmission, SubmissionResult, UpstreamReply};
pub use response::ApiResponse;
