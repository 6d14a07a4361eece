//! Feedback relay: accepts player reports over HTTP and mails them to support.

mod error;
mod message;
mod router;
mod transport;

pub use error::{FeedbackError, SubmissionError};
pub use message::{Attachment, FeedbackForm, MailMessage, Mailbox, SUBJECT_PREFIX, compose};
pub use router::{AppState, HEALTH_MESSAGE, SEND_FAILED_MESSAGE, router, serve};
pub use transport::{MailTransport, OutboxTransport, SendGridTransport, transport_from_config};
