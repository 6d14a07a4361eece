//! Feedback forms and the mail composed from them.

use super::error::SubmissionError;
use crate::config::MailConfig;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use derive_getters::Getters;
use derive_new::new;
use serde::Serialize;
use tracing::{debug, instrument};

/// Subject prefix for every feedback mail.
pub const SUBJECT_PREFIX: &str = "[Chess Worlds] Feedback";

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct Attachment {
    /// Original file name.
    filename: String,
    /// MIME type.
    content_type: String,
    /// Raw bytes.
    content: Vec<u8>,
}

impl Attachment {
    /// Content as standard base64.
    pub fn content_base64(&self) -> String {
        STANDARD.encode(&self.content)
    }
}

/// What the player submitted from the feedback dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct FeedbackForm {
    /// World the player was in.
    world_title: String,
    /// Level the player was on.
    level_title: String,
    /// Free-text feedback.
    message: String,
    /// Player's address, optional.
    user_email: String,
    /// Whether to copy the player.
    send_copy: bool,
    /// Optional screenshot.
    screenshot: Option<Attachment>,
}

impl FeedbackForm {
    /// Creates a form with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Sets the world title.
    pub fn with_world(mut self, world_title: impl Into<String>) -> Self {
        self.world_title = world_title.into();
        self
    }

    /// Sets the level title.
    pub fn with_level(mut self, level_title: impl Into<String>) -> Self {
        self.level_title = level_title.into();
        self
    }

    /// Sets the player's address and whether to copy them.
    pub fn with_user_email(mut self, user_email: impl Into<String>, send_copy: bool) -> Self {
        self.user_email = user_email.into();
        self.send_copy = send_copy;
        self
    }

    /// Attaches a screenshot.
    pub fn with_screenshot(mut self, screenshot: Attachment) -> Self {
        self.screenshot = Some(screenshot);
        self
    }

    /// Sets a text field by its form name; unknown names are ignored.
    pub fn set_field(&mut self, name: &str, value: String) {
        match name {
            "worldTitle" => self.world_title = value,
            "levelTitle" => self.level_title = value,
            "message" => self.message = value,
            "userEmail" => self.user_email = value,
            "sendCopy" => self.send_copy = value == "true",
            _ => debug!(field = name, "Ignoring unknown form field"),
        }
    }
}

/// A display name and address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters, new)]
pub struct Mailbox {
    /// Display name.
    name: String,
    /// Address.
    email: String,
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\" <{}>", self.name, self.email)
    }
}

/// A message ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct MailMessage {
    /// Sender.
    from: Mailbox,
    /// Recipient.
    to: String,
    /// Copy recipient.
    cc: Option<String>,
    /// Subject line.
    subject: String,
    /// Plain-text body.
    text: String,
    /// Files.
    attachments: Vec<Attachment>,
}

/// Builds the support mail for a form.
///
/// # Errors
///
/// Returns [`SubmissionError::MissingMessage`] when the message is blank.
#[instrument(skip(form, mail), fields(world = %form.world_title, level = %form.level_title))]
pub fn compose(form: &FeedbackForm, mail: &MailConfig) -> Result<MailMessage, SubmissionError> {
    if form.message.trim().is_empty() {
        return Err(SubmissionError::MissingMessage);
    }

    let mut subject = SUBJECT_PREFIX.to_string();
    if !form.world_title.is_empty() || !form.level_title.is_empty() {
        subject.push_str(&format!(" – {} {}", form.world_title, form.level_title));
    }

    let optional = |label: &str, value: &str| {
        if value.is_empty() {
            String::new()
        } else {
            format!("{}: {}", label, value)
        }
    };
    let text = [
        "Chess Worlds Feedback".to_string(),
        optional("World", &form.world_title),
        optional("Level", &form.level_title),
        optional("From", &form.user_email),
        "Message:".to_string(),
        form.message.clone(),
    ]
    .into_iter()
    .filter(|line| !line.is_empty())
    .collect::<Vec<_>>()
    .join("\n");

    let cc = (form.send_copy && !form.user_email.is_empty()).then(|| form.user_email.clone());

    debug!(has_cc = cc.is_some(), has_screenshot = form.screenshot.is_some(), "Feedback composed");
    Ok(MailMessage {
        from: Mailbox::new(mail.sender_name().clone(), mail.support_address().clone()),
        to: mail.support_address().clone(),
        cc,
        subject,
        text,
        attachments: form.screenshot.iter().cloned().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_message_is_rejected() {
        let form = FeedbackForm::new("   \n");
        assert_eq!(
            compose(&form, &MailConfig::default()),
            Err(SubmissionError::MissingMessage)
        );
    }

    #[test]
    fn test_minimal_message() {
        let message = compose(&FeedbackForm::new("Nice game"), &MailConfig::default())
            .expect("compose");
        assert_eq!(message.subject(), "[Chess Worlds] Feedback");
        assert_eq!(message.text(), "Chess Worlds Feedback\nMessage:\nNice game");
        assert_eq!(
            message.from().to_string(),
            "\"Chess Worlds Support\" <support@chessworldsgame.com>"
        );
        assert_eq!(message.to(), "support@chessworldsgame.com");
        assert_eq!(*message.cc(), None);
    }

    #[test]
    fn test_full_message_with_copy() {
        let form = FeedbackForm::new("Level 2 hint is wrong")
            .with_world("World 1 – Adolf Anderssen")
            .with_level("Level 2")
            .with_user_email("fan@example.com", true)
            .with_screenshot(Attachment::new(
                "board.png".to_string(),
                "image/png".to_string(),
                vec![1, 2, 3],
            ));
        let message = compose(&form, &MailConfig::default()).expect("compose");
        assert_eq!(
            message.subject(),
            "[Chess Worlds] Feedback – World 1 – Adolf Anderssen Level 2"
        );
        assert_eq!(
            message.text(),
            "Chess Worlds Feedback\nWorld: World 1 – Adolf Anderssen\nLevel: Level 2\nFrom: fan@example.com\nMessage:\nLevel 2 hint is wrong"
        );
        assert_eq!(message.cc().as_deref(), Some("fan@example.com"));
        assert_eq!(message.attachments()[0].content_base64(), "AQID");
    }

    #[test]
    fn test_copy_needs_an_address() {
        let form = FeedbackForm::new("hi").with_user_email("", true);
        let message = compose(&form, &MailConfig::default()).expect("compose");
        assert_eq!(*message.cc(), None);
    }

    #[test]
    fn test_set_field_maps_form_names() {
        let mut form = FeedbackForm::default();
        form.set_field("sendCopy", "true".to_string());
        form.set_field("userEmail", "a@b.c".to_string());
        form.set_field("unknown", "x".to_string());
        assert!(*form.send_copy());
        assert_eq!(form.user_email(), "a@b.c");
    }
}
