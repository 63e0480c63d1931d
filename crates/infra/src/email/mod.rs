//! Outbound email: message building, templates and transports.

pub mod templates;
pub mod transport;

use std::sync::Arc;

use thiserror::Error;

use natours_auth::User;

use templates::Template;
pub use transport::{LogTransport, MailTransport, MemoryTransport, SendGridTransport, SmtpTransport};

pub const WELCOME_SUBJECT: &str = "Welcome to the Natours Family!";
pub const PASSWORD_RESET_SUBJECT: &str = "Your password reset token (valid for only 10 minutes)";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport failed: {0}")]
    Transport(String),

    #[error("mail provider rejected the message with status {0}")]
    Rejected(u16),
}

/// Name and address of a sender or recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    pub name: String,
    pub address: String,
}

impl core::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} <{}>", self.name, self.address)
    }
}

/// A rendered message ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub from: Mailbox,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// An email addressed to one user about one URL.
#[derive(Debug, Clone)]
pub struct Email {
    to: String,
    first_name: String,
    url: String,
    from: Mailbox,
}

impl Email {
    pub fn new(user: &User, url: impl Into<String>, from: Mailbox) -> Self {
        Self {
            to: user.email.clone(),
            first_name: user.first_name().to_string(),
            url: url.into(),
            from,
        }
    }

    pub fn render(&self, template: Template, subject: &str) -> Message {
        let html = template.render(&self.first_name, &self.url, subject);
        Message {
            from: self.from.clone(),
            to: self.to.clone(),
            subject: subject.to_string(),
            text: crate::html::to_text(&html),
            html,
        }
    }
}

/// Sends the application's emails through the configured transport.
#[derive(Clone)]
pub struct Mailer {
    transport: Arc<dyn MailTransport>,
    from: Mailbox,
}

impl Mailer {
    pub fn new(transport: Arc<dyn MailTransport>, from: Mailbox) -> Self {
        Self { transport, from }
    }

    async fn send(&self, user: &User, url: &str, template: Template, subject: &str) -> Result<(), MailError> {
        let message = Email::new(user, url, self.from.clone()).render(template, subject);
        self.transport.send(&message).await?;
        tracing::info!(to = %message.to, subject, "email sent");
        Ok(())
    }

    pub async fn send_welcome(&self, user: &User, url: &str) -> Result<(), MailError> {
        self.send(user, url, Template::Welcome, WELCOME_SUBJECT).await
    }

    pub async fn send_password_reset(&self, user: &User, url: &str) -> Result<(), MailError> {
        self.send(user, url, Template::PasswordReset, PASSWORD_RESET_SUBJECT).await
    }
}

#[cfg(test)]
mod tests {
    use natours_auth::NewUser;

    use super::*;

    fn user() -> User {
        User::new(
            "Jonas Schmedtmann".to_string(),
            "jonas@example.com".to_string(),
            "hash".to_string(),
            &NewUser::default(),
        )
    }

    fn sender() -> Mailbox {
        Mailbox {
            name: "Natours".to_string(),
            address: "hello@natours.io".to_string(),
        }
    }

    #[test]
    fn sender_renders_as_name_and_address() {
        assert_eq!(sender().to_string(), "Natours <hello@natours.io>");
    }

    #[tokio::test]
    async fn welcome_email_greets_by_first_name_with_the_url() {
        let transport = Arc::new(MemoryTransport::new());
        let mailer = Mailer::new(transport.clone(), sender());
        mailer.send_welcome(&user(), "http://127.0.0.1:3000/me").await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        let message = &sent[0];
        assert_eq!(message.to, "jonas@example.com");
        assert_eq!(message.subject, "Welcome to the Natours Family!");
        assert!(message.html.contains("Hi Jonas,"));
        assert!(message.html.contains("http://127.0.0.1:3000/me"));
        assert!(message.text.contains("Hi Jonas,"));
        assert!(!message.text.contains('<'));
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let mailer = Mailer::new(Arc::new(MemoryTransport::failing()), sender());
        let err = mailer
            .send_password_reset(&user(), "http://127.0.0.1:3000/api/v1/users/resetPassword/abc")
            .await
            .unwrap_err();
        assert!(matches!(err, MailError::Transport(_)));
    }
}
