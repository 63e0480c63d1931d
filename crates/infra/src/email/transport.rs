use std::sync::Mutex;

use async_trait::async_trait;
use lettre::message::{Mailbox as Recipient, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use serde_json::json;

use super::{MailError, Message};
use crate::config::SmtpSettings;

const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &Message) -> Result<(), MailError>;
}

/// Production transport: SendGrid's v3 HTTP API.
#[derive(Debug, Clone)]
pub struct SendGridTransport {
    client: reqwest::Client,
    api_key: String,
}

impl SendGridTransport {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl MailTransport for SendGridTransport {
    async fn send(&self, message: &Message) -> Result<(), MailError> {
        let body = json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": { "email": message.from.address, "name": message.from.name },
            "subject": message.subject,
            "content": [
                { "type": "text/plain", "value": message.text },
                { "type": "text/html", "value": message.html },
            ],
        });

        let response = self
            .client
            .post(SENDGRID_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}

/// Development transport: an SMTP relay (Mailtrap and the like), upgraded to
/// TLS when the server offers STARTTLS.
#[derive(Clone)]
pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let tls = TlsParameters::new(settings.host.clone()).map_err(|e| MailError::Transport(e.to_string()))?;
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(settings.host.as_str())
            .port(settings.port)
            .tls(Tls::Opportunistic(tls));
        if let Some(username) = &settings.username {
            builder = builder.credentials(Credentials::new(username.clone(), settings.password.clone()));
        }
        Ok(Self { mailer: builder.build() })
    }
}

fn address(raw: &str) -> Result<Address, MailError> {
    raw.parse()
        .map_err(|e| MailError::Transport(format!("invalid address '{raw}': {e}")))
}

/// MIME form of a message: plain text with an HTML alternative.
fn to_mime(message: &Message) -> Result<lettre::Message, MailError> {
    lettre::Message::builder()
        .from(Recipient::new(Some(message.from.name.clone()), address(&message.from.address)?))
        .to(Recipient::new(None, address(&message.to)?))
        .subject(message.subject.clone())
        .multipart(MultiPart::alternative_plain_html(message.text.clone(), message.html.clone()))
        .map_err(|e| MailError::Transport(e.to_string()))
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, message: &Message) -> Result<(), MailError> {
        let mime = to_mime(message)?;
        self.mailer
            .send(mime)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// Fallback transport: writes the message to the log instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, message: &Message) -> Result<(), MailError> {
        tracing::info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            body = %message.text,
            "email (not delivered)"
        );
        Ok(())
    }
}

/// Records messages in memory; tests read them back with [`MemoryTransport::sent`].
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<Message>>,
    fail: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose every send fails.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MailTransport for MemoryTransport {
    async fn send(&self, message: &Message) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Transport("memory transport set to fail".to_string()));
        }
        self.sent
            .lock()
            .map_err(|_| MailError::Transport("lock poisoned".to_string()))?
            .push(message.clone());
        Ok(())
    }
}
