//! Wiring of the store, repositories, mailer and token keys.

use std::sync::Arc;

use chrono::Duration;

use natours_auth::JwtKeys;
use natours_infra::AppConfig;
use natours_infra::email::{LogTransport, MailTransport, Mailbox, Mailer, SendGridTransport, SmtpTransport};
use natours_infra::query::TourQuery;
use natours_infra::repositories::{BookingRepository, ReviewRepository, TourRepository, UserRepository};
use natours_infra::store::{Collection, DocumentStore, InMemoryDocumentStore};

/// Everything a handler needs, shared behind an `Arc`.
pub struct AppServices {
    pub config: AppConfig,
    pub jwt: JwtKeys,
    pub tours: TourRepository,
    pub users: UserRepository,
    pub reviews: ReviewRepository,
    pub bookings: BookingRepository,
    pub mailer: Mailer,
}

impl AppServices {
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>, transport: Arc<dyn MailTransport>) -> Self {
        let query = TourQuery::new(
            Collection::new(store.clone()),
            Collection::new(store.clone()),
            Collection::new(store.clone()),
        );
        let tours = TourRepository::new(query.clone(), Collection::new(store.clone()));
        let users = UserRepository::new(Collection::new(store.clone()));
        let reviews = ReviewRepository::new(
            Collection::new(store.clone()),
            Collection::new(store.clone()),
            tours.clone(),
        );
        let bookings = BookingRepository::new(Collection::new(store.clone()), Collection::new(store), query);

        let from = Mailbox {
            name: config.email_from_name.clone(),
            address: config.email_from.clone(),
        };

        Self {
            jwt: JwtKeys::new(config.jwt_secret.as_bytes()),
            tours,
            users,
            reviews,
            bookings,
            mailer: Mailer::new(transport, from),
            config,
        }
    }

    /// In-memory store with the given mail transport; used by tests and local runs.
    pub fn in_memory(config: AppConfig, transport: Arc<dyn MailTransport>) -> Self {
        Self::new(config, Arc::new(InMemoryDocumentStore::new()), transport)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::days(self.config.jwt_expires_in_days)
    }

    pub fn cookie_max_age_secs(&self) -> i64 {
        self.config.jwt_cookie_expires_in_days * 24 * 60 * 60
    }
}

/// Build services from configuration: Postgres when `DATABASE` is set, and
/// the mail transport picked by [`mail_transport`].
pub async fn build_services(config: AppConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => connect_store(url).await?,
        None => Arc::new(InMemoryDocumentStore::new()),
    };

    let transport = mail_transport(&config)?;
    Ok(AppServices::new(config, store, transport))
}

/// SendGrid in production; outside it the SMTP relay from `EMAIL_HOST`, or the
/// log when none is configured.
fn mail_transport(config: &AppConfig) -> anyhow::Result<Arc<dyn MailTransport>> {
    if config.environment.is_production() {
        return Ok(Arc::new(SendGridTransport::new(config.sendgrid_api_key.clone())));
    }
    match &config.smtp {
        Some(settings) => {
            let transport = SmtpTransport::new(settings)?;
            tracing::info!(host = %settings.host, port = settings.port, "email via SMTP");
            Ok(Arc::new(transport))
        }
        None => Ok(Arc::new(LogTransport)),
    }
}

#[cfg(feature = "postgres")]
async fn connect_store(url: &str) -> anyhow::Result<Arc<dyn DocumentStore>> {
    use anyhow::Context;
    use natours_infra::store::PostgresDocumentStore;

    let store = PostgresDocumentStore::connect(url)
        .await
        .context("failed to connect to the database")?;
    tracing::info!("DB connection successful!");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn connect_store(_url: &str) -> anyhow::Result<Arc<dyn DocumentStore>> {
    anyhow::bail!("DATABASE is set but this build has no `postgres` feature")
}
