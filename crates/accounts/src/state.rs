//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AccountsConfig;
use crate::services::email::EmailService;
use crate::services::qr::QrService;
use crate::services::tokens::TokenService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AccountsConfig,
    pool: PgPool,
    email: EmailService,
    tokens: TokenService,
    qr: QrService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Service configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP transport cannot be constructed.
    pub fn new(
        config: AccountsConfig,
        pool: PgPool,
    ) -> Result<Self, lettre::transport::smtp::Error> {
        let email = EmailService::new(&config.email)?;
        let tokens = TokenService::new(&config.jwt_secret);
        let qr = QrService::new(&config.media_root);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                email,
                tokens,
                qr,
            }),
        })
    }

    /// Get a reference to the service configuration.
    #[must_use]
    pub fn config(&self) -> &AccountsConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the email service.
    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    /// Get a reference to the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get a reference to the QR code service.
    #[must_use]
    pub fn qr(&self) -> &QrService {
        &self.inner.qr
    }
}
