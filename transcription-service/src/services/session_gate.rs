//! Email-domain gate in front of every feature of the tool.
//!
//! Authentication here is deliberately thin: no passwords, no identity
//! provider. An address that looks like an email and carries the
//! corporate suffix is let through; everything else is refused. The
//! same checks run again when a stored session is restored, so a
//! tampered or stale record never grants access.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tower_sessions::Session;

use crate::models::session::{
    SESSION_AUTH_FLAG_KEY, SESSION_AUTH_FLAG_VALUE, SESSION_USER_KEY, UserSession,
};
use service_core::error::AppError;

/// Permissive shape check: one `@`, no whitespace, a dot somewhere in
/// the host part. Domain membership is a separate, configurable rule.
static EMAIL_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("Por favor, preencha todos os campos.")]
    MissingFields,

    #[error("Por favor, insira um e-mail válido.")]
    InvalidEmailFormat,

    #[error("Nome deve ter pelo menos 2 caracteres.")]
    NameTooShort,

    #[error("Acesso negado. Apenas colaboradores {0} podem usar esta ferramenta.")]
    DomainNotAllowed(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::DomainNotAllowed(_) => AppError::DomainNotAllowed(err.to_string()),
            _ => AppError::BadRequest(anyhow::Error::new(err)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionGate {
    allowed_domain: String,
}

impl SessionGate {
    pub fn new(allowed_domain: impl Into<String>) -> Self {
        Self {
            allowed_domain: allowed_domain.into(),
        }
    }

    pub fn allowed_domain(&self) -> &str {
        &self.allowed_domain
    }

    pub fn email_format_ok(email: &str) -> bool {
        EMAIL_FORMAT.is_match(email)
    }

    fn domain_allowed(&self, email: &str) -> bool {
        email.ends_with(&self.allowed_domain)
    }

    /// Run the full credential check and hand back the trimmed pair.
    /// Used both at login and on every transcription request.
    pub fn validate_credentials(
        &self,
        email: &str,
        name: &str,
    ) -> Result<(String, String), AuthError> {
        let email = email.trim();
        let name = name.trim();

        if email.is_empty() || name.is_empty() {
            return Err(AuthError::MissingFields);
        }
        if !Self::email_format_ok(email) {
            return Err(AuthError::InvalidEmailFormat);
        }
        if name.chars().count() < 2 {
            return Err(AuthError::NameTooShort);
        }
        if !self.domain_allowed(email) {
            return Err(AuthError::DomainNotAllowed(self.allowed_domain.clone()));
        }

        Ok((email.to_string(), name.to_string()))
    }

    /// Validate credentials and mint a session record. Nothing is
    /// persisted on failure.
    pub fn authenticate(&self, email: &str, name: &str) -> Result<UserSession, AuthError> {
        let (email, name) = self.validate_credentials(email, name)?;
        Ok(UserSession {
            email,
            name,
            login_time: Utc::now(),
        })
    }

    /// Write the user record and the authentication marker under their
    /// fixed keys.
    pub async fn persist(&self, session: &Session, user: &UserSession) -> Result<(), AppError> {
        session
            .insert(SESSION_USER_KEY, user)
            .await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("session store: {e}")))?;
        session
            .insert(SESSION_AUTH_FLAG_KEY, SESSION_AUTH_FLAG_VALUE)
            .await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("session store: {e}")))?;
        Ok(())
    }

    /// Restore the stored user if the record is complete and still
    /// passes the current policy. Returns `None` for missing or
    /// unmarked sessions and for users whose domain is no longer
    /// allowed.
    pub async fn restore(&self, session: &Session) -> Option<UserSession> {
        let flag: Option<String> = session.get(SESSION_AUTH_FLAG_KEY).await.ok().flatten();
        if flag.as_deref() != Some(SESSION_AUTH_FLAG_VALUE) {
            return None;
        }

        let user: UserSession = session.get(SESSION_USER_KEY).await.ok().flatten()?;
        if Self::email_format_ok(&user.email) && self.domain_allowed(&user.email) {
            Some(user)
        } else {
            None
        }
    }

    /// Drop everything stored for this caller.
    pub async fn end(&self, session: &Session) {
        session.clear().await;
    }
}
