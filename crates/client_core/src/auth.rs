//! Account sign-up and sign-in.
//!
//! Accounts live in the persistent store under `users`; the signed-in user is
//! kept under `currentUser` in a separate session-scoped store. Passwords are
//! stored only as a salted SHA-256 digest.

use std::sync::{Arc, OnceLock};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use regex::Regex;
use sha2::{Digest, Sha256};
use shared::{
    error::StorefrontError,
    protocol::{keys, SessionRecord, StorefrontEvent, UserRecord},
};
use storage::{load_json, save_json, KeyValueStore};
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Name shown in the navigation header: the local part of the email.
pub fn display_name(session: &SessionRecord) -> &str {
    session
        .email
        .split_once('@')
        .map_or(session.email.as_str(), |(local, _)| local)
}

#[derive(Clone)]
pub struct Authenticator {
    accounts: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<StorefrontEvent>,
}

impl Authenticator {
    pub fn new(
        accounts: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        events: broadcast::Sender<StorefrontEvent>,
    ) -> Self {
        Self {
            accounts,
            session,
            events,
        }
    }

    async fn users(&self) -> Result<Vec<UserRecord>, StorefrontError> {
        Ok(load_json::<Vec<UserRecord>>(self.accounts.as_ref(), keys::USERS)
            .await
            .map_err(StorefrontError::storage)?
            .unwrap_or_default())
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<(), StorefrontError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(StorefrontError::invalid_input("Please fill in all fields"));
        }
        if !is_valid_email(email) {
            return Err(StorefrontError::invalid_input(
                "Please enter a valid email address",
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(StorefrontError::invalid_input(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }

        let mut users = self.users().await?;
        if users.iter().any(|user| user.email == email) {
            return Err(StorefrontError::Conflict(
                "An account with this email already exists".into(),
            ));
        }

        let salt = Uuid::new_v4().simple().to_string();
        users.push(UserRecord {
            email: email.to_string(),
            password_hash: hash_password(&salt, password),
            salt,
            created_at: Utc::now(),
        });
        save_json(self.accounts.as_ref(), keys::USERS, &users)
            .await
            .map_err(StorefrontError::storage)?;
        info!(accounts = users.len(), "auth: account created");
        Ok(())
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionRecord, StorefrontError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(StorefrontError::invalid_input("Please fill in all fields"));
        }

        let users = self.users().await?;
        let Some(user) = users.iter().find(|user| {
            user.email == email && user.password_hash == hash_password(&user.salt, password)
        }) else {
            warn!("auth: rejected sign-in attempt");
            return Err(StorefrontError::Unauthorized(
                "Invalid email or password".into(),
            ));
        };

        let session = SessionRecord {
            email: user.email.clone(),
            login_time: Utc::now(),
        };
        save_json(self.session.as_ref(), keys::CURRENT_USER, &session)
            .await
            .map_err(StorefrontError::storage)?;
        info!(user = display_name(&session), "auth: signed in");
        let _ = self.events.send(StorefrontEvent::SignedIn {
            email: session.email.clone(),
        });
        Ok(session)
    }

    pub async fn logout(&self) -> Result<(), StorefrontError> {
        self.session
            .remove(keys::CURRENT_USER)
            .await
            .map_err(StorefrontError::storage)?;
        info!("auth: signed out");
        let _ = self.events.send(StorefrontEvent::SignedOut);
        Ok(())
    }

    pub async fn current_user(&self) -> Result<Option<SessionRecord>, StorefrontError> {
        load_json::<SessionRecord>(self.session.as_ref(), keys::CURRENT_USER)
            .await
            .map_err(StorefrontError::storage)
    }

    pub async fn is_logged_in(&self) -> Result<bool, StorefrontError> {
        Ok(self.current_user().await?.is_some())
    }

    /// The signed-in session, or `Unauthorized` when nobody is signed in.
    pub async fn require_auth(&self) -> Result<SessionRecord, StorefrontError> {
        self.current_user()
            .await?
            .ok_or_else(|| StorefrontError::Unauthorized("Please log in to continue".into()))
    }
}
