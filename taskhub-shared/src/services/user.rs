/// User service
///
/// Identity and credential rules plus session issuance. The service only ever
/// sees plaintext session tokens on their way to or from the client; the
/// session repository is keyed by the token's SHA-256 hash.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskhub_shared::repository::Repositories;
/// use taskhub_shared::services::UserService;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repos = Repositories::in_memory();
/// let users = UserService::new(repos.users.clone(), repos.sessions.clone());
///
/// let auth = users.register("alice@example.com", "Alice", "Pass123!").await?;
/// let me = users.get_current_user(&auth.token).await?;
/// assert_eq!(me.id, auth.user.id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use uuid::Uuid;

use super::{is_blank, ServiceError, ServiceResult};
use crate::auth::password::{hash_password, unmet_requirements, verify_password};
use crate::auth::session_token::{generate_session_token, hash_session_token};
use crate::models::session::DEFAULT_SESSION_TTL_DAYS;
use crate::models::user::MAX_DISPLAY_NAME_LENGTH;
use crate::models::{CreateUser, Session, User};
use crate::repository::{RepositoryError, SessionRepository, UserRepository};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s<>]+@[^@\s<>]+\.[^@\s<>]+$").unwrap();

    /// Verified against when the email is unknown, so a failed login costs
    /// the same whether or not the account exists
    static ref DUMMY_HASH: Option<String> = hash_password("taskhub-dummy-password-1!").ok();
}

/// Result of a successful register or login
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// The authenticated user
    pub user: User,

    /// Plaintext session token, handed to the client exactly once
    pub token: String,

    /// When the session stops resolving
    pub expires_at: DateTime<Utc>,

    /// Whether the client asked for a persistent cookie
    pub remember_me: bool,
}

/// Registration, login, sessions and profile changes
pub struct UserService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    session_ttl: Duration,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self {
            users,
            sessions,
            session_ttl: Duration::days(DEFAULT_SESSION_TTL_DAYS),
        }
    }

    /// Overrides the session lifetime
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Creates an account and immediately signs it in
    ///
    /// # Errors
    ///
    /// - `InvalidEmail`, `InvalidDisplayName`, `WeakPassword` on bad input
    /// - `UserAlreadyExists` when the email is taken
    pub async fn register(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
    ) -> ServiceResult<AuthSession> {
        validate_email(email)?;
        let display_name = normalize_display_name(display_name)?;

        check_password_policy(password)?;

        let password_hash = hash_password(password)?;

        let user = User::new(CreateUser {
            email: email.to_string(),
            display_name,
            password_hash,
        });

        match self.users.create(&user).await {
            Ok(()) => {}
            Err(RepositoryError::AlreadyExists) => return Err(ServiceError::UserAlreadyExists),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %user.id, "User registered");

        self.issue_session(user, true).await
    }

    /// Signs in with email and password
    ///
    /// Unknown email and wrong password fail identically with
    /// `InvalidCredentials`.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> ServiceResult<AuthSession> {
        if is_blank(email) {
            return Err(ServiceError::MissingField("email"));
        }
        if password.is_empty() {
            return Err(ServiceError::MissingField("password"));
        }

        let Some(user) = self.users.find_by_email(email).await? else {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(password, dummy);
            }
            tracing::debug!("Login attempt for unknown email");
            return Err(ServiceError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Login attempt with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "User logged in");

        self.issue_session(user, remember_me).await
    }

    /// Ends a session
    ///
    /// Logging out a session that no longer exists is not an error.
    pub async fn logout(&self, session_token: &str) -> ServiceResult<()> {
        if is_blank(session_token) {
            return Err(ServiceError::MissingField("session id"));
        }

        let removed = self
            .sessions
            .delete(&hash_session_token(session_token))
            .await?;

        tracing::debug!(removed, "Session ended");
        Ok(())
    }

    /// Resolves a session token to its user
    ///
    /// # Errors
    ///
    /// - `InvalidSession` when the token is unknown or expired
    /// - `UserNotFound` when the session outlived its user record
    pub async fn get_current_user(&self, session_token: &str) -> ServiceResult<User> {
        if is_blank(session_token) {
            return Err(ServiceError::MissingField("session id"));
        }

        let user_id = self
            .sessions
            .find_user_id(&hash_session_token(session_token))
            .await?
            .ok_or(ServiceError::InvalidSession)?;

        match self.users.find_by_id(user_id).await? {
            Some(user) => Ok(user),
            None => {
                tracing::warn!(user_id = %user_id, "Session refers to a missing user");
                Err(ServiceError::UserNotFound)
            }
        }
    }

    /// Changes the display name
    pub async fn update_profile(&self, user_id: Uuid, display_name: &str) -> ServiceResult<User> {
        let display_name = normalize_display_name(display_name)?;
        let mut user = self.load_user(user_id).await?;

        user.display_name = display_name;
        user.updated_at = Utc::now();
        self.users.update(&user).await?;

        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    /// Replaces the password after re-checking the current one
    ///
    /// Existing sessions stay valid.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        let mut user = self.load_user(user_id).await?;

        if !verify_password(current_password, &user.password_hash)? {
            return Err(ServiceError::InvalidCredentials);
        }

        check_password_policy(new_password)?;

        user.password_hash = hash_password(new_password)?;
        user.updated_at = Utc::now();
        self.users.update(&user).await?;

        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    async fn load_user(&self, user_id: Uuid) -> ServiceResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)
    }

    async fn issue_session(&self, user: User, remember_me: bool) -> ServiceResult<AuthSession> {
        let (token, token_hash) = generate_session_token();
        let session = Session::new(token_hash, user.id, self.session_ttl);

        self.sessions.create(&session).await?;

        Ok(AuthSession {
            user,
            token,
            expires_at: session.expires_at,
            remember_me,
        })
    }
}

/// Checks the email shape: local part, `@`, dotted domain, no whitespace or
/// angle brackets
pub fn validate_email(email: &str) -> ServiceResult<()> {
    if is_blank(email) || !EMAIL_RE.is_match(email) {
        return Err(ServiceError::InvalidEmail);
    }
    Ok(())
}

fn check_password_policy(password: &str) -> ServiceResult<()> {
    let unmet = unmet_requirements(password);
    if unmet.is_empty() {
        return Ok(());
    }

    let rules: Vec<&str> = unmet.iter().map(|rule| rule.describe()).collect();
    tracing::debug!(missing = ?rules, "Password rejected by policy");
    Err(ServiceError::WeakPassword)
}

fn normalize_display_name(display_name: &str) -> ServiceResult<String> {
    let trimmed = display_name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        return Err(ServiceError::InvalidDisplayName);
    }
    Ok(trimmed.to_string())
}
