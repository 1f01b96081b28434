use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::error::{ServiceError, ServiceResult};
use crate::auth::{hash_password, verify_password, AuthUser, SessionError, SessionIssuer};
use crate::database::models::{PublicUser, User};
use crate::database::HelpdeskStore;

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Plaintext behind the hash checked when an email matches no account
const DECOY_PASSWORD: &str = "decoy-password";

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn HelpdeskStore>,
    sessions: Arc<SessionIssuer>,
    bcrypt_cost: u32,
    decoy_hash: Arc<OnceCell<String>>,
}

impl AuthService {
    pub fn new(store: Arc<dyn HelpdeskStore>, sessions: Arc<SessionIssuer>, bcrypt_cost: u32) -> Self {
        Self {
            store,
            sessions,
            bcrypt_cost,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Verify an email/password pair.
    ///
    /// Unknown email and wrong password produce the same error, and both pay
    /// for one bcrypt verification at the configured cost.
    pub async fn authenticate(&self, email: &str, password: &str) -> ServiceResult<User> {
        let Some(user) = self.store.user_by_email(email).await? else {
            verify_password(password, self.decoy_hash().await?).await?;
            info!("Login failed for {}", email);
            return Err(ServiceError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash).await? {
            info!("Login failed for {}", email);
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Hashed once on first use, at the same cost as stored credentials
    async fn decoy_hash(&self) -> ServiceResult<&str> {
        let hash = self
            .decoy_hash
            .get_or_try_init(|| hash_password(DECOY_PASSWORD, self.bcrypt_cost))
            .await?;
        Ok(hash.as_str())
    }

    pub async fn login(&self, request: LoginRequest) -> ServiceResult<LoginResponse> {
        let email = request
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ServiceError::required("email"))?;
        let password = request
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ServiceError::required("password"))?;

        let user = self.authenticate(&email, &password).await?;
        let token = self.sessions.issue(user.id, &user.email, user.role)?;

        info!("User {} logged in as {}", user.id, user.role);
        Ok(LoginResponse {
            token,
            user: PublicUser::from(user),
        })
    }

    /// Recover the requester from a bearer token
    pub fn resolve_session(&self, token: &str) -> ServiceResult<AuthUser> {
        let claims = self.sessions.resolve(token).map_err(|err| {
            match &err {
                SessionError::Expired => debug!("Rejected expired session"),
                SessionError::Invalid(reason) => warn!("Rejected invalid session: {}", reason),
                SessionError::Signing(_) => {}
            }
            err
        })?;

        Ok(AuthUser::try_from(claims)?)
    }

    pub async fn profile(&self, user_id: i64) -> ServiceResult<PublicUser> {
        self.store
            .user_by_id(user_id)
            .await?
            .map(PublicUser::from)
            .ok_or_else(|| ServiceError::not_found("User not found"))
    }
}
