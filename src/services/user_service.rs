use std::sync::Arc;

use tracing::info;

use super::error::{ServiceError, ServiceResult};
use super::policy::ASSIGNABLE_ROLE;
use crate::auth::hash_password;
use crate::database::models::{NewUser, PublicUser};
use crate::database::HelpdeskStore;
use crate::types::Role;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn HelpdeskStore>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(store: Arc<dyn HelpdeskStore>, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    /// Users a ticket can be assigned to, by email
    pub async fn assignable_users(&self) -> ServiceResult<Vec<PublicUser>> {
        let users = self.store.users_with_role(ASSIGNABLE_ROLE).await?;
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    /// Create an account unless the email is already registered.
    ///
    /// An existing account is returned untouched, password included.
    pub async fn seed_user(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
        role: Role,
    ) -> ServiceResult<PublicUser> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ServiceError::required("email"));
        }
        if password.is_empty() {
            return Err(ServiceError::required("password"));
        }

        if let Some(existing) = self.store.user_by_email(email).await? {
            info!("User {} already exists, leaving it unchanged", email);
            return Ok(PublicUser::from(existing));
        }

        let password_hash = hash_password(password, self.bcrypt_cost).await?;
        let user = self
            .store
            .upsert_user(NewUser {
                email: email.to_string(),
                name: name.map(str::to_string),
                role,
                password_hash,
            })
            .await?;

        info!("Seeded {} user {} ({})", user.role, user.email, user.id);
        Ok(PublicUser::from(user))
    }
}
