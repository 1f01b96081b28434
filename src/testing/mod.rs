use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::auth::{AuthUser, SessionIssuer};
use crate::database::models::NewUser;
use crate::database::{HelpdeskStore, MemoryStore};
use crate::services::{AuthService, TicketService, UserService};
use crate::types::Role;

/// Lowest cost bcrypt accepts; keeps hashing fast in tests
pub const TEST_BCRYPT_COST: u32 = 4;
pub const TEST_JWT_SECRET: &str = "test-secret";

/// Services wired to a fresh in-memory store
pub struct TestContext {
    pub store: Arc<dyn HelpdeskStore>,
    pub auth: AuthService,
    pub tickets: TicketService,
    pub users: UserService,
    next_user: AtomicU64,
}

impl TestContext {
    pub async fn new() -> Self {
        let store: Arc<dyn HelpdeskStore> = Arc::new(MemoryStore::new());
        let sessions = Arc::new(SessionIssuer::new(TEST_JWT_SECRET, 1));

        Self {
            auth: AuthService::new(store.clone(), sessions, TEST_BCRYPT_COST),
            tickets: TicketService::new(store.clone()),
            users: UserService::new(store.clone(), TEST_BCRYPT_COST),
            store,
            next_user: AtomicU64::new(1),
        }
    }

    /// Insert a user with a unique email and return it as an authenticated requester.
    ///
    /// The stored hash is not a valid bcrypt hash; use `UserService::seed_user`
    /// when a test needs to log in.
    pub async fn requester(&self, role: Role) -> AuthUser {
        let n = self.next_user.fetch_add(1, Ordering::SeqCst);
        let user = self
            .store
            .upsert_user(NewUser {
                email: format!("{}{}@example.com", role, n),
                name: None,
                role,
                password_hash: String::new(),
            })
            .await
            .expect("insert test user");

        AuthUser {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}
