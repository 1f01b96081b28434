use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::auth::SessionIssuer;
use crate::config::{AppConfig, Environment, SecurityConfig};
use crate::database::{HelpdeskStore, StoreHandle};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::{AuthService, TicketService, UserService};
use crate::types::Role;

pub const DEMO_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEMO_ADMIN_PASSWORD: &str = "password123";

/// Everything a handler can reach, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn HelpdeskStore>,
    pub auth: AuthService,
    pub tickets: TicketService,
    pub users: UserService,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn HelpdeskStore>) -> Self {
        let sessions = Arc::new(SessionIssuer::new(
            &config.security.jwt_secret,
            config.security.jwt_expiry_hours,
        ));

        Self {
            auth: AuthService::new(store.clone(), sessions, config.security.bcrypt_cost),
            tickets: TicketService::new(store.clone()),
            users: UserService::new(store.clone(), config.security.bcrypt_cost),
            config: Arc::new(config),
            store,
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(auth_public_routes())
        // Protected
        .merge(protected_routes(state.clone()))
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.security)),
        )
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new().route("/auth/login", post(auth::login_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{auth, tickets, users};

    Router::new()
        .route("/auth/me", get(auth::session_whoami))
        .route("/tickets", get(tickets::tickets_get).post(tickets::ticket_post))
        .route("/tickets/summary", get(tickets::summary_get))
        .route("/tickets/:id", get(tickets::ticket_get))
        .route("/tickets/:id/status", patch(tickets::status_patch))
        .route("/tickets/:id/priority", patch(tickets::priority_patch))
        .route("/tickets/:id/assign", patch(tickets::assign_patch))
        .route("/tickets/:id/comments", post(tickets::comment_post))
        .route("/users/agents", get(users::agents_get))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

/// Permissive when no origins are configured
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Give a fresh in-memory development store an account to log in with
pub async fn seed_demo_admin(users: &UserService) -> anyhow::Result<()> {
    let admin = users
        .seed_user(DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD, Some("Admin"), Role::Admin)
        .await?;
    info!("Demo login: {} / {} (user {})", admin.email, DEMO_ADMIN_PASSWORD, admin.id);
    Ok(())
}

/// Run the HTTP server until Ctrl-C, then release the store
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting helpdesk API in {:?} mode", config.environment);

    let handle = StoreHandle::open(&config.database).await?;
    let bind_addr = config.bind_addr();
    let seed_demo = !handle.is_persistent() && config.environment == Environment::Development;

    let state = AppState::new(config, handle.store.clone());
    if seed_demo {
        seed_demo_admin(&state.users).await?;
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Helpdesk API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    handle.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
