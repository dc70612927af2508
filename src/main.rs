mod auth;
mod config;
mod db;
mod error;
mod health;
mod logging;
mod response;
mod validation;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use auth::{
    handlers,
    middleware::enforce_policy,
    AuthService, CredentialStore, PgCredentialStore, Policy, PolicyGate, TokenService,
};
use config::{AppConfig, JwtConfig};

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    auth: Arc<AuthService>,
    tokens: Arc<TokenService>,
    store: Arc<dyn CredentialStore>,
}

impl AppState {
    /// Wire the token issuer and auth service around a credential store
    fn new(store: Arc<dyn CredentialStore>, jwt: &JwtConfig) -> Self {
        let tokens = Arc::new(TokenService::new(jwt));
        let auth = Arc::new(AuthService::new(store.clone(), tokens.clone()));
        Self { auth, tokens, store }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl FromRef<AppState> for Arc<dyn CredentialStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

/// Build the application router
///
/// Layer order, outermost first: request logger, CORS, then the policy
/// check on the protected routes.
fn create_router(state: AppState) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let authenticated = PolicyGate::new(state.tokens.clone(), Policy::Authenticated);

    let protected = Router::new()
        .route("/role/add", post(handlers::add_role))
        .route("/role/update", put(handlers::update_role))
        .route("/role/delete", delete(handlers::delete_role))
        .route("/user/:id", get(handlers::get_user_by_id))
        .route("/renew", post(handlers::renew))
        .route_layer(middleware::from_fn_with_state(authenticated, enforce_policy));

    let public = Router::new()
        .route("/role", get(handlers::get_roles))
        .route("/userroles", get(handlers::get_user_roles))
        .route("/user", get(handlers::get_users))
        .route("/login", post(handlers::login))
        .route("/register", post(handlers::register))
        .route("/assignrole", post(handlers::assign_role));

    Router::new()
        .nest("/api/auth", public.merge(protected))
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .layer(cors)
        .layer(middleware::from_fn(logging::request_logger))
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    logging::init_tracing();

    tracing::info!("SmileShop Auth API - Starting...");

    let config = AppConfig::from_env().expect("Invalid configuration");
    tracing::debug!(
        "Vendor endpoints: short_link={:?} send_sms={:?} send_sms_enabled={}",
        config.service_urls.short_link_api,
        config.service_urls.send_sms_api,
        config.service_urls.send_sms_api_enable
    );

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config)
        .await
        .expect("Failed to create database pool");

    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let store: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(db_pool));
    let app = create_router(AppState::new(store, &config.jwt));

    // Start the Axum server
    let addr = config.bind_address();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("SmileShop Auth API is running on http://{}", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}

#[cfg(test)]
mod tests;
