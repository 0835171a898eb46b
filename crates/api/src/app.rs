use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use shared::jwt::JwtConfig;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{require_admin, require_auth, require_staff, trace_id};
use crate::routes::{
    auth, dashboard, equipment, health, members, notifications, payments, reservations,
    services, subscriptions, users,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let jwt = Arc::new(JwtConfig::with_leeway(
        &config.jwt.secret,
        config.jwt.token_expiry_secs,
        config.jwt.leeway_secs,
    ));
    let config = Arc::new(config);

    let state = AppState {
        pool,
        config: config.clone(),
        jwt,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/login", post(auth::login))
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live));

    // Admin routes (admin role required)
    let admin_routes = Router::new()
        .route("/api/register", post(users::register))
        .route("/api/users", get(users::list_users))
        .route("/api/users/:id", get(users::get_user))
        .route("/api/users/:id", put(users::update_user))
        .route("/api/users/:id", delete(users::delete_user))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Staff routes (admin or manager; coaches are read-only elsewhere)
    let staff_routes = Router::new()
        // Members
        .route("/api/members", get(members::list).post(members::create))
        .route("/api/members/active", get(members::list_active))
        .route("/api/members/stats", get(members::stats))
        .route(
            "/api/members/:id",
            get(members::get).put(members::update).delete(members::remove),
        )
        .route(
            "/api/members/:id/subscriptions",
            get(subscriptions::list_for_member),
        )
        // Subscriptions
        .route(
            "/api/subscriptions",
            get(subscriptions::list).post(subscriptions::create),
        )
        .route("/api/subscriptions/expiring", get(subscriptions::expiring))
        .route(
            "/api/subscriptions/:id",
            get(subscriptions::get)
                .put(subscriptions::update)
                .delete(subscriptions::remove),
        )
        // Payments
        .route("/api/payments", get(payments::list).post(payments::create))
        .route(
            "/api/payments/financial-stats",
            get(payments::financial_stats),
        )
        .route(
            "/api/payments/:id",
            get(payments::get)
                .put(payments::update)
                .delete(payments::remove),
        )
        .route("/api/payments/:id/invoice", get(payments::invoice))
        // Catalog mutations
        .route("/api/services", post(services::create))
        .route(
            "/api/services/:id",
            put(services::update).delete(services::remove),
        )
        .route("/api/equipment", post(equipment::create))
        .route(
            "/api/equipment/:id",
            put(equipment::update).delete(equipment::remove),
        )
        .route_layer(middleware::from_fn(require_staff))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Protected routes (any authenticated staff account, coaches included)
    let protected_routes = Router::new()
        // Session
        .route("/api/logout", post(auth::logout))
        .route("/api/me", get(auth::me))
        // Dashboard
        .route("/api/dashboard/stats", get(dashboard::stats))
        // Notifications
        .route("/api/notifications", get(notifications::list))
        .route(
            "/api/notifications/:id/read",
            put(notifications::mark_read),
        )
        .route(
            "/api/notifications/read-all",
            put(notifications::mark_all_read),
        )
        // Catalog reads
        .route("/api/services", get(services::list))
        .route("/api/services/active", get(services::list_active))
        .route("/api/services/:id", get(services::get))
        .route("/api/equipment", get(equipment::list))
        .route("/api/equipment/available", get(equipment::list_available))
        .route(
            "/api/equipment/maintenance-due",
            get(equipment::list_maintenance_due),
        )
        .route("/api/equipment/:id", get(equipment::get))
        // Reservations
        .route(
            "/api/reservations",
            get(reservations::list).post(reservations::create),
        )
        .route(
            "/api/reservations/calendar-events",
            get(reservations::calendar_events),
        )
        .route("/api/reservations/upcoming", get(reservations::upcoming))
        .route("/api/reservations/stats", get(reservations::stats))
        .route(
            "/api/reservations/:id",
            get(reservations::get)
                .put(reservations::update)
                .delete(reservations::remove),
        )
        .route(
            "/api/reservations/:id/status",
            patch(reservations::update_status),
        )
        // Coaches (read-only, any role)
        .route("/api/users/coaches", get(users::list_coaches))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .merge(staff_routes)
        .merge(protected_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
