//! # Server Configuration
//!
//! This module contains the router, shared state and OpenAPI document for the
//! Lunch Vote API.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use tokio::signal;
use tower_http::trace::TraceLayer;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{TokenService, auth_middleware};
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::handlers::{self, employees, menus, restaurants, tokens, votes, winners};
use crate::telemetry::trace_id_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub clock: Arc<dyn Clock>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    /// State backed by the wall clock.
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Self {
        Self::with_clock(config, db, Arc::new(SystemClock))
    }

    pub fn with_clock(config: AppConfig, db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        let tokens = Arc::new(TokenService::from_config(&config));
        Self {
            config: Arc::new(config),
            db,
            clock,
            tokens,
        }
    }

    /// The business day votes and menus are attributed to.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/employee/",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route(
            "/employee/{id}/",
            get(employees::get_employee)
                .patch(employees::update_employee)
                .delete(employees::delete_employee),
        )
        .route(
            "/restaurant/",
            get(restaurants::list_restaurants).post(restaurants::create_restaurant),
        )
        .route(
            "/restaurant/{id}/",
            get(restaurants::get_restaurant)
                .patch(restaurants::update_restaurant)
                .delete(restaurants::delete_restaurant),
        )
        .route("/menu/", get(menus::list_menus).post(menus::create_menu))
        .route(
            "/menu/{id}/",
            get(menus::get_menu)
                .patch(menus::update_menu)
                .delete(menus::delete_menu),
        )
        .route("/vote/", get(votes::list_votes).post(votes::create_vote))
        .route("/vote/{id}/", get(votes::get_vote))
        .route("/winning_restaurant/", get(winners::winning_restaurant))
        .route("/token/", post(tokens::obtain_token))
        .route("/token/refresh/", post(tokens::refresh_token))
        .route("/token/verify/", post(tokens::verify_token));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::from_fn(trace_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    // Resolve the configured bind address
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let app = create_app(AppState::new(config, db));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => tracing::error!(error = %err, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

struct BearerAuthAddon;

impl Modify for BearerAuthAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::employees::list_employees,
        crate::handlers::employees::create_employee,
        crate::handlers::employees::get_employee,
        crate::handlers::employees::update_employee,
        crate::handlers::employees::delete_employee,
        crate::handlers::restaurants::list_restaurants,
        crate::handlers::restaurants::create_restaurant,
        crate::handlers::restaurants::get_restaurant,
        crate::handlers::restaurants::update_restaurant,
        crate::handlers::restaurants::delete_restaurant,
        crate::handlers::menus::list_menus,
        crate::handlers::menus::create_menu,
        crate::handlers::menus::get_menu,
        crate::handlers::menus::update_menu,
        crate::handlers::menus::delete_menu,
        crate::handlers::votes::list_votes,
        crate::handlers::votes::create_vote,
        crate::handlers::votes::get_vote,
        crate::handlers::winners::winning_restaurant,
        crate::handlers::tokens::obtain_token,
        crate::handlers::tokens::refresh_token,
        crate::handlers::tokens::verify_token,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthResponse,
            crate::error::ApiError,
            crate::handlers::employees::EmployeeAccountInput,
            crate::handlers::employees::CreateEmployeeRequest,
            crate::handlers::employees::UpdateEmployeeRequest,
            crate::handlers::employees::EmployeeResponse,
            crate::handlers::restaurants::RestaurantAccountInput,
            crate::handlers::restaurants::CreateRestaurantRequest,
            crate::handlers::restaurants::UpdateRestaurantRequest,
            crate::handlers::restaurants::RestaurantResponse,
            crate::handlers::menus::CreateMenuRequest,
            crate::handlers::menus::UpdateMenuRequest,
            crate::handlers::menus::MenuResponse,
            crate::handlers::votes::CreateVoteRequest,
            crate::handlers::votes::VoteResponse,
            crate::handlers::tokens::TokenObtainRequest,
            crate::handlers::tokens::TokenRefreshRequest,
            crate::handlers::tokens::AccessTokenResponse,
            crate::handlers::tokens::TokenVerifyRequest,
            crate::handlers::tokens::TokenVerifyResponse,
            crate::auth::TokenPair,
            crate::voting::Winner,
        )
    ),
    modifiers(&BearerAuthAddon),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "auth", description = "JWT issuance and verification"),
        (name = "employees", description = "Employee accounts"),
        (name = "restaurants", description = "Restaurant accounts"),
        (name = "menus", description = "Daily menus"),
        (name = "votes", description = "Lunch votes and today's winner")
    ),
    info(
        title = "Lunch Vote API",
        description = "API for choosing where the office eats lunch",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
