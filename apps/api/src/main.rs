//! Ventra API composition root.

#![forbid(unsafe_code)]

mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn;
use axum::routing::{delete, get, post};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use ventra_application::{
    AccessService, AuthorizationService, CompanyService, EmailService, InviteService,
};
use ventra_core::AppError;
use ventra_infrastructure::{
    ConsoleEmailService, PostgresAccessRepository, PostgresAuditRepository,
    PostgresAuthorizationRepository, PostgresCompanyRepository, PostgresInviteRepository,
    SmtpEmailConfig, SmtpEmailService, seed_permission_catalog,
};

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .unwrap_or_else(|_| "3001".to_owned())
        .parse::<u16>()
        .map_err(|error| AppError::Validation(format!("invalid API_PORT: {error}")))?;
    let email_provider = env::var("EMAIL_PROVIDER").unwrap_or_else(|_| "console".to_owned());

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    seed_permission_catalog(&pool).await?;

    if migrate_only {
        info!("migrations applied, exiting");
        return Ok(());
    }

    let email_service: Arc<dyn EmailService> = match email_provider.as_str() {
        "smtp" => {
            let smtp_port = required_non_empty_env("SMTP_PORT")?
                .parse::<u16>()
                .map_err(|error| AppError::Validation(format!("invalid SMTP_PORT: {error}")))?;

            let smtp_config = SmtpEmailConfig {
                host: required_non_empty_env("SMTP_HOST")?,
                port: smtp_port,
                username: required_non_empty_env("SMTP_USERNAME")?,
                password: required_non_empty_env("SMTP_PASSWORD")?,
                from_address: required_non_empty_env("SMTP_FROM_ADDRESS")?,
            };
            Arc::new(SmtpEmailService::new(smtp_config))
        }
        "console" => Arc::new(ConsoleEmailService::new()),
        _ => {
            return Err(AppError::Validation(format!(
                "EMAIL_PROVIDER must be either 'console' or 'smtp', got '{email_provider}'"
            )));
        }
    };

    let authorization_repository = Arc::new(PostgresAuthorizationRepository::new(pool.clone()));
    let authorization_service = AuthorizationService::new(authorization_repository);
    let company_repository = Arc::new(PostgresCompanyRepository::new(pool.clone()));
    let access_repository = Arc::new(PostgresAccessRepository::new(pool.clone()));
    let invite_repository = Arc::new(PostgresInviteRepository::new(pool.clone()));
    let audit_repository = Arc::new(PostgresAuditRepository::new(pool.clone()));

    let app_state = AppState {
        company_service: CompanyService::new(company_repository, audit_repository.clone()),
        access_service: AccessService::new(
            authorization_service.clone(),
            access_repository.clone(),
            audit_repository.clone(),
        ),
        invite_service: InviteService::new(
            authorization_service,
            invite_repository,
            access_repository,
            audit_repository,
            email_service,
            frontend_url.clone(),
        ),
    };

    let protected_routes = Router::new()
        .route(
            "/api/companies",
            get(handlers::companies::list_my_companies_handler)
                .post(handlers::companies::create_company_handler),
        )
        .route(
            "/api/access/companies/{company_id}/roles",
            get(handlers::access::list_roles_handler).post(handlers::access::create_role_handler),
        )
        .route(
            "/api/access/companies/{company_id}/roles/{role_id}",
            get(handlers::access::get_role_handler)
                .patch(handlers::access::update_role_handler)
                .delete(handlers::access::delete_role_handler),
        )
        .route(
            "/api/access/companies/{company_id}/permissions",
            get(handlers::access::permission_catalog_handler),
        )
        .route(
            "/api/access/companies/{company_id}/my-permissions",
            get(handlers::access::my_permissions_handler),
        )
        .route(
            "/api/access/companies/{company_id}/team",
            get(handlers::access::list_team_handler),
        )
        .route(
            "/api/access/companies/{company_id}/team/{membership_id}/role",
            post(handlers::access::change_member_role_handler),
        )
        .route(
            "/api/access/companies/{company_id}/team/{membership_id}",
            delete(handlers::access::remove_member_handler),
        )
        .route(
            "/api/invites/companies/{company_id}",
            post(handlers::invites::create_invite_handler),
        )
        .route(
            "/api/invites/companies/{company_id}/sent",
            get(handlers::invites::list_sent_invites_handler),
        )
        .route(
            "/api/invites/received",
            get(handlers::invites::list_received_invites_handler),
        )
        .route(
            "/api/invites/{invite_id}/accept",
            post(handlers::invites::accept_invite_handler),
        )
        .route(
            "/api/invites/{invite_id}/decline",
            post(handlers::invites::decline_invite_handler),
        )
        .route(
            "/api/invites/{invite_id}/cancel",
            post(handlers::invites::cancel_invite_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .route("/api/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "ventra-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
