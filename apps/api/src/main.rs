//! Taskhive API composition root.

#![forbid(unsafe_code)]

mod auth;
mod dto;
mod error;
mod handlers;
mod state;

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn;
use axum::routing::{delete, get, post, put};
use sqlx::postgres::PgPoolOptions;
use taskhive_application::{
    AuditLogRepository, AuditService, AuthorizationService, OrganizationHierarchy,
    OrganizationRepository, OrganizationService, RoleAssignmentRepository, ScopeService,
    SeedConfig, TaskRepository, TaskService, UserRepository, UserService, seed,
};
use taskhive_core::AppError;
use taskhive_infrastructure::{
    PostgresAuditLogRepository, PostgresOrganizationRepository,
    PostgresRoleAssignmentRepository, PostgresTaskRepository, PostgresUserRepository,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let command = env::args().nth(1);
    let migrate_only = command.as_deref() == Some("migrate");
    let seed_only = command.as_deref() == Some("seed");

    let database_url = required_env("DATABASE_URL")?;
    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);
    let cors_allowed_origin = env::var("CORS_ALLOWED_ORIGIN").ok();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let users: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(pool.clone()));
    let assignments: Arc<dyn RoleAssignmentRepository> =
        Arc::new(PostgresRoleAssignmentRepository::new(pool.clone()));
    let organizations: Arc<dyn OrganizationRepository> =
        Arc::new(PostgresOrganizationRepository::new(pool.clone()));
    let tasks: Arc<dyn TaskRepository> = Arc::new(PostgresTaskRepository::new(pool.clone()));
    let audit_log: Arc<dyn AuditLogRepository> =
        Arc::new(PostgresAuditLogRepository::new(pool.clone()));

    if seed_only {
        let config = seed_config_from_env();
        let summary = seed(&config, &organizations, &users, &assignments).await?;
        info!(
            organization_id = %summary.organization_id,
            owner_user_id = %summary.owner_user_id,
            created_organization = summary.created_organization,
            created_owner = summary.created_owner,
            "seed completed"
        );
        return Ok(());
    }

    let audit = AuditService::new(audit_log, users.clone());
    let authorization = AuthorizationService::new(
        users.clone(),
        assignments.clone(),
        organizations.clone(),
        audit.clone(),
    );
    let hierarchy = OrganizationHierarchy::new(organizations.clone());
    let scope = ScopeService::new(users.clone(), assignments.clone(), hierarchy.clone());
    let organization_service = OrganizationService::new(
        organizations,
        users.clone(),
        tasks.clone(),
        authorization.clone(),
        scope.clone(),
        audit.clone(),
    );
    let task_service = TaskService::new(
        tasks,
        users.clone(),
        authorization.clone(),
        scope.clone(),
        audit.clone(),
    );
    let user_service = UserService::new(
        users,
        assignments,
        authorization.clone(),
        scope.clone(),
        audit.clone(),
    );

    let app_state = AppState {
        authorization,
        audit,
        hierarchy,
        scope,
        organizations: organization_service,
        tasks: task_service,
        users: user_service,
    };

    let protected = Router::new()
        .route(
            "/tasks",
            get(handlers::tasks::list_tasks_handler).post(handlers::tasks::create_task_handler),
        )
        .route(
            "/tasks/{task_id}",
            get(handlers::tasks::get_task_handler)
                .put(handlers::tasks::update_task_handler)
                .delete(handlers::tasks::delete_task_handler),
        )
        .route(
            "/organizations",
            get(handlers::organizations::list_organizations_handler)
                .post(handlers::organizations::create_organization_handler),
        )
        .route(
            "/organizations/{organization_id}",
            get(handlers::organizations::get_organization_handler)
                .put(handlers::organizations::update_organization_handler)
                .delete(handlers::organizations::delete_organization_handler),
        )
        .route(
            "/organizations/{organization_id}/children",
            get(handlers::organizations::list_organization_children_handler),
        )
        .route("/me/scope", get(handlers::users::my_scope_handler))
        .route("/users", get(handlers::users::list_users_handler))
        .route("/users/{user_id}", get(handlers::users::get_user_handler))
        .route(
            "/users/{user_id}/roles",
            post(handlers::users::assign_role_handler),
        )
        .route(
            "/users/{user_id}/roles/{role}",
            delete(handlers::users::revoke_role_handler),
        )
        .route(
            "/users/{user_id}/deactivate",
            put(handlers::users::deactivate_user_handler),
        )
        .route("/audit-logs", get(handlers::audit::list_audit_log_handler))
        .route(
            "/audit-logs/export",
            get(handlers::audit::export_audit_log_handler),
        )
        .layer(from_fn(auth::require_identity));

    let mut router = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    if let Some(origin) = cors_allowed_origin {
        let origin = origin.parse::<HeaderValue>().map_err(|error| {
            AppError::Validation(format!("invalid CORS_ALLOWED_ORIGIN: {error}"))
        })?;
        router = router.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers(tower_http::cors::Any),
        );
    }

    let address: SocketAddr = format!("{api_host}:{api_port}")
        .parse()
        .map_err(|error| AppError::Validation(format!("invalid API_HOST/API_PORT: {error}")))?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(%address, "taskhive api listening");

    axum::serve(listener, router)
        .await
        .map_err(|error| AppError::Internal(format!("server error: {error}")))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name)
        .map_err(|_| AppError::Validation(format!("missing required environment variable {name}")))
}

fn seed_config_from_env() -> SeedConfig {
    SeedConfig {
        organization_name: env::var("SEED_ORGANIZATION_NAME")
            .unwrap_or_else(|_| "Default Organization".to_owned()),
        organization_description: env::var("SEED_ORGANIZATION_DESCRIPTION").ok(),
        owner_email: env::var("SEED_OWNER_EMAIL")
            .unwrap_or_else(|_| "owner@example.com".to_owned()),
        owner_first_name: env::var("SEED_OWNER_FIRST_NAME").unwrap_or_else(|_| "Default".to_owned()),
        owner_last_name: env::var("SEED_OWNER_LAST_NAME").unwrap_or_else(|_| "Owner".to_owned()),
    }
}
