//! Auditrail API composition root.

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

use auditrail_application::{
    AuditEventStore, AuditService, SessionRecordStore, StandardResponsiblePopulator,
    SystemIdentity, TransactionBridge, TransactionRecordStore,
};
use auditrail_core::AuditError;
use auditrail_domain::AuditSubject;
use auditrail_infrastructure::{InMemoryAuditStore, PostgresAuditStore, UuidIdentifierGenerator};
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AuditError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let audit_store = env::var("AUDIT_STORE").unwrap_or_else(|_| "memory".to_owned());
    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);

    let system = env::var("SYSTEM_SUBJECT_ID")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(AuditSubject::new)
        .transpose()?;
    let system_address = env::var("SYSTEM_ADDRESS")
        .ok()
        .filter(|value| !value.trim().is_empty());
    let system_identity = SystemIdentity {
        system,
        system_address,
    };

    if migrate_only && audit_store != "postgres" {
        return Err(AuditError::InvalidArgument(
            "the migrate command requires AUDIT_STORE=postgres".to_owned(),
        ));
    }

    let (session_store, transaction_store, event_store): (
        Arc<dyn SessionRecordStore>,
        Arc<dyn TransactionRecordStore>,
        Arc<dyn AuditEventStore>,
    ) = match audit_store.as_str() {
        "memory" => {
            let store = Arc::new(InMemoryAuditStore::new());
            (store.clone(), store.clone(), store)
        }
        "postgres" => {
            let database_url = required_env("DATABASE_URL")?;

            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(&database_url)
                .await
                .map_err(|error| {
                    AuditError::Store(format!("failed to connect to database: {error}"))
                })?;

            sqlx::migrate!("../../crates/infrastructure/migrations")
                .run(&pool)
                .await
                .map_err(|error| AuditError::Store(format!("failed to run migrations: {error}")))?;

            if migrate_only {
                info!("database migrations applied successfully");
                return Ok(());
            }

            let store = Arc::new(PostgresAuditStore::new(pool));
            (store.clone(), store.clone(), store)
        }
        _ => {
            return Err(AuditError::InvalidArgument(format!(
                "AUDIT_STORE must be either 'memory' or 'postgres', got '{audit_store}'"
            )));
        }
    };

    let id_generator = Arc::new(UuidIdentifierGenerator::new());
    let audit_service = AuditService::new(
        session_store.clone(),
        transaction_store.clone(),
        event_store.clone(),
        id_generator,
        system_identity,
    );
    let transaction_bridge = TransactionBridge::new(audit_service.clone());

    let app_state = AppState {
        audit_service,
        transaction_bridge,
        session_store,
        transaction_store,
        event_store,
        responsible_populator: Arc::new(StandardResponsiblePopulator::new()),
    };

    let api_routes = Router::new()
        .route(
            "/api/sessions",
            post(handlers::sessions::create_session_handler),
        )
        .route(
            "/api/sessions/{record_id}",
            get(handlers::sessions::get_session_handler),
        )
        .route(
            "/api/sessions/{record_id}/end",
            post(handlers::sessions::end_session_handler),
        )
        .route(
            "/api/sessions/{record_id}/responsible",
            put(handlers::sessions::update_responsible_handler),
        )
        .route(
            "/api/transactions",
            post(handlers::transactions::create_transaction_handler),
        )
        .route(
            "/api/transactions/{record_id}/end",
            post(handlers::transactions::end_transaction_handler),
        )
        .route(
            "/api/events/lifecycle",
            post(handlers::events::create_life_cycle_event_handler),
        )
        .route(
            "/api/events/business",
            post(handlers::events::create_business_event_handler),
        )
        .route(
            "/api/events/consumption",
            post(handlers::events::create_consumption_event_handler),
        )
        .route(
            "/api/events/membership",
            post(handlers::events::create_membership_change_event_handler),
        )
        .route(
            "/api/events/{record_id}",
            get(handlers::events::get_event_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::audit_scope,
        ));

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host).map_err(|error| {
        AuditError::InvalidArgument(format!("invalid API_HOST '{api_host}': {error}"))
    })?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AuditError::Store(format!("failed to bind listener: {error}")))?;

    info!(%address, "auditrail-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AuditError::Store(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AuditError> {
    env::var(name).map_err(|_| AuditError::InvalidArgument(format!("{name} is required")))
}
