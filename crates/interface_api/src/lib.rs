//! HTTP API Layer
//!
//! This crate provides the REST API for the clinic ledger using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for patients, medicines, services, bills,
//!   dashboard reports and identifiers
//! - **Middleware**: Bearer authentication, tracing, audit logging
//! - **DTOs**: camelCase request/response bodies
//! - **Error Handling**: `{ error, message }` bodies with one status per error kind
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(Arc::new(MemoryStore::new()), config);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use core_kernel::HealthCheckable;
use domain_analytics::AnalyticsService;
use domain_billing::LedgerService;
use domain_catalog::CatalogService;
use domain_inventory::InventoryService;
use domain_patient::PatientService;
use infra_db::ClinicStore;

use crate::config::ApiConfig;
use crate::handlers::{auth as login, bills, dashboard, health, identifiers, medicines, patients, services};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub patients: Arc<PatientService>,
    pub inventory: Arc<InventoryService>,
    pub catalog: Arc<CatalogService>,
    pub ledger: Arc<LedgerService>,
    pub analytics: Arc<AnalyticsService>,
    pub health: Arc<dyn HealthCheckable>,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires every service to one store
    pub fn new<S: ClinicStore>(store: Arc<S>, config: ApiConfig) -> Self {
        Self {
            patients: Arc::new(PatientService::new(store.clone(), store.clone())),
            inventory: Arc::new(InventoryService::new(store.clone(), store.clone())),
            catalog: Arc::new(CatalogService::new(store.clone(), store.clone())),
            ledger: Arc::new(LedgerService::new(store.clone(), config.billing_settings())),
            analytics: Arc::new(AnalyticsService::new(store.clone(), config.currency)),
            health: store,
            config,
        }
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let patient_routes = Router::new()
        .route("/", get(patients::list_patients).post(patients::create_patient))
        .route(
            "/:id",
            get(patients::get_patient)
                .put(patients::update_patient)
                .delete(patients::delete_patient),
        )
        .route("/:id/visits", post(patients::record_visit));

    let medicine_routes = Router::new()
        .route("/", get(medicines::list_medicines).post(medicines::create_medicine))
        .route("/alerts", get(medicines::stock_alerts))
        .route(
            "/:id",
            get(medicines::get_medicine)
                .put(medicines::update_medicine)
                .delete(medicines::delete_medicine),
        )
        .route("/:id/stock", patch(medicines::adjust_stock));

    let service_routes = Router::new()
        .route("/", get(services::list_services).post(services::create_service))
        .route(
            "/:id",
            get(services::get_service)
                .put(services::update_service)
                .delete(services::deactivate_service),
        );

    let bill_routes = Router::new()
        .route("/", get(bills::list_bills).post(bills::create_bill))
        .route("/:id", get(bills::get_bill).delete(bills::delete_bill))
        .route("/:id/payment", patch(bills::update_payment));

    let dashboard_routes = Router::new()
        .route("/summary", get(dashboard::summary))
        .route("/revenue", get(dashboard::revenue))
        .route("/trend", get(dashboard::trend))
        .route("/top-services", get(dashboard::top_services))
        .route("/top-medicines", get(dashboard::top_medicines));

    // Protected API routes
    let protected_routes = Router::new()
        .nest("/patients", patient_routes)
        .nest("/medicines", medicine_routes)
        .nest("/services", service_routes)
        .nest("/bills", bill_routes)
        .nest("/dashboard", dashboard_routes)
        .route("/identifiers/:kind/next", post(identifiers::next_identifier))
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api_routes = Router::new()
        .route("/auth/login", post(login::login))
        .merge(protected_routes);

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
