//! Platebook Catalog API Service
//!
//! Serves the labware catalog index over HTTP: lookup by PLR definition
//! identifier, catalog listing, identifier validation, and reload.

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use platebook_models::PlateRecord;
use platebook_utils::config::AppConfig;
use platebook_utils::logging::init_logging;

mod service;

use service::CatalogService;

#[tokio::main]
async fn main() -> Result<()> {
    // Logging is not up yet, so a broken config file goes to stderr
    // before the default takes over.
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration, using defaults: {}", e);
        AppConfig::default()
    });
    init_logging(&config.logging)?;
    info!("Starting Platebook Catalog API Service");

    // Load the catalog source and build the serving index
    let service = CatalogService::from_config(&config.catalog)?;

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/plates", get(list_plates))
        .route("/api/v1/plates/:identifier", get(get_plate))
        .route(
            "/api/v1/identifiers/:identifier/validate",
            get(validate_identifier),
        )
        .route("/api/v1/catalog/stats", get(catalog_stats))
        .route("/api/v1/catalog/reload", post(reload_catalog))
        .layer(TraceLayer::new_for_http())
        .with_state(service);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Catalog API Service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "catalog-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Plate record response
#[derive(Debug, Serialize)]
struct PlateResponse {
    identifier: String,
    part_number: Option<String>,
    description: Option<String>,
    material: Option<String>,
    total_volume_ul: Option<f64>,
    working_volume_min_ul: Option<f64>,
    working_volume_max_ul: Option<f64>,
    manufacturer: Option<String>,
    manufacturer_url: Option<String>,
    image_path: Option<String>,
    num_wells: Option<u32>,
    bottom: Option<String>,
}

impl From<PlateRecord> for PlateResponse {
    fn from(record: PlateRecord) -> Self {
        Self {
            identifier: record.identifier,
            part_number: record.part_number,
            description: record.description,
            material: record.material.map(|m| m.label().to_string()),
            total_volume_ul: record.total_volume.map(|v| v.as_microliters()),
            working_volume_min_ul: record
                .working_volume_range
                .map(|r| r.min.as_microliters()),
            working_volume_max_ul: record
                .working_volume_range
                .map(|r| r.max.as_microliters()),
            manufacturer: record.manufacturer,
            manufacturer_url: record.manufacturer_url,
            image_path: record.image_path,
            num_wells: record.num_wells,
            bottom: record.bottom.map(|b| b.code().to_string()),
        }
    }
}

async fn get_plate(
    State(service): State<CatalogService>,
    Path(identifier): Path<String>,
) -> Result<Json<PlateResponse>, (StatusCode, String)> {
    let plate = service.lookup(&identifier).await.ok_or((
        StatusCode::NOT_FOUND,
        format!("Plate {} not found", identifier),
    ))?;

    Ok(Json(plate.into()))
}

#[derive(Debug, Serialize)]
struct PlateListResponse {
    total: usize,
    plates: Vec<PlateResponse>,
}

async fn list_plates(State(service): State<CatalogService>) -> Json<PlateListResponse> {
    let plates: Vec<PlateResponse> = service.list().await.into_iter().map(Into::into).collect();

    Json(PlateListResponse {
        total: plates.len(),
        plates,
    })
}

/// Identifier validation response
#[derive(Debug, Serialize)]
struct IdentifierValidationResponse {
    identifier: String,
    is_well_formed: bool,
    in_catalog: bool,
    vendor_code: Option<String>,
    num_wells: Option<u32>,
    nominal_volume_ul: Option<f64>,
    bottom: Option<String>,
    errors: Vec<String>,
}

async fn validate_identifier(
    State(service): State<CatalogService>,
    Path(identifier): Path<String>,
) -> Json<IdentifierValidationResponse> {
    let validation = service.validate_identifier(&identifier).await;

    Json(IdentifierValidationResponse {
        identifier: validation.identifier,
        is_well_formed: validation.is_well_formed,
        in_catalog: validation.in_catalog,
        vendor_code: validation.parsed.as_ref().map(|p| p.vendor_code.clone()),
        num_wells: validation.parsed.as_ref().map(|p| p.num_wells),
        nominal_volume_ul: validation
            .parsed
            .as_ref()
            .map(|p| p.nominal_volume.as_microliters()),
        bottom: validation.parsed.as_ref().map(|p| p.bottom.code().to_string()),
        errors: validation.errors,
    })
}

#[derive(Debug, Serialize)]
struct CatalogStatsResponse {
    source: String,
    fingerprint: String,
    loaded_at: String,
    indexed: usize,
    rejected: usize,
    duplicates: usize,
    validation_errors: usize,
    validation_warnings: usize,
}

async fn catalog_stats(State(service): State<CatalogService>) -> Json<CatalogStatsResponse> {
    let stats = service.stats().await;

    Json(CatalogStatsResponse {
        source: stats.source,
        fingerprint: stats.fingerprint,
        loaded_at: stats.loaded_at.to_rfc3339(),
        indexed: stats.indexed,
        rejected: stats.rejected,
        duplicates: stats.duplicates,
        validation_errors: stats.validation_errors,
        validation_warnings: stats.validation_warnings,
    })
}

#[derive(Debug, Serialize)]
struct ReloadResponse {
    reloaded: bool,
    fingerprint: String,
    indexed: usize,
}

async fn reload_catalog(
    State(service): State<CatalogService>,
) -> Result<Json<ReloadResponse>, (StatusCode, String)> {
    let outcome = service
        .reload()
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(ReloadResponse {
        reloaded: outcome.reloaded,
        fingerprint: outcome.fingerprint,
        indexed: outcome.indexed,
    }))
}
