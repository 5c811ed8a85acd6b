//! Internal purchase and provisioning routes.
//!
//! Onboarding registers businesses, billing calls the purchase route once a
//! payment is confirmed, and deploy tooling calls the run routes. All of
//! them sit behind the internal token middleware.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use bizhub_core::provisioning::{
    BatchReport, ProvisionError, ProvisionReport, StepOutcome, TenantRun,
};
use bizhub_db::PurchaseOutcome;
use bizhub_db::repositories::NewPurchase;
use bizhub_core::tenant::Tenant;
use bizhub_shared::types::{BusinessId, PurchaseId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::AppState;
use crate::error::ApiError;

/// Creates internal provisioning routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/businesses", post(register_business))
        .route("/businesses/{code}/purchases", post(record_purchase))
        .route("/businesses/{code}/provision", post(run_tenant))
        .route("/provisioning/run", post(run_all))
}

/// A business to register.
#[derive(Debug, Deserialize)]
pub struct BusinessRequest {
    /// Display name.
    pub name: String,
    /// Unique code the schema name is derived from.
    pub unique_code: String,
}

/// A registered business and its schema.
#[derive(Debug, Serialize)]
pub struct BusinessResponse {
    /// Business ID.
    pub id: BusinessId,
    /// Unique code.
    pub unique_code: String,
    /// Schema its tables will live in.
    pub schema: String,
}

impl From<&Tenant> for BusinessResponse {
    fn from(tenant: &Tenant) -> Self {
        Self {
            id: tenant.business_id,
            unique_code: tenant.code.clone(),
            schema: tenant.schema.to_string(),
        }
    }
}

/// A confirmed purchase.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    /// Billing package identifier.
    pub package_id: String,
    /// Purchased feature package names.
    pub feature_names: Vec<String>,
    /// Optional restriction to specific tables.
    #[serde(default)]
    pub granted_table_names: Vec<String>,
    /// Start of the window; defaults to now.
    #[serde(default)]
    pub active_from: Option<DateTime<Utc>>,
    /// End of the window (inclusive).
    pub active_until: DateTime<Utc>,
}

/// Query parameters for run routes.
#[derive(Debug, Default, Deserialize)]
pub struct RunParams {
    /// Instant used to decide which purchases are active; defaults to now.
    pub as_of: Option<DateTime<Utc>>,
}

/// A failure as reported over the wire.
#[derive(Debug, Serialize)]
pub struct FailureResponse {
    /// Machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl From<&ProvisionError> for FailureResponse {
    fn from(err: &ProvisionError) -> Self {
        Self {
            code: err.error_code(),
            message: err.to_string(),
        }
    }
}

/// One tenant's provisioning report.
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    /// Tenant schema name.
    pub schema: String,
    /// Whether the run created the schema.
    pub schema_created: bool,
    /// Statements applied, schema creation included.
    pub applied: usize,
    /// Steps in execution order.
    pub steps: Vec<StepOutcome>,
    /// Step failures with their reasons.
    pub failures: Vec<FailureResponse>,
    /// Purchased feature names that matched no package.
    pub unknown_features: Vec<String>,
}

impl From<&ProvisionReport> for ReportResponse {
    fn from(report: &ProvisionReport) -> Self {
        Self {
            schema: report.schema.to_string(),
            schema_created: report.schema_created,
            applied: report.applied_count(),
            steps: report.steps.clone(),
            failures: report.failures().map(FailureResponse::from).collect(),
            unknown_features: report.unknown_features.clone(),
        }
    }
}

/// Outcome of a run that may not have produced a report.
#[derive(Debug, Serialize)]
pub struct RunResponse {
    /// Whether the schema step succeeded.
    pub ok: bool,
    /// The report, when the run got that far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportResponse>,
    /// Why the run stopped, when it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureResponse>,
}

impl From<&Result<ProvisionReport, ProvisionError>> for RunResponse {
    fn from(result: &Result<ProvisionReport, ProvisionError>) -> Self {
        match result {
            Ok(report) => Self {
                ok: true,
                report: Some(report.into()),
                error: None,
            },
            Err(e) => Self {
                ok: false,
                report: None,
                error: Some(e.into()),
            },
        }
    }
}

/// One tenant within a batch.
#[derive(Debug, Serialize)]
pub struct TenantRunResponse {
    /// Business unique code.
    pub business_code: String,
    /// Run outcome.
    #[serde(flatten)]
    pub run: RunResponse,
}

impl From<&TenantRun> for TenantRunResponse {
    fn from(run: &TenantRun) -> Self {
        Self {
            business_code: run.tenant.code.clone(),
            run: (&run.result).into(),
        }
    }
}

/// Batch run summary.
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    /// Tenants whose schema step succeeded.
    pub succeeded: usize,
    /// Tenants whose run failed.
    pub failed: usize,
    /// Per-tenant outcomes in directory order.
    pub tenants: Vec<TenantRunResponse>,
}

impl From<&BatchReport> for BatchResponse {
    fn from(batch: &BatchReport) -> Self {
        Self {
            succeeded: batch.succeeded(),
            failed: batch.failed(),
            tenants: batch.runs.iter().map(TenantRunResponse::from).collect(),
        }
    }
}

/// Stored purchase summary.
#[derive(Debug, Serialize)]
pub struct PurchaseSummary {
    /// Purchase ID.
    pub id: PurchaseId,
    /// Billing package identifier.
    pub package_id: String,
    /// Purchased feature package names.
    pub feature_names: Vec<String>,
    /// Granted table names.
    pub granted_table_names: Vec<String>,
    /// Start of the window.
    pub active_from: DateTime<Utc>,
    /// End of the window.
    pub active_until: DateTime<Utc>,
}

/// Response for a recorded purchase.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    /// The stored purchase.
    pub purchase: PurchaseSummary,
    /// Provisioning triggered by it.
    pub provisioning: RunResponse,
}

impl From<&PurchaseOutcome> for PurchaseResponse {
    fn from(outcome: &PurchaseOutcome) -> Self {
        let grant = outcome.purchase.grant();
        Self {
            purchase: PurchaseSummary {
                id: outcome.purchase.id,
                package_id: outcome.purchase.package_id.clone(),
                feature_names: grant.feature_names,
                granted_table_names: grant.table_names,
                active_from: outcome.purchase.active_from,
                active_until: outcome.purchase.active_until,
            },
            provisioning: (&outcome.provisioning).into(),
        }
    }
}

async fn register_business(
    State(state): State<AppState>,
    Json(request): Json<BusinessRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tenant = state
        .provisioning
        .register_business(&request.name, &request.unique_code)
        .await?;
    Ok((StatusCode::CREATED, Json(BusinessResponse::from(&tenant))))
}

async fn record_purchase(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<PurchaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = NewPurchase {
        package_id: request.package_id,
        feature_names: request.feature_names,
        granted_table_names: request.granted_table_names,
        active_from: request.active_from.unwrap_or_else(Utc::now),
        active_until: request.active_until,
    };

    let outcome = state.provisioning.record_purchase(&code, &input).await?;
    Ok((StatusCode::CREATED, Json(PurchaseResponse::from(&outcome))))
}

async fn run_tenant(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(params): Query<RunParams>,
) -> Result<Json<ReportResponse>, ApiError> {
    let as_of = params.as_of.unwrap_or_else(Utc::now);
    let report = state.provisioning.run_tenant(&code, as_of).await?;
    Ok(Json(ReportResponse::from(&report)))
}

async fn run_all(
    State(state): State<AppState>,
    Query(params): Query<RunParams>,
) -> Result<Json<BatchResponse>, ApiError> {
    let as_of = params.as_of.unwrap_or_else(Utc::now);
    info!(%as_of, "Batch provisioning requested");
    let batch = state.provisioning.run_all(as_of).await?;
    Ok(Json(BatchResponse::from(&batch)))
}
