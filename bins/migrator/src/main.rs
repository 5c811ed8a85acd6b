//! Database migration and tenant provisioning runner for Bizhub.
//!
//! Usage:
//!   migrator tenants        - Provision every active business
//!   migrator tenant <code>  - Provision one business
//!   migrator up             - Run all pending control database migrations
//!   migrator down           - Rollback last migration
//!   migrator status         - Show migration status
//!   migrator fresh          - Drop all tables and re-run migrations

use anyhow::{Context, bail};
use bizhub_db::ProvisioningService;
use bizhub_db::migration::Migrator;
use bizhub_shared::AppConfig;
use chrono::Utc;
use sea_orm_migration::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bizhub=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn service() -> anyhow::Result<ProvisioningService> {
    let config = AppConfig::load().context("loading configuration")?;
    let db = bizhub_db::connect_with(&config.database)
        .await
        .context("connecting to the control database")?;
    Ok(ProvisioningService::new(db, config.provisioning))
}

async fn provision_all() -> anyhow::Result<()> {
    let batch = service().await?.run_all(Utc::now()).await?;
    for run in &batch.runs {
        match &run.result {
            Ok(report) => info!(
                business = %run.tenant.code,
                applied = report.applied_count(),
                step_failures = report.failures().count(),
                "Tenant provisioned"
            ),
            Err(e) => error!(business = %run.tenant.code, error = %e, "Tenant failed"),
        }
    }
    info!(
        succeeded = batch.succeeded(),
        failed = batch.failed(),
        "Batch provisioning finished"
    );

    if !batch.all_succeeded() {
        bail!("{} tenant(s) failed to provision", batch.failed());
    }
    Ok(())
}

async fn provision_one(code: &str) -> anyhow::Result<()> {
    let report = service().await?.run_tenant(code, Utc::now()).await?;
    for failure in report.failures() {
        error!(business = code, error = %failure, "Step failed");
    }
    if !report.unknown_features.is_empty() {
        warn!(
            business = code,
            features = ?report.unknown_features,
            "Purchased features match no package"
        );
    }
    info!(
        business = code,
        schema = %report.schema,
        applied = report.applied_count(),
        "Tenant provisioned"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("tenants") => {
            init_tracing();
            provision_all().await
        }
        Some("tenant") => {
            init_tracing();
            let Some(code) = args.get(1) else {
                bail!("usage: migrator tenant <code>");
            };
            provision_one(code).await
        }
        _ => {
            // The migration CLI sets up its own tracing
            cli::run_cli(Migrator).await;
            Ok(())
        }
    }
}
