//! Initial control database migration.
//!
//! Creates the business directory and the confirmed purchase ledger. Tenant
//! tables never live here; they are provisioned into per-business schemas.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(BUSINESSES_SQL).await?;
        db.execute_unprepared(PACKAGE_PURCHASES_SQL).await?;
        db.execute_unprepared(PACKAGE_PURCHASES_INDEX_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS package_purchases")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS businesses").await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const BUSINESSES_SQL: &str = r"
CREATE TABLE IF NOT EXISTS businesses (
    id BINARY(16) NOT NULL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    unique_code VARCHAR(60) NOT NULL,
    is_active TINYINT(1) NOT NULL DEFAULT 1,
    created_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
    updated_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6) ON UPDATE CURRENT_TIMESTAMP(6),
    CONSTRAINT uq_businesses_unique_code UNIQUE (unique_code)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
";

// Lists are JSON arrays of strings, written once at purchase time.
const PACKAGE_PURCHASES_SQL: &str = r"
CREATE TABLE IF NOT EXISTS package_purchases (
    id BINARY(16) NOT NULL PRIMARY KEY,
    business_id BINARY(16) NOT NULL,
    package_id VARCHAR(64) NOT NULL,
    feature_names TEXT NOT NULL,
    granted_table_names TEXT NOT NULL,
    active_from DATETIME(6) NOT NULL,
    active_until DATETIME(6) NOT NULL,
    created_at DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
    CONSTRAINT fk_package_purchases_business
        FOREIGN KEY (business_id) REFERENCES businesses (id) ON DELETE CASCADE,
    CONSTRAINT chk_package_purchases_window CHECK (active_until >= active_from)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
";

const PACKAGE_PURCHASES_INDEX_SQL: &str = r"
CREATE INDEX idx_package_purchases_active
    ON package_purchases (business_id, active_until)
";
