//! Per-run outcome records.

use serde::Serialize;

use crate::provisioning::error::ProvisionError;
use crate::tenant::{Tenant, TenantSchema};

/// What a step tried to do to one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Action {
    /// Create the table.
    CreateTable,
    /// Add the named column.
    AddColumn(String),
    /// Drop the named column.
    DropColumn(String),
    /// Add a foreign key on the named column.
    AddForeignKey(String),
    /// Drop the foreign key on the named column.
    DropForeignKey(String),
}

/// How a step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    /// A statement ran and succeeded.
    Applied,
    /// The check showed nothing to do.
    AlreadySatisfied,
    /// The table is missing or unknown after the create pass.
    Skipped,
    /// The check or the statement failed.
    Failed(ProvisionError),
}

impl StepStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::AlreadySatisfied => "already_satisfied",
            Self::Skipped => "skipped",
            Self::Failed(_) => "failed",
        }
    }
}

impl Serialize for StepStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One check-then-act step of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    /// Table the step targeted.
    pub table: String,
    /// What the step did.
    pub action: Action,
    /// How it ended.
    pub status: StepStatus,
}

impl StepOutcome {
    /// The failure recorded for the step, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&ProvisionError> {
        match &self.status {
            StepStatus::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Outcome of one tenant's `provision` call.
///
/// Reaching a report at all means the schema step succeeded, which is the
/// run's overall success. Step failures are recorded but never change that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    /// Tenant schema.
    pub schema: TenantSchema,
    /// Whether the schema was created by this run.
    pub schema_created: bool,
    /// Steps in execution order.
    pub steps: Vec<StepOutcome>,
    /// Purchased feature names that matched no package, sorted.
    pub unknown_features: Vec<String>,
}

impl ProvisionReport {
    /// Number of statements that ran and succeeded, schema creation included.
    #[must_use]
    pub fn applied_count(&self) -> usize {
        usize::from(self.schema_created)
            + self
                .steps
                .iter()
                .filter(|s| s.status == StepStatus::Applied)
                .count()
    }

    /// Recorded step failures.
    pub fn failures(&self) -> impl Iterator<Item = &ProvisionError> {
        self.steps.iter().filter_map(StepOutcome::failure)
    }

    /// True when any step failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Steps with the given status.
    pub fn steps_with<'a>(
        &'a self,
        status: &'a StepStatus,
    ) -> impl Iterator<Item = &'a StepOutcome> + 'a {
        self.steps.iter().filter(move |s| &s.status == status)
    }
}

/// Result of one tenant inside a batch run.
#[derive(Debug, Clone)]
pub struct TenantRun {
    /// The tenant.
    pub tenant: Tenant,
    /// Its run result.
    pub result: Result<ProvisionReport, ProvisionError>,
}

impl TenantRun {
    /// Whether the tenant's schema step succeeded.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Result of a batch run over every tenant.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// One entry per tenant, in directory order.
    pub runs: Vec<TenantRun>,
}

impl BatchReport {
    /// Number of tenants whose run succeeded.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.runs.iter().filter(|r| r.succeeded()).count()
    }

    /// Number of tenants whose run failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.runs.len() - self.succeeded()
    }

    /// True when every tenant run succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(steps: Vec<StepOutcome>) -> ProvisionReport {
        ProvisionReport {
            schema: TenantSchema::parse("biz_acme").unwrap(),
            schema_created: true,
            steps,
            unknown_features: Vec::new(),
        }
    }

    #[test]
    fn test_counts() {
        let failure = ProvisionError::TableCreate {
            schema: "biz_acme".into(),
            table: "b".into(),
            reason: "boom".into(),
        };
        let report = report(vec![
            StepOutcome {
                table: "a".into(),
                action: Action::CreateTable,
                status: StepStatus::Applied,
            },
            StepOutcome {
                table: "b".into(),
                action: Action::CreateTable,
                status: StepStatus::Failed(failure.clone()),
            },
            StepOutcome {
                table: "b".into(),
                action: Action::AddColumn("c".into()),
                status: StepStatus::Skipped,
            },
        ]);

        assert_eq!(report.applied_count(), 2);
        assert!(report.has_failures());
        assert_eq!(report.failures().collect::<Vec<_>>(), [&failure]);
        assert_eq!(report.steps_with(&StepStatus::Skipped).count(), 1);
    }

    #[test]
    fn test_step_serializes_flat() {
        let step = StepOutcome {
            table: "crm_leads".into(),
            action: Action::AddColumn("source".into()),
            status: StepStatus::AlreadySatisfied,
        };
        assert_eq!(
            serde_json::to_value(&step).unwrap(),
            serde_json::json!({
                "table": "crm_leads",
                "action": { "kind": "add_column", "target": "source" },
                "status": "already_satisfied"
            })
        );
    }
}
