//! Declarative table descriptors.
//!
//! A descriptor is passive data: the columns a table is created with, plus
//! the column and foreign-key alterations that should hold on a live table.
//! Pending entries are advisory. Whether one is applied depends only on the
//! state of the tenant schema at the time of the run, never on history.

use serde::Serialize;
use std::fmt;

/// Whether a pending alteration adds or removes its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlterOp {
    /// The target must exist after the run.
    Add,
    /// The target must be absent after the run.
    Drop,
}

impl AlterOp {
    /// Returns the string representation of the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Drop => "drop",
        }
    }
}

impl fmt::Display for AlterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column a table is created with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// SQL type, emitted verbatim (e.g. `INT AUTO_INCREMENT`).
    pub sql_type: String,
    /// Whether `PRIMARY KEY` is appended.
    pub primary_key: bool,
    /// Whether `NOT NULL` is appended.
    pub not_null: bool,
}

impl ColumnDef {
    /// Creates a nullable, non-key column.
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            primary_key: false,
            not_null: false,
        }
    }

    /// Marks the column as the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Marks the column as `NOT NULL`.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }
}

/// A column that should be added to or dropped from an existing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingColumn {
    /// Column name.
    pub name: String,
    /// SQL type used when the column is added.
    pub sql_type: String,
    /// Existing column the new one is positioned after.
    pub insert_after: Option<String>,
    /// Add or drop.
    pub op: AlterOp,
}

impl PendingColumn {
    /// A column that must exist.
    pub fn add(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            insert_after: None,
            op: AlterOp::Add,
        }
    }

    /// A column that must not exist.
    pub fn drop(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: String::new(),
            insert_after: None,
            op: AlterOp::Drop,
        }
    }

    /// Positions an added column after `column`.
    #[must_use]
    pub fn after(mut self, column: impl Into<String>) -> Self {
        self.insert_after = Some(column.into());
        self
    }
}

/// A foreign key that should be added to or dropped from an existing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingForeignKey {
    /// Referencing column on the owning table.
    pub column: String,
    /// Referenced table, in the same tenant schema.
    pub referenced_table: String,
    /// Referenced column.
    pub referenced_column: String,
    /// Add or drop.
    pub op: AlterOp,
}

impl PendingForeignKey {
    /// A foreign key that must exist.
    pub fn add(
        column: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            referenced_table: referenced_table.into(),
            referenced_column: referenced_column.into(),
            op: AlterOp::Add,
        }
    }

    /// A foreign key that must not exist.
    pub fn drop(
        column: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Self {
            op: AlterOp::Drop,
            ..Self::add(column, referenced_table, referenced_column)
        }
    }
}

/// Immutable definition of one tenant table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    /// Table name, unique within its feature package.
    pub name: String,
    /// Columns in creation order.
    pub columns: Vec<ColumnDef>,
    /// Column alterations reconciled on every run.
    pub pending_columns: Vec<PendingColumn>,
    /// Foreign-key alterations reconciled on every run.
    pub pending_foreign_keys: Vec<PendingForeignKey>,
}

impl TableDescriptor {
    /// Starts a descriptor with no columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            pending_columns: Vec::new(),
            pending_foreign_keys: Vec::new(),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Appends a pending column alteration.
    ///
    /// Column alterations run before foreign keys. A column that is dropped
    /// must not also carry a pending foreign key, or the store rejects the
    /// drop while the key still exists.
    #[must_use]
    pub fn pending_column(mut self, column: PendingColumn) -> Self {
        self.pending_columns.push(column);
        self
    }

    /// Appends a pending foreign-key alteration.
    #[must_use]
    pub fn pending_foreign_key(mut self, foreign_key: PendingForeignKey) -> Self {
        self.pending_foreign_keys.push(foreign_key);
        self
    }

    /// The declared primary-key column, if any.
    pub fn primary_key(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// Whether `column` is part of the table once every pending alteration holds.
    pub fn has_column(&self, column: &str) -> bool {
        let pending = self.pending_columns.iter().rev().find(|p| p.name == column);
        match pending {
            Some(p) => p.op == AlterOp::Add,
            None => self.columns.iter().any(|c| c.name == column),
        }
    }
}
