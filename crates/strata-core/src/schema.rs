//! Minimal column schema: just enough to dispatch counter-aware merge.
//!
//! Full column typing, key comparators, and DDL live outside this core;
//! the merge and transform paths only need to know which columns are
//! counters and whether they are static or clustered.

use serde::{Deserialize, Serialize};

use crate::errors::{MutationError, StrataResult};

/// Identifies a column within a schema.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ColumnId(pub u32);

/// Where a column's cells live within a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// One cell per clustered row.
    Regular,
    /// One cell per partition, in the static row.
    Static,
}

/// The only type distinction the conflict-resolution core needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// Shard-based distributed counter; merged by the counter engine.
    Counter,
    /// Anything else; merged by timestamp preference.
    Blob,
}

/// A single column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub id: ColumnId,
    pub name: String,
    pub kind: ColumnKind,
    pub column_type: ColumnType,
}

impl ColumnSpec {
    pub fn is_counter(&self) -> bool {
        self.column_type == ColumnType::Counter
    }
}

/// An ordered set of column definitions.
///
/// # Examples
///
/// ```
/// use strata_core::schema::{ColumnKind, ColumnType, Schema};
///
/// let schema = Schema::builder()
///     .with_column("c1", ColumnKind::Regular, ColumnType::Counter)
///     .with_column("s1", ColumnKind::Static, ColumnType::Counter)
///     .build();
/// assert!(schema.column_by_name("c1").unwrap().is_counter());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder {
            columns: Vec::new(),
        }
    }

    pub fn column(&self, id: ColumnId) -> StrataResult<&ColumnSpec> {
        self.columns
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| MutationError::UnknownColumn { column_id: id.0 }.into())
    }

    pub fn column_by_name(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }
}

/// Builder assigning column ids in declaration order.
pub struct SchemaBuilder {
    columns: Vec<ColumnSpec>,
}

impl SchemaBuilder {
    pub fn with_column(mut self, name: &str, kind: ColumnKind, column_type: ColumnType) -> Self {
        let id = ColumnId(self.columns.len() as u32);
        self.columns.push(ColumnSpec {
            id,
            name: name.to_string(),
            kind,
            column_type,
        });
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            columns: self.columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_declaration_order() {
        let schema = Schema::builder()
            .with_column("a", ColumnKind::Regular, ColumnType::Blob)
            .with_column("b", ColumnKind::Static, ColumnType::Counter)
            .build();
        assert_eq!(schema.column_by_name("a").unwrap().id, ColumnId(0));
        assert_eq!(schema.column_by_name("b").unwrap().id, ColumnId(1));
    }

    #[test]
    fn unknown_column_is_an_error() {
        let schema = Schema::builder().build();
        assert!(schema.column(ColumnId(3)).is_err());
    }
}
