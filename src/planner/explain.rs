//! Explain output for planned and rejected queries

use std::fmt;

use serde::Serialize;

use super::errors::PlannerError;
use super::planner::{ProjectedColumn, QueryPlan};

/// Deterministic description of a plan, or of why planning failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplainPlan {
    /// Whether planning succeeded
    pub accepted: bool,
    /// Rendered filter sent to the index (WHERE AND type scope)
    pub filter: Option<String>,
    /// Types whose objects may be returned
    pub types: Vec<String>,
    /// Rendered sort keys
    pub sort: Vec<String>,
    /// Output columns; `*` for select-all
    pub columns: Vec<String>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    /// IN_TREE traversals cut short by the depth bound
    pub truncated_traversals: usize,
    /// Rejection reason (if rejected)
    pub rejection_reason: Option<String>,
    /// Rejection error code (if rejected)
    pub rejection_code: Option<String>,
}

impl ExplainPlan {
    /// Describes a successful plan
    pub fn from_plan(plan: &QueryPlan) -> Self {
        let mut columns = Vec::new();
        if plan.projection.select_all {
            columns.push("*".to_string());
        }
        columns.extend(plan.projection.columns.iter().map(|c| match c {
            ProjectedColumn::Property {
                alias, query_name, ..
            } => format!("{} AS {}", query_name, alias),
            ProjectedColumn::Score { alias } => format!("SCORE() AS {}", alias),
        }));

        Self {
            accepted: true,
            filter: Some(plan.combined_filter().to_string()),
            types: plan.included_type_ids.clone(),
            sort: plan.sort.iter().map(ToString::to_string).collect(),
            columns,
            skip: Some(plan.skip),
            limit: Some(plan.limit),
            truncated_traversals: plan.truncated_traversals,
            rejection_reason: None,
            rejection_code: None,
        }
    }

    /// Describes a planning failure
    pub fn from_error(err: &PlannerError) -> Self {
        Self {
            accepted: false,
            filter: None,
            types: Vec::new(),
            sort: Vec::new(),
            columns: Vec::new(),
            skip: None,
            limit: None,
            truncated_traversals: 0,
            rejection_reason: Some(err.to_string()),
            rejection_code: Some(err.code().to_string()),
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;

        if self.accepted {
            writeln!(f, "Status: ACCEPTED")?;
            if let Some(filter) = &self.filter {
                writeln!(f, "Filter: {}", filter)?;
            }
            writeln!(f, "Types: {}", self.types.join(", "))?;
            if !self.sort.is_empty() {
                writeln!(f, "Sort: {}", self.sort.join(", "))?;
            }
            if !self.columns.is_empty() {
                writeln!(f, "Columns:")?;
                for column in &self.columns {
                    writeln!(f, "  - {}", column)?;
                }
            }
            if let (Some(skip), Some(limit)) = (self.skip, self.limit) {
                writeln!(f, "Window: skip={} limit={}", skip, limit)?;
            }
            if self.truncated_traversals > 0 {
                writeln!(f, "Truncated IN_TREE traversals: {}", self.truncated_traversals)?;
            }
        } else {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
        }

        Ok(())
    }
}
