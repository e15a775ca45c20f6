//! Gated statement execution and plan retrieval.

use crate::database::bind::bind_parameters;
use crate::database::gateway::Gateway;
use crate::database::result::{
    ExecutionOutcome, ExecutionPlan, PlanLine, QueryResult, StatementSummary,
};
use crate::error::Result;
use crate::security::SqlGate;
use std::sync::Arc;
use tracing::{info, instrument};

const SUCCESS_MESSAGE: &str = "Query executed successfully";

pub struct QueryExecutor {
    gateway: Arc<Gateway>,
    gate: SqlGate,
}

impl QueryExecutor {
    pub fn new(gateway: Arc<Gateway>, gate: SqlGate) -> Self {
        Self { gateway, gate }
    }

    /// Runs a statement after the safety gate and row limit.
    ///
    /// The reported `query` is the statement after the row limit was applied
    /// and before parameters were bound.
    #[instrument(skip(self, params), fields(params = params.len()))]
    pub async fn execute(&self, sql: &str, params: &[String]) -> Result<ExecutionOutcome> {
        self.gate.check(sql)?;

        let limited = self.gate.apply_row_limit(sql);
        let bound = bind_parameters(&limited, params)?;

        let (rows, elapsed) = self.gateway.run_timed(&bound).await?;
        let elapsed = elapsed.as_secs_f64();

        let outcome = match rows.columns {
            Some(columns) => {
                info!("Query returned {} rows in {:.3}s", rows.rows.len(), elapsed);
                ExecutionOutcome::Rows(QueryResult::new(columns, rows.rows, elapsed, limited))
            }
            None => {
                info!("Statement completed in {:.3}s", elapsed);
                ExecutionOutcome::Statement(StatementSummary {
                    message: SUCCESS_MESSAGE.to_string(),
                    execution_time_seconds: elapsed,
                    query: limited,
                })
            }
        };

        Ok(outcome)
    }

    /// Returns the textual `EXPLAIN` plan of `sql`, one entry per line.
    ///
    /// The statement is not passed through the safety gate; it is never
    /// executed, only planned.
    #[instrument(skip(self))]
    pub async fn explain(&self, sql: &str) -> Result<ExecutionPlan> {
        let rows = self.gateway.run(&format!("EXPLAIN {}", sql)).await?;

        let execution_plan = rows
            .rows
            .iter()
            .map(|row| PlanLine {
                plan_line: row.first().map(|c| c.to_text()).unwrap_or_default(),
            })
            .collect();

        Ok(ExecutionPlan { execution_plan })
    }
}
