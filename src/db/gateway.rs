use crate::config::DatabaseConfig;
use crate::db::db_pool::DuckDBConnectionManager;
use crate::db::policy::ReadOnlyPolicy;
use crate::db::table::{QueryOutcome, Table};
use crate::db::GatewayError;
use arrow::record_batch::RecordBatch;
use r2d2::{Pool, PooledConnection};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Runs statements against the configured database.
///
/// Every call checks a connection out of the pool for its own duration only,
/// so one gateway serves any number of sequential or concurrent queries.
#[derive(Clone)]
pub struct QueryGateway {
    pool: Pool<DuckDBConnectionManager>,
    policy: Option<ReadOnlyPolicy>,
}

impl QueryGateway {
    /// Builds the pool and probes one connection. A failed probe is logged and
    /// the gateway is returned anyway; queries report the failure later.
    pub fn connect(config: &DatabaseConfig) -> Self {
        let manager = DuckDBConnectionManager::new(config);
        let pool = Pool::builder()
            .max_size(config.pool_size.max(1) as u32)
            .min_idle(Some(0))
            .connection_timeout(Duration::from_secs(config.connect_timeout_secs.max(1)))
            .build_unchecked(manager);

        match pool.get() {
            Ok(_) => info!("Database connection established: {}", config.connection_string),
            Err(e) => error!("Connection failed! Database error: {}", e),
        }

        let policy = config.read_only.then_some(ReadOnlyPolicy);
        if policy.is_some() {
            info!("Read-only statement policy enabled");
        }

        Self { pool, policy }
    }

    /// Runs `sql` verbatim and reports rows, an empty result, or the error.
    pub fn execute(&self, sql: &str) -> QueryOutcome {
        let start_time = Instant::now();
        debug!("Executing SQL: {}", sql);

        let result = self.check_policy(sql).and_then(|_| self.fetch(sql));
        match result {
            Ok(table) => {
                info!(
                    "Query executed successfully. Row count: {}, Execution time: {}ms",
                    table.row_count(),
                    start_time.elapsed().as_millis()
                );
                QueryOutcome::from_table(table)
            }
            Err(e) => {
                error!("Query failed! {}", e);
                QueryOutcome::QueryError {
                    message: e.to_string(),
                }
            }
        }
    }

    /// [`execute`](Self::execute) on the blocking thread pool.
    pub async fn execute_async(&self, sql: String) -> QueryOutcome {
        let gateway = self.clone();
        match tokio::task::spawn_blocking(move || gateway.execute(&sql)).await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                error!("Task join error: {}", join_err);
                QueryOutcome::QueryError {
                    message: format!("Database task execution failed: {}", join_err),
                }
            }
        }
    }

    fn check_policy(&self, sql: &str) -> Result<(), GatewayError> {
        match &self.policy {
            Some(policy) => policy.check(sql).map_err(|msg| {
                warn!("Rejected statement: {}", msg);
                GatewayError::Rejected(msg)
            }),
            None => Ok(()),
        }
    }

    /// Checks out a connection; it returns to the pool when dropped.
    pub fn connection(&self) -> Result<PooledConnection<DuckDBConnectionManager>, GatewayError> {
        Ok(self.pool.get()?)
    }

    fn fetch(&self, sql: &str) -> Result<Table, GatewayError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql)?;
        let arrow_batch = stmt.query_arrow([])?;
        let schema = arrow_batch.get_schema();
        let record_batches: Vec<RecordBatch> = arrow_batch.collect();

        Table::from_batches(&schema, &record_batches)
    }

    /// Column names of `table` in ordinal order; empty when the table does not exist.
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>, GatewayError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT column_name FROM information_schema.columns
             WHERE table_name = ? AND table_catalog = current_database()
             ORDER BY ordinal_position",
        )?;
        let columns = stmt
            .query_map([table], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    pub fn ping(&self) -> bool {
        self.pool.get().is_ok()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::config::AppConfig;
    use crate::schema::TableSchema;

    pub fn memory_gateway(read_only: bool) -> QueryGateway {
        let mut config = AppConfig::default().database;
        config.connection_string = ":memory:".into();
        config.read_only = read_only;
        QueryGateway::connect(&config)
    }

    /// In-memory gateway with a small `top_scorers` table.
    pub fn seeded_gateway() -> QueryGateway {
        let gateway = memory_gateway(false);
        let conn = gateway.connection().unwrap();
        conn.execute_batch(&TableSchema::top_scorers().to_create_table_sql())
            .unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO top_scorers VALUES
              ('England', 'Premier League', 'Manchester City', 'Erling Haaland', 35, 2, 2769, 36, 28.5, 0.93, 147, 64, 4.78, 2.08, 2023),
              ('Germany', 'Bundesliga', 'Bayern Munich', 'Harry Kane', 32, 0, 2853, 36, 29.2, 0.92, 143, 66, 4.51, 2.08, 2024),
              ('France', 'Ligue 1', 'Paris Saint-Germain', 'Kylian Mbappe', 34, 5, 2662, 29, 25.3, 0.86, 132, 62, 4.46, 2.10, 2023),
              ('Italy', 'Serie A', 'Napoli', 'Victor Osimhen', 32, 1, 2567, 26, 21.4, 0.75, 120, 49, 4.21, 1.72, 2023),
              ('Spain', 'La Liga', 'Barcelona', 'Robert Lewandowski', 34, 0, 2913, 23, 20.1, 0.62, 118, 51, 3.65, 1.58, 2022);
            "#,
        )
        .unwrap();
        gateway
    }
}
