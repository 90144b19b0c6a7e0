use crate::db::gateway::QueryGateway;
use crate::db::GatewayError;
use crate::schema::TableSchema;
use std::path::Path;
use tracing::{info, warn};

/// Replaces the `top_scorers` table with the contents of a CSV file.
///
/// Column types are inferred by DuckDB's `read_csv_auto`; returns the number of
/// rows loaded.
pub fn load_top_scorers_csv(gateway: &QueryGateway, path: &Path) -> Result<usize, GatewayError> {
    let schema = TableSchema::top_scorers();
    let conn = gateway.connection()?;

    let load_sql = format!(
        "CREATE OR REPLACE TABLE {} AS SELECT * FROM read_csv_auto('{}', header = true)",
        schema.name,
        path.to_string_lossy().replace('\'', "''")
    );
    conn.execute_batch(&load_sql)?;

    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", schema.name), [], |row| {
        row.get(0)
    })?;
    info!("Loaded {} rows into {} from {}", count, schema.name, path.display());

    drop(conn);
    let missing = schema
        .missing_columns(&gateway.table_columns(&schema.name)?)
        .join(", ");
    if !missing.is_empty() {
        warn!("Loaded table {} is missing expected columns: {}", schema.name, missing);
    }

    Ok(count as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::gateway::testing::memory_gateway;
    use crate::db::table::QueryOutcome;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_load_csv_replaces_table() {
        let path = std::env::temp_dir().join(format!("nl-sql-top-scorers-{}.csv", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Country,League,Club,Player Names,Matches_Played,Substitution,Mins,Goals,xG,xG Per Avg Match,Shots,OnTarget,Shots Per Avg Match,On Target Per Avg Match,Year").unwrap();
        writeln!(file, "England,Premier League,Manchester City,Erling Haaland,35,2,2769,36,28.5,0.93,147,64,4.78,2.08,2023").unwrap();
        writeln!(file, "Germany,Bundesliga,Bayern Munich,Harry Kane,32,0,2853,36,29.2,0.92,143,66,4.51,2.08,2024").unwrap();
        drop(file);

        let gateway = memory_gateway(false);
        let loaded = load_top_scorers_csv(&gateway, &path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, 2);
        let outcome = gateway.execute(
            "SELECT \"Player Names\" FROM top_scorers WHERE Year = 2024 AND \"xG Per Avg Match\" > 0.9",
        );
        match outcome {
            QueryOutcome::Rows(table) => assert_eq!(table.rows, vec![vec![json!("Harry Kane")]]),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let gateway = memory_gateway(false);
        assert!(load_top_scorers_csv(&gateway, Path::new("/nonexistent/top_scorers.csv")).is_err());
    }
}
