use sqlparser::ast::Statement;
use sqlparser::dialect::DuckDbDialect;
use sqlparser::parser::Parser;

/// Accepts only text that parses to exactly one query statement.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnlyPolicy;

impl ReadOnlyPolicy {
    pub fn check(&self, sql: &str) -> Result<(), String> {
        let statements = Parser::parse_sql(&DuckDbDialect {}, sql)
            .map_err(|e| format!("could not verify the statement is read-only: {}", e))?;

        match statements.as_slice() {
            [] => Err("no statement to run".to_string()),
            [Statement::Query(_)] => Ok(()),
            [other] => Err(format!(
                "only SELECT queries are allowed, got: {}",
                statement_kind(other)
            )),
            many => Err(format!("expected a single statement, got {}", many.len())),
        }
    }
}

fn statement_kind(statement: &Statement) -> String {
    statement
        .to_string()
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_uppercase()
}
