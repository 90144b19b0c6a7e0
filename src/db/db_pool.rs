use crate::config::{DatabaseConfig, MySqlConfig};
use duckdb::Connection;
use r2d2::ManageConnection;
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Hands out connections to a single DuckDB database instance.
///
/// The database is opened on first use and every pooled connection is a
/// `try_clone` of it, so all connections see the same catalog (including an
/// in-memory one). When a MySQL server is configured it is attached once per
/// instance and selected with `USE` on every connection.
pub struct DuckDBConnectionManager {
    connection_string: String,
    mysql: Option<MySqlConfig>,
    root: Mutex<Option<Connection>>,
}

impl DuckDBConnectionManager {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            connection_string: config.connection_string.clone(),
            mysql: config.mysql.clone(),
            root: Mutex::new(None),
        }
    }

    fn open_root(&self) -> Result<Connection, duckdb::Error> {
        let conn = if self.connection_string == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(&self.connection_string)?
        };

        if let Some(mysql) = &self.mysql {
            conn.execute_batch("INSTALL mysql; LOAD mysql;")?;
            conn.execute_batch(&format!(
                "ATTACH '{}' AS {} (TYPE mysql)",
                mysql_dsn(mysql).replace('\'', "''"),
                quote_identifier(&mysql.database)
            ))?;
            info!(
                "Attached MySQL database {} at {}:{} as user {}",
                mysql.database, mysql.host, mysql.port, mysql.user
            );
        }

        info!("Opened DuckDB database: {}", self.connection_string);
        Ok(conn)
    }
}

impl ManageConnection for DuckDBConnectionManager {
    type Connection = Connection;
    type Error = duckdb::Error;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let mut root = self.root.lock().unwrap_or_else(PoisonError::into_inner);

        let conn = match root.as_ref() {
            Some(existing) => existing.try_clone()?,
            None => {
                let opened = self.open_root()?;
                let conn = opened.try_clone()?;
                *root = Some(opened);
                conn
            }
        };

        if let Some(mysql) = &self.mysql {
            conn.execute_batch(&format!("USE {}", quote_identifier(&mysql.database)))?;
        }

        Ok(conn)
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.execute_batch("SELECT 1")
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

/// libmysqlclient-style key/value string understood by DuckDB's mysql extension.
fn mysql_dsn(config: &MySqlConfig) -> String {
    let mut dsn = format!(
        "host={} port={} user={} database={}",
        dsn_value(&config.host),
        config.port,
        dsn_value(&config.user),
        dsn_value(&config.database)
    );
    if let Some(password) = &config.password {
        dsn.push_str(&format!(" password={}", dsn_value(password)));
    }
    dsn
}

/// Values with separators or quotes are single-quoted with backslash escapes.
fn dsn_value(value: &str) -> String {
    let needs_quoting = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '=' | '\'' | '"' | '\\'));

    if !needs_quoting {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if matches!(c, '\'' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
