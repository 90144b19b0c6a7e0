pub mod db_pool;
pub mod gateway;
pub mod ingest;
pub mod policy;
pub mod table;

use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum GatewayError {
    PoolError(r2d2::Error),
    DatabaseError(duckdb::Error),
    ConversionError(String),
    Rejected(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::PoolError(err) => write!(f, "No database connection available: {}", err),
            GatewayError::DatabaseError(err) => write!(f, "{}", err),
            GatewayError::ConversionError(msg) => write!(f, "Failed to read result set: {}", msg),
            GatewayError::Rejected(msg) => write!(f, "Statement rejected: {}", msg),
        }
    }
}

impl Error for GatewayError {}

impl From<r2d2::Error> for GatewayError {
    fn from(err: r2d2::Error) -> Self {
        GatewayError::PoolError(err)
    }
}

impl From<duckdb::Error> for GatewayError {
    fn from(err: duckdb::Error) -> Self {
        GatewayError::DatabaseError(err)
    }
}

impl From<arrow::error::ArrowError> for GatewayError {
    fn from(err: arrow::error::ArrowError) -> Self {
        GatewayError::ConversionError(err.to_string())
    }
}
