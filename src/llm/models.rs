use serde::{Deserialize, Serialize};

// Output of one model call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    pub sql: String,
    pub notice: Option<String>,
}

impl Generation {
    pub fn from_text(sql: String) -> Self {
        Self { sql, notice: None }
    }

    pub fn failed(notice: String) -> Self {
        Self {
            sql: String::new(),
            notice: Some(notice),
        }
    }
}
