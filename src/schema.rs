use serde::{Deserialize, Serialize};

pub const TOP_SCORERS: &str = "top_scorers";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Double,
    String,
}

impl DataType {
    pub fn to_sql_type(&self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Double => "DOUBLE",
            DataType::String => "VARCHAR",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnSchema {
    fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
        }
    }

    /// True when the column name has to be quoted to be referenced in SQL.
    pub fn needs_quoting(&self) -> bool {
        self.name.contains(' ')
    }

    /// The column name as it must appear in a statement.
    pub fn quoted_name(&self) -> String {
        if self.needs_quoting() {
            format!("\"{}\"", self.name)
        } else {
            self.name.clone()
        }
    }

    pub fn to_sql_definition(&self) -> String {
        format!("{} {}", self.quoted_name(), self.data_type.to_sql_type())
    }
}

/// The single table questions are answered against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn top_scorers() -> Self {
        use DataType::*;

        Self {
            name: TOP_SCORERS.to_string(),
            columns: vec![
                ColumnSchema::new("Country", String),
                ColumnSchema::new("League", String),
                ColumnSchema::new("Club", String),
                ColumnSchema::new("Player Names", String),
                ColumnSchema::new("Matches_Played", Integer),
                ColumnSchema::new("Substitution", Integer),
                ColumnSchema::new("Mins", Integer),
                ColumnSchema::new("Goals", Integer),
                ColumnSchema::new("xG", Double),
                ColumnSchema::new("xG Per Avg Match", Double),
                ColumnSchema::new("Shots", Integer),
                ColumnSchema::new("OnTarget", Integer),
                ColumnSchema::new("Shots Per Avg Match", Double),
                ColumnSchema::new("On Target Per Avg Match", Double),
                ColumnSchema::new("Year", Integer),
            ],
        }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Expected columns that are absent from `actual`, compared case-insensitively.
    pub fn missing_columns(&self, actual: &[String]) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|col| !actual.iter().any(|a| a.eq_ignore_ascii_case(&col.name)))
            .map(|col| col.name.as_str())
            .collect()
    }

    pub fn to_create_table_sql(&self) -> String {
        let columns_sql: Vec<String> = self.columns
            .iter()
            .map(|col| col.to_sql_definition())
            .collect();

        format!(
            "CREATE TABLE {} (\n    {}\n);",
            self.name,
            columns_sql.join(",\n    ")
        )
    }
}
