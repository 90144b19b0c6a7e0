use crate::schema::TableSchema;
use std::sync::LazyLock;

static INSTRUCTIONS: LazyLock<String> =
    LazyLock::new(|| render_instructions(&TableSchema::top_scorers()));

/// The instruction template sent alongside every question.
pub fn instructions() -> &'static str {
    INSTRUCTIONS.as_str()
}

fn render_instructions(schema: &TableSchema) -> String {
    let columns = schema
        .columns
        .iter()
        .map(|col| format!("- {} ({})", col.name, col.data_type.to_sql_type()))
        .collect::<Vec<_>>()
        .join("\n");

    let example = schema
        .columns
        .iter()
        .find(|col| col.name == "xG Per Avg Match")
        .or_else(|| schema.columns.iter().find(|col| col.needs_quoting()))
        .map(|col| {
            format!(
                " For example, {} must be written as {}.",
                col.name,
                col.quoted_name()
            )
        })
        .unwrap_or_default();

    format!(
        r#"
### Instructions:
Your task is to convert a question in natural language into a single SQL query.
You are given one table named {table} with the following columns:

{columns}

Adhere to these rules:
- The name of the table is {table}. Never reference any other table.
- Whenever a column name contains one or more spaces, wrap it in double quotes everywhere it is referenced (SELECT, WHERE, GROUP BY, ORDER BY).{example}
- Directly address the question by selecting, filtering or aggregating only the columns it needs.
- Filter on the requested players, clubs, countries, leagues or years when the question names them.
- Respond with the SQL query only. Do not add commentary, do not use formatting markers such as ``` and do not write the word sql.
- If the question cannot be answered from this table, just say that you don't know.
"#,
        table = schema.name,
        columns = columns,
        example = example,
    )
}
