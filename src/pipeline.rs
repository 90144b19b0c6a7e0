use crate::db::gateway::QueryGateway;
use crate::db::table::QueryOutcome;
use crate::llm::prompt::instructions;
use crate::llm::sanitize::strip_markdown;
use crate::llm::LlmManager;
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

/// Everything produced for one submitted question.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub question: String,
    /// Statement sent to the database; `None` when generation failed.
    pub sql: Option<String>,
    /// `None` when the database step was skipped.
    pub outcome: Option<QueryOutcome>,
    /// User-facing message for any failure.
    pub notice: Option<String>,
    pub elapsed_ms: u64,
}

impl Answer {
    pub fn generation_failed(&self) -> bool {
        self.outcome.is_none()
    }

    pub fn query_failed(&self) -> bool {
        self.outcome.as_ref().is_some_and(QueryOutcome::is_error)
    }

    pub fn succeeded(&self) -> bool {
        self.notice.is_none()
    }

    /// Terminal rendering for the `--ask` one-shot mode.
    pub fn terminal_report(&self) -> TerminalReport {
        let mut stdout = String::new();
        if let Some(sql) = &self.sql {
            stdout.push_str(sql);
            stdout.push_str("\n\n");
        }
        if let Some(outcome) = &self.outcome {
            stdout.push_str(&outcome.table().render_text());
            stdout.push('\n');
        }

        TerminalReport {
            stdout,
            stderr: self.notice.clone(),
            success: self.succeeded(),
        }
    }
}

/// What the CLI prints for one answer and whether it exits successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalReport {
    pub stdout: String,
    pub stderr: Option<String>,
    pub success: bool,
}

/// Question -> model -> database.
pub struct QueryPipeline {
    llm: LlmManager,
    gateway: QueryGateway,
    strip_markdown: bool,
}

impl QueryPipeline {
    pub fn new(llm: LlmManager, gateway: QueryGateway, strip_markdown: bool) -> Self {
        Self {
            llm,
            gateway,
            strip_markdown,
        }
    }

    pub fn gateway(&self) -> &QueryGateway {
        &self.gateway
    }

    pub async fn answer(&self, question: &str) -> Answer {
        let start_time = Instant::now();
        info!("NL-query: {}", question);

        let generation = self.llm.generate(question, instructions()).await;
        let sql = if self.strip_markdown {
            strip_markdown(&generation.sql)
        } else {
            generation.sql
        };

        if sql.trim().is_empty() {
            let notice = generation
                .notice
                .unwrap_or_else(|| "The model returned an empty response".to_string());
            warn!("Skipping database step: {}", notice);
            return Answer {
                question: question.to_string(),
                sql: None,
                outcome: None,
                notice: Some(notice),
                elapsed_ms: start_time.elapsed().as_millis() as u64,
            };
        }

        info!("Generated SQL: {}", sql);
        let outcome = self.gateway.execute_async(sql.clone()).await;
        let notice = outcome
            .error_message()
            .map(|message| format!("Database query failed: {}", message));

        Answer {
            question: question.to_string(),
            sql: Some(sql),
            outcome: Some(outcome),
            notice,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        }
    }
}
