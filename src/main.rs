use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

mod config;
mod db;
mod llm;
mod pipeline;
mod schema;
mod util;
mod web;

use crate::config::{AppConfig, CliArgs};
use crate::db::gateway::QueryGateway;
use crate::db::ingest::load_top_scorers_csv;
use crate::llm::LlmManager;
use crate::pipeline::QueryPipeline;
use crate::schema::TableSchema;
use crate::util::logging::init_tracing;
use crate::web::state::AppState;
use crate::web::templates::init_templates;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Secrets may live in a .env file next to the binary
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let args = CliArgs::parse();

    // Initialize logging
    init_tracing(args.log_json);

    // Load configuration
    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    info!("Initializing DuckDB connection pool: {}", config.database.connection_string);
    let gateway = QueryGateway::connect(&config.database);

    if let Some(csv_path) = args.load_csv.clone() {
        let loader = gateway.clone();
        let rows = tokio::task::spawn_blocking(move || load_top_scorers_csv(&loader, &csv_path)).await??;
        println!("Loaded {} rows into top_scorers", rows);
        return Ok(ExitCode::SUCCESS);
    }

    check_table_shape(&gateway).await;

    // Initialize LLM manager
    info!("Initializing LLM manager with backend: {}", config.llm.backend);
    let llm_manager = LlmManager::new(&config.llm)?;
    let pipeline = QueryPipeline::new(llm_manager, gateway, config.llm.strip_markdown);

    if let Some(question) = &args.ask {
        let report = pipeline.answer(question).await.terminal_report();
        print!("{}", report.stdout);
        if let Some(notice) = &report.stderr {
            eprintln!("{}", notice);
        }
        return Ok(if report.success {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let template_env = init_templates()?;
    let app_state = Arc::new(AppState::new(config.clone(), pipeline, template_env));

    // Start the web server
    info!("Starting NL-SQL server on {}:{}", config.web.host, config.web.port);
    match web::run_server(config.web, app_state).await {
        Ok(_) => info!("Server stopped gracefully"),
        Err(e) => {
            error!("Server error: {}", e);
            return Err(e.into());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Warns when the configured database has no usable `top_scorers` table.
async fn check_table_shape(gateway: &QueryGateway) {
    let probe = gateway.clone();
    let schema = TableSchema::top_scorers();
    let table = schema.name.clone();

    match tokio::task::spawn_blocking(move || probe.table_columns(&table)).await {
        Ok(Ok(columns)) if columns.is_empty() => {
            warn!("Table {} not found; load it with --load-csv", schema.name)
        }
        Ok(Ok(columns)) => {
            let missing = schema.missing_columns(&columns);
            if !missing.is_empty() {
                warn!("Table {} is missing expected columns: {}", schema.name, missing.join(", "));
            }
        }
        Ok(Err(e)) => warn!("Could not inspect table {}: {}", schema.name, e),
        Err(e) => warn!("Schema check task failed: {}", e),
    }
}
