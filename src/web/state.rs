use crate::config::AppConfig;
use crate::pipeline::QueryPipeline;
use minijinja::Environment;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared application state for the web server
pub struct AppState {
    pub config: AppConfig,
    pub pipeline: QueryPipeline,
    pub template_env: Environment<'static>,
    pub startup_time: chrono::DateTime<chrono::Utc>,
    questions_answered: AtomicU64,
}

impl AppState {
    pub fn new(config: AppConfig, pipeline: QueryPipeline, template_env: Environment<'static>) -> Self {
        Self {
            config,
            pipeline,
            template_env,
            startup_time: chrono::Utc::now(),
            questions_answered: AtomicU64::new(0),
        }
    }

    pub fn record_answer(&self) {
        self.questions_answered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn questions_answered(&self) -> u64 {
        self.questions_answered.load(Ordering::Relaxed)
    }
}
