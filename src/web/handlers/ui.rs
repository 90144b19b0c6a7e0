use axum::{
    extract::State,
    response::Html,
    Form,
};
use minijinja::context;
use serde::Deserialize;
use std::sync::Arc;

use crate::pipeline::Answer;
use crate::web::state::AppState;
use crate::web::templates::render_template;

#[derive(Debug, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub question: String,
}

// Main UI entry point
pub async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_template(
        &state.template_env,
        "index.html",
        context! { question => "" },
    ))
}

// Form submission: run the pipeline and render the result below the form
pub async fn ask_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AskForm>,
) -> Html<String> {
    let answer = state.pipeline.answer(&form.question).await;
    state.record_answer();

    Html(render_answer(&state, &answer))
}

fn render_answer(state: &AppState, answer: &Answer) -> String {
    let table = answer.outcome.as_ref().map(|outcome| outcome.table()).unwrap_or_default();

    render_template(
        &state.template_env,
        "index.html",
        context! {
            question => answer.question,
            sql => answer.sql,
            notice => answer.notice,
            columns => table.columns,
            rows => table.display_rows(),
            row_count => table.row_count(),
            elapsed_ms => answer.elapsed_ms,
        },
    )
}
