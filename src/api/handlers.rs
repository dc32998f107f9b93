use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    Form, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::recommend::recommend_with_fallback;

use super::page;
use super::AppState;

/// Fields posted by the recommendation form
///
/// Both fields are optional; browsers submit empty strings for blank
/// inputs, which the fallback chain treats the same as absent.
#[derive(Debug, Deserialize)]
pub struct RecommendForm {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub genres: Option<String>,
}

/// Render the empty request form
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(page::render(&state.model, None))
}

/// Handle a submitted form and render the recommendations
pub async fn recommend(
    State(state): State<AppState>,
    Form(form): Form<RecommendForm>,
) -> Html<String> {
    let outcome = recommend_with_fallback(
        &state.model,
        form.user_id.as_deref(),
        form.genres.as_deref(),
        state.top_n,
    );
    tracing::info!(
        stage = ?outcome.stage,
        results = outcome.recommendations.len(),
        "Recommendation request served"
    );
    Html(page::render(&state.model, Some(&outcome)))
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
