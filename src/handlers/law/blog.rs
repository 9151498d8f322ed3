// handlers/law/blog.rs - POST /api/law/blog handler

use axum::{body::Bytes, extract::State, Json};

use crate::error::ApiError;
use crate::generation::{
    assemble_system_prompt, generate_article, GeneratedArticle, GenerationRequest, PromptTemplateSet,
};
use crate::handlers::decode_json_body;
use crate::state::AppState;

/// POST /api/law/blog - Generate a structured legal blog post
///
/// Expected Input:
/// ```json
/// {
///   "messages": [{ "role": "user", "content": "string" }],  // Required, non-empty
///   "category": "string",                                  // Optional case type
///   "tone": "expert|warning|friendly|news|firm|comfort"    // Optional
/// }
/// ```
///
/// Expected Output (Success):
/// ```json
/// { "title": "...", "intro": "...", "body": "...", "conclusion": "...", "summary_table": "..." }
/// ```
///
/// When no attempt validates the response is a 500 with `debug_preview`
/// holding the start of the last raw model output.
pub async fn generate_blog(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<GeneratedArticle>, ApiError> {
    let body = decode_json_body(&body)?;
    let request = GenerationRequest::from_value(&body)?;

    // Fragments are read per request so template redeploys apply immediately.
    let templates = PromptTemplateSet::load(state.templates.as_ref()).await?;
    let system_prompt = assemble_system_prompt(&templates, request.tone, request.category.as_deref())?;

    tracing::info!(
        messages = request.messages.len(),
        tone = request.tone.map(|t| t.as_str()).unwrap_or("none"),
        "Generating blog article"
    );

    let article = generate_article(
        state.generator.as_ref(),
        &system_prompt,
        &request.messages,
        &state.attempt_policy,
    )
    .await?;

    Ok(Json(article))
}
