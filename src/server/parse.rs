//! `POST /api/groq-parse` and `POST /api/openai-parse`.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::error::{ExtractError, Result};
use crate::pipeline::extract_records;
use crate::providers::{AnalysisType, Provider, ProviderFactory};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseRequest {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub analysis_type: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Chat-completion shaped reply whose content is the parsed array
#[derive(Debug, Serialize, Deserialize)]
pub struct ParseResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Choice {
    pub message: Message,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
}

pub async fn groq_parse(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ParseRequest>, JsonRejection>,
) -> std::result::Result<Json<ParseResponse>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(parse_with(&state, Provider::Groq, request).await?))
}

pub async fn openai_parse(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ParseRequest>, JsonRejection>,
) -> std::result::Result<Json<ParseResponse>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(parse_with(&state, Provider::OpenAI, request).await?))
}

async fn parse_with(
    state: &AppState,
    provider: Provider,
    request: ParseRequest,
) -> Result<ParseResponse> {
    state.authorize(request.api_key.as_deref())?;

    let analysis = match request.analysis_type.as_deref() {
        Some(name) => name.parse::<AnalysisType>()?,
        None => AnalysisType::default(),
    };
    debug!("Prompt: {}", analysis.prompt());

    let image_url = request
        .image_url
        .filter(|url| !url.trim().is_empty())
        .ok_or(ExtractError::MissingImage)?;

    let llm = ProviderFactory::from_config(provider, &state.config)?;
    let records = extract_records(llm.as_ref(), &image_url, analysis).await?;
    info!(
        "{} returned {} items for {}",
        provider.display_name(),
        records.len(),
        analysis
    );

    Ok(ParseResponse {
        choices: vec![Choice {
            message: Message {
                content: serde_json::to_string(&records)?,
            },
        }],
    })
}
