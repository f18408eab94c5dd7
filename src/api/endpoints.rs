//! HTTP endpoints: the analysis entry point and a liveness probe.
//!
//! Request validation happens here so the client gets user-safe messages;
//! the pipeline re-checks the same bounds as its own invariant. Items may
//! carry `display` and `type` hints on the wire; the analysis keys off
//! `value` alone and serde drops the rest.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::config::{CALC_VERSION, SERVICE_VERSION};
use crate::normalize::MAX_ITEMS;
use crate::pipeline::{AnalysisEngine, AnalyzeOptions};
use crate::report::AnalysisResponse;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub items: Vec<ItemInput>,
    #[serde(default)]
    pub options: Option<RequestOptions>,
}

#[derive(Debug, Deserialize)]
pub struct ItemInput {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize, Default, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    #[serde(default)]
    pub include_ai: bool,
    #[serde(default)]
    pub include_cms: bool,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub force_refresh: bool,
}

impl From<RequestOptions> for AnalyzeOptions {
    fn from(options: RequestOptions) -> Self {
        Self {
            include_ai: options.include_ai,
            include_cms: options.include_cms,
            debug: options.debug,
            force_refresh: options.force_refresh,
        }
    }
}

/// `POST /api/interactions/analyze`
pub async fn analyze(
    State(engine): State<Arc<AnalysisEngine>>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    if body.items.is_empty() {
        return Err(ApiError::BadRequest("At least one item is required".into()));
    }
    if body.items.len() > MAX_ITEMS {
        return Err(ApiError::BadRequest(format!(
            "Too many items: {} (maximum {MAX_ITEMS})",
            body.items.len()
        )));
    }
    if body.items.iter().any(|item| item.value.trim().is_empty()) {
        return Err(ApiError::BadRequest(
            "Each item must have a non-empty value".into(),
        ));
    }

    let options = body.options.unwrap_or_default().into();
    let values = body.items.into_iter().map(|item| item.value).collect();
    let response = engine.analyze(values, options).await?;
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub calc_version: &'static str,
    pub providers: ProviderHealth,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_entries: Option<i64>,
}

/// Credential presence only, never the credentials themselves.
#[derive(Debug, Serialize)]
pub struct ProviderHealth {
    pub supplement: bool,
    pub literature: bool,
}

/// `GET /api/health`
pub async fn health(State(engine): State<Arc<AnalysisEngine>>) -> Json<HealthResponse> {
    let settings = engine.settings();
    Json(HealthResponse {
        status: "ok",
        version: SERVICE_VERSION,
        calc_version: CALC_VERSION,
        providers: ProviderHealth {
            supplement: settings.supplement_api_key.is_some(),
            literature: settings.literature_api_key.is_some(),
        },
        usage_entries: engine.usage_entries(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::db::open_memory_database;
    use axum::response::IntoResponse;

    fn engine() -> Arc<AnalysisEngine> {
        Arc::new(AnalysisEngine::new(
            Settings::for_tests(),
            open_memory_database().unwrap(),
        ))
    }

    fn request(values: &[&str]) -> AnalyzeRequest {
        AnalyzeRequest {
            items: values
                .iter()
                .map(|value| ItemInput {
                    value: value.to_string(),
                })
                .collect(),
            options: None,
        }
    }

    #[tokio::test]
    async fn empty_items_is_a_400() {
        let result = analyze(State(engine()), Json(request(&[]))).await;
        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn blank_value_is_a_400() {
        let result = analyze(State(engine()), Json(request(&["warfarin", "  "]))).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn eleven_items_is_a_400() {
        let values: Vec<String> = (0..11).map(|i| format!("drug{i}")).collect();
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        let result = analyze(State(engine()), Json(request(&refs))).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn unknown_body_fields_are_tolerated() {
        let raw = serde_json::json!({
            "items": [{"value": "warfarin", "display": "Warfarin 5mg", "type": "drug"}],
            "options": {"debug": true, "includeAi": false}
        });
        let body: AnalyzeRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(body.items[0].value, "warfarin");
        assert!(body.options.unwrap().debug);
    }

    #[tokio::test]
    async fn health_reports_credential_presence_without_secrets() {
        let response = health(State(engine())).await;
        let json = serde_json::to_value(response.0).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["calcVersion"], CALC_VERSION);
        assert_eq!(json["providers"]["supplement"], false);
        assert_eq!(json["providers"]["literature"], false);
    }

    #[test]
    fn options_default_to_off() {
        let options: AnalyzeOptions = RequestOptions::default().into();
        assert!(!options.include_ai);
        assert!(!options.include_cms);
        assert!(!options.debug);
        assert!(!options.force_refresh);
    }
}
