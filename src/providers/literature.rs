//! Literature assessment via a chat-completions model.
//!
//! The model is asked for a strict-JSON verdict over the pair plus a digest
//! of the evidence already gathered. The reply is standardized here: the
//! record's confidence is seeded from the base table, never from the
//! model's self-reported score (which is kept as a detail). A malformed
//! reply is a parse error, never a fabricated record.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::config::timeouts;
use crate::evidence::confidence::base_confidence;
use crate::evidence::standardize::severity_from_label;
use crate::evidence::{EvidenceRecord, Origin};
use crate::net::UpstreamClient;

use super::{ProviderError, ProviderReply};

const SYSTEM_PROMPT: &str = "You are a pharmacology literature analyst. Given two \
substances and a digest of structured evidence, assess their interaction from the \
published literature. Respond with strict JSON only: {\"severity\": \
\"none|mild|moderate|severe|unknown\", \"summary\": \"one or two sentences\", \
\"confidence\": 0.0-1.0}. Report only what the literature supports; if it is \
silent, use severity \"unknown\".";

/// Digest of already-gathered evidence, included in the prompt so the model
/// grounds its answer instead of guessing.
#[derive(Debug, Clone, Default)]
pub struct EvidenceDigest {
    pub label_warning_count: usize,
    pub adverse_total: Option<u64>,
    pub adverse_serious: Option<u64>,
    /// Origins that already produced evidence for this pair.
    pub known_sources: Vec<String>,
}

#[derive(Clone)]
pub struct LiteratureClient {
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl LiteratureClient {
    pub fn new(endpoint: &str, api_key: Option<String>, model: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
        }
    }

    /// Whether a credential is configured.
    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn assess_pair(
        &self,
        http: &UpstreamClient,
        a: &str,
        b: &str,
        digest: &EvidenceDigest,
        observed_at: DateTime<Utc>,
    ) -> ProviderReply<EvidenceRecord> {
        let started = Instant::now();
        let Some(key) = self.api_key.as_deref() else {
            return ProviderReply::failed(ProviderError::MissingCredential, started);
        };

        let url = format!("{}/v1/chat/completions", self.endpoint);
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": user_prompt(a, b, digest)}
            ],
            "temperature": 0.1,
            "max_tokens": 300
        });

        let reply = match http.post_json(&url, Some(key), &body, timeouts::LITERATURE).await {
            Ok(reply) => reply,
            Err(err) => return ProviderReply::failed(err.into(), started),
        };

        let Some(content) = reply
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
        else {
            return ProviderReply::failed(
                ProviderError::Parse("completion is missing message content".into()),
                started,
            );
        };

        match parse_assessment(content, &self.model, observed_at) {
            Ok(record) => ProviderReply::found(record, started),
            Err(err) => ProviderReply::failed(err, started),
        }
    }
}

fn user_prompt(a: &str, b: &str, digest: &EvidenceDigest) -> String {
    let mut lines = vec![format!("Substances: {a} and {b}.")];
    if digest.known_sources.is_empty() {
        lines.push("No structured interaction evidence was found.".to_string());
    } else {
        lines.push(format!(
            "Structured evidence present from: {}.",
            digest.known_sources.join(", ")
        ));
    }
    if digest.label_warning_count > 0 {
        lines.push(format!(
            "{} relevant label warnings were found.",
            digest.label_warning_count
        ));
    }
    if let (Some(total), Some(serious)) = (digest.adverse_total, digest.adverse_serious) {
        lines.push(format!(
            "Adverse event reports mentioning both: {total} ({serious} serious)."
        ));
    }
    lines.join("\n")
}

/// Parse the model's strict-JSON verdict into an evidence record.
pub(crate) fn parse_assessment(
    content: &str,
    model: &str,
    observed_at: DateTime<Utc>,
) -> Result<EvidenceRecord, ProviderError> {
    let stripped = strip_code_fences(content);
    let verdict: Value = serde_json::from_str(stripped)
        .map_err(|e| ProviderError::Parse(format!("model verdict is not JSON: {e}")))?;

    let severity_label = verdict
        .get("severity")
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::Parse("verdict is missing severity".into()))?;
    let summary = verdict
        .get("summary")
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::Parse("verdict is missing summary".into()))?;

    let severity = match severity_label.trim().to_lowercase().as_str() {
        "none" => crate::evidence::Severity::None,
        other => severity_from_label(other),
    };

    let mut record = EvidenceRecord::new(
        Origin::LiteratureAi,
        severity,
        base_confidence(Origin::LiteratureAi),
        summary,
        observed_at,
    )
    .with_detail("model", Value::String(model.to_string()));
    if let Some(model_confidence) = verdict.get("confidence").and_then(Value::as_f64) {
        record = record.with_detail(
            "modelConfidence",
            json!(model_confidence.clamp(0.0, 1.0)),
        );
    }
    Ok(record)
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim().strip_suffix("```").unwrap_or(rest).trim()
}
