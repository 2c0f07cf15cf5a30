//! Proposal Agent
//!
//! Asks the language model for chart proposals that fit the uploaded data,
//! and guarantees an answer: a missing client, a failed or timed-out call,
//! or an unusable response all fall through to a fixed rule set.
//!
//! Model output is untrusted. Each proposal is checked against the closed
//! field set and the dataset's column names before it is kept.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::LLMConfig;
use crate::llm::provider::LLM;
use crate::profiler::Hints;
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest};
use crate::utils::retry::with_retry;
use crate::widgets::{strip_aggregate, WidgetProposal, MAX_WIDGETS};

pub const MAX_FALLBACK_PROPOSALS: usize = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

pub const SYSTEM_PROMPT: &str = r#"You propose concise, role-aware dashboard widgets.
Input includes: domain, intent, columns, and structural hints about the data.
Respond with ONLY a JSON array of widget proposals, no prose:
[{ "title": str, "chart": "line|bar|area|pie|donut|funnel|treemap|kpi|table",
   "x": "field_name_or_null", "y": "field_or_aggregate like SUM(field)", "group_by": "field_or_null",
   "explanation": str }]
Use only the field names listed in columns. Follow only what the data supports."#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalSource {
    Model,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProposalOutcome {
    pub proposals: Vec<WidgetProposal>,
    pub source: ProposalSource,
}

impl ProposalOutcome {
    fn fallback(hints: &Hints) -> Self {
        Self {
            proposals: fallback(hints),
            source: ProposalSource::Fallback,
        }
    }
}

pub struct ProposalAgent {
    llm: Option<Arc<LLM>>,
    model: String,
    temperature: f32,
    timeout: Duration,
    max_attempts: u32,
    retry_delay: Duration,
    max_proposals: usize,
}

impl ProposalAgent {
    /// `llm` is `None` in mock mode; the agent then always uses the fallback.
    pub fn new(llm: Option<Arc<LLM>>, config: &LLMConfig) -> Self {
        Self {
            llm,
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: config.timeout(),
            max_attempts: config.max_attempts,
            retry_delay: DEFAULT_RETRY_DELAY,
            max_proposals: MAX_WIDGETS,
        }
    }

    pub fn fallback_only() -> Self {
        Self::new(None, &LLMConfig::default())
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn is_live(&self) -> bool {
        self.llm.is_some()
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.llm.as_deref().map(LLM::provider_name)
    }

    /// Propose widgets for the dataset. Never fails.
    pub async fn propose(
        &self,
        domain: &str,
        intent: &str,
        columns: &[String],
        hints: &Hints,
    ) -> ProposalOutcome {
        let Some(llm) = &self.llm else {
            debug!("No model client configured, using fallback proposals");
            return ProposalOutcome::fallback(hints);
        };

        let payload = build_payload(domain, intent, columns, hints);
        debug!(system_prompt = SYSTEM_PROMPT, payload = %payload, "Model request");

        let request = LLMRequest {
            model: self.model.clone(),
            messages: vec![LLMMessage::system(SYSTEM_PROMPT), LLMMessage::user(payload)],
            max_tokens: None,
            temperature: Some(self.temperature),
        };

        let text = match self.call_model(llm, &request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, provider = llm.provider_name(), "Model call failed, using fallback proposals");
                return ProposalOutcome::fallback(hints);
            }
        };
        debug!(response = %text, "Model raw response");

        let Some(raw) = extract_proposals(&text) else {
            warn!(response_len = text.len(), "Model response is not a JSON array, using fallback proposals");
            return ProposalOutcome::fallback(hints);
        };

        let received = raw.len();
        let mut proposals = validate_proposals(raw, columns);
        proposals.truncate(self.max_proposals);

        // An empty array is a valid answer; only a list with nothing usable falls back
        if received > 0 && proposals.is_empty() {
            warn!(received, "Model returned no usable proposals, using fallback proposals");
            return ProposalOutcome::fallback(hints);
        }

        info!(received, kept = proposals.len(), "Model proposals accepted");
        ProposalOutcome {
            proposals,
            source: ProposalSource::Model,
        }
    }

    async fn call_model(&self, llm: &LLM, request: &LLMRequest) -> AppResult<String> {
        let timeout = self.timeout;
        let response = with_retry(
            move || async move {
                match tokio::time::timeout(timeout, llm.create_chat_completion(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(AppError::LLMApi(format!(
                        "Model call timed out after {}s",
                        timeout.as_secs_f32()
                    ))),
                }
            },
            self.max_attempts,
            self.retry_delay,
        )
        .await?;

        Ok(response.content)
    }
}

/// User message: `DATA:` followed by the request as JSON.
pub fn build_payload(domain: &str, intent: &str, columns: &[String], hints: &Hints) -> String {
    let data = serde_json::json!({
        "domain": domain,
        "intent": intent,
        "columns": columns,
        "hints": hints,
    });
    format!("DATA:\n{}", data)
}

/// Pull a JSON array out of free-form model text.
///
/// Markdown fences are stripped first; then the text is parsed directly, and
/// failing that the first balanced `[...]` span that parses is used.
pub fn extract_proposals(text: &str) -> Option<Vec<Value>> {
    let stripped = strip_fences(text);
    for candidate in [stripped, text] {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(candidate.trim()) {
            return Some(items);
        }
        if let Some(items) = first_balanced_array(candidate) {
            return Some(items);
        }
    }
    None
}

fn strip_fences(text: &str) -> &str {
    let Some(start) = text.find("```") else {
        return text;
    };
    let after = &text[start + 3..];
    // Skip a language tag such as `json`
    let body_start = after
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after.len());
    let body = &after[body_start..];
    match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    }
}

fn first_balanced_array(text: &str) -> Option<Vec<Value>> {
    let mut cursor = 0;
    while let Some(offset) = text[cursor..].find('[') {
        let start = cursor + offset;
        // An unbalanced bracket means no later span can close either
        let end = start + balanced_end(&text[start..])?;
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&text[start..end]) {
            return Some(items);
        }
        cursor = end;
    }
    None
}

/// Byte length of the bracketed span opening at the start of `text`,
/// ignoring brackets inside JSON strings.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Keep only well-formed proposals that reference known columns.
pub fn validate_proposals(raw: Vec<Value>, columns: &[String]) -> Vec<WidgetProposal> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match validate_proposal(value, columns) {
            Ok(proposal) => Some(proposal),
            Err(reason) => {
                debug!(index = idx, reason = %reason, "Discarding model proposal");
                None
            }
        })
        .collect()
}

fn validate_proposal(value: Value, columns: &[String]) -> Result<WidgetProposal, String> {
    let Value::Object(obj) = value else {
        return Err("not an object".to_string());
    };

    let title = required_string(&obj, "title")?;
    let chart = required_string(&obj, "chart")?;
    let x = optional_string(&obj, "x")?;
    let y = optional_string(&obj, "y")?;
    let group_by = optional_string(&obj, "group_by")?;
    let explanation = optional_string(&obj, "explanation")?.unwrap_or_default();

    let known = |name: &str| columns.iter().any(|c| c == name);

    if let Some(x) = &x {
        if !known(x) {
            return Err(format!("unknown x column '{}'", x));
        }
    }
    if let Some(group_by) = &group_by {
        if !known(group_by) {
            return Err(format!("unknown group_by column '{}'", group_by));
        }
    }
    if let Some(y) = &y {
        let field = strip_aggregate(y);
        if !known(y) && !known(&field) && field != "*" {
            return Err(format!("unknown y field '{}'", y));
        }
    }

    Ok(WidgetProposal {
        title,
        chart,
        x,
        y,
        group_by,
        explanation,
    })
}

fn required_string(obj: &Map<String, Value>, key: &str) -> Result<String, String> {
    optional_string(obj, key)?.ok_or_else(|| format!("missing '{}'", key))
}

/// Strings are trimmed; blank strings and `null` are absent. Other JSON types are rejected.
fn optional_string(obj: &Map<String, Value>, key: &str) -> Result<Option<String>, String> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Some(other) => Err(format!("'{}' must be a string, got {}", key, other)),
    }
}

/// Rule-based proposals used whenever the model cannot be used.
pub fn fallback(hints: &Hints) -> Vec<WidgetProposal> {
    let mut proposals = Vec::new();
    let Some(measure) = hints.measures.first() else {
        return proposals;
    };

    if hints.has_date {
        proposals.push(WidgetProposal {
            title: "Monthly Trend".to_string(),
            chart: "line".to_string(),
            x: Some(hints.date_field.clone().unwrap_or_else(|| "date".to_string())),
            y: Some(format!("SUM({})", measure)),
            group_by: None,
            explanation: "Trend over time".to_string(),
        });
    }

    if let Some(category) = hints.categories.first() {
        proposals.push(WidgetProposal {
            title: "Top Categories".to_string(),
            chart: "bar".to_string(),
            x: Some(category.clone()),
            y: Some(format!("SUM({})", measure)),
            group_by: None,
            explanation: "Top contributors".to_string(),
        });
    }

    proposals.truncate(MAX_FALLBACK_PROPOSALS);
    proposals
}
