//! Upload pipeline.
//!
//! ```text
//! bytes + filename ─► parse ─► validate ─► profile ─► propose ─► compile
//!                                                                  │
//!                        preview rows ◄── dataset                   ▼
//!                                                            WidgetSpec[]
//! ```
//!
//! Parse and validation failures abort the request with a typed error.
//! Proposal failures never do: the agent falls back to its rule set.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use crate::agents::ProposalAgent;
use crate::config::PipelineConfig;
use crate::dataset::{validate, Dataset, ValidationRules};
use crate::models::UploadResponse;
use crate::parsers::{self, FileFormat};
use crate::profiler;
use crate::storage::UploadSink;
use crate::types::{AppError, AppResult};
use crate::widgets;

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub bytes: Bytes,
    pub domain: String,
    pub intent: String,
}

pub struct Pipeline {
    agent: ProposalAgent,
    sink: Option<Arc<dyn UploadSink>>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        agent: ProposalAgent,
        sink: Option<Arc<dyn UploadSink>>,
        config: PipelineConfig,
    ) -> Self {
        Self { agent, sink, config }
    }

    pub fn agent(&self) -> &ProposalAgent {
        &self.agent
    }

    pub async fn run(&self, request: UploadRequest) -> AppResult<UploadResponse> {
        let UploadRequest {
            filename,
            bytes,
            domain,
            intent,
        } = request;

        // Reject unsupported types before anything is stored
        FileFormat::from_filename(&filename)?;

        let dataset_id = match &self.sink {
            Some(sink) => sink.store(&filename, &bytes).await?,
            None => uuid::Uuid::new_v4().to_string(),
        };
        info!(dataset_id = %dataset_id, filename = %filename, size = bytes.len(), "Processing upload");

        let rules = ValidationRules {
            min_rows: self.config.min_rows,
            min_columns: self.config.min_columns,
        };
        let (dataset, format) = parse_and_validate(bytes, filename, rules).await?;

        let hints = profiler::profile(&dataset, self.config.profile_sample_rows);
        let columns = dataset.column_names();

        let outcome = self.agent.propose(&domain, &intent, &columns, &hints).await;
        let widgets = widgets::compile(&outcome.proposals, &columns, self.config.max_widgets);
        let preview = dataset.preview(self.config.preview_rows);

        info!(
            dataset_id = %dataset_id,
            rows = dataset.row_count(),
            columns = columns.len(),
            widgets = widgets.len(),
            source = ?outcome.source,
            "Upload processed"
        );

        Ok(UploadResponse {
            dataset_id,
            widgets,
            preview,
            domain,
            intent,
            format: format.label().to_string(),
            proposal_source: outcome.source,
        })
    }
}

/// Parsing is CPU-bound, so it runs on the blocking pool.
async fn parse_and_validate(
    bytes: Bytes,
    filename: String,
    rules: ValidationRules,
) -> AppResult<(Dataset, FileFormat)> {
    tokio::task::spawn_blocking(move || {
        let (dataset, format) = parsers::parse(&bytes, &filename)?;
        if let Err(e) = validate(&dataset, &rules) {
            warn!(filename = %filename, error = %e, "Uploaded file failed validation");
            return Err(e);
        }
        Ok((dataset, format))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Parser task failed: {}", e)))?
}
