use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::agents::{ProposalAgent, ProposalSource};
use crate::config::Config;
use crate::llm::provider::LLM;
use crate::pipeline::Pipeline;
use crate::storage::{LocalUploadSink, UploadSink};
use crate::widgets::WidgetSpec;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(config: Config, pipeline: Pipeline) -> Self {
        Self {
            config,
            pipeline: Arc::new(pipeline),
        }
    }

    /// Wire the pipeline from configuration. The model client is built here,
    /// once, and shared by every request.
    pub fn from_config(config: Config) -> Self {
        let llm = if config.llm.is_live() {
            info!(provider = %config.llm.provider, model = %config.llm.model, "Model client enabled");
            Some(Arc::new(LLM::new(&config.llm)))
        } else {
            info!(mode = %config.llm.mode, "Model client disabled, proposals use fallback rules");
            None
        };
        let agent = ProposalAgent::new(llm, &config.llm);

        let sink: Option<Arc<dyn UploadSink>> = if config.storage.keep_uploads {
            Some(Arc::new(LocalUploadSink::new(config.storage.upload_dir.clone())))
        } else {
            None
        };

        let pipeline = Pipeline::new(agent, sink, config.pipeline.clone());
        Self::new(config, pipeline)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub dataset_id: String,
    pub widgets: Vec<WidgetSpec>,
    pub preview: Vec<Map<String, Value>>,
    pub domain: String,
    pub intent: String,
    /// Detected file type label, e.g. `CSV/TXT`.
    pub format: String,
    pub proposal_source: ProposalSource,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    /// Provider name when a model client is configured, otherwise `mock`.
    pub llm: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionResponse {
    pub name: String,
    pub version: String,
}
