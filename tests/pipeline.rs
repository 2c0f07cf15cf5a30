//! End-to-end pipeline tests
//!
//! These run fixture files through parse, validate, profile, propose and
//! compile, and check the final upload response.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use vizpilot::agents::{ProposalAgent, ProposalSource};
use vizpilot::config::{LLMConfig, PipelineConfig};
use vizpilot::llm::provider::LLM;
use vizpilot::types::AppError;
use vizpilot::widgets::WidgetType;
use vizpilot::{Pipeline, UploadRequest};

fn fixture(name: &str) -> UploadRequest {
    let path = PathBuf::from("testdata").join(name);
    let bytes = std::fs::read(&path).unwrap_or_else(|e| panic!("missing fixture {:?}: {}", path, e));
    UploadRequest {
        filename: name.to_string(),
        bytes: Bytes::from(bytes),
        domain: "retail".to_string(),
        intent: "understand revenue".to_string(),
    }
}

fn fallback_pipeline() -> Pipeline {
    Pipeline::new(ProposalAgent::fallback_only(), None, PipelineConfig::default())
}

#[tokio::test]
async fn test_numeric_only_csv_gets_placeholder() {
    let response = fallback_pipeline().run(fixture("tiny.csv")).await.unwrap();

    assert_eq!(response.proposal_source, ProposalSource::Fallback);
    assert_eq!(response.widgets.len(), 1, "Only the summary table is expected");
    let widget = &response.widgets[0];
    assert_eq!(widget.id, "widget_1");
    assert_eq!(widget.widget_type, WidgetType::Table);
    assert_eq!(widget.config.columns.as_deref(), Some(&["a".to_string(), "b".to_string()][..]));
}

#[tokio::test]
async fn test_sales_csv_gets_trend_and_categories() {
    let response = fallback_pipeline().run(fixture("sales.csv")).await.unwrap();

    assert_eq!(response.format, "CSV/TXT");
    assert_eq!(response.domain, "retail");
    assert_eq!(response.preview.len(), 50);

    let widgets = &response.widgets;
    assert_eq!(widgets.len(), 2);

    assert_eq!(widgets[0].title, "Monthly Trend");
    assert_eq!(widgets[0].widget_type, WidgetType::LineChart);
    assert_eq!(widgets[0].config.x_column.as_deref(), Some("date"));
    assert_eq!(widgets[0].config.y_column.as_deref(), Some("SUM(revenue)"));
    let x = widgets[0].chart_document.encoding.x.as_ref().unwrap();
    assert_eq!(x.field_type, "temporal");

    assert_eq!(widgets[1].title, "Top Categories");
    assert_eq!(widgets[1].widget_type, WidgetType::BarChart);
    assert_eq!(widgets[1].config.x_column.as_deref(), Some("region"));
    assert_eq!(widgets[1].chart_document.encoding.y.as_ref().unwrap().field, "revenue");
}

#[tokio::test]
async fn test_tab_separated_with_null_tokens() {
    let response = fallback_pipeline().run(fixture("orders.tsv")).await.unwrap();

    assert_eq!(response.preview.len(), 3);
    assert_eq!(response.preview[2]["amount"], serde_json::Value::Null);
    assert_eq!(response.preview[0]["amount"], serde_json::json!(250.5));

    assert_eq!(response.widgets.len(), 1);
    assert_eq!(response.widgets[0].title, "Top Categories");
    assert_eq!(response.widgets[0].config.x_column.as_deref(), Some("customer"));
}

#[tokio::test]
async fn test_unsupported_and_broken_files() {
    let mut request = fixture("tiny.csv");
    request.filename = "tiny.numbers".to_string();
    let err = fallback_pipeline().run(request).await.unwrap_err();
    assert!(matches!(err, AppError::UnsupportedFormat(_)));

    let mut request = fixture("tiny.csv");
    request.filename = "tiny.pdf".to_string();
    let err = fallback_pipeline().run(request).await.unwrap_err();
    assert!(matches!(err, AppError::Parse { ref format, .. } if format == "PDF"));
}

#[tokio::test]
async fn test_model_proposals_flow_through_compiler() {
    let mut server = mockito::Server::new_async().await;
    let content = "Sure! ```json\n[{\"title\":\"Revenue Share\",\"chart\":\"donut\",\"x\":\"region\",\"y\":\"SUM(revenue)\",\"group_by\":null,\"explanation\":\"Share by region\"},{\"title\":\"Invented\",\"chart\":\"bar\",\"x\":\"country\",\"y\":\"revenue\"}]\n```";
    let body = serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
    });
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let config = LLMConfig {
        api_key: "test-key".to_string(),
        base_url: Some(server.url()),
        ..LLMConfig::default()
    };
    let agent = ProposalAgent::new(Some(Arc::new(LLM::new(&config))), &config)
        .with_retry_delay(Duration::ZERO);
    let pipeline = Pipeline::new(agent, None, PipelineConfig::default());

    let response = pipeline.run(fixture("sales.csv")).await.unwrap();

    assert_eq!(response.proposal_source, ProposalSource::Model);
    assert_eq!(response.widgets.len(), 1, "Proposal with unknown column is dropped");
    assert_eq!(response.widgets[0].widget_type, WidgetType::PieChart);
    assert_eq!(response.widgets[0].explanation, "Share by region");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_model_list_gets_placeholder() {
    let mut server = mockito::Server::new_async().await;
    let body = serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": "[]"}, "finish_reason": "stop"}]
    });
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let config = LLMConfig {
        api_key: "test-key".to_string(),
        base_url: Some(server.url()),
        ..LLMConfig::default()
    };
    let agent = ProposalAgent::new(Some(Arc::new(LLM::new(&config))), &config)
        .with_retry_delay(Duration::ZERO);
    let pipeline = Pipeline::new(agent, None, PipelineConfig::default());

    let response = pipeline.run(fixture("sales.csv")).await.unwrap();

    assert_eq!(response.proposal_source, ProposalSource::Model);
    assert_eq!(response.widgets.len(), 1);
    assert_eq!(response.widgets[0].title, "Data Summary");
    assert_eq!(response.widgets[0].widget_type, WidgetType::Table);
    assert_eq!(
        serde_json::to_value(&response).unwrap()["proposal_source"],
        "model"
    );
    mock.assert_async().await;
}
