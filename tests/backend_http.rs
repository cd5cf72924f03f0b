use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use pipeline_translator::document::{ChunkCollection, DocumentKind, UploadKind};
use pipeline_translator::translation::{
    AudioPayload, PipelineClient, SpeechBackend, TranslationBackend, TranslationDispatcher,
};
use pipeline_translator::utils::{AppConfig, BackendConfig};
use pipeline_translator::{ChunkStore, TranslationSession};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const AUTH_HEADER: &str = "x-pipeline-auth";
const AUTH_VALUE: &str = "compute-secret";

struct MockPipeline {
    base_url: String,
    discovery_status: Option<u16>,
    compute_calls: AtomicUsize,
}

async fn discover(
    State(mock): State<Arc<MockPipeline>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if let Some(status) = mock.discovery_status {
        let status = StatusCode::from_u16(status).unwrap();
        return (status, Json(json!({"error": "discovery down"})));
    }
    if headers.get("userID").and_then(|v| v.to_str().ok()) != Some("tester")
        || headers.get("ulcaApiKey").and_then(|v| v.to_str().ok()) != Some("key")
    {
        return (StatusCode::FORBIDDEN, Json(json!({"error": "bad credentials"})));
    }

    let tasks = body["pipelineTasks"].as_array().cloned().unwrap_or_default();
    let configs: Vec<Value> = tasks
        .iter()
        .map(|task| {
            let kind = task["taskType"].as_str().unwrap_or("unknown");
            json!({"config": [{"serviceId": format!("{}-service", kind)}]})
        })
        .collect();

    (
        StatusCode::OK,
        Json(json!({
            "pipelineResponseConfig": configs,
            "pipelineInferenceAPIEndPoint": {
                "callbackUrl": format!("{}/compute", mock.base_url),
                "inferenceApiKey": {"name": AUTH_HEADER, "value": AUTH_VALUE}
            }
        })),
    )
}

async fn compute(
    State(mock): State<Arc<MockPipeline>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    mock.compute_calls.fetch_add(1, Ordering::SeqCst);
    if headers.get(AUTH_HEADER).and_then(|v| v.to_str().ok()) != Some(AUTH_VALUE) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "missing key"})));
    }

    if let Some(audio) = body["inputData"]["audio"][0]["audioContent"].as_str() {
        assert_eq!(body["pipelineTasks"][0]["config"]["audioFormat"], "wav");
        assert_eq!(body["pipelineTasks"][0]["config"]["samplingRate"], 16000);
        return (
            StatusCode::OK,
            Json(json!({
                "pipelineResponse": [
                    {"output": [{"source": format!("heard {}", audio)}]},
                    {"output": [{"target": "spoken words"}]}
                ]
            })),
        );
    }

    let source = body["inputData"]["input"][0]["source"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    if source == "garbage" {
        return (StatusCode::OK, Json(json!({"unexpected": true})));
    }
    assert_eq!(body["pipelineTasks"][0]["config"]["serviceId"], "translation-service");
    assert_eq!(body["pipelineTasks"][0]["config"]["language"]["targetLanguage"], "en");

    (
        StatusCode::OK,
        Json(json!({
            "pipelineResponse": [{"output": [{"source": source, "target": format!("EN:{}", source)}]}]
        })),
    )
}

async fn start_mock(discovery_status: Option<u16>) -> Arc<MockPipeline> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let mock = Arc::new(MockPipeline {
        base_url: format!("http://{}", addr),
        discovery_status,
        compute_calls: AtomicUsize::new(0),
    });

    let app = Router::new()
        .route("/discover", post(discover))
        .route("/compute", post(compute))
        .with_state(mock.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    mock
}

fn backend_config(mock: &MockPipeline) -> BackendConfig {
    BackendConfig {
        discovery_url: format!("{}/discover", mock.base_url),
        user_id: "tester".to_string(),
        api_key: "key".to_string(),
        timeout_seconds: 5,
        ..BackendConfig::default()
    }
}

#[tokio::test]
async fn test_text_translation_uses_discovered_credentials() {
    let mock = start_mock(None).await;
    let client = PipelineClient::new(backend_config(&mock)).unwrap();

    let translated = client.translate("hi", "namaste duniya").await.unwrap();

    assert_eq!(translated, "EN:namaste duniya");
    assert_eq!(mock.compute_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_discovery_error_status_marks_every_chunk() {
    let mock = start_mock(Some(500)).await;
    let dir = TempDir::new().unwrap();
    let store =
        ChunkStore::open(&dir.path().join("chunks.redb"), dir.path().join("processed")).unwrap();
    let config = backend_config(&mock);
    let client = Arc::new(PipelineClient::new(config.clone()).unwrap());
    let dispatcher = TranslationDispatcher::new(client, store, &config);

    let collection = ChunkCollection::new(
        "report.txt",
        DocumentKind::Txt,
        (0..5).map(|i| format!("chunk {}", i)).collect(),
    );
    let results = dispatcher
        .translate_document("hi", &collection)
        .await
        .unwrap();

    assert_eq!(results.len(), 5);
    for result in &results {
        assert_eq!(result.status_code, 500);
        assert!(result.translated_text.is_empty());
    }
    assert_eq!(mock.compute_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unexpected_compute_body_is_malformed() {
    let mock = start_mock(None).await;
    let client = PipelineClient::new(backend_config(&mock)).unwrap();

    let failure = client.translate("ta", "garbage").await.unwrap_err();

    assert_eq!(failure.status_code, 502);
}

#[tokio::test]
async fn test_rejected_credentials_keep_remote_status() {
    let mock = start_mock(None).await;
    let mut config = backend_config(&mock);
    config.api_key = "wrong".to_string();
    let client = PipelineClient::new(config).unwrap();

    let failure = client.translate("ta", "vanakkam").await.unwrap_err();

    assert_eq!(failure.status_code, 403);
}

#[tokio::test]
async fn test_unreachable_backend() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = BackendConfig {
        discovery_url: format!("http://{}/discover", addr),
        timeout_seconds: 5,
        ..BackendConfig::default()
    };
    let client = PipelineClient::new(config).unwrap();

    let failure = client.translate("hi", "namaste").await.unwrap_err();
    assert_eq!(failure.status_code, 503);
}

#[tokio::test]
async fn test_speech_pipeline_returns_transcript_and_translation() {
    let mock = start_mock(None).await;
    let client = PipelineClient::new(backend_config(&mock)).unwrap();
    let payload = AudioPayload {
        content_base64: "UklGRg==".to_string(),
        format: "wav".to_string(),
        sampling_rate: 16000,
    };

    let transcription = client
        .transcribe_and_translate("bn", &payload)
        .await
        .unwrap();

    assert_eq!(transcription.transcript.as_deref(), Some("heard UklGRg=="));
    assert_eq!(transcription.translation, "spoken words");
}

#[tokio::test]
async fn test_text_upload_through_session() {
    let mock = start_mock(None).await;
    let dir = TempDir::new().unwrap();
    let mut config = AppConfig::default();
    config.backend = backend_config(&mock);
    config.storage.db_path = dir.path().join("chunks.redb");
    config.storage.processed_dir = dir.path().join("processed");
    config.storage.scratch_dir = dir.path().join("scratch");
    config.chunking.chunk_size = 8;
    config.chunking.overlap = 2;

    let client = Arc::new(PipelineClient::new(config.backend.clone()).unwrap());
    let session = TranslationSession::new(&config, client).unwrap();

    let report = session
        .translate_upload("note.txt", "abcdefghijkl".as_bytes(), UploadKind::Text, "mr")
        .await
        .unwrap();

    assert_eq!(report.chunk_count(), 2);
    assert_eq!(report.failed_chunk_count(), 0);
    assert_eq!(report.results["note.txt_0"].translated_text, "EN:abcdefgh");
    assert_eq!(report.results["note.txt_1"].translated_text, "EN:ghijkl");
    assert!(session.store().list_pending().unwrap().is_empty());
}
