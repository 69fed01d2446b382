//! Localhost HTTP dashboard API.
//!
//! The server binds strictly to 127.0.0.1; this is a single-user,
//! on-machine tool and its data never leaves the host. Handlers read
//! through the store and drive scans through the batch manager; they
//! hold no state of their own.

mod error;
mod handlers;
mod routes;

pub use error::ApiError;
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::batch::BatchManager;
use crate::config::Settings;
use crate::reports::ReportManager;
use crate::repository::Store;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub batches: BatchManager,
    pub reports: ReportManager,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        settings.ensure_dirs()?;
        let store = Arc::new(Store::open(&settings.database_path())?);
        let batches = BatchManager::new(Arc::clone(&store), settings.clone());
        let reports = ReportManager::new(Arc::clone(&store), settings.reports_dir());
        Ok(Self {
            store,
            batches,
            reports,
        })
    }
}

/// Start the dashboard server on 127.0.0.1.
pub async fn serve(settings: &Settings, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("dashboard listening at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use std::collections::HashMap;
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::extract::{ExtractError, ExtractMethod, PageSource, PageText};
    use crate::models::{DocumentStatus, FindingDraft};
    use crate::worker::EngineFactory;

    struct ByFilename {
        pages: HashMap<String, Vec<String>>,
    }

    impl PageSource for ByFilename {
        fn page_count(&self, path: &std::path::Path) -> Result<u32, ExtractError> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            self.pages
                .get(&name)
                .map(|p| p.len() as u32)
                .ok_or_else(|| ExtractError::Unreadable {
                    detail: "no fixture".into(),
                })
        }

        fn extract_page(&self, path: &std::path::Path, page: u32) -> PageText {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            PageText {
                page_number: page,
                text: self.pages[&name][(page - 1) as usize].clone(),
                method: ExtractMethod::Native,
                confidence: 1.0,
            }
        }
    }

    fn setup(pages: HashMap<String, Vec<String>>) -> (axum::Router, AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::with_data_dir(dir.path().to_path_buf());
        settings.ensure_dirs().unwrap();

        let store = Arc::new(Store::open(&settings.database_path()).unwrap());
        let factory: EngineFactory = Arc::new(move || {
            Box::new(ByFilename {
                pages: pages.clone(),
            }) as Box<dyn PageSource>
        });
        let batches =
            BatchManager::with_engine_factory(Arc::clone(&store), settings.clone(), factory);
        let reports = ReportManager::new(Arc::clone(&store), settings.reports_dir());
        let state = AppState {
            store,
            batches,
            reports,
        };
        (create_router(state.clone()), state, dir)
    }

    async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn post_json(
        app: &axum::Router,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn seed_completed_doc(state: &AppState) -> (String, String) {
        let batch = state.store.create_batch("seeded", "/src").unwrap();
        let ids = state
            .store
            .insert_documents(&batch.id, &[("a.pdf".into(), "/src/a.pdf".into())])
            .unwrap();
        state
            .store
            .record_document_result(
                &ids[0],
                1,
                DocumentStatus::Completed,
                &[FindingDraft {
                    page_number: 1,
                    pii_type: "US_SSN".into(),
                    confidence: 0.97,
                    char_offset: 4,
                    char_length: 11,
                    context_snippet: "SSN 123-45-6789".into(),
                }],
            )
            .unwrap();
        (batch.id, ids[0].clone())
    }

    #[tokio::test]
    async fn stats_endpoint_reports_counters() {
        let (app, state, _dir) = setup(HashMap::new());
        seed_completed_doc(&state);

        let (status, json) = get_json(&app, "/api/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total_batches"], 1);
        assert_eq!(json["total_documents"], 1);
        assert_eq!(json["total_findings"], 1);
        assert_eq!(json["docs_with_findings"], 1);
    }

    #[tokio::test]
    async fn pii_types_distribution() {
        let (app, state, _dir) = setup(HashMap::new());
        seed_completed_doc(&state);

        let (status, json) = get_json(&app, "/api/pii-types").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["pii_type"], "US_SSN");
        assert_eq!(json[0]["count"], 1);
    }

    #[tokio::test]
    async fn scan_with_bad_path_is_400_invalid_path() {
        let (app, _state, _dir) = setup(HashMap::new());
        let (status, json) = post_json(
            &app,
            "/api/scan",
            serde_json::json!({"source_path": "/definitely/not/here"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_path");
        assert!(json["message"].is_string());
    }

    #[tokio::test]
    async fn scan_with_bad_threshold_is_400() {
        let (app, _state, dir) = setup(HashMap::new());
        let src = dir.path().join("src");
        std::fs::create_dir(&src).unwrap();
        let (status, json) = post_json(
            &app,
            "/api/scan",
            serde_json::json!({"source_path": src.to_str().unwrap(), "confidence_threshold": 1.5}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "bad_request");
    }

    #[tokio::test]
    async fn scan_processes_folder_end_to_end() {
        let mut pages = HashMap::new();
        pages.insert(
            "a.pdf".to_string(),
            vec!["SSN 123-45-6789".to_string()],
        );
        let (app, _state, dir) = setup(pages);
        let src = dir.path().join("src");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(src.join("a.pdf"), b"%PDF-1.5 stub").unwrap();

        let (status, batch) = post_json(
            &app,
            "/api/scan",
            serde_json::json!({"source_path": src.to_str().unwrap()}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(batch["total_docs"], 1);
        let batch_id = batch["id"].as_str().unwrap().to_string();

        // Poll until the background scan settles.
        let mut done = serde_json::Value::Null;
        for _ in 0..500 {
            let (_, current) = get_json(&app, &format!("/api/batches/{batch_id}")).await;
            if current["status"] == "completed" {
                done = current;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(done["processed_docs"], 1);
        assert_eq!(done["docs_with_findings"], 1);

        let (status, docs) = get_json(&app, &format!("/api/batches/{batch_id}/documents")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(docs["total"], 1);
        let doc_id = docs["items"][0]["id"].as_str().unwrap();

        let (status, findings) =
            get_json(&app, &format!("/api/documents/{doc_id}/findings")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(findings["page"], 1);
        assert!(findings["total"].as_u64().unwrap() >= 1);
        assert_eq!(findings["items"][0]["pii_type"], "US_SSN");
    }

    #[tokio::test]
    async fn missing_batch_and_document_are_404() {
        let (app, _state, _dir) = setup(HashMap::new());
        let (status, json) = get_json(&app, "/api/batches/deadbeef").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");

        let (status, _) = get_json(&app, "/api/documents/deadbeef").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get_json(&app, "/api/batches/deadbeef/documents").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn document_filters_pass_through() {
        let (app, state, _dir) = setup(HashMap::new());
        let (batch_id, doc_id) = seed_completed_doc(&state);

        let (_, filtered) = get_json(
            &app,
            &format!("/api/batches/{batch_id}/documents?pii_type=US_SSN&has_findings=true"),
        )
        .await;
        assert_eq!(filtered["total"], 1);

        let (_, none) = get_json(
            &app,
            &format!("/api/batches/{batch_id}/documents?pii_type=EMAIL_ADDRESS"),
        )
        .await;
        assert_eq!(none["total"], 0);

        let (_, confident) = get_json(
            &app,
            &format!("/api/documents/{doc_id}/findings?min_confidence=0.99"),
        )
        .await;
        assert_eq!(confident["total"], 0);
    }

    #[tokio::test]
    async fn bad_filter_is_400() {
        let (app, state, _dir) = setup(HashMap::new());
        let (batch_id, _) = seed_completed_doc(&state);
        let (status, json) = get_json(
            &app,
            &format!("/api/batches/{batch_id}/documents?min_confidence=7"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "bad_request");
    }

    #[tokio::test]
    async fn page_size_is_clamped_to_500() {
        let (app, state, _dir) = setup(HashMap::new());
        let (batch_id, _) = seed_completed_doc(&state);
        let (status, json) = get_json(
            &app,
            &format!("/api/batches/{batch_id}/documents?page_size=9999"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["page_size"], 500);
    }

    #[tokio::test]
    async fn delete_batch_returns_204_and_cascades() {
        let (app, state, _dir) = setup(HashMap::new());
        let (batch_id, _) = seed_completed_doc(&state);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/batches/{batch_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let (status, _) = get_json(&app, &format!("/api/batches/{batch_id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn report_generation_and_download() {
        let (app, state, _dir) = setup(HashMap::new());
        let (batch_id, _) = seed_completed_doc(&state);

        let (status, report) = post_json(
            &app,
            "/api/reports/generate",
            serde_json::json!({"batch_id": batch_id, "format": "csv"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["status"], "generating");
        let report_id = report["id"].as_str().unwrap().to_string();

        for _ in 0..500 {
            let (_, current) = get_json(&app, &format!("/api/reports/{report_id}")).await;
            if current["status"] == "completed" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/reports/{report_id}/download"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/csv"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8_lossy(&bytes);
        assert!(body.starts_with("batch_name,"));
        assert!(body.contains("US_SSN"));
    }

    #[tokio::test]
    async fn report_for_missing_batch_is_404() {
        let (app, _state, _dir) = setup(HashMap::new());
        let (status, _) = post_json(
            &app,
            "/api/reports/generate",
            serde_json::json!({"batch_id": "nope", "format": "pdf"}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
