//! HTTP surface
//!
//! - `POST   /api/contributions`: body = image bytes, `Content-Type` = MIME
//! - `DELETE /api/contributions/{folder_key}`: manual folder cleanup
//! - `GET    /api/gallery`: displayable contributions, newest first
//! - `GET    /health`

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use echoes_core::app::{GalleryEntry, GalleryReader, UploadOrchestrator, cleanup_folder};
use echoes_core::domain::{
    CleanupReport, Contribution, ErrorKind, FolderKey, OrchestrationError, visitor_message,
};
use echoes_core::ports::BlobError;
use serde::Serialize;
use serde_json::json;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub const DEFAULT_BODY_LIMIT: usize = 20 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<UploadOrchestrator>,
    pub gallery: Arc<GalleryReader>,
    /// Uploads are refused with 503 while false.
    pub accepting_uploads: bool,
}

impl AppState {
    pub fn new(orchestrator: UploadOrchestrator, accepting_uploads: bool) -> Self {
        let gallery = GalleryReader::new(Arc::clone(orchestrator.store()));
        Self {
            orchestrator: Arc::new(orchestrator),
            gallery: Arc::new(gallery),
            accepting_uploads,
        }
    }
}

pub fn build_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/contributions", post(create_contribution))
        .route("/api/contributions/{folder_key}", delete(cleanup_contribution))
        .route("/api/gallery", get(list_gallery))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "echoes".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /api/contributions
async fn create_contribution(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Contribution>), ApiError> {
    if !state.accepting_uploads {
        return Err(ApiError::Unavailable);
    }
    let mime = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let contribution = state.orchestrator.run(body, mime).await?;
    Ok((StatusCode::CREATED, Json(contribution)))
}

/// GET /api/gallery
async fn list_gallery(State(state): State<AppState>) -> Result<Json<Vec<GalleryEntry>>, ApiError> {
    Ok(Json(state.gallery.list_complete().await?))
}

/// DELETE /api/contributions/{folder_key}
async fn cleanup_contribution(
    State(state): State<AppState>,
    Path(folder_key): Path<String>,
) -> Result<(StatusCode, Json<CleanupReport>), ApiError> {
    let folder_key: FolderKey = folder_key
        .parse()
        .map_err(|_| ApiError::BadFolderKey(folder_key))?;
    let report = cleanup_folder(state.orchestrator.store().as_ref(), folder_key).await;
    let status = if report.is_complete() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(report)))
}

#[derive(Debug)]
pub enum ApiError {
    Unavailable,
    BadFolderKey(String),
    Orchestration(OrchestrationError),
    Storage(BlobError),
}

impl From<OrchestrationError> for ApiError {
    fn from(err: OrchestrationError) -> Self {
        ApiError::Orchestration(err)
    }
}

impl From<BlobError> for ApiError {
    fn from(err: BlobError) -> Self {
        ApiError::Storage(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "Uploads are closed right now." }),
            ),
            ApiError::BadFolderKey(key) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("Invalid folder key: {key}") }),
            ),
            ApiError::Storage(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": format!("Storage error: {err}") }),
            ),
            ApiError::Orchestration(err) => {
                let status = match err.kind() {
                    ErrorKind::Rejected => StatusCode::BAD_REQUEST,
                    ErrorKind::Infrastructure | ErrorKind::Generation => StatusCode::BAD_GATEWAY,
                };
                let body = json!({
                    "error": visitor_message(&err),
                    "detail": err.to_string(),
                    "stage": err.stage(),
                    "cleanup_complete": err.cleanup().map(CleanupReport::is_complete),
                });
                (status, body)
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use echoes_core::domain::{PredictionJob, PredictionSpec, PredictionStatus, SourceImageType};
    use echoes_core::impls::InMemoryBlobStore;
    use echoes_core::ports::{ImageNormalizer, NormalizeError, PredictionClient, PredictionError};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::util::ServiceExt;

    /// Finishes every job at creation time.
    struct InstantPredictions {
        fail_caption: bool,
    }

    #[async_trait]
    impl PredictionClient for InstantPredictions {
        async fn create(&self, spec: &PredictionSpec) -> Result<PredictionJob, PredictionError> {
            let input = &spec.input;
            let job = if input.get("image").is_some() {
                if self.fail_caption {
                    PredictionJob::new("caption", PredictionStatus::Failed).with_error("NSFW")
                } else {
                    PredictionJob::new("caption", PredictionStatus::Succeeded)
                        .with_output(json!(["a red door"]))
                }
            } else if input.get("speaker").is_some() {
                PredictionJob::new("speech", PredictionStatus::Succeeded)
                    .with_output(json!("https://out/audio.wav"))
            } else {
                PredictionJob::new("image", PredictionStatus::Succeeded)
                    .with_output(json!(["https://out/image.webp"]))
            };
            Ok(job)
        }

        async fn get(&self, id: &str) -> Result<PredictionJob, PredictionError> {
            Err(PredictionError::Decode(format!("unexpected poll of {id}")))
        }

        async fn cancel(&self, _id: &str) -> Result<(), PredictionError> {
            Ok(())
        }

        async fn download(&self, url: &str) -> Result<bytes::Bytes, PredictionError> {
            Ok(bytes::Bytes::from(format!("bytes of {url}")))
        }
    }

    struct PassThrough;

    impl ImageNormalizer for PassThrough {
        fn normalize(&self, bytes: &[u8], _source: SourceImageType) -> Result<Bytes, NormalizeError> {
            Ok(Bytes::copy_from_slice(bytes))
        }
    }

    fn setup(accepting_uploads: bool, fail_caption: bool) -> (Router, Arc<InMemoryBlobStore>) {
        let store = Arc::new(InMemoryBlobStore::new());
        let orchestrator = UploadOrchestrator::builder()
            .store(store.clone())
            .predictions(Arc::new(InstantPredictions { fail_caption }))
            .normalizer(Arc::new(PassThrough))
            .build()
            .unwrap();
        let router = build_router(AppState::new(orchestrator, accepting_uploads), 1024);
        (router, store)
    }

    fn upload(mime: &str, body: &'static [u8]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/contributions")
            .header(header::CONTENT_TYPE, mime)
            .body(Body::from(body))
            .unwrap()
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (app, _) = setup(true, false);
        let response = app.oneshot(request("GET", "/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["module"], "echoes");
        assert!(body["version"].is_string());
    }

    #[tokio::test]
    async fn test_upload_then_gallery() {
        let (app, store) = setup(true, false);

        let response = app
            .clone()
            .oneshot(upload("image/jpeg", b"jpeg bytes"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let contribution = json_body(response).await;
        assert_eq!(contribution["description"], "a red door");
        assert_eq!(store.keys().await.len(), 4);

        let response = app.oneshot(request("GET", "/api/gallery")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let gallery = json_body(response).await;
        assert_eq!(gallery.as_array().unwrap().len(), 1);
        assert_eq!(gallery[0]["folder_key"], contribution["folder_key"]);
        assert_eq!(gallery[0]["audio_url"], contribution["generated_audio"]["url"]);
    }

    #[tokio::test]
    async fn test_unsupported_type_is_bad_request() {
        let (app, store) = setup(true, false);
        let response = app.oneshot(upload("image/webp", b"webp bytes")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "The system supports only image uploads: jpg, png, gif");
        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn test_generation_failure_is_bad_gateway() {
        let (app, store) = setup(true, true);
        let response = app.oneshot(upload("image/png", b"png bytes")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["stage"], "caption");
        assert_eq!(body["cleanup_complete"], true);
        assert!(store.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_closed_uploads_are_unavailable() {
        let (app, store) = setup(false, false);
        let response = app.oneshot(upload("image/jpeg", b"jpeg bytes")).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let (app, store) = setup(true, false);
        let big: &'static [u8] = &[0u8; 2048];
        let response = app.oneshot(upload("image/jpeg", big)).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn test_manual_cleanup() {
        let (app, store) = setup(true, false);
        let response = app
            .clone()
            .oneshot(upload("image/gif", b"gif bytes"))
            .await
            .unwrap();
        let folder_key = json_body(response).await["folder_key"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .clone()
            .oneshot(request("DELETE", &format!("/api/contributions/{folder_key}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let report = json_body(response).await;
        assert_eq!(report["outcomes"].as_array().unwrap().len(), 4);
        assert!(store.keys().await.is_empty());

        let response = app
            .oneshot(request("DELETE", "/api/contributions/not-a-key"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
