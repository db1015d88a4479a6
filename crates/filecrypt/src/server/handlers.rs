//! Axum request handlers for all service endpoints.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use common::protocol::{ErrorResponse, HealthResponse, Operation, TransformResponse};
use common::ServiceError;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use super::{page, state::AppState};
use crate::crypto::{self, EnvelopeFormat, Passphrase};
use crate::storage::{naming, StoreError, StoredArtifact};

/// `GET /` — the upload page.
pub async fn index() -> Html<String> {
    Html(page::render(None))
}

/// `POST /` — encrypt or decrypt an upload, chosen by the `form_type` field.
///
/// Browsers (`Accept: text/html`) get the page back with the outcome shown in
/// the submitted form; other clients get JSON.
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let wants_html = accepts_html(&headers);
    let (card, result) = match UploadForm::read(multipart).await {
        Ok(form) => {
            let card = match form.form_type.as_deref() {
                Some("encrypt") => Operation::Encrypt,
                _ => Operation::Decrypt,
            };
            (card, submit_form(&state, form).await)
        }
        Err(e) => (Operation::Decrypt, Err(e)),
    };

    if wants_html {
        page_response(card, result)
    } else {
        respond(result)
    }
}

async fn submit_form(
    state: &AppState,
    form: UploadForm,
) -> Result<TransformResponse, ServiceError> {
    match form.form_type.as_deref().map(str::parse::<Operation>) {
        Some(Ok(op)) => transform(state, op, form).await,
        _ => {
            // Missing fields are reported before an unknown action.
            form.require_file_and_key()?;
            Err(ServiceError::BadRequest("invalid action".into()))
        }
    }
}

fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains("text/html"))
}

/// `POST /encrypt` — encrypt an upload.
pub async fn encrypt(State(state): State<AppState>, multipart: Multipart) -> Response {
    match UploadForm::read(multipart).await {
        Ok(form) => respond(transform(&state, Operation::Encrypt, form).await),
        Err(e) => error_response(e),
    }
}

/// `POST /decrypt` — decrypt an upload.
pub async fn decrypt(State(state): State<AppState>, multipart: Multipart) -> Response {
    match UploadForm::read(multipart).await {
        Ok(form) => respond(transform(&state, Operation::Decrypt, form).await),
        Err(e) => error_response(e),
    }
}

/// `GET /processed/:filename` — download a stored result as an attachment.
pub async fn download(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    let store = Arc::clone(&state.store);
    let name = filename.clone();
    let path = match tokio::task::spawn_blocking(move || store.locate(&name)).await {
        Ok(Ok(p)) => p,
        Ok(Err(e)) => return error_response(store_error(e)),
        Err(e) => return error_response(ServiceError::Internal(format!("lookup task failed: {e}"))),
    };

    let file = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return error_response(ServiceError::NotFound(filename));
        }
        Err(e) => {
            warn!(error = %e, filename = %filename, "failed to open artifact");
            return error_response(ServiceError::Internal("failed to open file".into()));
        }
    };

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_owned()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    let body = Body::from_stream(ReaderStream::new(file));
    (StatusCode::OK, headers, body).into_response()
}

/// `GET /health` — liveness and readiness check.
///
/// Returns `200 OK` when the store can accept writes, `503` otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let storage_ready = state.store.is_ready();
    let (status_code, status_str) = if storage_ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status: status_str.into(),
        storage_ready,
    };
    (status_code, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

// ---------------------------------------------------------------------------
// Upload handling
// ---------------------------------------------------------------------------

/// An uploaded file.
struct UploadedFile {
    name: String,
    data: Bytes,
}

/// The multipart fields of an upload form. Unknown fields are ignored.
#[derive(Default)]
struct UploadForm {
    form_type: Option<String>,
    file: Option<UploadedFile>,
    key: Option<Vec<u8>>,
    format: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ServiceError> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let field_name = field.name().unwrap_or_default().to_owned();
            match field_name.as_str() {
                "file" => {
                    let name = field.file_name().unwrap_or_default().to_owned();
                    let data = field.bytes().await.map_err(multipart_error)?;
                    form.file = Some(UploadedFile { name, data });
                }
                "key" => {
                    form.key = Some(field.bytes().await.map_err(multipart_error)?.to_vec());
                }
                "form_type" => {
                    form.form_type = Some(field.text().await.map_err(multipart_error)?);
                }
                "format" => {
                    form.format = Some(field.text().await.map_err(multipart_error)?);
                }
                _ => {}
            }
        }
        Ok(form)
    }

    /// A file without a name counts as missing, as does an empty key.
    fn require_file_and_key(&self) -> Result<(), ServiceError> {
        let has_file = self.file.as_ref().is_some_and(|f| !f.name.is_empty());
        let has_key = self.key.as_ref().is_some_and(|k| !k.is_empty());
        if has_file && has_key {
            Ok(())
        } else {
            Err(ServiceError::BadRequest("file and key are required".into()))
        }
    }

    fn envelope_format(&self, default: EnvelopeFormat) -> Result<EnvelopeFormat, ServiceError> {
        match self.format.as_deref().map(str::trim) {
            None | Some("") => Ok(default),
            Some(s) => s
                .parse()
                .map_err(|e: crypto::envelope::UnknownFormat| ServiceError::BadRequest(e.to_string())),
        }
    }
}

fn multipart_error(e: MultipartError) -> ServiceError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServiceError::PayloadTooLarge(e.body_text())
    } else {
        ServiceError::BadRequest(e.body_text())
    }
}

/// Run `op` over the uploaded file and persist the result.
///
/// The crypto work and the write both happen on the blocking pool.
async fn transform(
    state: &AppState,
    op: Operation,
    form: UploadForm,
) -> Result<TransformResponse, ServiceError> {
    form.require_file_and_key()?;
    let format = form.envelope_format(state.default_format)?;
    let (Some(file), Some(key)) = (form.file, form.key) else {
        return Err(ServiceError::BadRequest("file and key are required".into()));
    };

    let output_name = naming::output_name(op, &naming::sanitize(&file.name));
    let input_size = file.data.len();
    let store = Arc::clone(&state.store);

    let stored = tokio::task::spawn_blocking(move || -> Result<StoredArtifact, ServiceError> {
        let passphrase = Passphrase::from_utf8(key).map_err(|e| transform_failure(op, e.into()))?;
        let result = match op {
            Operation::Encrypt => crypto::encrypt(&file.data, passphrase.as_str(), format),
            Operation::Decrypt => crypto::decrypt(&file.data, passphrase.as_str(), format),
        };
        let output = result.map_err(|e| transform_failure(op, e))?;
        store.persist(&output_name, &output).map_err(store_error)
    })
    .await
    .map_err(|e| ServiceError::Internal(format!("transform task failed: {e}")))??;

    info!(
        operation = %op,
        format = %format,
        input_size,
        output_size = stored.size,
        filename = %stored.filename,
        "transform complete"
    );

    Ok(TransformResponse {
        operation: op,
        filename: stored.filename,
        size: stored.size,
        format: format.as_str().to_owned(),
        download_url: stored.download_url,
    })
}

fn transform_failure(op: Operation, e: crypto::TransformError) -> ServiceError {
    warn!(operation = %op, kind = e.kind(), "transform failed");
    ServiceError::TransformFailure(format!("cannot {op} this input: {e}"))
}

fn store_error(e: StoreError) -> ServiceError {
    match e {
        StoreError::InvalidName(name) => ServiceError::BadRequest(format!("invalid file name: {name}")),
        StoreError::NotFound(name) => ServiceError::NotFound(name),
        StoreError::Io(e) => {
            warn!(error = %e, "storage failure");
            ServiceError::Internal("failed to store result".into())
        }
    }
}

fn respond(result: Result<TransformResponse, ServiceError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => error_response(e),
    }
}

fn page_response(card: Operation, result: Result<TransformResponse, ServiceError>) -> Response {
    let (status, notice) = match result {
        Ok(body) => (
            StatusCode::OK,
            page::Notice::Success {
                filename: body.filename,
                download_url: body.download_url,
            },
        ),
        Err(e) => (
            status_of(&e),
            page::Notice::Failure {
                message: e.to_string(),
            },
        ),
    };
    (status, Html(page::render(Some((card, &notice))))).into_response()
}

fn status_of(err: &ServiceError) -> StatusCode {
    StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn error_response(err: ServiceError) -> Response {
    (status_of(&err), Json(ErrorResponse::from(&err))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::routing::get;
    use axum::Router;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;

    use crate::server::{middleware::Limits, router};
    use crate::storage::{FsStore, MockArtifactStore};

    fn server_with(state: AppState) -> TestServer {
        TestServer::new(router::build(state, Limits::default())).unwrap()
    }

    fn fs_server(dir: &std::path::Path) -> TestServer {
        server_with(AppState::new(
            Arc::new(FsStore::new(dir)),
            EnvelopeFormat::LegacyCbc,
        ))
    }

    fn upload(form_type: Option<&str>, name: &str, data: &[u8], key: &str) -> MultipartForm {
        let mut form = MultipartForm::new()
            .add_text("key", key)
            .add_part("file", Part::bytes(data.to_vec()).file_name(name));
        if let Some(t) = form_type {
            form = form.add_text("form_type", t);
        }
        form
    }

    #[tokio::test]
    async fn encrypt_then_decrypt_through_index_form() {
        let dir = tempfile::tempdir().unwrap();
        let server = fs_server(dir.path());

        let resp = server
            .post("/")
            .multipart(upload(Some("encrypt"), "hello.txt", b"hello world", "secret"))
            .await;
        resp.assert_status_ok();
        let enc: TransformResponse = resp.json();
        assert_eq!(enc.operation, Operation::Encrypt);
        assert_eq!(enc.filename, "hello.txt.enc");
        assert_eq!(enc.size, 32);
        assert_eq!(enc.format, "legacy-cbc");
        assert_eq!(enc.download_url, "/processed/hello.txt.enc");

        let envelope = std::fs::read(dir.path().join("hello.txt.enc")).unwrap();
        assert_eq!(envelope.len(), 32);

        let resp = server
            .post("/")
            .multipart(upload(Some("decrypt"), "hello.txt.enc", &envelope, "secret"))
            .await;
        resp.assert_status_ok();
        let dec: TransformResponse = resp.json();
        assert_eq!(dec.filename, "hello.txt.dec");
        assert_eq!(
            std::fs::read(dir.path().join("hello.txt.dec")).unwrap(),
            b"hello world"
        );
    }

    #[tokio::test]
    async fn browser_submit_renders_page_with_download_link() {
        let dir = tempfile::tempdir().unwrap();
        let server = fs_server(dir.path());
        let form = upload(Some("encrypt"), "a.txt", b"browser upload", "secret")
            .add_text("format", "legacy-cbc");
        let resp = server
            .post("/")
            .add_header(header::ACCEPT, HeaderValue::from_static("text/html,*/*;q=0.8"))
            .multipart(form)
            .await;
        resp.assert_status_ok();
        let content_type = resp.header("content-type");
        assert!(content_type.to_str().unwrap().starts_with("text/html"));
        let html = resp.text();
        assert!(html.contains(r#"<a href="/processed/a.txt.enc">"#), "{html}");
        assert!(html.contains("Encryption succeeded"));
        assert!(dir.path().join("a.txt.enc").is_file());
    }

    #[tokio::test]
    async fn browser_submit_shows_error_in_decrypt_form() {
        let dir = tempfile::tempdir().unwrap();
        let server = fs_server(dir.path());
        let envelope = crypto::encrypt(b"hello world", "secret", EnvelopeFormat::SealedV1).unwrap();
        let form = upload(Some("decrypt"), "hello.txt.enc", &envelope, "secrfet")
            .add_text("format", "sealed-v1");
        let resp = server
            .post("/")
            .add_header(header::ACCEPT, HeaderValue::from_static("text/html"))
            .multipart(form)
            .await;
        resp.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let html = resp.text();
        let error = html.find("alert-danger").unwrap();
        assert!(error > html.find("Decrypt a file").unwrap());
        assert!(html.contains("cannot decrypt this input"));
    }

    #[tokio::test]
    async fn decrypt_with_wrong_key_is_422() {
        let dir = tempfile::tempdir().unwrap();
        let server = fs_server(dir.path());
        let envelope = crypto::encrypt(b"hello world", "secret", EnvelopeFormat::SealedV1).unwrap();

        let form = upload(None, "hello.txt.enc", &envelope, "secrfet").add_text("format", "sealed-v1");
        let resp = server.post("/decrypt").multipart(form).await;
        resp.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let err: ErrorResponse = resp.json();
        assert_eq!(err.code, "transform_failed");
        assert!(!dir.path().join("hello.txt.dec").exists());
    }

    #[tokio::test]
    async fn decrypt_short_input_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let server = fs_server(dir.path());
        let resp = server
            .post("/decrypt")
            .multipart(upload(None, "tiny.enc", &[0u8; 10], "secret"))
            .await;
        resp.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let err: ErrorResponse = resp.json();
        assert!(err.message.contains("malformed"), "{}", err.message);
    }

    #[tokio::test]
    async fn sealed_format_round_trip_and_download() {
        let dir = tempfile::tempdir().unwrap();
        let server = fs_server(dir.path());

        let form = upload(None, "data.bin", b"sealed payload", "pw").add_text("format", "sealed-v1");
        let resp = server.post("/encrypt").multipart(form).await;
        resp.assert_status_ok();
        let enc: TransformResponse = resp.json();
        assert_eq!(enc.format, "sealed-v1");

        let download = server.get(&enc.download_url).await;
        download.assert_status_ok();
        let disposition = download.header("content-disposition");
        assert_eq!(
            disposition.to_str().unwrap(),
            "attachment; filename=\"data.bin.enc\""
        );
        let envelope = download.as_bytes().to_vec();
        assert_eq!(
            crypto::decrypt(&envelope, "pw", EnvelopeFormat::SealedV1).unwrap(),
            b"sealed payload"
        );
    }

    #[tokio::test]
    async fn missing_key_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let server = fs_server(dir.path());
        let resp = server
            .post("/")
            .multipart(upload(Some("encrypt"), "a.txt", b"x", ""))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        let err: ErrorResponse = resp.json();
        assert!(err.message.contains("file and key are required"));
    }

    #[tokio::test]
    async fn missing_file_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let server = fs_server(dir.path());
        let form = MultipartForm::new()
            .add_text("form_type", "encrypt")
            .add_text("key", "secret");
        let resp = server.post("/").multipart(form).await;
        resp.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_form_type_is_invalid_action() {
        let dir = tempfile::tempdir().unwrap();
        let server = fs_server(dir.path());
        let resp = server
            .post("/")
            .multipart(upload(Some("compress"), "a.txt", b"x", "k"))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        let err: ErrorResponse = resp.json();
        assert!(err.message.contains("invalid action"));
    }

    #[tokio::test]
    async fn unknown_format_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let server = fs_server(dir.path());
        let form = upload(None, "a.txt", b"x", "k").add_text("format", "rot13");
        let resp = server.post("/encrypt").multipart(form).await;
        resp.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn uploaded_name_is_sanitised() {
        let dir = tempfile::tempdir().unwrap();
        let server = fs_server(dir.path());
        let resp = server
            .post("/encrypt")
            .multipart(upload(None, "../../etc/passwd", b"root", "k"))
            .await;
        resp.assert_status_ok();
        let enc: TransformResponse = resp.json();
        assert_eq!(enc.filename, "passwd.enc");
        assert!(dir.path().join("passwd.enc").is_file());
    }

    #[tokio::test]
    async fn download_missing_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let server = fs_server(dir.path());
        server
            .get("/processed/nothing.enc")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn download_rejects_unsafe_name() {
        let dir = tempfile::tempdir().unwrap();
        let server = fs_server(dir.path());
        server
            .get("/processed/..%2Fsecret.txt")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn storage_failure_is_500() {
        let mut store = MockArtifactStore::new();
        store.expect_persist().returning(|_, _| {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        });
        let server = server_with(AppState::new(Arc::new(store), EnvelopeFormat::LegacyCbc));
        let resp = server
            .post("/encrypt")
            .multipart(upload(None, "a.txt", b"x", "k"))
            .await;
        resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let err: ErrorResponse = resp.json();
        assert!(!err.message.contains("read-only"));
    }

    #[tokio::test]
    async fn failed_decrypt_never_reaches_store() {
        let mut store = MockArtifactStore::new();
        store.expect_persist().never();
        let server = server_with(AppState::new(Arc::new(store), EnvelopeFormat::LegacyCbc));
        let resp = server
            .post("/decrypt")
            .multipart(upload(None, "a.enc", &[1u8; 21], "k"))
            .await;
        resp.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn health_reports_store_readiness() {
        let mut store = MockArtifactStore::new();
        store.expect_is_ready().return_const(false);
        let app = Router::new()
            .route("/health", get(health))
            .with_state(AppState::new(Arc::new(store), EnvelopeFormat::LegacyCbc));
        let server = TestServer::new(app).unwrap();
        let resp = server.get("/health").await;
        resp.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        let body: HealthResponse = resp.json();
        assert_eq!(body.status, "degraded");
        assert!(!body.storage_ready);
    }
}
