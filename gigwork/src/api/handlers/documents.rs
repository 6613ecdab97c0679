use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        accounts::CurrentAccount,
        documents::{DocumentResponse, DocumentType, DocumentUploadForm},
        pagination::Pagination,
    },
    errors::Error,
    types::abbrev_uuid,
    verification::DocumentUpload,
    AppState,
};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

fn multipart_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge { message: e.body_text() }
    } else {
        Error::bad_request(format!("Failed to parse multipart data: {}", e.body_text()))
    }
}

fn missing(field: &'static str) -> Error {
    Error::BadRequest {
        message: format!("{field} is required"),
        field: Some(field),
    }
}

/// Upload an identity document for the current worker
#[utoipa::path(
    post,
    path = "/api/v1/worker/documents",
    tag = "documents",
    request_body(content = DocumentUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document stored and pending review", body = DocumentResponse),
        (status = 400, description = "Missing field, empty file or unsupported content type"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Not a worker"),
        (status = 413, description = "File too large"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn upload_document(
    State(state): State<AppState>,
    current: CurrentAccount,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentResponse>), Error> {
    let worker_profile = state.workflow.get_worker_profile(current.id).await?;
    let max_file_size = state.config.files.max_file_size;

    let mut document_type: Option<DocumentType> = None;
    let mut document_number: Option<String> = None;
    let mut file: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "document_type" => {
                let text = field.text().await.map_err(multipart_error)?;
                let text = text.trim();
                let parsed: DocumentType =
                    serde_json::from_value(serde_json::Value::String(text.to_string())).map_err(|_| Error::BadRequest {
                        message: format!("'{text}' is not a valid document type"),
                        field: Some("document_type"),
                    })?;
                document_type = Some(parsed);
            }
            "document_number" => {
                document_number = Some(field.text().await.map_err(multipart_error)?);
            }
            "file" => {
                let content_type = field.content_type().unwrap_or(DEFAULT_CONTENT_TYPE).to_string();
                let mut content = Vec::new();
                let mut chunks = field;

                while let Some(chunk) = chunks.chunk().await.map_err(multipart_error)? {
                    // Fail fast instead of buffering an oversized upload
                    if (content.len() + chunk.len()) as u64 > max_file_size {
                        tracing::warn!(
                            worker_profile_id = %abbrev_uuid(&worker_profile.id),
                            max_file_size,
                            "Document upload exceeds size limit, aborting"
                        );
                        return Err(Error::PayloadTooLarge {
                            message: format!(
                                "File size exceeds maximum allowed size of {} bytes ({} MB)",
                                max_file_size,
                                max_file_size / (1024 * 1024)
                            ),
                        });
                    }
                    content.extend_from_slice(&chunk);
                }

                file = Some((content, content_type));
            }
            other => {
                tracing::debug!(field = other, "Ignoring unexpected multipart field");
            }
        }
    }

    let (content, content_type) = file.ok_or_else(|| missing("file"))?;
    let upload = DocumentUpload {
        document_type: document_type.ok_or_else(|| missing("document_type"))?,
        document_number: document_number.ok_or_else(|| missing("document_number"))?,
        content,
        content_type,
    };

    let (document, _) = state.workflow.submit_document(&current, worker_profile.id, upload).await?;
    Ok((StatusCode::CREATED, Json(DocumentResponse::from(document))))
}

/// List the current worker's documents, newest first
#[utoipa::path(
    get,
    path = "/api/v1/worker/documents",
    tag = "documents",
    params(Pagination),
    responses(
        (status = 200, description = "Documents; empty when the account is not a worker", body = [DocumentResponse]),
        (status = 401, description = "Not authenticated"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_documents(
    State(state): State<AppState>,
    current: CurrentAccount,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<DocumentResponse>>, Error> {
    let (skip, limit) = pagination.params();
    let documents = state.workflow.list_own_documents(current.id, skip, limit).await?;
    Ok(Json(documents.into_iter().map(DocumentResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{become_worker, bearer, create_test_server, pdf_upload, register_and_login};
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};

    #[tokio::test]
    async fn test_upload_moves_worker_to_pending() {
        let (server, _) = create_test_server().await;
        let pair = register_and_login(&server, "suman@example.com", "9800000050").await;
        become_worker(&server, &pair.access).await;

        let response = server
            .post("/api/v1/worker/documents")
            .add_header("authorization", bearer(&pair.access))
            .multipart(pdf_upload("CITIZENSHIP", "12-34-56"))
            .await;
        response.assert_status(StatusCode::CREATED);
        let document: serde_json::Value = response.json();
        assert_eq!(document["status"], "PENDING");
        assert_eq!(document["document_type"], "CITIZENSHIP");
        assert_eq!(document["content_type"], "application/pdf");
        assert!(document.get("file_reference").is_none());

        let worker: serde_json::Value = server
            .get("/api/v1/worker/profile")
            .add_header("authorization", bearer(&pair.access))
            .await
            .json();
        assert_eq!(worker["verification_status"], "PENDING");

        let listed: Vec<serde_json::Value> = server
            .get("/api/v1/worker/documents")
            .add_header("authorization", bearer(&pair.access))
            .await
            .json();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], document["id"]);
    }

    #[tokio::test]
    async fn test_upload_requires_worker() {
        let (server, _) = create_test_server().await;
        let pair = register_and_login(&server, "rita@example.com", "9800000051").await;

        server
            .post("/api/v1/worker/documents")
            .add_header("authorization", bearer(&pair.access))
            .multipart(pdf_upload("CITIZENSHIP", "12-34-56"))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        // Listing is simply empty for non-workers
        let listed: Vec<serde_json::Value> = server
            .get("/api/v1/worker/documents")
            .add_header("authorization", bearer(&pair.access))
            .await
            .json();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_upload_validation() {
        let (server, _) = create_test_server().await;
        let pair = register_and_login(&server, "binod@example.com", "9800000052").await;
        become_worker(&server, &pair.access).await;

        // Unsupported content type
        let form = MultipartForm::new()
            .add_text("document_type", "NIN_CARD")
            .add_text("document_number", "NIN-1")
            .add_part("file", Part::bytes(b"hello".as_slice()).file_name("id.txt").mime_type("text/plain"));
        let response = server
            .post("/api/v1/worker/documents")
            .add_header("authorization", bearer(&pair.access))
            .multipart(form)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["field"], "file");

        // Unknown document type
        let response = server
            .post("/api/v1/worker/documents")
            .add_header("authorization", bearer(&pair.access))
            .multipart(pdf_upload("PASSPORT", "P-1"))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["field"], "document_type");

        // Missing file
        let form = MultipartForm::new()
            .add_text("document_type", "DRIVER_LICENSE")
            .add_text("document_number", "DL-1");
        server
            .post("/api/v1/worker/documents")
            .add_header("authorization", bearer(&pair.access))
            .multipart(form)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        // Nothing was stored and the worker is still unverified
        let worker: serde_json::Value = server
            .get("/api/v1/worker/profile")
            .add_header("authorization", bearer(&pair.access))
            .await
            .json();
        assert_eq!(worker["verification_status"], "UNVERIFIED");
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let (server, state) = create_test_server().await;
        let pair = register_and_login(&server, "kiran@example.com", "9800000053").await;
        become_worker(&server, &pair.access).await;

        let too_big = vec![0u8; state.config.files.max_file_size as usize + 1];
        let form = MultipartForm::new()
            .add_text("document_type", "CITIZENSHIP")
            .add_text("document_number", "12-34-57")
            .add_part("file", Part::bytes(too_big).file_name("big.pdf").mime_type("application/pdf"));

        server
            .post("/api/v1/worker/documents")
            .add_header("authorization", bearer(&pair.access))
            .multipart(form)
            .await
            .assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    }
}
