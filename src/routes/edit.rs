use std::io;
use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use crate::apis::huggingface::{GenerationError, PROVIDER};
use crate::server::AppState;
use crate::storage;
use crate::upload;

pub enum EditError {
    MissingImage,
    MissingPrompt,
    InvalidUpload(&'static str),
    UnknownProvider(String),
    ImageTooLarge,
    Multipart(MultipartError),
    Storage(io::Error),
    Generation(GenerationError),
}

impl IntoResponse for EditError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::MissingImage => {
                (StatusCode::BAD_REQUEST, json!({ "error": "no image file provided" }))
            }
            Self::MissingPrompt => {
                (StatusCode::BAD_REQUEST, json!({ "error": "prompt is required" }))
            }
            Self::InvalidUpload(issue) => (StatusCode::BAD_REQUEST, json!({ "error": issue })),
            Self::UnknownProvider(provider) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("unsupported provider: {provider}") }),
            ),
            Self::ImageTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                json!({ "error": "image exceeds the 10 MiB limit" }),
            ),
            Self::Multipart(err) => (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() })),
            Self::Storage(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "failed to process image", "message": err.to_string() }),
            ),
            Self::Generation(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "failed to process image", "message": err.to_string() }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

pub async fn process(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, EditError> {
    let mut image = None;
    let mut prompt = None;
    let mut provider = None;

    while let Some(field) = multipart.next_field().await.map_err(EditError::Multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                if let Some(issue) = upload::check_upload(&filename, &content_type) {
                    log::info!("upload rejected: {issue}");
                    return Err(EditError::InvalidUpload(issue));
                }

                let bytes = field.bytes().await.map_err(EditError::Multipart)?;
                if bytes.len() > upload::MAX_UPLOAD_SIZE {
                    return Err(EditError::ImageTooLarge);
                }
                image = Some((filename, bytes.to_vec()));
            }
            "prompt" => prompt = Some(field.text().await.map_err(EditError::Multipart)?),
            "provider" => provider = Some(field.text().await.map_err(EditError::Multipart)?),
            _ => (),
        }
    }

    let Some((filename, bytes)) = image else {
        return Err(EditError::MissingImage);
    };

    let provider = provider.unwrap_or_else(|| PROVIDER.to_string());
    if provider != PROVIDER {
        return Err(EditError::UnknownProvider(provider));
    }

    let stored = storage::store_upload(state.storage_mode, &state.upload_dir, &filename, bytes)
        .await
        .map_err(EditError::Storage)?;

    // the upload is already on disk at this point, release it before bailing
    let Some(prompt) = prompt.filter(|prompt| !prompt.trim().is_empty()) else {
        stored.cleanup().await;
        return Err(EditError::MissingPrompt);
    };

    let result = state.hf.generate(&stored, &prompt).await;
    stored.cleanup().await;

    let result = result.inspect_err(|err| log::error!("generation failed: {err}"))
        .map_err(EditError::Generation)?;

    Ok(Json(json!({ "success": true, "result": result })))
}
