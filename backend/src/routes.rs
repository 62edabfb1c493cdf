use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::error::JsonPayloadError;
use actix_web::{web, HttpResponse, ResponseError};
use futures::TryStreamExt;
use log::info;
use serde_json::json;
use shared::{PredictRequest, INLINE_TOO_LARGE, MAX_UPLOAD_BYTES};
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::ApiError;
use crate::predictor::invoker::Predictor;
use crate::predictor::PredictorInput;
use crate::storage::upload_store::UploadStore;
use crate::validation::{self, ValidationError};

/// Base64 inflates by 4/3, plus room for the data URI header and JSON framing.
const INLINE_BODY_LIMIT: usize = 8 * 1024 * 1024;

pub fn configure_routes(cfg: &mut web::ServiceConfig, frontend_dir: PathBuf) {
    cfg.service(
        web::resource("/api/predict")
            .route(web::post().to(predict_upload))
            .default_service(web::route().to(method_not_allowed)),
    )
    .service(
        web::resource("/api/predict-optimized")
            .app_data(inline_json_config())
            .route(web::post().to(predict_inline))
            .default_service(web::route().to(method_not_allowed)),
    )
    .service(web::resource("/api/health").route(web::get().to(health)));

    if frontend_dir.is_dir() {
        cfg.service(Files::new("/", frontend_dir).index_file("index.html"));
    } else {
        log::warn!(
            "Frontend directory {} not found, serving the API only",
            frontend_dir.display()
        );
    }
}

fn inline_json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(INLINE_BODY_LIMIT)
        .error_handler(|err, _req| {
            let validation_error = match err {
                JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
                    ValidationError::TooLarge(INLINE_TOO_LARGE)
                }
                other => ValidationError::InvalidJson(other.to_string()),
            };
            ApiError::from(validation_error).into()
        })
}

async fn method_not_allowed() -> HttpResponse {
    ApiError::MethodNotAllowed.error_response()
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Multipart pipeline: store the `image` part, then classify it by path.
async fn predict_upload(
    store: web::Data<UploadStore>,
    predictor: web::Data<Predictor>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let request_id = Uuid::new_v4();
    let (image_data, extension) = read_image_field(&mut payload)
        .await?
        .ok_or(ValidationError::NoImageFile)?;

    let stored = store.save_image(&image_data, extension).await?;
    info!(
        "[{}] stored {} bytes (sha256 {}) as {} at {}",
        request_id,
        stored.size,
        &stored.content_hash[..12],
        stored.path.display(),
        stored.stored_at.to_rfc3339()
    );

    run_prediction(request_id, &predictor, PredictorInput::File(stored.path)).await
}

/// Inline pipeline: the data URI itself is the predictor argument.
async fn predict_inline(
    predictor: web::Data<Predictor>,
    body: web::Json<PredictRequest>,
) -> Result<HttpResponse, ApiError> {
    let request_id = Uuid::new_v4();
    let data_uri = validation::validate_inline(body.into_inner().image)?;
    run_prediction(request_id, &predictor, PredictorInput::Inline(data_uri)).await
}

async fn run_prediction(
    request_id: Uuid,
    predictor: &Predictor,
    input: PredictorInput,
) -> Result<HttpResponse, ApiError> {
    let transport = input.transport();
    info!("[{}] running {} prediction", request_id, transport);
    let prediction = predictor.predict(&input).await?;

    info!("[{}] {} prediction: {:?}", request_id, transport, prediction);
    Ok(HttpResponse::Ok().json(prediction.into_body()))
}

/// Drains the form and keeps the first acceptable `image` part. Parts that
/// fail the image filter are read and dropped, as are other fields.
async fn read_image_field(
    payload: &mut Multipart,
) -> Result<Option<(Vec<u8>, &'static str)>, ApiError> {
    let mut accepted = None;

    while let Some(mut field) = payload.try_next().await.map_err(malformed_form)? {
        let extension = if accepted.is_none() && field.name() == Some("image") {
            validation::accept_image_part(
                field.content_type().map(|mime| mime.essence_str()),
                field.content_disposition().and_then(|cd| cd.get_filename()),
            )
        } else {
            None
        };

        let mut image_data = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(malformed_form)? {
            if extension.is_none() {
                continue;
            }
            if (image_data.len() + chunk.len()) as u64 > MAX_UPLOAD_BYTES {
                return Err(ValidationError::TooLarge(shared::UPLOAD_TOO_LARGE).into());
            }
            image_data.extend_from_slice(&chunk);
        }

        if let Some(extension) = extension {
            if !image_data.is_empty() {
                accepted = Some((image_data, extension));
            }
        }
    }

    Ok(accepted)
}

fn malformed_form(err: actix_multipart::MultipartError) -> ApiError {
    ValidationError::MalformedForm(err.to_string()).into()
}
