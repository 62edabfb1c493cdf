use super::super::{Model, Msg, Status};
use super::utils::js_error;
use gloo_file::File as GlooFile;
use gloo_net::http::Request;
use serde_json::Value;
use shared::{PredictRequest, Transport, check_inline_size, check_upload_size, describe_response};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

pub fn handle_file_selected(model: &mut Model, ctx: &Context<Model>, file: Option<GlooFile>) -> bool {
    model.file = None;
    model.preview = None;
    model.reader = None;
    model.status = Status::Idle;

    let Some(file) = file else {
        return true;
    };

    if let Err(message) = check_size(model.transport, file.size()) {
        model.status = Status::Failed(message.to_string());
        return true;
    }

    let link = ctx.link().clone();
    let reader = gloo_file::callbacks::read_as_data_url(&file, move |result| {
        let result = result.map_err(|e| format!("Failed to read image: {:?}", e));
        link.send_message(Msg::PreviewLoaded(result));
    });
    model.reader = Some(reader);
    model.file = Some(file);
    true
}

pub fn handle_preview_loaded(model: &mut Model, result: Result<String, String>) -> bool {
    model.reader = None;
    match result {
        Ok(data_uri) => model.preview = Some(data_uri),
        Err(message) => {
            log::error!("{}", message);
            model.status = Status::Failed(message);
        }
    }
    true
}

pub fn handle_submit(model: &mut Model, ctx: &Context<Model>) -> bool {
    if model.status.is_loading() {
        return false;
    }
    let Some(file) = model.file.as_ref() else {
        model.status = Status::Failed("No image selected".into());
        return true;
    };

    // The transport may have changed since the file was picked.
    if let Err(message) = check_size(model.transport, file.size()) {
        model.status = Status::Failed(message.to_string());
        return true;
    }

    let request = match model.transport {
        Transport::Multipart => build_multipart_request(file),
        Transport::Inline => match model.preview.as_ref() {
            Some(data_uri) => build_inline_request(data_uri.clone()),
            None => Err("Image is still loading".to_string()),
        },
    };
    let request = match request {
        Ok(request) => request,
        Err(message) => {
            model.status = Status::Failed(message);
            return true;
        }
    };

    model.status = Status::Loading;
    let link = ctx.link().clone();
    spawn_local(async move {
        let result = send_prediction_request(request).await;
        if let Err(message) = &result {
            log::warn!("Prediction failed: {}", message);
        }
        link.send_message(Msg::PredictionReceived(result));
    });
    true
}

fn check_size(transport: Transport, size: u64) -> Result<(), &'static str> {
    match transport {
        Transport::Multipart => check_upload_size(size),
        Transport::Inline => check_inline_size(size),
    }
}

fn build_multipart_request(file: &GlooFile) -> Result<Request, String> {
    let form_data = web_sys::FormData::new().map_err(js_error)?;
    form_data
        .append_with_blob_and_filename("image", file.as_ref(), &file.name())
        .map_err(js_error)?;

    Request::post(Transport::Multipart.endpoint())
        .body(form_data)
        .map_err(|e| format!("Failed to build request: {}", e))
}

fn build_inline_request(data_uri: String) -> Result<Request, String> {
    Request::post(Transport::Inline.endpoint())
        .json(&PredictRequest {
            image: Some(data_uri),
        })
        .map_err(|e| format!("Failed to build request: {}", e))
}

async fn send_prediction_request(request: Request) -> Result<String, String> {
    let response = request
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;
    let ok = response.ok();
    let body = response
        .json::<Value>()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))?;
    describe_response(ok, &body)
}
