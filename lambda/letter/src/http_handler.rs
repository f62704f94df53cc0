use chrono::Utc;
use lambda_http::tracing::{error, info};
use lambda_http::{Body, Error, Request, RequestExt, Response};
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::LetterError;
use crate::letter::{CreateLetterRequest, LetterView};
use crate::store::LetterStore;

const ALLOW_HEADERS: &str = "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token";
const ALLOW_METHODS: &str = "OPTIONS,POST,GET";

fn json_response(status: u16, body: &Value) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", ALLOW_HEADERS)
        .header("Access-Control-Allow-Methods", ALLOW_METHODS)
        .header("Content-Type", "application/json")
        .body(Body::Text(body.to_string()))?)
}

async fn create_letter(
    store: &dyn LetterStore,
    config: &Config,
    body: &[u8],
) -> Result<Value, LetterError> {
    let letter = CreateLetterRequest::from_body(body)?.into_letter(Utc::now())?;

    info!(letter_id = %letter.letter_id, "saving letter");
    store.put_letter(&letter).await.map_err(|e| {
        error!(letter_id = %letter.letter_id, error = %e, "failed to save letter");
        LetterError::Internal(format!("Failed to save letter: {}", e))
    })?;

    Ok(json!({
        "success": true,
        "letterUrl": config.letter_url(&letter.letter_id),
        "letter_id": letter.letter_id,
    }))
}

fn retrieval_failed(e: impl std::fmt::Display) -> LetterError {
    error!(error = %e, "failed to retrieve letter");
    LetterError::Internal(format!("Failed to retrieve letter: {}", e))
}

async fn read_letter(store: &dyn LetterStore, event: &Request) -> Result<Value, LetterError> {
    let params = event.path_parameters();
    let letter_id = match params.first("letter_id") {
        Some(id) if !id.is_empty() => id,
        _ => return Err(LetterError::Validation("Missing letter ID".to_string())),
    };
    info!(letter_id, "reading letter");

    let letter = store
        .get_letter(letter_id)
        .await
        .map_err(retrieval_failed)?
        .ok_or_else(|| LetterError::NotFound("Letter not found".to_string()))?;

    if letter.is_expired(Utc::now()).map_err(retrieval_failed)? {
        info!(letter_id, "deleting expired letter");
        store
            .delete_letter(letter_id)
            .await
            .map_err(retrieval_failed)?;
        return Err(LetterError::NotFound("Letter has expired".to_string()));
    }

    // A failed increment degrades to an unpersisted estimate.
    let views = match store.increment_views(letter_id).await {
        Ok(views) => views,
        Err(e) => {
            error!(letter_id, error = %e, "failed to update view count");
            letter.views + 1
        }
    };

    Ok(json!({
        "success": true,
        "letter": LetterView::new(letter, views),
    }))
}

pub(crate) async fn function_handler(
    store: &dyn LetterStore,
    config: &Config,
    event: Request,
) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();
    info!(method, "request received");

    let outcome = match method {
        "OPTIONS" => return json_response(200, &json!({ "message": "CORS enabled" })),
        "POST" => create_letter(store, config, event.body().as_ref()).await,
        "GET" => read_letter(store, &event).await,
        other => {
            error!(method = other, "method not allowed");
            Err(LetterError::MethodNotAllowed(other.to_string()))
        }
    };

    match outcome {
        Ok(body) => json_response(200, &body),
        Err(e) => json_response(e.status_code(), &json!({ "error": e.to_string() })),
    }
}
