//! Request handlers
//!
//! Translate HTTP requests into store commands.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::rejection::BytesRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::header;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use percent_encoding::percent_decode_str;

use crate::command::Command;
use crate::store::Store;

use super::response::{ApiError, Hello, JsonBody, StatusBody};

/// Key taken from the last path segment, percent-decoded to raw bytes
///
/// axum's `Path` insists on UTF-8; keys are arbitrary bytes, so `%FF`
/// has to survive as the byte `0xFF`.
pub(super) struct KeyParam(pub Vec<u8>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for KeyParam {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let segment = parts
            .uri
            .path()
            .rsplit('/')
            .next()
            .ok_or_else(|| ApiError::bad_request("missing key"))?;

        Ok(Self(percent_decode_str(segment).collect()))
    }
}

pub(super) async fn hello() -> JsonBody<Hello> {
    JsonBody(Hello::world())
}

pub(super) async fn get_key(
    State(store): State<Arc<Store>>,
    KeyParam(key): KeyParam,
) -> Result<Response, ApiError> {
    let value = execute(store, Command::Get { key }).await?.unwrap_or_default();

    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], value).into_response())
}

pub(super) async fn set_key(
    State(store): State<Arc<Store>>,
    KeyParam(key): KeyParam,
    body: Result<Bytes, BytesRejection>,
) -> Result<JsonBody<StatusBody>, ApiError> {
    // Oversized bodies land here as 413
    let body = body.map_err(|rejection| ApiError {
        status: rejection.status(),
        message: rejection.body_text(),
    })?;

    execute(
        store,
        Command::Set {
            key,
            value: body.to_vec(),
        },
    )
    .await?;

    Ok(JsonBody(StatusBody::success()))
}

pub(super) async fn delete_key(
    State(store): State<Arc<Store>>,
    KeyParam(key): KeyParam,
) -> Result<JsonBody<StatusBody>, ApiError> {
    execute(store, Command::Delete { key }).await?;

    Ok(JsonBody(StatusBody::success()))
}

/// Run a command on the blocking pool; store calls do synchronous file I/O
async fn execute(store: Arc<Store>, command: Command) -> Result<Option<Vec<u8>>, ApiError> {
    let command_type = command.command_type();

    tracing::debug!(
        mutation = command.is_mutation(),
        key_len = command.key().len(),
        "Executing {:?}",
        command_type
    );

    let result = tokio::task::spawn_blocking(move || store.execute(command))
        .await
        .map_err(|e| {
            tracing::error!("Store task for {:?} failed: {}", command_type, e);
            ApiError::internal(format!("store task failed: {}", e))
        })?;

    result.map_err(|e| {
        tracing::warn!("{:?} failed: {}", command_type, e);
        ApiError::from(e)
    })
}
