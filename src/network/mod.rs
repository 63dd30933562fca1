//! Network Module
//!
//! HTTP surface over a shared [`Store`](crate::store::Store).
//!
//! ## Routes
//! - `GET    /`          → `{"hello":"world"}`
//! - `GET    /key/:key`  → raw value bytes (empty when absent)
//! - `POST   /key/:key`  → store the request body → `{"status":"success"}`
//! - `DELETE /key/:key`  → `{"status":"success"}`
//!
//! Keys are the percent-decoded last path segment, as raw bytes.
//! Store failures become `500` with `{"error":"..."}`.

mod handlers;
mod response;
mod server;

pub use response::{ApiError, ErrorBody, Hello, JsonBody, StatusBody, JSON_CONTENT_TYPE};
pub use server::{build_router, Server};
