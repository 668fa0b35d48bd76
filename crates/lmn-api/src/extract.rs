//! `Path` and `Query` extractors that reject with [`ApiError`], so a bad id or
//! query string gets the same JSON error body as every other failure.

use axum::extract::FromRequestParts;

use crate::error::ApiError;

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);
