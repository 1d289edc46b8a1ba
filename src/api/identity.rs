//! Caller identity. Authentication happens upstream; requests carry the
//! signed-in user's id in the `x-user-id` header.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use serde_json::{json, Value};

use crate::domain::value_objects::UserId;

pub const USER_HEADER: &str = "x-user-id";

#[derive(Clone, Copy, Debug)]
pub struct CurrentUser(pub UserId);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<UserId>().ok())
            .map(CurrentUser)
            .ok_or_else(|| (StatusCode::UNAUTHORIZED, Json(json!({ "error": "authentication required" }))))
    }
}
