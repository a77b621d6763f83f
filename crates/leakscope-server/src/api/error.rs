use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use leakscope_core::error::{ClientCode, LeakscopeError};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// HTTP face of [`LeakscopeError`].
#[derive(Debug)]
pub struct ApiError(pub LeakscopeError);

impl From<LeakscopeError> for ApiError {
    fn from(e: LeakscopeError) -> Self {
        Self(e)
    }
}

fn status_for(code: ClientCode) -> StatusCode {
    match code {
        ClientCode::BadRequest | ClientCode::UnsupportedVersion => StatusCode::BAD_REQUEST,
        ClientCode::Upstream => StatusCode::BAD_GATEWAY,
        ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let body = json!({
            "code": code.as_str(),
            "msg": self.0.to_string(),
        });
        (status_for(code), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_codes_to_status() {
        let r = ApiError(LeakscopeError::Upstream("refused".into())).into_response();
        assert_eq!(r.status(), StatusCode::BAD_GATEWAY);
        let r = ApiError(LeakscopeError::BadRequest("size".into())).into_response();
        assert_eq!(r.status(), StatusCode::BAD_REQUEST);
    }
}
