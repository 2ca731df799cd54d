//! JSON gateway for the IPFS RPC service
//!
//! Served alongside the gRPC listener when `HTTP_PORT` is set, for clients
//! without a gRPC stack. Each RPC is exposed as `POST /ipfs.v1.IPFSService/{Method}` taking and
//! returning the JSON form of its message:
//!
//! - `POST /ipfs.v1.IPFSService/UploadContent`
//! - `POST /ipfs.v1.IPFSService/UploadProto`
//! - `POST /ipfs.v1.IPFSService/GetContent`
//! - `POST /ipfs.v1.IPFSService/GetProto`
//! - `POST /ipfs.v1.IPFSService/PinContent`
//! - `POST /ipfs.v1.IPFSService/UnpinContent`
//! - `POST /ipfs.v1.IPFSService/GetGatewayURL`
//! - `GET /health` - Health check
//!
//! Failures, including bodies that are not valid JSON for the message, are
//! returned as `{"code": "not_found", "message": "..."}` with a matching HTTP
//! status.
//!
//! ```bash
//! curl -X POST -H "Content-Type: application/json" \
//!      -d '{"data": "aGVsbG8=", "filename": "hello.txt"}' \
//!      http://localhost:8080/ipfs.v1.IPFSService/UploadContent
//! ```

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tonic::{Code, Status};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::service::*;

pub use crate::grpc::{DEFAULT_MAX_MESSAGE_BYTES, SERVICE_NAME};

pub type SharedService = Arc<IpfsService>;

/// Build the router for `service`
pub fn create_router(service: SharedService, max_message_bytes: usize) -> Router {
    Router::new()
        .route(&rpc_path("UploadContent"), post(upload_content))
        .route(&rpc_path("UploadProto"), post(upload_proto))
        .route(&rpc_path("GetContent"), post(get_content))
        .route(&rpc_path("GetProto"), post(get_proto))
        .route(&rpc_path("PinContent"), post(pin_content))
        .route(&rpc_path("UnpinContent"), post(unpin_content))
        .route(&rpc_path("GetGatewayURL"), post(get_gateway_url))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_message_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Route path for an RPC method
pub fn rpc_path(method: &str) -> String {
    format!("/{}/{}", SERVICE_NAME, method)
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    "OK"
}

/// Error body returned for a failed RPC
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// RPC status rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub Status);

impl From<Status> for ApiError {
    fn from(status: Status) -> Self {
        Self(status)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self(Status::resource_exhausted(message))
        } else {
            Self(Status::invalid_argument(message))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let http_status = http_status(code);

        if http_status.is_server_error() {
            warn!(code = code_name(code), message = %self.0.message(), "RPC failed");
        }

        let body = ErrorBody {
            code: code_name(code),
            message: self.0.message().to_string(),
        };
        (http_status, Json(body)).into_response()
    }
}

/// HTTP status for an RPC status code
pub fn http_status(code: Code) -> StatusCode {
    match code {
        Code::Ok => StatusCode::OK,
        Code::InvalidArgument | Code::FailedPrecondition | Code::OutOfRange => {
            StatusCode::BAD_REQUEST
        }
        Code::NotFound => StatusCode::NOT_FOUND,
        Code::AlreadyExists | Code::Aborted => StatusCode::CONFLICT,
        Code::PermissionDenied => StatusCode::FORBIDDEN,
        Code::Unauthenticated => StatusCode::UNAUTHORIZED,
        Code::ResourceExhausted => StatusCode::PAYLOAD_TOO_LARGE,
        Code::Unimplemented => StatusCode::NOT_IMPLEMENTED,
        Code::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        Code::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// snake_case name of an RPC status code
pub fn code_name(code: Code) -> &'static str {
    match code {
        Code::Ok => "ok",
        Code::Cancelled => "cancelled",
        Code::Unknown => "unknown",
        Code::InvalidArgument => "invalid_argument",
        Code::DeadlineExceeded => "deadline_exceeded",
        Code::NotFound => "not_found",
        Code::AlreadyExists => "already_exists",
        Code::PermissionDenied => "permission_denied",
        Code::ResourceExhausted => "resource_exhausted",
        Code::FailedPrecondition => "failed_precondition",
        Code::Aborted => "aborted",
        Code::OutOfRange => "out_of_range",
        Code::Unimplemented => "unimplemented",
        Code::Internal => "internal",
        Code::Unavailable => "unavailable",
        Code::DataLoss => "data_loss",
        Code::Unauthenticated => "unauthenticated",
        #[allow(unreachable_patterns)]
        _ => "unknown",
    }
}

// === RPC handlers ===

async fn upload_content(
    State(service): State<SharedService>,
    payload: Result<Json<UploadContentRequest>, JsonRejection>,
) -> Result<Json<UploadContentResponse>, ApiError> {
    let Json(req) = payload?;
    Ok(Json(service.upload_content(req).await?))
}

async fn upload_proto(
    State(service): State<SharedService>,
    payload: Result<Json<UploadProtoRequest>, JsonRejection>,
) -> Result<Json<UploadProtoResponse>, ApiError> {
    let Json(req) = payload?;
    Ok(Json(service.upload_proto(req).await?))
}

async fn get_content(
    State(service): State<SharedService>,
    payload: Result<Json<GetContentRequest>, JsonRejection>,
) -> Result<Json<GetContentResponse>, ApiError> {
    let Json(req) = payload?;
    Ok(Json(service.get_content(req).await?))
}

async fn get_proto(
    State(service): State<SharedService>,
    payload: Result<Json<GetProtoRequest>, JsonRejection>,
) -> Result<Json<GetProtoResponse>, ApiError> {
    let Json(req) = payload?;
    Ok(Json(service.get_proto(req).await?))
}

async fn pin_content(
    State(service): State<SharedService>,
    payload: Result<Json<PinContentRequest>, JsonRejection>,
) -> Result<Json<PinContentResponse>, ApiError> {
    let Json(req) = payload?;
    Ok(Json(service.pin_content(req).await?))
}

async fn unpin_content(
    State(service): State<SharedService>,
    payload: Result<Json<UnpinContentRequest>, JsonRejection>,
) -> Result<Json<UnpinContentResponse>, ApiError> {
    let Json(req) = payload?;
    Ok(Json(service.unpin_content(req).await?))
}

async fn get_gateway_url(
    State(service): State<SharedService>,
    payload: Result<Json<GetGatewayUrlRequest>, JsonRejection>,
) -> Result<Json<GetGatewayUrlResponse>, ApiError> {
    let Json(req) = payload?;
    Ok(Json(service.get_gateway_url(req).await?))
}
