//! # RPC status rendering
//!
//! Every failure leaves the gateway as the same JSON envelope:
//!
//! ```json
//! {"code": 3, "error_desc": "InvalidArgument", "message": "unknown request"}
//! ```
//!
//! `code` is the numeric RPC code, `error_desc` its canonical name and `message` the
//! human-readable text carried by the status. The HTTP status of the response is chosen by
//! a [`StatusPolicy`].
use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tonic::{Code, Status};

/// How RPC codes are translated into HTTP statuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicy {
    /// `INTERNAL` becomes `500 Internal Server Error`, every other code `400 Bad Request`.
    #[default]
    Collapsed,
    /// The conventional one-to-one mapping used by gRPC/HTTP gateways.
    Conventional,
}

impl StatusPolicy {
    pub fn http_status(self, code: Code) -> StatusCode {
        match self {
            StatusPolicy::Collapsed => match code {
                Code::Internal => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
            StatusPolicy::Conventional => conventional_http_status(code),
        }
    }
}

fn conventional_http_status(code: Code) -> StatusCode {
    match code {
        Code::Ok => StatusCode::OK,
        // Client Closed Request, not part of the registered status codes.
        Code::Cancelled => StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST),
        Code::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        Code::InvalidArgument => StatusCode::BAD_REQUEST,
        Code::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        Code::NotFound => StatusCode::NOT_FOUND,
        Code::AlreadyExists => StatusCode::CONFLICT,
        Code::PermissionDenied => StatusCode::FORBIDDEN,
        Code::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
        Code::FailedPrecondition => StatusCode::BAD_REQUEST,
        Code::Aborted => StatusCode::CONFLICT,
        Code::OutOfRange => StatusCode::BAD_REQUEST,
        Code::Unimplemented => StatusCode::NOT_IMPLEMENTED,
        Code::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        Code::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        Code::DataLoss => StatusCode::INTERNAL_SERVER_ERROR,
        Code::Unauthenticated => StatusCode::UNAUTHORIZED,
        #[allow(unreachable_patterns)]
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The canonical name of an RPC code, as rendered in `error_desc`.
pub fn code_name(code: Code) -> &'static str {
    match code {
        Code::Ok => "OK",
        Code::Cancelled => "Canceled",
        Code::Unknown => "Unknown",
        Code::InvalidArgument => "InvalidArgument",
        Code::DeadlineExceeded => "DeadlineExceeded",
        Code::NotFound => "NotFound",
        Code::AlreadyExists => "AlreadyExists",
        Code::PermissionDenied => "PermissionDenied",
        Code::ResourceExhausted => "ResourceExhausted",
        Code::FailedPrecondition => "FailedPrecondition",
        Code::Aborted => "Aborted",
        Code::OutOfRange => "OutOfRange",
        Code::Unimplemented => "Unimplemented",
        Code::Internal => "Internal",
        Code::Unavailable => "Unavailable",
        Code::DataLoss => "DataLoss",
        Code::Unauthenticated => "Unauthenticated",
        #[allow(unreachable_patterns)]
        _ => "Unknown",
    }
}

/// The JSON error envelope. Field order is part of the wire format.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub code: i32,
    pub error_desc: &'static str,
    pub message: &'a str,
}

impl<'a> From<&'a Status> for ErrorBody<'a> {
    fn from(status: &'a Status) -> Self {
        Self {
            code: status.code() as i32,
            error_desc: code_name(status.code()),
            message: status.message(),
        }
    }
}

/// Renders `status` as an error envelope with the HTTP status chosen by `policy`.
pub fn render(policy: StatusPolicy, status: &Status) -> Response {
    let http_status = policy.http_status(status.code());
    (http_status, Json(ErrorBody::from(status))).into_response()
}
