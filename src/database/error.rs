use std::convert::Infallible;
use std::fmt::{self, Display};

use serde::Serialize;
use warp::http::StatusCode;
use warp::reject::Rejection;

/// Error payload returned to clients. Every fallible action resolves into
/// one of these before it crosses the handler boundary.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: u16,
    pub info: Option<String>,
}

impl Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.info {
            Some(info) => write!(f, "{} ({})", self.code, info),
            None => write!(f, "{}", self.code),
        }
    }
}

impl std::error::Error for ApiError {}
impl warp::reject::Reject for ApiError {}

// `From<ApiError> for Rejection` is provided by warp's blanket
// `impl<T: Reject> From<T> for Rejection` since ApiError: Reject above.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    InvalidRequest,
    Unauthorized,
    InvalidSession,
    NotFound,
    InternalServerError,
}

impl HttpError {
    pub fn new(self, info: &str) -> ApiError {
        ApiError {
            code: self.code(),
            info: Some(info.to_string()),
        }
    }

    pub fn default(self) -> ApiError {
        ApiError {
            code: self.code(),
            info: None,
        }
    }

    fn code(self) -> u16 {
        match self {
            HttpError::InvalidRequest => 400,
            HttpError::Unauthorized => 403,
            HttpError::InvalidSession => 401,
            HttpError::NotFound => 404,
            HttpError::InternalServerError => 500,
        }
    }
}

pub struct QueryError {
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Database(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(format!("{e}")),
            sqlx::Error::RowNotFound => Self::new(format!("RowNotFound")),
            sqlx::Error::TypeNotFound { type_name } => {
                Self::new(format!("Type not found: {type_name}"))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                Self::new(format!("Column index out of bounds {index} ({len})"))
            }
            sqlx::Error::ColumnNotFound(e) => Self::new(format!("{e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::AnyDriverError(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(format!("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(format!("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(format!("Worker crashed")),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            _ => Self::new(format!("Unknown error")),
        }
    }
}

impl Into<ApiError> for QueryError {
    fn into(self) -> ApiError {
        ApiError {
            code: 500,
            info: Some(self.info),
        }
    }
}

#[derive(Debug)]
pub struct TypeError {
    info: String,
}

impl TypeError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

impl Into<ApiError> for TypeError {
    fn into(self) -> ApiError {
        HttpError::InvalidRequest.new(&self.info)
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.info)
    }
}

impl std::error::Error for TypeError {}
impl Into<Rejection> for TypeError {
    fn into(self) -> Rejection {
        warp::reject::custom(HttpError::InvalidRequest.new(&self.info))
    }
}

/// Rejection recovery shared by every route. Turns internal rejections into
/// the same JSON body shape the actions produce.
pub async fn handle_rejection(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let error = if err.is_not_found() {
        HttpError::NotFound.default()
    } else if let Some(e) = err.find::<ApiError>() {
        e.clone()
    } else if err.find::<warp::body::BodyDeserializeError>().is_some() {
        HttpError::InvalidRequest.new("Malformed payload")
    } else if err.find::<warp::reject::MissingCookie>().is_some() {
        HttpError::InvalidSession.new("Invalid session; Not logged in")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        ApiError {
            code: 405,
            info: None,
        }
    } else {
        log::error!("Unhandled rejection: {:?}", err);
        HttpError::InternalServerError.default()
    };

    let status = StatusCode::from_u16(error.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok(warp::reply::with_status(warp::reply::json(&error), status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_codes() {
        assert_eq!(HttpError::InvalidRequest.default().code, 400);
        assert_eq!(HttpError::InvalidSession.default().code, 401);
        assert_eq!(HttpError::Unauthorized.default().code, 403);
        assert_eq!(HttpError::NotFound.default().code, 404);
        assert_eq!(HttpError::InternalServerError.default().code, 500);
    }

    #[test]
    fn query_error_resolves_to_500() {
        let error: ApiError = QueryError::from(sqlx::Error::PoolTimedOut).into();
        assert_eq!(error.code, 500);
        assert_eq!(error.info.as_deref(), Some("Pool timed out"));
    }

    #[test]
    fn type_error_resolves_to_400() {
        let error: ApiError = TypeError::new("Invalid variant").into();
        assert_eq!(error.code, 400);
    }
}
