//! # Federation Errors
//!
//! This module defines errors returned by the federation entity's management
//! and statement-serving operations. Error bodies follow the `OpenID`
//! convention of a JSON object with `error` and `error_description` members.

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Errors surfaced by federation entity operations.
///
/// Chain resolution failures are not represented here: the resolver folds
/// fetch, verification, and structural failures into its result value so
/// callers always receive a complete audit trail.
#[derive(Error, Debug, Deserialize)]
pub enum Error {
    /// The request is missing a required parameter, includes an unsupported
    /// parameter value, or is otherwise malformed. Also returned when an
    /// inbound Trust Mark names a subject other than this entity.
    #[error(r#"{{"error": "invalid_request", "error_description": "{0}"}}"#)]
    InvalidRequest(String),

    /// The named subordinate or Trust Mark is not known to this entity.
    #[error(r#"{{"error": "not_found", "error_description": "{0}"}}"#)]
    NotFound(String),

    /// The entity encountered an unexpected condition that prevented it from
    /// fulfilling the request, e.g. a signing failure.
    #[error(r#"{{"error": "server_error", "error_description": "{0}"}}"#)]
    ServerError(String),
}

impl Error {
    /// The HTTP status code conventionally associated with the error.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::ServerError(_) => 500,
        }
    }

    /// Transform the error to a JSON object in the `OpenID` error format.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.to_string()).unwrap_or_default()
    }
}

/// Error response body for federation endpoints.
#[derive(Deserialize, Serialize)]
struct ErrorBody {
    error: String,
    error_description: String,
}

impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error as SerdeError;

        let Ok(body) = serde_json::from_str::<ErrorBody>(&self.to_string()) else {
            return Err(SerdeError::custom("issue deserializing Err"));
        };
        body.serialize(serializer)
    }
}

/// Construct an `Error::InvalidRequest` error from a string or format
/// expression.
#[macro_export]
macro_rules! invalid {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::InvalidRequest(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::InvalidRequest(format!($err))
    };
}

/// Construct an `Error::NotFound` error from a string or format expression.
#[macro_export]
macro_rules! not_found {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::NotFound(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::NotFound(format!($err))
    };
}

/// Construct an `Error::ServerError` error from a string or format
/// expression.
#[macro_export]
macro_rules! server {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::ServerError(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::ServerError(format!($err))
    };
}
