//! Errors raised by the post store and the request handlers.

use std::error::Error;
use std::fmt;

use iron::status::{self, Status};

pub type Result<T> = ::std::result::Result<T, PostError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostError {
    /// The request body is not a JSON object.
    MalformedInput,
    /// Required fields were absent on create. Holds every missing field name.
    Validation(Vec<&'static str>),
    /// No post carries this id.
    NotFound(u64),
    /// A response could not be encoded.
    Internal(String),
}

impl PostError {
    pub fn status(&self) -> Status {
        match *self {
            PostError::MalformedInput | PostError::Validation(_) => status::BadRequest,
            PostError::NotFound(_) => status::NotFound,
            PostError::Internal(_) => status::InternalServerError,
        }
    }
}

impl fmt::Display for PostError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PostError::MalformedInput => write!(f, "Invalid or malformed JSON provided."),
            PostError::Validation(ref fields) => write!(f, "Missing field(s): {}", fields.join(", ")),
            PostError::NotFound(id) => write!(f, "Post with id {} is not found", id),
            PostError::Internal(ref msg) => write!(f, "{}", msg),
        }
    }
}

impl Error for PostError {}

impl From<::serde_json::Error> for PostError {
    fn from(err: ::serde_json::Error) -> PostError {
        PostError::Internal(err.to_string())
    }
}
