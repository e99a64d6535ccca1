//! Venue error types.

use crate::signer::{KeyError, SignerError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VenueError {
    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Signing error: {0}")]
    Signing(#[from] SignerError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Exchange rejected action: {0}")]
    Rejected(String),

    #[error("Unexpected exchange response: {0}")]
    BadResponse(String),
}

pub type VenueResult<T> = Result<T, VenueError>;
