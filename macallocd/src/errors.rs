// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

use std::convert;

pub type McdResult<T> = Result<T, McdError>;

#[derive(Debug, thiserror::Error)]
pub enum McdError {
    /// The request came from an operation phase we don't serve.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    /// MAC allocation doesn't apply to this kind of interface.
    #[error("no MAC allocation for {0} interfaces")]
    UnsupportedType(String),
    /// The change object lacks an attribute the allocation needs.
    #[error("missing attribute: {0}")]
    MissingAttr(&'static str),
    #[error("Invalid argument: {0}")]
    Invalid(String),
    /// The referenced front-panel port isn't in the cache.
    #[error("unknown front-panel port: {0}")]
    PortNotFound(u32),
    /// A MAC address could not be derived for a valid request.
    #[error("MAC allocation failed: {0}")]
    AllocFailed(String),
    /// An error talking to the platform service.
    #[error("platform service error: {0}")]
    Platform(String),
    #[error("I/O error: {0:?}")]
    Io(std::io::Error),
    #[error("error: {0}")]
    Other(String),
}

impl convert::From<std::io::Error> for McdError {
    fn from(err: std::io::Error) -> Self {
        McdError::Io(err)
    }
}

impl convert::From<reqwest::Error> for McdError {
    fn from(err: reqwest::Error) -> Self {
        McdError::Platform(err.to_string())
    }
}

impl convert::From<McdError> for dropshot::HttpError {
    fn from(o: McdError) -> dropshot::HttpError {
        match o {
            McdError::UnsupportedOperation(_)
            | McdError::UnsupportedType(_)
            | McdError::MissingAttr(_)
            | McdError::Invalid(_) => {
                dropshot::HttpError::for_bad_request(None, o.to_string())
            }
            McdError::PortNotFound(_) => dropshot::HttpError::for_status(
                Some(o.to_string()),
                http::StatusCode::NOT_FOUND,
            ),
            McdError::AllocFailed(_)
            | McdError::Platform(_)
            | McdError::Io(_)
            | McdError::Other(_) => {
                dropshot::HttpError::for_internal_error(o.to_string())
            }
        }
    }
}

impl convert::From<String> for McdError {
    fn from(err: String) -> Self {
        McdError::Other(err)
    }
}

impl convert::From<&str> for McdError {
    fn from(err: &str) -> Self {
        McdError::Other(err.to_string())
    }
}

impl convert::From<anyhow::Error> for McdError {
    fn from(err: anyhow::Error) -> Self {
        McdError::Other(err.to_string())
    }
}
