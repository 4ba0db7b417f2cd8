// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Error type for the search pipeline.
//!
//! User-input problems and overload are ordinary protocol outcomes, so
//! they travel as values and become status 10 / 44 responses at the
//! dispatcher. Only store failures are real errors worth logging.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// The request needs (different) user input; the payload is the
    /// status-10 prompt shown to the client.
    #[error("input needed: {0}")]
    Input(String),

    /// Too many searches in flight; shed load with status 44.
    #[error("too many concurrent searches")]
    Overloaded,

    /// The page store failed mid-request.
    #[error("page store failure: {0}")]
    Store(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, SearchError>;
