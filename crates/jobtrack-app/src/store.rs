// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

// Failure classes the remote store surfaces to callers. Every variant is
// recoverable by retrying the triggering action; none leaves partial state
// behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("authentication required -- log in and retry")]
    AuthenticationRequired,

    #[error("validation error: {0}")]
    ValidationFailed(String),

    #[error("network error -- check your connection and retry ({0})")]
    NetworkUnavailable(String),

    #[error("server returned {0}")]
    ServerFault(u16),
}

impl StoreError {
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkUnavailable(_) | Self::ServerFault(_))
    }
}
