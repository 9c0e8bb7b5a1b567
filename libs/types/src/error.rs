//! Domain error taxonomy (spec §7).
//!
//! `DomainError` covers only the "user-surfaced domain error" and
//! "command expired or invalid" categories — the ones that cross a
//! component boundary and need a stable code on the public REST/WS surface.
//! Transient-transport and malformed-frame failures are handled locally by
//! the component that owns them (adapters, pub/sub) and never constructed
//! as a `DomainError`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("unknown exchange: {0}")]
    UnknownExchange(String),

    #[error("command expired")]
    CommandExpired,

    #[error("command invalid: {0}")]
    CommandInvalid(String),

    #[error("not found")]
    NotFound,
}

/// The stable public error code a `DomainError` maps onto in the REST/WS
/// envelopes (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    BadRequest,
    NotFound,
    RateLimited,
    InternalError,
    Unauthorized,
    Forbidden,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
        }
    }
}

impl DomainError {
    /// Translate to the sanitised public error code. Never exposes internal
    /// detail beyond the `Display` message, which is itself free of stack
    /// traces or internal paths by construction.
    pub fn code(&self) -> ErrorCode {
        match self {
            DomainError::InvalidSymbol(_)
            | DomainError::InvalidTimeframe(_)
            | DomainError::CommandInvalid(_) => ErrorCode::BadRequest,
            DomainError::UnknownExchange(_) | DomainError::NotFound => ErrorCode::NotFound,
            DomainError::CommandExpired => ErrorCode::BadRequest,
        }
    }
}
