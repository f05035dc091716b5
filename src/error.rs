use std::fmt;

use dnsstub_proto::buffer::{ReaderError, WriterError};

/// Errors surfaced to callers (spec section 7). `ServerFailure` never
/// reaches this type: a non-`NoError` response code is absorbed by the
/// query engine, which moves on to the next configured server.
#[derive(Debug)]
pub enum ResolveError {
    /// Caller passed an invalid family or an over-length name. Raised
    /// synchronously, before any network activity.
    Argument(String),
    /// The linked timeout fired during a suspension point.
    Timeout,
    /// The caller's token or the resolver's cancellation gate fired.
    Cancelled,
    /// Malformed name, header mismatch, truncated TCP body, or a question
    /// mismatch. Not retried across servers.
    Protocol(String),
    /// Socket failure.
    Io(std::io::Error),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Timeout => write!(f, "operation timed out"),
            Self::Cancelled => write!(f, "operation cancelled"),
            Self::Protocol(msg) => write!(f, "protocol error: {msg}"),
            Self::Io(err) => write!(f, "i/o error: {err}"),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ResolveError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ReaderError> for ResolveError {
    fn from(value: ReaderError) -> Self {
        Self::Protocol(value.to_string())
    }
}

impl From<WriterError> for ResolveError {
    fn from(value: WriterError) -> Self {
        Self::Protocol(value.to_string())
    }
}

/// Errors from the platform options-discovery collaborator (spec section 6).
/// Not part of the core's error surface: callers on platforms where this
/// convenience implementation doesn't apply build `ResolverOptions` by hand.
#[derive(Debug)]
pub enum PlatformError {
    NoServersConfigured,
    Unsupported,
    Io(std::io::Error),
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoServersConfigured => write!(f, "no nameserver lines found"),
            Self::Unsupported => write!(f, "platform discovery is not implemented on this target"),
            Self::Io(err) => write!(f, "i/o error reading platform configuration: {err}"),
        }
    }
}

impl std::error::Error for PlatformError {}

impl From<std::io::Error> for PlatformError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
