//! Unified error type for the Parlor server.

use parlor_engine::EngineError;
use parlor_protocol::ProtocolError;
use parlor_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attributes auto-generate `From` impls, so `?` converts
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ParlorError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid frame).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An engine-level error (not found, rejected move, conflict).
    #[error(transparent)]
    Engine(#[from] EngineError),
}
