// ABOUTME: Engine connection error types with SNAFU pattern.
// ABOUTME: Unifies detection and connection errors for programmatic handling.

use snafu::Snafu;

use super::detection::DetectionError;
use super::traits::EngineInfoError;

/// Failure to find or reach a container engine.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum EngineConnectError {
    #[snafu(display("engine detection failed: {source}"))]
    Detection { source: DetectionError },

    #[snafu(display("engine connection failed: {source}"))]
    Connection { source: EngineInfoError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineConnectErrorKind {
    /// No engine socket found on the system.
    NoEngineFound,
    /// A configured socket path does not exist.
    SocketMissing,
    /// Failed to connect to the engine socket.
    ConnectionFailed,
    /// The engine answered with an error.
    EngineOperation,
}

impl EngineConnectError {
    pub fn kind(&self) -> EngineConnectErrorKind {
        match self {
            EngineConnectError::Detection { source } => match source {
                DetectionError::NoEngineFound => EngineConnectErrorKind::NoEngineFound,
                DetectionError::SocketMissing(_) => EngineConnectErrorKind::SocketMissing,
            },
            EngineConnectError::Connection { source } => match source {
                EngineInfoError::ConnectionFailed(_) => EngineConnectErrorKind::ConnectionFailed,
                EngineInfoError::Engine(_) => EngineConnectErrorKind::EngineOperation,
            },
        }
    }
}

impl From<DetectionError> for EngineConnectError {
    fn from(source: DetectionError) -> Self {
        EngineConnectError::Detection { source }
    }
}

impl From<EngineInfoError> for EngineConnectError {
    fn from(source: EngineInfoError) -> Self {
        EngineConnectError::Connection { source }
    }
}
