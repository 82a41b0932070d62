//! Error types for Horizon Bridge.

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur while talking to the native toolkit.
///
/// Only two kinds originate in this crate: malformed delegation declarations
/// ([`BridgeError::InvalidArgument`]) and codec conversion failures. Everything
/// else is reported by the native surface and passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// The native layer rejected a command.
    #[error("{command}: {message}")]
    Native {
        /// The command (usually a widget path) that was invoked.
        command: String,
        /// The error message produced by the native layer.
        message: String,
    },

    /// A declaration was malformed (programmer error).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A wire value could not be converted by a codec.
    #[error("{codec} codec cannot convert {input:?}: {message}")]
    Conversion {
        /// The name of the codec that failed.
        codec: String,
        /// The offending input.
        input: String,
        /// Why the conversion failed.
        message: String,
    },

    /// A callable had to be registered but no callback surface is attached.
    #[error("no callback surface is attached to this bridge")]
    NoCallbackSurface,

    /// A callback token was invoked that was never registered.
    #[error("unknown callback token {0:?}")]
    UnknownCallback(String),
}

impl BridgeError {
    /// Create a native-layer error.
    pub fn native(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Native {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a conversion error.
    pub fn conversion(
        codec: impl Into<String>,
        input: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Conversion {
            codec: codec.into(),
            input: input.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from the native layer.
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native { .. })
    }
}
