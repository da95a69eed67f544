use thiserror::Error;

/// Errors raised while building or reading FIX messages
#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("Missing tag {tag} in message")]
    MissingTag { tag: u32 },

    #[error("Invalid value for tag {tag}: '{value}'")]
    InvalidValue { tag: u32, value: String },

    #[error("Order type {order_type} has no FIX mapping")]
    UnsupportedOrderType { order_type: String },

    #[error("Malformed message: {reason}")]
    MalformedMessage { reason: String },
}

/// Errors related to session settings and gateway configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing session setting: {field}")]
    MissingField { field: String },

    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {reason}")]
    Parse { reason: String },
}

/// Errors reported by the transport engine behind the session ports
#[derive(Debug, Error, PartialEq)]
pub enum TransportError {
    #[error("No active session: not logged on")]
    NotLoggedOn,

    #[error("Session {session} is disconnected")]
    Disconnected { session: String },

    #[error("Transport engine error: {reason}")]
    Engine { reason: String },
}

/// Umbrella error for the gateway facade
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to spawn session thread: {0}")]
    Spawn(#[source] std::io::Error),
}
