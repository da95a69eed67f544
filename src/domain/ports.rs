use crate::config::SessionSettings;
use crate::domain::errors::TransportError;
use crate::domain::fix::FixMessage;
use std::fmt;
use std::sync::Arc;

/// Identifies one FIX session between two counterparties
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId {
    pub begin_string: String,
    pub sender_comp_id: String,
    pub target_comp_id: String,
}

impl SessionId {
    pub fn new(
        begin_string: impl Into<String>,
        sender_comp_id: impl Into<String>,
        target_comp_id: impl Into<String>,
    ) -> Self {
        Self {
            begin_string: begin_string.into(),
            sender_comp_id: sender_comp_id.into(),
            target_comp_id: target_comp_id.into(),
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}->{}",
            self.begin_string, self.sender_comp_id, self.target_comp_id
        )
    }
}

/// Callbacks the transport engine invokes on its own thread, in order.
pub trait Application: Send + Sync {
    fn on_create(&self, session: &SessionId);
    fn on_logon(&self, session: &SessionId);
    fn on_logout(&self, session: &SessionId);
    /// Outbound admin message, may be modified before transmission
    fn to_admin(&self, message: &mut FixMessage, session: &SessionId);
    fn from_admin(&self, message: &FixMessage, session: &SessionId);
    /// Outbound application message, may be modified before transmission
    fn to_app(&self, message: &mut FixMessage, session: &SessionId);
    fn from_app(&self, message: &FixMessage, session: &SessionId);
}

/// Send-to-target primitive of the transport engine
pub trait SessionSender: Send + Sync {
    fn send_to_target(&self, message: FixMessage, session: &SessionId)
    -> Result<(), TransportError>;
}

/// Lifecycle of the connecting side of a session
pub trait Initiator: Send {
    fn start(&mut self) -> Result<(), TransportError>;
    fn stop(&mut self);
}

/// The external FIX engine. Owns message store, logs and sockets.
pub trait TransportEngine: Send + Sync {
    fn sender(&self) -> Arc<dyn SessionSender>;

    fn create_initiator(
        &self,
        application: Arc<dyn Application>,
        settings: &SessionSettings,
    ) -> Result<Box<dyn Initiator>, TransportError>;
}
