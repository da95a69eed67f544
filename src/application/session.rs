use crate::application::broker_state::BrokerState;
use crate::application::lock_or_recover;
use crate::config::{SessionFields, SessionSettings};
use crate::domain::errors::{ConfigError, TransportError};
use crate::domain::fix::FixMessage;
use crate::domain::fix::tags::{self, msg_type};
use crate::domain::ports::{Application, SessionId, SessionSender};
use crate::infrastructure::fix::codec::{self, ExecutionReport};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// FIX application callbacks for the broker gateway.
///
/// Tracks the active session, stamps session-scoped header fields on
/// outbound admin messages and routes inbound application messages into the
/// shared [`BrokerState`].
pub struct SessionAdapter {
    fields: SessionFields,
    sender: Arc<dyn SessionSender>,
    state: Arc<BrokerState>,
    active: Mutex<Option<SessionId>>,
    logon: Condvar,
}

impl SessionAdapter {
    pub fn new(
        settings: &SessionSettings,
        sender: Arc<dyn SessionSender>,
        state: Arc<BrokerState>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            fields: settings.session_fields()?,
            sender,
            state,
            active: Mutex::new(None),
            logon: Condvar::new(),
        })
    }

    pub fn fields(&self) -> &SessionFields {
        &self.fields
    }

    pub fn active_session(&self) -> Option<SessionId> {
        lock_or_recover(&self.active).clone()
    }

    pub fn is_logged_on(&self) -> bool {
        lock_or_recover(&self.active).is_some()
    }

    /// Block until a session is logged on or the timeout elapses
    pub fn wait_for_logon(&self, timeout: Duration) -> bool {
        let guard = lock_or_recover(&self.active);
        match self
            .logon
            .wait_timeout_while(guard, timeout, |active| active.is_none())
        {
            Ok((guard, _)) => guard.is_some(),
            Err(poisoned) => poisoned.into_inner().0.is_some(),
        }
    }

    /// Send an application message on the active session
    pub fn send(&self, message: FixMessage) -> Result<(), TransportError> {
        let Some(session) = self.active_session() else {
            return Err(TransportError::NotLoggedOn);
        };
        debug!("SessionAdapter: -> {} {}", session, message);
        self.sender.send_to_target(message, &session)
    }

    fn on_news(&self, message: &FixMessage) {
        let fields = codec::parse_account_status(&message.to_wire());
        info!("SessionAdapter: Account status {:?}", fields);
        self.state.update_account(fields);
    }

    fn on_execution_report(&self, message: &FixMessage, session: &SessionId) {
        debug!("SessionAdapter: Execution report {} {}", session, message);
        match ExecutionReport::parse(message) {
            Ok(report) => {
                self.state.apply_report(&report);
            }
            Err(e) => error!("SessionAdapter: Dropping execution report: {}", e),
        }
    }
}

impl Application for SessionAdapter {
    fn on_create(&self, session: &SessionId) {
        info!("SessionAdapter: Session created {}", session);
    }

    fn on_logon(&self, session: &SessionId) {
        info!("SessionAdapter: Logon {}", session);
        *lock_or_recover(&self.active) = Some(session.clone());
        self.logon.notify_all();
    }

    fn on_logout(&self, session: &SessionId) {
        info!("SessionAdapter: Logout {}", session);
        let mut active = lock_or_recover(&self.active);
        if active.as_ref() == Some(session) {
            *active = None;
        }
    }

    fn to_admin(&self, message: &mut FixMessage, session: &SessionId) {
        if message.is_msg_type(msg_type::LOGON) {
            message
                .header_mut()
                .set(tags::TARGET_SUB_ID, self.fields.target_sub_id.as_str());
            debug!("SessionAdapter: Logon request {} {}", session, message);
        } else if message.is_msg_type(msg_type::HEARTBEAT) {
            debug!("SessionAdapter: Heartbeat reply");
        } else {
            debug!("SessionAdapter: toAdmin {} {}", session, message);
        }
    }

    fn from_admin(&self, message: &FixMessage, session: &SessionId) {
        if !message.is_msg_type(msg_type::HEARTBEAT) {
            debug!("SessionAdapter: fromAdmin {} {}", session, message);
        }
    }

    fn to_app(&self, message: &mut FixMessage, session: &SessionId) {
        debug!("SessionAdapter: toApp {} {}", session, message);
    }

    fn from_app(&self, message: &FixMessage, session: &SessionId) {
        match message.msg_type() {
            Ok(msg_type::NEWS) => self.on_news(message),
            Ok(msg_type::EXECUTION_REPORT) => self.on_execution_report(message, session),
            Ok(other) => warn!("SessionAdapter: Unhandled message type {} {}", other, message),
            Err(e) => error!("SessionAdapter: {}", e),
        }
    }
}
