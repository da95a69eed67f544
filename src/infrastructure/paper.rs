//! In-process counterparty implementing the transport ports.
//!
//! Plays the venue side of a session without sockets or sequence numbers:
//! logs on immediately, acknowledges and fills new orders, confirms cancels
//! and broadcasts account status. Messages can also be injected by hand.

use crate::config::{PaperVenueConfig, SessionSettings};
use crate::domain::errors::{CodecError, TransportError};
use crate::domain::fix::FixMessage;
use crate::domain::fix::tags::{self, exec_type, msg_type};
use crate::domain::ports::{Application, Initiator, SessionId, SessionSender, TransportEngine};
use crate::domain::trading::account::BUYING_POWER_FIELD;
use crossbeam_channel::{Sender, unbounded};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

const HEARTBEAT_INTERVAL_SECS: &str = "30";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct VenueShared {
    application: Mutex<Option<Arc<dyn Application>>>,
    session: Mutex<Option<SessionId>>,
    sent: Mutex<Vec<FixMessage>>,
    admin: Mutex<Vec<FixMessage>>,
    inbox: Mutex<Option<Sender<FixMessage>>>,
}

impl VenueShared {
    fn bound(&self) -> Result<(Arc<dyn Application>, SessionId), TransportError> {
        let session = lock(&self.session).clone().ok_or(TransportError::NotLoggedOn)?;
        let application = lock(&self.application)
            .clone()
            .ok_or_else(|| TransportError::Engine {
                reason: "no application bound".to_string(),
            })?;
        Ok((application, session))
    }
}

impl SessionSender for VenueShared {
    fn send_to_target(
        &self,
        mut message: FixMessage,
        session: &SessionId,
    ) -> Result<(), TransportError> {
        let (application, active) = self.bound()?;
        if &active != session {
            return Err(TransportError::Disconnected {
                session: session.to_string(),
            });
        }

        application.to_app(&mut message, session);
        lock(&self.sent).push(message.clone());

        if let Some(inbox) = lock(&self.inbox).as_ref() {
            // The venue thread only goes away during stop
            let _ = inbox.send(message);
        }
        Ok(())
    }
}

/// Simulated venue, shared between the gateway (as its transport engine)
/// and tests (to inspect traffic and inject messages).
pub struct PaperVenue {
    config: PaperVenueConfig,
    shared: Arc<VenueShared>,
}

impl PaperVenue {
    pub fn new(config: PaperVenueConfig) -> Self {
        Self {
            config,
            shared: Arc::new(VenueShared::default()),
        }
    }

    /// Deliver an application message to the gateway on the caller's thread
    pub fn inject_app(&self, message: FixMessage) -> Result<(), TransportError> {
        let (application, session) = self.shared.bound()?;
        application.from_app(&message, &session);
        Ok(())
    }

    /// Deliver an admin message to the gateway on the caller's thread
    pub fn inject_admin(&self, message: FixMessage) -> Result<(), TransportError> {
        let (application, session) = self.shared.bound()?;
        application.from_admin(&message, &session);
        Ok(())
    }

    /// Application messages received from the gateway, oldest first
    pub fn sent_messages(&self) -> Vec<FixMessage> {
        lock(&self.shared.sent).clone()
    }

    /// Admin messages sent by the gateway (Logon, Logout)
    pub fn admin_messages(&self) -> Vec<FixMessage> {
        lock(&self.shared.admin).clone()
    }

    pub fn is_logged_on(&self) -> bool {
        lock(&self.shared.session).is_some()
    }
}

impl TransportEngine for PaperVenue {
    fn sender(&self) -> Arc<dyn SessionSender> {
        self.shared.clone()
    }

    fn create_initiator(
        &self,
        application: Arc<dyn Application>,
        settings: &SessionSettings,
    ) -> Result<Box<dyn Initiator>, TransportError> {
        let session = settings
            .session_id()
            .map_err(|e| TransportError::Engine {
                reason: e.to_string(),
            })?;
        *lock(&self.shared.application) = Some(application.clone());

        Ok(Box::new(PaperInitiator {
            config: self.config.clone(),
            shared: self.shared.clone(),
            application,
            session,
            venue_thread: None,
        }))
    }
}

pub struct PaperInitiator {
    config: PaperVenueConfig,
    shared: Arc<VenueShared>,
    application: Arc<dyn Application>,
    session: SessionId,
    venue_thread: Option<JoinHandle<()>>,
}

impl PaperInitiator {
    fn admin_message(&self, kind: &str) -> FixMessage {
        let mut message = FixMessage::new(&self.session.begin_string, kind);
        let header = message.header_mut();
        header.set(tags::SENDER_COMP_ID, self.session.sender_comp_id.as_str());
        header.set(tags::TARGET_COMP_ID, self.session.target_comp_id.as_str());
        message
    }

    fn spawn_venue_thread(&mut self) -> Result<(), TransportError> {
        let (tx, rx) = unbounded::<FixMessage>();
        let application = self.application.clone();
        let session = self.session.clone();
        let fill_price = self.config.fill_price;

        let handle = thread::Builder::new()
            .name("paper-venue".to_string())
            .spawn(move || {
                for message in rx.iter() {
                    match respond(&message, fill_price) {
                        Ok(replies) => {
                            for reply in replies {
                                application.from_app(&reply, &session);
                            }
                        }
                        Err(e) => warn!("PaperVenue: Cannot answer {}: {}", message, e),
                    }
                }
                debug!("PaperVenue: Venue thread exiting");
            })
            .map_err(|e| TransportError::Engine {
                reason: e.to_string(),
            })?;

        *lock(&self.shared.inbox) = Some(tx);
        self.venue_thread = Some(handle);
        Ok(())
    }
}

impl Initiator for PaperInitiator {
    fn start(&mut self) -> Result<(), TransportError> {
        self.application.on_create(&self.session);

        let mut logon = self.admin_message(msg_type::LOGON);
        logon.set_field(tags::ENCRYPT_METHOD, "0");
        logon.set_field(tags::HEARTBT_INT, HEARTBEAT_INTERVAL_SECS);
        self.application.to_admin(&mut logon, &self.session);
        lock(&self.shared.admin).push(logon);

        if self.config.auto_respond {
            self.spawn_venue_thread()?;
        }

        *lock(&self.shared.session) = Some(self.session.clone());
        self.application.on_logon(&self.session);
        info!("PaperVenue: Logged on {}", self.session);

        if let Some(buying_power) = self.config.buying_power {
            let news = account_status_news(&[(BUYING_POWER_FIELD, buying_power.to_string())]);
            self.application.from_app(&news, &self.session);
        }

        Ok(())
    }

    fn stop(&mut self) {
        // Closing the inbox ends the venue thread once pending replies are out
        lock(&self.shared.inbox).take();
        if let Some(handle) = self.venue_thread.take() {
            if handle.join().is_err() {
                warn!("PaperVenue: Venue thread panicked");
            }
        }

        let mut logout = self.admin_message(msg_type::LOGOUT);
        self.application.to_admin(&mut logout, &self.session);
        lock(&self.shared.admin).push(logout);

        lock(&self.shared.session).take();
        self.application.on_logout(&self.session);
        info!("PaperVenue: Logged out {}", self.session);
    }
}

/// Venue answers to one inbound application message
fn respond(message: &FixMessage, fallback_price: Decimal) -> Result<Vec<FixMessage>, CodecError> {
    match message.msg_type()? {
        msg_type::NEW_ORDER_SINGLE => {
            let order_id = message.get_field(tags::CL_ORD_ID)?;
            let symbol = message.get_field(tags::SYMBOL)?;
            let side = message.get_char(tags::SIDE)?;
            let quantity: Decimal = message.get(tags::ORDER_QTY)?;
            let price = if message.is_set(tags::PRICE) {
                message.get(tags::PRICE)?
            } else {
                fallback_price
            };

            Ok(vec![
                status_report(exec_type::PENDING_NEW, order_id, symbol, side),
                fill_report(order_id, symbol, side, price, quantity),
            ])
        }
        msg_type::ORDER_CANCEL_REQUEST => {
            let order_id = message.get_field(tags::ORIG_CL_ORD_ID)?;
            let symbol = message.get_field(tags::SYMBOL)?;
            let side = message.get_char(tags::SIDE)?;
            let mut report = status_report(exec_type::CANCELED, order_id, symbol, side);
            report.set_field(tags::ORIG_CL_ORD_ID, order_id);
            Ok(vec![report])
        }
        other => {
            debug!("PaperVenue: No answer for message type {}", other);
            Ok(Vec::new())
        }
    }
}

fn execution_report(kind: char, order_id: &str, symbol: &str, side: char) -> FixMessage {
    let mut report = FixMessage::new(tags::BEGIN_STRING_FIX42, msg_type::EXECUTION_REPORT);
    report.set_field(tags::ORDER_ID, order_id);
    report.set_field(tags::CL_ORD_ID, order_id);
    report.set_field(tags::EXEC_ID, Uuid::new_v4().to_string());
    report.set_field(tags::EXEC_TYPE, kind.to_string());
    report.set_field(tags::ORD_STATUS, kind.to_string());
    report.set_field(tags::SYMBOL, symbol);
    report.set_field(tags::SIDE, side.to_string());
    report
}

/// ExecutionReport carrying only a status change (ack, reject, cancel)
pub fn status_report(kind: char, order_id: &str, symbol: &str, side: char) -> FixMessage {
    let mut report = execution_report(kind, order_id, symbol, side);
    report.set_field(tags::LEAVES_QTY, "0");
    report
}

/// ExecutionReport for a complete fill of `quantity` at `price`
pub fn fill_report(
    order_id: &str,
    symbol: &str,
    side: char,
    price: Decimal,
    quantity: Decimal,
) -> FixMessage {
    let mut report = execution_report(exec_type::FILL, order_id, symbol, side);
    let price = price.normalize().to_string();
    let quantity = quantity.normalize().to_string();
    report.set_field(tags::PRICE, price.as_str());
    report.set_field(tags::ORDER_QTY, quantity.as_str());
    report.set_field(tags::LAST_PX, price.as_str());
    report.set_field(tags::LAST_QTY, quantity.as_str());
    report.set_field(tags::CUM_QTY, quantity.as_str());
    report.set_field(tags::AVG_PX, price);
    report.set_field(tags::LEAVES_QTY, "0");
    report
}

/// ExecutionReport with the venue's position snapshot for a symbol
pub fn position_report(symbol: &str, side: char, price: Decimal, quantity: Decimal) -> FixMessage {
    let mut report = FixMessage::new(tags::BEGIN_STRING_FIX42, msg_type::EXECUTION_REPORT);
    report.set_field(tags::EXEC_ID, Uuid::new_v4().to_string());
    report.set_field(tags::EXEC_TYPE, exec_type::POSITION.to_string());
    report.set_field(tags::SYMBOL, symbol);
    report.set_field(tags::SIDE, side.to_string());
    report.set_field(tags::PRICE, price.normalize().to_string());
    report.set_field(tags::CUM_QTY, quantity.normalize().to_string());
    report
}

/// News message announcing account fields as 10008/58 pairs
pub fn account_status_news<V: AsRef<str>>(fields: &[(&str, V)]) -> FixMessage {
    let mut news = FixMessage::new(tags::BEGIN_STRING_FIX42, msg_type::NEWS);
    news.set_field(tags::HEADLINE, "Account status");
    news.set_field(tags::LINES_OF_TEXT, fields.len().to_string());
    for (name, value) in fields {
        news.body_mut().push(tags::ACCOUNT_FIELD_NAME, *name);
        let value: &str = value.as_ref();
        news.body_mut().push(tags::TEXT, value);
    }
    news
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_respond_to_new_order() {
        let mut order = FixMessage::new("FIX.4.2", msg_type::NEW_ORDER_SINGLE);
        order.set_field(tags::CL_ORD_ID, "ID1");
        order.set_field(tags::SYMBOL, "X");
        order.set_field(tags::SIDE, "2");
        order.set_field(tags::ORDER_QTY, "25");

        let replies = respond(&order, dec!(99)).unwrap();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].get_field(tags::EXEC_TYPE).unwrap(), "A");
        assert_eq!(replies[1].get_field(tags::EXEC_TYPE).unwrap(), "2");
        assert_eq!(replies[1].get_field(tags::PRICE).unwrap(), "99");
        assert_eq!(replies[1].get_field(tags::ORDER_QTY).unwrap(), "25");
        assert_eq!(replies[1].get_field(tags::SIDE).unwrap(), "2");

        order.set_field(tags::PRICE, "10.5");
        let replies = respond(&order, dec!(99)).unwrap();
        assert_eq!(replies[1].get_field(tags::PRICE).unwrap(), "10.5");
    }

    #[test]
    fn test_respond_to_cancel() {
        let mut cancel = FixMessage::new("FIX.4.2", msg_type::ORDER_CANCEL_REQUEST);
        cancel.set_field(tags::ORIG_CL_ORD_ID, "ID1");
        cancel.set_field(tags::SYMBOL, "X");
        cancel.set_field(tags::SIDE, "1");

        let replies = respond(&cancel, dec!(1)).unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].get_field(tags::EXEC_TYPE).unwrap(), "4");
        assert_eq!(replies[0].get_field(tags::CL_ORD_ID).unwrap(), "ID1");
    }

    #[test]
    fn test_respond_ignores_other_messages() {
        let news = account_status_news(&[("A", "1")]);
        assert!(respond(&news, dec!(1)).unwrap().is_empty());

        let broken = FixMessage::new("FIX.4.2", msg_type::NEW_ORDER_SINGLE);
        assert!(respond(&broken, dec!(1)).is_err());
    }

    #[test]
    fn test_account_status_news_layout() {
        let news = account_status_news(&[(BUYING_POWER_FIELD, "1000"), ("Status", "OPEN")]);
        let pairs: Vec<(u32, &str)> = news
            .body()
            .iter()
            .filter(|(tag, _)| *tag == tags::ACCOUNT_FIELD_NAME || *tag == tags::TEXT)
            .collect();

        assert_eq!(
            pairs,
            vec![
                (10008, BUYING_POWER_FIELD),
                (58, "1000"),
                (10008, "Status"),
                (58, "OPEN"),
            ]
        );
    }

    #[test]
    fn test_send_before_logon_fails() {
        let venue = PaperVenue::new(PaperVenueConfig::manual());
        let session = SessionId::new("FIX.4.2", "A", "B");
        let message = FixMessage::new("FIX.4.2", msg_type::NEW_ORDER_SINGLE);

        assert_eq!(
            venue.sender().send_to_target(message, &session),
            Err(TransportError::NotLoggedOn)
        );
        assert!(venue.inject_app(account_status_news(&[("A", "1")])).is_err());
    }
}
