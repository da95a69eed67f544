//! Engine-facing facade over the FIX session.
//!
//! `FixGateway::start` returns immediately; the session itself runs on a
//! dedicated thread that owns the transport initiator until `stop`.

use crate::application::broker_state::BrokerState;
use crate::application::lock_or_recover;
use crate::application::order_registry::CancelDecision;
use crate::application::session::SessionAdapter;
use crate::config::SessionSettings;
use crate::domain::errors::GatewayError;
use crate::domain::ports::{Application, TransportEngine};
use crate::domain::trading::account::AccountSnapshot;
use crate::domain::trading::commission::{CommissionInfo, FixCommission};
use crate::domain::trading::order::{Order, OrderRequest};
use crate::domain::trading::position::Position;
use crate::infrastructure::fix::codec;
use crossbeam_channel::{Receiver, Sender, bounded};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const SESSION_THREAD_NAME: &str = "fix-session";

pub struct FixGateway {
    state: Arc<BrokerState>,
    adapter: Arc<SessionAdapter>,
    commission: Arc<dyn CommissionInfo>,
    // Dropping the sender wakes the session thread
    stop_tx: Mutex<Option<Sender<()>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl FixGateway {
    /// Validate settings, build the session adapter and spawn the session thread
    pub fn start(
        settings: SessionSettings,
        engine: Arc<dyn TransportEngine>,
    ) -> Result<Self, GatewayError> {
        settings.validate()?;

        let state = Arc::new(BrokerState::new());
        let adapter = Arc::new(SessionAdapter::new(
            &settings,
            engine.sender(),
            state.clone(),
        )?);

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let application: Arc<dyn Application> = adapter.clone();
        let handle = thread::Builder::new()
            .name(SESSION_THREAD_NAME.to_string())
            .spawn(move || run_session(engine, application, settings, stop_rx))
            .map_err(GatewayError::Spawn)?;

        info!("FixGateway: Session thread started");

        Ok(Self {
            state,
            adapter,
            commission: Arc::new(FixCommission),
            stop_tx: Mutex::new(Some(stop_tx)),
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Register and transmit a new order.
    ///
    /// Only an order type without a FIX mapping is an error; transmission
    /// failures are logged and the order stays Submitted.
    pub fn submit(&self, request: OrderRequest) -> Result<Order, GatewayError> {
        let order = Order::new(
            self.state.registry.next_id(),
            request,
            self.commission.clone(),
        );
        let message = codec::build_new_order(&order, self.adapter.fields())?;

        // Registered before sending: the venue may answer before send returns
        let snapshot = self.state.registry.register(order);
        self.state.notifications.push(snapshot.clone());

        info!(
            "FixGateway: Submitting {} {} {} {} @ {:?}",
            snapshot.id, snapshot.side, snapshot.size, snapshot.symbol, snapshot.price
        );
        if let Err(e) = self.adapter.send(message) {
            warn!("FixGateway: Failed to send order {}: {}", snapshot.id, e);
        }

        Ok(snapshot)
    }

    pub fn buy(&self, symbol: &str, size: Decimal) -> Result<Order, GatewayError> {
        self.submit(OrderRequest::buy(symbol, size))
    }

    pub fn sell(&self, symbol: &str, size: Decimal) -> Result<Order, GatewayError> {
        self.submit(OrderRequest::sell(symbol, size))
    }

    pub fn cancel(&self, order: &Order) {
        self.cancel_by_id(&order.id);
    }

    /// Request cancellation. The order changes state only on the venue's report.
    pub fn cancel_by_id(&self, order_id: &str) {
        match self.state.registry.cancel_decision(order_id) {
            CancelDecision::NotFound => {
                info!("FixGateway: Cancel for unknown order {}", order_id);
            }
            CancelDecision::AlreadyFinal(status) => {
                debug!("FixGateway: Order {} already {}, not canceling", order_id, status);
            }
            CancelDecision::Send(order) => {
                info!("FixGateway: Canceling order {}", order_id);
                let message = codec::build_cancel(&order, self.adapter.fields());
                if let Err(e) = self.adapter.send(message) {
                    warn!("FixGateway: Failed to send cancel for {}: {}", order_id, e);
                }
            }
        }
    }

    pub fn cash(&self) -> Decimal {
        self.state.buying_power()
    }

    pub fn value(&self) -> Decimal {
        self.state.buying_power()
    }

    pub fn position(&self, symbol: &str) -> Position {
        self.state.position(symbol)
    }

    pub fn positions(&self) -> HashMap<String, Position> {
        self.state.positions()
    }

    pub fn poll_notification(&self) -> Option<Order> {
        self.state.notifications.poll()
    }

    pub fn order(&self, order_id: &str) -> Option<Order> {
        self.state.registry.get(order_id)
    }

    pub fn account_snapshot(&self) -> AccountSnapshot {
        self.state.account_snapshot()
    }

    pub fn commission_info(&self) -> Arc<dyn CommissionInfo> {
        self.commission.clone()
    }

    pub fn is_logged_on(&self) -> bool {
        self.adapter.is_logged_on()
    }

    pub fn wait_for_logon(&self, timeout: Duration) -> bool {
        self.adapter.wait_for_logon(timeout)
    }

    /// Signal the session thread to stop. Safe to call more than once.
    pub fn stop(&self) {
        if lock_or_recover(&self.stop_tx).take().is_some() {
            info!("FixGateway: Stop requested");
        }
    }

    /// Wait for the session thread to finish
    pub fn join(&self) {
        let Some(handle) = lock_or_recover(&self.handle).take() else {
            return;
        };
        if handle.join().is_err() {
            error!("FixGateway: Session thread panicked");
        }
    }
}

impl Drop for FixGateway {
    fn drop(&mut self) {
        self.stop();
        self.join();
    }
}

fn run_session(
    engine: Arc<dyn TransportEngine>,
    application: Arc<dyn Application>,
    settings: SessionSettings,
    stop_rx: Receiver<()>,
) {
    let mut initiator = match engine.create_initiator(application, &settings) {
        Ok(initiator) => initiator,
        Err(e) => {
            error!("FixGateway: Failed to create initiator: {}", e);
            return;
        }
    };

    if let Err(e) = initiator.start() {
        error!("FixGateway: Failed to start initiator: {}", e);
        return;
    }

    // Returns once stop() drops the sender
    let _ = stop_rx.recv();

    initiator.stop();
    info!("FixGateway: Session thread stopped");
}
