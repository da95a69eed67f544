//! Client order id -> order, driven by execution reports.
//!
//! ```text
//! Submitted -> Accepted -> { Completed | Rejected | Canceled }
//! Submitted ----------------^ (fill, reject and cancel may skip Accepted)
//! ```
//!
//! Terminal states are sinks. Reports that do not match a transition are
//! logged and ignored without touching the ledger or the notification queue.

use super::lock_or_recover;
use crate::application::notifications::NotificationQueue;
use crate::domain::trading::order::{Execution, Order, OrderIdGenerator};
use crate::domain::trading::position::{Position, PositionLedger};
use crate::domain::trading::types::OrderStatus;
use crate::infrastructure::fix::codec::{ExecType, ExecutionReport};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// What applying an execution report did
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    Transitioned { order_id: String, status: OrderStatus },
    PositionUpdated { symbol: String, position: Position },
    UnknownOrder { order_id: String },
    Ignored,
}

/// What a cancel request should do for a given id
#[derive(Debug, Clone)]
pub enum CancelDecision {
    NotFound,
    AlreadyFinal(OrderStatus),
    Send(Order),
}

fn next_status(current: OrderStatus, exec_type: ExecType) -> Option<OrderStatus> {
    use OrderStatus::*;

    match (current, exec_type) {
        (Submitted, ExecType::PendingNew | ExecType::New) => Some(Accepted),
        (Submitted | Accepted, ExecType::Fill) => Some(Completed),
        (Submitted | Accepted, ExecType::Rejected) => Some(Rejected),
        (Submitted | Accepted, ExecType::Canceled) => Some(Canceled),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct OrderRegistry {
    orders: Mutex<HashMap<String, Order>>,
    ids: OrderIdGenerator,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        self.ids.next_id()
    }

    /// Take ownership of a new order, returning a snapshot of it
    pub fn register(&self, order: Order) -> Order {
        let snapshot = order.clone();
        lock_or_recover(&self.orders).insert(order.id.clone(), order);
        snapshot
    }

    pub fn get(&self, order_id: &str) -> Option<Order> {
        lock_or_recover(&self.orders).get(order_id).cloned()
    }

    pub fn len(&self) -> usize {
        lock_or_recover(&self.orders).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cancel_decision(&self, order_id: &str) -> CancelDecision {
        match lock_or_recover(&self.orders).get(order_id) {
            None => CancelDecision::NotFound,
            Some(order) if order.status.is_terminal() => CancelDecision::AlreadyFinal(order.status),
            Some(order) => CancelDecision::Send(order.clone()),
        }
    }

    /// Apply one execution report. Lock order: orders, then ledger.
    pub fn apply_report(
        &self,
        report: &ExecutionReport,
        ledger: &Mutex<PositionLedger>,
        notifications: &NotificationQueue,
    ) -> ReportOutcome {
        match report.exec_type {
            ExecType::PositionSnapshot => {
                let Some(trade) = report.trade.as_ref() else {
                    return ReportOutcome::Ignored;
                };
                let Some(position) =
                    lock_or_recover(ledger).apply_fill(&trade.symbol, trade.price, trade.size)
                else {
                    warn!(
                        "OrderRegistry: Dropping position snapshot {} {} @ {}: arithmetic overflow",
                        trade.symbol, trade.size, trade.price
                    );
                    return ReportOutcome::Ignored;
                };
                info!(
                    "OrderRegistry: Position snapshot {} {} @ {} -> {} @ {}",
                    trade.symbol, trade.size, trade.price, position.size, position.price
                );
                ReportOutcome::PositionUpdated {
                    symbol: trade.symbol.clone(),
                    position,
                }
            }
            ExecType::Other(c) => {
                debug!("OrderRegistry: Ignoring exec type '{}'", c);
                ReportOutcome::Ignored
            }
            exec_type => self.transition(report, exec_type, ledger, notifications),
        }
    }

    fn transition(
        &self,
        report: &ExecutionReport,
        exec_type: ExecType,
        ledger: &Mutex<PositionLedger>,
        notifications: &NotificationQueue,
    ) -> ReportOutcome {
        let Some(order_id) = report.cl_ord_id.as_deref() else {
            warn!("OrderRegistry: {:?} report without ClOrdID", exec_type);
            return ReportOutcome::Ignored;
        };

        let mut orders = lock_or_recover(&self.orders);
        let Some(order) = orders.get_mut(order_id) else {
            warn!("OrderRegistry: Dropping {:?} for unknown order {}", exec_type, order_id);
            return ReportOutcome::UnknownOrder {
                order_id: order_id.to_string(),
            };
        };

        let Some(status) = next_status(order.status, exec_type) else {
            warn!(
                "OrderRegistry: Ignoring {:?} for order {} in state {}",
                exec_type, order_id, order.status
            );
            return ReportOutcome::Ignored;
        };

        if exec_type == ExecType::Fill {
            let Some(trade) = report.trade.as_ref() else {
                warn!("OrderRegistry: Fill for {} carries no trade", order_id);
                return ReportOutcome::Ignored;
            };
            let mut ledger = lock_or_recover(ledger);
            let Some((position, execution)) = ledger
                .projected(&trade.symbol, trade.price, trade.size)
                .and_then(|p| {
                    Execution::fill(trade.size, trade.price, p.size, p.price).map(|e| (p, e))
                })
            else {
                warn!(
                    "OrderRegistry: Dropping fill for {}: {} x {} overflows",
                    order_id, trade.size, trade.price
                );
                return ReportOutcome::Ignored;
            };
            ledger.commit(&trade.symbol, position);
            order.execute(execution);
            info!(
                "OrderRegistry: Filled {} {} {} @ {} (position {} @ {})",
                order_id, trade.symbol, trade.size, trade.price, position.size, position.price
            );
        }

        info!("OrderRegistry: Order {} {} -> {}", order_id, order.status, status);
        order.status = status;
        notifications.push(order.clone());

        ReportOutcome::Transitioned {
            order_id: order_id.to_string(),
            status,
        }
    }
}
