use super::{lock_or_recover, read_or_recover, write_or_recover};
use crate::application::notifications::NotificationQueue;
use crate::application::order_registry::{OrderRegistry, ReportOutcome};
use crate::domain::trading::account::{AccountSnapshot, AccountValue};
use crate::domain::trading::position::{Position, PositionLedger};
use crate::infrastructure::fix::codec::ExecutionReport;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

/// Broker-side state shared by the caller thread and the session thread.
///
/// Lock order when more than one is held: registry, then ledger. The account
/// snapshot is never held together with either.
#[derive(Debug, Default)]
pub struct BrokerState {
    pub registry: OrderRegistry,
    ledger: Mutex<PositionLedger>,
    account: RwLock<AccountSnapshot>,
    pub notifications: NotificationQueue,
}

impl BrokerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_report(&self, report: &ExecutionReport) -> ReportOutcome {
        self.registry
            .apply_report(report, &self.ledger, &self.notifications)
    }

    pub fn update_account(&self, fields: Vec<(String, AccountValue)>) {
        write_or_recover(&self.account).update(fields);
    }

    pub fn position(&self, symbol: &str) -> Position {
        lock_or_recover(&self.ledger).position(symbol)
    }

    pub fn positions(&self) -> HashMap<String, Position> {
        lock_or_recover(&self.ledger).positions()
    }

    pub fn account_snapshot(&self) -> AccountSnapshot {
        read_or_recover(&self.account).clone()
    }

    pub fn buying_power(&self) -> Decimal {
        read_or_recover(&self.account).buying_power()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trading::account::BUYING_POWER_FIELD;
    use rust_decimal_macros::dec;

    #[test]
    fn test_account_updates_drive_buying_power() {
        let state = BrokerState::new();
        assert_eq!(state.buying_power(), Decimal::ZERO);

        state.update_account(vec![(
            BUYING_POWER_FIELD.to_string(),
            AccountValue::Decimal(dec!(98765.43)),
        )]);
        assert_eq!(state.buying_power(), dec!(98765.43));
        assert_eq!(state.account_snapshot().len(), 1);
    }

    #[test]
    fn test_unknown_position_is_flat() {
        let state = BrokerState::new();
        assert!(state.position("NOPE").is_flat());
        assert!(state.positions().is_empty());
    }
}
