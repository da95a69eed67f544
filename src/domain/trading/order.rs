use crate::domain::trading::commission::CommissionInfo;
use crate::domain::trading::types::{OrderSide, OrderStatus, OrderType};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Client order id format: UTC time with microsecond resolution
const ORDER_ID_FORMAT: &str = "%Y-%m-%d_%H:%M:%S_%6f";

/// Everything the trading engine may specify for a new order.
///
/// Only side, symbol and size are required; the rest default to "not set".
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub side: OrderSide,
    pub symbol: String,
    pub size: Decimal,
    pub price: Option<Decimal>,
    pub price_limit: Option<Decimal>,
    pub order_type: Option<OrderType>,
    pub valid_until: Option<DateTime<Utc>>,
    pub trade_id: u64,
    pub owner: Option<String>,
}

impl OrderRequest {
    pub fn new(side: OrderSide, symbol: impl Into<String>, size: Decimal) -> Self {
        Self {
            side,
            symbol: symbol.into(),
            size,
            price: None,
            price_limit: None,
            order_type: None,
            valid_until: None,
            trade_id: 0,
            owner: None,
        }
    }

    pub fn buy(symbol: impl Into<String>, size: Decimal) -> Self {
        Self::new(OrderSide::Buy, symbol, size)
    }

    pub fn sell(symbol: impl Into<String>, size: Decimal) -> Self {
        Self::new(OrderSide::Sell, symbol, size)
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_price_limit(mut self, price_limit: Decimal) -> Self {
        self.price_limit = Some(price_limit);
        self
    }

    pub fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = Some(order_type);
        self
    }

    pub fn with_valid_until(mut self, valid_until: DateTime<Utc>) -> Self {
        self.valid_until = Some(valid_until);
        self
    }

    pub fn with_trade_id(mut self, trade_id: u64) -> Self {
        self.trade_id = trade_id;
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

/// Execution detail recorded on an order when a fill is applied.
///
/// Commission, margin and P&L are not tracked by this gateway and stay zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Execution {
    pub size: Decimal,
    pub price: Decimal,
    pub closed: Decimal,
    pub closed_value: Decimal,
    pub closed_commission: Decimal,
    pub opened: Decimal,
    pub opened_value: Decimal,
    pub opened_commission: Decimal,
    pub margin: Decimal,
    pub pnl: Decimal,
    pub position_size: Decimal,
    pub position_price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Execution {
    /// None when the fill value overflows
    pub fn fill(
        size: Decimal,
        price: Decimal,
        position_size: Decimal,
        position_price: Decimal,
    ) -> Option<Self> {
        let closed_value = size.checked_mul(price)?;
        Some(Self {
            size,
            price,
            closed: Decimal::ZERO,
            closed_value,
            closed_commission: Decimal::ZERO,
            opened: size,
            opened_value: Decimal::ZERO,
            opened_commission: Decimal::ZERO,
            margin: Decimal::ZERO,
            pnl: Decimal::ZERO,
            position_size,
            position_price,
            timestamp: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: String,
    pub side: OrderSide,
    pub symbol: String,
    /// Signed by side: Buy positive, Sell negative
    pub size: Decimal,
    pub price: Option<Decimal>,
    pub price_limit: Option<Decimal>,
    pub order_type: Option<OrderType>,
    pub valid_until: Option<DateTime<Utc>>,
    pub trade_id: u64,
    pub owner: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub executions: Vec<Execution>,
    #[serde(skip)]
    commission: Arc<dyn CommissionInfo>,
}

impl Order {
    pub fn new(id: String, request: OrderRequest, commission: Arc<dyn CommissionInfo>) -> Self {
        Self {
            id,
            side: request.side,
            size: request.side.signed(request.size),
            symbol: request.symbol,
            price: request.price,
            price_limit: request.price_limit,
            order_type: request.order_type,
            valid_until: request.valid_until,
            trade_id: request.trade_id,
            owner: request.owner,
            status: OrderStatus::Submitted,
            created_at: Utc::now(),
            executions: Vec::new(),
            commission,
        }
    }

    pub fn commission(&self) -> &Arc<dyn CommissionInfo> {
        &self.commission
    }

    /// Record a fill on the order
    pub fn execute(&mut self, execution: Execution) {
        self.executions.push(execution);
    }

    /// Signed size filled so far
    pub fn executed_size(&self) -> Decimal {
        self.executions.iter().map(|e| e.size).sum()
    }

    pub fn is_alive(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Time-based client order ids, unique within the process.
///
/// Ids have microsecond resolution; when two orders land in the same
/// microsecond the later one is moved forward by one microsecond.
#[derive(Debug, Default)]
pub struct OrderIdGenerator {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl OrderIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        self.next_at(Utc::now())
    }

    fn next_at(&self, now: DateTime<Utc>) -> String {
        let now = now.trunc_subsecs(6);
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());

        let stamp = match *last {
            Some(previous) if now <= previous => previous + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(stamp);

        stamp.format(ORDER_ID_FORMAT).to_string()
    }
}
