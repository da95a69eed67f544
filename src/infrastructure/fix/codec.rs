//! Domain values <-> FIX 4.2 fields.
//!
//! Outbound: NewOrderSingle (`D`) and OrderCancelRequest (`F`).
//! Inbound: ExecutionReport (`8`) and News (`B`) account status.

use crate::config::SessionFields;
use crate::domain::errors::CodecError;
use crate::domain::fix::FixMessage;
use crate::domain::fix::tags::{self, SOH};
use crate::domain::trading::account::AccountValue;
use crate::domain::trading::order::Order;
use crate::domain::trading::types::{OrderSide, OrderType};
use chrono::Utc;
use rust_decimal::Decimal;

const TRANSACT_TIME_FORMAT: &str = "%Y%m%d-%H:%M:%S%.3f";

/// OrdType(40) for an engine order type. An order without a type is a market order.
pub fn ord_type_char(order_type: Option<OrderType>) -> Result<char, CodecError> {
    match order_type {
        None | Some(OrderType::Market) => Ok(tags::ord_type::MARKET),
        Some(OrderType::Limit) => Ok(tags::ord_type::LIMIT),
        Some(OrderType::Close) => Ok(tags::ord_type::ON_CLOSE),
        Some(OrderType::Stop) => Ok(tags::ord_type::STOP),
        Some(OrderType::StopLimit) => Ok(tags::ord_type::STOP_LIMIT),
        Some(other @ (OrderType::StopTrail | OrderType::StopTrailLimit)) => {
            Err(CodecError::UnsupportedOrderType {
                order_type: other.to_string(),
            })
        }
    }
}

fn side_char(side: OrderSide) -> char {
    match side {
        OrderSide::Buy => tags::side::BUY,
        OrderSide::Sell => tags::side::SELL,
    }
}

fn side_from_char(c: char) -> Result<OrderSide, CodecError> {
    match c {
        tags::side::BUY => Ok(OrderSide::Buy),
        tags::side::SELL => Ok(OrderSide::Sell),
        other => Err(CodecError::InvalidValue {
            tag: tags::SIDE,
            value: other.to_string(),
        }),
    }
}

fn stamp_session_fields(message: &mut FixMessage, fields: &SessionFields) {
    message.set_field(tags::EX_DESTINATION, fields.destination.as_str());
    message.set_field(tags::ACCOUNT, fields.account.as_str());
    message
        .header_mut()
        .set(tags::TARGET_SUB_ID, fields.target_sub_id.as_str());
}

/// Build a NewOrderSingle for a freshly created order
pub fn build_new_order(order: &Order, fields: &SessionFields) -> Result<FixMessage, CodecError> {
    let ord_type = ord_type_char(order.order_type)?;
    let quantity = order.size.abs().normalize().to_string();

    let mut message = FixMessage::new(tags::BEGIN_STRING_FIX42, tags::msg_type::NEW_ORDER_SINGLE);
    message.set_field(tags::CL_ORD_ID, order.id.as_str());
    message.set_field(tags::ORDER_ID, order.id.as_str());
    message.set_field(
        tags::HANDL_INST,
        tags::HANDL_INST_MANUAL_BEST_EXECUTION.to_string(),
    );
    message.set_field(tags::SYMBOL, order.symbol.as_str());
    message.set_field(tags::SIDE, side_char(order.side).to_string());
    message.set_field(tags::ORD_TYPE, ord_type.to_string());
    message.set_field(tags::ORDER_QTY, quantity.as_str());
    message.set_field(tags::ORDER_QTY2, quantity);
    if let Some(price) = order.price {
        message.set_field(tags::PRICE, price.normalize().to_string());
    }
    message.set_field(
        tags::TRANSACT_TIME,
        Utc::now().format(TRANSACT_TIME_FORMAT).to_string(),
    );
    stamp_session_fields(&mut message, fields);

    Ok(message)
}

/// Build an OrderCancelRequest addressing the order by its own id
pub fn build_cancel(order: &Order, fields: &SessionFields) -> FixMessage {
    let mut message = FixMessage::new(
        tags::BEGIN_STRING_FIX42,
        tags::msg_type::ORDER_CANCEL_REQUEST,
    );
    message.set_field(tags::ORIG_CL_ORD_ID, order.id.as_str());
    message.set_field(tags::CL_ORD_ID, order.id.as_str());
    message.set_field(tags::ORDER_ID, order.id.as_str());
    message.set_field(tags::SYMBOL, order.symbol.as_str());
    message.set_field(tags::SIDE, side_char(order.side).to_string());
    message.set_field(
        tags::TRANSACT_TIME,
        Utc::now().format(TRANSACT_TIME_FORMAT).to_string(),
    );
    stamp_session_fields(&mut message, fields);
    message
}

/// ExecType(150) values the registry acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecType {
    PendingNew,
    New,
    Fill,
    Rejected,
    Canceled,
    PositionSnapshot,
    Other(char),
}

impl ExecType {
    pub fn from_char(c: char) -> Self {
        match c {
            tags::exec_type::PENDING_NEW => ExecType::PendingNew,
            tags::exec_type::NEW => ExecType::New,
            tags::exec_type::FILL => ExecType::Fill,
            tags::exec_type::REJECTED => ExecType::Rejected,
            tags::exec_type::CANCELED => ExecType::Canceled,
            tags::exec_type::POSITION => ExecType::PositionSnapshot,
            other => ExecType::Other(other),
        }
    }
}

/// Symbol, signed size and price carried by a fill or a position snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct ReportedTrade {
    pub symbol: String,
    pub side: OrderSide,
    pub price: Decimal,
    pub size: Decimal,
}

/// Decoded ExecutionReport
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub exec_type: ExecType,
    pub cl_ord_id: Option<String>,
    pub trade: Option<ReportedTrade>,
}

impl ExecutionReport {
    pub fn parse(message: &FixMessage) -> Result<Self, CodecError> {
        let exec_type = ExecType::from_char(message.get_char(tags::EXEC_TYPE)?);

        let cl_ord_id = if message.is_set(tags::CL_ORD_ID) {
            Some(message.get_field(tags::CL_ORD_ID)?.to_string())
        } else {
            None
        };

        let trade = match exec_type {
            ExecType::Fill => Some(read_trade(message, tags::ORDER_QTY)?),
            ExecType::PositionSnapshot => Some(read_trade(message, tags::CUM_QTY)?),
            _ => None,
        };

        if cl_ord_id.is_none() && exec_type != ExecType::PositionSnapshot {
            return Err(CodecError::MissingTag {
                tag: tags::CL_ORD_ID,
            });
        }

        Ok(Self {
            exec_type,
            cl_ord_id,
            trade,
        })
    }
}

fn read_trade(message: &FixMessage, quantity_tag: u32) -> Result<ReportedTrade, CodecError> {
    let symbol = message.get_field(tags::SYMBOL)?.to_string();
    let side = side_from_char(message.get_char(tags::SIDE)?)?;
    let price: Decimal = message.get(tags::PRICE)?;
    let quantity: Decimal = message.get(quantity_tag)?;

    Ok(ReportedTrade {
        symbol,
        side,
        price,
        size: side.signed(quantity),
    })
}

/// Account fields from a News message's raw wire text.
///
/// `10008=<name>` names a field and the next `58=<value>` carries its value.
/// A value with no pending name is ignored; a name never followed by a value
/// is dropped.
pub fn parse_account_status(raw: &str) -> Vec<(String, AccountValue)> {
    let account_field = tags::ACCOUNT_FIELD_NAME.to_string();
    let text = tags::TEXT.to_string();

    let mut fields = Vec::new();
    let mut pending: Option<String> = None;

    for item in raw.split(SOH) {
        let Some((tag, value)) = item.split_once('=') else {
            continue;
        };
        if tag == account_field {
            pending = Some(value.to_string());
        } else if tag == text {
            if let Some(name) = pending.take() {
                fields.push((name, AccountValue::parse(value)));
            }
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trading::commission::FixCommission;
    use crate::domain::trading::order::OrderRequest;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn session_fields() -> SessionFields {
        SessionFields {
            destination: "NYSE".to_string(),
            account: "ACC-1".to_string(),
            target_sub_id: "DESK1".to_string(),
        }
    }

    fn order(request: OrderRequest) -> Order {
        Order::new(
            "2024-01-02_10:00:00_000001".to_string(),
            request,
            Arc::new(FixCommission),
        )
    }

    #[test]
    fn test_build_new_order_market_buy() {
        let order = order(OrderRequest::buy("X", dec!(100)));
        let message = build_new_order(&order, &session_fields()).unwrap();

        assert!(message.is_msg_type("D"));
        assert_eq!(message.header().get(tags::BEGIN_STRING), Some("FIX.4.2"));
        assert_eq!(message.header().get(tags::TARGET_SUB_ID), Some("DESK1"));
        assert_eq!(message.get_field(tags::CL_ORD_ID).unwrap(), order.id);
        assert_eq!(message.get_field(tags::ORDER_ID).unwrap(), order.id);
        assert_eq!(message.get_field(tags::HANDL_INST).unwrap(), "2");
        assert_eq!(message.get_field(tags::SYMBOL).unwrap(), "X");
        assert_eq!(message.get_field(tags::SIDE).unwrap(), "1");
        assert_eq!(message.get_field(tags::ORD_TYPE).unwrap(), "1");
        assert_eq!(message.get_field(tags::ORDER_QTY).unwrap(), "100");
        assert_eq!(message.get_field(tags::ORDER_QTY2).unwrap(), "100");
        assert_eq!(message.get_field(tags::EX_DESTINATION).unwrap(), "NYSE");
        assert_eq!(message.get_field(tags::ACCOUNT).unwrap(), "ACC-1");
        assert!(message.is_set(tags::TRANSACT_TIME));
        assert!(!message.is_set(tags::PRICE));
    }

    #[test]
    fn test_build_new_order_sell_limit_uses_absolute_quantity() {
        let order = order(
            OrderRequest::sell("X", dec!(50))
                .with_price(dec!(10.25))
                .with_order_type(OrderType::Limit),
        );
        let message = build_new_order(&order, &session_fields()).unwrap();

        assert_eq!(order.size, dec!(-50));
        assert_eq!(message.get_field(tags::SIDE).unwrap(), "2");
        assert_eq!(message.get_field(tags::ORD_TYPE).unwrap(), "2");
        assert_eq!(message.get_field(tags::ORDER_QTY).unwrap(), "50");
        assert_eq!(message.get_field(tags::PRICE).unwrap(), "10.25");
    }

    #[test]
    fn test_ord_type_mapping() {
        assert_eq!(ord_type_char(None).unwrap(), '1');
        assert_eq!(ord_type_char(Some(OrderType::Close)).unwrap(), '5');
        assert_eq!(ord_type_char(Some(OrderType::Stop)).unwrap(), '3');
        assert_eq!(ord_type_char(Some(OrderType::StopLimit)).unwrap(), '4');
        assert!(matches!(
            ord_type_char(Some(OrderType::StopTrail)),
            Err(CodecError::UnsupportedOrderType { .. })
        ));
        assert!(ord_type_char(Some(OrderType::StopTrailLimit)).is_err());
    }

    #[test]
    fn test_build_cancel() {
        let order = order(OrderRequest::buy("X", dec!(100)));
        let message = build_cancel(&order, &session_fields());

        assert!(message.is_msg_type("F"));
        assert_eq!(message.get_field(tags::ORIG_CL_ORD_ID).unwrap(), order.id);
        assert_eq!(message.get_field(tags::CL_ORD_ID).unwrap(), order.id);
        assert_eq!(message.get_field(tags::ORDER_ID).unwrap(), order.id);
        assert_eq!(message.get_field(tags::SYMBOL).unwrap(), "X");
        assert_eq!(message.header().get(tags::TARGET_SUB_ID), Some("DESK1"));
    }

    fn report(exec_type: &str) -> FixMessage {
        let mut message = FixMessage::new("FIX.4.2", "8");
        message.set_field(tags::EXEC_TYPE, exec_type);
        message
    }

    #[test]
    fn test_parse_fill_report() {
        let mut message = report("2");
        message.set_field(tags::CL_ORD_ID, "ID1");
        message.set_field(tags::SYMBOL, "X");
        message.set_field(tags::SIDE, "2");
        message.set_field(tags::PRICE, "10.5");
        message.set_field(tags::ORDER_QTY, "100");

        let parsed = ExecutionReport::parse(&message).unwrap();
        assert_eq!(parsed.exec_type, ExecType::Fill);
        assert_eq!(parsed.cl_ord_id.as_deref(), Some("ID1"));
        let trade = parsed.trade.unwrap();
        assert_eq!(trade.size, dec!(-100));
        assert_eq!(trade.price, dec!(10.5));
    }

    #[test]
    fn test_parse_position_snapshot_uses_cum_qty() {
        let mut message = report("P");
        message.set_field(tags::SYMBOL, "X");
        message.set_field(tags::SIDE, "1");
        message.set_field(tags::PRICE, "12");
        message.set_field(tags::ORDER_QTY, "999");
        message.set_field(tags::CUM_QTY, "30");

        let parsed = ExecutionReport::parse(&message).unwrap();
        assert_eq!(parsed.exec_type, ExecType::PositionSnapshot);
        assert!(parsed.cl_ord_id.is_none());
        assert_eq!(parsed.trade.unwrap().size, dec!(30));
    }

    #[test]
    fn test_parse_report_errors() {
        let mut message = report("2");
        message.set_field(tags::CL_ORD_ID, "ID1");
        message.set_field(tags::SYMBOL, "X");
        message.set_field(tags::SIDE, "1");
        message.set_field(tags::ORDER_QTY, "100");
        assert_eq!(
            ExecutionReport::parse(&message),
            Err(CodecError::MissingTag { tag: tags::PRICE })
        );

        message.set_field(tags::PRICE, "abc");
        assert!(matches!(
            ExecutionReport::parse(&message),
            Err(CodecError::InvalidValue { tag: 44, .. })
        ));

        // Acknowledgement without ClOrdID
        assert!(ExecutionReport::parse(&report("0")).is_err());
    }

    #[test]
    fn test_exec_type_other() {
        assert_eq!(
            ExecType::from_char(tags::exec_type::PARTIAL_FILL),
            ExecType::Other(tags::exec_type::PARTIAL_FILL)
        );
        assert_eq!(ExecType::from_char('A'), ExecType::PendingNew);
    }

    #[test]
    fn test_parse_account_status() {
        let raw = "8=FIX.4.2\x0135=B\x0133=2\x0110008=HardBuyingPowerLimit\x0158=98765.43\x01\
                   10008=OpenOrders\x0158=3\x0110008=Status\x0158=ACTIVE\x01";
        let fields = parse_account_status(raw);

        assert_eq!(
            fields,
            vec![
                (
                    "HardBuyingPowerLimit".to_string(),
                    AccountValue::Decimal(dec!(98765.43))
                ),
                ("OpenOrders".to_string(), AccountValue::Int(3)),
                ("Status".to_string(), AccountValue::Text("ACTIVE".to_string())),
            ]
        );
    }

    #[test]
    fn test_parse_account_status_unpaired_items() {
        // Leading text without a name, a name without a value, garbage items
        let raw = "58=orphan\x01garbage\x0110008=Dangling\x01148=headline\x01";
        assert!(parse_account_status(raw).is_empty());
    }
}
