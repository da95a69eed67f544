use rust_decimal::Decimal;
use std::fmt::Debug;

/// Commission/margin model attached to every order
pub trait CommissionInfo: Debug + Send + Sync {
    /// Value of a position of `size` at `price`
    fn valuation_size(&self, size: Decimal, price: Decimal) -> Decimal;

    /// Cash needed to open `size` at `price`
    fn operation_cost(&self, size: Decimal, price: Decimal) -> Decimal;

    /// Get description of the commission model
    fn description(&self) -> String;
}

/// Required capital equals full notional: no fractional margin rate.
#[derive(Debug, Clone, Default)]
pub struct FixCommission;

impl CommissionInfo for FixCommission {
    fn valuation_size(&self, size: Decimal, price: Decimal) -> Decimal {
        size.abs() * price
    }

    fn operation_cost(&self, size: Decimal, price: Decimal) -> Decimal {
        size.abs() * price
    }

    fn description(&self) -> String {
        "Full notional (|size| x price), zero commission".to_string()
    }
}
