use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Account field carrying the broker's buying power; backs both cash and value
pub const BUYING_POWER_FIELD: &str = "HardBuyingPowerLimit";

/// Broker-reported account value, typed on arrival
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AccountValue {
    Int(i64),
    Decimal(Decimal),
    Text(String),
}

impl AccountValue {
    /// Coerce raw text: integer first, then decimal, then plain text.
    /// Decimal has no infinity or NaN, so those spellings stay text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            return AccountValue::Int(value);
        }
        if let Ok(value) = Decimal::from_str(trimmed) {
            return AccountValue::Decimal(value);
        }
        if let Ok(value) = Decimal::from_scientific(trimmed) {
            return AccountValue::Decimal(value);
        }
        AccountValue::Text(raw.to_string())
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            AccountValue::Int(v) => Some(Decimal::from(*v)),
            AccountValue::Decimal(v) => Some(*v),
            AccountValue::Text(_) => None,
        }
    }
}

impl fmt::Display for AccountValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountValue::Int(v) => write!(f, "{}", v),
            AccountValue::Decimal(v) => write!(f, "{}", v),
            AccountValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Latest account status broadcast by the venue.
///
/// Each incoming field overwrites the stored one; fields missing from an
/// update keep their previous value.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AccountSnapshot {
    fields: HashMap<String, AccountValue>,
}

impl AccountSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update<I>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (String, AccountValue)>,
    {
        for (name, value) in fields {
            self.fields.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&AccountValue> {
        self.fields.get(name)
    }

    /// Buying power as reported by the venue, zero until reported
    pub fn buying_power(&self) -> Decimal {
        self.get(BUYING_POWER_FIELD)
            .and_then(AccountValue::as_decimal)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_value_coercion_order() {
        assert_eq!(AccountValue::parse("42"), AccountValue::Int(42));
        assert_eq!(AccountValue::parse("-7"), AccountValue::Int(-7));
        assert_eq!(
            AccountValue::parse("98765.43"),
            AccountValue::Decimal(dec!(98765.43))
        );
        assert_eq!(AccountValue::parse("1e3"), AccountValue::Decimal(dec!(1000)));
        assert_eq!(
            AccountValue::parse("ACTIVE"),
            AccountValue::Text("ACTIVE".to_string())
        );
    }

    #[test]
    fn test_non_finite_values_stay_text() {
        for raw in ["inf", "-inf", "Infinity", "nan", "NaN"] {
            let value = AccountValue::parse(raw);
            assert_eq!(value, AccountValue::Text(raw.to_string()));
            assert_eq!(value.as_decimal(), None);
        }
    }

    #[test]
    fn test_update_overwrites_and_retains() {
        let mut snapshot = AccountSnapshot::new();
        snapshot.update(vec![
            (BUYING_POWER_FIELD.to_string(), AccountValue::Int(1000)),
            ("Status".to_string(), AccountValue::Text("OPEN".to_string())),
        ]);
        snapshot.update(vec![(
            BUYING_POWER_FIELD.to_string(),
            AccountValue::Decimal(dec!(2500.5)),
        )]);

        assert_eq!(snapshot.buying_power(), dec!(2500.5));
        assert_eq!(
            snapshot.get("Status"),
            Some(&AccountValue::Text("OPEN".to_string()))
        );
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_buying_power_defaults_to_zero() {
        let mut snapshot = AccountSnapshot::new();
        assert_eq!(snapshot.buying_power(), Decimal::ZERO);

        snapshot.update(vec![(
            BUYING_POWER_FIELD.to_string(),
            AccountValue::Text("n/a".to_string()),
        )]);
        assert_eq!(snapshot.buying_power(), Decimal::ZERO);
    }
}
