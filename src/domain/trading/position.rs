use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Net position in one symbol.
///
/// `price` is the volume-weighted average and only meaningful while `size != 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    pub size: Decimal,
    pub price: Decimal,
}

impl Position {
    pub fn new(size: Decimal, price: Decimal) -> Self {
        Self { size, price }
    }

    pub fn flat() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.size.is_zero()
    }

    /// Position after applying a signed fill, None if the average overflows
    pub fn apply(&self, price: Decimal, size: Decimal) -> Option<Position> {
        let new_size = self.size.checked_add(size)?;

        if new_size.is_zero() {
            // Flattened: keep the old average, it is reset by the next open
            return Some(Position::new(Decimal::ZERO, self.price));
        }

        let crosses_zero = !self.size.is_zero()
            && new_size.is_sign_negative() != self.size.is_sign_negative();
        if crosses_zero {
            return Some(Position::new(new_size, price));
        }

        let held = self.price.checked_mul(self.size)?;
        let added = price.checked_mul(size)?;
        let new_price = held.checked_add(added)?.checked_div(new_size)?;
        Some(Position::new(new_size, new_price))
    }
}

/// Per-symbol positions driven by fills
#[derive(Debug, Clone, Default)]
pub struct PositionLedger {
    positions: HashMap<String, Position>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position a signed fill would produce, without recording it
    pub fn projected(&self, symbol: &str, price: Decimal, size: Decimal) -> Option<Position> {
        match self.positions.get(symbol) {
            Some(existing) => existing.apply(price, size),
            None => Some(Position::new(size, price)),
        }
    }

    pub fn commit(&mut self, symbol: &str, position: Position) {
        self.positions.insert(symbol.to_string(), position);
    }

    /// Apply a signed fill and return the resulting position.
    /// On arithmetic overflow the ledger is left untouched and None is returned.
    pub fn apply_fill(&mut self, symbol: &str, price: Decimal, size: Decimal) -> Option<Position> {
        let updated = self.projected(symbol, price, size)?;
        self.commit(symbol, updated);
        Some(updated)
    }

    /// Current position, flat if the symbol was never traded
    pub fn position(&self, symbol: &str) -> Position {
        self.positions.get(symbol).copied().unwrap_or_default()
    }

    pub fn positions(&self) -> HashMap<String, Position> {
        self.positions.clone()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
