//! Session-owned shopping cart.
//!
//! The cart lives in the browsing session and serializes as a flat JSON array
//! of lines. Handlers load it, mutate it, and write it back before
//! responding; nothing here touches the order tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::order::OrderLineRequest;
use crate::types::{Price, ProductKey};

/// One distinct product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductKey,
    pub product_name: String,
    pub unit_price: Price,
    pub image_url: String,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Ordered collection of cart lines, one per product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add one unit of `product`.
    ///
    /// An existing line gains one unit; otherwise a new line with quantity 1
    /// is appended, capturing the current name, price, and image.
    pub fn add(&mut self, product: &Product) {
        if let Some(line) = self.line_mut(product.key) {
            line.quantity = line.quantity.saturating_add(1);
            return;
        }
        self.lines.push(CartLine {
            product_id: product.key,
            product_name: product.name.clone(),
            unit_price: product.sell_price,
            image_url: product.image_url.clone(),
            quantity: 1,
            added_at: Utc::now(),
        });
    }

    pub fn remove(&mut self, product_id: ProductKey) {
        self.lines.retain(|line| line.product_id != product_id);
    }

    /// Replace a line's quantity; anything below 1 removes the line.
    ///
    /// Unknown products are ignored.
    pub fn set_quantity(&mut self, product_id: ProductKey, quantity: i64) {
        if quantity < 1 {
            self.remove(product_id);
            return;
        }
        if let Some(line) = self.line_mut(product_id) {
            line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of unit price times quantity over every line.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Total number of units.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    #[must_use]
    pub fn line(&self, product_id: ProductKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductKey) -> bool {
        self.line(product_id).is_some()
    }

    /// Requested lines for checkout.
    #[must_use]
    pub fn to_order_lines(&self) -> Vec<OrderLineRequest> {
        self.lines
            .iter()
            .map(|line| OrderLineRequest {
                product_id: line.product_id,
                quantity: i64::from(line.quantity),
            })
            .collect()
    }

    fn line_mut(&mut self, product_id: ProductKey) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::product;

    #[test]
    fn test_add_twice_merges_lines() {
        let widget = product("tools", "Widget", 1999, 1);
        let mut cart = Cart::new();
        cart.add(&widget);
        cart.add(&widget);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.line(widget.key).unwrap().quantity, 2);
        assert_eq!(cart.count(), 2);
        assert_eq!(cart.total(), Price::from_cents(3998));
    }

    #[test]
    fn test_total_saturates_for_oversized_prices() {
        let mut widget = product("tools", "Widget", 1999, 1);
        widget.sell_price = Price::new(rust_decimal::Decimal::MAX);
        let gizmo = product("tools", "Gizmo", 500, 2);
        let mut cart = Cart::new();
        cart.add(&widget);
        cart.add(&widget);
        cart.add(&gizmo);

        assert_eq!(cart.total(), Price::new(rust_decimal::Decimal::MAX));
    }

    #[test]
    fn test_set_quantity_below_one_removes() {
        let widget = product("tools", "Widget", 1999, 1);
        let mut cart = Cart::new();
        cart.add(&widget);

        cart.set_quantity(widget.key, 0);
        assert!(!cart.contains(widget.key));
        assert!(cart.is_empty());

        cart.set_quantity(widget.key, 5);
        assert!(cart.is_empty(), "absent products are not re-added");
    }

    #[test]
    fn test_total_tracks_every_mutation() {
        let a = product("tools", "A", 250, 1);
        let b = product("tools", "B", 1000, 1);
        let c = product("tools", "C", 1, 1);
        let mut cart = Cart::new();

        cart.add(&a);
        cart.add(&b);
        cart.add(&c);
        cart.set_quantity(a.key, 4);
        cart.remove(c.key);
        cart.add(&b);
        cart.set_quantity(b.key, -3);

        let expected: Price = cart
            .lines()
            .iter()
            .map(|line| line.unit_price.times(line.quantity))
            .sum();
        assert_eq!(cart.total(), expected);
        assert_eq!(cart.total(), Price::from_cents(1000));
        assert_eq!(cart.count(), 4);
    }

    #[test]
    fn test_insertion_order_and_json_shape() {
        let a = product("tools", "A", 100, 1);
        let b = product("tools", "B", 200, 1);
        let mut cart = Cart::new();
        cart.add(&b);
        cart.add(&a);
        cart.add(&b);

        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["product_name"], "B");
        assert_eq!(json[0]["quantity"], 2);

        let restored: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_clear_and_order_lines() {
        let a = product("tools", "A", 100, 1);
        let mut cart = Cart::new();
        cart.add(&a);
        cart.add(&a);

        let lines = cart.to_order_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);

        cart.clear();
        assert_eq!(cart.total(), Price::ZERO);
    }
}
