//! Invoice projection and admin reporting.

use std::collections::HashMap;
use std::fmt::{self, Write as _};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::order::{Order, OrderItem};
use crate::types::{OrderId, OrderStatus, Price, ProductKey};

/// One invoice row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub product_name: String,
    pub image_url: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub subtotal: Price,
}

impl From<&OrderItem> for InvoiceLine {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_name: item.product_name.clone(),
            image_url: item.image_url.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            subtotal: item.subtotal(),
        }
    }
}

impl fmt::Display for InvoiceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} \u{d7} {} = {}",
            self.product_name, self.quantity, self.subtotal
        )
    }
}

/// Read-only invoice view of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub order_id: OrderId,
    pub reference: String,
    pub customer_name: String,
    pub mobile: String,
    pub address: String,
    pub lines: Vec<InvoiceLine>,
    pub total_amount: Price,
    pub status: OrderStatus,
    pub issued_at: DateTime<Utc>,
}

impl Invoice {
    #[must_use]
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id(),
            reference: order.id().short_reference(),
            customer_name: order.customer_name().to_owned(),
            mobile: order.mobile().to_owned(),
            address: order.address().to_owned(),
            lines: order.items().iter().map(InvoiceLine::from).collect(),
            total_amount: order.total_amount(),
            status: order.status(),
            issued_at: Utc::now(),
        }
    }

    /// Plain-text rendering suitable for printing.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(out, "Invoice #{}", self.reference);
        let _ = writeln!(out, "Customer: {}", self.customer_name);
        let _ = writeln!(out, "Mobile: {}", self.mobile);
        let _ = writeln!(out, "Address: {}", self.address);
        let _ = writeln!(out, "Status: {}", self.status.as_str().to_uppercase());
        let _ = writeln!(out);
        for line in &self.lines {
            let _ = writeln!(out, "{line}");
        }
        let _ = writeln!(out);
        let _ = write!(out, "Total Amount: {}", self.total_amount);
        out
    }
}

/// Profit over delivered orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProfitReport {
    pub delivered_orders: usize,
    pub revenue: Price,
    pub cost: Price,
    pub profit: Price,
}

impl ProfitReport {
    /// Aggregate revenue and cost over delivered orders.
    ///
    /// Cost is looked up from the current product rows, not the order
    /// snapshot. Items whose product no longer exists cost nothing.
    #[must_use]
    pub fn compute(orders: &[Order], products: &[Product]) -> Self {
        let cost_of: HashMap<ProductKey, Price> = products
            .iter()
            .map(|product| (product.key, product.cost_price))
            .collect();

        let delivered: Vec<&Order> = orders
            .iter()
            .filter(|order| order.status() == OrderStatus::Delivered)
            .collect();

        let revenue: Price = delivered.iter().map(|order| order.total_amount()).sum();
        let cost: Price = delivered
            .iter()
            .flat_map(|order| order.items())
            .filter_map(|item| {
                cost_of
                    .get(&item.product_id)
                    .map(|unit_cost| unit_cost.times(item.quantity))
            })
            .sum();

        Self {
            delivered_orders: delivered.len(),
            revenue,
            cost,
            profit: revenue - cost,
        }
    }
}

/// Admin dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StoreStats {
    pub total_products: u64,
    pub total_categories: u64,
    pub total_orders: u64,
    pub pending_orders: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::product;
    use crate::order::CustomerInfo;

    fn alice() -> CustomerInfo {
        CustomerInfo {
            customer_name: "Alice".to_owned(),
            mobile: "555".to_owned(),
            address: "1 Main St".to_owned(),
        }
    }

    fn placed(items: Vec<OrderItem>, status: OrderStatus) -> Order {
        let mut order = Order::pending(None, alice(), items)
            .unwrap_or_else(|e| panic!("order rejected: {e}"));
        order.set_status(status, Utc::now());
        order
    }

    #[test]
    fn test_invoice_line_text() {
        let widget = product("tools", "Widget", 1999, 1);
        let order = placed(vec![OrderItem::snapshot(&widget, 2)], OrderStatus::Delivered);
        let invoice = Invoice::from_order(&order);

        assert_eq!(invoice.lines[0].to_string(), "Widget \u{d7} 2 = $39.98");
        let text = invoice.render_text();
        assert!(text.contains("Customer: Alice"));
        assert!(text.contains("Status: DELIVERED"));
        assert!(text.ends_with("Total Amount: $39.98"));
    }

    #[test]
    fn test_profit_uses_current_cost_and_skips_missing_products() {
        let mut widget = product("tools", "Widget", 2000, 1);
        let gone = product("tools", "Gone", 500, 1);

        let delivered = placed(
            vec![OrderItem::snapshot(&widget, 2), OrderItem::snapshot(&gone, 1)],
            OrderStatus::Delivered,
        );
        let pending = placed(vec![OrderItem::snapshot(&widget, 5)], OrderStatus::Pending);

        // Cost changed after the sale; the report follows the current value.
        widget.cost_price = Price::from_cents(300);
        let report = ProfitReport::compute(&[delivered, pending], &[widget]);

        assert_eq!(report.delivered_orders, 1);
        assert_eq!(report.revenue, Price::from_cents(4500));
        assert_eq!(report.cost, Price::from_cents(600));
        assert_eq!(report.profit, Price::from_cents(3900));
    }
}
