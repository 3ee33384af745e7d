//! Order snapshots and the status transition policy.
//!
//! An [`Order`] freezes product name, price, and image at purchase time. Once
//! placed, only its status and `updated_at` ever change, so the struct keeps
//! its fields private and exposes getters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::error::ValidationError;
use crate::types::{OrderId, OrderStatus, Price, ProductKey, UserId};

/// Delivery details entered at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub customer_name: String,
    pub mobile: String,
    pub address: String,
}

impl CustomerInfo {
    /// Trim every field and require each to be non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] naming the first blank field.
    pub fn normalized(self) -> Result<Self, ValidationError> {
        let customer_name = required(&self.customer_name, "customer_name")?;
        let mobile = required(&self.mobile, "mobile")?;
        let address = required(&self.address, "address")?;
        Ok(Self {
            customer_name,
            mobile,
            address,
        })
    }
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::missing(field))
    } else {
        Ok(trimmed.to_owned())
    }
}

/// A requested line: which product and how many.
///
/// The quantity is signed so that a negative or zero request from the client
/// is rejected by validation rather than by deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductKey,
    pub quantity: i64,
}

/// Check that there is at least one line and every quantity is positive.
///
/// # Errors
///
/// [`ValidationError::EmptyOrder`] or [`ValidationError::InvalidQuantity`].
pub fn validate_lines(
    lines: &[OrderLineRequest],
) -> Result<Vec<(ProductKey, u32)>, ValidationError> {
    if lines.is_empty() {
        return Err(ValidationError::EmptyOrder);
    }
    lines
        .iter()
        .map(|line| {
            u32::try_from(line.quantity)
                .ok()
                .filter(|quantity| *quantity >= 1)
                .map(|quantity| (line.product_id, quantity))
                .ok_or_else(|| ValidationError::InvalidQuantity {
                    product: line.product_id.to_string(),
                })
        })
        .collect()
}

/// Frozen copy of a product as purchased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductKey,
    pub product_name: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub image_url: String,
}

impl OrderItem {
    #[must_use]
    pub fn snapshot(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.key,
            product_name: product.name.clone(),
            unit_price: product.sell_price,
            quantity,
            image_url: product.image_url.clone(),
        }
    }

    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Sum of item subtotals.
#[must_use]
pub fn order_total(items: &[OrderItem]) -> Price {
    items.iter().map(OrderItem::subtotal).sum()
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    id: OrderId,
    user_id: Option<UserId>,
    customer_name: String,
    mobile: String,
    address: String,
    items: Vec<OrderItem>,
    total_amount: Price,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a new pending order; the total is computed from `items`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyOrder`] when `items` is empty.
    pub fn pending(
        user_id: Option<UserId>,
        customer: CustomerInfo,
        items: Vec<OrderItem>,
    ) -> Result<Self, ValidationError> {
        if items.is_empty() {
            return Err(ValidationError::EmptyOrder);
        }
        let now = Utc::now();
        Ok(Self {
            id: OrderId::generate(),
            user_id,
            customer_name: customer.customer_name,
            mobile: customer.mobile,
            address: customer.address,
            total_amount: order_total(&items),
            items,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reassemble an order read back from storage.
    #[cfg(feature = "postgres")]
    pub(crate) fn restore(parts: OrderParts) -> Self {
        Self {
            id: parts.id,
            user_id: parts.user_id,
            customer_name: parts.customer_name,
            mobile: parts.mobile,
            address: parts.address,
            items: parts.items,
            total_amount: parts.total_amount,
            status: parts.status,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
        }
    }

    pub(crate) fn set_status(&mut self, status: OrderStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }

    #[must_use]
    pub const fn id(&self) -> OrderId {
        self.id
    }

    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    #[must_use]
    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    #[must_use]
    pub fn mobile(&self) -> &str {
        &self.mobile
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    #[must_use]
    pub const fn total_amount(&self) -> Price {
        self.total_amount
    }

    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Invoices are only generated once an order has left `pending`.
    #[must_use]
    pub fn is_invoiceable(&self) -> bool {
        self.status != OrderStatus::Pending
    }
}

/// Raw columns of a stored order.
#[cfg(feature = "postgres")]
pub(crate) struct OrderParts {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub customer_name: String,
    pub mobile: String,
    pub address: String,
    pub items: Vec<OrderItem>,
    pub total_amount: Price,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which status changes an administrator may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any status may be set from any status.
    #[default]
    Permissive,
    /// Only steps along the fulfillment progression; re-applying the current
    /// status is accepted and just refreshes `updated_at`.
    Strict,
}

impl TransitionPolicy {
    #[must_use]
    pub fn permits(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            Self::Permissive => true,
            Self::Strict => from == to || from.successors().contains(&to),
        }
    }
}

impl std::str::FromStr for TransitionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(Self::Permissive),
            "strict" => Ok(Self::Strict),
            other => Err(format!("invalid transition policy: {other}")),
        }
    }
}

/// A customer request to place an order.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
    #[serde(flatten)]
    pub customer: CustomerInfo,
    pub lines: Vec<OrderLineRequest>,
    /// Total shown to the customer. Only compared against the computed total.
    #[serde(default)]
    pub claimed_total: Option<Price>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::product;

    fn customer() -> CustomerInfo {
        CustomerInfo {
            customer_name: " Alice ".to_owned(),
            mobile: "555".to_owned(),
            address: "1 Main St".to_owned(),
        }
    }

    #[test]
    fn test_customer_info_requires_every_field() {
        assert_eq!(customer().normalized().map(|c| c.customer_name).ok(), Some("Alice".to_owned()));

        let blank_mobile = CustomerInfo {
            mobile: "   ".to_owned(),
            ..customer()
        };
        assert_eq!(
            blank_mobile.normalized().err(),
            Some(ValidationError::missing("mobile"))
        );
    }

    #[test]
    fn test_validate_lines() {
        let key = ProductKey::generate();
        assert_eq!(validate_lines(&[]), Err(ValidationError::EmptyOrder));
        assert!(matches!(
            validate_lines(&[OrderLineRequest { product_id: key, quantity: 0 }]),
            Err(ValidationError::InvalidQuantity { .. })
        ));
        assert_eq!(
            validate_lines(&[OrderLineRequest { product_id: key, quantity: 3 }]),
            Ok(vec![(key, 3)])
        );
    }

    #[test]
    fn test_pending_order_total_is_computed() {
        let mut ten = product("a", "Ten", 1000, 1);
        ten.sell_price = Price::new(10.into());
        let order = Order::pending(None, customer(), vec![OrderItem::snapshot(&ten, 3)]);
        let order = order.unwrap_or_else(|e| panic!("order rejected: {e}"));

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.total_amount(), Price::new(30.into()));
        assert!(!order.is_invoiceable());
    }

    #[test]
    fn test_strict_policy() {
        let strict = TransitionPolicy::Strict;
        assert!(strict.permits(OrderStatus::Pending, OrderStatus::Confirmed));
        assert!(strict.permits(OrderStatus::Confirmed, OrderStatus::Cancelled));
        assert!(strict.permits(OrderStatus::Delivered, OrderStatus::Delivered));
        assert!(!strict.permits(OrderStatus::Delivered, OrderStatus::Pending));
        assert!(!strict.permits(OrderStatus::Pending, OrderStatus::Delivered));
        assert!(TransitionPolicy::Permissive.permits(OrderStatus::Cancelled, OrderStatus::Pending));
        assert_eq!("STRICT".parse::<TransitionPolicy>(), Ok(TransitionPolicy::Strict));
    }
}
