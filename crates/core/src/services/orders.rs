//! Order placement and fulfillment.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use crate::error::WorkflowError;
use crate::invoice::Invoice;
use crate::order::{Order, OrderItem, PlaceOrder, TransitionPolicy, validate_lines};
use crate::repository::{CatalogRepository, OrderRepository, Repositories};
use crate::types::{OrderId, OrderStatus, OrderStatusFilter, UserId};
use crate::user::Principal;

/// Places orders and drives their status.
#[derive(Clone)]
pub struct OrderWorkflow {
    catalog: Arc<dyn CatalogRepository>,
    orders: Arc<dyn OrderRepository>,
    policy: TransitionPolicy,
}

impl OrderWorkflow {
    #[must_use]
    pub fn new(repos: &Repositories) -> Self {
        Self {
            catalog: Arc::clone(&repos.catalog),
            orders: Arc::clone(&repos.orders),
            policy: TransitionPolicy::default(),
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Validate, snapshot the products, and store a new pending order.
    ///
    /// The total is always computed here; a claimed total from the client is
    /// only compared and logged. Stock levels are not decremented.
    ///
    /// # Errors
    ///
    /// - `Validation` for blank customer fields, no lines, a quantity below
    ///   1, or a product that is no longer on sale.
    /// - `NotFound` when a line references an unknown product.
    /// - `Repository` if the insert fails.
    #[instrument(skip(self, principal, request), fields(user_id = tracing::field::Empty, lines = request.lines.len()))]
    pub async fn place(
        &self,
        principal: Option<&Principal>,
        request: PlaceOrder,
    ) -> Result<Order, WorkflowError> {
        let user_id = principal.map(|p| p.user_id);
        if let Some(id) = user_id {
            tracing::Span::current().record("user_id", id.as_i64());
        }

        let customer = request.customer.normalized()?;
        let lines = validate_lines(&request.lines)?;

        let mut items = Vec::with_capacity(lines.len());
        for (product_id, quantity) in lines {
            let product = self
                .catalog
                .get_product(product_id)
                .await
                .map_err(|e| WorkflowError::from_lookup(e, format_args!("product {product_id}")))?;

            if !product.is_purchasable() {
                return Err(WorkflowError::invalid(format!(
                    "{} is not available",
                    product.name
                )));
            }
            if quantity > product.stock_qty {
                tracing::warn!(
                    product_id = %product.key,
                    quantity,
                    stock_qty = product.stock_qty,
                    "Order quantity exceeds recorded stock"
                );
            }
            items.push(OrderItem::snapshot(&product, quantity));
        }

        let order = Order::pending(user_id, customer, items)?;

        if let Some(claimed) = request.claimed_total.filter(|c| *c != order.total_amount()) {
            tracing::warn!(
                claimed = %claimed,
                computed = %order.total_amount(),
                "Client total differs from computed total"
            );
        }

        self.orders.insert_order(&order).await?;
        tracing::info!(
            order_id = %order.id(),
            total = %order.total_amount(),
            "Order placed"
        );
        Ok(order)
    }

    /// Set an order's status. Administrators only.
    ///
    /// # Errors
    ///
    /// - `Forbidden` for non-admin callers, before anything is read.
    /// - `NotFound` for an unknown order.
    /// - `InvalidTransition` when the policy rejects the change.
    #[instrument(skip(self, principal), fields(admin = %principal.user_id))]
    pub async fn transition(
        &self,
        principal: &Principal,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, WorkflowError> {
        principal.require_admin("changing order status")?;

        let current = self.load(order_id).await?;
        if !self.policy.permits(current.status(), status) {
            return Err(WorkflowError::InvalidTransition {
                from: current.status(),
                to: status,
            });
        }

        let updated = self
            .orders
            .update_order_status(order_id, status, Utc::now())
            .await
            .map_err(|e| WorkflowError::from_lookup(e, format_args!("order {order_id}")))?;

        tracing::info!(
            from = %current.status(),
            to = %status,
            "Order status changed"
        );
        Ok(updated)
    }

    /// Every order, or those in one status, newest first. Administrators only.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admin callers.
    #[instrument(skip(self, principal))]
    pub async fn list_by_status(
        &self,
        principal: &Principal,
        filter: OrderStatusFilter,
    ) -> Result<Vec<Order>, WorkflowError> {
        principal.require_admin("listing orders")?;
        Ok(self.orders.list_orders(filter).await?)
    }

    /// Orders placed by `user_id`. Customers may only list their own.
    ///
    /// # Errors
    ///
    /// `Forbidden` when a non-admin asks for someone else's orders.
    #[instrument(skip(self, principal))]
    pub async fn list_by_user(
        &self,
        principal: &Principal,
        user_id: UserId,
    ) -> Result<Vec<Order>, WorkflowError> {
        if !principal.is_admin() && principal.user_id != user_id {
            return Err(WorkflowError::Forbidden(
                "customers can only list their own orders".to_owned(),
            ));
        }
        Ok(self.orders.orders_for_user(user_id).await?)
    }

    /// Order history: everything for an admin, own orders for a customer.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn list_visible(&self, principal: &Principal) -> Result<Vec<Order>, WorkflowError> {
        if principal.is_admin() {
            self.list_by_status(principal, OrderStatusFilter::All).await
        } else {
            self.list_by_user(principal, principal.user_id).await
        }
    }

    /// A single order, subject to the same visibility as [`Self::list_visible`].
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown orders, `Forbidden` for another customer's.
    #[instrument(skip(self, principal))]
    pub async fn get(&self, principal: &Principal, order_id: OrderId) -> Result<Order, WorkflowError> {
        let order = self.load(order_id).await?;
        if principal.is_admin() || order.user_id() == Some(principal.user_id) {
            Ok(order)
        } else {
            Err(WorkflowError::Forbidden(
                "order belongs to another customer".to_owned(),
            ))
        }
    }

    /// Invoice for a non-pending order. Administrators only.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `NotFound`, or `Validation` when the order is still pending.
    #[instrument(skip(self, principal))]
    pub async fn invoice(
        &self,
        principal: &Principal,
        order_id: OrderId,
    ) -> Result<Invoice, WorkflowError> {
        principal.require_admin("generating invoices")?;
        let order = self.load(order_id).await?;
        if !order.is_invoiceable() {
            return Err(WorkflowError::invalid(
                "invoices are only available once an order has left pending",
            ));
        }
        Ok(Invoice::from_order(&order))
    }

    async fn load(&self, order_id: OrderId) -> Result<Order, WorkflowError> {
        self.orders
            .get_order(order_id)
            .await
            .map_err(|e| WorkflowError::from_lookup(e, format_args!("order {order_id}")))
    }
}

impl std::fmt::Debug for OrderWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderWorkflow")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::fixtures::product;
    use crate::memory::MemoryRepository;
    use crate::order::{CustomerInfo, OrderLineRequest};
    use crate::types::{Email, Price, ProductKey, UserRole};

    fn principal(id: i64, role: UserRole) -> Principal {
        Principal {
            user_id: UserId::new(id),
            email: Email::parse(&format!("u{id}@shop.example")).unwrap_or_else(|e| panic!("{e}")),
            name: format!("User {id}"),
            role,
        }
    }

    fn request(product_id: ProductKey, quantity: i64) -> PlaceOrder {
        PlaceOrder {
            customer: CustomerInfo {
                customer_name: "Alice".to_owned(),
                mobile: "555".to_owned(),
                address: "1 Main St".to_owned(),
            },
            lines: vec![OrderLineRequest {
                product_id,
                quantity,
            }],
            claimed_total: None,
        }
    }

    async fn setup() -> (OrderWorkflow, Arc<MemoryRepository>, ProductKey) {
        let repo = Arc::new(MemoryRepository::new());
        let mut ten = product("tools", "Ten", 1000, 1);
        ten.sell_price = Price::new(Decimal::from(10));
        repo.insert_product(&ten)
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        let workflow = OrderWorkflow::new(&Repositories::from_backend(repo.clone()));
        (workflow, repo, ten.key)
    }

    #[tokio::test]
    async fn test_total_ignores_claimed_total() {
        let (workflow, _, key) = setup().await;
        let mut req = request(key, 3);
        req.claimed_total = Some(Price::from_cents(1));

        let order = workflow
            .place(None, req)
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(order.total_amount(), Price::new(Decimal::from(30)));
        assert_eq!(order.user_id(), None);
    }

    #[tokio::test]
    async fn test_unknown_product_and_bad_quantity() {
        let (workflow, repo, key) = setup().await;

        let missing = workflow.place(None, request(ProductKey::generate(), 1)).await;
        assert!(matches!(missing, Err(WorkflowError::NotFound(_))));

        let zero = workflow.place(None, request(key, 0)).await;
        assert!(matches!(zero, Err(WorkflowError::Validation(_))));

        assert_eq!(repo.count_orders(OrderStatusFilter::All).await.ok(), Some(0));
    }

    #[tokio::test]
    async fn test_customer_cannot_transition() {
        let (workflow, repo, key) = setup().await;
        let order = workflow
            .place(None, request(key, 1))
            .await
            .unwrap_or_else(|e| panic!("{e}"));

        let result = workflow
            .transition(&principal(7, UserRole::User), order.id(), OrderStatus::Delivered)
            .await;
        assert!(matches!(result, Err(WorkflowError::Forbidden(_))));

        let stored = repo.get_order(order.id()).await.unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(stored, order);
    }

    #[tokio::test]
    async fn test_strict_policy_rejects_regression() {
        let (workflow, _, key) = setup().await;
        let workflow = workflow.with_policy(TransitionPolicy::Strict);
        let admin = principal(1, UserRole::Admin);
        let order = workflow
            .place(None, request(key, 1))
            .await
            .unwrap_or_else(|e| panic!("{e}"));

        for step in [OrderStatus::Confirmed, OrderStatus::Delivered] {
            workflow
                .transition(&admin, order.id(), step)
                .await
                .unwrap_or_else(|e| panic!("{e}"));
        }
        let back = workflow.transition(&admin, order.id(), OrderStatus::Pending).await;
        assert!(matches!(
            back,
            Err(WorkflowError::InvalidTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Pending
            })
        ));
    }

    #[tokio::test]
    async fn test_visibility() {
        let (workflow, _, key) = setup().await;
        let bob = principal(2, UserRole::User);
        let carol = principal(3, UserRole::User);
        let admin = principal(1, UserRole::Admin);

        let order = workflow
            .place(Some(&bob), request(key, 1))
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        workflow
            .place(None, request(key, 2))
            .await
            .unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(workflow.list_visible(&bob).await.map(|o| o.len()).ok(), Some(1));
        assert_eq!(workflow.list_visible(&carol).await.map(|o| o.len()).ok(), Some(0));
        assert_eq!(workflow.list_visible(&admin).await.map(|o| o.len()).ok(), Some(2));

        assert!(matches!(
            workflow.list_by_user(&carol, bob.user_id).await,
            Err(WorkflowError::Forbidden(_))
        ));
        assert!(matches!(
            workflow.get(&carol, order.id()).await,
            Err(WorkflowError::Forbidden(_))
        ));
        assert!(workflow.get(&bob, order.id()).await.is_ok());
        assert!(matches!(
            workflow.list_by_status(&bob, OrderStatusFilter::All).await,
            Err(WorkflowError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_invoice_requires_non_pending() {
        let (workflow, _, key) = setup().await;
        let admin = principal(1, UserRole::Admin);
        let order = workflow
            .place(None, request(key, 2))
            .await
            .unwrap_or_else(|e| panic!("{e}"));

        assert!(matches!(
            workflow.invoice(&admin, order.id()).await,
            Err(WorkflowError::Validation(_))
        ));

        workflow
            .transition(&admin, order.id(), OrderStatus::Confirmed)
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        let invoice = workflow
            .invoice(&admin, order.id())
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(invoice.total_amount, Price::new(Decimal::from(20)));
        assert_eq!(invoice.status, OrderStatus::Confirmed);
    }
}
