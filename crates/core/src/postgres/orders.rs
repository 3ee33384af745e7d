use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;

use super::{PgRepository, conflict_on_unique, corrupt};
use crate::error::RepositoryError;
use crate::order::{Order, OrderItem, OrderParts};
use crate::repository::OrderRepository;
use crate::types::{OrderId, OrderStatus, OrderStatusFilter, Price, UserId};

const ORDER_COLUMNS: &str = "id, user_id, customer_name, mobile, address, items, total_amount, \
     status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: Option<UserId>,
    customer_name: String,
    mobile: String,
    address: String,
    items: Json<Vec<OrderItem>>,
    total_amount: Price,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(r: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = r.status.parse().map_err(|e| corrupt("order status", e))?;
        Ok(Self::restore(OrderParts {
            id: r.id,
            user_id: r.user_id,
            customer_name: r.customer_name,
            mobile: r.mobile,
            address: r.address,
            items: r.items.0,
            total_amount: r.total_amount,
            status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }))
    }
}

fn status_param(filter: OrderStatusFilter) -> Option<&'static str> {
    match filter {
        OrderStatusFilter::All => None,
        OrderStatusFilter::Only(status) => Some(status.as_str()),
    }
}

#[async_trait]
impl OrderRepository for PgRepository {
    async fn insert_order(&self, order: &Order) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO orders (id, user_id, customer_name, mobile, address, items,
                                total_amount, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(order.id())
        .bind(order.user_id())
        .bind(order.customer_name())
        .bind(order.mobile())
        .bind(order.address())
        .bind(Json(order.items()))
        .bind(order.total_amount())
        .bind(order.status().as_str())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "order"))?;
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.ok_or(RepositoryError::NotFound).and_then(Order::try_from)
    }

    async fn list_orders(&self, filter: OrderStatusFilter) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE ($1::TEXT IS NULL OR status = $1) \
             ORDER BY created_at DESC"
        ))
        .bind(status_param(filter))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or(RepositoryError::NotFound).and_then(Order::try_from)
    }

    async fn count_orders(&self, filter: OrderStatusFilter) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE ($1::TEXT IS NULL OR status = $1)",
        )
        .bind(status_param(filter))
        .fetch_one(&self.pool)
        .await?;
        u64::try_from(count).map_err(|e| corrupt("order count", e))
    }
}
