//! Admin analytics and dashboard counters.

use std::sync::Arc;

use tracing::instrument;

use crate::error::WorkflowError;
use crate::invoice::{ProfitReport, StoreStats};
use crate::repository::{CatalogRepository, OrderRepository, Repositories};
use crate::types::{OrderStatus, OrderStatusFilter};
use crate::user::Principal;

#[derive(Clone)]
pub struct ReportService {
    catalog: Arc<dyn CatalogRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl ReportService {
    #[must_use]
    pub fn new(repos: &Repositories) -> Self {
        Self {
            catalog: Arc::clone(&repos.catalog),
            orders: Arc::clone(&repos.orders),
        }
    }

    /// Profit over delivered orders, costed at current product prices.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins; repository failures otherwise.
    #[instrument(skip(self, principal))]
    pub async fn profit(&self, principal: &Principal) -> Result<ProfitReport, WorkflowError> {
        principal.require_admin("viewing analytics")?;
        let delivered = self
            .orders
            .list_orders(OrderStatusFilter::Only(OrderStatus::Delivered))
            .await?;
        let products = self.catalog.list_products().await?;
        Ok(ProfitReport::compute(&delivered, &products))
    }

    /// Row counts for the dashboard.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins; repository failures otherwise.
    #[instrument(skip(self, principal))]
    pub async fn stats(&self, principal: &Principal) -> Result<StoreStats, WorkflowError> {
        principal.require_admin("viewing the dashboard")?;
        let products = self.catalog.list_products().await?;
        let categories = self.catalog.list_categories().await?;
        Ok(StoreStats {
            total_products: products.len() as u64,
            total_categories: categories.len() as u64,
            total_orders: self.orders.count_orders(OrderStatusFilter::All).await?,
            pending_orders: self
                .orders
                .count_orders(OrderStatusFilter::Only(OrderStatus::Pending))
                .await?,
        })
    }
}

impl std::fmt::Debug for ReportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportService").finish_non_exhaustive()
    }
}
