//! Product route handlers.
//!
//! Customers only see products that are on sale and whose category is
//! visible. Cost prices never leave the server.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use shophub_core::ProductKey;
use shophub_core::catalog::{
    Audience, CatalogFilter, CategoryFilter, PriceBand, ProductListing, ProductSummary,
};
use shophub_core::order::{CustomerInfo, Order, OrderLineRequest, PlaceOrder};
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub price: Option<String>,
}

impl ProductQuery {
    /// Build the catalog filter, newest products first.
    ///
    /// # Errors
    ///
    /// `BadRequest` for an unknown price band.
    pub fn to_filter(&self) -> Result<CatalogFilter> {
        let price: PriceBand = self
            .price
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(AppError::BadRequest)?;
        let mut filter = CatalogFilter::newest()
            .with_category(CategoryFilter::parse(self.category.as_deref()))
            .with_price(price);
        if let Some(search) = &self.search {
            filter = filter.with_search(search.as_str());
        }
        Ok(filter)
    }
}

/// A page of customer-facing products.
#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub count: usize,
    pub products: Vec<ProductSummary>,
}

impl From<&[ProductListing]> for ProductPage {
    fn from(listings: &[ProductListing]) -> Self {
        Self {
            count: listings.len(),
            products: listings.iter().map(ProductListing::customer_view).collect(),
        }
    }
}

/// `GET /products?category=&search=&price=`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductPage>> {
    let filter = query.to_filter()?;
    let listings = state
        .services()
        .catalog
        .list_products(&filter, Audience::Customer)
        .await?;
    Ok(Json(ProductPage::from(listings.as_slice())))
}

/// `GET /products/{key}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(key): Path<ProductKey>,
) -> Result<Json<ProductSummary>> {
    let listing = state.services().catalog.customer_product(key).await?;
    Ok(Json(listing.customer_view()))
}

/// "Buy now" request: delivery details and an optional quantity.
#[derive(Debug, Deserialize)]
pub struct BuyNow {
    #[serde(flatten)]
    pub customer: CustomerInfo,
    #[serde(default = "one")]
    pub quantity: i64,
}

const fn one() -> i64 {
    1
}

/// `POST /products/{key}/order`
///
/// Places a single-line order without touching the cart.
#[instrument(skip(state, principal, request))]
pub async fn buy_now(
    State(state): State<AppState>,
    OptionalAuth(principal): OptionalAuth,
    Path(key): Path<ProductKey>,
    Json(request): Json<BuyNow>,
) -> Result<(StatusCode, Json<Order>)> {
    // Hidden products 404 here rather than failing deeper in the workflow.
    state.services().catalog.customer_product(key).await?;

    let order = state
        .services()
        .orders
        .place(
            principal.as_ref(),
            PlaceOrder {
                customer: request.customer,
                lines: vec![OrderLineRequest {
                    product_id: key,
                    quantity: request.quantity,
                }],
                claimed_total: None,
            },
        )
        .await?;

    let order_id = order.id().to_string();
    add_breadcrumb("checkout", "Bought now", Some(&[("order_id", order_id.as_str())]));
    Ok((StatusCode::CREATED, Json(order)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults_to_everything_newest_first() {
        let filter = ProductQuery::default().to_filter().unwrap();
        assert_eq!(filter.price, PriceBand::All);
        assert_eq!(filter.category, CategoryFilter::All);
        assert_eq!(filter.search, None);
    }

    #[test]
    fn test_query_rejects_unknown_price_band() {
        let query = ProductQuery {
            price: Some("cheap".to_string()),
            ..ProductQuery::default()
        };
        assert!(matches!(query.to_filter(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_query_parses_category_and_band() {
        let query = ProductQuery {
            category: Some("tools".to_string()),
            search: Some("saw".to_string()),
            price: Some("mid".to_string()),
        };
        let filter = query.to_filter().unwrap();
        assert_eq!(filter.category, CategoryFilter::Only("tools".to_string()));
        assert_eq!(filter.price, PriceBand::Mid);
        assert_eq!(filter.search.as_deref(), Some("saw"));
    }
}
