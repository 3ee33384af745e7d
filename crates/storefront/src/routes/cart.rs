//! Cart route handlers.
//!
//! The cart lives in the session. Every mutating handler loads it, applies
//! one change, and saves it back before responding with the new cart.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use shophub_core::cart::{Cart, CartLine};
use shophub_core::order::{CustomerInfo, Order, PlaceOrder};
use shophub_core::{Price, ProductKey};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::models::session::{load_cart, save_cart};
use crate::state::AppState;

/// Cart line with its subtotal.
#[derive(Debug, Serialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLine,
    pub subtotal: Price,
}

/// Cart as returned by every cart endpoint.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub count: u64,
    pub total: Price,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart
                .lines()
                .iter()
                .map(|line| CartLineView {
                    line: line.clone(),
                    subtotal: line.subtotal(),
                })
                .collect(),
            count: cart.count(),
            total: cart.total(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddToCart {
    pub product_id: ProductKey,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCart {
    pub product_id: ProductKey,
    /// Zero or below removes the line.
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct RemoveFromCart {
    pub product_id: ProductKey,
}

#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u64,
}

/// `GET /cart`
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::from(&cart)))
}

/// `POST /cart/add`
///
/// Adds one unit; a product already in the cart gains a unit instead of a
/// second line.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCart>,
) -> Result<Json<CartView>> {
    let listing = state
        .services()
        .catalog
        .customer_product(request.product_id)
        .await?;

    let mut cart = load_cart(&session).await?;
    cart.add(&listing.product);
    save_cart(&session, &cart).await?;

    tracing::debug!(product_id = %request.product_id, count = cart.count(), "Added to cart");
    Ok(Json(CartView::from(&cart)))
}

/// `POST /cart/update`
#[instrument(skip(session))]
pub async fn update(session: Session, Json(request): Json<UpdateCart>) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.set_quantity(request.product_id, request.quantity);
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// `POST /cart/remove`
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Json(request): Json<RemoveFromCart>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.remove(request.product_id);
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// `POST /cart/clear`
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.clear();
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// `GET /cart/count`
pub async fn count(session: Session) -> Result<Json<CartCount>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartCount {
        count: cart.count(),
    }))
}

/// Checkout form: delivery details plus the total the customer was shown.
#[derive(Debug, Deserialize)]
pub struct Checkout {
    #[serde(flatten)]
    pub customer: CustomerInfo,
    #[serde(default)]
    pub claimed_total: Option<Price>,
}

/// `POST /checkout`
///
/// Places an order for the cart contents and empties the cart. The cart is
/// left untouched when placement fails.
#[instrument(skip(state, session, principal, request))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(principal): OptionalAuth,
    Json(request): Json<Checkout>,
) -> Result<(StatusCode, Json<Order>)> {
    let mut cart = load_cart(&session).await?;

    let order = state
        .services()
        .orders
        .place(
            principal.as_ref(),
            PlaceOrder {
                customer: request.customer,
                lines: cart.to_order_lines(),
                claimed_total: request.claimed_total,
            },
        )
        .await?;

    cart.clear();
    save_cart(&session, &cart).await?;

    let order_id = order.id().to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_id.as_str())]));
    Ok((StatusCode::CREATED, Json(order)))
}
