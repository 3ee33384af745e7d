//! One-shot invoice view.

use axum::Json;
use serde::Serialize;
use shophub_core::invoice::Invoice;
use tower_sessions::Session;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::session::take_invoice;

#[derive(Debug, Serialize)]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    /// Printable rendering.
    pub text: String,
}

/// `GET /invoice`
///
/// Takes the invoice stashed by `POST /orders/{id}/invoice`. Without a fresh
/// generation a second request is a 404.
pub async fn show(
    session: Session,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<InvoiceView>> {
    let invoice = take_invoice(&session)
        .await?
        .ok_or_else(|| AppError::NotFound("no invoice has been generated".to_string()))?;
    let text = invoice.render_text();
    Ok(Json(InvoiceView { invoice, text }))
}
