//! Storefront endpoints: ticket selection, checkout kickoff, and the buyer
//! confirmation view. Markup is minimal inline HTML; real template
//! rendering is outside this system.

use axum::Form;
use axum::extract::{Query, State};
use axum::response::Html;
use serde::Deserialize;

use super::AppState;
use super::auth::CurrentSeller;
use super::error::ApiError;
use crate::application::checkout::render_redemption_artifact;
use crate::domain::TicketId;
use crate::domain::money;

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// GET / — the seller's listed tickets with the flat service fee shown.
pub async fn storefront(
    State(state): State<AppState>,
    CurrentSeller(seller): CurrentSeller,
) -> Result<Html<String>, ApiError> {
    let tickets = state
        .tickets
        .list_for_seller(seller.id)
        .await
        .map_err(ApiError::from)?;

    let mut rows = String::new();
    for ticket in &tickets {
        let total = money::round2(ticket.price + state.platform.service_fee);
        rows.push_str(&format!(
            "<li><form method=\"post\" action=\"/\">\
             <input type=\"hidden\" name=\"ticket_id\" value=\"{}\"/>\
             {} &mdash; {} (+{} service fee = {}) \
             <button type=\"submit\">Sell</button></form></li>",
            ticket.id,
            escape_html(&ticket.name),
            ticket.price,
            state.platform.service_fee,
            total,
        ));
    }
    if rows.is_empty() {
        rows.push_str("<li>No tickets listed.</li>");
    }

    Ok(Html(format!(
        "<!doctype html><html><head><title>Box office</title></head><body>\
         <h1>Tickets</h1><ul>{rows}</ul>\
         <p>Each sale adds a flat {} service fee.</p>\
         </body></html>",
        state.platform.service_fee
    )))
}

#[derive(Debug, Deserialize)]
pub struct BuyForm {
    ticket_id: TicketId,
}

/// POST / — creates a checkout session and returns a page embedding the
/// scannable artifact plus the hosted payment link.
pub async fn buy(
    State(state): State<AppState>,
    CurrentSeller(seller): CurrentSeller,
    Form(form): Form<BuyForm>,
) -> Result<Html<String>, ApiError> {
    let checkout = state.checkout.create_checkout(&seller, form.ticket_id).await?;
    let artifact = render_redemption_artifact(&checkout.url)?;
    let url = escape_html(&checkout.url);
    Ok(Html(format!(
        "<!doctype html><html><head><title>Scan to pay</title></head><body>\
         <h1>Scan to pay</h1>\
         <img alt=\"checkout QR code\" src=\"{}\"/>\
         <p><a href=\"{url}\">Or open the checkout page directly</a></p>\
         </body></html>",
        artifact.to_data_uri()
    )))
}

#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    ticket: Option<String>,
    price: Option<String>,
}

/// GET /success?ticket=&price= — buyer-facing confirmation, no auth.
pub async fn success(Query(query): Query<SuccessQuery>) -> Html<String> {
    let ticket = escape_html(query.ticket.as_deref().unwrap_or("your ticket"));
    let price = escape_html(query.price.as_deref().unwrap_or(""));
    Html(format!(
        "<!doctype html><html><head><title>Payment received</title></head><body>\
         <h1>Payment received</h1>\
         <p>Thanks! {ticket} {price} is confirmed.</p>\
         </body></html>"
    ))
}
