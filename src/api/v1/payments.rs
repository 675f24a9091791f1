//! Payment link generation and gateway webhooks.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::api::AppState;
use crate::db::{
    Database, DbError, Invoice, InvoiceRepository, PaymentConfirmation, PaymentOutcome,
};
use crate::payments::{
    Customer, PaidEvent, PaymentError, PaymentLinkRequest, WebhookEvent, parse_cashfree_webhook,
    parse_razorpay_webhook, verify_cashfree_signature, verify_razorpay_signature,
};

use super::{ErrorReply, ErrorResponse, db_error, error_reply};

pub const RAZORPAY_SIGNATURE_HEADER: &str = "x-razorpay-signature";
pub const CASHFREE_SIGNATURE_HEADER: &str = "x-webhook-signature";
pub const CASHFREE_TIMESTAMP_HEADER: &str = "x-webhook-timestamp";

// =============================================================================
// DTOs (Data Transfer Objects)
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Phone number
    pub contact: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GeneratePaymentLinkRequest {
    /// Invoice ID or invoice number
    #[schema(example = "INV-001")]
    pub invoice_id: String,
    pub customer: Option<CustomerRequest>,
    pub description: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct PaymentLinkResponse {
    pub success: bool,
    #[schema(example = "plink_Nx1b2c3d4")]
    pub payment_link_id: String,
    #[schema(example = "https://rzp.io/i/abc123")]
    pub payment_link_url: String,
}

/// Webhook acknowledgement
#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookResponse {
    /// ok, duplicate or ignored
    #[schema(example = "ok")]
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_due: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

impl WebhookResponse {
    fn status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            event: None,
            invoice_id: None,
            receipt_number: None,
            invoice_status: None,
            balance_due: None,
            transaction_id: None,
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Find an invoice by id, falling back to invoice number.
async fn find_invoice<D: Database>(state: &AppState<D>, key: &str) -> Result<Option<Invoice>, DbError> {
    match state.db().invoices().get(key).await {
        Ok(invoice) => Ok(Some(invoice)),
        Err(DbError::NotFound { .. }) => state.db().invoices().get_by_number(key).await,
        Err(e) => Err(e),
    }
}

fn payment_error(e: PaymentError) -> ErrorReply {
    let status = match &e {
        PaymentError::NotConfigured { .. } => StatusCode::SERVICE_UNAVAILABLE,
        PaymentError::Request { .. }
        | PaymentError::Gateway { .. }
        | PaymentError::InvalidResponse { .. } => StatusCode::BAD_GATEWAY,
        PaymentError::InvalidSignature => StatusCode::UNAUTHORIZED,
        PaymentError::InvalidPayload { .. } => StatusCode::BAD_REQUEST,
    };
    error_reply(status, e.to_string())
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Match a confirmed payment to its invoice and apply it.
async fn apply_paid_event<D: Database>(
    state: &AppState<D>,
    event: PaidEvent,
) -> Result<Json<WebhookResponse>, ErrorReply> {
    let mut invoice = None;
    for key in [&event.invoice_id, &event.invoice_number].into_iter().flatten() {
        invoice = find_invoice(state, key).await.map_err(db_error)?;
        if invoice.is_some() {
            break;
        }
    }
    let Some(invoice) = invoice else {
        warn!(
            gateway = %event.gateway,
            payment_id = %event.gateway_payment_id,
            "Paid event for unknown invoice"
        );
        return Err(error_reply(
            StatusCode::NOT_FOUND,
            "Invoice not found for payment",
        ));
    };

    let confirmation = PaymentConfirmation {
        invoice_id: invoice.id.clone(),
        gateway: event.gateway,
        gateway_payment_id: event.gateway_payment_id,
        amount: event.amount,
        method: event.method,
    };

    let outcome = state
        .db()
        .invoices()
        .apply_payment(&confirmation)
        .await
        .map_err(db_error)?;

    match outcome {
        PaymentOutcome::Applied {
            transaction,
            receipt,
            invoice,
        } => {
            info!(
                invoice = %invoice.invoice_number,
                receipt = %receipt.receipt_number,
                amount = transaction.amount,
                balance_due = invoice.balance_due,
                "Payment applied"
            );
            Ok(Json(WebhookResponse {
                invoice_id: Some(invoice.id),
                receipt_number: Some(receipt.receipt_number),
                invoice_status: Some(invoice.status.as_str().to_string()),
                balance_due: Some(invoice.balance_due),
                transaction_id: Some(transaction.id),
                ..WebhookResponse::status("ok")
            }))
        }
        PaymentOutcome::Duplicate { transaction_id } => {
            info!(%transaction_id, "Duplicate payment delivery acknowledged");
            Ok(Json(WebhookResponse {
                invoice_id: Some(invoice.id),
                transaction_id: Some(transaction_id),
                ..WebhookResponse::status("duplicate")
            }))
        }
    }
}

async fn handle_event<D: Database>(
    state: &AppState<D>,
    event: WebhookEvent,
) -> Result<Json<WebhookResponse>, ErrorReply> {
    match event {
        WebhookEvent::Paid(paid) => apply_paid_event(state, paid).await,
        WebhookEvent::Ignored { event } => {
            info!(%event, "Ignoring webhook event");
            Ok(Json(WebhookResponse {
                event: Some(event),
                ..WebhookResponse::status("ignored")
            }))
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Generate a Razorpay payment link for an invoice
#[utoipa::path(
    post,
    path = "/generate-payment-link",
    tag = "payments",
    request_body = GeneratePaymentLinkRequest,
    responses(
        (status = 200, description = "Link created and stored on the invoice", body = PaymentLinkResponse),
        (status = 400, description = "Invoice already paid", body = ErrorResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse),
        (status = 502, description = "Gateway failure", body = ErrorResponse),
        (status = 503, description = "Gateway not configured", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn generate_payment_link<D: Database>(
    State(state): State<AppState<D>>,
    Json(req): Json<GeneratePaymentLinkRequest>,
) -> Result<Json<PaymentLinkResponse>, ErrorReply> {
    let invoice = find_invoice(&state, &req.invoice_id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| {
            error_reply(
                StatusCode::NOT_FOUND,
                format!("Invoice '{}' not found", req.invoice_id),
            )
        })?;

    if invoice.balance_due <= 0.0 {
        return Err(error_reply(
            StatusCode::BAD_REQUEST,
            format!("Invoice {} has no balance due", invoice.invoice_number),
        ));
    }

    let client = state.razorpay().ok_or_else(|| {
        payment_error(PaymentError::NotConfigured {
            gateway: "Razorpay".to_string(),
        })
    })?;

    let link = client
        .create_payment_link(&PaymentLinkRequest {
            amount: invoice.balance_due,
            invoice_id: invoice.id.clone(),
            invoice_number: invoice.invoice_number.clone(),
            description: req.description,
            customer: req.customer.map(|c| Customer {
                name: c.name,
                email: c.email,
                contact: c.contact,
            }),
        })
        .await
        .map_err(payment_error)?;

    state
        .db()
        .invoices()
        .set_payment_link(&invoice.id, &link.id, &link.short_url)
        .await
        .map_err(db_error)?;
    info!(invoice = %invoice.invoice_number, link_id = %link.id, "Payment link created");

    Ok(Json(PaymentLinkResponse {
        success: true,
        payment_link_id: link.id,
        payment_link_url: link.short_url,
    }))
}

/// Razorpay webhook
///
/// Only `payment_link.paid` is applied; other events are acknowledged and
/// ignored.
#[utoipa::path(
    post,
    path = "/razorpay-webhook",
    tag = "payments",
    request_body(content = String, description = "Raw Razorpay event JSON", content_type = "application/json"),
    responses(
        (status = 200, description = "Event handled", body = WebhookResponse),
        (status = 400, description = "Malformed payload", body = ErrorResponse),
        (status = 401, description = "Bad signature", body = ErrorResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, headers, body))]
pub async fn razorpay_webhook<D: Database>(
    State(state): State<AppState<D>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ErrorReply> {
    if let Some(secret) = &state.integrations().razorpay_webhook_secret {
        let signature = header(&headers, RAZORPAY_SIGNATURE_HEADER);
        verify_razorpay_signature(secret, &body, signature).map_err(|e| {
            warn!("Rejected Razorpay webhook with bad signature");
            payment_error(e)
        })?;
    }

    let event = parse_razorpay_webhook(&body).map_err(payment_error)?;
    handle_event(&state, event).await
}

/// Cashfree webhook
///
/// Only `PAYMENT_SUCCESS_WEBHOOK` is applied.
#[utoipa::path(
    post,
    path = "/cashfree-webhook",
    tag = "payments",
    request_body(content = String, description = "Raw Cashfree event JSON", content_type = "application/json"),
    responses(
        (status = 200, description = "Event handled", body = WebhookResponse),
        (status = 400, description = "Malformed payload", body = ErrorResponse),
        (status = 401, description = "Bad signature", body = ErrorResponse),
        (status = 404, description = "Invoice not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, headers, body))]
pub async fn cashfree_webhook<D: Database>(
    State(state): State<AppState<D>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ErrorReply> {
    if let Some(secret) = &state.integrations().cashfree_webhook_secret {
        let signature = header(&headers, CASHFREE_SIGNATURE_HEADER);
        let timestamp = header(&headers, CASHFREE_TIMESTAMP_HEADER);
        verify_cashfree_signature(secret, timestamp, &body, signature).map_err(|e| {
            warn!("Rejected Cashfree webhook with bad signature");
            payment_error(e)
        })?;
    }

    let event = parse_cashfree_webhook(&body).map_err(payment_error)?;
    handle_event(&state, event).await
}
