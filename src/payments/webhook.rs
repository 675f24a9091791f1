//! Gateway webhook payloads.
//!
//! Both gateways are reduced to a [`WebhookEvent`]: either a confirmed
//! payment to apply, or an event this backend does not act on.

use serde::Deserialize;
use serde_json::Value;

use crate::db::PaymentGateway;

use super::error::{PaymentError, PaymentResult};

pub const RAZORPAY_PAID_EVENT: &str = "payment_link.paid";
pub const CASHFREE_PAID_EVENT: &str = "PAYMENT_SUCCESS_WEBHOOK";

/// A confirmed payment, not yet matched to an invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct PaidEvent {
    pub gateway: PaymentGateway,
    /// Invoice id carried in the gateway notes/tags, if any.
    pub invoice_id: Option<String>,
    /// Invoice number used as the gateway reference, if any.
    pub invoice_number: Option<String>,
    pub gateway_payment_id: String,
    /// Amount in rupees.
    pub amount: f64,
    pub method: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    Paid(PaidEvent),
    Ignored { event: String },
}

fn invalid(e: impl ToString) -> PaymentError {
    PaymentError::InvalidPayload {
        message: e.to_string(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// =============================================================================
// Razorpay
// =============================================================================

#[derive(Deserialize)]
struct RazorpayEnvelope {
    event: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Deserialize)]
struct RazorpayPaidPayload {
    payment_link: RazorpayEntity<RazorpayPaymentLink>,
    payment: RazorpayEntity<RazorpayPayment>,
}

#[derive(Deserialize)]
struct RazorpayEntity<T> {
    entity: T,
}

#[derive(Deserialize)]
struct RazorpayPaymentLink {
    reference_id: Option<String>,
    #[serde(default)]
    notes: Value,
}

#[derive(Deserialize)]
struct RazorpayPayment {
    id: String,
    /// Paise.
    amount: i64,
    method: Option<String>,
}

pub fn parse_razorpay_webhook(body: &[u8]) -> PaymentResult<WebhookEvent> {
    let envelope: RazorpayEnvelope = serde_json::from_slice(body).map_err(invalid)?;
    if envelope.event != RAZORPAY_PAID_EVENT {
        return Ok(WebhookEvent::Ignored {
            event: envelope.event,
        });
    }

    let payload: RazorpayPaidPayload =
        serde_json::from_value(envelope.payload).map_err(invalid)?;
    let link = payload.payment_link.entity;
    let payment = payload.payment.entity;

    Ok(WebhookEvent::Paid(PaidEvent {
        gateway: PaymentGateway::Razorpay,
        invoice_id: non_empty(
            link.notes
                .get("invoice_id")
                .and_then(Value::as_str)
                .map(str::to_string),
        ),
        invoice_number: non_empty(link.reference_id),
        gateway_payment_id: payment.id,
        amount: payment.amount as f64 / 100.0,
        method: payment.method,
    }))
}

// =============================================================================
// Cashfree
// =============================================================================

#[derive(Deserialize)]
struct CashfreeEnvelope {
    #[serde(rename = "type")]
    event: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct CashfreePaidData {
    order: CashfreeOrder,
    payment: CashfreePayment,
}

#[derive(Deserialize)]
struct CashfreeOrder {
    order_id: Option<String>,
    #[serde(default)]
    order_tags: Value,
}

#[derive(Deserialize)]
struct CashfreePayment {
    /// Sent as a number; older payloads use a string.
    cf_payment_id: Value,
    payment_amount: f64,
    payment_group: Option<String>,
}

pub fn parse_cashfree_webhook(body: &[u8]) -> PaymentResult<WebhookEvent> {
    let envelope: CashfreeEnvelope = serde_json::from_slice(body).map_err(invalid)?;
    if envelope.event != CASHFREE_PAID_EVENT {
        return Ok(WebhookEvent::Ignored {
            event: envelope.event,
        });
    }

    let data: CashfreePaidData = serde_json::from_value(envelope.data).map_err(invalid)?;
    let gateway_payment_id = match &data.payment.cf_payment_id {
        Value::String(id) => id.clone(),
        Value::Number(id) => id.to_string(),
        _ => return Err(invalid("missing cf_payment_id")),
    };

    Ok(WebhookEvent::Paid(PaidEvent {
        gateway: PaymentGateway::Cashfree,
        invoice_id: non_empty(
            data.order
                .order_tags
                .get("invoice_id")
                .and_then(Value::as_str)
                .map(str::to_string),
        ),
        invoice_number: non_empty(data.order.order_id),
        gateway_payment_id,
        amount: data.payment.payment_amount,
        method: data.payment.payment_group,
    }))
}
