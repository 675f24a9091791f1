//! Razorpay Payment Links client.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument, warn};

use super::error::{PaymentError, PaymentResult};

const GATEWAY: &str = "Razorpay";

/// Production API base URL.
pub const DEFAULT_API_URL: &str = "https://api.razorpay.com";

/// Convert rupees to paise, the unit Razorpay amounts are expressed in.
pub fn to_paise(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Customer details printed on the payment link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PaymentLinkRequest {
    /// Amount in rupees.
    pub amount: f64,
    pub invoice_id: String,
    pub invoice_number: String,
    pub description: Option<String>,
    pub customer: Option<Customer>,
}

/// A payment link created by Razorpay.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentLink {
    pub id: String,
    pub short_url: String,
}

#[derive(Deserialize)]
struct RazorpayErrorBody {
    error: RazorpayErrorDetail,
}

#[derive(Deserialize)]
struct RazorpayErrorDetail {
    description: String,
}

#[derive(Clone)]
pub struct RazorpayClient {
    http: Client,
    api_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayClient {
    pub fn new(
        http: Client,
        api_url: impl Into<String>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Create a payment link for an invoice.
    ///
    /// The invoice number becomes `reference_id` and the invoice id is kept in
    /// `notes.invoice_id`, so the `payment_link.paid` webhook can be matched
    /// back to the invoice.
    #[instrument(skip(self, request), fields(invoice = %request.invoice_number))]
    pub async fn create_payment_link(
        &self,
        request: &PaymentLinkRequest,
    ) -> PaymentResult<PaymentLink> {
        let description = request
            .description
            .clone()
            .unwrap_or_else(|| format!("Payment for invoice {}", request.invoice_number));

        let mut body = json!({
            "amount": to_paise(request.amount),
            "currency": "INR",
            "accept_partial": false,
            "reference_id": request.invoice_number,
            "description": description,
            "notes": { "invoice_id": request.invoice_id },
        });
        if let Some(customer) = &request.customer {
            body["customer"] = json!(customer);
            body["notify"] = json!({
                "sms": customer.contact.is_some(),
                "email": customer.email.is_some(),
            });
        }

        let url = format!("{}/v1/payment_links", self.api_url);
        debug!(%url, "Creating payment link");

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|source| PaymentError::Request {
                gateway: GATEWAY.to_string(),
                source,
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| PaymentError::Request {
                gateway: GATEWAY.to_string(),
                source,
            })?;

        if !status.is_success() {
            let message = serde_json::from_str::<RazorpayErrorBody>(&text)
                .map(|e| e.error.description)
                .unwrap_or(text);
            warn!(status = status.as_u16(), %message, "Payment link creation failed");
            return Err(PaymentError::Gateway {
                gateway: GATEWAY.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| PaymentError::InvalidResponse {
            gateway: GATEWAY.to_string(),
            message: e.to_string(),
        })
    }
}
