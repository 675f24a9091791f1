//! OTP delivery over an outbound webhook (an SMS/WhatsApp relay).

use reqwest::Client;
use serde_json::json;
use tracing::{debug, instrument};

use super::error::{OtpError, OtpResult};

#[derive(Clone)]
pub struct OtpDelivery {
    http: Client,
    webhook_url: Option<String>,
}

impl OtpDelivery {
    pub fn new(http: Client, webhook_url: Option<String>) -> Self {
        Self {
            http,
            webhook_url: webhook_url.filter(|u| !u.trim().is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// POST `{mobile, otp}` to the webhook. Without a webhook the code is
    /// only written to the debug log.
    #[instrument(skip(self, otp))]
    pub async fn deliver(&self, mobile: &str, otp: &str) -> OtpResult<()> {
        let Some(url) = &self.webhook_url else {
            debug!(mobile, otp, "No OTP webhook configured");
            return Ok(());
        };

        let response = self
            .http
            .post(url)
            .json(&json!({ "mobile": mobile, "otp": otp }))
            .send()
            .await
            .map_err(|e| OtpError::Delivery {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(OtpError::Delivery {
                message: format!("webhook returned {}", response.status()),
            });
        }
        Ok(())
    }
}
