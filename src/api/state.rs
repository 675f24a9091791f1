//! Application state for the API server.

use std::sync::Arc;

use reqwest::Client;

use super::IntegrationConfig;
use crate::db::Database;
use crate::otp::{OtpDelivery, OtpService};
use crate::payments::RazorpayClient;

/// Shared application state.
///
/// Generic over `D: Database`; the binary picks the storage backend.
pub struct AppState<D: Database> {
    db: Arc<D>,
    integrations: Arc<IntegrationConfig>,
    http: Client,
}

// Manual Clone impl - only the Arcs are cloned, D need not be Clone
impl<D: Database> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            integrations: Arc::clone(&self.integrations),
            http: self.http.clone(),
        }
    }
}

impl<D: Database> AppState<D> {
    pub fn new(db: D, integrations: IntegrationConfig) -> Self {
        Self {
            db: Arc::new(db),
            integrations: Arc::new(integrations),
            http: Client::new(),
        }
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &D {
        &self.db
    }

    /// Get a cloned Arc to the database.
    pub fn db_arc(&self) -> Arc<D> {
        Arc::clone(&self.db)
    }

    pub fn integrations(&self) -> &IntegrationConfig {
        &self.integrations
    }

    /// Razorpay client, if key id and secret are both configured.
    pub fn razorpay(&self) -> Option<RazorpayClient> {
        let config = &self.integrations;
        match (&config.razorpay_key_id, &config.razorpay_key_secret) {
            (Some(key_id), Some(key_secret)) => Some(RazorpayClient::new(
                self.http.clone(),
                config.razorpay_api_url.clone(),
                key_id.clone(),
                key_secret.clone(),
            )),
            _ => None,
        }
    }

    pub fn otp(&self) -> OtpService<D> {
        OtpService::new(
            self.db_arc(),
            OtpDelivery::new(self.http.clone(), self.integrations.otp_webhook_url.clone()),
        )
    }
}
