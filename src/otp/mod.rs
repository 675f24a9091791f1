//! Mobile OTP login.
//!
//! `send` issues a 4-digit code valid for five minutes and hands it to the
//! delivery webhook. `verify` checks the newest pending code; five wrong
//! guesses lock it. A successful check yields a 24-hour session descriptor.

mod delivery;
mod error;

#[cfg(test)]
mod mod_test;

use std::sync::Arc;

use chrono::Duration;
use rand::Rng;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::db::{
    AdminUser, AdminUserRepository, Database, OtpRepository, OtpVerification,
    utils::{current_timestamp, timestamp_after},
};

pub use delivery::OtpDelivery;
pub use error::{OtpError, OtpResult};

/// Minutes a code stays valid.
pub const OTP_TTL_MINUTES: i64 = 5;

/// Wrong guesses allowed before a code is locked.
pub const MAX_ATTEMPTS: i64 = 5;

pub const SESSION_TTL_HOURS: i64 = 24;

/// Generate a 4-digit code, zero padded.
pub fn generate_code() -> String {
    format!("{:04}", rand::thread_rng().gen_range(0..10_000))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssuedOtp {
    pub mobile: String,
    pub expires_at: String,
}

/// Login session handed back after a successful verification.
///
/// Not signed: callers treat it as a descriptor, not a credential.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub mobile: String,
    pub issued_at: String,
    pub expires_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifiedLogin {
    pub user: AdminUser,
    pub session: Session,
}

pub struct OtpService<D: Database> {
    db: Arc<D>,
    delivery: OtpDelivery,
}

impl<D: Database> Clone for OtpService<D> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            delivery: self.delivery.clone(),
        }
    }
}

impl<D: Database> OtpService<D> {
    pub fn new(db: Arc<D>, delivery: OtpDelivery) -> Self {
        Self { db, delivery }
    }

    /// Issue a code for an admin user's mobile and deliver it.
    ///
    /// Delivery failures are logged; the code stays valid either way.
    #[instrument(skip(self))]
    pub async fn send(&self, mobile: &str) -> OtpResult<IssuedOtp> {
        let mobile = mobile.trim();
        if self.db.admin_users().get_by_mobile(mobile).await?.is_none() {
            return Err(OtpError::UnknownMobile {
                mobile: mobile.to_string(),
            });
        }

        let code = generate_code();
        let otp = self
            .db
            .otps()
            .create(&OtpVerification {
                id: String::new(),
                mobile: mobile.to_string(),
                otp: code.clone(),
                expires_at: timestamp_after(Duration::minutes(OTP_TTL_MINUTES)),
                verified: false,
                attempts: 0,
                created_at: String::new(),
            })
            .await?;

        if let Err(e) = self.delivery.deliver(mobile, &code).await {
            warn!(mobile, error = %e, "OTP delivery failed");
        }
        info!(mobile, expires_at = %otp.expires_at, "OTP issued");

        Ok(IssuedOtp {
            mobile: otp.mobile,
            expires_at: otp.expires_at,
        })
    }

    /// Check a code against the newest pending one for `mobile`.
    #[instrument(skip(self, code))]
    pub async fn verify(&self, mobile: &str, code: &str) -> OtpResult<VerifiedLogin> {
        let mobile = mobile.trim();
        let Some(otp) = self.db.otps().latest_pending(mobile).await? else {
            return Err(OtpError::NotRequested);
        };

        let now = current_timestamp();
        if otp.expires_at <= now {
            return Err(OtpError::Expired);
        }
        if otp.attempts >= MAX_ATTEMPTS {
            warn!(mobile, "OTP locked after too many attempts");
            return Err(OtpError::TooManyAttempts);
        }
        if otp.otp != code.trim() {
            let attempts = self.db.otps().record_failed_attempt(&otp.id).await?;
            warn!(mobile, attempts, "Invalid OTP");
            return Err(OtpError::Invalid);
        }

        self.db.otps().mark_verified(&otp.id).await?;
        let user = self
            .db
            .admin_users()
            .get_by_mobile(mobile)
            .await?
            .ok_or_else(|| OtpError::UnknownMobile {
                mobile: mobile.to_string(),
            })?;
        info!(mobile, user_id = %user.id, "OTP verified");

        Ok(VerifiedLogin {
            user,
            session: Session {
                mobile: mobile.to_string(),
                issued_at: now,
                expires_at: timestamp_after(Duration::hours(SESSION_TTL_HOURS)),
            },
        })
    }
}
