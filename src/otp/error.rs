use miette::Diagnostic;
use thiserror::Error;

use crate::db::DbError;

/// Errors from the OTP login flow.
#[derive(Error, Diagnostic, Debug)]
pub enum OtpError {
    #[error("No admin user with mobile {mobile}")]
    #[diagnostic(code(crmhub::otp::unknown_mobile))]
    UnknownMobile { mobile: String },

    #[error("No OTP requested")]
    #[diagnostic(
        code(crmhub::otp::not_requested),
        help("Call /send-otp before verifying.")
    )]
    NotRequested,

    #[error("OTP expired")]
    #[diagnostic(code(crmhub::otp::expired), help("Request a new code."))]
    Expired,

    #[error("Too many failed attempts")]
    #[diagnostic(code(crmhub::otp::locked), help("Request a new code."))]
    TooManyAttempts,

    #[error("Invalid OTP")]
    #[diagnostic(code(crmhub::otp::invalid))]
    Invalid,

    #[error("OTP delivery failed: {message}")]
    #[diagnostic(code(crmhub::otp::delivery_failed))]
    Delivery { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DbError),
}

pub type OtpResult<T> = Result<T, OtpError>;
