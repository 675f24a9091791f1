use miette::Diagnostic;
use thiserror::Error;

/// Errors from payment gateways and webhook handling.
#[derive(Error, Diagnostic, Debug)]
pub enum PaymentError {
    #[error("{gateway} is not configured")]
    #[diagnostic(
        code(crmhub::payments::not_configured),
        help("Set --razorpay-key-id and --razorpay-key-secret (or CRMHUB_RAZORPAY_KEY_ID / CRMHUB_RAZORPAY_KEY_SECRET).")
    )]
    NotConfigured { gateway: String },

    #[error("Failed to reach {gateway}")]
    #[diagnostic(code(crmhub::payments::request_failed))]
    Request {
        gateway: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{gateway} rejected the request ({status}): {message}")]
    #[diagnostic(code(crmhub::payments::gateway_error))]
    Gateway {
        gateway: String,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {gateway}: {message}")]
    #[diagnostic(code(crmhub::payments::invalid_response))]
    InvalidResponse { gateway: String, message: String },

    #[error("Invalid webhook signature")]
    #[diagnostic(code(crmhub::payments::invalid_signature))]
    InvalidSignature,

    #[error("Invalid webhook payload: {message}")]
    #[diagnostic(code(crmhub::payments::invalid_payload))]
    InvalidPayload { message: String },
}

pub type PaymentResult<T> = Result<T, PaymentError>;
