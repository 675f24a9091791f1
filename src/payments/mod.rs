//! Payment gateway integration.
//!
//! - **razorpay**: Payment Links API client
//! - **signature**: webhook signature checks for Razorpay and Cashfree
//! - **webhook**: gateway-neutral parsing of "payment succeeded" deliveries

mod error;
mod razorpay;
mod signature;
mod webhook;


pub use error::{PaymentError, PaymentResult};
pub use razorpay::{
    Customer, DEFAULT_API_URL, PaymentLink, PaymentLinkRequest, RazorpayClient, to_paise,
};
pub use signature::{
    cashfree_signature, razorpay_signature, verify_cashfree_signature, verify_razorpay_signature,
};
pub use webhook::{PaidEvent, WebhookEvent, parse_cashfree_webhook, parse_razorpay_webhook};
