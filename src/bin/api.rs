//! CRM hub API server binary.
//!
//! This binary creates the concrete database implementation and passes it
//! to the API server. The API layer remains agnostic of the storage backend.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use crmhub::api::{self, ApiError, Config, IntegrationConfig};
use crmhub::db::{Database, DbError, SqliteDatabase};
use crmhub::payments::DEFAULT_API_URL;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
enum BinaryError {
    #[error("Database error: {0}")]
    #[diagnostic(code(crmhub::binary::database))]
    Database(#[from] DbError),

    #[error("Failed to create data directory: {0}")]
    #[diagnostic(code(crmhub::binary::io))]
    Io(#[from] std::io::Error),

    #[error("API server error: {0}")]
    #[diagnostic(code(crmhub::binary::api))]
    Api(#[from] ApiError),
}

#[derive(Parser)]
#[command(name = "crmhub-api")]
#[command(author, version, about = "CRM hub API and MCP server", long_about = None)]
struct Cli {
    /// Host address to bind to
    #[arg(long, env = "CRMHUB_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "CRMHUB_PORT", default_value = "3000")]
    port: u16,

    /// Database file path
    #[arg(long, env = "CRMHUB_DB", default_value = "crmhub.db")]
    db: PathBuf,

    /// Razorpay API key id (enables payment links)
    #[arg(long, env = "CRMHUB_RAZORPAY_KEY_ID")]
    razorpay_key_id: Option<String>,

    /// Razorpay API key secret
    #[arg(long, env = "CRMHUB_RAZORPAY_KEY_SECRET", hide_env_values = true)]
    razorpay_key_secret: Option<String>,

    /// Secret for verifying Razorpay webhook signatures
    #[arg(long, env = "CRMHUB_RAZORPAY_WEBHOOK_SECRET", hide_env_values = true)]
    razorpay_webhook_secret: Option<String>,

    /// Razorpay API base URL
    #[arg(long, env = "CRMHUB_RAZORPAY_API_URL", default_value = DEFAULT_API_URL)]
    razorpay_api_url: String,

    /// Secret for verifying Cashfree webhook signatures
    #[arg(long, env = "CRMHUB_CASHFREE_WEBHOOK_SECRET", hide_env_values = true)]
    cashfree_webhook_secret: Option<String>,

    /// URL that receives `{mobile, otp}` for SMS/WhatsApp delivery
    #[arg(long, env = "CRMHUB_OTP_WEBHOOK_URL")]
    otp_webhook_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), BinaryError> {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let cli = Cli::parse();

    println!("Opening database at {:?}", cli.db);

    // Ensure parent directory exists
    if let Some(parent) = cli.db.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let db = SqliteDatabase::open(&cli.db).await?;

    // Run migrations before starting the server
    db.migrate().await?;
    println!("Database migrations complete");

    let integrations = IntegrationConfig {
        razorpay_key_id: cli.razorpay_key_id,
        razorpay_key_secret: cli.razorpay_key_secret,
        razorpay_webhook_secret: cli.razorpay_webhook_secret,
        razorpay_api_url: cli.razorpay_api_url,
        cashfree_webhook_secret: cli.cashfree_webhook_secret,
        otp_webhook_url: cli.otp_webhook_url,
    };

    // Pass the abstract Database to the API layer
    api::run(
        Config {
            host: cli.host,
            port: cli.port,
        },
        integrations,
        db,
    )
    .await?;

    Ok(())
}
