//! SQLite InvoiceRepository implementation, including payment application.

use std::str::FromStr;

use sqlx::{Row, SqliteConnection, SqlitePool};

use super::helpers::next_human_id;
use crate::db::utils::{current_timestamp, generate_entity_id, round_currency};
use crate::db::{
    DbError, DbResult, Invoice, InvoiceRepository, InvoiceStatus, PaymentConfirmation,
    PaymentGateway, PaymentOutcome, PaymentTransaction, Receipt,
};

const COLUMNS: &str = "id, invoice_number, contact_id, total_amount, paid_amount, balance_due, status, payment_link_id, payment_link_url, created_at, updated_at";

/// Status stored on transactions created from gateway confirmations.
const CAPTURED: &str = "captured";

pub struct SqliteInvoiceRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
}

/// Derive `(balance_due, status)` from the invoice totals.
pub(crate) fn settle(total_amount: f64, paid_amount: f64) -> (f64, InvoiceStatus) {
    let balance = round_currency((total_amount - paid_amount).max(0.0));
    let status = if balance <= 0.0 {
        InvoiceStatus::Paid
    } else if paid_amount > 0.0 {
        InvoiceStatus::PartiallyPaid
    } else {
        InvoiceStatus::Unpaid
    };
    (balance, status)
}

async fn fetch_invoice(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Invoice>> {
    let sql = format!("SELECT {} FROM invoices WHERE id = ?", COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;
    Ok(row.map(|r| row_to_invoice(&r)))
}

async fn find_transaction(
    conn: &mut SqliteConnection,
    gateway_payment_id: &str,
) -> DbResult<Option<String>> {
    let id = sqlx::query_scalar("SELECT id FROM payment_transactions WHERE gateway_payment_id = ?")
        .bind(gateway_payment_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(id)
}

impl<'a> InvoiceRepository for SqliteInvoiceRepository<'a> {
    async fn create(&self, invoice: &Invoice) -> DbResult<Invoice> {
        if invoice.invoice_number.trim().is_empty() {
            return Err(DbError::validation("invoice_number cannot be empty"));
        }
        if invoice.total_amount <= 0.0 {
            return Err(DbError::validation("total_amount must be greater than 0"));
        }

        let id = if invoice.id.is_empty() {
            generate_entity_id()
        } else {
            invoice.id.clone()
        };
        let now = current_timestamp();
        let total_amount = round_currency(invoice.total_amount);
        let paid_amount = round_currency(invoice.paid_amount);
        let (balance_due, status) = settle(total_amount, paid_amount);

        sqlx::query(
            r#"
            INSERT INTO invoices (id, invoice_number, contact_id, total_amount, paid_amount, balance_due, status, payment_link_id, payment_link_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.contact_id)
        .bind(total_amount)
        .bind(paid_amount)
        .bind(balance_due)
        .bind(status.as_str())
        .bind(&invoice.payment_link_id)
        .bind(&invoice.payment_link_url)
        .bind(&now)
        .bind(&now)
        .execute(self.pool)
        .await?;

        Ok(Invoice {
            id,
            total_amount,
            paid_amount,
            balance_due,
            status,
            created_at: now.clone(),
            updated_at: now,
            ..invoice.clone()
        })
    }

    async fn get(&self, id: &str) -> DbResult<Invoice> {
        let mut conn = self.pool.acquire().await?;
        fetch_invoice(&mut *conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))
    }

    async fn get_by_number(&self, invoice_number: &str) -> DbResult<Option<Invoice>> {
        let sql = format!("SELECT {} FROM invoices WHERE invoice_number = ?", COLUMNS);
        let row = sqlx::query(&sql)
            .bind(invoice_number)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(|r| row_to_invoice(&r)))
    }

    async fn set_payment_link(&self, id: &str, link_id: &str, link_url: &str) -> DbResult<Invoice> {
        let result = sqlx::query(
            "UPDATE invoices SET payment_link_id = ?, payment_link_url = ?, updated_at = ? WHERE id = ?",
        )
        .bind(link_id)
        .bind(link_url)
        .bind(current_timestamp())
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        self.get(id).await
    }

    async fn apply_payment(&self, payment: &PaymentConfirmation) -> DbResult<PaymentOutcome> {
        if !payment.amount.is_finite() || payment.amount <= 0.0 {
            return Err(DbError::validation("payment amount must be greater than 0"));
        }
        if payment.gateway_payment_id.trim().is_empty() {
            return Err(DbError::validation("gateway_payment_id cannot be empty"));
        }

        let mut tx = self.pool.begin().await?;

        // Write first so the transaction holds the write lock before any read.
        // A read-then-write upgrade fails with SQLITE_BUSY instead of waiting.
        sqlx::query("UPDATE invoices SET updated_at = updated_at WHERE id = ?")
            .bind(&payment.invoice_id)
            .execute(&mut *tx)
            .await?;

        if let Some(transaction_id) =
            find_transaction(&mut *tx, &payment.gateway_payment_id).await?
        {
            return Ok(PaymentOutcome::Duplicate { transaction_id });
        }

        let invoice = fetch_invoice(&mut *tx, &payment.invoice_id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", &payment.invoice_id))?;

        let now = current_timestamp();
        let amount = round_currency(payment.amount);

        let transaction = PaymentTransaction {
            id: generate_entity_id(),
            invoice_id: invoice.id.clone(),
            gateway: payment.gateway,
            gateway_payment_id: payment.gateway_payment_id.clone(),
            amount,
            method: payment.method.clone(),
            status: CAPTURED.to_string(),
            created_at: now.clone(),
        };
        let inserted = sqlx::query(
            r#"
            INSERT INTO payment_transactions (id, invoice_id, gateway, gateway_payment_id, amount, method, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.invoice_id)
        .bind(transaction.gateway.as_str())
        .bind(&transaction.gateway_payment_id)
        .bind(transaction.amount)
        .bind(&transaction.method)
        .bind(&transaction.status)
        .bind(&transaction.created_at)
        .execute(&mut *tx)
        .await;
        if let Err(e) = inserted {
            let err = DbError::from(e);
            if !matches!(err, DbError::AlreadyExists { .. }) {
                return Err(err);
            }
            drop(tx);
            let mut conn = self.pool.acquire().await?;
            return match find_transaction(&mut *conn, &payment.gateway_payment_id).await? {
                Some(transaction_id) => Ok(PaymentOutcome::Duplicate { transaction_id }),
                None => Err(err),
            };
        }

        let receipt_number = next_human_id(&mut *tx, "receipts", "receipt_number", "RCPT-", 4).await?;
        let receipt = Receipt {
            id: generate_entity_id(),
            receipt_number,
            invoice_id: invoice.id.clone(),
            transaction_id: transaction.id.clone(),
            amount,
            created_at: now.clone(),
        };
        sqlx::query(
            "INSERT INTO receipts (id, receipt_number, invoice_id, transaction_id, amount, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&receipt.id)
        .bind(&receipt.receipt_number)
        .bind(&receipt.invoice_id)
        .bind(&receipt.transaction_id)
        .bind(receipt.amount)
        .bind(&receipt.created_at)
        .execute(&mut *tx)
        .await?;

        let paid_amount = round_currency(invoice.paid_amount + amount);
        let (balance_due, status) = settle(invoice.total_amount, paid_amount);
        sqlx::query(
            "UPDATE invoices SET paid_amount = ?, balance_due = ?, status = ?, updated_at = ? WHERE id = ?",
        )
        .bind(paid_amount)
        .bind(balance_due)
        .bind(status.as_str())
        .bind(&now)
        .bind(&invoice.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(PaymentOutcome::Applied {
            transaction,
            receipt,
            invoice: Invoice {
                paid_amount,
                balance_due,
                status,
                updated_at: now,
                ..invoice
            },
        })
    }

    async fn list_transactions(&self, invoice_id: &str) -> DbResult<Vec<PaymentTransaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, invoice_id, gateway, gateway_payment_id, amount, method, status, created_at
            FROM payment_transactions WHERE invoice_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| PaymentTransaction {
                id: row.get("id"),
                invoice_id: row.get("invoice_id"),
                gateway: PaymentGateway::from_str(row.get("gateway")).unwrap_or_default(),
                gateway_payment_id: row.get("gateway_payment_id"),
                amount: row.get("amount"),
                method: row.get("method"),
                status: row.get("status"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn list_receipts(&self, invoice_id: &str) -> DbResult<Vec<Receipt>> {
        let rows = sqlx::query(
            r#"
            SELECT id, receipt_number, invoice_id, transaction_id, amount, created_at
            FROM receipts WHERE invoice_id = ?
            ORDER BY receipt_number ASC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Receipt {
                id: row.get("id"),
                receipt_number: row.get("receipt_number"),
                invoice_id: row.get("invoice_id"),
                transaction_id: row.get("transaction_id"),
                amount: row.get("amount"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}

fn row_to_invoice(row: &sqlx::sqlite::SqliteRow) -> Invoice {
    Invoice {
        id: row.get("id"),
        invoice_number: row.get("invoice_number"),
        contact_id: row.get("contact_id"),
        total_amount: row.get("total_amount"),
        paid_amount: row.get("paid_amount"),
        balance_due: row.get("balance_due"),
        status: InvoiceStatus::from_str(row.get("status")).unwrap_or_default(),
        payment_link_id: row.get("payment_link_id"),
        payment_link_url: row.get("payment_link_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
