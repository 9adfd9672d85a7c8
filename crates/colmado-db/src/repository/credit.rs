//! # Credit Account Repository
//!
//! Read-side access to credit accounts (receivables).
//!
//! Accounts are created and deleted by the engine (credit settlement /
//! cancellation); these reads feed the `/credit` listing and external
//! aging views.

use sqlx::SqlitePool;

use crate::error::DbResult;
use colmado_core::{CreditAccount, CreditStatus};

/// Columns selected for every credit account read.
pub(crate) const CREDIT_COLUMNS: &str = "id, company_id, sale_id, customer_id, customer_name, \
     total_cents, paid_cents, balance_cents, due_date, status, created_at, updated_at";

/// Repository for credit account reads.
#[derive(Debug, Clone)]
pub struct CreditRepository {
    pool: SqlitePool,
}

impl CreditRepository {
    /// Creates a new CreditRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CreditRepository { pool }
    }

    /// Gets the credit account opened by a sale, if any.
    pub async fn get_by_sale(
        &self,
        company_id: &str,
        sale_id: &str,
    ) -> DbResult<Option<CreditAccount>> {
        let sql = format!(
            "SELECT {CREDIT_COLUMNS} FROM credit_accounts WHERE company_id = ?1 AND sale_id = ?2"
        );
        let account = sqlx::query_as::<_, CreditAccount>(&sql)
            .bind(company_id)
            .bind(sale_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Lists credit accounts for a company, optionally filtered by status,
    /// largest balance first.
    pub async fn list(
        &self,
        company_id: &str,
        status: Option<CreditStatus>,
        limit: i64,
    ) -> DbResult<Vec<CreditAccount>> {
        let sql = format!(
            "SELECT {CREDIT_COLUMNS} FROM credit_accounts \
             WHERE company_id = ?1 AND (?2 IS NULL OR status = ?2) \
             ORDER BY balance_cents DESC LIMIT ?3"
        );
        let accounts = sqlx::query_as::<_, CreditAccount>(&sql)
            .bind(company_id)
            .bind(status)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(accounts)
    }
}
