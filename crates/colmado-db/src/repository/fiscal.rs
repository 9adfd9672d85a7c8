//! # Fiscal Sequence Repository
//!
//! Fiscal sequence configuration and atomic NCF issuance.
//!
//! ## Why One Statement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TWO CONCURRENT SETTLEMENTS REQUEST doc_type B02                        │
//! │                                                                         │
//! │  read-then-write (WRONG):                                              │
//! │    A reads current=7        B reads current=7                          │
//! │    A writes 8               B writes 8      → duplicate NCF! ❌        │
//! │                                                                         │
//! │  increment-and-return (THIS MODULE):                                   │
//! │    A: UPDATE ... RETURNING → 8                                         │
//! │    B: UPDATE ... RETURNING → 9              → unique, gapless ✅       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guard (`active = 1`, not exhausted) lives in the same statement, so
//! there is no window where an inactive or exhausted sequence can issue.
//! An issued number is never reused, even if the owning sale is later
//! cancelled or refunded.

use chrono::Utc;
use serde::Serialize;
use sqlx::{Sqlite, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::error::{DbResult, EngineResult};
use colmado_core::{format_ncf, CoreError, FiscalSequence};

/// Result of issuing one fiscal document number.
#[derive(Debug, Clone, Serialize)]
pub struct NcfIssued {
    pub sequence_id: String,
    /// Full document code, e.g. "B0200000008".
    pub ncf: String,
    /// The raw counter value behind the code.
    pub current_number: i64,
}

/// Issues the next NCF for (company, doc_type) on the given executor.
///
/// A single `UPDATE ... RETURNING` statement both advances the counter and
/// reads the new value; callable standalone (own connection) or from inside
/// a settlement's write transaction.
pub async fn issue_ncf<'e, E>(executor: E, company_id: &str, doc_type: &str) -> EngineResult<NcfIssued>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let now = Utc::now();

    let row: Option<(String, i64)> = sqlx::query_as(
        r#"
        UPDATE fiscal_sequences
        SET current_number = current_number + 1,
            updated_at = ?3
        WHERE company_id = ?1
          AND doc_type = ?2
          AND active = 1
          AND (max_number IS NULL OR current_number < max_number)
        RETURNING id, current_number
        "#,
    )
    .bind(company_id)
    .bind(doc_type)
    .bind(now)
    .fetch_optional(executor)
    .await?;

    let Some((sequence_id, current_number)) = row else {
        // Not configured, inactive, or exhausted - all the same to the caller
        return Err(CoreError::NcfSequenceUnavailable {
            doc_type: doc_type.to_string(),
        }
        .into());
    };

    Ok(NcfIssued {
        sequence_id,
        ncf: format_ncf(doc_type, current_number),
        current_number,
    })
}

/// Repository for fiscal sequence operations.
#[derive(Debug, Clone)]
pub struct FiscalRepository {
    pool: SqlitePool,
}

impl FiscalRepository {
    /// Creates a new FiscalRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FiscalRepository { pool }
    }

    /// Issues the next NCF for a doc type.
    ///
    /// The statement is atomic on its own; no surrounding transaction is
    /// needed for the standalone endpoint.
    pub async fn next_ncf(&self, company_id: &str, doc_type: &str) -> EngineResult<NcfIssued> {
        let issued = issue_ncf(&self.pool, company_id, doc_type).await?;

        info!(
            company_id = %company_id,
            doc_type = %doc_type,
            ncf = %issued.ncf,
            "NCF issued"
        );

        Ok(issued)
    }

    /// Configures a fiscal sequence for a doc type.
    ///
    /// One row per (company, doc_type); a duplicate insert surfaces as a
    /// unique violation.
    pub async fn create_sequence(
        &self,
        company_id: &str,
        doc_type: &str,
        max_number: Option<i64>,
    ) -> DbResult<FiscalSequence> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO fiscal_sequences (id, company_id, doc_type, current_number, max_number, active, updated_at)
            VALUES (?1, ?2, ?3, 0, ?4, 1, ?5)
            "#,
        )
        .bind(&id)
        .bind(company_id)
        .bind(doc_type)
        .bind(max_number)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(company_id = %company_id, doc_type = %doc_type, "Fiscal sequence configured");

        Ok(FiscalSequence {
            id,
            company_id: company_id.to_string(),
            doc_type: doc_type.to_string(),
            current_number: 0,
            max_number,
            active: true,
            updated_at: now,
        })
    }

    /// Gets the sequence row for a doc type.
    pub async fn get_sequence(
        &self,
        company_id: &str,
        doc_type: &str,
    ) -> DbResult<Option<FiscalSequence>> {
        let seq = sqlx::query_as::<_, FiscalSequence>(
            "SELECT id, company_id, doc_type, current_number, max_number, active, updated_at \
             FROM fiscal_sequences WHERE company_id = ?1 AND doc_type = ?2",
        )
        .bind(company_id)
        .bind(doc_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(seq)
    }
}
