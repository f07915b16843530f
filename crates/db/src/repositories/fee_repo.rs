//! Repository for the `fees` table.

use hms_core::fees::{new_fee_content, new_fee_title, FEE_STATUS_PAID};
use hms_core::notifications::FEE_NOTIFICATION_TYPE_PAYMENT;
use hms_core::types::DbId;
use sqlx::PgPool;

use crate::models::fee::{CreateFee, Fee};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, student_id, description, amount, status, due_date, payment_date, created_at";

/// Provides CRUD operations for fees.
pub struct FeeRepo;

impl FeeRepo {
    /// Assign one fee per entry of `inputs`, each with its "New Fee"
    /// notification, in a single transaction. Either every fee is created
    /// or none is.
    pub async fn assign(pool: &PgPool, inputs: &[CreateFee]) -> Result<Vec<Fee>, sqlx::Error> {
        let fee_query = format!(
            "INSERT INTO fees (student_id, description, amount, due_date)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let mut tx = pool.begin().await?;
        let mut fees = Vec::with_capacity(inputs.len());
        for input in inputs {
            let fee = sqlx::query_as::<_, Fee>(&fee_query)
                .bind(input.student_id)
                .bind(&input.description)
                .bind(input.amount)
                .bind(input.due_date)
                .fetch_one(&mut *tx)
                .await?;

            sqlx::query(
                "INSERT INTO fee_notifications (student_id, title, content, notification_type)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(input.student_id)
            .bind(new_fee_title(&input.description))
            .bind(new_fee_content(&input.description, input.amount, input.due_date))
            .bind(FEE_NOTIFICATION_TYPE_PAYMENT)
            .execute(&mut *tx)
            .await?;

            fees.push(fee);
        }
        tx.commit().await?;
        Ok(fees)
    }

    /// Find a fee by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Fee>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM fees WHERE id = $1");
        sqlx::query_as::<_, Fee>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List fees, earliest due first. `student_id = None` lists everyone's.
    pub async fn list(pool: &PgPool, student_id: Option<DbId>) -> Result<Vec<Fee>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM fees
             WHERE ($1::BIGINT IS NULL OR student_id = $1)
             ORDER BY due_date ASC NULLS LAST, id ASC"
        );
        sqlx::query_as::<_, Fee>(&query)
            .bind(student_id)
            .fetch_all(pool)
            .await
    }

    /// Mark a fee paid, stamping the payment date.
    ///
    /// Returns `None` when the fee is missing or already paid, so two
    /// concurrent payments settle the fee exactly once.
    pub async fn mark_paid(pool: &PgPool, id: DbId) -> Result<Option<Fee>, sqlx::Error> {
        let query = format!(
            "UPDATE fees SET status = $2, payment_date = NOW()
             WHERE id = $1 AND status <> $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Fee>(&query)
            .bind(id)
            .bind(FEE_STATUS_PAID)
            .fetch_optional(pool)
            .await
    }
}
