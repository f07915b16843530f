//! Handlers for fees: listing, single and bulk assignment, and payment.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use hms_core::error::CoreError;
use hms_core::fees::{effective_status, ensure_payable, validate_amount};
use hms_core::profile::parse_date;
use hms_core::types::{DbId, Timestamp};
use hms_db::models::fee::{CreateFee, Fee};
use hms_db::repositories::{FeeRepo, StudentRepo};
use hms_events::bus::EVENT_FEE_ASSIGNED;
use hms_events::HostelEvent;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{current_student, required_text, today};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /fees`.
#[derive(Debug, Deserialize)]
pub struct CreateFeeRequest {
    pub student_id: DbId,
    pub description: String,
    pub amount: f64,
    /// `YYYY-MM-DD`; blank means no due date.
    pub due_date: Option<String>,
}

/// Request body for `POST /admin/fees`.
#[derive(Debug, Deserialize)]
pub struct BulkFeeRequest {
    pub student_ids: Vec<DbId>,
    pub description: String,
    pub amount: f64,
    pub due_date: Option<String>,
}

/// A fee as shown to clients, with `Overdue` derived from the due date.
#[derive(Debug, Serialize)]
pub struct FeeResponse {
    pub id: DbId,
    pub student_id: DbId,
    pub description: String,
    pub amount: f64,
    pub status: String,
    pub due_date: Option<NaiveDate>,
    pub payment_date: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl FeeResponse {
    fn new(fee: Fee, today: NaiveDate) -> Self {
        let status = effective_status(&fee.status, fee.due_date, today).to_string();
        Self {
            id: fee.id,
            student_id: fee.student_id,
            description: fee.description,
            amount: fee.amount,
            status,
            due_date: fee.due_date,
            payment_date: fee.payment_date,
            created_at: fee.created_at,
        }
    }
}

/// Response of payment.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub message: String,
    pub fee: FeeResponse,
}

/// Response of bulk assignment.
#[derive(Debug, Serialize)]
pub struct BulkFeeResponse {
    pub message: String,
    pub fees: Vec<FeeResponse>,
    /// Requested ids that matched no student.
    pub skipped_student_ids: Vec<DbId>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/fees
///
/// Admins see every fee; students see their own (empty without a record).
pub async fn list_fees(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<FeeResponse>>> {
    let fees = if auth.is_admin() {
        FeeRepo::list(&state.pool, None).await?
    } else {
        match StudentRepo::find_by_user_id(&state.pool, auth.user_id).await? {
            Some(student) => FeeRepo::list(&state.pool, Some(student.id)).await?,
            None => Vec::new(),
        }
    };

    let today = today();
    Ok(Json(
        fees.into_iter()
            .map(|fee| FeeResponse::new(fee, today))
            .collect(),
    ))
}

/// POST /api/fees
pub async fn create_fee(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateFeeRequest>,
) -> AppResult<(StatusCode, Json<FeeResponse>)> {
    let description = required_text(&input.description, "description")?;
    validate_amount(input.amount)?;
    let due_date = parse_due_date(input.due_date.as_deref())?;

    StudentRepo::find_by_id(&state.pool, input.student_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Student",
            id: input.student_id,
        }))?;

    let inputs = [CreateFee {
        student_id: input.student_id,
        description,
        amount: input.amount,
        due_date,
    }];
    let fee = assign_fees(&state, admin.user_id, &inputs)
        .await?
        .pop()
        .ok_or_else(|| AppError::InternalError("Fee was not created".into()))?;
    Ok((StatusCode::CREATED, Json(FeeResponse::new(fee, today()))))
}

/// POST /api/admin/fees
///
/// Assign the same fee to several students. Unknown student ids are skipped.
pub async fn bulk_assign_fees(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<BulkFeeRequest>,
) -> AppResult<(StatusCode, Json<BulkFeeResponse>)> {
    let description = required_text(&input.description, "description")?;
    validate_amount(input.amount)?;
    let due_date = parse_due_date(input.due_date.as_deref())?;
    if input.student_ids.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "At least one student must be selected".into(),
        )));
    }

    let existing = StudentRepo::existing_ids(&state.pool, &input.student_ids).await?;
    let skipped: Vec<DbId> = input
        .student_ids
        .iter()
        .copied()
        .filter(|id| !existing.contains(id))
        .collect();
    if existing.is_empty() {
        return Err(AppError::BadRequest(
            "None of the selected students exist".into(),
        ));
    }

    let inputs: Vec<CreateFee> = existing
        .into_iter()
        .map(|student_id| CreateFee {
            student_id,
            description: description.clone(),
            amount: input.amount,
            due_date,
        })
        .collect();
    let today = today();
    let fees: Vec<FeeResponse> = assign_fees(&state, admin.user_id, &inputs)
        .await?
        .into_iter()
        .map(|fee| FeeResponse::new(fee, today))
        .collect();

    if !skipped.is_empty() {
        tracing::warn!(?skipped, "Bulk fee assignment skipped unknown students");
    }
    tracing::info!(count = fees.len(), admin_id = admin.user_id, "Fees assigned in bulk");

    Ok((
        StatusCode::CREATED,
        Json(BulkFeeResponse {
            message: format!("Fee assigned to {} students", fees.len()),
            fees,
            skipped_student_ids: skipped,
        }),
    ))
}

/// POST /api/fees/{id}/pay
///
/// Only the owning student may pay; paying twice is a conflict.
pub async fn pay_fee(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<PaymentResponse>> {
    let student = current_student(&state, &auth).await?;
    let fee = FeeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Fee", id }))?;

    ensure_payable(fee.id, fee.student_id, &fee.status, student.id)?;

    let paid = FeeRepo::mark_paid(&state.pool, id).await?.ok_or_else(|| {
        AppError::Core(CoreError::Conflict(format!("Fee {id} is already paid")))
    })?;
    tracing::info!(fee_id = id, student_id = student.id, "Fee paid");

    Ok(Json(PaymentResponse {
        message: "Payment successful".into(),
        fee: FeeResponse::new(paid, today()),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_due_date(value: Option<&str>) -> AppResult<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => Ok(Some(parse_date(v, "due_date")?)),
    }
}

/// Create the fees with their "New Fee" notifications, then announce each
/// one on the bus once the transaction has committed.
async fn assign_fees(
    state: &AppState,
    admin_id: DbId,
    inputs: &[CreateFee],
) -> AppResult<Vec<Fee>> {
    let fees = FeeRepo::assign(&state.pool, inputs).await?;

    for fee in &fees {
        let Some(student) = StudentRepo::find_detail_by_id(&state.pool, fee.student_id).await?
        else {
            continue;
        };
        state.event_bus.publish(
            HostelEvent::new(EVENT_FEE_ASSIGNED)
                .with_source("fee", fee.id)
                .with_actor(admin_id)
                .with_recipient(student.email, Some(student.name))
                .with_payload(json!({
                    "description": fee.description,
                    "amount": fee.amount,
                    "due_date": fee.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
                })),
        );
    }

    Ok(fees)
}
