//! Startup seeding of the bootstrap administrator.

use hms_core::roles::ROLE_ADMIN;
use hms_db::models::user::CreateUser;
use hms_db::repositories::UserRepo;
use hms_db::DbPool;

use crate::auth::password::hash_password;
use crate::config::AdminSeed;
use crate::error::{AppError, AppResult};
use crate::handlers::normalize_email;

/// Create the configured administrator unless a user with that e-mail
/// already exists. Returns `true` when an account was created.
pub async fn seed_admin(pool: &DbPool, seed: &AdminSeed) -> AppResult<bool> {
    let email = normalize_email(&seed.email);
    if UserRepo::find_by_email(pool, &email).await?.is_some() {
        tracing::debug!(email = %email, "Admin account already present");
        return Ok(false);
    }

    let password_hash = hash_password(&seed.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    let user = UserRepo::create(
        pool,
        &CreateUser {
            name: seed.name.clone(),
            email,
            password_hash,
            role: ROLE_ADMIN.to_string(),
        },
    )
    .await?;
    tracing::info!(user_id = user.id, email = %user.email, "Seeded admin account");

    Ok(true)
}
