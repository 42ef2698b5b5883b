use crate::dto::profile::UpdateProfileRequest;
use crate::{
    db::DbPool,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
};

pub async fn get_profile(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let profile: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(pool)
        .await?;

    match profile {
        Some(profile) => Ok(ApiResponse::success("Profile", profile, None)),
        None => Err(AppError::NotFound),
    }
}

pub async fn update_profile(
    pool: &DbPool,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let profile: Option<User> = sqlx::query_as(
        r#"
        UPDATE users
        SET display_name = COALESCE($2, display_name)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user.user_id)
    .bind(payload.display_name)
    .fetch_optional(pool)
    .await?;

    match profile {
        Some(profile) => Ok(ApiResponse::success(
            "Profile updated",
            profile,
            Some(Meta::empty()),
        )),
        None => Err(AppError::NotFound),
    }
}
