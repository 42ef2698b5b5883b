use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::{
    dto::checkout::{
        BeginCheckoutRequest, CheckoutIntent, ConfirmQuery, InitiateCheckoutRequest,
        InitiateCheckoutResponse,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    response::ApiResponse,
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/intent", post(begin_checkout))
        .route("/initiate", post(initiate_checkout))
        .route("/confirm", get(confirm_checkout))
}

#[utoipa::path(
    post,
    path = "/api/checkout/intent",
    request_body = BeginCheckoutRequest,
    responses(
        (status = 200, description = "Checkout intent for the selected plan and tier", body = ApiResponse<CheckoutIntent>),
        (status = 400, description = "Unknown tier or plan not purchasable"),
        (status = 404, description = "Plan not found")
    ),
    tag = "Checkout"
)]
pub async fn begin_checkout(
    State(state): State<AppState>,
    Json(payload): Json<BeginCheckoutRequest>,
) -> AppResult<Json<ApiResponse<CheckoutIntent>>> {
    let resp = checkout_service::begin_checkout(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/checkout/initiate",
    request_body = InitiateCheckoutRequest,
    responses(
        (status = 200, description = "Transaction created, redirect the browser to authorization_url", body = ApiResponse<InitiateCheckoutResponse>),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Authentication required"),
        (status = 502, description = "Payment provider rejected the initialize call")
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn initiate_checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<InitiateCheckoutRequest>,
) -> AppResult<Json<ApiResponse<InitiateCheckoutResponse>>> {
    let resp = checkout_service::initiate(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/checkout/confirm",
    params(
        ("reference" = String, Query, description = "Provider transaction reference")
    ),
    responses(
        (status = 200, description = "Payment verified, order completed", body = ApiResponse<Order>),
        (status = 402, description = "Provider reported the transaction as not successful")
    ),
    tag = "Checkout"
)]
pub async fn confirm_checkout(
    State(state): State<AppState>,
    Query(query): Query<ConfirmQuery>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = checkout_service::confirm(&state, &query.reference).await?;
    Ok(Json(resp))
}
