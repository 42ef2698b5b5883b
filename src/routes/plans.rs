use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, put},
};
use uuid::Uuid;

use crate::{
    dto::plans::{CreatePlanRequest, PlanList, UpdatePlanRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Plan,
    response::ApiResponse,
    routes::params::PlanQuery,
    services::plan_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_plans).post(create_plan))
        .route("/{id}", get(get_plan))
        .route("/{id}", put(update_plan))
        .route("/{id}", delete(delete_plan))
}

#[utoipa::path(
    get,
    path = "/api/plans",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("category" = Option<String>, Query, description = "Filter by category"),
        ("min_bedrooms" = Option<i32>, Query, description = "Minimum bedrooms"),
        ("min_price" = Option<i64>, Query, description = "Minimum basic-tier price"),
        ("max_price" = Option<i64>, Query, description = "Maximum basic-tier price"),
        ("sort_by" = Option<String>, Query, description = "Sort key: featured, price, created_at"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "List plans", body = ApiResponse<PlanList>)
    ),
    tag = "Plans"
)]
pub async fn list_plans(
    State(state): State<AppState>,
    Query(query): Query<PlanQuery>,
) -> AppResult<Json<ApiResponse<PlanList>>> {
    let resp = plan_service::list_plans(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/plans/{id}",
    params(
        ("id" = Uuid, Path, description = "Plan ID")
    ),
    responses(
        (status = 200, description = "Get plan", body = ApiResponse<Plan>),
        (status = 404, description = "Plan not found"),
    ),
    tag = "Plans"
)]
pub async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Plan>>> {
    let resp = plan_service::get_plan(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/plans",
    request_body = CreatePlanRequest,
    responses(
        (status = 201, description = "Create plan", body = ApiResponse<Plan>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Plans"
)]
pub async fn create_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePlanRequest>,
) -> AppResult<Json<ApiResponse<Plan>>> {
    let resp = plan_service::create_plan(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/plans/{id}",
    params(
        ("id" = Uuid, Path, description = "Plan ID")
    ),
    request_body = UpdatePlanRequest,
    responses(
        (status = 200, description = "Updated plan", body = ApiResponse<Plan>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Plans"
)]
pub async fn update_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlanRequest>,
) -> AppResult<Json<ApiResponse<Plan>>> {
    let resp = plan_service::update_plan(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/plans/{id}",
    params(
        ("id" = Uuid, Path, description = "Plan ID")
    ),
    responses(
        (status = 200, description = "Deleted plan"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Plans"
)]
pub async fn delete_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = plan_service::delete_plan(&state, &user, id).await?;
    Ok(Json(resp))
}
