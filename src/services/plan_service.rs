use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::dto::plans::{CreatePlanRequest, PlanList, UpdatePlanRequest};
use crate::{
    audit::log_audit,
    entity::plans::{ActiveModel, Column, Entity as Plans, Model as PlanModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Plan, PlanCategory, PlanStatus},
    response::{ApiResponse, Meta},
    routes::params::{PlanQuery, PlanSortBy, SortOrder},
    state::AppState,
};

/// Catalog listing: active plans only, filtered and sorted.
pub async fn list_plans(state: &AppState, query: PlanQuery) -> AppResult<ApiResponse<PlanList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(Column::Status.eq(PlanStatus::Active.as_str()));

    if let Some(category) = query.category.as_ref().filter(|c| !c.is_empty()) {
        let category = PlanCategory::parse(category)
            .ok_or_else(|| AppError::Validation(format!("Unknown category: {category}")))?;
        condition = condition.add(Column::Category.eq(category.as_str()));
    }

    if let Some(min_bedrooms) = query.min_bedrooms {
        condition = condition.add(Column::Bedrooms.gte(min_bedrooms));
    }

    // Price band filters compare against the basic tier, the entry point of
    // the ladder shown on listing cards.
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::PriceBasic.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::PriceBasic.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(PlanSortBy::Featured);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Plans::find().filter(condition);
    finder = match sort_by {
        PlanSortBy::Featured => finder
            .order_by_desc(Column::Featured)
            .order_by_desc(Column::CreatedAt),
        PlanSortBy::Price => match sort_order {
            SortOrder::Asc => finder.order_by_asc(Column::PriceBasic),
            SortOrder::Desc => finder.order_by_desc(Column::PriceBasic),
        },
        PlanSortBy::CreatedAt => match sort_order {
            SortOrder::Asc => finder.order_by_asc(Column::CreatedAt),
            SortOrder::Desc => finder.order_by_desc(Column::CreatedAt),
        },
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(plan_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    let data = PlanList { items };
    Ok(ApiResponse::success("Plans", data, Some(meta)))
}

/// Unknown or draft plan ids resolve to NotFound. There is no placeholder
/// fallback; the caller gets the error.
pub async fn get_plan(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Plan>> {
    let result = Plans::find_by_id(id).one(&state.orm).await?;
    let result = match result {
        Some(p) if p.status != PlanStatus::Draft.as_str() => plan_from_entity(p),
        _ => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Plan", result, None))
}

pub async fn create_plan(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePlanRequest,
) -> AppResult<ApiResponse<Plan>> {
    ensure_admin(user)?;

    let category = PlanCategory::parse(&payload.category)
        .ok_or_else(|| AppError::Validation(format!("Unknown category: {}", payload.category)))?;
    let status = match payload.status.as_deref() {
        Some(value) => PlanStatus::parse(value)
            .ok_or_else(|| AppError::Validation(format!("Unknown status: {value}")))?,
        None => PlanStatus::Draft,
    };
    validate_prices(
        payload.price_basic,
        payload.price_standard,
        payload.price_premium,
    )?;

    let id = Uuid::new_v4();
    let active = ActiveModel {
        id: Set(id),
        title: Set(payload.title),
        description: Set(payload.description),
        category: Set(category.as_str().to_string()),
        bedrooms: Set(payload.bedrooms),
        bathrooms: Set(payload.bathrooms),
        floor_area_sqm: Set(payload.floor_area_sqm),
        price_basic: Set(payload.price_basic),
        price_standard: Set(payload.price_standard),
        price_premium: Set(payload.price_premium),
        featured: Set(payload.featured.unwrap_or(false)),
        status: Set(status.as_str().to_string()),
        primary_image: Set(payload.primary_image),
        gallery: Set(payload.gallery),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let plan = active.insert(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "plan_create",
        Some("plans"),
        Some(serde_json::json!({ "plan_id": plan.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Plan created",
        plan_from_entity(plan),
        Some(Meta::empty()),
    ))
}

pub async fn update_plan(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePlanRequest,
) -> AppResult<ApiResponse<Plan>> {
    ensure_admin(user)?;
    let existing = Plans::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    validate_prices(
        payload.price_basic.unwrap_or(existing.price_basic),
        payload.price_standard.unwrap_or(existing.price_standard),
        payload.price_premium.unwrap_or(existing.price_premium),
    )?;

    let mut active: ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(category) = payload.category {
        let category = PlanCategory::parse(&category)
            .ok_or_else(|| AppError::Validation(format!("Unknown category: {category}")))?;
        active.category = Set(category.as_str().to_string());
    }
    if let Some(bedrooms) = payload.bedrooms {
        active.bedrooms = Set(bedrooms);
    }
    if let Some(bathrooms) = payload.bathrooms {
        active.bathrooms = Set(bathrooms);
    }
    if let Some(floor_area_sqm) = payload.floor_area_sqm {
        active.floor_area_sqm = Set(floor_area_sqm);
    }
    if let Some(price) = payload.price_basic {
        active.price_basic = Set(price);
    }
    if let Some(price) = payload.price_standard {
        active.price_standard = Set(price);
    }
    if let Some(price) = payload.price_premium {
        active.price_premium = Set(price);
    }
    if let Some(featured) = payload.featured {
        active.featured = Set(featured);
    }
    if let Some(status) = payload.status {
        let status = PlanStatus::parse(&status)
            .ok_or_else(|| AppError::Validation(format!("Unknown status: {status}")))?;
        active.status = Set(status.as_str().to_string());
    }
    if let Some(primary_image) = payload.primary_image {
        active.primary_image = Set(Some(primary_image));
    }
    if let Some(gallery) = payload.gallery {
        active.gallery = Set(Some(gallery));
    }
    active.updated_at = Set(Utc::now().into());

    let plan = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "plan_update",
        Some("plans"),
        Some(serde_json::json!({ "plan_id": plan.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        plan_from_entity(plan),
        Some(Meta::empty()),
    ))
}

pub async fn delete_plan(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Plans::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "plan_delete",
        Some("plans"),
        Some(serde_json::json!({ "plan_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn validate_prices(basic: i64, standard: i64, premium: i64) -> AppResult<()> {
    for price in [basic, standard, premium] {
        if price <= 0 {
            return Err(AppError::Validation(
                "Tier prices must be positive".to_string(),
            ));
        }
    }
    Ok(())
}

fn plan_from_entity(model: PlanModel) -> Plan {
    Plan {
        id: model.id,
        title: model.title,
        description: model.description,
        category: model.category,
        bedrooms: model.bedrooms,
        bathrooms: model.bathrooms,
        floor_area_sqm: model.floor_area_sqm,
        price_basic: model.price_basic,
        price_standard: model.price_standard,
        price_premium: model.price_premium,
        featured: model.featured,
        status: model.status,
        primary_image: model.primary_image,
        gallery: model.gallery,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
