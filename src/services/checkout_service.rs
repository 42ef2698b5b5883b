use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::dto::checkout::{
    BeginCheckoutRequest, CheckoutIntent, InitiateCheckoutRequest, InitiateCheckoutResponse,
};
use crate::{
    audit::log_audit,
    entity::orders::{
        ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
    },
    entity::plans::{Entity as Plans, Model as PlanModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderStatus, PlanStatus, Tier},
    payments::VerifiedTransaction,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Snapshot a purchase selection. The returned intent is held by the client
/// until payment is initiated; nothing is persisted here.
pub async fn begin_checkout(
    state: &AppState,
    payload: BeginCheckoutRequest,
) -> AppResult<ApiResponse<CheckoutIntent>> {
    let tier = parse_tier(&payload.tier)?;
    let plan = find_purchasable_plan(state, payload.plan_id).await?;

    let intent = CheckoutIntent {
        plan_id: plan.id,
        plan_title: plan.title.clone(),
        tier: tier.as_str().to_string(),
        tier_label: tier.label().to_string(),
        amount: tier_price(&plan, tier),
        created_at: Utc::now(),
    };

    Ok(ApiResponse::success(
        "Checkout intent",
        intent,
        Some(Meta::empty()),
    ))
}

/// Hand off to the payment provider. Validates the intent against the live
/// plan record, creates the gateway transaction and persists a pending order
/// carrying the provider reference.
pub async fn initiate(
    state: &AppState,
    user: &AuthUser,
    payload: InitiateCheckoutRequest,
) -> AppResult<ApiResponse<InitiateCheckoutResponse>> {
    let intent = payload.intent;
    let tier = parse_tier(&intent.tier)?;

    if intent.amount <= 0 {
        return Err(AppError::Validation(
            "Amount must be greater than zero".to_string(),
        ));
    }

    let email: Option<(String,)> = sqlx::query_as("SELECT email FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.pool)
        .await?;
    let email = match email {
        Some((email,)) if !email.trim().is_empty() => email,
        Some(_) => {
            return Err(AppError::Validation(
                "A payer email is required before checkout".to_string(),
            ));
        }
        None => return Err(AppError::AuthRequired),
    };

    let plan = find_purchasable_plan(state, intent.plan_id).await?;

    // The charged amount comes from the plan record, never from the client.
    // A stale intent (price edited since selection) must be re-created.
    let amount = tier_price(&plan, tier);
    if intent.amount != amount {
        return Err(AppError::Validation(
            "Plan price has changed since selection, restart checkout".to_string(),
        ));
    }

    let order_id = Uuid::new_v4();
    let reference = build_reference(order_id);
    let metadata = serde_json::json!({
        "order_id": order_id,
        "plan_id": plan.id,
        "tier": tier.as_str(),
        "user_id": user.user_id,
    });

    let init = state
        .gateway
        .initialize_transaction(&email, amount, &reference, metadata)
        .await
        .map_err(|err| AppError::PaymentInit(err.to_string()))?;

    OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        plan_id: Set(plan.id),
        tier: Set(tier.as_str().to_string()),
        amount: Set(amount),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        provider_reference: Set(init.reference.clone()),
        paid_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "checkout_initiated",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order_id, "reference": init.reference })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Checkout initiated",
        InitiateCheckoutResponse {
            authorization_url: init.authorization_url,
            reference: init.reference,
        },
        Some(Meta::empty()),
    ))
}

/// Settle an order from the provider redirect. The transaction status is
/// re-fetched from the gateway; a second confirm of the same reference
/// returns the already-completed order unchanged.
pub async fn confirm(state: &AppState, reference: &str) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;

    // Row lock serializes concurrent confirms for one reference; the unique
    // column guarantees at most one order per reference exists at all.
    let order = Orders::find()
        .filter(OrderCol::ProviderReference.eq(reference))
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => {
            return Err(AppError::PaymentVerification(
                "Unknown payment reference".to_string(),
            ));
        }
    };

    let status = OrderStatus::parse(&order.status).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("order {} has invalid status", order.id))
    })?;

    match status {
        OrderStatus::Completed => {
            txn.commit().await?;
            return Ok(ApiResponse::success(
                "Payment already confirmed",
                order_from_entity(order),
                Some(Meta::empty()),
            ));
        }
        OrderStatus::Failed | OrderStatus::Cancelled => {
            txn.commit().await?;
            return Err(AppError::PaymentVerification(
                "Payment reference already consumed".to_string(),
            ));
        }
        OrderStatus::Pending | OrderStatus::Processing => {}
    }

    let verified = state
        .gateway
        .verify_transaction(reference)
        .await
        .map_err(|err| AppError::PaymentVerification(err.to_string()))?;

    if !verified.is_success() || verified.amount != order.amount {
        let failed = mark_failed(&txn, order).await?;
        txn.commit().await?;

        if let Err(err) = log_audit(
            &state.pool,
            Some(failed.user_id),
            "payment_failed",
            Some("orders"),
            Some(serde_json::json!({ "order_id": failed.id, "reference": reference })),
        )
        .await
        {
            tracing::warn!(error = %err, "audit log failed");
        }

        let detail = if verified.is_success() {
            "Charged amount does not match the order"
        } else {
            "Provider reported the transaction as not successful"
        };
        return Err(AppError::PaymentVerification(detail.to_string()));
    }

    // From here the payment is verified good. A write failure now is the one
    // unacceptable outcome, so it is logged for manual reconciliation.
    let completed = match mark_completed(&txn, order, status, &verified).await {
        Ok(order) => order,
        Err(err) => {
            tracing::error!(
                reference = %reference,
                error = %err,
                "verified payment could not be recorded, manual reconciliation required"
            );
            return Err(err.into());
        }
    };
    if let Err(err) = txn.commit().await {
        tracing::error!(
            reference = %reference,
            error = %err,
            "verified payment could not be recorded, manual reconciliation required"
        );
        return Err(err.into());
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(completed.user_id),
        "payment_confirmed",
        Some("orders"),
        Some(serde_json::json!({ "order_id": completed.id, "reference": reference })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Payment confirmed",
        order_from_entity(completed),
        Some(Meta::empty()),
    ))
}

async fn mark_completed(
    txn: &DatabaseTransaction,
    order: OrderModel,
    status: OrderStatus,
    verified: &VerifiedTransaction,
) -> Result<OrderModel, sea_orm::DbErr> {
    // Walk the state machine forward rather than jumping straight to
    // completed from pending.
    let order = if status == OrderStatus::Pending {
        let mut active: OrderActive = order.into();
        active.status = Set(OrderStatus::Processing.as_str().to_string());
        active.updated_at = Set(Utc::now().into());
        active.update(txn).await?
    } else {
        order
    };

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Completed.as_str().to_string());
    active.paid_at = Set(Some(verified.paid_at.unwrap_or_else(Utc::now).into()));
    active.updated_at = Set(Utc::now().into());
    active.update(txn).await
}

async fn mark_failed(txn: &DatabaseTransaction, order: OrderModel) -> AppResult<OrderModel> {
    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Failed.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}

async fn find_purchasable_plan(state: &AppState, plan_id: Uuid) -> AppResult<PlanModel> {
    let plan = Plans::find_by_id(plan_id).one(&state.orm).await?;
    let plan = match plan {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    if plan.status != PlanStatus::Active.as_str() {
        return Err(AppError::Validation(
            "Plan is not available for purchase".to_string(),
        ));
    }
    Ok(plan)
}

fn parse_tier(value: &str) -> AppResult<Tier> {
    Tier::parse(value).ok_or_else(|| AppError::Validation(format!("Unknown tier: {value}")))
}

fn tier_price(plan: &PlanModel, tier: Tier) -> i64 {
    match tier {
        Tier::Basic => plan.price_basic,
        Tier::Standard => plan.price_standard,
        Tier::Premium => plan.price_premium,
    }
}

fn build_reference(order_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = order_id.to_string();
    let short = &suffix[..8];
    format!("HP-{}-{}", date, short)
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        plan_id: model.plan_id,
        tier: model.tier,
        amount: model.amount,
        status: model.status,
        provider_reference: model.provider_reference,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_carries_date_and_order_prefix() {
        let order_id = Uuid::new_v4();
        let reference = build_reference(order_id);
        assert!(reference.starts_with("HP-"));
        assert!(reference.ends_with(&order_id.to_string()[..8]));
        // HP- + yyyymmdd + - + 8 hex chars
        assert_eq!(reference.len(), 3 + 8 + 1 + 8);
    }
}
