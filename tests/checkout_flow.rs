use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use houseplans_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        admin::UpdateOrderStatusRequest,
        checkout::{BeginCheckoutRequest, InitiateCheckoutRequest},
    },
    entity::plans::ActiveModel as PlanActive,
    entity::users::ActiveModel as UserActive,
    error::AppError,
    middleware::auth::AuthUser,
    models::Tier,
    payments::{InitializedTransaction, PaymentGateway, VerifiedTransaction},
    routes::params::{OrderListQuery, Pagination},
    services::{admin_service, checkout_service, order_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

/// In-process stand-in for the hosted checkout gateway. Remembers the amount
/// per initialized reference and reports success unless told otherwise.
#[derive(Default)]
struct FakeGateway {
    txns: Mutex<HashMap<String, i64>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeGateway {
    fn fail_reference(&self, reference: &str) {
        self.failing.lock().unwrap().insert(reference.to_string());
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn initialize_transaction(
        &self,
        _email: &str,
        amount: i64,
        reference: &str,
        _metadata: serde_json::Value,
    ) -> anyhow::Result<InitializedTransaction> {
        self.txns
            .lock()
            .unwrap()
            .insert(reference.to_string(), amount);
        Ok(InitializedTransaction {
            authorization_url: format!("https://pay.test/{reference}"),
            reference: reference.to_string(),
        })
    }

    async fn verify_transaction(&self, reference: &str) -> anyhow::Result<VerifiedTransaction> {
        let amount = self
            .txns
            .lock()
            .unwrap()
            .get(reference)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("unknown reference: {reference}"))?;
        let status = if self.failing.lock().unwrap().contains(reference) {
            "failed"
        } else {
            "success"
        };
        Ok(VerifiedTransaction {
            reference: reference.to_string(),
            status: status.to_string(),
            amount,
            paid_at: Some(Utc::now()),
        })
    }
}

// The flow tests share one database; serialize them.
static DB_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

// Integration flow: select a tier -> initiate payment -> provider confirms ->
// order completed, download unlocked, second confirm is a no-op.
#[tokio::test]
async fn checkout_confirm_and_idempotency_flow() -> anyhow::Result<()> {
    let _guard = DB_LOCK.lock().await;
    let Some((state, _gateway)) = setup_state().await? else {
        return Ok(());
    };

    let user_id = create_user(&state, "user", "buyer@example.com").await?;
    let other_id = create_user(&state, "user", "other@example.com").await?;
    let admin_id = create_user(&state, "admin", "admin@example.com").await?;
    let plan_id = create_plan(&state, "Marigold Villa", "active", 1500, 3200, 5400).await?;

    let buyer = AuthUser {
        user_id,
        role: "user".into(),
    };
    let other = AuthUser {
        user_id: other_id,
        role: "user".into(),
    };
    let admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };

    // Intent snapshots the displayed price for the chosen tier.
    let intent_resp = checkout_service::begin_checkout(
        &state,
        BeginCheckoutRequest {
            plan_id,
            tier: "standard".into(),
        },
    )
    .await?;
    let intent = intent_resp.data.unwrap();
    assert_eq!(intent.amount, 3200);
    assert_eq!(intent.tier, Tier::Standard.as_str());
    assert_eq!(intent.tier_label, "Standard Package");
    assert_eq!(intent.plan_title, "Marigold Villa");

    let init_resp = checkout_service::initiate(
        &state,
        &buyer,
        InitiateCheckoutRequest {
            intent: intent.clone(),
        },
    )
    .await?;
    let init = init_resp.data.unwrap();
    assert!(init.authorization_url.starts_with("https://pay.test/"));

    let confirm_resp = checkout_service::confirm(&state, &init.reference).await?;
    let order = confirm_resp.data.unwrap();
    assert_eq!(order.plan_id, plan_id);
    assert_eq!(order.user_id, user_id);
    assert_eq!(order.tier, "standard");
    assert_eq!(order.amount, 3200);
    assert_eq!(order.status, "completed");
    assert!(order.paid_at.is_some());

    // Confirming the same reference again returns the same order unchanged.
    let again = checkout_service::confirm(&state, &init.reference).await?;
    let same = again.data.unwrap();
    assert_eq!(same.id, order.id);
    assert_eq!(same.status, "completed");
    assert_eq!(same.paid_at, order.paid_at);

    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM orders WHERE provider_reference = $1")
            .bind(&init.reference)
            .fetch_one(&state.pool)
            .await?;
    assert_eq!(count.0, 1);

    // Entitlement: owner of a completed order gets the bundle.
    let grant = order_service::download(&state, &buyer, order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(grant.order_id, order.id);
    assert!(grant.bundle.contains(&plan_id.to_string()));
    assert!(grant.bundle.contains("standard"));

    // A different user cannot even see the order.
    let denied = order_service::download(&state, &other, order.id).await;
    assert!(matches!(denied, Err(AppError::NotFound)));
    let hidden = order_service::get_order(&state, &other, order.id).await;
    assert!(matches!(hidden, Err(AppError::NotFound)));

    // Admins can.
    let via_admin = admin_service::get_order_admin(&state, &admin, order.id).await?;
    assert_eq!(via_admin.data.unwrap().id, order.id);

    // Owner listing contains the order; the other user's listing is empty.
    let mine = order_service::list_orders(&state, &buyer, order_query()).await?;
    assert!(mine.data.unwrap().items.iter().any(|o| o.id == order.id));
    let theirs = order_service::list_orders(&state, &other, order_query()).await?;
    assert!(theirs.data.unwrap().items.is_empty());

    Ok(())
}

#[tokio::test]
async fn failed_verification_marks_order_failed() -> anyhow::Result<()> {
    let _guard = DB_LOCK.lock().await;
    let Some((state, gateway)) = setup_state().await? else {
        return Ok(());
    };

    let user_id = create_user(&state, "user", "buyer@example.com").await?;
    let plan_id = create_plan(&state, "Cedar Bungalow", "active", 1500, 2800, 4200).await?;
    let buyer = AuthUser {
        user_id,
        role: "user".into(),
    };

    let intent = checkout_service::begin_checkout(
        &state,
        BeginCheckoutRequest {
            plan_id,
            tier: "premium".into(),
        },
    )
    .await?
    .data
    .unwrap();

    let init = checkout_service::initiate(&state, &buyer, InitiateCheckoutRequest { intent })
        .await?
        .data
        .unwrap();

    gateway.fail_reference(&init.reference);

    let err = checkout_service::confirm(&state, &init.reference).await;
    assert!(matches!(err, Err(AppError::PaymentVerification(_))));

    // The tentative order is failed, never completed, and grants nothing.
    let order = order_service::list_orders(&state, &buyer, order_query())
        .await?
        .data
        .unwrap()
        .items
        .remove(0);
    assert_eq!(order.status, "failed");
    let denied = order_service::download(&state, &buyer, order.id).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    // A consumed reference cannot be confirmed into anything else.
    let again = checkout_service::confirm(&state, &init.reference).await;
    assert!(matches!(again, Err(AppError::PaymentVerification(_))));

    // An unknown reference is rejected outright.
    let unknown = checkout_service::confirm(&state, "HP-20240101-deadbeef").await;
    assert!(matches!(unknown, Err(AppError::PaymentVerification(_))));

    Ok(())
}

#[tokio::test]
async fn checkout_never_reaches_payment_for_bad_selection() -> anyhow::Result<()> {
    let _guard = DB_LOCK.lock().await;
    let Some((state, gateway)) = setup_state().await? else {
        return Ok(());
    };

    let user_id = create_user(&state, "user", "buyer@example.com").await?;
    let buyer = AuthUser {
        user_id,
        role: "user".into(),
    };

    // Unknown plan id.
    let missing = checkout_service::begin_checkout(
        &state,
        BeginCheckoutRequest {
            plan_id: Uuid::new_v4(),
            tier: "basic".into(),
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    // Unknown tier.
    let plan_id = create_plan(&state, "Harbor Townhouse", "active", 2000, 3800, 5600).await?;
    let bad_tier = checkout_service::begin_checkout(
        &state,
        BeginCheckoutRequest {
            plan_id,
            tier: "gold".into(),
        },
    )
    .await;
    assert!(matches!(bad_tier, Err(AppError::Validation(_))));

    // Draft plans are not purchasable.
    let draft_id = create_plan(&state, "Unreleased Plan", "draft", 100, 200, 300).await?;
    let draft = checkout_service::begin_checkout(
        &state,
        BeginCheckoutRequest {
            plan_id: draft_id,
            tier: "basic".into(),
        },
    )
    .await;
    assert!(matches!(draft, Err(AppError::Validation(_))));

    // A stale intent is rejected once the plan price moves.
    let intent = checkout_service::begin_checkout(
        &state,
        BeginCheckoutRequest {
            plan_id,
            tier: "standard".into(),
        },
    )
    .await?
    .data
    .unwrap();

    reprice_standard(&state, plan_id, 4100).await?;

    let stale = checkout_service::initiate(&state, &buyer, InitiateCheckoutRequest { intent }).await;
    assert!(matches!(stale, Err(AppError::Validation(_))));

    // No gateway call was ever made.
    assert!(gateway.txns.lock().unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn admin_status_updates_respect_the_state_machine() -> anyhow::Result<()> {
    let _guard = DB_LOCK.lock().await;
    let Some((state, _gateway)) = setup_state().await? else {
        return Ok(());
    };

    let user_id = create_user(&state, "user", "buyer@example.com").await?;
    let admin_id = create_user(&state, "admin", "admin@example.com").await?;
    let super_id = create_user(&state, "super_admin", "owner@example.com").await?;
    let plan_id = create_plan(&state, "Twin Oaks Duplex", "active", 3000, 5200, 7800).await?;

    let buyer = AuthUser {
        user_id,
        role: "user".into(),
    };
    let admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };
    let super_admin = AuthUser {
        user_id: super_id,
        role: "super_admin".into(),
    };

    let intent = checkout_service::begin_checkout(
        &state,
        BeginCheckoutRequest {
            plan_id,
            tier: "basic".into(),
        },
    )
    .await?
    .data
    .unwrap();
    checkout_service::initiate(&state, &buyer, InitiateCheckoutRequest { intent }).await?;
    let order_id = order_service::list_orders(&state, &buyer, order_query())
        .await?
        .data
        .unwrap()
        .items[0]
        .id;

    // Ordinary users cannot touch admin surfaces.
    let forbidden = admin_service::list_all_orders(&state, &buyer, order_query()).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));
    let forbidden = admin_service::update_user_role(
        &state,
        &admin,
        user_id,
        houseplans_api::dto::admin::UpdateRoleRequest {
            role: "admin".into(),
        },
    )
    .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    // pending cannot jump straight to completed.
    let jump = admin_service::update_order_status(
        &state,
        &admin,
        order_id,
        UpdateOrderStatusRequest {
            status: "completed".into(),
        },
    )
    .await;
    assert!(matches!(jump, Err(AppError::Validation(_))));

    // pending -> processing -> completed is the legal path.
    let processing = admin_service::update_order_status(
        &state,
        &admin,
        order_id,
        UpdateOrderStatusRequest {
            status: "processing".into(),
        },
    )
    .await?;
    assert_eq!(processing.data.unwrap().status, "processing");

    let completed = admin_service::update_order_status(
        &state,
        &admin,
        order_id,
        UpdateOrderStatusRequest {
            status: "completed".into(),
        },
    )
    .await?;
    assert_eq!(completed.data.unwrap().status, "completed");

    // Nothing leaves completed.
    for next in ["pending", "processing", "failed", "cancelled"] {
        let stuck = admin_service::update_order_status(
            &state,
            &admin,
            order_id,
            UpdateOrderStatusRequest {
                status: next.into(),
            },
        )
        .await;
        assert!(matches!(stuck, Err(AppError::Validation(_))), "{next}");
    }

    // Role elevation is a super-admin capability.
    let elevated = admin_service::update_user_role(
        &state,
        &super_admin,
        user_id,
        houseplans_api::dto::admin::UpdateRoleRequest {
            role: "admin".into(),
        },
    )
    .await?;
    assert_eq!(elevated.data.unwrap().role, "admin");

    Ok(())
}

fn order_query() -> OrderListQuery {
    OrderListQuery {
        pagination: Pagination {
            page: Some(1),
            per_page: Some(20),
        },
        status: None,
        sort_order: None,
    }
}

async fn setup_state() -> anyhow::Result<Option<(AppState, Arc<FakeGateway>)>> {
    // Allow skipping when no DB is configured in the environment.
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(None);
            }
        };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs.
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE orders, favorites, audit_logs, plans, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    let gateway = Arc::new(FakeGateway::default());
    let state = AppState {
        pool,
        orm,
        gateway: gateway.clone(),
    };
    Ok(Some((state, gateway)))
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        display_name: Set(None),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

async fn create_plan(
    state: &AppState,
    title: &str,
    status: &str,
    basic: i64,
    standard: i64,
    premium: i64,
) -> anyhow::Result<Uuid> {
    let plan = PlanActive {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        description: Set(Some("A plan for testing".into())),
        category: Set("villa".into()),
        bedrooms: Set(4),
        bathrooms: Set(3),
        floor_area_sqm: Set(240),
        price_basic: Set(basic),
        price_standard: Set(standard),
        price_premium: Set(premium),
        featured: Set(false),
        status: Set(status.to_string()),
        primary_image: Set(None),
        gallery: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(plan.id)
}

async fn reprice_standard(state: &AppState, plan_id: Uuid, price: i64) -> anyhow::Result<()> {
    sqlx::query("UPDATE plans SET price_standard = $2 WHERE id = $1")
        .bind(plan_id)
        .bind(price)
        .execute(&state.pool)
        .await?;
    Ok(())
}
