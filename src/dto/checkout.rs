use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct BeginCheckoutRequest {
    pub plan_id: Uuid,
    pub tier: String,
}

/// Snapshot of a pending purchase selection. The browser holds this across
/// the page transition; the server keeps no record of it until payment is
/// initiated. Losing it means restarting from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CheckoutIntent {
    pub plan_id: Uuid,
    pub plan_title: String,
    pub tier: String,
    pub tier_label: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InitiateCheckoutRequest {
    pub intent: CheckoutIntent,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InitiateCheckoutResponse {
    /// Browser-level redirect target at the payment provider.
    pub authorization_url: String,
    pub reference: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmQuery {
    pub reference: String,
}
