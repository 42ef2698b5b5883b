use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Order;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

/// Entitlement to the deliverable bundle of a completed order.
#[derive(Debug, Serialize, ToSchema)]
pub struct DownloadGrant {
    pub order_id: Uuid,
    pub plan_id: Uuid,
    pub tier: String,
    pub bundle: String,
}
