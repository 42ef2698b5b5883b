use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Plan;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AddFavoriteRequest {
    pub plan_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoritePlanList {
    pub items: Vec<Plan>,
}
