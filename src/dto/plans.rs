use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Plan;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePlanRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub floor_area_sqm: i32,
    pub price_basic: i64,
    pub price_standard: i64,
    pub price_premium: i64,
    pub featured: Option<bool>,
    pub status: Option<String>,
    pub primary_image: Option<String>,
    pub gallery: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePlanRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub floor_area_sqm: Option<i32>,
    pub price_basic: Option<i64>,
    pub price_standard: Option<i64>,
    pub price_premium: Option<i64>,
    pub featured: Option<bool>,
    pub status: Option<String>,
    pub primary_image: Option<String>,
    pub gallery: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlanList {
    pub items: Vec<Plan>,
}
