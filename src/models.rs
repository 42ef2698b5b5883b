use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Plan {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub floor_area_sqm: i32,
    pub price_basic: i64,
    pub price_standard: i64,
    pub price_premium: i64,
    pub featured: bool,
    pub status: String,
    pub primary_image: Option<String>,
    pub gallery: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    /// Price for a tier, in minor currency units.
    pub fn price_for(&self, tier: Tier) -> i64 {
        match tier {
            Tier::Basic => self.price_basic,
            Tier::Standard => self.price_standard,
            Tier::Premium => self.price_premium,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub tier: String,
    pub amount: i64,
    pub status: String,
    pub provider_reference: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Purchasable package for a plan. Each tier unlocks a different file bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Basic,
    Standard,
    Premium,
}

impl Tier {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "basic" => Some(Tier::Basic),
            "standard" => Some(Tier::Standard),
            "premium" => Some(Tier::Premium),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Basic => "basic",
            Tier::Standard => "standard",
            Tier::Premium => "premium",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Basic => "Basic Package",
            Tier::Standard => "Standard Package",
            Tier::Premium => "Premium Package",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanCategory {
    Villa,
    Bungalow,
    Townhouse,
    Duplex,
    Apartment,
    Commercial,
}

impl PlanCategory {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "villa" => Some(PlanCategory::Villa),
            "bungalow" => Some(PlanCategory::Bungalow),
            "townhouse" => Some(PlanCategory::Townhouse),
            "duplex" => Some(PlanCategory::Duplex),
            "apartment" => Some(PlanCategory::Apartment),
            "commercial" => Some(PlanCategory::Commercial),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanCategory::Villa => "villa",
            PlanCategory::Bungalow => "bungalow",
            PlanCategory::Townhouse => "townhouse",
            PlanCategory::Duplex => "duplex",
            PlanCategory::Apartment => "apartment",
            PlanCategory::Commercial => "commercial",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStatus {
    Active,
    Inactive,
    Draft,
}

impl PlanStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(PlanStatus::Active),
            "inactive" => Some(PlanStatus::Inactive),
            "draft" => Some(PlanStatus::Draft),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Active => "active",
            PlanStatus::Inactive => "inactive",
            PlanStatus::Draft => "draft",
        }
    }
}

/// Payment lifecycle of an order. Transitions only move forward;
/// completed, failed and cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl OrderStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "processing" => Some(OrderStatus::Processing),
            "completed" => Some(OrderStatus::Completed),
            "failed" => Some(OrderStatus::Failed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Failed | OrderStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        match (self, next) {
            (OrderStatus::Pending, OrderStatus::Processing) => true,
            (OrderStatus::Pending, OrderStatus::Failed) => true,
            (OrderStatus::Pending, OrderStatus::Cancelled) => true,
            (OrderStatus::Processing, OrderStatus::Completed) => true,
            (OrderStatus::Processing, OrderStatus::Failed) => true,
            (OrderStatus::Processing, OrderStatus::Cancelled) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            "super_admin" => Some(Role::SuperAdmin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_moves_forward_only() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Failed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));

        // Completed never goes back.
        assert!(!Pending.can_transition_to(Completed));
        for next in [Pending, Processing, Failed, Cancelled] {
            assert!(!Completed.can_transition_to(next));
        }
        assert!(!Failed.can_transition_to(Processing));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Processing.can_transition_to(Pending));
    }

    #[test]
    fn terminal_statuses() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
    }

    #[test]
    fn tier_round_trips_and_prices() {
        for tier in [Tier::Basic, Tier::Standard, Tier::Premium] {
            assert_eq!(Tier::parse(tier.as_str()), Some(tier));
        }
        assert_eq!(Tier::parse("gold"), None);

        let plan = sample_plan();
        assert_eq!(plan.price_for(Tier::Basic), 1500);
        assert_eq!(plan.price_for(Tier::Standard), 3200);
        assert_eq!(plan.price_for(Tier::Premium), 5400);
    }

    #[test]
    fn role_admin_check() {
        assert!(Role::Admin.is_admin());
        assert!(Role::SuperAdmin.is_admin());
        assert!(!Role::User.is_admin());
        assert_eq!(Role::parse("super_admin"), Some(Role::SuperAdmin));
        assert_eq!(Role::parse("root"), None);
    }

    fn sample_plan() -> Plan {
        Plan {
            id: Uuid::new_v4(),
            title: "Test Villa".into(),
            description: None,
            category: "villa".into(),
            bedrooms: 4,
            bathrooms: 3,
            floor_area_sqm: 240,
            price_basic: 1500,
            price_standard: 3200,
            price_premium: 5400,
            featured: false,
            status: "active".into(),
            primary_image: None,
            gallery: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
