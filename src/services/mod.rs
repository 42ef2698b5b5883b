pub mod admin_service;
pub mod auth_service;
pub mod checkout_service;
pub mod favorite_service;
pub mod order_service;
pub mod plan_service;
pub mod profile_service;
