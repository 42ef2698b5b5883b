use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{UpdateOrderStatusRequest, UpdateRoleRequest, UserList},
        checkout::{
            BeginCheckoutRequest, CheckoutIntent, ConfirmQuery, InitiateCheckoutRequest,
            InitiateCheckoutResponse,
        },
        favorites::{AddFavoriteRequest, FavoritePlanList},
        orders::{DownloadGrant, OrderList},
        plans::{CreatePlanRequest, PlanList, UpdatePlanRequest},
        profile::UpdateProfileRequest,
    },
    models::{Favorite, Order, Plan, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, checkout, favorites, health, orders, params, plans, profile},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        plans::list_plans,
        plans::get_plan,
        plans::create_plan,
        plans::update_plan,
        plans::delete_plan,
        checkout::begin_checkout,
        checkout::initiate_checkout,
        checkout::confirm_checkout,
        orders::list_orders,
        orders::get_order,
        orders::download_order,
        favorites::add_favorite,
        favorites::remove_favorite,
        favorites::list_favorites,
        profile::get_profile,
        profile::update_profile,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_users,
        admin::update_user_role
    ),
    components(
        schemas(
            User,
            Plan,
            Favorite,
            Order,
            BeginCheckoutRequest,
            CheckoutIntent,
            InitiateCheckoutRequest,
            InitiateCheckoutResponse,
            ConfirmQuery,
            CreatePlanRequest,
            UpdatePlanRequest,
            PlanList,
            OrderList,
            DownloadGrant,
            AddFavoriteRequest,
            FavoritePlanList,
            UpdateProfileRequest,
            UpdateOrderStatusRequest,
            UpdateRoleRequest,
            UserList,
            params::Pagination,
            params::PlanQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Plan>,
            ApiResponse<PlanList>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<CheckoutIntent>,
            ApiResponse<InitiateCheckoutResponse>,
            ApiResponse<DownloadGrant>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Plans", description = "Plan catalog endpoints"),
        (name = "Checkout", description = "Checkout and payment endpoints"),
        (name = "Orders", description = "Order and download endpoints"),
        (name = "Favorites", description = "Favorite endpoints"),
        (name = "Profile", description = "Profile endpoints"),
        (name = "Admin", description = "Admin endpoints"),
        (name = "Auth", description = "Authentication endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
