use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use houseplans_api::db::create_pool;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")?;

    let pool = create_pool(&database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let super_admin_id =
        ensure_user_with_role(&pool, "owner@example.com", "owner123", "super_admin").await?;
    let admin_id = ensure_user_with_role(&pool, "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user_with_role(&pool, "user@example.com", "user1234", "user").await?;
    seed_plans(&pool).await?;

    println!("Seed completed. Super admin: {super_admin_id}, Admin: {admin_id}, User: {user_id}");
    Ok(())
}

async fn ensure_user_with_role(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(row.0)
}

async fn seed_plans(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let plans = vec![
        (
            "Marigold Villa",
            "Four-bedroom villa with a double garage and roof terrace",
            "villa",
            4,
            3,
            280,
            (250000_i64, 450000_i64, 700000_i64),
            true,
        ),
        (
            "Cedar Bungalow",
            "Compact three-bedroom bungalow for narrow lots",
            "bungalow",
            3,
            2,
            140,
            (150000, 280000, 420000),
            false,
        ),
        (
            "Harbor Townhouse",
            "Three-storey townhouse with ground-floor shop option",
            "townhouse",
            4,
            4,
            220,
            (200000, 380000, 560000),
            true,
        ),
        (
            "Twin Oaks Duplex",
            "Mirrored two-unit duplex, three bedrooms per unit",
            "duplex",
            6,
            4,
            320,
            (300000, 520000, 780000),
            false,
        ),
    ];

    for (title, desc, category, bedrooms, bathrooms, area, prices, featured) in plans {
        sqlx::query(
            r#"
            INSERT INTO plans (
                id, title, description, category, bedrooms, bathrooms, floor_area_sqm,
                price_basic, price_standard, price_premium, featured, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'active')
            ON CONFLICT (title) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(desc)
        .bind(category)
        .bind(bedrooms)
        .bind(bathrooms)
        .bind(area)
        .bind(prices.0)
        .bind(prices.1)
        .bind(prices.2)
        .bind(featured)
        .execute(pool)
        .await?;
    }

    println!("Seeded plans");
    Ok(())
}
