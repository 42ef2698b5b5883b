use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub payment: PaymentConfig,
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub secret_key: String,
    pub base_url: String,
    pub callback_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let payment = PaymentConfig::from_env()?;
        Ok(Self {
            port,
            database_url,
            host,
            payment,
        })
    }
}

impl PaymentConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let secret_key = env::var("PAYMENT_SECRET_KEY")?;
        let base_url = env::var("PAYMENT_BASE_URL")
            .unwrap_or_else(|_| "https://api.paystack.co".to_string());
        let callback_url = env::var("CHECKOUT_CALLBACK_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000/api/checkout/confirm".to_string());
        Ok(Self {
            secret_key,
            base_url,
            callback_url,
        })
    }
}
