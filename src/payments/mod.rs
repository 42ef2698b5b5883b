use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

pub mod paystack;

pub use paystack::PaystackClient;

/// Result of a successful initialize call: where to send the browser,
/// and the reference the gateway will report back with.
#[derive(Debug, Clone)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub reference: String,
}

/// Gateway-reported state of a transaction, fetched server-side.
/// A client-supplied success flag is never trusted in its place.
#[derive(Debug, Clone)]
pub struct VerifiedTransaction {
    pub reference: String,
    pub status: String,
    pub amount: i64,
    pub paid_at: Option<DateTime<Utc>>,
}

impl VerifiedTransaction {
    /// Anything other than an explicit success is treated as non-success.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Hosted-checkout payment gateway boundary.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a transaction for the given payer and amount (minor units).
    /// The caller supplies the reference so the order row and the gateway
    /// share one identifier.
    async fn initialize_transaction(
        &self,
        email: &str,
        amount: i64,
        reference: &str,
        metadata: Value,
    ) -> anyhow::Result<InitializedTransaction>;

    /// Re-fetch the transaction state from the gateway by reference.
    async fn verify_transaction(&self, reference: &str) -> anyhow::Result<VerifiedTransaction>;
}
