use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;
use tracing::error;

use crate::config::PaymentConfig;

use super::{InitializedTransaction, PaymentGateway, VerifiedTransaction};

/// Minimal Paystack client built on reqwest.
pub struct PaystackClient {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
    callback_url: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
    reference: String,
    amount: i64,
    paid_at: Option<DateTime<Utc>>,
}

impl PaystackClient {
    pub fn new(config: &PaymentConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            secret_key: config.secret_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            callback_url: config.callback_url.clone(),
        })
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        error!(
            status = %status,
            response_body = %body,
            context = %context,
            "payment gateway request failed"
        );

        anyhow::bail!(
            "payment gateway request failed: {} (status {})",
            context,
            status
        );
    }

    fn unwrap_envelope<T>(envelope: Envelope<T>, context: &str) -> Result<T> {
        if !envelope.status {
            anyhow::bail!(
                "payment gateway rejected {}: {}",
                context,
                envelope.message.as_deref().unwrap_or("<no message>")
            );
        }
        envelope
            .data
            .ok_or_else(|| anyhow::anyhow!("payment gateway returned no data for {}", context))
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize_transaction(
        &self,
        email: &str,
        amount: i64,
        reference: &str,
        metadata: Value,
    ) -> Result<InitializedTransaction> {
        let body = serde_json::json!({
            "email": email,
            "amount": amount,
            "reference": reference,
            "callback_url": self.callback_url,
            "metadata": metadata,
        });

        let resp = self
            .http
            .post(format!("{}/transaction/initialize", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "initialize transaction").await?;

        let envelope: Envelope<InitializeData> = resp.json().await?;
        let data = Self::unwrap_envelope(envelope, "initialize transaction")?;

        Ok(InitializedTransaction {
            authorization_url: data.authorization_url,
            reference: data.reference,
        })
    }

    async fn verify_transaction(&self, reference: &str) -> Result<VerifiedTransaction> {
        let resp = self
            .http
            .get(format!("{}/transaction/verify/{}", self.base_url, reference))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "verify transaction").await?;

        let envelope: Envelope<VerifyData> = resp.json().await?;
        let data = Self::unwrap_envelope(envelope, "verify transaction")?;

        Ok(VerifiedTransaction {
            reference: data.reference,
            status: data.status,
            amount: data.amount,
            paid_at: data.paid_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_initialize_envelope() {
        let raw = r#"{
            "status": true,
            "message": "Authorization URL created",
            "data": {
                "authorization_url": "https://checkout.example.com/0peioxfhpn",
                "access_code": "0peioxfhpn",
                "reference": "7PVGX8MEk85tgeEpVDtD"
            }
        }"#;

        let envelope: Envelope<InitializeData> = serde_json::from_str(raw).unwrap();
        let data = PaystackClient::unwrap_envelope(envelope, "initialize transaction").unwrap();
        assert_eq!(
            data.authorization_url,
            "https://checkout.example.com/0peioxfhpn"
        );
        assert_eq!(data.reference, "7PVGX8MEk85tgeEpVDtD");
    }

    #[test]
    fn parses_verify_envelope_and_success_flag() {
        let raw = r#"{
            "status": true,
            "message": "Verification successful",
            "data": {
                "status": "success",
                "reference": "7PVGX8MEk85tgeEpVDtD",
                "amount": 3200,
                "paid_at": "2024-05-01T10:03:00Z"
            }
        }"#;

        let envelope: Envelope<VerifyData> = serde_json::from_str(raw).unwrap();
        let data = PaystackClient::unwrap_envelope(envelope, "verify transaction").unwrap();
        let verified = VerifiedTransaction {
            reference: data.reference,
            status: data.status,
            amount: data.amount,
            paid_at: data.paid_at,
        };
        assert!(verified.is_success());
        assert_eq!(verified.amount, 3200);
    }

    #[test]
    fn rejected_envelope_is_an_error() {
        let raw = r#"{ "status": false, "message": "Invalid key" }"#;
        let envelope: Envelope<InitializeData> = serde_json::from_str(raw).unwrap();
        let err = PaystackClient::unwrap_envelope(envelope, "initialize transaction").unwrap_err();
        assert!(err.to_string().contains("Invalid key"));
    }

    #[test]
    fn non_success_statuses_are_not_success() {
        for status in ["failed", "abandoned", "pending", "reversed"] {
            let verified = VerifiedTransaction {
                reference: "ref".into(),
                status: status.into(),
                amount: 100,
                paid_at: None,
            };
            assert!(!verified.is_success(), "{status} must not count as success");
        }
    }
}
