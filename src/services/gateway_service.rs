use crate::{
    config::GatewayConfig,
    error::{ApiError, Result},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Single concrete adapter for the payment provider's HTTP API:
/// hosted payment links, charge verification, and bank transfers.
/// All three flows share one authenticated client and one config.
pub struct PaymentGateway {
    config: GatewayConfig,
    http_client: reqwest::Client,
}

/// Outcome of creating a hosted payment page
#[derive(Debug, Clone)]
pub struct PaymentLink {
    pub link: String,
}

/// Settled charge as reported by the provider's verify endpoint
#[derive(Debug, Clone)]
pub struct VerifiedCharge {
    pub tx_ref: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

impl VerifiedCharge {
    pub fn is_successful(&self) -> bool {
        self.status == "successful"
    }
}

/// Acknowledged bank transfer
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub provider_transfer_id: u64,
    pub reference: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
struct CreatePaymentBody<'a> {
    tx_ref: &'a str,
    amount: i64,
    currency: &'a str,
    redirect_url: &'a str,
    customer: CustomerBody<'a>,
    customizations: CustomizationsBody<'a>,
}

#[derive(Debug, Serialize)]
struct CustomerBody<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct CustomizationsBody<'a> {
    title: &'a str,
}

#[derive(Debug, Serialize)]
struct TransferBody<'a> {
    account_bank: &'a str,
    account_number: &'a str,
    amount: i64,
    currency: &'a str,
    narration: &'a str,
    reference: &'a str,
}

/// The provider wraps every response in {status, message, data}
#[derive(Debug, Deserialize)]
struct ProviderEnvelope<T> {
    status: String,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct PaymentLinkData {
    link: String,
}

#[derive(Debug, Deserialize)]
struct ChargeData {
    tx_ref: String,
    amount: i64,
    currency: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct TransferData {
    id: u64,
    reference: String,
    status: String,
}

impl PaymentGateway {
    pub fn new(config: &GatewayConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .unwrap_or_default();

        Self {
            config: config.clone(),
            http_client,
        }
    }

    pub fn currency(&self) -> &str {
        &self.config.currency
    }

    /// Create a hosted payment page for a payment intent. No retry;
    /// a provider or network failure aborts the initiating request.
    #[instrument(skip(self))]
    pub async fn create_payment_link(
        &self,
        tx_ref: &str,
        amount: i64,
        customer_email: &str,
        title: &str,
        redirect_url: &str,
    ) -> Result<PaymentLink> {
        let body = CreatePaymentBody {
            tx_ref,
            amount,
            currency: &self.config.currency,
            redirect_url,
            customer: CustomerBody {
                email: customer_email,
            },
            customizations: CustomizationsBody { title },
        };

        let url = format!("{}/payments", self.config.api_base);
        let envelope: ProviderEnvelope<PaymentLinkData> = self.post_json(&url, &body).await?;

        let data = Self::unwrap_success(envelope)?;

        info!("Created payment link for tx_ref={}", tx_ref);

        Ok(PaymentLink { link: data.link })
    }

    /// Fetch the settled state of a charge by the provider's
    /// transaction id. Callers must check `is_successful()` and
    /// compare the amount against the matching payment intent.
    #[instrument(skip(self))]
    pub async fn verify_charge(&self, provider_tx_id: &str) -> Result<VerifiedCharge> {
        let url = format!(
            "{}/transactions/{}/verify",
            self.config.api_base, provider_tx_id
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| ApiError::PaymentProvider(format!("verify request failed: {}", e)))?;

        let envelope: ProviderEnvelope<ChargeData> = response
            .json()
            .await
            .map_err(|e| ApiError::PaymentProvider(format!("invalid verify response: {}", e)))?;

        let data = Self::unwrap_success(envelope)?;

        Ok(VerifiedCharge {
            tx_ref: data.tx_ref,
            amount: data.amount,
            currency: data.currency,
            status: data.status,
        })
    }

    /// Pay out to a creator's bank account. Used by the immediate
    /// withdrawal path and the periodic sweep.
    #[instrument(skip(self))]
    pub async fn transfer_to_bank(
        &self,
        bank_code: &str,
        account_number: &str,
        amount: i64,
        narration: &str,
        reference: &str,
    ) -> Result<TransferReceipt> {
        let body = TransferBody {
            account_bank: bank_code,
            account_number,
            amount,
            currency: &self.config.currency,
            narration,
            reference,
        };

        let url = format!("{}/transfers", self.config.api_base);
        let envelope: ProviderEnvelope<TransferData> = self.post_json(&url, &body).await?;

        let data = Self::unwrap_success(envelope)?;

        info!(
            "Initiated bank transfer reference={} provider_id={}",
            data.reference, data.id
        );

        Ok(TransferReceipt {
            provider_transfer_id: data.id,
            reference: data.reference,
            status: data.status,
        })
    }

    async fn post_json<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<ProviderEnvelope<T>> {
        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.config.secret_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::PaymentProvider(format!("request failed: {}", e)))?;

        response
            .json()
            .await
            .map_err(|e| ApiError::PaymentProvider(format!("invalid response format: {}", e)))
    }

    fn unwrap_success<T>(envelope: ProviderEnvelope<T>) -> Result<T> {
        if envelope.status != "success" {
            let msg = envelope
                .message
                .unwrap_or_else(|| "no message from provider".to_string());
            warn!("Provider returned non-success status: {}", msg);
            return Err(ApiError::PaymentProvider(msg));
        }

        envelope
            .data
            .ok_or_else(|| ApiError::PaymentProvider("success response without data".to_string()))
    }

    /// Compare the webhook signature header against the configured
    /// hash. Both sides are digested first so the comparison does not
    /// leak length.
    pub fn webhook_signature_valid(&self, header_value: &str) -> bool {
        use sha2::{Digest, Sha256};

        let ours = Sha256::digest(self.config.webhook_hash.as_bytes());
        let theirs = Sha256::digest(header_value.as_bytes());
        ours == theirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> GatewayConfig {
        GatewayConfig {
            secret_key: "sk_test_xxx".to_string(),
            api_base: "https://api.example-pay.test/v3".to_string(),
            currency: "NGN".to_string(),
            webhook_hash: "whsec_abc".to_string(),
            request_timeout_ms: 10_000,
        }
    }

    #[test]
    fn successful_charge_requires_successful_status() {
        let charge = VerifiedCharge {
            tx_ref: "SUB_1_a_b".to_string(),
            amount: 1000,
            currency: "NGN".to_string(),
            status: "successful".to_string(),
        };
        assert!(charge.is_successful());

        let failed = VerifiedCharge {
            status: "failed".to_string(),
            ..charge
        };
        assert!(!failed.is_successful());
    }

    #[test]
    fn webhook_signature_must_match_configured_hash() {
        let gateway = PaymentGateway::new(&test_config());
        assert!(gateway.webhook_signature_valid("whsec_abc"));
        assert!(!gateway.webhook_signature_valid("whsec_other"));
    }

    #[test]
    fn non_success_envelope_is_a_provider_error() {
        let envelope: ProviderEnvelope<PaymentLinkData> = ProviderEnvelope {
            status: "error".to_string(),
            message: Some("invalid key".to_string()),
            data: None,
        };
        let err = PaymentGateway::unwrap_success(envelope).unwrap_err();
        assert!(matches!(err, ApiError::PaymentProvider(_)));
    }
}
