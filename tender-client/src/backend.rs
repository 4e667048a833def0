//! Payment backend operation contracts
//!
//! | Operation | Endpoint |
//! |---|---|
//! | `create_intent` | `POST api/orders/{order_id}/payments/terminal/intents` |
//! | `capture_intent` | `POST api/orders/{order_id}/payments/terminal/capture` |
//! | `cancel_intent` | `POST api/payments/terminal/intents/{intent_id}/cancel` |
//! | `process_cash` | `POST api/orders/{order_id}/payments/cash` |
//! | `gift_card_balance` | `GET api/gift-cards/{code}` |
//! | `process_gift_card` | `POST api/orders/{order_id}/payments/gift-card` |
//! | `calculate_surcharge` | `POST api/payments/surcharge` |
//! | `refund_transaction` | `POST api/payments/{payment_id}/refunds` |
//!
//! Every endpoint answers with the [`shared::ApiResponse`] envelope.

use crate::http::{HttpClient, into_data};
use crate::{ClientError, ClientResult, NetworkHttpClient};
use async_trait::async_trait;
use reqwest::Url;
use rust_decimal::Decimal;
use shared::ApiResponse;
use shared::tender::{
    CaptureIntentRequest, CashTenderRequest, CreateIntentRequest, GiftCardBalance,
    GiftCardTenderRequest, LedgerUpdate, PaymentIntent, PaymentRecord, RefundRequest,
    SurchargeQuote, SurchargeRequest,
};
use tracing::debug;

/// Payment backend operations used by the tender engine
#[async_trait]
pub trait TenderBackend: Send + Sync {
    /// Create a terminal payment intent for `amount` (tip excluded) plus `tip`
    async fn create_intent(
        &self,
        order_id: &str,
        request: &CreateIntentRequest,
    ) -> ClientResult<PaymentIntent>;

    /// Capture a collected intent. Safe to retry with the same intent ID.
    async fn capture_intent(&self, order_id: &str, intent_id: &str) -> ClientResult<LedgerUpdate>;

    /// Cancel an intent that will not be captured
    async fn cancel_intent(&self, intent_id: &str) -> ClientResult<()>;

    /// Post a cash tender
    async fn process_cash(&self, order_id: &str, amount: Decimal) -> ClientResult<LedgerUpdate>;

    /// Look up the remaining balance of a gift card
    async fn gift_card_balance(&self, code: &str) -> ClientResult<GiftCardBalance>;

    /// Post a gift card tender
    async fn process_gift_card(
        &self,
        order_id: &str,
        code: &str,
        amount: Decimal,
    ) -> ClientResult<LedgerUpdate>;

    /// Surcharge for charging `amount` by card
    async fn calculate_surcharge(&self, amount: Decimal) -> ClientResult<SurchargeQuote>;

    /// Refund part of a transaction; returns the full payment record
    async fn refund_transaction(
        &self,
        payment_id: &str,
        request: &RefundRequest,
    ) -> ClientResult<PaymentRecord>;
}

/// REST implementation of [`TenderBackend`]
#[derive(Debug, Clone)]
pub struct HttpTenderBackend<C: HttpClient = NetworkHttpClient> {
    http: C,
}

impl<C: HttpClient> HttpTenderBackend<C> {
    pub fn new(http: C) -> Self {
        Self { http }
    }
}

/// `prefix/segment`, with `segment` percent-encoded as a single path segment
fn path_with_segment(prefix: &str, segment: &str) -> ClientResult<String> {
    let mut url =
        Url::parse("http://backend/").map_err(|e| ClientError::Internal(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ClientError::Internal("URL cannot carry a path".into()))?
        .pop_if_empty()
        .extend(prefix.split('/').filter(|s| !s.is_empty()))
        .push(segment);
    Ok(url.path().trim_start_matches('/').to_string())
}

fn new_idempotency_key() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[async_trait]
impl<C: HttpClient> TenderBackend for HttpTenderBackend<C> {
    async fn create_intent(
        &self,
        order_id: &str,
        request: &CreateIntentRequest,
    ) -> ClientResult<PaymentIntent> {
        debug!(order_id, amount = %request.amount, tip = %request.tip, "create_intent");
        let key = new_idempotency_key();
        let resp: ApiResponse<PaymentIntent> = self
            .http
            .post(
                &format!("api/orders/{}/payments/terminal/intents", order_id),
                request,
                Some(key.as_str()),
            )
            .await?;
        into_data(resp)
    }

    async fn capture_intent(&self, order_id: &str, intent_id: &str) -> ClientResult<LedgerUpdate> {
        debug!(order_id, intent_id, "capture_intent");
        let body = CaptureIntentRequest {
            intent_id: intent_id.to_string(),
        };
        // The intent ID doubles as idempotency key so retried captures collapse
        let resp: ApiResponse<LedgerUpdate> = self
            .http
            .post(
                &format!("api/orders/{}/payments/terminal/capture", order_id),
                &body,
                Some(intent_id),
            )
            .await?;
        into_data(resp)
    }

    async fn cancel_intent(&self, intent_id: &str) -> ClientResult<()> {
        debug!(intent_id, "cancel_intent");
        let resp: ApiResponse<serde_json::Value> = self
            .http
            .post_empty(
                &format!("api/payments/terminal/intents/{}/cancel", intent_id),
                Some(intent_id),
            )
            .await?;
        if !resp.is_success() {
            into_data(resp)?;
        }
        Ok(())
    }

    async fn process_cash(&self, order_id: &str, amount: Decimal) -> ClientResult<LedgerUpdate> {
        debug!(order_id, %amount, "process_cash");
        let key = new_idempotency_key();
        let resp: ApiResponse<LedgerUpdate> = self
            .http
            .post(
                &format!("api/orders/{}/payments/cash", order_id),
                &CashTenderRequest { amount },
                Some(key.as_str()),
            )
            .await?;
        into_data(resp)
    }

    async fn gift_card_balance(&self, code: &str) -> ClientResult<GiftCardBalance> {
        let path = path_with_segment("api/gift-cards", code)?;
        let resp: ApiResponse<GiftCardBalance> = self.http.get(&path).await?;
        into_data(resp)
    }

    async fn process_gift_card(
        &self,
        order_id: &str,
        code: &str,
        amount: Decimal,
    ) -> ClientResult<LedgerUpdate> {
        debug!(order_id, %amount, "process_gift_card");
        let key = new_idempotency_key();
        let body = GiftCardTenderRequest {
            code: code.to_string(),
            amount,
        };
        let resp: ApiResponse<LedgerUpdate> = self
            .http
            .post(
                &format!("api/orders/{}/payments/gift-card", order_id),
                &body,
                Some(key.as_str()),
            )
            .await?;
        into_data(resp)
    }

    async fn calculate_surcharge(&self, amount: Decimal) -> ClientResult<SurchargeQuote> {
        let resp: ApiResponse<SurchargeQuote> = self
            .http
            .post("api/payments/surcharge", &SurchargeRequest { amount }, None)
            .await?;
        into_data(resp)
    }

    async fn refund_transaction(
        &self,
        payment_id: &str,
        request: &RefundRequest,
    ) -> ClientResult<PaymentRecord> {
        debug!(payment_id, transaction_id = %request.transaction_id, amount = %request.amount, "refund_transaction");
        let key = new_idempotency_key();
        let resp: ApiResponse<PaymentRecord> = self
            .http
            .post(
                &format!("api/payments/{}/refunds", payment_id),
                request,
                Some(key.as_str()),
            )
            .await?;
        into_data(resp)
    }
}
