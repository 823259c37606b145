use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

use notehive_core::models::NewFileEvent;
use notehive_db::SubscriptionStore;

use super::fcm::{is_permanent_error_code, FcmMessage, FcmNotification, FcmResponse};

/// Configuration for the push service
#[derive(Clone)]
pub struct PushServiceConfig {
    pub api_url: String,
    pub server_key: String,
    pub timeout_seconds: u64,
    pub max_concurrent_deliveries: usize,
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// The provider reported the endpoint permanently dead; prune it.
    PermanentlyInvalid(String),
    /// Transient failure; left for the next notification cycle, not retried.
    Transient(String),
}

/// Fans "new file" events out to registered push subscriptions.
///
/// Delivery is fire-and-forget: a slow or unreachable subscriber can never
/// delay or fail the upload that triggered the event. Permanently-dead
/// endpoints are removed from the subscription set.
#[derive(Clone)]
pub struct PushService {
    subscriptions: Arc<dyn SubscriptionStore>,
    http_client: Client,
    config: PushServiceConfig,
}

impl PushService {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionStore>,
        config: PushServiceConfig,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .context("Failed to create HTTP client for push delivery")?;

        Ok(Self {
            subscriptions,
            http_client,
            config,
        })
    }

    /// Fan an event out to every active subscription.
    ///
    /// Deliveries run concurrently behind a semaphore; this method returns
    /// once every delivery task has been spawned.
    #[tracing::instrument(skip(self, event), fields(record_id = %event.record_id))]
    pub async fn notify_new_file(&self, event: NewFileEvent) -> Result<()> {
        let subscriptions = self
            .subscriptions
            .list_active()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to load subscriptions: {}", e))?;

        if subscriptions.is_empty() {
            tracing::debug!("No active subscriptions for new-file event");
            return Ok(());
        }

        tracing::info!(
            subscriber_count = subscriptions.len(),
            "Fanning out new-file notification"
        );

        let semaphore = Arc::new(tokio::sync::Semaphore::new(
            self.config.max_concurrent_deliveries,
        ));

        for subscription in subscriptions {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .context("Failed to acquire semaphore permit")?;

            let service = self.clone();
            let event = event.clone();
            tokio::spawn(async move {
                let outcome = service.send_push(&subscription.endpoint, &event).await;
                drop(permit);

                match outcome {
                    Ok(DeliveryOutcome::Delivered) => {
                        tracing::debug!(
                            subscription_id = %subscription.id,
                            "Push delivered"
                        );
                    }
                    Ok(DeliveryOutcome::PermanentlyInvalid(reason)) => {
                        tracing::warn!(
                            subscription_id = %subscription.id,
                            reason = %reason,
                            "Endpoint permanently invalid, pruning subscription"
                        );
                        if let Err(e) = service
                            .subscriptions
                            .remove_by_endpoint(&subscription.endpoint)
                            .await
                        {
                            tracing::warn!(
                                subscription_id = %subscription.id,
                                error = %e,
                                "Failed to prune dead subscription"
                            );
                        }
                    }
                    Ok(DeliveryOutcome::Transient(reason)) => {
                        tracing::warn!(
                            subscription_id = %subscription.id,
                            reason = %reason,
                            "Push delivery failed, left for next cycle"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            subscription_id = %subscription.id,
                            error = %e,
                            "Push delivery errored"
                        );
                    }
                }
            });
        }

        Ok(())
    }

    /// Send one push message and classify the outcome.
    async fn send_push(&self, endpoint: &str, event: &NewFileEvent) -> Result<DeliveryOutcome> {
        let message = FcmMessage {
            to: endpoint.to_string(),
            notification: FcmNotification {
                title: "Notehive".to_string(),
                body: event.message_body(),
            },
            data: serde_json::json!({
                "record_id": event.record_id,
                "program": event.program,
                "semester": event.semester,
                "subject": event.subject,
            }),
        };

        let response = self
            .http_client
            .post(&self.config.api_url)
            .header("Authorization", format!("key={}", self.config.server_key))
            .json(&message)
            .send()
            .await
            .context("Failed to send push request")?;

        let status = response.status();
        let parsed = response.json::<FcmResponse>().await.ok();

        Ok(classify_delivery(status, parsed.as_ref()))
    }
}

/// Classify a provider response into a delivery outcome.
///
/// HTTP 404/410 and the provider's dead-token error codes are permanent;
/// everything else that is not a 2xx success is transient.
fn classify_delivery(status: StatusCode, response: Option<&FcmResponse>) -> DeliveryOutcome {
    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        return DeliveryOutcome::PermanentlyInvalid(format!("HTTP {}", status));
    }
    if !status.is_success() {
        return DeliveryOutcome::Transient(format!("HTTP {}", status));
    }
    if let Some(error) = response.and_then(FcmResponse::first_error) {
        if is_permanent_error_code(error) {
            return DeliveryOutcome::PermanentlyInvalid(error.to_string());
        }
        return DeliveryOutcome::Transient(error.to_string());
    }
    DeliveryOutcome::Delivered
}
