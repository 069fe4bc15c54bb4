//! Alert delivery for the `run` and `tick` commands.
//!
//! Both notifiers render the launch panel in the subscriber's configured
//! timezone. [`StdoutNotifier`] prints it; [`WebhookNotifier`] POSTs it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use launchwatch_core::{ConfigResolver, DispatchError, LaunchRecord, Notifier, SubscriberKey};
use serde::Serialize;
use tracing::warn;

use crate::panel::{ALERT_MESSAGE, render_panel};

fn subscriber_timezone(resolver: &dyn ConfigResolver, subscriber: &SubscriberKey) -> Tz {
    match resolver.timezone(subscriber) {
        Ok(name) => name.parse().unwrap_or(Tz::UTC),
        Err(e) => {
            warn!(subscriber = %subscriber, error = %e, "could not resolve timezone; using UTC");
            Tz::UTC
        }
    }
}

pub struct StdoutNotifier {
    resolver: Arc<dyn ConfigResolver>,
}

impl StdoutNotifier {
    pub fn new(resolver: Arc<dyn ConfigResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn send_alert(
        &self,
        subscriber: &SubscriberKey,
        launch: &LaunchRecord,
    ) -> Result<(), DispatchError> {
        let tz = subscriber_timezone(self.resolver.as_ref(), subscriber);
        let panel = render_panel(launch, tz, Utc::now(), Some(ALERT_MESSAGE));
        println!("--- to {subscriber} ---\n{panel}\n");
        Ok(())
    }

    fn name(&self) -> &str {
        "stdout"
    }
}

/// JSON body POSTed for each alert.
#[derive(Debug, Serialize)]
pub struct AlertPayload<'a> {
    pub subscriber: String,
    pub server_id: Option<&'a str>,
    pub target_id: &'a str,
    pub timezone: &'a str,
    pub content: String,
    pub launch: &'a LaunchRecord,
}

pub struct WebhookNotifier {
    url: String,
    resolver: Arc<dyn ConfigResolver>,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, resolver: Arc<dyn ConfigResolver>) -> Self {
        Self {
            url: url.into(),
            resolver,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_alert(
        &self,
        subscriber: &SubscriberKey,
        launch: &LaunchRecord,
    ) -> Result<(), DispatchError> {
        let tz = subscriber_timezone(self.resolver.as_ref(), subscriber);
        let payload = AlertPayload {
            subscriber: subscriber.to_string(),
            server_id: subscriber.scope(),
            target_id: subscriber.target_id(),
            timezone: tz.name(),
            content: render_panel(launch, tz, Utc::now(), Some(ALERT_MESSAGE)),
            launch,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DispatchError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            warn!(url = %self.url, %status, body = %body, "webhook returned non-2xx status");
            return Err(DispatchError::Delivery(format!("webhook returned {status}")));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchwatch_core::MemoryStore;
    use launchwatch_core::options::{ConfigStore, SubscriberConfig};

    #[test]
    fn payload_carries_panel_and_target() {
        let launch = LaunchRecord::new("alpha", "Alpha").with_win_open("2018-02-12T14:00Z");
        let subscriber = SubscriberKey::channel("360523650912223253", "general");
        let payload = AlertPayload {
            subscriber: subscriber.to_string(),
            server_id: subscriber.scope(),
            target_id: subscriber.target_id(),
            timezone: "UTC",
            content: "panel".to_string(),
            launch: &launch,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["subscriber"], "channel:360523650912223253/general");
        assert_eq!(json["server_id"], "360523650912223253");
        assert_eq!(json["target_id"], "general");
        assert_eq!(json["launch"]["slug"], "alpha");
    }

    #[test]
    fn timezone_comes_from_subscriber_config() {
        let configs = ConfigStore::new(Arc::new(MemoryStore::new()));
        let subscriber = SubscriberKey::user("42");
        let mut config = SubscriberConfig::new(subscriber.clone());
        config.set("timezone", "Asia/Tokyo").unwrap();
        configs.save(&config).unwrap();

        assert_eq!(subscriber_timezone(&configs, &subscriber), chrono_tz::Asia::Tokyo);
        assert_eq!(subscriber_timezone(&configs, &SubscriberKey::user("7")), Tz::UTC);
    }

    #[tokio::test]
    async fn unreachable_webhook_is_a_delivery_error() {
        let configs: Arc<dyn ConfigResolver> = Arc::new(ConfigStore::new(Arc::new(MemoryStore::new())));
        let notifier = WebhookNotifier::new("http://127.0.0.1:9/hook", configs);
        let launch = LaunchRecord::new("alpha", "Alpha");
        let err = notifier.send_alert(&SubscriberKey::user("42"), &launch).await.unwrap_err();
        assert!(matches!(err, DispatchError::Delivery(_)));
    }
}
