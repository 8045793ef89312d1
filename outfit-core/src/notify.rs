use crate::{
    Config,
    error::PipelineError,
    model::{Advisory, NotificationReceipt, NotificationRequest},
    notify::pushover::PushoverNotifier,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod pushover;

/// Push-notification transport.
#[async_trait]
pub trait Notifier: Send + Sync + Debug {
    async fn send(
        &self,
        request: &NotificationRequest,
    ) -> Result<NotificationReceipt, PipelineError>;
}

/// Formats advisories and hands them to a [`Notifier`], at most once per call.
#[derive(Debug)]
pub struct NotificationDispatcher {
    notifier: Box<dyn Notifier>,
    priority: i8,
}

impl NotificationDispatcher {
    pub fn new(notifier: Box<dyn Notifier>, priority: i8) -> Self {
        Self { notifier, priority }
    }

    pub async fn dispatch(
        &self,
        advisory: &Advisory,
        title: &str,
        sound: &str,
    ) -> Result<NotificationReceipt, PipelineError> {
        let request = NotificationRequest {
            title: title.to_string(),
            message: render_message(advisory),
            sound: sound.to_string(),
            priority: self.priority,
        };

        self.notifier.send(&request).await
    }
}

/// Render an advisory as the notification body.
pub fn render_message(advisory: &Advisory) -> String {
    let accessories = if advisory.accessories.is_empty() {
        "none".to_string()
    } else {
        advisory.accessories.join(", ")
    };

    format!(
        "Summary: {}.\nClothing: {}.\nUmbrella: {}.\nAccessories: {}.\nWeather: {}.",
        advisory.summary,
        advisory.clothing,
        advisory.umbrella,
        accessories,
        advisory.conditions,
    )
}

/// Construct the dispatcher from config.
pub fn dispatcher_from_config(config: &Config) -> anyhow::Result<NotificationDispatcher> {
    let (api_token, user_key) = config.notification_credentials()?;
    let notifier = PushoverNotifier::new(
        &config.notification.base_url,
        api_token,
        user_key,
        config.notification.timeout_secs,
    )?;

    Ok(NotificationDispatcher::new(Box::new(notifier), config.notification.priority))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Umbrella;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<NotificationRequest>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(
            &self,
            request: &NotificationRequest,
        ) -> Result<NotificationReceipt, PipelineError> {
            self.sent.lock().unwrap().push(request.clone());
            Ok(NotificationReceipt { status: Some(1), request: Some("r-1".into()), raw: "{}".into() })
        }
    }

    fn advisory(accessories: Vec<&str>) -> Advisory {
        Advisory {
            summary: "Cold and wet".into(),
            clothing: "Heavy jacket with warm layers".into(),
            umbrella: Umbrella::Yes,
            accessories: accessories.into_iter().map(String::from).collect(),
            conditions: "8°C, feels like 5°C, wind 20 km/h, rain chance 60%".into(),
        }
    }

    #[test]
    fn renders_all_sections() {
        let message = render_message(&advisory(vec!["umbrella", "windbreaker"]));

        assert_eq!(
            message,
            "Summary: Cold and wet.\n\
             Clothing: Heavy jacket with warm layers.\n\
             Umbrella: yes.\n\
             Accessories: umbrella, windbreaker.\n\
             Weather: 8°C, feels like 5°C, wind 20 km/h, rain chance 60%."
        );
    }

    #[test]
    fn renders_empty_accessories_as_none() {
        assert!(render_message(&advisory(vec![])).contains("Accessories: none."));
    }

    #[tokio::test]
    async fn dispatch_builds_request_from_advisory() {
        let notifier = std::sync::Arc::new(RecordingNotifier::default());

        #[derive(Debug)]
        struct Shared(std::sync::Arc<RecordingNotifier>);

        #[async_trait]
        impl Notifier for Shared {
            async fn send(
                &self,
                request: &NotificationRequest,
            ) -> Result<NotificationReceipt, PipelineError> {
                self.0.send(request).await
            }
        }

        let dispatcher = NotificationDispatcher::new(Box::new(Shared(notifier.clone())), 0);
        let receipt = dispatcher
            .dispatch(&advisory(vec!["scarf"]), "Clothing Suggestion", "falling")
            .await
            .expect("dispatch");

        assert_eq!(receipt.request.as_deref(), Some("r-1"));

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, "Clothing Suggestion");
        assert_eq!(sent[0].sound, "falling");
        assert_eq!(sent[0].priority, 0);
        assert!(sent[0].message.contains("Accessories: scarf."));
    }

    #[test]
    fn dispatcher_from_config_requires_credentials() {
        let err = dispatcher_from_config(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("Notification credentials are incomplete"));
    }
}
