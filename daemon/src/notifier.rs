//! Notification requests and their delivery to Pushover.

use crate::error::NotifierError;

/// A single (title, body) pair destined for the configured device.
/// Ephemeral: dispatched once, then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Delivery transport for notifications.
///
/// A failed delivery is the caller's to log; it must never end the session.
pub trait Notifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifierError>;
}

const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// [`Notifier`] backed by the Pushover message API.
pub struct PushoverNotifier {
    client: reqwest::Client,
    token: String,
    user_key: String,
    /// Target device name; empty delivers to all of the user's devices.
    device: String,
}

impl PushoverNotifier {
    pub fn new(
        token: impl Into<String>,
        user_key: impl Into<String>,
        device: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.into(),
            user_key: user_key.into(),
            device: device.into(),
        }
    }

    /// Form fields for one message; the device is omitted when unset.
    fn form_fields<'a>(&'a self, notification: &'a Notification) -> Vec<(&'static str, &'a str)> {
        let mut fields = vec![
            ("token", self.token.as_str()),
            ("user", self.user_key.as_str()),
            ("title", notification.title.as_str()),
            ("message", notification.body.as_str()),
        ];
        if !self.device.is_empty() {
            fields.push(("device", self.device.as_str()));
        }
        fields
    }
}

impl Notifier for PushoverNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifierError> {
        let response = self
            .client
            .post(PUSHOVER_API_URL)
            .form(&self.form_fields(notification))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifierError::Rejected {
                status: response.status(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Notification ──────────────────────────────────────────────────────────

    #[test]
    fn new_accepts_str_and_string() {
        let n = Notification::new("Shields Are Down", String::from("Shields are down, Commander!"));
        assert_eq!(n.title, "Shields Are Down");
        assert_eq!(n.body, "Shields are down, Commander!");
    }

    // ── form_fields ───────────────────────────────────────────────────────────

    #[test]
    fn form_fields_without_device() {
        let notifier = PushoverNotifier::new("tok", "usr", "");
        let n = Notification::new("Title", "Body");
        let fields = notifier.form_fields(&n);
        assert_eq!(
            fields,
            vec![
                ("token", "tok"),
                ("user", "usr"),
                ("title", "Title"),
                ("message", "Body"),
            ]
        );
    }

    #[test]
    fn form_fields_with_device() {
        let notifier = PushoverNotifier::new("tok", "usr", "phone");
        let n = Notification::new("Title", "Body");
        let fields = notifier.form_fields(&n);
        assert_eq!(fields.last(), Some(&("device", "phone")));
    }
}
