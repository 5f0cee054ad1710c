use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::coordinator::notification::get_payload;
use crate::error::{PushError, PushResult};

/// Payload of a backend `registration` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationData {
    #[serde(rename = "registrationId")]
    pub registration_id: String,

    /// Any further fields the backend reports (e.g. `registrationType`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RegistrationData {
    pub fn new(registration_id: impl Into<String>) -> Self {
        Self {
            registration_id: registration_id.into(),
            extra: Map::new(),
        }
    }

    /// Parse raw backend data; a string `registrationId` is required
    pub fn from_value(value: Value) -> PushResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| PushError::Backend(format!("malformed registration event: {e}")))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// An inbound push notification, opaque apart from a few well-known fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Notification(Value);

impl Notification {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn into_raw(self) -> Value {
        self.0
    }

    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.0.get("title").and_then(Value::as_str)
    }

    pub fn additional_data(&self) -> Option<&Map<String, Value>> {
        self.0.get("additionalData").and_then(Value::as_object)
    }

    /// `additionalData.payload`, or an empty object
    pub fn payload(&self) -> Value {
        get_payload(&self.0)
    }
}

impl From<Value> for Notification {
    fn from(raw: Value) -> Self {
        Self(raw)
    }
}

/// Error surfaced asynchronously by a push backend
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<BackendError> for PushError {
    fn from(error: BackendError) -> Self {
        PushError::Backend(error.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registration_data_requires_string_id() {
        let data = RegistrationData::from_value(json!({
            "registrationId": "tok-1",
            "registrationType": "FCM"
        }))
        .unwrap();
        assert_eq!(data.registration_id, "tok-1");
        assert_eq!(data.extra.get("registrationType"), Some(&json!("FCM")));

        assert!(RegistrationData::from_value(json!({"registrationId": 7})).is_err());
        assert!(RegistrationData::from_value(json!({})).is_err());
    }

    #[test]
    fn test_notification_accessors() {
        let notification = Notification::new(json!({
            "title": "Hello",
            "message": "World",
            "additionalData": { "payload": { "route": "/inbox" }, "foreground": true }
        }));
        assert_eq!(notification.title(), Some("Hello"));
        assert_eq!(notification.message(), Some("World"));
        assert_eq!(
            notification.additional_data().and_then(|d| d.get("foreground")),
            Some(&json!(true))
        );
        assert_eq!(notification.payload(), json!({"route": "/inbox"}));
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::new("SERVICE_NOT_AVAILABLE").with_details(json!({"code": 3}));
        assert_eq!(err.to_string(), "SERVICE_NOT_AVAILABLE");
        assert_eq!(
            PushError::from(err),
            PushError::Backend("SERVICE_NOT_AVAILABLE".into())
        );
    }
}
