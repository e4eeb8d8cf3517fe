//! Extension runtime messages
//!
//! Shapes exchanged between the content script, the background worker and
//! the popup over the extension's runtime messaging.

use serde::{Deserialize, Serialize};
use tldrr_core::{ServiceRequest, ServiceResponse};
use ts_rs::TS;

use crate::gemini::GeminiClient;
use crate::request::RequestType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "action", rename_all = "camelCase")]
#[ts(export)]
pub enum ExtensionMessage {
    /// Content script -> background: run one transformation
    TranslateText {
        text: String,
        #[serde(rename = "type")]
        request_type: String,
    },
    /// Background/popup -> content script: stored settings changed
    SettingsUpdated,
    /// Popup -> content script: a new key was saved
    ApiKeyUpdated {
        #[serde(rename = "apiKey")]
        api_key: String,
    },
}

impl From<&ServiceRequest> for ExtensionMessage {
    fn from(request: &ServiceRequest) -> Self {
        Self::TranslateText {
            text: request.text.clone(),
            request_type: request.request_type().to_string(),
        }
    }
}

/// Background side of the protocol.
///
/// Answers `translateText` with an envelope; every other message is not
/// addressed to the background and yields `None`.
pub async fn handle_message(client: &GeminiClient, message: ExtensionMessage, api_key: Option<&str>) -> Option<ServiceResponse> {
    match message {
        ExtensionMessage::TranslateText { text, request_type } => {
            let request_type = RequestType::parse(&request_type);
            let response = match client.translate(&text, &request_type, api_key).await {
                Ok(data) => ServiceResponse::success(data),
                Err(e) => {
                    log::error!("service: {request_type} failed: {e}");
                    e.into()
                }
            };
            Some(response)
        }
        ExtensionMessage::SettingsUpdated | ExtensionMessage::ApiKeyUpdated { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tldrr_core::{Action, Ticket};

    #[test]
    fn test_wire_format() {
        let msg: ExtensionMessage = serde_json::from_str(r#"{"action":"translateText","text":"hi","type":"tldr"}"#).unwrap();
        assert_eq!(
            msg,
            ExtensionMessage::TranslateText {
                text: "hi".into(),
                request_type: "tldr".into()
            }
        );

        let json = serde_json::to_string(&ExtensionMessage::ApiKeyUpdated { api_key: "k".into() }).unwrap();
        assert_eq!(json, r#"{"action":"apiKeyUpdated","apiKey":"k"}"#);

        let msg: ExtensionMessage = serde_json::from_str(r#"{"action":"settingsUpdated"}"#).unwrap();
        assert_eq!(msg, ExtensionMessage::SettingsUpdated);
    }

    #[test]
    fn test_from_service_request() {
        let request = ServiceRequest {
            ticket: Ticket::default(),
            action: Action::ThreadTldr,
            text: "Post: x".into(),
        };
        assert_eq!(
            ExtensionMessage::from(&request),
            ExtensionMessage::TranslateText {
                text: "Post: x".into(),
                request_type: "thread-tldr".into()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_key_envelope() {
        let client = GeminiClient::default();
        let msg = ExtensionMessage::TranslateText {
            text: "hello".into(),
            request_type: "translate".into(),
        };
        let response = handle_message(&client, msg, None).await.unwrap();
        assert_eq!(
            response,
            ServiceResponse::failure("API key not configured. Please set your Gemini API key in the extension popup.")
        );
    }

    #[tokio::test]
    async fn test_content_messages_are_ignored() {
        let client = GeminiClient::default();
        assert!(handle_message(&client, ExtensionMessage::SettingsUpdated, Some("k")).await.is_none());
    }
}
