use serde::{ Deserializer, Serialize, Deserialize };

/// Body of `POST /api/main`. Absent or `null` fields decode as empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelayRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub conversation_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub parent_message_id: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
    where D: Deserializer<'de>
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reply of `POST /api/main`. The identifiers are omitted on the
/// empty-message shortcut.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl RelayResponse {
    pub fn reply(message: String, conversation_id: String, message_id: String) -> Self {
        Self {
            message,
            conversation_id: Some(conversation_id),
            message_id: Some(message_id),
        }
    }

    pub fn prompt(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conversation_id: None,
            message_id: None,
        }
    }
}

/// Identifiers that thread a new message onto an existing conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Continuation {
    pub conversation_id: String,
    pub parent_message_id: String,
}

/// What the completion service hands back for one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionReply {
    pub text: String,
    pub id: String,
    pub conversation_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_fields_default_to_empty() {
        let req: RelayRequest = serde_json::from_value(json!({ "message": "hi" })).unwrap();
        assert_eq!(req.message, "hi");
        assert_eq!(req.conversation_id, "");
        assert_eq!(req.parent_message_id, "");

        let req: RelayRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(req, RelayRequest::default());
    }

    #[test]
    fn null_fields_decode_as_empty() {
        let req: RelayRequest = serde_json::from_value(json!({
            "message": null,
            "conversationId": null,
            "parentMessageId": "m1"
        })).unwrap();
        assert_eq!(req.message, "");
        assert_eq!(req.conversation_id, "");
        assert_eq!(req.parent_message_id, "m1");
    }

    #[test]
    fn prompt_response_has_no_identifiers() {
        let json = serde_json::to_value(RelayResponse::prompt("Please type something")).unwrap();
        assert_eq!(json, json!({ "message": "Please type something" }));
    }

    #[test]
    fn reply_uses_camel_case_keys() {
        let resp = RelayResponse::reply("hi".into(), "c1".into(), "m1".into());
        let json = serde_json::to_value(resp).unwrap();
        assert_eq!(json, json!({ "message": "hi", "conversationId": "c1", "messageId": "m1" }));
    }
}
