use serde::{Deserialize, Serialize};

/// One transcript turn between the user and the strategist.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "sender", rename_all = "snake_case")]
pub enum ChatMessage {
    User { text: String },
    #[serde(rename = "ai")]
    Assistant { text: String },
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::User { text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::User { text } | Self::Assistant { text } => text,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Self::User { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::ChatMessage;

    #[test]
    fn serializes_with_sender_tag() {
        let json = serde_json::to_value(ChatMessage::assistant("hello")).expect("serialize");
        assert_eq!(json["sender"], "ai");
        assert_eq!(json["text"], "hello");

        let user: ChatMessage =
            serde_json::from_str(r#"{"sender":"user","text":"lower it?"}"#).expect("deserialize");
        assert!(user.is_user());
        assert_eq!(user.text(), "lower it?");
    }
}
