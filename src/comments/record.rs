use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Canonical comment shape produced from either network payloads or rendered DOM
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentRecord {
    /// Source identifier, or `{handle}_{first 40 chars of text}` when the source has none
    pub id: String,

    /// Display name
    pub author: Option<String>,

    /// Account identifier
    pub handle: Option<String>,

    /// Comment body, never blank
    pub text: String,

    /// Like count exactly as the source formats it
    pub likes: String,

    /// Raw timestamp or relative label; never parsed
    pub time: Option<CommentTime>,
}

/// A source timestamp: epoch numbers from the API, display labels from the DOM
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CommentTime {
    Number(Number),
    Text(String),
}

impl From<&str> for CommentTime {
    fn from(label: &str) -> Self {
        CommentTime::Text(label.to_string())
    }
}

impl From<i64> for CommentTime {
    fn from(epoch: i64) -> Self {
        CommentTime::Number(epoch.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_nulls_and_untagged_time() {
        let record = CommentRecord {
            id: "7301".to_string(),
            author: None,
            handle: Some("jane".to_string()),
            text: "first!".to_string(),
            likes: "0".to_string(),
            time: Some(1_700_000_000.into()),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "7301",
                "author": null,
                "handle": "jane",
                "text": "first!",
                "likes": "0",
                "time": 1700000000
            })
        );
    }

    #[test]
    fn test_text_time_round_trips() {
        let record: CommentRecord = serde_json::from_value(json!({
            "id": "a", "author": "A", "handle": null, "text": "t", "likes": "1.2K", "time": "2d ago"
        }))
        .unwrap();

        assert_eq!(record.time, Some(CommentTime::from("2d ago")));
        assert_eq!(record.likes, "1.2K");
    }
}
