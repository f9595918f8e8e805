//! Fallback extraction of comments from the rendered document
//!
//! Used only when no comment payload was intercepted during a visit. The in-page
//! script locates containers and sub-elements; filtering and normalization
//! happen here so the same rules apply regardless of markup changes.

use crate::{browser::Page,
            comments::{normalize::normalize, record::CommentRecord, scripts},
            error::Result};
use serde::Deserialize;
use serde_json::{Value, json};

/// Fields read from one rendered comment container, before cleaning
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DomComment {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub likes: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rendering artifacts that look like comments: a lone `@`, or a bare mention of the commenter's own handle
pub fn is_noise(text: &str, handle: Option<&str>) -> bool {
    if text == "@" {
        return true;
    }

    match handle {
        Some(handle) if !text.is_empty() => {
            let naked = text.strip_prefix('@').unwrap_or(text).trim().to_lowercase();
            naked == handle.to_lowercase()
        }
        _ => false,
    }
}

/// Clean, filter and normalize one DOM item
pub fn clean_dom_item(item: DomComment) -> Option<CommentRecord> {
    let text = collapse_whitespace(item.text.as_deref().unwrap_or_default());
    let handle = item.handle.filter(|h| !h.is_empty());

    if text.is_empty() || is_noise(&text, handle.as_deref()) {
        return None;
    }

    let likes = item.likes.map(|l| collapse_whitespace(&l)).filter(|l| !l.is_empty());

    normalize(&json!({
        "author": item.author.map(|a| collapse_whitespace(&a)),
        "handle": handle,
        "text": text,
        "likes": likes.unwrap_or_else(|| "0".to_string()),
        "time": item.time.map(|t| collapse_whitespace(&t)),
    }))
}

/// Run the extraction script once and return records in document order
pub fn extract_comments<P: Page + ?Sized>(page: &P) -> Result<Vec<CommentRecord>> {
    let items: Vec<DomComment> = match page.evaluate(scripts::EXTRACT_COMMENTS)? {
        Value::String(json) => serde_json::from_str(&json)?,
        Value::Null => Vec::new(),
        other => serde_json::from_value(other)?,
    };

    let total = items.len();
    let records: Vec<CommentRecord> = items.into_iter().filter_map(clean_dom_item).collect();
    log::debug!("DOM extraction kept {} of {} rendered items", records.len(), total);

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::record::CommentTime;

    fn item(handle: Option<&str>, text: &str) -> DomComment {
        DomComment { handle: handle.map(str::to_string), text: Some(text.to_string()), ..Default::default() }
    }

    #[test]
    fn test_self_mention_is_noise() {
        assert!(is_noise("@Jane", Some("jane")));
        assert!(is_noise("jane", Some("Jane")));
        assert!(is_noise("@jane ", Some("jane")));
        assert!(!is_noise("@jane nice one", Some("jane")));
        assert!(!is_noise("@someone", Some("jane")));
        assert!(!is_noise("@jane", None));
    }

    #[test]
    fn test_lone_at_is_noise() {
        assert!(is_noise("@", None));
        assert!(is_noise("@", Some("jane")));
    }

    #[test]
    fn test_noise_items_produce_no_record() {
        assert!(clean_dom_item(item(Some("jane"), "@jane")).is_none());
        assert!(clean_dom_item(item(None, "@")).is_none());
        assert!(clean_dom_item(item(Some("jane"), "   ")).is_none());
        assert!(clean_dom_item(DomComment::default()).is_none());
    }

    #[test]
    fn test_dom_item_normalized() {
        let raw = DomComment {
            author: Some("Jane  D".to_string()),
            handle: Some("jane".to_string()),
            text: Some("so  good\n @bob  ".to_string()),
            likes: Some("1.2K".to_string()),
            time: Some("2d ago".to_string()),
        };

        let record = clean_dom_item(raw).unwrap();
        assert_eq!(record.text, "so good @bob");
        assert_eq!(record.author.as_deref(), Some("Jane D"));
        assert_eq!(record.handle.as_deref(), Some("jane"));
        assert_eq!(record.likes, "1.2K");
        assert_eq!(record.time, Some(CommentTime::from("2d ago")));
        assert_eq!(record.id, "jane_so good @bob");
    }

    #[test]
    fn test_missing_likes_default_to_zero() {
        let record = clean_dom_item(item(None, "hello")).unwrap();
        assert_eq!(record.likes, "0");
        assert_eq!(record.id, "_hello");
        assert!(record.author.is_none());
    }

    #[test]
    fn test_script_output_deserializes() {
        let json = r#"[{"author":null,"handle":"a","text":"hey","likes":null,"time":null},{"text":"@"}]"#;
        let items: Vec<DomComment> = serde_json::from_str(json).unwrap();
        let records: Vec<_> = items.into_iter().filter_map(clean_dom_item).collect();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "hey");
    }
}
