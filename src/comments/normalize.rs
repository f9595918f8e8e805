//! Mapping of heterogeneous raw comment objects onto [`CommentRecord`]
//!
//! The source platform exposes different schemas for top-level comments, replies
//! and rendered DOM items. Each logical field is therefore an ordered list of
//! accessor paths; the first path yielding a present value wins. The order is
//! part of the contract and is kept as plain data below.

use crate::comments::record::{CommentRecord, CommentTime};
use serde_json::Value;

/// Characters of text used when an identifier has to be synthesized
pub const SYNTHETIC_ID_TEXT_CHARS: usize = 40;

/// When a looked-up value counts as present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Rejects empty strings and numeric zero
    Truthy,
    /// Accepts any string or number, empty string included
    NonNull,
    /// Accepts any string or number whose textual form is non-empty
    NonEmpty,
}

/// One logical field of a comment and where to look for it
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub paths: &'static [&'static [&'static str]],
    pub presence: Presence,
}

pub const ID: FieldSpec = FieldSpec {
    name: "id",
    paths: &[&["cid"], &["comment_id"], &["id"], &["aweme_id"], &["uid"]],
    presence: Presence::Truthy,
};

pub const AUTHOR: FieldSpec = FieldSpec {
    name: "author",
    paths: &[&["user", "nickname"], &["user", "unique_id"], &["user", "name"], &["user_name"], &["author"]],
    presence: Presence::Truthy,
};

pub const HANDLE: FieldSpec = FieldSpec {
    name: "handle",
    paths: &[&["user", "unique_id"], &["user", "sec_uid"], &["user_id"], &["handle"]],
    presence: Presence::Truthy,
};

pub const TEXT: FieldSpec = FieldSpec { name: "text", paths: &[&["text"], &["content"], &["desc"]], presence: Presence::NonNull };

pub const LIKES: FieldSpec =
    FieldSpec { name: "likes", paths: &[&["digg_count"], &["like_count"], &["likes"]], presence: Presence::NonEmpty };

pub const TIME: FieldSpec = FieldSpec {
    name: "time",
    paths: &[&["create_time"], &["createTime"], &["comment_time"], &["timestamp"], &["time"]],
    presence: Presence::Truthy,
};

impl FieldSpec {
    /// First present value along the accessor paths, in order
    pub fn first_present<'v>(&self, raw: &'v Value) -> Option<&'v Value> {
        self.paths
            .iter()
            .filter_map(|path| lookup(raw, path))
            .find(|value| is_present(value, self.presence))
    }

    fn first_string(&self, raw: &Value) -> Option<String> {
        self.first_present(raw).and_then(scalar_to_string)
    }
}

fn lookup<'v>(raw: &'v Value, path: &[&str]) -> Option<&'v Value> {
    path.iter().try_fold(raw, |node, key| node.get(*key))
}

fn is_present(value: &Value, presence: Presence) -> bool {
    match (value, presence) {
        (Value::String(s), Presence::Truthy | Presence::NonEmpty) => !s.is_empty(),
        (Value::String(_), Presence::NonNull) => true,
        (Value::Number(n), Presence::Truthy) => n.as_f64().is_some_and(|v| v != 0.0),
        (Value::Number(_), _) => true,
        _ => false,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Whether a raw object carries the markers of a comment: a text-like field or a comment identifier
pub fn is_comment_shaped(raw: &Value) -> bool {
    let Some(object) = raw.as_object() else {
        return false;
    };

    object.get("text").is_some_and(Value::is_string)
        || object.get("content").is_some_and(Value::is_string)
        || object.contains_key("cid")
        || object.contains_key("comment_id")
}

/// Best-effort identity for comments without a source identifier
///
/// Two short comments with the same opening text from handle-less accounts collide.
pub fn synthesize_id(handle: Option<&str>, text: &str) -> String {
    let prefix: String = text.chars().take(SYNTHETIC_ID_TEXT_CHARS).collect();
    format!("{}_{}", handle.unwrap_or(""), prefix)
}

/// Normalize one raw object, or `None` when it is not a comment (not an object, or blank text)
pub fn normalize(raw: &Value) -> Option<CommentRecord> {
    if !raw.is_object() {
        return None;
    }

    let text = TEXT.first_string(raw).unwrap_or_default();
    if text.trim().is_empty() {
        return None;
    }

    let handle = HANDLE.first_string(raw);
    let id = ID.first_string(raw).unwrap_or_else(|| synthesize_id(handle.as_deref(), &text));

    let time = TIME.first_present(raw).and_then(|value| match value {
        Value::Number(n) => Some(CommentTime::Number(n.clone())),
        Value::String(s) => Some(CommentTime::Text(s.clone())),
        _ => None,
    });

    Some(CommentRecord {
        id,
        author: AUTHOR.first_string(raw),
        handle,
        text,
        likes: LIKES.first_string(raw).unwrap_or_else(|| "0".to_string()),
        time,
    })
}
