//! Passive harvesting of comments from intercepted API responses
//!
//! The listener runs on whatever thread the browser driver delivers network
//! events on. It never touches the [`CommentBag`] directly: mined records are
//! sent over a channel and drained by the owning [`NetworkHarvester`], so the
//! bag keeps a single owner for the whole visit.

use crate::{browser::{CapturedResponse, ResponseHandler},
            comments::{bag::CommentBag,
                       normalize::{is_comment_shaped, normalize},
                       record::CommentRecord}};
use serde_json::Value;
use std::sync::{Arc,
                atomic::{AtomicUsize, Ordering},
                mpsc::{self, Receiver, Sender}};

/// URL fragment of the comment listing endpoint (replies included)
pub const DEFAULT_ENDPOINT_PATTERN: &str = "/api/comment/list";

/// Array keys conventionally holding child comments; descended into before other properties
pub const CHILD_COMMENT_KEYS: &[&str] = &["comments", "reply_comment", "replies"];

/// Nesting bound for walking untrusted payloads
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Decides which responses are worth parsing
#[derive(Debug, Clone)]
pub struct ResponseFilter {
    endpoint_pattern: String,
}

impl ResponseFilter {
    pub fn new(endpoint_pattern: impl AsRef<str>) -> Self {
        Self { endpoint_pattern: endpoint_pattern.as_ref().to_ascii_lowercase() }
    }

    /// URL contains the endpoint pattern and the content type is JSON, both case-insensitively
    pub fn matches(&self, url: &str, content_type: &str) -> bool {
        url.to_ascii_lowercase().contains(&self.endpoint_pattern) && content_type.to_ascii_lowercase().contains("json")
    }
}

impl Default for ResponseFilter {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT_PATTERN)
    }
}

/// Walk a payload and normalize every comment-shaped object found at any depth
///
/// Depth-first pre-order with an explicit stack: an object is considered before
/// its children, child-comment arrays before other properties. Nodes nested
/// deeper than `max_depth` are skipped.
pub fn mine_comments(root: &Value, max_depth: usize) -> Vec<CommentRecord> {
    let mut found = Vec::new();
    let mut stack: Vec<(&Value, usize)> = vec![(root, 0)];
    let mut skipped = 0usize;

    while let Some((node, depth)) = stack.pop() {
        if depth > max_depth {
            skipped += 1;
            continue;
        }

        let children: Vec<&Value> = match node {
            Value::Array(items) => items.iter().collect(),
            Value::Object(object) => {
                if is_comment_shaped(node) {
                    found.extend(normalize(node));
                }

                let child_arrays = CHILD_COMMENT_KEYS.iter().filter_map(|key| object.get(*key)).filter(|v| v.is_array());
                let other_containers = object
                    .iter()
                    .filter(|(key, value)| !(value.is_array() && CHILD_COMMENT_KEYS.contains(&key.as_str())))
                    .map(|(_, value)| value)
                    .filter(|value| value.is_array() || value.is_object());

                child_arrays.chain(other_containers).collect()
            }
            _ => continue,
        };

        stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
    }

    if skipped > 0 {
        log::debug!("Skipped {} nodes nested deeper than {}", skipped, max_depth);
    }

    found
}

/// Filter, read, parse and mine one response; every failure yields an empty result
pub fn harvest_response(filter: &ResponseFilter, max_depth: usize, response: &CapturedResponse<'_>) -> Vec<CommentRecord> {
    if !filter.matches(response.url(), response.content_type()) {
        return Vec::new();
    }

    let body = match response.body() {
        Ok(body) => body,
        Err(e) => {
            log::debug!("Skipping response {}: {}", response.url(), e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Value>(&body) {
        Ok(payload) => mine_comments(&payload, max_depth),
        Err(e) => {
            log::debug!("Skipping malformed payload from {}: {}", response.url(), e);
            Vec::new()
        }
    }
}

/// Owns the comment bag of one page visit and hands out the listener that feeds it
pub struct NetworkHarvester {
    filter: ResponseFilter,
    max_depth: usize,
    sender: Sender<CommentRecord>,
    receiver: Receiver<CommentRecord>,
    payloads: Arc<AtomicUsize>,
    bag: CommentBag,
}

impl NetworkHarvester {
    pub fn new(filter: ResponseFilter, max_depth: usize) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { filter, max_depth, sender, receiver, payloads: Arc::new(AtomicUsize::new(0)), bag: CommentBag::new() }
    }

    /// A listener forwarding mined records to this harvester
    ///
    /// Records sent after the harvester is dropped are discarded.
    pub fn listener(&self) -> ResponseHandler {
        let filter = self.filter.clone();
        let max_depth = self.max_depth;
        let sender = self.sender.clone();
        let payloads = Arc::clone(&self.payloads);

        Box::new(move |response| {
            let records = harvest_response(&filter, max_depth, response);
            if records.is_empty() {
                return;
            }

            payloads.fetch_add(1, Ordering::Relaxed);
            log::debug!("Mined {} comments from {}", records.len(), response.url());

            for record in records {
                if sender.send(record).is_err() {
                    break;
                }
            }
        })
    }

    /// Move everything delivered so far into the bag; returns the number of new ids
    pub fn collect(&mut self) -> usize {
        let mut added = 0;
        for record in self.receiver.try_iter() {
            if self.bag.insert(record) {
                added += 1;
            }
        }
        added
    }

    /// Number of responses that yielded at least one comment
    pub fn payloads(&self) -> usize {
        self.payloads.load(Ordering::Relaxed)
    }

    pub fn bag(&self) -> &CommentBag {
        &self.bag
    }

    /// Drain outstanding deliveries and give up the bag
    pub fn into_bag(mut self) -> CommentBag {
        self.collect();
        self.bag
    }
}

impl Default for NetworkHarvester {
    fn default() -> Self {
        Self::new(ResponseFilter::default(), DEFAULT_MAX_DEPTH)
    }
}
