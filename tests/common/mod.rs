//! Scripted in-memory page shared by the integration tests

#![allow(dead_code)]

use comment_harvester::{HarvestError, Page, Result,
                        browser::{CapturedResponse, ResponseHandler},
                        comments::scripts};
use serde_json::{Value, json};
use std::{collections::{HashMap, VecDeque},
          sync::Mutex,
          time::Duration};

/// A network response the fake page delivers to attached listeners
#[derive(Debug, Clone)]
pub struct FakeResponse {
    pub url: String,
    pub content_type: String,
    pub body: String,
}

impl FakeResponse {
    pub fn comments(body: Value) -> Self {
        Self {
            url: "https://www.tiktok.com/api/comment/list/?aweme_id=1&cursor=0".to_string(),
            content_type: "application/json; charset=utf-8".to_string(),
            body: body.to_string(),
        }
    }

    pub fn other(url: &str, content_type: &str, body: &str) -> Self {
        Self { url: url.to_string(), content_type: content_type.to_string(), body: body.to_string() }
    }
}

/// What one URL serves
#[derive(Debug, Clone, Default)]
pub struct FakeContent {
    /// Delivered during navigation
    pub initial: Vec<FakeResponse>,
    /// One delivered per scroll
    pub on_scroll: Vec<FakeResponse>,
    /// Visible counts per round; the last one repeats
    pub counts: Vec<usize>,
    /// Value returned by the DOM extraction script
    pub dom: Value,
}

#[derive(Default)]
struct Current {
    on_scroll: VecDeque<FakeResponse>,
    counts: VecDeque<usize>,
    last_count: usize,
    dom: Value,
}

#[derive(Default)]
pub struct FakePage {
    pages: HashMap<String, FakeContent>,
    current: Mutex<Current>,
    listeners: Mutex<Vec<(String, ResponseHandler)>>,
    calls: Mutex<Vec<String>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, content: FakeContent) -> Self {
        self.pages.insert(url.to_string(), content);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn position(&self, call: &str) -> Option<usize> {
        self.calls().iter().position(|c| c == call)
    }

    pub fn last_position(&self, call: &str) -> Option<usize> {
        self.calls().iter().rposition(|c| c == call)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn deliver(&self, response: &FakeResponse) {
        let body = response.body.clone();
        let read_body = move || -> Result<String> { Ok(body.clone()) };
        let captured = CapturedResponse::new(&response.url, &response.content_type, &read_body);

        for (_, handler) in self.listeners.lock().unwrap().iter() {
            handler(&captured);
        }
    }
}

impl Page for FakePage {
    fn navigate(&self, url: &str) -> Result<()> {
        self.record(format!("navigate:{}", url));

        let content = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| HarvestError::NavigationFailed(format!("{} unreachable", url)))?;

        *self.current.lock().unwrap() = Current {
            on_scroll: content.on_scroll.into(),
            counts: content.counts.into(),
            last_count: 0,
            dom: content.dom,
        };

        for response in &content.initial {
            self.deliver(response);
        }
        Ok(())
    }

    fn attach_response_listener(&self, name: &str, handler: ResponseHandler) -> Result<()> {
        self.record(format!("attach:{}", name));
        self.listeners.lock().unwrap().push((name.to_string(), handler));
        Ok(())
    }

    fn detach_response_listener(&self, name: &str) -> Result<()> {
        self.record(format!("detach:{}", name));
        self.listeners.lock().unwrap().retain(|(n, _)| n != name);
        Ok(())
    }

    fn exists(&self, selector: &str) -> bool {
        selector == scripts::COMMENT_LIST
    }

    fn click(&self, selector: &str) -> Result<()> {
        self.record(format!("click:{}", selector));
        Ok(())
    }

    fn wait_for(&self, _selector: &str, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    fn evaluate(&self, script: &str) -> Result<Value> {
        if script == scripts::COUNT_COMMENTS {
            self.record("count");
            let mut current = self.current.lock().unwrap();
            if let Some(next) = current.counts.pop_front() {
                current.last_count = next;
            }
            Ok(json!(current.last_count))
        } else if script == scripts::SCROLL_COMMENTS {
            self.record("scroll");
            let next = self.current.lock().unwrap().on_scroll.pop_front();
            if let Some(response) = next {
                self.deliver(&response);
            }
            Ok(json!("container"))
        } else if script == scripts::EXPAND_REPLIES {
            self.record("expand");
            Ok(json!(0))
        } else if script == scripts::DISMISS_OVERLAYS {
            self.record("dismiss");
            Ok(json!(0))
        } else if script == scripts::EXTRACT_COMMENTS {
            self.record("extract");
            Ok(self.current.lock().unwrap().dom.clone())
        } else {
            Err(HarvestError::EvaluationFailed("unknown script".to_string()))
        }
    }

    fn press_key(&self, key: &str) -> Result<()> {
        self.record(format!("key:{}", key));
        Ok(())
    }
}

/// A comment listing payload with the given `(cid, text)` pairs
pub fn listing(comments: &[(&str, &str)]) -> Value {
    let items: Vec<Value> = comments
        .iter()
        .map(|(cid, text)| {
            json!({
                "cid": cid,
                "text": text,
                "digg_count": 1,
                "create_time": 1700000000,
                "user": {"nickname": "Nick", "unique_id": "nick"}
            })
        })
        .collect();
    json!({"status_code": 0, "comments": items, "has_more": 1})
}
