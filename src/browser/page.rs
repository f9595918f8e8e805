use crate::error::Result;
use serde_json::Value;
use std::time::Duration;

/// A network response observed by a registered listener
///
/// The body is read lazily: most responses are rejected on URL or content
/// type alone and never pay for a body fetch.
pub struct CapturedResponse<'a> {
    url: &'a str,
    content_type: &'a str,
    body: &'a dyn Fn() -> Result<String>,
}

impl<'a> CapturedResponse<'a> {
    pub fn new(url: &'a str, content_type: &'a str, body: &'a dyn Fn() -> Result<String>) -> Self {
        Self { url, content_type, body }
    }

    pub fn url(&self) -> &str {
        self.url
    }

    pub fn content_type(&self) -> &str {
        self.content_type
    }

    /// Fetch the decoded response body
    pub fn body(&self) -> Result<String> {
        (self.body)()
    }
}

/// Callback invoked for every response while a listener is attached
pub type ResponseHandler = Box<dyn Fn(&CapturedResponse<'_>) + Send + Sync>;

/// The browser primitives the harvesting engine needs from a rendered page
pub trait Page {
    /// Load `url` and wait for the navigation to settle
    fn navigate(&self, url: &str) -> Result<()>;

    /// Register `handler` under `name` for all subsequent responses
    fn attach_response_listener(&self, name: &str, handler: ResponseHandler) -> Result<()>;

    /// Remove the listener registered under `name`
    fn detach_response_listener(&self, name: &str) -> Result<()>;

    /// Whether `selector` currently matches an element
    fn exists(&self, selector: &str) -> bool;

    /// Click the first element matching `selector`
    fn click(&self, selector: &str) -> Result<()>;

    /// Block until `selector` matches or `timeout` elapses
    fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Evaluate a script in the page and return its JSON value (`Null` when it yields nothing)
    fn evaluate(&self, script: &str) -> Result<Value>;

    /// Dispatch a key press to the focused document
    fn press_key(&self, key: &str) -> Result<()>;
}

/// Detaches a response listener when dropped, unless detached explicitly first
pub struct ListenerGuard<'p, P: Page + ?Sized> {
    page: &'p P,
    name: String,
    attached: bool,
}

impl<'p, P: Page + ?Sized> ListenerGuard<'p, P> {
    /// Attach `handler` under `name` and return a guard owning the registration
    pub fn attach(page: &'p P, name: impl Into<String>, handler: ResponseHandler) -> Result<Self> {
        let name = name.into();
        page.attach_response_listener(&name, handler)?;
        Ok(Self { page, name, attached: true })
    }

    /// Detach now, surfacing any error
    pub fn detach(mut self) -> Result<()> {
        self.attached = false;
        self.page.detach_response_listener(&self.name)
    }
}

impl<P: Page + ?Sized> Drop for ListenerGuard<'_, P> {
    fn drop(&mut self) {
        if self.attached {
            if let Err(e) = self.page.detach_response_listener(&self.name) {
                log::debug!("Failed to detach listener '{}': {}", self.name, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarvestError;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingPage {
        calls: RefCell<Vec<String>>,
    }

    impl Page for RecordingPage {
        fn navigate(&self, url: &str) -> Result<()> {
            self.calls.borrow_mut().push(format!("navigate {}", url));
            Ok(())
        }

        fn attach_response_listener(&self, name: &str, _handler: ResponseHandler) -> Result<()> {
            self.calls.borrow_mut().push(format!("attach {}", name));
            Ok(())
        }

        fn detach_response_listener(&self, name: &str) -> Result<()> {
            self.calls.borrow_mut().push(format!("detach {}", name));
            Ok(())
        }

        fn exists(&self, _selector: &str) -> bool {
            false
        }

        fn click(&self, selector: &str) -> Result<()> {
            Err(HarvestError::ElementNotFound(selector.to_string()))
        }

        fn wait_for(&self, _selector: &str, _timeout: Duration) -> Result<()> {
            Ok(())
        }

        fn evaluate(&self, _script: &str) -> Result<Value> {
            Ok(Value::Null)
        }

        fn press_key(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_guard_detaches_once_explicitly() {
        let page = RecordingPage::default();
        let guard = ListenerGuard::attach(&page, "h", Box::new(|_| {})).unwrap();
        guard.detach().unwrap();

        assert_eq!(*page.calls.borrow(), vec!["attach h", "detach h"]);
    }

    #[test]
    fn test_guard_detaches_on_drop() {
        let page = RecordingPage::default();
        {
            let _guard = ListenerGuard::attach(&page, "h", Box::new(|_| {})).unwrap();
            page.navigate("about:blank").unwrap();
        }

        assert_eq!(*page.calls.borrow(), vec!["attach h", "navigate about:blank", "detach h"]);
    }

    #[test]
    fn test_captured_response_reads_body_lazily() {
        let reads = std::cell::Cell::new(0);
        let body = || {
            reads.set(reads.get() + 1);
            Ok("{}".to_string())
        };
        let response = CapturedResponse::new("https://x/api", "application/json", &body);

        assert_eq!(response.url(), "https://x/api");
        assert_eq!(reads.get(), 0);
        assert_eq!(response.body().unwrap(), "{}");
        assert_eq!(reads.get(), 1);
    }
}
