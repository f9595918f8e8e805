use crate::{browser::{config::{ConnectionOptions, LaunchOptions},
                      page::{CapturedResponse, Page, ResponseHandler}},
            error::{HarvestError, Result}};
use base64::Engine;
use headless_chrome::{Browser, Tab, protocol::cdp::Network};
use serde_json::Value;
use std::{ffi::OsStr, path::Path, sync::Arc, time::Duration};

/// Attempts made to read a response body that may not be buffered yet
const BODY_READ_ATTEMPTS: u32 = 3;

/// Delay between body read attempts
const BODY_READ_BACKOFF: Duration = Duration::from_millis(100);

/// Cookie keys forwarded to Chrome; anything else in an export is dropped
const COOKIE_KEYS: &[&str] = &["name", "value", "domain", "path", "secure", "httpOnly", "sameSite", "expires"];

/// Browser session that manages a Chrome/Chromium instance and the single tab pages are visited in
pub struct BrowserSession {
    /// The underlying headless_chrome Browser instance
    browser: Browser,

    /// Tab every page visit runs in
    tab: Arc<Tab>,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Drop the automation switches the page can observe through navigator.webdriver
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // A batch can run for hours; the default 30 second idle timeout would kill it between pages
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));
        launch_opts.sandbox = options.sandbox;

        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }

        if let Some(dir) = options.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }

        let browser = Browser::new(launch_opts).map_err(|e| HarvestError::LaunchFailed(e.to_string()))?;

        let tab = browser.new_tab().map_err(|e| HarvestError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        Self::prepare_tab(&tab, options.user_agent.as_deref(), options.navigation_timeout)?;

        Ok(Self { browser, tab })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect(options.ws_url).map_err(|e| HarvestError::ConnectionFailed(e.to_string()))?;

        let tab =
            browser.new_tab().map_err(|e| HarvestError::ConnectionFailed(format!("Failed to create tab: {}", e)))?;

        Self::prepare_tab(&tab, options.user_agent.as_deref(), Duration::from_millis(options.timeout))?;

        Ok(Self { browser, tab })
    }

    fn prepare_tab(tab: &Arc<Tab>, user_agent: Option<&str>, timeout: Duration) -> Result<()> {
        tab.set_default_timeout(timeout);

        if let Some(ua) = user_agent {
            tab.set_user_agent(ua, None, None)
                .map_err(|e| HarvestError::TabOperationFailed(format!("Failed to set user agent: {}", e)))?;
        }

        Ok(())
    }

    /// Get the working tab
    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Load cookies from a browser cookie export (JSON array) into the working tab
    ///
    /// A missing file is not an error and yields zero cookies.
    pub fn load_cookies(&self, path: &Path) -> Result<usize> {
        if !path.exists() {
            return Ok(0);
        }

        let raw: Vec<Value> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        let cookies = raw.iter().filter_map(cookie_param).collect::<Vec<_>>();
        let count = cookies.len();

        self.tab
            .set_cookies(cookies)
            .map_err(|e| HarvestError::TabOperationFailed(format!("Failed to set cookies: {}", e)))?;

        Ok(count)
    }

    /// Close all tabs; the browser process exits when the session is dropped
    pub fn close(&self) -> Result<()> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| HarvestError::TabOperationFailed(format!("Failed to get tabs: {}", e)))?
            .clone();

        for tab in tabs {
            let _ = tab.close(false);
        }
        Ok(())
    }
}

impl Page for BrowserSession {
    fn navigate(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| HarvestError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;

        Ok(())
    }

    fn attach_response_listener(&self, name: &str, handler: ResponseHandler) -> Result<()> {
        self.tab
            .register_response_handling(
                name,
                Box::new(move |event_params, fetch_body| {
                    let response = &event_params.response;
                    let read_body = || -> Result<String> {
                        let mut attempt = 1;
                        loop {
                            match fetch_body() {
                                Ok(body) => return decode_body(body.body, body.base_64_encoded),
                                Err(e) if attempt >= BODY_READ_ATTEMPTS => {
                                    return Err(HarvestError::TabOperationFailed(format!(
                                        "Failed to read body of {}: {}",
                                        response.url, e
                                    )));
                                }
                                Err(_) => {
                                    attempt += 1;
                                    std::thread::sleep(BODY_READ_BACKOFF);
                                }
                            }
                        }
                    };

                    handler(&CapturedResponse::new(&response.url, &response.mime_type, &read_body));
                }),
            )
            .map_err(|e| HarvestError::ListenerFailed { name: name.to_string(), reason: e.to_string() })?;

        Ok(())
    }

    fn detach_response_listener(&self, name: &str) -> Result<()> {
        self.tab
            .deregister_response_handling(name)
            .map_err(|e| HarvestError::ListenerFailed { name: name.to_string(), reason: e.to_string() })?;

        Ok(())
    }

    fn exists(&self, selector: &str) -> bool {
        self.tab.find_element(selector).is_ok()
    }

    fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .tab
            .find_element(selector)
            .map_err(|e| HarvestError::ElementNotFound(format!("Element '{}' not found: {}", selector, e)))?;

        element
            .click()
            .map_err(|e| HarvestError::TabOperationFailed(format!("Failed to click '{}': {}", selector, e)))?;

        Ok(())
    }

    fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map_err(|e| HarvestError::ElementNotFound(format!("Element '{}' did not appear: {}", selector, e)))?;

        Ok(())
    }

    fn evaluate(&self, script: &str) -> Result<Value> {
        let result = self.tab.evaluate(script, false).map_err(|e| HarvestError::EvaluationFailed(e.to_string()))?;

        Ok(result.value.unwrap_or(Value::Null))
    }

    fn press_key(&self, key: &str) -> Result<()> {
        self.tab
            .press_key(key)
            .map_err(|e| HarvestError::TabOperationFailed(format!("Failed to press {}: {}", key, e)))?;

        Ok(())
    }
}

fn decode_body(body: String, base64_encoded: bool) -> Result<String> {
    if !base64_encoded {
        return Ok(body);
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(body.as_bytes())
        .map_err(|e| HarvestError::TabOperationFailed(format!("Invalid base64 body: {}", e)))?;

    String::from_utf8(bytes).map_err(|e| HarvestError::TabOperationFailed(format!("Body is not UTF-8: {}", e)))
}

/// Convert one exported cookie into a CDP cookie parameter, skipping entries Chrome would reject
fn cookie_param(raw: &Value) -> Option<Network::CookieParam> {
    let object = raw.as_object()?;
    let mut filtered = serde_json::Map::new();

    for key in COOKIE_KEYS {
        if let Some(value) = object.get(*key) {
            // Session cookies are exported with expires = -1
            if *key == "expires" && value.as_f64().is_none_or(|v| v <= 0.0) {
                continue;
            }
            filtered.insert(key.to_string(), value.clone());
        }
    }

    match serde_json::from_value(Value::Object(filtered)) {
        Ok(cookie) => Some(cookie),
        Err(e) => {
            log::warn!("Skipping cookie {:?}: {}", object.get("name"), e);
            None
        }
    }
}
