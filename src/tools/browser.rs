//! Typed browser automation operations
//!
//! Each operation is a thin parameter-shaping call to
//! [`ToolInvoker::call_tool`]; none adds state or failure modes of its own.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::Result;
use crate::types::tool_result::ToolResult;

use super::invoker::ToolInvoker;

/// Tool names understood by the automation server
pub mod tool_names {
    /// Load a URL
    pub const NAVIGATE: &str = "navigate";
    /// Click an element
    pub const CLICK: &str = "click";
    /// Type into an element
    pub const TYPE: &str = "type";
    /// Evaluate a script in the page
    pub const EVALUATE: &str = "evaluate";
    /// Capture a screenshot
    pub const SCREENSHOT: &str = "screenshot";
    /// Read an element's text
    pub const GET_TEXT: &str = "get_text";
    /// Read an element's attribute
    pub const GET_ATTRIBUTE: &str = "get_attribute";
    /// Wait for an element to appear
    pub const WAIT_FOR_SELECTOR: &str = "wait_for_selector";
    /// Drain the page console
    pub const GET_CONSOLE_LOGS: &str = "get_console_logs";
    /// Close the browser
    pub const CLOSE: &str = "close";
}

/// Extra request time on top of a server-side wait
const WAIT_GRACE: Duration = Duration::from_secs(5);

/// Screenshot parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotOptions {
    /// Capture the full scrollable page
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub full_page: bool,
    /// Capture only this element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// Server-side path to write the image to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ScreenshotOptions {
    /// Capture the full page
    #[must_use]
    pub const fn full_page(mut self) -> Self {
        self.full_page = true;
        self
    }

    /// Capture one element
    #[must_use]
    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Save to `path` on the server
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Browser operations over any [`ToolInvoker`]
pub trait BrowserTools: ToolInvoker {
    /// Load `url`
    fn navigate(&self, url: &str) -> impl Future<Output = Result<ToolResult>> + Send {
        self.call_tool(tool_names::NAVIGATE, json!({ "url": url }))
    }

    /// Click the element matching `selector`
    fn click(&self, selector: &str) -> impl Future<Output = Result<ToolResult>> + Send {
        self.call_tool(tool_names::CLICK, json!({ "selector": selector }))
    }

    /// Type `text` into the element matching `selector`
    fn type_text(
        &self,
        selector: &str,
        text: &str,
    ) -> impl Future<Output = Result<ToolResult>> + Send {
        self.call_tool(
            tool_names::TYPE,
            json!({ "selector": selector, "text": text }),
        )
    }

    /// Evaluate `script` in the page
    fn evaluate(&self, script: &str) -> impl Future<Output = Result<ToolResult>> + Send {
        self.call_tool(tool_names::EVALUATE, json!({ "script": script }))
    }

    /// Capture a screenshot
    fn screenshot(
        &self,
        options: &ScreenshotOptions,
    ) -> impl Future<Output = Result<ToolResult>> + Send {
        let arguments = serde_json::to_value(options).unwrap_or_else(|_| json!({}));
        self.call_tool(tool_names::SCREENSHOT, arguments)
    }

    /// Text content of the element matching `selector`
    fn get_text(&self, selector: &str) -> impl Future<Output = Result<ToolResult>> + Send {
        self.call_tool(tool_names::GET_TEXT, json!({ "selector": selector }))
    }

    /// Value of `attribute` on the element matching `selector`
    fn get_attribute(
        &self,
        selector: &str,
        attribute: &str,
    ) -> impl Future<Output = Result<ToolResult>> + Send {
        self.call_tool(
            tool_names::GET_ATTRIBUTE,
            json!({ "selector": selector, "attribute": attribute }),
        )
    }

    /// Wait until `selector` matches, for at most `timeout` (server side)
    ///
    /// The request itself is allowed to outlive the wait, so a slow match
    /// is reported by the server rather than as a request timeout.
    fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<ToolResult>> + Send {
        let mut arguments = json!({ "selector": selector });
        let request_timeout = timeout.map(|wait| {
            arguments["timeout"] = Value::from(u64::try_from(wait.as_millis()).unwrap_or(u64::MAX));
            self.default_timeout().max(wait + WAIT_GRACE)
        });
        self.call_tool_with_timeout(tool_names::WAIT_FOR_SELECTOR, arguments, request_timeout)
    }

    /// Console messages collected since the last call
    fn get_console_logs(&self) -> impl Future<Output = Result<ToolResult>> + Send {
        self.call_tool(tool_names::GET_CONSOLE_LOGS, json!({}))
    }

    /// Close the browser
    fn close(&self) -> impl Future<Output = Result<ToolResult>> + Send {
        self.call_tool(tool_names::CLOSE, json!({}))
    }
}

impl<T: ToolInvoker> BrowserTools for T {}
