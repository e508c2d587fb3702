//! `tools/call` request shaping and result unwrapping

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use crate::client::AutomationClient;
use crate::control::protocol::RequestCorrelator;
use crate::error::Result;
use crate::types::tool_result::ToolResult;

/// Method used for every tool invocation
pub const TOOLS_CALL_METHOD: &str = "tools/call";

/// Anything that can send a request and await its correlated response
pub trait RequestSender: Send + Sync {
    /// Send `method` with `params`; `timeout` overrides the default
    fn send_request(
        &self,
        method: &str,
        params: Value,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<Value>> + Send;

    /// Timeout applied when none is given
    fn default_timeout(&self) -> Duration;
}

impl RequestSender for AutomationClient {
    fn send_request(
        &self,
        method: &str,
        params: Value,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<Value>> + Send {
        Self::send_request(self, method, params, timeout)
    }

    fn default_timeout(&self) -> Duration {
        self.options().request_timeout
    }
}

impl RequestSender for RequestCorrelator {
    fn send_request(
        &self,
        method: &str,
        params: Value,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<Value>> + Send {
        Self::send_request(self, method, params, timeout)
    }

    fn default_timeout(&self) -> Duration {
        Self::default_timeout(self)
    }
}

impl<T: RequestSender> RequestSender for Arc<T> {
    fn send_request(
        &self,
        method: &str,
        params: Value,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<Value>> + Send {
        T::send_request(self, method, params, timeout)
    }

    fn default_timeout(&self) -> Duration {
        T::default_timeout(self)
    }
}

/// Invoke server tools by name
///
/// Implemented for every [`RequestSender`].
pub trait ToolInvoker: RequestSender {
    /// Call tool `name` with `arguments` using the default timeout
    ///
    /// # Errors
    /// Any error from the underlying request
    fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> impl Future<Output = Result<ToolResult>> + Send {
        self.call_tool_with_timeout(name, arguments, None)
    }

    /// Call tool `name` with an explicit request timeout
    ///
    /// # Errors
    /// Any error from the underlying request
    fn call_tool_with_timeout(
        &self,
        name: &str,
        arguments: Value,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<ToolResult>> + Send {
        let params = json!({ "name": name, "arguments": arguments });
        async move {
            let result = self.send_request(TOOLS_CALL_METHOD, params, timeout).await?;
            Ok(ToolResult::from_result(result))
        }
    }
}

impl<T: RequestSender> ToolInvoker for T {}
