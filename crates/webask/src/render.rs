//! Page renderers: turn a URL into the HTML a reader would see

use async_trait::async_trait;
use kill_tree::{blocking::kill_tree_with_config, Config as KillConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::{WebAskError, WebAskResult};

const RENDER_SCRIPT: &str = include_str!("scripts/render_page.js");
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(60);

#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> WebAskResult<String>;
}

/// Which renderer fetches pages for the scrape stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Headless Chrome through Node.js and Puppeteer; runs page scripts
    #[default]
    Browser,
    /// Single GET request; pages built by scripts come back mostly empty
    Http,
}

impl RendererKind {
    pub fn build(self, timeout: Duration) -> WebAskResult<Box<dyn PageRenderer>> {
        let renderer: Box<dyn PageRenderer> = match self {
            RendererKind::Browser => Box::new(BrowserRenderer::new(timeout)),
            RendererKind::Http => Box::new(HttpRenderer::new(timeout)?),
        };
        Ok(renderer)
    }
}

fn render_error(url: &str, message: impl Into<String>) -> WebAskError {
    WebAskError::Render {
        url: url.to_string(),
        message: message.into(),
    }
}

pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(timeout: Duration) -> WebAskResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .map_err(|e| WebAskError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &str) -> WebAskResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| render_error(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(render_error(url, format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| render_error(url, e.to_string()))
    }
}

/// Renders pages in headless Chrome by running a Puppeteer script under Node.js.
///
/// The script reads `{url, timeout_ms, user_agent}` as JSON on stdin and
/// writes a single JSON object on stdout. Once `timeout` elapses the Node
/// process and everything it spawned (Chrome included) get SIGKILL.
pub struct BrowserRenderer {
    node_bin: String,
    timeout: Duration,
}

impl BrowserRenderer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            node_bin: "node".to_string(),
            timeout,
        }
    }

    /// Use another Node.js executable than the one on `PATH`
    pub fn with_node_bin<S: Into<String>>(mut self, node_bin: S) -> Self {
        self.node_bin = node_bin.into();
        self
    }

    fn parse_reply(url: &str, stdout: &[u8], stderr: &[u8]) -> WebAskResult<String> {
        let stdout = String::from_utf8_lossy(stdout);
        let reply: Value = serde_json::from_str(stdout.trim()).map_err(|e| {
            let stderr = String::from_utf8_lossy(stderr);
            render_error(
                url,
                format!("renderer returned invalid JSON: {}. stderr: {}", e, stderr.trim()),
            )
        })?;

        if reply.get("ok").and_then(Value::as_bool) != Some(true) {
            let message = reply
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("browser render failed");
            return Err(render_error(url, message));
        }

        Ok(reply
            .get("html")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

#[async_trait]
impl PageRenderer for BrowserRenderer {
    async fn render(&self, url: &str) -> WebAskResult<String> {
        let args = json!({
            "url": url,
            "timeout_ms": self.timeout.as_millis() as u64,
            "user_agent": BROWSER_USER_AGENT,
        })
        .to_string();

        let mut child = Command::new(&self.node_bin)
            .arg("-e")
            .arg(RENDER_SCRIPT)
            .kill_on_drop(true)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| render_error(url, format!("failed to start {}: {}", self.node_bin, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A failed write shows up as an error reply from the script
            let _ = stdin.write_all(args.as_bytes()).await;
            let _ = stdin.shutdown().await;
        }

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| render_error(url, "missing stdout pipe"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| render_error(url, "missing stderr pipe"))?;

        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf).await;
            buf
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            buf
        });

        match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => {
                let status = status.map_err(|e| render_error(url, e.to_string()))?;
                debug!(url, %status, "browser render exited");
            }
            Err(_) => {
                if let Some(pid) = child.id() {
                    kill_process_tree(pid).await;
                }
                let _ = child.kill().await;
                stdout_task.abort();
                stderr_task.abort();
                return Err(render_error(
                    url,
                    format!("timed out after {}ms", self.timeout.as_millis()),
                ));
            }
        }

        let out = stdout_task.await.unwrap_or_default();
        let err = stderr_task.await.unwrap_or_default();
        Self::parse_reply(url, &out, &err)
    }
}

/// SIGKILL `pid` and all of its descendants
async fn kill_process_tree(pid: u32) {
    let config = KillConfig {
        signal: "SIGKILL".to_string(),
        ..Default::default()
    };
    match tokio::task::spawn_blocking(move || kill_tree_with_config(pid, &config)).await {
        Ok(Ok(outputs)) => debug!(pid, killed = outputs.len(), "killed browser render tree"),
        Ok(Err(e)) => warn!(pid, error = %e, "failed to kill browser render tree"),
        Err(e) => warn!(pid, error = %e, "browser render kill task failed"),
    }
}
