use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::browser::probe::DomProbe;
use crate::error::{SweepError, SweepResult};

/// Request sent to the page driver over stdin (one JSON line).
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BrowserRequest {
    Navigate {
        url: String,
    },
    CurrentUrl,
    Count {
        selector: String,
    },
    Attribute {
        selector: String,
        index: u32,
        name: String,
    },
    Text {
        selector: String,
        index: u32,
    },
    TagName {
        selector: String,
        index: u32,
    },
    Value {
        selector: String,
    },
    Click {
        selector: String,
        index: u32,
    },
    Fill {
        selector: String,
        value: String,
    },
    SetInputFiles {
        selector: String,
        path: String,
    },
    PressKey {
        key: String,
    },
    Drag {
        source: String,
        target: String,
    },
    Wait {
        duration_ms: u64,
    },
    WaitFor {
        selector: String,
        timeout_ms: u64,
    },
    Screenshot {
        path: String,
    },
    Quit,
}

impl BrowserRequest {
    /// Short name used in error messages.
    pub fn command_name(&self) -> &'static str {
        match self {
            BrowserRequest::Navigate { .. } => "navigate",
            BrowserRequest::CurrentUrl => "current_url",
            BrowserRequest::Count { .. } => "count",
            BrowserRequest::Attribute { .. } => "attribute",
            BrowserRequest::Text { .. } => "text",
            BrowserRequest::TagName { .. } => "tag_name",
            BrowserRequest::Value { .. } => "value",
            BrowserRequest::Click { .. } => "click",
            BrowserRequest::Fill { .. } => "fill",
            BrowserRequest::SetInputFiles { .. } => "set_input_files",
            BrowserRequest::PressKey { .. } => "press_key",
            BrowserRequest::Drag { .. } => "drag",
            BrowserRequest::Wait { .. } => "wait",
            BrowserRequest::WaitFor { .. } => "wait_for",
            BrowserRequest::Screenshot { .. } => "screenshot",
            BrowserRequest::Quit => "quit",
        }
    }
}

/// Response received from the page driver over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub found: Option<bool>,
}

/// Launch options for the page driver.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Path to the Node.js driver script
    pub script: String,
    pub headless: bool,
}

/// A persistent browser page driven through a Node.js Playwright script.
///
/// The driver keeps one Chromium page open. Commands are sent as NDJSON
/// over stdin, responses read from stdout, strictly one at a time.
pub struct BrowserSession {
    child: Child,
    stdin: std::process::ChildStdin,
    reader: BufReader<std::process::ChildStdout>,
    script: String,
    current_url: Option<String>,
}

impl BrowserSession {
    /// Spawn the driver and wait for its ready line.
    pub fn launch(options: &DriverOptions) -> SweepResult<Self> {
        let mut command = Command::new("node");
        command.arg(&options.script);
        if !options.headless {
            command.arg("--headed");
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| SweepError::DriverSpawn {
                script: options.script.clone(),
                source: e,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SweepError::DriverIo("Failed to capture driver stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SweepError::DriverIo("Failed to capture driver stdout".into()))?;

        let mut reader = BufReader::new(stdout);

        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| SweepError::DriverIo(format!("Failed to read ready signal: {}", e)))?;

        let response: BrowserResponse =
            serde_json::from_str(line.trim()).map_err(|e| SweepError::JsonParse {
                context: "driver ready signal".into(),
                source: e,
            })?;

        if !response.ok || response.ready != Some(true) {
            return Err(SweepError::DriverProtocol {
                command: "launch".into(),
                error: "Did not receive ready signal from page driver".into(),
            });
        }

        debug!(script = %options.script, "page driver ready");

        Ok(BrowserSession {
            child,
            stdin,
            reader,
            script: options.script.clone(),
            current_url: None,
        })
    }

    fn send(&mut self, request: &BrowserRequest) -> SweepResult<BrowserResponse> {
        let json = serde_json::to_string(request).map_err(|e| SweepError::JsonSerialize {
            context: "BrowserRequest".into(),
            source: e,
        })?;

        writeln!(self.stdin, "{}", json)
            .map_err(|e| SweepError::DriverIo(format!("Failed to write to {}: {}", self.script, e)))?;
        self.stdin
            .flush()
            .map_err(|e| SweepError::DriverIo(format!("Failed to flush {}: {}", self.script, e)))?;

        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .map_err(|e| SweepError::DriverIo(format!("Failed to read from {}: {}", self.script, e)))?;

        if line.trim().is_empty() {
            return Err(SweepError::DriverIo(format!(
                "Empty response from {} (process may have died)",
                self.script
            )));
        }

        serde_json::from_str(line.trim()).map_err(|e| SweepError::JsonParse {
            context: "driver response".into(),
            source: e,
        })
    }

    /// Send a request and verify it succeeded.
    fn send_ok(&mut self, request: BrowserRequest) -> SweepResult<BrowserResponse> {
        let response = self.send(&request)?;
        if !response.ok {
            return Err(SweepError::DriverProtocol {
                command: request.command_name().into(),
                error: response.error.unwrap_or_else(|| "Unknown error".into()),
            });
        }
        Ok(response)
    }

    /// Last URL assigned through this session (no driver call).
    pub fn last_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn quit(&mut self) -> SweepResult<()> {
        // Best-effort: the driver may already be gone
        let _ = self.send(&BrowserRequest::Quit);
        let _ = self.child.wait();
        Ok(())
    }
}

impl DomProbe for BrowserSession {
    fn navigate(&mut self, url: &str) -> SweepResult<()> {
        self.send_ok(BrowserRequest::Navigate { url: url.to_string() })?;
        self.current_url = Some(url.to_string());
        Ok(())
    }

    fn current_url(&mut self) -> SweepResult<String> {
        let response = self.send_ok(BrowserRequest::CurrentUrl)?;
        let url = response.url.ok_or_else(|| SweepError::DriverProtocol {
            command: "current_url".into(),
            error: "No URL in response".into(),
        })?;
        self.current_url = Some(url.clone());
        Ok(url)
    }

    fn count(&mut self, selector: &str) -> SweepResult<u32> {
        let response = self.send_ok(BrowserRequest::Count {
            selector: selector.to_string(),
        })?;
        Ok(response.count.unwrap_or(0))
    }

    fn attribute(&mut self, selector: &str, index: u32, name: &str) -> SweepResult<Option<String>> {
        let response = self.send_ok(BrowserRequest::Attribute {
            selector: selector.to_string(),
            index,
            name: name.to_string(),
        })?;
        Ok(response.value)
    }

    fn text(&mut self, selector: &str, index: u32) -> SweepResult<Option<String>> {
        let response = self.send_ok(BrowserRequest::Text {
            selector: selector.to_string(),
            index,
        })?;
        Ok(response.text)
    }

    fn tag_name(&mut self, selector: &str, index: u32) -> SweepResult<Option<String>> {
        let response = self.send_ok(BrowserRequest::TagName {
            selector: selector.to_string(),
            index,
        })?;
        Ok(response.text.map(|t| t.to_lowercase()))
    }

    fn value(&mut self, selector: &str) -> SweepResult<Option<String>> {
        let response = self.send_ok(BrowserRequest::Value {
            selector: selector.to_string(),
        })?;
        Ok(response.value)
    }

    fn click(&mut self, selector: &str, index: u32) -> SweepResult<()> {
        self.send_ok(BrowserRequest::Click {
            selector: selector.to_string(),
            index,
        })?;
        Ok(())
    }

    fn fill(&mut self, selector: &str, value: &str) -> SweepResult<()> {
        self.send_ok(BrowserRequest::Fill {
            selector: selector.to_string(),
            value: value.to_string(),
        })?;
        Ok(())
    }

    fn set_input_files(&mut self, selector: &str, path: &str) -> SweepResult<()> {
        self.send_ok(BrowserRequest::SetInputFiles {
            selector: selector.to_string(),
            path: path.to_string(),
        })?;
        Ok(())
    }

    fn press_key(&mut self, key: &str) -> SweepResult<()> {
        self.send_ok(BrowserRequest::PressKey { key: key.to_string() })?;
        Ok(())
    }

    fn drag(&mut self, source: &str, target: &str) -> SweepResult<()> {
        self.send_ok(BrowserRequest::Drag {
            source: source.to_string(),
            target: target.to_string(),
        })?;
        Ok(())
    }

    fn wait_ms(&mut self, ms: u64) -> SweepResult<()> {
        self.send_ok(BrowserRequest::Wait { duration_ms: ms })?;
        Ok(())
    }

    fn wait_for(&mut self, selector: &str, timeout_ms: u64) -> SweepResult<bool> {
        let response = self.send_ok(BrowserRequest::WaitFor {
            selector: selector.to_string(),
            timeout_ms,
        })?;
        Ok(response.found.unwrap_or(false))
    }

    fn screenshot(&mut self, path: &str) -> SweepResult<()> {
        self.send_ok(BrowserRequest::Screenshot { path: path.to_string() })?;
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Err(e) = self.quit() {
            warn!(error = %e, "page driver did not shut down cleanly");
        }
    }
}
