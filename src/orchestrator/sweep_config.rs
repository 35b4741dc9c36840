use serde::{Deserialize, Serialize};

// ============================================================================
// Sweep configuration
// ============================================================================

/// Everything a run needs to know about the application under test.
///
/// Built from the optional YAML file and CLI flags by `cli::config`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SweepConfig {
    /// Origin of the application, e.g. `http://localhost:8080`
    pub base_url: String,

    /// Route of the page listing the navigation buttons
    pub navigation_route: String,

    /// Node.js page driver script
    pub driver_script: String,

    pub headless: bool,

    /// Directory for numbered screenshots
    pub screenshot_dir: String,

    /// JSONL trace output
    pub trace_path: String,

    pub login: Option<LoginConfig>,

    pub waits: Waits,

    pub workflow: WorkflowSettings,

    pub signatures: SignatureSettings,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            navigation_route: "cpagetestauxillary".to_string(),
            driver_script: "driver/page_driver.js".to_string(),
            headless: true,
            screenshot_dir: "target/screenshots".to_string(),
            trace_path: "page_sweep_trace.jsonl".to_string(),
            login: None,
            waits: Waits::default(),
            workflow: WorkflowSettings::default(),
            signatures: SignatureSettings::default(),
        }
    }
}

impl SweepConfig {
    /// Absolute URL for a route, tolerating stray slashes on either side.
    pub fn url_for(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }
}

/// Fixed delays and polling timeouts, in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Waits {
    /// After a click or fill
    pub action_ms: u64,
    /// After save/delete
    pub save_ms: u64,
    /// After assigning a new location
    pub navigation_ms: u64,
    /// Upper bound when polling for a selector
    pub selector_timeout_ms: u64,
}

impl Default for Waits {
    fn default() -> Self {
        Self {
            action_ms: 500,
            save_ms: 1000,
            navigation_ms: 2000,
            selector_timeout_ms: 5000,
        }
    }
}

/// Values written by the CRUD workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkflowSettings {
    /// Prefix of the creation marker: `Test-<page>`
    pub marker_prefix: String,
    /// Prefix prepended on update: `Updated-<old value>`
    pub update_prefix: String,
    /// Run create/update/delete on CRUD pages
    pub enabled: bool,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            marker_prefix: "Test-".to_string(),
            update_prefix: "Updated-".to_string(),
            enabled: true,
        }
    }
}

/// Keyword filters applied to signature names before detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignatureSettings {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Form login performed once before discovery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginConfig {
    #[serde(default = "default_login_route")]
    pub route: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_username_selector")]
    pub username_selector: String,
    #[serde(default = "default_password_selector")]
    pub password_selector: String,
    #[serde(default = "default_submit_selector")]
    pub submit_selector: String,
}

fn default_login_route() -> String {
    "login".to_string()
}

fn default_username_selector() -> String {
    "#custom-username-input input".to_string()
}

fn default_password_selector() -> String {
    "#custom-password-input input".to_string()
}

fn default_submit_selector() -> String {
    "#cbutton-login".to_string()
}
