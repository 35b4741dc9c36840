use clap::{Args, Parser, Subcommand};
use tracing::warn;

use crate::navigation::discoverer::NavigationFilter;
use crate::orchestrator::sweep_config::SweepConfig;

pub const DEFAULT_CONFIG_PATH: &str = "page-sweep.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "page-sweep",
    version,
    about = "Adaptive page-by-page UI sweep for CRUD web applications"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: page-sweep.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Application origin, e.g. http://localhost:8080
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Node.js page driver script
    #[arg(long, global = true)]
    pub driver: Option<String>,

    /// Show the browser window
    #[arg(long, global = true)]
    pub headed: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover pages and test each one
    Sweep {
        #[command(flatten)]
        targets: TargetArgs,

        #[command(flatten)]
        signatures: SignatureArgs,

        /// Only detect and dispatch testers; no create/update/delete
        #[arg(long)]
        skip_workflow: bool,

        /// Directory for numbered screenshots
        #[arg(long)]
        screenshot_dir: Option<String>,

        /// Also write the run summary as JSON
        #[arg(long)]
        summary_json: Option<String>,
    },

    /// List the navigation targets a sweep would test
    Discover {
        #[command(flatten)]
        targets: TargetArgs,
    },

    /// Print the signature catalog
    Catalog {
        #[command(flatten)]
        signatures: SignatureArgs,
    },
}

/// Narrow the pages under test. Route wins over button id, button id over keyword.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Test a single route, e.g. cactivities
    #[arg(long)]
    pub route: Option<String>,

    /// Test the page behind one navigation button id
    #[arg(long)]
    pub button_id: Option<String>,

    /// Test pages whose title contains this keyword
    #[arg(long)]
    pub keyword: Option<String>,

    /// With --keyword, keep only the best-ranked page
    #[arg(long)]
    pub best_match: bool,
}

impl TargetArgs {
    pub fn filter(&self) -> NavigationFilter {
        NavigationFilter::from_options(
            self.route.as_deref(),
            self.button_id.as_deref(),
            self.keyword.as_deref(),
            self.best_match,
        )
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct SignatureArgs {
    /// Only use signatures whose name contains this keyword (repeatable)
    #[arg(long = "include-signature")]
    pub include: Vec<String>,

    /// Skip signatures whose name contains this keyword (repeatable)
    #[arg(long = "exclude-signature")]
    pub exclude: Vec<String>,
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if the file is missing;
/// a malformed file is reported and also yields defaults.
pub fn load_config(path: Option<&str>) -> SweepConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|e| {
            warn!(path = config_path, error = %e, "malformed config file, using defaults");
            SweepConfig::default()
        }),
        Err(_) => SweepConfig::default(),
    }
}

pub fn parse_config(content: &str) -> Result<SweepConfig, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(SweepConfig::default());
    }
    serde_yaml::from_str(content)
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Global flags override file values.
pub fn apply_global_overrides(config: &mut SweepConfig, cli: &Cli) {
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(driver) = &cli.driver {
        config.driver_script = driver.clone();
    }
    if cli.headed {
        config.headless = false;
    }
}

/// Signature keywords given on the command line replace the file's lists.
pub fn apply_signature_overrides(config: &mut SweepConfig, args: &SignatureArgs) {
    if !args.include.is_empty() {
        config.signatures.include = args.include.clone();
    }
    if !args.exclude.is_empty() {
        config.signatures.exclude = args.exclude.clone();
    }
}

/// `tracing` level for a `-v` count.
pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
