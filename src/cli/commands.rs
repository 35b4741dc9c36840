use tracing::info;

use crate::browser::session::{BrowserSession, DriverOptions};
use crate::error::{SweepError, SweepResult};
use crate::navigation::discoverer::NavigationFilter;
use crate::orchestrator::orchestrator::PageTestOrchestrator;
use crate::orchestrator::page_report::format_console_summary;
use crate::orchestrator::sweep_config::SweepConfig;
use crate::signature::catalog::{SignatureCatalog, SignatureFilter};

// ============================================================================
// sweep subcommand
// ============================================================================

/// Run the sweep and return whether every page passed.
pub fn cmd_sweep(
    config: &SweepConfig,
    filter: NavigationFilter,
    summary_json: Option<&str>,
) -> SweepResult<bool> {
    let mut session = BrowserSession::launch(&driver_options(config))?;
    let orchestrator = PageTestOrchestrator::new(config, filter);

    let summary = orchestrator.run(&mut session);
    session.quit()?;

    print!("{}", format_console_summary(&summary));

    if let Some(path) = summary_json {
        std::fs::write(path, summary.to_json()?)?;
        info!(path, "run summary written");
    }

    Ok(summary.all_passed())
}

// ============================================================================
// discover subcommand
// ============================================================================

pub fn cmd_discover(config: &SweepConfig, filter: NavigationFilter) -> SweepResult<()> {
    let mut session = BrowserSession::launch(&driver_options(config))?;
    let orchestrator = PageTestOrchestrator::new(config, filter);

    if let Some(login) = &config.login {
        orchestrator.login(&mut session, login)?;
    }
    let targets = orchestrator.discover_targets(&mut session)?;
    session.quit()?;

    println!("Discovered {} navigation targets:", targets.len());
    for target in &targets {
        println!(
            "  [{}] {} — {} ({})",
            target.index,
            target.display_name(),
            target.route,
            target.id
        );
    }
    Ok(())
}

// ============================================================================
// catalog subcommand
// ============================================================================

pub fn cmd_catalog(config: &SweepConfig) -> SweepResult<()> {
    let filter = SignatureFilter::from_settings(&config.signatures);
    let catalog = SignatureCatalog::standard().filtered(&filter);
    if catalog.is_empty() {
        return Err(SweepError::Config(
            "signature filter excludes every catalog entry".to_string(),
        ));
    }
    print!("{}", format_catalog(&catalog));
    Ok(())
}

/// One line per signature: name, threshold, tester, matchers.
pub fn format_catalog(catalog: &SignatureCatalog) -> String {
    let mut out = format!("Signature catalog ({} entries):\n", catalog.len());
    for signature in catalog.signatures() {
        out.push_str(&format!(
            "  {:<16} min {}/{}  -> {:?}\n",
            signature.name,
            signature.min_matches,
            signature.matchers.len(),
            signature.tester
        ));
        for matcher in &signature.matchers {
            out.push_str(&format!("      {}\n", matcher));
        }
    }
    out
}

// ============================================================================
// Helpers
// ============================================================================

fn driver_options(config: &SweepConfig) -> DriverOptions {
    DriverOptions {
        script: config.driver_script.clone(),
        headless: config.headless,
    }
}
