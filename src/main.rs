use clap::Parser;
use page_sweep::cli::commands::{cmd_catalog, cmd_discover, cmd_sweep};
use page_sweep::cli::config::{
    apply_global_overrides, apply_signature_overrides, load_config, log_level, Cli, Commands,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level(cli.verbose))),
        )
        .with_target(false)
        .init();

    // Resolve settings: CLI > config file > defaults
    let mut config = load_config(cli.config.as_deref());
    apply_global_overrides(&mut config, &cli);

    match &cli.command {
        Commands::Sweep {
            targets,
            signatures,
            skip_workflow,
            screenshot_dir,
            summary_json,
        } => {
            apply_signature_overrides(&mut config, signatures);
            if *skip_workflow {
                config.workflow.enabled = false;
            }
            if let Some(dir) = screenshot_dir {
                config.screenshot_dir = dir.clone();
            }
            let all_passed = cmd_sweep(&config, targets.filter(), summary_json.as_deref())?;
            if !all_passed {
                std::process::exit(1);
            }
        }
        Commands::Discover { targets } => {
            cmd_discover(&config, targets.filter())?;
        }
        Commands::Catalog { signatures } => {
            apply_signature_overrides(&mut config, signatures);
            cmd_catalog(&config)?;
        }
    }

    Ok(())
}
