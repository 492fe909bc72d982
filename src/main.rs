use anyhow::{Context, Result};
use std::env;
use std::io;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use price_aggregator::{load_config, AppConfig, Catalog, Shell, CONFIG_FILE};

fn main() -> Result<()> {
    init_logging();

    let config = load_config(Path::new(CONFIG_FILE))?;
    let catalog = load_catalog(&config)?;

    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && args[1] == "browse" {
        // Terminal browser
        run_browse_mode(&catalog, &config)?;
    } else {
        // Prompt loop (default)
        run_shell(&catalog, &config)?;
    }

    Ok(())
}

/// Logs go to stderr so search tables on stdout stay readable
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_catalog(config: &AppConfig) -> Result<Catalog> {
    Catalog::load_with_options(&config.root_dir, &config.loader_options()).with_context(|| {
        format!("Failed to load price lists from {}", config.root_dir.display())
    })
}

fn run_shell(catalog: &Catalog, config: &AppConfig) -> Result<()> {
    let shell = Shell::new(catalog, config.output_path.clone());
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    shell.run(stdin.lock(), &mut stdout)
}

#[cfg(feature = "tui")]
fn run_browse_mode(catalog: &Catalog, config: &AppConfig) -> Result<()> {
    let mut app = price_aggregator::ui::App::new(catalog, config.output_path.clone());
    price_aggregator::ui::run_ui(&mut app)
}

#[cfg(not(feature = "tui"))]
fn run_browse_mode(_catalog: &Catalog, _config: &AppConfig) -> Result<()> {
    anyhow::bail!("browse mode not available, rebuild with: cargo build --features tui")
}
