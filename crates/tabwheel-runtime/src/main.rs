//! tabwheel: kiosk display daemon.
//!
//! Reconciles a configured set of display tabs against a single browser
//! window over the DevTools interface: rotates the visible tab, reloads
//! stale tabs, and opens/closes tabs as their schedules come and go.

use anyhow::Context;
use clap::Parser;

use tabwheel_cdp::DevtoolsWindow;

mod cli;
mod config;
mod engine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("TABWHEEL_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    match args.command {
        cli::Command::Run(opts) => {
            let display = config::load(&opts.config)
                .with_context(|| format!("loading config {}", opts.config.display()))?;
            // Hoisted out of the event macro: tracing's field helpers would
            // otherwise shadow the `display` binding inside the expansion.
            let entries = display.len();
            tracing::info!(
                entries,
                tick_ms = opts.tick_ms,
                devtools = %opts.devtools_url,
                "tabwheel starting"
            );

            let window = DevtoolsWindow::new(opts.devtools_url);
            engine::run(&window, display, opts.tick_ms).await?;
        }
        cli::Command::Check(opts) => {
            let display = config::load(&opts.config)
                .with_context(|| format!("loading config {}", opts.config.display()))?;
            println!("{}: {} entries", opts.config.display(), display.len());
            for (id, entry) in display.iter() {
                let schedule = match &entry.schedule {
                    None => "always".to_string(),
                    Some(_) => "scheduled".to_string(),
                };
                println!(
                    "  {id} {} rotate={}s refresh={}s [{schedule}]",
                    entry.url,
                    display.rotate_after(Some(id)).num_seconds(),
                    display.refresh_after(Some(id)).num_seconds(),
                );
            }
        }
    }

    Ok(())
}
