use std::{fmt::Write, path::PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use log::info;
use tui_logger::{
    TuiLoggerFile, TuiLoggerLevelOutput, init_logger, set_default_level, set_log_file,
};

use crate::{
    app::App,
    backend::Backend,
    config::ConfigManager,
    metrics::{BatteryStatus, SeriesKey},
    monitor::{CycleToken, MetricsUpdate},
    ui::{card::readout, process::table_rows},
};

pub mod app;
pub mod backend;
pub mod config;
pub mod event;
pub mod metrics;
pub mod monitor;
pub mod poller;
pub mod ui;

#[derive(Parser, Debug)]
#[command(about)]
struct Cli {
    #[arg(short, long, value_name = "FILE", default_value = config::DEFAULT_FILE)]
    config: PathBuf,
    /// Backend base URL, overrides the configuration
    #[arg(short, long, value_name = "URL")]
    url: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll the backend and show the dashboard
    Run,
    /// Validate the configuration and print the effective settings
    Validate,
    /// Poll the backend once and print the readout
    Once,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    match &cli.command {
        Some(Commands::Validate) => {
            let config = ConfigManager::load(&cli.config, cli.url.as_deref())?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Some(Commands::Once) => {
            let config = ConfigManager::load(&cli.config, cli.url.as_deref())?;
            let backend = Backend::new(&config.backend)?;
            let update = poller::poll_once(&backend, CycleToken::default()).await?;
            print!("{}", report(&update));
            Ok(())
        }
        Some(Commands::Run) | None => {
            init_logger(tui_logger::LevelFilter::Debug)?;
            let file_options = TuiLoggerFile::new("droidmon.log")
                .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
                .output_file(false)
                .output_separator(':');
            set_log_file(file_options);
            info!("Logging started");
            let mut app = App::new(cli.config, cli.url)?;
            set_default_level(tui_logger::LevelFilter::Debug);
            let terminal = ratatui::init();
            let result = app.run(terminal).await;
            ratatui::restore();
            result
        }
    }
}

/// Plain-text readout for the headless `once` command.
fn report(update: &MetricsUpdate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", update.label);
    for key in SeriesKey::ALL {
        let _ = write!(out, "{:<12} {}", key.name(), readout(key, &update.reading));
        let _ = match key {
            SeriesKey::Memory => writeln!(
                out,
                " ({:.1}% of {} kB)",
                update.reading.memory.used_percent, update.reading.memory.total_kb
            ),
            SeriesKey::Battery => writeln!(
                out,
                " ({})",
                BatteryStatus::from_level(update.reading.battery).label()
            ),
            _ => writeln!(out),
        };
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{:<32} {:>7} {:>7} {:>10}", "Name", "PID", "CPU", "Memory");
    let processes = update.processes.as_deref().unwrap_or_default();
    for [name, pid, cpu, memory] in table_rows(processes) {
        let _ = writeln!(out, "{name:<32} {pid:>7} {cpu:>7} {memory:>10}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MemoryUsage, ProcessRow, Reading};

    #[test]
    fn cli_parses_commands() {
        let cli = Cli::parse_from(["droidmon", "-u", "http://phone:5000", "once"]);
        assert_eq!(cli.url.as_deref(), Some("http://phone:5000"));
        assert!(matches!(cli.command, Some(Commands::Once)));
        assert_eq!(cli.config, PathBuf::from(config::DEFAULT_FILE));

        let cli = Cli::parse_from(["droidmon", "-c", "other.toml"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("other.toml"));
    }

    #[test]
    fn once_report() {
        let update = MetricsUpdate {
            token: CycleToken::default(),
            label: "12:34:56".to_string(),
            reading: Reading {
                cpu: 42.0,
                memory: MemoryUsage::from_kb(1_000_000, 400_000),
                battery: 25.0,
                temperature: 30.5,
            },
            processes: Some(vec![ProcessRow {
                pid: Some(99),
                name: "com.example".to_string(),
                cpu: 12.0,
                memory_mb: 64.0,
            }]),
        };
        let text = report(&update);
        assert!(text.starts_with("12:34:56\n"));
        assert!(text.contains("CPU          42.0%\n"));
        assert!(text.contains("Memory       585.9 MB (60.0% of 1000000 kB)\n"));
        assert!(text.contains("Battery      25.0% (Low)\n"));
        assert!(text.contains("Temperature  30.5°C\n"));
        assert!(text.contains("com.example"));
        assert!(text.contains("64.0 MB"));

        let text = report(&MetricsUpdate {
            processes: None,
            ..update
        });
        assert!(text.contains("No process data"));
    }
}
