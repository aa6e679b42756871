//! Interactive configuration wizard for the `init` subcommand.
//!
//! Walks the user through creating a `catalog_console.toml` file,
//! similar to `npm init` or `cargo init`.

use crate::config::{Config, ConfigError, SourceConfig};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Errors that can occur during interactive init.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cancelled by user")]
    Cancelled,
}

/// Public entry point wiring stdin/stdout.
pub fn run_interactive_init(default_output_path: &str) -> Result<(), InitError> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    run_init_inner(default_output_path, &mut reader, &mut writer)
}

/// Prompt the user for a string value, returning `default` on empty input.
/// Returns `Err(InitError::Cancelled)` on EOF.
fn prompt(
    reader: &mut impl BufRead,
    writer: &mut impl Write,
    label: &str,
    default: &str,
) -> Result<String, InitError> {
    write!(writer, "{} [{}]: ", label, default)?;
    writer.flush()?;
    let mut line = String::new();
    let n = reader.read_line(&mut line)?;
    if n == 0 {
        return Err(InitError::Cancelled);
    }
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

/// Prompt for a yes/no answer. Retries on invalid input.
fn prompt_yes_no(
    reader: &mut impl BufRead,
    writer: &mut impl Write,
    label: &str,
    default: bool,
) -> Result<bool, InitError> {
    let default_str = if default { "y" } else { "n" };
    loop {
        let answer = prompt(reader, writer, label, default_str)?;
        match answer.to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => {
                writeln!(writer, "  Please answer y or n.")?;
            }
        }
    }
}

/// Prompt for a duration string like "30s" or "1m". Retries until the
/// input parses.
fn prompt_duration(
    reader: &mut impl BufRead,
    writer: &mut impl Write,
    label: &str,
    default: &str,
) -> Result<String, InitError> {
    loop {
        let answer = prompt(reader, writer, label, default)?;
        match humantime::parse_duration(&answer) {
            Ok(_) => return Ok(answer),
            Err(_) => {
                writeln!(writer, "  Invalid duration, try values like '30s' or '1m'.")?;
            }
        }
    }
}

/// Core wizard logic, testable with any `BufRead`/`Write`.
pub fn run_init_inner(
    default_output_path: &str,
    reader: &mut impl BufRead,
    writer: &mut impl Write,
) -> Result<(), InitError> {
    writeln!(writer)?;
    writeln!(writer, "Catalog Console - Interactive Configuration")?;
    writeln!(writer, "===========================================")?;
    writeln!(writer)?;

    // --- Output file ---
    let output_path = prompt(reader, writer, "Output config file", default_output_path)?;
    writeln!(writer)?;

    // Check if file already exists
    if std::path::Path::new(&output_path).exists() {
        let overwrite = prompt_yes_no(
            reader,
            writer,
            &format!("{output_path} already exists. Overwrite?"),
            false,
        )?;
        if !overwrite {
            writeln!(writer, "Cancelled.")?;
            return Ok(());
        }
        writeln!(writer)?;
    }

    // --- Data source ---
    writeln!(writer, "--- Data Source ---")?;
    let source = loop {
        let choice = prompt(
            reader,
            writer,
            "Data source (network / fixture)",
            "fixture",
        )?;
        match choice.to_lowercase().as_str() {
            "network" | "net" => {
                let base_url = loop {
                    let url = prompt(
                        reader,
                        writer,
                        "API base URL",
                        "http://localhost:3000/api",
                    )?;
                    if url.starts_with("http://") || url.starts_with("https://") {
                        break url;
                    }
                    writeln!(writer, "  URL must start with http:// or https://.")?;
                };
                break SourceConfig::Network { base_url };
            }
            "fixture" | "fix" => {
                break SourceConfig::Fixture;
            }
            _ => {
                writeln!(writer, "  Please enter 'network' or 'fixture'.")?;
            }
        }
    };

    writeln!(writer)?;

    // --- Session ---
    writeln!(writer, "--- Session ---")?;
    let state_dir = prompt(reader, writer, "Credential directory", "./.catalog_console")?;
    let revalidate_interval =
        prompt_duration(reader, writer, "Revalidate session every", "1m")?;

    writeln!(writer)?;

    // --- Network ---
    writeln!(writer, "--- Network ---")?;
    let http_timeout = prompt_duration(reader, writer, "HTTP request timeout", "30s")?;

    writeln!(writer)?;

    // --- Logging ---
    writeln!(writer, "--- Logging ---")?;
    let log_level = prompt(reader, writer, "Log level", "catalog_console=info")?;

    // Build Config
    let config = Config {
        source,
        state_dir: PathBuf::from(state_dir),
        revalidate_interval,
        http_timeout,
        log_level,
    };

    // Show summary
    writeln!(writer)?;
    writeln!(writer, "--- Generated Configuration ---")?;
    let toml_str = config.to_toml_string()?;
    writeln!(writer, "{toml_str}")?;

    // Confirm write
    let do_write = prompt_yes_no(reader, writer, &format!("Write to {output_path}?"), true)?;

    if do_write {
        config.persist_to_file(&output_path)?;
        writeln!(writer, "Configuration written to {output_path}")?;
        writeln!(writer, "Run 'catalog_console status' to try it out.")?;
    } else {
        writeln!(writer, "Cancelled. No file written.")?;
    }

    Ok(())
}
