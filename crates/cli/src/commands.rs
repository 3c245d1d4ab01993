// FILE: crates/cli/src/commands.rs

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use console::style;
use keypoint_config::{Config, ConfigManager};
use keypoint_core::{sample_book, Book, Validator};
use std::path::Path;
use std::time::Duration;

use crate::player;

/// Loads a book from a JSON file, or the bundled sample book
pub fn load_book(path: Option<&str>) -> Result<Book> {
    let Some(path) = path else {
        return Ok(sample_book());
    };

    let path = Path::new(path);
    if !path.exists() {
        bail!("Book file not found: {}", path.display());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let book: Book = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse book from {}", path.display()))?;

    if let Err(errors) = book.validate() {
        bail!("Invalid book {}: {}", path.display(), errors.join("; "));
    }

    Ok(book)
}

/// Show the book and its key points
pub fn show_book_info(book_path: Option<&str>) -> Result<()> {
    let book = load_book(book_path)?;

    println!("\n{}", style("Book Information").bold().cyan());
    println!("{}", "=".repeat(80));
    println!("ID: {}", book.id);
    println!("Title: {}", style(&book.title).bold());
    println!("Cover: {}", book.cover);
    println!("Key points: {}", book.total_key_points());
    println!();

    for key_point in &book.key_points {
        println!(
            "  {:>2}. {} {}",
            key_point.position,
            key_point.title,
            style(format!("({})", key_point.audio)).dim()
        );
    }

    Ok(())
}

/// Open the interactive playback screen
pub async fn play_book(book_path: Option<&str>, matches: &ArgMatches, config: &Config) -> Result<()> {
    let book = load_book(book_path)?;

    let position = matches.get_one::<u32>("position").copied().unwrap_or(0);
    if book.key_point_at_position(position).is_none() {
        println!(
            "{} No key point at position {}, starting from the first one",
            style("!").yellow().bold(),
            position
        );
    }

    let track_secs = matches.get_one::<u64>("track-secs").copied().unwrap_or(90);
    player::start_playback(book, position, config, Duration::from_secs(track_secs)).await
}

/// Dispatch `config` subcommands
pub fn run_config_command(manager: &ConfigManager, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("init", _)) => {
            let created = manager.initialize().context("Failed to write config file")?;
            if created {
                println!(
                    "{} Config written to {}",
                    style("✓").green().bold(),
                    manager.config_path().display()
                );
            } else {
                println!("Config already exists at {}", manager.config_path().display());
            }
        }
        Some(("show", _)) => {
            let config = manager
                .load_with_env_overrides()
                .context("Failed to load config")?;
            println!("{}", render_config(&config)?);
        }
        Some(("path", _)) => println!("{}", manager.config_path().display()),
        Some(("reset", _)) => {
            manager.reset().context("Failed to reset config")?;
            println!("{} Config reset to defaults", style("✓").green().bold());
        }
        _ => bail!("Unknown config command"),
    }

    Ok(())
}

fn render_config(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize config")
}

#[cfg(test)]
mod tests;
