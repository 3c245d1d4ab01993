// FILE: crates/cli/src/main.rs

use anyhow::{Context, Result};
use clap::{value_parser, Arg, Command};
use keypoint_config::{Config, ConfigManager};

mod commands;
mod player;

fn build_cli() -> Command {
    Command::new("keypoint")
        .version("0.1.0")
        .author("Keypoint Team")
        .about("Listen to book summaries one key point at a time")
        .arg(
            Arg::new("book")
                .short('b')
                .long("book")
                .value_name("FILE")
                .help("Book JSON file (defaults to the bundled sample book)")
                .global(true),
        )
        .subcommand(Command::new("info").about("Show the book and its key points"))
        .subcommand(
            Command::new("play")
                .about("Open the playback screen")
                .arg(
                    Arg::new("position")
                        .short('p')
                        .long("position")
                        .value_name("N")
                        .help("Position of the key point to start from")
                        .value_parser(value_parser!(u32))
                        .default_value("0"),
                )
                .arg(
                    Arg::new("track-secs")
                        .long("track-secs")
                        .value_name("SECONDS")
                        .help("Length of each simulated key point track")
                        .value_parser(value_parser!(u64).range(1..))
                        .default_value("90"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Manage the configuration file")
                .subcommand_required(true)
                .subcommand(Command::new("init").about("Write a default config file if none exists"))
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("path").about("Print the config file location"))
                .subcommand(Command::new("reset").about("Overwrite the config file with defaults")),
        )
}

fn logger_builder(config: &Config) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(config.app.log_level.to_filter());
    builder
}

/// Level comes from the config file; `RUST_LOG` wins when set
fn init_logging(config: &Config) {
    logger_builder(config).parse_default_env().init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let manager = ConfigManager::new().context("Failed to resolve config directory")?;
    let config = manager.load_or_default();
    init_logging(&config);
    log::debug!(
        "Loaded config from {} (log level {})",
        manager.config_path().display(),
        config.app.log_level
    );

    let book_path = matches.get_one::<String>("book").map(|s| s.as_str());

    match matches.subcommand() {
        Some(("info", _)) => commands::show_book_info(book_path),
        Some(("play", sub_matches)) => commands::play_book(book_path, sub_matches, &config).await,
        Some(("config", sub_matches)) => commands::run_config_command(&manager, sub_matches),
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_play_defaults() {
        let matches = build_cli().get_matches_from(["keypoint", "play"]);
        let (_, play) = matches.subcommand().unwrap();
        assert_eq!(play.get_one::<u32>("position"), Some(&0));
        assert_eq!(play.get_one::<u64>("track-secs"), Some(&90));
    }

    #[test]
    fn test_global_book_argument() {
        let matches = build_cli().get_matches_from(["keypoint", "info", "--book", "habits.json"]);
        assert_eq!(
            matches.get_one::<String>("book").map(String::as_str),
            Some("habits.json")
        );
    }

    #[test]
    fn test_logger_uses_configured_level() {
        let mut config = Config::default();
        config.app.log_level = keypoint_config::LogLevel::Trace;
        assert_eq!(logger_builder(&config).build().filter(), log::LevelFilter::Trace);

        config.app.log_level = keypoint_config::LogLevel::Error;
        assert_eq!(logger_builder(&config).build().filter(), log::LevelFilter::Error);
    }

    #[test]
    fn test_zero_track_length_rejected() {
        let result = build_cli().try_get_matches_from(["keypoint", "play", "--track-secs", "0"]);
        assert!(result.is_err());
    }
}
