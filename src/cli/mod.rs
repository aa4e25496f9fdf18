// FILE: src/cli/mod.rs

mod config;
mod handlers;

pub use config::ConfigFile;

use crate::error::{ConverterError, Result};
use crate::{CollisionPolicy, ConverterOptions};
use clap::{Arg, ArgAction, ArgMatches, Command, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CollisionMode {
    Error,
    Overwrite,
}

impl From<CollisionMode> for CollisionPolicy {
    fn from(mode: CollisionMode) -> Self {
        match mode {
            CollisionMode::Error => CollisionPolicy::Error,
            CollisionMode::Overwrite => CollisionPolicy::Overwrite,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AnalyzeFormat {
    Json,
    Debug,
    Scss,
}

pub struct EnhancedCli {
    config: ConfigFile,
    start_time: Instant,
}

impl EnhancedCli {
    pub fn new() -> Self {
        Self {
            config: ConfigFile::default(),
            start_time: Instant::now(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        self.start_time = Instant::now();
        let matches = self.build_cli().get_matches();

        if let Some(config_path) = matches.get_one::<String>("config") {
            self.config = config::load(config_path)?;
        }

        self.setup_logging(matches.get_count("verbose"))?;

        match matches.subcommand() {
            Some(("convert", sub_matches)) => handlers::handle_convert_command(self, sub_matches),
            Some(("check", sub_matches)) => handlers::handle_check_command(self, sub_matches),
            Some(("analyze", sub_matches)) => handlers::handle_analyze_command(self, sub_matches),
            Some(("init", sub_matches)) => handlers::handle_init_command(sub_matches),
            _ => {
                println!("No subcommand specified. Use --help for usage information.");
                Ok(())
            }
        }
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    fn build_cli(&self) -> Command {
        Command::new(crate::NAME)
            .version(crate::VERSION)
            .about(crate::DESCRIPTION)
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path (.toml or .json)")
                    .global(true)
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Increase verbosity (can be used multiple times)")
                    .global(true)
                    .action(ArgAction::Count),
            )
            .subcommand(
                Command::new("convert")
                    .about("Update the upstream checkout and convert it to Sass")
                    .arg(Arg::new("ref").long("ref").value_name("REF").help("Upstream branch, tag or commit"))
                    .arg(Arg::new("skip-checkout").long("skip-checkout").help("Convert the existing checkout without running git").action(ArgAction::SetTrue))
                    .arg(Arg::new("source").short('s').long("source").value_name("DIR").help("Upstream checkout directory"))
                    .arg(Arg::new("output").short('o').long("output").value_name("DIR").help("Stylesheet output directory"))
                    .arg(Arg::new("scripts").long("scripts").value_name("DIR").help("Script output directory"))
                    .arg(Arg::new("on-collision").long("on-collision").value_parser(clap::value_parser!(CollisionMode)).help("What to do when two sources map to one output file"))
                    .arg(Arg::new("asset-urls").long("asset-urls").help("Point font and image URLs at the asset pipeline helpers").action(ArgAction::SetTrue))
                    .arg(Arg::new("no-version-stamp").long("no-version-stamp").help("Do not record the upstream tree hash").action(ArgAction::SetTrue))
                    .arg(Arg::new("stats").long("stats").help("Show detailed conversion statistics").action(ArgAction::SetTrue))
                    .arg(Arg::new("debug").short('d').long("debug").help("Enable debug mode with extra phase logging").action(ArgAction::SetTrue)),
            )
            .subcommand(
                Command::new("check")
                    .about("Convert in memory and report unresolved variables and output collisions")
                    .arg(Arg::new("source").short('s').long("source").value_name("DIR").help("Upstream checkout directory")),
            )
            .subcommand(
                Command::new("analyze")
                    .about("Build the variable table and print it")
                    .arg(Arg::new("source").short('s').long("source").value_name("DIR").help("Upstream checkout directory"))
                    .arg(Arg::new("output").short('o').long("output").value_name("FILE").help("Write the analysis to a file"))
                    .arg(Arg::new("format").short('f').long("format").value_parser(clap::value_parser!(AnalyzeFormat)).default_value("debug").help("Analysis output format")),
            )
            .subcommand(
                Command::new("init")
                    .about("Write a default configuration file")
                    .arg(Arg::new("path").help("Configuration file to create").default_value(config::DEFAULT_CONFIG_FILE).index(1))
                    .arg(Arg::new("force").long("force").help("Overwrite an existing file").action(ArgAction::SetTrue)),
            )
    }

    fn setup_logging(&self, verbose_count: u8) -> Result<()> {
        let rust_log_set = std::env::var_os("RUST_LOG").is_some();
        let mut builder = env_logger::Builder::from_default_env();
        if let Some(log_level) = log_level(verbose_count, rust_log_set) {
            builder.filter_level(log_level);
        }
        builder.format_timestamp_secs().init();
        Ok(())
    }

    /// CLI flags over the config file over the built-in defaults
    pub fn build_converter_options(&self, matches: &ArgMatches) -> Result<ConverterOptions> {
        let mut options = self.config.apply(ConverterOptions::default());

        if let Some(source) = optional_string(matches, "source") {
            options.checkout_dir = PathBuf::from(source);
        }
        if let Some(output) = optional_string(matches, "output") {
            options.stylesheets_dir = PathBuf::from(output);
        }
        if let Some(scripts) = optional_string(matches, "scripts") {
            options.javascripts_dir = PathBuf::from(scripts);
        }
        if let Some(git_ref) = optional_string(matches, "ref") {
            options.git_ref = git_ref.to_string();
        }
        if let Ok(Some(mode)) = matches.try_get_one::<CollisionMode>("on-collision") {
            options.collision_policy = (*mode).into();
        }

        options.skip_checkout |= flag(matches, "skip-checkout");
        options.rewrite_asset_urls |= flag(matches, "asset-urls");
        options.debug_mode |= flag(matches, "debug");
        if flag(matches, "no-version-stamp") {
            options.record_version = false;
        }

        if options.version_constant.trim().is_empty() {
            return Err(ConverterError::InvalidFormat {
                message: "version constant must not be empty".to_string(),
            });
        }
        Ok(options)
    }
}

impl Default for EnhancedCli {
    fn default() -> Self {
        Self::new()
    }
}

/// Level forced by `-v`; `RUST_LOG` alone decides when no `-v` is given
fn log_level(verbose_count: u8, rust_log_set: bool) -> Option<log::LevelFilter> {
    match verbose_count {
        0 if rust_log_set => None,
        0 => Some(log::LevelFilter::Warn),
        1 => Some(log::LevelFilter::Info),
        2 => Some(log::LevelFilter::Debug),
        _ => Some(log::LevelFilter::Trace),
    }
}

// Subcommands share the option builder but not every flag.
fn flag(matches: &ArgMatches, id: &str) -> bool {
    matches.try_get_one::<bool>(id).ok().flatten().copied().unwrap_or(false)
}

fn optional_string<'a>(matches: &'a ArgMatches, id: &str) -> Option<&'a str> {
    matches
        .try_get_one::<String>(id)
        .ok()
        .flatten()
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ArgMatches {
        EnhancedCli::new().build_cli().get_matches_from(args)
    }

    #[test]
    fn test_convert_flags_override_defaults() {
        let matches = parse(&[
            "less2sass",
            "convert",
            "--ref",
            "2.4.2",
            "--source",
            "vendor/sui",
            "--on-collision",
            "overwrite",
            "--asset-urls",
            "--no-version-stamp",
        ]);
        let (_, sub) = matches.subcommand().unwrap();
        let options = EnhancedCli::new().build_converter_options(sub).unwrap();

        assert_eq!(options.git_ref, "2.4.2");
        assert_eq!(options.checkout_dir, PathBuf::from("vendor/sui"));
        assert_eq!(options.collision_policy, CollisionPolicy::Overwrite);
        assert!(options.rewrite_asset_urls);
        assert!(!options.record_version);
        assert!(!options.skip_checkout);
        assert_eq!(options.stylesheets_dir, PathBuf::from("app/assets/stylesheets/semantic-ui"));
    }

    #[test]
    fn test_config_file_below_flags() {
        let mut cli = EnhancedCli::new();
        cli.config = ConfigFile {
            git_ref: Some("next".to_string()),
            stylesheets_dir: Some("out/css".to_string()),
            on_collision: Some(CollisionPolicy::Overwrite),
            ..Default::default()
        };

        let matches = parse(&["less2sass", "convert", "--ref", "master"]);
        let (_, sub) = matches.subcommand().unwrap();
        let options = cli.build_converter_options(sub).unwrap();

        assert_eq!(options.git_ref, "master");
        assert_eq!(options.stylesheets_dir, PathBuf::from("out/css"));
        assert_eq!(options.collision_policy, CollisionPolicy::Overwrite);
    }

    #[test]
    fn test_log_level_defers_to_rust_log() {
        assert_eq!(log_level(0, true), None);
        assert_eq!(log_level(0, false), Some(log::LevelFilter::Warn));
        assert_eq!(log_level(2, true), Some(log::LevelFilter::Debug));
        assert_eq!(log_level(7, false), Some(log::LevelFilter::Trace));
    }

    #[test]
    fn test_check_subcommand_uses_shared_builder() {
        let matches = parse(&["less2sass", "check", "--source", "checkout"]);
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "check");
        let options = EnhancedCli::new().build_converter_options(sub).unwrap();
        assert_eq!(options.checkout_dir, PathBuf::from("checkout"));
        assert!(!options.debug_mode);
    }
}
