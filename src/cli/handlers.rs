// FILE: src/cli/handlers.rs
use crate::{
    cli::AnalyzeFormat, // Import from the `cli` module
    convert_theme, sync_and_convert, CollisionPolicy, ConversionStats, ConverterError, ConverterOptions,
    Diagnostics, ResolvedVariable, Result, VariableSet, VariableTableBuilder,
};

use serde::Serialize;
use std::fs;
use std::path::Path;

// --- CONVERT ---
pub fn handle_convert_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let options = cli.build_converter_options(matches)?;

    println!(
        "🔨 Converting {} -> {}",
        options.checkout_dir.display(),
        options.stylesheets_dir.display()
    );

    let stats = sync_and_convert(&options)?;

    println!("✅ Conversion successful!");
    println!("   Stylesheets: {}", stats.stylesheet_count);
    println!("   Scripts: {}", stats.script_count);
    println!("   Time: {}ms", cli.elapsed_ms());
    if let Some(sha) = &stats.upstream_sha {
        println!("   Upstream: {} = '{}'", options.version_constant, sha);
    }
    if !stats.unresolved.is_empty() {
        println!("⚠️  {} unresolved variable references (run check for details)", stats.unresolved.len());
    }

    if matches.get_flag("stats") {
        print_detailed_stats(&stats)?;
    }

    Ok(())
}

// --- CHECK ---
pub fn handle_check_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let options = ConverterOptions {
        dry_run: true,
        skip_checkout: true,
        record_version: false,
        collision_policy: CollisionPolicy::Error,
        ..cli.build_converter_options(matches)?
    };

    println!("🔍 Checking {}", options.checkout_dir.display());

    let stats = match convert_theme(&options) {
        Ok(stats) => stats,
        Err(e @ ConverterError::OutputCollision { .. }) => {
            println!("❌ {}", e);
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    for reference in &stats.unresolved {
        println!("⚠️  unresolved {}", reference);
    }

    println!("\n📊 Check Summary:");
    println!("   Declaration files: {}", stats.declaration_file_count);
    println!("   Stylesheets: {}", stats.stylesheet_count);
    println!("   Output files: {}", stats.files_written);
    println!("   Unresolved references: {}", stats.unresolved.len());

    if stats.unresolved.is_empty() {
        println!("✅ No issues found");
    }
    Ok(())
}

// --- ANALYZE ---
#[derive(Debug, Serialize)]
struct TableAnalysis {
    theme_root: String,
    declaration_files: usize,
    general: Vec<ResolvedVariable>,
    basic: Vec<ResolvedVariable>,
    diagnostics: Diagnostics,
}

pub fn handle_analyze_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let options = cli.build_converter_options(matches)?;
    let output_path = matches.get_one::<String>("output");
    let format = matches
        .get_one::<AnalyzeFormat>("format")
        .copied()
        .unwrap_or(AnalyzeFormat::Debug);

    let theme_root = options.theme_root();
    println!("🔬 Analyzing {}", theme_root.display());

    let mut builder = VariableTableBuilder::with_site_variables(&options.site_variables);
    let table = builder.build(&theme_root)?;

    let analysis = match format {
        AnalyzeFormat::Scss => format!(
            "// {}\n{}\n// {}\n{}",
            crate::emitter::VARIABLES_NAME,
            table.render(VariableSet::General),
            crate::emitter::BASIC_VARIABLES_NAME,
            table.render(VariableSet::Basic)
        ),
        AnalyzeFormat::Json | AnalyzeFormat::Debug => {
            let report = TableAnalysis {
                theme_root: theme_root.display().to_string(),
                declaration_files: builder.file_count(),
                general: table.resolved(VariableSet::General),
                basic: table.resolved(VariableSet::Basic),
                diagnostics: builder.into_diagnostics(),
            };
            if let AnalyzeFormat::Json = format {
                serde_json::to_string_pretty(&report).map_err(|e| ConverterError::InvalidFormat {
                    message: format!("JSON serialization error: {}", e),
                })?
            } else {
                format!("Variable Table Analysis: {}\n\n{:#?}", report.theme_root, report)
            }
        }
    };

    if let Some(output_file) = output_path {
        fs::write(output_file, analysis)?;
        println!("✅ Analysis saved to {}", output_file);
    } else {
        println!("{}", analysis);
    }
    Ok(())
}

// --- INIT ---
pub fn handle_init_command(matches: &clap::ArgMatches) -> Result<()> {
    let config_path = matches
        .get_one::<String>("path")
        .map(String::as_str)
        .unwrap_or(super::config::DEFAULT_CONFIG_FILE);

    println!("🚀 Writing default configuration to {}", config_path);

    let path = Path::new(config_path);
    if path.exists() && !matches.get_flag("force") {
        return Err(ConverterError::InvalidFormat {
            message: format!("'{}' already exists (use --force to overwrite)", config_path),
        });
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, super::config::render_default()?)?;

    println!("✅ Configuration created!");
    println!("\nNext steps:");
    println!("   less2sass --config {} convert", config_path);

    Ok(())
}

// --- HELPERS ---
fn print_detailed_stats(stats: &ConversionStats) -> Result<()> {
    println!("\n📊 Detailed Conversion Statistics:");
    println!("   Variables: {}", stats.variable_count);
    println!("   Basic variables: {}", stats.basic_variable_count);
    println!("   Declaration files: {}", stats.declaration_file_count);
    println!("   Stylesheets: {}", stats.stylesheet_count);
    println!("   Scripts: {}", stats.script_count);
    println!("   Files written: {}", stats.files_written);
    println!("   Convert time: {}ms", stats.convert_time_ms);
    if !stats.unresolved.is_empty() {
        println!("\n   Unresolved references:");
        for reference in &stats.unresolved {
            println!("     {}", reference);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ConfigFile, EnhancedCli};
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_check_fails_on_collision_despite_overwrite_config() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/themes/default/globals/site.variables", "@emSize: 14px;\n");
        write(dir.path(), "src/definitions/collections/menu.less", ".ui.menu {}\n");
        write(dir.path(), "src/definitions/collections/menu.css.less", ".ui.menu {}\n");

        let mut cli = EnhancedCli::new();
        cli.config = ConfigFile {
            on_collision: Some(CollisionPolicy::Overwrite),
            ..Default::default()
        };
        let source = dir.path().to_string_lossy().into_owned();
        let matches = cli.build_cli().get_matches_from(["less2sass", "check", "--source", source.as_str()]);
        let (_, sub) = matches.subcommand().unwrap();

        let err = handle_check_command(&cli, sub).unwrap_err();
        assert!(matches!(err, ConverterError::OutputCollision { .. }));
        assert!(!dir.path().join("app").exists());
    }

    #[test]
    fn test_check_passes_clean_checkout() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/themes/default/globals/site.variables", "@emSize: 14px;\n");
        write(dir.path(), "src/definitions/elements/button.less", ".ui.button { font-size: @emSize; }\n");

        let cli = EnhancedCli::new();
        let source = dir.path().to_string_lossy().into_owned();
        let matches = cli.build_cli().get_matches_from(["less2sass", "check", "--source", source.as_str()]);
        let (_, sub) = matches.subcommand().unwrap();

        assert!(handle_check_command(&cli, sub).is_ok());
    }
}
