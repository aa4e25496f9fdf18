//! Semantic UI LESS to Sass converter
//!
//! Converts the LESS sources of a Semantic UI checkout into Sass partials that
//! can be vendored into a host project's asset pipeline, mirrors the bundled
//! JavaScript, and records which upstream revision was converted.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use less2sass::{convert_theme, ConverterOptions, Result};
//!
//! fn main() -> Result<()> {
//!     let options = ConverterOptions {
//!         skip_checkout: true,
//!         ..Default::default()
//!     };
//!     let stats = convert_theme(&options)?;
//!     println!("{} stylesheets converted", stats.stylesheet_count);
//!     Ok(())
//! }
//! ```
//!
//! # Conversion Pipeline
//!
//! 1. **Phase 0**: Upstream - clone or fetch the checkout, check out the ref
//! 2. **Phase 1**: Variables - read every theme declaration file into one table
//! 3. **Phase 2**: Variable files - write `variables.scss` and `basic_vars.scss`
//! 4. **Phase 3**: Stylesheets - rewrite every definition `.less` file
//! 5. **Phase 4**: Scripts - copy definition `.js` files verbatim
//! 6. **Phase 5**: Version - stamp the converted tree hash into the host project
//!
//! Phase 1 completes before any stylesheet is rewritten, because fallback
//! resolution must see the whole table.

pub mod types;
pub mod error;
pub mod discovery;
pub mod variable_table;
pub mod resolver;
pub mod rewriter;
pub mod variables;
pub mod emitter;
pub mod upstream;
pub mod cli;

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

// Re-export commonly used types and functions
pub use error::{ConverterError, Result};
pub use types::*;
pub use discovery::list_files;
pub use variable_table::{VariableSet, VariableTable};
pub use resolver::{NameResolver, Resolution, ResolutionKind};
pub use rewriter::Rewriter;
pub use variables::VariableTableBuilder;
pub use emitter::{AssetEmitter, CollisionPolicy};
pub use cli::EnhancedCli;

/// Converter version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Conversion options and settings
#[derive(Debug, Clone)]
pub struct ConverterOptions {
    /// Enable extra phase logging
    pub debug_mode: bool,

    /// Upstream repository to clone
    pub repository_url: String,

    /// Branch, tag or commit to convert
    pub git_ref: String,

    /// Upstream directory whose tree hash identifies the converted revision
    pub hashed_subtree: String,

    /// Local checkout of the upstream repository
    pub checkout_dir: PathBuf,

    /// Theme directory, relative to the checkout
    pub theme_dir: PathBuf,

    /// Definitions directory, relative to the checkout
    pub definitions_dir: PathBuf,

    /// Site-wide declaration file, relative to the theme directory
    pub site_variables: PathBuf,

    /// Output root for Sass files
    pub stylesheets_dir: PathBuf,

    /// Output directory for copied scripts
    pub javascripts_dir: PathBuf,

    /// Host project file holding the version constant
    pub version_file: PathBuf,

    /// Constant assigned the converted tree hash
    pub version_constant: String,

    /// Use the checkout as it is, without running git
    pub skip_checkout: bool,

    /// Stamp the tree hash into `version_file`
    pub record_version: bool,

    /// Run the font and image URL passes
    pub rewrite_asset_urls: bool,

    /// Behaviour when two sources map to one output file
    pub collision_policy: CollisionPolicy,

    /// Convert everything in memory and write nothing
    pub dry_run: bool,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            debug_mode: false,
            repository_url: "https://github.com/Semantic-Org/Semantic-UI.git".to_string(),
            git_ref: "master".to_string(),
            hashed_subtree: "dist".to_string(),
            checkout_dir: PathBuf::from("tmp/semantic-ui"),
            theme_dir: PathBuf::from("src/themes/default"),
            definitions_dir: PathBuf::from("src/definitions"),
            site_variables: PathBuf::from(variables::DEFAULT_SITE_VARIABLES),
            stylesheets_dir: PathBuf::from("app/assets/stylesheets/semantic-ui"),
            javascripts_dir: PathBuf::from("app/assets/javascripts/semantic-ui"),
            version_file: PathBuf::from("lib/semantic/ui/sass/version.rb"),
            version_constant: "SEMANTIC_UI_SHA".to_string(),
            skip_checkout: false,
            record_version: true,
            rewrite_asset_urls: false,
            collision_policy: CollisionPolicy::Error,
            dry_run: false,
        }
    }
}

impl ConverterOptions {
    pub fn theme_root(&self) -> PathBuf {
        self.checkout_dir.join(&self.theme_dir)
    }

    pub fn definitions_root(&self) -> PathBuf {
        self.checkout_dir.join(&self.definitions_dir)
    }
}

/// Conversion statistics and findings
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    /// Variables written to `variables.scss`
    pub variable_count: usize,

    /// Variables written to `basic_vars.scss`
    pub basic_variable_count: usize,

    /// Theme declaration files read
    pub declaration_file_count: usize,

    /// Stylesheets converted
    pub stylesheet_count: usize,

    /// Scripts copied
    pub script_count: usize,

    /// Output files written (or planned, in a dry run)
    pub files_written: usize,

    /// References that matched no declaration
    pub unresolved: Vec<UnresolvedReference>,

    /// Tree hash of the converted upstream subtree
    pub upstream_sha: Option<String>,

    /// Conversion time in milliseconds
    pub convert_time_ms: u64,
}

/// Full run: update the checkout, convert it, stamp the version
pub fn sync_and_convert(options: &ConverterOptions) -> Result<ConversionStats> {
    let start_time = Instant::now();

    // Phase 0: Upstream
    let revision = if options.skip_checkout {
        log::info!("Using existing checkout at {}", options.checkout_dir.display());
        "HEAD".to_string()
    } else {
        upstream::ensure_checkout(&options.repository_url, &options.checkout_dir)?;
        upstream::checkout_ref(&options.checkout_dir, &options.git_ref)?
    };

    let upstream_sha = if options.record_version {
        Some(upstream::tree_sha(&options.checkout_dir, &revision, &options.hashed_subtree)?)
    } else {
        None
    };

    let mut stats = convert_theme(options)?;

    // Phase 5: Version
    if let Some(sha) = &upstream_sha {
        if options.dry_run {
            log::info!("Dry run: would record {} = '{}'", options.version_constant, sha);
        } else {
            upstream::record_version_stamp(&options.version_file, &options.version_constant, sha)?;
        }
    }

    stats.upstream_sha = upstream_sha;
    stats.convert_time_ms = start_time.elapsed().as_millis() as u64;
    Ok(stats)
}

/// Convert the theme and definitions found in `options.checkout_dir`
pub fn convert_theme(options: &ConverterOptions) -> Result<ConversionStats> {
    let start_time = Instant::now();
    let mut stats = ConversionStats::default();

    if options.debug_mode {
        log::info!("{} v{}", NAME, VERSION);
        log::info!(
            "Converting {} into {}",
            options.checkout_dir.display(),
            options.stylesheets_dir.display()
        );
        log::debug!("Converter options: {:?}", options);
    }

    // Phase 1: Variables
    if options.debug_mode {
        log::debug!("Phase 1: Building variable table...");
    }

    let mut builder = VariableTableBuilder::with_site_variables(&options.site_variables);
    let table = builder.build(&options.theme_root())?;
    stats.variable_count = table.general_len();
    stats.basic_variable_count = table.basic_len();
    stats.declaration_file_count = builder.file_count();
    let mut diagnostics = builder.into_diagnostics();

    if options.debug_mode {
        log::debug!(
            "Phase 1 complete. General: {}, basic: {}",
            stats.variable_count,
            stats.basic_variable_count
        );
    }

    // Phase 2: Variable files
    let mut stylesheets = AssetEmitter::new(&options.stylesheets_dir, options.collision_policy)
        .dry_run(options.dry_run);
    stylesheets.emit_variables(&table)?;

    // Phase 3: Stylesheets
    if options.debug_mode {
        log::debug!("Phase 3: Rewriting stylesheets...");
    }

    let definitions_root = options.definitions_root();
    let rewriter = Rewriter::new(&table).with_asset_urls(options.rewrite_asset_urls);
    for path in list_files(&definitions_root, LESS_EXTENSION)? {
        let fragment = load_fragment(&definitions_root, &path)?;
        let converted = convert_fragment(&rewriter, &fragment, &mut diagnostics);
        stylesheets.emit_fragment(&converted, &fragment.source_path)?;
        stats.stylesheet_count += 1;
    }

    if options.debug_mode {
        log::debug!("Phase 3 complete. Stylesheets: {}", stats.stylesheet_count);
    }

    // Phase 4: Scripts
    let mut scripts = AssetEmitter::new(&options.javascripts_dir, options.collision_policy)
        .dry_run(options.dry_run);
    for path in list_files(&definitions_root, SCRIPT_EXTENSION)? {
        scripts.copy_script(&path)?;
        stats.script_count += 1;
    }

    stats.files_written = stylesheets.files_written() + scripts.files_written();
    diagnostics.log_warnings();
    stats.unresolved = diagnostics.unresolved;
    stats.convert_time_ms = start_time.elapsed().as_millis() as u64;

    log::info!(
        "Converted {} stylesheets and copied {} scripts ({} unresolved references)",
        stats.stylesheet_count,
        stats.script_count,
        stats.unresolved.len()
    );
    Ok(stats)
}

/// Read a definition stylesheet and derive its scope from its location.
///
/// The resolution scope is the whole relative path minus the extension
/// (`elements/button`), not just the directory the upstream converter used.
/// With the directory alone (`elements`) no component variable ever matched
/// and every reference fell through to the global name. The directory still
/// decides where the output lands.
pub fn load_fragment(definitions_root: &Path, path: &Path) -> Result<StylesheetFragment> {
    let relative = discovery::relative_slash_path(definitions_root, path)?;
    let scope = relative
        .strip_suffix(LESS_EXTENSION)
        .unwrap_or(&relative)
        .to_string();
    let scope_directory = match scope.rfind('/') {
        Some(index) => scope[..index].to_string(),
        None => String::new(),
    };
    let raw_content = fs::read_to_string(path)
        .map_err(|e| ConverterError::io_at(path.display().to_string(), e))?;

    Ok(StylesheetFragment {
        source_path: relative,
        scope_directory,
        scope,
        raw_content,
    })
}

pub fn convert_fragment(
    rewriter: &Rewriter<'_>,
    fragment: &StylesheetFragment,
    diagnostics: &mut Diagnostics,
) -> ConvertedFragment {
    let rewritten_content = rewriter.convert(
        &fragment.raw_content,
        Some(&fragment.scope),
        &fragment.source_path,
        diagnostics,
    );
    ConvertedFragment {
        output_name: fragment.name().to_string(),
        output_directory: fragment.scope_directory.clone(),
        rewritten_content,
    }
}

/// Convert LESS source text against an existing table, discarding diagnostics
pub fn convert_source(source: &str, scope: Option<&str>, table: &VariableTable) -> String {
    let mut diagnostics = Diagnostics::new();
    Rewriter::new(table).convert(source, scope, "<source>", &mut diagnostics)
}
