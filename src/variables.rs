//! Variable table construction from LESS theme declaration files
//!
//! The site-wide file is read first without a scope, then every other
//! `.variables` file under the theme root in [`list_files`] order, each scoped
//! by its relative path. Declarations always define their own scoped name;
//! references inside their values are resolved against what has been
//! collected so far.

use crate::discovery::{list_files, relative_slash_path};
use crate::error::{ConverterError, Result};
use crate::resolver::NameResolver;
use crate::rewriter::Rewriter;
use crate::types::{is_basic_variable, Diagnostics, VariableDeclaration, DECLARATION_EXTENSION};
use crate::variable_table::{VariableSet, VariableTable};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything after this divider loads with the basic variables
static SITE_COLORS_DIVIDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\*-+\s+Site Colors\s+-+\*/").unwrap());

static DECLARATION_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*@([-\w]+)\s*:\s*(.*?);").unwrap());

pub const DEFAULT_SITE_VARIABLES: &str = "globals/site.variables";

pub struct VariableTableBuilder {
    site_variables: PathBuf,
    diagnostics: Diagnostics,
    file_count: usize,
}

impl VariableTableBuilder {
    pub fn new() -> Self {
        Self::with_site_variables(DEFAULT_SITE_VARIABLES)
    }

    /// `site_variables` is relative to the theme root
    pub fn with_site_variables(site_variables: impl Into<PathBuf>) -> Self {
        Self {
            site_variables: site_variables.into(),
            diagnostics: Diagnostics::new(),
            file_count: 0,
        }
    }

    /// Build the complete table for the theme under `theme_root`
    pub fn build(&mut self, theme_root: &Path) -> Result<VariableTable> {
        let mut table = VariableTable::new();
        self.diagnostics = Diagnostics::new();
        self.file_count = 0;

        let site_path = theme_root.join(&self.site_variables);
        let site_scope = relative_slash_path(theme_root, &site_path)?;
        let site_scope = site_scope
            .strip_suffix(DECLARATION_EXTENSION)
            .unwrap_or(&site_scope)
            .to_string();

        // Phase 1: site-wide declarations, unscoped
        self.parse_declaration_file(&mut table, &site_path, None)?;

        // Phase 2: component declarations, scoped by path
        for path in list_files(theme_root, DECLARATION_EXTENSION)? {
            let relative = relative_slash_path(theme_root, &path)?;
            let scope = relative
                .strip_suffix(DECLARATION_EXTENSION)
                .unwrap_or(&relative);
            if scope == site_scope {
                continue;
            }
            self.parse_declaration_file(&mut table, &path, Some(scope))?;
        }

        // Phase 3: fixed basic-variable order
        table.apply_basic_reorderings();

        // References to names declared later in the walk are fine after all
        let before = self.diagnostics.unresolved.len();
        self.diagnostics
            .unresolved
            .retain(|reference| !table.contains(&reference.name));
        log::debug!(
            "Dropped {} forward references satisfied by later declarations",
            before - self.diagnostics.unresolved.len()
        );

        log::info!(
            "Collected {} variables ({} basic) from {} declaration files",
            table.len(),
            table.basic_len(),
            self.file_count
        );
        Ok(table)
    }

    /// Read one declaration file into `table`
    pub fn parse_declaration_file(
        &mut self,
        table: &mut VariableTable,
        path: &Path,
        scope: Option<&str>,
    ) -> Result<()> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConverterError::io_at(path.display().to_string(), e))?;

        let declarations = parse_declarations(&content, scope);
        log::debug!(
            "{}: {} declarations (scope {:?})",
            path.display(),
            declarations.len(),
            scope
        );

        let source = path.display().to_string();
        for declaration in &declarations {
            add_declaration(table, declaration, &source, &mut self.diagnostics);
        }
        self.file_count += 1;
        Ok(())
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }
}

impl Default for VariableTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract `@name: value;` declarations, marking those after the
/// "Site Colors" divider. Lines that do not match are skipped.
pub fn parse_declarations(content: &str, scope: Option<&str>) -> Vec<VariableDeclaration> {
    let (before, after) = match SITE_COLORS_DIVIDER.find(content) {
        Some(divider) => (&content[..divider.start()], Some(&content[divider.end()..])),
        None => (content, None),
    };

    let mut declarations = Vec::new();
    let sections = std::iter::once((before, false)).chain(after.map(|text| (text, true)));
    for (text, after_divider) in sections {
        for caps in DECLARATION_LINE.captures_iter(text) {
            declarations.push(VariableDeclaration {
                raw_name: caps[1].to_string(),
                scope: scope.map(str::to_string),
                value_expression: caps[2].trim_end().to_string(),
                after_divider,
            });
        }
    }
    declarations
}

/// Resolve and store one declaration
pub fn add_declaration(
    table: &mut VariableTable,
    declaration: &VariableDeclaration,
    source: &str,
    diagnostics: &mut Diagnostics,
) {
    let scope = declaration.scope.as_deref();
    let name = NameResolver::new(table).resolve_name(&declaration.raw_name, scope, true);
    let value = Rewriter::new(table).substitute_variables(
        &declaration.value_expression,
        scope,
        source,
        diagnostics,
    );

    let set = if declaration.after_divider || is_basic_variable(&name) {
        VariableSet::Basic
    } else {
        VariableSet::General
    };
    log::trace!("{} = {} ({:?})", name, value, set);
    table.insert(set, name, value);
}
