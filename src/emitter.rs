//! Writing converted stylesheets, variable files and script copies

use crate::error::{ConverterError, Result};
use crate::rewriter::normalize_literal_quotes;
use crate::types::{ConvertedFragment, PARTIAL_PREFIX, SASS_EXTENSION};
use crate::variable_table::{VariableSet, VariableTable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Legacy format token stripped from the end of output names
const FORMAT_EXTENSION: &str = ".css";

pub const VARIABLES_NAME: &str = "variables";
pub const BASIC_VARIABLES_NAME: &str = "basic_vars";

/// What to do when two sources map to the same output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Abort the run
    #[default]
    Error,
    /// Last writer wins, with a warning
    Overwrite,
}

#[derive(Debug)]
pub struct AssetEmitter {
    output_root: PathBuf,
    policy: CollisionPolicy,
    dry_run: bool,
    written: HashMap<PathBuf, String>,
}

impl AssetEmitter {
    pub fn new(output_root: impl Into<PathBuf>, policy: CollisionPolicy) -> Self {
        Self {
            output_root: output_root.into(),
            policy,
            dry_run: false,
            written: HashMap::new(),
        }
    }

    /// Track paths and collisions without touching the filesystem
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn files_written(&self) -> usize {
        self.written.len()
    }

    /// `<root>/<relative_directory>/<prefix><name>.scss`, minus any `.css` on the name
    pub fn output_path(&self, output_name: &str, relative_directory: &str, prefix: &str) -> PathBuf {
        let name = output_name.strip_suffix(FORMAT_EXTENSION).unwrap_or(output_name);
        let file_name = format!("{}{}.{}", prefix, name, SASS_EXTENSION);
        let mut path = self.output_root.clone();
        if !relative_directory.is_empty() {
            path.push(relative_directory);
        }
        path.push(file_name);
        path
    }

    /// Write one Sass file, creating directories as needed
    pub fn emit(
        &mut self,
        output_name: &str,
        content: &str,
        relative_directory: &str,
        prefix: &str,
        source: &str,
    ) -> Result<PathBuf> {
        let path = self.output_path(output_name, relative_directory, prefix);
        self.claim(&path, source)?;

        if !self.dry_run {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, content)?;
            log::debug!("Saved {}", path.display());
        }
        Ok(path)
    }

    /// Write a converted stylesheet as a partial
    pub fn emit_fragment(&mut self, fragment: &ConvertedFragment, source: &str) -> Result<PathBuf> {
        self.emit(
            &fragment.output_name,
            &fragment.rewritten_content,
            &fragment.output_directory,
            PARTIAL_PREFIX,
            source,
        )
    }

    /// Write `variables.scss` and `basic_vars.scss` at the output root
    pub fn emit_variables(&mut self, table: &VariableTable) -> Result<(PathBuf, PathBuf)> {
        let general = normalize_literal_quotes(&table.render(VariableSet::General));
        let basic = normalize_literal_quotes(&table.render(VariableSet::Basic));
        let general_path = self.emit(VARIABLES_NAME, &general, "", "", "<variable table>")?;
        let basic_path = self.emit(BASIC_VARIABLES_NAME, &basic, "", "", "<basic variable table>")?;
        Ok((general_path, basic_path))
    }

    /// Copy a file verbatim into the output root, keeping only its file name
    pub fn copy_script(&mut self, source: &Path) -> Result<PathBuf> {
        let file_name = source.file_name().ok_or_else(|| ConverterError::InvalidFormat {
            message: format!("{} has no file name", source.display()),
        })?;
        let target = self.output_root.join(file_name);
        self.claim(&target, &source.display().to_string())?;

        if !self.dry_run {
            fs::create_dir_all(&self.output_root)?;
            fs::copy(source, &target).map_err(|e| {
                ConverterError::io_at(format!("{} -> {}", source.display(), target.display()), e)
            })?;
            log::debug!("Copied {} -> {}", source.display(), target.display());
        }
        Ok(target)
    }

    fn claim(&mut self, path: &Path, source: &str) -> Result<()> {
        if let Some(first) = self.written.get(path) {
            match self.policy {
                CollisionPolicy::Error => {
                    return Err(ConverterError::OutputCollision {
                        path: path.display().to_string(),
                        first: first.clone(),
                        second: source.to_string(),
                    });
                }
                CollisionPolicy::Overwrite => {
                    log::warn!(
                        "{} from '{}' overwrites output of '{}'",
                        path.display(),
                        source,
                        first
                    );
                }
            }
        }
        self.written.insert(path.to_path_buf(), source.to_string());
        Ok(())
    }
}
