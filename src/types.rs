//! Core types and constants for the converter

use serde::Serialize;
use std::fmt;

// Dialect Constants
pub const SASS_SIGIL: char = '$';
pub const LESS_SIGIL: char = '@';
pub const SASS_EXTENSION: &str = "scss";
pub const LESS_EXTENSION: &str = ".less";
pub const DECLARATION_EXTENSION: &str = ".variables";
pub const SCRIPT_EXTENSION: &str = ".js";
pub const PARTIAL_PREFIX: &str = "_";

/// Sass identifiers cannot start with a digit; such names get this prefix
pub const DIGIT_PREFIX: &str = "size";

/// At-rule keywords that look like LESS variables but belong to CSS itself
pub const RESERVED_AT_RULES: &[&str] = &[
    "media",
    "keyframes",
    "-webkit-keyframes",
    "-moz-keyframes",
    "font-face",
    "supports",
    "charset",
    "page",
];

// Variable Table Constants

/// Palette whose `-header-color` entry must directly follow its `-text-color`
pub const PALETTE_COLORS: &[&str] = &[
    "red", "orange", "yellow", "olive", "green", "teal", "blue", "violet", "purple", "pink",
    "brown",
];

const BASIC_SIZES: &[&str] = &[
    "em", "font", "mini", "tiny", "small", "medium", "large", "big", "huge", "massive", "loader",
];

const BASIC_BREAKPOINTS: &[&str] = &[
    "mobile",
    "tablet",
    "computer",
    "large-monitor",
    "widescreen-monitor",
];

const BASIC_SINGLETONS: &[&str] = &["$line-height", "$header-line-height", "$column-count"];

/// Entry moved behind [`LOADER_SIZE_ANCHOR`]
pub const LOADER_SIZE: &str = "$loader-size";
pub const LOADER_SIZE_ANCHOR: &str = "$relative-big";

/// Qualified names that always belong to the basic variables
pub fn is_basic_variable(qualified_name: &str) -> bool {
    if BASIC_SINGLETONS.contains(&qualified_name) {
        return true;
    }
    let Some(bare) = qualified_name.strip_prefix(SASS_SIGIL) else {
        return false;
    };
    if let Some(family) = bare.strip_suffix("-size") {
        return BASIC_SIZES.contains(&family);
    }
    if let Some(family) = bare.strip_suffix("-breakpoint") {
        return BASIC_BREAKPOINTS.contains(&family);
    }
    false
}

/// A `@name: value;` line read out of a declaration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclaration {
    pub raw_name: String,
    pub scope: Option<String>,
    pub value_expression: String,
    /// True when the line sits after the "Site Colors" divider
    pub after_divider: bool,
}

/// A declaration after name resolution and value rewriting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVariable {
    pub qualified_name: String,
    pub value_expression: String,
}

/// One LESS stylesheet waiting to be converted
#[derive(Debug, Clone)]
pub struct StylesheetFragment {
    pub source_path: String,
    /// Directory relative to the definitions root, `/` separated
    pub scope_directory: String,
    /// Relative path without extension, used for name resolution
    pub scope: String,
    pub raw_content: String,
}

impl StylesheetFragment {
    /// File stem of the fragment, which becomes its output name
    pub fn name(&self) -> &str {
        self.scope.rsplit('/').next().unwrap_or(&self.scope)
    }
}

/// A fragment after rewriting, ready for the emitter
#[derive(Debug, Clone)]
pub struct ConvertedFragment {
    pub output_name: String,
    pub output_directory: String,
    pub rewritten_content: String,
}

/// A variable reference that matched no declaration, scoped or global
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedReference {
    pub name: String,
    pub scope: Option<String>,
    pub source: String,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{} (scope '{}') in {}", self.name, scope, self.source),
            None => write!(f, "{} in {}", self.name, self.source),
        }
    }
}

/// Non-fatal findings gathered over a conversion run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub unresolved: Vec<UnresolvedReference>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_unresolved(&mut self, name: &str, scope: Option<&str>, source: &str) {
        let reference = UnresolvedReference {
            name: name.to_string(),
            scope: scope.map(str::to_string),
            source: source.to_string(),
        };
        if !self.unresolved.contains(&reference) {
            self.unresolved.push(reference);
        }
    }

    pub fn log_warnings(&self) {
        for reference in &self.unresolved {
            log::warn!("Unresolved variable {}", reference);
        }
    }

    pub fn merge(&mut self, other: Diagnostics) {
        for reference in other.unresolved {
            if !self.unresolved.contains(&reference) {
                self.unresolved.push(reference);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.unresolved.is_empty()
    }
}
