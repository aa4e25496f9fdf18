//! LESS variable name to Sass variable name resolution
//!
//! A LESS identifier such as `@textColor` declared in `elements/button.variables`
//! becomes `$elements-button-text-color`. References made from a scope fall back
//! to the global name when the scope has no declaration of its own yet, so the
//! answer depends on what the [`VariableTable`] holds at the time of the call.

use crate::types::{DIGIT_PREFIX, LESS_SIGIL, RESERVED_AT_RULES, SASS_SIGIL};
use crate::variable_table::VariableTable;
use once_cell::sync::Lazy;
use regex::Regex;

static ACRONYM_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z\d]+)([A-Z][a-z])").unwrap());

static CAMEL_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z\d])([A-Z])").unwrap());

/// How a resolved name relates to the variable table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    /// A CSS at-rule such as `@media`, passed through untouched
    AtRule,
    /// The name exists in the table, or is being declared (`force`)
    Declared,
    /// The scoped name was missing and the global name exists
    Fallback,
    /// Neither the scoped nor the global name exists
    Undeclared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub name: String,
    pub kind: ResolutionKind,
}

impl Resolution {
    pub fn is_unresolved(&self) -> bool {
        self.kind == ResolutionKind::Undeclared
    }
}

/// Resolves names against the variables collected so far
#[derive(Debug, Clone, Copy)]
pub struct NameResolver<'a> {
    table: &'a VariableTable,
}

impl<'a> NameResolver<'a> {
    pub fn new(table: &'a VariableTable) -> Self {
        Self { table }
    }

    /// Map `raw_name` (without its `@`) to a qualified Sass name.
    ///
    /// With `force` set the scoped name is returned as is; declarations always
    /// name themselves. Otherwise a scoped name that is not in the table falls
    /// back to the global one.
    pub fn resolve(&self, raw_name: &str, scope: Option<&str>, force: bool) -> Resolution {
        if is_reserved(raw_name) {
            return Resolution {
                name: format!("{}{}", LESS_SIGIL, raw_name),
                kind: ResolutionKind::AtRule,
            };
        }

        let name = qualify(raw_name, scope);

        if force {
            return Resolution {
                name,
                kind: ResolutionKind::Declared,
            };
        }

        if self.table.contains(&name) {
            return Resolution {
                name,
                kind: ResolutionKind::Declared,
            };
        }

        match scope {
            Some(_) => {
                let global = self.resolve(raw_name, None, false);
                let kind = match global.kind {
                    ResolutionKind::Declared => ResolutionKind::Fallback,
                    other => other,
                };
                Resolution {
                    name: global.name,
                    kind,
                }
            }
            None => Resolution {
                name,
                kind: ResolutionKind::Undeclared,
            },
        }
    }

    /// Shorthand for `resolve(..).name`
    pub fn resolve_name(&self, raw_name: &str, scope: Option<&str>, force: bool) -> String {
        self.resolve(raw_name, scope, force).name
    }
}

pub fn is_reserved(raw_name: &str) -> bool {
    RESERVED_AT_RULES.contains(&raw_name)
}

/// Scope-prefixed, sigil-carrying name without any table lookup
pub fn qualify(raw_name: &str, scope: Option<&str>) -> String {
    let name = sass_identifier(raw_name);
    match scope {
        Some(scope) => format!("{}{}-{}", SASS_SIGIL, scope.replace('/', "-"), name),
        None => format!("{}{}", SASS_SIGIL, name),
    }
}

/// Convert a camelCase or snake_case LESS identifier to hyphenated lowercase
pub fn sass_identifier(raw_name: &str) -> String {
    let name = ACRONYM_BOUNDARY.replace_all(raw_name, "${1}_${2}");
    let name = CAMEL_BOUNDARY.replace_all(&name, "${1}_${2}");
    let name = name.replace('_', "-").to_lowercase();

    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("{}{}", DIGIT_PREFIX, name)
    } else {
        name
    }
}
