//! LESS to Sass syntax rewriting
//!
//! A stylesheet is converted by a fixed sequence of text passes:
//!
//! 1. **Imports** - `@import` lines and the legacy `.loadUIOverrides();` /
//!    `.loadFonts();` calls are removed; the asset pipeline handles loading.
//! 2. **Variables** - references are renamed to their Sass names:
//!    a. a reference opening a value and glued to literal text (`@size~"px"`)
//!       is wrapped in `#{}`, since Sass only concatenates through interpolation
//!    b. every other `@name` becomes its qualified `$name`
//!    c. `@{name}` becomes `#{$name}`
//!    d. `unit(EXPR, UNIT)` becomes `EXPR + 0UNIT`
//! 3. **Literal quotes** - `~"..."` escapes are unwrapped, and a reference
//!    sandwiched between two of them becomes an interpolation.
//! 4. **Asset URLs** (opt-in) - font and image URLs are pointed at the
//!    asset pipeline helpers.
//!
//! Later passes rely on earlier ones: quote normalisation expects references
//! to be Sass names already, and the unit pass expects `$` names inside `unit()`.

use crate::resolver::{qualify, NameResolver, Resolution, ResolutionKind};
use crate::types::Diagnostics;
use crate::variable_table::VariableTable;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashSet;

static IMPORT_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*@import\b.*$").unwrap());

static LEGACY_LOADER_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.load(?:UIOverrides|Fonts)\(\);").unwrap());

/// Reference at the start of a value followed by a character that glues it to
/// literal text. Operators, separators and whitespace do not count as glue.
static LEADING_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(^[ \t]*|:[ \t]*)@([-\w]+)([^-\w\s:;,(){}!*/+=<>@])").unwrap()
});

/// `@name:` at the start of a line declares a fragment-local variable
static LOCAL_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*@([-\w]+)[ \t]*:").unwrap());

static BARE_REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([-\w]+)").unwrap());

static INTERPOLATED_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\{([-\w]+)\}").unwrap());

static UNIT_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"unit\((.*?),\s*(\w+)\s*\)").unwrap());

static UNIT_LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s+\((\d+)\s+").unwrap());

static DOUBLE_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"~"([^"\n]*)"([^;"~\n]*)~"([^"\n]*)""#).unwrap());

static SINGLE_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"~"([^"\n]*)""#).unwrap());

static FONT_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"url\("\./\.\./themes/default/assets/fonts/?(.*?)"\)"#).unwrap()
});

static IMAGE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"url\("?(.*?)\.png"?\)"#).unwrap());

const FONT_IMPORT_URL: &str =
    "'https://fonts.googleapis.com/css?family=Lato:400,700,400italic,700italic&subset=latin'";
const FONT_FAMILY_STACK: &str =
    "font-family: 'Lato', 'Helvetica Neue', Arial, Helvetica, sans-serif";
const THEME_IMAGE_PATH: &str = "../themes/default/assets/images/";
const ASSET_NAMESPACE: &str = "semantic-ui/";

/// Converts LESS text using the names collected in a [`VariableTable`]
#[derive(Debug, Clone, Copy)]
pub struct Rewriter<'a> {
    resolver: NameResolver<'a>,
    rewrite_asset_urls: bool,
}

impl<'a> Rewriter<'a> {
    pub fn new(table: &'a VariableTable) -> Self {
        Self {
            resolver: NameResolver::new(table),
            rewrite_asset_urls: false,
        }
    }

    pub fn with_asset_urls(mut self, enabled: bool) -> Self {
        self.rewrite_asset_urls = enabled;
        self
    }

    /// Run every pass over one stylesheet.
    ///
    /// `source` only labels diagnostics for references that resolve nowhere.
    /// Names the stylesheet declares itself (`@type: 'element';`) stay valid
    /// Sass after renaming and are not reported.
    pub fn convert(
        &self,
        content: &str,
        scope: Option<&str>,
        source: &str,
        diagnostics: &mut Diagnostics,
    ) -> String {
        let content = strip_imports(content);
        let local = local_declarations(&content);

        let mut found = Diagnostics::new();
        let content = self.substitute_variables(&content, scope, source, &mut found);
        found.unresolved.retain(|reference| !local.contains(&reference.name));
        diagnostics.merge(found);

        let content = normalize_literal_quotes(&content);
        if self.rewrite_asset_urls {
            rewrite_asset_urls(&content)
        } else {
            content
        }
    }

    /// Variable passes 2a-2d; also applied to declaration values
    pub fn substitute_variables(
        &self,
        input: &str,
        scope: Option<&str>,
        source: &str,
        diagnostics: &mut Diagnostics,
    ) -> String {
        let output = self.wrap_leading_references(input, scope, source, diagnostics);
        let output = self.replace_bare_references(&output, scope, source, diagnostics);
        let output = self.replace_interpolated_references(&output, scope, source, diagnostics);
        translate_unit_arithmetic(&output)
    }

    pub fn wrap_leading_references(
        &self,
        input: &str,
        scope: Option<&str>,
        source: &str,
        diagnostics: &mut Diagnostics,
    ) -> String {
        LEADING_REFERENCE
            .replace_all(input, |caps: &Captures| {
                let resolution = self.lookup(&caps[2], scope, source, diagnostics);
                if resolution.kind == ResolutionKind::AtRule {
                    return caps[0].to_string();
                }
                format!("{}#{{{}}}{}", &caps[1], resolution.name, &caps[3])
            })
            .into_owned()
    }

    pub fn replace_bare_references(
        &self,
        input: &str,
        scope: Option<&str>,
        source: &str,
        diagnostics: &mut Diagnostics,
    ) -> String {
        BARE_REFERENCE
            .replace_all(input, |caps: &Captures| {
                self.lookup(&caps[1], scope, source, diagnostics).name
            })
            .into_owned()
    }

    pub fn replace_interpolated_references(
        &self,
        input: &str,
        scope: Option<&str>,
        source: &str,
        diagnostics: &mut Diagnostics,
    ) -> String {
        INTERPOLATED_REFERENCE
            .replace_all(input, |caps: &Captures| {
                let resolution = self.lookup(&caps[1], scope, source, diagnostics);
                format!("#{{{}}}", resolution.name)
            })
            .into_owned()
    }

    fn lookup(
        &self,
        raw_name: &str,
        scope: Option<&str>,
        source: &str,
        diagnostics: &mut Diagnostics,
    ) -> Resolution {
        let resolution = self.resolver.resolve(raw_name, scope, false);
        if resolution.is_unresolved() {
            diagnostics.record_unresolved(&resolution.name, scope, source);
        }
        resolution
    }
}

/// Pass 1: drop import lines and legacy loader calls
pub fn strip_imports(input: &str) -> String {
    let without_imports = IMPORT_LINE.replace_all(input, "");
    LEGACY_LOADER_CALL.replace_all(&without_imports, "").into_owned()
}

/// Sass names of the variables a stylesheet declares at line start
pub fn local_declarations(input: &str) -> HashSet<String> {
    LOCAL_DECLARATION
        .captures_iter(input)
        .map(|caps| qualify(&caps[1], None))
        .collect()
}

/// Pass 2d: LESS `unit()` is addition of a zero-valued dimension in Sass
pub fn translate_unit_arithmetic(input: &str) -> String {
    UNIT_CALL
        .replace_all(input, |caps: &Captures| {
            let expression = UNIT_LEADING_NUMBER.replace(&caps[1], "(${1}px ");
            format!("{} + 0{}", expression, &caps[2])
        })
        .into_owned()
}

/// Pass 3: unwrap `~"..."` literal escapes
pub fn normalize_literal_quotes(input: &str) -> String {
    let joined = DOUBLE_LITERAL.replace_all(input, |caps: &Captures| {
        let (before, middle, after) = (&caps[1], &caps[2], &caps[3]);
        if middle.trim().is_empty() || is_interpolation(middle) {
            format!("{}{}{}", before, middle, after)
        } else {
            format!("{}#{{{}}}{}", before, middle, after)
        }
    });
    SINGLE_LITERAL.replace_all(&joined, "${1}").into_owned()
}

fn is_interpolation(text: &str) -> bool {
    text.starts_with("#{") && text.ends_with('}') && text.matches("#{").count() == 1
}

/// Pass 4: point font and image references at the asset pipeline
pub fn rewrite_asset_urls(input: &str) -> String {
    let output = FONT_URL.replace_all(input, |caps: &Captures| {
        format!("font-url(\"{}{}\")", ASSET_NAMESPACE, &caps[1])
    });
    let output = output.replace(FONT_IMPORT_URL, "$font-url");
    let output = output.replace(FONT_FAMILY_STACK, "font-family: $font-family");
    let output = IMAGE_URL.replace_all(&output, |caps: &Captures| {
        format!("image-url(\"{}.png\")", &caps[1])
    });
    output.replace(THEME_IMAGE_PATH, ASSET_NAMESPACE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable_table::VariableSet;

    fn table_with(names: &[&str]) -> VariableTable {
        let mut table = VariableTable::new();
        for name in names {
            table.insert(VariableSet::General, name.to_string(), "0".to_string());
        }
        table
    }

    fn convert(table: &VariableTable, content: &str, scope: Option<&str>) -> String {
        let mut diagnostics = Diagnostics::new();
        Rewriter::new(table).convert(content, scope, "test.less", &mut diagnostics)
    }

    #[test]
    fn test_strip_imports() {
        let input = "@import (multiple) '../../theme.config';\n.ui.button { color: red; }\n.loadUIOverrides();\n";
        let output = strip_imports(input);
        assert!(!output.contains("@import"));
        assert!(!output.contains("loadUIOverrides"));
        assert!(output.contains(".ui.button { color: red; }"));
    }

    #[test]
    fn test_import_only_fragment_becomes_blank() {
        let table = VariableTable::new();
        let output = convert(&table, "  @import 'site.variables';\n", None);
        assert!(output.trim().is_empty());
    }

    #[test]
    fn test_bare_reference() {
        let table = table_with(&["$red-text-color"]);
        assert_eq!(convert(&table, "color: @red-text-color;", None), "color: $red-text-color;");
        assert_eq!(convert(&table, "color: @redTextColor;", None), "color: $red-text-color;");
    }

    #[test]
    fn test_scoped_reference_prefers_scope() {
        let table = table_with(&["$elements-button-vertical-align", "$text-color"]);
        let output = convert(
            &table,
            "vertical-align: @verticalAlign;\ncolor: @textColor;",
            Some("elements/button"),
        );
        assert_eq!(
            output,
            "vertical-align: $elements-button-vertical-align;\ncolor: $text-color;"
        );
    }

    #[test]
    fn test_interpolated_reference() {
        let table = table_with(&["$prefix"]);
        assert_eq!(convert(&table, ".@{prefix}-icon {", None), ".#{$prefix}-icon {");
    }

    #[test]
    fn test_leading_reference_glued_to_literal() {
        let table = table_with(&["$size"]);
        let mut diagnostics = Diagnostics::new();
        let rewriter = Rewriter::new(&table);

        let wrapped = rewriter.wrap_leading_references("width: @size~\"px\";", None, "t", &mut diagnostics);
        assert_eq!(wrapped, "width: #{$size}~\"px\";");
        assert_eq!(convert(&table, "width: @size~\"px\";", None), "width: #{$size}px;");
    }

    #[test]
    fn test_leading_reference_leaves_plain_values() {
        let table = table_with(&["$size", "$gutter"]);
        let mut diagnostics = Diagnostics::new();
        let rewriter = Rewriter::new(&table);
        for input in ["width: @size;", "@size: 1em;", "margin: @size @gutter;", "width: @size*2;", "@media @size {"] {
            assert_eq!(rewriter.wrap_leading_references(input, None, "t", &mut diagnostics), input);
        }
    }

    #[test]
    fn test_at_rules_survive() {
        let table = table_with(&["$computer-breakpoint"]);
        let output = convert(&table, "@media only screen and (min-width: @computerBreakpoint) {", None);
        assert_eq!(output, "@media only screen and (min-width: $computer-breakpoint) {");
        assert_eq!(convert(&table, "@font-face {", None), "@font-face {");
    }

    #[test]
    fn test_double_literal_embeds_variable() {
        let table = table_with(&["$icon", "$gutter"]);
        let output = convert(&table, "content: ~\"@{icon}\"~\"\";", None);
        assert_eq!(output, "content: #{$icon};");

        let output = convert(&table, "left: ~\"calc(\"@gutter~\" - 1px)\";", None);
        assert_eq!(output, "left: calc(#{$gutter} - 1px);");
    }

    #[test]
    fn test_single_literal_unwrapped() {
        assert_eq!(
            normalize_literal_quotes("width: ~\"calc(100% - 2em)\";"),
            "width: calc(100% - 2em);"
        );
    }

    #[test]
    fn test_literal_quotes_idempotent() {
        let once = normalize_literal_quotes("a: ~\"x\"$y~\"z\"; b: ~\"calc(1px)\";");
        assert_eq!(once, "a: x#{$y}z; b: calc(1px);");
        assert_eq!(normalize_literal_quotes(&once), once);
    }

    #[test]
    fn test_unit_arithmetic() {
        assert_eq!(translate_unit_arithmetic("unit($x, px)"), "$x + 0px");
        assert_eq!(
            translate_unit_arithmetic("width: unit( (2 * $x), em);"),
            "width: (2px * $x) + 0em;"
        );
    }

    #[test]
    fn test_unit_arithmetic_after_substitution() {
        let table = table_with(&["$column-gap"]);
        assert_eq!(
            convert(&table, "padding: unit(@columnGap / 2, rem);", None),
            "padding: $column-gap / 2 + 0rem;"
        );
    }

    #[test]
    fn test_unresolved_references_are_reported() {
        let table = VariableTable::new();
        let mut diagnostics = Diagnostics::new();
        let output = Rewriter::new(&table).convert(
            "color: @nonexistent;",
            Some("buttons"),
            "elements/button.less",
            &mut diagnostics,
        );
        assert_eq!(output, "color: $nonexistent;");
        assert_eq!(diagnostics.unresolved.len(), 1);
        assert_eq!(diagnostics.unresolved[0].name, "$nonexistent");
    }

    #[test]
    fn test_fragment_local_declarations_are_not_unresolved() {
        let table = VariableTable::new();
        let mut diagnostics = Diagnostics::new();
        let output = Rewriter::new(&table).convert(
            "@type: 'element';\n@element : 'button';\n.ui.@{element} { color: @missing; }\n",
            Some("elements/button"),
            "elements/button.less",
            &mut diagnostics,
        );

        assert!(output.starts_with("$type: 'element';\n$element : 'button';\n"));
        assert!(output.contains(".ui.#{$element} { color: $missing; }"));
        let names: Vec<&str> = diagnostics.unresolved.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["$missing"]);
    }

    #[test]
    fn test_local_declarations() {
        let local = local_declarations("@type: 'element';\n  @textColor : red;\n.a { b: @c; }\n@media screen {\n");
        assert_eq!(local.len(), 2);
        assert!(local.contains("$type"));
        assert!(local.contains("$text-color"));
    }

    #[test]
    fn test_asset_urls_opt_in() {
        let table = VariableTable::new();
        let input = "src: url(\"./../themes/default/assets/fonts/icons.woff\");";
        assert_eq!(convert(&table, input, None), input);

        let mut diagnostics = Diagnostics::new();
        let output = Rewriter::new(&table)
            .with_asset_urls(true)
            .convert(input, None, "t", &mut diagnostics);
        assert_eq!(output, "src: font-url(\"semantic-ui/icons.woff\");");
    }

    #[test]
    fn test_rewrite_asset_urls() {
        assert_eq!(
            rewrite_asset_urls("background: url(\"../themes/default/assets/images/flags.png\");"),
            "background: image-url(\"semantic-ui/flags.png\");"
        );
        assert_eq!(
            rewrite_asset_urls("font-family: 'Lato', 'Helvetica Neue', Arial, Helvetica, sans-serif;"),
            "font-family: $font-family;"
        );
    }
}
