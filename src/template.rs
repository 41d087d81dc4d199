//! Literal placeholder substitution for SQL templates.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{ScriptError, ScriptResult};

pub const DATABASE: &str = "__database__";
pub const SCHEMA_PREFIX: &str = "__schema_prefix__";
/// camelCase spelling found in older templates.
pub const SCHEMA_PREFIX_CAMEL: &str = "__schemaPrefix__";

/// Replaces each placeholder with its value, in the given order.
///
/// No escaping and no recursion: a value that itself contains a placeholder
/// is only substituted again if a later pair matches it.
pub fn substitute(text: &str, replacements: &[(&str, &str)]) -> String {
    replacements
        .iter()
        .fold(text.to_string(), |acc, (placeholder, value)| {
            acc.replace(placeholder, value)
        })
}

#[derive(Debug, Clone)]
pub struct SqlTemplate {
    path: PathBuf,
    text: String,
}

impl SqlTemplate {
    pub fn load(path: impl AsRef<Path>) -> ScriptResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ScriptError::TemplateNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }

    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used when echoing the rendered query.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn render(&self, database: &str, schema_prefix: &str) -> String {
        substitute(
            &self.text,
            &[
                (DATABASE, database),
                (SCHEMA_PREFIX, schema_prefix),
                (SCHEMA_PREFIX_CAMEL, schema_prefix),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn renders_every_placeholder_spelling() {
        let template = SqlTemplate::from_text(
            "sql_metrics.sql",
            "select * from __database__.information_schema.schemata\n\
             where schema_name ilike '__schema_prefix__%' or schema_name ilike '__schemaPrefix__%'",
        );
        let sql = template.render("ANALYTICS", "dbt_ci");
        assert_eq!(
            sql,
            "select * from ANALYTICS.information_schema.schemata\n\
             where schema_name ilike 'dbt_ci%' or schema_name ilike 'dbt_ci%'"
        );
    }

    #[test]
    fn untouched_text_passes_through() {
        assert_eq!(substitute("select 1", &[(DATABASE, "X")]), "select 1");
    }

    #[test]
    fn replacements_apply_in_order() {
        let out = substitute("__a__", &[("__a__", "__b__"), ("__b__", "done")]);
        assert_eq!(out, "done");
        let out = substitute("__a__", &[("__b__", "done"), ("__a__", "__b__")]);
        assert_eq!(out, "__b__");
    }

    #[test]
    fn missing_file_is_reported_with_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.sql");
        let err = SqlTemplate::load(&path).unwrap_err();
        assert_matches!(err, ScriptError::TemplateNotFound(p) if p == path);
    }

    #[test]
    fn load_reads_file_and_names_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sql_metrics.sql");
        std::fs::write(&path, "select '__database__'").unwrap();
        let template = SqlTemplate::load(&path).unwrap();
        assert_eq!(template.display_name(), "sql_metrics.sql");
        assert_eq!(template.render("DB", "p"), "select 'DB'");
    }
}
