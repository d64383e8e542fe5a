//! Template collaborator and auto-templating

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::{Error, Result};

static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("variable pattern is valid")
});

/// Renders template source into final contents.
pub trait Templates {
    /// `name` identifies the template in error messages.
    fn render(&self, name: &str, source: &str) -> Result<String>;
}

/// Substitutes `{{ .key }}` placeholders from a string map.
#[derive(Debug, Clone, Default)]
pub struct DataTemplates {
    data: BTreeMap<String, String>,
}

impl DataTemplates {
    pub fn new(data: BTreeMap<String, String>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &BTreeMap<String, String> {
        &self.data
    }
}

impl Templates for DataTemplates {
    fn render(&self, name: &str, source: &str) -> Result<String> {
        let mut output = String::with_capacity(source.len());
        let mut last = 0;
        for captures in VARIABLE.captures_iter(source) {
            let (Some(whole), Some(key)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let value = self.data.get(key.as_str()).ok_or_else(|| Error::Template {
                name: name.to_string(),
                message: format!("undefined variable {}", key.as_str()),
            })?;
            output.push_str(&source[last..whole.start()]);
            output.push_str(value);
            last = whole.end();
        }
        output.push_str(&source[last..]);
        Ok(output)
    }
}

/// Replace occurrences of data values with `{{ .key }}` placeholders.
///
/// All values are matched in a single left-to-right pass, so an emitted
/// placeholder is never rewritten again. At any position the longest value
/// wins. Empty values are ignored.
pub fn auto_template(contents: &str, data: &BTreeMap<String, String>) -> String {
    let mut pairs: Vec<(&String, &String)> =
        data.iter().filter(|(_, value)| !value.is_empty()).collect();
    if pairs.is_empty() {
        return contents.to_string();
    }
    pairs.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));

    // Alternation is leftmost-first, so listing longer values first
    // selects the longest match at each position.
    let alternation = pairs
        .iter()
        .map(|(_, value)| regex::escape(value))
        .collect::<Vec<_>>()
        .join("|");
    let Ok(pattern) = Regex::new(&alternation) else {
        return contents.to_string();
    };
    let keys: BTreeMap<&str, &str> = pairs
        .iter()
        .rev()
        .map(|(key, value)| (value.as_str(), key.as_str()))
        .collect();

    pattern
        .replace_all(contents, |captures: &regex::Captures<'_>| {
            let matched = &captures[0];
            match keys.get(matched) {
                Some(key) => format!("{{{{ .{key} }}}}"),
                None => matched.to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn data() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("email".to_string(), "me@example.com".to_string()),
            ("host".to_string(), "example.com".to_string()),
        ])
    }

    #[test]
    fn render_substitutes_variables() {
        let templates = DataTemplates::new(data());
        let out = templates
            .render("gitconfig", "email = {{ .email }}\nhost={{.host}}\n")
            .unwrap();
        assert_eq!(out, "email = me@example.com\nhost=example.com\n");
    }

    #[test]
    fn render_fails_on_undefined_variable() {
        let templates = DataTemplates::default();
        let err = templates.render("t", "{{ .missing }}").unwrap_err();
        assert!(err.to_string().contains("undefined variable missing"), "got {err}");
    }

    #[test]
    fn auto_template_prefers_longest_value() {
        let out = auto_template("user me@example.com at example.com", &data());
        assert_eq!(out, "user {{ .email }} at {{ .host }}");
    }

    #[test]
    fn auto_template_output_renders_back() {
        let original = "mail me@example.com";
        let templated = auto_template(original, &data());
        let rendered = DataTemplates::new(data()).render("x", &templated).unwrap();
        assert_eq!(rendered, original);
    }

    #[test]
    fn auto_template_never_rewrites_inserted_placeholders() {
        let data = BTreeMap::from([
            ("email".to_string(), "alice@example.com".to_string()),
            ("domain".to_string(), "mail".to_string()),
        ]);
        let original = "email = alice@example.com\n";

        let templated = auto_template(original, &data);
        assert_eq!(templated, "email = {{ .email }}\n");

        let rendered = DataTemplates::new(data).render("x", &templated).unwrap();
        assert_eq!(rendered, original);
    }

    #[test]
    fn auto_template_without_data_is_identity() {
        let out = auto_template("plain {text}\n", &BTreeMap::new());
        assert_eq!(out, "plain {text}\n");
    }
}
