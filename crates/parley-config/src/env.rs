use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Matches `{{ env.VAR }}` and `{{ env.VAR | default("fallback") }}`
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{\s*([a-zA-Z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#).expect("must be valid regex")
});

/// Failure to expand a config placeholder
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpandError {
    /// Variable is unset and no default was given
    #[error("environment variable not found: `{0}`")]
    Missing(String),
    /// Placeholder is not scoped with `env.`
    #[error("only variables scoped with 'env.' are supported: `{0}`")]
    UnsupportedScope(String),
}

/// Expand `{{ env.VAR }}` placeholders in raw config text
///
/// `{{ env.VAR | default("x") }}` falls back to `x` when `VAR` is unset.
/// Comment lines are left untouched so commented-out secrets need not exist.
pub fn expand_env(input: &str) -> Result<String, ExpandError> {
    let lines = input
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                Ok(line.to_owned())
            } else {
                expand_line(line)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut output = lines.join("\n");
    if input.ends_with('\n') {
        output.push('\n');
    }

    Ok(output)
}

fn expand_line(line: &str) -> Result<String, ExpandError> {
    let mut output = String::with_capacity(line.len());
    let mut last_end = 0;

    for captures in PLACEHOLDER.captures_iter(line) {
        let Some(whole) = captures.get(0) else {
            continue;
        };

        output.push_str(&line[last_end..whole.start()]);
        output.push_str(&resolve(&captures)?);
        last_end = whole.end();
    }

    output.push_str(&line[last_end..]);
    Ok(output)
}

fn resolve(captures: &Captures<'_>) -> Result<String, ExpandError> {
    let key = captures.get(1).map_or("", |m| m.as_str());
    let default = captures.get(2).map(|m| m.as_str());

    let Some(name) = key.strip_prefix("env.").filter(|name| !name.contains('.')) else {
        return Err(ExpandError::UnsupportedScope(key.to_owned()));
    };

    match (std::env::var(name), default) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(default)) => Ok(default.to_owned()),
        (Err(_), None) => Err(ExpandError::Missing(name.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let input = "[anthropic]\nmodel = \"claude-3-5-haiku-latest\"\n";
        assert_eq!(expand_env(input).unwrap(), input);
    }

    #[test]
    fn expands_api_key() {
        temp_env::with_var("PARLEY_TEST_KEY", Some("sk-ant-test"), || {
            let result = expand_env("api_key = \"{{ env.PARLEY_TEST_KEY }}\"").unwrap();
            assert_eq!(result, "api_key = \"sk-ant-test\"");
        });
    }

    #[test]
    fn expands_several_placeholders_on_one_line() {
        let vars = [("PARLEY_HOST", Some("localhost")), ("PARLEY_PORT", Some("8080"))];
        temp_env::with_vars(vars, || {
            let result = expand_env("base_url = \"http://{{ env.PARLEY_HOST }}:{{env.PARLEY_PORT}}/v1\"").unwrap();
            assert_eq!(result, "base_url = \"http://localhost:8080/v1\"");
        });
    }

    #[test]
    fn missing_variable_is_an_error() {
        temp_env::with_var_unset("PARLEY_MISSING", || {
            let err = expand_env("api_key = \"{{ env.PARLEY_MISSING }}\"").unwrap_err();
            assert_eq!(err, ExpandError::Missing("PARLEY_MISSING".to_owned()));
        });
    }

    #[test]
    fn default_applies_only_when_unset() {
        let input = "model = \"{{ env.PARLEY_MODEL | default(\"claude-3-5-haiku-latest\") }}\"";

        temp_env::with_var_unset("PARLEY_MODEL", || {
            assert_eq!(expand_env(input).unwrap(), "model = \"claude-3-5-haiku-latest\"");
        });
        temp_env::with_var("PARLEY_MODEL", Some("claude-sonnet-4-20250514"), || {
            assert_eq!(expand_env(input).unwrap(), "model = \"claude-sonnet-4-20250514\"");
        });
    }

    #[test]
    fn other_scopes_are_rejected() {
        let err = expand_env("api_key = \"{{ vault.KEY }}\"").unwrap_err();
        assert_eq!(err, ExpandError::UnsupportedScope("vault.KEY".to_owned()));

        let err = expand_env("api_key = \"{{ env.A.B }}\"").unwrap_err();
        assert_eq!(err, ExpandError::UnsupportedScope("env.A.B".to_owned()));
    }

    #[test]
    fn comments_are_not_expanded() {
        temp_env::with_var_unset("PARLEY_MISSING", || {
            let input = "  # api_key = \"{{ env.PARLEY_MISSING }}\"\nmodel = \"x\"";
            assert_eq!(expand_env(input).unwrap(), input);
        });
    }
}
