//! Bulk environment-variable import from pasted text or an uploaded `.env` file.

use anyhow::anyhow;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{LibError, Result};
use crate::models::Variable;

static ASSIGNMENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^=]+)=(.*)$").expect("assignment pattern should compile"));

static ENV_FILENAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\.?env(\.|$)").expect("env filename pattern should compile"));

/// Parses `KEY=value` lines. Comments (`#`, `//`) and blank lines are skipped; a line
/// without an assignment becomes a key with an empty value.
pub fn parse(text: &str) -> Vec<Variable> {
    text.lines()
        .flat_map(|line| line.split('\r'))
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("//"))
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Variable {
    match ASSIGNMENT_PATTERN.captures(line) {
        Some(captures) => {
            let key = captures.get(1).map_or("", |m| m.as_str()).trim();
            let value = captures.get(2).map_or("", |m| m.as_str()).trim();
            Variable::new(key, strip_wrapping_quotes(value))
        }
        None => Variable::new(line, ""),
    }
}

fn strip_wrapping_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

pub fn validate_env_filename(filename: &str) -> Result<()> {
    if ENV_FILENAME_PATTERN.is_match(filename) || filename.starts_with(".env") {
        return Ok(());
    }
    Err(LibError::import(
        "Please upload a valid .env file",
        anyhow!("file {:?} does not look like an env file", filename),
    ))
}

/// Paste mode: the field at `index` is replaced by the parsed rows, in order.
pub fn apply_paste(existing: &[Variable], index: usize, parsed: Vec<Variable>) -> Vec<Variable> {
    let index = index.min(existing.len());
    let mut output = Vec::with_capacity(existing.len() + parsed.len());
    output.extend_from_slice(&existing[..index]);
    output.extend(parsed);
    if index < existing.len() {
        output.extend_from_slice(&existing[index + 1..]);
    }
    output
}

/// File mode: parsed rows are appended after dropping one trailing blank row.
pub fn apply_file(existing: &[Variable], parsed: Vec<Variable>) -> Vec<Variable> {
    let keep = match existing.last() {
        Some(last) if last.is_blank() => existing.len() - 1,
        _ => existing.len(),
    };
    let mut output = Vec::with_capacity(keep + parsed.len());
    output.extend_from_slice(&existing[..keep]);
    output.extend(parsed);
    output
}

/// Validates the filename, then parses and appends the file contents.
pub fn import_file(existing: &[Variable], filename: &str, contents: &str) -> Result<Vec<Variable>> {
    validate_env_filename(filename)?;
    let parsed = parse(contents);
    tracing::debug!(filename, rows = parsed.len(), "imported env file");
    Ok(apply_file(existing, parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn parses_example_document() {
        let text = "# comment\nFOO=bar\nBAZ=\"qux\"\nEMPTYKEY\n";
        assert_eq!(
            parse(text),
            vec![
                Variable::new("FOO", "bar"),
                Variable::new("BAZ", "qux"),
                Variable::new("EMPTYKEY", ""),
            ]
        );
    }

    #[test]
    fn handles_crlf_and_slash_comments() {
        let text = "  // note\r\n A = 1 \r\n\r\nB=two=2\rC=";
        assert_eq!(
            parse(text),
            vec![
                Variable::new("A", "1"),
                Variable::new("B", "two=2"),
                Variable::new("C", ""),
            ]
        );
    }

    #[test]
    fn strips_only_fully_wrapping_quotes() {
        assert_eq!(parse("X=a\"b\"c"), vec![Variable::new("X", "a\"b\"c")]);
        assert_eq!(parse("X=\"\"\"\""), vec![Variable::new("X", "\"\"")]);
        assert_eq!(parse("X=\""), vec![Variable::new("X", "\"")]);
        assert_eq!(parse("X='single'"), vec![Variable::new("X", "'single'")]);
    }

    #[test]
    fn leading_equals_is_kept_as_key() {
        assert_eq!(parse("=orphan"), vec![Variable::new("=orphan", "")]);
    }

    #[test]
    fn validates_env_filenames() {
        for name in [".env", "env", ".env.local", "ENV.production", ".envrc", "env."] {
            assert!(validate_env_filename(name).is_ok(), "{name} should be accepted");
        }
        for name in ["config.env", "environment", "my.env", "vars.txt"] {
            let err = validate_env_filename(name).expect_err("should be rejected");
            assert_eq!(err.kind, ErrorKind::Import);
        }
    }

    #[test]
    fn paste_replaces_the_target_field_in_place() {
        let existing = vec![
            Variable::new("A", "1"),
            Variable::new("", ""),
            Variable::new("C", "3"),
        ];
        let merged = apply_paste(&existing, 1, parse("X=9\nY=8"));
        assert_eq!(
            merged,
            vec![
                Variable::new("A", "1"),
                Variable::new("X", "9"),
                Variable::new("Y", "8"),
                Variable::new("C", "3"),
            ]
        );
    }

    #[test]
    fn paste_past_the_end_appends() {
        let existing = vec![Variable::new("A", "1")];
        let merged = apply_paste(&existing, 5, vec![Variable::new("B", "2")]);
        assert_eq!(merged, vec![Variable::new("A", "1"), Variable::new("B", "2")]);
    }

    #[test]
    fn file_import_drops_one_trailing_blank_row() {
        let existing = vec![
            Variable::new("A", "1"),
            Variable::new("", ""),
            Variable::new("", ""),
        ];
        let merged = import_file(&existing, ".env", "B=2").expect("valid file");
        assert_eq!(
            merged,
            vec![
                Variable::new("A", "1"),
                Variable::new("", ""),
                Variable::new("B", "2"),
            ]
        );
    }

    #[test]
    fn file_import_with_bad_name_leaves_rows_alone() {
        let existing = vec![Variable::new("A", "1")];
        let err = import_file(&existing, "secrets.json", "B=2").expect_err("bad filename");
        assert_eq!(err.public, "Please upload a valid .env file");
        assert_eq!(existing, vec![Variable::new("A", "1")]);
    }
}
