//! Client-side parameter binding.
//!
//! Statements use `%s` placeholders; `%%` stands for a literal `%` once
//! parameters are bound. Values are inlined as quoted string literals.

use crate::error::{DatabaseError, DbResult};
use once_cell::sync::Lazy;
use regex::Regex;

static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%[s%]").expect("Invalid regex: placeholder pattern"));

/// Quotes a value as a SQL string literal, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Renders a comma-separated list of quoted literals.
pub fn quote_list<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(|v| quote_literal(v.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Substitutes `params` into the `%s` placeholders of `sql`.
///
/// With no parameters the text is returned untouched, so `%` in `LIKE`
/// patterns needs no escaping for parameterless statements.
pub fn bind_parameters(sql: &str, params: &[String]) -> DbResult<String> {
    if params.is_empty() {
        return Ok(sql.to_string());
    }

    let placeholders = PLACEHOLDER_REGEX
        .find_iter(sql)
        .filter(|m| m.as_str() == "%s")
        .count();
    if placeholders != params.len() {
        return Err(DatabaseError::QueryFailed(format!(
            "Statement has {} placeholders but {} parameters were supplied",
            placeholders,
            params.len()
        )));
    }

    let mut values = params.iter();
    let bound = PLACEHOLDER_REGEX.replace_all(sql, |caps: &regex::Captures<'_>| {
        if &caps[0] == "%%" {
            "%".to_string()
        } else {
            values.next().map(|v| quote_literal(v)).unwrap_or_default()
        }
    });
    Ok(bound.into_owned())
}
