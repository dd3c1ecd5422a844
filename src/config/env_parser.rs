//! Environment variable parsing utilities for configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::paths;
use crate::errors::Error;

/// Reject empty and whitespace-only values.
fn non_empty<'a>(name: &str, value: &'a str) -> Result<&'a str, Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Config(format!("{name} cannot be empty")));
    }
    Ok(trimmed)
}

pub fn parse_env_string(name: &str, value: &str) -> Result<String, Error> {
    non_empty(name, value).map(str::to_string)
}

/// Parse a path, expanding tilde.
pub fn parse_env_path(name: &str, value: &str) -> Result<PathBuf, Error> {
    non_empty(name, value).map(|v| paths::expand_tilde_path(Path::new(v)))
}

/// Parse any `FromStr` value (numbers, backend names). Range checks happen in validation.
pub fn parse_env_value<T>(name: &str, value: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    non_empty(name, value)?
        .parse()
        .map_err(|e| Error::Config(format!("Invalid {name} value: {e}")))
}

/// Overwrite `target` with the parsed value of `name`, if the variable is set.
pub fn apply_override<T>(
    name: &str,
    target: &mut T,
    parse: fn(&str, &str) -> Result<T, Error>,
) -> Result<(), Error> {
    if let Ok(value) = std::env::var(name) {
        *target = parse(name, &value)?;
        tracing::debug!(variable = name, "config overridden from environment");
    }
    Ok(())
}
