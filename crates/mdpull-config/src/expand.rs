//! `${VAR}` expansion for configuration strings.
//!
//! - `${VAR}` is replaced by the value of `VAR`; an unset variable is an error
//! - `${VAR:-fallback}` uses `fallback` when `VAR` is unset
//!
//! Values without `${` are returned as-is, so a literal `$` in a token or
//! user agent needs no escaping.

use crate::ConfigError;

/// Variable that could not be resolved.
struct Unset(String);

/// Expand `${VAR}` references in `value`.
///
/// `field` names the config key in error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |name| match std::env::var(name) {
        Ok(found) => Ok(Some(found)),
        Err(_) => Err(Unset(name.to_owned())),
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Expand an optional value, keeping `None` as `None`.
pub(crate) fn expand_env_opt(
    value: Option<&str>,
    field: &str,
) -> Result<Option<String>, ConfigError> {
    value.map(|v| expand_env(v, field)).transpose()
}
