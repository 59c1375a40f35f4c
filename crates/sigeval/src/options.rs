use std::env;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const NAME_OVERFLOW_ENV: &str = "SIGEVAL_NAME_OVERFLOW";
pub const TRACE_SOURCE_ENV: &str = "SIGEVAL_TRACE_SOURCE";

/// What to do when more parameter names are supplied than the shape has inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameOverflow {
    /// Trailing names are never consulted.
    #[default]
    Ignore,
    /// Fail with [`Error::BindingCountMismatch`](crate::Error::BindingCountMismatch).
    Reject,
}

impl std::str::FromStr for NameOverflow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ignore" | "truncate" => Ok(NameOverflow::Ignore),
            "reject" | "error" => Ok(NameOverflow::Reject),
            other => Err(format!("unknown name overflow policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub name_overflow: NameOverflow,
    /// Emit the full source text of every dispatched request at `trace` level.
    pub trace_source: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            name_overflow: NameOverflow::Ignore,
            trace_source: false,
        }
    }
}

impl Options {
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Ok(policy) = env::var(NAME_OVERFLOW_ENV) {
            match policy.parse::<NameOverflow>() {
                Ok(policy) => options.name_overflow = policy,
                Err(e) => warn!(
                    "Invalid {} value: {}, using default {:?}",
                    NAME_OVERFLOW_ENV, e, options.name_overflow
                ),
            }
        }

        if let Ok(trace) = env::var(TRACE_SOURCE_ENV) {
            match trace.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => options.trace_source = true,
                "0" | "false" | "no" => options.trace_source = false,
                _ => warn!(
                    "Invalid {} value '{}', using default {}",
                    TRACE_SOURCE_ENV, trace, options.trace_source
                ),
            }
        }

        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_options() {
        let options = Options::default();
        assert_eq!(options.name_overflow, NameOverflow::Ignore);
        assert!(!options.trace_source);
    }

    #[rstest]
    #[case("ignore", Ok(NameOverflow::Ignore))]
    #[case("Truncate", Ok(NameOverflow::Ignore))]
    #[case(" reject ", Ok(NameOverflow::Reject))]
    #[case("error", Ok(NameOverflow::Reject))]
    #[case("panic", Err("unknown name overflow policy 'panic'".to_string()))]
    fn test_name_overflow_from_str(#[case] input: &str, #[case] expected: Result<NameOverflow, String>) {
        assert_eq!(input.parse::<NameOverflow>(), expected);
    }

    #[test]
    fn test_deserialize_partial() {
        let options: Options = serde_json::from_str(r#"{"name_overflow": "reject"}"#).unwrap();
        assert_eq!(options.name_overflow, NameOverflow::Reject);
        assert!(!options.trace_source);
    }

    #[test]
    fn test_options_from_env() {
        let original_policy = env::var(NAME_OVERFLOW_ENV).ok();
        let original_trace = env::var(TRACE_SOURCE_ENV).ok();

        unsafe {
            env::set_var(NAME_OVERFLOW_ENV, "reject");
            env::set_var(TRACE_SOURCE_ENV, "maybe");
        }

        let options = Options::from_env();
        assert_eq!(options.name_overflow, NameOverflow::Reject);
        assert!(!options.trace_source);

        unsafe {
            match original_policy {
                Some(val) => env::set_var(NAME_OVERFLOW_ENV, val),
                None => env::remove_var(NAME_OVERFLOW_ENV),
            }
            match original_trace {
                Some(val) => env::set_var(TRACE_SOURCE_ENV, val),
                None => env::remove_var(TRACE_SOURCE_ENV),
            }
        }
    }
}
