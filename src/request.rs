//! Insert Request
//!
//! The single transient entity of a run: an id and two secrets taken from the
//! positional command-line arguments.
//!
//! # Rules
//! - Exactly three arguments, otherwise [`ParsedArgs::Usage`] (no database work happens)
//! - The id must parse as a signed 32-bit integer
//! - Each secret holds at most [`SECRET_MAX_CHARS`] UTF-16 code units, the unit
//!   `nvarchar(n)` is sized in; longer values are rejected here instead of being
//!   left to the driver's truncation behavior

use serde::Serialize;

use crate::error::{AeDemoError, Result};

/// Message printed when the argument count is wrong
pub const USAGE_MESSAGE: &str = "Please enter a numeric and two string arguments.";

/// Number of positional arguments the command expects
pub const EXPECTED_ARGS: usize = 3;

/// Declared size of the `SecretDeterministic` and `SecretRandomized` columns,
/// in UTF-16 code units
pub const SECRET_MAX_CHARS: usize = 10;

/// One row to insert into the encrypted table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertRequest {
    /// Row id (`id` column)
    pub id: i32,

    /// Value for the deterministically encrypted column
    pub secret_deterministic: String,

    /// Value for the randomized encrypted column
    pub secret_randomized: String,
}

/// Result of inspecting the positional arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedArgs {
    /// Wrong argument count
    Usage,
    /// Arguments form a valid request
    Request(InsertRequest),
}

impl InsertRequest {
    /// Build a request from already-separated values, enforcing the column size
    pub fn new(
        id: i32,
        secret_deterministic: impl Into<String>,
        secret_randomized: impl Into<String>,
    ) -> Result<Self> {
        let secret_deterministic = secret_deterministic.into();
        let secret_randomized = secret_randomized.into();

        check_secret_len("SecretDeterministic", &secret_deterministic)?;
        check_secret_len("SecretRandomized", &secret_randomized)?;

        Ok(Self { id, secret_deterministic, secret_randomized })
    }

    /// Parse the positional arguments (program name already stripped)
    ///
    /// The argument count is checked first so a short invocation never reaches
    /// the id parser.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<ParsedArgs> {
        let [id, deterministic, randomized] = args else {
            return Ok(ParsedArgs::Usage);
        };

        let deterministic: &str = deterministic.as_ref();
        let randomized: &str = randomized.as_ref();

        let id = parse_id(id.as_ref())?;
        let request = Self::new(id, deterministic, randomized)?;

        Ok(ParsedArgs::Request(request))
    }
}

/// Parse the id argument as a signed 32-bit integer
///
/// Surrounding whitespace is tolerated; anything else that `i32::from_str`
/// refuses is an error.
pub fn parse_id(raw: &str) -> Result<i32> {
    raw.trim().parse::<i32>().map_err(|e| {
        AeDemoError::invalid_input(format!("id '{raw}' is not a 32-bit integer: {e}"))
    })
}

fn check_secret_len(column: &str, value: &str) -> Result<()> {
    // Characters outside the BMP take two units, the same as on the wire
    let len = value.encode_utf16().count();
    if len > SECRET_MAX_CHARS {
        return Err(AeDemoError::invalid_input(format!(
            "{column} accepts at most {SECRET_MAX_CHARS} UTF-16 code units, got {len}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_three_args_build_request() {
        let parsed = InsertRequest::from_args(&["7", "abc", "xyz"]).unwrap();
        assert_eq!(
            parsed,
            ParsedArgs::Request(InsertRequest {
                id: 7,
                secret_deterministic: "abc".to_string(),
                secret_randomized: "xyz".to_string(),
            })
        );
    }

    #[test]
    fn test_wrong_count_is_usage() {
        let empty: [&str; 0] = [];
        assert_eq!(InsertRequest::from_args(&empty).unwrap(), ParsedArgs::Usage);
        assert_eq!(InsertRequest::from_args(&["7", "abc"]).unwrap(), ParsedArgs::Usage);
        assert_eq!(InsertRequest::from_args(&["7", "a", "b", "c"]).unwrap(), ParsedArgs::Usage);
    }

    #[test]
    fn test_wrong_count_wins_over_bad_id() {
        // A short invocation never reaches the id parser
        assert_eq!(InsertRequest::from_args(&["seven", "abc"]).unwrap(), ParsedArgs::Usage);
    }

    #[test]
    fn test_non_numeric_id_rejected() {
        let err = InsertRequest::from_args(&["seven", "abc", "xyz"]).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(err.message().contains("seven"));
    }

    #[test]
    fn test_id_range() {
        assert_eq!(parse_id("-2147483648").unwrap(), i32::MIN);
        assert_eq!(parse_id("2147483647").unwrap(), i32::MAX);
        assert_eq!(parse_id(" 42 ").unwrap(), 42);
        assert!(parse_id("2147483648").is_err());
        assert!(parse_id("1.5").is_err());
        assert!(parse_id("").is_err());
    }

    #[test]
    fn test_secret_length_boundary() {
        assert!(InsertRequest::new(1, "0123456789", "").is_ok());

        let err = InsertRequest::new(1, "0123456789A", "ok").unwrap_err();
        assert!(err.message().contains("SecretDeterministic"));
        assert!(err.message().contains("got 11"));

        let err = InsertRequest::new(1, "ok", "01234567890").unwrap_err();
        assert!(err.message().contains("SecretRandomized"));
    }

    #[test]
    fn test_secret_length_counts_utf16_units() {
        // Ten multi-byte BMP characters still fit an nvarchar(10) column
        let wide = "ÄÖÜäöüßéèê";
        assert_eq!(wide.encode_utf16().count(), 10);
        assert!(wide.len() > 10);
        assert!(InsertRequest::new(1, wide, wide).is_ok());
    }

    #[test]
    fn test_secret_length_counts_surrogate_pairs() {
        // Six emoji are six chars but twelve UTF-16 code units
        let emoji = "😀😀😀😀😀😀";
        assert_eq!(emoji.chars().count(), 6);
        assert_eq!(emoji.encode_utf16().count(), 12);

        let err = InsertRequest::new(1, emoji, "ok").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(err.message().contains("got 12"));

        // Five emoji fill the column exactly
        assert!(InsertRequest::new(1, "ok", "😀😀😀😀😀").is_ok());
    }
}
