//! Balancing specification resolution
//!
//! A specification is either a strategy name (any case-insensitive prefix of
//! at least three characters) or an explicit `level=count` list. The two are
//! told apart by the presence of `=`.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use super::errors::{BalanceError, BalanceResult};
use super::level::{DesiredSizeMapping, FrequencyMapping, Level};

/// Minimum prefix length; `uniform` and `undersample` share `un`
pub const MIN_STRATEGY_PREFIX: usize = 3;

const ASSIGNMENT: char = '=';
const SEPARATOR: char = ',';
const QUOTE: char = '\'';

/// Named global balancing intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyToken {
    Uniform,
    Undersample,
    Oversample,
}

impl StrategyToken {
    pub const ALL: [StrategyToken; 3] = [
        StrategyToken::Uniform,
        StrategyToken::Undersample,
        StrategyToken::Oversample,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyToken::Uniform => "uniform",
            StrategyToken::Undersample => "undersample",
            StrategyToken::Oversample => "oversample",
        }
    }

    /// Whether the strategy fixes the output size on its own
    pub fn determines_size(&self) -> bool {
        matches!(self, StrategyToken::Undersample | StrategyToken::Oversample)
    }
}

impl fmt::Display for StrategyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The resolved balancing input: one mode per invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalancingSpec {
    Strategy(StrategyToken),
    Explicit(DesiredSizeMapping),
}

impl BalancingSpec {
    pub fn strategy(&self) -> Option<StrategyToken> {
        match self {
            BalancingSpec::Strategy(token) => Some(*token),
            BalancingSpec::Explicit(_) => None,
        }
    }
}

/// Returns true if the raw specification is an explicit size list
pub fn is_size_list(raw: &str) -> bool {
    raw.contains(ASSIGNMENT)
}

/// Resolves a raw specification against the observed levels.
pub fn resolve(
    raw: &str,
    output_size: Option<u64>,
    actual: &FrequencyMapping,
) -> BalanceResult<BalancingSpec> {
    if is_size_list(raw) {
        let desired = resolve_sizes(raw, actual)?;
        return Ok(BalancingSpec::Explicit(desired));
    }
    resolve_token(raw, output_size).map(BalancingSpec::Strategy)
}

/// Resolves a strategy prefix. Empty input means uniform.
pub fn resolve_token(raw: &str, output_size: Option<u64>) -> BalanceResult<StrategyToken> {
    let spec = raw.trim();
    if spec.is_empty() {
        return Ok(StrategyToken::Uniform);
    }
    if spec.chars().count() < MIN_STRATEGY_PREFIX {
        return Err(BalanceError::spec_too_short(spec));
    }

    let lowered = spec.to_lowercase();
    let mut matches = StrategyToken::ALL
        .iter()
        .filter(|token| token.as_str().starts_with(&lowered));

    let token = match (matches.next(), matches.next()) {
        (Some(token), None) => *token,
        _ => return Err(BalanceError::spec_unknown(spec)),
    };

    if token.determines_size() && output_size.is_some() {
        return Err(BalanceError::size_conflict(token.as_str()));
    }
    Ok(token)
}

/// Parses an explicit size list and checks it against the observed levels
pub fn resolve_sizes(raw: &str, actual: &FrequencyMapping) -> BalanceResult<DesiredSizeMapping> {
    let mut desired = DesiredSizeMapping::new();
    for (level, count) in parse_size_list(raw)? {
        if count <= 0 {
            return Err(BalanceError::non_positive_size("class_size", count));
        }
        if !actual.contains(&level) {
            return Err(BalanceError::unknown_level(&level));
        }
        if desired.insert(level.clone(), count as u64).is_some() {
            return Err(BalanceError::duplicate_level(&level));
        }
    }
    Ok(desired)
}

/// Tokenizes `level=count[, level=count]*`.
///
/// Levels may be single-quoted; a bare `NULL` names the null level.
/// Counts are returned unvalidated apart from integer coercion.
pub fn parse_size_list(raw: &str) -> BalanceResult<Vec<(Level, i64)>> {
    let mut chars = raw.chars().peekable();
    let mut entries = Vec::new();

    loop {
        skip_whitespace(&mut chars);
        let level = parse_level(&mut chars)?;
        let value = read_until_separator(&mut chars);
        let value = value.trim();
        let count = value
            .parse::<i64>()
            .map_err(|_| BalanceError::not_an_integer(value))?;
        entries.push((level, count));

        match chars.next() {
            Some(SEPARATOR) => continue,
            None => break,
            Some(c) => {
                return Err(BalanceError::malformed_spec(format!(
                    "Unexpected character '{}' in class size list",
                    c
                )))
            }
        }
    }

    Ok(entries)
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

/// Reads a level name and consumes the following `=`
fn parse_level(chars: &mut Peekable<Chars<'_>>) -> BalanceResult<Level> {
    let level = if chars.peek() == Some(&QUOTE) {
        chars.next();
        let name = read_quoted(chars)?;
        skip_whitespace(chars);
        Level::Value(name)
    } else {
        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c == ASSIGNMENT || c == SEPARATOR {
                break;
            }
            name.push(c);
            chars.next();
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(BalanceError::malformed_spec(
                "Class size entry is missing a level name",
            ));
        }
        if name.eq_ignore_ascii_case("null") {
            Level::Null
        } else {
            Level::Value(name.to_string())
        }
    };

    match chars.next() {
        Some(ASSIGNMENT) => Ok(level),
        _ => Err(BalanceError::malformed_spec(format!(
            "Expected '=' after level '{}'",
            level
        ))),
    }
}

fn read_quoted(chars: &mut Peekable<Chars<'_>>) -> BalanceResult<String> {
    let mut name = String::new();
    loop {
        match chars.next() {
            Some(QUOTE) if chars.peek() == Some(&QUOTE) => {
                chars.next();
                name.push(QUOTE);
            }
            Some(QUOTE) => return Ok(name),
            Some(c) => name.push(c),
            None => {
                return Err(BalanceError::malformed_spec(
                    "Unterminated quoted level in class size list",
                ))
            }
        }
    }
}

fn read_until_separator(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut value = String::new();
    while let Some(&c) = chars.peek() {
        if c == SEPARATOR {
            break;
        }
        value.push(c);
        chars.next();
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::errors::BalanceErrorCode;

    fn observed() -> FrequencyMapping {
        FrequencyMapping::new([
            (Level::value("a"), 20),
            (Level::value("b"), 30),
            (Level::value("c"), 25),
        ])
    }

    #[test]
    fn test_empty_spec_is_uniform() {
        assert_eq!(resolve_token("", None).unwrap(), StrategyToken::Uniform);
        assert_eq!(resolve_token("   ", Some(10)).unwrap(), StrategyToken::Uniform);
    }

    #[test]
    fn test_prefixes_resolve_case_insensitively() {
        assert_eq!(resolve_token("UNI", None).unwrap(), StrategyToken::Uniform);
        assert_eq!(resolve_token("und", None).unwrap(), StrategyToken::Undersample);
        assert_eq!(resolve_token("OverSam", None).unwrap(), StrategyToken::Oversample);
        assert_eq!(
            resolve_token("undersample", None).unwrap(),
            StrategyToken::Undersample
        );
    }

    #[test]
    fn test_short_prefix_rejected_even_if_unambiguous() {
        let err = resolve_token("ov", None).unwrap_err();
        assert_eq!(err.code(), BalanceErrorCode::StratSpecTooShort);
        let err = resolve_token("un", None).unwrap_err();
        assert_eq!(err.code(), BalanceErrorCode::StratSpecTooShort);
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let err = resolve_token("random", None).unwrap_err();
        assert_eq!(err.code(), BalanceErrorCode::StratSpecUnknown);
        let err = resolve_token("uniformly", None).unwrap_err();
        assert_eq!(err.code(), BalanceErrorCode::StratSpecUnknown);
    }

    #[test]
    fn test_size_determining_strategy_conflicts_with_output_size() {
        let err = resolve_token("oversample", Some(100)).unwrap_err();
        assert_eq!(err.code(), BalanceErrorCode::StratSizeConflict);
        let err = resolve_token("under", Some(100)).unwrap_err();
        assert_eq!(err.code(), BalanceErrorCode::StratSizeConflict);
        assert_eq!(
            resolve_token("uniform", Some(100)).unwrap(),
            StrategyToken::Uniform
        );
    }

    #[test]
    fn test_size_list_bypasses_token_resolution() {
        let spec = resolve("a=25, b = 25", Some(60), &observed()).unwrap();
        let BalancingSpec::Explicit(desired) = spec else {
            panic!("expected explicit sizes");
        };
        assert_eq!(desired.get(&Level::value("a")), Some(&25));
        assert_eq!(desired.get(&Level::value("b")), Some(&25));
        assert_eq!(desired.len(), 2);
    }

    #[test]
    fn test_size_list_quoted_and_null_levels() {
        let parsed = parse_size_list("'x, y'=3, 'it''s'=4, null=5, 'NULL'=6").unwrap();
        assert_eq!(
            parsed,
            vec![
                (Level::value("x, y"), 3),
                (Level::value("it's"), 4),
                (Level::Null, 5),
                (Level::value("NULL"), 6),
            ]
        );
    }

    #[test]
    fn test_size_list_unknown_level_rejected() {
        let err = resolve("a=10, z=3", None, &observed()).unwrap_err();
        assert_eq!(err.code(), BalanceErrorCode::StratUnknownLevel);
        assert!(err.message().contains('z'));
    }

    #[test]
    fn test_size_list_non_positive_rejected() {
        let err = resolve("a=0", None, &observed()).unwrap_err();
        assert_eq!(err.code(), BalanceErrorCode::StratNonPositiveSize);
        let err = resolve("a=-4", None, &observed()).unwrap_err();
        assert_eq!(err.code(), BalanceErrorCode::StratNonPositiveSize);
    }

    #[test]
    fn test_size_list_non_integer_is_type_error() {
        let err = resolve("a=2.5", None, &observed()).unwrap_err();
        assert_eq!(err.code(), BalanceErrorCode::StratNotAnInteger);
        let err = resolve("a=", None, &observed()).unwrap_err();
        assert_eq!(err.code(), BalanceErrorCode::StratNotAnInteger);
    }

    #[test]
    fn test_size_list_duplicates_rejected() {
        let err = resolve("a=1, a=2", None, &observed()).unwrap_err();
        assert_eq!(err.code(), BalanceErrorCode::StratDuplicateLevel);
    }

    #[test]
    fn test_size_list_malformed() {
        let err = parse_size_list("=3").unwrap_err();
        assert_eq!(err.code(), BalanceErrorCode::StratMalformedSpec);
        let err = parse_size_list("'a=3").unwrap_err();
        assert_eq!(err.code(), BalanceErrorCode::StratMalformedSpec);
        let err = parse_size_list("a=3,").unwrap_err();
        assert_eq!(err.code(), BalanceErrorCode::StratMalformedSpec);
    }

    #[test]
    fn test_null_level_requires_observed_nulls() {
        let err = resolve("NULL=3", None, &observed()).unwrap_err();
        assert_eq!(err.code(), BalanceErrorCode::StratUnknownLevel);

        let with_nulls = FrequencyMapping::new([(Level::value("a"), 4), (Level::Null, 2)]);
        let spec = resolve("NULL=3", None, &with_nulls).unwrap();
        assert_eq!(
            spec,
            BalancingSpec::Explicit([(Level::Null, 3)].into_iter().collect())
        );
    }
}
