//! Route pattern parsing and matching
//!
//! A route pattern has the form `"METHOD /path"`. Inside the path:
//!
//! - `:name` matches one or more characters other than `/`
//! - `*` matches any sequence of characters, `/` included
//! - everything else is literal and matched byte-for-byte
//!
//! Patterns are parsed once into a token list and matched structurally, so a
//! literal `.` or `(` in a pattern never acts as a metacharacter.

use std::{fmt, str::FromStr};

use tracing::debug;

use crate::error::{Error, Result};

/// A single element of a parsed route path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternToken {
    /// Text that must appear verbatim
    Literal(String),
    /// `:name` placeholder, one or more non-`/` characters
    Param(String),
    /// `*`, any run of characters including `/`
    Wildcard,
}

/// A parsed `"METHOD /path"` route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    method: String,
    path: String,
    tokens: Vec<PatternToken>,
}

/// Strip exactly one trailing `/`, never reducing the root path
pub fn normalize_path(path: &str) -> &str {
    if path.len() > 1 && path.ends_with('/') {
        &path[..path.len() - 1]
    } else {
        path
    }
}

/// Check whether `pattern` matches a request.
///
/// Malformed patterns (no space between method and path) never match.
pub fn match_route(pattern: &str, method: &str, path: &str) -> bool {
    match RoutePattern::parse(pattern) {
        Ok(pattern) => pattern.matches(method, path),
        Err(err) => {
            debug!(error = %err, "ignoring malformed route pattern");
            false
        }
    }
}

impl RoutePattern {
    /// Parse a `"METHOD /path"` pattern, splitting on the first space
    pub fn parse(pattern: &str) -> Result<Self> {
        let (method, path) = pattern
            .split_once(' ')
            .ok_or_else(|| Error::InvalidRoutePattern {
                pattern: pattern.to_string(),
                reason: "expected \"METHOD /path\"".to_string(),
            })?;

        if method.is_empty() {
            return Err(Error::InvalidRoutePattern {
                pattern: pattern.to_string(),
                reason: "missing HTTP method".to_string(),
            });
        }

        let path = normalize_path(path);
        Ok(Self {
            source: pattern.to_string(),
            method: method.to_string(),
            path: path.to_string(),
            tokens: tokenize(path),
        })
    }

    /// HTTP method, compared case-sensitively
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Normalized path template
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Parsed path tokens
    pub fn tokens(&self) -> &[PatternToken] {
        &self.tokens
    }

    /// True when the pattern contains no placeholders or wildcards
    pub fn is_literal(&self) -> bool {
        self.tokens
            .iter()
            .all(|token| matches!(token, PatternToken::Literal(_)))
    }

    /// Match a request method and raw request path
    pub fn matches(&self, method: &str, path: &str) -> bool {
        self.method == method && match_tokens(&self.tokens, normalize_path(path).as_bytes())
    }
}

impl FromStr for RoutePattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn tokenize(path: &str) -> Vec<PatternToken> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = path;

    while let Some(ch) = rest.chars().next() {
        match ch {
            ':' => {
                // The name runs to the next `/`; a bare `:` stays literal
                let name_len = rest[1..].find('/').unwrap_or(rest.len() - 1);
                if name_len == 0 {
                    literal.push(':');
                    rest = &rest[1..];
                    continue;
                }
                flush_literal(&mut literal, &mut tokens);
                tokens.push(PatternToken::Param(rest[1..=name_len].to_string()));
                rest = &rest[1 + name_len..];
            }
            '*' => {
                flush_literal(&mut literal, &mut tokens);
                if tokens.last() != Some(&PatternToken::Wildcard) {
                    tokens.push(PatternToken::Wildcard);
                }
                rest = &rest[1..];
            }
            _ => {
                literal.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }

    flush_literal(&mut literal, &mut tokens);
    tokens
}

fn flush_literal(literal: &mut String, tokens: &mut Vec<PatternToken>) {
    if !literal.is_empty() {
        tokens.push(PatternToken::Literal(std::mem::take(literal)));
    }
}

fn match_tokens(tokens: &[PatternToken], path: &[u8]) -> bool {
    match tokens.split_first() {
        None => path.is_empty(),
        Some((PatternToken::Literal(literal), rest)) => path
            .strip_prefix(literal.as_bytes())
            .is_some_and(|tail| match_tokens(rest, tail)),
        Some((PatternToken::Param(_), rest)) => {
            let run = path.iter().take_while(|&&b| b != b'/').count();
            (1..=run).rev().any(|len| match_tokens(rest, &path[len..]))
        }
        Some((PatternToken::Wildcard, rest)) => {
            rest.is_empty() || (0..=path.len()).any(|skip| match_tokens(rest, &path[skip..]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_matches_single_segment() {
        let pattern = "GET /api/v1/products/:id";
        assert!(match_route(pattern, "GET", "/api/v1/products/123"));
        assert!(!match_route(pattern, "POST", "/api/v1/products/123"));
        assert!(!match_route(pattern, "GET", "/api/v1/products/123/images"));
        assert!(!match_route(pattern, "GET", "/api/v1/products/"));
        assert!(!match_route(pattern, "GET", "/api/v1/products"));
    }

    #[test]
    fn test_method_is_case_sensitive() {
        assert!(!match_route("GET /a", "get", "/a"));
        assert!(!match_route("get /a", "GET", "/a"));
    }

    #[test]
    fn test_trailing_slash_ignored_on_both_sides() {
        assert!(match_route("GET /a/b", "GET", "/a/b/"));
        assert!(match_route("GET /a/b", "GET", "/a/b"));
        assert!(match_route("GET /a/b/", "GET", "/a/b"));
        // Only one slash is stripped
        assert!(!match_route("GET /a/b", "GET", "/a/b//"));
    }

    #[test]
    fn test_root_path() {
        assert!(match_route("GET /", "GET", "/"));
        assert!(!match_route("GET /", "GET", "/x"));
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/x/"), "/x");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn test_wildcard_crosses_segments() {
        assert!(match_route("GET /admin/*", "GET", "/admin/anything/nested"));
        assert!(match_route("GET /admin/*", "GET", "/admin/x"));
        // `/admin/` normalizes to `/admin`, which lacks the literal `/admin/` prefix
        assert!(!match_route("GET /admin/*", "GET", "/admin/"));
        assert!(!match_route("GET /admin/*", "GET", "/other/admin"));
        assert!(match_route("GET /files/*.png", "GET", "/files/a/b.png"));
        assert!(!match_route("GET /files/*.png", "GET", "/files/a/b.jpg"));
    }

    #[test]
    fn test_literal_pattern_is_exact() {
        assert!(match_route("DELETE /api/v1/categories", "DELETE", "/api/v1/categories"));
        assert!(!match_route("DELETE /api/v1/categories", "DELETE", "/api/v1/categories/1"));
        assert!(!match_route("DELETE /api/v1/categories", "DELETE", "/api/v1/Categories"));
        assert!(!match_route("DELETE /api/v1/categories", "DELETE", "/x/api/v1/categories"));
    }

    #[test]
    fn test_literal_metacharacters_are_not_special() {
        assert!(match_route("GET /v1.0/items", "GET", "/v1.0/items"));
        assert!(!match_route("GET /v1.0/items", "GET", "/v1x0/items"));
        assert!(match_route("GET /a+(b)", "GET", "/a+(b)"));
    }

    #[test]
    fn test_malformed_pattern_never_matches() {
        assert!(!match_route("GET", "GET", "/"));
        assert!(!match_route("", "GET", ""));
        assert!(!match_route(" /a", "", "/a"));
        assert!(RoutePattern::parse("GET").is_err());
        assert!(RoutePattern::parse(" /a").is_err());
    }

    #[test]
    fn test_tokenize() {
        let pattern = RoutePattern::parse("PUT /api/v1/products/:productId/variants/:id").unwrap();
        assert_eq!(
            pattern.tokens(),
            &[
                PatternToken::Literal("/api/v1/products/".to_string()),
                PatternToken::Param("productId".to_string()),
                PatternToken::Literal("/variants/".to_string()),
                PatternToken::Param("id".to_string()),
            ]
        );
        assert!(!pattern.is_literal());
        assert!(RoutePattern::parse("POST /api/v1/products").unwrap().is_literal());
    }

    #[test]
    fn test_bare_colon_is_literal() {
        let pattern = RoutePattern::parse("GET /a/:/b").unwrap();
        assert!(pattern.is_literal());
        assert!(pattern.matches("GET", "/a/:/b"));
    }

    #[test]
    fn test_param_matches_its_own_template() {
        // Middleware may pass the matched route template instead of the raw path
        assert!(match_route("PATCH /api/v1/users/:id", "PATCH", "/api/v1/users/:id"));
    }

    #[test]
    fn test_display_and_from_str() {
        let pattern: RoutePattern = "GET /api/v1/users/".parse().unwrap();
        assert_eq!(pattern.to_string(), "GET /api/v1/users/");
        assert_eq!(pattern.path(), "/api/v1/users");
        assert_eq!(pattern.method(), "GET");
    }
}
