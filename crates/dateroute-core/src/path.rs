//! Compiled route path templates
//!
//! A template is a sequence of literal text and parameter placeholders:
//!
//! | Placeholder | Matches |
//! |-------------|---------|
//! | `{name}` | one or more characters other than `/` |
//! | `{name:int}` | one or more ASCII digits |
//! | `{name:path}` | any characters including `/`, possibly none |
//!
//! Matching is anchored at both ends and backtracks, so `{name}` followed by
//! a literal behaves like a greedy `[^/]+` capture.

use crate::path_params::PathParams;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Error raised when a path template cannot be compiled
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("route path must start with '/', got: \"{pattern}\"")]
    MissingLeadingSlash { pattern: String },

    #[error("unclosed brace '{{' in route path: \"{pattern}\"")]
    UnclosedBrace { pattern: String },

    #[error("empty parameter name at position {position} in route path: \"{pattern}\"")]
    EmptyName { pattern: String, position: usize },

    #[error("invalid parameter name '{name}' in route path: \"{pattern}\"")]
    InvalidName { pattern: String, name: String },

    #[error("unknown convertor '{convertor}' for parameter '{name}' in route path: \"{pattern}\"")]
    UnknownConvertor {
        pattern: String,
        name: String,
        convertor: String,
    },

    #[error("duplicated parameter name '{name}' in route path: \"{pattern}\"")]
    DuplicateName { pattern: String, name: String },
}

/// How a parameter's text is constrained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convertor {
    /// `{name}`
    Str,
    /// `{name:int}`
    Int,
    /// `{name:path}`
    Path,
}

impl Convertor {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "str" => Some(Self::Str),
            "int" => Some(Self::Int),
            "path" => Some(Self::Path),
            _ => None,
        }
    }

    /// Whether `value` is acceptable for this convertor
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Self::Str => !value.is_empty() && !value.contains('/'),
            Self::Int => !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()),
            Self::Path => true,
        }
    }

    /// Candidate end offsets for a capture starting at `start`, longest first
    fn ends(&self, path: &str, start: usize) -> Vec<usize> {
        let rest = &path[start..];
        let mut ends: Vec<usize> = match self {
            Self::Str => rest
                .char_indices()
                .take_while(|(_, c)| *c != '/')
                .map(|(i, c)| start + i + c.len_utf8())
                .collect(),
            Self::Int => rest
                .bytes()
                .take_while(u8::is_ascii_digit)
                .enumerate()
                .map(|(i, _)| start + i + 1)
                .collect(),
            Self::Path => std::iter::once(start)
                .chain(rest.char_indices().map(|(i, c)| start + i + c.len_utf8()))
                .collect(),
        };
        ends.reverse();
        ends
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Param { name: String, convertor: Convertor },
}

/// A compiled path template such as `/v1/users/{username}/{page:int}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    pieces: Vec<Piece>,
}

impl PathPattern {
    /// Compile a template
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if !pattern.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash {
                pattern: pattern.to_string(),
            });
        }

        let mut pieces = Vec::new();
        let mut seen = HashSet::new();
        let mut literal = String::new();
        let mut rest = pattern;
        let mut offset = 0;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| PatternError::UnclosedBrace {
                pattern: pattern.to_string(),
            })?;
            let body = &after[..close];

            let (name, convertor) = match body.split_once(':') {
                Some((name, conv)) => {
                    let convertor = Convertor::from_name(conv).ok_or_else(|| {
                        PatternError::UnknownConvertor {
                            pattern: pattern.to_string(),
                            name: name.to_string(),
                            convertor: conv.to_string(),
                        }
                    })?;
                    (name, convertor)
                }
                None => (body, Convertor::Str),
            };

            if name.is_empty() {
                return Err(PatternError::EmptyName {
                    pattern: pattern.to_string(),
                    position: offset + open,
                });
            }
            if !is_identifier(name) {
                return Err(PatternError::InvalidName {
                    pattern: pattern.to_string(),
                    name: name.to_string(),
                });
            }
            if !seen.insert(name) {
                return Err(PatternError::DuplicateName {
                    pattern: pattern.to_string(),
                    name: name.to_string(),
                });
            }

            if !literal.is_empty() {
                pieces.push(Piece::Literal(std::mem::take(&mut literal)));
            }
            pieces.push(Piece::Param {
                name: name.to_string(),
                convertor,
            });

            let consumed = open + 1 + close + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Ok(Self {
            raw: pattern.to_string(),
            pieces,
        })
    }

    /// The template as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parameter names in declaration order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params().map(|(name, _)| name)
    }

    /// Parameters with their convertors, in declaration order
    pub fn params(&self) -> impl Iterator<Item = (&str, Convertor)> {
        self.pieces.iter().filter_map(|piece| match piece {
            Piece::Param { name, convertor } => Some((name.as_str(), *convertor)),
            Piece::Literal(_) => None,
        })
    }

    /// Match a whole request path, returning the captures on success
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let mut params = PathParams::new();
        self.match_from(0, path, 0, &mut params).then_some(params)
    }

    fn match_from(&self, index: usize, path: &str, pos: usize, params: &mut PathParams) -> bool {
        let Some(piece) = self.pieces.get(index) else {
            return pos == path.len();
        };

        match piece {
            Piece::Literal(text) => {
                path[pos..].starts_with(text.as_str())
                    && self.match_from(index + 1, path, pos + text.len(), params)
            }
            Piece::Param { name, convertor } => {
                let mark = params.len();
                for end in convertor.ends(path, pos) {
                    params.insert(name.as_str(), &path[pos..end]);
                    if self.match_from(index + 1, path, end, params) {
                        return true;
                    }
                    params.truncate(mark);
                }
                false
            }
        }
    }

    /// Substitute values for every parameter
    ///
    /// `lookup` must yield a value for each parameter; values are inserted
    /// verbatim.
    pub fn render<'a>(&self, mut lookup: impl FnMut(&str) -> Option<&'a str>) -> Option<String> {
        let mut out = String::with_capacity(self.raw.len());
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Param { name, .. } => out.push_str(lookup(name)?),
            }
        }
        Some(out)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(pattern: &str) -> PathPattern {
        PathPattern::parse(pattern).unwrap()
    }

    #[test]
    fn test_literal_match() {
        let pattern = p("/v1/users");
        assert!(pattern.matches("/v1/users").is_some());
        assert!(pattern.matches("/v1/users/").is_none());
        assert!(pattern.matches("/v1/user").is_none());
    }

    #[test]
    fn test_str_and_int_params() {
        let pattern = p("/v1/users/{username}/{page:int}");
        let params = pattern.matches("/v1/users/tom/83").unwrap();
        assert_eq!(params.get("username"), Some("tom"));
        assert_eq!(params.get("page"), Some("83"));

        assert!(pattern.matches("/v1/users/tom/eighty").is_none());
        assert!(pattern.matches("/v1/users//83").is_none());
        assert!(pattern.matches("/v1/users/tom/83/more").is_none());
    }

    #[test]
    fn test_path_param_spans_slashes() {
        let pattern = p("/static/{file:path}");
        let params = pattern.matches("/static/css/site.css").unwrap();
        assert_eq!(params.get("file"), Some("css/site.css"));

        let empty = pattern.matches("/static/").unwrap();
        assert_eq!(empty.get("file"), Some(""));
    }

    #[test]
    fn test_backtracks_into_following_literal() {
        let pattern = p("/files/{name}.json");
        let params = pattern.matches("/files/report.v2.json").unwrap();
        assert_eq!(params.get("name"), Some("report.v2"));
    }

    #[test]
    fn test_param_order() {
        let pattern = p("/{b}/{a:int}/{c:path}");
        let names: Vec<_> = pattern.param_names().collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_render() {
        let pattern = p("/v1/users/{username}/{page:int}");
        let rendered = pattern.render(|name| match name {
            "username" => Some("tom"),
            "page" => Some("83"),
            _ => None,
        });
        assert_eq!(rendered.as_deref(), Some("/v1/users/tom/83"));
        assert_eq!(pattern.render(|_| None), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            PathPattern::parse("users"),
            Err(PatternError::MissingLeadingSlash { .. })
        ));
        assert!(matches!(
            PathPattern::parse("/users/{id"),
            Err(PatternError::UnclosedBrace { .. })
        ));
        assert!(matches!(
            PathPattern::parse("/users/{}"),
            Err(PatternError::EmptyName { position: 7, .. })
        ));
        assert!(matches!(
            PathPattern::parse("/users/{id:uuid}"),
            Err(PatternError::UnknownConvertor { .. })
        ));
        assert!(matches!(
            PathPattern::parse("/users/{id}/{id}"),
            Err(PatternError::DuplicateName { .. })
        ));
        assert!(matches!(
            PathPattern::parse("/users/{1st}"),
            Err(PatternError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_convertor_accepts() {
        assert!(Convertor::Str.accepts("tom"));
        assert!(!Convertor::Str.accepts(""));
        assert!(!Convertor::Str.accepts("a/b"));
        assert!(Convertor::Int.accepts("42"));
        assert!(!Convertor::Int.accepts("-1"));
        assert!(Convertor::Path.accepts("a/b/c"));
    }

    proptest! {
        /// Rendering with valid values produces a path the pattern matches back
        #[test]
        fn prop_render_then_match(
            user in "[a-zA-Z0-9_.-]{1,12}",
            page in 0u32..100_000,
        ) {
            let pattern = p("/v1/users/{username}/{page:int}");
            let page = page.to_string();
            let path = pattern
                .render(|name| if name == "username" { Some(user.as_str()) } else { Some(page.as_str()) })
                .unwrap();

            let params = pattern.matches(&path).unwrap();
            prop_assert_eq!(params.get("username"), Some(user.as_str()));
            prop_assert_eq!(params.get("page"), Some(page.as_str()));
        }
    }
}
