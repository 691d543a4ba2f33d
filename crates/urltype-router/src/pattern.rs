//! URL template parsing, matching and formatting.
//!
//! Templates embed typed placeholders in a path:
//!
//! - `{name:Type}`: a parameter of the named URL type
//! - `{name}` or `:name`: a parameter of the default `string` type
//!
//! A template compiles into an anchored regex built from each type's match
//! pattern. Matching yields the raw, percent-decoded segments in declaration
//! order; formatting substitutes represented segments back in.

use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;

use once_cell::sync::Lazy;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;

use urltype_core::{UrlTypeError, UrlTypeResult};

use crate::aggregator::TypedParam;
use crate::builtins::DEFAULT_TYPE;
use crate::registry::TypeRegistry;

/// Characters escaped in segments that may contain slashes.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Characters escaped in ordinary segments.
const SEGMENT: &AsciiSet = &PATH_SEGMENT.add(b'/');

static PARAM_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[A-Za-z_][A-Za-z0-9_]*$").expect("valid parameter name regex"));

/// How a type appears inside a compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentSyntax {
    /// The type's match pattern.
    pub pattern: String,
    /// Whether segments may contain unencoded slashes.
    pub allows_slashes: bool,
}

/// A parameter declared by a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternParam {
    /// The parameter name.
    pub name: String,
    /// The declared type name.
    pub type_name: String,
    /// Whether the type allows slashes.
    pub allows_slashes: bool,
}

#[derive(Debug, Clone)]
enum Part {
    Literal(String),
    Param(usize),
}

/// A parsed URL template.
#[derive(Clone)]
pub struct UrlPattern {
    template: String,
    regex: Regex,
    params: Vec<PatternParam>,
    parts: Vec<Part>,
}

impl fmt::Debug for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlPattern")
            .field("template", &self.template)
            .field("regex", &self.regex.as_str())
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Finds the next `{`, or a `:` opening a segment.
///
/// `at_start` tells whether `rest` begins the template.
fn placeholder_start(rest: &str, at_start: bool) -> Option<usize> {
    let mut prev = at_start.then_some('/');
    for (index, c) in rest.char_indices() {
        if c == '{' || (c == ':' && prev == Some('/')) {
            return Some(index);
        }
        prev = Some(c);
    }
    None
}

impl UrlPattern {
    /// Parses a template, asking `lookup` for the syntax of each type.
    ///
    /// `{name:Type}` and `{name}` may appear anywhere. A `:name` placeholder
    /// must open a segment (start of the template or right after `/`); any
    /// other colon is literal, so `/at/10:30/:id` has one parameter.
    ///
    /// # Errors
    ///
    /// Returns [`UrlTypeError::InvalidPattern`] for malformed placeholders or
    /// duplicate parameter names, and propagates errors from `lookup`
    /// (typically [`UrlTypeError::UnknownType`]).
    pub fn parse<F>(template: &str, lookup: F) -> UrlTypeResult<Self>
    where
        F: Fn(&str) -> UrlTypeResult<SegmentSyntax>,
    {
        let invalid = |message: String| UrlTypeError::InvalidPattern {
            pattern: template.to_string(),
            message,
        };

        let mut regex_str = String::from("^");
        let mut params: Vec<PatternParam> = Vec::new();
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut remaining = template;

        while let Some(start) = placeholder_start(remaining, params.is_empty()) {
            literal.push_str(&remaining[..start]);
            let rest = &remaining[start..];

            let (name, type_name, consumed) = if rest.starts_with('{') {
                let end = rest
                    .find('}')
                    .ok_or_else(|| invalid("unclosed '{'".to_string()))?;
                let inner = &rest[1..end];
                let (name, type_name) = inner
                    .split_once(':')
                    .map_or((inner, DEFAULT_TYPE), |(n, t)| (n, t));
                (name.trim(), type_name.trim(), end + 1)
            } else {
                let len = rest[1..]
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(rest.len() - 1);
                (&rest[1..=len], DEFAULT_TYPE, len + 1)
            };

            if !PARAM_NAME.is_match(name) {
                return Err(invalid(format!("invalid parameter name '{name}'")));
            }
            if params.iter().any(|p| p.name == name) {
                return Err(invalid(format!("duplicate parameter '{name}'")));
            }

            let syntax = lookup(type_name)?;
            regex_str.push_str(&regex::escape(&literal));
            parts.push(Part::Literal(std::mem::take(&mut literal)));
            write!(regex_str, "(?P<p{}>(?:{}))", params.len(), syntax.pattern).ok();
            parts.push(Part::Param(params.len()));
            params.push(PatternParam {
                name: name.to_string(),
                type_name: type_name.to_string(),
                allows_slashes: syntax.allows_slashes,
            });

            remaining = &rest[consumed..];
        }
        literal.push_str(remaining);
        regex_str.push_str(&regex::escape(&literal));
        parts.push(Part::Literal(literal));
        regex_str.push('$');

        let regex =
            Regex::new(&regex_str).map_err(|e| invalid(format!("cannot compile regex: {e}")))?;

        Ok(Self {
            template: template.to_string(),
            regex,
            params,
            parts,
        })
    }

    /// Parses a template against the types of a registry.
    ///
    /// # Errors
    ///
    /// See [`UrlPattern::parse`].
    pub fn parse_with_registry(template: &str, registry: &TypeRegistry) -> UrlTypeResult<Self> {
        Self::parse(template, |type_name| {
            let definition = registry.lookup(type_name)?;
            Ok(SegmentSyntax {
                pattern: definition.pattern().to_string(),
                allows_slashes: definition.allows_slashes(),
            })
        })
    }

    /// Returns the original template.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the compiled regex.
    pub const fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Returns the declared parameters in template order.
    pub fn params(&self) -> &[PatternParam] {
        &self.params
    }

    /// Matches a whole path, returning its typed parameters in template order.
    ///
    /// Captured segments are percent-decoded; a segment that does not decode
    /// to valid UTF-8 makes the whole path a non-match.
    pub fn match_path(&self, path: &str) -> Option<Vec<TypedParam>> {
        let captures = self.regex.captures(path)?;
        self.params
            .iter()
            .enumerate()
            .map(|(index, param)| {
                let raw = captures.name(&format!("p{index}"))?.as_str();
                let decoded = percent_decode_str(raw).decode_utf8().ok()?;
                Some(TypedParam::new(
                    param.name.clone(),
                    param.type_name.clone(),
                    decoded.into_owned(),
                ))
            })
            .collect()
    }

    /// Builds a path from represented segments, keyed by parameter name.
    ///
    /// When `encode` is set, segments are percent-encoded; slashes are kept
    /// only for types that allow them.
    ///
    /// # Errors
    ///
    /// Returns [`UrlTypeError::MissingParameter`] if a segment is missing.
    pub fn format<S: std::hash::BuildHasher>(
        &self,
        segments: &HashMap<String, String, S>,
        encode: bool,
    ) -> UrlTypeResult<String> {
        let mut url = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(text) => url.push_str(text),
                Part::Param(index) => {
                    let param = &self.params[*index];
                    let segment = segments
                        .get(&param.name)
                        .ok_or_else(|| UrlTypeError::MissingParameter(param.name.clone()))?;
                    if encode {
                        let set = if param.allows_slashes { PATH_SEGMENT } else { SEGMENT };
                        url.extend(utf8_percent_encode(segment, set));
                    } else {
                        url.push_str(segment);
                    }
                }
            }
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};

    use super::*;
    use crate::definition::{ResolveContext, Resolution, UrlType};

    #[derive(Debug)]
    struct Pk(&'static str);

    impl UrlType for Pk {
        fn name(&self) -> &str {
            self.0
        }

        fn pattern(&self) -> &str {
            r"\d+"
        }

        fn resolve(&self, raw: &str, _ctx: &ResolveContext) -> Resolution {
            Resolution::ready(json!({ "pk": raw }))
        }

        fn represent(&self, value: &Value) -> UrlTypeResult<String> {
            Ok(value["pk"].to_string())
        }
    }

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::with_builtins();
        registry.register(Arc::new(Pk("SyncTest"))).unwrap();
        registry.register(Arc::new(Pk("AsyncTest"))).unwrap();
        registry
    }

    fn segments(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parse_typed_placeholders() {
        let p = UrlPattern::parse_with_registry(
            "/sync-async/{param1:SyncTest}/{param2:AsyncTest}",
            &registry(),
        )
        .unwrap();
        let names: Vec<(&str, &str)> = p
            .params()
            .iter()
            .map(|p| (p.name.as_str(), p.type_name.as_str()))
            .collect();
        assert_eq!(names, vec![("param1", "SyncTest"), ("param2", "AsyncTest")]);
        assert_eq!(p.template(), "/sync-async/{param1:SyncTest}/{param2:AsyncTest}");
    }

    #[test]
    fn test_match_path() {
        let p = UrlPattern::parse_with_registry(
            "/sync-async/{param1:SyncTest}/{param2:AsyncTest}",
            &registry(),
        )
        .unwrap();
        let params = p.match_path("/sync-async/1/2").unwrap();
        assert_eq!(
            params,
            vec![
                TypedParam::new("param1", "SyncTest", "1"),
                TypedParam::new("param2", "AsyncTest", "2"),
            ]
        );
        assert!(p.match_path("/sync-async/1/x").is_none());
        assert!(p.match_path("/sync-async/1/2/extra").is_none());
        assert!(p.match_path("/sync/1").is_none());
    }

    #[test]
    fn test_default_type_placeholders() {
        let p = UrlPattern::parse_with_registry("/users/:username/posts/{slug}", &registry())
            .unwrap();
        assert!(p.params().iter().all(|p| p.type_name == DEFAULT_TYPE));
        let params = p.match_path("/users/alice/posts/hello%20world").unwrap();
        assert_eq!(params[0].raw, "alice");
        assert_eq!(params[1].raw, "hello world");
    }

    #[test]
    fn test_colon_param_stops_at_non_identifier() {
        let p = UrlPattern::parse_with_registry("/files/:name.json", &registry()).unwrap();
        assert_eq!(p.params()[0].name, "name");
        assert!(p.match_path("/files/report.json").is_some());
    }

    #[test]
    fn test_colon_inside_segment_is_literal() {
        let p = UrlPattern::parse_with_registry("/at/10:30/{id:int}", &registry()).unwrap();
        assert_eq!(p.params().len(), 1);
        assert_eq!(p.match_path("/at/10:30/5").unwrap()[0].raw, "5");
        assert!(p.match_path("/at/10x30/5").is_none());
        assert_eq!(p.format(&segments(&[("id", "5")]), true).unwrap(), "/at/10:30/5");

        let p = UrlPattern::parse_with_registry(":lang/{id:int}:edit", &registry()).unwrap();
        let names: Vec<&str> = p.params().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["lang", "id"]);
        assert!(p.match_path("en/3:edit").is_some());
    }

    #[test]
    fn test_invalid_utf8_segment_does_not_match() {
        let p = UrlPattern::parse_with_registry("/s/{q}", &registry()).unwrap();
        assert!(p.match_path("/s/%FF").is_none());
        assert!(p.match_path("/s/caf%C3%A9").is_some());
    }

    #[test]
    fn test_literals_are_escaped() {
        let p = UrlPattern::parse_with_registry("/a.b/{id:int}", &registry()).unwrap();
        assert!(p.match_path("/a.b/1").is_some());
        assert!(p.match_path("/axb/1").is_none());
    }

    #[test]
    fn test_unknown_type_fails() {
        let err = UrlPattern::parse_with_registry("/x/{id:Missing}", &registry()).unwrap_err();
        assert!(matches!(err, UrlTypeError::UnknownType(ref n) if n == "Missing"));
    }

    #[test]
    fn test_malformed_templates() {
        let r = registry();
        for template in ["/x/{id:int", "/x/{}", "/x/{1id}", "/x/:", "/x/{id}/{id:int}"] {
            let err = UrlPattern::parse_with_registry(template, &r).unwrap_err();
            assert!(
                matches!(err, UrlTypeError::InvalidPattern { .. }),
                "{template} gave {err}"
            );
        }
    }

    #[test]
    fn test_format() {
        let p = UrlPattern::parse_with_registry(
            "/sync-async/{param1:SyncTest}/{param2:AsyncTest}",
            &registry(),
        )
        .unwrap();
        let url = p
            .format(&segments(&[("param1", "1"), ("param2", "2")]), true)
            .unwrap();
        assert_eq!(url, "/sync-async/1/2");

        let err = p.format(&segments(&[("param1", "1")]), true).unwrap_err();
        assert!(matches!(err, UrlTypeError::MissingParameter(ref n) if n == "param2"));
    }

    #[test]
    fn test_format_encodes_segments() {
        let p = UrlPattern::parse_with_registry("/s/{q}/{rest:path}", &registry()).unwrap();
        let values = segments(&[("q", "a/b c"), ("rest", "docs/read me.md")]);
        assert_eq!(
            p.format(&values, true).unwrap(),
            "/s/a%2Fb%20c/docs/read%20me.md"
        );
        assert_eq!(p.format(&values, false).unwrap(), "/s/a/b c/docs/read me.md");
    }

    #[test]
    fn test_format_then_match_recovers_segments() {
        let p = UrlPattern::parse_with_registry("/s/{q}", &registry()).unwrap();
        let url = p.format(&segments(&[("q", "a/b")]), true).unwrap();
        assert_eq!(p.match_path(&url).unwrap()[0].raw, "a/b");
    }
}
