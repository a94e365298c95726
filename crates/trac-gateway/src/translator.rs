//! REST↔gRPC field mapping: for each method, precompute path-segment field
//! extractors (path templates of the form `/v1/foo/{field.path=**}`), and
//! apply type coercion: string→string, string→int64, string→int32,
//! string→enum (case-insensitive match against enum names); unrecognized
//! values are a router-level 400. URL fragments are percent-decoded.

use std::collections::BTreeMap;

use crate::error::GatewayError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    /// `{name=**}`: captures every remaining path segment, joined by `/`.
    /// Must be the last segment in a template.
    Wildcard(String),
}

/// A precompiled HTTP path template, e.g. `/v1/{tenant}/metadata/{object_type}/{object_id}`.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(pattern: &str) -> Self {
        let segments = pattern
            .trim_start_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|raw| match raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(inner) => match inner.split_once('=') {
                    Some((name, "**")) => Segment::Wildcard(name.to_string()),
                    _ => Segment::Param(inner.to_string()),
                },
                None => Segment::Literal(raw.to_string()),
            })
            .collect();
        PathTemplate { segments }
    }

    /// Matches `path` against this template, returning the extracted field
    /// values by field name, URL-decoded. Returns `None` if `path` does not
    /// match the template's literal segments or segment count.
    pub fn extract(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let parts: Vec<&str> = path.trim_start_matches('/').split('/').filter(|s| !s.is_empty()).collect();
        let mut fields = BTreeMap::new();
        let mut pi = 0usize;

        for segment in &self.segments {
            match segment {
                Segment::Literal(lit) => {
                    if parts.get(pi)? != lit {
                        return None;
                    }
                    pi += 1;
                }
                Segment::Param(name) => {
                    let raw = parts.get(pi)?;
                    fields.insert(name.clone(), decode_segment(raw));
                    pi += 1;
                }
                Segment::Wildcard(name) => {
                    let rest = parts.get(pi..)?.join("/");
                    fields.insert(name.clone(), decode_segment(&rest));
                    pi = parts.len();
                }
            }
        }

        if pi == parts.len() {
            Some(fields)
        } else {
            None
        }
    }
}

/// URL-decodes one path segment as US-ASCII/UTF-8 ("URL
/// fragments are URL-decoded US-ASCII").
fn decode_segment(raw: &str) -> String {
    percent_encoding::percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// string→int64 coercion; an unparsable value is a router-level 400.
pub fn coerce_i64(field: &str, raw: &str) -> Result<i64, GatewayError> {
    raw.parse()
        .map_err(|_| GatewayError::bad_request(format!("field '{field}' is not a valid int64: '{raw}'")))
}

/// string→int32 coercion; an unparsable value is a router-level 400.
pub fn coerce_i32(field: &str, raw: &str) -> Result<i32, GatewayError> {
    raw.parse()
        .map_err(|_| GatewayError::bad_request(format!("field '{field}' is not a valid int32: '{raw}'")))
}

/// string→enum coercion: case-insensitive match against `variants` (the
/// wire's enum names). Returns the matching variant's index, so callers can
/// map it onto their own enum type.
pub fn coerce_enum<'a>(field: &str, raw: &str, variants: &'a [&'a str]) -> Result<usize, GatewayError> {
    variants
        .iter()
        .position(|v| v.eq_ignore_ascii_case(raw))
        .ok_or_else(|| GatewayError::bad_request(format!("field '{field}' has unrecognized enum value '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_and_param_segments_extract() {
        let tpl = PathTemplate::parse("/v1/{tenant}/metadata/{object_type}/{object_id}");
        let fields = tpl.extract("/v1/acme/metadata/DATA/abc-123").unwrap();
        assert_eq!(fields.get("tenant").unwrap(), "acme");
        assert_eq!(fields.get("object_type").unwrap(), "DATA");
        assert_eq!(fields.get("object_id").unwrap(), "abc-123");
    }

    #[test]
    fn mismatched_literal_segment_does_not_match() {
        let tpl = PathTemplate::parse("/v1/{tenant}/metadata");
        assert!(tpl.extract("/v1/acme/other").is_none());
    }

    #[test]
    fn wrong_segment_count_does_not_match() {
        let tpl = PathTemplate::parse("/v1/{tenant}/metadata");
        assert!(tpl.extract("/v1/acme/metadata/extra").is_none());
        assert!(tpl.extract("/v1/acme").is_none());
    }

    #[test]
    fn wildcard_captures_remaining_segments() {
        let tpl = PathTemplate::parse("/v1/files/{path=**}");
        let fields = tpl.extract("/v1/files/a/b/c.txt").unwrap();
        assert_eq!(fields.get("path").unwrap(), "a/b/c.txt");
    }

    #[test]
    fn path_segments_are_url_decoded() {
        let tpl = PathTemplate::parse("/v1/{tenant}/metadata");
        let fields = tpl.extract("/v1/acme%20corp/metadata").unwrap();
        assert_eq!(fields.get("tenant").unwrap(), "acme corp");
    }

    #[test]
    fn coerces_valid_int64_and_int32() {
        assert_eq!(coerce_i64("v", "42").unwrap(), 42);
        assert_eq!(coerce_i32("v", "-7").unwrap(), -7);
    }

    #[test]
    fn rejects_invalid_int() {
        assert!(coerce_i64("v", "not-a-number").is_err());
        assert!(coerce_i32("v", "4.5").is_err());
    }

    #[test]
    fn enum_coercion_is_case_insensitive() {
        let variants = ["DATA", "FILE", "STORAGE"];
        assert_eq!(coerce_enum("object_type", "data", &variants).unwrap(), 0);
        assert_eq!(coerce_enum("object_type", "FILE", &variants).unwrap(), 1);
    }

    #[test]
    fn unrecognized_enum_value_is_rejected() {
        let variants = ["DATA", "FILE"];
        assert!(coerce_enum("object_type", "bogus", &variants).is_err());
    }
}
