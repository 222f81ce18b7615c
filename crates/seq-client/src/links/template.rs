//! URI template parsing and expansion.
//!
//! Implements the subset of RFC 6570 that Seq link hrefs use: all eight
//! expression operators with prefix (`:n`) and explode (`*`) modifiers,
//! expanded against scalar string values. Variables without a bound value
//! are omitted, so an expression like `{?count,render}` disappears entirely
//! when neither parameter is supplied.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Expression operator, selecting prefix, separator and encoding rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    /// `{var}`
    Simple,
    /// `{+var}`
    Reserved,
    /// `{#var}`
    Fragment,
    /// `{.var}`
    Label,
    /// `{/var}`
    Path,
    /// `{;var}`
    PathParam,
    /// `{?var}`
    Query,
    /// `{&var}`
    QueryContinuation,
}

impl Operator {
    fn from_prefix(byte: u8) -> Option<Self> {
        match byte {
            b'+' => Some(Self::Reserved),
            b'#' => Some(Self::Fragment),
            b'.' => Some(Self::Label),
            b'/' => Some(Self::Path),
            b';' => Some(Self::PathParam),
            b'?' => Some(Self::Query),
            b'&' => Some(Self::QueryContinuation),
            _ => None,
        }
    }

    /// String prepended once when the expression produces any output.
    fn first(self) -> &'static str {
        match self {
            Self::Simple | Self::Reserved => "",
            Self::Fragment => "#",
            Self::Label => ".",
            Self::Path => "/",
            Self::PathParam => ";",
            Self::Query => "?",
            Self::QueryContinuation => "&",
        }
    }

    /// Separator between multiple expanded variables.
    fn separator(self) -> &'static str {
        match self {
            Self::Simple | Self::Reserved | Self::Fragment => ",",
            Self::Label => ".",
            Self::Path => "/",
            Self::PathParam => ";",
            Self::Query | Self::QueryContinuation => "&",
        }
    }

    /// Whether expanded variables are written as `name=value` pairs.
    fn named(self) -> bool {
        matches!(self, Self::PathParam | Self::Query | Self::QueryContinuation)
    }

    /// What follows the name when the bound value is empty.
    fn if_empty(self) -> &'static str {
        match self {
            Self::Query | Self::QueryContinuation => "=",
            _ => "",
        }
    }

    /// Whether reserved URI characters pass through unencoded.
    fn allow_reserved(self) -> bool {
        matches!(self, Self::Reserved | Self::Fragment)
    }
}

/// Value modifier attached to a single variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    None,
    /// `{var:3}`: at most the first n characters of the value.
    Prefix(usize),
    /// `{var*}`: no effect on scalar values.
    Explode,
}

#[derive(Debug, Clone)]
struct VarSpec {
    name: String,
    modifier: Modifier,
}

#[derive(Debug, Clone)]
enum Part {
    Literal(String),
    Expression {
        operator: Operator,
        variables: Vec<VarSpec>,
    },
}

/// A parsed RFC 6570 URI template.
#[derive(Debug, Clone)]
pub struct UriTemplate {
    raw: String,
    parts: Vec<Part>,
}

impl UriTemplate {
    /// Parse a template, rejecting malformed expressions.
    pub fn parse(template: &str) -> Result<Self> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    if !literal.is_empty() {
                        parts.push(Part::Literal(std::mem::take(&mut literal)));
                    }
                    let mut expression = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        expression.push(c);
                    }
                    if !closed {
                        return Err(Self::invalid(template, "unterminated expression"));
                    }
                    parts.push(Self::parse_expression(template, &expression)?);
                }
                '}' => {
                    return Err(Self::invalid(template, "`}` outside an expression"));
                }
                _ => literal.push(c),
            }
        }

        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Ok(Self {
            raw: template.to_string(),
            parts,
        })
    }

    /// The original template string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The names of all variables declared by the template, in order of
    /// first appearance.
    pub fn variable_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for part in &self.parts {
            if let Part::Expression { variables, .. } = part {
                for var in variables {
                    if !names.contains(&var.name.as_str()) {
                        names.push(var.name.as_str());
                    }
                }
            }
        }
        names
    }

    /// Expand the template against the given values.
    ///
    /// Variables without a value are omitted; an expression none of whose
    /// variables are bound produces no output at all.
    pub fn expand(&self, values: &BTreeMap<String, String>) -> String {
        let mut out = String::new();

        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Expression {
                    operator,
                    variables,
                } => {
                    let bound: Vec<(&VarSpec, &str)> = variables
                        .iter()
                        .filter_map(|var| {
                            values.get(&var.name).map(|value| (var, value.as_str()))
                        })
                        .collect();
                    if bound.is_empty() {
                        continue;
                    }

                    out.push_str(operator.first());
                    for (i, (var, value)) in bound.iter().enumerate() {
                        if i > 0 {
                            out.push_str(operator.separator());
                        }
                        let value = match var.modifier {
                            Modifier::Prefix(limit) => prefix(value, limit),
                            _ => value,
                        };
                        if operator.named() {
                            encode_into(&mut out, &var.name, false);
                            if value.is_empty() {
                                out.push_str(operator.if_empty());
                                continue;
                            }
                            out.push('=');
                        }
                        encode_into(&mut out, value, operator.allow_reserved());
                    }
                }
            }
        }

        out
    }

    fn parse_expression(template: &str, expression: &str) -> Result<Part> {
        if expression.is_empty() {
            return Err(Self::invalid(template, "empty expression"));
        }

        let (operator, spec_list) = match Operator::from_prefix(expression.as_bytes()[0]) {
            Some(operator) => (operator, &expression[1..]),
            None => (Operator::Simple, expression),
        };
        if spec_list.is_empty() {
            return Err(Self::invalid(template, "expression declares no variables"));
        }

        let mut variables = Vec::new();
        for spec in spec_list.split(',') {
            variables.push(Self::parse_varspec(template, spec)?);
        }

        Ok(Part::Expression {
            operator,
            variables,
        })
    }

    fn parse_varspec(template: &str, spec: &str) -> Result<VarSpec> {
        let (name, modifier) = if let Some(name) = spec.strip_suffix('*') {
            (name, Modifier::Explode)
        } else if let Some((name, digits)) = spec.split_once(':') {
            // Prefix length is 1-9999 with no leading zero.
            if digits.is_empty()
                || digits.len() > 4
                || digits.starts_with('0')
                || !digits.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(Self::invalid(template, "invalid prefix length"));
            }
            let limit = digits.parse::<usize>().unwrap_or(0);
            (name, Modifier::Prefix(limit))
        } else {
            (spec, Modifier::None)
        };

        if name.is_empty() {
            return Err(Self::invalid(template, "empty variable name"));
        }
        if !name.bytes().all(is_varname_byte) {
            return Err(Self::invalid(
                template,
                format!("invalid character in variable name `{name}`"),
            ));
        }

        Ok(VarSpec {
            name: name.to_string(),
            modifier,
        })
    }

    fn invalid(template: &str, message: impl Into<String>) -> Error {
        Error::Template {
            template: template.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_varname_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'.' || byte == b'%'
}

/// At most the first `limit` characters of `value`, on char boundaries.
fn prefix(value: &str, limit: usize) -> &str {
    match value.char_indices().nth(limit) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~')
}

fn is_reserved(byte: u8) -> bool {
    matches!(
        byte,
        b':' | b'/'
            | b'?'
            | b'#'
            | b'['
            | b']'
            | b'@'
            | b'!'
            | b'$'
            | b'&'
            | b'\''
            | b'('
            | b')'
            | b'*'
            | b'+'
            | b','
            | b';'
            | b'='
    )
}

/// Percent-encode `value` into `out`.
///
/// With `allow_reserved`, reserved URI characters and existing
/// percent-encoded triplets pass through untouched.
fn encode_into(out: &mut String, value: &str, allow_reserved: bool) {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        if is_unreserved(byte) || (allow_reserved && is_reserved(byte)) {
            out.push(byte as char);
            i += 1;
        } else if allow_reserved
            && byte == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            out.push('%');
            out.push(bytes[i + 1] as char);
            out.push(bytes[i + 2] as char);
            i += 3;
        } else {
            push_pct(out, byte);
            i += 1;
        }
    }
}

fn push_pct(out: &mut String, byte: u8) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    out.push('%');
    out.push(HEX[(byte >> 4) as usize] as char);
    out.push(HEX[(byte & 0x0F) as usize] as char);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn expand(template: &str, pairs: &[(&str, &str)]) -> String {
        UriTemplate::parse(template)
            .expect("Failed to parse template")
            .expand(&values(pairs))
    }

    #[test]
    fn test_simple_expansion() {
        assert_eq!(expand("{var}", &[("var", "value")]), "value");
        assert_eq!(
            expand("{hello}", &[("hello", "Hello World!")]),
            "Hello%20World%21"
        );
        assert_eq!(expand("{x,y}", &[("x", "1024"), ("y", "768")]), "1024,768");
    }

    #[test]
    fn test_reserved_expansion() {
        assert_eq!(
            expand("{+path}/here", &[("path", "/foo/bar")]),
            "/foo/bar/here"
        );
        assert_eq!(
            expand("{+hello}", &[("hello", "Hello World!")]),
            "Hello%20World!"
        );
    }

    #[test]
    fn test_fragment_expansion() {
        assert_eq!(
            expand("X{#hello}", &[("hello", "Hello World!")]),
            "X#Hello%20World!"
        );
    }

    #[test]
    fn test_label_and_path_expansion() {
        assert_eq!(expand("X{.var}", &[("var", "value")]), "X.value");
        assert_eq!(expand("{/var}", &[("var", "value")]), "/value");
        assert_eq!(
            expand("{/a,b}", &[("a", "one"), ("b", "two")]),
            "/one/two"
        );
    }

    #[test]
    fn test_path_param_expansion() {
        assert_eq!(
            expand("{;x,y}", &[("x", "1024"), ("y", "768")]),
            ";x=1024;y=768"
        );
        // Empty values keep the name but drop the `=`.
        assert_eq!(
            expand("{;x,empty}", &[("x", "1024"), ("empty", "")]),
            ";x=1024;empty"
        );
    }

    #[test]
    fn test_query_expansion() {
        assert_eq!(
            expand("{?x,y}", &[("x", "1024"), ("y", "768")]),
            "?x=1024&y=768"
        );
        assert_eq!(
            expand("{?x,y,empty}", &[("x", "1024"), ("y", "768"), ("empty", "")]),
            "?x=1024&y=768&empty="
        );
        assert_eq!(
            expand("?fixed=yes{&x}", &[("x", "1024")]),
            "?fixed=yes&x=1024"
        );
    }

    #[test]
    fn test_unset_variables_are_omitted() {
        assert_eq!(expand("api/events{?count,render}", &[]), "api/events");
        assert_eq!(
            expand("api/events{?count,render}", &[("count", "10")]),
            "api/events?count=10"
        );
        assert_eq!(expand("{/defined,missing}", &[("defined", "x")]), "/x");
    }

    #[test]
    fn test_prefix_modifier() {
        assert_eq!(expand("{var:3}", &[("var", "value")]), "val");
        assert_eq!(expand("{var:30}", &[("var", "value")]), "value");
        assert_eq!(expand("{hello:5}", &[("hello", "Hello World!")]), "Hello");
    }

    #[test]
    fn test_explode_is_inert_for_scalars() {
        assert_eq!(expand("{?list*}", &[("list", "red")]), "?list=red");
    }

    #[test]
    fn test_pct_triplets_pass_through_reserved() {
        assert_eq!(expand("{+var}", &[("var", "a%20b")]), "a%20b");
        // Outside a valid triplet the percent sign is encoded.
        assert_eq!(expand("{+var}", &[("var", "50%")]), "50%25");
        assert_eq!(expand("{var}", &[("var", "a%20b")]), "a%2520b");
    }

    #[test]
    fn test_variable_names() {
        let template =
            UriTemplate::parse("api/events/{id}{?count,render,count}").expect("parse failed");
        assert_eq!(template.variable_names(), ["id", "count", "render"]);
    }

    #[test]
    fn test_literal_only_template() {
        let template = UriTemplate::parse("api/events").expect("parse failed");
        assert!(template.variable_names().is_empty());
        assert_eq!(template.expand(&BTreeMap::new()), "api/events");
        assert_eq!(template.as_str(), "api/events");
        assert_eq!(template.to_string(), "api/events");
    }

    #[test]
    fn test_parse_errors() {
        assert!(UriTemplate::parse("api/{unterminated").is_err());
        assert!(UriTemplate::parse("api/{}").is_err());
        assert!(UriTemplate::parse("api/{?}").is_err());
        assert!(UriTemplate::parse("api/}stray").is_err());
        assert!(UriTemplate::parse("api/{a b}").is_err());
        assert!(UriTemplate::parse("api/{var:}").is_err());
        assert!(UriTemplate::parse("api/{var:0}").is_err());
        assert!(UriTemplate::parse("api/{var:99999}").is_err());
        assert!(UriTemplate::parse("api/{nested{var}}").is_err());
    }

    #[test]
    fn test_parse_error_carries_the_template() {
        let err = UriTemplate::parse("api/{unterminated").unwrap_err();
        assert!(err.to_string().contains("api/{unterminated"));
    }
}
