//! URL rules
//!
//! Rules use placeholder syntax `<name>` or `<converter:name>`:
//!
//! - `/bands` - Static path
//! - `/bands/<band_id>` - String argument
//! - `/bands/<int:band_id>/albums/<uuid:album_id>` - Typed arguments
//! - `/files/<path:filename>` - Remainder of the path, slashes included
//!
//! A rule knows how to render itself as an OpenAPI template (`/bands/{band_id}`)
//! and as the pattern used by the radix-tree matcher.

use crate::error::RouteError;
use http::Method;

/// Converters understood by the matcher
pub const CONVERTERS: &[&str] = &["default", "string", "any", "int", "float", "path", "uuid"];

/// A placeholder in a URL rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleArgument {
    pub name: String,
    pub converter: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Argument(RuleArgument),
}

/// One registered URL rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    rule: String,
    endpoint: String,
    methods: Vec<Method>,
    blueprint: Option<String>,
    segments: Vec<Segment>,
}

impl Rule {
    /// Parse a rule.
    ///
    /// Every placeholder must fill a whole path segment and a `path`
    /// argument must come last.
    pub fn new(
        rule: &str,
        endpoint: impl Into<String>,
        methods: Vec<Method>,
        blueprint: Option<String>,
    ) -> Result<Self, RouteError> {
        let segments = parse_segments(rule)?;
        Ok(Self {
            rule: rule.to_string(),
            endpoint: endpoint.into(),
            methods,
            blueprint,
            segments,
        })
    }

    /// The rule as written, e.g. `/bands/<int:band_id>/`
    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Name of the owning blueprint, `None` at application scope
    pub fn blueprint(&self) -> Option<&str> {
        self.blueprint.as_deref()
    }

    pub fn arguments(&self) -> impl Iterator<Item = &RuleArgument> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Argument(argument) => Some(argument),
            Segment::Static(_) => None,
        })
    }

    /// Template with OpenAPI placeholders: `<int:id>` becomes `{id}`
    pub fn openapi_path(&self) -> String {
        self.render(|argument| format!("{{{}}}", argument.name))
    }

    /// Pattern for the radix-tree matcher
    ///
    /// Placeholders are named by position (`:arg0`, `*arg1`) so rules that
    /// differ only in argument names or converters share one matcher entry.
    pub(crate) fn matcher_path(&self) -> String {
        let mut position = 0;
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Static(text) => text.clone(),
                Segment::Argument(argument) => {
                    let sigil = if argument.converter == "path" { '*' } else { ':' };
                    position += 1;
                    format!("{}{}", sigil, matcher_name(position - 1))
                }
            })
            .collect()
    }

    /// Whether the rule serves `method`; HEAD rides along with GET
    pub(crate) fn accepts(&self, method: &Method) -> bool {
        self.methods.contains(method) || (*method == Method::HEAD && self.methods.contains(&Method::GET))
    }

    /// Check matched values against the argument converters
    pub(crate) fn converts<'a, I>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        values.into_iter().all(|(name, value)| {
            self.arguments()
                .find(|argument| argument.name == name)
                .map_or(true, |argument| converter_accepts(&argument.converter, value))
        })
    }

    fn render<F>(&self, placeholder: F) -> String
    where
        F: Fn(&RuleArgument) -> String,
    {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Static(text) => text.clone(),
                Segment::Argument(argument) => placeholder(argument),
            })
            .collect()
    }
}

/// Matcher parameter name of the argument at `position`
pub(crate) fn matcher_name(position: usize) -> String {
    format!("arg{}", position)
}

fn converter_accepts(converter: &str, value: &str) -> bool {
    match converter {
        "int" => !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()),
        "float" => value.contains('.') && value.parse::<f64>().is_ok(),
        "uuid" => uuid::Uuid::parse_str(value).is_ok(),
        "path" => true,
        _ => !value.is_empty() && !value.contains('/'),
    }
}

fn parse_segments(rule: &str) -> Result<Vec<Segment>, RouteError> {
    let invalid = |reason: &str| RouteError::InvalidRule {
        rule: rule.to_string(),
        reason: reason.to_string(),
    };

    if !rule.starts_with('/') {
        return Err(invalid("rules must start with a slash"));
    }

    let mut segments = Vec::new();
    let mut rest = rule;

    while let Some(open) = rest.find('<') {
        let close = rest[open..]
            .find('>')
            .map(|offset| open + offset)
            .ok_or_else(|| invalid("unclosed placeholder"))?;

        let before = &rest[..open];
        let after = &rest[close + 1..];
        if !before.ends_with('/') || !(after.is_empty() || after.starts_with('/')) {
            return Err(invalid("placeholders must fill a whole path segment"));
        }

        if !before.is_empty() {
            segments.push(Segment::Static(before.to_string()));
        }
        let argument = parse_argument(rule, &rest[open + 1..close])?;
        if argument.converter == "path" && !after.is_empty() {
            return Err(invalid("a `path` argument must be the last segment"));
        }
        segments.push(Segment::Argument(argument));
        rest = after;
    }

    if rest.contains('>') {
        return Err(invalid("unexpected `>`"));
    }
    if !rest.is_empty() {
        segments.push(Segment::Static(rest.to_string()));
    }
    Ok(segments)
}

fn parse_argument(rule: &str, inner: &str) -> Result<RuleArgument, RouteError> {
    let (converter, name) = match inner.rsplit_once(':') {
        Some((converter, name)) => (converter.trim(), name.trim()),
        None => ("default", inner.trim()),
    };
    // converter arguments such as `string(length=2)` are accepted and ignored
    let converter = converter.split('(').next().unwrap_or(converter).trim();

    let valid_name = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if !valid_name {
        return Err(RouteError::InvalidRule {
            rule: rule.to_string(),
            reason: format!("invalid argument name `{}`", name),
        });
    }
    if !CONVERTERS.contains(&converter) {
        return Err(RouteError::UnknownConverter {
            rule: rule.to_string(),
            converter: converter.to_string(),
        });
    }

    Ok(RuleArgument {
        name: name.to_string(),
        converter: converter.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(text: &str) -> Rule {
        Rule::new(text, "endpoint", vec![Method::GET], None).unwrap()
    }

    #[test]
    fn test_openapi_path() {
        assert_eq!(rule("/bands/<int:band_id>/").openapi_path(), "/bands/{band_id}/");
        assert_eq!(rule("/bands/<band_id>").openapi_path(), "/bands/{band_id}");
        assert_eq!(rule("/bands").openapi_path(), "/bands");
        assert_eq!(
            rule("/a/<uuid:x>/b/<float:y>").openapi_path(),
            "/a/{x}/b/{y}"
        );
    }

    #[test]
    fn test_matcher_path() {
        assert_eq!(rule("/bands/<int:band_id>/").matcher_path(), "/bands/:arg0/");
        assert_eq!(
            rule("/a/<x>/b/<path:rest>").matcher_path(),
            "/a/:arg0/b/*arg1"
        );
        assert_eq!(
            rule("/bands/<name>").matcher_path(),
            rule("/bands/<int:band_id>").matcher_path()
        );
    }

    #[test]
    fn test_arguments() {
        let parsed = rule("/bands/<int:band_id>/albums/<title>");
        let arguments: Vec<_> = parsed.arguments().cloned().collect();
        assert_eq!(
            arguments,
            vec![
                RuleArgument { name: "band_id".into(), converter: "int".into() },
                RuleArgument { name: "title".into(), converter: "default".into() },
            ]
        );
    }

    #[test]
    fn test_converter_arguments_ignored() {
        let parsed = rule("/langs/<string(length=2):code>");
        assert_eq!(parsed.arguments().next().unwrap().converter, "string");
        assert_eq!(parsed.openapi_path(), "/langs/{code}");
    }

    #[test]
    fn test_invalid_rules() {
        let cases = [
            "bands",
            "/bands/<band_id",
            "/bands/x<band_id>",
            "/bands/<band_id>x",
            "/bands/<>",
            "/files/<path:p>/more",
            "/bands/>",
        ];
        for case in cases {
            assert!(
                matches!(
                    Rule::new(case, "e", vec![], None),
                    Err(RouteError::InvalidRule { .. })
                ),
                "{} should be rejected",
                case
            );
        }
    }

    #[test]
    fn test_unknown_converter() {
        assert!(matches!(
            Rule::new("/x/<hex:id>", "e", vec![], None),
            Err(RouteError::UnknownConverter { .. })
        ));
    }

    #[test]
    fn test_converters() {
        let parsed = rule("/bands/<int:band_id>");
        assert!(parsed.converts([("band_id", "42")]));
        assert!(!parsed.converts([("band_id", "queen")]));

        let parsed = rule("/albums/<uuid:id>");
        assert!(parsed.converts([("id", "67e55044-10b1-426f-9247-bb680e5fe0c8")]));
        assert!(!parsed.converts([("id", "nope")]));

        let parsed = rule("/ratio/<float:r>");
        assert!(parsed.converts([("r", "1.5")]));
        assert!(!parsed.converts([("r", "2")]));
    }

    #[test]
    fn test_head_follows_get() {
        let parsed = rule("/bands");
        assert!(parsed.accepts(&Method::GET));
        assert!(parsed.accepts(&Method::HEAD));
        assert!(!parsed.accepts(&Method::POST));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_placeholder_becomes_braced(
            prefix in "[a-z]{1,10}",
            name in "[a-z_][a-z0-9_]{0,10}",
            converter in prop::sample::select(vec!["", "int:", "float:", "uuid:", "string:"]),
        ) {
            let text = format!("/{}/<{}{}>/", prefix, converter, name);
            let parsed = Rule::new(&text, "e", vec![Method::GET], None).unwrap();
            prop_assert_eq!(parsed.openapi_path(), format!("/{}/{{{}}}/", prefix, name));
        }

        #[test]
        fn prop_static_rules_unchanged(path in "(/[a-z0-9_-]{1,8}){1,5}/?") {
            let parsed = Rule::new(&path, "e", vec![Method::GET], None).unwrap();
            prop_assert_eq!(parsed.openapi_path(), path);
        }
    }
}
