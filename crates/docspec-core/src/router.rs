//! URL map backed by a radix tree (matchit)
//!
//! Every [`Rule`] is stored in registration order. Rules whose patterns only
//! differ in argument names or converters share one matcher entry; on a hit
//! the candidates are tried in order and the first whose converters accept
//! the matched values wins.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut map = UrlMap::new();
//! map.add(Rule::new("/bands/<int:band_id>", "band", vec![Method::GET], None)?)?;
//! map.add(Rule::new("/bands/<name>", "band_by_name", vec![Method::GET], None)?)?;
//! ```

use crate::error::RouteError;
use crate::rule::{matcher_name, Rule};
use http::Method;
use matchit::Router as MatchitRouter;
use std::collections::HashMap;

/// The routing table of an application
#[derive(Clone)]
pub struct UrlMap {
    rules: Vec<Rule>,
    matcher: MatchitRouter<usize>,
    /// Rule indices per matcher entry
    patterns: Vec<Vec<usize>>,
    pattern_index: HashMap<String, usize>,
}

impl UrlMap {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            matcher: MatchitRouter::new(),
            patterns: Vec::new(),
            pattern_index: HashMap::new(),
        }
    }

    /// Add a rule to the table
    pub fn add(&mut self, rule: Rule) -> Result<(), RouteError> {
        let pattern = rule.matcher_path();
        let rule_index = self.rules.len();

        match self.pattern_index.get(&pattern) {
            Some(&entry) => self.patterns[entry].push(rule_index),
            None => {
                let entry = self.patterns.len();
                self.matcher
                    .insert(pattern.as_str(), entry)
                    .map_err(|err| RouteError::Conflict {
                        rule: rule.rule().to_string(),
                        details: err.to_string(),
                    })?;
                self.patterns.push(vec![rule_index]);
                self.pattern_index.insert(pattern, entry);
            }
        }

        tracing::debug!(
            rule = %rule.rule(),
            endpoint = %rule.endpoint(),
            "Added URL rule"
        );
        self.rules.push(rule);
        Ok(())
    }

    /// All rules in registration order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules bound to `endpoint`
    pub fn rules_for_endpoint<'a>(&'a self, endpoint: &'a str) -> impl Iterator<Item = &'a Rule> {
        self.rules.iter().filter(move |rule| rule.endpoint() == endpoint)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Match a request path and method
    pub(crate) fn match_route(&self, path: &str, method: &Method) -> RouteMatch<'_> {
        let Ok(matched) = self.matcher.at(path) else {
            return RouteMatch::NotFound;
        };

        let mut allowed: Vec<Method> = Vec::new();
        for &index in &self.patterns[*matched.value] {
            let rule = &self.rules[index];
            let args: HashMap<String, String> = rule
                .arguments()
                .enumerate()
                .filter_map(|(position, argument)| {
                    matched
                        .params
                        .get(matcher_name(position))
                        .map(|value| (argument.name.clone(), value.to_string()))
                })
                .collect();

            if !rule.converts(args.iter().map(|(k, v)| (k.as_str(), v.as_str()))) {
                continue;
            }
            if rule.accepts(method) {
                return RouteMatch::Found { rule, args };
            }
            for verb in rule.methods() {
                if !allowed.contains(verb) {
                    allowed.push(verb.clone());
                }
            }
        }

        if allowed.is_empty() {
            RouteMatch::NotFound
        } else {
            RouteMatch::MethodNotAllowed { allowed }
        }
    }
}

impl Default for UrlMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of route matching
#[derive(Debug)]
pub(crate) enum RouteMatch<'a> {
    Found {
        rule: &'a Rule,
        args: HashMap<String, String>,
    },
    NotFound,
    MethodNotAllowed {
        allowed: Vec<Method>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(map: &mut UrlMap, rule: &str, endpoint: &str, methods: &[Method]) {
        map.add(Rule::new(rule, endpoint, methods.to_vec(), None).unwrap())
            .unwrap();
    }

    #[test]
    fn test_static_match() {
        let mut map = UrlMap::new();
        add(&mut map, "/bands", "bands", &[Method::GET]);

        match map.match_route("/bands", &Method::GET) {
            RouteMatch::Found { rule, args } => {
                assert_eq!(rule.endpoint(), "bands");
                assert!(args.is_empty());
            }
            other => panic!("Expected match, got {:?}", other),
        }
        assert!(matches!(map.match_route("/albums", &Method::GET), RouteMatch::NotFound));
    }

    #[test]
    fn test_arguments_by_name() {
        let mut map = UrlMap::new();
        add(&mut map, "/bands/<int:band_id>/albums/<title>", "album", &[Method::GET]);

        match map.match_route("/bands/7/albums/jazz", &Method::GET) {
            RouteMatch::Found { args, .. } => {
                assert_eq!(args.get("band_id"), Some(&"7".to_string()));
                assert_eq!(args.get("title"), Some(&"jazz".to_string()));
            }
            other => panic!("Expected match, got {:?}", other),
        }
    }

    #[test]
    fn test_converter_rejection_is_not_found() {
        let mut map = UrlMap::new();
        add(&mut map, "/bands/<int:band_id>", "band", &[Method::GET]);

        assert!(matches!(
            map.match_route("/bands/queen", &Method::GET),
            RouteMatch::NotFound
        ));
    }

    #[test]
    fn test_converters_select_between_shared_patterns() {
        let mut map = UrlMap::new();
        add(&mut map, "/bands/<int:band_id>", "by_id", &[Method::GET]);
        add(&mut map, "/bands/<name>", "by_name", &[Method::GET]);

        match map.match_route("/bands/3", &Method::GET) {
            RouteMatch::Found { rule, .. } => assert_eq!(rule.endpoint(), "by_id"),
            other => panic!("Expected match, got {:?}", other),
        }
        match map.match_route("/bands/queen", &Method::GET) {
            RouteMatch::Found { rule, args } => {
                assert_eq!(rule.endpoint(), "by_name");
                assert_eq!(args.get("name"), Some(&"queen".to_string()));
            }
            other => panic!("Expected match, got {:?}", other),
        }
    }

    #[test]
    fn test_method_not_allowed() {
        let mut map = UrlMap::new();
        add(&mut map, "/bands", "bands", &[Method::GET, Method::POST]);

        match map.match_route("/bands", &Method::DELETE) {
            RouteMatch::MethodNotAllowed { allowed } => {
                assert_eq!(allowed, vec![Method::GET, Method::POST]);
            }
            other => panic!("Expected method not allowed, got {:?}", other),
        }
    }

    #[test]
    fn test_same_rule_different_methods() {
        let mut map = UrlMap::new();
        add(&mut map, "/bands", "list", &[Method::GET]);
        add(&mut map, "/bands", "create", &[Method::POST]);

        match map.match_route("/bands", &Method::POST) {
            RouteMatch::Found { rule, .. } => assert_eq!(rule.endpoint(), "create"),
            other => panic!("Expected match, got {:?}", other),
        }
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_path_argument_spans_slashes() {
        let mut map = UrlMap::new();
        add(&mut map, "/static/<path:filename>", "static", &[Method::GET]);

        match map.match_route("/static/css/site.css", &Method::GET) {
            RouteMatch::Found { args, .. } => {
                assert_eq!(args.get("filename"), Some(&"css/site.css".to_string()));
            }
            other => panic!("Expected match, got {:?}", other),
        }
    }

    #[test]
    fn test_rules_for_endpoint() {
        let mut map = UrlMap::new();
        add(&mut map, "/bands", "bands", &[Method::GET]);
        add(&mut map, "/groups", "bands", &[Method::GET]);
        add(&mut map, "/albums", "albums", &[Method::GET]);

        let rules: Vec<_> = map.rules_for_endpoint("bands").map(Rule::rule).collect();
        assert_eq!(rules, vec!["/bands", "/groups"]);
    }
}
