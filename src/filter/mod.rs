//! Filter tree: tag/metric predicates with recursive match & key
//! extraction (spec C4, §4.4). Trees are immutable after build.

use regex::Regex;
use std::collections::BTreeSet;

use crate::types::TagMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOp {
    And,
    Or,
}

/// One of the trivial universal regex forms that make `matches_all` true
/// (spec §4.4).
fn is_universal_pattern(src: &str) -> bool {
    matches!(src, ".*" | "^.*" | ".*$" | "^.*$")
}

#[derive(Debug, Clone)]
pub struct TagValueRegexFilter {
    pub key: String,
    pattern: Regex,
    pub matches_all: bool,
}

impl TagValueRegexFilter {
    pub fn build(key: impl Into<String>, pattern_src: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(pattern_src)?;
        Ok(TagValueRegexFilter {
            key: key.into(),
            matches_all: is_universal_pattern(pattern_src),
            pattern,
        })
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.matches_all || self.pattern.is_match(value)
    }
}

#[derive(Debug, Clone)]
pub struct TagValueWildcardFilter {
    pub key: String,
    pub components: Vec<String>,
    pub matches_all: bool,
}

impl TagValueWildcardFilter {
    /// Splits `pattern` by `*` into substring components (spec §4.4). A
    /// pattern with no `*` degenerates to an exact-match literal
    /// (`[ADD 4.4a]`); a pattern that is exactly `"*"` is `matches_all`.
    pub fn build(key: impl Into<String>, pattern: &str) -> Self {
        let components: Vec<String> = pattern.split('*').map(|s| s.to_string()).collect();
        TagValueWildcardFilter {
            key: key.into(),
            matches_all: pattern == "*",
            components,
        }
    }

    pub fn is_match(&self, value: &str) -> bool {
        if self.matches_all {
            return true;
        }
        if self.components.len() == 1 {
            // No `*` at all: exact match.
            return value == self.components[0];
        }

        let n = self.components.len();
        let mut pos = 0usize;
        for (i, comp) in self.components.iter().enumerate() {
            if comp.is_empty() {
                continue;
            }
            if i == 0 {
                // Anchored at the start iff the pattern didn't begin with `*`.
                if !value[pos..].starts_with(comp.as_str()) {
                    return false;
                }
                pos += comp.len();
            } else if i == n - 1 {
                // Anchored at the end iff the pattern didn't end with `*`.
                if !value[pos..].ends_with(comp.as_str()) {
                    return false;
                }
            } else {
                match value[pos..].find(comp.as_str()) {
                    Some(idx) => pos += idx + comp.len(),
                    None => return false,
                }
            }
        }
        true
    }
}

/// Filter tree variants (spec §3, §4.4).
#[derive(Debug, Clone)]
pub enum Filter {
    Chain(ChainOp, Vec<Filter>),
    Not(Box<Filter>),
    ExplicitTags(Box<Filter>),
    TagValueLiteralOr { key: String, values: BTreeSet<String> },
    TagValueRegex(TagValueRegexFilter),
    TagValueWildcard(TagValueWildcardFilter),
    TagKeyLiteralOr { keys: Vec<String> },
    MetricLiteral { metric: String },
}

/// What a [`Filter`] is evaluated against: the metric name plus the tag
/// map (spec §3 "Tag map representation").
pub struct MatchContext<'a> {
    pub metric: &'a str,
    pub tags: &'a TagMap,
}

/// Recursively evaluate `filter` against `ctx`, recording every tag key
/// that was actually consulted into `matched_keys` (spec §4.4).
pub fn matches(filter: &Filter, ctx: &MatchContext<'_>, matched_keys: &mut BTreeSet<String>) -> bool {
    match filter {
        Filter::Chain(ChainOp::And, children) => {
            children.iter().all(|c| matches(c, ctx, matched_keys))
        }
        Filter::Chain(ChainOp::Or, children) => {
            children.iter().any(|c| matches(c, ctx, matched_keys))
        }
        Filter::Not(inner) => !matches(inner, ctx, matched_keys),
        Filter::ExplicitTags(inner) => {
            let mut inner_matched = BTreeSet::new();
            let inner_ok = matches(inner, ctx, &mut inner_matched);
            let ok = inner_ok && inner_matched.len() == ctx.tags.len();
            if ok {
                matched_keys.extend(inner_matched);
            }
            ok
        }
        Filter::TagValueLiteralOr { key, values } => match ctx.tags.get(key) {
            Some(v) if values.contains(v) => {
                matched_keys.insert(key.clone());
                true
            }
            _ => false,
        },
        Filter::TagValueRegex(f) => match ctx.tags.get(&f.key) {
            Some(v) if f.is_match(v) => {
                matched_keys.insert(f.key.clone());
                true
            }
            _ => false,
        },
        Filter::TagValueWildcard(f) => match ctx.tags.get(&f.key) {
            Some(v) if f.is_match(v) => {
                matched_keys.insert(f.key.clone());
                true
            }
            _ => false,
        },
        Filter::TagKeyLiteralOr { keys } => {
            let ok = keys.iter().all(|k| ctx.tags.contains_key(k));
            if ok {
                matched_keys.extend(keys.iter().cloned());
            }
            ok
        }
        Filter::MetricLiteral { metric } => metric == ctx.metric,
    }
}

/// Tag-only convenience entry point for callers that have no metric to
/// check against (spec "matches_tags(filter, tags, &mut matched_keys)").
/// A `MetricLiteral` node under a tags-only call never matches.
pub fn matches_tags(filter: &Filter, tags: &TagMap, matched_keys: &mut BTreeSet<String>) -> bool {
    let ctx = MatchContext {
        metric: "",
        tags,
    };
    match filter {
        Filter::MetricLiteral { .. } => false,
        other => matches(other, &ctx, matched_keys),
    }
}

/// Recursively returns the set of keys that could constrain results; a key
/// under `Not` is omitted iff its value filter would match everything
/// (spec §4.4).
pub fn desired_tag_keys(filter: &Filter) -> BTreeSet<String> {
    match filter {
        Filter::Chain(_, children) => children.iter().flat_map(desired_tag_keys).collect(),
        Filter::Not(inner) => {
            if filter_matches_everything(inner) {
                BTreeSet::new()
            } else {
                desired_tag_keys(inner)
            }
        }
        Filter::ExplicitTags(inner) => desired_tag_keys(inner),
        Filter::TagValueLiteralOr { key, .. } => [key.clone()].into_iter().collect(),
        Filter::TagValueRegex(f) => [f.key.clone()].into_iter().collect(),
        Filter::TagValueWildcard(f) => [f.key.clone()].into_iter().collect(),
        Filter::TagKeyLiteralOr { keys } => keys.iter().cloned().collect(),
        Filter::MetricLiteral { .. } => BTreeSet::new(),
    }
}

fn filter_matches_everything(filter: &Filter) -> bool {
    match filter {
        Filter::TagValueRegex(f) => f.matches_all,
        Filter::TagValueWildcard(f) => f.matches_all,
        _ => false,
    }
}

/// `TagKeyFilter.matches(tags) = tags.contains_key(self.filter)` (spec §9
/// Open Questions: resolved as stated, rather than the latent
/// `TagValueFilter` cast seen in the original).
pub fn tag_key_matches(key: &str, tags: &TagMap) -> bool {
    tags.contains_key(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> TagMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn explicit_tags_scenario() {
        // spec §8 scenario 3.
        let filter = Filter::ExplicitTags(Box::new(Filter::Chain(
            ChainOp::And,
            vec![
                Filter::TagValueLiteralOr {
                    key: "host".into(),
                    values: ["web01".to_string()].into_iter().collect(),
                },
                Filter::TagValueLiteralOr {
                    key: "owner".into(),
                    values: ["tyrion".to_string()].into_iter().collect(),
                },
            ],
        )));

        let t = tags(&[("host", "web01"), ("owner", "tyrion")]);
        let ctx = MatchContext { metric: "sys.cpu", tags: &t };
        let mut matched = BTreeSet::new();
        assert!(matches(&filter, &ctx, &mut matched));

        let t2 = tags(&[("host", "web01"), ("owner", "tyrion"), ("dc", "phx")]);
        let ctx2 = MatchContext { metric: "sys.cpu", tags: &t2 };
        let mut matched2 = BTreeSet::new();
        assert!(!matches(&filter, &ctx2, &mut matched2));
    }

    #[test]
    fn wildcard_anchors_and_scans() {
        let f = TagValueWildcardFilter::build("host", "web*01");
        assert!(f.is_match("web-42-01"));
        assert!(!f.is_match("xweb-42-01"));
        assert!(!f.is_match("web-42-01x"));
    }

    #[test]
    fn wildcard_matches_all() {
        let f = TagValueWildcardFilter::build("host", "*");
        assert!(f.matches_all);
        assert!(f.is_match("anything"));
    }

    #[test]
    fn regex_universal_forms_short_circuit() {
        for pat in [".*", "^.*", ".*$", "^.*$"] {
            let f = TagValueRegexFilter::build("host", pat).unwrap();
            assert!(f.matches_all);
        }
    }

    #[test]
    fn filter_monotonicity_for_pure_conjunction() {
        // spec §8: tags ⊇ tags' and matches(tags') => matches(tags), for a
        // pure AND tree without Not.
        let filter = Filter::Chain(
            ChainOp::And,
            vec![Filter::TagValueLiteralOr {
                key: "host".into(),
                values: ["web01".to_string()].into_iter().collect(),
            }],
        );
        let smaller = tags(&[("host", "web01")]);
        let larger = tags(&[("host", "web01"), ("dc", "phx")]);
        let mut m1 = BTreeSet::new();
        let mut m2 = BTreeSet::new();
        assert!(matches_tags(&filter, &smaller, &mut m1));
        assert!(matches_tags(&filter, &larger, &mut m2));
    }

    #[test]
    fn tag_key_literal_or_requires_every_key() {
        let filter = Filter::TagKeyLiteralOr {
            keys: vec!["host".into(), "dc".into()],
        };
        let t = tags(&[("host", "web01")]);
        let mut matched = BTreeSet::new();
        assert!(!matches_tags(&filter, &t, &mut matched));
    }
}
