//! Decomposition of free-text folder names into typed fields.

mod patterns;

use regex::Captures;

pub use patterns::{NameRule, RuleKind, DEFAULT_RULES};
use patterns::{HIDDEN_PREFIX, ID_SUFFIX};

use crate::persistence::Draft;

/// Fields pulled out of a folder name. Anything the winning rule
/// does not capture, or captures as empty text, is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub rule: RuleKind,
    pub work_type: Option<String>,
    pub circle: Option<String>,
    pub author: Option<String>,
    pub title: String,
    pub source: Option<String>,
}

impl ParsedName {
    pub fn into_draft(self, work_id: i64) -> Draft {
        Draft {
            work_id,
            circle: self.circle,
            author: self.author,
            source: self.source,
            work_type: self.work_type,
            title: Some(self.title),
        }
    }
}

/// Remove a leading `〔…〕` hidden marker
pub fn strip_prefix(name: &str) -> &str {
    match HIDDEN_PREFIX.find(name) {
        Some(m) => &name[m.end()..],
        None => name,
    }
}

/// Remove a trailing `#id123` stamp
pub fn strip_suffix_id(name: &str) -> &str {
    match ID_SUFFIX.find(name) {
        Some(m) => &name[..m.start()],
        None => name,
    }
}

/// Try each rule in order; the first one that matches decides the fields.
/// Returns `None` only when no rule matches.
pub fn try_match(name: &str, rules: &[NameRule]) -> Option<ParsedName> {
    rules.iter().find_map(|rule| {
        rule.regex.captures(name).map(|caps| ParsedName {
            rule: rule.kind,
            work_type: capture(&caps, "type"),
            circle: capture(&caps, "circle"),
            author: capture(&caps, "author"),
            title: capture(&caps, "title").unwrap_or_default(),
            source: capture(&caps, "source"),
        })
    })
}

/// Strip noise from a raw folder name and run the default cascade
pub fn parse_name(raw: &str) -> Option<ParsedName> {
    let name = strip_suffix_id(strip_prefix(raw));
    try_match(name, &DEFAULT_RULES)
}

fn capture(caps: &Captures<'_>, group: &str) -> Option<String> {
    caps.name(group)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ParsedName {
        parse_name(raw).unwrap()
    }

    #[test]
    fn test_full_pattern_with_author() {
        let parsed = parse("｛CG集｝[サークル (作者)] タイトル (ソース)");
        assert_eq!(parsed.rule, RuleKind::TypeCircleAuthorTitleSource);
        assert_eq!(parsed.work_type.as_deref(), Some("CG集"));
        assert_eq!(parsed.circle.as_deref(), Some("サークル"));
        assert_eq!(parsed.author.as_deref(), Some("作者"));
        assert_eq!(parsed.title, "タイトル");
        assert_eq!(parsed.source.as_deref(), Some("ソース"));
    }

    #[test]
    fn test_type_circle_without_author() {
        let parsed = parse("｛同人誌｝[サークル] タイトル (オリジナル)_2");
        assert_eq!(parsed.rule, RuleKind::TypeCircleTitleSource);
        assert_eq!(parsed.work_type.as_deref(), Some("同人誌"));
        assert_eq!(parsed.circle.as_deref(), Some("サークル"));
        assert_eq!(parsed.author, None);
        assert_eq!(parsed.title, "タイトル");
        assert_eq!(parsed.source.as_deref(), Some("オリジナル"));
    }

    #[test]
    fn test_empty_captures_are_absent() {
        let parsed = parse("｛同人誌｝[] タイトル ()");
        assert_eq!(parsed.rule, RuleKind::TypeCircleTitleSource);
        assert_eq!(parsed.circle, None);
        assert_eq!(parsed.source, None);
        assert_eq!(parsed.title, "タイトル");
    }

    #[test]
    fn test_circle_and_title_strips_trailing_digit() {
        let parsed = parse("[サークル] タイトル1");
        assert_eq!(parsed.rule, RuleKind::CircleTitle);
        assert_eq!(parsed.circle.as_deref(), Some("サークル"));
        assert_eq!(parsed.title, "タイトル");
        assert_eq!(parsed.work_type, None);
        assert_eq!(parsed.author, None);
        assert_eq!(parsed.source, None);
    }

    #[test]
    fn test_title_and_source() {
        let parsed = parse("タイトル (ソース)");
        assert_eq!(parsed.rule, RuleKind::TitleSource);
        assert_eq!(parsed.title, "タイトル");
        assert_eq!(parsed.source.as_deref(), Some("ソース"));
        assert_eq!(parsed.circle, None);
    }

    #[test]
    fn test_title_only_catch_all() {
        let parsed = parse("ただのフォルダ_3");
        assert_eq!(parsed.rule, RuleKind::TitleOnly);
        assert_eq!(parsed.title, "ただのフォルダ");
    }

    #[test]
    fn test_every_input_yields_a_title_field() {
        for raw in ["", "1", "###", "〔非表示〕", " #id42", "(x)", "[a]", "｛｝[] ()"] {
            assert!(parse_name(raw).is_some(), "no match for {:?}", raw);
        }
        assert_eq!(parse("").title, "");
    }

    #[test]
    fn test_empty_rule_list_matches_nothing() {
        assert!(try_match("タイトル", &[]).is_none());
    }

    #[test]
    fn test_hidden_prefix_and_id_suffix_are_stripped() {
        assert_eq!(strip_prefix("〔非表示〕[C] T"), "[C] T");
        assert_eq!(strip_prefix("[C] T"), "[C] T");
        assert_eq!(strip_suffix_id("[C] T #id12"), "[C] T");
        assert_eq!(strip_suffix_id("[C] T#id12"), "[C] T");
        assert_eq!(strip_suffix_id("[C] T #id"), "[C] T #id");

        let parsed = parse("〔非表示〕[サークル] タイトル #id99");
        assert_eq!(parsed.circle.as_deref(), Some("サークル"));
        assert_eq!(parsed.title, "タイトル");
    }

    #[test]
    fn test_composed_name_parses_back() {
        // The NFKC-normalized form of a composed name uses ASCII braces
        let parsed = parse("{CG集}[C1] Title (S1、S2) #id7");
        assert_eq!(parsed.rule, RuleKind::TypeCircleTitleSource);
        assert_eq!(parsed.work_type.as_deref(), Some("CG集"));
        assert_eq!(parsed.circle.as_deref(), Some("C1"));
        assert_eq!(parsed.title, "Title");
        assert_eq!(parsed.source.as_deref(), Some("S1、S2"));
    }

    #[test]
    fn test_into_draft_keeps_fields() {
        let draft = parse("[C] T").into_draft(5);
        assert_eq!(draft.work_id, 5);
        assert_eq!(draft.circle.as_deref(), Some("C"));
        assert_eq!(draft.title.as_deref(), Some("T"));
        assert_eq!(draft.work_type, None);
    }
}
