use once_cell::sync::Lazy;
use regex::Regex;

/// Which fields a rule pulls out of a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// `｛type｝[circle (author)] title (source)`
    TypeCircleAuthorTitleSource,
    /// `｛type｝[circle] title (source)`
    TypeCircleTitleSource,
    /// `[circle] title`
    CircleTitle,
    /// `title (source)`
    TitleSource,
    /// `title`
    TitleOnly,
}

/// One decomposition rule of the cascade
#[derive(Debug)]
pub struct NameRule {
    pub kind: RuleKind,
    pub regex: Regex,
}

// Every rule tolerates a trailing disambiguator such as `_1`, ` 2` or `3`
const SUFFIX: &str = r"(?:[_\s]?\d+)?$";

fn rule(kind: RuleKind, body: &str) -> NameRule {
    let pattern = format!("^{}{}", body, SUFFIX);
    NameRule {
        kind,
        regex: Regex::new(&pattern).expect("rule patterns are valid regexes"),
    }
}

/// The default cascade, most specific first. The last rule always matches.
pub static DEFAULT_RULES: Lazy<Vec<NameRule>> = Lazy::new(|| {
    vec![
        rule(
            RuleKind::TypeCircleAuthorTitleSource,
            r"[｛{](?P<type>.+?)[｝}]\[(?P<circle>.+?) \((?P<author>.+?)\)\] (?P<title>.+?) \((?P<source>.*?)\)",
        ),
        rule(
            RuleKind::TypeCircleTitleSource,
            r"[｛{](?P<type>.+?)[｝}]\[(?P<circle>.*?)\] (?P<title>.+?) \((?P<source>.*?)\)",
        ),
        rule(RuleKind::CircleTitle, r"\[(?P<circle>.+?)\] (?P<title>.+?)"),
        rule(RuleKind::TitleSource, r"(?P<title>.+?) \((?P<source>.+?)\)"),
        rule(RuleKind::TitleOnly, r"(?P<title>.+?)?"),
    ]
});

/// Leading hidden marker such as `〔非表示〕`
pub static HIDDEN_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^〔.+?〕").expect("valid hidden prefix pattern"));

/// Trailing identifier stamp written by the name composer
pub static ID_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*#id\d+$").expect("valid id suffix pattern"));
