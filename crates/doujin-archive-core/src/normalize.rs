//! Text normalization for folder names and dictionary matching.

use unicode_normalization::UnicodeNormalization;

/// Symbols Windows refuses in file names, mapped to full-width lookalikes
pub const FILENAME_REPLACEMENTS: [(char, char); 9] = [
    ('/', '／'),
    (':', '：'),
    ('?', '？'),
    ('*', '＊'),
    ('\\', '￥'),
    ('"', '”'),
    ('<', '＜'),
    ('>', '＞'),
    ('|', '｜'),
];

/// NFKC, whitespace runs collapsed to one ASCII space, trimmed
pub fn normalize_text(text: &str) -> String {
    let composed: String = text.nfkc().collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize text into something safe to use as a folder name
pub fn normalize_for_filename(text: &str) -> String {
    normalize_text(text)
        .chars()
        .map(|c| {
            FILENAME_REPLACEMENTS
                .iter()
                .find(|(unsafe_char, _)| *unsafe_char == c)
                .map_or(c, |(_, safe)| *safe)
        })
        .collect()
}

/// Key used only for equality comparison between spellings of a name.
///
/// Case, character width, punctuation and symbol decoration are all
/// discarded; letters and digits of any script (kana and ideographs
/// included) survive.
pub fn normalize_for_matching(text: &str) -> String {
    normalize_text(text)
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}
