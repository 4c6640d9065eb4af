//! Text primitives shared by every matching component.
//!
//! All boundary semantics live here so they are defined (and tested) once:
//!
//! - Normalized text is lowercase, single-space separated.
//! - Multi-word canonical forms are joined with `_` so they survive as one token.
//! - `+` is the alternate join form used by skip-gram patterns.
//! - A "word" match means the phrase is bounded by the start/end of the text or
//!   by a space on each side. Never a bare substring match.

/// Common English stopwords. The spelling corrector treats these as known
/// words; they are never tagged.
pub const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Lowercase free text and reduce it to space-separated tokens.
///
/// Keeps `_`, `+` and `#` (so `c++`, `c#`, `machine_learning` stay intact) and
/// keeps `.` only between two alphanumerics (`node.js`, `asp.net`). Everything
/// else becomes whitespace.
pub fn normalize_text(raw: &str) -> String {
    let chars: Vec<char> = raw.to_lowercase().chars().collect();
    let mut out = String::with_capacity(chars.len());

    for (i, &c) in chars.iter().enumerate() {
        if c.is_alphanumeric() || matches!(c, '_' | '+' | '#') {
            out.push(c);
            continue;
        }
        if c == '.' {
            let prev_alnum = i > 0 && chars[i - 1].is_alphanumeric();
            let next_alnum = chars.get(i + 1).is_some_and(|n| n.is_alphanumeric());
            if prev_alnum && next_alnum {
                out.push(c);
                continue;
            }
        }
        out.push(' ');
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical lookup key: lowercase words joined by `_`.
///
/// `"Machine Learning"`, `"machine_learning"` and `" machine  learning "` all
/// share the key `machine_learning`.
pub fn normalize_key(s: &str) -> String {
    split_words(s).collect::<Vec<_>>().join("_")
}

/// Skip-gram lookup key: lowercase words joined by `+`.
pub fn normalize_plus_key(s: &str) -> String {
    split_words(s).collect::<Vec<_>>().join("+")
}

/// Lowercase and collapse whitespace, keeping `_` inside words.
pub fn normalize_phrase(s: &str) -> String {
    s.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Number of words in a label or pattern, counting `_`, `+` and whitespace as
/// separators. Never less than 1, so it is always safe as a divisor.
pub fn word_count(s: &str) -> usize {
    split_words(s).count().max(1)
}

fn split_words(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| c.is_whitespace() || c == '_' || c == '+')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

/// Byte offsets of every word-bounded occurrence of `phrase` in `text`.
fn word_matches(text: &str, phrase: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    if phrase.is_empty() || phrase.len() > text.len() {
        return out;
    }

    let bytes = text.as_bytes();
    let mut pos = 0;
    while pos <= text.len() {
        let Some(offset) = text[pos..].find(phrase) else {
            break;
        };
        let start = pos + offset;
        let end = start + phrase.len();
        let left_ok = start == 0 || bytes[start - 1] == b' ';
        let right_ok = end == text.len() || bytes[end] == b' ';
        if left_ok && right_ok {
            out.push((start, end));
            pos = end;
        } else {
            // Advance by one char so overlapping candidates are still seen.
            let step = text[start..].chars().next().map_or(1, char::len_utf8);
            pos = start + step;
        }
    }
    out
}

/// True if `phrase` occurs in `text` as whole words.
pub fn contains_word(text: &str, phrase: &str) -> bool {
    !word_matches(text, phrase).is_empty()
}

/// Replace every word-bounded occurrence of `phrase` with `replacement`.
///
/// Returns `None` when nothing was replaced, so callers can detect a fixed point
/// without comparing strings.
pub fn replace_word(text: &str, phrase: &str, replacement: &str) -> Option<String> {
    let matches = word_matches(text, phrase);
    if matches.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, end) in matches {
        out.push_str(&text[last..start]);
        out.push_str(replacement);
        last = end;
    }
    out.push_str(&text[last..]);
    Some(out)
}
