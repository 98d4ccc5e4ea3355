//! Shared text helpers: cleaning, normalization, sentence splitting, quote
//! extraction. Everything here is pure and allocation-light; the heavier
//! language-aware snippet splitting lives in `matcher`.

/// Collapse runs of whitespace into single spaces and trim.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

const SEPARATORS: [char; 6] = ['·', '‧', 'ㆍ', '-', '_', '/'];

/// Normalize a phrase for duplicate detection across variant spellings:
/// drop middle-dot style separators and whitespace, lowercase the rest.
/// Idempotent: normalizing an already-normalized phrase is a no-op.
pub fn normalize_phrase(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && !SEPARATORS.contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalize a query token for deduplication: punctuation becomes a space,
/// lowercase, whitespace collapsed.
pub fn normalize_token(token: &str) -> String {
    let replaced: String = token
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .flat_map(char::to_lowercase)
        .collect();
    clean_text(&replaced)
}

/// Remove duplicates while preserving order, ignoring empty tokens.
/// Comparison is case/punctuation-insensitive via [`normalize_token`].
pub fn dedupe_preserve<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let item = item.as_ref();
        if item.is_empty() {
            continue;
        }
        let norm = normalize_token(item);
        if norm.is_empty() || !seen.insert(norm) {
            continue;
        }
        out.push(item.to_string());
    }
    out
}

/// True if the text contains Hangul syllables.
pub fn contains_korean(text: &str) -> bool {
    text.chars().any(|c| matches!(c, '가'..='힣'))
}

/// Basic sentence segmentation that works reasonably for Korean/English
/// mixed text: split after `.!?` when the next non-space character starts a
/// new sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let text = clean_text(text);
    if text.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            // Break only before a letter, so "3.5" or trailing ")" stay put.
            let mut j = i + 1;
            let mut saw_space = false;
            while j < chars.len() && chars[j].is_whitespace() {
                saw_space = true;
                j += 1;
            }
            if saw_space && j < chars.len() && (chars[j].is_alphabetic() || matches!(chars[j], '가'..='힣')) {
                sentences.push(current.trim().to_string());
                current.clear();
                i = j;
                continue;
            }
        }
        i += 1;
    }

    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

const QUOTE_PAIRS: [(char, char); 4] = [('“', '”'), ('"', '"'), ('\'', '\''), ('‘', '’')];

/// Extract quoted segments using several quote styles, dropping short and
/// duplicate snippets while preserving order.
pub fn extract_quotes(text: &str, min_length: usize) -> Vec<String> {
    let mut quotes = Vec::new();
    for (open, close) in QUOTE_PAIRS {
        let mut rest = text;
        while let Some(start) = rest.find(open) {
            let after = &rest[start + open.len_utf8()..];
            match after.find(close) {
                Some(end) => {
                    quotes.push(after[..end].to_string());
                    rest = &after[end + close.len_utf8()..];
                }
                None => break,
            }
        }
    }

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for q in quotes {
        let cleaned = q.trim().to_string();
        if cleaned.chars().count() < min_length || !seen.insert(cleaned.clone()) {
            continue;
        }
        out.push(cleaned);
    }
    out
}
