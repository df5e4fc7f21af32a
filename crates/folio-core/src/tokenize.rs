//! Tokenizer shared by indexing and querying.
//!
//! Text is split on whitespace and on a fixed set of punctuation characters,
//! and every token is lowercased. Because queries go through the same
//! function, matching is case-insensitive by construction.

/// Characters that separate tokens in addition to whitespace.
pub const SEPARATORS: &[char] = &[' ', '-', '_', '.', ',', '(', ')', '[', ']', '{', '}'];

#[inline]
fn is_separator(c: char) -> bool {
    c.is_whitespace() || SEPARATORS.contains(&c)
}

/// Lazily split `text` into lowercase tokens, in order, duplicates kept.
pub fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(is_separator)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Split `text` into lowercase tokens, in order, duplicates kept.
pub fn tokenize(text: &str) -> Vec<String> {
    tokens(text).collect()
}
