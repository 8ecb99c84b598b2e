//! Text canonicalization shared by the classifier and the slot detectors.
//!
//! `normalize` produces the matching form: lowercase ASCII letters, digits,
//! apostrophes and single spaces. `fold` keeps punctuation so that structure
//! detectors (dates, times, postal codes) still see `12/06` or `18:30`.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Canonical matching form of `text`. Idempotent.
pub fn normalize(text: &str) -> String {
    let mut output = String::with_capacity(text.len());

    for character in strip_marks(text) {
        match character {
            'a'..='z' | '0'..='9' | '\'' | ' ' => output.push(character),
            _ => output.push(' '),
        }
    }

    collapse_whitespace(&output)
}

/// Lowercased text with diacritics removed and punctuation preserved.
pub fn fold(text: &str) -> String {
    collapse_whitespace(&strip_marks(text).collect::<String>())
}

fn strip_marks(text: &str) -> impl Iterator<Item = char> + '_ {
    text.chars()
        .flat_map(char::to_lowercase)
        .flat_map(expand_ligature)
        .nfd()
        .filter(|character| !is_combining_mark(*character))
        .map(unify_apostrophe)
}

fn expand_ligature(character: char) -> Vec<char> {
    match character {
        'œ' => vec!['o', 'e'],
        'æ' => vec!['a', 'e'],
        other => vec![other],
    }
}

fn unify_apostrophe(character: char) -> char {
    match character {
        '\u{2018}' | '\u{2019}' | '\u{201B}' | '\u{02BC}' | '\u{2032}' | '`' | '\u{00B4}' => '\'',
        other => other,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A normalized utterance with its word tokens.
///
/// Apostrophes separate words for matching purposes, so `l'humain` yields the
/// tokens `l` and `humain`. All lookups are whole-word: `personne` never
/// matches inside `personnes`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Utterance {
    normalized: String,
    words: Vec<String>,
    padded: String,
}

impl Utterance {
    pub fn new(raw: &str) -> Self {
        let normalized = normalize(raw);
        let words = normalized
            .split([' ', '\''])
            .filter(|word| !word.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        let padded = format!(" {} ", words.join(" "));
        Self { normalized, words, padded }
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.normalized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn has_word(&self, word: &str) -> bool {
        self.words.iter().any(|candidate| candidate == word)
    }

    pub fn has_any_word(&self, words: &[&str]) -> bool {
        words.iter().any(|word| self.has_word(word))
    }

    /// Phrase match on word boundaries. `phrase` is written in token form
    /// (`"aujourd hui"`, `"parler a"`).
    pub fn has_phrase(&self, phrase: &str) -> bool {
        self.padded.contains(&format!(" {phrase} "))
    }

    pub fn has_any_phrase(&self, phrases: &[&str]) -> bool {
        phrases.iter().any(|phrase| self.has_phrase(phrase))
    }

    /// True when every word is a run of ASCII digits.
    pub fn is_numeric(&self) -> bool {
        !self.words.is_empty()
            && self.words.iter().all(|word| word.chars().all(|c| c.is_ascii_digit()))
    }
}
