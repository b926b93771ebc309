//! Case- and accent-insensitive text matching.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::Intent;

const AFFIRMATIVE: &[&str] = &["sim", "s", "confirmo", "confirmar", "ok", "yes"];
const NEGATIVE: &[&str] = &["nao", "n", "corrigir", "refazer", "no"];

/// Lowercases and strips diacritics (`"Prescrição"` → `"prescricao"`).
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Folded alphanumeric tokens of `text`.
pub fn tokens(text: &str) -> Vec<String> {
    fold(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Intent selected by `text`, if exactly one intent matches.
pub fn match_intent(text: &str) -> Option<Intent> {
    let folded = fold(text.trim());
    let tokens = tokens(text);

    let mut matches = Intent::all().iter().copied().filter(|intent| {
        folded == intent.menu_number()
            || tokens
                .iter()
                .any(|t| intent.keywords().contains(&t.as_str()))
    });

    match (matches.next(), matches.next()) {
        (Some(intent), None) => Some(intent),
        _ => None,
    }
}

/// Answer to a confirmation question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
    Unclear,
}

/// Classifies the whole text as a confirmation answer.
pub fn confirmation(text: &str) -> Confirmation {
    let folded = fold(text.trim());
    let answer = folded.trim_end_matches(['.', '!']);
    if AFFIRMATIVE.contains(&answer) {
        Confirmation::Yes
    } else if NEGATIVE.contains(&answer) {
        Confirmation::No
    } else {
        Confirmation::Unclear
    }
}
