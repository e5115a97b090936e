/*!
 * Character-name heuristics.
 *
 * Three independent detectors run over each segment: a `Name:` dialogue
 * prefix, parenthetical annotations, and names next to speech or motion
 * verbs. Their union, minus setting words and pronouns, is the result.
 */

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::keywords::{NON_CHARACTER_WORDS, PRONOUNS};

static PREFIX_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z\p{Han}0-9\s]+$").expect("Invalid prefix regex")
});

static PARENTHETICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\(（]([^)）]+)[\)）]").expect("Invalid parenthetical regex")
});

static VERB_ADJACENT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^([A-Za-z\p{Han}]{2,4})(?:走|来|去|说|问|答|看|听|想|做|拿|给)",
        r"([A-Za-z\p{Han}]{2,4})(?:对|向|跟|和)([A-Za-z\p{Han}]{2,4})(?:说|问|答)",
        r"([A-Za-z\p{Han}]{2,4})(?:告诉|询问|回答)([A-Za-z\p{Han}]{2,4})",
        r"\b([A-Z][a-z]{1,15})\s+(?:walked|walks|said|says|asked|asks|answered|looked|went|came|told|replied|shouted|whispered)\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("Invalid name pattern"))
    .collect()
});

/// Collect character-name candidates from segment texts
pub fn extract_characters<'a, I>(texts: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut found = BTreeSet::new();

    for text in texts {
        if let Some(name) = dialogue_prefix(text) {
            found.insert(name);
        }
        found.extend(parenthetical_names(text));
        found.extend(verb_adjacent_names(text));
    }

    found.retain(|name| !is_setting_or_pronoun(name));
    found
}

fn dialogue_prefix(text: &str) -> Option<String> {
    let separator = if text.contains(':') { ':' } else { '：' };
    let (head, _) = text.split_once(separator)?;
    let candidate = head.trim();
    let len = candidate.chars().count();

    if !(1..=10).contains(&len)
        || !PREFIX_SHAPE.is_match(candidate)
        || candidate.chars().all(|c| c.is_ascii_digit() || c.is_whitespace())
        || !starts_like_name(candidate)
    {
        return None;
    }

    Some(candidate.to_string())
}

fn parenthetical_names(text: &str) -> Vec<String> {
    PARENTHETICAL
        .captures_iter(text)
        .map(|c| c[1].trim().to_string())
        .filter(|candidate| {
            let len = candidate.chars().count();
            (1..=8).contains(&len)
                && !candidate.chars().any(|c| c.is_numeric())
                && starts_like_name(candidate)
        })
        .collect()
}

fn verb_adjacent_names(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    for pattern in VERB_ADJACENT.iter() {
        for captures in pattern.captures_iter(text) {
            names.extend(
                captures
                    .iter()
                    .skip(1)
                    .flatten()
                    .map(|m| m.as_str().to_string())
                    .filter(|name| name.chars().count() >= 2),
            );
        }
    }
    names
}

// ASCII candidates must be capitalized; "(laughs)" and "at 10:30" are not names.
fn starts_like_name(candidate: &str) -> bool {
    match candidate.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => c.is_ascii_uppercase(),
        Some(_) => true,
        None => false,
    }
}

fn is_setting_or_pronoun(name: &str) -> bool {
    let lower = name.to_lowercase();
    if PRONOUNS.contains(&lower.as_str()) {
        return true;
    }
    NON_CHARACTER_WORDS.iter().any(|word| {
        if word.is_ascii() {
            lower.split_whitespace().any(|part| part == *word)
        } else {
            name.contains(word)
        }
    })
}
