//! Roster-driven name extraction.
//!
//! A roster name matches when its full name appears as a contiguous word
//! sequence in the question, or when its first or last name appears as a
//! whole word. Matching is case-insensitive and exact: near-misses never match.

use std::collections::BTreeSet;

/// Shorter name parts are ignored as standalone tokens (initials, "Li" stays in).
const MIN_TOKEN_CHARS: usize = 2;

/// Returns every roster member referenced by `question`.
///
/// The empty set is a normal outcome for general questions.
pub fn extract(question: &str, roster: &BTreeSet<String>) -> BTreeSet<String> {
    let words = tokenize(question);
    if words.is_empty() {
        return BTreeSet::new();
    }
    roster
        .iter()
        .filter(|name| mentions(&words, name))
        .cloned()
        .collect()
}

fn mentions(words: &[String], name: &str) -> bool {
    let parts = tokenize(name);
    let (Some(first), Some(last)) = (parts.first(), parts.last()) else {
        return false;
    };

    if words.windows(parts.len()).any(|w| w == parts.as_slice()) {
        return true;
    }

    [first, last]
        .into_iter()
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
        .any(|t| words.contains(t))
}

/// Lowercased words. Apostrophes split (`Layla's` → `layla`, `s`), inner
/// hyphens are kept so `El-Tahir` stays one word.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .map(|w| w.trim_matches('-'))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        roster(names)
    }

    #[test]
    fn first_name_possessive_matches() {
        let r = roster(&["Layla", "Vikram Desai", "Hans Müller"]);
        assert_eq!(
            extract("When is Layla planning her trip to London?", &r),
            set(&["Layla"])
        );
        assert_eq!(extract("What are Layla's plans?", &r), set(&["Layla"]));
    }

    #[test]
    fn full_and_last_names_match_case_insensitively() {
        let r = roster(&["Vikram Desai", "Armand Dupont", "Hans Müller"]);
        assert_eq!(
            extract("How many cars does VIKRAM DESAI have?", &r),
            set(&["Vikram Desai"])
        );
        assert_eq!(extract("Where did dupont travel?", &r), set(&["Armand Dupont"]));
        assert_eq!(extract("What does müller like?", &r), set(&["Hans Müller"]));
    }

    #[test]
    fn every_full_name_in_question_is_found() {
        let r = roster(&["Layla Kawaguchi", "Vikram Desai", "Fatima El-Tahir", "Lily O'Sullivan"]);
        for name in &r {
            let q = format!("Tell me about {name} and their bookings");
            assert!(extract(&q, &r).contains(name), "missed {name}");
        }
    }

    #[test]
    fn shared_first_names_include_everyone() {
        let r = roster(&["Sophia Rossi", "Sophia Al-Farsi", "Thiago Monteiro"]);
        assert_eq!(
            extract("What is Sophia's phone number?", &r),
            set(&["Sophia Al-Farsi", "Sophia Rossi"])
        );
    }

    #[test]
    fn unknown_or_partial_names_do_not_match() {
        let r = roster(&["Amina Van Den Berg", "Lily O'Sullivan", "Lorenzo Cavalli"]);
        assert!(extract("What are Amira's favorite restaurants?", &r).is_empty());
        assert!(extract("Is Lorenz coming?", &r).is_empty());
        assert!(extract("Lilyanne wants a table", &r).is_empty());
        assert!(extract("", &r).is_empty());
        assert!(extract("Which restaurants are popular?", &r).is_empty());
    }

    #[test]
    fn hyphenated_surnames_are_single_words() {
        let r = roster(&["Fatima El-Tahir"]);
        assert_eq!(extract("Did El-Tahir book a table?", &r), set(&["Fatima El-Tahir"]));
        assert!(extract("el tahir", &r).is_empty());
    }
}
