//! URL-safe slugs derived from tour names.

use deunicode::deunicode;

/// Lowercase, URL-safe form of `name`.
///
/// Non-ASCII text is transliterated first (`Café` -> `cafe`). ASCII letters
/// and digits are kept (lowercased); runs of whitespace, `-` and `_` collapse
/// into a single `-`; everything else is dropped. The result never starts or
/// ends with `-`.
pub fn slugify(name: &str) -> String {
    let ascii = deunicode(name);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_separator = false;

    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_separator = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("The Forest Hiker"), "the-forest-hiker");
        assert_eq!(slugify("  The   Sea  Explorer "), "the-sea-explorer");
        assert_eq!(slugify("The Snow-Adventurer!"), "the-snow-adventurer");
        assert_eq!(slugify("Tour #1: Alps"), "tour-1-alps");
    }

    #[test]
    fn accented_letters_are_transliterated() {
        assert_eq!(slugify("Café Tour"), "cafe-tour");
        assert_eq!(slugify("Zürich Alpenglühen"), "zurich-alpengluhen");
    }

    #[test]
    fn empty_and_punctuation_only_names() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!! ???"), "");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            .. ProptestConfig::default()
        })]

        #[test]
        fn slug_is_url_safe(name in ".{0,60}") {
            let slug = slugify(&name);
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
        }

        #[test]
        fn slug_is_stable_under_reslugging(name in ".{0,60}") {
            let once = slugify(&name);
            prop_assert_eq!(slugify(&once), once.clone());
        }

        #[test]
        fn whitespace_runs_do_not_change_the_slug(words in proptest::collection::vec("[A-Za-z0-9]{1,8}", 1..6)) {
            let single = words.join(" ");
            let spread = words.join(" \t  ");
            prop_assert_eq!(slugify(&single), slugify(&spread));
            prop_assert_eq!(slugify(&single.to_uppercase()), slugify(&single));
        }
    }
}
