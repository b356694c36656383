// Integration tests for the tile symbol sets and level descriptors.
// These tests are native-friendly and avoid wasm/browser APIs.

use std::collections::HashSet;

use memo_page::board::{EASY_SYMBOLS, HARD_SYMBOLS};
use memo_page::Level;

#[test]
fn symbol_sets_have_no_duplicates() {
    for (name, symbols) in [("easy", &EASY_SYMBOLS[..]), ("hard", &HARD_SYMBOLS[..])] {
        let mut seen = HashSet::new();
        for s in symbols {
            assert!(!s.trim().is_empty(), "blank symbol in {name} set");
            assert!(seen.insert(*s), "duplicate symbol '{s}' in {name} set");
        }
    }
}

#[test]
fn level_sizes_match_the_page() {
    assert_eq!(EASY_SYMBOLS.len(), 6);
    assert_eq!(HARD_SYMBOLS.len(), 12);
    assert_eq!(Level::Easy.desc().symbols, &EASY_SYMBOLS[..]);
    assert_eq!(Level::Hard.desc().symbols, &HARD_SYMBOLS[..]);
}

#[test]
fn storage_keys_are_distinct() {
    let keys: HashSet<&str> = Level::ALL.iter().map(|l| l.desc().storage_key).collect();
    assert_eq!(keys.len(), Level::ALL.len());
    assert_eq!(Level::Easy.desc().storage_key, "bestEasy");
    assert_eq!(Level::Hard.desc().storage_key, "bestHard");
}

#[test]
fn level_names_parse_back() {
    for level in Level::ALL {
        assert_eq!(Level::parse(level.desc().name), level);
        assert!(!level.desc().title.is_empty());
    }
}
