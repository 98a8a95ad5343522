//! Thread-local compilation cache for replacement patterns.
//!
//! Agents tend to retry the same needle several times in a row; caching the
//! compiled regex avoids rebuilding the automaton on every call.
//! Cache is capped at 256 entries; it is cleared when full.

use regex::{Regex, RegexBuilder};
use std::cell::RefCell;
use std::collections::HashMap;

const MAX_CACHE_ENTRIES: usize = 256;

thread_local! {
    // Keyed by the final regex source, after literal escaping.
    static PATTERN_CACHE: RefCell<HashMap<String, Regex>> =
        RefCell::new(HashMap::new());
}

/// Get a compiled pattern from cache, or compile and cache it.
///
/// Every pattern is compiled with `.` matching newlines and `^`/`$`
/// matching at line boundaries.
pub fn get_or_compile_pattern(source: &str) -> Result<Regex, regex::Error> {
    PATTERN_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();

        if let Some(re) = cache.get(source) {
            return Ok(re.clone());
        }

        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }

        let compiled = RegexBuilder::new(source)
            .dot_matches_new_line(true)
            .multi_line(true)
            .build()?;
        cache.insert(source.to_string(), compiled.clone());
        Ok(compiled)
    })
}

#[cfg(test)]
fn clear_cache() {
    PATTERN_CACHE.with(|cache| {
        cache.borrow_mut().clear();
    });
}

#[cfg(test)]
fn cache_size() -> usize {
    PATTERN_CACHE.with(|cache| cache.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_once_per_source() {
        clear_cache();
        let first = get_or_compile_pattern("a.c").unwrap();
        let second = get_or_compile_pattern("a.c").unwrap();
        assert_eq!(first.as_str(), second.as_str());
        assert_eq!(cache_size(), 1);
    }

    #[test]
    fn flags_are_applied() {
        let re = get_or_compile_pattern("^b.c$").unwrap();
        assert!(re.is_match("a\nb\nc\nd"));
    }

    #[test]
    fn invalid_patterns_are_not_cached() {
        clear_cache();
        assert!(get_or_compile_pattern("(unclosed").is_err());
        assert_eq!(cache_size(), 0);
    }
}
