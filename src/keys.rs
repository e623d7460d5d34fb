use core::hash::BuildHasherDefault;
use std::collections::HashSet;
use seahash::SeaHasher;

// fast hashing for sets keyed by element names and region names
pub type KeyHasher = BuildHasherDefault<SeaHasher>;

/// Element names a factory (and its installed sub-workers) responds to.
pub type KeywordSet = HashSet<&'static str, KeyHasher>;

pub fn keyword_set(names: &[&'static str]) -> KeywordSet {
    names.iter().copied().collect()
}

/// Canonical form used for case-insensitive name lookups: trimmed, internal
/// whitespace collapsed to one space, upper case.
pub fn normalize_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}
