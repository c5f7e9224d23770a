//! Full-name comparison across data sources.
//!
//! The ledger, the manager directory, and the employee roster each spell the
//! same person differently: word order flips, casing varies, stray
//! whitespace creeps in. Names are therefore compared as token sets, never
//! as literal strings.

use std::collections::BTreeSet;

fn tokens(name: &str) -> BTreeSet<String> {
    name.split_whitespace().map(str::to_lowercase).collect()
}

/// Canonical key for grouping by person: lowercased tokens, sorted, joined.
pub fn name_key(name: &str) -> String {
    tokens(name).into_iter().collect::<Vec<_>>().join(" ")
}

/// True when both names resolve to the same non-empty token set.
pub fn same_person(a: &str, b: &str) -> bool {
    let left = tokens(a);
    !left.is_empty() && left == tokens(b)
}
