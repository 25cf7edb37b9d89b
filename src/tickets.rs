//! Ticket-set fingerprinting and wedge-order shuffling.
//!
//! The fingerprint covers the sorted multiset, so two uploads holding the same
//! names with the same counts compare equal regardless of order. Wedge order is
//! only re-randomized when the fingerprint changes.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Hex SHA-256 over the sorted tickets, each terminated by a NUL byte
pub fn fingerprint(tickets: &[String]) -> String {
    let mut sorted: Vec<&str> = tickets.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    for ticket in sorted {
        hasher.update(ticket.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// True when there is no stored fingerprint or it differs from the incoming one
pub fn should_reshuffle(stored: Option<&str>, incoming: &str) -> bool {
    stored != Some(incoming)
}

/// In-place Fisher-Yates shuffle
pub fn shuffle_with<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Shuffle using the thread-local CSPRNG
pub fn shuffle<T>(items: &mut [T]) {
    shuffle_with(items, &mut rand::rng());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn tickets(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fingerprint_ignores_order() {
        let a = fingerprint(&tickets(&["A", "A", "B", "C"]));
        let b = fingerprint(&tickets(&["C", "A", "B", "A"]));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_sensitive_to_counts_and_names() {
        let base = fingerprint(&tickets(&["A", "A", "B"]));
        assert_ne!(base, fingerprint(&tickets(&["A", "B"])));
        assert_ne!(base, fingerprint(&tickets(&["A", "B", "B"])));
        assert_ne!(base, fingerprint(&tickets(&["A", "A", "B", "D"])));
        assert_ne!(base, fingerprint(&tickets(&["A", "A", "b"])));
    }

    #[test]
    fn test_fingerprint_separator_is_unambiguous() {
        assert_ne!(
            fingerprint(&tickets(&["A|B"])),
            fingerprint(&tickets(&["A", "B"]))
        );
        assert_ne!(fingerprint(&tickets(&["AB"])), fingerprint(&tickets(&["A", "B"])));
    }

    #[test]
    fn test_empty_fingerprint_is_stable() {
        assert_eq!(fingerprint(&[]), fingerprint(&[]));
        assert_ne!(fingerprint(&[]), fingerprint(&tickets(&[""])));
    }

    #[test]
    fn test_should_reshuffle() {
        let fp = fingerprint(&tickets(&["A"]));
        assert!(should_reshuffle(None, &fp));
        assert!(!should_reshuffle(Some(fp.as_str()), &fp));
        assert!(should_reshuffle(Some("other"), &fp));
    }

    #[test]
    fn test_shuffle_preserves_multiset() {
        let original = tickets(&["A", "A", "B", "C", "C", "C"]);
        let mut shuffled = original.clone();
        shuffle(&mut shuffled);
        assert_eq!(fingerprint(&original), fingerprint(&shuffled));
        assert_eq!(shuffled.len(), original.len());
    }

    #[test]
    fn test_shuffle_handles_tiny_inputs() {
        let mut empty: Vec<String> = vec![];
        shuffle(&mut empty);
        assert!(empty.is_empty());

        let mut one = tickets(&["A"]);
        shuffle(&mut one);
        assert_eq!(one, tickets(&["A"]));
    }

    #[test]
    fn test_shuffle_positions_are_uniform() {
        let names = ["A", "B", "C", "D"];
        let trials = 20_000;
        let mut counts: HashMap<(String, usize), u32> = HashMap::new();

        for _ in 0..trials {
            let mut t = tickets(&names);
            shuffle(&mut t);
            for (pos, name) in t.into_iter().enumerate() {
                *counts.entry((name, pos)).or_insert(0) += 1;
            }
        }

        let expected = trials as f64 / names.len() as f64;
        for name in names {
            for pos in 0..names.len() {
                let seen = *counts.get(&(name.to_string(), pos)).unwrap_or(&0) as f64;
                assert!(
                    (seen - expected).abs() < expected * 0.1,
                    "{} at {} seen {} times, expected ~{}",
                    name,
                    pos,
                    seen,
                    expected
                );
            }
        }
    }
}
