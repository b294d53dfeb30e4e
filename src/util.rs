use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Placeholder id for a free-text search term: lowercase words joined by `_`.
pub fn normalized_id(term: &str) -> String {
    term.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Greedy word wrap on character counts. Words longer than `width` keep their own line.
pub fn wordwrap(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

pub fn unwrap_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_search_terms() {
        assert_eq!(normalized_id("  Queen   Victoria "), "queen_victoria");
        assert_eq!(normalized_id("Zeus"), "zeus");
    }

    #[test]
    fn wraps_and_unwraps_labels() {
        let wrapped = wordwrap("Victoria, Princess Royal of Prussia", 15);
        assert_eq!(wrapped, "Victoria,\nPrincess Royal\nof Prussia");
        assert_eq!(unwrap_label(&wrapped), "Victoria, Princess Royal of Prussia");
        assert_eq!(wordwrap("Supercalifragilistic", 5), "Supercalifragilistic");
    }

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let (x, y) = stable_pair("Q42");
        assert_eq!((x, y), stable_pair("Q42"));
        assert!((-1.0..=1.0).contains(&x));
        assert!((-1.0..=1.0).contains(&y));
    }
}
