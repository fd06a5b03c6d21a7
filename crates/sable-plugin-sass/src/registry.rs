//! Ordered registry of compiled CSS fragments
//!
//! Transform hooks run as independently scheduled async tasks, so their
//! completion order is non-deterministic. The registry pins each module's
//! position at first sight of its id and refreshes content in place, which
//! keeps the aggregated stylesheet deterministic across builds.

use rustc_hash::FxHashMap;

/// A single compiled stylesheet fragment, keyed by module id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleEntry {
    /// Module id (the source file path as seen by the bundler)
    pub id: String,
    /// Compiled CSS text
    pub content: String,
}

/// Ordered, deduplicated-by-id collection of compiled styles.
///
/// Entries keep the position they were assigned when their id was first
/// seen; recompiling the same module (e.g. on a rebuild with the same
/// plugin instance) overwrites content without moving the entry.
#[derive(Debug, Default)]
pub struct StyleRegistry {
    entries: Vec<StyleEntry>,
    index: FxHashMap<String, usize>,
}

impl StyleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin a position for `id` without content.
    ///
    /// Called before any suspension point in the per-file step so that
    /// position reflects compile order, not post-processing completion
    /// order. No-op for ids already in the registry.
    pub fn reserve(&mut self, id: &str) {
        if self.index.contains_key(id) {
            return;
        }
        self.index.insert(id.to_string(), self.entries.len());
        self.entries.push(StyleEntry {
            id: id.to_string(),
            content: String::new(),
        });
    }

    /// Store compiled CSS for `id`, replacing in place if already present.
    pub fn record(&mut self, id: &str, content: String) {
        match self.index.get(id) {
            Some(&position) => self.entries[position].content = content,
            None => {
                self.index.insert(id.to_string(), self.entries.len());
                self.entries.push(StyleEntry {
                    id: id.to_string(),
                    content,
                });
            }
        }
    }

    /// Concatenate all recorded CSS in first-seen order, no separator.
    pub fn aggregate(&self) -> String {
        self.entries
            .iter()
            .map(|entry| entry.content.as_str())
            .collect()
    }

    /// Clone the current entries, preserving order.
    pub fn snapshot(&self) -> Vec<StyleEntry> {
        self.entries.clone()
    }

    /// Number of registered entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no styles have been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_first_seen_order() {
        let mut registry = StyleRegistry::new();
        registry.record("a.scss", ".a{color:red}".to_string());
        registry.record("b.scss", ".b{color:blue}".to_string());

        assert_eq!(registry.aggregate(), ".a{color:red}.b{color:blue}");
    }

    #[test]
    fn rerecording_updates_in_place() {
        let mut registry = StyleRegistry::new();
        registry.record("a.scss", ".a{color:red}".to_string());
        registry.record("b.scss", ".b{color:blue}".to_string());
        registry.record("a.scss", ".a{color:green}".to_string());

        assert_eq!(registry.aggregate(), ".a{color:green}.b{color:blue}");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn reserved_position_survives_out_of_order_completion() {
        let mut registry = StyleRegistry::new();
        // a.scss is seen first, but its content arrives last
        registry.reserve("a.scss");
        registry.reserve("b.scss");
        registry.record("b.scss", ".b{color:blue}".to_string());
        registry.record("a.scss", ".a{color:red}".to_string());

        assert_eq!(registry.aggregate(), ".a{color:red}.b{color:blue}");
    }

    #[test]
    fn reserve_is_idempotent() {
        let mut registry = StyleRegistry::new();
        registry.reserve("a.scss");
        registry.reserve("a.scss");
        registry.record("a.scss", ".a{}".to_string());

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn aggregate_is_repeatable() {
        let mut registry = StyleRegistry::new();
        registry.record("a.scss", ".a{}".to_string());

        assert_eq!(registry.aggregate(), registry.aggregate());
    }

    #[test]
    fn empty_registry() {
        let registry = StyleRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.aggregate(), "");
        assert!(registry.snapshot().is_empty());
    }
}
