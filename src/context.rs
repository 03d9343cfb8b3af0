use std::fmt::Display;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Process-wide contextual tags merged into every emitted log line.
///
/// Shared as `Arc<LogContext>` between the code that scopes a unit of work
/// (request handler, job runner) and the [`JsonWriter`](crate::writer::JsonWriter).
/// All operations lock the same mutex, so a snapshot never observes a
/// half-applied mutation. Insertion order is preserved; overwriting a key
/// keeps its original position.
#[derive(Debug, Default)]
pub struct LogContext {
    tags: Mutex<Vec<(String, String)>>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(String, String)>> {
        self.tags.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `value` rendered to text under `key`, silently overwriting any
    /// existing entry. The `Display` bound is the capability callers must
    /// satisfy; values without a text form are rejected at compile time.
    pub fn add(&self, key: impl Into<String>, value: impl Display) {
        let key = key.into();
        let value = value.to_string();
        let mut tags = self.lock();
        match tags.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => tags.push((key, value)),
        }
    }

    /// Snapshot copy of all tags in insertion order. Mutations after the
    /// snapshot is taken do not affect it.
    pub fn get_all(&self) -> Vec<(String, String)> {
        self.lock().clone()
    }

    /// Delete `key` if present; no-op otherwise.
    pub fn remove(&self, key: &str) {
        self.lock().retain(|(k, _)| k != key);
    }

    /// Clear all tags. Call at unit-of-work boundaries so tags never leak
    /// into unrelated subsequent records.
    pub fn reset(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn value_of(tags: &[(String, String)], key: &str) -> Option<String> {
        tags.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    #[test]
    fn add_overwrites_and_keeps_position() {
        let ctx = LogContext::new();
        ctx.add("a", "1");
        ctx.add("b", "2");
        ctx.add("a", "3");

        let tags = ctx.get_all();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0], ("a".to_string(), "3".to_string()));
        assert_eq!(tags[1], ("b".to_string(), "2".to_string()));
    }

    #[test]
    fn add_stringifies_displayable_values() {
        let ctx = LogContext::new();
        ctx.add("uid", 42);
        ctx.add("ratio", 1.5);

        let tags = ctx.get_all();
        assert_eq!(value_of(&tags, "uid"), Some("42".to_string()));
        assert_eq!(value_of(&tags, "ratio"), Some("1.5".to_string()));
    }

    #[test]
    fn remove_is_noop_for_missing_key() {
        let ctx = LogContext::new();
        ctx.add("a", "1");
        ctx.remove("missing");
        ctx.remove("a");
        assert!(ctx.get_all().is_empty());
    }

    #[test]
    fn reset_clears_everything() {
        let ctx = LogContext::new();
        ctx.add("tenant", "acme");
        ctx.add("request", "r-1");
        ctx.reset();
        assert!(ctx.get_all().is_empty());
    }

    #[test]
    fn snapshot_is_isolated_from_later_mutations() {
        let ctx = LogContext::new();
        ctx.add("a", "1");
        let snapshot = ctx.get_all();
        ctx.add("b", "2");
        ctx.reset();
        assert_eq!(snapshot, vec![("a".to_string(), "1".to_string())]);
    }

    #[test]
    fn concurrent_mutation_never_tears_a_snapshot() {
        let ctx = Arc::new(LogContext::new());
        let writer = {
            let ctx = Arc::clone(&ctx);
            std::thread::spawn(move || {
                for i in 0..500 {
                    ctx.add("pair_a", i);
                    ctx.add("pair_b", i);
                }
            })
        };
        for _ in 0..500 {
            let tags = ctx.get_all();
            let a = value_of(&tags, "pair_a");
            let b = value_of(&tags, "pair_b");
            // pair_a is written first, so pair_b may lag by at most one step
            if let (Some(a), Some(b)) = (a, b) {
                let a: i32 = a.parse().unwrap();
                let b: i32 = b.parse().unwrap();
                assert!(a == b || a == b + 1);
            }
        }
        writer.join().unwrap();
    }
}
