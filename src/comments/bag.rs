use crate::comments::record::CommentRecord;
use indexmap::IndexMap;

/// Deduplicating accumulator for the comments of one page visit
///
/// Keyed by record id with last-write-wins semantics. Iteration follows the
/// order in which each id was first seen.
#[derive(Debug, Clone, Default)]
pub struct CommentBag {
    records: IndexMap<String, CommentRecord>,
}

impl CommentBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite by id; returns true when the id was new
    pub fn insert(&mut self, record: CommentRecord) -> bool {
        self.records.insert(record.id.clone(), record).is_none()
    }

    pub fn get(&self, id: &str) -> Option<&CommentRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommentRecord> {
        self.records.values()
    }

    pub fn into_records(self) -> Vec<CommentRecord> {
        self.records.into_values().collect()
    }
}

impl Extend<CommentRecord> for CommentBag {
    fn extend<I: IntoIterator<Item = CommentRecord>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::normalize::normalize;
    use serde_json::json;

    #[test]
    fn test_last_write_wins() {
        let mut bag = CommentBag::new();
        let first = normalize(&json!({ "cid": "1", "text": "hello", "digg_count": 1 })).unwrap();
        let second = normalize(&json!({ "cid": "1", "text": "hello", "digg_count": 40, "user": { "unique_id": "h" } })).unwrap();

        assert!(bag.insert(first));
        assert!(!bag.insert(second.clone()));

        assert_eq!(bag.len(), 1);
        assert_eq!(bag.get("1"), Some(&second));
    }

    #[test]
    fn test_one_record_per_id_equal_to_last_insert() {
        let raws = vec![
            json!({ "cid": "a", "text": "one" }),
            json!({ "cid": "b", "text": "two" }),
            json!({ "cid": "a", "text": "one edited" }),
            json!({ "text": "anon" }),
            json!({ "cid": "b", "text": "two", "digg_count": 9 }),
            json!({ "text": "anon", "digg_count": 2 }),
        ];

        let mut bag = CommentBag::new();
        bag.extend(raws.iter().filter_map(normalize));

        assert_eq!(bag.len(), 3);
        for id in ["a", "b", "_anon"] {
            let last = raws.iter().filter_map(normalize).filter(|r| r.id == id).last().unwrap();
            assert_eq!(bag.get(id), Some(&last));
        }
    }

    #[test]
    fn test_iteration_keeps_first_seen_order() {
        let mut bag = CommentBag::new();
        bag.extend(["x", "y", "x", "z"].iter().filter_map(|id| normalize(&json!({ "cid": id, "text": "t" }))));

        let ids: Vec<_> = bag.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
        assert_eq!(bag.into_records().len(), 3);
    }
}
