//! Many-to-many join state.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::storage::RecordKey;

/// Build the join key naming one many-to-many relation.
pub fn join_key(owner_table: &str, target_table: &str) -> String {
    format!("{owner_table}_{target_table}")
}

/// Owner key -> ordered target keys for a single join.
pub type JoinMap = BTreeMap<RecordKey, Vec<RecordKey>>;

/// Map from join key to the join's owner/target key lists.
///
/// Records reference each other only through keys, so the graph holds no
/// pointers into the record store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RelationGraph {
    joins: HashMap<String, JoinMap>,
}

impl RelationGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a join, leaving any existing entries in place.
    pub fn declare(&mut self, owner_table: &str, target_table: &str) {
        self.joins
            .entry(join_key(owner_table, target_table))
            .or_default();
    }

    /// Check if a join has been declared.
    pub fn contains_join(&self, owner_table: &str, target_table: &str) -> bool {
        self.joins
            .contains_key(&join_key(owner_table, target_table))
    }

    /// Set the target keys for an owner, replacing any earlier list.
    ///
    /// Returns `false` if the join was never declared.
    pub fn assign(
        &mut self,
        owner_table: &str,
        target_table: &str,
        owner: RecordKey,
        targets: Vec<RecordKey>,
    ) -> bool {
        match self.joins.get_mut(&join_key(owner_table, target_table)) {
            Some(join) => {
                join.insert(owner, targets);
                true
            }
            None => false,
        }
    }

    /// Drop the entry for an owner.
    pub fn clear(&mut self, owner_table: &str, target_table: &str, owner: &RecordKey) {
        if let Some(join) = self.joins.get_mut(&join_key(owner_table, target_table)) {
            join.remove(owner);
        }
    }

    /// Target keys for an owner. `None` if the join is undeclared.
    pub fn targets(
        &self,
        owner_table: &str,
        target_table: &str,
        owner: &RecordKey,
    ) -> Option<&[RecordKey]> {
        let join = self.joins.get(&join_key(owner_table, target_table))?;
        Some(join.get(owner).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Get a whole join by its key.
    pub fn join(&self, key: &str) -> Option<&JoinMap> {
        self.joins.get(key)
    }

    /// Declared join keys, sorted.
    pub fn join_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.joins.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_key_format() {
        assert_eq!(join_key("Group", "User"), "Group_User");
    }

    #[test]
    fn test_assign_replaces() {
        let mut graph = RelationGraph::new();
        graph.declare("Group", "User");

        let owner = RecordKey::Int(1);
        assert!(graph.assign(
            "Group",
            "User",
            owner.clone(),
            vec![RecordKey::Int(1), RecordKey::Int(2)]
        ));
        assert!(graph.assign("Group", "User", owner.clone(), vec![RecordKey::Int(1)]));

        assert_eq!(
            graph.targets("Group", "User", &owner),
            Some(&[RecordKey::Int(1)][..])
        );
    }

    #[test]
    fn test_undeclared_join() {
        let mut graph = RelationGraph::new();
        assert!(!graph.assign("A", "B", RecordKey::Int(1), vec![]));
        assert_eq!(graph.targets("A", "B", &RecordKey::Int(1)), None);
    }

    #[test]
    fn test_missing_owner_is_empty() {
        let mut graph = RelationGraph::new();
        graph.declare("Post", "Tag");
        assert_eq!(graph.targets("Post", "Tag", &RecordKey::Int(9)), Some(&[][..]));

        graph.assign("Post", "Tag", RecordKey::Int(9), vec![RecordKey::Int(3)]);
        graph.clear("Post", "Tag", &RecordKey::Int(9));
        assert_eq!(graph.targets("Post", "Tag", &RecordKey::Int(9)), Some(&[][..]));
        assert_eq!(graph.join_keys(), vec!["Post_Tag"]);
    }
}
