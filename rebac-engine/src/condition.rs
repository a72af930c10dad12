//! Stop-expansion and collect predicates applied to visited vertices.
//!
//! Both predicates inspect three attributes of a vertex: its namespace, its
//! name and the relation of the edge that reached it. A match on any one
//! attribute against any entry of the corresponding list is a match for the
//! whole condition.

use crate::models::Vertex;
use serde::{Deserialize, Serialize};

/// Attribute lists a vertex is compared against
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Compare {
    pub namespaces: Vec<String>,
    pub names: Vec<String>,
    pub relations: Vec<String>,
}

impl Compare {
    pub fn namespaces(namespaces: &[&str]) -> Self {
        Self {
            namespaces: to_owned(namespaces),
            ..Self::default()
        }
    }

    pub fn names(names: &[&str]) -> Self {
        Self {
            names: to_owned(names),
            ..Self::default()
        }
    }

    pub fn relations(relations: &[&str]) -> Self {
        Self {
            relations: to_owned(relations),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty() && self.names.is_empty() && self.relations.is_empty()
    }

    /// OR across the three lists, OR within each list
    pub fn matches(&self, vertex: &Vertex, relation: &str) -> bool {
        self.namespaces.iter().any(|ns| *ns == vertex.namespace)
            || self.names.iter().any(|name| *name == vertex.name)
            || self.relations.iter().any(|rel| rel == relation)
    }
}

fn to_owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

/// Governs whether traversal continues past a vertex
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCondition {
    #[serde(rename = "in")]
    pub within: Compare,
}

impl SearchCondition {
    /// Traverse without restriction
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn within(compare: Compare) -> Self {
        Self { within: compare }
    }

    /// An empty condition never stops. Otherwise expansion stops unless one
    /// of the vertex attributes is listed.
    pub fn should_stop(&self, vertex: &Vertex, relation: &str) -> bool {
        if self.within.is_empty() {
            return false;
        }
        !self.within.matches(vertex, relation)
    }
}

/// Governs whether a visited vertex is added to the result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollectCondition {
    /// Collect vertices matching any listed attribute
    In(Compare),
    /// Collect vertices matching none of the listed attributes
    NotIn(Compare),
}

impl Default for CollectCondition {
    fn default() -> Self {
        CollectCondition::In(Compare::default())
    }
}

impl CollectCondition {
    /// Collect every visited vertex
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn should_collect(&self, vertex: &Vertex, relation: &str) -> bool {
        match self {
            CollectCondition::In(compare) => {
                compare.is_empty() || compare.matches(vertex, relation)
            }
            CollectCondition::NotIn(compare) => !compare.matches(vertex, relation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> Vertex {
        Vertex::new("role", "editor")
    }

    #[test]
    fn test_empty_search_condition_never_stops() {
        let cond = SearchCondition::unrestricted();
        assert!(!cond.should_stop(&editor(), "member"));
        assert!(!cond.should_stop(&Vertex::new("doc", "x"), ""));
    }

    #[test]
    fn test_search_condition_continues_on_any_attribute() {
        let by_ns = SearchCondition::within(Compare::namespaces(&["role"]));
        assert!(!by_ns.should_stop(&editor(), "member"));
        assert!(by_ns.should_stop(&Vertex::new("doc", "report1"), "member"));

        let by_relation = SearchCondition::within(Compare::relations(&["parent"]));
        assert!(!by_relation.should_stop(&Vertex::new("doc", "report1"), "parent"));
        assert!(by_relation.should_stop(&Vertex::new("doc", "report1"), "member"));

        let by_name = SearchCondition::within(Compare::names(&["report1"]));
        assert!(!by_name.should_stop(&Vertex::new("doc", "report1"), "member"));
    }

    #[test]
    fn test_empty_collect_condition_collects_everything() {
        let cond = CollectCondition::everything();
        assert!(cond.should_collect(&editor(), "member"));

        let not_in = CollectCondition::NotIn(Compare::default());
        assert!(not_in.should_collect(&editor(), "member"));
    }

    #[test]
    fn test_collect_is_or_of_ors() {
        // Non-matching name and relation entries do not veto a namespace match
        let cond = CollectCondition::In(Compare {
            namespaces: vec!["role".to_string()],
            names: vec!["nobody".to_string()],
            relations: vec!["owner".to_string()],
        });

        assert!(cond.should_collect(&editor(), "member"));
        assert!(!cond.should_collect(&Vertex::new("user", "alice"), "member"));
        assert!(cond.should_collect(&Vertex::new("user", "nobody"), "member"));
        assert!(cond.should_collect(&Vertex::new("doc", "report1"), "owner"));
    }

    #[test]
    fn test_not_in_inverts_collection() {
        let cond = CollectCondition::NotIn(Compare::namespaces(&["role", "user"]));

        assert!(!cond.should_collect(&editor(), "member"));
        assert!(!cond.should_collect(&Vertex::new("user", "alice"), "member"));
        assert!(cond.should_collect(&Vertex::new("doc", "report1"), "permission"));
    }

    #[test]
    fn test_condition_json_shape() {
        let search: SearchCondition =
            serde_json::from_str(r#"{"in":{"namespaces":["role"]}}"#).unwrap();
        assert_eq!(search.within.namespaces, vec!["role".to_string()]);
        assert!(search.within.names.is_empty());

        let collect: CollectCondition =
            serde_json::from_str(r#"{"notIn":{"namespaces":["user"]}}"#).unwrap();
        assert_eq!(collect, CollectCondition::NotIn(Compare::namespaces(&["user"])));

        let empty: SearchCondition = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, SearchCondition::unrestricted());
    }
}
