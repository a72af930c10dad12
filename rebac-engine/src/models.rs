use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed entity in the relation graph, e.g. `role:editor`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vertex {
    pub namespace: String,
    pub name: String,
}

impl Vertex {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn user(name: &str) -> Self {
        Self::new(crate::service::USER_NAMESPACE, name)
    }

    pub fn role(name: &str) -> Self {
        Self::new(crate::service::ROLE_NAMESPACE, name)
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

/// One directed, labelled relation tuple: `subject --relation--> object`.
///
/// Used both as a stored record and as a query filter. In
/// [`QueryMode::Pattern`] an empty field matches any value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Edge {
    pub subject_ns: String,
    pub subject_name: String,
    pub relation: String,
    pub object_ns: String,
    pub object_name: String,
}

impl Edge {
    pub fn new(subject: &Vertex, relation: &str, object: &Vertex) -> Self {
        Self {
            subject_ns: subject.namespace.clone(),
            subject_name: subject.name.clone(),
            relation: relation.to_string(),
            object_ns: object.namespace.clone(),
            object_name: object.name.clone(),
        }
    }

    /// Pattern filter for every edge leaving `subject`
    pub fn outgoing(subject: &Vertex) -> Self {
        Self {
            subject_ns: subject.namespace.clone(),
            subject_name: subject.name.clone(),
            ..Self::default()
        }
    }

    /// Pattern filter for every edge entering `object`
    pub fn incoming(object: &Vertex) -> Self {
        Self {
            object_ns: object.namespace.clone(),
            object_name: object.name.clone(),
            ..Self::default()
        }
    }

    pub fn subject(&self) -> Vertex {
        Vertex::new(&self.subject_ns, &self.subject_name)
    }

    pub fn object(&self) -> Vertex {
        Vertex::new(&self.object_ns, &self.object_name)
    }

    /// Whether `self` satisfies `filter` under the given mode
    pub fn matches(&self, filter: &Edge, mode: QueryMode) -> bool {
        match mode {
            QueryMode::Exact => self == filter,
            QueryMode::Pattern => {
                field_matches(&filter.subject_ns, &self.subject_ns)
                    && field_matches(&filter.subject_name, &self.subject_name)
                    && field_matches(&filter.relation, &self.relation)
                    && field_matches(&filter.object_ns, &self.object_ns)
                    && field_matches(&filter.object_name, &self.object_name)
            }
        }
    }
}

fn field_matches(wanted: &str, actual: &str) -> bool {
    wanted.is_empty() || wanted == actual
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} --{}--> {}:{}",
            self.subject_ns, self.subject_name, self.relation, self.object_ns, self.object_name
        )
    }
}

/// A reachable vertex paired with the relation of the edge that reached it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Permission {
    pub relation: String,
    #[serde(rename = "ns")]
    pub namespace: String,
    pub name: String,
}

impl Permission {
    pub fn new(relation: &str, namespace: &str, name: &str) -> Self {
        Self {
            relation: relation.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.relation, self.namespace, self.name)
    }
}

/// How a store interprets an [`Edge`] filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryMode {
    /// Empty fields are wildcards
    #[default]
    Pattern,
    /// The filter must identify exactly one logical edge
    Exact,
}

/// Which end of an edge a traversal follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    /// From subject to object
    Forward,
    /// From object back to subject
    Backward,
}

impl Direction {
    pub(crate) fn filter_for(self, vertex: &Vertex) -> Edge {
        match self {
            Direction::Forward => Edge::outgoing(vertex),
            Direction::Backward => Edge::incoming(vertex),
        }
    }

    pub(crate) fn far_end(self, edge: &Edge) -> Vertex {
        match self {
            Direction::Forward => edge.object(),
            Direction::Backward => edge.subject(),
        }
    }
}

/// Kind of write applied by one batch step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Create,
    Delete,
    CreateIfNotExists,
}

/// One step of a batch write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub action: Action,
    pub edge: Edge,
}

impl Operation {
    pub fn new(action: Action, edge: Edge) -> Self {
        Self { action, edge }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_match_treats_empty_fields_as_wildcards() {
        let edge = Edge::new(&Vertex::user("alice"), "member", &Vertex::role("editor"));

        assert!(edge.matches(&Edge::default(), QueryMode::Pattern));
        assert!(edge.matches(&Edge::outgoing(&Vertex::user("alice")), QueryMode::Pattern));
        assert!(!edge.matches(&Edge::outgoing(&Vertex::user("bob")), QueryMode::Pattern));

        let by_relation = Edge {
            relation: "member".to_string(),
            ..Edge::default()
        };
        assert!(edge.matches(&by_relation, QueryMode::Pattern));
    }

    #[test]
    fn test_exact_match_compares_all_fields() {
        let edge = Edge::new(&Vertex::user("alice"), "member", &Vertex::role("editor"));

        assert!(edge.matches(&edge.clone(), QueryMode::Exact));
        assert!(!edge.matches(&Edge::outgoing(&Vertex::user("alice")), QueryMode::Exact));
    }

    #[test]
    fn test_edge_json_shape() {
        let edge = Edge::new(&Vertex::user("alice"), "member", &Vertex::role("editor"));
        let value = serde_json::to_value(&edge).unwrap();

        assert_eq!(value["subjectNs"], "user");
        assert_eq!(value["objectName"], "editor");

        // Missing fields deserialize as wildcards
        let filter: Edge = serde_json::from_str(r#"{"subjectNs":"user"}"#).unwrap();
        assert_eq!(filter.subject_ns, "user");
        assert!(filter.relation.is_empty());
    }

    #[test]
    fn test_permission_serializes_namespace_as_ns() {
        let permission = Permission::new("permission", "doc", "report1");
        let value = serde_json::to_value(&permission).unwrap();

        assert_eq!(value["ns"], "doc");
        assert_eq!(value["relation"], "permission");
    }
}
