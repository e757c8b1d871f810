//! Declared schema of the games knowledge graph
//!
//! Query generation may only use what is listed here. The description is
//! rendered into the query-generation prompt and the same lists drive
//! [`crate::graph::CypherValidator`].

use std::fmt::Write as _;

/// Node label with its queryable properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeType {
    /// Label name
    pub label: &'static str,
    /// Properties that may be projected or filtered on
    pub properties: &'static [&'static str],
}

/// Relationship type with its endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipType {
    /// Start node label
    pub from: &'static str,
    /// Relationship type name
    pub name: &'static str,
    /// End node label
    pub to: &'static str,
    /// Relationship properties
    pub properties: &'static [&'static str],
}

/// Versioned schema description
#[derive(Debug, Clone)]
pub struct GraphSchema {
    /// Schema revision, bumped whenever labels or relationships change
    pub version: u32,
    /// Node labels
    pub nodes: Vec<NodeType>,
    /// Relationship types
    pub relationships: Vec<RelationshipType>,
    /// Properties that must never be projected
    pub hidden_properties: Vec<&'static str>,
}

impl GraphSchema {
    /// The schema of the games graph
    pub fn games() -> Self {
        Self {
            version: 1,
            nodes: vec![
                NodeType {
                    label: "Game",
                    properties: &[
                        "title",
                        "app_id",
                        "release_date",
                        "price",
                        "recommendation_count",
                    ],
                },
                NodeType {
                    label: "Description",
                    properties: &["text"],
                },
                NodeType {
                    label: "Tag",
                    properties: &["name"],
                },
                NodeType {
                    label: "Platform",
                    properties: &["name"],
                },
                NodeType {
                    label: "User",
                    properties: &["username"],
                },
                NodeType {
                    label: "Review",
                    properties: &["is_recommended", "helpful", "funny", "date"],
                },
            ],
            relationships: vec![
                RelationshipType {
                    from: "Game",
                    name: "HAS_DESCRIPTION",
                    to: "Description",
                    properties: &[],
                },
                RelationshipType {
                    from: "Game",
                    name: "HAS_TAG",
                    to: "Tag",
                    properties: &[],
                },
                RelationshipType {
                    from: "Game",
                    name: "SUPPORTS",
                    to: "Platform",
                    properties: &[],
                },
                RelationshipType {
                    from: "User",
                    name: "PLAYED",
                    to: "Game",
                    properties: &["total_playtime", "days_per_week", "last_played_date"],
                },
                RelationshipType {
                    from: "User",
                    name: "FRIENDS_WITH",
                    to: "User",
                    properties: &[],
                },
                RelationshipType {
                    from: "User",
                    name: "WROTE_REVIEW",
                    to: "Review",
                    properties: &[],
                },
                RelationshipType {
                    from: "Review",
                    name: "REVIEWS",
                    to: "Game",
                    properties: &[],
                },
            ],
            hidden_properties: vec!["embedding"],
        }
    }

    /// Whether `label` is a declared node label
    pub fn has_label(&self, label: &str) -> bool {
        self.nodes.iter().any(|n| n.label == label)
    }

    /// Whether `name` is a declared relationship type
    pub fn has_relationship(&self, name: &str) -> bool {
        self.relationships.iter().any(|r| r.name == name)
    }

    /// Renders the schema as prompt text
    ///
    /// # Examples
    ///
    /// ```
    /// use nextlevelbot::graph::GraphSchema;
    ///
    /// let text = GraphSchema::games().describe();
    /// assert!(text.contains("(:User)-[:PLAYED]->(:Game)"));
    /// ```
    pub fn describe(&self) -> String {
        let mut out = format!("Schema version {}\nNode properties:\n", self.version);
        for node in &self.nodes {
            let _ = writeln!(out, "- {} {{{}}}", node.label, node.properties.join(", "));
        }
        out.push_str("Relationships:\n");
        for rel in &self.relationships {
            if rel.properties.is_empty() {
                let _ = writeln!(out, "- (:{})-[:{}]->(:{})", rel.from, rel.name, rel.to);
            } else {
                let _ = writeln!(
                    out,
                    "- (:{})-[:{}]->(:{}) {{{}}}",
                    rel.from,
                    rel.name,
                    rel.to,
                    rel.properties.join(", ")
                );
            }
        }
        out
    }
}

impl Default for GraphSchema {
    fn default() -> Self {
        Self::games()
    }
}
