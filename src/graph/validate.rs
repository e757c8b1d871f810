//! Pre-execution validation of generated Cypher
//!
//! Generated queries are checked against the declared schema before they
//! reach the database. A rejected query is reported as
//! `NextLevelError::QueryValidation` so the caller can turn it into a failed
//! observation.

use super::GraphSchema;
use crate::error::{NextLevelError, Result};
use regex::Regex;

/// Functions that return a scalar when applied to a node
const NODE_SCALAR_FUNCTIONS: &[&str] =
    &["count", "id", "elementid", "labels", "keys", "exists", "size"];

/// Validates Cypher text against the graph schema
pub struct CypherValidator {
    schema: GraphSchema,
    write_clauses: Vec<(&'static str, Regex)>,
    node_label: Regex,
    node_variable: Regex,
    relationship_type: Regex,
    property_access: Regex,
    return_clause: Regex,
    with_keyword: Regex,
    clause_keyword: Regex,
    function_call: Regex,
    all_properties: Regex,
    string_literal: Regex,
}

impl CypherValidator {
    /// Creates a validator for `schema`
    pub fn new(schema: GraphSchema) -> Self {
        let write_patterns = [
            ("CREATE", r"(?i)\bCREATE\b"),
            ("MERGE", r"(?i)\bMERGE\b"),
            ("DELETE", r"(?i)\bDELETE\b"),
            ("SET", r"(?i)\bSET\b"),
            ("REMOVE", r"(?i)\bREMOVE\b"),
            ("DROP", r"(?i)\bDROP\b"),
            ("LOAD CSV", r"(?i)\bLOAD\s+CSV\b"),
            ("CALL apoc", r"(?i)\bCALL\s+apoc\."),
        ];

        let write_clauses = write_patterns
            .into_iter()
            .map(|(name, p)| (name, Regex::new(p).expect("Invalid regex pattern")))
            .collect();

        Self {
            schema,
            write_clauses,
            node_label: Regex::new(r"(?:^|[^\w.])\(\s*(?:[A-Za-z_]\w*)?\s*((?::\s*[A-Za-z_]\w*\s*)+)")
                .expect("Invalid regex pattern"),
            node_variable: Regex::new(r"(?:^|[^\w.])\(\s*([A-Za-z_]\w*)\s*[:{)]")
                .expect("Invalid regex pattern"),
            relationship_type: Regex::new(r"\[\s*(?:[A-Za-z_]\w*)?\s*:\s*([A-Za-z_][\w|:\s]*)")
                .expect("Invalid regex pattern"),
            property_access: Regex::new(r"\.\s*`?([A-Za-z_]\w*)`?")
                .expect("Invalid regex pattern"),
            return_clause: Regex::new(r"(?is)\bRETURN\b(.*?)(?:\bORDER\s+BY\b|\bSKIP\b|\bLIMIT\b|\bUNION\b|$)")
                .expect("Invalid regex pattern"),
            with_keyword: Regex::new(r"(?i)\bWITH\b").expect("Invalid regex pattern"),
            clause_keyword: Regex::new(
                r"(?i)\b(?:MATCH|OPTIONAL|WHERE|RETURN|UNWIND|WITH|CALL|ORDER\s+BY|SKIP|LIMIT|UNION)\b",
            )
            .expect("Invalid regex pattern"),
            function_call: Regex::new(r"(?s)^([A-Za-z_]\w*)\s*\((.*)\)$")
                .expect("Invalid regex pattern"),
            all_properties: Regex::new(r"\{[^{}]*\.\s*\*").expect("Invalid regex pattern"),
            string_literal: Regex::new(r#""[^"]*"|'[^']*'"#).expect("Invalid regex pattern"),
        }
    }

    /// The schema this validator checks against
    pub fn schema(&self) -> &GraphSchema {
        &self.schema
    }

    /// Rejects queries that would modify the graph
    ///
    /// # Errors
    ///
    /// Returns `NextLevelError::QueryValidation` naming the offending clause
    pub fn check_read_only(&self, query: &str) -> Result<()> {
        let code = self.strip_literals(query);
        for (name, pattern) in &self.write_clauses {
            if pattern.is_match(&code) {
                return Err(NextLevelError::QueryValidation(format!(
                    "write clause {} is not allowed",
                    name
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Runs every check: read-only, declared labels and relationship types,
    /// no embedding projection, no bare node returns
    ///
    /// # Examples
    ///
    /// ```
    /// use nextlevelbot::graph::{CypherValidator, GraphSchema};
    ///
    /// let validator = CypherValidator::new(GraphSchema::games());
    /// assert!(validator
    ///     .validate("MATCH (g:Game)-[:HAS_TAG]->(t:Tag {name: 'RPG'}) RETURN g.title")
    ///     .is_ok());
    /// assert!(validator.validate("MATCH (m:Movie) RETURN m.title").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `NextLevelError::QueryValidation` describing the first failure
    pub fn validate(&self, query: &str) -> Result<()> {
        if query.trim().is_empty() {
            return Err(NextLevelError::QueryValidation("query is empty".to_string()).into());
        }

        self.check_read_only(query)?;

        let code = self.strip_literals(query);

        for caps in self.node_label.captures_iter(&code) {
            for label in caps[1].split(':').map(str::trim).filter(|l| !l.is_empty()) {
                if !self.schema.has_label(label) {
                    return Err(NextLevelError::QueryValidation(format!(
                        "unknown node label :{}",
                        label
                    ))
                    .into());
                }
            }
        }

        for caps in self.relationship_type.captures_iter(&code) {
            for rel in caps[1]
                .split('|')
                .map(|r| r.trim().trim_start_matches(':').trim())
                .filter(|r| !r.is_empty())
            {
                if !self.schema.has_relationship(rel) {
                    return Err(NextLevelError::QueryValidation(format!(
                        "unknown relationship type :{}",
                        rel
                    ))
                    .into());
                }
            }
        }

        for caps in self.property_access.captures_iter(&code) {
            if self.schema.hidden_properties.iter().any(|p| *p == &caps[1]) {
                return Err(NextLevelError::QueryValidation(format!(
                    "property {} must not be projected",
                    &caps[1]
                ))
                .into());
            }
        }

        self.check_projections(&code)
    }

    fn check_projections(&self, code: &str) -> Result<()> {
        if self.all_properties.is_match(code) {
            return Err(NextLevelError::QueryValidation(
                "map projection {.*} exposes every property; list the properties instead".to_string(),
            )
            .into());
        }

        let node_vars = self.node_variables(code);

        for caps in self.return_clause.captures_iter(code) {
            for item in split_top_level(&caps[1]) {
                let (expr, _) = split_alias(item);
                let expr = strip_distinct(expr);

                if expr == "*" {
                    return Err(NextLevelError::QueryValidation(
                        "RETURN * projects whole nodes".to_string(),
                    )
                    .into());
                }

                if self.exposes_node(expr, &node_vars) {
                    return Err(NextLevelError::QueryValidation(format!(
                        "returning whole node {} is not allowed; project properties instead",
                        expr
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }

    /// Node variables bound in patterns, plus `WITH` aliases that carry nodes
    fn node_variables(&self, code: &str) -> Vec<String> {
        let mut vars: Vec<String> = self
            .node_variable
            .captures_iter(code)
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect();

        for keyword in self.with_keyword.find_iter(code) {
            let rest = &code[keyword.end()..];
            let end = self.clause_keyword.find(rest).map_or(rest.len(), |k| k.start());
            for item in split_top_level(&rest[..end]) {
                if let (expr, Some(alias)) = split_alias(item) {
                    if self.exposes_node(strip_distinct(expr), &vars) {
                        vars.push(alias.to_string());
                    }
                }
            }
        }

        vars
    }

    /// Whether `expr` evaluates to a node, a list of nodes or all of a
    /// node's properties
    fn exposes_node(&self, expr: &str, node_vars: &[String]) -> bool {
        if node_vars.iter().any(|v| v == expr) {
            return true;
        }
        match self.function_call.captures(expr) {
            Some(caps) => {
                let function = caps[1].to_ascii_lowercase();
                !NODE_SCALAR_FUNCTIONS.contains(&function.as_str())
                    && self.exposes_node(strip_distinct(caps[2].trim()), node_vars)
            }
            None => false,
        }
    }

    fn strip_literals(&self, query: &str) -> String {
        self.string_literal.replace_all(query, "''").into_owned()
    }
}

impl Default for CypherValidator {
    fn default() -> Self {
        Self::new(GraphSchema::games())
    }
}

/// Splits a projection list on commas outside brackets
fn split_top_level(list: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in list.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                items.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(list[start..].trim());
    items.into_iter().filter(|s| !s.is_empty()).collect()
}

/// Splits `expr AS alias` into its parts
fn split_alias(item: &str) -> (&str, Option<&str>) {
    let lower = item.to_ascii_lowercase();
    match lower.rfind(" as ") {
        Some(idx) => (item[..idx].trim(), Some(item[idx + 4..].trim())),
        None => (item.trim(), None),
    }
}

fn strip_distinct(expr: &str) -> &str {
    match expr.get(..9) {
        Some(prefix) if prefix.eq_ignore_ascii_case("DISTINCT ") => expr[9..].trim(),
        _ => expr.trim(),
    }
}
