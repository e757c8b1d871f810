//! `query` command: run a custom read-only Cypher statement

use crate::config::Config;
use crate::error::Result;
use crate::graph::{CypherValidator, GraphClient, GraphSchema, Neo4jClient, Record};
use colored::Colorize;
use serde_json::Value;

/// Runs `cypher` and prints the first `limit` rows as JSON
///
/// Write clauses are refused before anything is sent to the database.
pub async fn run_query(config: &Config, cypher: &str, limit: usize) -> Result<()> {
    let client = Neo4jClient::new(&config.graph)?;
    let rows = execute_read_only(&client, cypher).await?;

    if rows.is_empty() {
        println!("{}", "Query returned no rows.".yellow());
        return Ok(());
    }

    println!("{}", format_rows(&rows, limit)?);
    if rows.len() > limit {
        println!(
            "{}",
            format!("Showing first {} of {} rows", limit, rows.len()).cyan()
        );
    }
    Ok(())
}

/// Checks that `cypher` is read-only, then runs it
pub async fn execute_read_only(client: &dyn GraphClient, cypher: &str) -> Result<Vec<Record>> {
    CypherValidator::new(GraphSchema::games()).check_read_only(cypher)?;
    tracing::debug!("Running custom query: {}", cypher);
    client.run(cypher, Value::Null).await
}

/// Pretty JSON array of the first `limit` rows
pub fn format_rows(rows: &[Record], limit: usize) -> Result<String> {
    let shown: Vec<&Record> = rows.iter().take(limit).collect();
    Ok(serde_json::to_string_pretty(&shown)?)
}
