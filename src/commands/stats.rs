//! `stats` command: node and relationship counts of the games graph

use crate::config::Config;
use crate::error::Result;
use crate::graph::{GraphClient, GraphStatistics, Neo4jClient};
use colored::Colorize;
use prettytable::{format, Table};

/// Collects and prints graph statistics
pub async fn show_stats(config: &Config, top: usize) -> Result<()> {
    let client = Neo4jClient::new(&config.graph)?;
    print_graph_statistics(&client, top).await
}

/// Prints statistics gathered through `client`
pub async fn print_graph_statistics(client: &dyn GraphClient, top: usize) -> Result<()> {
    let stats = GraphStatistics::collect(client, top).await?;

    println!("\n{}", "Graph Statistics".bold());
    statistics_table(&stats).printstd();
    println!();
    Ok(())
}

/// Renders statistics as a two-column table
pub fn statistics_table(stats: &GraphStatistics) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row!["Metric".bold(), "Count".bold()]);
    table.add_row(prettytable::row!["Nodes".cyan(), stats.nodes]);
    table.add_row(prettytable::row!["Relationships".cyan(), stats.relationships]);

    for (label, count) in &stats.node_types {
        table.add_row(prettytable::row![format!("  :{}", label), count]);
    }
    for (rel_type, count) in &stats.relationship_types {
        table.add_row(prettytable::row![format!("  [:{}]", rel_type), count]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_table_rows() {
        let stats = GraphStatistics {
            nodes: 120,
            relationships: 340,
            node_types: vec![("Game".to_string(), 50), ("User".to_string(), 70)],
            relationship_types: vec![("PLAYED".to_string(), 300)],
        };
        let table = statistics_table(&stats);
        assert_eq!(table.len(), 6);

        let rendered = table.to_string();
        assert!(rendered.contains(":Game"));
        assert!(rendered.contains("[:PLAYED]"));
        assert!(rendered.contains("340"));
    }
}
