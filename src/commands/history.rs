use crate::cli::HistoryCommand;
use crate::config::Config;
use crate::error::Result;
use crate::graph::{GraphClient, Neo4jClient};
use crate::storage::{create_session_store, Role, SessionStore, StoredSession, Turn};
use colored::Colorize;
use prettytable::{format, Table};
use std::sync::Arc;

/// Handle history commands against the configured session store
pub async fn handle_history(config: &Config, command: HistoryCommand) -> Result<()> {
    let graph: Arc<dyn GraphClient> = Arc::new(Neo4jClient::new(&config.graph)?);
    let store = create_session_store(&config.session, graph)?;
    run_history(store.as_ref(), command).await
}

/// Runs a history command on `store`
pub async fn run_history(store: &dyn SessionStore, command: HistoryCommand) -> Result<()> {
    match command {
        HistoryCommand::List => {
            let sessions = store.list_sessions().await?;

            if sessions.is_empty() {
                println!("{}", "No conversation history found.".yellow());
                return Ok(());
            }

            println!("\nConversation History:");
            sessions_table(&sessions).printstd();
            println!();
            println!(
                "Use {} to continue a session.",
                "nextlevelbot chat --session <ID>".cyan()
            );
            println!();
        }
        HistoryCommand::Show { id } => {
            let turns = store.get(&id).await?;
            if turns.is_empty() {
                println!("{}", format!("No turns stored for session {}", id).yellow());
                return Ok(());
            }
            println!("\nSession {}\n", id.cyan());
            for turn in &turns {
                println!("{}\n", render_turn(turn));
            }
        }
        HistoryCommand::Delete { id } => {
            if store.delete(&id).await? {
                println!("{}", format!("Deleted session {}", id).green());
            } else {
                println!("{}", format!("No session named {}", id).yellow());
            }
        }
    }

    Ok(())
}

fn sessions_table(sessions: &[StoredSession]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Turns".bold(),
        "Started".bold(),
        "Last Updated".bold()
    ]);

    for session in sessions {
        table.add_row(prettytable::row![
            session.id.cyan(),
            session.turn_count,
            session.created_at.format("%Y-%m-%d %H:%M").to_string(),
            session.updated_at.format("%Y-%m-%d %H:%M").to_string()
        ]);
    }
    table
}

fn render_turn(turn: &Turn) -> String {
    let speaker = match turn.role {
        Role::User => "You".green().bold(),
        Role::Assistant => "NextLevelBot".blue().bold(),
    };
    format!(
        "[{}] {}: {}",
        turn.created_at.format("%H:%M:%S"),
        speaker,
        turn.content
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_delete_removes_session() {
        let store = MemoryStore::new();
        store.append("s1", Role::User, "hi").await.unwrap();

        run_history(&store, HistoryCommand::Delete { id: "s1".into() })
            .await
            .unwrap();
        assert!(store.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_and_show_empty_store() {
        let store = MemoryStore::new();
        assert!(run_history(&store, HistoryCommand::List).await.is_ok());
        assert!(run_history(&store, HistoryCommand::Show { id: "x".into() })
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_sessions_table_has_header_and_rows() {
        let store = MemoryStore::new();
        store.append("a", Role::User, "1").await.unwrap();
        store.append("b", Role::User, "2").await.unwrap();
        let table = sessions_table(&store.list_sessions().await.unwrap());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_render_turn_includes_content() {
        let turn = Turn::new(Role::Assistant, "- alice", 2);
        assert!(render_turn(&turn).contains("- alice"));
    }
}
