/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `chat`: Interactive chat shell
- `ask`: One-shot question
- `stats`: Graph statistics
- `query`: Custom read-only Cypher
- `history`: Stored conversations

Handlers are thin: they build the library components from `Config` and
print what comes back.
*/

use crate::chat::ChatService;
use crate::config::Config;
use crate::error::Result;
use crate::storage::derive_session_id;

// Special commands parser for the chat shell
pub mod special_commands;

pub mod history;
pub mod query;
pub mod stats;

/// Fresh session id for this shell
///
/// Combines the login name with a per-launch nonce so two shells of the
/// same user never share a transcript.
pub fn new_session_id() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "player".to_string());
    let nonce = uuid::Uuid::new_v4().to_string();
    derive_session_id(&[&user, &nonce])
}

// Chat command handler
pub mod chat {
    //! Interactive chat shell.
    //!
    //! Builds a [`ChatService`] and runs a readline loop that submits each
    //! line to it, handling `/` commands locally.

    use super::*;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Greeting shown when the shell starts and after `/clear`
    pub const GREETING: &str =
        "Hi, I'm the NextLevelBot! 🎮 How can I help you with gaming today?";

    /// Command hint printed under the banner
    pub const COMMAND_HINT: &str = "Type '/help' for available commands, '/exit' to quit";

    /// Counters shown by `/stats`
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct ShellCounters {
        /// Conversations started in this shell
        pub conversations: usize,
        /// Questions asked in the current conversation
        pub questions: usize,
        /// Answers received in this shell
        pub responses: usize,
    }

    impl ShellCounters {
        /// Counters for a shell with one open conversation
        pub fn new() -> Self {
            Self {
                conversations: 1,
                ..Self::default()
            }
        }

        /// Records a question and its answer
        pub fn record_exchange(&mut self) {
            self.questions += 1;
            self.responses += 1;
        }

        /// Records the start of a new conversation
        pub fn start_conversation(&mut self) {
            self.conversations += 1;
            self.questions = 0;
        }
    }

    /// Start the interactive chat shell
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `session` - Session id to continue; a new one is derived if absent
    pub async fn run_chat(config: Config, session: Option<String>) -> Result<()> {
        let service = ChatService::from_config(&config)?;
        let mut session_id = session.unwrap_or_else(new_session_id);
        let mut counters = ShellCounters::new();

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&session_id);

        loop {
            match rl.readline(&format!("{} ", "You:".green().bold())) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::Help) => {
                            print_help();
                            continue;
                        }
                        Ok(SpecialCommand::Stats) => {
                            print_counters(&session_id, &counters);
                            if let Err(e) =
                                super::stats::print_graph_statistics(service.graph().as_ref(), 5)
                                    .await
                            {
                                eprintln!("{}", format!("Could not load graph statistics: {}", e).red());
                            }
                            continue;
                        }
                        Ok(SpecialCommand::Clear) => {
                            session_id = new_session_id();
                            counters.start_conversation();
                            println!("{}", "Started a new conversation.".yellow());
                            println!("\n{} {}\n", "NextLevelBot:".blue().bold(), GREETING);
                            continue;
                        }
                        Ok(SpecialCommand::Session) => {
                            println!("Session: {}\n", session_id.cyan());
                            continue;
                        }
                        Ok(SpecialCommand::Exit) => break,
                        Ok(SpecialCommand::None) => {}
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().red());
                            continue;
                        }
                    }

                    rl.add_history_entry(trimmed)?;

                    println!("{}", "Thinking...".dimmed());
                    let answer = service.submit(&session_id, trimmed).await;
                    counters.record_exchange();
                    println!("\n{} {}\n", "NextLevelBot:".blue().bold(), answer);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye! Happy gaming!");
        Ok(())
    }

    fn print_welcome_banner(session_id: &str) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                  NextLevelBot Gaming Assistant               ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Session: {}", session_id.cyan());
        println!("{}\n", COMMAND_HINT);
        println!("{} {}\n", "NextLevelBot:".blue().bold(), GREETING);
    }

    fn print_counters(session_id: &str, counters: &ShellCounters) {
        println!("\n{}", "Conversation".bold());
        println!("  Session:        {}", session_id.cyan());
        println!("  Conversations:  {}", counters.conversations);
        println!("  Questions:      {}", counters.questions);
        println!("  Responses:      {}", counters.responses);
    }

}

// One-shot question handler
pub mod ask {
    use super::*;
    use crate::agent::{RouterOutcome, StepAction};
    use colored::Colorize;

    /// Answers one question and exits
    ///
    /// With `show_steps` the reasoning steps are printed before the answer.
    pub async fn run_ask(
        config: Config,
        question: String,
        session: Option<String>,
        show_steps: bool,
    ) -> Result<()> {
        let service = ChatService::from_config(&config)?;
        let session_id = session.unwrap_or_else(new_session_id);

        let reply = service.submit_detailed(&session_id, &question).await;
        if show_steps {
            if let Some(outcome) = &reply.outcome {
                print_steps(outcome);
            }
        }
        println!("{}", reply.answer);
        Ok(())
    }

    fn print_steps(outcome: &RouterOutcome) {
        for (i, step) in outcome.steps.iter().enumerate() {
            let action = match step.action {
                StepAction::Tool(kind) => kind.to_string(),
                StepAction::FinalAnswer => "Final Answer".to_string(),
                StepAction::Rejected => "Rejected".to_string(),
            };
            println!("{} {}", format!("Step {}:", i + 1).bold(), action.cyan());
            if !step.thought.is_empty() {
                println!("  Thought: {}", step.thought);
            }
            if let Some(invocation) = &step.invocation {
                println!("  Input: {}", invocation.input);
            }
            if !step.observation.is_empty() {
                println!("  Observation: {}", step.observation.dimmed());
            }
        }
        println!(
            "{}\n",
            format!("Terminated: {}", outcome.termination).dimmed()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_ids_differ() {
        let a = new_session_id();
        let b = new_session_id();
        assert!(a.starts_with("nlb-"));
        assert_ne!(a, b);
    }
}
