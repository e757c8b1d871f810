//! Special commands for the interactive chat shell
//!
//! Commands start with `/` and are case-insensitive; `exit` and `quit`
//! also work without the slash. Anything else is a question for the bot.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command does not take arguments
    #[error("{command} does not take arguments\n\nType '/help' to see valid usage")]
    UnexpectedArgument { command: String },
}

/// Shell commands handled without asking the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Show the command list
    Help,

    /// Show conversation counters and graph statistics
    Stats,

    /// Start a fresh conversation with a new session id
    Clear,

    /// Print the current session id
    Session,

    /// Leave the shell
    Exit,

    /// Not a special command
    None,
}

/// Parses a line of shell input
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` for an unrecognized `/command`
/// and `CommandError::UnexpectedArgument` when a known one has trailing
/// text.
///
/// # Examples
///
/// ```
/// use nextlevelbot::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/STATS").unwrap(), SpecialCommand::Stats);
/// assert_eq!(parse_special_command("quit").unwrap(), SpecialCommand::Exit);
/// assert_eq!(parse_special_command("Who played Hades?").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') {
        return Ok(match lower.as_str() {
            "exit" | "quit" => SpecialCommand::Exit,
            _ => SpecialCommand::None,
        });
    }

    let mut parts = lower.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let has_argument = parts.next().map_or(false, |rest| !rest.trim().is_empty());

    let command = match name {
        "/help" | "/?" => SpecialCommand::Help,
        "/stats" => SpecialCommand::Stats,
        "/clear" | "/new" => SpecialCommand::Clear,
        "/session" => SpecialCommand::Session,
        "/exit" | "/quit" => SpecialCommand::Exit,
        _ => return Err(CommandError::UnknownCommand(trimmed.to_string())),
    };

    if has_argument {
        return Err(CommandError::UnexpectedArgument {
            command: name.to_string(),
        });
    }
    Ok(command)
}

/// Prints the command list
pub fn print_help() {
    println!(
        r#"
NextLevelBot Commands
=====================

  /help     - Show this help
  /stats    - Show conversation counters and graph statistics
  /clear    - Start a new conversation (new session id)
  /session  - Show the current session id
  /exit     - Leave the chat (also: exit, quit, Ctrl-D)

Anything else is sent to NextLevelBot. Try:
  Who played Stardew Valley?
  Can you recommend some cozy farming games?
  What tags does Hades have?
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_commands() {
        assert_eq!(parse_special_command("/help").unwrap(), SpecialCommand::Help);
        assert_eq!(parse_special_command("/?").unwrap(), SpecialCommand::Help);
        assert_eq!(parse_special_command("/clear").unwrap(), SpecialCommand::Clear);
        assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::Clear);
        assert_eq!(parse_special_command(" /Session ").unwrap(), SpecialCommand::Session);
        assert_eq!(parse_special_command("/exit").unwrap(), SpecialCommand::Exit);
        assert_eq!(parse_special_command("EXIT").unwrap(), SpecialCommand::Exit);
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(
            parse_special_command("exit strategies in Civilization?").unwrap(),
            SpecialCommand::None
        );
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_special_command("/mode write").unwrap_err();
        assert_eq!(err, CommandError::UnknownCommand("/mode write".to_string()));
        assert!(err.to_string().contains("/help"));
    }

    #[test]
    fn test_argument_rejected() {
        assert_eq!(
            parse_special_command("/stats now").unwrap_err(),
            CommandError::UnexpectedArgument {
                command: "/stats".to_string()
            }
        );
    }
}
