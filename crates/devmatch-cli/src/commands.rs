//! Command parsing for the line-oriented interface.
//!
//! This module parses input lines into structured [`Command`] values.

/// Parsed command from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a session.
    Login {
        /// Identity token.
        identity: String,
    },

    /// End the session.
    Logout,

    /// Like the head candidate.
    Like,

    /// Dislike the head candidate.
    Dislike,

    /// Hide the match overlay.
    Dismiss,

    /// Fetch candidates again.
    Retry,

    /// Reopen the push channel.
    Reconnect,

    /// Print the current state.
    Status,

    /// Print the command list.
    Help,

    /// Quit the application.
    Quit,

    /// Blank line.
    Empty,

    /// Unknown or invalid command.
    Unknown {
        /// The original input.
        input: String,
    },

    /// Command with missing or invalid arguments.
    InvalidArgs {
        /// Command name.
        command: String,
        /// Error message.
        error: String,
    },
}

/// Command list printed by `/help`.
pub const HELP: &str = "\
/login <user>  start a session
/like, /l      like the current candidate
/dislike, /d   dislike the current candidate
/dismiss       close the match overlay
/retry         fetch candidates again
/reconnect     reopen the match stream
/status        show the current state
/logout        end the session
/quit, /q      exit";

/// Parse a user input line into a command.
///
/// Commands start with `/`. Anything else is unknown.
pub fn parse(input: &str) -> Command {
    let input = input.trim();

    if input.is_empty() {
        return Command::Empty;
    }

    let Some(cmd_str) = input.strip_prefix('/') else {
        return Command::Unknown { input: input.to_string() };
    };

    let parts: Vec<&str> = cmd_str.split_whitespace().collect();
    let command = parts.first().copied().unwrap_or("");

    match command {
        "login" => match parts.get(1) {
            Some(identity) if parts.len() == 2 => Command::Login { identity: (*identity).to_string() },
            Some(_) => Command::InvalidArgs {
                command: "login".into(),
                error: "User must be a single word".into(),
            },
            None => Command::InvalidArgs {
                command: "login".into(),
                error: "Usage: /login <user>".into(),
            },
        },

        "logout" => Command::Logout,

        "like" | "l" => Command::Like,

        "dislike" | "d" => Command::Dislike,

        "dismiss" => Command::Dismiss,

        "retry" => Command::Retry,

        "reconnect" => Command::Reconnect,

        "status" => Command::Status,

        "help" | "h" => Command::Help,

        "quit" | "q" => Command::Quit,

        _ => Command::Unknown { input: input.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_login() {
        assert_eq!(parse("/login ana"), Command::Login { identity: "ana".into() });
    }

    #[test]
    fn parse_login_missing_user() {
        assert!(
            matches!(parse("/login"), Command::InvalidArgs { command, .. } if command == "login")
        );
    }

    #[test]
    fn parse_login_extra_words() {
        assert!(matches!(parse("/login ana bo"), Command::InvalidArgs { .. }));
    }

    #[test]
    fn parse_decisions() {
        assert_eq!(parse("/like"), Command::Like);
        assert_eq!(parse("/l"), Command::Like);
        assert_eq!(parse("/dislike"), Command::Dislike);
        assert_eq!(parse("/d"), Command::Dislike);
    }

    #[test]
    fn parse_session_commands() {
        assert_eq!(parse("/logout"), Command::Logout);
        assert_eq!(parse("/dismiss"), Command::Dismiss);
        assert_eq!(parse("/retry"), Command::Retry);
        assert_eq!(parse("/reconnect"), Command::Reconnect);
        assert_eq!(parse("/status"), Command::Status);
    }

    #[test]
    fn parse_quit() {
        assert_eq!(parse("/quit"), Command::Quit);
        assert_eq!(parse("/q"), Command::Quit);
    }

    #[test]
    fn parse_surrounding_whitespace() {
        assert_eq!(parse("   /like  "), Command::Like);
    }

    #[test]
    fn parse_unknown_command() {
        assert!(matches!(parse("/unknown"), Command::Unknown { .. }));
        assert!(matches!(parse("like"), Command::Unknown { .. }));
    }

    #[test]
    fn parse_empty() {
        assert_eq!(parse(""), Command::Empty);
    }
}
