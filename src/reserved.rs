//! Reserved tokens recognised by every session

/// End the current loop
pub const QUIT: &[&str] = &["q", "quit", "exit"];

/// Replay commands from a file
pub const READ: &[&str] = &[".r", ".read"];

/// Query or update settings
pub const SETTINGS: &[&str] = &[".set", ".setting"];

/// Print help instead of executing
pub const HELP: &[&str] = &["-h", "--help"];

/// Comment lines are printed, never executed
pub const COMMENT: char = '#';

/// Canonical spellings offered by completion
pub const READ_CANONICAL: &str = ".read";
pub const SETTINGS_CANONICAL: &str = ".setting";
pub const HELP_CANONICAL: &str = "--help";

pub fn is_quit(token: &str) -> bool {
    QUIT.contains(&token)
}

pub fn is_read(token: &str) -> bool {
    READ.contains(&token)
}

pub fn is_settings(token: &str) -> bool {
    SETTINGS.contains(&token)
}

pub fn is_help(token: &str) -> bool {
    HELP.contains(&token)
}

pub fn is_comment(token: &str) -> bool {
    token.starts_with(COMMENT)
}

/// Token that can never be a command name
pub fn is_reserved(token: &str) -> bool {
    is_quit(token) || is_read(token) || is_settings(token) || is_help(token) || is_comment(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_tokens() {
        assert!(is_quit("exit"));
        assert!(is_read(".r"));
        assert!(is_settings(".setting"));
        assert!(is_help("-h"));
        assert!(is_comment("#red#"));
        assert!(!is_reserved("oper"));
        assert!(!is_settings(".sett"));
    }
}
