//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;

use crate::{error::AppError, services::lock::DEFAULT_FALLBACK_LOCK_CMD, state::StartInput};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "pomo-lock")]
#[command(about = "A Pomodoro timer daemon that locks the screen when time is up")]
#[command(version)]
pub struct Config {
    /// Port to bind the control API to
    #[arg(short, long, default_value = "20525")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Start a session of this many minutes right away
    #[arg(short, long, conflicts_with = "at")]
    pub minutes: Option<String>,

    /// Start a session ending at this time today (24-hour HH:MM)
    #[arg(long)]
    pub at: Option<String>,

    /// Command used to lock the screen when no D-Bus screensaver answers
    #[arg(long)]
    pub lock_cmd: Option<String>,

    /// Preferences file (defaults to the user config directory)
    #[arg(long)]
    pub prefs: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Session requested on the command line, if any
    pub fn launch_input(&self) -> Option<StartInput> {
        match (&self.minutes, &self.at) {
            (Some(minutes), _) => Some(StartInput::Duration(minutes.clone())),
            (None, Some(at)) => Some(StartInput::EndTime(at.clone())),
            (None, None) => None,
        }
    }

    /// Fallback lock command, split like a shell would
    pub fn fallback_lock_command(&self) -> Result<Vec<String>, AppError> {
        match &self.lock_cmd {
            None => Ok(DEFAULT_FALLBACK_LOCK_CMD.iter().map(|s| s.to_string()).collect()),
            Some(line) => match shlex::split(line) {
                Some(args) if !args.is_empty() => Ok(args),
                _ => Err(AppError::Config(format!("invalid --lock-cmd: {line:?}"))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("pomo-lock").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse(&[]);
        assert_eq!(config.address(), "127.0.0.1:20525");
        assert_eq!(config.log_level(), "info");
        assert!(config.launch_input().is_none());
        assert_eq!(
            config.fallback_lock_command().unwrap(),
            vec!["loginctl", "lock-session"]
        );
    }

    #[test]
    fn launch_session_from_flags() {
        assert_eq!(
            parse(&["-m", "25"]).launch_input(),
            Some(StartInput::Duration("25".to_string()))
        );
        assert_eq!(
            parse(&["--at", "17:30"]).launch_input(),
            Some(StartInput::EndTime("17:30".to_string()))
        );
    }

    #[test]
    fn minutes_and_end_time_conflict() {
        let result = Config::try_parse_from(["pomo-lock", "-m", "25", "--at", "17:30"]);
        assert!(result.is_err());
    }

    #[test]
    fn lock_command_is_split_like_a_shell() {
        let config = parse(&["--lock-cmd", "xdg-screensaver lock --now 'my session'"]);
        assert_eq!(
            config.fallback_lock_command().unwrap(),
            vec!["xdg-screensaver", "lock", "--now", "my session"]
        );
    }

    #[test]
    fn malformed_lock_command_is_rejected() {
        assert!(parse(&["--lock-cmd", "lock 'unterminated"])
            .fallback_lock_command()
            .is_err());
        assert!(parse(&["--lock-cmd", "  "]).fallback_lock_command().is_err());
    }

    #[test]
    fn verbose_raises_log_level() {
        assert_eq!(parse(&["-v"]).log_level(), "debug");
    }
}
