//! Command line construction for the bundled downloader
//!
//! A [`CommandLine`] is the token vector handed to the OS. Strings are only
//! split with [`CommandLine::parse`], which splits naively on whitespace: an
//! argument that itself contains a space (a quoted path, a URL with a literal
//! space) ends up as several tokens and quotes are kept verbatim. The download
//! path therefore builds its tokens directly from a [`DownloadRequest`] and
//! only uses the joined string for display.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::models::{AppError, AppResult};

/// Flag that introduces the output path template
pub const OUTPUT_TEMPLATE_FLAG: &str = "-o";

/// Program path followed by its arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLine {
    tokens: Vec<String>,
}

impl CommandLine {
    pub fn from_tokens<I, S>(tokens: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        match tokens.first() {
            None => Err(AppError::InvalidCommand("command is empty".to_string())),
            Some(program) if program.trim().is_empty() => Err(AppError::InvalidCommand(
                "program name is blank".to_string(),
            )),
            Some(_) => Ok(Self { tokens }),
        }
    }

    /// Split a command string on whitespace
    pub fn parse(line: &str) -> AppResult<Self> {
        Self::from_tokens(line.split_whitespace())
    }

    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(" "))
    }
}

/// One download as typed by the user: executable, template and raw URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub executable: String,
    pub output_template: String,
    pub url: String,
}

impl DownloadRequest {
    pub fn new(
        executable: impl Into<String>,
        output_template: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            executable: executable.into(),
            output_template: output_template.into(),
            url: url.into(),
        }
    }

    /// `<executable> -o "<template>" <url>`
    pub fn command_string(&self) -> String {
        format!(
            "{} {} \"{}\" {}",
            self.executable, OUTPUT_TEMPLATE_FLAG, self.output_template, self.url
        )
    }

    /// Tokens to spawn; the template and URL are passed through as single arguments
    pub fn to_command_line(&self) -> AppResult<CommandLine> {
        CommandLine::from_tokens([
            self.executable.as_str(),
            OUTPUT_TEMPLATE_FLAG,
            self.output_template.as_str(),
            self.url.as_str(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_program_and_args() {
        let command = CommandLine::parse("app/resources/youtube-dl --version").unwrap();
        assert_eq!(command.program(), "app/resources/youtube-dl");
        assert_eq!(command.args(), ["--version".to_string()]);
    }

    #[test]
    fn test_empty_command_is_rejected() {
        assert!(matches!(
            CommandLine::parse("   "),
            Err(AppError::InvalidCommand(_))
        ));
        assert!(matches!(
            CommandLine::from_tokens(Vec::<String>::new()),
            Err(AppError::InvalidCommand(_))
        ));
        assert!(matches!(
            CommandLine::from_tokens(["", "-o"]),
            Err(AppError::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_split_and_rejoin_round_trip() {
        let line = "youtube-dl -o ~/Downloads/%(title)s.%(ext)s https://www.youtube.com/watch?v=abc123";
        let command = CommandLine::parse(line).unwrap();
        assert_eq!(command.to_string(), line);
    }

    #[test]
    fn test_arguments_with_spaces_break_round_trip() {
        let request = DownloadRequest::new(
            "youtube-dl",
            "~/My Videos/%(title)s.%(ext)s",
            "https://www.youtube.com/watch?v=abc 123",
        );
        let parsed = CommandLine::parse(&request.command_string()).unwrap();

        // The template is split and its quotes survive as literal characters.
        assert_eq!(parsed.tokens()[2], "\"~/My");
        assert_eq!(parsed.tokens().len(), 6);
        assert_ne!(parsed, request.to_command_line().unwrap());

        // Collapsing runs of spaces also loses information.
        let doubled = CommandLine::parse("youtube-dl  --version").unwrap();
        assert_ne!(doubled.to_string(), "youtube-dl  --version");
    }

    #[test]
    fn test_download_command_keeps_url_verbatim() {
        let url = "https://www.youtube.com/watch?v=abc123";
        let request = DownloadRequest::new(
            "app/resources/youtube-dl",
            "~/Downloads/%(title)s.%(ext)s",
            url,
        );

        assert_eq!(
            request.command_string(),
            format!(
                "app/resources/youtube-dl -o \"~/Downloads/%(title)s.%(ext)s\" {}",
                url
            )
        );

        let command = request.to_command_line().unwrap();
        assert_eq!(
            command.tokens(),
            [
                "app/resources/youtube-dl".to_string(),
                "-o".to_string(),
                "~/Downloads/%(title)s.%(ext)s".to_string(),
                url.to_string(),
            ]
        );
        assert_eq!(command.args().last().map(String::as_str), Some(url));
    }
}
