//! Log formatting and output with ANSI colors and text wrapping
//!
//! Handles:
//! - Colorized console output with tag and level formatting
//! - Text wrapping at word boundaries
//! - Broken pipe handling for piped commands

use super::tags::LogTag;
use chrono::Local;
use colored::*;
use std::io::{stderr, stdout, ErrorKind, Write};

/// Log format widths for alignment
const TAG_WIDTH: usize = 10;
const LOG_TYPE_WIDTH: usize = 8;
const BRACKET_SPACE_WIDTH: usize = 3;
const TOTAL_PREFIX_WIDTH: usize = TAG_WIDTH + LOG_TYPE_WIDTH + BRACKET_SPACE_WIDTH * 2;

/// Maximum line length before wrapping
const MAX_LINE_LENGTH: usize = 145;

/// Format and output a log message
pub fn format_and_log(tag: &LogTag, log_type: &str, message: &str) {
    let time = Local::now().format("%H:%M:%S").to_string();
    let prefix = format!("{} ", time).dimmed().to_string();

    let base_line = format!(
        "{}[{}] [{}] ",
        prefix,
        format_tag(tag),
        format_log_type(log_type)
    );

    let base_length = strip_ansi_codes(&base_line)
        .len()
        .max(TOTAL_PREFIX_WIDTH + time.len() + 1);
    let available_space = if MAX_LINE_LENGTH > base_length {
        MAX_LINE_LENGTH - base_length
    } else {
        50
    };

    let chunks = wrap_text(message, available_space);
    let is_error = log_type.eq_ignore_ascii_case("ERROR");

    print_safe(&format!("{}{}", base_line, chunks[0]), is_error);

    if chunks.len() > 1 {
        let continuation = " ".repeat(base_length);
        for chunk in &chunks[1..] {
            print_safe(&format!("{}{}", continuation, chunk), is_error);
        }
    }
}

/// Format a tag with appropriate color
fn format_tag(tag: &LogTag) -> ColoredString {
    let label = format!("{:<width$}", tag.to_plain_string(), width = TAG_WIDTH);
    match tag {
        LogTag::System => label.bright_yellow().bold(),
        LogTag::Config => label.bright_white().bold(),
        LogTag::Cache => label.bright_cyan().bold(),
        LogTag::Decoder => label.bright_blue().bold(),
        LogTag::RateLimit => label.bright_red().bold(),
        LogTag::Freshness => label.bright_green().bold(),
        LogTag::Steam => label.bright_purple().bold(),
        LogTag::Osrs => label.bright_magenta().bold(),
        LogTag::Metrics => label.bright_cyan().bold(),
        LogTag::Webserver => label.bright_green().bold(),
        LogTag::Poller => label.bright_yellow().bold(),
        LogTag::Test => label.bright_blue().bold(),
        LogTag::Other(_) => label.white().bold(),
    }
}

/// Format log type with appropriate color
fn format_log_type(log_type: &str) -> ColoredString {
    let label = format!("{:<width$}", log_type, width = LOG_TYPE_WIDTH);
    match log_type.to_uppercase().as_str() {
        "ERROR" => label.bright_red().bold(),
        "WARNING" => label.bright_yellow().bold(),
        "DEBUG" | "VERBOSE" => label.dimmed(),
        _ => label.white().bold(),
    }
}

/// Print a line, exiting quietly on broken pipe
fn print_safe(message: &str, to_stderr: bool) {
    let result = if to_stderr {
        writeln!(stderr(), "{}", message)
    } else {
        let mut out = stdout();
        writeln!(out, "{}", message).and_then(|_| out.flush())
    };

    if let Err(e) = result {
        if e.kind() == ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
    }
}

/// Remove ANSI color codes from text
fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::new();
    let mut in_escape = false;

    for ch in text.chars() {
        if ch == '\x1b' {
            in_escape = true;
        } else if in_escape && ch == 'm' {
            in_escape = false;
        } else if !in_escape {
            result.push(ch);
        }
    }
    result
}

/// Wrap text at word boundaries, respecting existing newlines
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();

    for line in text.split('\n') {
        if strip_ansi_codes(line).chars().count() <= max_width {
            result.push(line.to_string());
            continue;
        }

        let mut current_line = String::new();
        for word in line.split_whitespace() {
            let word_len = strip_ansi_codes(word).chars().count();
            let current_len = strip_ansi_codes(&current_line).chars().count();

            if word_len > max_width {
                if !current_line.is_empty() {
                    result.push(std::mem::take(&mut current_line));
                }
                result.extend(break_long_word(word, max_width));
            } else if current_line.is_empty() {
                current_line = word.to_string();
            } else if current_len + word_len + 1 <= max_width {
                current_line.push(' ');
                current_line.push_str(word);
            } else {
                result.push(std::mem::replace(&mut current_line, word.to_string()));
            }
        }

        if !current_line.is_empty() {
            result.push(current_line);
        }
    }

    if result.is_empty() {
        result.push(String::new());
    }

    result
}

/// Break a very long word into chunks of at most `max_width` characters
fn break_long_word(word: &str, max_width: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(max_width.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_text("alpha beta gamma delta", 11);
        assert_eq!(lines, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn breaks_words_longer_than_width() {
        let lines = wrap_text("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn strips_color_codes() {
        let colored = "\x1b[1;31mred\x1b[0m";
        assert_eq!(strip_ansi_codes(colored), "red");
    }

    #[test]
    fn empty_message_yields_one_line() {
        assert_eq!(wrap_text("", 20), vec![String::new()]);
    }
}
