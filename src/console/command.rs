//! Console command grammar.
//!
//! Each input line is parsed as a multicall command line: the first word
//! names the subcommand, the rest are its arguments.

use chrono::Weekday;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "records",
    multicall = true,
    help_template = "Commands:\n{subcommands}"
)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show and reload the student list
    Students,
    /// Show and reload the faculty list
    Faculty,
    /// Reload the current list
    #[command(visible_alias = "refresh")]
    Reload,
    /// Filter the current list; no term clears the filter
    #[command(visible_alias = "find")]
    Search {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        term: Vec<String>,
    },
    /// Print the current list
    #[command(visible_alias = "ls")]
    List,
    /// Open a record in the detail panel
    #[command(visible_alias = "view")]
    Open { id: i64 },
    /// Open a blank form for a new record
    #[command(visible_alias = "create")]
    New,
    /// `edit <field>` opens the inline editor, `edit <field> = <value>` stages a value
    Edit {
        field: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Replace the open editor's text
    Type {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Confirm the open editor into the pending changes
    #[command(visible_alias = "ok")]
    Enter,
    /// Close the open editor without staging it
    #[command(visible_alias = "cancel")]
    Esc,
    /// Send every pending change in one request
    Save,
    /// Drop every pending change
    Discard,
    /// Close the panel, discarding pending changes
    #[command(visible_alias = "back")]
    Close,
    /// Archive a record of the current list
    #[command(visible_alias = "delete")]
    Archive { id: i64 },
    /// Weekly class schedule, or one day of it
    Schedule {
        #[arg(value_parser = parse_day)]
        day: Option<Weekday>,
    },
    /// Active record counts
    #[command(visible_alias = "home")]
    Dashboard,
    /// Switch between light and dark
    Theme,
    /// Change the account password
    Password {
        current: String,
        new: String,
        confirmation: String,
    },
    /// End the session and exit
    Logout,
    /// Exit
    #[command(visible_alias = "exit")]
    Quit,
}

/// Parse one input line. `help` and malformed lines come back as errors
/// whose rendering is the text to show.
pub fn parse(line: &str) -> Result<Command, clap::Error> {
    let mut words: Vec<String> = line.split_whitespace().map(str::to_string).collect();
    match words.first_mut() {
        Some(verb) => *verb = verb.to_lowercase(),
        None => {
            return Err(Line::command().error(ErrorKind::MissingSubcommand, "empty command"));
        }
    }
    Line::try_parse_from(words).map(|line| line.command)
}

pub fn help() -> String {
    Line::command().render_help().to_string()
}

/// Split the words of `edit` into the field and, for `edit <field> = <value>`,
/// the value to stage.
pub fn edit_target(field: &str, value: &[String]) -> Result<(String, Option<String>), String> {
    const USAGE: &str = "usage: edit <field> [= <value>]";

    if value.is_empty() && !field.contains('=') {
        return Ok((field.to_string(), None));
    }
    let joined = std::iter::once(field)
        .chain(value.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    match joined.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() && !name.trim().contains(' ') => {
            Ok((name.trim().to_string(), Some(value.trim().to_string())))
        }
        _ => Err(USAGE.to_string()),
    }
}

fn parse_day(raw: &str) -> Result<Weekday, String> {
    raw.parse::<Weekday>()
        .map_err(|_| format!("unknown day {:?}, try mon..sun", raw))
}
