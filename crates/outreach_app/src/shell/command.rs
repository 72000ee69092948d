use std::path::PathBuf;

use outreach_core::{ExportFormat, Msg};

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Goes straight to `update`.
    Msg(Msg),
    /// Changes only the subject; the shell fills in the current body.
    Subject(String),
    /// Changes only the body template; the shell fills in the current subject.
    Body(String),
    /// Reads a JSON array of records from disk.
    Load(PathBuf),
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  search <query>              look up businesses
  json <array>                use a pasted JSON array as the table
  load <file>                 use a JSON array from a file as the table
  show                        print the current table
  edit <row> <field> = <value>
  add                         append an empty row
  remove <row>                drop a row
  save                        save every row, then move on to composing
  subject <text>              set the email subject
  body <text>                 set the email body (\\n for a new line)
  generate                    generate one draft per record
  send                        send every draft
  export csv|json             write the current table to the export folder
  help, quit";

pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "search" => Command::Msg(Msg::SearchSubmitted(rest.to_string())),
        "json" => Command::Msg(Msg::JsonPasted(rest.to_string())),
        "load" => {
            if rest.is_empty() {
                return Err("Usage: load <file>".to_string());
            }
            Command::Load(PathBuf::from(rest))
        }
        "edit" => parse_edit(rest)?,
        "add" => Command::Msg(Msg::RowAdded),
        "remove" => Command::Msg(Msg::RowRemoved(parse_row(rest)?)),
        "save" => Command::Msg(Msg::SaveClicked),
        "subject" => Command::Subject(rest.to_string()),
        "body" => Command::Body(unescape_newlines(rest)),
        "generate" => Command::Msg(Msg::GenerateClicked),
        "send" => Command::Msg(Msg::SendClicked),
        "export" => match rest.to_ascii_lowercase().as_str() {
            "csv" => Command::Msg(Msg::ExportRequested(ExportFormat::Csv)),
            "json" => Command::Msg(Msg::ExportRequested(ExportFormat::Json)),
            _ => return Err("Usage: export csv|json".to_string()),
        },
        "show" | "" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("Unknown command '{other}'. Type 'help'.")),
    };
    Ok(command)
}

/// `<row> <field> = <value>`, row counted from 1. The value may be empty.
fn parse_edit(rest: &str) -> Result<Command, String> {
    const USAGE: &str = "Usage: edit <row> <field> = <value>";
    let (target, value) = rest.split_once('=').ok_or(USAGE)?;
    let (row, field) = target
        .trim()
        .split_once(char::is_whitespace)
        .ok_or(USAGE)?;
    let field = field.trim();
    if field.is_empty() {
        return Err(USAGE.to_string());
    }
    Ok(Command::Msg(Msg::CellEdited {
        row: parse_row(row)?,
        field: field.to_string(),
        value: value.trim().to_string(),
    }))
}

fn parse_row(text: &str) -> Result<usize, String> {
    match text.trim().parse::<usize>() {
        Ok(row) if row >= 1 => Ok(row - 1),
        _ => Err(format!("'{}' is not a row number (rows start at 1).", text.trim())),
    }
}

fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}
