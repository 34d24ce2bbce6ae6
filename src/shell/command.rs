use std::path::PathBuf;

use thiserror::Error;

use crate::files::SaveMode;

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Print,
    Write(String),
    WriteBlock,
    Start,
    Status,
    Kill,
    Change(i32),
    Preset(Option<usize>),
    Load(PathBuf),
    Save(PathBuf, SaveMode),
    Clear,
    Shush,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Invalid command, type \"help\" or \"h\" for hints.")]
    Unknown(String),

    #[error("You must supply a message.")]
    MissingMessage,

    #[error("You must supply a filepath.")]
    MissingPath,

    #[error("Missing mode number.")]
    MissingMode,

    #[error("Value must be an integer, got '{0}'.")]
    InvalidNumber(String),
}

pub const USAGE: &str = "Usage: help, start, stat, kill, stop, change, preset, quit, write, write_block, print, clear, load, save
    change <n>       0 passthrough, 1 template; the message itself is kept
    save [-n] <path> -n refuses to overwrite an existing file";

/// Flag selecting exclusive-create for `save`.
const SAVE_NEW_FLAG: &str = "-n";

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Command>, CommandError> {
    let mut tokens = line.split_whitespace();
    let Some(cmd) = tokens.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = tokens.collect();

    let command = match cmd {
        "h" | "help" | "?" => Command::Help,
        "p" | "print" => Command::Print,
        "w" | "write" => {
            if args.is_empty() {
                return Err(CommandError::MissingMessage);
            }
            Command::Write(args.join(" "))
        }
        "W" | "write_block" => Command::WriteBlock,
        "s" | "start" => Command::Start,
        "st" | "stat" | "status" => Command::Status,
        "k" | "kill" | "stop" => Command::Kill,
        "c" | "change" => {
            let raw = args.first().ok_or(CommandError::MissingMode)?;
            let mode = raw
                .parse::<i32>()
                .map_err(|_| CommandError::InvalidNumber(raw.to_string()))?;
            Command::Change(mode)
        }
        "preset" => match args.first() {
            None => Command::Preset(None),
            Some(raw) => {
                let number = raw
                    .parse::<usize>()
                    .map_err(|_| CommandError::InvalidNumber(raw.to_string()))?;
                Command::Preset(Some(number))
            }
        },
        "load" => Command::Load(path_arg(&args)?),
        "save" => match args.split_first() {
            Some((&SAVE_NEW_FLAG, rest)) => Command::Save(path_arg(rest)?, SaveMode::CreateNew),
            _ => Command::Save(path_arg(&args)?, SaveMode::Overwrite),
        },
        "cls" | "cl" | "clear" => Command::Clear,
        "tb" | "ta_bouche" => Command::Shush,
        "q" | "quit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(Some(command))
}

fn path_arg(args: &[&str]) -> Result<PathBuf, CommandError> {
    args.first()
        .map(PathBuf::from)
        .ok_or(CommandError::MissingPath)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("   \t "), Ok(None));
    }

    #[test]
    fn aliases_map_to_same_command() {
        for alias in ["k", "kill", "stop"] {
            assert_eq!(parse_line(alias), Ok(Some(Command::Kill)));
        }
        for alias in ["st", "stat", "status"] {
            assert_eq!(parse_line(alias), Ok(Some(Command::Status)));
        }
        assert_eq!(parse_line("?"), Ok(Some(Command::Help)));
        assert_eq!(parse_line("W"), Ok(Some(Command::WriteBlock)));
    }

    #[test]
    fn write_joins_words_with_single_spaces() {
        assert_eq!(
            parse_line("write  hello    there world"),
            Ok(Some(Command::Write("hello there world".to_string())))
        );
        assert_eq!(parse_line("w"), Err(CommandError::MissingMessage));
    }

    #[test]
    fn change_requires_an_integer() {
        assert_eq!(parse_line("change 1"), Ok(Some(Command::Change(1))));
        assert_eq!(parse_line("c -3"), Ok(Some(Command::Change(-3))));
        assert_eq!(parse_line("change"), Err(CommandError::MissingMode));
        assert_eq!(
            parse_line("change one"),
            Err(CommandError::InvalidNumber("one".to_string()))
        );
    }

    #[test]
    fn file_commands_need_a_path() {
        assert_eq!(
            parse_line("load notes.txt"),
            Ok(Some(Command::Load(PathBuf::from("notes.txt"))))
        );
        assert_eq!(parse_line("save"), Err(CommandError::MissingPath));
        assert_eq!(parse_line("save -n"), Err(CommandError::MissingPath));
    }

    #[test]
    fn save_flag_selects_exclusive_create() {
        assert_eq!(
            parse_line("save out.txt"),
            Ok(Some(Command::Save(PathBuf::from("out.txt"), SaveMode::Overwrite)))
        );
        assert_eq!(
            parse_line("save -n out.txt"),
            Ok(Some(Command::Save(PathBuf::from("out.txt"), SaveMode::CreateNew)))
        );
    }

    #[test]
    fn preset_number_is_optional() {
        assert_eq!(parse_line("preset"), Ok(Some(Command::Preset(None))));
        assert_eq!(parse_line("preset 3"), Ok(Some(Command::Preset(Some(3)))));
    }

    #[test]
    fn unknown_commands_are_errors() {
        assert_eq!(
            parse_line("launch now"),
            Err(CommandError::Unknown("launch".to_string()))
        );
    }
}
