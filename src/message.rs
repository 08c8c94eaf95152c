//! User commands for pairmark.
//!
//! Every user-facing control is represented as a `Command`. Front ends
//! construct them directly; the binary parses them from text lines such as
//! `click 0 120.5 88` or `save-annotations out.json`.

use std::path::PathBuf;

use thiserror::Error;

use crate::coords::{Position, Size};
use crate::keybindings::Key;
use crate::model::{Category, ImageSlot};

/// Errors produced while parsing command text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Blank input
    #[error("Empty command")]
    Empty,

    /// The command word is not recognised
    #[error("Unknown command '{0}' (try 'help')")]
    Unknown(String),

    /// A required argument is absent
    #[error("'{command}' expects {expected}")]
    MissingArgument {
        command: String,
        expected: &'static str,
    },

    /// An argument could not be parsed
    #[error("Invalid argument '{value}' for '{command}': expected {expected}")]
    InvalidArgument {
        command: String,
        value: String,
        expected: &'static str,
    },

    /// More arguments than the command accepts
    #[error("Too many arguments for '{0}'")]
    TooManyArguments(String),
}

/// Commands that can be sent to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Import image files and folders
    LoadImages(Vec<PathBuf>),
    /// Import an annotation document
    LoadAnnotations(PathBuf),
    /// Export all annotations, to the configured file name if no path is given
    SaveAnnotations(Option<PathBuf>),
    /// Mark the next placed point as occluded
    ArmOccluded,
    /// Remove the last placed point
    Undo,
    /// Clear the active sequence
    ResetCurrent,
    /// Clear every sequence
    ResetAll,
    /// Select a category, or toggle when `None`
    Category(Option<Category>),
    /// Navigate to the previous sequence
    Previous,
    /// Navigate to the next sequence
    Next,
    /// Set the zoom level (at least 1)
    SetZoomLevel(u32),
    /// Show or hide the contact-region inset
    ToggleContactZoom,
    /// Pointer click on a surface, in display coordinates
    Click { slot: ImageSlot, at: Position },
    /// Pointer movement over a surface, in display coordinates
    Hover { slot: ImageSlot, at: Position },
    /// Viewport size changed
    Resize(Size),
    /// Print the current state
    Status,
    /// Key press, resolved through the key bindings
    Key(Key),
}

/// Usage text for the command language.
pub const HELP: &str = "\
load-images <path>...        import image files or folders
load-annotations <file>      import an annotation document
save-annotations [file]      export all annotations
occluded                     mark the next point as occluded
undo                         remove the last point
reset                        clear the current sequence
reset-all                    clear every sequence
category [index|thumb]       select or toggle the category
prev | next                  navigate between sequences
zoom <n>                     set the zoom level (n >= 1)
contact-zoom                 toggle the contact-region inset
click <slot> <x> <y>         place a point (slot 0 = contact image)
hover <slot> <x> <y>         move the pointer
resize <w> <h>               set the viewport size
status                       show the current state
key <name>                   press a key (ArrowLeft, ArrowRight, o, z, c)";

impl Command {
    /// Parse one line of command text.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(CommandError::Empty)?;
        let args: Vec<&str> = words.collect();
        let args = Args { command: name, args: &args };

        let command = match name {
            "load-images" => {
                if args.args.is_empty() {
                    return Err(args.missing("one or more paths"));
                }
                Command::LoadImages(args.args.iter().map(PathBuf::from).collect())
            }
            "load-annotations" => {
                args.at_most(1)?;
                let path = args.get(0).ok_or_else(|| args.missing("a file path"))?;
                Command::LoadAnnotations(PathBuf::from(path))
            }
            "save-annotations" => {
                args.at_most(1)?;
                Command::SaveAnnotations(args.get(0).map(PathBuf::from))
            }
            "occluded" => args.none(Command::ArmOccluded)?,
            "undo" => args.none(Command::Undo)?,
            "reset" => args.none(Command::ResetCurrent)?,
            "reset-all" => args.none(Command::ResetAll)?,
            "category" => {
                args.at_most(1)?;
                let category = match args.get(0) {
                    None => None,
                    Some(value) => Some(
                        Category::from_name(value)
                            .ok_or_else(|| args.invalid(value, "'index' or 'thumb'"))?,
                    ),
                };
                Command::Category(category)
            }
            "prev" | "previous" => args.none(Command::Previous)?,
            "next" => args.none(Command::Next)?,
            "zoom" => {
                args.at_most(1)?;
                let value = args.get(0).ok_or_else(|| args.missing("a zoom level"))?;
                let level = value
                    .parse::<u32>()
                    .map_err(|_| args.invalid(value, "a whole number"))?;
                Command::SetZoomLevel(level)
            }
            "contact-zoom" => args.none(Command::ToggleContactZoom)?,
            "click" => {
                let (slot, at) = args.slot_and_position()?;
                Command::Click { slot, at }
            }
            "hover" => {
                let (slot, at) = args.slot_and_position()?;
                Command::Hover { slot, at }
            }
            "resize" => {
                args.at_most(2)?;
                let width = args.number(0, "a width and a height")?;
                let height = args.number(1, "a width and a height")?;
                Command::Resize(Size::new(width, height))
            }
            "status" => args.none(Command::Status)?,
            "key" => {
                args.at_most(1)?;
                let value = args.get(0).ok_or_else(|| args.missing("a key name"))?;
                Command::Key(value.parse()?)
            }
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

/// Positional arguments of one command line.
struct Args<'a> {
    command: &'a str,
    args: &'a [&'a str],
}

impl<'a> Args<'a> {
    fn get(&self, index: usize) -> Option<&'a str> {
        self.args.get(index).copied()
    }

    fn missing(&self, expected: &'static str) -> CommandError {
        CommandError::MissingArgument {
            command: self.command.to_string(),
            expected,
        }
    }

    fn invalid(&self, value: &str, expected: &'static str) -> CommandError {
        CommandError::InvalidArgument {
            command: self.command.to_string(),
            value: value.to_string(),
            expected,
        }
    }

    fn at_most(&self, count: usize) -> Result<(), CommandError> {
        if self.args.len() > count {
            return Err(CommandError::TooManyArguments(self.command.to_string()));
        }
        Ok(())
    }

    fn none(&self, command: Command) -> Result<Command, CommandError> {
        self.at_most(0)?;
        Ok(command)
    }

    fn number(&self, index: usize, expected: &'static str) -> Result<f64, CommandError> {
        let value = self.get(index).ok_or_else(|| self.missing(expected))?;
        match value.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(n),
            _ => Err(self.invalid(value, "a number")),
        }
    }

    fn slot_and_position(&self) -> Result<(ImageSlot, Position), CommandError> {
        const EXPECTED: &str = "a slot (0 or 1) and x y coordinates";
        self.at_most(3)?;
        let value = self.get(0).ok_or_else(|| self.missing(EXPECTED))?;
        let slot = match value {
            "primary" => ImageSlot::Primary,
            "secondary" => ImageSlot::Secondary,
            _ => value
                .parse::<usize>()
                .ok()
                .and_then(ImageSlot::from_index)
                .ok_or_else(|| self.invalid(value, "0, 1, 'primary' or 'secondary'"))?,
        };
        let x = self.number(1, EXPECTED)?;
        let y = self.number(2, EXPECTED)?;
        Ok((slot, Position::new(x, y)))
    }
}
