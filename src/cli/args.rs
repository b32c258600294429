//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--file` / `-f <path>`: Scene document to operate on
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use clap_complete::Shell;

use crate::core::types::SelectMode;

/// Default scene document path.
pub const DEFAULT_FILE: &str = "scene.mlk.json";

/// mlk - Lock mesh vertices against accidental edits
#[derive(Parser, Debug)]
#[command(name = "mlk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Scene document to operate on
    #[arg(
        short,
        long,
        global = true,
        env = "MESHLOCK_FILE",
        default_value = DEFAULT_FILE
    )]
    pub file: PathBuf,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new scene document
    #[command(
        name = "init",
        long_about = "Create a new scene document holding one active object.\n\n\
            By default the object is a grid mesh. Use --empty to create an object \
            without geometry instead. The object starts in object mode; run \
            `mlk edit enter` before selecting or locking.",
        after_help = "\
EXAMPLES:
    # A 2x2 grid (9 vertices)
    mlk init

    # A larger grid with a custom name
    mlk init --grid 4x3 --name Floor

    # Store locks under a different attribute name
    mlk init --layer lock_v2"
    )]
    Init {
        /// Grid size as COLSxROWS
        #[arg(long, default_value = "2x2", value_parser = parse_grid)]
        grid: (usize, usize),

        /// Object name
        #[arg(long, default_value = "Grid")]
        name: String,

        /// Lock layer name, written to the scene config
        #[arg(long)]
        layer: Option<String>,

        /// Create an object without geometry
        #[arg(long, conflicts_with = "grid")]
        empty: bool,

        /// Overwrite an existing document
        #[arg(long)]
        force: bool,
    },

    /// Enter or leave edit mode on the active object
    Edit {
        #[command(subcommand)]
        action: EditAction,
    },

    /// Set the element selection mode
    Mode {
        /// vertex, edge or face
        mode: SelectMode,
    },

    /// Select elements by index
    #[command(
        name = "select",
        after_help = "\
EXAMPLES:
    # Select vertices 0, 1 and 4
    mlk select --vert 0,1,4

    # Add face 2 to the selection
    mlk select --face 2 --extend

    # Select everything visible, or nothing
    mlk select --all
    mlk select --none"
    )]
    Select {
        /// Vertex indices
        #[arg(long, value_delimiter = ',')]
        vert: Vec<usize>,

        /// Edge indices
        #[arg(long, value_delimiter = ',')]
        edge: Vec<usize>,

        /// Face indices
        #[arg(long, value_delimiter = ',')]
        face: Vec<usize>,

        /// Select every visible element
        #[arg(long, conflicts_with_all = ["vert", "edge", "face", "none"])]
        all: bool,

        /// Clear the selection
        #[arg(long, conflicts_with_all = ["vert", "edge", "face"])]
        none: bool,

        /// Add to the current selection instead of replacing it
        #[arg(long)]
        extend: bool,
    },

    /// Lock the selected vertices
    #[command(
        name = "lock",
        long_about = "Lock every vertex touched by the selection.\n\n\
            Locked vertices are tagged in the lock layer, hidden and deselected. \
            They stay locked across edit sessions until explicitly unlocked."
    )]
    Lock,

    /// Reveal, commit, cancel or clear locks
    #[command(
        name = "unlock",
        after_help = "\
WORKFLOW:
    mlk unlock begin          # reveal locked vertices
    mlk select --vert 3       # pick the ones to release
    mlk unlock commit         # unlock them, hide the rest again

    mlk unlock cancel         # leave unlock mode without changes
    mlk unlock all            # unlock everything at once"
    )]
    Unlock {
        #[command(subcommand)]
        action: UnlockAction,
    },

    /// Delete the selection unless it touches locked vertices
    Delete {
        /// Open the delete menu instead of deleting vertices directly
        #[arg(long)]
        dialog: bool,
    },

    /// Move the selection unless it touches locked vertices
    Move {
        /// Offset as x,y,z
        #[arg(long, value_parser = parse_offset, allow_hyphen_values = true)]
        offset: [f32; 3],
    },

    /// Press a key chord, as the host would
    #[command(
        name = "key",
        after_help = "\
EXAMPLES:
    mlk key X                 # guarded delete
    mlk key ctrl+shift+L      # lock selection
    mlk key G                 # guarded move (no offset)"
    )]
    Key {
        /// Chord such as `ctrl+shift+L`
        chord: String,
    },

    /// Show the lock panel for the active object
    Status,

    /// Check lock state consistency and repair it
    #[command(
        name = "doctor",
        long_about = "Check the active object for lock state inconsistencies.\n\n\
            Reports corrections such as a persisted lock array that drifted from \
            the working layer, locked vertices that became visible, or a stale \
            unlock mode. Without --dry-run the corrections are applied and saved."
    )]
    Doctor {
        /// Show corrections without applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// List the key bindings the add-on registers
    Keymap,

    /// Print the overlay batch for the active object as JSON
    Overlay,

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Edit mode subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    /// Open an edit session
    Enter,
    /// Close the edit session
    Exit,
}

/// Unlock subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockAction {
    /// Reveal locked vertices for selection
    Begin,
    /// Unlock the selected locked vertices
    Commit,
    /// Leave unlock mode, hiding locked vertices again
    Cancel,
    /// Unlock every vertex
    All,
}

fn parse_grid(value: &str) -> Result<(usize, usize), String> {
    let (cols, rows) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected COLSxROWS, got '{}'", value))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=256).contains(n))
            .ok_or_else(|| format!("grid size must be between 1 and 256, got '{}'", s))
    };
    Ok((parse(cols)?, parse(rows)?))
}

fn parse_offset(value: &str) -> Result<[f32; 3], String> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid offset '{}': {}", value, e))?;
    match parts.as_slice() {
        [x, y, z] if parts.iter().all(|c| c.is_finite()) => Ok([*x, *y, *z]),
        _ => Err(format!("expected x,y,z, got '{}'", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn grid_sizes() {
        assert_eq!(parse_grid("3x2"), Ok((3, 2)));
        assert_eq!(parse_grid("1X1"), Ok((1, 1)));
        assert!(parse_grid("3").is_err());
        assert!(parse_grid("0x2").is_err());
    }

    #[test]
    fn offsets() {
        assert_eq!(parse_offset("1,-2.5,0"), Ok([1.0, -2.5, 0.0]));
        assert!(parse_offset("1,2").is_err());
        assert!(parse_offset("a,b,c").is_err());
        assert!(parse_offset("inf,0,0").is_err());
    }

    #[test]
    fn parses_nested_subcommands() {
        let cli = Cli::try_parse_from(["mlk", "-f", "a.json", "unlock", "commit"]).unwrap();
        assert_eq!(cli.file, PathBuf::from("a.json"));
        assert!(matches!(
            cli.command,
            Command::Unlock {
                action: UnlockAction::Commit
            }
        ));

        let cli = Cli::try_parse_from(["mlk", "mode", "face"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Mode {
                mode: SelectMode::Face
            }
        ));
    }

    #[test]
    fn select_lists() {
        let cli = Cli::try_parse_from(["mlk", "select", "--vert", "0,2", "--extend"]).unwrap();
        match cli.command {
            Command::Select { vert, extend, .. } => {
                assert_eq!(vert, vec![0, 2]);
                assert!(extend);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(Cli::try_parse_from(["mlk", "select", "--all", "--vert", "1"]).is_err());
    }

    #[test]
    fn negative_offset() {
        let cli = Cli::try_parse_from(["mlk", "move", "--offset", "-1,0,0"]).unwrap();
        match cli.command {
            Command::Move { offset } => assert_eq!(offset, [-1.0, 0.0, 0.0]),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
