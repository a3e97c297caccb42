use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use notecab_shared::NoteKind;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "notecab",
    version,
    about = "Cabinet-organized notes with ordered sync",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "notecabrc")]
    pub notecabrc: Option<PathBuf>,

    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Note positions are 1-based, in display order.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List cabinets, marking the current one
    Cabinets,
    /// Create a cabinet and switch to it
    CabinetAdd { name: String },
    /// Delete a cabinet and all of its notes
    CabinetRm { cabinet: String },
    /// Switch to a cabinet by name or id
    Use { cabinet: String },
    /// List notes of the current cabinet
    Notes,
    /// Append a note to the current cabinet
    Add {
        #[arg(long, default_value = "standard")]
        kind: NoteKind,
        #[arg(long, default_value = "")]
        title: String,
    },
    /// Edit a rich-text note
    Edit {
        index: usize,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a note
    Rm { index: usize },
    /// Move a note from one position to another
    Move { from: usize, to: usize },
    /// Append a task to a task note
    TaskAdd { index: usize, text: String },
    /// Mark a task (1-based) of a task note as done
    TaskDone { index: usize, task: usize },
    /// Set the text for a day of a calendar note
    Day {
        index: usize,
        date: NaiveDate,
        text: String,
    },
    /// Add another view to a calendar note
    ViewAdd { index: usize },
    /// Print one note in full
    Show { index: usize },
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Global options that take the next word as their value.
const VALUE_OPTIONS: [&str; 3] = ["--rc", "--notecabrc", "--data"];

/// Pulls bare `rc.KEY=VALUE` / `rc.KEY:VALUE` words out of the global
/// options ahead of the subcommand. Everything from the subcommand on is left
/// untouched, so titles and texts starting with `rc.` survive.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    let mut in_options = true;
    let mut expect_value = false;
    for arg in iter {
        if in_options {
            let s = arg.to_string_lossy();
            if expect_value {
                expect_value = false;
            } else if s == "--" {
                in_options = false;
            } else if let Some(rest) = s.strip_prefix("rc.")
                && let Some((k, v)) = rest.split_once('=').or_else(|| rest.split_once(':'))
            {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k.to_string(), v.to_string()));
                continue;
            } else if s.starts_with('-') {
                expect_value = VALUE_OPTIONS.contains(&s.as_ref());
            } else {
                in_options = false;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

/// Converts a 1-based position to an index, rejecting 0.
pub fn position(index: usize) -> anyhow::Result<usize> {
    index
        .checked_sub(1)
        .ok_or_else(|| anyhow!("positions start at 1"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(words: &[&str]) -> Vec<OsString> {
        words.iter().map(OsString::from).collect()
    }

    #[test]
    fn positional_rc_overrides_are_extracted() {
        let pre = preprocess_args(&args(&["notecab", "rc.api.url=http://x:1", "notes"]))
            .expect("preprocess");
        assert_eq!(
            pre.rc_overrides,
            vec![("api.url".to_string(), "http://x:1".to_string())]
        );
        assert_eq!(pre.cleaned_args, args(&["notecab", "notes"]));
    }

    #[test]
    fn rc_words_after_the_subcommand_are_left_alone() {
        let raw = args(&[
            "notecab",
            "-v",
            "--data",
            "rc.d:x",
            "rc.color=off",
            "add",
            "--title",
            "rc.v2: plan",
        ]);
        let pre = preprocess_args(&raw).expect("preprocess");
        assert_eq!(pre.rc_overrides, vec![("color".to_string(), "off".to_string())]);
        assert_eq!(
            pre.cleaned_args,
            args(&["notecab", "-v", "--data", "rc.d:x", "add", "--title", "rc.v2: plan"])
        );

        let cli = GlobalCli::parse_from(pre.cleaned_args);
        assert_eq!(
            cli.command,
            Command::Add {
                kind: NoteKind::Standard,
                title: "rc.v2: plan".to_string(),
            }
        );
    }

    #[test]
    fn parses_add_with_kind_alias() {
        let cli = GlobalCli::parse_from(["notecab", "-v", "add", "--kind", "cal", "--title", "Q1"]);
        assert_eq!(cli.verbose, 1);
        assert_eq!(
            cli.command,
            Command::Add {
                kind: NoteKind::Calendar,
                title: "Q1".to_string(),
            }
        );
    }

    #[test]
    fn parses_day_with_iso_date() {
        let cli = GlobalCli::parse_from(["notecab", "day", "2", "2026-03-02", "dentist"]);
        assert_eq!(
            cli.command,
            Command::Day {
                index: 2,
                date: NaiveDate::from_ymd_opt(2026, 3, 2).expect("date"),
                text: "dentist".to_string(),
            }
        );
    }

    #[test]
    fn zero_position_is_rejected() {
        assert!(position(0).is_err());
        assert_eq!(position(3).expect("position"), 2);
    }
}
