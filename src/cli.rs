// Command-line surface. `Cli` is what clap parses; `Cli::resolve` turns
// the flags into a single `Command` and reports combinations clap cannot
// express on its own (an action without a record type).

use crate::record::RecordKind;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "job-seeker", version, about = "Track data on job applications")]
#[command(group(ArgGroup::new("action").args(["add", "update", "delete"])))]
pub struct Cli {
    /// Use the job records
    #[arg(short, long, conflicts_with = "poc")]
    pub job: bool,

    /// Use the POC records
    #[arg(short, long)]
    pub poc: bool,

    /// Add a record, requires --job or --poc
    #[arg(short, long)]
    pub add: bool,

    /// Update the record with this number, requires --job or --poc
    #[arg(short, long, value_name = "N")]
    pub update: Option<u32>,

    /// Delete the record with this number, requires --job or --poc
    #[arg(short, long, value_name = "N")]
    pub delete: Option<u32>,

    /// Only show records containing TEXT (any case)
    #[arg(short, long, value_name = "TEXT", conflicts_with_all = ["action", "record"])]
    pub search: Option<String>,

    /// Only show the record with this number, requires --job or --poc
    #[arg(short, long, value_name = "N", conflicts_with = "action")]
    pub record: Option<u32>,

    /// Search jobs and POCs for a name
    #[arg(
        short,
        long,
        value_name = "TEXT",
        conflicts_with_all = ["action", "job", "poc", "search", "record"]
    )]
    pub name: Option<String>,

    /// Print listings as JSON
    #[arg(long, conflicts_with = "action")]
    pub json: bool,

    /// Directory holding the data files
    #[arg(long, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,
}

/// Which records a listing shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Text(String),
    Number(u32),
}

/// What one invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List matching records of one kind, or of both when `kind` is `None`.
    List {
        kind: Option<RecordKind>,
        filter: Filter,
        json: bool,
    },
    Add(RecordKind),
    Update(RecordKind, u32),
    Delete(RecordKind, u32),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("--{0} requires --job or --poc")]
    MissingKind(&'static str),
}

impl Cli {
    pub fn kind(&self) -> Option<RecordKind> {
        if self.job {
            Some(RecordKind::Job)
        } else if self.poc {
            Some(RecordKind::Poc)
        } else {
            None
        }
    }

    pub fn resolve(&self) -> Result<Command, UsageError> {
        let kind = self.kind();
        let require = |flag| kind.ok_or(UsageError::MissingKind(flag));

        if self.add {
            return Ok(Command::Add(require("add")?));
        }
        if let Some(n) = self.update {
            return Ok(Command::Update(require("update")?, n));
        }
        if let Some(n) = self.delete {
            return Ok(Command::Delete(require("delete")?, n));
        }

        let filter = match (self.record, &self.search, &self.name) {
            (Some(n), _, _) => {
                require("record")?;
                Filter::Number(n)
            }
            (None, Some(text), _) | (None, None, Some(text)) => Filter::Text(text.clone()),
            (None, None, None) => Filter::Text(String::new()),
        };
        Ok(Command::List {
            kind,
            filter,
            json: self.json,
        })
    }
}
