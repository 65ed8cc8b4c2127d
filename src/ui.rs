// UI layer: runs one resolved `Command` against the job and POC stores.
// Prompts go through a `Prompter` and everything shown to the user is
// written to `out`, so the same flows run on a terminal or under test.

use crate::builder::build_record;
use crate::cli::{Command, Filter};
use crate::config::Config;
use crate::prompt::Prompter;
use crate::record::{encode, Job, Poc, Record, RecordKind};
use crate::store::{Change, RecordStore};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::io::Write;

/// Both data files, opened together. Nothing runs unless both are
/// readable.
#[derive(Debug)]
pub struct Stores {
    pub jobs: RecordStore<Job>,
    pub pocs: RecordStore<Poc>,
}

impl Stores {
    pub fn open(config: &Config) -> Result<Self> {
        let jobs = RecordStore::open(config.job_path()).context("Can't find the data files")?;
        let pocs = RecordStore::open(config.poc_path()).context("Can't find the data files")?;
        Ok(Stores { jobs, pocs })
    }
}

/// How an add, update or delete ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Added(RecordKind, u32),
    Updated(RecordKind, u32),
    Deleted(RecordKind, u32),
    NotFound(RecordKind, u32),
    Cancelled,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Added(kind, n) => write!(f, "New {} {} added to database", kind, n),
            Outcome::Updated(kind, n) => write!(f, "Updated {} {}", kind, n),
            Outcome::Deleted(kind, n) => write!(f, "Deleted {} {}", kind, n),
            Outcome::NotFound(kind, n) => write!(f, "No {} with record number {}", kind, n),
            Outcome::Cancelled => f.write_str("Input cancelled"),
        }
    }
}

/// Execute `command`. Listings and outcomes are written to `out`.
pub fn run(
    command: &Command,
    stores: &Stores,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
) -> Result<()> {
    let outcome = match *command {
        Command::List {
            kind,
            ref filter,
            json,
        } => return list(stores, kind, filter, json, out),
        Command::Add(RecordKind::Job) => add_record(&stores.jobs, prompter, out)?,
        Command::Add(RecordKind::Poc) => add_record(&stores.pocs, prompter, out)?,
        Command::Update(RecordKind::Job, n) => update_record(&stores.jobs, n, prompter, out)?,
        Command::Update(RecordKind::Poc, n) => update_record(&stores.pocs, n, prompter, out)?,
        Command::Delete(RecordKind::Job, n) => delete_record(&stores.jobs, n, prompter, out)?,
        Command::Delete(RecordKind::Poc, n) => delete_record(&stores.pocs, n, prompter, out)?,
    };
    writeln!(out, "{}", outcome)?;
    Ok(())
}

/// Records of one store matching `filter`, in file order.
pub fn select<R: Record>(store: &RecordStore<R>, filter: &Filter) -> Result<Vec<R>> {
    let records = match filter {
        Filter::Text(text) => store.search(text)?,
        Filter::Number(n) => store.find(*n)?.into_iter().collect(),
    };
    Ok(records)
}

#[derive(Serialize)]
struct Listing<'a> {
    pocs: &'a [Poc],
    jobs: &'a [Job],
}

fn list(
    stores: &Stores,
    kind: Option<RecordKind>,
    filter: &Filter,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    match kind {
        Some(RecordKind::Job) => show(out, &select(&stores.jobs, filter)?, json, false),
        Some(RecordKind::Poc) => show(out, &select(&stores.pocs, filter)?, json, false),
        None => {
            let pocs = select(&stores.pocs, filter)?;
            let jobs = select(&stores.jobs, filter)?;
            if json {
                let listing = Listing {
                    pocs: &pocs,
                    jobs: &jobs,
                };
                serde_json::to_writer_pretty(&mut *out, &listing)?;
                writeln!(out)?;
                return Ok(());
            }
            // Mixed listings say which file each hit came from.
            show(out, &pocs, false, true)?;
            show(out, &jobs, false, true)
        }
    }
}

fn show<R: Record>(out: &mut dyn Write, records: &[R], json: bool, labelled: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, records)?;
        writeln!(out)?;
        return Ok(());
    }
    for record in records {
        if labelled {
            write!(out, "{} - ", R::KIND)?;
        }
        writeln!(out, "{}\n", record)?;
    }
    Ok(())
}

/// Ask for a new record, show it and append it once confirmed.
pub fn add_record<R: Record>(
    store: &RecordStore<R>,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
) -> Result<Outcome> {
    // Number first, so the user sees the line exactly as it will be stored.
    let number = store.next_record_number()?;
    let record: R = build_record(prompter, number, None)?;

    // Show the new line and ask before writing anything.
    writeln!(out, "adding a new {}:\n{}", R::KIND, encode(&record))?;
    if !prompter.confirm(&format!("Add this new {}?", R::KIND))? {
        return Ok(Outcome::Cancelled);
    }
    store.append(&record).context("Error writing to file")?;
    Ok(Outcome::Added(R::KIND, number))
}

/// Ask for new values for record `number`, current values offered as
/// defaults, and replace it once confirmed.
pub fn update_record<R: Record>(
    store: &RecordStore<R>,
    number: u32,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
) -> Result<Outcome> {
    // Nothing is asked for a record that isn't there.
    let Some(current) = store.find(number)? else {
        return Ok(Outcome::NotFound(R::KIND, number));
    };
    writeln!(out, "updating {}:\n{}\n", R::KIND, current)?;

    // Each prompt offers the current value; Enter keeps it.
    let record: R = build_record(prompter, number, Some(&current))?;
    writeln!(out, "new values:\n{}", encode(&record))?;
    if !prompter.confirm(&format!("Update this {}?", R::KIND))? {
        return Ok(Outcome::Cancelled);
    }

    match store.update(&record).context("Error writing to file")? {
        Change::Applied => Ok(Outcome::Updated(R::KIND, number)),
        Change::NotFound => Ok(Outcome::NotFound(R::KIND, number)),
    }
}

/// Show record `number` and remove it once confirmed.
pub fn delete_record<R: Record>(
    store: &RecordStore<R>,
    number: u32,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
) -> Result<Outcome> {
    let Some(current) = store.find(number)? else {
        return Ok(Outcome::NotFound(R::KIND, number));
    };
    writeln!(out, "{}\n", current)?;
    if !prompter.confirm(&format!("Delete this {}?", R::KIND))? {
        return Ok(Outcome::Cancelled);
    }

    match store.delete(number).context("Error writing to file")? {
        Change::Applied => Ok(Outcome::Deleted(R::KIND, number)),
        Change::NotFound => Ok(Outcome::NotFound(R::KIND, number)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use std::fs;
    use tempfile::TempDir;

    const JOBS: &str = "2; Automation Engineer; Yes; Excel, Python, Bash, VBA; sprint; sprint.com; Ulysees; 2023; 2023\n\
3; Junior Developer; Yes; PYthon, Javascript, Kubernetes, Docker; localcompany; local.comp.com; James Battersey; 2023; 2023\n";

    const POCS: &str = "# name; company; phone; email; first; last\n\
1; Frank Green Zappa; United Music Federation; 0225 666 444; zappa@UMF.com; 2023; 2023\n\
2; Killian; Run Fast; 8666544646; kill@run.com; 2023; 2023\n\
3; Shannon Docherty; JustInTime; 545488844; shannon@JIT.com; 2023; 2023\n\
4; Jason Bourne; Blackrock; 555-898-9944; jason@blackrock.quiet.com; 20070305; 20220118\n";

    fn setup() -> (TempDir, Stores) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("jobs.txt"), JOBS).unwrap();
        fs::write(dir.path().join("pocs.txt"), POCS).unwrap();
        let config = Config::default().with_data_dir(Some(dir.path().to_path_buf()));
        let stores = Stores::open(&config).unwrap();
        (dir, stores)
    }

    fn run_to_string(command: Command, stores: &Stores, prompter: &mut ScriptedPrompter) -> String {
        let mut out = Vec::new();
        run(&command, stores, prompter, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn stores_need_both_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("jobs.txt"), JOBS).unwrap();
        let config = Config::default().with_data_dir(Some(dir.path().to_path_buf()));
        let err = Stores::open(&config).unwrap_err();
        assert_eq!(err.to_string(), "Can't find the data files");
    }

    #[test]
    fn add_appends_after_confirmation() {
        let (_dir, stores) = setup();
        let mut p = ScriptedPrompter::new([
            "fred", "y", "rust", "Acme", "acme.com", "Ann", "20230413", "20230413", "yes",
        ]);
        let mut out = Vec::new();
        let outcome = add_record(&stores.jobs, &mut p, &mut out).unwrap();

        assert_eq!(outcome, Outcome::Added(RecordKind::Job, 4));
        assert_eq!(
            stores.jobs.load().unwrap().last().unwrap(),
            "4; fred; y; rust; Acme; acme.com; Ann; 20230413; 20230413"
        );
    }

    // Confirms, but swaps the data file for a directory first so the
    // following write cannot succeed.
    struct SwapOnConfirm {
        answers: ScriptedPrompter,
        path: std::path::PathBuf,
    }

    impl Prompter for SwapOnConfirm {
        fn ask(&mut self, field: &str, default: Option<&str>) -> Result<String> {
            self.answers.ask(field, default)
        }

        fn confirm(&mut self, _prompt: &str) -> Result<bool> {
            fs::remove_file(&self.path)?;
            fs::create_dir(&self.path)?;
            Ok(true)
        }

        fn notify(&mut self, message: &str) {
            self.answers.notify(message);
        }
    }

    #[test]
    fn add_reports_write_failure() {
        let (_dir, stores) = setup();
        let mut p = SwapOnConfirm {
            answers: ScriptedPrompter::new(["Ann", "", "", "", "", ""]),
            path: stores.pocs.path().to_path_buf(),
        };
        let mut out = Vec::new();
        let err = add_record(&stores.pocs, &mut p, &mut out).unwrap_err();
        assert_eq!(err.to_string(), "Error writing to file");
        assert!(matches!(
            err.downcast_ref::<crate::store::StoreError>(),
            Some(crate::store::StoreError::Write { .. })
        ));
    }

    #[test]
    fn add_declined_changes_nothing() {
        let (_dir, stores) = setup();
        let mut p = ScriptedPrompter::new(["Ann", "", "", "", "", "", "n"]);
        let output = run_to_string(Command::Add(RecordKind::Poc), &stores, &mut p);
        assert!(output.ends_with("Input cancelled\n"));
        assert_eq!(fs::read_to_string(stores.pocs.path()).unwrap(), POCS);
    }

    #[test]
    fn update_replaces_record() {
        let (_dir, stores) = setup();
        let mut p = ScriptedPrompter::new([
            "Harry Potter",
            "company five",
            "555-865865",
            "harry_potter@five.com",
            "20230401",
            "20230112",
            "y",
        ]);
        let output = run_to_string(Command::Update(RecordKind::Poc, 4), &stores, &mut p);
        assert!(output.ends_with("Updated poc 4\n"));
        assert_eq!(
            stores.pocs.load().unwrap().last().unwrap(),
            "4; Harry Potter; company five; 555-865865; harry_potter@five.com; 20230401; 20230112"
        );
        assert_eq!(stores.pocs.records().unwrap().len(), 4);
    }

    #[test]
    fn update_of_unknown_record_asks_nothing() {
        let (_dir, stores) = setup();
        let mut p = ScriptedPrompter::new(["never used"]);
        let mut out = Vec::new();
        let outcome = update_record(&stores.jobs, 9, &mut p, &mut out).unwrap();
        assert_eq!(outcome, Outcome::NotFound(RecordKind::Job, 9));
        assert_eq!(p.remaining(), 1);
        assert_eq!(fs::read_to_string(stores.jobs.path()).unwrap(), JOBS);
    }

    #[test]
    fn delete_after_confirmation() {
        let (_dir, stores) = setup();
        let mut p = ScriptedPrompter::new(["y"]);
        let output = run_to_string(Command::Delete(RecordKind::Poc, 4), &stores, &mut p);
        assert!(output.contains("name: Jason Bourne"));
        assert!(output.ends_with("Deleted poc 4\n"));
        assert_eq!(
            stores.pocs.load().unwrap().last().unwrap(),
            "3; Shannon Docherty; JustInTime; 545488844; shannon@JIT.com; 2023; 2023"
        );
    }

    #[test]
    fn delete_declined_or_missing_changes_nothing() {
        let (_dir, stores) = setup();
        let mut p = ScriptedPrompter::new(["nope"]);
        let mut out = Vec::new();
        assert_eq!(
            delete_record(&stores.pocs, 2, &mut p, &mut out).unwrap(),
            Outcome::Cancelled
        );
        assert_eq!(
            delete_record(&stores.pocs, 20, &mut p, &mut out).unwrap(),
            Outcome::NotFound(RecordKind::Poc, 20)
        );
        assert_eq!(fs::read_to_string(stores.pocs.path()).unwrap(), POCS);
    }

    #[test]
    fn list_searches_within_type() {
        let (_dir, stores) = setup();
        let mut p = ScriptedPrompter::default();
        let output = run_to_string(
            Command::List {
                kind: Some(RecordKind::Job),
                filter: Filter::Text("Sprint".into()),
                json: false,
            },
            &stores,
            &mut p,
        );
        assert!(output.starts_with("record_number: 2\ntitle: Automation Engineer\n"));
        assert!(!output.contains("Junior Developer"));
    }

    #[test]
    fn list_by_record_number() {
        let (_dir, stores) = setup();
        let mut p = ScriptedPrompter::default();
        let filter = Filter::Number(3);
        assert_eq!(select(&stores.jobs, &filter).unwrap()[0].title, "Junior Developer");
        assert!(select(&stores.pocs, &Filter::Number(30)).unwrap().is_empty());

        let output = run_to_string(
            Command::List {
                kind: Some(RecordKind::Poc),
                filter,
                json: false,
            },
            &stores,
            &mut p,
        );
        assert!(output.starts_with("record_number: 3\nname: Shannon Docherty\n"));
    }

    #[test]
    fn mixed_listing_labels_each_hit() {
        let (_dir, stores) = setup();
        let mut p = ScriptedPrompter::default();
        let output = run_to_string(
            Command::List {
                kind: None,
                filter: Filter::Text("killian".into()),
                json: false,
            },
            &stores,
            &mut p,
        );
        assert_eq!(
            output,
            "poc - record_number: 2\nname: Killian\ncompany: Run Fast\nphone: 8666544646\n\
             email: kill@run.com\nfirst_contact: 2023\nlast_contact: 2023\n\n"
        );
    }

    #[test]
    fn json_listing() {
        let (_dir, stores) = setup();
        let mut p = ScriptedPrompter::default();
        let output = run_to_string(
            Command::List {
                kind: None,
                filter: Filter::Text(String::new()),
                json: true,
            },
            &stores,
            &mut p,
        );
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["pocs"].as_array().unwrap().len(), 4);
        assert_eq!(value["jobs"][1]["title"], "Junior Developer");
    }
}
