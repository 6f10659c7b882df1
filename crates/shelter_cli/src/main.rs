//! CLI entry point for the shelter record store.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `shelter_core` linkage.
//! - Drive the catalog flows (sample insert, list, bulk delete) and the
//!   single-record editor flows (create, show, edit, delete) from a shell.

use clap::{Parser, Subcommand, ValueEnum};
use shelter_core::{
    default_log_level, init_logging, Classifier, Column, Projection, ProviderError, Record,
    RecordProvider, RecordStore, RecordValues, ResourceId, Selection, SortOrder,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const CATEGORY_FALLBACK: &str = "Unknown category";

/// Shelter record store command-line client
#[derive(Parser, Debug)]
#[command(name = "shelter_cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Database file; an in-memory store is used when omitted
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Directory for rolling log files; logging stays off when omitted
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Print the core health-check answer
    Ping,

    /// Print the core crate version
    Version,

    /// Insert the Toto/Terrier sample record
    InsertDummy,

    /// List every record, ordered by id
    List,

    /// Create a record from the given fields
    Insert {
        #[arg(long)]
        name: String,

        #[arg(long)]
        category: Option<String>,

        #[arg(long, value_enum, default_value_t = ClassifierArg::Unknown)]
        classifier: ClassifierArg,

        /// Defaults to 0 when omitted
        #[arg(long, allow_negative_numbers = true)]
        measure: Option<i64>,
    },

    /// Print one record
    Show { id: i64 },

    /// Change the given fields of one record
    Update {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long, value_enum)]
        classifier: Option<ClassifierArg>,

        #[arg(long, allow_negative_numbers = true)]
        measure: Option<i64>,
    },

    /// Delete one record
    Delete { id: i64 },

    /// Delete every record
    DeleteAll,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ClassifierArg {
    Unknown,
    A,
    B,
}

impl From<ClassifierArg> for Classifier {
    fn from(value: ClassifierArg) -> Self {
        match value {
            ClassifierArg::Unknown => Classifier::Unknown,
            ClassifierArg::A => Classifier::A,
            ClassifierArg::B => Classifier::B,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    if let Some(dir) = &cli.log_dir {
        init_logging(default_log_level(), &dir.to_string_lossy()).map_err(|err| err.to_string())?;
    }

    match cli.command {
        Command::Ping => println!("shelter_core ping={}", shelter_core::ping()),
        Command::Version => println!("shelter_core version={}", shelter_core::core_version()),
        _ => {
            let provider = open_provider(cli.db.as_deref())?;
            for line in execute(&provider, &cli.command)? {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn open_provider(db: Option<&Path>) -> Result<RecordProvider, String> {
    let store = match db {
        Some(path) => RecordStore::open_file(path),
        None => RecordStore::open_in_memory(),
    }
    .map_err(|err| err.to_string())?;
    Ok(RecordProvider::new(store))
}

/// Runs a store-backed command and returns the lines to print.
fn execute(provider: &RecordProvider, command: &Command) -> Result<Vec<String>, String> {
    match command {
        Command::Ping | Command::Version => Ok(Vec::new()),
        Command::InsertDummy => {
            let values = RecordValues::new()
                .with(Column::Name, "Toto")
                .with(Column::Category, "Terrier")
                .with(Column::Classifier, Classifier::A)
                .with(Column::Measure, 7_i64);
            let item = provider.insert("records", &values).map_err(user_message)?;
            Ok(vec![format!("inserted {item}")])
        }
        Command::List => {
            let records = provider
                .query(
                    "records",
                    &Projection::all(),
                    &Selection::all(),
                    &SortOrder::default(),
                )
                .map_err(user_message)?
                .records()
                .map_err(|err| err.to_string())?;
            let mut lines = records.iter().map(describe).collect::<Vec<_>>();
            lines.push(format!("{} record(s)", records.len()));
            Ok(lines)
        }
        Command::Insert {
            name,
            category,
            classifier,
            measure,
        } => {
            let mut values = RecordValues::new()
                .with(Column::Name, name.trim())
                .with(Column::Classifier, Classifier::from(*classifier));
            if let Some(category) = non_blank(category.as_deref()) {
                values.put(Column::Category, category);
            }
            if let Some(measure) = measure {
                values.put(Column::Measure, *measure);
            }
            let item = provider.insert("records", &values).map_err(user_message)?;
            Ok(vec![format!("record saved as {item}")])
        }
        Command::Show { id } => {
            let records = provider
                .query(
                    &ResourceId::Item(*id),
                    &Projection::all(),
                    &Selection::all(),
                    &SortOrder::default(),
                )
                .map_err(user_message)?
                .records()
                .map_err(|err| err.to_string())?;
            match records.first() {
                Some(record) => Ok(vec![describe(record)]),
                None => Err(missing_record(*id)),
            }
        }
        Command::Update {
            id,
            name,
            category,
            classifier,
            measure,
        } => {
            let mut values = RecordValues::new();
            if let Some(name) = name {
                values.put(Column::Name, name.trim());
            }
            if let Some(category) = category {
                values.put(Column::Category, category.trim());
            }
            if let Some(classifier) = classifier {
                values.put(Column::Classifier, Classifier::from(*classifier));
            }
            if let Some(measure) = measure {
                values.put(Column::Measure, *measure);
            }
            if values.is_empty() {
                return Err("nothing to update: pass at least one field".to_string());
            }

            let changed = provider
                .update(&ResourceId::Item(*id), &values, &Selection::all())
                .map_err(user_message)?;
            if changed == 0 {
                return Err(missing_record(*id));
            }
            Ok(vec![format!("record {id} updated")])
        }
        Command::Delete { id } => {
            let deleted = provider
                .delete(&ResourceId::Item(*id), &Selection::all())
                .map_err(user_message)?;
            if deleted == 0 {
                return Err(missing_record(*id));
            }
            Ok(vec![format!("record {id} deleted")])
        }
        Command::DeleteAll => {
            let deleted = provider
                .delete("records", &Selection::all())
                .map_err(user_message)?;
            Ok(vec![format!("deleted {deleted} record(s)")])
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn missing_record(id: i64) -> String {
    format!("no record with id {id}")
}

fn user_message(err: ProviderError) -> String {
    match err {
        ProviderError::InvalidField(Column::Name) => "a record needs a non-blank name".to_string(),
        ProviderError::InvalidField(Column::Classifier) => {
            "classifier must be one of unknown, a, b".to_string()
        }
        ProviderError::InvalidField(Column::Measure) => {
            "measure must be zero or a positive whole number".to_string()
        }
        ProviderError::InvalidField(Column::Id) => "record ids are assigned by the store".to_string(),
        other => other.to_string(),
    }
}

fn describe(record: &Record) -> String {
    let category = non_blank(record.category.as_deref()).unwrap_or(CATEGORY_FALLBACK);
    format!(
        "{}\t{}\t{}\t{:?}\t{}",
        record.id, record.name, category, record.classifier, record.measure
    )
}

#[cfg(test)]
mod tests {
    use super::{describe, execute, ClassifierArg, Cli, Command};
    use clap::Parser;
    use shelter_core::{Classifier, Record, RecordProvider, RecordStore};
    use std::path::Path;

    fn provider() -> RecordProvider {
        RecordProvider::new(RecordStore::open_in_memory().unwrap())
    }

    fn command(args: &[&str]) -> Command {
        let mut argv = vec!["shelter_cli"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn global_options_parse_in_any_position() {
        let cli = Cli::try_parse_from(["shelter_cli", "list", "--db", "/tmp/a.db"]).unwrap();
        assert_eq!(cli.command, Command::List);
        assert_eq!(cli.db.as_deref(), Some(Path::new("/tmp/a.db")));
        assert!(cli.log_dir.is_none());

        let cli = Cli::try_parse_from(["shelter_cli", "--log-dir", "logs", "ping"]).unwrap();
        assert_eq!(cli.command, Command::Ping);
        assert_eq!(cli.log_dir.as_deref(), Some(Path::new("logs")));
    }

    #[test]
    fn rejects_missing_values_and_unknown_commands() {
        assert!(Cli::try_parse_from(["shelter_cli", "--db"]).is_err());
        assert!(Cli::try_parse_from(["shelter_cli"]).is_err());
        assert!(Cli::try_parse_from(["shelter_cli", "list", "ping"]).is_err());
        assert!(Cli::try_parse_from(["shelter_cli", "insert"]).is_err());
        assert!(Cli::try_parse_from(["shelter_cli", "insert", "--name", "x", "--classifier", "c"]).is_err());
    }

    #[test]
    fn insert_parses_fields_and_defaults_classifier() {
        assert_eq!(
            command(&["insert", "--name", "Rex", "--measure", "-2"]),
            Command::Insert {
                name: "Rex".to_string(),
                category: None,
                classifier: ClassifierArg::Unknown,
                measure: Some(-2),
            }
        );
    }

    #[test]
    fn insert_then_show_prints_the_record() {
        let provider = provider();
        let lines = execute(
            &provider,
            &command(&[
                "insert", "--name", " Rex ", "--category", "Collie", "--classifier", "b",
                "--measure", "12",
            ]),
        )
        .unwrap();
        assert_eq!(lines, vec!["record saved as records/1"]);

        let lines = execute(&provider, &command(&["show", "1"])).unwrap();
        assert_eq!(lines, vec!["1\tRex\tCollie\tB\t12"]);
    }

    #[test]
    fn insert_reports_invalid_fields_in_plain_words() {
        let provider = provider();
        let err = execute(&provider, &command(&["insert", "--name", "   "])).unwrap_err();
        assert_eq!(err, "a record needs a non-blank name");

        let err = execute(
            &provider,
            &command(&["insert", "--name", "Rex", "--measure", "-1"]),
        )
        .unwrap_err();
        assert_eq!(err, "measure must be zero or a positive whole number");

        let lines = execute(&provider, &command(&["list"])).unwrap();
        assert_eq!(lines, vec!["0 record(s)"]);
    }

    #[test]
    fn update_changes_only_given_fields() {
        let provider = provider();
        execute(&provider, &command(&["insert-dummy"])).unwrap();

        let lines = execute(&provider, &command(&["update", "1", "--measure", "9"])).unwrap();
        assert_eq!(lines, vec!["record 1 updated"]);
        let lines = execute(&provider, &command(&["show", "1"])).unwrap();
        assert_eq!(lines, vec!["1\tToto\tTerrier\tA\t9"]);

        let err = execute(&provider, &command(&["update", "1"])).unwrap_err();
        assert!(err.starts_with("nothing to update"));
        let err = execute(&provider, &command(&["update", "5", "--name", "Ghost"])).unwrap_err();
        assert_eq!(err, "no record with id 5");
    }

    #[test]
    fn delete_removes_one_record() {
        let provider = provider();
        execute(&provider, &command(&["insert-dummy"])).unwrap();
        execute(&provider, &command(&["insert-dummy"])).unwrap();

        let lines = execute(&provider, &command(&["delete", "1"])).unwrap();
        assert_eq!(lines, vec!["record 1 deleted"]);
        assert_eq!(
            execute(&provider, &command(&["show", "1"])).unwrap_err(),
            "no record with id 1"
        );
        assert_eq!(
            execute(&provider, &command(&["delete", "1"])).unwrap_err(),
            "no record with id 1"
        );

        let lines = execute(&provider, &command(&["delete-all"])).unwrap();
        assert_eq!(lines, vec!["deleted 1 record(s)"]);
    }

    #[test]
    fn empty_category_uses_display_default() {
        let record = Record {
            id: 1,
            name: "Toto".to_string(),
            category: Some(String::new()),
            classifier: Classifier::A,
            measure: 7,
        };
        assert!(describe(&record).contains("Unknown category"));
    }
}
