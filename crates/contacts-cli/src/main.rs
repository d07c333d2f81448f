use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use contact_store::{ChangeFeed, ContactStore, Contacts};
use database::{account, ContactFields, Database};
use tabular::{export_contacts, export_file_name, load_import_file, ExportFormat, ImportOutcome};
use tracing::info;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Parser)]
#[command(name = "contacts-cli")]
#[command(about = "Export and import worker contacts from the command line")]
struct Args {
    /// SQLite database URL. Falls back to SQLITE_PATH env.
    #[arg(
        long,
        global = true,
        env = "SQLITE_PATH",
        default_value = "sqlite:contacts.db?mode=rwc"
    )]
    database: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write every contact of an account to a CSV or tab-separated file
    Export {
        /// Account email
        #[arg(long)]
        email: String,

        /// csv, or tsv/excel for tab-separated
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Directory for the export file
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Read contacts from a comma, semicolon or tab separated file
    Import {
        /// Account email
        #[arg(long)]
        email: String,

        /// File to import
        #[arg(long)]
        file: PathBuf,

        /// Insert the valid rows; without this only a preview is shown
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let args = Args::parse();

    let db = Database::connect(&args.database).await?;
    db.migrate().await?;

    match args.command {
        Command::Export {
            email,
            format,
            out_dir,
        } => {
            let (path, rows) = export_to_dir(&db, &email, format, &out_dir).await?;
            println!(
                "Exported {} contacts ({}) to {}",
                rows,
                format.label(),
                path.display()
            );
        }
        Command::Import { email, file, yes } => {
            let report = import_file(&db, &email, &file, yes).await?;
            print_report(&report);
        }
    }

    db.close().await;
    Ok(())
}

/// Write the account's contacts to `out_dir`, returning the file and row count.
async fn export_to_dir(
    db: &Database,
    email: &str,
    format: ExportFormat,
    out_dir: &Path,
) -> CliResult<(PathBuf, usize)> {
    let owner = account::get_account_by_email(db.pool(), email).await?;
    let store = ContactStore::new(owner.id.as_str(), Arc::new(db.clone()));
    let contacts = store.contacts().await?;

    let body = export_contacts(contacts.iter().map(|c| &c.fields), format);
    let timestamp = chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string();
    let path = out_dir.join(export_file_name(format, &timestamp));

    tokio::fs::create_dir_all(out_dir).await?;
    tokio::fs::write(&path, body).await?;

    info!(account = %owner.id, path = %path.display(), rows = contacts.len(), "Exported contacts");
    Ok((path, contacts.len()))
}

#[derive(Debug)]
struct ImportReport {
    valid: usize,
    rejected: usize,
    first: Option<ContactFields>,
    imported: Option<usize>,
}

/// Parse `file` and, when `confirmed`, insert its valid rows.
async fn import_file(db: &Database, email: &str, file: &Path, confirmed: bool) -> CliResult<ImportReport> {
    let owner = account::get_account_by_email(db.pool(), email).await?;

    let batch = match load_import_file(file)? {
        ImportOutcome::Ready(batch) => batch,
        outcome @ ImportOutcome::NoValidRows { .. } => {
            return Err(format!(
                "No valid contacts found in {}. Expected headers: {}",
                file.display(),
                outcome.expected_headers().join(", ")
            )
            .into())
        }
    };

    let mut report = ImportReport {
        valid: batch.accepted(),
        rejected: batch.rejected(),
        first: batch.preview().cloned(),
        imported: None,
    };

    if confirmed {
        let contacts = Contacts::new(db.clone(), ChangeFeed::default());
        let created = contacts.import_batch(&owner.id, &batch).await?;
        report.imported = Some(created.len());
    }

    Ok(report)
}

fn print_report(report: &ImportReport) {
    println!(
        "Found {} valid contacts ({} rows skipped)",
        report.valid, report.rejected
    );
    if let Some(first) = &report.first {
        println!("First record: {} ({})", first.full_name, first.phone_number);
    }
    match report.imported {
        Some(count) => println!("Imported {} contacts", count),
        None => println!("Run again with --yes to import these contacts"),
    }
}
