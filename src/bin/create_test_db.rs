use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use budget_board::{UserId, initialize_db, load_seed_file, seed_database};

/// A utility for creating a test database for budget_board.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// File path to a JSON file of mock transactions, to-dos, goals and accounts.
    #[arg(long, short)]
    seed_path: Option<PathBuf>,

    /// The user the mock data belongs to.
    #[arg(long, default_value_t = 1)]
    user_id: UserId,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    if let Some(seed_path) = &args.seed_path {
        println!("Loading mock data from {seed_path:#?}...");
        let data = load_seed_file(seed_path)?;
        let summary = seed_database(data, args.user_id, &conn)?;
        println!(
            "Inserted {} transactions, {} to-dos, {} goals and {} accounts ({} skipped).",
            summary.transactions, summary.todos, summary.goals, summary.accounts, summary.skipped
        );
    }

    println!("Success!");

    Ok(())
}
