//! # Biblio Console
//!
//! Menu-driven console application for the library catalog.
//!
//! ## Usage
//! ```bash
//! # Open (or create) the default database
//! cargo run -p biblio-console
//!
//! # Specify a database path
//! cargo run -p biblio-console -- --db ./data/biblio.db
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (RUST_LOG overrides the default filter)
//! 2. Parse command line arguments
//! 3. Connect to SQLite and run migrations
//! 4. Enter the main menu loop
//!
//! An unreachable store at startup is fatal; every error after that is
//! displayed and the loop continues.

mod menus;

use std::env;

use tracing::info;
use tracing_subscriber::EnvFilter;

use biblio_db::{Database, DbConfig};

#[tokio::main]
async fn main() {
    init_tracing();

    let mut db_path = String::from("./biblio.db");

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Biblio - library catalog console");
                println!();
                println!("Usage: biblio [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./biblio.db)");
                println!("  -h, --help         Show this help message");
                return;
            }
            _ => {}
        }
        i += 1;
    }

    info!(path = %db_path, "Starting Biblio console");

    let db = match Database::new(DbConfig::new(&db_path)).await {
        Ok(db) => db,
        Err(e) => {
            // The one unrecovered failure: no store, no application.
            eprintln!("FATAL: could not open database '{}': {}", db_path, e);
            std::process::exit(1);
        }
    };

    println!("{}", "=".repeat(60));
    println!("  BIBLIO - LIBRARY CATALOG");
    println!("{}", "=".repeat(60));

    run(&db).await;

    db.close().await;
    println!("\nGoodbye!");
}

/// Main menu loop.
async fn run(db: &Database) {
    loop {
        println!();
        println!("--- Main Menu ---");
        println!("  1. Books");
        println!("  2. Authors");
        println!("  3. Categories");
        println!("  4. Patrons");
        println!("  5. Loans");
        println!("  6. Reports");
        println!("  7. Quit");

        match menus::read_line("Select an option").as_str() {
            "1" => menus::books_menu(db).await,
            "2" => menus::authors_menu(db).await,
            "3" => menus::categories_menu(db).await,
            "4" => menus::patrons_menu(db).await,
            "5" => menus::loans_menu(db).await,
            "6" => reports(db).await,
            "7" | "q" => break,
            _ => menus::print_error("Invalid option"),
        }
    }
}

/// Summary counts and most-borrowed titles.
async fn reports(db: &Database) {
    println!();
    println!("--- Reports ---");

    let books = db.books().list().await;
    let available = db.books().list_available().await;
    let patrons = db.patrons().list().await;
    let outstanding = db.loans().list_outstanding().await;
    let overdue = db.loans().list_overdue().await;

    match (books, available, patrons, outstanding, overdue) {
        (Ok(books), Ok(available), Ok(patrons), Ok(outstanding), Ok(overdue)) => {
            let active_patrons = patrons.iter().filter(|p| p.is_active()).count();

            println!("  Total books:        {}", books.len());
            println!("  Available books:    {}", available.len());
            println!("  Active patrons:     {}", active_patrons);
            println!("  Outstanding loans:  {}", outstanding.len());
            println!("  Overdue loans:      {}", overdue.len());

            // Most-borrowed titles, by total loan count.
            let mut counts: Vec<(String, usize)> = Vec::new();
            for book in &books {
                if let Ok(history) = db.loans().list_by_book(book.id).await {
                    if !history.is_empty() {
                        counts.push((book.title.clone(), history.len()));
                    }
                }
            }
            counts.sort_by(|a, b| b.1.cmp(&a.1));

            if !counts.is_empty() {
                println!();
                println!("  Most borrowed:");
                for (title, count) in counts.iter().take(5) {
                    println!("    {title}: {count} loan(s)");
                }
            }
        }
        _ => menus::print_error("Could not gather report data"),
    }

    menus::pause();
}

fn init_tracing() {
    // Default to warnings only so log lines don't tear the menus; turn up
    // with RUST_LOG=biblio_db=debug when troubleshooting.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
