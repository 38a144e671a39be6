//! # Menus
//!
//! Submenus, prompts, and table rendering for the console application.
//!
//! Everything free-text lives here: ids and day counts are parsed and
//! validated before a repository is invoked, and repository errors come
//! back as values that get displayed, never as panics.

use std::io::{self, Write};

use biblio_core::{
    validation, Author, AuthorPatch, Book, BookPatch, Category, CategoryPatch, NewAuthor, NewBook,
    NewCategory, NewPatron, Patron, PatronPatch, DEFAULT_LOAN_PERIOD_DAYS,
};
use biblio_db::{Database, LoanRecord, RepoError};

// =============================================================================
// Input Helpers
// =============================================================================

/// Prompts and reads one trimmed line from stdin.
pub fn read_line(prompt: &str) -> String {
    print!("{}: ", prompt);
    let _ = io::stdout().flush();

    let mut buf = String::new();
    if io::stdin().read_line(&mut buf).is_err() {
        return String::new();
    }
    buf.trim().to_string()
}

/// Reads an optional value; empty input becomes None.
fn read_opt(prompt: &str) -> Option<String> {
    let value = read_line(prompt);
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Reads an integer id; reports bad input and returns None.
fn read_id(prompt: &str) -> Option<i64> {
    let value = read_line(prompt);
    match value.parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            print_error("Please enter a numeric id");
            None
        }
    }
}

/// Reads a positive integer, falling back to `default` on empty input.
fn read_i64_or(prompt: &str, default: i64) -> Option<i64> {
    let value = read_line(prompt);
    if value.is_empty() {
        return Some(default);
    }
    match value.parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) => {
            print_error("Please enter a whole number");
            None
        }
    }
}

/// Yes/no confirmation.
fn confirm(prompt: &str) -> bool {
    let answer = read_line(&format!("{} (y/n)", prompt));
    matches!(answer.to_lowercase().as_str(), "y" | "yes")
}

/// Waits for Enter.
pub fn pause() {
    let _ = read_line("\nPress Enter to continue");
}

pub fn print_error(message: &str) {
    println!("  [ERROR] {}", message);
}

pub fn print_success(message: &str) {
    println!("  [OK] {}", message);
}

pub fn print_info(message: &str) {
    println!("  [INFO] {}", message);
}

fn show_error(err: &RepoError) {
    print_error(&err.to_string());
}

// =============================================================================
// Books
// =============================================================================

pub async fn books_menu(db: &Database) {
    loop {
        println!();
        println!("--- Books ---");
        println!("  1. List all");
        println!("  2. Search");
        println!("  3. Add");
        println!("  4. Update");
        println!("  5. Delete");
        println!("  6. Available books");
        println!("  7. Loan history for a book");
        println!("  8. Back");

        match read_line("Select an option").as_str() {
            "1" => {
                match db.books().list().await {
                    Ok(books) => print_books(&books),
                    Err(e) => show_error(&e),
                }
                pause();
            }
            "2" => {
                let term = read_line("Search term");
                match db.books().search(&term).await {
                    Ok(books) => print_books(&books),
                    Err(e) => show_error(&e),
                }
                pause();
            }
            "3" => {
                add_book(db).await;
                pause();
            }
            "4" => {
                update_book(db).await;
                pause();
            }
            "5" => {
                delete_book(db).await;
                pause();
            }
            "6" => {
                match db.books().list_available().await {
                    Ok(books) => {
                        println!("\n[AVAILABLE BOOKS]");
                        print_books(&books);
                    }
                    Err(e) => show_error(&e),
                }
                pause();
            }
            "7" => {
                if let Some(id) = read_id("Book id") {
                    match db.loans().list_by_book(id).await {
                        Ok(history) => print_loans(&history),
                        Err(e) => show_error(&e),
                    }
                }
                pause();
            }
            "8" => break,
            _ => print_error("Invalid option"),
        }
    }
}

async fn add_book(db: &Database) {
    let title = read_line("Title");
    let isbn = read_line("ISBN");
    let Some(author_id) = read_id("Author id") else { return };
    let Some(category_id) = read_id("Category id") else { return };
    let publisher = read_opt("Publisher (optional)");
    let pages = read_opt("Pages (optional)").and_then(|p| p.parse::<i64>().ok());
    let Some(total_copies) = read_i64_or("Copies (Enter for 1)", 1) else { return };
    let description = read_opt("Description (optional)");

    let result = db
        .books()
        .create(NewBook {
            title,
            isbn,
            author_id,
            category_id,
            publisher,
            pages,
            description,
            total_copies,
        })
        .await;

    match result {
        Ok(book) => print_success(&format!("Book '{}' created with id {}", book.title, book.id)),
        Err(e) => show_error(&e),
    }
}

async fn update_book(db: &Database) {
    let Some(id) = read_id("Book id to update") else { return };

    let book = match db.books().get(id).await {
        Ok(Some(book)) => book,
        Ok(None) => return print_error("Book not found"),
        Err(e) => return show_error(&e),
    };

    print_book_detail(&book);
    if !confirm("Update this book?") {
        return;
    }

    println!("Enter new values, or press Enter to keep the current one.");
    let patch = BookPatch {
        title: read_opt("Title"),
        isbn: read_opt("ISBN"),
        author_id: read_opt("Author id").and_then(|v| v.parse().ok()),
        category_id: read_opt("Category id").and_then(|v| v.parse().ok()),
        publisher: read_opt("Publisher"),
        pages: read_opt("Pages").and_then(|v| v.parse().ok()),
        description: read_opt("Description"),
        total_copies: read_opt("Total copies").and_then(|v| v.parse().ok()),
    };

    match db.books().update(id, patch).await {
        Ok(book) => print_success(&format!("Book '{}' updated", book.title)),
        Err(e) => show_error(&e),
    }
}

async fn delete_book(db: &Database) {
    let Some(id) = read_id("Book id to delete") else { return };

    let book = match db.books().get(id).await {
        Ok(Some(book)) => book,
        Ok(None) => return print_error("Book not found"),
        Err(e) => return show_error(&e),
    };

    print_book_detail(&book);
    if !confirm("Really delete this book?") {
        return;
    }

    match db.books().delete(id).await {
        Ok(()) => print_success("Book deleted"),
        Err(e) => show_error(&e),
    }
}

fn print_books(books: &[Book]) {
    if books.is_empty() {
        println!("  (no books)");
        return;
    }
    println!(
        "  {:<5} {:<35} {:<16} {:>6} {:>6}",
        "ID", "TITLE", "ISBN", "AVAIL", "TOTAL"
    );
    for book in books {
        println!(
            "  {:<5} {:<35} {:<16} {:>6} {:>6}",
            book.id,
            truncate(&book.title, 35),
            truncate(&book.isbn, 16),
            book.available_copies,
            book.total_copies
        );
    }
}

fn print_book_detail(book: &Book) {
    println!();
    println!("  Id:          {}", book.id);
    println!("  Title:       {}", book.title);
    println!("  ISBN:        {}", book.isbn);
    println!("  Author id:   {}", book.author_id);
    println!("  Category id: {}", book.category_id);
    println!("  Publisher:   {}", book.publisher.as_deref().unwrap_or("-"));
    println!(
        "  Pages:       {}",
        book.pages.map_or("-".to_string(), |p| p.to_string())
    );
    println!(
        "  Copies:      {} available of {}",
        book.available_copies, book.total_copies
    );
}

// =============================================================================
// Authors
// =============================================================================

pub async fn authors_menu(db: &Database) {
    loop {
        println!();
        println!("--- Authors ---");
        println!("  1. List all");
        println!("  2. Search");
        println!("  3. Add");
        println!("  4. Update");
        println!("  5. Delete");
        println!("  6. Back");

        match read_line("Select an option").as_str() {
            "1" => {
                match db.authors().list().await {
                    Ok(authors) => print_authors(&authors),
                    Err(e) => show_error(&e),
                }
                pause();
            }
            "2" => {
                let term = read_line("Search term");
                match db.authors().search(&term).await {
                    Ok(authors) => print_authors(&authors),
                    Err(e) => show_error(&e),
                }
                pause();
            }
            "3" => {
                let first_name = read_line("First name");
                let last_name = read_line("Last name");
                let nationality = read_opt("Nationality (optional)");
                match db
                    .authors()
                    .create(NewAuthor {
                        first_name,
                        last_name,
                        nationality,
                    })
                    .await
                {
                    Ok(author) => print_success(&format!(
                        "Author '{}' created with id {}",
                        author.full_name(),
                        author.id
                    )),
                    Err(e) => show_error(&e),
                }
                pause();
            }
            "4" => {
                if let Some(id) = read_id("Author id to update") {
                    println!("Enter new values, or press Enter to keep the current one.");
                    let patch = AuthorPatch {
                        first_name: read_opt("First name"),
                        last_name: read_opt("Last name"),
                        nationality: read_opt("Nationality"),
                    };
                    match db.authors().update(id, patch).await {
                        Ok(author) => {
                            print_success(&format!("Author '{}' updated", author.full_name()))
                        }
                        Err(e) => show_error(&e),
                    }
                }
                pause();
            }
            "5" => {
                if let Some(id) = read_id("Author id to delete") {
                    if confirm("Really delete this author?") {
                        match db.authors().delete(id).await {
                            Ok(()) => print_success("Author deleted"),
                            Err(e) => show_error(&e),
                        }
                    }
                }
                pause();
            }
            "6" => break,
            _ => print_error("Invalid option"),
        }
    }
}

fn print_authors(authors: &[Author]) {
    if authors.is_empty() {
        println!("  (no authors)");
        return;
    }
    println!("  {:<5} {:<30} {:<20}", "ID", "NAME", "NATIONALITY");
    for author in authors {
        println!(
            "  {:<5} {:<30} {:<20}",
            author.id,
            truncate(&author.full_name(), 30),
            author.nationality.as_deref().unwrap_or("-")
        );
    }
}

// =============================================================================
// Categories
// =============================================================================

pub async fn categories_menu(db: &Database) {
    loop {
        println!();
        println!("--- Categories ---");
        println!("  1. List all");
        println!("  2. Search");
        println!("  3. Add");
        println!("  4. Update");
        println!("  5. Delete");
        println!("  6. Back");

        match read_line("Select an option").as_str() {
            "1" => {
                match db.categories().list().await {
                    Ok(categories) => print_categories(&categories),
                    Err(e) => show_error(&e),
                }
                pause();
            }
            "2" => {
                let term = read_line("Search term");
                match db.categories().search(&term).await {
                    Ok(categories) => print_categories(&categories),
                    Err(e) => show_error(&e),
                }
                pause();
            }
            "3" => {
                let name = read_line("Name");
                let description = read_opt("Description (optional)");
                match db.categories().create(NewCategory { name, description }).await {
                    Ok(category) => print_success(&format!(
                        "Category '{}' created with id {}",
                        category.name, category.id
                    )),
                    Err(e) => show_error(&e),
                }
                pause();
            }
            "4" => {
                if let Some(id) = read_id("Category id to update") {
                    println!("Enter new values, or press Enter to keep the current one.");
                    let patch = CategoryPatch {
                        name: read_opt("Name"),
                        description: read_opt("Description"),
                    };
                    match db.categories().update(id, patch).await {
                        Ok(category) => {
                            print_success(&format!("Category '{}' updated", category.name))
                        }
                        Err(e) => show_error(&e),
                    }
                }
                pause();
            }
            "5" => {
                if let Some(id) = read_id("Category id to delete") {
                    if confirm("Really delete this category?") {
                        match db.categories().delete(id).await {
                            Ok(()) => print_success("Category deleted"),
                            Err(e) => show_error(&e),
                        }
                    }
                }
                pause();
            }
            "6" => break,
            _ => print_error("Invalid option"),
        }
    }
}

fn print_categories(categories: &[Category]) {
    if categories.is_empty() {
        println!("  (no categories)");
        return;
    }
    println!("  {:<5} {:<25} {:<40}", "ID", "NAME", "DESCRIPTION");
    for category in categories {
        println!(
            "  {:<5} {:<25} {:<40}",
            category.id,
            truncate(&category.name, 25),
            truncate(category.description.as_deref().unwrap_or("-"), 40)
        );
    }
}

// =============================================================================
// Patrons
// =============================================================================

pub async fn patrons_menu(db: &Database) {
    loop {
        println!();
        println!("--- Patrons ---");
        println!("  1. List all");
        println!("  2. Find by membership number");
        println!("  3. Add");
        println!("  4. Update");
        println!("  5. Activate / deactivate");
        println!("  6. Outstanding loans for a patron");
        println!("  7. Back");

        match read_line("Select an option").as_str() {
            "1" => {
                match db.patrons().list().await {
                    Ok(patrons) => print_patrons(&patrons),
                    Err(e) => show_error(&e),
                }
                pause();
            }
            "2" => {
                let number = read_line("Membership number");
                match db.patrons().get_by_membership(&number).await {
                    Ok(Some(patron)) => print_patron_detail(&patron),
                    Ok(None) => print_error("Patron not found"),
                    Err(e) => show_error(&e),
                }
                pause();
            }
            "3" => {
                add_patron(db).await;
                pause();
            }
            "4" => {
                update_patron(db).await;
                pause();
            }
            "5" => {
                toggle_patron(db).await;
                pause();
            }
            "6" => {
                if let Some(id) = read_id("Patron id") {
                    match db.patrons().outstanding_loans(id).await {
                        Ok(loans) => {
                            if loans.is_empty() {
                                print_info("No outstanding loans");
                            }
                            for loan in loans {
                                println!(
                                    "  loan {:<4} book {:<4} due {}",
                                    loan.id, loan.book_id, loan.due_date
                                );
                            }
                        }
                        Err(e) => show_error(&e),
                    }
                }
                pause();
            }
            "7" => break,
            _ => print_error("Invalid option"),
        }
    }
}

async fn add_patron(db: &Database) {
    let membership_number = read_line("Membership number");
    let first_name = read_line("First name");
    let last_name = read_line("Last name");
    let email = read_line("Email");
    let phone = read_opt("Phone (optional)");
    let address = read_opt("Address (optional)");

    let result = db
        .patrons()
        .create(NewPatron {
            membership_number,
            first_name,
            last_name,
            email,
            phone,
            address,
        })
        .await;

    match result {
        Ok(patron) => print_success(&format!(
            "Patron '{}' created with id {}",
            patron.full_name(),
            patron.id
        )),
        Err(e) => show_error(&e),
    }
}

async fn update_patron(db: &Database) {
    let Some(id) = read_id("Patron id to update") else { return };

    let patron = match db.patrons().get(id).await {
        Ok(Some(patron)) => patron,
        Ok(None) => return print_error("Patron not found"),
        Err(e) => return show_error(&e),
    };

    print_patron_detail(&patron);
    if !confirm("Update this patron?") {
        return;
    }

    println!("Enter new values, or press Enter to keep the current one.");
    let patch = PatronPatch {
        membership_number: read_opt("Membership number"),
        first_name: read_opt("First name"),
        last_name: read_opt("Last name"),
        email: read_opt("Email"),
        phone: read_opt("Phone"),
        address: read_opt("Address"),
    };

    match db.patrons().update(id, patch).await {
        Ok(patron) => print_success(&format!("Patron '{}' updated", patron.full_name())),
        Err(e) => show_error(&e),
    }
}

async fn toggle_patron(db: &Database) {
    let Some(id) = read_id("Patron id") else { return };

    let patron = match db.patrons().get(id).await {
        Ok(Some(patron)) => patron,
        Ok(None) => return print_error("Patron not found"),
        Err(e) => return show_error(&e),
    };

    print_patron_detail(&patron);
    let action = if patron.is_active() { "deactivate" } else { "activate" };
    if !confirm(&format!("Do you want to {} this patron?", action)) {
        return;
    }

    let result = if patron.is_active() {
        db.patrons().deactivate(id).await
    } else {
        db.patrons().activate(id).await
    };

    match result {
        Ok(patron) => print_success(&format!(
            "Patron '{}' is now {:?}",
            patron.full_name(),
            patron.status
        )),
        Err(e) => show_error(&e),
    }
}

fn print_patrons(patrons: &[Patron]) {
    if patrons.is_empty() {
        println!("  (no patrons)");
        return;
    }
    println!(
        "  {:<5} {:<12} {:<25} {:<10}",
        "ID", "MEMBERSHIP", "NAME", "STATUS"
    );
    for patron in patrons {
        println!(
            "  {:<5} {:<12} {:<25} {:<10}",
            patron.id,
            truncate(&patron.membership_number, 12),
            truncate(&patron.full_name(), 25),
            format!("{:?}", patron.status)
        );
    }
}

fn print_patron_detail(patron: &Patron) {
    println!();
    println!("  Id:         {}", patron.id);
    println!("  Membership: {}", patron.membership_number);
    println!("  Name:       {}", patron.full_name());
    println!("  Email:      {}", patron.email);
    println!("  Phone:      {}", patron.phone.as_deref().unwrap_or("-"));
    println!("  Address:    {}", patron.address.as_deref().unwrap_or("-"));
    println!("  Status:     {:?}", patron.status);
}

// =============================================================================
// Loans
// =============================================================================

pub async fn loans_menu(db: &Database) {
    loop {
        println!();
        println!("--- Loans ---");
        println!("  1. Checkout");
        println!("  2. Return");
        println!("  3. Outstanding loans");
        println!("  4. Overdue loans");
        println!("  5. Back");

        match read_line("Select an option").as_str() {
            "1" => {
                checkout(db).await;
                pause();
            }
            "2" => {
                return_loan(db).await;
                pause();
            }
            "3" => {
                match db.loans().list_outstanding().await {
                    Ok(loans) => {
                        println!("\n[OUTSTANDING LOANS]");
                        print_loans(&loans);
                    }
                    Err(e) => show_error(&e),
                }
                pause();
            }
            "4" => {
                match db.loans().list_overdue().await {
                    Ok(loans) => {
                        println!("\n[OVERDUE LOANS]");
                        print_loans(&loans);
                    }
                    Err(e) => show_error(&e),
                }
                pause();
            }
            "5" => break,
            _ => print_error("Invalid option"),
        }
    }
}

async fn checkout(db: &Database) {
    let Some(book_id) = read_id("Book id") else { return };
    let Some(patron_id) = read_id("Patron id") else { return };
    let Some(days) = read_i64_or(
        &format!("Loan period in days (Enter for {})", DEFAULT_LOAN_PERIOD_DAYS),
        DEFAULT_LOAN_PERIOD_DAYS,
    ) else {
        return;
    };

    // The loan manager assumes a valid period; bad input stops here.
    if let Err(e) = validation::validate_loan_period(days) {
        return print_error(&e.to_string());
    }

    match db.loans().checkout(book_id, patron_id, days).await {
        Ok(receipt) => print_success(&receipt.message),
        Err(e) => show_error(&e),
    }
}

async fn return_loan(db: &Database) {
    let Some(loan_id) = read_id("Loan id") else { return };
    if !confirm("Confirm the return?") {
        return;
    }

    match db.loans().return_loan(loan_id).await {
        Ok(receipt) => {
            print_success(&receipt.message);
            if receipt.fine.is_positive() {
                print_info(&format!("Fine to collect: {}", receipt.fine));
            }
        }
        Err(e) => show_error(&e),
    }
}

fn print_loans(loans: &[LoanRecord]) {
    if loans.is_empty() {
        println!("  (no loans)");
        return;
    }
    println!(
        "  {:<5} {:<30} {:<22} {:<11} {:<12} {:>8}",
        "ID", "BOOK", "PATRON", "DUE", "STATUS", "FINE"
    );
    for loan in loans {
        println!(
            "  {:<5} {:<30} {:<22} {:<11} {:<12} {:>8}",
            loan.id,
            truncate(&loan.book_title, 30),
            truncate(&loan.patron_name, 22),
            loan.due_date.to_string(),
            format!("{:?}", loan.status),
            loan.fine().to_string()
        );
    }
}

// =============================================================================
// Formatting
// =============================================================================

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let cut: String = value.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
