use std::{error::Error, path::Path, process::exit, str::FromStr};

use clap::Parser;
use email_address::EmailAddress;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use finanzas_rs::{
    CategoryName, CategoryType, PasswordHash, Transaction, ValidatedPassword, create_category,
    create_transaction, create_user, initialize_db,
};

/// A utility for creating a test database for the web server of finanzas_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// Email address of the test user.
    #[arg(long, default_value = "test@example.com")]
    email: String,
}

/// Expense categories and the amount spent in each per month.
const MONTHLY_EXPENSES: [(&str, f64); 5] = [
    ("Rent", 1450.0),
    ("Groceries", 612.35),
    ("Transport", 148.9),
    ("Eating Out", 96.5),
    ("Utilities", 182.14),
];

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

    println!("Creating test user {}...", args.email);

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(EmailAddress::from_str(&args.email)?, password_hash, &conn)?;

    println!("Creating categories...");

    create_category(
        CategoryName::new("Salary")?,
        Some(CategoryType::Income),
        &conn,
    )?;
    create_category(CategoryName::new("Gifts")?, None, &conn)?;
    for (name, _) in MONTHLY_EXPENSES {
        create_category(CategoryName::new(name)?, Some(CategoryType::Expense), &conn)?;
    }

    println!("Creating transactions...");

    let today = OffsetDateTime::now_utc().date();
    let mut transaction_count = 0;

    for month in 0..6 {
        let date = today - Duration::days(30 * month);

        create_transaction(Transaction::build(4200.0, date, "Salary"), user.id, &conn)?;
        transaction_count += 1;

        for (offset, (category, amount)) in MONTHLY_EXPENSES.iter().enumerate() {
            let date = date - Duration::days(offset as i64 * 3);
            create_transaction(Transaction::build(-amount, date, category), user.id, &conn)?;
            transaction_count += 1;
        }
    }

    create_transaction(Transaction::build(50.0, today, "Gifts"), user.id, &conn)?;
    create_transaction(Transaction::build(-12.0, today, ""), user.id, &conn)?;
    transaction_count += 2;

    println!("Created {transaction_count} transactions.");
    println!("Success!");

    Ok(())
}
