//! # Purge Inactive Users Utility
//!
//! Permanently removes accounts that users deleted from the app. Deleting an
//! account only sets `inactive_at`; this binary removes those rows, and the
//! schema cascades the delete to their receipts, transactions and history.
//!
//! **WARNING**: This is a destructive operation that cannot be undone.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --package purge-inactive-users --bin purge_inactive_users
//! ```
//!
//! The program will:
//! 1. Connect to the database named by `DATABASE_URL`
//! 2. Count inactive users
//! 3. Ask for confirmation
//! 4. Delete them if confirmed
//! 5. Report the number of users deleted

use lib_core::create_pool;
use lib_core::model::store::{UserRepository, MIGRATOR};
use lib_utils::get_env;
use std::io::{self, Write};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    println!("============================================");
    println!("  Purge Inactive Users Utility");
    println!("============================================");
    println!();
    println!("WARNING: This will permanently delete every deactivated account");
    println!("and all data that belongs to it.");
    println!();

    let database_url = get_env("DATABASE_URL")?;

    println!("Connecting to {}...", database_url);
    let pool = create_pool(&database_url).await?;
    MIGRATOR.run(&pool).await?;
    println!("Connected successfully.");
    println!();

    let inactive = UserRepository::count_inactive(&pool).await?;

    if inactive == 0 {
        println!("No inactive users found.");
        println!("Nothing to delete.");
        return Ok(());
    }

    println!("Found {} inactive user(s).", inactive);
    println!();

    print!("Are you sure you want to delete them? (yes/no): ");
    io::stdout().flush()?;

    let mut confirmation = String::new();
    io::stdin().read_line(&mut confirmation)?;
    let confirmation = confirmation.trim().to_lowercase();

    if confirmation != "yes" && confirmation != "y" {
        println!("Operation cancelled.");
        return Ok(());
    }

    println!();
    println!("Deleting inactive users...");

    let deleted = UserRepository::delete_inactive(&pool).await?;

    println!("Successfully deleted {} user(s).", deleted);

    Ok(())
}
