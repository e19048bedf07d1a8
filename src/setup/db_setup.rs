use rusqlite::Connection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

/// Creates every table the site uses. All statements are idempotent so the
/// CLI can be re-run against an existing database after a schema addition.
pub fn setup_database(conn: &mut Connection) -> Result<(), SetupError> {
    let tx = conn.transaction()?;

    println!("- Creating 'news' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS news (
            slug TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            date TEXT,
            body TEXT,
            image_data BLOB,
            image_mime TEXT,
            related_links TEXT,
            approval_status TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    println!("- Creating 'seminars' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS seminars (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            slug TEXT UNIQUE,
            title TEXT NOT NULL,
            speaker TEXT,
            affiliation TEXT,
            date TEXT,
            announcement_date TEXT,
            abstract TEXT,
            location TEXT,
            image_data BLOB,
            image_mime TEXT,
            related_links TEXT,
            approval_status TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    println!("- Creating 'workshops' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS workshops (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            slug TEXT UNIQUE,
            title TEXT NOT NULL,
            start_date TEXT,
            end_date TEXT,
            announcement_date TEXT,
            description TEXT,
            location TEXT,
            image_data BLOB,
            image_mime TEXT,
            related_links TEXT,
            approval_status TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    println!("- Creating 'publications' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS publications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            slug TEXT UNIQUE,
            title TEXT NOT NULL,
            authors TEXT,
            year INTEGER,
            description TEXT,
            link TEXT,
            approval_status TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    println!("- Creating 'members' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            slug TEXT UNIQUE,
            name TEXT NOT NULL,
            affiliation TEXT,
            email TEXT,
            statement TEXT,
            website TEXT,
            image_data BLOB,
            image_mime TEXT,
            approval_status TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    println!("- Creating 'admins' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS admins (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            email TEXT
        )",
        [],
    )?;

    println!("- Creating 'contacts' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS contacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            name TEXT,
            affiliation TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    tx.commit()?;
    Ok(())
}
