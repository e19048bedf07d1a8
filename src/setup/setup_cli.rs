use clap::{Parser, Subcommand};
use glimprint_backend::config::Config;
use glimprint_backend::models::db_operations::admins_db_operations;
use glimprint_backend::setup::db_setup;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "setup_cli", author, version, about = "A CLI for initial site setup.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    /// Creates the site database and all content tables.
    Setup,
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: Option<String>,
    },
    List,
    ChangePassword {
        #[arg(long)]
        username: String,
        #[arg(long)]
        new_password: String,
    },
    ChangeUsername {
        #[arg(long)]
        old_username: String,
        #[arg(long)]
        new_username: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    match &cli.command {
        Commands::Db { action } => match action {
            DbAction::Setup => setup_site_database(&config),
        },
        Commands::Admin { action } => match action {
            AdminAction::Create {
                username,
                password,
                email,
            } => create_admin_user(&config, username, password, email.as_deref()),
            AdminAction::List => list_admin_users(&config),
            AdminAction::ChangePassword {
                username,
                new_password,
            } => change_admin_password(&config, username, new_password),
            AdminAction::ChangeUsername {
                old_username,
                new_username,
            } => change_admin_username(&config, old_username, new_username),
        },
    }
}

fn open_db(config: &Config) -> Option<Connection> {
    let db_path = config.db_path();
    if !db_path.exists() {
        eprintln!(
            "Error: Database not found at '{}'. Please run `setup_cli db setup` first.",
            db_path.display()
        );
        return None;
    }
    match Connection::open(&db_path) {
        Ok(conn) => Some(conn),
        Err(e) => {
            eprintln!("Error opening database: {}", e);
            None
        }
    }
}

fn setup_site_database(config: &Config) {
    let db_path = config.db_path();
    println!("\nSetting up site database at '{}'...", db_path.display());

    if let Some(parent_dir) = db_path.parent() {
        fs::create_dir_all(parent_dir).expect("Could not create database directory.");
    }

    let mut conn = Connection::open(&db_path).expect("Could not create database file.");
    match db_setup::setup_database(&mut conn) {
        Ok(_) => println!("Database setup completed successfully."),
        Err(e) => eprintln!("Error setting up database: {}", e),
    }
}

fn create_admin_user(config: &Config, username: &str, password: &str, email: Option<&str>) {
    let conn = match open_db(config) {
        Some(c) => c,
        None => return,
    };
    match admins_db_operations::create_admin(&conn, username, password, email) {
        Ok(_) => println!("Admin user '{}' created successfully.", username),
        Err(e) => eprintln!(
            "Error creating admin user: {}. It might be because the username already exists.",
            e
        ),
    }
}

fn list_admin_users(config: &Config) {
    let conn = match open_db(config) {
        Some(c) => c,
        None => return,
    };
    println!("Listing admin users:");
    match admins_db_operations::read_all_admins(&conn) {
        Ok(admins) => {
            for admin in admins {
                match admin.email {
                    Some(email) => println!("- {} <{}>", admin.username, email),
                    None => println!("- {}", admin.username),
                }
            }
        }
        Err(e) => eprintln!("Error fetching admins: {}", e),
    }
}

fn change_admin_password(config: &Config, username: &str, new_password: &str) {
    let conn = match open_db(config) {
        Some(c) => c,
        None => return,
    };
    match admins_db_operations::change_password(&conn, username, new_password) {
        Ok(0) => eprintln!("Error: No admin user named '{}' found.", username),
        Ok(_) => println!("Password for admin user '{}' changed successfully.", username),
        Err(e) => eprintln!("Error updating password: {}", e),
    }
}

fn change_admin_username(config: &Config, old_username: &str, new_username: &str) {
    let conn = match open_db(config) {
        Some(c) => c,
        None => return,
    };
    match admins_db_operations::change_username(&conn, old_username, new_username) {
        Ok(0) => eprintln!("Error: No admin user named '{}' found.", old_username),
        Ok(_) => println!(
            "Admin username changed from '{}' to '{}'.",
            old_username, new_username
        ),
        Err(e) => eprintln!(
            "Error changing username: {}. The new username might already be taken.",
            e
        ),
    }
}
