use clap::{Parser, Subcommand};
use portfoliozz_admin::config::Config;
use portfoliozz_admin::models::db_operations::accounts_db_operations;
use portfoliozz_admin::models::db_operations::documents_db_operations::{DocumentStore, RedbDocumentStore};
use portfoliozz_admin::models::document::{Collection, DocumentWrite};
use portfoliozz_admin::setup::db_setup;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "setup_cli", author, version, about = "A CLI for initial console setup.", long_about = None)]
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
    /// Sign-in accounts held by the identity database.
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Console access: membership records in the `admins` collection.
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    Setup {
        /// `identity` or `documents`; both when omitted.
        db_type: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum AccountAction {
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    List,
    ChangePassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        new_password: String,
    },
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    Grant {
        #[arg(long)]
        email: String,
    },
    Revoke {
        #[arg(long)]
        email: String,
    },
    List,
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::from_env(&cli.env_file) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    match &cli.command {
        Commands::Db { action } => match action {
            DbAction::Setup { db_type } => match db_type.as_deref() {
                Some("identity") => setup_identity_database(&config),
                Some("documents") => setup_documents_database(&config),
                Some(other) => eprintln!("❌ Error: Unknown database type '{}'. Use 'identity' or 'documents'.", other),
                None => {
                    setup_identity_database(&config);
                    setup_documents_database(&config);
                }
            },
        },
        Commands::Account { action } => match action {
            AccountAction::Create { email, password } => create_account(&config, email, password),
            AccountAction::List => list_accounts(&config),
            AccountAction::ChangePassword { email, new_password } => change_password(&config, email, new_password),
        },
        Commands::Admin { action } => match action {
            AdminAction::Grant { email } => grant_admin(&config, email),
            AdminAction::Revoke { email } => revoke_admin(&config, email),
            AdminAction::List => list_admins(&config),
        },
    }
}

fn ensure_parent_dir(db_path: &Path) -> bool {
    if let Some(parent_dir) = db_path.parent() {
        if let Err(e) = fs::create_dir_all(parent_dir) {
            eprintln!("❌ Could not create database directory '{}': {}", parent_dir.display(), e);
            return false;
        }
    }
    true
}

fn setup_identity_database(config: &Config) {
    let db_path = config.identity_db_path();
    if db_path.exists() {
        println!("ℹ️ Identity database already exists at '{}'. Skipping creation.", db_path.display());
        return;
    }
    println!("\nSetting up identity database at '{}'...", db_path.display());
    if !ensure_parent_dir(&db_path) {
        return;
    }

    let mut conn = match Connection::open(&db_path) {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("❌ Could not create identity database file: {}", e);
            return;
        }
    };
    match db_setup::setup_identity_db(&mut conn) {
        Ok(_) => println!("✅ Identity database setup completed successfully."),
        Err(e) => eprintln!("❌ Error setting up identity database: {}", e),
    }
}

fn setup_documents_database(config: &Config) {
    let db_path = config.documents_db_path();
    if db_path.exists() {
        println!("ℹ️ Documents database already exists at '{}'. Skipping creation.", db_path.display());
        return;
    }
    println!("\nSetting up documents database at '{}'...", db_path.display());
    if !ensure_parent_dir(&db_path) {
        return;
    }

    match db_setup::setup_documents_db(&db_path) {
        Ok(_) => println!("✅ Documents database setup completed successfully."),
        Err(e) => eprintln!("❌ Error setting up documents database: {}", e),
    }
}

fn open_identity(config: &Config) -> Option<Connection> {
    let db_path = config.identity_db_path();
    if !db_path.exists() {
        eprintln!("❌ Error: Identity database not found at '{}'. Please run `setup_cli db setup` first.", db_path.display());
        return None;
    }
    match Connection::open(&db_path) {
        Ok(conn) => Some(conn),
        Err(e) => {
            eprintln!("❌ Could not open identity database: {}", e);
            None
        }
    }
}

fn open_documents(config: &Config) -> Option<RedbDocumentStore> {
    let db_path = config.documents_db_path();
    if !db_path.exists() {
        eprintln!("❌ Error: Documents database not found at '{}'. Please run `setup_cli db setup` first.", db_path.display());
        return None;
    }
    match RedbDocumentStore::open(&db_path) {
        Ok(store) => Some(store),
        Err(e) => {
            eprintln!("❌ Could not open documents database (is the server running?): {}", e);
            None
        }
    }
}

fn create_account(config: &Config, email: &str, password: &str) {
    let Some(conn) = open_identity(config) else { return };
    if email.trim().is_empty() || password.is_empty() {
        eprintln!("❌ Error: Email and password must not be empty.");
        return;
    }
    match accounts_db_operations::create_account(&conn, email, password) {
        Ok(user) => println!("✅ Account '{}' created with uid {}.", user.email, user.uid),
        Err(e) => eprintln!("❌ Error creating account: {}. It might be because the email already exists.", e),
    }
}

fn list_accounts(config: &Config) {
    let Some(conn) = open_identity(config) else { return };
    match accounts_db_operations::read_all_accounts(&conn) {
        Ok(accounts) => {
            println!("Listing Accounts:");
            for account in accounts {
                println!("- {} ({})", account.email, account.uid);
            }
        }
        Err(e) => eprintln!("❌ Error fetching accounts: {}", e),
    }
}

fn change_password(config: &Config, email: &str, new_password: &str) {
    let Some(conn) = open_identity(config) else { return };
    if new_password.is_empty() {
        eprintln!("❌ Error: The new password must not be empty.");
        return;
    }
    match accounts_db_operations::update_password(&conn, email, new_password) {
        Ok(0) => eprintln!("❌ Error: No account with email '{}' found.", email),
        Ok(_) => println!("✅ Password for '{}' changed successfully.", email),
        Err(e) => eprintln!("❌ Error updating password: {}", e),
    }
}

fn grant_admin(config: &Config, email: &str) {
    let Some(conn) = open_identity(config) else { return };
    let account = match accounts_db_operations::read_account_by_email(&conn, email) {
        Ok(Some(account)) => account,
        Ok(None) => {
            eprintln!("❌ Error: No account with email '{}' found. Create it with `setup_cli account create` first.", email);
            return;
        }
        Err(e) => {
            eprintln!("❌ Error looking up account: {}", e);
            return;
        }
    };
    let Some(documents) = open_documents(config) else { return };

    let record = DocumentWrite::new()
        .set("email", account.email.as_str())
        .server_timestamp("grantedAt");
    match documents.set(Collection::Admins, &account.uid, &record) {
        Ok(()) => println!("✅ '{}' is now an admin.", account.email),
        Err(e) => eprintln!("❌ Error writing admin record: {}", e),
    }
}

fn revoke_admin(config: &Config, email: &str) {
    let Some(conn) = open_identity(config) else { return };
    let account = match accounts_db_operations::read_account_by_email(&conn, email) {
        Ok(Some(account)) => account,
        Ok(None) => {
            eprintln!("❌ Error: No account with email '{}' found.", email);
            return;
        }
        Err(e) => {
            eprintln!("❌ Error looking up account: {}", e);
            return;
        }
    };
    let Some(documents) = open_documents(config) else { return };

    match documents.delete(Collection::Admins, &account.uid) {
        Ok(()) => println!("✅ Admin access revoked for '{}'.", account.email),
        Err(e) => eprintln!("❌ Error removing admin record: {}", e),
    }
}

fn list_admins(config: &Config) {
    let Some(documents) = open_documents(config) else { return };
    match documents.list(Collection::Admins) {
        Ok(records) => {
            println!("Listing Admins:");
            for record in records {
                let email = record.fields.get("email").and_then(|v| v.as_str()).unwrap_or("<unknown email>");
                println!("- {} ({})", email, record.id);
            }
        }
        Err(e) => eprintln!("❌ Error fetching admins: {}", e),
    }
}
