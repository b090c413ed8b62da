// Credvault — CLI Command Handlers
//
// Each function handles one CLI subcommand. Users are addressed by name and
// resolved through the user directory; record commands then act as that
// user through the record service.

use std::path::Path;

use serde::Serialize;
use uuid::Uuid;

use crate::config::Config;
use crate::error::VaultError;
use crate::service::RecordService;
use crate::store::{Database, SqliteRecordStore};
use crate::users::{SqliteUserDirectory, User, UserDirectory};

use super::{Cli, Commands, UserAction};

/// Execute the parsed CLI invocation.
pub fn execute(cli: Cli) -> Result<(), VaultError> {
    let config = Config::from_env().with_overrides(cli.db, cli.key);
    tracing::debug!(?config, "Configuration resolved");

    let db = open_db(&config.db_path)?;
    dispatch(cli.command, &db, &config)
}

fn dispatch(command: Commands, db: &Database, config: &Config) -> Result<(), VaultError> {
    match command {
        Commands::User { action } => match action {
            UserAction::Add { name } => cmd_user_add(db, &name),
            UserAction::Show { name } => cmd_user_show(db, &name),
        },
        Commands::List { user } => cmd_list(db, config, &user),
        Commands::Get { id, user } => cmd_get(db, config, &id, &user),
        Commands::Create { kind, user, form } => cmd_create(db, config, &kind, &user, &form),
        Commands::Update { id, user, form } => cmd_update(db, config, &id, &user, &form),
        Commands::Delete { id, user } => cmd_delete(db, config, &id, &user),
    }
}

// ─── Users ───────────────────────────────────────────────────────────────────

fn cmd_user_add(db: &Database, name: &str) -> Result<(), VaultError> {
    const OP: &str = "user_add";

    if name.trim().is_empty() {
        return Err(VaultError::invalid_input(OP, "user name is empty"));
    }

    let users = SqliteUserDirectory::new(db);

    if users.get_user_by_name(name).is_ok() {
        return Err(VaultError::invalid_input(
            OP,
            format!("user '{}' already exists", name),
        ));
    }

    let user = users
        .create_user(name)
        .map_err(|e| VaultError::store(OP, e))?;

    println!("✓ User registered");
    println!("  ID:   {}", user.id);
    println!("  Name: {}", user.name);

    Ok(())
}

fn cmd_user_show(db: &Database, name: &str) -> Result<(), VaultError> {
    let user = lookup_user(db, "user_show", name)?;
    print_json("user_show", &user)
}

// ─── Records ─────────────────────────────────────────────────────────────────

fn cmd_list(db: &Database, config: &Config, user: &str) -> Result<(), VaultError> {
    const OP: &str = "list_records";
    let owner = lookup_user(db, OP, user)?;
    let service = record_service(db, config)?;

    let listing = service.list_records(&owner.id)?;

    if listing.is_empty() {
        println!("No records stored for {} yet.", owner.name);
        return Ok(());
    }

    print_json(OP, &listing)
}

fn cmd_get(db: &Database, config: &Config, id: &str, user: &str) -> Result<(), VaultError> {
    const OP: &str = "get_record";
    let id = parse_id(OP, id)?;
    let caller = lookup_user(db, OP, user)?;
    let service = record_service(db, config)?;

    let record = service.get_record(&id, &caller.id)?;
    print_json(OP, &record)
}

fn cmd_create(
    db: &Database,
    config: &Config,
    kind: &str,
    user: &str,
    form: &str,
) -> Result<(), VaultError> {
    const OP: &str = "create_record";
    let owner = lookup_user(db, OP, user)?;
    let service = record_service(db, config)?;

    let record = service.create_record(kind, form.as_bytes(), &owner.id)?;

    println!("✓ Record stored");
    println!("  ID:   {}", record.id());
    println!("  Type: {}", record.kind());

    Ok(())
}

fn cmd_update(
    db: &Database,
    config: &Config,
    id: &str,
    user: &str,
    form: &str,
) -> Result<(), VaultError> {
    const OP: &str = "update_record";
    let id = parse_id(OP, id)?;
    let caller = lookup_user(db, OP, user)?;
    let service = record_service(db, config)?;

    let record = service.update_record(&id, form.as_bytes(), &caller.id)?;

    println!("✓ Record {} updated", record.id());

    Ok(())
}

fn cmd_delete(db: &Database, config: &Config, id: &str, user: &str) -> Result<(), VaultError> {
    const OP: &str = "delete_record";
    let id = parse_id(OP, id)?;
    let caller = lookup_user(db, OP, user)?;
    let service = record_service(db, config)?;

    let deleted = service.delete_record(&id, &caller.id)?;

    println!("✓ Record {} ({}) deleted", deleted.id, deleted.name);

    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Open the vault database, creating its directory on first use.
fn open_db(path: &Path) -> Result<Database, VaultError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    Database::open(path).map_err(|e| VaultError::store("open_db", e))
}

fn record_service<'a>(
    db: &'a Database,
    config: &Config,
) -> Result<RecordService<SqliteRecordStore<'a>>, VaultError> {
    Ok(RecordService::new(SqliteRecordStore::new(db), config.codec()?))
}

fn lookup_user(db: &Database, op: &'static str, name: &str) -> Result<User, VaultError> {
    SqliteUserDirectory::new(db)
        .get_user_by_name(name)
        .map_err(|e| VaultError::store(op, e))
}

fn parse_id(op: &'static str, id: &str) -> Result<Uuid, VaultError> {
    Uuid::parse_str(id).map_err(|e| VaultError::invalid_input(op, format!("invalid UUID: {}", e)))
}

fn print_json<T: Serialize>(op: &'static str, value: &T) -> Result<(), VaultError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| VaultError::Internal {
        op,
        reason: e.to_string(),
    })?;
    println!("{}", json);
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
