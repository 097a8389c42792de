use amazedb_core::logging::{init_from_env, set_log_level, LogLevel};
use amazedb_core::{Database, Document, FileStorage, Query, Store, StoreOptions, Update};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "amazedb")]
#[command(about = "AmazeDB CLI - inspect and edit an AmazeDB store from the shell")]
#[command(version)]
struct Cli {
    /// Directory holding the store's `db` folder
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
    /// error, warn, info, debug or trace (overrides AMAZEDB_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List databases
    Dbs,
    /// List the groups of a database
    Groups { db: String },
    /// Print matching documents
    Get {
        db: String,
        group: String,
        /// Query specification, e.g. '{"age": {"__gt": 10}}'
        #[arg(long)]
        filter: Option<String>,
        /// Sort ascending by this field
        #[arg(long)]
        sort: Option<String>,
        /// Only the first match (after sorting, with --sort)
        #[arg(long)]
        one: bool,
    },
    /// Insert a JSON object or an array of objects
    Insert {
        db: String,
        group: String,
        documents: String,
    },
    /// Merge an update mapping into matching documents
    Update {
        db: String,
        group: String,
        filter: String,
        update: String,
        /// Only the first match
        #[arg(long)]
        one: bool,
    },
    /// Remove matching documents
    Remove {
        db: String,
        group: String,
        filter: String,
        /// Only the first match
        #[arg(long)]
        one: bool,
    },
    /// Drop a whole database, or one group of it
    Drop { db: String, group: Option<String> },
    /// Write a database to `<dir>/<db>.amazedb`
    Export { db: String, dir: PathBuf },
    /// Replace a database's groups with an export package
    Import { db: String, file: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_from_env();
    if let Some(level) = cli.log_level.as_deref() {
        let level = LogLevel::parse(level)
            .with_context(|| format!("Unknown log level: {}", level))?;
        set_log_level(level);
    }

    let store = Store::open(StoreOptions::new().with_root(&cli.root))
        .with_context(|| format!("Failed to open store at {}", cli.root.display()))?;

    match cli.command {
        Commands::Dbs => print_json(&json!(store.list_dbs()?)),
        Commands::Groups { db } => {
            let groups = open_db(&store, &db)?.list_groups()?;
            print_json(&json!(groups))
        }
        Commands::Get {
            db,
            group,
            filter,
            sort,
            one,
        } => get_documents(&store, &db, &group, filter.as_deref(), sort.as_deref(), one),
        Commands::Insert {
            db,
            group,
            documents,
        } => insert_documents(&store, &db, &group, &documents),
        Commands::Update {
            db,
            group,
            filter,
            update,
            one,
        } => update_documents(&store, &db, &group, &filter, &update, one),
        Commands::Remove {
            db,
            group,
            filter,
            one,
        } => remove_documents(&store, &db, &group, &filter, one),
        Commands::Drop { db, group } => drop_target(&store, &db, group.as_deref()),
        Commands::Export { db, dir } => export_db(&store, &db, &dir),
        Commands::Import { db, file } => import_db(&store, &db, &file),
    }
}

fn print_json(value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}

fn parse_json(text: &str, what: &str) -> Result<Value> {
    serde_json::from_str(text).with_context(|| format!("Invalid JSON in {}: {}", what, text))
}

fn parse_query(text: &str) -> Result<Query> {
    let spec = parse_json(text, "filter")?;
    Query::from_json(&spec).with_context(|| format!("Invalid filter: {}", text))
}

fn open_db(store: &Store, name: &str) -> Result<Database<FileStorage>> {
    store
        .open_db(name)
        .with_context(|| format!("Failed to open database '{}'", name))
}

fn get_documents(
    store: &Store,
    db: &str,
    group: &str,
    filter: Option<&str>,
    sort: Option<&str>,
    one: bool,
) -> Result<()> {
    let query = match filter {
        Some(text) => parse_query(text)?,
        None => Query::new(),
    };
    let group = open_db(store, db)?
        .get_group(group)
        .with_context(|| format!("Failed to open group '{}'", group))?;

    if one {
        let found = group.get_one(&query, sort)?;
        return print_json(&found.map(Value::from).unwrap_or(Value::Null));
    }
    let docs: Vec<Value> = group
        .get(&query, sort)?
        .into_iter()
        .map(Value::from)
        .collect();
    print_json(&Value::Array(docs))
}

fn insert_documents(store: &Store, db: &str, group: &str, text: &str) -> Result<()> {
    let documents = match parse_json(text, "documents")? {
        Value::Array(items) => items
            .into_iter()
            .map(Document::from_value)
            .collect::<amazedb_core::Result<Vec<_>>>()
            .context("Every document must be a JSON object")?,
        value @ Value::Object(_) => vec![Document::from_value(value)?],
        _ => bail!("Documents must be a JSON object or an array of objects"),
    };

    let group = store
        .db(db)
        .with_context(|| format!("Failed to open database '{}'", db))?
        .group(group)?;
    let inserted = group
        .insert_many(documents)
        .with_context(|| format!("Failed to insert into {}/{}", db, group.name()))?;
    print_json(&json!({ "inserted": inserted.len() }))
}

fn update_documents(
    store: &Store,
    db: &str,
    group: &str,
    filter: &str,
    update: &str,
    one: bool,
) -> Result<()> {
    let query = parse_query(filter)?;
    let update = Update::from_json(&parse_json(update, "update")?)
        .with_context(|| format!("Invalid update: {}", update))?;
    let group = open_db(store, db)?.get_group(group)?;

    let updated = if one {
        group.update_one(&query, &update)?
    } else {
        group.update(&query, &update)?
    };
    print_json(&json!({ "updated": updated }))
}

fn remove_documents(store: &Store, db: &str, group: &str, filter: &str, one: bool) -> Result<()> {
    let query = parse_query(filter)?;
    let group = open_db(store, db)?.get_group(group)?;

    let removed = if one {
        group.remove_one(&query)?
    } else {
        group.remove(&query)?
    };
    print_json(&json!({ "removed": removed }))
}

fn drop_target(store: &Store, db: &str, group: Option<&str>) -> Result<()> {
    match group {
        Some(name) => {
            open_db(store, db)?
                .get_group(name)?
                .drop()
                .with_context(|| format!("Failed to drop group {}/{}", db, name))?;
            eprintln!("Dropped group {}/{}", db, name);
        }
        None => {
            store
                .drop_db(db)
                .with_context(|| format!("Failed to drop database '{}'", db))?;
            eprintln!("Dropped database '{}'", db);
        }
    }
    Ok(())
}

fn export_db(store: &Store, db: &str, dir: &Path) -> Result<()> {
    let path = open_db(store, db)?
        .export(dir)
        .with_context(|| format!("Failed to export '{}' to {}", db, dir.display()))?;
    print_json(&json!({ "exported": path.display().to_string() }))
}

fn import_db(store: &Store, db: &str, file: &Path) -> Result<()> {
    let groups = store
        .db(db)?
        .import(file)
        .with_context(|| format!("Failed to import {} into '{}'", file.display(), db))?;
    print_json(&json!({ "imported_groups": groups }))
}
