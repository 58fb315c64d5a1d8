//! CLI command implementations
//!
//! One-shot commands resolve a store path, run one store operation and
//! print one JSON response. `menu` hands stdin/stdout to an interactive
//! session instead.
//!
//! Every record command checks that the store exists before calling into
//! the store; only `create` may run against a missing file.

use std::io::{self, BufRead, Write};
use std::path::Path;

use serde_json::{json, Value};

use crate::observability::{log_event_with_fields, Event, Logger};
use crate::store::{FieldText, RecordStore, StoreResult, StudentRecord, RECORD_WIDTH};

use super::args::{Command, FieldArgs, StoreArg};
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};
use super::menu::MenuSession;

/// Main entry point: parse args, load config, dispatch
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_with(cli, &mut stdin.lock(), &mut stdout.lock())
}

/// Run parsed arguments against the given input and output
pub fn run_with<R: BufRead, W: Write>(
    cli: super::args::Cli,
    input: &mut R,
    out: &mut W,
) -> CliResult<()> {
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return respond(out, Err(e)),
    };

    run_command(cli.command, config, input, out)
}

fn load_config(path: Option<&Path>) -> CliResult<Config> {
    let config = Config::load_or_default(path)?;
    Logger::set_min_severity(config.severity());

    if let Some(path) = path {
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", path.display().to_string().as_str())],
        );
    }

    Ok(config)
}

/// Run the appropriate command
pub fn run_command<R: BufRead, W: Write>(
    cmd: Command,
    config: Config,
    input: &mut R,
    out: &mut W,
) -> CliResult<()> {
    let result = match cmd {
        Command::Menu => return MenuSession::new(input, out, config).run(),
        Command::Create { name } => create(&config, &name),
        Command::Add { store, id, fields } => add(&config, &store, &id, &fields),
        Command::List { store } => list(&config, &store),
        Command::Search { store, id } => search(&config, &store, &id),
        Command::Update { store, id, fields } => update(&config, &store, &id, &fields),
        Command::Delete { store, id } => delete(&config, &store, &id),
        Command::Info { store } => info(&config, &store),
    };

    respond(out, result)
}

fn respond<W: Write>(out: &mut W, result: CliResult<Value>) -> CliResult<()> {
    match result {
        Ok(data) => write_response(out, data),
        Err(e) => {
            write_error(out, e.code(), &e.message(), e.details())?;
            Err(e)
        }
    }
}

/// Resolve and open an existing store
fn existing_store(config: &Config, arg: &StoreArg) -> CliResult<RecordStore> {
    let path = config.resolve_store(arg.file.as_deref())?;
    let store = RecordStore::with_options(path, config.store_options());

    if !store.exists() {
        return Err(CliError::NoStore(store.path().to_path_buf()));
    }

    Ok(store)
}

/// Key for a typed student id: surrounding whitespace dropped, then cut to
/// field capacity. Both drivers go through here.
pub(crate) fn student_id(raw: &str) -> FieldText {
    FieldText::from(raw.trim())
}

/// Create or truncate a store file
pub fn create(config: &Config, name: &str) -> CliResult<Value> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::EmptyFileName);
    }

    let store = RecordStore::with_options(config.with_extension(name), config.store_options());
    store.initialize()?;

    Ok(json!({
        "created": true,
        "path": store.path().display().to_string(),
    }))
}

/// Append a record
pub fn add(config: &Config, arg: &StoreArg, id: &str, fields: &FieldArgs) -> CliResult<Value> {
    let store = existing_store(config, arg)?;
    let record = StudentRecord::from_fields(student_id(id), fields.to_fields());
    let offset = store.append(&record)?;

    Ok(json!({
        "offset": offset,
        "record": record,
    }))
}

/// List every record in file order
pub fn list(config: &Config, arg: &StoreArg) -> CliResult<Value> {
    let store = existing_store(config, arg)?;
    let records = store.list()?.collect::<StoreResult<Vec<_>>>()?;

    Ok(json!({
        "count": records.len(),
        "records": records,
    }))
}

/// Find one record by id
pub fn search(config: &Config, arg: &StoreArg, id: &str) -> CliResult<Value> {
    let store = existing_store(config, arg)?;
    let record = store.find(student_id(id))?;

    Ok(json!({ "record": record }))
}

/// Replace the mutable fields of a record
pub fn update(config: &Config, arg: &StoreArg, id: &str, fields: &FieldArgs) -> CliResult<Value> {
    let store = existing_store(config, arg)?;
    let record = store.update(student_id(id), fields.to_fields())?;

    Ok(json!({ "record": record }))
}

/// Delete a record by id
pub fn delete(config: &Config, arg: &StoreArg, id: &str) -> CliResult<Value> {
    let store = existing_store(config, arg)?;
    let removed = store.delete(student_id(id))?;

    Ok(json!({ "deleted": removed }))
}

/// Record count and size of a store
pub fn info(config: &Config, arg: &StoreArg) -> CliResult<Value> {
    let store = existing_store(config, arg)?;
    let stats = store.stats()?;

    Ok(json!({
        "path": store.path().display().to_string(),
        "records": stats.records,
        "bytes": stats.bytes,
        "record_width": RECORD_WIDTH,
    }))
}
