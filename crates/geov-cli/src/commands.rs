use anyhow::{bail, Context};
use colored::Colorize;
use geov_crypto::ContentHasher;
use geov_store::{
    open_store, BackendKind, ContentStore, FileDocumentStore, GeoObject, StoreConfig, StoreResult,
};
use geov_types::{Attributes, ContentId, Geometry};
use serde_json::{json, Value};
use tracing::warn;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Init => with_store(&config, |store| cmd_init(store, &config, format)),
        Command::Put(args) => with_store(&config, |store| cmd_put(store, args, format)),
        Command::Hash(args) => cmd_hash(args, format),
        Command::Get(args) => with_store(&config, |store| cmd_get(store, args, format)),
        Command::Exists(args) => with_store(&config, |store| cmd_exists(store, args, format)),
        Command::Rm(args) => with_store(&config, |store| cmd_rm(store, args, format)),
        Command::Count => with_store(&config, |store| cmd_count(store, format)),
        Command::Ls => with_store(&config, |store| cmd_ls(store, format)),
        Command::Kind(args) => with_store(&config, |store| {
            print_objects(&store.find_by_geometry_kind(args.kind)?, format)
        }),
        Command::Bbox(args) => with_store(&config, |store| {
            let objects =
                store.find_in_bounding_box(args.min_lon, args.min_lat, args.max_lon, args.max_lat)?;
            print_objects(&objects, format)
        }),
        Command::Compact => cmd_compact(&config, format),
    }
}

/// Build the store configuration: file values first, then flag overrides.
pub fn resolve_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.backend = BackendKind::File;
        config.data_dir = dir.clone();
    }
    if cli.memory {
        config.backend = BackendKind::Memory;
    }
    config.validate()?;
    Ok(config)
}

/// Open the configured store, run `f`, and close the store even if `f` fails.
fn with_store<F>(config: &StoreConfig, f: F) -> anyhow::Result<()>
where
    F: FnOnce(&ContentStore) -> anyhow::Result<()>,
{
    let store = open_store(config)
        .with_context(|| format!("cannot open store in {}", config.data_dir.display()))?;
    let result = f(&store);
    after_close(result, store.close())
}

/// Combine a command's result with the outcome of closing the store. The
/// command's own error wins; a close failure behind it is only logged.
fn after_close(result: anyhow::Result<()>, closed: StoreResult<()>) -> anyhow::Result<()> {
    match (result, closed) {
        (Err(e), Err(close_err)) => {
            warn!(error = %close_err, "failed to close store after command error");
            Err(e)
        }
        (Err(e), Ok(())) => Err(e),
        (Ok(()), closed) => Ok(closed.context("failed to close store")?),
    }
}

fn cmd_init(store: &ContentStore, config: &StoreConfig, format: OutputFormat) -> anyhow::Result<()> {
    let count = store.count()?;
    let location = match config.backend {
        BackendKind::Memory => "memory".to_string(),
        BackendKind::File => config.journal_path().display().to_string(),
    };
    match format {
        OutputFormat::Json => print_json(&json!({ "store": location, "count": count }))?,
        OutputFormat::Text => {
            println!("{} Store ready at {}", "✓".green().bold(), location.bold());
            println!("  Collection: {}", config.collection.cyan());
            println!("  Objects: {}", count.to_string().bold());
        }
    }
    Ok(())
}

fn cmd_put(store: &ContentStore, args: ObjectArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (geometry, attributes) = parse_object(&args)?;
    let existed = store.exists(&store.compute_id(&geometry, &attributes)?)?;
    let id = store.store(&GeoObject::new(geometry, attributes))?;
    let created = !existed;
    match format {
        OutputFormat::Json => print_json(&json!({ "id": id, "created": created }))?,
        OutputFormat::Text => {
            let status = if created { "stored".green() } else { "already stored".yellow() };
            println!("{} {} ({})", "✓".green().bold(), id.to_string().yellow(), status);
        }
    }
    Ok(())
}

fn cmd_hash(args: ObjectArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (geometry, attributes) = parse_object(&args)?;
    let id = ContentHasher::compute(&geometry, &attributes)?;
    match format {
        OutputFormat::Json => {
            let canonical = ContentHasher::canonical_text(&geometry, &attributes)?;
            print_json(&json!({ "id": id, "canonical": canonical }))?
        }
        OutputFormat::Text => println!("{id}"),
    }
    Ok(())
}

fn cmd_get(store: &ContentStore, args: IdArgs, format: OutputFormat) -> anyhow::Result<()> {
    let id = parse_id(&args.id)?;
    let Some(object) = store.retrieve(&id)? else {
        bail!("not found: {id}");
    };
    match format {
        OutputFormat::Json => print_json(&object_json(&object))?,
        OutputFormat::Text => {
            println!("{} {}", "Object".bold(), object.id().to_string().yellow());
            println!("  Kind: {}", object.kind().to_string().cyan());
            if let Some(created) = object.created_at() {
                println!("  Created: {}", created.to_rfc3339());
            }
            println!("  Geometry: {}", object.geometry().as_value());
            println!("  Attributes: {}", Value::Object(object.attributes().clone()));
        }
    }
    Ok(())
}

fn cmd_exists(store: &ContentStore, args: IdArgs, format: OutputFormat) -> anyhow::Result<()> {
    let id = parse_id(&args.id)?;
    let exists = store.exists(&id)?;
    match format {
        OutputFormat::Json => print_json(&json!({ "id": id, "exists": exists }))?,
        OutputFormat::Text if exists => println!("{} {}", "yes".green(), id.short_hex()),
        OutputFormat::Text => println!("{} {}", "no".red(), id.short_hex()),
    }
    Ok(())
}

fn cmd_rm(store: &ContentStore, args: IdArgs, format: OutputFormat) -> anyhow::Result<()> {
    let id = parse_id(&args.id)?;
    let removed = store.remove(&id)?;
    match format {
        OutputFormat::Json => print_json(&json!({ "id": id, "removed": removed }))?,
        OutputFormat::Text if removed => println!("Removed {}", id.short_hex().yellow()),
        OutputFormat::Text => println!("Nothing to remove for {}", id.short_hex().yellow()),
    }
    Ok(())
}

fn cmd_count(store: &ContentStore, format: OutputFormat) -> anyhow::Result<()> {
    let count = store.count()?;
    match format {
        OutputFormat::Json => print_json(&json!({ "count": count }))?,
        OutputFormat::Text => println!("{count}"),
    }
    Ok(())
}

fn cmd_ls(store: &ContentStore, format: OutputFormat) -> anyhow::Result<()> {
    let mut ids = store.list_ids()?;
    ids.sort();
    match format {
        OutputFormat::Json => print_json(&json!(ids))?,
        OutputFormat::Text if ids.is_empty() => println!("No objects."),
        OutputFormat::Text => {
            for id in ids {
                println!("{id}");
            }
        }
    }
    Ok(())
}

fn cmd_compact(config: &StoreConfig, format: OutputFormat) -> anyhow::Result<()> {
    if config.backend == BackendKind::Memory {
        bail!("compact needs the file backend");
    }
    let path = config.journal_path();
    let journal = FileDocumentStore::open(&path, config.sync_mode)
        .with_context(|| format!("cannot open journal {}", path.display()))?;
    let before = journal.offset()?;
    journal.compact()?;
    let after = journal.offset()?;
    match format {
        OutputFormat::Json => print_json(&json!({ "journal": path, "before": before, "after": after }))?,
        OutputFormat::Text => println!(
            "{} Compacted {}: {} -> {} bytes",
            "✓".green().bold(),
            path.display(),
            before,
            after
        ),
    }
    Ok(())
}

fn parse_object(args: &ObjectArgs) -> anyhow::Result<(Geometry, Attributes)> {
    let geometry = Geometry::from_json_str(&args.geometry).context("--geometry is not JSON")?;
    let attributes = match &args.attributes {
        None => Attributes::new(),
        Some(text) => match serde_json::from_str(text).context("--attributes is not JSON")? {
            Value::Object(map) => map,
            _ => bail!("--attributes must be a JSON object"),
        },
    };
    Ok((geometry, attributes))
}

fn parse_id(text: &str) -> anyhow::Result<ContentId> {
    text.parse()
        .with_context(|| format!("{text:?} is not a 64-character hex content id"))
}

fn object_json(object: &GeoObject) -> Value {
    json!({
        "id": object.id(),
        "kind": object.kind().to_string(),
        "geometry": object.geometry(),
        "attributes": object.attributes(),
        "createdAt": object.created_at().map(|t| t.to_rfc3339()),
    })
}

fn print_objects(objects: &[GeoObject], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(&Value::Array(objects.iter().map(object_json).collect()))?
        }
        OutputFormat::Text if objects.is_empty() => println!("No objects."),
        OutputFormat::Text => {
            for object in objects {
                println!(
                    "{}  {}  {}",
                    object.id().short_hex().yellow(),
                    object.kind().to_string().cyan(),
                    Value::Object(object.attributes().clone()),
                );
            }
        }
    }
    Ok(())
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
