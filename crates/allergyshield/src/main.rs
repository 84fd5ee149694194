//! `allergyshield` - CLI for the allergy record store
//!
//! This binary provides the command-line interface for adding, finding and
//! transferring allergy entries.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;

use allergyshield::cli::output::{render_detail, render_records, render_stats};
use allergyshield::cli::{
    AddCommand, Cli, Command, ConfigCommand, DeleteCommand, EditCommand, ExportCommand,
    ExportFormat, ImportCommand, ListCommand, OutputFormat, SearchCommand, ShowCommand,
};
use allergyshield::{init_logging, sample, transfer, AllergyStore, Config, Error};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Validation reports on the file itself rather than failing the load.
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        handle_validate(file.clone().or_else(|| cli.config.clone()));
        return Ok(());
    }

    let mut config =
        Config::load_from(cli.config.clone()).context("failed to load configuration")?;
    if let Some(database) = cli.database {
        config.storage.database_path = Some(database);
    }

    if let Command::Config(cmd) = &cli.command {
        return handle_config(&config, cli.config.as_deref(), cmd);
    }

    let store = open_store(&config)?;
    run(&store, &config, cli.command)
}

fn open_store(config: &Config) -> anyhow::Result<AllergyStore> {
    let path = config.database_path();
    AllergyStore::open(&path, config.danger_scale()?)
        .with_context(|| format!("cannot open database at {}", path.display()))
}

fn run(store: &AllergyStore, config: &Config, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Add(cmd) => handle_add(store, &cmd),
        Command::List(cmd) => handle_list(store, config, &cmd),
        Command::Search(cmd) => handle_search(store, config, &cmd),
        Command::Show(cmd) => handle_show(store, &cmd),
        Command::Edit(cmd) => handle_edit(store, &cmd),
        Command::Delete(cmd) => handle_delete(store, &cmd),
        Command::Import(cmd) => handle_import(store, config, &cmd),
        Command::Export(cmd) => handle_export(store, &cmd),
        Command::Seed => handle_seed(store),
        Command::Status(cmd) => handle_status(store, cmd.json),
        // Handled before the store is opened.
        Command::Config(_) => Ok(()),
    }
}

fn handle_add(store: &AllergyStore, cmd: &AddCommand) -> anyhow::Result<()> {
    let record = store.add(&cmd.to_input())?;
    println!(
        "Added {} (id {}, level {} {})",
        record.allergen_name,
        record.id,
        record.danger_level,
        store.scale().label(record.danger_level)
    );
    Ok(())
}

fn handle_list(store: &AllergyStore, config: &Config, cmd: &ListCommand) -> anyhow::Result<()> {
    let records = match cmd.level {
        Some(level) => store.list_by_level(level)?,
        None => store.list_all()?,
    };

    if records.is_empty() && cmd.format != OutputFormat::Json {
        println!("No allergies recorded.");
        return Ok(());
    }
    print!(
        "{}",
        render_records(&records, cmd.format, config.layout(), store.scale())?
    );
    if cmd.format == OutputFormat::Json {
        println!();
    }
    Ok(())
}

fn handle_search(
    store: &AllergyStore,
    config: &Config,
    cmd: &SearchCommand,
) -> anyhow::Result<()> {
    let records = store.search_at_level(&cmd.query, cmd.level)?;

    if records.is_empty() && cmd.format != OutputFormat::Json {
        println!("No allergies match \"{}\".", cmd.query.trim());
        return Ok(());
    }
    print!(
        "{}",
        render_records(&records, cmd.format, config.layout(), store.scale())?
    );
    if cmd.format == OutputFormat::Json {
        println!();
    }
    Ok(())
}

fn handle_show(store: &AllergyStore, cmd: &ShowCommand) -> anyhow::Result<()> {
    let record = store.get(cmd.id)?.ok_or(Error::NotFound { id: cmd.id })?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{}", render_detail(&record, store.scale()));
    }
    Ok(())
}

fn handle_edit(store: &AllergyStore, cmd: &EditCommand) -> anyhow::Result<()> {
    if !cmd.has_changes() {
        bail!("nothing to change: pass at least one field option (see --help)");
    }

    let current = store.get(cmd.id)?.ok_or(Error::NotFound { id: cmd.id })?;
    let record = store.update(cmd.id, &cmd.apply_to(&current))?;
    println!("Updated {} (id {})", record.allergen_name, record.id);
    Ok(())
}

fn handle_delete(store: &AllergyStore, cmd: &DeleteCommand) -> anyhow::Result<()> {
    let record = store.get(cmd.id)?.ok_or(Error::NotFound { id: cmd.id })?;

    if !cmd.yes {
        println!(
            "This will delete {} (id {}).",
            record.allergen_name, record.id
        );
        println!("Use --yes to confirm.");
        return Ok(());
    }

    store.delete(cmd.id)?;
    println!("Deleted {} (id {})", record.allergen_name, record.id);
    Ok(())
}

fn handle_import(store: &AllergyStore, config: &Config, cmd: &ImportCommand) -> anyhow::Result<()> {
    let file = File::open(&cmd.file)
        .with_context(|| format!("cannot read {}", cmd.file.display()))?;
    let policy = cmd
        .on_duplicate
        .map_or(config.import.on_duplicate, Into::into);

    let summary = transfer::import_csv(store, BufReader::new(file), policy)?;

    println!("Imported:  {}", summary.imported);
    println!("Updated:   {}", summary.updated);
    println!("Skipped:   {}", summary.skipped);
    println!("Written:   {}", summary.written());
    if !summary.errors.is_empty() {
        println!("Rejected:  {}", summary.errors.len());
        for error in &summary.errors {
            println!("  {error}");
        }
    }
    Ok(())
}

fn handle_export(store: &AllergyStore, cmd: &ExportCommand) -> anyhow::Result<()> {
    let file = File::create(&cmd.file)
        .with_context(|| format!("cannot write {}", cmd.file.display()))?;
    let mut writer = BufWriter::new(file);

    let written = match cmd.format {
        ExportFormat::Csv => transfer::export_csv(store, &mut writer)?,
        ExportFormat::Json => transfer::export_json(store, &mut writer)?,
    };
    writer.flush()?;

    println!("Exported {written} entries to {}", cmd.file.display());
    Ok(())
}

fn handle_seed(store: &AllergyStore) -> anyhow::Result<()> {
    let summary = sample::seed_sample_data(store)?;

    for name in &summary.added {
        println!("Added:   {name}");
    }
    for name in &summary.skipped {
        println!("Skipped: {name}");
    }
    println!(
        "{} sample entries added, {} skipped",
        summary.added.len(),
        summary.skipped.len()
    );
    Ok(())
}

fn handle_status(store: &AllergyStore, json: bool) -> anyhow::Result<()> {
    let stats = store.stats()?;

    if json {
        let status = serde_json::json!({
            "database_path": store.path(),
            "danger_scale": store.scale(),
            "total_entries": stats.total_entries,
            "by_level": stats.by_level,
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print!(
            "{}",
            render_stats(&stats, &store.path().display().to_string(), store.scale())
        );
    }
    Ok(())
}

fn handle_config(
    config: &Config,
    custom_path: Option<&Path>,
    cmd: &ConfigCommand,
) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:  {}", config.database_path().display());
                println!();
                println!("[Danger]");
                println!("  Min level:      {}", config.danger.min_level);
                println!("  Max level:      {}", config.danger.max_level);
                println!();
                println!("[Display]");
                println!(
                    "  Layout:         {:?} (using {:?})",
                    config.display.layout,
                    config.layout()
                );
                println!();
                println!("[Import]");
                println!("  On duplicate:   {:?}", config.import.on_duplicate);
            }
        }
        ConfigCommand::Path => {
            let path = custom_path.map_or_else(Config::default_config_path, Path::to_path_buf);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            handle_validate(file.clone().or_else(|| custom_path.map(Path::to_path_buf)));
        }
    }
    Ok(())
}

fn handle_validate(file: Option<PathBuf>) {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path)) {
        Ok(_) => println!("Configuration is valid."),
        Err(e) => println!("Configuration error: {e}"),
    }
}
