//! Developer attachment editing on a saved entity file.
//!
//! The file is the JSON form of a `SaveFile`. Edits go through a session with
//! an empty registry, so attachability and identity rules are the same as in
//! a running host. Every subcommand refuses to run unless dev mode is on.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use capability_core::{AttachmentData, AttachmentRecord, CapabilityId, EntityId, TagValue};
use capability_runtime::{SaveFile, Session, SessionConfig, Slot};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;

/// Add, remove, list or purge attachments
#[derive(Parser, Debug)]
pub struct Attachments {
    #[command(subcommand)]
    action: Action,

    /// Entity save file (JSON)
    #[arg(short, long, global = true, value_name = "FILE", default_value = "entity.json")]
    file: PathBuf,

    /// Session config (TOML); `CAPABILITY_*` env vars apply on top
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Attach a capability to an object slot or the entity
    Add(AddArgs),

    /// Detach every record of a capability from an object slot or the entity
    Remove(RemoveArgs),

    /// Print every attachment record in the file
    List,

    /// Drop records whose capability id is not in the known set
    Purge {
        /// Capability ids that are still registered (repeatable)
        #[arg(long = "known", value_name = "ID")]
        known: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Owner {
    /// The object in `--slot`
    Object,
    /// The entity itself
    Entity,
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(value_enum)]
    owner: Owner,

    /// Capability id, e.g. `Mod:MagicalDash`
    id: String,

    /// Object slot: held, equipment:N or misc:N
    #[arg(short, long, default_value = "held")]
    slot: Slot,

    /// Attachment data entry `key=value` (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_entry)]
    entries: Vec<(String, TagValue)>,

    /// Entity id used when the file does not exist yet
    #[arg(long, default_value_t = 0)]
    entity: u32,
}

#[derive(Args, Debug)]
struct RemoveArgs {
    #[arg(value_enum)]
    owner: Owner,

    /// Capability id
    id: String,

    /// Object slot: held, equipment:N or misc:N
    #[arg(short, long, default_value = "held")]
    slot: Slot,
}

impl Attachments {
    pub fn execute(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        if !config.dev_mode {
            anyhow::bail!(
                "dev mode disabled\n\nHint: set `dev_mode = true` in the session config or CAPABILITY_DEV_MODE=true"
            );
        }

        match self.action {
            Action::Add(args) => add(&self.file, config, args),
            Action::Remove(args) => remove(&self.file, config, args),
            Action::List => list(&read_save(&self.file)?),
            Action::Purge { known } => purge(&self.file, known),
        }
    }
}

fn add(path: &Path, config: SessionConfig, args: AddArgs) -> Result<()> {
    let save = if path.exists() {
        read_save(path)?
    } else {
        SaveFile::empty(EntityId(args.entity))
    };

    let data = args
        .entries
        .into_iter()
        .fold(AttachmentData::new(), |data, (key, value)| data.with(key, value));
    let record = AttachmentRecord::new(args.id.as_str(), data);

    let session = Session::builder().config(config).build();
    let mut host = session.restore_host(save)?;
    let target = match args.owner {
        Owner::Entity => {
            host.attach_to_entity(record);
            "entity".to_owned()
        }
        Owner::Object => {
            host.attach(args.slot, record)
                .with_context(|| format!("Failed to attach {} to {}", args.id, args.slot))?;
            args.slot.to_string()
        }
    };

    write_save(path, &SaveFile::capture(&host))?;
    println!(
        "{} Attached {} to {}",
        style("✓").green().bold(),
        style(&args.id).cyan(),
        target
    );
    Ok(())
}

fn remove(path: &Path, config: SessionConfig, args: RemoveArgs) -> Result<()> {
    let save = read_save(path)?;
    let id = CapabilityId::new(&args.id);

    let session = Session::builder().config(config).build();
    let mut host = session.restore_host(save)?;
    let removed = match args.owner {
        Owner::Entity => host.detach_from_entity(&id),
        Owner::Object => host.detach(args.slot, &id)?,
    };

    if removed == 0 {
        println!("{}", style(format!("No {} attachment found", args.id)).dim());
        return Ok(());
    }

    write_save(path, &SaveFile::capture(&host))?;
    println!(
        "{} Removed {} record(s) of {}",
        style("✓").green().bold(),
        removed,
        style(&args.id).cyan()
    );
    Ok(())
}

fn purge(path: &Path, known: Vec<String>) -> Result<()> {
    let mut save = read_save(path)?;
    let known: Vec<CapabilityId> = known.iter().map(CapabilityId::new).collect();

    let removed = save.retain_known(|id| known.contains(id));
    if removed > 0 {
        write_save(path, &save)?;
    }
    println!(
        "{} Purged {} unknown record(s)",
        style("✓").green().bold(),
        removed
    );
    Ok(())
}

fn list(save: &SaveFile) -> Result<()> {
    println!("{} {}", style("Entity:").bold().cyan(), save.entity);
    println!();

    print_records("entity", &save.attachments.attachments);
    let slots = std::iter::once((Slot::Held, &save.held))
        .chain(save.equipment.iter().enumerate().map(|(i, o)| (Slot::Equipment(i), o)))
        .chain(save.misc.iter().enumerate().map(|(i, o)| (Slot::Misc(i), o)));
    for (slot, object) in slots {
        if object.attachments.is_empty() {
            continue;
        }
        let label = match object.identity {
            Some(identity) => format!("{slot} (kind {}, {identity})", object.kind),
            None => format!("{slot} (kind {})", object.kind),
        };
        print_records(&label, &object.attachments);
    }
    Ok(())
}

fn print_records(label: &str, records: &[AttachmentRecord]) {
    println!("{}", style(format!("{label}:")).bold().yellow());
    if records.is_empty() {
        println!("  {}", style("(none)").dim());
    }
    for record in records {
        let data: Vec<String> = record
            .data
            .iter()
            .map(|(key, value)| format!("{key}={}", format_value(value)))
            .collect();
        if data.is_empty() {
            println!("  {}", style(&record.capability_id).cyan());
        } else {
            println!("  {} {}", style(&record.capability_id).cyan(), data.join(" "));
        }
    }
    println!();
}

fn format_value(value: &TagValue) -> String {
    match value {
        TagValue::Bool(v) => v.to_string(),
        TagValue::Int(v) => v.to_string(),
        TagValue::Float(v) => v.to_string(),
        TagValue::Str(v) => format!("{v:?}"),
        TagValue::Bytes(v) => format!("<{} bytes>", v.len()),
        TagValue::List(v) => format!("[{}]", v.iter().map(format_value).collect::<Vec<_>>().join(", ")),
        TagValue::Compound(v) => format!("{{{} entries}}", v.len()),
    }
}

fn parse_entry(s: &str) -> std::result::Result<(String, TagValue), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    if key.is_empty() {
        return Err("empty key".into());
    }
    let value = if let Ok(v) = raw.parse::<bool>() {
        TagValue::Bool(v)
    } else if let Ok(v) = raw.parse::<i64>() {
        TagValue::Int(v)
    } else if let Ok(v) = raw.parse::<f64>() {
        TagValue::Float(v)
    } else {
        TagValue::Str(raw.to_owned())
    };
    Ok((key.to_owned(), value))
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let config = match path {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => SessionConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn read_save(path: &Path) -> Result<SaveFile> {
    if !path.exists() {
        anyhow::bail!("Save file not found: {}", path.display());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read save file: {}", path.display()))?;
    SaveFile::from_json(&text)
        .with_context(|| format!("Failed to parse save file: {}", path.display()))
}

fn write_save(path: &Path, save: &SaveFile) -> Result<()> {
    let text = save.to_json()?;
    fs::write(path, text).with_context(|| format!("Failed to write save file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_pick_the_narrowest_type() {
        assert_eq!(parse_entry("locked=true").unwrap().1, TagValue::Bool(true));
        assert_eq!(parse_entry("ticks=30").unwrap().1, TagValue::Int(30));
        assert_eq!(parse_entry("ratio=0.5").unwrap().1, TagValue::Float(0.5));
        assert_eq!(
            parse_entry("label=a=b").unwrap(),
            ("label".to_owned(), TagValue::Str("a=b".into()))
        );
        assert!(parse_entry("novalue").is_err());
        assert!(parse_entry("=1").is_err());
    }

    #[test]
    fn add_then_remove_round_trips_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entity.json");
        let config = SessionConfig {
            dev_mode: true,
            ..SessionConfig::default()
        };

        add(
            &path,
            config.clone(),
            AddArgs {
                owner: Owner::Entity,
                id: "Mod:Dash".into(),
                slot: Slot::Held,
                entries: vec![("locked".into(), TagValue::Bool(false))],
                entity: 4,
            },
        )
        .unwrap();

        let save = read_save(&path).unwrap();
        assert_eq!(save.entity, EntityId(4));
        assert_eq!(save.attachments.attachments.len(), 1);
        assert_eq!(save.attachments.attachments[0].data.get_bool("locked"), Some(false));

        remove(
            &path,
            config,
            RemoveArgs {
                owner: Owner::Entity,
                id: "mod:dash".into(),
                slot: Slot::Held,
            },
        )
        .unwrap();
        assert!(read_save(&path).unwrap().attachments.attachments.is_empty());
    }

    #[test]
    fn air_slot_rejects_object_attachments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entity.json");

        let err = add(
            &path,
            SessionConfig::default(),
            AddArgs {
                owner: Owner::Object,
                id: "Mod:Siphon".into(),
                slot: Slot::Held,
                entries: Vec::new(),
                entity: 0,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to attach"));
        assert!(!path.exists());
    }
}
