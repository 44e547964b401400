//! `narada presets ...`

use std::fs;
use std::path::Path;

use narada_core::{AnalyzerConfig, Preset};
use narada_runtime::PresetStore;
use serde_json::Value;

use crate::bootstrap::CliContext;
use crate::commands::PresetCommand;
use crate::error::CliError;
use crate::presentation::{print_separator, truncate_string};

pub fn execute(ctx: &CliContext, command: PresetCommand) -> Result<(), CliError> {
    let presets = ctx.runtime().presets();
    match command {
        PresetCommand::List => list(presets),
        PresetCommand::Show { id } => show(presets, &id),
        PresetCommand::Save {
            name,
            description,
            id,
            base,
            settings_file,
        } => {
            let mut settings = match base {
                Some(base) => presets.resolve(&base)?,
                None => AnalyzerConfig::default(),
            };
            if let Some(path) = settings_file {
                settings = overlay(settings, read_json(&path)?)?;
            }
            let preset = Preset {
                id: id.unwrap_or_default(),
                ..Preset::custom(name, description, settings)
            };
            let saved = presets.save(preset)?;
            println!("Saved preset {} ({})", saved.id, saved.name);
            Ok(())
        }
        PresetCommand::Delete { id } => {
            let selected = presets.delete(&id)?;
            println!("Deleted preset {id}; selected preset is {selected}");
            Ok(())
        }
        PresetCommand::Select { id } => {
            presets.select(&id)?;
            println!("Selected preset {id}");
            Ok(())
        }
    }
}

fn list(presets: &PresetStore) -> Result<(), CliError> {
    let selected = presets.last_used()?;
    println!("  {:<22} {:<24} {:<8} DESCRIPTION", "ID", "NAME", "KIND");
    print_separator(96);
    for preset in presets.list_all()? {
        let marker = if preset.id == selected { '*' } else { ' ' };
        let kind = if preset.locked { "builtin" } else { "custom" };
        println!(
            "{marker} {:<22} {:<24} {:<8} {}",
            preset.id,
            truncate_string(&preset.name, 24),
            kind,
            truncate_string(&preset.description, 36)
        );
    }
    Ok(())
}

fn show(presets: &PresetStore, id: &str) -> Result<(), CliError> {
    let preset = presets.get(id)?;
    println!("{}", serde_json::to_string_pretty(&preset)?);
    println!();
    println!("Analyzer flags: {}", preset.settings.to_args().join(" "));
    Ok(())
}

fn read_json(path: &Path) -> Result<Value, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
    Ok(serde_json::from_str(&text)?)
}

/// Apply the fields present in `patch` on top of `base`.
fn overlay(base: AnalyzerConfig, patch: Value) -> Result<AnalyzerConfig, CliError> {
    let Value::Object(fields) = patch else {
        return Err(CliError::Arguments(
            "settings file must contain a JSON object".to_string(),
        ));
    };
    let mut merged = serde_json::to_value(base)?;
    if let Value::Object(target) = &mut merged {
        target.extend(fields);
    }
    Ok(serde_json::from_value(merged)?)
}
