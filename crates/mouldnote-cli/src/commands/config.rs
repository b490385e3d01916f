use mouldnote_core::config::{load_config, ExtractionConfig};
use mouldnote_core::error::MouldNoteError;
use std::path::Path;

pub fn show(file: Option<&Path>) -> Result<(), MouldNoteError> {
    let config = match file {
        Some(path) => load_config(path)?,
        None => ExtractionConfig::default(),
    };
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), MouldNoteError> {
    let config = load_config(file)?;
    let defaults = ExtractionConfig::default();

    println!("Config '{}' is valid.", file.display());

    let ours = serde_json::to_value(&config)?;
    let base = serde_json::to_value(&defaults)?;
    let (Some(ours), Some(base)) = (ours.as_object(), base.as_object()) else {
        return Ok(());
    };
    let changed: Vec<String> = ours
        .iter()
        .filter(|(k, v)| base.get(*k) != Some(*v))
        .map(|(k, v)| format!("{k} = {v}"))
        .collect();

    if changed.is_empty() {
        println!("  No overrides, all values are defaults.");
    } else {
        println!("  Overrides:");
        for c in &changed {
            println!("  - {c}");
        }
    }
    Ok(())
}
