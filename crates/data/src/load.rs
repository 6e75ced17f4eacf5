use crate::schema::{
    AbilityData, Assets, ConsumableDef, Content, EngineConfig, MaterialDef, ABILITIES_FILE,
    CONSUMABLES_FILE, CONTENT_DIR, ENGINE_CONFIG_FILE, MATERIALS_FILE,
};
use anyhow::{bail, Context};
use rollio_core::{AbilityManager, AbilityRegistry, ConsumableEffect, PLASTIC};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Reads the three catalog files under `<assets_dir>/content/`.
pub fn load_content(assets_dir: &Path) -> anyhow::Result<Content> {
    let base = assets_dir.join(CONTENT_DIR);
    if !base.is_dir() {
        bail!("missing {}", base.display());
    }
    let abilities: Vec<AbilityData> = load_json(base.join(ABILITIES_FILE))?;
    let consumables: Vec<ConsumableDef> = load_json(base.join(CONSUMABLES_FILE))?;
    let materials: Vec<MaterialDef> = load_json(base.join(MATERIALS_FILE))?;
    debug!(
        abilities = abilities.len(),
        consumables = consumables.len(),
        materials = materials.len(),
        "content loaded"
    );
    Ok(Content {
        abilities,
        consumables,
        materials,
    })
}

/// A whole catalog in one file, shaped like `Content`.
pub fn load_content_pack(path: &Path) -> anyhow::Result<Content> {
    load_json(path)
}

pub fn load_engine_config(path: &Path) -> anyhow::Result<EngineConfig> {
    load_json(path)
}

/// Content plus `engine.json`; a missing config file means the default configuration.
pub fn load_assets(assets_dir: &Path) -> anyhow::Result<Assets> {
    let content = load_content(assets_dir)?;
    let config_path = assets_dir.join(ENGINE_CONFIG_FILE);
    let config = if config_path.exists() {
        load_engine_config(&config_path)?
    } else {
        debug!(path = %config_path.display(), "no engine config, using defaults");
        EngineConfig::default()
    };
    Ok(Assets { config, content })
}

/// Catalog problems that do not stop the engine from running: entries with no behavior behind them,
/// repeated ids and a missing base material.
pub fn validate_content(content: &Content, registry: &AbilityRegistry) -> Vec<String> {
    let mut issues = Vec::new();
    duplicate_ids(
        "ability",
        content.abilities.iter().map(|item| item.id.as_str()),
        &mut issues,
    );
    duplicate_ids(
        "consumable",
        content.consumables.iter().map(|item| item.id.as_str()),
        &mut issues,
    );
    duplicate_ids(
        "material",
        content.materials.iter().map(|item| item.id.as_str()),
        &mut issues,
    );
    for ability in &content.abilities {
        if !registry.contains(&ability.id) {
            issues.push(format!("ability {} has no registered behavior", ability.id));
        }
    }
    for consumable in &content.consumables {
        if ConsumableEffect::from_id(&consumable.id).is_none() {
            issues.push(format!("consumable {} has no resolver", consumable.id));
        }
    }
    if !content.materials.iter().any(|material| material.id == PLASTIC) {
        issues.push(format!("base material {PLASTIC} is missing"));
    }
    for issue in &issues {
        warn!(%issue, "content");
    }
    issues
}

/// Ids the configuration points at that the catalog or registry does not know.
pub fn validate_engine_config(
    config: &EngineConfig,
    content: &Content,
    registry: &AbilityRegistry,
) -> Vec<String> {
    let mut issues = Vec::new();
    let abilities = [
        &config.blank_empowering_ability,
        &config.retrigger_empowering_ability,
        &config.probability_doubling_ability,
    ];
    for id in abilities {
        if !registry.contains(id) {
            issues.push(format!("config names unregistered ability {id}"));
        }
    }
    if !content
        .materials
        .iter()
        .any(|material| material.id == config.retrigger_material)
    {
        issues.push(format!(
            "retrigger material {} is not in the catalog",
            config.retrigger_material
        ));
    }
    let probabilities = [
        ("consumable_pip_chance", config.consumable_pip_chance),
        ("enchant_chance", config.enchant_chance),
    ];
    for (name, value) in probabilities {
        if !(0.0..=1.0).contains(&value) {
            issues.push(format!("{name} {value} is outside 0..=1"));
        }
    }
    if config.lucky_token_weights.iter().all(|weight| *weight <= 0.0) {
        issues.push("lucky token weights are all zero".to_string());
    }
    for issue in &issues {
        warn!(%issue, "engine config");
    }
    issues
}

/// Restores a session's abilities in acquisition order. Unknown ids are skipped.
pub fn build_manager(registry: &AbilityRegistry, records: &[AbilityData]) -> AbilityManager {
    let manager = AbilityManager::from_records(registry, records);
    if manager.len() != records.len() {
        warn!(
            restored = manager.len(),
            records = records.len(),
            "some abilities could not be restored"
        );
    }
    manager
}

fn duplicate_ids<'a>(
    label: &str,
    ids: impl Iterator<Item = &'a str>,
    issues: &mut Vec<String>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            issues.push(format!("duplicate {label} id {id}"));
        }
    }
}

fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}
