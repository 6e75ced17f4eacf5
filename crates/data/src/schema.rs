pub use rollio_core::{
    AbilityData, AbilityRarity, ConsumableDef, ConsumableKind, Content, EngineConfig,
    LuckyTokenOutcome, MaterialDef,
};

pub const CONTENT_DIR: &str = "content";
pub const ABILITIES_FILE: &str = "abilities.json";
pub const CONSUMABLES_FILE: &str = "consumables.json";
pub const MATERIALS_FILE: &str = "materials.json";
pub const ENGINE_CONFIG_FILE: &str = "engine.json";

/// Everything a host needs to build a `ScoringEngine`.
#[derive(Debug, Clone, Default)]
pub struct Assets {
    pub config: EngineConfig,
    pub content: Content,
}
