use super::{register_builtins, Ability, AbilityData, AbilityState};
use crate::EngineError;
use std::collections::HashMap;
use tracing::warn;

pub type AbilityConstructor = fn(AbilityState) -> Box<dyn Ability>;

/// Maps content ids to behavior. Built once at startup and passed by reference to whatever
/// needs to instantiate abilities.
#[derive(Debug, Default)]
pub struct AbilityRegistry {
    constructors: HashMap<String, AbilityConstructor>,
}

impl AbilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        if let Err(err) = register_builtins(&mut registry) {
            warn!(%err, "builtin ability registration");
        }
        registry
    }

    pub fn register(
        &mut self,
        id: impl Into<String>,
        constructor: AbilityConstructor,
    ) -> Result<(), EngineError> {
        let id = id.into();
        if self.constructors.contains_key(&id) {
            return Err(EngineError::DuplicateAbility(id));
        }
        self.constructors.insert(id, constructor);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.constructors.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Unknown ids are logged and yield `None`; persisted data may name retired content.
    pub fn create(&self, data: &AbilityData) -> Option<Box<dyn Ability>> {
        match self.constructors.get(&data.id) {
            Some(constructor) => Some(constructor(AbilityState::from_data(data))),
            None => {
                warn!(id = %data.id, "no ability registered for id");
                None
            }
        }
    }
}
