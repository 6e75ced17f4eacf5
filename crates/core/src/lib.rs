//! Scoring and effect-resolution engine. Keep this crate free of IO and platform concerns.

pub mod ability;
pub mod breakdown;
pub mod combination;
pub mod config;
pub mod consumables;
pub mod content;
pub mod dice;
pub mod engine;
pub mod error;
pub mod events;
pub mod inventory;
pub mod pips;
pub mod rng;
pub mod scoring;
pub mod state;

pub use ability::*;
pub use breakdown::*;
pub use combination::*;
pub use config::*;
pub use consumables::*;
pub use content::*;
pub use dice::*;
pub use engine::*;
pub use error::*;
pub use events::*;
pub use inventory::*;
pub use pips::*;
pub use rng::*;
pub use scoring::*;
pub use state::*;
