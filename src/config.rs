//! Core configuration model and defaults.

use crate::input::ModifierTable;

/// Configuration handed to the core by the embedding application,
/// round-trippable through `config.toml`.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CoreConfig {
    /// Capacity of the broadcast bus carrying change notifications.
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
    /// Bit-to-modifier mapping for input chord decoding.
    #[serde(default)]
    pub modifiers: ModifierTable,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            bus_capacity: default_bus_capacity(),
            modifiers: ModifierTable::default(),
        }
    }
}

fn default_bus_capacity() -> usize {
    1024
}
