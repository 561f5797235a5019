//! Keyboard-modifier decoding for input bindings.
//!
//! Modifier masks arrive from the embedding application as packed bits.
//! Which bit means which modifier is configuration, not a hardcoded
//! mapping: embedders install their own table when their toolkit packs the
//! mask differently. The shipped default assigns bits 1/2/4/8 to
//! Shift/Control/Alt/Meta and tests each bit with a plain bitwise AND.

/// One keyboard modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyModifier {
    Shift,
    Control,
    Alt,
    Meta,
}

impl KeyModifier {
    pub fn label(&self) -> &'static str {
        match self {
            KeyModifier::Shift => "Shift",
            KeyModifier::Control => "Control",
            KeyModifier::Alt => "Alt",
            KeyModifier::Meta => "Meta",
        }
    }
}

/// One bit of a packed modifier mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct ModifierBit {
    pub bit: u32,
    pub modifier: KeyModifier,
}

/// Explicit bit-to-modifier mapping supplied by the embedding application.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ModifierTable {
    entries: Vec<ModifierBit>,
}

impl Default for ModifierTable {
    fn default() -> Self {
        Self {
            entries: vec![
                ModifierBit {
                    bit: 1,
                    modifier: KeyModifier::Shift,
                },
                ModifierBit {
                    bit: 2,
                    modifier: KeyModifier::Control,
                },
                ModifierBit {
                    bit: 4,
                    modifier: KeyModifier::Alt,
                },
                ModifierBit {
                    bit: 8,
                    modifier: KeyModifier::Meta,
                },
            ],
        }
    }
}

impl ModifierTable {
    pub fn new(entries: Vec<ModifierBit>) -> Self {
        Self { entries }
    }

    /// Decodes a packed mask into the modifiers whose bits are set, in
    /// table order.
    pub fn decode(&self, mask: u32) -> Vec<KeyModifier> {
        self.entries
            .iter()
            .filter(|entry| mask & entry.bit != 0)
            .map(|entry| entry.modifier)
            .collect()
    }

    /// Human-readable chord text for a packed mask, e.g. `Shift+Control`.
    /// `None` text for an empty mask.
    pub fn chord_text(&self, mask: u32) -> String {
        let modifiers = self.decode(mask);
        if modifiers.is_empty() {
            return "None".to_string();
        }
        modifiers
            .iter()
            .map(|modifier| modifier.label())
            .collect::<Vec<_>>()
            .join("+")
    }
}
