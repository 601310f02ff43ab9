//! Modifier Keys and State
//!
//! A closed set of recognized keys. Strings that name no key parse to `None`
//! and callers drop them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::codec::is_applicable;
use crate::registry::{ClassificationAxis, Scheme};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModifierKey {
    FeintDummy,
    Headquarters,
    TaskForce,
    Echelon,
    Installation,
    Mobility,
    AuxiliaryEquipment,
    /// Unique designation (field T).
    Text,
    AdditionalInformation,
    DateTime,
    Altitude,
    Quantity,
    HostileEnemy,
    Type,
    DirectionOfMovement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierKind {
    Flag,
    Token,
    Text,
}

impl ModifierKey {
    pub const ALL: [ModifierKey; 15] = [
        ModifierKey::FeintDummy,
        ModifierKey::Headquarters,
        ModifierKey::TaskForce,
        ModifierKey::Echelon,
        ModifierKey::Installation,
        ModifierKey::Mobility,
        ModifierKey::AuxiliaryEquipment,
        ModifierKey::Text,
        ModifierKey::AdditionalInformation,
        ModifierKey::DateTime,
        ModifierKey::Altitude,
        ModifierKey::Quantity,
        ModifierKey::HostileEnemy,
        ModifierKey::Type,
        ModifierKey::DirectionOfMovement,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModifierKey::FeintDummy => "FeintDummy",
            ModifierKey::Headquarters => "Headquarters",
            ModifierKey::TaskForce => "TaskForce",
            ModifierKey::Echelon => "Echelon",
            ModifierKey::Installation => "Installation",
            ModifierKey::Mobility => "Mobility",
            ModifierKey::AuxiliaryEquipment => "AuxiliaryEquipment",
            ModifierKey::Text => "Text",
            ModifierKey::AdditionalInformation => "AdditionalInformation",
            ModifierKey::DateTime => "DateTime",
            ModifierKey::Altitude => "Altitude",
            ModifierKey::Quantity => "Quantity",
            ModifierKey::HostileEnemy => "HostileEnemy",
            ModifierKey::Type => "Type",
            ModifierKey::DirectionOfMovement => "DirectionOfMovement",
        }
    }

    /// MIL-STD-2525C modifier field letter, where one exists.
    pub fn field_id(self) -> Option<&'static str> {
        match self {
            ModifierKey::Echelon => Some("B"),
            ModifierKey::Quantity => Some("C"),
            ModifierKey::AdditionalInformation => Some("H"),
            ModifierKey::HostileEnemy => Some("N"),
            ModifierKey::DirectionOfMovement => Some("Q"),
            ModifierKey::Text => Some("T"),
            ModifierKey::Type => Some("V"),
            ModifierKey::DateTime => Some("W"),
            ModifierKey::Altitude => Some("X"),
            _ => None,
        }
    }

    /// Key name (case-insensitive) or field letter.
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| {
            k.as_str().eq_ignore_ascii_case(key) || k.field_id().is_some_and(|id| id == key)
        })
    }

    pub fn kind(self) -> ModifierKind {
        match self {
            ModifierKey::FeintDummy | ModifierKey::Headquarters | ModifierKey::TaskForce => {
                ModifierKind::Flag
            }
            ModifierKey::Echelon
            | ModifierKey::Installation
            | ModifierKey::Mobility
            | ModifierKey::AuxiliaryEquipment => ModifierKind::Token,
            _ => ModifierKind::Text,
        }
    }

    /// Code axis that stores this modifier, if it lives in the identifier.
    pub fn axis(self) -> Option<ClassificationAxis> {
        match self {
            ModifierKey::FeintDummy | ModifierKey::Headquarters | ModifierKey::TaskForce => {
                Some(ClassificationAxis::UnitEquipment)
            }
            ModifierKey::Echelon => Some(ClassificationAxis::Echelon),
            ModifierKey::Installation => Some(ClassificationAxis::Installation),
            ModifierKey::Mobility => Some(ClassificationAxis::Mobility),
            ModifierKey::AuxiliaryEquipment => Some(ClassificationAxis::AuxiliaryEquipment),
            _ => None,
        }
    }

    /// Code-backed modifiers exist only in schemes that place their axis.
    pub fn applies_to(self, scheme: Scheme) -> bool {
        match self.axis() {
            Some(axis) => is_applicable(axis, scheme),
            None => true,
        }
    }
}

impl fmt::Display for ModifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ModifierValue {
    Flag(bool),
    Token(String),
    Text(String),
}

impl ModifierValue {
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ModifierValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ModifierValue::Token(s) | ModifierValue::Text(s) => Some(s),
            ModifierValue::Flag(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierEntry {
    pub value: Option<ModifierValue>,
    pub visible: bool,
}

impl Default for ModifierEntry {
    fn default() -> Self {
        Self { value: None, visible: true }
    }
}

/// Per-key value and visibility. Keys never set are visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierState {
    entries: BTreeMap<ModifierKey, ModifierEntry>,
}

impl ModifierState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self, key: ModifierKey) -> bool {
        self.entries.get(&key).map_or(true, |e| e.visible)
    }

    pub fn set_visible(&mut self, key: ModifierKey, visible: bool) {
        self.entries.entry(key).or_default().visible = visible;
    }

    pub fn value(&self, key: ModifierKey) -> Option<&ModifierValue> {
        self.entries.get(&key).and_then(|e| e.value.as_ref())
    }

    pub fn set_value(&mut self, key: ModifierKey, value: ModifierValue) {
        self.entries.entry(key).or_default().value = Some(value);
    }

    /// Drops the value, keeps the visibility flag.
    pub fn clear_value(&mut self, key: ModifierKey) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = None;
        }
    }

    /// Drops keys outside `keep`.
    pub fn retain(&mut self, keep: impl Fn(ModifierKey) -> bool) {
        self.entries.retain(|key, _| keep(*key));
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModifierKey, &ModifierEntry)> {
        self.entries.iter().map(|(k, e)| (*k, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_and_field_letters() {
        assert_eq!(ModifierKey::parse("Text"), Some(ModifierKey::Text));
        assert_eq!(ModifierKey::parse("text"), Some(ModifierKey::Text));
        assert_eq!(ModifierKey::parse("T"), Some(ModifierKey::Text));
        assert_eq!(ModifierKey::parse("headquarters"), Some(ModifierKey::Headquarters));
        assert_eq!(ModifierKey::parse("NotARealKey"), None);
    }

    #[test]
    fn test_code_backed_keys_follow_scheme() {
        assert!(ModifierKey::Headquarters.applies_to(Scheme::Warfighting));
        assert!(ModifierKey::Headquarters.applies_to(Scheme::StabilityOperations));
        assert!(!ModifierKey::Headquarters.applies_to(Scheme::TacticalGraphics));
        assert!(!ModifierKey::Echelon.applies_to(Scheme::TacticalGraphics));
        assert!(ModifierKey::Mobility.applies_to(Scheme::EmergencyManagement));
        assert!(ModifierKey::Text.applies_to(Scheme::Metoc));
    }

    #[test]
    fn test_default_visibility() {
        let mut state = ModifierState::new();
        assert!(state.is_visible(ModifierKey::Text));
        state.set_visible(ModifierKey::Text, false);
        assert!(!state.is_visible(ModifierKey::Text));
        assert!(state.is_visible(ModifierKey::DateTime));
    }

    #[test]
    fn test_clear_value_keeps_visibility() {
        let mut state = ModifierState::new();
        state.set_value(ModifierKey::Echelon, ModifierValue::Token("D".into()));
        state.set_visible(ModifierKey::Echelon, false);
        state.clear_value(ModifierKey::Echelon);
        assert!(state.value(ModifierKey::Echelon).is_none());
        assert!(!state.is_visible(ModifierKey::Echelon));
    }
}
