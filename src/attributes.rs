//! Symbol Attribute Model
//!
//! Mutable state of one placed graphic: identifier, control points, modifier
//! state, display attributes. Every mutation is all-or-nothing.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::GraphicDescriptor;
use crate::codec::{decode, encode, SymbolCode};
use crate::graphic::GraphicError;
use crate::modifiers::{ModifierKey, ModifierKind, ModifierState, ModifierValue};
use crate::registry::{
    compose, decompose, ClassificationAxis, UnitEquipmentFlags, INSTALLATION_FEINT_DUMMY,
    INSTALLATION_NORMAL,
};

/// Geographic control point. Opaque to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: f64,
}

impl Position {
    pub fn from_degrees(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self { latitude, longitude, altitude }
    }

    /// Component-wise sum; `delta` is in degrees and metres.
    pub fn offset(&self, delta: &Position) -> Self {
        Self {
            latitude: self.latitude + delta.latitude,
            longitude: self.longitude + delta.longitude,
            altitude: self.altitude + delta.altitude,
        }
    }

    /// Component-wise difference `self - origin`.
    pub fn delta_from(&self, origin: &Position) -> Self {
        Self {
            latitude: self.latitude - origin.latitude,
            longitude: self.longitude - origin.longitude,
            altitude: self.altitude - origin.altitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayAttributes {
    pub show_fill: bool,
    pub show_frame: bool,
    pub show_icon: bool,
}

impl Default for DisplayAttributes {
    fn default() -> Self {
        Self { show_fill: true, show_frame: true, show_icon: true }
    }
}

/// Per-graphic rendering attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphicStyle {
    pub scale: f64,
    pub outline_width: f64,
    pub outline_opacity: f64,
    pub interior_opacity: f64,
    /// `None` draws text in the standard identity color.
    pub text_color: Option<String>,
}

impl Default for GraphicStyle {
    fn default() -> Self {
        Self {
            scale: 1.0,
            outline_width: 1.0,
            outline_opacity: 1.0,
            interior_opacity: 0.5,
            text_color: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SymbolAttributes {
    identifier: String,
    code: SymbolCode,
    descriptor: GraphicDescriptor,
    positions: Vec<Position>,
    modifiers: ModifierState,
    display: DisplayAttributes,
    style: Option<GraphicStyle>,
    visible: bool,
}

impl SymbolAttributes {
    /// Decodes `identifier`, which must name `descriptor`, and validates the
    /// control point count. Modifier values start from the code.
    pub fn new(
        identifier: &str,
        descriptor: GraphicDescriptor,
        positions: Vec<Position>,
    ) -> Result<Self, GraphicError> {
        let code = decode(identifier)?;
        if !descriptor.matches(&code) {
            return Err(GraphicError::GraphicTypeChanged {
                descriptor: descriptor.id.clone(),
                code: identifier.to_string(),
            });
        }
        check_count(&descriptor, positions.len())?;
        let mut attributes = Self {
            identifier: identifier.to_ascii_uppercase(),
            code,
            descriptor,
            positions,
            modifiers: ModifierState::new(),
            display: DisplayAttributes::default(),
            style: None,
            visible: true,
        };
        attributes.refresh_code_modifiers();
        Ok(attributes)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn symbol_code(&self) -> &SymbolCode {
        &self.code
    }

    pub fn descriptor(&self) -> &GraphicDescriptor {
        &self.descriptor
    }

    /// Re-decodes `code`. The graphic type must not change.
    pub fn set_identifier(&mut self, code: &str) -> Result<(), GraphicError> {
        let decoded = decode(code)?;
        if !self.descriptor.matches(&decoded) {
            return Err(GraphicError::GraphicTypeChanged {
                descriptor: self.descriptor.id.clone(),
                code: code.to_string(),
            });
        }
        self.identifier = code.to_ascii_uppercase();
        self.code = decoded;
        self.refresh_code_modifiers();
        Ok(())
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn set_positions(&mut self, positions: Vec<Position>) -> Result<(), GraphicError> {
        check_count(&self.descriptor, positions.len())?;
        self.positions = positions;
        Ok(())
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn display_attributes(&self) -> DisplayAttributes {
        self.display
    }

    pub fn set_display_attributes(&mut self, display: DisplayAttributes) {
        self.display = display;
    }

    /// The override if one is set, otherwise the default style.
    pub fn style(&self) -> GraphicStyle {
        self.style.clone().unwrap_or_default()
    }

    pub fn style_override(&self) -> Option<&GraphicStyle> {
        self.style.as_ref()
    }

    /// `None` restores the default style.
    pub fn set_style(&mut self, style: Option<GraphicStyle>) {
        self.style = style;
    }

    pub fn modifiers(&self) -> &ModifierState {
        &self.modifiers
    }

    fn recognized(&self, key: &str) -> Option<ModifierKey> {
        ModifierKey::parse(key).filter(|k| self.descriptor.recognizes(*k))
    }

    /// False for keys this graphic does not recognize.
    pub fn is_modifier_visible(&self, key: &str) -> bool {
        self.recognized(key).map_or(false, |k| self.modifiers.is_visible(k))
    }

    /// No effect for keys this graphic does not recognize.
    pub fn set_modifier_visible(&mut self, key: &str, visible: bool) {
        match self.recognized(key) {
            Some(k) => self.modifiers.set_visible(k, visible),
            None => debug!(key, "ignoring visibility for unrecognized modifier"),
        }
    }

    pub fn modifier(&self, key: &str) -> Option<&ModifierValue> {
        self.recognized(key).and_then(|k| self.modifiers.value(k))
    }

    /// Sets a modifier value. Unknown keys and mismatched value types are
    /// ignored. A code-backed value that would make the identifier invalid is
    /// an error and leaves the attributes unchanged.
    pub fn set_modifier(&mut self, key: &str, value: ModifierValue) -> Result<(), GraphicError> {
        let Some(k) = self.recognized(key) else {
            debug!(key, "ignoring unrecognized modifier");
            return Ok(());
        };

        match (k.kind(), value) {
            (ModifierKind::Text, ModifierValue::Text(text)) => {
                self.modifiers.set_value(k, ModifierValue::Text(text));
                Ok(())
            }
            (ModifierKind::Flag, ModifierValue::Flag(flag)) => self.apply_flag(k, flag),
            (ModifierKind::Token, ModifierValue::Token(token) | ModifierValue::Text(token)) => {
                self.apply_token(k, &token)
            }
            (_, value) => {
                debug!(key, ?value, "ignoring modifier value of the wrong type");
                Ok(())
            }
        }
    }

    /// Recognized modifiers with a value that would be drawn now.
    pub fn visible_modifiers(&self) -> Vec<(ModifierKey, &ModifierValue)> {
        if !self.visible {
            return vec![];
        }
        self.modifiers
            .iter()
            .filter(|(_, entry)| entry.visible)
            .filter_map(|(key, entry)| entry.value.as_ref().map(|v| (key, v)))
            .filter(|(key, value)| {
                self.descriptor.recognizes(*key) && value.as_flag() != Some(false)
            })
            .collect()
    }

    fn apply_flag(&mut self, key: ModifierKey, flag: bool) -> Result<(), GraphicError> {
        let mut candidate = self.code.clone();

        if key == ModifierKey::FeintDummy && candidate.contains(ClassificationAxis::Installation) {
            let token = if flag { INSTALLATION_FEINT_DUMMY } else { INSTALLATION_NORMAL };
            candidate.set(ClassificationAxis::Installation, token);
        } else {
            let mut flags = candidate
                .get(ClassificationAxis::UnitEquipment)
                .and_then(decompose)
                .unwrap_or_default();
            match key {
                ModifierKey::FeintDummy => flags.feint_dummy = flag,
                ModifierKey::Headquarters => flags.headquarters = flag,
                ModifierKey::TaskForce => flags.task_force = flag,
                _ => return Ok(()),
            }
            if flags.is_empty() {
                candidate.remove(ClassificationAxis::UnitEquipment);
            } else {
                candidate.set(ClassificationAxis::UnitEquipment, compose(flags)?);
            }
        }
        self.adopt(candidate)
    }

    fn apply_token(&mut self, key: ModifierKey, token: &str) -> Result<(), GraphicError> {
        let Some(axis) = key.axis() else { return Ok(()) };
        let mut candidate = self.code.clone();
        let token = token.trim().to_ascii_uppercase();
        if token.is_empty() {
            candidate.remove(axis);
        } else {
            candidate.set(axis, token);
        }
        self.adopt(candidate)
    }

    fn adopt(&mut self, candidate: SymbolCode) -> Result<(), GraphicError> {
        self.identifier = encode(&candidate)?;
        self.code = candidate;
        self.refresh_code_modifiers();
        Ok(())
    }

    /// Mirror code-backed modifiers into the modifier state.
    fn refresh_code_modifiers(&mut self) {
        let descriptor = &self.descriptor;
        self.modifiers.retain(|k| descriptor.recognizes(k));

        let installation = self.code.get(ClassificationAxis::Installation);
        let mut flags = self
            .code
            .get(ClassificationAxis::UnitEquipment)
            .and_then(decompose)
            .unwrap_or_default();
        if installation == Some(INSTALLATION_FEINT_DUMMY) {
            flags = UnitEquipmentFlags { feint_dummy: true, ..flags };
        }

        for key in ModifierKey::ALL {
            if !self.descriptor.recognizes(key) {
                continue;
            }
            match key.kind() {
                ModifierKind::Flag => {
                    let set = match key {
                        ModifierKey::FeintDummy => flags.feint_dummy,
                        ModifierKey::Headquarters => flags.headquarters,
                        _ => flags.task_force,
                    };
                    self.modifiers.set_value(key, ModifierValue::Flag(set));
                }
                ModifierKind::Token => {
                    let token = key.axis().and_then(|axis| self.code.get(axis));
                    match token {
                        Some(token) => {
                            self.modifiers.set_value(key, ModifierValue::Token(token.to_string()))
                        }
                        None => self.modifiers.clear_value(key),
                    }
                }
                ModifierKind::Text => {}
            }
        }
    }
}

fn check_count(descriptor: &GraphicDescriptor, actual: usize) -> Result<(), GraphicError> {
    if descriptor.control_points.accepts(actual) {
        Ok(())
    } else {
        Err(GraphicError::WrongControlPointCount {
            descriptor: descriptor.id.clone(),
            expected: descriptor.control_points,
            actual,
        })
    }
}
