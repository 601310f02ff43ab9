//! Tactical Graphics - Factory Contract and Variants
//!
//! `create_graphic` is the single construction entry point: decode, resolve
//! the descriptor, check control points, then apply params.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::attributes::{DisplayAttributes, GraphicStyle, Position, SymbolAttributes};
use crate::catalog::{dimension_of, ControlPoints, GraphicCatalog, GraphicDescriptor, GraphicKind};
use crate::codec::{decode, DecodeError, EncodeError};
use crate::modifiers::{ModifierKey, ModifierValue};
use crate::registry::{ClassificationAxis, RegistryError, Scheme};

#[derive(Debug, Error)]
pub enum GraphicError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Unknown graphic type: {scheme} function {function_id}")]
    UnknownGraphicType { scheme: Scheme, dimension: Option<String>, function_id: String },

    #[error("Graphic {descriptor} takes {expected} control points, got {actual}")]
    WrongControlPointCount { descriptor: String, expected: ControlPoints, actual: usize },

    #[error("Code {code} does not identify a {descriptor} graphic")]
    GraphicTypeChanged { descriptor: String, code: String },
}

/// A value in the creation parameter bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Flag(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<ParamValue> for ModifierValue {
    fn from(value: ParamValue) -> Self {
        match value {
            ParamValue::Flag(b) => ModifierValue::Flag(b),
            ParamValue::Number(n) => ModifierValue::Text(n.to_string()),
            ParamValue::Text(s) => ModifierValue::Text(s),
        }
    }
}

/// Initial modifier values keyed by modifier name. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphicParams {
    values: BTreeMap<String, ParamValue>,
}

impl GraphicParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// What a render layer reads each update cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderState {
    pub identifier: String,
    pub descriptor: String,
    pub kind: GraphicKind,
    pub visible: bool,
    pub positions: Vec<Position>,
    pub display: DisplayAttributes,
    pub style: GraphicStyle,
    pub modifiers: BTreeMap<ModifierKey, ModifierValue>,
}

/// A graphic placed on the globe.
pub trait TacticalGraphic: fmt::Debug + Send {
    fn attributes(&self) -> &SymbolAttributes;
    fn attributes_mut(&mut self) -> &mut SymbolAttributes;

    fn kind(&self) -> GraphicKind {
        self.attributes().descriptor().kind
    }

    fn descriptor(&self) -> &GraphicDescriptor {
        self.attributes().descriptor()
    }

    fn identifier(&self) -> &str {
        self.attributes().identifier()
    }

    fn set_identifier(&mut self, code: &str) -> Result<(), GraphicError> {
        self.attributes_mut().set_identifier(code)
    }

    fn positions(&self) -> &[Position] {
        self.attributes().positions()
    }

    fn set_positions(&mut self, positions: Vec<Position>) -> Result<(), GraphicError> {
        self.attributes_mut().set_positions(positions)
    }

    fn is_visible(&self) -> bool {
        self.attributes().is_visible()
    }

    fn set_visible(&mut self, visible: bool) {
        self.attributes_mut().set_visible(visible)
    }

    fn is_modifier_visible(&self, key: &str) -> bool {
        self.attributes().is_modifier_visible(key)
    }

    fn set_modifier_visible(&mut self, key: &str, visible: bool) {
        self.attributes_mut().set_modifier_visible(key, visible)
    }

    fn modifier(&self, key: &str) -> Option<&ModifierValue> {
        self.attributes().modifier(key)
    }

    fn set_modifier(&mut self, key: &str, value: ModifierValue) -> Result<(), GraphicError> {
        self.attributes_mut().set_modifier(key, value)
    }

    fn text(&self) -> Option<&str> {
        self.modifier(ModifierKey::Text.as_str()).and_then(ModifierValue::as_str)
    }

    fn set_text(&mut self, text: &str) -> Result<(), GraphicError> {
        self.set_modifier(ModifierKey::Text.as_str(), ModifierValue::Text(text.to_string()))
    }

    fn display_attributes(&self) -> DisplayAttributes {
        self.attributes().display_attributes()
    }

    fn set_display_attributes(&mut self, display: DisplayAttributes) {
        self.attributes_mut().set_display_attributes(display)
    }

    fn style(&self) -> GraphicStyle {
        self.attributes().style()
    }

    /// `None` restores the default style.
    fn set_style(&mut self, style: Option<GraphicStyle>) {
        self.attributes_mut().set_style(style)
    }

    /// Position used to place labels and pick the graphic.
    fn reference_position(&self) -> Option<&Position> {
        self.positions().first()
    }

    /// Shifts every control point by `delta`.
    fn move_by(&mut self, delta: &Position) -> Result<(), GraphicError> {
        let moved = self.positions().iter().map(|p| p.offset(delta)).collect();
        self.set_positions(moved)
    }

    /// Moves the graphic so its reference position lands on `position`.
    fn move_to(&mut self, position: &Position) -> Result<(), GraphicError> {
        match self.reference_position().copied() {
            Some(reference) => self.move_by(&position.delta_from(&reference)),
            None => Ok(()),
        }
    }

    fn render_state(&self) -> RenderState {
        let attributes = self.attributes();
        RenderState {
            identifier: attributes.identifier().to_string(),
            descriptor: attributes.descriptor().id.clone(),
            kind: self.kind(),
            visible: attributes.is_visible(),
            positions: attributes.positions().to_vec(),
            display: attributes.display_attributes(),
            style: attributes.style(),
            modifiers: attributes
                .visible_modifiers()
                .into_iter()
                .map(|(k, v)| (k, v.clone()))
                .collect(),
        }
    }
}

/// Icon drawn at a single control point.
#[derive(Debug, Clone)]
pub struct PointGraphic {
    attributes: SymbolAttributes,
}

impl PointGraphic {
    pub fn new(attributes: SymbolAttributes) -> Self {
        Self { attributes }
    }

    pub fn position(&self) -> Option<&Position> {
        self.attributes.positions().first()
    }

    pub fn shows_icon(&self) -> bool {
        self.attributes.is_visible() && self.attributes.display_attributes().show_icon
    }
}

impl TacticalGraphic for PointGraphic {
    fn attributes(&self) -> &SymbolAttributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut SymbolAttributes {
        &mut self.attributes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStyle {
    /// Open polyline through the control points.
    Path,
    /// Closed, fillable region.
    Region,
}

/// Line or area positioned by an ordered sequence of control points.
#[derive(Debug, Clone)]
pub struct MultiPointGraphic {
    attributes: SymbolAttributes,
    style: PathStyle,
}

impl MultiPointGraphic {
    pub fn new(attributes: SymbolAttributes) -> Self {
        let style = match attributes.descriptor().kind {
            GraphicKind::Area => PathStyle::Region,
            _ => PathStyle::Path,
        };
        Self { attributes, style }
    }

    pub fn style(&self) -> PathStyle {
        self.style
    }

    pub fn is_closed(&self) -> bool {
        self.style == PathStyle::Region
    }

    pub fn is_filled(&self) -> bool {
        self.is_closed() && self.attributes.display_attributes().show_fill
    }
}

impl TacticalGraphic for MultiPointGraphic {
    fn attributes(&self) -> &SymbolAttributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut SymbolAttributes {
        &mut self.attributes
    }
}

pub trait TacticalGraphicFactory {
    fn create_graphic(
        &self,
        code: &str,
        positions: Vec<Position>,
        params: Option<&GraphicParams>,
    ) -> Result<Box<dyn TacticalGraphic>, GraphicError>;

    fn create_point(
        &self,
        code: &str,
        position: Position,
        params: Option<&GraphicParams>,
    ) -> Result<Box<dyn TacticalGraphic>, GraphicError> {
        self.create_graphic(code, vec![position], params)
    }
}

/// Factory for MIL-STD-2525C codes
#[derive(Debug, Clone)]
pub struct MilStd2525GraphicFactory {
    catalog: GraphicCatalog,
}

impl MilStd2525GraphicFactory {
    pub fn new(catalog: GraphicCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &GraphicCatalog {
        &self.catalog
    }
}

impl Default for MilStd2525GraphicFactory {
    fn default() -> Self {
        Self::new(GraphicCatalog::builtin())
    }
}

impl TacticalGraphicFactory for MilStd2525GraphicFactory {
    fn create_graphic(
        &self,
        code: &str,
        positions: Vec<Position>,
        params: Option<&GraphicParams>,
    ) -> Result<Box<dyn TacticalGraphic>, GraphicError> {
        let decoded = decode(code)?;

        let descriptor = self.catalog.lookup(&decoded).ok_or_else(|| {
            GraphicError::UnknownGraphicType {
                // decode always sets the scheme
                scheme: decoded.scheme().unwrap_or(Scheme::Warfighting),
                dimension: dimension_of(&decoded).map(str::to_string),
                function_id: decoded
                    .get(ClassificationAxis::FunctionId)
                    .unwrap_or("------")
                    .to_string(),
            }
        })?;

        let mut attributes = SymbolAttributes::new(code, descriptor.clone(), positions)?;
        if let Some(params) = params {
            for (key, value) in params.iter() {
                attributes.set_modifier(key, value.clone().into())?;
            }
        }

        debug!(
            code,
            descriptor = %descriptor.id,
            control_points = attributes.positions().len(),
            "created tactical graphic"
        );

        let graphic: Box<dyn TacticalGraphic> = match descriptor.kind {
            GraphicKind::Point => Box::new(PointGraphic::new(attributes)),
            GraphicKind::Line | GraphicKind::Area => Box::new(MultiPointGraphic::new(attributes)),
        };
        Ok(graphic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(n: usize) -> Vec<Position> {
        (0..n).map(|i| Position::from_degrees(34.7 + i as f64 * 0.01, -117.8, 0.0)).collect()
    }

    #[test]
    fn test_create_phase_line_with_text() {
        let factory = MilStd2525GraphicFactory::default();
        let params = GraphicParams::new().with("Text", "Alpha");
        let graphic = factory.create_graphic("GHGPGLP----AUSX", points(2), Some(&params)).unwrap();

        assert_eq!(graphic.kind(), GraphicKind::Line);
        assert_eq!(graphic.text(), Some("Alpha"));
        assert!(graphic.is_visible());
        assert!(graphic.is_modifier_visible("Text"));
    }

    #[test]
    fn test_point_graphic_rejects_two_positions() {
        let factory = MilStd2525GraphicFactory::default();
        let err = factory.create_graphic("GFGPAPD----AUSX", points(2), None).unwrap_err();
        assert!(matches!(err, GraphicError::WrongControlPointCount { actual: 2, .. }));
    }

    #[test]
    fn test_create_point() {
        let factory = MilStd2525GraphicFactory::default();
        let graphic = factory
            .create_point("GFGPAPD----AUSX", Position::from_degrees(34.9362, -118.2559, 0.0), None)
            .unwrap();
        assert_eq!(graphic.kind(), GraphicKind::Point);
        assert_eq!(graphic.reference_position().unwrap().latitude, 34.9362);
    }

    #[test]
    fn test_unknown_graphic_type() {
        let factory = MilStd2525GraphicFactory::default();
        let err = factory.create_graphic("GHGPZZZ----AUSX", points(2), None).unwrap_err();
        match err {
            GraphicError::UnknownGraphicType { scheme, function_id, .. } => {
                assert_eq!(scheme, Scheme::TacticalGraphics);
                assert_eq!(function_id, "ZZZ---");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_code_reports_every_field() {
        let factory = MilStd2525GraphicFactory::default();
        let err = factory.create_graphic("GHZQGLP----AUSX", points(2), None).unwrap_err();
        match err {
            GraphicError::Decode(decode) => assert_eq!(decode.violations().len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_params_apply_flags_and_ignore_unknown() {
        let factory = MilStd2525GraphicFactory::default();
        let params = GraphicParams::new()
            .with("Headquarters", true)
            .with("T", "1-64 AR")
            .with("Bogus", "ignored");
        let graphic = factory
            .create_point("SFGPUCA----E---", Position::from_degrees(0.0, 0.0, 0.0), Some(&params))
            .unwrap();

        assert_eq!(graphic.identifier(), "SFGPUCA---AE---");
        assert_eq!(graphic.text(), Some("1-64 AR"));
        assert!(graphic.modifier("Bogus").is_none());
    }

    #[test]
    fn test_area_is_closed_region() {
        let factory = MilStd2525GraphicFactory::default();
        let attributes = factory
            .create_graphic("GHGPGAG----AUSX", points(3), None)
            .unwrap()
            .attributes()
            .clone();
        let area = MultiPointGraphic::new(attributes);
        assert_eq!(area.style(), PathStyle::Region);
        assert!(area.is_filled());
    }

    #[test]
    fn test_render_state_hides_modifiers_when_invisible() {
        let factory = MilStd2525GraphicFactory::default();
        let params = GraphicParams::new().with("Text", "Boston");
        let mut graphic =
            factory.create_graphic("GHGPGAG----AUSX", points(4), Some(&params)).unwrap();
        assert_eq!(graphic.render_state().modifiers.len(), 1);

        graphic.set_visible(false);
        let state = graphic.render_state();
        assert!(!state.visible);
        assert!(state.modifiers.is_empty());
    }

    #[test]
    fn test_params_from_json() {
        let params: GraphicParams =
            serde_json::from_str(r#"{"Text": "Alpha", "Headquarters": true, "Altitude": 1200}"#)
                .unwrap();
        let values: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(values, vec!["Altitude", "Headquarters", "Text"]);
    }

    #[test]
    fn test_invalid_param_fails_creation() {
        let factory = MilStd2525GraphicFactory::default();
        let params = GraphicParams::new().with("Echelon", "Z");
        let err = factory
            .create_point("SFGPUCI---AD---", Position::from_degrees(0.0, 0.0, 0.0), Some(&params))
            .unwrap_err();
        assert!(matches!(err, GraphicError::Encode(EncodeError::InvalidFieldValue { .. })));

        let params = GraphicParams::new().with("Mobility", "MO");
        let err = factory
            .create_point("SFGPUCI---AD---", Position::from_degrees(0.0, 0.0, 0.0), Some(&params))
            .unwrap_err();
        assert!(matches!(err, GraphicError::Encode(EncodeError::ConflictingModifiers { .. })));
    }

    #[test]
    fn test_point_position() {
        let factory = MilStd2525GraphicFactory::default();
        let graphic = factory
            .create_point("GFGPAPD----AUSX", Position::from_degrees(1.0, 2.0, 0.0), None)
            .unwrap();
        let point = PointGraphic::new(graphic.attributes().clone());
        assert_eq!(point.position(), Some(&Position::from_degrees(1.0, 2.0, 0.0)));
        assert!(point.shows_icon());
    }

    #[test]
    fn test_move_by_shifts_every_control_point() {
        let factory = MilStd2525GraphicFactory::default();
        let start = vec![
            Position::from_degrees(10.0, 20.0, 0.0),
            Position::from_degrees(11.0, 21.0, 0.0),
        ];
        let mut graphic = factory.create_graphic("GHGPGLP----AUSX", start, None).unwrap();

        graphic.move_by(&Position::from_degrees(1.0, -2.0, 0.0)).unwrap();
        assert_eq!(
            graphic.positions(),
            &[Position::from_degrees(11.0, 18.0, 0.0), Position::from_degrees(12.0, 19.0, 0.0)]
        );
    }

    #[test]
    fn test_move_to_keeps_shape() {
        let factory = MilStd2525GraphicFactory::default();
        let start = vec![
            Position::from_degrees(10.0, 20.0, 0.0),
            Position::from_degrees(10.0, 22.0, 0.0),
            Position::from_degrees(12.0, 21.0, 0.0),
        ];
        let mut graphic = factory.create_graphic("GHGPGAG----AUSX", start, None).unwrap();

        graphic.move_to(&Position::from_degrees(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(graphic.reference_position(), Some(&Position::from_degrees(0.0, 0.0, 0.0)));
        assert_eq!(
            graphic.positions(),
            &[
                Position::from_degrees(0.0, 0.0, 0.0),
                Position::from_degrees(0.0, 2.0, 0.0),
                Position::from_degrees(2.0, 1.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_render_state_carries_style_override() {
        let factory = MilStd2525GraphicFactory::default();
        let mut graphic = factory.create_graphic("GHGPGAG----AUSX", points(3), None).unwrap();
        assert_eq!(graphic.render_state().style, GraphicStyle::default());

        let style = GraphicStyle { scale: 2.0, ..GraphicStyle::default() };
        graphic.set_style(Some(style.clone()));
        assert_eq!(graphic.render_state().style, style);

        graphic.set_style(None);
        assert_eq!(graphic.style().scale, 1.0);
    }
}
