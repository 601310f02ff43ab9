//! Symbology Core - MIL-STD-2525C Symbol Codes and Tactical Graphics
//!
//! # Layers
//! 1. Registry: legal tokens per axis and scheme
//! 2. Codec: 15-character SIDC <-> `SymbolCode`
//! 3. Attributes: per-graphic modifier and display state
//! 4. Factory: SIDC + control points -> placed graphic

pub mod countries;
pub mod registry;
pub mod codec;
pub mod modifiers;
pub mod attributes;
pub mod catalog;
pub mod graphic;

pub use registry::{
    all_values, compose, decompose, is_legal, legal_values, ClassificationAxis, RegistryError,
    Scheme, UnitEquipmentFlags, ValueDomain,
};
pub use codec::{decode, encode, inspect, DecodeError, DecodeReport, EncodeError, FieldViolation, SymbolCode};
pub use modifiers::{ModifierKey, ModifierValue};
pub use attributes::{DisplayAttributes, GraphicStyle, Position, SymbolAttributes};
pub use catalog::{CatalogError, ControlPoints, GraphicCatalog, GraphicDescriptor, GraphicKind};
pub use graphic::{
    GraphicError, GraphicParams, MilStd2525GraphicFactory, MultiPointGraphic, ParamValue,
    PointGraphic, TacticalGraphic, TacticalGraphicFactory,
};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
