//! Graphic Catalog - Descriptor Templates per Graphic Type
//!
//! Built-in MIL-STD-2525C descriptors, extendable from JSON catalog files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::codec::SymbolCode;
use crate::modifiers::ModifierKey;
use crate::registry::{ClassificationAxis, Scheme};
use crate::ENGINE_VERSION;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("Failed to parse catalog {path}: {source}")]
    Parse { path: String, source: serde_json::Error },

    #[error("Catalog {catalog} requires engine >= {required}, current is {current}")]
    EngineVersionMismatch { catalog: String, required: String, current: String },

    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    #[error("Invalid descriptor {id}: {reason}")]
    InvalidDescriptor { id: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphicKind {
    Point,
    Line,
    Area,
}

/// How many control points a graphic type takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "count", rename_all = "camelCase")]
pub enum ControlPoints {
    Exactly(usize),
    AtLeast(usize),
}

impl ControlPoints {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            ControlPoints::Exactly(n) => count == n,
            ControlPoints::AtLeast(n) => count >= n,
        }
    }

    pub fn minimum(&self) -> usize {
        match *self {
            ControlPoints::Exactly(n) | ControlPoints::AtLeast(n) => n,
        }
    }
}

impl fmt::Display for ControlPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlPoints::Exactly(n) => write!(f, "exactly {}", n),
            ControlPoints::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphicDescriptor {
    pub id: String,
    pub name: String,
    pub scheme: Scheme,
    /// Position-3 token (category or battle dimension); `None` matches any.
    #[serde(default)]
    pub dimension: Option<String>,
    pub function_id: String,
    pub kind: GraphicKind,
    pub control_points: ControlPoints,
    #[serde(default)]
    pub modifiers: Vec<ModifierKey>,
}

impl GraphicDescriptor {
    /// Whether a decoded code names this graphic type.
    pub fn matches(&self, code: &SymbolCode) -> bool {
        code.scheme() == Some(self.scheme)
            && code.get(ClassificationAxis::FunctionId) == Some(self.function_id.as_str())
            && self.dimension.as_deref().map_or(true, |d| dimension_of(code) == Some(d))
    }

    /// Recognized modifier keys, restricted to those the scheme can carry.
    pub fn recognizes(&self, key: ModifierKey) -> bool {
        self.modifiers.contains(&key) && key.applies_to(self.scheme)
    }

    fn check(&self) -> Result<(), CatalogError> {
        let invalid = |reason: &str| CatalogError::InvalidDescriptor {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if !crate::registry::is_legal(ClassificationAxis::FunctionId, &self.function_id, self.scheme) {
            return Err(invalid("function id must be six characters of A-Z, 0-9 or '-'"));
        }
        match (self.kind, self.control_points) {
            (GraphicKind::Point, ControlPoints::Exactly(1)) => Ok(()),
            (GraphicKind::Point, _) => Err(invalid("point graphics take exactly one control point")),
            (_, rule) if rule.minimum() < 2 => {
                Err(invalid("line and area graphics take at least two control points"))
            }
            _ => Ok(()),
        }
    }
}

pub(crate) fn dimension_of(code: &SymbolCode) -> Option<&str> {
    code.get(ClassificationAxis::Category)
        .or_else(|| code.get(ClassificationAxis::BattleDimension))
}

fn lookup_key(scheme: Scheme, dimension: Option<&str>, function_id: &str) -> String {
    format!("{}:{}:{}", scheme.token(), dimension.unwrap_or("*"), function_id)
}

fn index_key(descriptor: &GraphicDescriptor) -> String {
    lookup_key(descriptor.scheme, descriptor.dimension.as_deref(), &descriptor.function_id)
}

/// On-disk catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFile {
    pub catalog_version: String,
    pub engine_min_version: String,
    #[serde(default)]
    pub descriptors: Vec<GraphicDescriptor>,
}

/// Descriptor registry - built-ins plus loaded catalogs
#[derive(Debug, Clone, Default)]
pub struct GraphicCatalog {
    descriptors: HashMap<String, GraphicDescriptor>,
    index: HashMap<String, String>,
}

impl GraphicCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for descriptor in builtin_descriptors() {
            catalog.insert(descriptor);
        }
        catalog
    }

    /// Built-ins, then every `*.json` catalog in `dir`. A missing directory is not an error.
    pub fn load_from_dir(dir: &Path) -> Result<Self, CatalogError> {
        let mut catalog = Self::builtin();
        if !dir.exists() {
            return Ok(catalog);
        }

        let io_err = |source| CatalogError::Io { path: dir.display().to_string(), source };
        let mut paths = vec![];
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().map_or(false, |e| e == "json") {
                paths.push(path);
            }
        }
        // later files override earlier ones
        paths.sort();

        for path in paths {
            let content = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let count = catalog.load_json(&path.display().to_string(), &content)?;
            debug!(path = %path.display(), descriptors = count, "loaded graphic catalog");
        }
        Ok(catalog)
    }

    /// Parse and register one catalog document. Returns the number of descriptors added.
    pub fn load_json(&mut self, name: &str, content: &str) -> Result<usize, CatalogError> {
        let file: CatalogFile = serde_json::from_str(content)
            .map_err(|source| CatalogError::Parse { path: name.to_string(), source })?;
        check_engine_version(name, &file.engine_min_version)?;

        for descriptor in &file.descriptors {
            descriptor.check()?;
        }
        let count = file.descriptors.len();
        for descriptor in file.descriptors {
            self.insert(descriptor);
        }
        Ok(count)
    }

    /// Adds or replaces a descriptor. A descriptor already registered for the
    /// same graphic type is dropped.
    pub fn register(&mut self, descriptor: GraphicDescriptor) -> Result<(), CatalogError> {
        descriptor.check()?;
        self.insert(descriptor);
        Ok(())
    }

    fn insert(&mut self, descriptor: GraphicDescriptor) {
        if let Some(previous) = self.descriptors.remove(&descriptor.id) {
            self.index.remove(&index_key(&previous));
        }
        if let Some(displaced) = self.index.insert(index_key(&descriptor), descriptor.id.clone()) {
            self.descriptors.remove(&displaced);
        }
        self.descriptors.insert(descriptor.id.clone(), descriptor);
    }

    pub fn get(&self, id: &str) -> Option<&GraphicDescriptor> {
        self.descriptors.get(id)
    }

    /// Descriptor for a decoded code: exact position-3 match first, then wildcard.
    pub fn lookup(&self, code: &SymbolCode) -> Option<&GraphicDescriptor> {
        let scheme = code.scheme()?;
        let function_id = code.get(ClassificationAxis::FunctionId)?;
        let exact = lookup_key(scheme, dimension_of(code), function_id);
        let wildcard = lookup_key(scheme, None, function_id);

        [exact, wildcard]
            .iter()
            .filter_map(|key| self.index.get(key))
            .filter_map(|id| self.descriptors.get(id))
            .find(|d| d.matches(code))
    }

    /// All descriptors, sorted by id.
    pub fn list(&self) -> Vec<&GraphicDescriptor> {
        let mut list: Vec<_> = self.descriptors.values().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

fn check_engine_version(catalog: &str, required: &str) -> Result<(), CatalogError> {
    let engine = semver::Version::parse(ENGINE_VERSION)
        .map_err(|_| CatalogError::InvalidVersion(ENGINE_VERSION.to_string()))?;
    let min = semver::Version::parse(required)
        .map_err(|_| CatalogError::InvalidVersion(required.to_string()))?;

    if engine < min {
        return Err(CatalogError::EngineVersionMismatch {
            catalog: catalog.to_string(),
            required: required.to_string(),
            current: ENGINE_VERSION.to_string(),
        });
    }
    Ok(())
}

// --- Built-in descriptors ---

const UNIT_MODIFIERS: &[ModifierKey] = &[
    ModifierKey::FeintDummy,
    ModifierKey::Headquarters,
    ModifierKey::TaskForce,
    ModifierKey::Echelon,
    ModifierKey::Installation,
    ModifierKey::Mobility,
    ModifierKey::AuxiliaryEquipment,
    ModifierKey::Text,
    ModifierKey::AdditionalInformation,
    ModifierKey::Quantity,
    ModifierKey::Type,
    ModifierKey::DirectionOfMovement,
    ModifierKey::DateTime,
    ModifierKey::Altitude,
];

const LINE_MODIFIERS: &[ModifierKey] =
    &[ModifierKey::Text, ModifierKey::HostileEnemy, ModifierKey::DateTime];

const AREA_MODIFIERS: &[ModifierKey] = &[
    ModifierKey::Text,
    ModifierKey::AdditionalInformation,
    ModifierKey::HostileEnemy,
    ModifierKey::DateTime,
];

const POINT_MODIFIERS: &[ModifierKey] = &[
    ModifierKey::Text,
    ModifierKey::AdditionalInformation,
    ModifierKey::Altitude,
    ModifierKey::DateTime,
];

fn descriptor(
    id: &str,
    name: &str,
    dimension: Option<&str>,
    kind: GraphicKind,
    control_points: ControlPoints,
    modifiers: &[ModifierKey],
) -> GraphicDescriptor {
    // id is the code mask: scheme, '*', dimension, '*', function id
    let scheme = id.get(0..1).and_then(Scheme::from_token).unwrap_or(Scheme::TacticalGraphics);
    let function_id = id.get(4..10).unwrap_or_default();
    GraphicDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        scheme,
        dimension: dimension.map(str::to_string),
        function_id: function_id.to_string(),
        kind,
        control_points,
        modifiers: modifiers.to_vec(),
    }
}

fn builtin_descriptors() -> Vec<GraphicDescriptor> {
    use ControlPoints::{AtLeast, Exactly};
    use GraphicKind::{Area, Line, Point};

    vec![
        // Tactical graphics: command and control, general maneuver
        descriptor("G*G*GLP---", "Phase Line", Some("G"), Line, AtLeast(2), LINE_MODIFIERS),
        descriptor("G*G*GLB---", "Boundary", Some("G"), Line, AtLeast(2), LINE_MODIFIERS),
        descriptor("G*G*GLF---", "Forward Line of Own Troops", Some("G"), Line, AtLeast(2), &[ModifierKey::HostileEnemy]),
        descriptor("G*G*GLC---", "Line of Contact", Some("G"), Line, AtLeast(2), &[ModifierKey::HostileEnemy]),
        descriptor("G*G*GAG---", "General Area", Some("G"), Area, AtLeast(3), AREA_MODIFIERS),
        descriptor("G*G*GAA---", "Assembly Area", Some("G"), Area, AtLeast(3), AREA_MODIFIERS),
        descriptor("G*G*GPRI--", "Point of Interest", Some("G"), Point, Exactly(1), POINT_MODIFIERS),
        descriptor("G*G*APP---", "Air Control Point", Some("G"), Point, Exactly(1), POINT_MODIFIERS),
        descriptor("G*G*APD---", "Down Aircrew Pickup Point", Some("G"), Point, Exactly(1), POINT_MODIFIERS),
        descriptor("G*G*ALC---", "Air Corridor", Some("G"), Line, AtLeast(2), POINT_MODIFIERS),
        descriptor("G*G*SLA---", "Ambush", Some("G"), Line, Exactly(3), &[]),
        // Mobility/survivability
        descriptor("G*M*OGL---", "Obstacle Line", Some("M"), Line, AtLeast(2), LINE_MODIFIERS),
        descriptor("G*M*NZ----", "Nuclear Detonation Ground Zero", Some("M"), Point, Exactly(1), POINT_MODIFIERS),
        // Fire support
        descriptor("G*F*PTS---", "Point Target", Some("F"), Point, Exactly(1), POINT_MODIFIERS),
        descriptor("G*F*LT----", "Linear Target", Some("F"), Line, AtLeast(2), LINE_MODIFIERS),
        descriptor("G*F*AT----", "Area Target", Some("F"), Area, AtLeast(3), AREA_MODIFIERS),
        // Combat service support
        descriptor("G*S*PX----", "Ambulance Exchange Point", Some("S"), Point, Exactly(1), POINT_MODIFIERS),
        // Warfighting units and equipment
        descriptor("S*G*UCI---", "Infantry", Some("G"), Point, Exactly(1), UNIT_MODIFIERS),
        descriptor("S*G*UCA---", "Armour", Some("G"), Point, Exactly(1), UNIT_MODIFIERS),
        descriptor("S*G*UCF---", "Field Artillery", Some("G"), Point, Exactly(1), UNIT_MODIFIERS),
        descriptor("S*G*EVAT--", "Tank", Some("G"), Point, Exactly(1), UNIT_MODIFIERS),
        descriptor("S*G*IR----", "Raw Material Production/Storage", Some("G"), Point, Exactly(1), UNIT_MODIFIERS),
        descriptor("S*A*MF----", "Military Fixed Wing", Some("A"), Point, Exactly(1), UNIT_MODIFIERS),
        descriptor("S*U*S-----", "Submarine", Some("U"), Point, Exactly(1), UNIT_MODIFIERS),
        // Other schemes
        descriptor("O*V*A-----", "Arson/Fire", Some("V"), Point, Exactly(1), UNIT_MODIFIERS),
        descriptor("E*I*A-----", "Aviation Incident", Some("I"), Point, Exactly(1), UNIT_MODIFIERS),
        descriptor("W***PL----", "Low Pressure Center", None, Point, Exactly(1), &[ModifierKey::Text]),
    ]
}
