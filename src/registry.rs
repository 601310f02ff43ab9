//! Code Field Registry - Legal Tokens per Axis and Scheme
//!
//! One table, built once, queried by pure functions.
//! Scheme-dependent axes carry a distinct legal subset per scheme.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::trace;

use crate::countries::ISO_3166_ALPHA2;

/// Placeholder for code positions that carry no value.
pub const FILLER: char = '-';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No unit/equipment code represents {0}")]
    AmbiguousCombination(UnitEquipmentFlags),

    #[error("Unknown {kind}: {value}")]
    UnknownName { kind: &'static str, value: String },
}

// --- Schemes ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    Warfighting,
    TacticalGraphics,
    Metoc,
    Intelligence,
    StabilityOperations,
    EmergencyManagement,
}

impl Scheme {
    pub const ALL: [Scheme; 6] = [
        Scheme::Warfighting,
        Scheme::TacticalGraphics,
        Scheme::Metoc,
        Scheme::Intelligence,
        Scheme::StabilityOperations,
        Scheme::EmergencyManagement,
    ];

    /// Token at SIDC position 1.
    pub fn token(self) -> &'static str {
        match self {
            Scheme::Warfighting => "S",
            Scheme::TacticalGraphics => "G",
            Scheme::Metoc => "W",
            Scheme::Intelligence => "I",
            Scheme::StabilityOperations => "O",
            Scheme::EmergencyManagement => "E",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.token().eq_ignore_ascii_case(token))
    }

    pub fn name(self) -> &'static str {
        match self {
            Scheme::Warfighting => "Warfighting",
            Scheme::TacticalGraphics => "Tactical Graphics",
            Scheme::Metoc => "Meteorological and Oceanographic",
            Scheme::Intelligence => "Signals Intelligence",
            Scheme::StabilityOperations => "Stability Operations",
            Scheme::EmergencyManagement => "Emergency Management",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scheme {
    type Err = RegistryError;

    /// Accepts the position-1 token or the scheme name in any case and separator style.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(scheme) = Self::from_token(s) {
            return Ok(scheme);
        }
        let wanted = normalize_name(s);
        Self::ALL
            .into_iter()
            .find(|scheme| normalize_name(&format!("{:?}", scheme)) == wanted)
            .ok_or_else(|| RegistryError::UnknownName { kind: "scheme", value: s.to_string() })
    }
}

// --- Axes ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationAxis {
    Scheme,
    StandardIdentity,
    BattleDimension,
    Category,
    Status,
    FunctionId,
    UnitEquipment,
    Echelon,
    Installation,
    Mobility,
    AuxiliaryEquipment,
    Country,
    OrderOfBattle,
}

impl ClassificationAxis {
    pub const ALL: [ClassificationAxis; 13] = [
        ClassificationAxis::Scheme,
        ClassificationAxis::StandardIdentity,
        ClassificationAxis::BattleDimension,
        ClassificationAxis::Category,
        ClassificationAxis::Status,
        ClassificationAxis::FunctionId,
        ClassificationAxis::UnitEquipment,
        ClassificationAxis::Echelon,
        ClassificationAxis::Installation,
        ClassificationAxis::Mobility,
        ClassificationAxis::AuxiliaryEquipment,
        ClassificationAxis::Country,
        ClassificationAxis::OrderOfBattle,
    ];

    /// 1-based inclusive character range within the code.
    pub fn positions(self) -> (usize, usize) {
        match self {
            ClassificationAxis::Scheme => (1, 1),
            ClassificationAxis::StandardIdentity => (2, 2),
            ClassificationAxis::BattleDimension | ClassificationAxis::Category => (3, 3),
            ClassificationAxis::Status => (4, 4),
            ClassificationAxis::FunctionId => (5, 10),
            ClassificationAxis::UnitEquipment => (11, 11),
            ClassificationAxis::Echelon => (12, 12),
            ClassificationAxis::Installation
            | ClassificationAxis::Mobility
            | ClassificationAxis::AuxiliaryEquipment => (11, 12),
            ClassificationAxis::Country => (13, 14),
            ClassificationAxis::OrderOfBattle => (15, 15),
        }
    }

    pub fn start(self) -> usize {
        self.positions().0
    }

    pub fn width(self) -> usize {
        let (start, end) = self.positions();
        end - start + 1
    }

    /// Axes that share the symbol modifier slot (positions 11-12).
    pub fn is_symbol_modifier(self) -> bool {
        matches!(
            self,
            ClassificationAxis::UnitEquipment
                | ClassificationAxis::Echelon
                | ClassificationAxis::Installation
                | ClassificationAxis::Mobility
                | ClassificationAxis::AuxiliaryEquipment
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ClassificationAxis::Scheme => "scheme",
            ClassificationAxis::StandardIdentity => "standard identity",
            ClassificationAxis::BattleDimension => "battle dimension",
            ClassificationAxis::Category => "category",
            ClassificationAxis::Status => "status",
            ClassificationAxis::FunctionId => "function id",
            ClassificationAxis::UnitEquipment => "unit/equipment modifier",
            ClassificationAxis::Echelon => "echelon",
            ClassificationAxis::Installation => "installation",
            ClassificationAxis::Mobility => "mobility",
            ClassificationAxis::AuxiliaryEquipment => "auxiliary equipment",
            ClassificationAxis::Country => "country",
            ClassificationAxis::OrderOfBattle => "order of battle",
        }
    }
}

impl fmt::Display for ClassificationAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClassificationAxis {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        Self::ALL
            .into_iter()
            .find(|axis| normalize_name(&format!("{:?}", axis)) == wanted)
            .ok_or_else(|| RegistryError::UnknownName { kind: "axis", value: s.to_string() })
    }
}

fn normalize_name(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// --- Token tables (MIL-STD-2525C) ---

pub const SCHEME_ALL: &[&str] = &["S", "G", "W", "I", "O", "E"];

pub const STANDARD_IDENTITY_ALL: &[&str] =
    &["P", "U", "A", "F", "N", "S", "H", "G", "W", "M", "D", "L", "J", "K"];

pub const BATTLE_DIMENSION_ALL: &[&str] = &["P", "A", "G", "S", "U", "F", "X", "Z"];
pub const BATTLE_DIMENSION_ALL_INTELLIGENCE: &[&str] = &["P", "A", "G", "S", "U", "X", "Z"];

pub const CATEGORY_ALL_TACTICAL_GRAPHICS: &[&str] = &["T", "G", "M", "F", "S", "O"];
pub const CATEGORY_ALL_STABILITY_OPERATIONS: &[&str] = &["V", "L", "O", "I", "P", "G", "R"];
pub const CATEGORY_ALL_EMERGENCY_MANAGEMENT: &[&str] = &["I", "N", "O", "F"];

pub const STATUS_ALL_UEI_SIGINT_SO: &[&str] = &["A", "P", "C", "D", "X", "F"];
pub const STATUS_ALL_TACTICAL_GRAPHICS_METOC: &[&str] = &["A", "S", "P", "K"];
pub const STATUS_ALL_EMERGENCY_MANAGEMENT: &[&str] = &["A", "P"];

pub const UNIT_EQUIPMENT_ALL: &[&str] = &["A", "B", "C", "D", "E", "F", "G"];

pub const ECHELON_ALL: &[&str] =
    &["A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N"];

pub const INSTALLATION_NORMAL: &str = "H-";
pub const INSTALLATION_FEINT_DUMMY: &str = "HB";
pub const INSTALLATION_ALL: &[&str] = &[INSTALLATION_NORMAL, INSTALLATION_FEINT_DUMMY];

pub const MOBILITY_ALL: &[&str] =
    &["MO", "MP", "MQ", "MR", "MS", "MT", "MU", "MV", "MW", "MX", "MY"];

pub const AUXILIARY_EQUIPMENT_ALL: &[&str] = &["NS", "NL"];

pub const ORDER_OF_BATTLE_ALL_UEI_SIGINT_SO_EM: &[&str] = &["A", "E", "C", "G", "N", "S"];
pub const ORDER_OF_BATTLE_ALL_TACTICAL_GRAPHICS: &[&str] = &["X"];

/// Set of tokens an axis accepts under one scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueDomain {
    Tokens(&'static [&'static str]),
    /// Six characters of `A-Z`, `0-9` or the filler, not all filler.
    FunctionCode,
}

impl ValueDomain {
    pub fn contains(&self, token: &str) -> bool {
        match self {
            ValueDomain::Tokens(tokens) => tokens.iter().any(|t| *t == token),
            ValueDomain::FunctionCode => {
                token.len() == ClassificationAxis::FunctionId.width()
                    && token
                        .chars()
                        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == FILLER)
                    && token.chars().any(|c| c != FILLER)
            }
        }
    }

    /// Enumerated tokens; empty for open domains.
    pub fn tokens(&self) -> &'static [&'static str] {
        match self {
            ValueDomain::Tokens(tokens) => tokens,
            ValueDomain::FunctionCode => &[],
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ValueDomain::FunctionCode)
    }
}

struct AxisTable {
    shared: Option<ValueDomain>,
    by_scheme: HashMap<Scheme, ValueDomain>,
    all: Vec<&'static str>,
}

impl AxisTable {
    fn shared(domain: ValueDomain) -> Self {
        Self { shared: Some(domain), by_scheme: HashMap::new(), all: domain.tokens().to_vec() }
    }

    fn per_scheme(select: impl Fn(Scheme) -> ValueDomain) -> Self {
        let by_scheme: HashMap<_, _> = Scheme::ALL.into_iter().map(|s| (s, select(s))).collect();
        let mut all: Vec<&'static str> = vec![];
        for scheme in Scheme::ALL {
            for token in by_scheme[&scheme].tokens() {
                if !all.contains(token) {
                    all.push(*token);
                }
            }
        }
        Self { shared: None, by_scheme, all }
    }

    fn domain(&self, scheme: Scheme) -> ValueDomain {
        match self.shared {
            Some(domain) => domain,
            None => self.by_scheme.get(&scheme).copied().unwrap_or(ValueDomain::Tokens(&[])),
        }
    }
}

/// Process-wide legal value table
pub struct CodeRegistry {
    axes: HashMap<ClassificationAxis, AxisTable>,
}

static REGISTRY: OnceLock<CodeRegistry> = OnceLock::new();

/// The shared registry, built on first use.
pub fn registry() -> &'static CodeRegistry {
    REGISTRY.get_or_init(CodeRegistry::build)
}

impl CodeRegistry {
    fn build() -> Self {
        use ClassificationAxis as Axis;
        use ValueDomain::Tokens;

        let mut axes = HashMap::new();
        axes.insert(Axis::Scheme, AxisTable::shared(Tokens(SCHEME_ALL)));
        axes.insert(Axis::StandardIdentity, AxisTable::shared(Tokens(STANDARD_IDENTITY_ALL)));
        axes.insert(
            Axis::BattleDimension,
            AxisTable::per_scheme(|scheme| match scheme {
                Scheme::Intelligence => Tokens(BATTLE_DIMENSION_ALL_INTELLIGENCE),
                _ => Tokens(BATTLE_DIMENSION_ALL),
            }),
        );
        axes.insert(
            Axis::Category,
            AxisTable::per_scheme(|scheme| match scheme {
                Scheme::TacticalGraphics => Tokens(CATEGORY_ALL_TACTICAL_GRAPHICS),
                Scheme::StabilityOperations => Tokens(CATEGORY_ALL_STABILITY_OPERATIONS),
                Scheme::EmergencyManagement => Tokens(CATEGORY_ALL_EMERGENCY_MANAGEMENT),
                _ => Tokens(&[]),
            }),
        );
        axes.insert(
            Axis::Status,
            AxisTable::per_scheme(|scheme| match scheme {
                Scheme::Warfighting | Scheme::Intelligence | Scheme::StabilityOperations => {
                    Tokens(STATUS_ALL_UEI_SIGINT_SO)
                }
                Scheme::TacticalGraphics | Scheme::Metoc => {
                    Tokens(STATUS_ALL_TACTICAL_GRAPHICS_METOC)
                }
                Scheme::EmergencyManagement => Tokens(STATUS_ALL_EMERGENCY_MANAGEMENT),
            }),
        );
        axes.insert(Axis::FunctionId, AxisTable::shared(ValueDomain::FunctionCode));
        axes.insert(Axis::UnitEquipment, AxisTable::shared(Tokens(UNIT_EQUIPMENT_ALL)));
        axes.insert(Axis::Echelon, AxisTable::shared(Tokens(ECHELON_ALL)));
        axes.insert(Axis::Installation, AxisTable::shared(Tokens(INSTALLATION_ALL)));
        axes.insert(Axis::Mobility, AxisTable::shared(Tokens(MOBILITY_ALL)));
        axes.insert(Axis::AuxiliaryEquipment, AxisTable::shared(Tokens(AUXILIARY_EQUIPMENT_ALL)));
        axes.insert(Axis::Country, AxisTable::shared(Tokens(ISO_3166_ALPHA2)));
        axes.insert(
            Axis::OrderOfBattle,
            AxisTable::per_scheme(|scheme| match scheme {
                Scheme::TacticalGraphics => Tokens(ORDER_OF_BATTLE_ALL_TACTICAL_GRAPHICS),
                Scheme::Metoc => Tokens(&[]),
                _ => Tokens(ORDER_OF_BATTLE_ALL_UEI_SIGINT_SO_EM),
            }),
        );

        trace!(axes = axes.len(), "symbol code registry built");
        Self { axes }
    }

    fn table(&self, axis: ClassificationAxis) -> &AxisTable {
        // build() inserts every axis
        &self.axes[&axis]
    }

    /// Legal tokens for `axis` under `scheme`. Scheme-independent axes ignore `scheme`.
    pub fn legal_values(&self, axis: ClassificationAxis, scheme: Scheme) -> ValueDomain {
        self.table(axis).domain(scheme)
    }

    pub fn is_legal(&self, axis: ClassificationAxis, token: &str, scheme: Scheme) -> bool {
        self.legal_values(axis, scheme).contains(token)
    }

    /// Union across schemes, for pickers. Not a validation source.
    pub fn all_values(&self, axis: ClassificationAxis) -> &[&'static str] {
        &self.table(axis).all
    }

    pub fn is_scheme_dependent(&self, axis: ClassificationAxis) -> bool {
        self.table(axis).shared.is_none()
    }
}

pub fn legal_values(axis: ClassificationAxis, scheme: Scheme) -> ValueDomain {
    registry().legal_values(axis, scheme)
}

pub fn is_legal(axis: ClassificationAxis, token: &str, scheme: Scheme) -> bool {
    registry().is_legal(axis, token, scheme)
}

pub fn all_values(axis: ClassificationAxis) -> &'static [&'static str] {
    registry().all_values(axis)
}

// --- Composite unit/equipment codes (position 11) ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitEquipmentFlags {
    pub feint_dummy: bool,
    pub headquarters: bool,
    pub task_force: bool,
}

impl UnitEquipmentFlags {
    pub const fn new(feint_dummy: bool, headquarters: bool, task_force: bool) -> Self {
        Self { feint_dummy, headquarters, task_force }
    }

    pub fn is_empty(&self) -> bool {
        !(self.feint_dummy || self.headquarters || self.task_force)
    }
}

impl fmt::Display for UnitEquipmentFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = vec![];
        if self.feint_dummy {
            names.push("feint/dummy");
        }
        if self.headquarters {
            names.push("headquarters");
        }
        if self.task_force {
            names.push("task force");
        }
        if names.is_empty() {
            f.write_str("no flags")
        } else {
            f.write_str(&names.join(" + "))
        }
    }
}

/// MIL-STD-2525C table A-II.
const UNIT_EQUIPMENT_FLAGS: [(&str, UnitEquipmentFlags); 7] = [
    ("A", UnitEquipmentFlags::new(false, true, false)),
    ("B", UnitEquipmentFlags::new(false, true, true)),
    ("C", UnitEquipmentFlags::new(true, true, false)),
    ("D", UnitEquipmentFlags::new(true, true, true)),
    ("E", UnitEquipmentFlags::new(false, false, true)),
    ("F", UnitEquipmentFlags::new(true, false, false)),
    ("G", UnitEquipmentFlags::new(true, false, true)),
];

/// Flags encoded by a position-11 unit/equipment token.
pub fn decompose(token: &str) -> Option<UnitEquipmentFlags> {
    UNIT_EQUIPMENT_FLAGS
        .iter()
        .find(|(t, _)| t.eq_ignore_ascii_case(token))
        .map(|(_, flags)| *flags)
}

/// The single token encoding `flags`.
pub fn compose(flags: UnitEquipmentFlags) -> Result<&'static str, RegistryError> {
    UNIT_EQUIPMENT_FLAGS
        .iter()
        .find(|(_, f)| *f == flags)
        .map(|(t, _)| *t)
        .ok_or(RegistryError::AmbiguousCombination(flags))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battle_dimension_unknown_legal_everywhere() {
        for scheme in Scheme::ALL {
            assert!(is_legal(ClassificationAxis::BattleDimension, "Z", scheme));
            assert!(!is_legal(ClassificationAxis::BattleDimension, "Q", scheme));
        }
    }

    #[test]
    fn test_sof_not_legal_for_intelligence() {
        assert!(is_legal(ClassificationAxis::BattleDimension, "F", Scheme::Warfighting));
        assert!(!is_legal(ClassificationAxis::BattleDimension, "F", Scheme::Intelligence));
    }

    #[test]
    fn test_status_depends_on_scheme() {
        assert!(is_legal(ClassificationAxis::Status, "K", Scheme::TacticalGraphics));
        assert!(!is_legal(ClassificationAxis::Status, "K", Scheme::Warfighting));
        assert!(is_legal(ClassificationAxis::Status, "C", Scheme::Warfighting));
        assert!(!is_legal(ClassificationAxis::Status, "C", Scheme::EmergencyManagement));
    }

    #[test]
    fn test_category_all_values_union() {
        let all = all_values(ClassificationAxis::Category);
        assert_eq!(
            all,
            &["T", "G", "M", "F", "S", "O", "V", "L", "I", "P", "R", "N"]
        );
        assert!(legal_values(ClassificationAxis::Category, Scheme::Warfighting)
            .tokens()
            .is_empty());
    }

    #[test]
    fn test_scheme_independent_axes_ignore_scheme() {
        let registry = registry();
        assert!(!registry.is_scheme_dependent(ClassificationAxis::Echelon));
        assert!(registry.is_scheme_dependent(ClassificationAxis::OrderOfBattle));
        for scheme in Scheme::ALL {
            assert!(registry.is_legal(ClassificationAxis::Mobility, "MY", scheme));
            assert!(registry.is_legal(ClassificationAxis::Country, "US", scheme));
        }
    }

    #[test]
    fn test_function_code_domain() {
        let domain = legal_values(ClassificationAxis::FunctionId, Scheme::TacticalGraphics);
        assert!(domain.is_open());
        assert!(domain.contains("GLP---"));
        assert!(domain.contains("UCI---"));
        assert!(!domain.contains("------"));
        assert!(!domain.contains("GLP"));
        assert!(!domain.contains("gl?---"));
    }

    #[test]
    fn test_compose_inverts_decompose() {
        for token in UNIT_EQUIPMENT_ALL {
            let flags = decompose(token).unwrap();
            assert_eq!(compose(flags).unwrap(), *token);
        }
    }

    #[test]
    fn test_compose_empty_flags_fails() {
        let err = compose(UnitEquipmentFlags::default()).unwrap_err();
        assert!(matches!(err, RegistryError::AmbiguousCombination(_)));
    }

    #[test]
    fn test_scheme_parsing() {
        assert_eq!("G".parse::<Scheme>().unwrap(), Scheme::TacticalGraphics);
        assert_eq!("tactical_graphics".parse::<Scheme>().unwrap(), Scheme::TacticalGraphics);
        assert_eq!("StabilityOperations".parse::<Scheme>().unwrap(), Scheme::StabilityOperations);
        assert!("X".parse::<Scheme>().is_err());
    }

    #[test]
    fn test_axis_parsing() {
        assert_eq!(
            "order-of-battle".parse::<ClassificationAxis>().unwrap(),
            ClassificationAxis::OrderOfBattle
        );
        assert!("nonsense".parse::<ClassificationAxis>().is_err());
    }
}
