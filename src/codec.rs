//! SIDC Codec - Fixed-Width Code <-> SymbolCode
//!
//! Decoding gates on the scheme (position 1), then validates every field the
//! scheme uses against the registry. Field violations are collected, never
//! fail-fast, so one pass reports every problem.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::registry::{registry, ClassificationAxis, Scheme, FILLER};

/// Characters in a MIL-STD-2525C symbol identification code.
pub const CODE_LENGTH: usize = 15;

/// Decoded classification fields. Absent axes are filler or unused by the scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolCode {
    fields: BTreeMap<ClassificationAxis, String>,
}

impl SymbolCode {
    pub fn new(scheme: Scheme) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(ClassificationAxis::Scheme, scheme.token().to_string());
        Self { fields }
    }

    pub fn scheme(&self) -> Option<Scheme> {
        self.get(ClassificationAxis::Scheme).and_then(Scheme::from_token)
    }

    pub fn get(&self, axis: ClassificationAxis) -> Option<&str> {
        self.fields.get(&axis).map(String::as_str)
    }

    pub fn contains(&self, axis: ClassificationAxis) -> bool {
        self.fields.contains_key(&axis)
    }

    pub fn set(&mut self, axis: ClassificationAxis, token: impl Into<String>) {
        self.fields.insert(axis, token.into());
    }

    pub fn with(mut self, axis: ClassificationAxis, token: impl Into<String>) -> Self {
        self.set(axis, token);
        self
    }

    pub fn remove(&mut self, axis: ClassificationAxis) -> Option<String> {
        self.fields.remove(&axis)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassificationAxis, &str)> {
        self.fields.iter().map(|(axis, token)| (*axis, token.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Axes a scheme places in the code, in position order.
pub fn scheme_axes(scheme: Scheme) -> &'static [ClassificationAxis] {
    use ClassificationAxis as A;

    match scheme {
        Scheme::Warfighting => &[
            A::Scheme, A::StandardIdentity, A::BattleDimension, A::Status, A::FunctionId,
            A::UnitEquipment, A::Echelon, A::Installation, A::Mobility, A::AuxiliaryEquipment,
            A::Country, A::OrderOfBattle,
        ],
        Scheme::TacticalGraphics => &[
            A::Scheme, A::StandardIdentity, A::Category, A::Status, A::FunctionId, A::Country,
            A::OrderOfBattle,
        ],
        Scheme::Metoc => &[A::Scheme, A::Status, A::FunctionId],
        Scheme::Intelligence => &[
            A::Scheme, A::StandardIdentity, A::BattleDimension, A::Status, A::FunctionId,
            A::Country, A::OrderOfBattle,
        ],
        Scheme::StabilityOperations => &[
            A::Scheme, A::StandardIdentity, A::Category, A::Status, A::FunctionId,
            A::UnitEquipment, A::Echelon, A::Installation, A::Country, A::OrderOfBattle,
        ],
        Scheme::EmergencyManagement => &[
            A::Scheme, A::StandardIdentity, A::Category, A::Status, A::FunctionId,
            A::Installation, A::Mobility, A::Country, A::OrderOfBattle,
        ],
    }
}

pub fn is_applicable(axis: ClassificationAxis, scheme: Scheme) -> bool {
    scheme_axes(scheme).contains(&axis)
}

/// A token rejected during decode or encode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub axis: ClassificationAxis,
    pub token: String,
    /// 1-based position of the token's first character.
    pub position: usize,
    /// Legal tokens for the axis under the decoded scheme; empty for open domains.
    #[serde(default)]
    pub expected: Vec<String>,
}

impl FieldViolation {
    fn new(axis: ClassificationAxis, token: &str, position: usize, scheme: Scheme) -> Self {
        let expected = if is_applicable(axis, scheme) {
            registry()
                .legal_values(axis, scheme)
                .tokens()
                .iter()
                .map(|t| t.to_string())
                .collect()
        } else {
            vec![]
        };
        Self { axis, token: token.to_string(), position, expected }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} '{}' at position {}", self.axis, self.token, self.position)
    }
}

fn describe(violations: &[FieldViolation]) -> String {
    violations.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("; ")
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Symbol code must be {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Unknown scheme: {token}")]
    UnknownScheme { token: String },

    #[error("Invalid field values: {}", describe(.violations))]
    InvalidFields { violations: Vec<FieldViolation>, partial: SymbolCode },
}

impl DecodeError {
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            DecodeError::InvalidFields { violations, .. } => violations,
            _ => &[],
        }
    }

    /// Fields that validated before the decode was rejected.
    pub fn partial(&self) -> Option<&SymbolCode> {
        match self {
            DecodeError::InvalidFields { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Symbol code has no recognized scheme")]
    MissingScheme,

    #[error("{axis} is not used by the {scheme} scheme")]
    AxisNotApplicable { axis: ClassificationAxis, scheme: Scheme },

    #[error("Invalid {axis} '{token}' at position {position}")]
    InvalidFieldValue { axis: ClassificationAxis, token: String, position: usize },

    #[error("{first} and {second} both claim positions 11-12")]
    ConflictingModifiers { first: ClassificationAxis, second: ClassificationAxis },
}

fn is_filler(token: &str) -> bool {
    token.chars().all(|c| c == FILLER)
}

/// Decode a code string. Case-insensitive.
pub fn decode(code: &str) -> Result<SymbolCode, DecodeError> {
    let chars: Vec<char> = code.chars().map(|c| c.to_ascii_uppercase()).collect();
    if chars.len() != CODE_LENGTH {
        return Err(DecodeError::InvalidLength { expected: CODE_LENGTH, actual: chars.len() });
    }

    let scheme_token = chars[0].to_string();
    let scheme = Scheme::from_token(&scheme_token)
        .ok_or(DecodeError::UnknownScheme { token: scheme_token })?;

    let mut decoded = SymbolCode::new(scheme);
    let mut violations = vec![];
    let axes = scheme_axes(scheme);

    for &axis in axes {
        if axis == ClassificationAxis::Scheme || axis.is_symbol_modifier() {
            continue;
        }
        let token = slice(&chars, axis.start(), axis.width());
        accept(&mut decoded, &mut violations, scheme, axis, &token, axis.start());
    }

    if axes.iter().any(|a| a.is_symbol_modifier()) {
        decode_modifier_slot(&chars, scheme, &mut decoded, &mut violations);
    }

    if violations.is_empty() {
        Ok(decoded)
    } else {
        Err(DecodeError::InvalidFields { violations, partial: decoded })
    }
}

fn slice(chars: &[char], start: usize, width: usize) -> String {
    chars[start - 1..start - 1 + width].iter().collect()
}

fn accept(
    decoded: &mut SymbolCode,
    violations: &mut Vec<FieldViolation>,
    scheme: Scheme,
    axis: ClassificationAxis,
    token: &str,
    position: usize,
) {
    if is_filler(token) {
        return;
    }
    if is_applicable(axis, scheme) && registry().is_legal(axis, token, scheme) {
        decoded.set(axis, token);
    } else {
        violations.push(FieldViolation::new(axis, token, position, scheme));
    }
}

/// Positions 11-12 are tagged by their first character.
fn decode_modifier_slot(
    chars: &[char],
    scheme: Scheme,
    decoded: &mut SymbolCode,
    violations: &mut Vec<FieldViolation>,
) {
    let pair = slice(chars, 11, 2);
    let tagged = match chars[10] {
        'H' => Some(ClassificationAxis::Installation),
        'M' => Some(ClassificationAxis::Mobility),
        'N' => Some(ClassificationAxis::AuxiliaryEquipment),
        _ => None,
    };

    match tagged {
        Some(axis) => accept(decoded, violations, scheme, axis, &pair, 11),
        None => {
            let unit = slice(chars, 11, 1);
            let echelon = slice(chars, 12, 1);
            accept(decoded, violations, scheme, ClassificationAxis::UnitEquipment, &unit, 11);
            accept(decoded, violations, scheme, ClassificationAxis::Echelon, &echelon, 12);
        }
    }
}

fn slot_group(axis: ClassificationAxis) -> Option<u8> {
    match axis {
        ClassificationAxis::UnitEquipment | ClassificationAxis::Echelon => Some(0),
        ClassificationAxis::Installation => Some(1),
        ClassificationAxis::Mobility => Some(2),
        ClassificationAxis::AuxiliaryEquipment => Some(3),
        _ => None,
    }
}

/// Encode fields into a code string. Positions the scheme leaves unused are filler.
pub fn encode(code: &SymbolCode) -> Result<String, EncodeError> {
    let scheme = code.scheme().ok_or(EncodeError::MissingScheme)?;
    let mut out = vec![FILLER; CODE_LENGTH];
    let mut slot_owner: Option<(ClassificationAxis, u8)> = None;

    for (axis, token) in code.iter() {
        if !is_applicable(axis, scheme) {
            return Err(EncodeError::AxisNotApplicable { axis, scheme });
        }

        let token = token.to_ascii_uppercase();
        if token.chars().count() != axis.width() || !registry().is_legal(axis, &token, scheme) {
            return Err(EncodeError::InvalidFieldValue { axis, token, position: axis.start() });
        }

        if let Some(group) = slot_group(axis) {
            match slot_owner {
                Some((first, owner)) if owner != group => {
                    return Err(EncodeError::ConflictingModifiers { first, second: axis });
                }
                Some(_) => {}
                None => slot_owner = Some((axis, group)),
            }
        }

        for (offset, c) in token.chars().enumerate() {
            out[axis.start() - 1 + offset] = c;
        }
    }

    Ok(out.into_iter().collect())
}

/// Batch report for one code, suitable for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeReport {
    pub valid: bool,
    pub code: String,
    pub scheme: Option<Scheme>,
    pub fields: SymbolCode,
    pub violations: Vec<FieldViolation>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Decode without failing; every outcome becomes a report.
pub fn inspect(code: &str) -> DecodeReport {
    match decode(code) {
        Ok(fields) => DecodeReport {
            valid: true,
            code: code.to_string(),
            scheme: fields.scheme(),
            fields,
            violations: vec![],
            error: None,
        },
        Err(err) => {
            let fields = err.partial().cloned().unwrap_or_default();
            DecodeReport {
                valid: false,
                code: code.to_string(),
                scheme: fields.scheme(),
                violations: err.violations().to_vec(),
                fields,
                error: Some(err.to_string()),
            }
        }
    }
}
