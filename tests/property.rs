use proptest::prelude::*;
use proptest::sample::Index;

use symbology_core::{
    codec::{decode, encode, scheme_axes, DecodeError, SymbolCode},
    registry::{legal_values, ClassificationAxis, Scheme, ValueDomain},
};

/// Which axes share positions 11-12.
fn slot_group(axis: ClassificationAxis) -> Option<u8> {
    match axis {
        ClassificationAxis::UnitEquipment | ClassificationAxis::Echelon => Some(0),
        ClassificationAxis::Installation => Some(1),
        ClassificationAxis::Mobility => Some(2),
        ClassificationAxis::AuxiliaryEquipment => Some(3),
        _ => None,
    }
}

/// Well-formed codes: every axis the scheme places is either absent or a legal
/// token, and at most one group occupies positions 11-12.
fn symbol_codes() -> impl Strategy<Value = SymbolCode> {
    (
        prop::sample::select(Scheme::ALL.to_vec()),
        prop::collection::vec((any::<bool>(), any::<Index>()), ClassificationAxis::ALL.len()),
        any::<Index>(),
        "[A-Z0-9][A-Z0-9-]{5}",
    )
        .prop_map(|(scheme, picks, slot, function_id)| {
            let axes = scheme_axes(scheme);
            let mut groups: Vec<u8> = axes.iter().filter_map(|a| slot_group(*a)).collect();
            groups.dedup();
            let chosen = if groups.is_empty() { None } else { Some(groups[slot.index(groups.len())]) };

            let mut code = SymbolCode::new(scheme);
            for (axis, (present, pick)) in ClassificationAxis::ALL.into_iter().zip(picks) {
                if axis == ClassificationAxis::Scheme || !axes.contains(&axis) || !present {
                    continue;
                }
                if slot_group(axis).is_some() && slot_group(axis) != chosen {
                    continue;
                }
                let token = match legal_values(axis, scheme) {
                    ValueDomain::FunctionCode => function_id.clone(),
                    ValueDomain::Tokens(tokens) if tokens.is_empty() => continue,
                    ValueDomain::Tokens(tokens) => tokens[pick.index(tokens.len())].to_string(),
                };
                code.set(axis, token);
            }
            code
        })
}

proptest! {
    #[test]
    fn roundtrip_well_formed_codes(code in symbol_codes()) {
        let encoded = encode(&code).unwrap();
        prop_assert_eq!(encoded.chars().count(), 15);

        let decoded = decode(&encoded).unwrap();
        prop_assert_eq!(&decoded, &code);
        prop_assert_eq!(encode(&decoded).unwrap(), encoded);
    }

    #[test]
    fn unknown_scheme_reports_nothing_else(
        first in "[ABCDFHJKLMNPQRTUVXYZ0-9*#]",
        rest in "[A-Z0-9*-]{14}",
    ) {
        let code = format!("{}{}", first, rest);
        match decode(&code) {
            Err(DecodeError::UnknownScheme { token }) => prop_assert_eq!(token, first),
            other => prop_assert!(false, "expected UnknownScheme for {}, got {:?}", code, other),
        }
    }
}
