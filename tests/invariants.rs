//! Contract Invariant Tests
//!
//! These tests verify the guarantees callers rely on.

use std::fs;

use symbology_core::{
    catalog::{CatalogError, GraphicCatalog},
    codec::{decode, encode, DecodeError},
    registry::{compose, decompose, is_legal, ClassificationAxis, Scheme, UNIT_EQUIPMENT_ALL},
    GraphicError, GraphicKind, GraphicParams, MilStd2525GraphicFactory, ModifierValue, Position,
    TacticalGraphic, TacticalGraphicFactory,
};

const CODES: &[&str] = &[
    "SFGPUCI---BD---",
    "SFGPUCA---AEUSA",
    "SHAPMF---------",
    "SFGPIR----H----",
    "SFGPEVAT--MO---",
    "SFUPS-----NS---",
    "GHGPGLP----AUSX",
    "GFMPOGL-------X",
    "WAS-PL----P----",
    "IHAPSRD-----USA",
    "OFVPA-----H-USA",
    "EFIPA-----MOUSA",
];

fn points(n: usize) -> Vec<Position> {
    (0..n).map(|i| Position::from_degrees(34.0 + i as f64 * 0.1, -117.5, 0.0)).collect()
}

#[test]
fn invariant_encode_decode_round_trip() {
    for code in CODES {
        let decoded = decode(code).unwrap();
        let encoded = encode(&decoded).unwrap();
        assert_eq!(encoded.len(), 15, "{}", code);
        assert_eq!(decode(&encoded).unwrap(), decoded, "{}", code);
    }
}

#[test]
fn invariant_unused_positions_are_canonicalized() {
    let decoded = decode("GHGPGLP----AUSX").unwrap();
    assert_eq!(encode(&decoded).unwrap(), "GHGPGLP-----USX");
}

#[test]
fn invariant_unknown_scheme_reports_only_scheme() {
    match decode("XZQPUCI----D---").unwrap_err() {
        DecodeError::UnknownScheme { token } => assert_eq!(token, "X"),
        other => panic!("expected UnknownScheme, got {other}"),
    }
}

#[test]
fn invariant_every_invalid_field_reported() {
    let err = decode("SZQPUCI----D---").unwrap_err();
    let reported: Vec<_> = err.violations().iter().map(|v| v.axis).collect();
    assert_eq!(
        reported,
        vec![ClassificationAxis::StandardIdentity, ClassificationAxis::BattleDimension]
    );
    assert_eq!(err.violations()[0].position, 2);
    assert_eq!(err.violations()[1].position, 3);
}

#[test]
fn invariant_compose_inverts_decompose() {
    for token in UNIT_EQUIPMENT_ALL {
        let flags = decompose(token).unwrap();
        assert_eq!(compose(flags).unwrap(), *token);
    }
    assert!(decompose("Z").is_none());
}

#[test]
fn invariant_battle_dimension_unknown_and_invalid() {
    for scheme in Scheme::ALL {
        assert!(is_legal(ClassificationAxis::BattleDimension, "Z", scheme));
        assert!(!is_legal(ClassificationAxis::BattleDimension, "Q", scheme));
    }
}

#[test]
fn invariant_tactical_graphic_has_no_echelon() {
    let decoded = decode("GHGPGLP----AUSX").unwrap();
    assert_eq!(decoded.scheme(), Some(Scheme::TacticalGraphics));
    assert!(decoded.get(ClassificationAxis::Echelon).is_none());
    assert!(decoded.get(ClassificationAxis::UnitEquipment).is_none());
}

#[test]
fn invariant_unknown_modifier_changes_nothing() {
    let factory = MilStd2525GraphicFactory::default();
    let mut graphic = factory.create_graphic("GHGPGLP----AUSX", points(2), None).unwrap();
    graphic.set_text("Alpha").unwrap();
    let before = graphic.attributes().modifiers().clone();

    graphic.set_modifier_visible("NotARealKey", false);
    graphic.set_modifier("NotARealKey", ModifierValue::Text("x".into())).unwrap();

    assert_eq!(graphic.attributes().modifiers(), &before);
    assert_eq!(graphic.identifier(), "GHGPGLP----AUSX");
    assert!(!graphic.is_modifier_visible("NotARealKey"));
    assert!(graphic.is_modifier_visible("Text"));
}

#[test]
fn invariant_control_point_count_enforced() {
    let factory = MilStd2525GraphicFactory::default();

    let err = factory.create_graphic("GFGPGPRI---AUSX", points(2), None).unwrap_err();
    assert!(matches!(err, GraphicError::WrongControlPointCount { actual: 2, .. }));

    let line = factory.create_graphic("GHGPGLB----AUSX", points(2), None).unwrap();
    assert_eq!(line.kind(), GraphicKind::Line);
    assert_eq!(line.positions().len(), 2);
}

#[test]
fn invariant_failed_mutation_leaves_graphic_unchanged() {
    let factory = MilStd2525GraphicFactory::default();
    let mut graphic = factory.create_graphic("GHGPGAG----AUSX", points(3), None).unwrap();

    assert!(graphic.set_positions(points(2)).is_err());
    assert_eq!(graphic.positions().len(), 3);

    assert!(graphic.set_identifier("GHGPGAG----AUS").is_err());
    assert_eq!(graphic.identifier(), "GHGPGAG----AUSX");

    assert!(graphic.move_by(&Position::from_degrees(1.0, 1.0, 0.0)).is_ok());
    assert_eq!(graphic.positions().len(), 3);
}

#[test]
fn invariant_rejected_modifier_is_reported() {
    let factory = MilStd2525GraphicFactory::default();
    let params = GraphicParams::new().with("Echelon", "Z").with("Text", "Bravo");
    let err = factory
        .create_point("SFGPUCI---AD---", Position::from_degrees(0.0, 0.0, 0.0), Some(&params))
        .unwrap_err();
    assert!(matches!(err, GraphicError::Encode(_)));

    let mut graphic = factory
        .create_point("SFGPUCI---AD---", Position::from_degrees(0.0, 0.0, 0.0), None)
        .unwrap();
    assert!(graphic.set_modifier("Mobility", ModifierValue::Token("MO".into())).is_err());
    assert_eq!(graphic.identifier(), "SFGPUCI---AD---");
    assert!(graphic.modifier("Mobility").is_none());
}

#[test]
fn invariant_params_seed_modifiers() {
    let factory = MilStd2525GraphicFactory::default();
    let params: GraphicParams = serde_json::from_value(serde_json::json!({
        "Text": "Objective Iron",
        "TaskForce": true,
        "Echelon": "E",
        "NotARealKey": "ignored",
    }))
    .unwrap();

    let graphic = factory
        .create_point("SFGPUCI--------", Position::from_degrees(0.0, 0.0, 0.0), Some(&params))
        .unwrap();
    assert_eq!(graphic.identifier(), "SFGPUCI---EE---");
    assert_eq!(graphic.text(), Some("Objective Iron"));
    assert!(graphic.is_visible());
}

#[test]
fn invariant_catalog_directory_extends_builtins() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("aviation.json"),
        r#"{
            "catalogVersion": "1.2.0",
            "engineMinVersion": "1.0.0",
            "descriptors": [{
                "id": "G*G*ALM---",
                "name": "Restricted Operations Zone",
                "scheme": "tactical_graphics",
                "dimension": "G",
                "functionId": "ALM---",
                "kind": "line",
                "controlPoints": { "rule": "atLeast", "count": 2 },
                "modifiers": ["Text", "Altitude"]
            }]
        }"#,
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "not a catalog").unwrap();

    let catalog = GraphicCatalog::load_from_dir(dir.path()).unwrap();
    assert_eq!(catalog.len(), GraphicCatalog::builtin().len() + 1);

    let factory = MilStd2525GraphicFactory::new(catalog);
    let graphic = factory.create_graphic("GFGPALM----AUSX", points(3), None).unwrap();
    assert_eq!(graphic.descriptor().name, "Restricted Operations Zone");
}

#[test]
fn invariant_catalog_requires_compatible_engine() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("future.json"),
        r#"{ "catalogVersion": "9.0.0", "engineMinVersion": "9.0.0", "descriptors": [] }"#,
    )
    .unwrap();

    let err = GraphicCatalog::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CatalogError::EngineVersionMismatch { .. }));
}

#[test]
fn invariant_missing_catalog_directory_uses_builtins() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = GraphicCatalog::load_from_dir(&dir.path().join("absent")).unwrap();
    assert_eq!(catalog.len(), GraphicCatalog::builtin().len());
}
