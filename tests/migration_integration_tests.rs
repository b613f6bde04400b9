//! Integration tests for version migrations and save validation.

use worldsave::prelude::*;
use worldsave::{LogConfig, Migrator, Validation, add_checksum, validate};

#[derive(Component, Debug, Clone, PartialEq)]
struct Health {
    current: u8,
    max: u8,
}

impl Saveable for Health {
    const NAME: &'static str = "Health";

    fn shape() -> Shape {
        Shape::record(vec![
            FieldShape::new("current", Shape::u8()),
            FieldShape::new("max", Shape::u8()),
        ])
    }

    fn to_value(&self) -> Value {
        Value::record(vec![
            ("current", Value::from(self.current)),
            ("max", Value::from(self.max)),
        ])
    }

    fn from_value(value: &Value) -> Result<Self, SaveError> {
        Ok(Self {
            current: value.field("current")?.as_u8()?,
            max: value.field("max")?.as_u8()?,
        })
    }
}

const V1_BLOB: &str =
    r#"{"meta":{"version":1},"components":{"HP":[{"entt":1,"data":{"current":80}}]}}"#;

fn chain() -> Migrator {
    let mut migrator = Migrator::new().with_log(LogConfig::off());
    migrator.register(1, 2, |tree| {
        tree.rename_component("HP", "Health");
        Ok(())
    });
    migrator.register(2, 3, |tree| {
        tree.add_field_default("Health", "max", serde_json::json!(100));
        Ok(())
    });
    migrator
}

#[test]
fn test_migration_chain_scenario() {
    let outcome = chain().migrate(V1_BLOB, 3).unwrap();

    assert_eq!(outcome.migrations_run, 2);
    assert_eq!(outcome.log.len(), 2);

    let migrated: serde_json::Value = serde_json::from_str(&outcome.blob).unwrap();
    assert_eq!(migrated["meta"]["version"], 3);
    assert_eq!(
        migrated["components"]["Health"][0]["data"],
        serde_json::json!({"current": 80, "max": 100})
    );
}

#[test]
fn test_migrated_blob_loads_into_registry() {
    let outcome = chain().migrate(V1_BLOB, 3).unwrap();

    let set = ComponentSet::builder().data::<Health>().build().unwrap();
    let codec = SaveCodec::new(set)
        .unwrap()
        .with_options(CodecOptions::new().with_version_window(1, 3));

    let mut registry = Registry::new();
    let report = codec.from_text(&outcome.blob, &mut registry).unwrap();

    assert_eq!(report.save_version, Some(3));
    let entity = registry.view::<Health>().next().unwrap();
    assert_eq!(
        registry.get::<Health>(entity),
        Some(&Health {
            current: 80,
            max: 100
        })
    );
}

#[test]
fn test_three_step_chain_counts_steps() {
    let mut migrator = Migrator::new().with_log(LogConfig::off());
    migrator.register(1, 2, |_| Ok(()));
    migrator.register(2, 3, |_| Ok(()));
    migrator.register(3, 4, |_| Ok(()));

    let outcome = migrator.migrate(V1_BLOB, 4).unwrap();
    assert_eq!(outcome.migrations_run, 3);

    let migrated: serde_json::Value = serde_json::from_str(&outcome.blob).unwrap();
    assert_eq!(migrated["meta"]["version"], 4);
    // Components survive untouched through identity steps.
    assert_eq!(migrated["components"]["HP"][0]["data"]["current"], 80);
}

#[test]
fn test_no_migration_path_is_surfaced() {
    let mut migrator = Migrator::new().with_log(LogConfig::off());
    migrator.register(2, 3, |_| Ok(()));

    assert!(matches!(
        migrator.migrate(V1_BLOB, 3),
        Err(SaveError::NoMigrationPath { from: 1, target: 3 })
    ));
}

#[test]
fn test_version_rejection_scenario() {
    #[derive(Component, Debug, Clone, PartialEq, Default)]
    struct Marker;

    let set = ComponentSet::builder().tag::<Marker>("Marker").build().unwrap();
    let codec = SaveCodec::new(set)
        .unwrap()
        .with_options(CodecOptions::new().with_version_window(1, 1));

    let blob = r#"{"meta":{"version":99},"components":{"Marker":[]}}"#;
    let mut registry = Registry::new();
    assert!(matches!(
        codec.from_text(blob, &mut registry),
        Err(SaveError::SaveFromNewerVersion { found: 99, max: 1 })
    ));
    // The failed load created nothing.
    assert!(registry.is_empty());
}

#[test]
fn test_checksum_roundtrip_through_migration() {
    let stamped = add_checksum(V1_BLOB).unwrap();
    assert_eq!(validate(&stamped, 1), Validation::Valid);

    // Migrating edits components, so the old checksum no longer matches;
    // re-stamping after migration restores validity.
    let outcome = chain().migrate(&stamped, 3).unwrap();
    assert!(matches!(
        validate(&outcome.blob, 3),
        Validation::ChecksumMismatch { .. }
    ));

    let restamped = add_checksum(&outcome.blob).unwrap();
    assert_eq!(validate(&restamped, 3), Validation::Valid);
}

#[test]
fn test_validator_verdicts() {
    assert_eq!(
        validate(r#"{"components":{}}"#, 1),
        Validation::MissingMetadata
    );
    assert!(matches!(
        validate("not a save", 1),
        Validation::InvalidStructure(_)
    ));
    assert_eq!(
        validate(r#"{"meta":{"version":9},"components":{}}"#, 3),
        Validation::VersionMismatch { found: 9, max: 3 }
    );
}

#[test]
fn test_tampering_with_any_component_byte_is_detected() {
    let blob = r#"{"meta":{"version":1},"components":{"HP":[{"entt":1,"data":{"current":80}}],"Gold":[{"entt":1,"data":{"amount":500}}]}}"#;
    let stamped = add_checksum(blob).unwrap();
    assert_eq!(validate(&stamped, 1), Validation::Valid);

    for tamper in [("80", "81"), ("500", "501"), ("entt\":1", "entt\":2")] {
        let mutated = stamped.replace(tamper.0, tamper.1);
        assert!(
            matches!(validate(&mutated, 1), Validation::ChecksumMismatch { .. }),
            "mutation {:?} went undetected",
            tamper
        );
    }
}
