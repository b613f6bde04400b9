//! Integration tests for save/load round-trips.
//!
//! These tests exercise the full pipeline: registry to blob to registry,
//! in both formats, including entity reference remapping and the envelope
//! file helpers.

use worldsave::envelope::{self, SlotConfig};
use worldsave::prelude::*;
use worldsave::{EnumShape, IntShape, IntWidth, Limits, VariantCase, VariantShape};

#[derive(Component, Debug, Clone, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

impl Saveable for Position {
    const NAME: &'static str = "Position";

    fn shape() -> Shape {
        Shape::record(vec![
            FieldShape::new("x", Shape::f32()),
            FieldShape::new("y", Shape::f32()),
        ])
    }

    fn to_value(&self) -> Value {
        Value::record(vec![("x", Value::from(self.x)), ("y", Value::from(self.y))])
    }

    fn from_value(value: &Value) -> Result<Self, SaveError> {
        Ok(Self {
            x: value.field("x")?.as_f32()?,
            y: value.field("y")?.as_f32()?,
        })
    }
}

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

#[derive(Component, Debug, Clone, PartialEq, Default)]
struct Player;

#[derive(Component, Debug, Clone, PartialEq)]
struct FollowTarget {
    target: Entity,
    distance: f32,
}

impl Saveable for FollowTarget {
    const NAME: &'static str = "FollowTarget";

    fn shape() -> Shape {
        Shape::record(vec![
            FieldShape::new("target", Shape::EntityRef),
            FieldShape::new("distance", Shape::f32()),
        ])
    }

    fn to_value(&self) -> Value {
        Value::record(vec![
            ("target", Value::entity(self.target)),
            ("distance", Value::from(self.distance)),
        ])
    }

    fn from_value(value: &Value) -> Result<Self, SaveError> {
        Ok(Self {
            target: value.field("target")?.as_entity()?,
            distance: value.field("distance")?.as_f32()?,
        })
    }
}

#[derive(Component, Debug, Clone, PartialEq)]
struct Stats {
    level: u32,
    experience: u64,
    gold: i32,
}

impl Saveable for Stats {
    const NAME: &'static str = "Stats";

    fn shape() -> Shape {
        Shape::record(vec![
            FieldShape::new("level", Shape::u32()),
            FieldShape::new("experience", Shape::u64()),
            FieldShape::new("gold", Shape::i32()),
        ])
    }

    fn to_value(&self) -> Value {
        Value::record(vec![
            ("level", Value::from(self.level)),
            ("experience", Value::from(self.experience)),
            ("gold", Value::from(self.gold)),
        ])
    }

    fn from_value(value: &Value) -> Result<Self, SaveError> {
        Ok(Self {
            level: value.field("level")?.as_u32()?,
            experience: value.field("experience")?.as_u64()?,
            gold: value.field("gold")?.as_i32()?,
        })
    }
}

/// Exercises every shape combinator in one component.
#[derive(Component, Debug, Clone, PartialEq)]
struct Loadout {
    name: String,
    stance: Stance,
    weapon: Weapon,
    quickbar: [u16; 3],
    backpack: Vec<u16>,
    mount: Option<Entity>,
    blessed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stance {
    Idle,
    Aggressive,
    Defensive,
}

#[derive(Debug, Clone, PartialEq)]
enum Weapon {
    Unarmed,
    Melee(u16),
    Ranged { item: u16 },
}

impl Saveable for Loadout {
    const NAME: &'static str = "Loadout";

    fn shape() -> Shape {
        Shape::record(vec![
            FieldShape::new("name", Shape::Str),
            FieldShape::new(
                "stance",
                Shape::Enum(EnumShape::new(
                    IntShape {
                        signed: false,
                        width: IntWidth::W8,
                    },
                    &[("Idle", 0), ("Aggressive", 1), ("Defensive", 2)],
                )),
            ),
            FieldShape::new(
                "weapon",
                Shape::Variant(VariantShape::new(vec![
                    VariantCase::void("Unarmed"),
                    VariantCase::new("Melee", Shape::u16()),
                    VariantCase::new("Ranged", Shape::u16()),
                ])),
            ),
            FieldShape::new("quickbar", Shape::fixed_array(3, Shape::u16())),
            FieldShape::new("backpack", Shape::dyn_array(Shape::u16())),
            FieldShape::new("mount", Shape::OptionalEntityRef),
            FieldShape::new("blessed", Shape::Bool),
        ])
    }

    fn to_value(&self) -> Value {
        let stance = match self.stance {
            Stance::Idle => 0,
            Stance::Aggressive => 1,
            Stance::Defensive => 2,
        };
        let weapon = match &self.weapon {
            Weapon::Unarmed => Value::Variant {
                tag: 0,
                payload: None,
            },
            Weapon::Melee(item) => Value::Variant {
                tag: 1,
                payload: Some(Box::new(Value::from(*item))),
            },
            Weapon::Ranged { item } => Value::Variant {
                tag: 2,
                payload: Some(Box::new(Value::from(*item))),
            },
        };
        Value::record(vec![
            ("name", Value::from(self.name.clone())),
            ("stance", Value::Enum(stance)),
            ("weapon", weapon),
            (
                "quickbar",
                Value::Array(self.quickbar.iter().map(|&slot| Value::from(slot)).collect()),
            ),
            (
                "backpack",
                Value::Array(self.backpack.iter().map(|&item| Value::from(item)).collect()),
            ),
            ("mount", Value::opt_entity(self.mount)),
            ("blessed", Value::from(self.blessed)),
        ])
    }

    fn from_value(value: &Value) -> Result<Self, SaveError> {
        let stance = match value.field("stance")?.as_enum()? {
            0 => Stance::Idle,
            1 => Stance::Aggressive,
            _ => Stance::Defensive,
        };
        let weapon = match value.field("weapon")? {
            Value::Variant { tag: 0, .. } => Weapon::Unarmed,
            Value::Variant {
                tag: 1,
                payload: Some(payload),
            } => Weapon::Melee(payload.as_u16()?),
            Value::Variant {
                tag: 2,
                payload: Some(payload),
            } => Weapon::Ranged {
                item: payload.as_u16()?,
            },
            other => {
                return Err(SaveError::type_mismatch("weapon union", other.kind_name()));
            }
        };
        let quickbar_values = value.field("quickbar")?.as_array()?;
        let mut quickbar = [0u16; 3];
        for (slot, quick) in quickbar.iter_mut().zip(quickbar_values) {
            *slot = quick.as_u16()?;
        }
        let backpack = value
            .field("backpack")?
            .as_array()?
            .iter()
            .map(|item| item.as_u16())
            .collect::<Result<Vec<u16>, SaveError>>()?;
        Ok(Self {
            name: value.field("name")?.as_str()?.to_string(),
            stance,
            weapon,
            quickbar,
            backpack,
            mount: value.field("mount")?.as_opt_entity()?,
            blessed: value.field("blessed")?.as_bool()?,
        })
    }
}

fn player_set() -> ComponentSet {
    ComponentSet::builder()
        .data::<Position>()
        .data::<Health>()
        .tag::<Player>("Player")
        .build()
        .unwrap()
}

#[test]
fn test_roundtrip_player() {
    let mut registry = Registry::new();
    let entity = registry.create();
    registry.add(entity, Position { x: 100.0, y: 200.0 });
    registry.add(
        entity,
        Health {
            current: 80,
            max: 100,
        },
    );
    registry.add(entity, Player);

    let codec = SaveCodec::new(player_set())
        .unwrap()
        .with_options(CodecOptions::new().with_pretty(true));
    let blob = codec.to_text(&registry).unwrap();

    let mut restored = Registry::new();
    let report = codec.from_text(&blob, &mut restored).unwrap();

    assert_eq!(report.entities_created, 1);
    assert_eq!(restored.len(), 1);

    let loaded = restored.view::<Position>().next().unwrap();
    assert_eq!(
        restored.get::<Position>(loaded),
        Some(&Position { x: 100.0, y: 200.0 })
    );
    assert_eq!(
        restored.get::<Health>(loaded),
        Some(&Health {
            current: 80,
            max: 100
        })
    );
    assert!(restored.has::<Player>(loaded));
}

#[test]
fn test_reference_remap() {
    let set = ComponentSet::builder()
        .data::<Position>()
        .data::<FollowTarget>()
        .build()
        .unwrap();

    let mut registry = Registry::new();
    let a = registry.create();
    let b = registry.create();
    registry.add(a, Position { x: 0.0, y: 0.0 });
    registry.add(b, Position { x: 10.0, y: 10.0 });
    registry.add(
        b,
        FollowTarget {
            target: a,
            distance: 5.0,
        },
    );

    let codec = SaveCodec::new(set).unwrap();
    let blob = codec.to_text(&registry).unwrap();

    let mut restored = Registry::new();
    // Burn a few ids so the fresh registry cannot accidentally line up
    // with the saved ids.
    restored.create();
    restored.create();
    restored.create();
    codec.from_text(&blob, &mut restored).unwrap();

    let follower = restored.view::<FollowTarget>().next().unwrap();
    let follow = restored.get::<FollowTarget>(follower).unwrap();
    assert_eq!(follow.distance, 5.0);

    // The rewritten reference must point at the entity carrying the
    // leader's position.
    let target_position = restored.get::<Position>(follow.target);
    assert_eq!(target_position, Some(&Position { x: 0.0, y: 0.0 }));
    assert_ne!(follow.target, follower);
}

#[test]
fn test_remap_soundness_in_binary() {
    let set = ComponentSet::builder()
        .data::<Position>()
        .data::<FollowTarget>()
        .build()
        .unwrap();

    let mut registry = Registry::new();
    let a = registry.create();
    let b = registry.create();
    registry.add(a, Position { x: 1.0, y: 2.0 });
    registry.add(b, Position { x: 3.0, y: 4.0 });
    registry.add(
        b,
        FollowTarget {
            target: a,
            distance: 2.5,
        },
    );

    let codec = SaveCodec::new(set).unwrap();
    let blob = codec.to_binary(&registry).unwrap();

    let mut restored = Registry::new();
    restored.create();
    codec.from_binary(&blob, &mut restored).unwrap();

    let follower = restored.view::<FollowTarget>().next().unwrap();
    let follow = restored.get::<FollowTarget>(follower).unwrap();
    assert_eq!(
        restored.get::<Position>(follow.target),
        Some(&Position { x: 1.0, y: 2.0 })
    );
}

#[test]
fn test_all_shape_combinators_roundtrip_both_formats() {
    let set = ComponentSet::builder().data::<Loadout>().build().unwrap();

    let mut registry = Registry::new();
    let mount = registry.create();
    let rider = registry.create();
    let loadout = Loadout {
        name: "Vanguard \"Äs\" loadout\n".to_string(),
        stance: Stance::Aggressive,
        weapon: Weapon::Ranged { item: 77 },
        quickbar: [1, 2, 3],
        backpack: vec![10, 20, 30, 40],
        mount: Some(mount),
        blessed: true,
    };
    registry.add(rider, loadout.clone());

    let codec = SaveCodec::new(set).unwrap();

    let text = codec.to_text(&registry).unwrap();
    let mut from_text = Registry::new();
    codec.from_text(&text, &mut from_text).unwrap();
    let text_entity = from_text.view::<Loadout>().next().unwrap();
    let text_loadout = from_text.get::<Loadout>(text_entity).unwrap();
    assert_eq!(text_loadout.name, loadout.name);
    assert_eq!(text_loadout.stance, loadout.stance);
    assert_eq!(text_loadout.weapon, loadout.weapon);
    assert_eq!(text_loadout.quickbar, loadout.quickbar);
    assert_eq!(text_loadout.backpack, loadout.backpack);
    assert_eq!(text_loadout.blessed, loadout.blessed);

    let binary = codec.to_binary(&registry).unwrap();
    let mut from_binary = Registry::new();
    codec.from_binary(&binary, &mut from_binary).unwrap();
    let binary_entity = from_binary.view::<Loadout>().next().unwrap();
    let binary_loadout = from_binary.get::<Loadout>(binary_entity).unwrap();
    assert_eq!(binary_loadout.name, loadout.name);
    assert_eq!(binary_loadout.weapon, loadout.weapon);
    assert_eq!(binary_loadout.backpack, loadout.backpack);
}

#[test]
fn test_format_interchangeability() {
    let set = ComponentSet::builder()
        .data::<Position>()
        .data::<Health>()
        .data::<Stats>()
        .tag::<Player>("Player")
        .build()
        .unwrap();

    let mut registry = Registry::new();
    for level in 0..10 {
        let entity = registry.create();
        registry.add(
            entity,
            Position {
                x: level as f32,
                y: level as f32 * 2.0,
            },
        );
        registry.add(
            entity,
            Health {
                current: 50,
                max: 100,
            },
        );
        registry.add(
            entity,
            Stats {
                level,
                experience: u64::from(level) * 1000,
                gold: 100 - level as i32,
            },
        );
    }
    let first = registry.view::<Position>().next().unwrap();
    registry.add(first, Player);

    let codec = SaveCodec::new(set).unwrap();
    let text = codec.to_text(&registry).unwrap();
    let binary = codec.to_binary(&registry).unwrap();

    let mut from_text = Registry::new();
    let mut from_binary = Registry::new();
    codec.from_text(&text, &mut from_text).unwrap();
    codec.from_binary(&binary, &mut from_binary).unwrap();

    assert_eq!(from_text.len(), from_binary.len());
    assert_eq!(from_text.count::<Position>(), from_binary.count::<Position>());
    assert_eq!(from_text.count::<Health>(), from_binary.count::<Health>());
    assert_eq!(from_text.count::<Stats>(), from_binary.count::<Stats>());
    assert_eq!(from_text.count::<Player>(), from_binary.count::<Player>());
}

#[test]
fn test_binary_smaller_than_compact_text() {
    let set = ComponentSet::builder()
        .data::<Position>()
        .data::<Health>()
        .data::<Stats>()
        .build()
        .unwrap();

    let mut registry = Registry::new();
    for index in 0..10u32 {
        let entity = registry.create();
        registry.add(
            entity,
            Position {
                x: index as f32 * 3.5,
                y: index as f32 * 7.25,
            },
        );
        registry.add(
            entity,
            Health {
                current: index as u8,
                max: 100,
            },
        );
        registry.add(
            entity,
            Stats {
                level: index,
                experience: u64::from(index) * 12345,
                gold: -(index as i32),
            },
        );
    }

    let codec = SaveCodec::new(set).unwrap();
    let text = codec.to_text(&registry).unwrap();
    let binary = codec.to_binary(&registry).unwrap();

    assert!(
        binary.len() < text.len(),
        "binary ({} bytes) should undercut compact text ({} bytes)",
        binary.len(),
        text.len()
    );
}

#[test]
fn test_text_reemission_is_byte_exact() {
    // Timestamps change between emissions, so byte-exactness is checked
    // with metadata off.
    let options = CodecOptions::new().with_metadata(false).with_pretty(true);
    let codec = SaveCodec::new(player_set()).unwrap().with_options(options);

    let mut registry = Registry::new();
    let entity = registry.create();
    registry.add(entity, Position { x: 1.5, y: -2.5 });
    registry.add(
        entity,
        Health {
            current: 10,
            max: 20,
        },
    );
    registry.add(entity, Player);

    let first = codec.to_text(&registry).unwrap();
    let mut reloaded = Registry::new();
    codec.from_text(&first, &mut reloaded).unwrap();
    let second = codec.to_text(&reloaded).unwrap();
    assert_eq!(first, second);

    let compact = SaveCodec::new(player_set())
        .unwrap()
        .with_options(CodecOptions::new().with_metadata(false));
    let first = compact.to_text(&registry).unwrap();
    let mut reloaded = Registry::new();
    compact.from_text(&first, &mut reloaded).unwrap();
    let second = compact.to_text(&reloaded).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_envelope_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let slots = SlotConfig::new(dir.path()).with_extension("sav");

    let mut registry = Registry::new();
    let entity = registry.create();
    registry.add(entity, Position { x: 4.0, y: 8.0 });
    registry.add(
        entity,
        Health {
            current: 1,
            max: 10,
        },
    );

    let codec = SaveCodec::new(player_set()).unwrap();
    let blob = codec.to_binary(&registry).unwrap();

    let path = slots.slot_path(0);
    envelope::write_save_file(&path, &envelope::wrap(&blob)).unwrap();

    let bytes = envelope::read_save_file(&path, &Limits::default()).unwrap();
    assert!(envelope::has_header(&bytes));
    let payload = envelope::unwrap(&bytes).unwrap();

    let mut restored = Registry::new();
    let report = codec.from_binary(payload, &mut restored).unwrap();
    assert_eq!(report.entities_created, 1);
    assert_eq!(
        restored.get::<Position>(restored.view::<Position>().next().unwrap()),
        Some(&Position { x: 4.0, y: 8.0 })
    );
}

#[test]
fn test_dangling_reference_passes_through() {
    let set = ComponentSet::builder()
        .data::<FollowTarget>()
        .build()
        .unwrap();

    // The follower references entity 999, which the save never declares.
    let blob = r#"{"meta":{"version":1},"components":{"FollowTarget":[{"entt":5,"data":{"target":999,"distance":1.0}}]}}"#;

    let codec = SaveCodec::new(set).unwrap();
    let mut registry = Registry::new();
    codec.from_text(blob, &mut registry).unwrap();

    let follower = registry.view::<FollowTarget>().next().unwrap();
    let follow = registry.get::<FollowTarget>(follower).unwrap();
    // The external id survives untouched instead of being remapped into
    // silent corruption.
    assert_eq!(follow.target, Entity::from_raw(999));
}
