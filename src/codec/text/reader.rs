//! Text parsing: RFC-8259 input to save model.
//!
//! Reader policy, in the order it matters to older saves: integers flow
//! into narrower fields by cast, floats accept integer literals, absent
//! struct fields fall back to their declared default or fail with
//! missing-field, and unknown object fields are ignored so newer saves
//! stay loadable.

use crate::codec::Limits;
use crate::error::{Result, SaveError};
use crate::model::{Record, SaveMeta, SaveModel};
use crate::schema::{FloatWidth, Shape, Value};
use crate::set::ComponentSet;

/// Outcome of parsing a text blob: the model plus any component keys the
/// set does not know.
pub(crate) struct ParsedText {
    pub model: SaveModel,
    pub unknown: Vec<String>,
}

/// Parses a text blob into the save model.
///
/// Component keys are observed in blob order. Keys naming types outside
/// the set are collected, not parsed; the registry codec decides whether
/// they are an error.
///
/// # Errors
///
/// Fails on malformed JSON, a non-object root, a missing `components`
/// object, or any record that does not conform to its registered shape.
pub(crate) fn read_model(blob: &str, set: &ComponentSet, limits: &Limits) -> Result<ParsedText> {
    let root: serde_json::Value = serde_json::from_str(blob)?;
    let root = root
        .as_object()
        .ok_or_else(|| SaveError::invalid_format("root is not an object"))?;

    let meta = match root.get("meta") {
        Some(meta) => Some(read_meta(meta)?),
        None => None,
    };

    let components_json = root
        .get("components")
        .ok_or_else(|| SaveError::invalid_format("missing 'components' object"))?
        .as_object()
        .ok_or_else(|| SaveError::invalid_format("'components' is not an object"))?;

    let mut components = Vec::new();
    let mut unknown = Vec::new();
    for (name, records_json) in components_json {
        let Some(spec) = set.get(name) else {
            unknown.push(name.clone());
            continue;
        };
        let records_json = records_json.as_array().ok_or_else(|| {
            SaveError::invalid_format(format!("records of '{}' are not an array", name))
        })?;

        let mut records = Vec::with_capacity(records_json.len());
        for record_json in records_json {
            if spec.is_tag() {
                records.push(Record::Tag(read_entity_id(name, record_json)?));
            } else {
                let object = record_json.as_object().ok_or_else(|| {
                    SaveError::invalid_format(format!("record of '{}' is not an object", name))
                })?;
                let entity = read_entity_id(
                    name,
                    object.get("entt").ok_or_else(|| {
                        SaveError::invalid_format(format!("record of '{}' missing 'entt'", name))
                    })?,
                )?;
                let data = object.get("data").ok_or_else(|| {
                    SaveError::invalid_format(format!("record of '{}' missing 'data'", name))
                })?;
                let shape = spec.shape().ok_or_else(|| {
                    SaveError::schema(format!("data component '{}' has no shape", name))
                })?;
                let value = parse_value(name, shape, data, limits)?;
                records.push(Record::Data { entity, value });
            }
        }
        components.push((name.clone(), records));
    }

    Ok(ParsedText {
        model: SaveModel { meta, components },
        unknown,
    })
}

fn read_meta(meta: &serde_json::Value) -> Result<SaveMeta> {
    let object = meta
        .as_object()
        .ok_or_else(|| SaveError::invalid_format("'meta' is not an object"))?;

    let version = object
        .get("version")
        .and_then(serde_json::Value::as_u64)
        .ok_or(SaveError::MissingVersion)?;

    Ok(SaveMeta {
        version: version as u32,
        lib_version: object
            .get("lib_version")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string(),
        timestamp: object
            .get("timestamp")
            .and_then(serde_json::Value::as_i64)
            .unwrap_or_default(),
        game_name: object
            .get("game_name")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
        checksum: object
            .get("checksum")
            .and_then(serde_json::Value::as_u64)
            .map(|checksum| checksum as u32),
    })
}

fn read_entity_id(type_name: &str, json: &serde_json::Value) -> Result<u32> {
    let id = json.as_u64().ok_or_else(|| {
        SaveError::InvalidEntityReference(format!(
            "'{}' record id is not an unsigned integer",
            type_name
        ))
    })?;
    u32::try_from(id).map_err(|_| {
        SaveError::InvalidEntityReference(format!(
            "'{}' record id {} exceeds the 32-bit entity space",
            type_name, id
        ))
    })
}

/// Converts one JSON value into the value model, walking the shape
/// alongside.
pub(crate) fn parse_value(
    type_name: &str,
    shape: &Shape,
    json: &serde_json::Value,
    limits: &Limits,
) -> Result<Value> {
    match shape {
        Shape::Bool => json
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| SaveError::type_mismatch("bool", json_kind(json))),
        Shape::Int(int) => {
            if int.signed {
                let number = json
                    .as_i64()
                    .ok_or_else(|| SaveError::type_mismatch("signed integer", json_kind(json)))?;
                Ok(Value::Int(narrow_signed(number, int.width.bits())))
            } else {
                let number = json
                    .as_u64()
                    .ok_or_else(|| SaveError::type_mismatch("unsigned integer", json_kind(json)))?;
                Ok(Value::UInt(narrow_unsigned(number, int.width.bits())))
            }
        }
        Shape::Float(width) => {
            // Integer literals flow into float fields.
            let number = json
                .as_f64()
                .ok_or_else(|| SaveError::type_mismatch("float", json_kind(json)))?;
            Ok(match width {
                FloatWidth::W32 => Value::F32(number as f32),
                FloatWidth::W64 => Value::F64(number),
            })
        }
        Shape::Str => {
            let text = json
                .as_str()
                .ok_or_else(|| SaveError::type_mismatch("string", json_kind(json)))?;
            if text.len() > limits.max_string_len {
                return Err(SaveError::StringTooLong {
                    len: text.len(),
                    max: limits.max_string_len,
                });
            }
            Ok(Value::Str(text.to_string()))
        }
        Shape::Struct(fields) => {
            let object = json
                .as_object()
                .ok_or_else(|| SaveError::type_mismatch("struct", json_kind(json)))?;
            let mut values = Vec::with_capacity(fields.len());
            for field in fields {
                let value = match object.get(field.name) {
                    Some(field_json) => parse_value(type_name, &field.shape, field_json, limits)?,
                    None => match &field.default {
                        Some(default) => default.clone(),
                        None => return Err(SaveError::missing_field(type_name, field.name)),
                    },
                };
                values.push((field.name, value));
            }
            // Unknown keys in `object` are ignored for forward
            // compatibility.
            Ok(Value::Struct(values))
        }
        Shape::FixedArray { len, inner } => {
            let elements = json
                .as_array()
                .ok_or_else(|| SaveError::type_mismatch("array", json_kind(json)))?;
            if elements.len() != *len {
                return Err(SaveError::ArrayLengthMismatch {
                    expected: *len,
                    found: elements.len(),
                });
            }
            parse_elements(type_name, inner, elements, limits)
        }
        Shape::DynArray(inner) => {
            let elements = json
                .as_array()
                .ok_or_else(|| SaveError::type_mismatch("array", json_kind(json)))?;
            if elements.len() > limits.max_array_len {
                return Err(SaveError::ArrayTooLong {
                    len: elements.len(),
                    max: limits.max_array_len,
                });
            }
            parse_elements(type_name, inner, elements, limits)
        }
        Shape::Optional(inner) => {
            if json.is_null() {
                Ok(Value::none())
            } else {
                Ok(Value::some(parse_value(type_name, inner, json, limits)?))
            }
        }
        Shape::Enum(shape) => {
            let name = json
                .as_str()
                .ok_or_else(|| SaveError::type_mismatch("enum name", json_kind(json)))?;
            let variant = shape.variant_by_name(name).ok_or_else(|| {
                SaveError::InvalidEnumValue(format!("{}: unknown variant '{}'", type_name, name))
            })?;
            Ok(Value::Enum(variant.value))
        }
        Shape::Variant(shape) => {
            let object = json
                .as_object()
                .ok_or_else(|| SaveError::type_mismatch("tagged union", json_kind(json)))?;
            let tag_name = object
                .get("tag")
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| {
                    SaveError::InvalidUnionTag(format!("{}: record has no string 'tag'", type_name))
                })?;
            let (tag, case) = shape.case_by_name(tag_name).ok_or_else(|| {
                SaveError::InvalidUnionTag(format!("{}: unknown case '{}'", type_name, tag_name))
            })?;
            let payload_json = object.get("value");
            let payload = match &case.shape {
                Some(case_shape) => match payload_json {
                    Some(json) if !json.is_null() => {
                        Some(Box::new(parse_value(type_name, case_shape, json, limits)?))
                    }
                    _ => {
                        return Err(SaveError::type_mismatch(
                            format!("payload for union case '{}'", case.name),
                            "null",
                        ));
                    }
                },
                None => None,
            };
            Ok(Value::Variant { tag, payload })
        }
        Shape::EntityRef => Ok(Value::Entity(read_entity_id(type_name, json)?)),
        Shape::OptionalEntityRef => {
            if json.is_null() {
                Ok(Value::none())
            } else {
                Ok(Value::some(Value::Entity(read_entity_id(type_name, json)?)))
            }
        }
        Shape::Unsupported(reason) => Err(SaveError::NotSerializable {
            type_name: type_name.to_string(),
            reason: reason.to_string(),
        }),
    }
}

fn parse_elements(
    type_name: &str,
    inner: &Shape,
    elements: &[serde_json::Value],
    limits: &Limits,
) -> Result<Value> {
    let mut values = Vec::with_capacity(elements.len());
    for element in elements {
        values.push(parse_value(type_name, inner, element, limits)?);
    }
    Ok(Value::Array(values))
}

fn narrow_signed(number: i64, bits: u32) -> i64 {
    match bits {
        8 => i64::from(number as i8),
        16 => i64::from(number as i16),
        32 => i64::from(number as i32),
        _ => number,
    }
}

fn narrow_unsigned(number: u64, bits: u32) -> u64 {
    match bits {
        8 => u64::from(number as u8),
        16 => u64::from(number as u16),
        32 => u64::from(number as u32),
        _ => number,
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
