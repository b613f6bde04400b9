//! Text emission: save model to RFC-8259 output.

use serde_json::{Map, Number};

use crate::codec::Limits;
use crate::error::{Result, SaveError};
use crate::model::{Record, SaveModel};
use crate::schema::{Shape, Value};
use crate::set::ComponentSet;

/// Emits a save model as text.
///
/// Compact output is whitespace-free; pretty output uses two-space indents
/// with newlines between elements. Both re-emit byte-identically after a
/// re-parse in the same mode.
///
/// # Errors
///
/// Fails when a value does not conform to its registered shape, or when a
/// string or array exceeds the configured limits.
pub(crate) fn write_model(
    model: &SaveModel,
    set: &ComponentSet,
    limits: &Limits,
    pretty: bool,
) -> Result<String> {
    let mut root = Map::new();

    if let Some(meta) = &model.meta {
        root.insert("meta".to_string(), serde_json::to_value(meta)?);
    }

    let mut components = Map::new();
    for (name, records) in &model.components {
        let spec = set
            .get(name)
            .ok_or_else(|| SaveError::UnregisteredComponent(name.clone()))?;
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            match record {
                Record::Tag(id) => entries.push(serde_json::Value::from(*id)),
                Record::Data { entity, value } => {
                    let shape = spec.shape().ok_or_else(|| {
                        SaveError::schema(format!("tag component '{}' carries data", name))
                    })?;
                    let mut object = Map::new();
                    object.insert("entt".to_string(), serde_json::Value::from(*entity));
                    object.insert("data".to_string(), emit_value(name, shape, value, limits)?);
                    entries.push(serde_json::Value::Object(object));
                }
            }
        }
        components.insert(name.clone(), serde_json::Value::Array(entries));
    }
    root.insert(
        "components".to_string(),
        serde_json::Value::Object(components),
    );

    let root = serde_json::Value::Object(root);
    let blob = if pretty {
        serde_json::to_string_pretty(&root)?
    } else {
        serde_json::to_string(&root)?
    };
    Ok(blob)
}

/// Converts one value to its JSON form, walking the shape alongside.
pub(crate) fn emit_value(
    type_name: &str,
    shape: &Shape,
    value: &Value,
    limits: &Limits,
) -> Result<serde_json::Value> {
    match (shape, value) {
        (Shape::Bool, Value::Bool(flag)) => Ok(serde_json::Value::Bool(*flag)),
        (Shape::Int(int), Value::Int(number)) if int.signed => {
            Ok(serde_json::Value::from(*number))
        }
        (Shape::Int(int), Value::UInt(number)) if !int.signed => {
            Ok(serde_json::Value::from(*number))
        }
        (Shape::Int(int), Value::Int(number)) if !int.signed && *number >= 0 => {
            Ok(serde_json::Value::from(*number as u64))
        }
        (Shape::Int(int), Value::UInt(number)) if int.signed && *number <= i64::MAX as u64 => {
            Ok(serde_json::Value::from(*number as i64))
        }
        (Shape::Float(_), Value::F32(number)) => finite_number(f64::from(*number)),
        (Shape::Float(_), Value::F64(number)) => finite_number(*number),
        (Shape::Str, Value::Str(text)) => {
            if text.len() > limits.max_string_len {
                return Err(SaveError::StringTooLong {
                    len: text.len(),
                    max: limits.max_string_len,
                });
            }
            Ok(serde_json::Value::String(text.clone()))
        }
        (Shape::Struct(fields), Value::Struct(values)) => {
            let mut object = Map::new();
            for field in fields {
                let field_value = values
                    .iter()
                    .find(|(name, _)| *name == field.name)
                    .map(|(_, value)| value)
                    .ok_or_else(|| SaveError::missing_field(type_name, field.name))?;
                object.insert(
                    field.name.to_string(),
                    emit_value(type_name, &field.shape, field_value, limits)?,
                );
            }
            Ok(serde_json::Value::Object(object))
        }
        (Shape::FixedArray { len, inner }, Value::Array(elements)) => {
            if elements.len() != *len {
                return Err(SaveError::ArrayLengthMismatch {
                    expected: *len,
                    found: elements.len(),
                });
            }
            emit_elements(type_name, inner, elements, limits)
        }
        (Shape::DynArray(inner), Value::Array(elements)) => {
            if elements.len() > limits.max_array_len {
                return Err(SaveError::ArrayTooLong {
                    len: elements.len(),
                    max: limits.max_array_len,
                });
            }
            emit_elements(type_name, inner, elements, limits)
        }
        (Shape::Optional(inner), Value::Optional(present)) => match present {
            Some(inner_value) => emit_value(type_name, inner, inner_value, limits),
            None => Ok(serde_json::Value::Null),
        },
        (Shape::Enum(shape), Value::Enum(discriminant)) => {
            let variant = shape.variant_by_value(*discriminant).ok_or_else(|| {
                SaveError::InvalidEnumValue(format!(
                    "{}: no variant with value {}",
                    type_name, discriminant
                ))
            })?;
            Ok(serde_json::Value::String(variant.name.to_string()))
        }
        (Shape::Variant(shape), Value::Variant { tag, payload }) => {
            let case = shape.case_by_tag(*tag).ok_or_else(|| {
                SaveError::InvalidUnionTag(format!("{}: no case with tag {}", type_name, tag))
            })?;
            let mut object = Map::new();
            object.insert(
                "tag".to_string(),
                serde_json::Value::String(case.name.to_string()),
            );
            let payload_json = match (&case.shape, payload) {
                (Some(case_shape), Some(payload)) => {
                    emit_value(type_name, case_shape, payload, limits)?
                }
                (None, _) => serde_json::Value::Null,
                (Some(_), None) => {
                    return Err(SaveError::type_mismatch(
                        format!("payload for union case '{}'", case.name),
                        "nothing",
                    ));
                }
            };
            object.insert("value".to_string(), payload_json);
            Ok(serde_json::Value::Object(object))
        }
        (Shape::EntityRef, Value::Entity(id)) => Ok(serde_json::Value::from(*id)),
        (Shape::OptionalEntityRef, Value::Optional(present)) => match present.as_deref() {
            Some(Value::Entity(id)) => Ok(serde_json::Value::from(*id)),
            Some(other) => Err(SaveError::type_mismatch(
                "entity reference",
                other.kind_name(),
            )),
            None => Ok(serde_json::Value::Null),
        },
        (shape, value) => Err(SaveError::type_mismatch(
            shape.kind_name(),
            format!("{} in '{}'", value.kind_name(), type_name),
        )),
    }
}

fn emit_elements(
    type_name: &str,
    inner: &Shape,
    elements: &[Value],
    limits: &Limits,
) -> Result<serde_json::Value> {
    let mut output = Vec::with_capacity(elements.len());
    for element in elements {
        output.push(emit_value(type_name, inner, element, limits)?);
    }
    Ok(serde_json::Value::Array(output))
}

fn finite_number(number: f64) -> Result<serde_json::Value> {
    Number::from_f64(number)
        .map(serde_json::Value::Number)
        .ok_or_else(|| SaveError::invalid_format("non-finite float cannot be written as text"))
}
