//! Binary emission: save model to bytes.
//!
//! Payload encoding by shape:
//!
//! - Bool: one byte, `0` or `1`
//! - Int: the width's byte count, little-endian two's complement
//! - Float: 4 or 8 IEEE-754 bytes, little-endian
//! - Str: u32 length prefix + UTF-8 bytes
//! - Struct: fields in declared order, concatenated
//! - FixedArray: element payloads back-to-back, no prefix
//! - DynArray: u32 length prefix + element payloads
//! - Optional: one presence byte + payload if present
//! - Enum: discriminant in the declared tag width
//! - Variant: u16 case index + payload (void cases emit nothing)
//! - EntityRef: u32

use std::io::Write;

use super::Header;
use crate::codec::Limits;
use crate::error::{Result, SaveError};
use crate::model::{Record, SaveModel};
use crate::schema::{FloatWidth, IntShape, Shape, Value};
use crate::set::ComponentSet;

/// Emits a save model as binary.
///
/// The metadata block is written exactly when the model carries metadata;
/// writer and reader must agree on that through the codec options.
///
/// # Errors
///
/// Fails when a value does not conform to its registered shape, or when a
/// string or array exceeds the configured limits.
pub(crate) fn write_model(
    model: &SaveModel,
    set: &ComponentSet,
    limits: &Limits,
    save_version: u32,
) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();

    Header::new(save_version).write(&mut buffer)?;

    if let Some(meta) = &model.meta {
        buffer.write_all(&meta.timestamp.to_le_bytes())?;
        let game_name = meta.game_name.as_deref().unwrap_or_default();
        write_str(&mut buffer, game_name, limits)?;
    }

    buffer.write_all(&model.distinct_entity_count().to_le_bytes())?;
    buffer.write_all(&(model.components.len() as u32).to_le_bytes())?;

    for (name, records) in &model.components {
        let spec = set
            .get(name)
            .ok_or_else(|| SaveError::UnregisteredComponent(name.clone()))?;

        write_str(&mut buffer, name, limits)?;
        buffer.write_all(&(records.len() as u32).to_le_bytes())?;

        for record in records {
            match record {
                Record::Tag(id) => buffer.write_all(&id.to_le_bytes())?,
                Record::Data { entity, value } => {
                    let shape = spec.shape().ok_or_else(|| {
                        SaveError::schema(format!("tag component '{}' carries data", name))
                    })?;
                    buffer.write_all(&entity.to_le_bytes())?;
                    emit_payload(name, shape, value, limits, &mut buffer)?;
                }
            }
        }
    }

    Ok(buffer)
}

/// Encodes one value, walking the shape alongside.
pub(crate) fn emit_payload(
    type_name: &str,
    shape: &Shape,
    value: &Value,
    limits: &Limits,
    out: &mut Vec<u8>,
) -> Result<()> {
    match (shape, value) {
        (Shape::Bool, Value::Bool(flag)) => out.push(u8::from(*flag)),
        (Shape::Int(int), Value::Int(number)) if int.signed => {
            write_int(out, *int, *number as u64);
        }
        (Shape::Int(int), Value::UInt(number)) if !int.signed => {
            write_int(out, *int, *number);
        }
        (Shape::Int(int), Value::Int(number)) if !int.signed && *number >= 0 => {
            write_int(out, *int, *number as u64);
        }
        (Shape::Int(int), Value::UInt(number)) if int.signed && *number <= i64::MAX as u64 => {
            write_int(out, *int, *number);
        }
        (Shape::Float(FloatWidth::W32), Value::F32(number)) => {
            out.extend_from_slice(&number.to_le_bytes());
        }
        (Shape::Float(FloatWidth::W64), Value::F64(number)) => {
            out.extend_from_slice(&number.to_le_bytes());
        }
        (Shape::Float(FloatWidth::W32), Value::F64(number)) => {
            out.extend_from_slice(&(*number as f32).to_le_bytes());
        }
        (Shape::Float(FloatWidth::W64), Value::F32(number)) => {
            out.extend_from_slice(&f64::from(*number).to_le_bytes());
        }
        (Shape::Str, Value::Str(text)) => write_str(out, text, limits)?,
        (Shape::Struct(fields), Value::Struct(values)) => {
            for field in fields {
                let field_value = values
                    .iter()
                    .find(|(name, _)| *name == field.name)
                    .map(|(_, value)| value)
                    .ok_or_else(|| SaveError::missing_field(type_name, field.name))?;
                emit_payload(type_name, &field.shape, field_value, limits, out)?;
            }
        }
        (Shape::FixedArray { len, inner }, Value::Array(elements)) => {
            if elements.len() != *len {
                return Err(SaveError::ArrayLengthMismatch {
                    expected: *len,
                    found: elements.len(),
                });
            }
            for element in elements {
                emit_payload(type_name, inner, element, limits, out)?;
            }
        }
        (Shape::DynArray(inner), Value::Array(elements)) => {
            if elements.len() > limits.max_array_len {
                return Err(SaveError::ArrayTooLong {
                    len: elements.len(),
                    max: limits.max_array_len,
                });
            }
            out.extend_from_slice(&(elements.len() as u32).to_le_bytes());
            for element in elements {
                emit_payload(type_name, inner, element, limits, out)?;
            }
        }
        (Shape::Optional(inner), Value::Optional(present)) => match present {
            Some(inner_value) => {
                out.push(1);
                emit_payload(type_name, inner, inner_value, limits, out)?;
            }
            None => out.push(0),
        },
        (Shape::Enum(shape), Value::Enum(discriminant)) => {
            if shape.variant_by_value(*discriminant).is_none() {
                return Err(SaveError::InvalidEnumValue(format!(
                    "{}: no variant with value {}",
                    type_name, discriminant
                )));
            }
            write_int(out, shape.tag, *discriminant as u64);
        }
        (Shape::Variant(shape), Value::Variant { tag, payload }) => {
            let case = shape.case_by_tag(*tag).ok_or_else(|| {
                SaveError::InvalidUnionTag(format!("{}: no case with tag {}", type_name, tag))
            })?;
            out.extend_from_slice(&tag.to_le_bytes());
            match (&case.shape, payload) {
                (Some(case_shape), Some(payload)) => {
                    emit_payload(type_name, case_shape, payload, limits, out)?;
                }
                (None, _) => {}
                (Some(_), None) => {
                    return Err(SaveError::type_mismatch(
                        format!("payload for union case '{}'", case.name),
                        "nothing",
                    ));
                }
            }
        }
        (Shape::EntityRef, Value::Entity(id)) => out.extend_from_slice(&id.to_le_bytes()),
        (Shape::OptionalEntityRef, Value::Optional(present)) => match present.as_deref() {
            Some(Value::Entity(id)) => {
                out.push(1);
                out.extend_from_slice(&id.to_le_bytes());
            }
            Some(other) => {
                return Err(SaveError::type_mismatch(
                    "entity reference",
                    other.kind_name(),
                ));
            }
            None => out.push(0),
        },
        (shape, value) => {
            return Err(SaveError::type_mismatch(
                shape.kind_name(),
                format!("{} in '{}'", value.kind_name(), type_name),
            ));
        }
    }
    Ok(())
}

/// Writes the low bytes of `number` for the declared width.
///
/// Two's complement truncation makes this correct for signed values too.
fn write_int(out: &mut Vec<u8>, int: IntShape, number: u64) {
    let bytes = number.to_le_bytes();
    out.extend_from_slice(&bytes[..int.width.bytes()]);
}

fn write_str(out: &mut Vec<u8>, text: &str, limits: &Limits) -> Result<()> {
    if text.len() > limits.max_string_len {
        return Err(SaveError::StringTooLong {
            len: text.len(),
            max: limits.max_string_len,
        });
    }
    out.extend_from_slice(&(text.len() as u32).to_le_bytes());
    out.extend_from_slice(text.as_bytes());
    Ok(())
}
