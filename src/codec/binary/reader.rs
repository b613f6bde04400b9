//! Binary parsing: bytes to save model.

use std::io::Read;

use super::Header;
use crate::codec::Limits;
use crate::error::{Result, SaveError};
use crate::model::{Record, SaveMeta, SaveModel};
use crate::schema::{FloatWidth, IntShape, IntWidth, Shape, Value};
use crate::set::ComponentSet;

/// Parses a binary blob into the save model.
///
/// `expect_meta` must match the writer's configuration: the metadata block
/// carries no on-wire presence flag. The save version always comes from
/// the header, so version gating works either way.
///
/// # Errors
///
/// Fails on a bad magic, a newer format revision, an unregistered type
/// name (binary payloads are not self-delimiting, so unknown types cannot
/// be skipped), a payload that does not conform to its shape, or a string
/// or array exceeding the configured limits.
pub(crate) fn read_model(
    bytes: &[u8],
    set: &ComponentSet,
    limits: &Limits,
    expect_meta: bool,
) -> Result<SaveModel> {
    let mut reader = bytes;
    let header = Header::read(&mut reader)?;

    let meta = if expect_meta {
        let timestamp = i64::from_le_bytes(read_array(&mut reader)?);
        let game_name = read_str(&mut reader, limits)?;
        Some(SaveMeta {
            version: header.save_version,
            lib_version: String::new(),
            timestamp,
            game_name: (!game_name.is_empty()).then_some(game_name),
            checksum: None,
        })
    } else {
        Some(SaveMeta {
            version: header.save_version,
            lib_version: String::new(),
            timestamp: 0,
            game_name: None,
            checksum: None,
        })
    };

    // Distinct entity count is informational; the remap pass recomputes it.
    let _entity_count = u32::from_le_bytes(read_array(&mut reader)?);
    let type_count = u32::from_le_bytes(read_array(&mut reader)?);

    let mut components = Vec::with_capacity(type_count as usize);
    for _ in 0..type_count {
        let name = read_str(&mut reader, limits)?;
        let spec = set
            .get(&name)
            .ok_or_else(|| SaveError::UnregisteredComponent(name.clone()))?;

        let instance_count = u32::from_le_bytes(read_array(&mut reader)?);
        let mut records = Vec::with_capacity(instance_count as usize);
        for _ in 0..instance_count {
            let entity = u32::from_le_bytes(read_array(&mut reader)?);
            if spec.is_tag() {
                records.push(Record::Tag(entity));
            } else {
                let shape = spec.shape().ok_or_else(|| {
                    SaveError::schema(format!("data component '{}' has no shape", name))
                })?;
                let value = parse_payload(&name, shape, limits, &mut reader)?;
                records.push(Record::Data { entity, value });
            }
        }
        components.push((name, records));
    }

    Ok(SaveModel { meta, components })
}

/// Decodes one value, walking the shape.
pub(crate) fn parse_payload(
    type_name: &str,
    shape: &Shape,
    limits: &Limits,
    reader: &mut &[u8],
) -> Result<Value> {
    match shape {
        Shape::Bool => match read_array::<1>(reader)?[0] {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            other => Err(SaveError::invalid_format(format!(
                "{}: bool byte must be 0 or 1, found {}",
                type_name, other
            ))),
        },
        Shape::Int(int) => {
            let raw = read_int(reader, *int)?;
            Ok(if int.signed {
                Value::Int(raw as i64)
            } else {
                Value::UInt(raw)
            })
        }
        Shape::Float(FloatWidth::W32) => {
            Ok(Value::F32(f32::from_le_bytes(read_array(reader)?)))
        }
        Shape::Float(FloatWidth::W64) => {
            Ok(Value::F64(f64::from_le_bytes(read_array(reader)?)))
        }
        Shape::Str => Ok(Value::Str(read_str(reader, limits)?)),
        Shape::Struct(fields) => {
            let mut values = Vec::with_capacity(fields.len());
            for field in fields {
                values.push((
                    field.name,
                    parse_payload(type_name, &field.shape, limits, reader)?,
                ));
            }
            Ok(Value::Struct(values))
        }
        Shape::FixedArray { len, inner } => {
            let mut elements = Vec::with_capacity(*len);
            for _ in 0..*len {
                elements.push(parse_payload(type_name, inner, limits, reader)?);
            }
            Ok(Value::Array(elements))
        }
        Shape::DynArray(inner) => {
            let len = u32::from_le_bytes(read_array(reader)?) as usize;
            if len > limits.max_array_len {
                return Err(SaveError::ArrayTooLong {
                    len,
                    max: limits.max_array_len,
                });
            }
            let mut elements = Vec::with_capacity(len.min(4096));
            for _ in 0..len {
                elements.push(parse_payload(type_name, inner, limits, reader)?);
            }
            Ok(Value::Array(elements))
        }
        Shape::Optional(inner) => match read_presence(type_name, reader)? {
            true => Ok(Value::some(parse_payload(type_name, inner, limits, reader)?)),
            false => Ok(Value::none()),
        },
        Shape::Enum(shape) => {
            // read_int already sign-extended signed tags.
            let discriminant = read_int(reader, shape.tag)? as i64;
            if shape.variant_by_value(discriminant).is_none() {
                return Err(SaveError::InvalidEnumValue(format!(
                    "{}: no variant with value {}",
                    type_name, discriminant
                )));
            }
            Ok(Value::Enum(discriminant))
        }
        Shape::Variant(shape) => {
            let tag = u16::from_le_bytes(read_array(reader)?);
            let case = shape.case_by_tag(tag).ok_or_else(|| {
                SaveError::InvalidUnionTag(format!("{}: no case with tag {}", type_name, tag))
            })?;
            let payload = match &case.shape {
                Some(case_shape) => Some(Box::new(parse_payload(
                    type_name, case_shape, limits, reader,
                )?)),
                None => None,
            };
            Ok(Value::Variant { tag, payload })
        }
        Shape::EntityRef => Ok(Value::Entity(u32::from_le_bytes(read_array(reader)?))),
        Shape::OptionalEntityRef => match read_presence(type_name, reader)? {
            true => Ok(Value::some(Value::Entity(u32::from_le_bytes(read_array(
                reader,
            )?)))),
            false => Ok(Value::none()),
        },
        Shape::Unsupported(reason) => Err(SaveError::NotSerializable {
            type_name: type_name.to_string(),
            reason: reason.to_string(),
        }),
    }
}

/// Reads a fixed-size array, mapping truncation to a format error.
fn read_array<const N: usize>(reader: &mut &[u8]) -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    reader
        .read_exact(&mut bytes)
        .map_err(|_| SaveError::invalid_format("unexpected end of save data"))?;
    Ok(bytes)
}

/// Reads an integer of the declared width, sign-extending signed values.
fn read_int(reader: &mut &[u8], int: IntShape) -> Result<u64> {
    Ok(match (int.signed, int.width) {
        (true, IntWidth::W8) => i8::from_le_bytes(read_array(reader)?) as i64 as u64,
        (true, IntWidth::W16) => i16::from_le_bytes(read_array(reader)?) as i64 as u64,
        (true, IntWidth::W32) => i32::from_le_bytes(read_array(reader)?) as i64 as u64,
        (true, IntWidth::W64) => i64::from_le_bytes(read_array(reader)?) as u64,
        (false, IntWidth::W8) => u64::from(u8::from_le_bytes(read_array(reader)?)),
        (false, IntWidth::W16) => u64::from(u16::from_le_bytes(read_array(reader)?)),
        (false, IntWidth::W32) => u64::from(u32::from_le_bytes(read_array(reader)?)),
        (false, IntWidth::W64) => u64::from_le_bytes(read_array(reader)?),
    })
}

fn read_presence(type_name: &str, reader: &mut &[u8]) -> Result<bool> {
    match read_array::<1>(reader)?[0] {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(SaveError::invalid_format(format!(
            "{}: presence byte must be 0 or 1, found {}",
            type_name, other
        ))),
    }
}

fn read_str(reader: &mut &[u8], limits: &Limits) -> Result<String> {
    let len = u32::from_le_bytes(read_array(reader)?) as usize;
    if len > limits.max_string_len {
        return Err(SaveError::StringTooLong {
            len,
            max: limits.max_string_len,
        });
    }
    if reader.len() < len {
        return Err(SaveError::invalid_format("unexpected end of save data"));
    }
    let (bytes, rest) = reader.split_at(len);
    let text = String::from_utf8(bytes.to_vec())
        .map_err(|_| SaveError::invalid_format("string is not valid UTF-8"))?;
    *reader = rest;
    Ok(text)
}
