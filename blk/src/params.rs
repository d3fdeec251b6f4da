//! Per-type value extraction from an 8-byte BLK parameter record.
//!
//! Each record packs `name_id` (low 24 bits) and `type_tag` (high 8 bits)
//! into one little-endian u32, followed by a second little-endian u32 that
//! is either an inline value or an offset into `params_data`.

use byteorder::{ByteOrder, LittleEndian};

use crate::block::TypedValue;
use crate::error::{BlkError, Result};

pub struct ParamRecord {
    pub name_id: u32,
    pub type_tag: u8,
    pub payload: u32,
}

impl ParamRecord {
    pub fn unpack(bytes: &[u8; 8]) -> Self {
        let first = LittleEndian::read_u32(&bytes[0..4]);
        let payload = LittleEndian::read_u32(&bytes[4..8]);
        ParamRecord {
            name_id: first & 0x00FF_FFFF,
            type_tag: (first >> 24) as u8,
            payload,
        }
    }
}

fn f32_at(data: &[u8], offset: usize) -> f32 {
    LittleEndian::read_f32(&data[offset..offset + 4])
}

fn i32_at(data: &[u8], offset: usize) -> i32 {
    LittleEndian::read_i32(&data[offset..offset + 4])
}

fn read_vecf(data: &[u8], offset: usize, n: usize) -> Vec<f32> {
    (0..n).map(|i| f32_at(data, offset + i * 4)).collect()
}

fn read_veci(data: &[u8], offset: usize, n: usize) -> Vec<i32> {
    (0..n).map(|i| i32_at(data, offset + i * 4)).collect()
}

/// Decodes a parameter's value given its unpacked record and the shared
/// `params_data` blob that offset-encoded types index into.
pub fn decode_value(record: &ParamRecord, params_data: &[u8]) -> Result<TypedValue> {
    let payload = record.payload;
    let offset = payload as usize;

    let value = match record.type_tag {
        0x01 => {
            let end = params_data[offset..]
                .iter()
                .position(|&b| b == 0)
                .map(|p| offset + p)
                .unwrap_or(params_data.len());
            TypedValue::Str(String::from_utf8_lossy(&params_data[offset..end]).into_owned())
        }
        0x02 => TypedValue::Int32(payload as i32),
        0x03 => TypedValue::Float32(f32::from_bits(payload)),
        0x04 => {
            let v = read_vecf(params_data, offset, 2);
            TypedValue::Vec2([v[0], v[1]])
        }
        0x05 => {
            let v = read_vecf(params_data, offset, 3);
            TypedValue::Vec3([v[0], v[1], v[2]])
        }
        0x06 => {
            let v = read_vecf(params_data, offset, 4);
            TypedValue::Vec4([v[0], v[1], v[2], v[3]])
        }
        0x07 => {
            let v = read_veci(params_data, offset, 2);
            TypedValue::Int2([v[0], v[1]])
        }
        0x08 => {
            let v = read_veci(params_data, offset, 3);
            TypedValue::Int3([v[0], v[1], v[2]])
        }
        0x09 => TypedValue::Bool(payload != 0),
        0x0A => {
            let bytes = payload.to_le_bytes();
            TypedValue::Color(bytes)
        }
        0x0B => {
            let v = read_vecf(params_data, offset, 12);
            let mut arr = [0f32; 12];
            arr.copy_from_slice(&v);
            TypedValue::M4x3(arr)
        }
        0x0C => {
            let bytes = &params_data[offset..offset + 8];
            TypedValue::Int64(LittleEndian::read_i64(bytes))
        }
        0x10 => {
            let bytes = &params_data[offset..offset + 8];
            TypedValue::UInt64(LittleEndian::read_u64(bytes))
        }
        other => return Err(BlkError::UnknownParamType(other)),
    };

    Ok(value)
}
