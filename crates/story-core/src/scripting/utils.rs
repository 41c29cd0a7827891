//! # Scripting Utilities
//!
//! Conversion helpers for Rhai bindings.
//!
//! ## Responsibilities
//! - **Color Parsing**: `parse_hex_color`, `decode_color` (hex or CSS name to `0xRRGGBB`)
//! - **Numbers**: `dynamic_to_f64` accepting both Rhai `INT` and `FLOAT`
//! - **Vectors**: `array_to_vec3` / `vec3_to_array`, `array_to_mat4` / `mat4_to_array`

use glam::{DMat4, DVec3};
use rhai::{Array, Dynamic, EvalAltResult, FLOAT, INT};

pub type ScriptResult<T> = Result<T, Box<EvalAltResult>>;

/// Helper to parse hex strings like "#RRGGBB" or "#RGB"
pub fn parse_hex_color(hex: &str) -> Option<u32> {
    let hex = hex.trim_start_matches('#');
    // Byte slicing below needs single-byte chars.
    if !hex.is_ascii() {
        return None;
    }
    let (r, g, b) = match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            (r, g, b)
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
            (r * 17, g * 17, b * 17)
        }
        _ => return None,
    };

    Some(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
}

const NAMED_COLORS: &[(&str, u32)] = &[
    ("black", 0x000000),
    ("white", 0xffffff),
    ("red", 0xff0000),
    ("green", 0x008000),
    ("lime", 0x00ff00),
    ("blue", 0x0000ff),
    ("yellow", 0xffff00),
    ("cyan", 0x00ffff),
    ("magenta", 0xff00ff),
    ("orange", 0xffa500),
    ("purple", 0x800080),
    ("pink", 0xffc0cb),
    ("brown", 0xa52a2a),
    ("gray", 0x808080),
    ("grey", 0x808080),
    ("silver", 0xc0c0c0),
    ("gold", 0xffd700),
    ("teal", 0x008080),
    ("navy", 0x000080),
    ("maroon", 0x800000),
    ("olive", 0x808000),
    ("salmon", 0xfa8072),
    ("tomato", 0xff6347),
    ("skyblue", 0x87ceeb),
    ("steelblue", 0x4682b4),
    ("forestgreen", 0x228b22),
    ("crimson", 0xdc143c),
];

/// Decodes `#rgb`, `#rrggbb` or a CSS colour name (case-insensitive).
pub fn decode_color(value: &str) -> Option<u32> {
    let value = value.trim();
    if value.starts_with('#') {
        return parse_hex_color(value);
    }
    let lower = value.to_ascii_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, rgb)| *rgb)
}

pub fn color_to_hex(rgb: u32) -> String {
    format!("#{:06x}", rgb & 0xffffff)
}

pub fn dynamic_to_f64(value: &Dynamic) -> Option<f64> {
    if let Ok(f) = value.as_float() {
        return Some(f as f64);
    }
    value.as_int().ok().map(|i: INT| i as f64)
}

fn numbers(values: &Array, len: usize, what: &str) -> ScriptResult<Vec<f64>> {
    if values.len() != len {
        return Err(format!("{} expects {} numbers, got {}", what, len, values.len()).into());
    }
    values
        .iter()
        .map(|v| {
            dynamic_to_f64(v).ok_or_else(|| -> Box<EvalAltResult> {
                format!("{} expects numbers, got {}", what, v.type_name()).into()
            })
        })
        .collect()
}

pub fn array_to_vec3(values: &Array) -> ScriptResult<DVec3> {
    let n = numbers(values, 3, "Vec3")?;
    Ok(DVec3::new(n[0], n[1], n[2]))
}

pub fn vec3_to_array(v: DVec3) -> Array {
    v.to_array().iter().map(|x| Dynamic::from(*x as FLOAT)).collect()
}

/// Matrices travel as flat column-major arrays of 16 numbers.
pub fn array_to_mat4(values: &Array) -> ScriptResult<DMat4> {
    let n = numbers(values, 16, "Mat4")?;
    let mut cols = [0.0; 16];
    cols.copy_from_slice(&n);
    Ok(DMat4::from_cols_array(&cols))
}

pub fn mat4_to_array(m: DMat4) -> Array {
    m.to_cols_array()
        .iter()
        .map(|x| Dynamic::from(*x as FLOAT))
        .collect()
}
