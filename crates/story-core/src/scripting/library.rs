//! # Script Library
//!
//! Named helper values injected into every scene script.
//!
//! ## Responsibilities
//! - **Modules**: registered as static modules, so `Vec3::cross(a, b)` resolves by name
//! - **Constants**: pushed into the scope under their own identifier
//! - **Standard set**: `Vec3`, `Mat4`, `Color`

use super::utils::{ScriptResult, array_to_mat4, array_to_vec3, color_to_hex, decode_color, dynamic_to_f64, mat4_to_array, vec3_to_array};
use glam::{DMat4, DVec3};
use rhai::{Array, Dynamic, Engine, Module, Scope, Shared, FLOAT, INT};
use std::collections::BTreeMap;

/// The library namespace scripts see.
#[derive(Clone, Default)]
pub struct ScriptLibrary {
    modules: BTreeMap<String, Shared<Module>>,
    constants: BTreeMap<String, Dynamic>,
}

impl ScriptLibrary {
    /// A library with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `Vec3`, `Mat4` and `Color`.
    pub fn standard() -> Self {
        Self::empty()
            .with_module("Vec3", create_vec3_api())
            .with_module("Mat4", create_mat4_api())
            .with_module("Color", create_color_api())
    }

    pub fn with_module(mut self, name: impl Into<String>, module: Module) -> Self {
        self.modules.insert(name.into(), Shared::new(module));
        self
    }

    pub fn with_constant(mut self, name: impl Into<String>, value: Dynamic) -> Self {
        self.constants.insert(name.into(), value);
        self
    }

    /// Every identifier this library injects.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules
            .keys()
            .chain(self.constants.keys())
            .map(String::as_str)
    }

    pub(crate) fn install(&self, engine: &mut Engine) {
        for (name, module) in &self.modules {
            engine.register_static_module(name.as_str(), module.clone());
        }
    }

    pub(crate) fn bind(&self, scope: &mut Scope<'_>) {
        for (name, value) in &self.constants {
            scope.push_constant_dynamic(name.clone(), value.clone());
        }
    }
}

fn number(value: &Dynamic, what: &str) -> ScriptResult<f64> {
    dynamic_to_f64(value).ok_or_else(|| format!("{} expects a number, got {}", what, value.type_name()).into())
}

/// Creates the `Vec3` module. Vectors are arrays of three floats.
pub fn create_vec3_api() -> Module {
    let mut module = Module::new();

    module.set_native_fn("create", |x: Dynamic, y: Dynamic, z: Dynamic| -> ScriptResult<Array> {
        let v = DVec3::new(number(&x, "Vec3::create")?, number(&y, "Vec3::create")?, number(&z, "Vec3::create")?);
        Ok(vec3_to_array(v))
    });
    module.set_native_fn("zero", || Ok(vec3_to_array(DVec3::ZERO)));
    module.set_native_fn("add", |a: Array, b: Array| -> ScriptResult<Array> {
        Ok(vec3_to_array(array_to_vec3(&a)? + array_to_vec3(&b)?))
    });
    module.set_native_fn("sub", |a: Array, b: Array| -> ScriptResult<Array> {
        Ok(vec3_to_array(array_to_vec3(&a)? - array_to_vec3(&b)?))
    });
    module.set_native_fn("scale", |a: Array, s: Dynamic| -> ScriptResult<Array> {
        Ok(vec3_to_array(array_to_vec3(&a)? * number(&s, "Vec3::scale")?))
    });
    module.set_native_fn("dot", |a: Array, b: Array| -> ScriptResult<FLOAT> {
        Ok(array_to_vec3(&a)?.dot(array_to_vec3(&b)?) as FLOAT)
    });
    module.set_native_fn("cross", |a: Array, b: Array| -> ScriptResult<Array> {
        Ok(vec3_to_array(array_to_vec3(&a)?.cross(array_to_vec3(&b)?)))
    });
    module.set_native_fn("length", |a: Array| -> ScriptResult<FLOAT> {
        Ok(array_to_vec3(&a)?.length() as FLOAT)
    });
    module.set_native_fn("distance", |a: Array, b: Array| -> ScriptResult<FLOAT> {
        Ok(array_to_vec3(&a)?.distance(array_to_vec3(&b)?) as FLOAT)
    });
    module.set_native_fn("normalize", |a: Array| -> ScriptResult<Array> {
        Ok(vec3_to_array(array_to_vec3(&a)?.normalize_or_zero()))
    });
    module.set_native_fn("lerp", |a: Array, b: Array, t: Dynamic| -> ScriptResult<Array> {
        let t = number(&t, "Vec3::lerp")?;
        Ok(vec3_to_array(array_to_vec3(&a)?.lerp(array_to_vec3(&b)?, t)))
    });

    module
}

/// Creates the `Mat4` module. Matrices are flat column-major arrays of 16 floats.
pub fn create_mat4_api() -> Module {
    let mut module = Module::new();

    module.set_native_fn("identity", || Ok(mat4_to_array(DMat4::IDENTITY)));
    module.set_native_fn("translation", |v: Array| -> ScriptResult<Array> {
        Ok(mat4_to_array(DMat4::from_translation(array_to_vec3(&v)?)))
    });
    module.set_native_fn("scaling", |v: Array| -> ScriptResult<Array> {
        Ok(mat4_to_array(DMat4::from_scale(array_to_vec3(&v)?)))
    });
    module.set_native_fn("rotation", |axis: Array, angle: Dynamic| -> ScriptResult<Array> {
        let axis = array_to_vec3(&axis)?.normalize_or_zero();
        if axis == DVec3::ZERO {
            return Err("Mat4::rotation needs a non-zero axis".into());
        }
        Ok(mat4_to_array(DMat4::from_axis_angle(axis, number(&angle, "Mat4::rotation")?)))
    });
    module.set_native_fn("multiply", |a: Array, b: Array| -> ScriptResult<Array> {
        Ok(mat4_to_array(array_to_mat4(&a)? * array_to_mat4(&b)?))
    });
    module.set_native_fn("transform_point", |m: Array, p: Array| -> ScriptResult<Array> {
        Ok(vec3_to_array(array_to_mat4(&m)?.transform_point3(array_to_vec3(&p)?)))
    });

    module
}

/// Creates the `Color` module. Colours are `0xRRGGBB` integers.
pub fn create_color_api() -> Module {
    let mut module = Module::new();

    module.set_native_fn("decode", |value: &str| -> ScriptResult<INT> {
        decode_color(value)
            .map(|rgb| rgb as INT)
            .ok_or_else(|| format!("Unknown colour: {}", value).into())
    });
    module.set_native_fn("hex", |rgb: INT| Ok(color_to_hex(rgb as u32)));
    module.set_native_fn("rgb", |r: INT, g: INT, b: INT| {
        let clamp = |c: INT| c.clamp(0, 255);
        Ok((clamp(r) << 16) | (clamp(g) << 8) | clamp(b))
    });

    module
}
