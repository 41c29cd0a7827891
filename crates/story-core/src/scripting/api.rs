//! # Builder API
//!
//! Registers one overload set per entry of [`NODE_KINDS`]:
//! `node.method()`, `node.method(#{ ... })` and, where the kind has one,
//! the positional shorthand `node.method(value)`.

use super::builder::{Shorthand, NODE_KINDS};
use super::types::NodeHandle;
use rhai::{Dynamic, Engine, Map, FLOAT, INT};

/// Register all builder functions with the Rhai engine.
pub fn register_all(engine: &mut Engine) {
    engine.register_type_with_name::<NodeHandle>("Node");
    engine.register_get("kind", |node: &mut NodeHandle| node.kind());

    for spec in NODE_KINDS {
        engine.register_fn(spec.method, move |node: &mut NodeHandle| {
            node.append(spec, Map::new())
        });
        engine.register_fn(spec.method, move |node: &mut NodeHandle, params: Map| {
            node.append(spec, params)
        });

        match spec.shorthand {
            Shorthand::None => {}
            Shorthand::Text(key) => {
                engine.register_fn(spec.method, move |node: &mut NodeHandle, value: &str| {
                    node.append(spec, single(key, Dynamic::from(value.to_string())))
                });
            }
            Shorthand::Number(key) => {
                engine.register_fn(spec.method, move |node: &mut NodeHandle, value: FLOAT| {
                    node.append(spec, single(key, Dynamic::from_float(value)))
                });
                engine.register_fn(spec.method, move |node: &mut NodeHandle, value: INT| {
                    node.append(spec, single(key, Dynamic::from_float(value as FLOAT)))
                });
            }
        }
    }
}

fn single(key: &str, value: Dynamic) -> Map {
    let mut map = Map::new();
    map.insert(key.into(), value);
    map
}
