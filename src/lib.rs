//! Infer deduplicated TypeScript declarations from JSON samples.
//!
//! ```
//! use json_decl::{Options, json_to_ts};
//! use serde_json::json;
//!
//! let value = json!({ "cats": [{ "name": "Kittin" }, { "name": "Sparkles" }] });
//! let decls = json_to_ts(&value, &Options::default()).unwrap();
//! assert_eq!(decls, [
//!     "interface RootObject {\n  cats: Cat[];\n}",
//!     "interface Cat {\n  name: string;\n}",
//! ]);
//! ```
//!
//! The pipeline is infer → name → resolve → render. Each stage is public so
//! callers can stop early (e.g. to inspect the shape graph or the resolved
//! declaration IR).
pub mod cli;
pub mod codegen;
pub mod error;
pub mod inference;
pub mod ir;
pub mod key;
pub mod lower;
pub mod naming;
pub mod options;
pub mod resolve;
pub mod shape;

use serde_json::Value;

pub use codegen::Codegen;
pub use error::{Error, Result};
pub use inference::{ShapeGraph, infer};
pub use ir::{Declaration, Resolution, TypeRef, Warning};
pub use options::{DeclarationStyle, Options, ReferencePolicy};

/// Infer, name and resolve declarations for `value`.
pub fn declarations(value: &Value, options: &Options) -> Result<Resolution> {
    let graph = infer(value, options)?;
    let naming = naming::assign_names(&graph, &options.root_name);
    resolve::resolve(&graph, &naming, options.references)
}

/// Rendered TypeScript declarations for `value`, root first.
pub fn json_to_ts(value: &Value, options: &Options) -> Result<Vec<String>> {
    let resolution = declarations(value, options)?;
    let mut cg = Codegen::new(options.style);
    cg.emit(&resolution);
    Ok(cg.into_declarations())
}
