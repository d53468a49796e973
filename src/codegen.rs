//! TypeScript rendering of resolved declarations.
use std::fmt::Write as _;

use crate::ir::{Declaration, FieldKind, Resolution};
use crate::key::display_key;
use crate::options::DeclarationStyle;

const INDENT: &str = "  ";

pub struct Codegen {
    style: DeclarationStyle,
    out: Vec<String>,
}

impl Codegen {
    pub fn new(style: DeclarationStyle) -> Self {
        Self { style, out: Vec::new() }
    }

    /// Render every declaration of `resolution`, in order.
    pub fn emit(&mut self, resolution: &Resolution) {
        for decl in &resolution.declarations {
            let parent = resolution.subclasses.get(&decl.name).map(String::as_str);
            let src = self.render(decl, parent);
            self.out.push(src);
        }
    }

    fn render(&self, decl: &Declaration, parent: Option<&str>) -> String {
        let mut src = String::new();
        match (self.style, parent) {
            (DeclarationStyle::Interface, _) => {
                let _ = writeln!(src, "interface {} {{", decl.name);
            }
            (DeclarationStyle::Class, None) => {
                let _ = writeln!(src, "class {} {{", decl.name);
            }
            (DeclarationStyle::Class, Some(parent)) => {
                let _ = writeln!(src, "class {} extends {parent} {{", decl.name);
            }
        }
        for field in &decl.fields {
            // the relation is carried by `extends` on the child instead
            if self.style == DeclarationStyle::Class && field.kind == FieldKind::Subclass {
                continue;
            }
            let marker = if field.optional { "?" } else { "" };
            let _ = writeln!(src, "{INDENT}{}{marker}: {};", display_key(&field.key), field.ty);
        }
        src.push('}');
        src
    }

    /// One rendered declaration per entry.
    pub fn into_declarations(self) -> Vec<String> {
        self.out
    }

    pub fn into_string(self) -> String {
        self.out.join("\n")
    }
}
