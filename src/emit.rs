// Copyright (c) Facebook, Inc. and its affiliates
// SPDX-License-Identifier: MIT OR Apache-2.0

//!
//! Jsonnet source writer for the document model.
//! Output follows the layout of jsonnetfmt: two space indentation, single
//! quoted strings, `|||` text blocks for multi-line strings and a trailing
//! comma after every object field.
//!
use crate::config::JSONNET_RESERVED_WORDS;
use crate::document::{Document, Key, Node};
use serde_generate::indent::{IndentConfig, IndentedWriter};
use std::io::{Result, Write};

/// Calls with more arguments than this are written one argument per line.
const MAX_INLINE_CALL_ARGS: usize = 3;

/// Writes documents as Jsonnet source.
pub struct CodeGenerator {
    /// Number of spaces per indentation level.
    indent: usize,
}

/// Shared state for writing one Jsonnet source file.
struct JsonnetEmitter<T> {
    out: IndentedWriter<T>,
    indent: usize,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self { indent: 2 }
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Write the document as Jsonnet source.
    pub fn output(&self, out: &mut dyn Write, doc: &Document) -> crate::error::Result<()> {
        let mut emitter = JsonnetEmitter {
            out: IndentedWriter::new(out, IndentConfig::Space(self.indent)),
            indent: self.indent,
        };
        emitter.output_document(doc)?;
        Ok(())
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Jsonnet source of `doc` with the default layout.
pub fn to_string(doc: &Document) -> crate::error::Result<String> {
    let mut buf = Vec::new();
    CodeGenerator::new().output(&mut buf, doc)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !JSONNET_RESERVED_WORDS.contains(&name)
}

/// Single quoted Jsonnet string literal.
pub fn quote_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            c if (c as u32) < 0x20 => quoted.push_str(&format!("\\u{:04x}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

/// Object key, quoted unless it is a plain identifier.
pub fn quote_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        quote_string(name)
    }
}

/// Whether `value` survives a round trip through a `|||` text block.
fn fits_text_block(value: &str) -> bool {
    if !value.contains('\n') || !value.ends_with('\n') {
        return false;
    }
    if value.starts_with(|c: char| c.is_whitespace()) {
        return false;
    }
    value.lines().all(|line| {
        !line.ends_with(|c: char| c.is_whitespace())
            && !line.trim_start().starts_with("|||")
            && !line.chars().any(|c| c.is_control() && c != '\t')
    })
}

fn is_multiline(node: &Node) -> bool {
    match node.unwrap_markers() {
        Node::Object { fields, .. } => !fields.is_empty(),
        Node::Call { args, .. } => args.len() > MAX_INLINE_CALL_ARGS || args.iter().any(is_multiline),
        Node::String { value, .. } => fits_text_block(value),
        Node::List { items, .. } => items.iter().any(is_multiline),
        Node::Conditional {
            cond,
            then,
            otherwise,
            ..
        } => is_multiline(cond) || is_multiline(then) || is_multiline(otherwise),
        Node::Function { body, large, .. } => *large || is_multiline(body),
        _ => false,
    }
}

impl<T> JsonnetEmitter<T>
where
    T: Write,
{
    fn output_document(&mut self, doc: &Document) -> Result<()> {
        for local in &doc.locals {
            let binding = local.unwrap_markers();
            write!(self.out, "local {} = ", binding.name())?;
            self.output_expr(binding)?;
            writeln!(self.out, ";")?;
        }
        match doc.root.unwrap_markers() {
            Node::Import { path, .. } => write!(self.out, "(import {})", quote_string(path))?,
            root => self.output_expr(root)?,
        }
        writeln!(self.out)
    }

    fn output_field(&mut self, field: &Node) -> Result<()> {
        let separator = match (field.is_merge(), field.is_hidden()) {
            (true, true) => "+::",
            (false, true) => "::",
            (true, false) => "+:",
            (false, false) => ":",
        };
        match field.unwrap_markers() {
            Node::Function {
                name,
                args,
                body,
                large,
            } => {
                write!(self.out, "{}", quote_key(name))?;
                self.output_params(args, *large)?;
                write!(self.out, "{} ", separator)?;
                self.output_expr(body)?;
            }
            Node::Object {
                key: Key::Computed(reference),
                fields,
            } => {
                write!(self.out, "[{}]{} ", reference, separator)?;
                self.output_object(fields)?;
            }
            inner => {
                write!(self.out, "{}{} ", quote_key(inner.name()), separator)?;
                self.output_expr(inner)?;
            }
        }
        writeln!(self.out, ",")
    }

    fn output_object(&mut self, fields: &[Node]) -> Result<()> {
        if fields.is_empty() {
            return write!(self.out, "{{}}");
        }
        writeln!(self.out, "{{")?;
        self.out.indent();
        for field in fields {
            self.output_field(field)?;
        }
        self.out.unindent();
        write!(self.out, "}}")
    }

    fn output_params(&mut self, params: &[Node], large: bool) -> Result<()> {
        if !large || params.is_empty() {
            write!(self.out, "(")?;
            for (i, param) in params.iter().enumerate() {
                if i > 0 {
                    write!(self.out, ", ")?;
                }
                self.output_param(param)?;
            }
            return write!(self.out, ")");
        }
        writeln!(self.out, "(")?;
        self.out.indent();
        for param in params {
            self.output_param(param)?;
            writeln!(self.out, ",")?;
        }
        self.out.unindent();
        write!(self.out, ")")
    }

    fn output_param(&mut self, param: &Node) -> Result<()> {
        write!(self.out, "{}", param.name())?;
        if param.is_required() {
            return Ok(());
        }
        write!(self.out, "=")?;
        self.output_expr(param.unwrap_markers())
    }

    fn output_arg(&mut self, arg: &Node) -> Result<()> {
        if !arg.name().is_empty() {
            write!(self.out, "{}=", arg.name())?;
        }
        self.output_expr(arg)
    }

    fn output_call(&mut self, func: &str, args: &[Node]) -> Result<()> {
        write!(self.out, "{}(", func)?;
        if args.len() > MAX_INLINE_CALL_ARGS || args.iter().any(is_multiline) {
            writeln!(self.out)?;
            self.out.indent();
            for arg in args {
                self.output_arg(arg)?;
                writeln!(self.out, ",")?;
            }
            self.out.unindent();
        } else {
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    write!(self.out, ", ")?;
                }
                self.output_arg(arg)?;
            }
        }
        write!(self.out, ")")
    }

    fn output_list(&mut self, items: &[Node]) -> Result<()> {
        if !items.iter().any(is_multiline) {
            write!(self.out, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(self.out, ", ")?;
                }
                self.output_expr(item)?;
            }
            return write!(self.out, "]");
        }
        writeln!(self.out, "[")?;
        self.out.indent();
        for item in items {
            self.output_expr(item)?;
            writeln!(self.out, ",")?;
        }
        self.out.unindent();
        write!(self.out, "]")
    }

    fn output_string(&mut self, value: &str) -> Result<()> {
        if !fits_text_block(value) {
            return write!(self.out, "{}", quote_string(value));
        }
        writeln!(self.out, "|||")?;
        let text = textwrap::indent(value, &" ".repeat(self.indent));
        write!(self.out, "{}", text)?;
        write!(self.out, "|||")
    }

    fn output_expr(&mut self, node: &Node) -> Result<()> {
        match node.unwrap_markers() {
            Node::Object { fields, .. } => self.output_object(fields),
            Node::Function {
                args, body, large, ..
            } => {
                write!(self.out, "function")?;
                self.output_params(args, *large)?;
                write!(self.out, " ")?;
                self.output_expr(body)
            }
            Node::Call { func, args, .. } => self.output_call(func, args),
            Node::Reference { target, .. } => write!(self.out, "{}", target),
            Node::String { value, .. } => self.output_string(value),
            Node::Null { .. } => write!(self.out, "null"),
            Node::List { items, .. } => self.output_list(items),
            Node::Conditional {
                cond,
                then,
                otherwise,
                ..
            } => {
                write!(self.out, "if ")?;
                self.output_expr(cond)?;
                write!(self.out, " then ")?;
                self.output_expr(then)?;
                write!(self.out, " else ")?;
                self.output_expr(otherwise)
            }
            Node::Import { path, .. } => write!(self.out, "import {}", quote_string(path)),
            // unwrap_markers never returns a marker
            Node::Local(_) | Node::Merge(_) | Node::Required(_) | Node::Hidden(_) => Ok(()),
        }
    }
}
