//! IDC statement recognizer.
//!
//! An IDC export is a full C-like script, but only a handful of its statements
//! carry facts radare2 can use. Each recognized statement is a call with
//! positional hex/string arguments that occupies one whole line:
//!
//! ```text
//! MakeFunction    (0XF3C99, 0XF3CA8);
//! SetFunctionFlags(0XF3C99, 0x400);
//! MakeName        (0XF3C99, "SIO_port_setup_S");
//! SetType         (0XF3C99, "int __cdecl f(int a)");
//! MakeNameEx      (0xF3CA0, "return", SN_LOCAL);
//! id = AddStrucEx (-1, "struct_MTRR", 0);
//! MakeComm        (0XFED3D, "PCI class 0x600\nHost/PCI bridge");
//! ```
//!
//! Anything else is ignored without error.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::model::{EntityModel, Function, LocalLabel};
use crate::services::convert::ConvertOptions;

/// 1 to 8 hex digits behind a case-insensitive `0x`.
const HEX: &str = r"0[xX][0-9A-Fa-f]{1,8}";

fn call_pattern(prefix: &str, args: &str) -> Regex {
    let pattern = format!(r"^[ \t]*{prefix}[ \t]*\([ \t]*{args}[ \t]*\);[ \t]*$");
    Regex::new(&pattern).expect("statement pattern is valid")
}

static MAKE_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    call_pattern("MakeFunction", &format!(r"(?P<start>{HEX})[ \t]*,[ \t]*(?P<end>{HEX})"))
});

static SET_FUNCTION_FLAGS: Lazy<Regex> = Lazy::new(|| {
    call_pattern("SetFunctionFlags", &format!(r"(?P<start>{HEX})[ \t]*,[ \t]*(?P<flags>{HEX})"))
});

static MAKE_NAME: Lazy<Regex> = Lazy::new(|| {
    call_pattern("MakeName", &format!(r#"(?P<start>{HEX})[ \t]*,[ \t]*"(?P<name>.*)""#))
});

static SET_TYPE: Lazy<Regex> = Lazy::new(|| {
    call_pattern("SetType", &format!(r#"(?P<start>{HEX})[ \t]*,[ \t]*"(?P<signature>.*)""#))
});

static MAKE_LOCAL_NAME: Lazy<Regex> = Lazy::new(|| {
    call_pattern(
        "MakeNameEx",
        &format!(r#"(?P<address>{HEX})[ \t]*,[ \t]*"(?P<name>.*)"[ \t]*,[ \t]*SN_LOCAL"#),
    )
});

static ADD_STRUCT: Lazy<Regex> = Lazy::new(|| {
    call_pattern(r"id[ \t]*=[ \t]*AddStrucEx", r#"-1[ \t]*,[ \t]*"(?P<name>.*)"[ \t]*,[ \t]*0"#)
});

static MAKE_COMMENT: Lazy<Regex> = Lazy::new(|| {
    call_pattern("MakeComm", &format!(r#"(?P<address>{HEX})[ \t]*,[ \t]*"(?P<text>.*)""#))
});

/// One recognized IDC statement with its decoded arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `MakeFunction(start, end)`
    FunctionRange { start: u64, end: u64 },
    /// `SetFunctionFlags(start, flags)`
    FunctionFlags { address: u64, flags: u64 },
    /// `MakeName(start, "name")`
    FunctionName { address: u64, name: String },
    /// `SetType(start, "signature")`
    FunctionType { address: u64, signature: String },
    /// `MakeNameEx(address, "name", SN_LOCAL)`
    LocalLabel { address: u64, name: String },
    /// `id = AddStrucEx(-1, "name", 0)`
    Structure { name: String },
    /// `MakeComm(address, "text")`
    Comment { address: u64, text: String },
}

impl Statement {
    fn is_function_range(&self) -> bool {
        matches!(self, Statement::FunctionRange { .. })
    }

    /// Statements that look up a function (or live inside one) by address.
    fn is_function_refinement(&self) -> bool {
        matches!(
            self,
            Statement::FunctionFlags { .. }
                | Statement::FunctionName { .. }
                | Statement::FunctionType { .. }
                | Statement::LocalLabel { .. }
        )
    }
}

/// Recognize a single line. `None` for anything that is not one of the known shapes.
pub fn parse_statement(line: &str) -> Option<Statement> {
    let line = line.strip_suffix('\r').unwrap_or(line);

    if let Some(caps) = MAKE_FUNCTION.captures(line) {
        return Some(Statement::FunctionRange {
            start: hex_arg(&caps, "start")?,
            end: hex_arg(&caps, "end")?,
        });
    }
    if let Some(caps) = SET_FUNCTION_FLAGS.captures(line) {
        return Some(Statement::FunctionFlags {
            address: hex_arg(&caps, "start")?,
            flags: hex_arg(&caps, "flags")?,
        });
    }
    if let Some(caps) = MAKE_NAME.captures(line) {
        return Some(Statement::FunctionName {
            address: hex_arg(&caps, "start")?,
            name: str_arg(&caps, "name"),
        });
    }
    if let Some(caps) = SET_TYPE.captures(line) {
        return Some(Statement::FunctionType {
            address: hex_arg(&caps, "start")?,
            signature: str_arg(&caps, "signature"),
        });
    }
    if let Some(caps) = MAKE_LOCAL_NAME.captures(line) {
        return Some(Statement::LocalLabel {
            address: hex_arg(&caps, "address")?,
            name: str_arg(&caps, "name"),
        });
    }
    if let Some(caps) = ADD_STRUCT.captures(line) {
        return Some(Statement::Structure { name: str_arg(&caps, "name") });
    }
    if let Some(caps) = MAKE_COMMENT.captures(line) {
        return Some(Statement::Comment {
            address: hex_arg(&caps, "address")?,
            text: str_arg(&caps, "text"),
        });
    }
    None
}

/// Recognize every known statement in `text`, in source order.
pub fn recognize(text: &str) -> Vec<Statement> {
    text.lines().filter_map(parse_statement).collect()
}

/// Recognize `text` and build the entity model it describes.
pub fn parse_idc(text: &str, options: &ConvertOptions) -> EntityModel {
    build_model(&recognize(text), options)
}

/// Apply recognized statements to a fresh model.
///
/// Function ranges are applied before any statement that refines them, so a
/// `MakeName` that precedes its `MakeFunction` in the log still lands.
pub fn build_model(statements: &[Statement], options: &ConvertOptions) -> EntityModel {
    let mut model = EntityModel::new();

    // Enum definitions are not recognized; structures are recorded by name only.
    for statement in statements.iter().filter(|s| matches!(s, Statement::Structure { .. })) {
        apply(&mut model, statement);
    }

    if options.functions {
        for statement in statements.iter().filter(|s| s.is_function_range()) {
            apply(&mut model, statement);
        }
        for statement in statements.iter().filter(|s| s.is_function_refinement()) {
            apply(&mut model, statement);
        }
    }

    if options.comments {
        for statement in statements.iter().filter(|s| matches!(s, Statement::Comment { .. })) {
            apply(&mut model, statement);
        }
    }

    log::info!(
        "recognized {} functions, {} local labels, {} comment lines, {} structures",
        model.functions.len(),
        model.labels.len(),
        model.comments.len(),
        model.structs.len()
    );
    model
}

fn apply(model: &mut EntityModel, statement: &Statement) {
    match statement {
        Statement::FunctionRange { start, end } => match Function::from_range(*start, *end) {
            Some(function) => {
                if model.function_count_at(*start) > 0 {
                    log::debug!("MakeFunction at {start:#x} duplicates an existing range");
                }
                model.push_function(function);
            }
            None => log::debug!("dropping MakeFunction({start:#x}, {end:#x}): end precedes start"),
        },
        Statement::FunctionFlags { address, flags } => {
            // Flag bits are not interpreted yet.
            if model.function_count_at(*address) == 0 {
                log::debug!("SetFunctionFlags({address:#x}, {flags:#x}) has no function");
            }
        }
        Statement::FunctionName { address, name } => {
            if model.set_function_name(*address, name) == 0 {
                log::debug!("MakeName({address:#x}, {name:?}) has no function");
            }
        }
        Statement::FunctionType { address, signature } => {
            if model.set_function_signature(*address, signature) == 0 {
                log::debug!("SetType({address:#x}) has no function");
            }
        }
        Statement::LocalLabel { address, name } => {
            model.push_label(LocalLabel { name: name.clone(), address: *address });
        }
        Statement::Structure { name } => model.push_struct(name.clone()),
        Statement::Comment { address, text } => model.push_multiline_comment(*address, text),
    }
}

fn hex_arg(caps: &Captures<'_>, group: &str) -> Option<u64> {
    let digits = &caps.name(group)?.as_str()[2..];
    u64::from_str_radix(digits, 16).ok()
}

fn str_arg(caps: &Captures<'_>, group: &str) -> String {
    caps.name(group).map(|m| m.as_str().to_string()).unwrap_or_default()
}
