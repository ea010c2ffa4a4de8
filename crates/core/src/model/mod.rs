//! Entity model (IR) extracted from an IDC log.
//!
//! Every entity is keyed by its address. Records are only ever appended or
//! refined while a log is parsed; nothing is removed.

use serde::{Deserialize, Serialize};

/// Name carried by a function until a naming statement refines it.
pub const DEFAULT_FUNCTION_NAME: &str = "unknown";

/// A function boundary recorded by `MakeFunction`, refined by `MakeName` / `SetType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub address: u64,
    pub size: u64,
    /// Opaque C-like signature text, empty when no `SetType` matched.
    pub signature: String,
}

impl Function {
    /// Create an unnamed function covering `[start, end)`.
    ///
    /// Returns `None` when `end` lies before `start`.
    pub fn from_range(start: u64, end: u64) -> Option<Self> {
        let size = end.checked_sub(start)?;
        Some(Self {
            name: DEFAULT_FUNCTION_NAME.to_string(),
            address: start,
            size,
            signature: String::new(),
        })
    }

    /// Whether a naming statement has touched this function.
    pub fn is_named(&self) -> bool {
        self.name != DEFAULT_FUNCTION_NAME
    }

    /// Open-interval containment: both boundaries are excluded.
    pub fn strictly_contains(&self, address: u64) -> bool {
        address > self.address && (address as u128) < self.address as u128 + self.size as u128
    }
}

/// A label scoped to the function that contains it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalLabel {
    pub name: String,
    pub address: u64,
}

/// One line of a (possibly multi-line) comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub address: u64,
}

/// Named aggregate type. Members are kept for forward compatibility and are
/// never populated from a log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Struct {
    pub name: String,
    pub members: Vec<String>,
}

/// Named enumeration; see [`Struct`] regarding members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enum {
    pub name: String,
    pub members: Vec<String>,
}

/// Named union; see [`Struct`] regarding members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Union {
    pub name: String,
    pub members: Vec<String>,
}

/// Registry of everything recognized during one conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityModel {
    pub functions: Vec<Function>,
    pub labels: Vec<LocalLabel>,
    pub comments: Vec<Comment>,
    pub structs: Vec<Struct>,
    pub enums: Vec<Enum>,
    pub unions: Vec<Union>,
}

impl EntityModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a function record. Existing records at the same address are kept.
    pub fn push_function(&mut self, function: Function) {
        self.functions.push(function);
    }

    /// Rename every function starting at `address`; returns how many were updated.
    pub fn set_function_name(&mut self, address: u64, name: &str) -> usize {
        let mut updated = 0;
        for function in self.functions_at_mut(address) {
            function.name = name.to_string();
            updated += 1;
        }
        updated
    }

    /// Attach a raw signature to every function starting at `address`.
    pub fn set_function_signature(&mut self, address: u64, signature: &str) -> usize {
        let mut updated = 0;
        for function in self.functions_at_mut(address) {
            function.signature = signature.to_string();
            updated += 1;
        }
        updated
    }

    /// Number of functions starting at `address`.
    pub fn function_count_at(&self, address: u64) -> usize {
        self.functions.iter().filter(|f| f.address == address).count()
    }

    pub fn push_label(&mut self, label: LocalLabel) {
        self.labels.push(label);
    }

    /// Split `text` on the two-character `\n` escape and record one comment per
    /// segment, in order, all sharing `address`.
    pub fn push_multiline_comment(&mut self, address: u64, text: &str) {
        for line in text.split("\\n") {
            self.comments.push(Comment { text: line.to_string(), address });
        }
    }

    pub fn push_struct(&mut self, name: impl Into<String>) {
        self.structs.push(Struct { name: name.into(), members: Vec::new() });
    }

    /// First function whose open interval contains `address`.
    ///
    /// Linear scan; fine for the few thousand functions an IDC export holds.
    pub fn containing_function(&self, address: u64) -> Option<&Function> {
        self.functions.iter().find(|f| f.strictly_contains(address))
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
            && self.labels.is_empty()
            && self.comments.is_empty()
            && self.structs.is_empty()
            && self.enums.is_empty()
            && self.unions.is_empty()
    }

    fn functions_at_mut(&mut self, address: u64) -> impl Iterator<Item = &mut Function> {
        self.functions.iter_mut().filter(move |f| f.address == address)
    }
}
