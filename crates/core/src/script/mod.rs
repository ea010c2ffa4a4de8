//! radare2 script generation.
//!
//! Every fact either front end produces is expressed as a [`Directive`] and
//! rendered into one or more radare2 commands, one command per line:
//!
//! | Directive          | radare2 command(s)                              |
//! |--------------------|-------------------------------------------------|
//! | `AnalyzeFunction`  | `af <name> @ <decimal address>`                 |
//! | `DefineFunction`   | `af+ <hex address> <size> <name>` + `"CCa <hex address> <signature>"` |
//! | `LocalLabel`       | `f. <name> @ <hex address>`                     |
//! | `EncodedComment`   | `CCu base64:<payload> @ <decimal address>`      |
//! | `RawComment`       | `"CCa <decimal address> <text>"`                |
//!
//! Database comments may hold arbitrary text, so they travel base64 encoded.
//! Comments recognized in an IDC log are already single-line segments and are
//! written verbatim inside a quoted command; a `"` in such a comment ends the
//! quoted command early in radare2.

use std::io::{self, Write};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

/// One fact to be written to the radare2 script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// A function known only by address and name (database mode).
    AnalyzeFunction { address: u64, name: String },
    /// A function with explicit bounds and signature (IDC mode).
    DefineFunction { address: u64, size: u64, name: String, signature: String },
    LocalLabel { address: u64, name: String },
    /// A comment that must survive arbitrary content (database mode).
    EncodedComment { address: u64, text: String },
    /// A single comment line interpolated as-is (IDC mode).
    RawComment { address: u64, text: String },
}

impl Directive {
    /// Render this directive into radare2 command lines (without terminators).
    pub fn render(&self) -> Vec<String> {
        match self {
            Directive::AnalyzeFunction { address, name } => {
                vec![analyze_function_line(*address, name)]
            }
            Directive::DefineFunction { address, size, name, signature } => vec![
                define_function_line(*address, *size, name),
                function_signature_line(*address, signature),
            ],
            Directive::LocalLabel { address, name } => vec![local_label_line(*address, name)],
            Directive::EncodedComment { address, text } => {
                vec![encoded_comment_line(*address, text)]
            }
            Directive::RawComment { address, text } => vec![raw_comment_line(*address, text)],
        }
    }
}

/// `af` with any `@` in the name replaced, since `@` separates the address in radare2.
pub fn analyze_function_line(address: u64, name: &str) -> String {
    format!("af {} @ {}", name.replace('@', "_"), address)
}

pub fn define_function_line(address: u64, size: u64, name: &str) -> String {
    format!("af+ {:#x} {} {}", address, size, name)
}

pub fn function_signature_line(address: u64, signature: &str) -> String {
    format!("\"CCa {:#x} {}\"", address, signature)
}

pub fn local_label_line(address: u64, name: &str) -> String {
    format!("f. {} @ {:#x}", name, address)
}

pub fn encoded_comment_line(address: u64, text: &str) -> String {
    format!("CCu base64:{} @ {}", BASE64.encode(text.as_bytes()), address)
}

pub fn raw_comment_line(address: u64, text: &str) -> String {
    format!("\"CCa {} {}\"", address, text)
}

/// Line sink for a radare2 script.
///
/// The writer is passed explicitly to every emitting call and keeps track of
/// how much has been written so callers can detect an empty conversion.
#[derive(Debug)]
pub struct ScriptWriter<W: Write> {
    inner: W,
    bytes_written: u64,
    lines_written: u64,
}

impl<W: Write> ScriptWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, bytes_written: 0, lines_written: 0 }
    }

    /// Write one command followed by `\n`.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.inner.write_all(line.as_bytes())?;
        self.inner.write_all(b"\n")?;
        self.bytes_written += line.len() as u64 + 1;
        self.lines_written += 1;
        Ok(())
    }

    pub fn emit(&mut self, directive: &Directive) -> io::Result<()> {
        for line in directive.render() {
            self.write_line(&line)?;
        }
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}
