use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{open_database, AnalysisDatabase, DbError};
use crate::idc::parse_idc;
use crate::script::ScriptWriter;
use crate::services::extract::Extraction;

/// Which parts of the input get converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Functions (and, for IDC logs, their local labels).
    pub functions: bool,
    pub comments: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self { functions: true, comments: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionMode {
    /// IDC statement log, parsed fully before anything is written.
    Idc,
    /// Analysis database, streamed straight into the script.
    Database,
}

/// Input selected for a run; exactly one per conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionInput {
    Idc(PathBuf),
    Database(PathBuf),
}

impl ConversionInput {
    pub fn path(&self) -> &Path {
        match self {
            ConversionInput::Idc(path) | ConversionInput::Database(path) => path,
        }
    }

    pub fn mode(&self) -> ConversionMode {
        match self {
            ConversionInput::Idc(_) => ConversionMode::Idc,
            ConversionInput::Database(_) => ConversionMode::Database,
        }
    }
}

/// A complete conversion request: one input, one output script.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub input: ConversionInput,
    pub output: PathBuf,
    pub options: ConvertOptions,
}

/// What a conversion produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionReport {
    pub mode: ConversionMode,
    pub functions: usize,
    pub labels: usize,
    pub comments: usize,
    /// Structures recognized in an IDC log (never emitted).
    pub structs: usize,
    pub lines_written: u64,
    pub bytes_written: u64,
    /// Image base reported by the database; `None` in IDC mode or when the lookup failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base: Option<u64>,
}

impl ConversionReport {
    fn new(mode: ConversionMode) -> Self {
        Self {
            mode,
            functions: 0,
            labels: 0,
            comments: 0,
            structs: 0,
            lines_written: 0,
            bytes_written: 0,
            image_base: None,
        }
    }

    /// True when nothing at all was written to the script.
    pub fn is_empty(&self) -> bool {
        self.bytes_written == 0
    }
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Input not found at {0}")]
    MissingInput(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write script: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Write everything `extraction` offers: functions, then labels, then comments.
pub fn generate<W: Write>(
    extraction: Extraction<'_>,
    writer: &mut ScriptWriter<W>,
    options: &ConvertOptions,
    report: &mut ConversionReport,
) -> Result<(), ConvertError> {
    if options.functions {
        for directive in extraction.functions()? {
            writer.emit(&directive)?;
            report.functions += 1;
        }
        for directive in extraction.labels() {
            writer.emit(&directive)?;
            report.labels += 1;
        }
    }

    if options.comments {
        for directive in extraction.comments()? {
            writer.emit(&directive)?;
            report.comments += 1;
        }
    }

    report.lines_written = writer.lines_written();
    report.bytes_written = writer.bytes_written();
    Ok(())
}

/// Parse an IDC log completely, then write its script.
pub fn convert_idc<W: Write>(
    idc: &str,
    writer: &mut ScriptWriter<W>,
    options: &ConvertOptions,
) -> Result<ConversionReport, ConvertError> {
    let model = parse_idc(idc, options);
    let mut report = ConversionReport::new(ConversionMode::Idc);
    report.structs = model.structs.len();
    generate(Extraction::Log(&model), writer, options, &mut report)?;
    Ok(report)
}

/// Stream a database into a script without building a model.
pub fn convert_database<W: Write>(
    db: &dyn AnalysisDatabase,
    writer: &mut ScriptWriter<W>,
    options: &ConvertOptions,
) -> Result<ConversionReport, ConvertError> {
    let mut report = ConversionReport::new(ConversionMode::Database);
    report.image_base = match db.image_base() {
        Ok(base) => Some(base),
        Err(err) => {
            log::warn!("image base unavailable: {err}");
            None
        }
    };
    generate(Extraction::Database(db), writer, options, &mut report)?;
    Ok(report)
}

/// Run one conversion end to end.
///
/// The input is opened first, then the output script is created; both are
/// released before this returns, on success or failure.
pub fn run_conversion(request: &ConversionRequest) -> Result<ConversionReport, ConvertError> {
    let input = request.input.path();
    if !input.is_file() {
        return Err(ConvertError::MissingInput(input.to_path_buf()));
    }

    log::info!("converting {} to {}", input.display(), request.output.display());
    match &request.input {
        ConversionInput::Idc(path) => {
            let bytes = std::fs::read(path)
                .map_err(|source| ConvertError::Read { path: path.clone(), source })?;
            // Exports carry code-page bytes; undecodable ones become U+FFFD.
            let idc = String::from_utf8_lossy(&bytes);
            with_script(&request.output, |writer| convert_idc(&idc, writer, &request.options))
        }
        ConversionInput::Database(path) => {
            let db = open_database(path)?;
            with_script(&request.output, |writer| {
                convert_database(db.as_ref(), writer, &request.options)
            })
        }
    }
}

fn with_script<F>(output: &Path, convert: F) -> Result<ConversionReport, ConvertError>
where
    F: FnOnce(&mut ScriptWriter<BufWriter<File>>) -> Result<ConversionReport, ConvertError>,
{
    let write_err = |source| ConvertError::Write { path: output.to_path_buf(), source };

    let file = File::create(output).map_err(write_err)?;
    let mut writer = ScriptWriter::new(BufWriter::new(file));
    let report = convert(&mut writer).map_err(|err| match err {
        ConvertError::Io(source) => write_err(source),
        other => other,
    })?;
    writer.finish().map_err(write_err)?;
    Ok(report)
}
