pub mod commands;

use std::path::Path;

use ida2r2_core::services::convert::{ConversionMode, ConversionReport, ConvertOptions};

/// Placeholder printed when the database did not report an image base.
pub const UNKNOWN_BASE_ADDRESS: &str = "[base address]";

/// Translate the negative CLI switches into conversion options.
pub fn conversion_options(no_comments: bool, no_functions: bool) -> ConvertOptions {
    ConvertOptions { functions: !no_functions, comments: !no_comments }
}

/// radare2 command line that loads the generated script.
pub fn radare2_hint(report: &ConversionReport, script: &Path) -> String {
    match report.mode {
        ConversionMode::Idc => format!("r2 -i {} [program]", script.display()),
        ConversionMode::Database => {
            let base = report
                .image_base
                .map(|b| format!("{b:#x}"))
                .unwrap_or_else(|| UNKNOWN_BASE_ADDRESS.to_string());
            format!("r2 -i {} -B {} [program]", script.display(), base)
        }
    }
}
