use std::path::Path;

use anyhow::{Context, Result};
use ida2r2_core::services::convert::{
    run_conversion, ConversionInput, ConversionMode, ConversionReport, ConversionRequest,
    ConvertOptions,
};

use crate::radare2_hint;

/// Convert `input` into a radare2 script at `output`.
///
/// With `json`, the conversion report is printed as JSON instead of the
/// progress banners.
pub fn convert_command(
    input: ConversionInput,
    output: &Path,
    options: ConvertOptions,
    json: bool,
) -> Result<ConversionReport> {
    let input_display = input.path().display().to_string();
    let request = ConversionRequest { input, output: output.to_path_buf(), options };

    if !json {
        println!("[+] Starting conversion from '{}' to '{}'", input_display, output.display());
    }

    let report = run_conversion(&request)
        .with_context(|| format!("Failed to convert {input_display}"))?;

    if json {
        let serialized = serde_json::to_string_pretty(&report)
            .context("Failed to serialize conversion report to JSON")?;
        println!("{}", serialized);
        return Ok(report);
    }

    if report.mode == ConversionMode::Idc && report.is_empty() {
        println!("[-] Found nothing to convert :-(");
        return Ok(report);
    }

    println!("[+] Conversion done.");
    println!(
        "    functions: {}, labels: {}, comments: {}, lines: {}",
        report.functions, report.labels, report.comments, report.lines_written
    );
    println!("[!] Execute: {}", radare2_hint(&report, output));

    Ok(report)
}
