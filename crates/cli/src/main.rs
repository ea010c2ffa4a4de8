use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser};
use ida2r2::commands::convert_command;
use ida2r2::conversion_options;
use ida2r2_core::services::convert::ConversionInput;

/// Export an IDA database or IDC script into a radare2 initialization script.
///
/// This CLI is a thin wrapper around `ida2r2-core`; all conversion logic lives
/// in the library so it can be tested and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "ida2r2",
    version,
    about = "Export IDB or IDC from IDA into a radare2 initialization script",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    input: InputArgs,

    /// Export to a specified file path.
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Don't convert comments.
    #[arg(long, default_value_t = false, conflicts_with = "no_functions")]
    no_comments: bool,

    /// Don't convert functions (or their local labels).
    #[arg(long, default_value_t = false)]
    no_functions: bool,

    /// Print the conversion report as JSON instead of progress messages.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputArgs {
    /// Path to the analysis database (SQLite, or a `.json` snapshot).
    #[arg(short = 'b', long = "idb")]
    idb: Option<PathBuf>,

    /// Path to the IDC script.
    #[arg(short = 'c', long = "idc")]
    idc: Option<PathBuf>,
}

impl InputArgs {
    fn into_input(self) -> Option<ConversionInput> {
        match (self.idb, self.idc) {
            (Some(path), _) => Some(ConversionInput::Database(path)),
            (None, Some(path)) => Some(ConversionInput::Idc(path)),
            (None, None) => None,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let options = conversion_options(cli.no_comments, cli.no_functions);
    let input = cli
        .input
        .into_input()
        .ok_or_else(|| anyhow::anyhow!("One of --idb or --idc is required"))?;

    log::debug!("conversion options: {options:?}");
    convert_command(input, &cli.output, options, cli.json)?;

    Ok(())
}
