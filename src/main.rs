use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use layer_editor::script::Script;
use layer_editor::{EditSession, EditorSettings, ExportFormat};

const DEFAULT_OUTPUT_STEM: &str = "edited-image";

/// Replays a JSON edit script and writes the composited result.
#[derive(Parser, Debug)]
#[command(name = "layer-editor", version, about)]
struct Cli {
    /// Script to run; relative image paths inside it resolve against its directory.
    script: PathBuf,

    /// Output file. Overrides the script's `output`; the extension picks the format.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Settings file to use instead of the one in the user config dir.
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli: Cli = Cli::parse();
    let settings: EditorSettings = match &cli.settings {
        Some(path) => EditorSettings::load_from(path),
        None => EditorSettings::load(),
    };

    let script: Script = match Script::from_path(&cli.script) {
        Ok(s) => s,
        Err(e) => {
            error!(path = %cli.script.display(), error = %e, "cannot read script");
            return ExitCode::FAILURE;
        }
    };

    let base_dir: &Path = cli.script.parent().unwrap_or_else(|| Path::new("."));
    let mut session: EditSession = EditSession::new(settings);
    let report = script.run(&mut session, base_dir);

    let output: PathBuf = cli.output.or_else(|| script.output.clone().map(|p| base_dir.join(p)))
        .unwrap_or_else(|| {
            PathBuf::from(format!("{}.{}", DEFAULT_OUTPUT_STEM, session.settings().export.format.extension()))
        });
    let format: ExportFormat = output.extension()
        .and_then(|e| e.to_str())
        .and_then(ExportFormat::from_extension)
        .unwrap_or(session.settings().export.format);

    let bytes: Vec<u8> = match session.export_surface(format) {
        Ok(b) => b,
        Err(e) => {
            error!(error = %e, "export failed");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = fs::write(&output, bytes) {
        error!(path = %output.display(), error = %e, "cannot write output");
        return ExitCode::FAILURE;
    }

    info!(path = %output.display(), format = format.as_str(), layers = session.layers().len(), "image written");
    if report.is_clean() { ExitCode::SUCCESS } else { ExitCode::from(2) }
}
