use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use fieldreport_pdf::{
    DefaultImageSource, Directory, DocumentTemplate, Error, LayoutStyle, Record, ReportGenerator,
    StaticDirectory, builtin_slugs,
};

/// Render a service or commissioning record to a paginated PDF.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Built-in document type (see --list-types)
    #[arg(short = 't', long = "type", required_unless_present_any = ["template", "list_types"])]
    doc_type: Option<String>,

    /// Custom document template (JSON) instead of a built-in type
    #[arg(long, conflicts_with = "doc_type")]
    template: Option<PathBuf>,

    /// Record to render (JSON)
    #[arg(short, long, required_unless_present = "list_types")]
    record: Option<PathBuf>,

    /// User directory for signature lookups (JSON array)
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Layout style overrides (JSON)
    #[arg(long)]
    style: Option<PathBuf>,

    /// Directory relative image paths are resolved against [default: the record's directory]
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Output file, or directory to place the generated filename in
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// List built-in document types and exit
    #[arg(long)]
    list_types: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn read_to_string(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|e| Error::Io(std::io::Error::new(e.kind(), format!("{}: {e}", path.display()))))
}

fn run(args: &Args) -> Result<(), Error> {
    if args.list_types {
        for slug in builtin_slugs() {
            let template = DocumentTemplate::builtin(slug)?;
            println!("{slug:<28} {}", template.title);
        }
        return Ok(());
    }

    let template = match (&args.template, &args.doc_type) {
        (Some(path), _) => DocumentTemplate::from_json(&read_to_string(path)?)?,
        (None, Some(slug)) => DocumentTemplate::builtin(slug)?,
        (None, None) => return Err(Error::UnknownDocumentType(String::new())),
    };
    let record_path = args
        .record
        .as_deref()
        .ok_or_else(|| Error::InvalidRecord("no record given".into()))?;
    let record = Record::from_json(&read_to_string(record_path)?)?;

    let style = match &args.style {
        Some(path) => LayoutStyle::from_json(&read_to_string(path)?)?,
        None => LayoutStyle::default(),
    };
    let directory = match &args.directory {
        Some(path) => Some(StaticDirectory::from_json(&read_to_string(path)?)?),
        None => None,
    };
    let base_dir = args.base_dir.clone().unwrap_or_else(|| {
        record_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    });
    let images = DefaultImageSource::new(base_dir)?;

    let mut generator = ReportGenerator::new(&images).with_style(style);
    if let Some(directory) = &directory {
        if directory.is_empty() {
            log::warn!("user directory is empty, signatures will only come from stored URLs");
        } else {
            log::debug!("loaded {} directory users", directory.len());
        }
        generator = generator.with_directory(directory as &dyn Directory);
    }
    let report = generator.generate(&template, &record)?;

    let output = if args.output.is_dir() {
        args.output.join(&report.filename)
    } else {
        args.output.clone()
    };
    std::fs::write(&output, &report.bytes)?;
    log::info!(
        "Wrote {} ({} pages, {} bytes)",
        output.display(),
        report.page_count,
        report.bytes.len()
    );
    Ok(())
}
