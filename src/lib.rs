pub mod directory;
mod error;
mod fonts;
pub mod images;
pub mod model;
mod pdf;
pub mod report;
mod style;

pub use directory::{Directory, DirectoryUser, StaticDirectory};
pub use error::Error;
pub use images::{DefaultImageSource, FetchedImage, ImageSource};
pub use model::{Attachment, Record, Role, Scalar, SignatoryInput, Span};
pub use pdf::{Placement, PlacementKind};
pub use report::{DocumentTemplate, Report, ReportGenerator, builtin_slugs};
pub use style::LayoutStyle;

use std::path::Path;
use std::time::Instant;

/// Generate the built-in document type `slug` for `record` and write it into
/// `output_dir` under its generated filename. Returns the written path.
pub fn write_report(
    slug: &str,
    record: &Record,
    images: &dyn ImageSource,
    directory: Option<&dyn Directory>,
    output_dir: &Path,
) -> Result<std::path::PathBuf, Error> {
    let t0 = Instant::now();

    let mut generator = ReportGenerator::new(images);
    if let Some(directory) = directory {
        generator = generator.with_directory(directory);
    }
    let report = generator.generate_builtin(slug, record)?;
    let t_generate = t0.elapsed();

    let path = output_dir.join(&report.filename);
    std::fs::write(&path, &report.bytes)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: generate={:.1}ms, write={:.1}ms, total={:.1}ms ({})",
        t_generate.as_secs_f64() * 1000.0,
        (t_total - t_generate).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        path.display(),
    );

    Ok(path)
}
