//! Generic report assembly: one pass over a [`DocumentTemplate`]'s sections.

mod template;
mod values;

pub use template::{
    ChecklistSpec, DocumentTemplate, FieldSpec, RemarkSpec, RoleSpec, SectionBody, SectionSpec,
    builtin_slugs,
};
pub use values::ValueFormat;

use std::time::Instant;

use crate::directory::{Directory, find_signature_url};
use crate::error::Error;
use crate::images::{ImageSource, load_image};
use crate::model::{CheckboxItem, EmbeddedImage, Field, Record, Role, Signatory, TextBlock};
use crate::pdf::{self, Placement, ResolvedAttachment, ResolvedSignatory, SectionLead, Surface};
use crate::style::LayoutStyle;

/// A finished document and what the HTTP boundary needs to serve it.
#[derive(Clone, Debug)]
pub struct Report {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub page_count: usize,
    /// Every block and row drawn, in drawing order.
    pub layout: Vec<Placement>,
}

impl Report {
    pub fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Replace anything outside `[A-Za-z0-9._-]` with `_`.
fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() { "_".to_string() } else { cleaned }
}

/// `<DocumentType>-<JobOrderOrId>.pdf`
pub fn report_filename(template: &DocumentTemplate, record: &Record) -> String {
    format!(
        "{}-{}.pdf",
        sanitize_component(&template.document_type()),
        sanitize_component(record.business_id())
    )
}

fn subtitle(record: &Record) -> String {
    match record.job_order.as_deref().map(str::trim) {
        Some(jo) if !jo.is_empty() => format!("Job Order: {jo}"),
        _ => format!("Record: {}", record.id),
    }
}

/// A section with its record values looked up and its images fetched.
enum Planned {
    Fields { columns: usize, fields: Vec<Field> },
    Checklist { columns: usize, items: Vec<CheckboxItem> },
    Remarks(Vec<TextBlock>),
    Attachments(Vec<ResolvedAttachment>),
    Signatories(Box<[ResolvedSignatory; 4]>),
}

impl Planned {
    /// The first unit this body draws, for its header's keep-with-next.
    fn lead(&self) -> SectionLead<'_> {
        match self {
            Planned::Fields { .. } => SectionLead::FieldRow,
            Planned::Checklist { .. } => SectionLead::CheckboxRow,
            Planned::Remarks(blocks) => blocks.first().map_or(SectionLead::FieldRow, SectionLead::Text),
            Planned::Attachments(_) => SectionLead::AttachmentRow,
            Planned::Signatories(_) => SectionLead::SignatureBand,
        }
    }
}

/// Lays records out against templates. Holds only collaborators and style,
/// so one generator can serve any number of sequential requests.
pub struct ReportGenerator<'a> {
    style: LayoutStyle,
    images: &'a dyn ImageSource,
    directory: Option<&'a dyn Directory>,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(images: &'a dyn ImageSource) -> Self {
        Self {
            style: LayoutStyle::default(),
            images,
            directory: None,
        }
    }

    pub fn with_style(mut self, style: LayoutStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_directory(mut self, directory: &'a dyn Directory) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Build the built-in document type `slug` for `record`.
    pub fn generate_builtin(&self, slug: &str, record: &Record) -> Result<Report, Error> {
        let template = DocumentTemplate::builtin(slug)?;
        self.generate(&template, record)
    }

    pub fn generate(&self, template: &DocumentTemplate, record: &Record) -> Result<Report, Error> {
        template.validate()?;
        self.style.validate()?;
        if record.business_id().trim().is_empty() {
            return Err(Error::InvalidRecord("record has neither a job order nor an id".into()));
        }

        let t0 = Instant::now();
        let plan = self.plan(template, record)?;
        let t_fetch = t0.elapsed();

        let mut surface = Surface::new(self.style.clone());
        pdf::render_title_block(&mut surface, &template.title, &subtitle(record));
        for (title, body) in &plan {
            if !title.trim().is_empty() {
                pdf::render_section_header(&mut surface, title, body.lead());
            }
            match body {
                Planned::Fields { columns, fields } => pdf::render_field_grid(&mut surface, fields, *columns),
                Planned::Checklist { columns, items } => pdf::render_checkbox_grid(&mut surface, items, *columns),
                Planned::Remarks(blocks) => {
                    for block in blocks {
                        pdf::render_text_block(&mut surface, block);
                    }
                }
                Planned::Attachments(attachments) => pdf::render_attachment_grid(&mut surface, attachments),
                Planned::Signatories(signatories) => pdf::render_signatory_band(&mut surface, signatories),
            }
        }
        let t_layout = t0.elapsed();

        let rendered = surface.finish(&template.title);
        let t_total = t0.elapsed();

        log::info!(
            "Timing: fetch={:.1}ms, layout={:.1}ms, assemble={:.1}ms, total={:.1}ms ({} pages, {} bytes)",
            t_fetch.as_secs_f64() * 1000.0,
            (t_layout - t_fetch).as_secs_f64() * 1000.0,
            (t_total - t_layout).as_secs_f64() * 1000.0,
            t_total.as_secs_f64() * 1000.0,
            rendered.page_count,
            rendered.bytes.len(),
        );

        Ok(Report {
            bytes: rendered.bytes,
            filename: report_filename(template, record),
            page_count: rendered.page_count,
            layout: rendered.trace,
        })
    }

    /// Resolve every section against the record. All image I/O happens here,
    /// in drawing order, so layout itself never blocks.
    fn plan(&self, template: &DocumentTemplate, record: &Record) -> Result<Vec<(String, Planned)>, Error> {
        let mut plan = Vec::with_capacity(template.sections.len());
        for section in &template.sections {
            let body = match &section.body {
                SectionBody::Fields { columns, fields } => Planned::Fields {
                    columns: *columns,
                    fields: fields
                        .iter()
                        .map(|spec| field_from_record(spec, record))
                        .collect::<Result<_, _>>()?,
                },
                SectionBody::Checklist { columns, items } => Planned::Checklist {
                    columns: *columns,
                    items: items
                        .iter()
                        .map(|spec| CheckboxItem {
                            label: spec.label.clone(),
                            checked: record.value(&spec.key).is_some_and(|v| v.is_truthy()),
                        })
                        .collect(),
                },
                SectionBody::Remarks { blocks } => Planned::Remarks(
                    blocks
                        .iter()
                        .map(|spec| TextBlock {
                            label: spec.label.clone(),
                            value: record.value(&spec.key).map(|v| v.display()).unwrap_or_default(),
                        })
                        .collect(),
                ),
                SectionBody::Attachments => {
                    let attachments = self.fetch_attachments(record);
                    if attachments.is_empty() {
                        log::debug!("no attachments to show; omitting section {:?}", section.title);
                        continue;
                    }
                    Planned::Attachments(attachments)
                }
                SectionBody::Signatories { roles } => {
                    Planned::Signatories(Box::new(Role::ALL.map(|role| {
                        let spec = roles.iter().find(|r| r.role == role);
                        self.resolve_signatory(role, spec, record)
                    })))
                }
            };
            plan.push((section.title.clone(), body));
        }
        Ok(plan)
    }

    fn fetch_attachments(&self, record: &Record) -> Vec<ResolvedAttachment> {
        record
            .attachments
            .iter()
            .filter_map(|a| match load_image(self.images, &a.url, a.mime_hint.as_deref()) {
                Ok(image) => Some(ResolvedAttachment {
                    url: a.url.clone(),
                    title: a.title.clone(),
                    image,
                }),
                Err(e) => {
                    log::warn!("skipping attachment {}: {e}", a.url);
                    None
                }
            })
            .collect()
    }

    fn resolve_signatory(&self, role: Role, spec: Option<&RoleSpec>, record: &Record) -> ResolvedSignatory {
        let input = record.signatories.get(&role);
        let signatory = Signatory {
            label: spec
                .and_then(|s| s.label.clone())
                .unwrap_or_else(|| role.default_label().to_string()),
            title: spec
                .and_then(|s| s.title.clone())
                .unwrap_or_else(|| role.default_title().to_string()),
            name: input.and_then(|i| i.name.clone()),
            image_url: input.and_then(|i| i.image_url.clone()),
        };
        let image = self.signature_image(&signatory);
        ResolvedSignatory { signatory, image }
    }

    /// Stored URL first, then a directory lookup by name.
    fn signature_image(&self, signatory: &Signatory) -> Option<EmbeddedImage> {
        let stored = signatory
            .image_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);
        let url = match stored {
            Some(url) => url,
            None => {
                let name = signatory.name.as_deref().map(str::trim).filter(|n| !n.is_empty())?;
                self.lookup_signature(name)?
            }
        };
        match load_image(self.images, &url, None) {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("signature for {:?} unavailable: {e}", signatory.label);
                None
            }
        }
    }

    fn lookup_signature(&self, name: &str) -> Option<String> {
        let directory = self.directory?;
        match find_signature_url(directory, name) {
            Ok(Some(url)) => Some(url),
            Ok(None) => {
                log::warn!("no saved signature in the directory for {name:?}");
                None
            }
            Err(e) => {
                log::warn!("directory lookup for {name:?} failed: {e}");
                None
            }
        }
    }
}

fn field_from_record(spec: &FieldSpec, record: &Record) -> Result<Field, Error> {
    let raw = record.value(&spec.key);
    let blank = match raw {
        None => true,
        Some(v) => v.display().trim().is_empty(),
    };
    if spec.required && blank {
        return Err(Error::InvalidRecord(format!("missing required field `{}`", spec.key)));
    }
    Ok(Field {
        label: spec.label.clone(),
        value: values::format_value(raw, spec.format),
        span: spec.span,
    })
}
