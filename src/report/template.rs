use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{Role, Span};

use super::values::ValueFormat;

const BUILTIN: &[(&str, &str)] = &[
    ("service-report", include_str!("../../templates/service_report.json")),
    ("commissioning-report", include_str!("../../templates/commissioning_report.json")),
    ("inspection-report", include_str!("../../templates/inspection_report.json")),
    (
        "pump-commissioning-report",
        include_str!("../../templates/pump_commissioning_report.json"),
    ),
];

/// Slugs of the document types shipped with the crate.
pub fn builtin_slugs() -> impl Iterator<Item = &'static str> {
    BUILTIN.iter().map(|(slug, _)| *slug)
}

/// A document type: its title, filename prefix and ordered section list.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTemplate {
    pub slug: String,
    pub title: String,
    /// `<DocumentType>` part of the output filename. Defaults to the title
    /// with whitespace removed.
    #[serde(default)]
    pub file_prefix: Option<String>,
    pub sections: Vec<SectionSpec>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SectionSpec {
    /// Header band text. A blank title draws the body without a header.
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub body: SectionBody,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionBody {
    Fields {
        #[serde(default = "default_field_columns")]
        columns: usize,
        fields: Vec<FieldSpec>,
    },
    Checklist {
        #[serde(default = "default_checklist_columns")]
        columns: usize,
        items: Vec<ChecklistSpec>,
    },
    Remarks {
        blocks: Vec<RemarkSpec>,
    },
    Attachments,
    Signatories {
        #[serde(default)]
        roles: Vec<RoleSpec>,
    },
}

fn default_field_columns() -> usize {
    2
}

fn default_checklist_columns() -> usize {
    3
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub span: Span,
    #[serde(default)]
    pub format: ValueFormat,
    #[serde(default)]
    pub required: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChecklistSpec {
    pub key: String,
    pub label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemarkSpec {
    pub key: String,
    pub label: String,
}

/// Overrides for one signatory box; unset parts keep the role's defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoleSpec {
    pub role: Role,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl DocumentTemplate {
    pub fn builtin(slug: &str) -> Result<Self, Error> {
        let (_, text) = BUILTIN
            .iter()
            .find(|(s, _)| *s == slug)
            .ok_or_else(|| Error::UnknownDocumentType(slug.to_string()))?;
        Self::from_json(text)
    }

    pub fn from_json(text: &str) -> Result<Self, Error> {
        let template: Self = serde_json::from_str(text)?;
        template.validate()?;
        Ok(template)
    }

    pub fn document_type(&self) -> String {
        match self.file_prefix.as_deref().map(str::trim) {
            Some(prefix) if !prefix.is_empty() => prefix.to_string(),
            _ => self.title.split_whitespace().collect(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |msg: String| -> Result<(), Error> {
            Err(Error::InvalidTemplate(format!("{}: {msg}", self.slug)))
        };
        if self.slug.trim().is_empty() {
            return Err(Error::InvalidTemplate("template slug is empty".into()));
        }
        if self.title.trim().is_empty() {
            return invalid("title is empty".into());
        }
        if self.sections.is_empty() {
            return invalid("no sections".into());
        }

        let mut signature_sections = 0;
        for (i, section) in self.sections.iter().enumerate() {
            match &section.body {
                SectionBody::Fields { columns, fields } => {
                    if *columns == 0 {
                        return invalid(format!("section {i} has zero columns"));
                    }
                    if fields.is_empty() {
                        return invalid(format!("section {i} has no fields"));
                    }
                    if let Some(f) = fields.iter().find(|f| f.key.trim().is_empty()) {
                        return invalid(format!("section {i}: field `{}` has an empty key", f.label));
                    }
                }
                SectionBody::Checklist { columns, items } => {
                    if *columns == 0 {
                        return invalid(format!("section {i} has zero columns"));
                    }
                    if items.is_empty() {
                        return invalid(format!("section {i} has no checklist items"));
                    }
                }
                SectionBody::Remarks { blocks } => {
                    if blocks.is_empty() {
                        return invalid(format!("section {i} has no remark blocks"));
                    }
                }
                SectionBody::Attachments => {}
                SectionBody::Signatories { roles } => {
                    signature_sections += 1;
                    let mut seen = HashSet::new();
                    if let Some(dup) = roles.iter().find(|r| !seen.insert(r.role)) {
                        return invalid(format!("role {:?} overridden twice", dup.role));
                    }
                }
            }
        }
        if signature_sections > 1 {
            return invalid("more than one signatory section".into());
        }
        Ok(())
    }
}
