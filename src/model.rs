use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single record value as handed over by the persistence layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    /// Printable form: integral numbers lose their `.0`, booleans become Yes/No.
    pub fn display(&self) -> String {
        match self {
            Scalar::Bool(true) => "Yes".to_string(),
            Scalar::Bool(false) => "No".to_string(),
            Scalar::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Bool(b) => *b,
            Scalar::Number(n) => *n != 0.0,
            Scalar::Text(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "yes" | "true" | "1" | "x" | "checked" | "on"
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Span {
    #[default]
    One,
    /// Full grid width; always on its own row.
    Full,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub label: String,
    pub value: Option<Scalar>,
    pub span: Span,
}

impl Field {
    pub fn new(label: impl Into<String>, value: Option<Scalar>) -> Self {
        Self {
            label: label.into(),
            value,
            span: Span::One,
        }
    }

    pub fn full(label: impl Into<String>, value: Option<Scalar>) -> Self {
        Self {
            label: label.into(),
            value,
            span: Span::Full,
        }
    }

    pub fn value_text(&self) -> String {
        self.value.as_ref().map(Scalar::display).unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CheckboxItem {
    pub label: String,
    pub checked: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextBlock {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "mime_hint")]
    pub mime_hint: Option<String>,
}

/// The four signing roles, in the order they appear on every signed document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Technician,
    Approver,
    Notifier,
    Acknowledger,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Technician,
        Role::Approver,
        Role::Notifier,
        Role::Acknowledger,
    ];

    pub fn default_label(self) -> &'static str {
        match self {
            Role::Technician => "Performed by",
            Role::Approver => "Approved by",
            Role::Notifier => "Noted by",
            Role::Acknowledger => "Acknowledged by",
        }
    }

    pub fn default_title(self) -> &'static str {
        match self {
            Role::Technician => "Service Technician",
            Role::Approver => "Service Manager",
            Role::Notifier => "Supervisor",
            Role::Acknowledger => "Customer Representative",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatoryInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "image_url")]
    pub image_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Signatory {
    pub label: String,
    pub title: String,
    pub name: Option<String>,
    pub image_url: Option<String>,
}

/// An already-fetched, already-authorised record.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    #[serde(default, alias = "job_order")]
    pub job_order: Option<String>,
    #[serde(default)]
    pub fields: HashMap<String, Option<Scalar>>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub signatories: HashMap<Role, SignatoryInput>,
}

impl Record {
    pub fn from_json(text: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn value(&self, key: &str) -> Option<&Scalar> {
        self.fields.get(key).and_then(|v| v.as_ref())
    }

    /// Job order number when present and non-blank, otherwise the internal id.
    pub fn business_id(&self) -> &str {
        self.job_order
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// Sample layout of an [`EmbeddedImage`]'s pixel data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    Gray,
    Rgb,
    /// Four-component JPEG, stored inverted the way Adobe writers emit it.
    Cmyk,
}

/// An image ready for embedding. For `Jpeg` the data is the original DCT
/// stream; for `Png` it is zlib-compressed 8-bit samples with the alpha
/// channel split off into `alpha`.
#[derive(Clone)]
pub struct EmbeddedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub color_space: ColorSpace,
    pub alpha: Option<Vec<u8>>,
}

impl std::fmt::Debug for EmbeddedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedImage")
            .field("format", &self.format)
            .field("pixel_width", &self.pixel_width)
            .field("pixel_height", &self.pixel_height)
            .field("color_space", &self.color_space)
            .field("bytes", &self.data.len())
            .finish()
    }
}
