//! User directory lookups used to find saved signatures by name.

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    #[serde(alias = "full_name")]
    pub full_name: String,
    #[serde(default, alias = "signature_url")]
    pub signature_url: Option<String>,
}

/// Best-effort search over known users.
pub trait Directory {
    /// Users whose name contains `partial`, in the directory's own order.
    fn search(&self, partial: &str) -> Result<Vec<DirectoryUser>, Error>;
}

/// An in-memory directory, typically loaded from a JSON array of users.
#[derive(Clone, Debug, Default)]
pub struct StaticDirectory {
    users: Vec<DirectoryUser>,
}

impl StaticDirectory {
    pub fn new(users: Vec<DirectoryUser>) -> Self {
        Self { users }
    }

    pub fn from_json(text: &str) -> Result<Self, Error> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Directory for StaticDirectory {
    fn search(&self, partial: &str) -> Result<Vec<DirectoryUser>, Error> {
        let needle = partial.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .users
            .iter()
            .filter(|u| u.full_name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}

/// Look `name` up by its first token, then take the first candidate whose
/// full name equals `name` exactly. Ambiguous names resolve to whichever
/// match the directory lists first.
pub fn find_signature_url(directory: &dyn Directory, name: &str) -> Result<Option<String>, Error> {
    let name = name.trim();
    let Some(first) = name.split_whitespace().next() else {
        return Ok(None);
    };
    let candidates = directory.search(first)?;
    Ok(candidates
        .into_iter()
        .find(|u| u.full_name.trim() == name)
        .and_then(|u| u.signature_url)
        .filter(|url| !url.trim().is_empty()))
}
