use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::sale::ClientCode;

/// Externally maintained record of who currently owns a client. The ledger's
/// per-sale `manager_name` is history; this is the source of truth for the
/// present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub client_code: ClientCode,
    pub current_manager: String,
    #[serde(default)]
    pub crm_link: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Lookup capability over directory entries. The resolver takes this as a
/// seam so the directory-present and directory-absent paths stay separately
/// testable.
pub trait DirectoryLookup {
    fn entry(&self, code: &ClientCode) -> Option<&DirectoryEntry>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerDirectory {
    entries: BTreeMap<ClientCode, DirectoryEntry>,
}

impl ManagerDirectory {
    pub fn from_entries(entries: impl IntoIterator<Item = DirectoryEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.client_code.clone(), entry))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.entries.values()
    }
}

impl DirectoryLookup for ManagerDirectory {
    fn entry(&self, code: &ClientCode) -> Option<&DirectoryEntry> {
        self.entries.get(code)
    }
}
