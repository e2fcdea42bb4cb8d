//! Tag whitelist.
//!
//! Entries are accepted in two notations:
//!
//! | Notation        | Example          |
//! |-----------------|------------------|
//! | hex             | `56E18D5A`       |
//! | dashed decimal  | `86-225-141-90`  |
//!
//! Both name the same 4-byte tag above.  When the whitelist is not enforced
//! every tag is approved (attendance mode); detections are recorded to the
//! outbox either way.

use std::collections::HashSet;

use log::{info, warn};

use crate::app::ports::AccessPolicy;
use crate::error::RecordError;
use crate::queue::record::{MAX_TAG_LEN, TagId};

/// Set of authorised tags plus the enforcement switch.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    entries: HashSet<TagId>,
    enforce: bool,
}

impl Whitelist {
    pub fn new(enforce: bool) -> Self {
        Self {
            entries: HashSet::new(),
            enforce,
        }
    }

    /// Build from configuration strings.  Unparseable entries are logged
    /// and skipped; validation has normally rejected them already.
    pub fn from_entries<S: AsRef<str>>(entries: &[S], enforce: bool) -> Self {
        let mut list = Self::new(enforce);
        for entry in entries {
            match parse_entry(entry.as_ref()) {
                Ok(tag) => {
                    list.entries.insert(tag);
                }
                Err(e) => warn!("Whitelist: ignoring entry '{}': {}", entry.as_ref(), e),
            }
        }
        list
    }

    /// Add a tag.  Returns `false` if it was already present.
    pub fn add(&mut self, tag: TagId) -> bool {
        let added = self.entries.insert(tag.clone());
        if added {
            info!("Whitelist: added {}", tag);
        } else {
            info!("Whitelist: {} already present", tag);
        }
        added
    }

    /// Remove a tag.  Returns `false` if it was not present.
    pub fn remove(&mut self, tag: &TagId) -> bool {
        let removed = self.entries.remove(tag);
        if removed {
            info!("Whitelist: removed {}", tag);
        } else {
            info!("Whitelist: {} not found", tag);
        }
        removed
    }

    /// Replace the whole set.
    pub fn replace<I: IntoIterator<Item = TagId>>(&mut self, tags: I) {
        self.entries.clear();
        self.entries.extend(tags);
        info!("Whitelist: replaced, {} entries", self.entries.len());
    }

    pub fn contains(&self, tag: &TagId) -> bool {
        self.entries.contains(tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_enforced(&self) -> bool {
        self.enforce
    }

    pub fn set_enforced(&mut self, enforce: bool) {
        self.enforce = enforce;
    }
}

impl AccessPolicy for Whitelist {
    fn is_authorized(&self, tag: &TagId) -> bool {
        !self.enforce || self.contains(tag)
    }
}

/// Parse a whitelist entry in hex or dashed-decimal notation.
pub fn parse_entry(entry: &str) -> Result<TagId, RecordError> {
    let entry = entry.trim();
    if !entry.contains('-') {
        return TagId::parse_hex(entry);
    }

    let mut bytes = heapless::Vec::<u8, MAX_TAG_LEN>::new();
    for part in entry.split('-') {
        let byte = part.parse::<u8>().map_err(|_| RecordError::BadHex)?;
        if bytes.push(byte).is_err() {
            return Err(RecordError::BadLength(entry.split('-').count()));
        }
    }
    TagId::from_bytes(&bytes)
}
