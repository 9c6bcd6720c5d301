//! Record of every target path requested during one council's harvest.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::NamingCollision;

/// Outcome of claiming a target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// First request for this path.
    First,
    /// The same path was already requested for the same URL.
    Repeat,
}

/// Map from target path to the URL it is downloaded from.
///
/// Each path may be claimed by one URL only. A second URL for the same path
/// means the naming scheme produced a duplicate, which is fatal.
#[derive(Debug, Default)]
pub struct CallHistory {
    claims: Mutex<HashMap<PathBuf, String>>,
}

impl CallHistory {
    /// Record that `path` is to be downloaded from `url`.
    pub fn claim(&self, path: &Path, url: &str) -> Result<Claim, NamingCollision> {
        let mut claims = self.claims.lock().unwrap_or_else(PoisonError::into_inner);
        match claims.entry(path.to_path_buf()) {
            Entry::Vacant(slot) => {
                slot.insert(url.to_string());
                Ok(Claim::First)
            }
            Entry::Occupied(existing) if existing.get() == url => Ok(Claim::Repeat),
            Entry::Occupied(existing) => Err(NamingCollision {
                path: path.to_path_buf(),
                first: existing.get().clone(),
                second: url.to_string(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.claims.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
