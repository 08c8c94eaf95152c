//! Grouping of flat image lists into two-image sequences.
//!
//! Image identifiers follow the `<prefix>_<suffix>` convention. Every
//! token except the last forms the group key; a key qualifies as a
//! sequence only when exactly two images share it. Groups of any other
//! size are dropped without error, since partial or oversized uploads
//! are common.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::constants::{IMAGES_PER_SEQUENCE, NAME_TOKEN_SEPARATOR};
use crate::model::Sequence;

/// Errors produced while grouping images.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GroupingError {
    /// No key had exactly two images
    #[error("No valid pairs found among {images} images")]
    NoValidPairs {
        /// Number of distinct identifiers that were inspected
        images: usize,
    },
}

/// Compute the group key for an image identifier.
///
/// Returns `None` when the identifier has fewer than two tokens.
pub fn group_key(name: &str) -> Option<String> {
    let (prefix, _suffix) = name.rsplit_once(NAME_TOKEN_SEPARATOR)?;
    Some(prefix.to_string())
}

/// Ordered collection of sequences produced by grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceSet {
    sequences: HashMap<String, Sequence>,
    order: Vec<String>,
}

impl SequenceSet {
    /// Group image identifiers into sequences.
    ///
    /// Sequence order follows the first appearance of each key in `names`.
    /// Repeated identifiers are counted once.
    pub fn group<I, S>(names: I) -> Result<Self, GroupingError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut key_order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<String>> = HashMap::new();

        for name in names {
            let name = name.as_ref();
            if !seen.insert(name.to_string()) {
                continue;
            }
            let Some(key) = group_key(name) else {
                log::debug!("Skipping '{}': no group prefix", name);
                continue;
            };
            let members = groups.entry(key.clone()).or_insert_with(|| {
                key_order.push(key.clone());
                Vec::new()
            });
            members.push(name.to_string());
        }

        let mut set = SequenceSet::default();
        for key in key_order {
            let Some(members) = groups.remove(&key) else {
                continue;
            };
            if members.len() != IMAGES_PER_SEQUENCE {
                log::warn!(
                    "Discarding group '{}' with {} images (expected {})",
                    key,
                    members.len(),
                    IMAGES_PER_SEQUENCE
                );
                continue;
            }
            let sequence = Sequence::new(key.clone(), &members[0], &members[1]);
            set.order.push(key.clone());
            set.sequences.insert(key, sequence);
        }

        if set.is_empty() {
            return Err(GroupingError::NoValidPairs { images: seen.len() });
        }

        log::info!("Grouped {} images into {} sequences", seen.len(), set.len());
        Ok(set)
    }

    /// Sequence identifiers in discovery order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// Look up a sequence by identifier.
    pub fn get(&self, id: &str) -> Option<&Sequence> {
        self.sequences.get(id)
    }

    /// Sequence at a position in discovery order.
    pub fn at(&self, index: usize) -> Option<&Sequence> {
        self.order.get(index).and_then(|id| self.sequences.get(id))
    }

    /// Iterate sequences in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Sequence> {
        self.order.iter().filter_map(|id| self.sequences.get(id))
    }

    /// All image identifiers, flattened in sequence order.
    pub fn image_names(&self) -> Vec<String> {
        self.iter().flat_map(|seq| seq.images.iter().cloned()).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
