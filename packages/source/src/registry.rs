//! Dataset registry — loads all dataset definitions from embedded TOML configs.
//!
//! Each `.toml` file in `packages/source/datasets/` is baked into the binary
//! at compile time via [`include_str!`]. Adding a new Socrata dataset is as
//! simple as creating a new TOML file and adding it to the list below.

use crate::SourceError;
use crate::dataset::{DatasetDefinition, parse_dataset_toml};

/// TOML configs embedded at compile time.
const DATASET_TOMLS: &[(&str, &str)] = &[
    ("seattle", include_str!("../datasets/seattle.toml")),
    ("chicago", include_str!("../datasets/chicago.toml")),
    ("sf", include_str!("../datasets/sf.toml")),
];

/// Dataset used when none is configured.
pub const DEFAULT_DATASET_ID: &str = "seattle";

/// Returns all configured dataset definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_datasets() -> Vec<DatasetDefinition> {
    DATASET_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_dataset_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up a dataset by id.
///
/// # Errors
///
/// Returns [`SourceError::Dataset`] if no dataset has that id.
pub fn dataset_by_id(id: &str) -> Result<DatasetDefinition, SourceError> {
    all_datasets()
        .into_iter()
        .find(|d| d.id == id)
        .ok_or_else(|| SourceError::Dataset {
            message: format!(
                "unknown dataset {id:?} (available: {})",
                DATASET_TOMLS
                    .iter()
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        })
}
