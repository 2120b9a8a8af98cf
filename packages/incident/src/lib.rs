#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident aggregation.
//!
//! A single police report can produce several offense rows that share one
//! report number. [`aggregate`] folds rows into one [`IncidentGroup`] per
//! report, and [`markers`] turns each group into a single
//! [`markers::MarkerDescriptor`] built from the group's representative row.

pub mod markers;

use std::collections::BTreeMap;

use crime_radius_source_models::EventRecord;

/// All rows sharing one incident identifier, in source order.
///
/// Never empty: groups are only created from a first row.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentGroup {
    incident_id: String,
    records: Vec<EventRecord>,
}

impl IncidentGroup {
    fn new(incident_id: String, first: EventRecord) -> Self {
        Self {
            incident_id,
            records: vec![first],
        }
    }

    /// The shared incident identifier.
    #[must_use]
    pub fn incident_id(&self) -> &str {
        &self.incident_id
    }

    /// Every row in the group, in the order the source returned them.
    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Number of rows folded into this group.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Always `false`; present for API symmetry with [`Self::len`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The row that stands for the whole incident: the first one seen.
    ///
    /// Results are requested newest first, so this is the most recent row
    /// filed under the identifier.
    #[must_use]
    pub fn representative(&self) -> &EventRecord {
        &self.records[0]
    }
}

/// Incident groups keyed by identifier, kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentGroups {
    groups: Vec<IncidentGroup>,
    index: BTreeMap<String, usize>,
    dropped: usize,
}

impl IncidentGroups {
    /// Looks up the group for an identifier.
    #[must_use]
    pub fn get(&self, incident_id: &str) -> Option<&IncidentGroup> {
        self.index.get(incident_id).map(|&i| &self.groups[i])
    }

    /// Groups in the order their first row appeared.
    pub fn iter(&self) -> impl Iterator<Item = &IncidentGroup> {
        self.groups.iter()
    }

    /// Number of distinct incidents.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if no row carried an identifier.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of rows skipped because they had no identifier.
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }

    /// Total number of grouped rows.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.groups.iter().map(IncidentGroup::len).sum()
    }

    /// Flattens the groups back into a row sequence, group by group.
    #[must_use]
    pub fn into_records(self) -> Vec<EventRecord> {
        self.groups.into_iter().flat_map(|g| g.records).collect()
    }

    fn push(&mut self, record: EventRecord) {
        let Some(incident_id) = record.incident_id.clone() else {
            log::debug!(
                "Dropping record without an incident identifier (offense: {:?}, occurred at: {:?})",
                record.offense,
                record.occurred_at
            );
            self.dropped += 1;
            return;
        };

        if let Some(&i) = self.index.get(&incident_id) {
            self.groups[i].records.push(record);
        } else {
            self.index.insert(incident_id.clone(), self.groups.len());
            self.groups.push(IncidentGroup::new(incident_id, record));
        }
    }
}

impl<'a> IntoIterator for &'a IncidentGroups {
    type Item = &'a IncidentGroup;
    type IntoIter = std::slice::Iter<'a, IncidentGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Groups rows by incident identifier.
///
/// Rows are visited in input order; each is appended to the group for its
/// identifier, which is created on first sight. Rows without an identifier
/// are dropped and counted in [`IncidentGroups::dropped`].
#[must_use]
pub fn aggregate<I>(records: I) -> IncidentGroups
where
    I: IntoIterator<Item = EventRecord>,
{
    let mut groups = IncidentGroups::default();
    for record in records {
        groups.push(record);
    }

    if groups.dropped > 0 {
        log::debug!(
            "Dropped {} records without an incident identifier",
            groups.dropped
        );
    }
    log::debug!(
        "Aggregated {} records into {} incidents",
        groups.record_count(),
        groups.len()
    );

    groups
}
