use std::collections::BTreeMap;

use crate::ScanId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEntry {
    pub percent: u8,
    pub symbol: String,
}

/// Last-known progress per scan. Entries live from the first progress event
/// until the scan reports completion; a scan that never completes keeps its
/// entry until the state is reset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressTracker {
    entries: BTreeMap<ScanId, ProgressEntry>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records progress for a scan, replacing whatever was there.
    pub fn set(&mut self, scan_id: ScanId, percent: u8, symbol: impl Into<String>) {
        self.entries.insert(
            scan_id,
            ProgressEntry {
                percent: percent.min(100),
                symbol: symbol.into(),
            },
        );
    }

    pub fn clear(&mut self, scan_id: &ScanId) -> Option<ProgressEntry> {
        self.entries.remove(scan_id)
    }

    pub fn get(&self, scan_id: &ScanId) -> Option<&ProgressEntry> {
        self.entries.get(scan_id)
    }

    pub fn percent(&self, scan_id: &ScanId) -> Option<u8> {
        self.entries.get(scan_id).map(|entry| entry.percent)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ScanId, &ProgressEntry)> {
        self.entries.iter()
    }
}
