use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::data::export;
use crate::data::model::{Channel, Group, Record};
use crate::data::tolerance::ToleranceSet;
use crate::worker::GroupingWorker;

/// Groups shown per page of the results table.
pub const PAGE_SIZE: usize = 50;

/// Above this many records the user is told grouping may take a moment.
pub const LARGE_FILE_RECORDS: usize = 1000;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded measurements (None until user loads a file).
    pub records: Option<Arc<[Record]>>,

    /// Name of the loaded file, for the header.
    pub file_name: Option<String>,

    /// Tolerances currently configured in the side panel.
    pub tolerances: ToleranceSet,

    /// Latest finished grouping.
    pub groups: Vec<Group>,

    /// Tolerances `groups` was computed with.
    pub grouped_with: Option<ToleranceSet>,

    /// Ids of groups whose member rows are shown.
    pub expanded: BTreeSet<usize>,

    /// Zero-based results page.
    pub page: usize,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Informational message (large file, export done).
    pub notice: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,

    worker: GroupingWorker,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            records: None,
            file_name: None,
            tolerances: ToleranceSet::default(),
            groups: Vec::new(),
            grouped_with: None,
            expanded: BTreeSet::new(),
            page: 0,
            status_message: None,
            notice: None,
            loading: false,
            worker: GroupingWorker::default(),
        }
    }
}

impl AppState {
    /// Start from previously saved tolerances.
    pub fn with_tolerances(tolerances: ToleranceSet) -> Self {
        Self {
            tolerances,
            ..Self::default()
        }
    }

    /// Ingest newly loaded records and start grouping them.
    pub fn set_records(&mut self, records: Vec<Record>, file_name: Option<String>) {
        self.notice = (records.len() > LARGE_FILE_RECORDS).then(|| {
            format!(
                "Processing large file ({} rows), please wait...",
                records.len()
            )
        });
        self.records = Some(records.into());
        self.file_name = file_name;
        self.groups.clear();
        self.grouped_with = None;
        self.expanded.clear();
        self.page = 0;
        self.status_message = None;
        self.loading = false;
        self.regroup();
    }

    /// Submit the current records and tolerances to the worker.
    pub fn regroup(&mut self) {
        if let Some(records) = &self.records {
            self.worker.submit(Arc::clone(records), self.tolerances);
        }
    }

    /// Pick up a finished grouping pass. Returns true if the state changed.
    pub fn poll_worker(&mut self) -> bool {
        let Some(outcome) = self.worker.poll() else {
            return false;
        };
        // The large-file notice only stands while the pass is running.
        self.notice = None;
        match outcome.result {
            Ok(groups) => {
                self.groups = groups;
                self.grouped_with = Some(outcome.tolerances);
                self.expanded.clear();
                self.page = self.page.min(self.page_count().saturating_sub(1));
                self.status_message = None;
            }
            Err(e) => {
                // Keep whatever was on screen before.
                log::error!("Grouping failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
        true
    }

    pub fn is_grouping(&self) -> bool {
        self.worker.is_busy()
    }

    // -- Tolerances --

    /// Apply an edit from the tolerance controls. Out-of-range values are
    /// ignored; the previous value stays.
    pub fn set_tolerance(&mut self, channel: Channel, value: f64) {
        if self.tolerances.get(channel) == value {
            return;
        }
        match self.tolerances.with(channel, value) {
            Ok(next) => {
                self.tolerances = next;
                self.regroup();
            }
            Err(e) => log::warn!("Ignoring tolerance edit: {e}"),
        }
    }

    pub fn reset_tolerance(&mut self, channel: Channel) {
        self.set_tolerance(channel, ToleranceSet::default().get(channel));
    }

    /// Drop the data and return to defaults.
    pub fn clear(&mut self) {
        self.worker.abandon();
        let worker = std::mem::take(&mut self.worker);
        *self = Self {
            worker,
            ..Self::default()
        };
    }

    // -- Results table --

    pub fn toggle_expanded(&mut self, group_id: usize) {
        if !self.expanded.remove(&group_id) {
            self.expanded.insert(group_id);
        }
    }

    pub fn total_members(&self) -> usize {
        self.groups.iter().map(Group::member_count).sum()
    }

    pub fn page_count(&self) -> usize {
        self.groups.len().div_ceil(PAGE_SIZE)
    }

    /// Groups on the current page.
    pub fn page_groups(&self) -> &[Group] {
        let start = (self.page * PAGE_SIZE).min(self.groups.len());
        let end = (start + PAGE_SIZE).min(self.groups.len());
        &self.groups[start..end]
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.min(self.page_count().saturating_sub(1));
    }

    // -- Export --

    pub fn export_csv(&mut self, dir: &Path) {
        match export::write_csv(&self.groups, dir, &export::default_stem()) {
            Ok((summary, members)) => {
                self.notice = Some(format!(
                    "Exported {} and {}",
                    summary.display(),
                    members.display()
                ));
            }
            Err(e) => self.export_failed(e),
        }
    }

    pub fn export_json(&mut self, path: &Path) {
        match export::write_json(&self.groups, path) {
            Ok(()) => self.notice = Some(format!("Exported {}", path.display())),
            Err(e) => self.export_failed(e),
        }
    }

    fn export_failed(&mut self, e: anyhow::Error) {
        log::error!("Export failed: {e:#}");
        self.status_message = Some(format!("Export failed: {e:#}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    fn records(n: usize) -> Vec<Record> {
        // 10 L* units apart: every record is its own group.
        (0..n)
            .map(|i| Record::new(i + 1, format!("R{}", i + 1), i as f64 * 10.0, 1.0, 2.0))
            .collect()
    }

    fn settle(state: &mut AppState) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while state.is_grouping() && Instant::now() < deadline {
            state.poll_worker();
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!state.is_grouping(), "grouping never finished");
    }

    #[test]
    fn loading_records_groups_them() {
        let mut state = AppState::default();
        state.set_records(records(3), Some("lots.csv".into()));
        assert!(state.is_grouping());
        settle(&mut state);
        assert_eq!(state.groups.len(), 3);
        assert_eq!(state.total_members(), 3);
        assert_eq!(state.grouped_with, Some(ToleranceSet::default()));
        assert!(state.notice.is_none());
    }

    #[test]
    fn large_file_notice() {
        let mut state = AppState::default();
        state.set_records(records(LARGE_FILE_RECORDS + 1), None);
        assert!(state.notice.as_deref().unwrap().contains("1001 rows"));
        settle(&mut state);
        assert_eq!(state.notice, None);
        assert!(!state.groups.is_empty());
    }

    #[test]
    fn tolerance_edit_regroups() {
        let mut state = AppState::default();
        let near: Vec<Record> = vec![
            Record::new(1, "R1", 50.0, 1.0, 2.0),
            Record::new(2, "R2", 50.5, 1.0, 2.0),
        ];
        state.set_records(near, None);
        settle(&mut state);
        assert_eq!(state.groups.len(), 2);

        state.set_tolerance(Channel::L, 0.6);
        assert!(state.is_grouping());
        settle(&mut state);
        assert_eq!(state.groups.len(), 1);
        assert_eq!(state.grouped_with.unwrap().delta_l(), 0.6);
    }

    #[test]
    fn out_of_range_edit_is_ignored() {
        let mut state = AppState::default();
        state.set_tolerance(Channel::A, 1.5);
        assert_eq!(state.tolerances, ToleranceSet::default());
        state.set_tolerance(Channel::A, 0.0);
        assert_eq!(state.tolerances.delta_a(), 0.08);
    }

    #[test]
    fn reset_restores_default() {
        let mut state = AppState::default();
        state.set_tolerance(Channel::B, 0.5);
        assert_eq!(state.tolerances.delta_b(), 0.5);
        state.reset_tolerance(Channel::B);
        assert_eq!(state.tolerances.delta_b(), 0.10);
    }

    #[test]
    fn clear_returns_to_defaults() {
        let mut state = AppState::default();
        state.set_records(records(2), Some("x.csv".into()));
        state.set_tolerance(Channel::L, 0.9);
        state.clear();
        assert!(state.records.is_none());
        assert!(state.groups.is_empty());
        assert_eq!(state.tolerances, ToleranceSet::default());
        assert!(!state.is_grouping());
        thread::sleep(Duration::from_millis(50));
        assert!(!state.poll_worker());
    }

    #[test]
    fn pagination() {
        let mut state = AppState::default();
        state.set_records(records(PAGE_SIZE + 7), None);
        settle(&mut state);
        assert_eq!(state.page_count(), 2);
        assert_eq!(state.page_groups().len(), PAGE_SIZE);
        state.set_page(5);
        assert_eq!(state.page, 1);
        assert_eq!(state.page_groups().len(), 7);
        assert_eq!(state.page_groups()[0].id(), PAGE_SIZE + 1);
    }

    #[test]
    fn toggle_expanded() {
        let mut state = AppState::default();
        state.toggle_expanded(3);
        assert!(state.expanded.contains(&3));
        state.toggle_expanded(3);
        assert!(state.expanded.is_empty());
    }

    #[test]
    fn export_without_groups_reports_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut state = AppState::default();
        state.export_csv(dir.path());
        assert_eq!(
            state.status_message.as_deref(),
            Some("Export failed: No grouped data to export")
        );
    }
}
