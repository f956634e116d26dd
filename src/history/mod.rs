use std::fmt;

/// Serialized, immutable copy of a scene's committed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(String);

impl Snapshot {
    pub fn new(serialized: String) -> Self {
        Self(serialized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "snapshot({} bytes)", self.0.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStep {
    Undo,
    Redo,
}

impl HistoryStep {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

/// Undo/redo log. While a restore is in flight, [`HistoryLog::snapshot`]
/// ignores incoming snapshots so that reloading a scene never records itself.
#[derive(Debug, Default)]
pub struct HistoryLog {
    entries: Vec<Snapshot>,
    cursor: Option<usize>,
    restoring: Option<RestoreInFlight>,
    limit: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct RestoreInFlight {
    previous_cursor: Option<usize>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log that keeps at most `limit` snapshots, dropping the oldest first.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.cursor.and_then(|index| self.entries.get(index))
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring.is_some()
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(index) if index > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(index) if index + 1 < self.entries.len())
    }

    /// Truncates everything after the cursor and appends `snapshot`.
    /// Returns `false` when ignored because a restore is in progress.
    pub fn snapshot(&mut self, snapshot: Snapshot) -> bool {
        if self.is_restoring() {
            tracing::trace!("snapshot suppressed during restore");
            return false;
        }

        let keep = self.cursor.map_or(0, |index| index + 1);
        let discarded = self.entries.len().saturating_sub(keep);
        self.entries.truncate(keep);
        self.entries.push(snapshot);

        if let Some(limit) = self.limit {
            let overflow = self.entries.len().saturating_sub(limit);
            if overflow > 0 {
                self.entries.drain(..overflow);
            }
        }
        self.cursor = Some(self.entries.len() - 1);
        tracing::debug!(
            cursor = self.entries.len() - 1,
            len = self.entries.len(),
            discarded,
            "history snapshot recorded"
        );
        true
    }

    /// Moves the cursor one step and opens a restore window. The caller must
    /// restore the scene from the returned snapshot and then call
    /// [`HistoryLog::finish_restore`] or [`HistoryLog::abort_restore`].
    pub fn begin_step(&mut self, step: HistoryStep) -> Option<Snapshot> {
        if self.is_restoring() {
            return None;
        }
        let current = self.cursor?;
        let target = match step {
            HistoryStep::Undo if current > 0 => current - 1,
            HistoryStep::Redo if current + 1 < self.entries.len() => current + 1,
            _ => {
                tracing::debug!(step = step.label(), cursor = current, "history step unavailable");
                return None;
            }
        };
        let snapshot = self.entries.get(target)?.clone();
        self.restoring = Some(RestoreInFlight {
            previous_cursor: self.cursor,
        });
        self.cursor = Some(target);
        tracing::debug!(step = step.label(), from = current, to = target, "history step");
        Some(snapshot)
    }

    pub fn finish_restore(&mut self) {
        self.restoring = None;
    }

    /// Closes the restore window and puts the cursor back where it was.
    pub fn abort_restore(&mut self) {
        if let Some(in_flight) = self.restoring.take() {
            self.cursor = in_flight.previous_cursor;
            tracing::warn!(cursor = ?self.cursor, "history restore aborted");
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
        self.restoring = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(value: &str) -> Snapshot {
        Snapshot::new(value.to_string())
    }

    fn step(log: &mut HistoryLog, step: HistoryStep) -> Option<Snapshot> {
        let snapshot = log.begin_step(step);
        log.finish_restore();
        snapshot
    }

    #[test]
    fn initial_snapshot_cannot_be_undone() {
        let mut log = HistoryLog::new();
        log.snapshot(snap("initial"));
        assert_eq!(log.cursor(), Some(0));
        assert!(!log.can_undo());
        assert_eq!(step(&mut log, HistoryStep::Undo), None);
        assert_eq!(log.cursor(), Some(0));
    }

    #[test]
    fn undo_and_redo_walk_the_log() {
        let mut log = HistoryLog::new();
        for value in ["s0", "s1", "s2", "s3"] {
            log.snapshot(snap(value));
        }

        assert_eq!(step(&mut log, HistoryStep::Undo), Some(snap("s2")));
        assert_eq!(step(&mut log, HistoryStep::Undo), Some(snap("s1")));
        assert_eq!(step(&mut log, HistoryStep::Undo), Some(snap("s0")));
        assert_eq!(step(&mut log, HistoryStep::Undo), None);

        assert_eq!(step(&mut log, HistoryStep::Redo), Some(snap("s1")));
        assert_eq!(step(&mut log, HistoryStep::Redo), Some(snap("s2")));
        assert_eq!(step(&mut log, HistoryStep::Redo), Some(snap("s3")));
        assert_eq!(step(&mut log, HistoryStep::Redo), None);
    }

    #[test]
    fn new_snapshot_after_undo_discards_redo_branch() {
        let mut log = HistoryLog::new();
        log.snapshot(snap("s0"));
        log.snapshot(snap("s1"));
        log.snapshot(snap("s2"));
        step(&mut log, HistoryStep::Undo);
        step(&mut log, HistoryStep::Undo);

        log.snapshot(snap("branch"));
        assert_eq!(log.len(), 2);
        assert!(!log.can_redo());
        assert_eq!(step(&mut log, HistoryStep::Redo), None);
        assert_eq!(log.current(), Some(&snap("branch")));
    }

    #[test]
    fn snapshots_are_ignored_while_restoring() {
        let mut log = HistoryLog::new();
        log.snapshot(snap("s0"));
        log.snapshot(snap("s1"));

        let restored = log.begin_step(HistoryStep::Undo);
        assert_eq!(restored, Some(snap("s0")));
        assert!(log.is_restoring());
        assert!(!log.snapshot(snap("echo")));
        log.finish_restore();

        assert_eq!(log.len(), 2);
        assert!(log.can_redo());
    }

    #[test]
    fn abort_restore_puts_cursor_back() {
        let mut log = HistoryLog::new();
        log.snapshot(snap("s0"));
        log.snapshot(snap("s1"));
        log.begin_step(HistoryStep::Undo);
        log.abort_restore();
        assert_eq!(log.cursor(), Some(1));
        assert!(!log.is_restoring());
    }

    #[test]
    fn limit_drops_oldest_snapshots() {
        let mut log = HistoryLog::with_limit(3);
        for value in ["s0", "s1", "s2", "s3", "s4"] {
            log.snapshot(snap(value));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.cursor(), Some(2));
        assert_eq!(step(&mut log, HistoryStep::Undo), Some(snap("s3")));
        assert_eq!(step(&mut log, HistoryStep::Undo), Some(snap("s2")));
        assert_eq!(step(&mut log, HistoryStep::Undo), None);
    }

    #[test]
    fn clear_resets_cursor() {
        let mut log = HistoryLog::new();
        log.snapshot(snap("s0"));
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.cursor(), None);
        assert!(!log.can_undo());
    }
}
