//! Statistics service: the ledger, the watermark and report assembly.
//!
//! Deleting statistics never touches the ledger file. `clear_report` moves
//! the watermark past every visible record instead; `compact` later drops
//! the hidden records for real.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::core::{GameRecord, StandardSize};
use crate::error::{Result, StatsError};
use crate::stats::{classify, Category, StatsSummary, Tally};
use crate::storage::{LedgerStore, WatermarkStore};

/// Build a report from already-filtered records.
///
/// One summary per non-empty category, in display order.
pub fn build_report(standard: &StandardSize, records: &[GameRecord]) -> Vec<StatsSummary> {
    classify(standard, records)
        .into_iter()
        .map(|(category, members)| Tally::from_records(members).summarize(category))
        .filter(|summary| !summary.is_empty())
        .collect()
}

/// Records, reports and logical deletion over a ledger and a watermark.
///
/// Safe to share across threads. Appends, clears and compactions are
/// serialized so no read-then-write step can interleave with another.
#[derive(Debug)]
pub struct StatsService<L: LedgerStore, W: WatermarkStore> {
    ledger: L,
    watermark: W,
    lock: Mutex<()>,
}

impl<L: LedgerStore, W: WatermarkStore> StatsService<L, W> {
    /// Create a service over the given stores.
    pub fn new(ledger: L, watermark: W) -> Self {
        Self {
            ledger,
            watermark,
            lock: Mutex::new(()),
        }
    }

    /// Get the underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Current watermark.
    pub fn watermark(&self) -> Result<u64> {
        self.watermark.get()
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate and append one record.
    ///
    /// The id must be above every id already in the ledger.
    pub fn append_record(&self, record: &GameRecord) -> Result<()> {
        let _guard = self.guard();
        self.append_locked(record)
    }

    fn append_locked(&self, record: &GameRecord) -> Result<()> {
        record.validate()?;
        if let Some(last) = self.last_id()? {
            if record.id <= last {
                return Err(StatsError::invalid_record(format!(
                    "record id {} is not above the last id {}",
                    record.id, last
                )));
            }
        }
        self.ledger.append(record)
    }

    fn last_id(&self) -> Result<Option<u64>> {
        Ok(self.ledger.read_all()?.iter().map(|r| r.id).max())
    }

    /// The id the next record should use.
    ///
    /// Never below the watermark, so a record appended after a purge is
    /// not hidden by an old clear.
    pub fn next_record_id(&self) -> Result<u64> {
        let after_last = match self.last_id()? {
            Some(last) => last
                .checked_add(1)
                .ok_or_else(|| StatsError::invalid_record("record ids exhausted"))?,
            None => 0,
        };
        Ok(after_last.max(self.watermark.get()?))
    }

    /// Assign the next id to a finished game and append it.
    pub fn record_game(
        &self,
        width: u32,
        height: u32,
        mines: u32,
        duration: u64,
        won: bool,
        open_area: u32,
    ) -> Result<GameRecord> {
        let _guard = self.guard();
        let record = GameRecord::new(self.next_record_id()?, width, height, mines)
            .with_duration(duration)
            .with_victory(won)
            .with_open_area(open_area);
        self.append_locked(&record)?;
        Ok(record)
    }

    /// Records with id at least `min_id`.
    pub fn records_since(&self, min_id: u64) -> Result<Vec<GameRecord>> {
        self.ledger.read_since(min_id)
    }

    /// Records not hidden by the watermark.
    pub fn visible_records(&self) -> Result<Vec<GameRecord>> {
        self.records_since(self.watermark.get()?)
    }

    /// Build the statistics report for the visible records.
    pub fn report(&self, standard: &StandardSize) -> Result<Vec<StatsSummary>> {
        let records = self.visible_records()?;
        let report = build_report(standard, &records);

        tracing::debug!(
            record_count = records.len(),
            categories = report.len(),
            standard = %standard,
            "built statistics report"
        );
        Ok(report)
    }

    /// Summary for a single category, even when it is empty.
    pub fn summary(&self, standard: &StandardSize, category: Category) -> Result<StatsSummary> {
        let records = self.visible_records()?;
        let members = records.iter().filter(|r| category.matches(standard, r));
        Ok(Tally::from_records(members).summarize(category))
    }

    /// Hide every record currently in the ledger.
    ///
    /// Moves the watermark to one past the highest id. Leaves it alone when
    /// the ledger is empty, and never lowers it. Returns the watermark in
    /// effect afterwards.
    pub fn clear_report(&self) -> Result<u64> {
        let _guard = self.guard();
        let current = self.watermark.get()?;

        let Some(max_id) = self.last_id()? else {
            return Ok(current);
        };

        let next = max_id.saturating_add(1);
        if next > current {
            self.watermark.set(next)?;
            tracing::info!(previous = current, watermark = next, "cleared statistics");
            Ok(next)
        } else {
            Ok(current)
        }
    }

    /// Physically drop records hidden by the watermark.
    ///
    /// Returns the number of records removed. Any torn tail is dropped too.
    pub fn compact(&self) -> Result<usize> {
        let _guard = self.guard();
        let watermark = self.watermark.get()?;
        let records = self.ledger.read_all()?;
        let total = records.len();

        let kept: Vec<GameRecord> = records.into_iter().filter(|r| r.id >= watermark).collect();
        let removed = total - kept.len();
        self.ledger.replace_all(&kept)?;

        tracing::info!(watermark, removed, kept = kept.len(), "compacted ledger");
        Ok(removed)
    }

    /// Destroy the whole ledger.
    ///
    /// The watermark is kept, so ids handed out afterwards stay above it.
    pub fn purge(&self) -> Result<()> {
        let _guard = self.guard();
        self.ledger.delete_all()?;
        tracing::info!("purged ledger");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileLedger, FileWatermark, MemoryLedger, MemoryWatermark};
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn memory_service() -> StatsService<MemoryLedger, MemoryWatermark> {
        StatsService::new(MemoryLedger::new(), MemoryWatermark::new())
    }

    fn file_service(dir: &TempDir) -> StatsService<FileLedger, FileWatermark> {
        StatsService::new(
            FileLedger::with_path(dir.path().join("stats")).with_sync_writes(false),
            FileWatermark::with_path(dir.path().join("stats-base.json")),
        )
    }

    fn beginner_std() -> StandardSize {
        StandardSize::new(9, 9, 10).unwrap()
    }

    fn find(report: &[StatsSummary], category: Category) -> Option<&StatsSummary> {
        report.iter().find(|s| s.category == category)
    }

    fn scenario_records() -> Vec<GameRecord> {
        vec![
            GameRecord::new(0, 9, 9, 10)
                .with_duration(50)
                .with_victory(true)
                .with_open_area(71),
            GameRecord::new(1, 16, 16, 40).with_duration(120),
            GameRecord::new(2, 11, 11, 12)
                .with_duration(80)
                .with_victory(true),
        ]
    }

    #[test]
    fn test_scenario_report() {
        let service = memory_service();
        for record in scenario_records() {
            service.append_record(&record).unwrap();
        }

        let report = service.report(&beginner_std()).unwrap();

        let general = find(&report, Category::General).unwrap();
        assert_eq!(general.total_games, 3);

        let beginner = find(&report, Category::Beginner).unwrap();
        assert_eq!(beginner.total_games, 1);
        assert_eq!(beginner.victory_count, 1);
        assert_eq!(beginner.shortest_victory_time, 50);

        let intermediate = find(&report, Category::Intermediate).unwrap();
        assert_eq!(intermediate.total_games, 1);
        assert_eq!(intermediate.victory_count, 0);
        assert_eq!(intermediate.average_victory_time, 0);

        assert_eq!(find(&report, Category::Progressive).unwrap().total_games, 1);
        assert_eq!(find(&report, Category::FixedSize).unwrap().total_games, 1);

        assert!(find(&report, Category::Expert).is_none());
        assert!(find(&report, Category::Master).is_none());
        assert!(find(&report, Category::Legend).is_none());

        // The 11x11 board is neither a named board nor the standard size
        let custom = find(&report, Category::Custom).unwrap();
        assert_eq!(custom.total_games, 1);
        assert_eq!(custom.total_time, 80);
    }

    #[test]
    fn test_report_follows_display_order() {
        let service = memory_service();
        for record in scenario_records() {
            service.append_record(&record).unwrap();
        }

        let order: Vec<Category> = service
            .report(&beginner_std())
            .unwrap()
            .iter()
            .map(|s| s.category)
            .collect();
        assert_eq!(
            order,
            vec![
                Category::General,
                Category::Progressive,
                Category::FixedSize,
                Category::Intermediate,
                Category::Beginner,
                Category::Custom,
            ]
        );
    }

    #[test]
    fn test_empty_ledger_empty_report() {
        let service = memory_service();
        assert!(service.report(&StandardSize::default()).unwrap().is_empty());
    }

    #[test]
    fn test_clear_report_hides_everything() {
        let service = memory_service();
        for record in scenario_records() {
            service.append_record(&record).unwrap();
        }

        assert_eq!(service.clear_report().unwrap(), 3);
        assert_eq!(service.watermark().unwrap(), 3);
        assert!(service.report(&beginner_std()).unwrap().is_empty());

        // Records are still physically present
        assert_eq!(service.ledger().len(), 3);
    }

    #[test]
    fn test_clear_report_on_empty_ledger_keeps_watermark() {
        let service = memory_service();
        assert_eq!(service.clear_report().unwrap(), 0);
        assert_eq!(service.watermark().unwrap(), 0);
    }

    #[test]
    fn test_clear_report_never_lowers_watermark() {
        let service = StatsService::new(MemoryLedger::new(), MemoryWatermark::new());
        service.watermark.set(100).unwrap();
        service
            .append_record(&GameRecord::new(5, 9, 9, 10))
            .unwrap();

        assert_eq!(service.clear_report().unwrap(), 100);
        assert_eq!(service.watermark().unwrap(), 100);
    }

    #[test]
    fn test_record_after_clear_is_only_visible_record() {
        let service = memory_service();
        for record in scenario_records() {
            service.append_record(&record).unwrap();
        }
        service.clear_report().unwrap();

        let record = service.record_game(24, 24, 99, 300, true, 477).unwrap();
        assert_eq!(record.id, 3);

        let report = service.report(&beginner_std()).unwrap();
        let categories: Vec<Category> = report.iter().map(|s| s.category).collect();
        assert_eq!(categories, vec![Category::General, Category::Expert]);
        assert!(report.iter().all(|s| s.total_games == 1));
        assert_eq!(report[1].shortest_victory_time, 300);
    }

    #[test]
    fn test_records_since_filters_by_id() {
        let service = memory_service();
        for record in scenario_records() {
            service.append_record(&record).unwrap();
        }

        let ids: Vec<u64> = service
            .records_since(1)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(service.records_since(10).unwrap().is_empty());
    }

    #[test]
    fn test_append_rejects_invalid_record() {
        let service = memory_service();
        let err = service
            .append_record(&GameRecord::new(0, 3, 3, 10))
            .unwrap_err();
        assert!(matches!(err, crate::error::StatsError::InvalidRecord { .. }));
        assert!(service.ledger().is_empty());
    }

    #[test]
    fn test_append_rejects_non_increasing_id() {
        let service = memory_service();
        service
            .append_record(&GameRecord::new(5, 9, 9, 10))
            .unwrap();

        for id in [3, 5] {
            let err = service
                .append_record(&GameRecord::new(id, 9, 9, 10))
                .unwrap_err();
            assert!(matches!(err, crate::error::StatsError::InvalidRecord { .. }));
        }
        assert_eq!(service.ledger().len(), 1);

        service
            .append_record(&GameRecord::new(6, 9, 9, 10))
            .unwrap();
        assert_eq!(service.ledger().len(), 2);
    }

    #[test]
    fn test_next_record_id_at_max_id_is_an_error() {
        let service = memory_service();
        service
            .append_record(&GameRecord::new(u64::MAX, 9, 9, 10))
            .unwrap();

        let err = service.next_record_id().unwrap_err();
        assert!(matches!(err, crate::error::StatsError::InvalidRecord { .. }));
        assert!(service.record_game(9, 9, 10, 1, false, 0).is_err());
        assert_eq!(service.clear_report().unwrap(), u64::MAX);
    }

    #[test]
    fn test_record_after_torn_tail_is_counted() {
        let dir = TempDir::new().unwrap();
        let service = file_service(&dir);
        service.record_game(9, 9, 10, 20, true, 71).unwrap();

        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(service.ledger().path())
            .unwrap();
        std::io::Write::write_all(&mut file, br#"{"v":1,"id":1,"wid"#).unwrap();
        drop(file);

        let a = service.record_game(9, 9, 10, 30, false, 5).unwrap();
        let b = service.record_game(16, 16, 40, 90, true, 216).unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        let ids: Vec<u64> = service
            .ledger()
            .read_all()
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![0, 1, 2]);

        let report = service.report(&beginner_std()).unwrap();
        assert_eq!(find(&report, Category::General).unwrap().total_games, 3);
    }

    #[test]
    fn test_next_record_id() {
        let service = memory_service();
        assert_eq!(service.next_record_id().unwrap(), 0);

        service
            .append_record(&GameRecord::new(41, 9, 9, 10))
            .unwrap();
        assert_eq!(service.next_record_id().unwrap(), 42);
    }

    #[test]
    fn test_next_record_id_respects_watermark_after_purge() {
        let service = memory_service();
        for record in scenario_records() {
            service.append_record(&record).unwrap();
        }
        service.clear_report().unwrap();
        service.purge().unwrap();

        assert_eq!(service.next_record_id().unwrap(), 3);

        service.record_game(9, 9, 10, 12, true, 71).unwrap();
        let report = service.report(&beginner_std()).unwrap();
        assert_eq!(report[0].total_games, 1);
    }

    #[test]
    fn test_summary_of_empty_category() {
        let service = memory_service();
        for record in scenario_records() {
            service.append_record(&record).unwrap();
        }

        let expert = service.summary(&beginner_std(), Category::Expert).unwrap();
        assert!(expert.is_empty());
        assert_eq!(expert.category, Category::Expert);
    }

    #[test]
    fn test_file_clear_leaves_file_and_purge_removes_it() {
        let dir = TempDir::new().unwrap();
        let service = file_service(&dir);
        for record in scenario_records() {
            service.append_record(&record).unwrap();
        }

        service.clear_report().unwrap();
        assert!(service.ledger().path().exists());
        assert!(service.report(&beginner_std()).unwrap().is_empty());

        service.purge().unwrap();
        assert!(!service.ledger().path().exists());
        assert!(service.ledger().read_all().unwrap().is_empty());
    }

    #[test]
    fn test_watermark_survives_restart() {
        let dir = TempDir::new().unwrap();
        {
            let service = file_service(&dir);
            for record in scenario_records() {
                service.append_record(&record).unwrap();
            }
            service.clear_report().unwrap();
        }

        let service = file_service(&dir);
        assert_eq!(service.watermark().unwrap(), 3);
        assert!(service.report(&beginner_std()).unwrap().is_empty());
        assert_eq!(service.ledger().read_all().unwrap().len(), 3);
    }

    #[test]
    fn test_compact_drops_hidden_records() {
        let dir = TempDir::new().unwrap();
        let service = file_service(&dir);
        for record in scenario_records() {
            service.append_record(&record).unwrap();
        }
        service.clear_report().unwrap();
        service.record_game(16, 16, 40, 90, true, 216).unwrap();

        let before = service.report(&beginner_std()).unwrap();
        assert_eq!(service.compact().unwrap(), 3);

        let remaining = service.ledger().read_all().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, 3);
        assert_eq!(service.report(&beginner_std()).unwrap(), before);
        assert_eq!(service.watermark().unwrap(), 3);
    }

    #[test]
    fn test_compact_without_watermark_keeps_everything() {
        let service = memory_service();
        for record in scenario_records() {
            service.append_record(&record).unwrap();
        }

        assert_eq!(service.compact().unwrap(), 0);
        assert_eq!(service.ledger().len(), 3);
    }

    #[test]
    fn test_concurrent_record_game_assigns_unique_ids() {
        let dir = TempDir::new().unwrap();
        let service = Arc::new(file_service(&dir));
        let mut handles = vec![];

        for _ in 0..4 {
            let service = Arc::clone(&service);
            handles.push(thread::spawn(move || {
                for _ in 0..10 {
                    service.record_game(9, 9, 10, 20, false, 3).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let ids: Vec<u64> = service
            .ledger()
            .read_all()
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, (0..40).collect::<Vec<u64>>());
    }

    #[test]
    fn test_build_report_skips_empty_categories() {
        let records = vec![GameRecord::new(0, 24, 24, 99).with_duration(10)];
        let report = build_report(&StandardSize::default(), &records);

        let categories: Vec<Category> = report.iter().map(|s| s.category).collect();
        assert_eq!(categories, vec![Category::General, Category::Expert]);
    }
}
