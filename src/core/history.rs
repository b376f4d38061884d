//! Conversation history kept under a single storage key
//!
//! The whole list is read, modified in memory and written back on every
//! change. Two clients sharing one backend will overwrite each other's
//! updates; the client is built for one user in one process.

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::conversation::ConversationRecord;
use crate::render::PresentationSink;
use crate::storage::{KeyValueStore, StorageError};

/// Records older than this drop out of the grouped view (they stay stored)
const RECENT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recency {
    Today,
    LastSevenDays,
}

impl Recency {
    pub fn title(&self) -> &'static str {
        match self {
            Recency::Today => "Today",
            Recency::LastSevenDays => "Last 7 Days",
        }
    }
}

/// Sidebar line for one conversation
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Index in the full most-recent-first list
    pub position: usize,
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    fn new(position: usize, record: &ConversationRecord) -> Self {
        Self {
            position,
            id: record.id(),
            title: record.title().to_string(),
            created_at: record.created_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryGroup {
    pub label: Recency,
    pub entries: Vec<HistoryEntry>,
}

pub struct HistoryStore {
    backend: Arc<dyn KeyValueStore>,
    key: String,
    max_entries: Option<usize>,
    records: Vec<ConversationRecord>,
    sink: Arc<dyn PresentationSink>,
}

impl HistoryStore {
    /// An empty store; call [`HistoryStore::load_all`] to pull persisted state
    pub fn new(
        backend: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        sink: Arc<dyn PresentationSink>,
    ) -> Self {
        Self {
            backend,
            key: key.into(),
            max_entries: None,
            records: Vec::new(),
            sink,
        }
    }

    /// Cap the number of kept conversations; `None` keeps everything
    pub fn with_max_entries(mut self, max_entries: Option<usize>) -> Self {
        self.max_entries = max_entries.filter(|n| *n > 0);
        self
    }

    /// Replace in-memory state with what the backend holds
    pub async fn load_all(&mut self) -> &[ConversationRecord] {
        self.records = match self.backend.read(&self.key).await {
            Ok(Some(value)) => self.decode(value),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Could not read history, starting empty: {}", e);
                Vec::new()
            }
        };
        if let Some(max) = self.max_entries {
            self.records.truncate(max);
        }

        tracing::debug!("Loaded {} conversation(s)", self.records.len());
        self.notify();
        &self.records
    }

    fn decode(&self, value: serde_json::Value) -> Vec<ConversationRecord> {
        let records: Vec<ConversationRecord> = match serde_json::from_value(value) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Discarding unreadable history under '{}': {}", self.key, e);
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        records
            .into_iter()
            .filter(|r| !r.is_empty() && seen.insert(r.id()))
            .collect()
    }

    /// Insert or refresh `record` at the front. Empty records are never stored.
    pub async fn save(&mut self, record: &ConversationRecord) -> Result<(), StorageError> {
        if record.is_empty() {
            tracing::debug!("Not saving empty conversation {}", record.id());
            return Ok(());
        }

        self.records.retain(|r| r.id() != record.id());
        self.records.insert(0, record.clone());
        if let Some(max) = self.max_entries {
            self.records.truncate(max);
        }

        let result = self.persist().await;
        self.notify();
        result
    }

    /// Returns whether a record was removed
    pub async fn remove(&mut self, id: Uuid) -> Result<bool, StorageError> {
        let before = self.records.len();
        self.records.retain(|r| r.id() != id);
        if self.records.len() == before {
            return Ok(false);
        }

        let result = self.persist().await;
        self.notify();
        result.map(|_| true)
    }

    pub async fn clear_all(&mut self) -> Result<(), StorageError> {
        self.records.clear();
        let result = self.backend.remove(&self.key).await;
        self.notify();
        result
    }

    async fn persist(&self) -> Result<(), StorageError> {
        let value = serde_json::to_value(&self.records)?;
        self.backend.write(&self.key, &value).await
    }

    fn notify(&self) {
        self.sink.history_changed(&self.group_by_recency(&Local::now()));
    }

    pub fn records(&self) -> &[ConversationRecord] {
        &self.records
    }

    pub fn get(&self, id: Uuid) -> Option<&ConversationRecord> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| HistoryEntry::new(i, r))
            .collect()
    }

    /// Bucket records into "today" and "last 7 days" relative to `now`, in
    /// `now`'s time zone. Older records and empty buckets are left out.
    pub fn group_by_recency<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<HistoryGroup> {
        let tz = now.timezone();
        let today = now.date_naive();
        let now_utc = now.with_timezone(&Utc);
        let window = Duration::days(RECENT_WINDOW_DAYS);

        let mut today_entries = Vec::new();
        let mut week_entries = Vec::new();

        for (position, record) in self.records.iter().enumerate() {
            if record.created_at().with_timezone(&tz).date_naive() == today {
                today_entries.push(HistoryEntry::new(position, record));
            } else if now_utc - record.created_at() <= window {
                week_entries.push(HistoryEntry::new(position, record));
            }
        }

        [
            (Recency::Today, today_entries),
            (Recency::LastSevenDays, week_entries),
        ]
        .into_iter()
        .filter(|(_, entries)| !entries.is_empty())
        .map(|(label, entries)| HistoryGroup { label, entries })
        .collect()
    }

    /// Case-insensitive title filter; an empty term matches everything
    pub fn search(&self, term: &str) -> Vec<HistoryEntry> {
        let needle = term.trim().to_lowercase();
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.title().to_lowercase().contains(&needle))
            .map(|(i, r)| HistoryEntry::new(i, r))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{RecordingSink, SinkEvent};
    use crate::storage::InMemoryStore;
    use chrono::FixedOffset;

    const KEY: &str = "neuralflow_history";

    fn store() -> (HistoryStore, Arc<InMemoryStore>, Arc<RecordingSink>) {
        let backend = Arc::new(InMemoryStore::new());
        let sink = Arc::new(RecordingSink::default());
        let history = HistoryStore::new(backend.clone(), KEY, sink.clone());
        (history, backend, sink)
    }

    fn record(title: &str, created_at: DateTime<Utc>) -> ConversationRecord {
        let mut record = ConversationRecord::with_created_at(title, created_at);
        record.add_user(title);
        record
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let (mut history, backend, sink) = store();
        let saved = record("TACO 0014-SF1", Utc::now());
        history.save(&saved).await.unwrap();

        let mut reloaded = HistoryStore::new(backend, KEY, sink);
        let records = reloaded.load_all().await;
        assert_eq!(records.first(), Some(&saved));
    }

    #[tokio::test]
    async fn test_resave_moves_to_front_without_duplicating() {
        let (mut history, _, _) = store();
        let mut first = record("first", Utc::now());
        let second = record("second", Utc::now());

        history.save(&first).await.unwrap();
        history.save(&second).await.unwrap();
        assert_eq!(history.records()[0].id(), second.id());

        first.add_assistant("answer");
        history.save(&first).await.unwrap();

        assert_eq!(history.records().len(), 2);
        assert_eq!(history.records()[0], first);
        assert_eq!(history.records()[1].id(), second.id());
    }

    #[tokio::test]
    async fn test_empty_record_is_never_persisted() {
        let (mut history, backend, _) = store();
        history.save(&ConversationRecord::new("nothing yet")).await.unwrap();

        assert!(history.records().is_empty());
        assert!(backend.read(KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cap_drops_oldest() {
        let (history, _, _) = store();
        let mut history = history.with_max_entries(Some(2));

        let oldest = record("a", Utc::now());
        history.save(&oldest).await.unwrap();
        history.save(&record("b", Utc::now())).await.unwrap();
        history.save(&record("c", Utc::now())).await.unwrap();

        assert_eq!(history.records().len(), 2);
        assert!(history.get(oldest.id()).is_none());
    }

    #[tokio::test]
    async fn test_corrupt_history_loads_empty() {
        let (mut history, backend, _) = store();
        backend.insert_raw(KEY, "[{\"id\": oops");
        assert!(history.load_all().await.is_empty());

        backend.insert_raw(KEY, r#"["TACO 0014-SF1", "WILO Stratos"]"#);
        assert!(history.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_drops_duplicates_and_empty_records() {
        let (mut history, backend, _) = store();
        let kept = record("kept", Utc::now());
        let empty = ConversationRecord::new("empty");
        let value = serde_json::json!([kept, kept, empty]);
        backend.write(KEY, &value).await.unwrap();

        let records = history.load_all().await;
        assert_eq!(records, &[kept]);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let (mut history, backend, _) = store();
        let a = record("a", Utc::now());
        let b = record("b", Utc::now());
        history.save(&a).await.unwrap();
        history.save(&b).await.unwrap();

        assert!(history.remove(a.id()).await.unwrap());
        assert!(!history.remove(a.id()).await.unwrap());
        assert_eq!(history.records(), &[b]);

        history.clear_all().await.unwrap();
        assert!(history.records().is_empty());
        assert!(backend.read(KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_every_mutation_notifies_sink() {
        let (mut history, _, sink) = store();
        let a = record("a", Utc::now());

        history.load_all().await;
        history.save(&a).await.unwrap();
        history.remove(a.id()).await.unwrap();
        history.clear_all().await.unwrap();

        assert_eq!(sink.count(|e| matches!(e, SinkEvent::HistoryChanged(_))), 4);
    }

    #[tokio::test]
    async fn test_group_by_recency() {
        let (mut history, _, _) = store();
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 15, 0, 0).unwrap();

        let ancient = record("ancient", now - Duration::days(10));
        let tuesday = record("tuesday", now - Duration::days(5));
        let yesterday = record("yesterday", now - Duration::hours(20));
        let morning = record("morning", now - Duration::hours(3));
        for r in [&ancient, &tuesday, &yesterday, &morning] {
            history.save(r).await.unwrap();
        }

        let groups = history.group_by_recency(&now);
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].label, Recency::Today);
        let today: Vec<_> = groups[0].entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(today, vec!["morning"]);

        assert_eq!(groups[1].label, Recency::LastSevenDays);
        let week: Vec<_> = groups[1].entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(week, vec!["yesterday", "tuesday"]);

        // Still stored, just not shown
        assert!(history.get(ancient.id()).is_some());
    }

    #[tokio::test]
    async fn test_recency_window_edges_in_local_time() {
        let (mut history, _, _) = store();
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        // 2026-10-18 16:00 UTC
        let now = tz.with_ymd_and_hms(2026, 10, 19, 1, 0, 0).unwrap();
        let at = |age: Duration| (now - age).with_timezone(&Utc);

        let too_old = record("too old", at(Duration::days(7) + Duration::seconds(1)));
        let week_edge = record("week edge", at(Duration::days(7)));
        let late_evening = record("late evening", at(Duration::hours(2)));
        let just_now = record("just now", at(Duration::minutes(30)));
        for r in [&too_old, &week_edge, &late_evening, &just_now] {
            history.save(r).await.unwrap();
        }

        let groups = history.group_by_recency(&now);
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].label, Recency::Today);
        let today: Vec<_> = groups[0].entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(today, vec!["just now"]);

        // Under two hours old, but the previous calendar day at +09:00
        assert_eq!(groups[1].label, Recency::LastSevenDays);
        let week: Vec<_> = groups[1].entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(week, vec!["late evening", "week edge"]);
    }

    #[tokio::test]
    async fn test_empty_groups_are_omitted() {
        let (mut history, _, _) = store();
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 15, 0, 0).unwrap();
        history.save(&record("old", now - Duration::days(3))).await.unwrap();

        let groups = history.group_by_recency(&now);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, Recency::LastSevenDays);

        history.clear_all().await.unwrap();
        assert!(history.group_by_recency(&now).is_empty());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let (mut history, _, _) = store();
        history.save(&record("TACO 0014-SF1", Utc::now())).await.unwrap();
        history.save(&record("WILO Stratos", Utc::now())).await.unwrap();

        let hits = history.search("taco");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "TACO 0014-SF1");
        assert_eq!(hits[0].position, 1);

        assert_eq!(history.search("").len(), 2);
        assert!(history.search("grundfos").is_empty());
    }
}
