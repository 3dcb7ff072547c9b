use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::sleep_service::SleepInput;

use super::{SleepTransport, SyncError};

pub const QUEUE_FILE: &str = "sleep-queue.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSleep {
    pub id: Uuid,
    pub payload: SleepInput,
    pub fingerprint: String,
    pub enqueued_at: DateTime<Utc>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl PendingSleep {
    fn new(payload: SleepInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            fingerprint: fingerprint(&payload),
            payload,
            enqueued_at: Utc::now(),
            attempts: 0,
            last_error: None,
        }
    }
}

/// SHA-256 over the fields the server stores for a night.
pub fn fingerprint(payload: &SleepInput) -> String {
    let quality = payload.quality.map(|q| q.to_string()).unwrap_or_default();
    let canonical = format!("{}|{}|{}", payload.date, payload.hours, quality);
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Added,
    Replaced,
    Duplicate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub sent: usize,
    pub rejected: usize,
    pub remaining: usize,
    /// Why the flush ended before the queue was empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Another flush was already running.
    Skipped,
    Flushed(SyncReport),
}

/// Clears the syncing flag when dropped, including on early return or panic.
struct SyncingGuard<'a>(&'a AtomicBool);

impl<'a> SyncingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// File-backed FIFO of sleep logs waiting for the API.
pub struct SleepQueue {
    path: PathBuf,
    entries: Mutex<Vec<PendingSleep>>,
    syncing: AtomicBool,
}

impl SleepQueue {
    /// Load the queue at `path`; a missing file is an empty queue.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => Vec::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), count = entries.len(), "opened sleep queue");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
            syncing: AtomicBool::new(false),
        })
    }

    /// Queue stored in `dir` under the standard file name.
    pub async fn open_in(dir: &Path) -> Result<Self, SyncError> {
        Self::open(dir.join(QUEUE_FILE)).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn entries(&self) -> Vec<PendingSleep> {
        self.entries.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    pub async fn enqueue(&self, payload: SleepInput) -> Result<EnqueueOutcome, SyncError> {
        let pending = PendingSleep::new(payload);
        let mut entries = self.entries.lock().await;

        if entries.iter().any(|e| e.fingerprint == pending.fingerprint) {
            debug!(date = %pending.payload.date, "identical sleep log already queued");
            return Ok(EnqueueOutcome::Duplicate);
        }

        let outcome = match entries.iter_mut().find(|e| e.payload.date == pending.payload.date) {
            Some(existing) => {
                *existing = pending;
                EnqueueOutcome::Replaced
            }
            None => {
                entries.push(pending);
                EnqueueOutcome::Added
            }
        };

        self.persist(&entries).await?;
        info!(count = entries.len(), ?outcome, "queued sleep log for later sync");
        Ok(outcome)
    }

    /// Submit queued entries in order until the queue is empty or the
    /// transport reports a failure worth retrying later.
    pub async fn flush(&self, transport: &dyn SleepTransport) -> Result<FlushOutcome, SyncError> {
        let Some(_guard) = SyncingGuard::acquire(&self.syncing) else {
            debug!("sleep queue flush already running");
            return Ok(FlushOutcome::Skipped);
        };

        let mut report = SyncReport::default();

        loop {
            // The lock is not held across the network call so enqueue stays responsive
            let head = self.entries.lock().await.first().cloned();
            let Some(head) = head else {
                break;
            };

            match transport.submit(&head.payload).await {
                Ok(()) => {
                    self.remove(head.id).await?;
                    report.sent += 1;
                    debug!(date = %head.payload.date, "synced queued sleep log");
                }
                Err(SyncError::Unauthorized) => {
                    warn!("sleep queue flush stopped: not authenticated");
                    report.stopped = Some(SyncError::Unauthorized.to_string());
                    break;
                }
                Err(e) if e.is_transient() => {
                    warn!(date = %head.payload.date, error = %e, "sleep queue flush interrupted");
                    self.record_failure(head.id, &e).await?;
                    report.stopped = Some(e.to_string());
                    break;
                }
                Err(e) => {
                    warn!(date = %head.payload.date, error = %e, "dropping rejected sleep log");
                    self.remove(head.id).await?;
                    report.rejected += 1;
                }
            }
        }

        report.remaining = self.len().await;
        if report.sent > 0 || report.rejected > 0 {
            info!(sent = report.sent, rejected = report.rejected, remaining = report.remaining, "sleep queue flushed");
        }
        Ok(FlushOutcome::Flushed(report))
    }

    /// Poll connectivity every `interval` and flush whenever the API answers
    /// and something is queued. Runs until the task is dropped.
    pub async fn watch(&self, transport: &dyn SleepTransport, interval: Duration) -> Result<(), SyncError> {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if self.is_empty().await {
                continue;
            }
            if !transport.is_online().await {
                debug!("API unreachable, sleep queue waiting");
                continue;
            }
            if let FlushOutcome::Flushed(report) = self.flush(transport).await? {
                debug!(?report, "watch flush finished");
            }
        }
    }

    async fn remove(&self, id: Uuid) -> Result<(), SyncError> {
        let mut entries = self.entries.lock().await;
        entries.retain(|e| e.id != id);
        self.persist(&entries).await
    }

    async fn record_failure(&self, id: Uuid, error: &SyncError) -> Result<(), SyncError> {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.iter_mut().find(|e| e.id == id) {
            entry.attempts += 1;
            entry.last_error = Some(error.to_string());
        }
        self.persist(&entries).await
    }

    async fn persist(&self, entries: &[PendingSleep]) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use tempfile::TempDir;

    /// Answers submissions from a script; an exhausted script accepts everything.
    struct ScriptedTransport {
        script: StdMutex<VecDeque<Result<(), SyncError>>>,
        submitted: StdMutex<Vec<NaiveDate>>,
        online: bool,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<(), SyncError>>) -> Self {
            Self {
                script: StdMutex::new(script.into()),
                submitted: StdMutex::new(Vec::new()),
                online: true,
            }
        }

        fn submitted(&self) -> Vec<NaiveDate> {
            self.submitted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SleepTransport for ScriptedTransport {
        async fn submit(&self, payload: &SleepInput) -> Result<(), SyncError> {
            self.submitted.lock().unwrap().push(payload.date);
            self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }

        async fn is_online(&self) -> bool {
            self.online
        }
    }

    fn night(day: u32, hours: f64) -> SleepInput {
        SleepInput {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            hours,
            quality: Some(4),
        }
    }

    async fn queue_with(nights: &[SleepInput]) -> (SleepQueue, TempDir) {
        let tmp = TempDir::new().unwrap();
        let queue = SleepQueue::open_in(tmp.path()).await.unwrap();
        for n in nights {
            queue.enqueue(n.clone()).await.unwrap();
        }
        (queue, tmp)
    }

    #[test]
    fn fingerprint_tracks_stored_fields() {
        assert_eq!(fingerprint(&night(1, 7.5)), fingerprint(&night(1, 7.5)));
        assert_ne!(fingerprint(&night(1, 7.5)), fingerprint(&night(1, 8.0)));
        assert_ne!(fingerprint(&night(1, 7.5)), fingerprint(&night(2, 7.5)));
        assert_eq!(fingerprint(&night(1, 7.5)).len(), 64);
    }

    #[tokio::test]
    async fn enqueue_dedupes_and_replaces_per_date() {
        let (queue, _tmp) = queue_with(&[]).await;

        assert_eq!(queue.enqueue(night(1, 7.0)).await.unwrap(), EnqueueOutcome::Added);
        assert_eq!(queue.enqueue(night(1, 7.0)).await.unwrap(), EnqueueOutcome::Duplicate);
        assert_eq!(queue.enqueue(night(2, 6.0)).await.unwrap(), EnqueueOutcome::Added);
        assert_eq!(queue.enqueue(night(1, 8.5)).await.unwrap(), EnqueueOutcome::Replaced);

        let entries = queue.entries().await;
        assert_eq!(entries.len(), 2);
        // the replaced night keeps its position
        assert_eq!(entries[0].payload, night(1, 8.5));
        assert_eq!(entries[1].payload, night(2, 6.0));
    }

    #[tokio::test]
    async fn queue_survives_reopen() {
        let (queue, tmp) = queue_with(&[night(1, 7.0), night(2, 6.5)]).await;
        drop(queue);

        let reopened = SleepQueue::open_in(tmp.path()).await.unwrap();
        let dates: Vec<_> = reopened.entries().await.iter().map(|e| e.payload.date).collect();
        assert_eq!(dates, vec![night(1, 0.0).date, night(2, 0.0).date]);
    }

    #[tokio::test]
    async fn flush_sends_everything_in_order() {
        let (queue, tmp) = queue_with(&[night(3, 7.0), night(1, 6.0), night(2, 8.0)]).await;
        let transport = ScriptedTransport::new(vec![]);

        let outcome = queue.flush(&transport).await.unwrap();
        assert_eq!(
            outcome,
            FlushOutcome::Flushed(SyncReport { sent: 3, rejected: 0, remaining: 0, stopped: None })
        );
        assert_eq!(transport.submitted(), vec![night(3, 0.0).date, night(1, 0.0).date, night(2, 0.0).date]);

        let reopened = SleepQueue::open_in(tmp.path()).await.unwrap();
        assert!(reopened.is_empty().await);
    }

    #[tokio::test]
    async fn transient_failure_stops_and_records_attempt() {
        let (queue, _tmp) = queue_with(&[night(1, 7.0), night(2, 6.0), night(3, 8.0)]).await;
        let transport = ScriptedTransport::new(vec![
            Ok(()),
            Err(SyncError::Server { status: 503, message: "database unavailable".into() }),
        ]);

        let FlushOutcome::Flushed(report) = queue.flush(&transport).await.unwrap() else {
            panic!("flush skipped");
        };
        assert_eq!(report.sent, 1);
        assert_eq!(report.remaining, 2);
        assert!(report.stopped.is_some());
        assert_eq!(transport.submitted().len(), 2);

        let head = &queue.entries().await[0];
        assert_eq!(head.payload.date, night(2, 0.0).date);
        assert_eq!(head.attempts, 1);
        assert!(head.last_error.as_deref().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn rejected_entries_are_dropped() {
        let (queue, _tmp) = queue_with(&[night(1, 7.0), night(2, 6.0)]).await;
        let transport = ScriptedTransport::new(vec![Err(SyncError::from_status(400, "hours: invalid"))]);

        let FlushOutcome::Flushed(report) = queue.flush(&transport).await.unwrap() else {
            panic!("flush skipped");
        };
        assert_eq!(report.rejected, 1);
        assert_eq!(report.sent, 1);
        assert_eq!(report.remaining, 0);
    }

    #[tokio::test]
    async fn unauthorized_stops_without_dropping() {
        let (queue, _tmp) = queue_with(&[night(1, 7.0), night(2, 6.0)]).await;
        let transport = ScriptedTransport::new(vec![Err(SyncError::Unauthorized)]);

        let FlushOutcome::Flushed(report) = queue.flush(&transport).await.unwrap() else {
            panic!("flush skipped");
        };
        assert_eq!(report.sent, 0);
        assert_eq!(report.rejected, 0);
        assert_eq!(report.remaining, 2);
        assert_eq!(queue.entries().await[0].attempts, 0);
    }

    #[tokio::test]
    async fn concurrent_flush_is_skipped() {
        let (queue, _tmp) = queue_with(&[night(1, 7.0)]).await;
        let transport = ScriptedTransport::new(vec![]);

        {
            let _held = SyncingGuard::acquire(&queue.syncing).unwrap();
            assert!(queue.is_syncing());
            assert_eq!(queue.flush(&transport).await.unwrap(), FlushOutcome::Skipped);
            assert!(transport.submitted().is_empty());
        }

        assert!(!queue.is_syncing());
        assert!(matches!(queue.flush(&transport).await.unwrap(), FlushOutcome::Flushed(_)));
    }

    #[tokio::test]
    async fn watch_flushes_when_online() {
        let (queue, _tmp) = queue_with(&[night(1, 7.0)]).await;
        let transport = ScriptedTransport::new(vec![]);

        let _ = tokio::time::timeout(Duration::from_millis(200), queue.watch(&transport, Duration::from_millis(10))).await;
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn watch_waits_while_offline() {
        let (queue, _tmp) = queue_with(&[night(1, 7.0)]).await;
        let transport = ScriptedTransport { online: false, ..ScriptedTransport::new(vec![]) };

        let _ = tokio::time::timeout(Duration::from_millis(100), queue.watch(&transport, Duration::from_millis(10))).await;
        assert_eq!(queue.len().await, 1);
        assert!(transport.submitted().is_empty());
    }
}
