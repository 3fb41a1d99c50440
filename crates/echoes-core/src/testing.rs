//! テスト用の ports 実装
//!
//! - ScriptedPredictionClient: 台本どおりに job status を返す
//! - FlakyBlobStore: InMemoryBlobStore に失敗注入を足したもの
//! - FakeNormalizer / RecordingProgressSink
//!
//! `Journal` is shared between the fakes so a test can check the order of
//! status fetches and blob writes.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{
    BlobRef, ContributionStatus, PredictionJob, PredictionSpec, PredictionStatus, ProgressEvent,
    SourceImageType,
};
use crate::impls::InMemoryBlobStore;
use crate::ports::{
    BlobError, BlobStore, ImageNormalizer, NormalizeError, PredictionClient, PredictionError,
    ProgressSink,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum JournalEntry {
    Get(String),
    Put(String),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Journal(Arc<Mutex<Vec<JournalEntry>>>);

impl Journal {
    fn push(&self, entry: JournalEntry) {
        self.0.lock().unwrap().push(entry);
    }

    pub(crate) fn entries(&self) -> Vec<JournalEntry> {
        self.0.lock().unwrap().clone()
    }
}

/// Responses for one job: `get` walks through them, the last one repeats.
#[derive(Debug, Clone)]
pub(crate) struct JobScript {
    id: String,
    polls: VecDeque<Result<PredictionJob, String>>,
}

impl JobScript {
    pub(crate) fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            polls: VecDeque::new(),
        }
    }

    /// `n` polls that report `processing`.
    pub(crate) fn processing(mut self, n: usize) -> Self {
        for _ in 0..n {
            self.polls
                .push_back(Ok(PredictionJob::new(&self.id, PredictionStatus::Processing)));
        }
        self
    }

    pub(crate) fn succeeds(self, output: serde_json::Value) -> Self {
        let job = PredictionJob::new(&self.id, PredictionStatus::Succeeded).with_output(output);
        self.then(job)
    }

    pub(crate) fn fails(self, error: &str) -> Self {
        let job = PredictionJob::new(&self.id, PredictionStatus::Failed).with_error(error);
        self.then(job)
    }

    /// The status fetch itself errors.
    pub(crate) fn status_error(mut self, message: &str) -> Self {
        self.polls.push_back(Err(message.to_string()));
        self
    }

    pub(crate) fn then(mut self, job: PredictionJob) -> Self {
        self.polls.push_back(Ok(job));
        self
    }

    fn next(&mut self) -> Option<Result<PredictionJob, String>> {
        if self.polls.len() > 1 {
            self.polls.pop_front()
        } else {
            self.polls.front().cloned()
        }
    }
}

#[derive(Default)]
struct ScriptState {
    /// `None` makes the matching `create` call fail.
    pending: VecDeque<Option<JobScript>>,
    active: HashMap<String, JobScript>,
    created: Vec<PredictionSpec>,
    gets: HashMap<String, usize>,
    cancelled: Vec<String>,
    downloads: HashMap<String, Bytes>,
}

/// Prediction client that plays back scripted jobs in creation order.
#[derive(Default)]
pub(crate) struct ScriptedPredictionClient {
    state: Mutex<ScriptState>,
    journal: Option<Journal>,
}

impl ScriptedPredictionClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub(crate) fn script(self, job: JobScript) -> Self {
        self.state.lock().unwrap().pending.push_back(Some(job));
        self
    }

    pub(crate) fn fail_next_create(self) -> Self {
        self.state.lock().unwrap().pending.push_back(None);
        self
    }

    pub(crate) fn serve(self, url: &str, body: &'static [u8]) -> Self {
        self.state
            .lock()
            .unwrap()
            .downloads
            .insert(url.to_string(), Bytes::from_static(body));
        self
    }

    pub(crate) fn created(&self) -> Vec<PredictionSpec> {
        self.state.lock().unwrap().created.clone()
    }

    pub(crate) fn get_count(&self, id: &str) -> usize {
        self.state.lock().unwrap().gets.get(id).copied().unwrap_or(0)
    }

    pub(crate) fn cancelled(&self) -> Vec<String> {
        self.state.lock().unwrap().cancelled.clone()
    }
}

#[async_trait]
impl PredictionClient for ScriptedPredictionClient {
    async fn create(&self, spec: &PredictionSpec) -> Result<PredictionJob, PredictionError> {
        let mut state = self.state.lock().unwrap();
        state.created.push(spec.clone());
        match state.pending.pop_front() {
            Some(Some(script)) => {
                let job = PredictionJob::new(&script.id, PredictionStatus::Starting);
                state.active.insert(script.id.clone(), script);
                Ok(job)
            }
            Some(None) => Err(PredictionError::Status {
                status: 422,
                body: "invalid input".into(),
            }),
            None => Err(PredictionError::Decode("no scripted job left".into())),
        }
    }

    async fn get(&self, id: &str) -> Result<PredictionJob, PredictionError> {
        if let Some(journal) = &self.journal {
            journal.push(JournalEntry::Get(id.to_string()));
        }
        let mut state = self.state.lock().unwrap();
        *state.gets.entry(id.to_string()).or_default() += 1;
        let script = state
            .active
            .get_mut(id)
            .ok_or_else(|| PredictionError::Decode(format!("unknown job {id}")))?;
        match script.next() {
            Some(Ok(job)) => Ok(job),
            Some(Err(message)) => Err(PredictionError::Transport(message)),
            None => Err(PredictionError::Decode(format!("job {id} has no script"))),
        }
    }

    async fn cancel(&self, id: &str) -> Result<(), PredictionError> {
        self.state.lock().unwrap().cancelled.push(id.to_string());
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<Bytes, PredictionError> {
        self.state
            .lock()
            .unwrap()
            .downloads
            .get(url)
            .cloned()
            .ok_or_else(|| PredictionError::Status {
                status: 404,
                body: format!("nothing at {url}"),
            })
    }
}

/// InMemoryBlobStore with injectable failures.
#[derive(Default)]
pub(crate) struct FlakyBlobStore {
    inner: InMemoryBlobStore,
    failing_deletes: Mutex<HashSet<String>>,
    failing_puts: Mutex<HashSet<String>>,
    fail_list: AtomicBool,
    journal: Option<Journal>,
}

impl FlakyBlobStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Deletes of keys ending in `file_name` fail.
    pub(crate) fn fail_deletes_of(self, file_name: &str) -> Self {
        self.failing_deletes
            .lock()
            .unwrap()
            .insert(file_name.to_string());
        self
    }

    /// Puts of keys ending in `file_name` fail.
    pub(crate) fn fail_puts_of(self, file_name: &str) -> Self {
        self.failing_puts.lock().unwrap().insert(file_name.to_string());
        self
    }

    pub(crate) fn fail_listing(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn inner(&self) -> &InMemoryBlobStore {
        &self.inner
    }

    fn matches(set: &Mutex<HashSet<String>>, key: &str) -> bool {
        set.lock().unwrap().iter().any(|suffix| key.ends_with(suffix))
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<BlobRef, BlobError> {
        if let Some(journal) = &self.journal {
            journal.push(JournalEntry::Put(key.to_string()));
        }
        if Self::matches(&self.failing_puts, key) {
            return Err(BlobError::Status {
                status: 503,
                body: "store unavailable".into(),
            });
        }
        self.inner.put(key, bytes, content_type).await
    }

    async fn list(&self) -> Result<Vec<BlobRef>, BlobError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(BlobError::Transport("listing timed out".into()));
        }
        self.inner.list().await
    }

    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        if Self::matches(&self.failing_deletes, url) {
            return Err(BlobError::Status {
                status: 500,
                body: "delete failed".into(),
            });
        }
        self.inner.delete(url).await
    }
}

/// Returns a fixed WebP-looking payload, or refuses every input.
pub(crate) struct FakeNormalizer {
    reject: bool,
    calls: AtomicUsize,
}

impl FakeNormalizer {
    pub(crate) const OUTPUT: &'static [u8] = b"RIFF\0\0\0\0WEBPVP8L";

    pub(crate) fn accepting() -> Self {
        Self {
            reject: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn rejecting() -> Self {
        Self {
            reject: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageNormalizer for FakeNormalizer {
    fn normalize(&self, _bytes: &[u8], _source: SourceImageType) -> Result<Bytes, NormalizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(NormalizeError::Decode("not an image".into()));
        }
        Ok(Bytes::from_static(Self::OUTPUT))
    }
}

#[derive(Default)]
pub(crate) struct RecordingProgressSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgressSink {
    pub(crate) fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn percents(&self) -> Vec<u8> {
        self.events().into_iter().map(|e| e.percent).collect()
    }

    pub(crate) fn statuses(&self) -> Vec<ContributionStatus> {
        self.events().into_iter().map(|e| e.status).collect()
    }
}

impl ProgressSink for RecordingProgressSink {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}
