use super::{
    filter::{FilterSpec, QuerySummary},
    model::{OverlapStats, QueryResult},
    narrative::{Narrative, Narrator, RequestKind, RequestState},
    options::FilterOptions,
    session::{SessionId, SessionStore},
    store::RecordStore,
};
use ahash::AHashMap;
use arc_swap::ArcSwap;
use parking_lot::{Mutex, RwLock};
use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

static IDLE: RequestState = RequestState::Idle;

// DashboardSnapshot - everything a view needs, immutable once published

#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub store: Arc<RecordStore>,
    pub spec: FilterSpec,
    pub result: Arc<QueryResult>,
    pub overlap: OverlapStats,
    pub requests: BTreeMap<RequestKind, RequestState>,
    pub version: u64,
}

impl DashboardSnapshot {
    fn new(store: Arc<RecordStore>, spec: FilterSpec, version: u64) -> Self {
        let result = Arc::new(store.query(&spec));
        let overlap = result.overlap();
        Self {
            store,
            spec,
            result,
            overlap,
            requests: RequestKind::ALL.iter().map(|kind| (*kind, RequestState::Idle)).collect(),
            version,
        }
    }

    pub fn options(&self) -> &FilterOptions {
        self.store.options()
    }

    pub fn summary(&self) -> QuerySummary<'_> {
        QuerySummary::new(&self.spec, self.result.len(), self.store.len())
    }

    pub fn request_state(&self, kind: RequestKind) -> &RequestState {
        self.requests.get(&kind).unwrap_or(&IDLE)
    }
}

// NarrativeTicket - handle for one in-flight narrative request.
// Holds the filtered rows as they were when the request started.
#[derive(Debug, Clone)]
pub struct NarrativeTicket {
    kind: RequestKind,
    id: u64,
    token: CancellationToken,
    result: Arc<QueryResult>,
    question: String,
}

impl NarrativeTicket {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn result(&self) -> &Arc<QueryResult> {
        &self.result
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

#[derive(Debug)]
struct InFlight {
    id: u64,
    token: CancellationToken,
}

// Dashboard - single owner of the application state.
// Writers serialise on `write_lock`; readers take lock-free snapshots.
#[derive(Debug)]
pub struct Dashboard {
    snapshot: ArcSwap<DashboardSnapshot>,
    write_lock: RwLock<()>,
    in_flight: Mutex<AHashMap<RequestKind, InFlight>>,
    tickets: AtomicU64,
    narrator: Narrator,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(Narrator::default())
    }
}

impl Dashboard {
    pub fn new(narrator: Narrator) -> Self {
        Self::with_store(RecordStore::empty(), narrator)
    }

    pub fn with_store(store: RecordStore, narrator: Narrator) -> Self {
        let snapshot = DashboardSnapshot::new(Arc::new(store), FilterSpec::default(), 0);
        Self {
            snapshot: ArcSwap::from_pointee(snapshot),
            write_lock: RwLock::new(()),
            in_flight: Mutex::new(AHashMap::new()),
            tickets: AtomicU64::new(0),
            narrator,
        }
    }

    #[inline]
    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        self.snapshot.load_full()
    }

    pub fn narrator(&self) -> &Narrator {
        &self.narrator
    }

    // Transitions

    // New dataset: filter back to default, options from the new store,
    // every in-flight narrative request cancelled.
    pub fn load_dataset(&self, store: RecordStore) -> Arc<DashboardSnapshot> {
        let _guard = self.write_lock.write();
        let cancelled = self.cancel_all();
        let version = self.snapshot.load().version + 1;
        let snapshot = Arc::new(DashboardSnapshot::new(Arc::new(store), FilterSpec::default(), version));
        self.snapshot.store(Arc::clone(&snapshot));
        info!(
            records = snapshot.store.len(),
            cancelled_requests = cancelled,
            version,
            "dataset replaced"
        );
        snapshot
    }

    pub fn apply_filter(&self, spec: FilterSpec) -> Arc<DashboardSnapshot> {
        let _guard = self.write_lock.write();
        let current = self.snapshot.load_full();
        let result = Arc::new(current.store.query(&spec));
        let snapshot = Arc::new(DashboardSnapshot {
            store: Arc::clone(&current.store),
            overlap: result.overlap(),
            result,
            spec,
            requests: current.requests.clone(),
            version: current.version + 1,
        });
        self.snapshot.store(Arc::clone(&snapshot));
        debug!(matched = snapshot.result.len(), version = snapshot.version, "filter applied");
        snapshot
    }

    // Edits a copy of the current spec and applies it
    pub fn update_filter<F>(&self, edit: F) -> Arc<DashboardSnapshot>
    where
        F: FnOnce(&mut FilterSpec),
    {
        let mut spec = self.snapshot.load().spec.clone();
        edit(&mut spec);
        self.apply_filter(spec)
    }

    // Marks `kind` as Requesting. A request of the same kind still in flight
    // is cancelled and its completion will be discarded.
    pub fn start_narrative_request(&self, kind: RequestKind, question: Option<&str>) -> NarrativeTicket {
        let _guard = self.write_lock.write();
        let id = self.tickets.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();
        if let Some(stale) = self.in_flight.lock().insert(
            kind,
            InFlight {
                id,
                token: token.clone(),
            },
        ) {
            stale.token.cancel();
            debug!(%kind, stale = stale.id, ticket = id, "narrative request superseded");
        }

        let current = self.snapshot.load_full();
        let mut snapshot = DashboardSnapshot::clone(&current);
        snapshot.requests.insert(kind, RequestState::Requesting { ticket: id });
        snapshot.version += 1;
        let result = Arc::clone(&snapshot.result);
        self.snapshot.store(Arc::new(snapshot));

        let question = question
            .map(str::trim)
            .filter(|question| !question.is_empty())
            .unwrap_or(kind.default_question())
            .to_string();
        NarrativeTicket {
            kind,
            id,
            token,
            result,
            question,
        }
    }

    // Publishes the outcome if `ticket` is still the live request for its kind.
    // Returns false for superseded or cancelled tickets.
    pub fn complete_narrative_request(&self, ticket: &NarrativeTicket, narrative: Narrative) -> bool {
        let _guard = self.write_lock.write();
        {
            let mut in_flight = self.in_flight.lock();
            match in_flight.get(&ticket.kind) {
                Some(live) if live.id == ticket.id && !ticket.is_cancelled() => {
                    in_flight.remove(&ticket.kind);
                }
                _ => {
                    debug!(kind = %ticket.kind, ticket = ticket.id, "stale narrative completion discarded");
                    return false;
                }
            }
        }

        let current = self.snapshot.load_full();
        let mut snapshot = DashboardSnapshot::clone(&current);
        snapshot.requests.insert(ticket.kind, RequestState::from(narrative));
        snapshot.version += 1;
        self.snapshot.store(Arc::new(snapshot));
        true
    }

    // Cancels any in-flight request of `kind` and returns it to Idle
    pub fn reset_request(&self, kind: RequestKind) -> Arc<DashboardSnapshot> {
        let _guard = self.write_lock.write();
        if let Some(stale) = self.in_flight.lock().remove(&kind) {
            stale.token.cancel();
        }
        let current = self.snapshot.load_full();
        let mut snapshot = DashboardSnapshot::clone(&current);
        snapshot.requests.insert(kind, RequestState::Idle);
        snapshot.version += 1;
        let snapshot = Arc::new(snapshot);
        self.snapshot.store(Arc::clone(&snapshot));
        snapshot
    }

    // Full cycle: start, ask the narrator, publish. None when the request was
    // superseded or the dataset was replaced in the meantime.
    pub async fn request_narrative(&self, kind: RequestKind, question: Option<&str>) -> Option<Narrative> {
        let ticket = self.start_narrative_request(kind, question);
        let narrative = tokio::select! {
            biased;
            _ = ticket.cancelled() => None,
            narrative = self.narrator.answer(ticket.result.records(), &ticket.question) => Some(narrative),
        }?;
        self.complete_narrative_request(&ticket, narrative.clone())
            .then_some(narrative)
    }

    // Sessions

    pub fn save_session(&self, sessions: &dyn SessionStore, id: SessionId) {
        sessions.save(id, self.snapshot.load().spec.clone());
    }

    // Re-applies the saved filter, if the session has one
    pub fn restore_session(&self, sessions: &dyn SessionStore, id: &SessionId) -> Option<Arc<DashboardSnapshot>> {
        sessions.load(id).map(|spec| self.apply_filter(spec))
    }

    fn cancel_all(&self) -> usize {
        let mut in_flight = self.in_flight.lock();
        let count = in_flight.len();
        for (_, stale) in in_flight.drain() {
            stale.token.cancel();
        }
        count
    }
}
