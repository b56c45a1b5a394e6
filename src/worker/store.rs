use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
    common::{
        error::LedgerError,
        event::{LedgerCommand, LedgerEvent},
    },
    domain::{
        ledger::Ledger,
        summary::{self, Summary, Totals},
        transaction::{Transaction, TransactionId, TransactionPatch, TxFilter, TxType},
    },
    io::{persistence::PersistenceAdapter, storage::KeyValueStore},
    worker::processor,
};

/// Lifecycle of a [`LedgerStore`]: `init` moves it to `Ready`, `dispose`
/// to `Disposed`. Only a `Ready` store accepts reads and mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Ready,
    Disposed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Ready => "ready",
            Phase::Disposed => "disposed",
        })
    }
}

/// Receives a notification after every successful mutation.
///
/// Called synchronously, after the in-memory change and before the snapshot
/// is written, with totals recomputed from the new state.
pub trait LedgerListener: Send + Sync {
    fn on_change(&self, event: &LedgerEvent, totals: &Totals);
}

impl<F> LedgerListener for F
where
    F: Fn(&LedgerEvent, &Totals) + Send + Sync,
{
    fn on_change(&self, event: &LedgerEvent, totals: &Totals) {
        self(event, totals)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

struct State {
    phase: Phase,
    ledger: Ledger,
    /// Bumped under this lock for every snapshot handed to persistence.
    seq: u64,
}

impl State {
    fn ensure_ready(&self) -> Result<(), LedgerError> {
        match self.phase {
            Phase::Ready => Ok(()),
            other => Err(LedgerError::NotReady(other)),
        }
    }

    fn next_snapshot(&mut self) -> (u64, Vec<Transaction>) {
        self.seq += 1;
        (self.seq, self.ledger.transactions().to_vec())
    }
}

/// Owns the transaction collection and is the only way to change it.
///
/// Hand it to consumers by reference or inside an `Arc`; every method takes
/// `&self`. The collection lives behind an async mutex: a mutation and the
/// snapshot it produces are taken under one lock acquisition, and the lock
/// is released before the snapshot is written, so other calls proceed while
/// a save is in flight. Save failures are logged and never returned; the
/// in-memory ledger stays authoritative.
///
/// # Examples
///
/// ```
/// use finance_ledger::{LedgerStore, MemoryStore, PersistenceAdapter, TxFilter, TxType};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = LedgerStore::new(PersistenceAdapter::new(MemoryStore::new()));
/// store.init().await.unwrap();
///
/// store.add("Salary", "1000", TxType::Income, None).await.unwrap();
/// store.add("Rent", "400", TxType::Expense, Some("may")).await.unwrap();
///
/// let totals = store.totals().await.unwrap();
/// assert_eq!(totals.balance.to_string(), "600.00");
/// assert_eq!(store.list(TxFilter::Expense).await.unwrap().len(), 1);
/// # }
/// ```
pub struct LedgerStore<S> {
    state: Mutex<State>,
    persistence: PersistenceAdapter<S>,
    listeners: StdMutex<Vec<(SubscriptionId, Arc<dyn LedgerListener>)>>,
    next_subscription: AtomicU64,
    clock: Clock,
}

impl<S: KeyValueStore> LedgerStore<S> {
    pub fn new(persistence: PersistenceAdapter<S>) -> Self {
        Self {
            state: Mutex::new(State {
                phase: Phase::Uninitialized,
                ledger: Ledger::new(),
                seq: 0,
            }),
            persistence,
            listeners: StdMutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            clock: Box::new(Utc::now),
        }
    }

    /// Replaces the time source used to stamp new transactions.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn persistence(&self) -> &PersistenceAdapter<S> {
        &self.persistence
    }

    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase
    }

    /// Loads the stored snapshot and opens the store for use.
    ///
    /// Load problems never fail this call: the store starts empty instead.
    /// Calling `init` on a ready store does nothing.
    pub async fn init(&self) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        match state.phase {
            Phase::Ready => return Ok(()),
            Phase::Disposed => return Err(LedgerError::NotReady(Phase::Disposed)),
            Phase::Uninitialized => {}
        }

        // the lock is held across the load so nothing can observe a
        // half-initialized ledger
        let txs = self.persistence.load().await;
        tracing::info!(count = txs.len(), slot = self.persistence.slot(), "ledger ready");
        state.ledger = Ledger::from_transactions(txs);
        state.phase = Phase::Ready;
        Ok(())
    }

    /// Writes a final snapshot and closes the store. Listeners are dropped.
    ///
    /// A store that never became ready is closed without writing, so an
    /// unloaded (empty) ledger can never overwrite the stored one.
    pub async fn dispose(&self) {
        let snapshot = {
            let mut state = self.state.lock().await;
            let was_ready = state.phase == Phase::Ready;
            state.phase = Phase::Disposed;
            was_ready.then(|| state.next_snapshot())
        };

        if let Some((seq, txs)) = snapshot {
            self.persist(seq, &txs).await;
        }
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        tracing::info!(slot = self.persistence.slot(), "ledger disposed");
    }

    /// Records a new transaction stamped with the current time.
    ///
    /// # Errors
    ///
    /// `Validation` when the title is blank or the amount is not a
    /// non-negative number; nothing is stored in that case.
    pub async fn add(
        &self,
        title: &str,
        amount: &str,
        kind: TxType,
        description: Option<&str>,
    ) -> Result<Transaction, LedgerError> {
        let command = LedgerCommand::Add {
            id: TransactionId::generate(),
            title: title.to_string(),
            amount: amount.to_string(),
            kind,
            description: description.map(str::to_string),
            date: (self.clock)(),
        };
        Ok(self.apply(command).await?.into_transaction())
    }

    /// Merges `patch` into the transaction with `id`. The date only
    /// changes when the patch carries one.
    pub async fn update(
        &self,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<Transaction, LedgerError> {
        Ok(self
            .apply(LedgerCommand::Update { id, patch })
            .await?
            .into_transaction())
    }

    /// Removes the transaction with `id` and returns it. An unknown id is
    /// `NotFound` on every call.
    pub async fn delete(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        Ok(self
            .apply(LedgerCommand::Delete { id })
            .await?
            .into_transaction())
    }

    pub async fn get(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        let state = self.state.lock().await;
        state.ensure_ready()?;
        state
            .ledger
            .get(id)
            .cloned()
            .ok_or(LedgerError::NotFound(id))
    }

    /// Transactions matching `filter`, newest first.
    pub async fn list(&self, filter: TxFilter) -> Result<Vec<Transaction>, LedgerError> {
        let state = self.state.lock().await;
        state.ensure_ready()?;
        Ok(state.ledger.list(filter))
    }

    pub async fn totals(&self) -> Result<Totals, LedgerError> {
        let state = self.state.lock().await;
        state.ensure_ready()?;
        Ok(summary::totals(state.ledger.transactions()))
    }

    /// Snapshot for report formatters. Totals always cover the whole ledger;
    /// `filter` only narrows the transaction list.
    pub async fn summary(&self, filter: TxFilter) -> Result<Summary, LedgerError> {
        let state = self.state.lock().await;
        state.ensure_ready()?;
        Ok(Summary::new(
            summary::totals(state.ledger.transactions()),
            state.ledger.list(filter),
        ))
    }

    pub fn subscribe(&self, listener: impl LedgerListener + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let listener: Arc<dyn LedgerListener> = Arc::new(listener);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(sub, _)| *sub != id);
        listeners.len() != before
    }

    async fn apply(&self, command: LedgerCommand) -> Result<LedgerEvent, LedgerError> {
        let (event, totals, seq, snapshot) = {
            let mut state = self.state.lock().await;
            state.ensure_ready()?;
            let event = processor::process(&mut state.ledger, command)?;
            let totals = summary::totals(state.ledger.transactions());
            let (seq, snapshot) = state.next_snapshot();
            (event, totals, seq, snapshot)
        };

        self.notify(&event, &totals);
        self.persist(seq, &snapshot).await;
        Ok(event)
    }

    fn notify(&self, event: &LedgerEvent, totals: &Totals) {
        // clone the handles so listeners run without the registry lock held
        let listeners: Vec<Arc<dyn LedgerListener>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener.on_change(event, totals);
        }
    }

    async fn persist(&self, seq: u64, snapshot: &[Transaction]) {
        if let Err(err) = self.persistence.save(seq, snapshot).await {
            tracing::error!(
                seq,
                slot = self.persistence.slot(),
                error = %err,
                "failed to save ledger snapshot, keeping in-memory state"
            );
        }
    }
}
