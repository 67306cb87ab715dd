//! Invocation ledgers: the ordered call history of each double.
//!
//! Every double owns one [InvocationLedger]. The sequence numbers of the records come from a
//! [SequenceClock] shared by all the doubles of a registry, so that calls made on different
//! doubles can be ordered against each other.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::entities::{Arguments, CallRecord, DoubleId, MethodId, Sequence};

/// Registry wide source of monotonically increasing [Sequence] numbers.
#[derive(Debug, Default)]
pub struct SequenceClock(AtomicU64);

impl SequenceClock {
    /// Clock factory, the first tick yields `Sequence(1)`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the next sequence number.
    pub fn tick(&self) -> Sequence {
        Sequence(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Last handed out sequence number, `Sequence(0)` if none.
    pub fn current(&self) -> Sequence {
        Sequence(self.0.load(Ordering::SeqCst))
    }
}

#[derive(Default)]
struct LedgerState {
    records: Vec<CallRecord>,
    covered: BTreeSet<Sequence>,
    stubbed: BTreeSet<Sequence>,
    horizon: Sequence,
}

impl LedgerState {
    fn visible(&self) -> impl Iterator<Item = &CallRecord> {
        let horizon = self.horizon;
        self.records.iter().filter(move |r| r.sequence > horizon)
    }
}

/// Append-only, ordered call history of one double.
pub struct InvocationLedger {
    clock: Arc<SequenceClock>,
    state: Mutex<LedgerState>,
}

impl InvocationLedger {
    /// Create an empty ledger taking its sequence numbers from the given clock.
    pub fn new(clock: Arc<SequenceClock>) -> Self {
        Self {
            clock,
            state: Mutex::new(LedgerState::default()),
        }
    }

    // Records are never altered once appended, recovering a poisoned lock is safe.
    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an invocation and return it.
    ///
    /// The sequence number is taken while holding the ledger lock, so records of a ledger are
    /// always in increasing sequence order.
    pub fn append(
        &self,
        double: DoubleId,
        double_name: &str,
        method: MethodId,
        arguments: Arguments,
    ) -> CallRecord {
        let mut state = self.state();
        let record = CallRecord {
            double,
            double_name: double_name.to_string(),
            method,
            arguments,
            sequence: self.clock.tick(),
            timestamp: Utc::now(),
        };
        state.records.push(record.clone());

        record
    }

    /// Recorded invocations, in call order.
    pub fn records(&self) -> Vec<CallRecord> {
        self.state().visible().cloned().collect()
    }

    /// Number of recorded invocations.
    pub fn len(&self) -> usize {
        self.state().visible().count()
    }

    /// True if no invocation was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mark invocations as covered by a verification.
    pub fn mark_covered(&self, sequences: &[Sequence]) {
        self.state().covered.extend(sequences.iter().copied());
    }

    /// Mark an invocation as answered by a stub rule.
    pub fn mark_stubbed(&self, sequence: Sequence) {
        self.state().stubbed.insert(sequence);
    }

    /// Mark every invocation answered by a stub rule as covered.
    pub fn cover_stubbed(&self) {
        let mut state = self.state();
        let stubbed: Vec<Sequence> = state.stubbed.iter().copied().collect();
        state.covered.extend(stubbed);
    }

    /// Check if the invocation was covered by a verification.
    pub fn is_covered(&self, sequence: Sequence) -> bool {
        self.state().covered.contains(&sequence)
    }

    /// Recorded invocations not covered by any verification, in call order.
    pub fn uncovered(&self) -> Vec<CallRecord> {
        let state = self.state();
        state
            .visible()
            .filter(|r| !state.covered.contains(&r.sequence))
            .cloned()
            .collect()
    }

    /// Forget every invocation recorded so far.
    ///
    /// Records are kept but hidden behind a horizon, later invocations are recorded as usual.
    pub fn clear(&self) {
        let mut state = self.state();
        if let Some(last) = state.records.last() {
            state.horizon = last.sequence;
        }
    }
}
