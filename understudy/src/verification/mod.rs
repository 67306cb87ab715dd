//! Verifications evaluated against the invocation ledgers of doubles.
//!
//! Verifications never alter the recorded invocations: a successful one only marks the
//! invocations it matched as covered, which is what [verify_no_more_interactions] checks.
//! Failures are reported as [DoubleError::VerificationFailure] and can be retried.

mod in_order;
mod query;
mod times;

pub use in_order::InOrder;
pub use query::CallQuery;
pub use times::{Times, at_least, at_least_once, at_most, never, once, times};

use slog::debug;

use crate::double::Double;
use crate::entities::{CallRecord, MethodId, Sequence};
use crate::errors::{DoubleError, VerificationFailure};
use crate::matcher::ArgumentMatcher;

use times::plural;

/// Verify that the number of invocations of `method` accepted by the matchers is the
/// expected one.
pub fn verify_count(
    double: &Double,
    method: MethodId,
    matchers: &[ArgumentMatcher],
    times: Times,
) -> Result<(), DoubleError> {
    CallQuery::new(double, method, matchers.to_vec()).verify(times)
}

impl CallQuery<'_> {
    /// Verify that the number of invocations matching the query is the expected one.
    pub fn verify(&self, times: Times) -> Result<(), DoubleError> {
        let matching = self.matching_records();
        if !times.holds(matching.len()) {
            let failure = VerificationFailure::new(
                format!("{self} to be invoked {times}"),
                format!("invoked {}", plural(matching.len())),
                self.double().ledger().records(),
            );
            return Err(fail(self.double(), failure));
        }

        self.double().ledger().mark_covered(&sequences(&matching));
        for record in &matching {
            self.capture(record);
        }

        Ok(())
    }
}

/// Verify that calls matching each query happened in the given order.
///
/// Succeeds if one invocation per query can be picked, each matching its query, with strictly
/// increasing sequence numbers. Other invocations may happen in between.
pub fn verify_order(queries: &[CallQuery]) -> Result<(), DoubleError> {
    let Some(first) = queries.first() else {
        return Ok(());
    };

    let mut after = Sequence::default();
    let mut matched = Vec::with_capacity(queries.len());
    for query in queries {
        match query
            .matching_records()
            .into_iter()
            .find(|record| record.sequence > after)
        {
            Some(record) => {
                after = record.sequence;
                matched.push((query, record));
            }
            None => {
                let failure = VerificationFailure::new(
                    format!("calls in order: {}", describe_queries(queries)),
                    match matched.last() {
                        Some((previous, _)) => format!("no `{query}` invoked after `{previous}`"),
                        None => format!("no `{query}` invoked"),
                    },
                    involved_records(queries.iter().map(|q| q.double())),
                );
                return Err(fail(first.double(), failure));
            }
        }
    }

    for (query, record) in &matched {
        query.double().ledger().mark_covered(&[record.sequence]);
        query.capture(record);
    }

    Ok(())
}

/// Verify that every invocation of the doubles was covered by a previous verification.
pub fn verify_no_more_interactions(doubles: &[&Double]) -> Result<(), DoubleError> {
    let mut uncovered: Vec<CallRecord> = doubles
        .iter()
        .flat_map(|double| double.ledger().uncovered())
        .collect();
    uncovered.sort_by_key(|record| record.sequence);

    match (uncovered.is_empty(), doubles.first()) {
        (false, Some(first)) => {
            let failure = VerificationFailure::new(
                format!("no more interactions on {}", describe_doubles(doubles)),
                format!("{} unverified", plural_invocations(uncovered.len())),
                uncovered,
            );
            Err(fail(first, failure))
        }
        _ => Ok(()),
    }
}

/// Verify that the doubles were never called.
pub fn verify_zero_interactions(doubles: &[&Double]) -> Result<(), DoubleError> {
    let recorded = involved_records(doubles.iter().copied());

    match (recorded.is_empty(), doubles.first()) {
        (false, Some(first)) => {
            let failure = VerificationFailure::new(
                format!("zero interactions on {}", describe_doubles(doubles)),
                format!("{} recorded", plural_invocations(recorded.len())),
                recorded,
            );
            Err(fail(first, failure))
        }
        _ => Ok(()),
    }
}

/// Mark the invocations answered by a stub rule as covered, then give the doubles back.
///
/// Meant to wrap the doubles given to [verify_no_more_interactions] when stubbed calls are
/// checked through their returned values instead of verifications.
pub fn ignore_stubs<'a>(doubles: &[&'a Double]) -> Vec<&'a Double> {
    for double in doubles {
        double.ledger().cover_stubbed();
    }

    doubles.to_vec()
}

fn fail(double: &Double, failure: VerificationFailure) -> DoubleError {
    debug!(
        double.logger(), "Verification failed";
        "expected" => &failure.expected, "outcome" => &failure.outcome
    );

    failure.into()
}

fn sequences(records: &[CallRecord]) -> Vec<Sequence> {
    records.iter().map(|record| record.sequence).collect()
}

fn plural_invocations(count: usize) -> String {
    match count {
        1 => "1 invocation".to_string(),
        _ => format!("{count} invocations"),
    }
}

fn describe_queries(queries: &[CallQuery]) -> String {
    queries
        .iter()
        .map(|query| query.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_doubles(doubles: &[&Double]) -> String {
    doubles
        .iter()
        .map(|double| double.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Invocations of the distinct given doubles, in call order.
fn involved_records<'a, I: Iterator<Item = &'a Double>>(doubles: I) -> Vec<CallRecord> {
    let mut distinct: Vec<&Double> = Vec::new();
    for double in doubles {
        if !distinct.iter().any(|known| std::ptr::eq(*known, double)) {
            distinct.push(double);
        }
    }

    let mut records: Vec<CallRecord> = distinct
        .iter()
        .flat_map(|double| double.ledger().records())
        .collect();
    records.sort_by_key(|record| record.sequence);

    records
}
