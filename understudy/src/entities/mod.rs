//! The entities recorded and exchanged by doubles, ledgers and verifications.

mod argument;
mod call_record;

pub use argument::{Argument, Arguments};
pub use call_record::{CallRecord, CallSummary, DoubleId, MethodId, Sequence};
