use std::fmt::{Display, Formatter};

use crate::double::Double;
use crate::entities::{CallRecord, MethodId};
use crate::matcher::ArgumentMatcher;

/// A call pattern on a double: method and argument matchers.
#[derive(Debug, Clone)]
pub struct CallQuery<'a> {
    double: &'a Double,
    method: MethodId,
    matchers: Vec<ArgumentMatcher>,
}

impl<'a> CallQuery<'a> {
    /// Create a query matching the calls of `method` on `double` accepted by the matchers.
    pub fn new(double: &'a Double, method: MethodId, matchers: Vec<ArgumentMatcher>) -> Self {
        Self {
            double,
            method,
            matchers,
        }
    }

    /// Queried double.
    pub fn double(&self) -> &'a Double {
        self.double
    }

    /// Check if the invocation matches the query.
    pub fn matches(&self, record: &CallRecord) -> bool {
        record.double == self.double.id()
            && record.method == self.method
            && ArgumentMatcher::all_match(&self.matchers, &record.arguments)
    }

    /// Recorded invocations of the double matching the query.
    pub(crate) fn matching_records(&self) -> Vec<CallRecord> {
        self.double
            .ledger()
            .records()
            .into_iter()
            .filter(|r| self.matches(r))
            .collect()
    }

    pub(crate) fn capture(&self, record: &CallRecord) {
        for (matcher, argument) in self.matchers.iter().zip(record.arguments.iter()) {
            matcher.capture(argument);
        }
    }
}

impl Display for CallQuery<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}({})",
            self.double.name(),
            self.method,
            ArgumentMatcher::describe_all(&self.matchers)
        )
    }
}
