use slog::{Logger, debug};

use crate::double::Double;
use crate::entities::{CallRecord, Sequence};
use crate::errors::{DoubleError, VerificationFailure};

use super::{CallQuery, Times, plural_invocations, times::plural};

/// Stateful ordering verifier: each verification must match invocations recorded after the
/// ones matched by the previous verification.
///
/// Created by [DoubleRegistry::in_order][crate::DoubleRegistry::in_order].
pub struct InOrder<'a> {
    doubles: Vec<&'a Double>,
    after: Sequence,
    logger: Logger,
}

impl<'a> InOrder<'a> {
    pub(crate) fn new(doubles: &[&'a Double], logger: &Logger) -> Self {
        Self {
            doubles: doubles.to_vec(),
            after: Sequence::default(),
            logger: logger.clone(),
        }
    }

    /// Verify that the query matches an invocation after the previously verified ones.
    ///
    /// The earliest such invocation is picked, following verifications must match
    /// invocations recorded after it.
    pub fn verify(&mut self, query: &CallQuery<'_>) -> Result<(), DoubleError> {
        self.check_membership(query.double())?;

        let Some(record) = query
            .matching_records()
            .into_iter()
            .find(|record| record.sequence > self.after)
        else {
            return Err(self.fail(
                format!("{query} to be invoked in order"),
                format!(
                    "not invoked after the previous verification ({})",
                    self.after
                ),
            ));
        };

        self.after = record.sequence;
        query.double().ledger().mark_covered(&[record.sequence]);
        query.capture(&record);

        Ok(())
    }

    /// Verify the number of invocations matching the query after the previously verified
    /// ones.
    ///
    /// Following verifications must match invocations recorded after the last one counted.
    pub fn verify_times(&mut self, query: &CallQuery<'_>, times: Times) -> Result<(), DoubleError> {
        self.check_membership(query.double())?;

        let matching: Vec<CallRecord> = query
            .matching_records()
            .into_iter()
            .filter(|record| record.sequence > self.after)
            .collect();
        if !times.holds(matching.len()) {
            return Err(self.fail(
                format!("{query} to be invoked {times} in order"),
                format!(
                    "invoked {} after the previous verification ({})",
                    plural(matching.len()),
                    self.after
                ),
            ));
        }

        if let Some(last) = matching.last() {
            self.after = last.sequence;
        }
        query.double().ledger().mark_covered(
            &matching
                .iter()
                .map(|record| record.sequence)
                .collect::<Vec<_>>(),
        );
        for record in &matching {
            query.capture(record);
        }

        Ok(())
    }

    /// Verify that no invocation of the doubles recorded after the last verified one was left
    /// unverified.
    pub fn verify_no_more_interactions(&self) -> Result<(), DoubleError> {
        let uncovered: Vec<CallRecord> = self
            .records()
            .into_iter()
            .filter(|record| {
                record.sequence > self.after
                    && self
                        .doubles
                        .iter()
                        .any(|d| d.id() == record.double && !d.ledger().is_covered(record.sequence))
            })
            .collect();

        if uncovered.is_empty() {
            return Ok(());
        }

        Err(self.fail_with(
            "no more interactions after the last verification in order".to_string(),
            format!("{} unverified", plural_invocations(uncovered.len())),
            uncovered,
        ))
    }

    fn check_membership(&self, double: &Double) -> Result<(), DoubleError> {
        if self.doubles.iter().any(|known| std::ptr::eq(*known, double)) {
            return Ok(());
        }

        Err(self.fail(
            format!("`{}` to be verified in order", double.name()),
            "it is not one of the doubles given to the in order verifier".to_string(),
        ))
    }

    fn records(&self) -> Vec<CallRecord> {
        let mut records: Vec<CallRecord> = self
            .doubles
            .iter()
            .flat_map(|double| double.ledger().records())
            .collect();
        records.sort_by_key(|record| record.sequence);
        records
    }

    fn fail(&self, expected: String, outcome: String) -> DoubleError {
        self.fail_with(expected, outcome, self.records())
    }

    fn fail_with(&self, expected: String, outcome: String, actual: Vec<CallRecord>) -> DoubleError {
        debug!(
            self.logger, "In order verification failed";
            "expected" => &expected, "outcome" => &outcome
        );

        VerificationFailure::new(expected, outcome, actual).into()
    }
}

#[cfg(test)]
mod tests {
    use crate::capability::{Capability, CapabilitySet};
    use crate::configuration::DoubleSettings;
    use crate::entities::{Argument, Arguments};
    use crate::matcher::{ArgumentMatcher, eq};
    use crate::registry::DoubleRegistry;
    use crate::test_tools::TestLogger;
    use crate::verification::{at_least, times};

    use super::*;

    fn list_double(registry: &DoubleRegistry, name: &str) -> Double {
        registry.create_double(
            CapabilitySet::new("ListApi", vec![Capability::new::<()>("add", 1)]),
            DoubleSettings::default().with_name(name),
            false,
        )
    }

    fn call_add(double: &Double, value: &str) {
        double
            .resolve::<()>("add", Arguments::new(vec![Argument::new(value.to_string())]))
            .unwrap();
    }

    fn add<'a>(double: &'a Double, value: &str) -> CallQuery<'a> {
        let matchers: Vec<ArgumentMatcher> = vec![eq(value.to_string()).into_inner()];
        CallQuery::new(double, "add", matchers)
    }

    #[test]
    fn in_order_walks_through_successive_pairs() {
        let registry = DoubleRegistry::new(&TestLogger::stdout());
        let first = list_double(&registry, "first");
        let second = list_double(&registry, "second");
        call_add(&first, "x");
        call_add(&second, "y");
        call_add(&first, "x");
        call_add(&second, "y");

        let mut in_order = registry.in_order(&[&first, &second]);
        in_order.verify(&add(&first, "x")).unwrap();
        in_order.verify(&add(&second, "y")).unwrap();
        in_order.verify(&add(&first, "x")).unwrap();
        in_order.verify(&add(&second, "y")).unwrap();

        in_order
            .verify(&add(&first, "x"))
            .expect_err("no x left after the second y");
        in_order.verify_no_more_interactions().unwrap();
    }

    #[test]
    fn in_order_rejects_reversed_order() {
        let registry = DoubleRegistry::new(&TestLogger::stdout());
        let single = list_double(&registry, "single");
        call_add(&single, "was added first");
        call_add(&single, "was added second");

        let mut in_order = registry.in_order(&[&single]);
        in_order.verify(&add(&single, "was added second")).unwrap();
        let error = in_order
            .verify(&add(&single, "was added first"))
            .expect_err("was added first happened before");

        assert!(error.is_verification_failure());
    }

    #[test]
    fn in_order_with_times() {
        let registry = DoubleRegistry::new(&TestLogger::stdout());
        let single = list_double(&registry, "single");
        call_add(&single, "a");
        call_add(&single, "a");
        call_add(&single, "b");

        let mut in_order = registry.in_order(&[&single]);
        in_order.verify_times(&add(&single, "a"), times(2)).unwrap();
        in_order
            .verify_times(&add(&single, "b"), at_least(1))
            .unwrap();
        in_order.verify_no_more_interactions().unwrap();
    }

    #[test]
    fn in_order_no_more_interactions_reports_later_calls() {
        let registry = DoubleRegistry::new(&TestLogger::stdout());
        let single = list_double(&registry, "single");
        call_add(&single, "a");
        call_add(&single, "b");

        let mut in_order = registry.in_order(&[&single]);
        in_order.verify(&add(&single, "a")).unwrap();

        let error = in_order
            .verify_no_more_interactions()
            .expect_err("add(b) is unverified");
        assert_eq!(1, error.verification_failure().unwrap().actual.len());
    }

    #[test]
    fn in_order_only_verifies_its_doubles() {
        let registry = DoubleRegistry::new(&TestLogger::stdout());
        let known = list_double(&registry, "known");
        let stranger = list_double(&registry, "stranger");
        call_add(&stranger, "a");

        let mut in_order = registry.in_order(&[&known]);
        let error = in_order
            .verify(&add(&stranger, "a"))
            .expect_err("stranger is not part of the verifier");

        assert!(
            error
                .verification_failure()
                .unwrap()
                .outcome
                .contains("not one of the doubles")
        );
    }
}
