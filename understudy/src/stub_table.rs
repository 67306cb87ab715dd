use std::any::{Any, type_name};
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::{Mutex, PoisonError};

use slog::debug;

use crate::StdError;
use crate::answer::{Answer, AnswerQueue};
use crate::double::Double;
use crate::entities::{Arguments, CallRecord, MethodId};
use crate::errors::DoubleError;
use crate::matcher::ArgumentMatcher;

pub(crate) type RuleId = u64;

struct StubRule {
    id: RuleId,
    method: MethodId,
    matchers: Vec<ArgumentMatcher>,
    answers: Box<dyn Any + Send>,
}

#[derive(Default)]
struct StubTableState {
    rules: Vec<StubRule>,
    next_id: RuleId,
}

/// Stub rules of one double, the most recently registered matching rule wins.
#[derive(Default)]
pub(crate) struct StubTable {
    state: Mutex<StubTableState>,
}

/// Outcome of the lookup of a stub rule for a call.
pub(crate) enum StubLookup<R> {
    Found(Answer<R>),
    NotFound,
    ReturnTypeMismatch,
}

impl StubTable {
    fn state(&self) -> std::sync::MutexGuard<'_, StubTableState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new rule answering with the given answer.
    pub(crate) fn register<R: Send + 'static>(
        &self,
        method: MethodId,
        matchers: Vec<ArgumentMatcher>,
        answer: Answer<R>,
    ) -> RuleId {
        let mut answers = AnswerQueue::<R>::new();
        answers.push(answer);

        let mut state = self.state();
        state.next_id += 1;
        let id = state.next_id;
        state.rules.push(StubRule {
            id,
            method,
            matchers,
            answers: Box::new(answers),
        });

        id
    }

    /// Append an answer to an existing rule, returns its number of answers.
    ///
    /// Returns `None` if the rule does not exist anymore.
    pub(crate) fn append<R: Send + 'static>(
        &self,
        rule_id: RuleId,
        answer: Answer<R>,
    ) -> Option<usize> {
        let mut state = self.state();
        let rule = state.rules.iter_mut().find(|r| r.id == rule_id)?;
        let answers = rule.answers.downcast_mut::<AnswerQueue<R>>()?;
        answers.push(answer);

        Some(answers.len())
    }

    /// Find the answer of the last registered rule matching the call.
    ///
    /// Matchers run without holding the table lock, they may call the double again.
    pub(crate) fn lookup<R: Send + 'static>(
        &self,
        method: MethodId,
        arguments: &Arguments,
    ) -> StubLookup<R> {
        let candidates: Vec<(RuleId, Vec<ArgumentMatcher>)> = self
            .state()
            .rules
            .iter()
            .rev()
            .filter(|r| r.method == method)
            .map(|r| (r.id, r.matchers.clone()))
            .collect();
        let Some(rule_id) = candidates
            .into_iter()
            .find(|(_, matchers)| ArgumentMatcher::all_match(matchers, arguments))
            .map(|(id, _)| id)
        else {
            return StubLookup::NotFound;
        };

        let mut state = self.state();
        let Some(rule) = state.rules.iter_mut().find(|r| r.id == rule_id) else {
            return StubLookup::NotFound;
        };

        match rule.answers.downcast_mut::<AnswerQueue<R>>() {
            Some(answers) => match answers.next_answer() {
                Some(answer) => StubLookup::Found(answer),
                None => StubLookup::NotFound,
            },
            None => StubLookup::ReturnTypeMismatch,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.state().rules.len()
    }

    pub(crate) fn clear(&self) {
        self.state().rules.clear();
    }
}

/// Stubbing of a call pattern in progress.
///
/// The rule is registered by the first `then_*` call, the following ones append responses
/// that are consumed in order on successive matching calls, the last response repeating.
pub struct OngoingStubbing<'a, R> {
    double: &'a Double,
    method: MethodId,
    matchers: Vec<ArgumentMatcher>,
    rule: Option<RuleId>,
    phantom: PhantomData<fn() -> R>,
}

impl<'a, R: Send + 'static> OngoingStubbing<'a, R> {
    pub(crate) fn new(double: &'a Double, method: MethodId, matchers: Vec<ArgumentMatcher>) -> Self {
        Self {
            double,
            method,
            matchers,
            rule: None,
            phantom: PhantomData,
        }
    }

    /// Return the value on every matching call.
    pub fn then_return(self, value: R) -> Self
    where
        R: Clone + Sync,
    {
        self.then(Answer::returning(value))
    }

    /// Return the values one after the other on successive matching calls, the last one
    /// repeating.
    pub fn then_return_sequence<I>(self, values: I) -> Result<Self, DoubleError>
    where
        I: IntoIterator<Item = R>,
        R: Clone + Sync,
    {
        let values: Vec<R> = values.into_iter().collect();
        if values.is_empty() {
            return Err(self.configuration_error("a return sequence needs at least one value"));
        }

        Ok(values
            .into_iter()
            .fold(self, |stubbing, value| stubbing.then(Answer::returning(value))))
    }

    /// Raise the error on matching calls.
    pub fn then_raise<E: Into<StdError>>(self, error: E) -> Self {
        self.then(Answer::Raise(std::sync::Arc::new(error.into())))
    }

    /// Compute the returned value from the invocation on matching calls.
    pub fn then_answer<F>(self, compute: F) -> Self
    where
        F: Fn(&CallRecord) -> R + Send + Sync + 'static,
    {
        self.then(Answer::computing(compute))
    }

    /// Delegate matching calls to the real instance, only available on spies.
    pub fn then_call_real_method(self) -> Result<Self, DoubleError> {
        if !self.double.is_spy() {
            return Err(self.configuration_error(
                "calling the real method requires a double spying on a real instance",
            ));
        }

        Ok(self.then(Answer::CallRealMethod))
    }

    /// Return the default value of the return type on matching calls.
    pub fn then_do_nothing(self) -> Self {
        self.then(Answer::DoNothing)
    }

    /// The stubbed double.
    pub fn double(&self) -> &'a Double {
        self.double
    }

    fn then(mut self, answer: Answer<R>) -> Self {
        debug!(
            self.double.logger(), "Stubbing call";
            "method" => self.method,
            "matchers" => ArgumentMatcher::describe_all(&self.matchers),
            "answer" => format!("{answer:?}")
        );

        let stubs = self.double.stub_table();
        match self.rule.and_then(|id| stubs.append(id, answer.clone())) {
            Some(_) => {}
            None => {
                self.rule = Some(stubs.register(self.method, self.matchers.clone(), answer));
            }
        }

        self
    }

    fn configuration_error(&self, reason: &str) -> DoubleError {
        DoubleError::StubConfigurationError {
            double: self.double.name().to_string(),
            method: self.method.to_string(),
            reason: format!("{reason} (returning `{}`)", type_name::<R>()),
        }
    }
}

impl<R> Debug for OngoingStubbing<'_, R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OngoingStubbing")
            .field("double", &self.double.name())
            .field("method", &self.method)
            .field("matchers", &self.matchers)
            .field("registered", &self.rule.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::entities::Argument;
    use crate::matcher::{any, eq};

    use super::*;

    fn call(value: usize) -> Arguments {
        Arguments::new(vec![Argument::new(value)])
    }

    fn returned(lookup: StubLookup<&'static str>, arguments: &Arguments) -> Option<&'static str> {
        match lookup {
            StubLookup::Found(Answer::Produce(producer)) => Some(producer(&CallRecord {
                double: Default::default(),
                double_name: "test".to_string(),
                method: "get",
                arguments: arguments.clone(),
                sequence: Default::default(),
                timestamp: chrono::Utc::now(),
            })),
            _ => None,
        }
    }

    #[test]
    fn lookup_without_rule_is_not_found() {
        let table = StubTable::default();

        assert!(matches!(
            table.lookup::<&str>("get", &call(0)),
            StubLookup::NotFound
        ));
    }

    #[test]
    fn lookup_matches_method_and_arguments() {
        let table = StubTable::default();
        table.register("get", vec![eq(0_usize).into_inner()], Answer::returning("first"));

        assert_eq!(Some("first"), returned(table.lookup("get", &call(0)), &call(0)));
        assert_eq!(None, returned(table.lookup("get", &call(1)), &call(1)));
        assert_eq!(None, returned(table.lookup("peek", &call(0)), &call(0)));
    }

    #[test]
    fn last_registered_matching_rule_wins() {
        let table = StubTable::default();
        table.register("get", vec![any::<usize>().into_inner()], Answer::returning("any"));
        table.register("get", vec![eq(0_usize).into_inner()], Answer::returning("zero"));

        assert_eq!(Some("zero"), returned(table.lookup("get", &call(0)), &call(0)));
        assert_eq!(Some("any"), returned(table.lookup("get", &call(5)), &call(5)));

        table.register("get", vec![any::<usize>().into_inner()], Answer::returning("new any"));
        assert_eq!(Some("new any"), returned(table.lookup("get", &call(0)), &call(0)));
    }

    #[test]
    fn appended_answers_are_consumed_in_order() {
        let table = StubTable::default();
        let id = table.register("get", vec![], Answer::returning("a"));
        assert_eq!(Some(2), table.append(id, Answer::returning("b")));

        let no_args = Arguments::default();
        assert_eq!(Some("a"), returned(table.lookup("get", &no_args), &no_args));
        assert_eq!(Some("b"), returned(table.lookup("get", &no_args), &no_args));
        assert_eq!(Some("b"), returned(table.lookup("get", &no_args), &no_args));
    }

    #[test]
    fn append_to_a_cleared_rule_fails() {
        let table = StubTable::default();
        let id = table.register("get", vec![], Answer::returning("a"));
        table.clear();

        assert_eq!(None, table.append(id, Answer::returning("b")));
        assert_eq!(0, table.len());
    }

    #[test]
    fn lookup_with_another_return_type_is_a_mismatch() {
        let table = StubTable::default();
        table.register("size", vec![], Answer::returning(10_usize));

        assert!(matches!(
            table.lookup::<u32>("size", &Arguments::default()),
            StubLookup::ReturnTypeMismatch
        ));
    }

    #[test]
    fn matchers_may_look_the_table_up_again() {
        let table = std::sync::Arc::new(StubTable::default());
        let inner = table.clone();
        table.register(
            "get",
            vec![ArgumentMatcher::new("while the table is empty of size rules", move |_| {
                matches!(
                    inner.lookup::<usize>("size", &Arguments::default()),
                    StubLookup::NotFound
                )
            })],
            Answer::returning("looked up"),
        );

        assert_eq!(Some("looked up"), returned(table.lookup("get", &call(0)), &call(0)));
    }
}
