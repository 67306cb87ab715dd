//! Argument matchers used by stub rules and verification queries.
//!
//! A matcher is a predicate over one argument. Typed [Matcher] values are built with [eq],
//! [any], [that] or an [ArgumentCaptor], and plain values convert to an [eq] matcher, so
//! the typed helpers generated by [double!][crate::double] accept both `get(0)` and
//! `get(any())`.

use std::fmt::{Debug, Display, Formatter};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

use crate::entities::{Argument, Arguments};

type Predicate = Arc<dyn Fn(&Argument) -> bool + Send + Sync>;
type Capture = Arc<dyn Fn(&Argument) + Send + Sync>;

/// Type-erased matcher over one argument.
#[derive(Clone)]
pub struct ArgumentMatcher {
    description: String,
    predicate: Predicate,
    capture: Option<Capture>,
}

impl ArgumentMatcher {
    /// Create a matcher from a description and a predicate over the raw argument.
    pub fn new<D, P>(description: D, predicate: P) -> Self
    where
        D: Into<String>,
        P: Fn(&Argument) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            predicate: Arc::new(predicate),
            capture: None,
        }
    }

    /// Wildcard matcher, accepts every argument.
    pub fn wildcard() -> Self {
        Self::new("<any>", |_| true)
    }

    /// Check if the argument is accepted.
    pub fn matches(&self, argument: &Argument) -> bool {
        (self.predicate)(argument)
    }

    /// Hand a matched argument to the captor, if this matcher has one.
    pub fn capture(&self, argument: &Argument) {
        if let Some(capture) = &self.capture {
            capture(argument);
        }
    }

    /// Check if this matcher captures the arguments it matches.
    pub fn is_captor(&self) -> bool {
        self.capture.is_some()
    }

    /// Human readable description used in diagnostics.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Check that every matcher accepts the argument at the same position.
    ///
    /// Arity mismatches never match.
    pub fn all_match(matchers: &[ArgumentMatcher], arguments: &Arguments) -> bool {
        matchers.len() == arguments.len()
            && matchers
                .iter()
                .zip(arguments.iter())
                .all(|(matcher, argument)| matcher.matches(argument))
    }

    /// Render a list of matchers as a call argument list.
    pub fn describe_all(matchers: &[ArgumentMatcher]) -> String {
        matchers
            .iter()
            .map(|m| m.description.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Debug for ArgumentMatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgumentMatcher")
            .field("description", &self.description)
            .field("is_captor", &self.is_captor())
            .finish()
    }
}

impl Display for ArgumentMatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description)
    }
}

/// Matcher over arguments of type `T`.
pub struct Matcher<T> {
    inner: ArgumentMatcher,
    phantom: PhantomData<fn(&T)>,
}

impl<T> Matcher<T> {
    fn from_inner(inner: ArgumentMatcher) -> Self {
        Self {
            inner,
            phantom: PhantomData,
        }
    }

    /// Erase the argument type.
    pub fn into_inner(self) -> ArgumentMatcher {
        self.inner
    }
}

impl<T> Clone for Matcher<T> {
    fn clone(&self) -> Self {
        Self::from_inner(self.inner.clone())
    }
}

impl<T> Debug for Matcher<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.inner, f)
    }
}

impl<T: PartialEq + Debug + Send + Sync + 'static> From<T> for Matcher<T> {
    fn from(value: T) -> Self {
        eq(value)
    }
}

impl From<&str> for Matcher<String> {
    fn from(value: &str) -> Self {
        eq(value.to_string())
    }
}

impl<T> From<Matcher<T>> for ArgumentMatcher {
    fn from(matcher: Matcher<T>) -> Self {
        matcher.into_inner()
    }
}

/// Accept arguments equal to the given value.
pub fn eq<T: PartialEq + Debug + Send + Sync + 'static>(expected: T) -> Matcher<T> {
    let description = format!("{expected:?}");
    Matcher::from_inner(ArgumentMatcher::new(description, move |argument| {
        argument
            .downcast_ref::<T>()
            .is_some_and(|value| value == &expected)
    }))
}

/// Accept any argument.
pub fn any<T>() -> Matcher<T> {
    Matcher::from_inner(ArgumentMatcher::wildcard())
}

/// Accept arguments of type `T` satisfying the predicate.
pub fn that<T, D, P>(description: D, predicate: P) -> Matcher<T>
where
    T: 'static,
    D: Into<String>,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    Matcher::from_inner(ArgumentMatcher::new(description, move |argument| {
        argument.downcast_ref::<T>().is_some_and(&predicate)
    }))
}

/// Capture the arguments matched during verifications for further assertions.
///
/// ```
/// use understudy::{ArgumentCaptor, DoubleRegistry, test_tools::TestLogger, times};
///
/// pub trait Journal {
///     fn write(&self, line: String);
/// }
///
/// understudy::double! {
///     pub struct JournalDouble for Journal {
///         fn write(&self, line: String);
///     }
/// }
///
/// let registry = DoubleRegistry::new(&TestLogger::stdout());
/// let journal: JournalDouble = registry.double();
/// journal.write("123".to_string());
///
/// let captor = ArgumentCaptor::<String>::new();
/// journal.verify_write(times(1), captor.capture()).unwrap();
/// assert_eq!(Some("123".to_string()), captor.value());
/// ```
pub struct ArgumentCaptor<T> {
    values: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone + Send + 'static> ArgumentCaptor<T> {
    /// Create an empty captor.
    pub fn new() -> Self {
        Self {
            values: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Matcher accepting any argument of type `T` and capturing it when verified.
    pub fn capture(&self) -> Matcher<T> {
        let values = self.values.clone();
        let mut matcher = ArgumentMatcher::new("<captured>", |argument| argument.is::<T>());
        matcher.capture = Some(Arc::new(move |argument: &Argument| {
            if let Some(value) = argument.downcast_ref::<T>() {
                values
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(value.clone());
            }
        }));

        Matcher::from_inner(matcher)
    }

    /// The last captured value.
    pub fn value(&self) -> Option<T> {
        self.all_values().pop()
    }

    /// Every captured value, in capture order.
    pub fn all_values(&self) -> Vec<T> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T: Clone + Send + 'static> Default for ArgumentCaptor<T> {
    fn default() -> Self {
        Self::new()
    }
}
