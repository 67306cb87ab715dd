use std::fmt::{Debug, Display, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::StdError;
use crate::entities::CallRecord;

type Producer<R> = Arc<dyn Fn(&CallRecord) -> R + Send + Sync>;

/// A programmed response of a stub rule.
pub(crate) enum Answer<R> {
    /// Produce the returned value, either a fixed one or computed from the invocation.
    Produce(Producer<R>),
    /// Raise the error.
    Raise(Arc<StdError>),
    /// Delegate to the real instance.
    CallRealMethod,
    /// Return the default value.
    DoNothing,
}

impl<R> Answer<R> {
    pub(crate) fn returning(value: R) -> Self
    where
        R: Clone + Send + Sync + 'static,
    {
        Answer::Produce(Arc::new(move |_| value.clone()))
    }

    pub(crate) fn computing<F>(compute: F) -> Self
    where
        F: Fn(&CallRecord) -> R + Send + Sync + 'static,
    {
        Answer::Produce(Arc::new(compute))
    }
}

impl<R> Clone for Answer<R> {
    fn clone(&self) -> Self {
        match self {
            Answer::Produce(producer) => Answer::Produce(producer.clone()),
            Answer::Raise(error) => Answer::Raise(error.clone()),
            Answer::CallRealMethod => Answer::CallRealMethod,
            Answer::DoNothing => Answer::DoNothing,
        }
    }
}

impl<R> Debug for Answer<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Answer::Produce(_) => write!(f, "Produce"),
            Answer::Raise(error) => write!(f, "Raise({error})"),
            Answer::CallRealMethod => write!(f, "CallRealMethod"),
            Answer::DoNothing => write!(f, "DoNothing"),
        }
    }
}

/// Answers of one stub rule, consumed front to back, the last one repeating.
pub(crate) struct AnswerQueue<R> {
    answers: Vec<Answer<R>>,
    next: usize,
}

impl<R> AnswerQueue<R> {
    pub(crate) fn new() -> Self {
        Self {
            answers: Vec::new(),
            next: 0,
        }
    }

    pub(crate) fn push(&mut self, answer: Answer<R>) {
        self.answers.push(answer);
    }

    pub(crate) fn len(&self) -> usize {
        self.answers.len()
    }

    /// Take the next answer, `None` only if the queue is empty.
    pub(crate) fn next_answer(&mut self) -> Option<Answer<R>> {
        let answer = self.answers.get(self.next)?.clone();
        if self.next + 1 < self.answers.len() {
            self.next += 1;
        }
        Some(answer)
    }
}

/// How a call on a double must be answered, as decided by [Double::resolve][crate::Double::resolve].
pub enum Resolution<R> {
    /// Return the value.
    Value(R),
    /// Raise the error, the call fails.
    Raise(Arc<StdError>),
    /// Delegate the call to the real instance.
    CallRealMethod,
    /// Return the default value of the return type.
    Default,
}

impl<R> Debug for Resolution<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Value(_) => write!(f, "Value"),
            Resolution::Raise(error) => write!(f, "Raise({error})"),
            Resolution::CallRealMethod => write!(f, "CallRealMethod"),
            Resolution::Default => write!(f, "Default"),
        }
    }
}

/// Probe of the default value of `R`, `None` if `R` is not `Default`.
///
/// Call it by reference with both [ProvidesDefault] and [LacksDefault] in scope, method
/// resolution picks [ProvidesDefault] whenever `R: Default`:
/// ```
/// use understudy::{DefaultProbe, LacksDefault as _, ProvidesDefault as _};
///
/// struct NoDefault;
///
/// assert_eq!(Some(0), (&DefaultProbe::<u32>::new()).default_value());
/// assert!((&DefaultProbe::<NoDefault>::new()).default_value().is_none());
/// ```
pub struct DefaultProbe<R>(PhantomData<fn() -> R>);

impl<R> DefaultProbe<R> {
    /// Probe factory
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<R> Default for DefaultProbe<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Default value of types implementing `Default`.
pub trait ProvidesDefault {
    /// Probed type
    type Value;

    /// The default value.
    fn default_value(&self) -> Option<Self::Value>;
}

impl<R: Default> ProvidesDefault for DefaultProbe<R> {
    type Value = R;

    fn default_value(&self) -> Option<R> {
        Some(R::default())
    }
}

/// Fallback for types without default value.
pub trait LacksDefault {
    /// Probed type
    type Value;

    /// Always `None`.
    fn default_value(&self) -> Option<Self::Value>;
}

impl<R> LacksDefault for &DefaultProbe<R> {
    type Value = R;

    fn default_value(&self) -> Option<R> {
        None
    }
}

/// Fail the current call with the given error.
///
/// Used by forwarding implementations, which cannot report errors through the doubled
/// interface.
///
/// # Panics
///
/// Always, with the error message.
pub fn raise<T, E: Display>(error: E) -> T {
    panic!("{error:#}")
}
