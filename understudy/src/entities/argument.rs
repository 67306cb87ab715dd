use std::any::Any;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// A type-erased argument passed to a double, together with its `Debug` rendering.
#[derive(Clone)]
pub struct Argument {
    value: Arc<dyn Any + Send + Sync>,
    rendered: String,
}

impl Argument {
    /// Argument factory
    pub fn new<T: Debug + Send + Sync + 'static>(value: T) -> Self {
        let rendered = format!("{value:?}");
        Self {
            value: Arc::new(value),
            rendered,
        }
    }

    /// Get the argument value if it is of type `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Check if the argument holds a value of type `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    /// `Debug` rendering of the value, used in diagnostics.
    pub fn rendered(&self) -> &str {
        &self.rendered
    }
}

impl Debug for Argument {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.rendered)
    }
}

/// Ordered arguments of one invocation.
#[derive(Clone, Debug, Default)]
pub struct Arguments(Vec<Argument>);

impl Arguments {
    /// Arguments factory
    pub fn new(values: Vec<Argument>) -> Self {
        Self(values)
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the invocation had no arguments
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the raw argument at the given position.
    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.0.get(index)
    }

    /// Get the argument at the given position if it is of type `T`.
    pub fn value<T: 'static>(&self, index: usize) -> Option<&T> {
        self.get(index).and_then(|argument| argument.downcast_ref::<T>())
    }

    /// Iterate over the arguments in order.
    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.0.iter()
    }

    /// `Debug` renderings of every argument, in order.
    pub fn rendered(&self) -> Vec<String> {
        self.0.iter().map(|a| a.rendered().to_string()).collect()
    }
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.rendered().join(", "))
    }
}

impl From<Vec<Argument>> for Arguments {
    fn from(values: Vec<Argument>) -> Self {
        Self::new(values)
    }
}
