use std::fmt::{Display, Formatter};

/// Expected number of matching invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Times {
    /// Exactly this number, zero meaning never.
    Exactly(usize),

    /// This number or more.
    AtLeast(usize),

    /// This number or less.
    AtMost(usize),
}

impl Times {
    /// Check if the number of matching invocations is the expected one.
    pub fn holds(&self, count: usize) -> bool {
        match *self {
            Times::Exactly(expected) => count == expected,
            Times::AtLeast(minimum) => count >= minimum,
            Times::AtMost(maximum) => count <= maximum,
        }
    }
}

impl Display for Times {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Times::Exactly(0) => write!(f, "never"),
            Times::Exactly(expected) => write!(f, "exactly {}", plural(expected)),
            Times::AtLeast(minimum) => write!(f, "at least {}", plural(minimum)),
            Times::AtMost(maximum) => write!(f, "at most {}", plural(maximum)),
        }
    }
}

pub(crate) fn plural(count: usize) -> String {
    match count {
        1 => "1 time".to_string(),
        _ => format!("{count} times"),
    }
}

/// Exactly `count` invocations.
pub fn times(count: usize) -> Times {
    Times::Exactly(count)
}

/// Exactly one invocation.
pub fn once() -> Times {
    Times::Exactly(1)
}

/// No invocation at all.
pub fn never() -> Times {
    Times::Exactly(0)
}

/// At least `count` invocations.
pub fn at_least(count: usize) -> Times {
    Times::AtLeast(count)
}

/// At least one invocation.
pub fn at_least_once() -> Times {
    Times::AtLeast(1)
}

/// At most `count` invocations.
pub fn at_most(count: usize) -> Times {
    Times::AtMost(count)
}
