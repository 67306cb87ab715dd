use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::Arguments;

/// Identifier of a double, unique within its registry.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize, Hash, Eq, PartialOrd, Ord,
)]
pub struct DoubleId(pub u64);

impl Display for DoubleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a method of a capability set: its name.
pub type MethodId = &'static str;

/// Position of an invocation in the registry-wide call order.
///
/// Sequences start at 1, `Sequence(0)` is used as "before any invocation".
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize, Hash, Eq, PartialOrd, Ord,
)]
pub struct Sequence(pub u64);

impl Display for Sequence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One observed invocation on a double.
#[derive(Clone, Debug)]
pub struct CallRecord {
    /// Double that received the call
    pub double: DoubleId,

    /// Display name of the double
    pub double_name: String,

    /// Called method
    pub method: MethodId,

    /// Arguments, in declaration order
    pub arguments: Arguments,

    /// Registry-wide call order
    pub sequence: Sequence,

    /// Date at which the call was recorded
    pub timestamp: DateTime<Utc>,
}

impl CallRecord {
    /// Serializable view of the record.
    pub fn summary(&self) -> CallSummary {
        CallSummary {
            double: self.double_name.clone(),
            method: self.method.to_string(),
            arguments: self.arguments.rendered(),
            sequence: self.sequence.0,
            timestamp: self.timestamp,
        }
    }
}

impl Display for CallRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}({}) {}",
            self.double_name, self.method, self.arguments, self.sequence
        )
    }
}

/// Serializable rendering of a [CallRecord], arguments being kept as their `Debug` output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSummary {
    /// Display name of the double
    pub double: String,

    /// Called method
    pub method: String,

    /// `Debug` rendering of each argument
    pub arguments: Vec<String>,

    /// Registry-wide call order
    pub sequence: u64,

    /// Date at which the call was recorded
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use crate::entities::Argument;

    use super::*;

    fn record() -> CallRecord {
        CallRecord {
            double: DoubleId(3),
            double_name: "ListApi#3".to_string(),
            method: "add",
            arguments: Arguments::new(vec![Argument::new("one".to_string())]),
            sequence: Sequence(7),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn display_call_record() {
        assert_eq!(r#"ListApi#3.add("one") #7"#, record().to_string());
    }

    #[test]
    fn summary_keeps_rendered_arguments_and_sequence() {
        let record = record();
        let summary = record.summary();

        assert_eq!(
            CallSummary {
                double: "ListApi#3".to_string(),
                method: "add".to_string(),
                arguments: vec![r#""one""#.to_string()],
                sequence: 7,
                timestamp: record.timestamp,
            },
            summary
        );
    }

    #[test]
    fn summary_can_be_serialized_to_json() {
        let json = serde_json::to_value(record().summary()).unwrap();

        assert_eq!("add", json["method"]);
        assert_eq!(7, json["sequence"]);
    }
}
