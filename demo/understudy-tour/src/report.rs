use std::fmt::{Display, Formatter};

use serde::Serialize;
use understudy::CallSummary;

use crate::scenarios::Scenario;

/// Outcome of one scenario of the tour.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub scenario: Scenario,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub invocations: Vec<CallSummary>,
}

/// Outcomes of every scenario run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TourReport {
    pub outcomes: Vec<ScenarioOutcome>,
}

impl TourReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success).count()
    }
}

impl Display for TourReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for outcome in &self.outcomes {
            let status = if outcome.success { "ok" } else { "FAILED" };
            writeln!(f, ">> {} ... {status}", outcome.scenario)?;
            for invocation in &outcome.invocations {
                writeln!(
                    f,
                    "   #{:<3} {}.{}({})",
                    invocation.sequence,
                    invocation.double,
                    invocation.method,
                    invocation.arguments.join(", ")
                )?;
            }
            if let Some(error) = &outcome.error {
                for line in error.lines() {
                    writeln!(f, "   ! {line}")?;
                }
            }
        }

        write!(
            f,
            "\n{} scenarios, {} failed",
            self.outcomes.len(),
            self.failures()
        )
    }
}
