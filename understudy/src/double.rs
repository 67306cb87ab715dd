use std::any::{TypeId, type_name};
use std::sync::Arc;

use slog::{Logger, debug, trace, warn};

use crate::answer::{Answer, Resolution};
use crate::capability::CapabilitySet;
use crate::configuration::{DefaultAnswer, DoubleSettings};
use crate::entities::{Arguments, CallRecord, DoubleId, MethodId};
use crate::errors::DoubleError;
use crate::ledger::{InvocationLedger, SequenceClock};
use crate::logging::LoggerExtensions;
use crate::matcher::ArgumentMatcher;
use crate::stub_table::{OngoingStubbing, StubLookup, StubTable};

/// Core of a test double: its identity, stub table and invocation ledger.
///
/// Typed doubles generated by [double!][crate::double] wrap a `Double` and forward every
/// call of the doubled trait to [Double::resolve].
pub struct Double {
    id: DoubleId,
    name: String,
    capabilities: CapabilitySet,
    settings: DoubleSettings,
    spy: bool,
    stubs: StubTable,
    ledger: InvocationLedger,
    logger: Logger,
}

/// Snapshot of the state of a double, for inspection in tests.
#[derive(Debug, Clone)]
pub struct DoubleDetails {
    /// Display name of the double
    pub name: String,

    /// Name of the doubled interface
    pub capability: &'static str,

    /// True if the double spies on a real instance
    pub is_spy: bool,

    /// Answer given to unstubbed calls
    pub default_answer: DefaultAnswer,

    /// Recorded invocations, in call order
    pub invocations: Vec<CallRecord>,

    /// Number of registered stub rules
    pub stub_rules: usize,
}

impl Double {
    pub(crate) fn new(
        id: DoubleId,
        capabilities: CapabilitySet,
        settings: DoubleSettings,
        spy: bool,
        clock: Arc<SequenceClock>,
        logger: &Logger,
    ) -> Self {
        let name = settings
            .name
            .clone()
            .unwrap_or_else(|| format!("{}#{id}", capabilities.name()));
        let logger = logger.new_with_name(&name);

        Self {
            id,
            name,
            capabilities,
            settings,
            spy,
            stubs: StubTable::default(),
            ledger: InvocationLedger::new(clock),
            logger,
        }
    }

    /// Identity of the double within its registry.
    pub fn id(&self) -> DoubleId {
        self.id
    }

    /// Display name of the double.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Method signatures exposed by the double.
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// Settings the double was created with.
    pub fn settings(&self) -> &DoubleSettings {
        &self.settings
    }

    /// True if the double spies on a real instance.
    pub fn is_spy(&self) -> bool {
        self.spy
    }

    /// Invocation ledger of the double.
    pub fn ledger(&self) -> &InvocationLedger {
        &self.ledger
    }

    pub(crate) fn stub_table(&self) -> &StubTable {
        &self.stubs
    }

    pub(crate) fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Start the stubbing of the calls of `method` whose arguments are accepted by the
    /// matchers.
    ///
    /// The method, its number of arguments and the return type `R` are checked against the
    /// capabilities of the double.
    pub fn when<R: Send + 'static>(
        &self,
        method: MethodId,
        matchers: Vec<ArgumentMatcher>,
    ) -> Result<OngoingStubbing<'_, R>, DoubleError> {
        let Some(capability) = self.capabilities.get(method) else {
            return Err(self.configuration_error(
                method,
                format!("`{}` has no method `{method}`", self.capabilities.name()),
            ));
        };
        if capability.arity != matchers.len() {
            return Err(self.configuration_error(
                method,
                format!(
                    "expected {} argument matchers, got {}",
                    capability.arity,
                    matchers.len()
                ),
            ));
        }
        if capability.return_type != TypeId::of::<R>() {
            return Err(self.configuration_error(
                method,
                format!(
                    "stubbed return type `{}` differs from the declared `{}`",
                    type_name::<R>(),
                    capability.return_type_name
                ),
            ));
        }

        Ok(OngoingStubbing::new(self, method, matchers))
    }

    /// Record a call and decide how it must be answered.
    ///
    /// The call is appended to the ledger before any stub rule is consulted. Without
    /// matching rule, a spy delegates to its real instance, otherwise the
    /// [DefaultAnswer] of the double applies.
    pub fn resolve<R: Send + 'static>(
        &self,
        method: MethodId,
        arguments: Arguments,
    ) -> Result<Resolution<R>, DoubleError> {
        let record = self.ledger.append(self.id, &self.name, method, arguments);
        trace!(self.logger, "Call recorded"; "call" => %record);

        match self.stubs.lookup::<R>(method, &record.arguments) {
            StubLookup::Found(answer) => {
                self.ledger.mark_stubbed(record.sequence);
                debug!(
                    self.logger, "Stubbed call";
                    "call" => %record, "answer" => format!("{answer:?}")
                );

                Ok(match answer {
                    Answer::Produce(producer) => Resolution::Value(producer(&record)),
                    Answer::Raise(error) => Resolution::Raise(error),
                    Answer::CallRealMethod => Resolution::CallRealMethod,
                    Answer::DoNothing => Resolution::Default,
                })
            }
            StubLookup::ReturnTypeMismatch => Err(self.configuration_error(
                method,
                format!(
                    "a stub rule matching `{}` returns another type than `{}`",
                    describe_call(&record),
                    type_name::<R>()
                ),
            )),
            StubLookup::NotFound => self.unstubbed(&record),
        }
    }

    fn unstubbed<R>(&self, record: &CallRecord) -> Result<Resolution<R>, DoubleError> {
        if self.spy {
            return Ok(Resolution::CallRealMethod);
        }

        match self.settings.default_answer {
            DefaultAnswer::ReturnsDefaults => Ok(Resolution::Default),
            DefaultAnswer::ReturnsSmartNulls => {
                warn!(
                    self.logger, "Unstubbed call answered with a default value";
                    "call" => describe_call(record), "type" => type_name::<R>()
                );
                Ok(Resolution::Default)
            }
            DefaultAnswer::Strict => Err(DoubleError::UnstubbedCallOnStrictDouble {
                call: describe_call(record),
                reason: "no stub rule matches on a strict double".to_string(),
            }),
            DefaultAnswer::CallsRealMethods => Err(self.missing_real_instance(record.method)),
        }
    }

    /// Recorded invocations, in call order.
    pub fn invocations(&self) -> Vec<CallRecord> {
        self.ledger.records()
    }

    /// Snapshot of the state of the double.
    pub fn details(&self) -> DoubleDetails {
        DoubleDetails {
            name: self.name.clone(),
            capability: self.capabilities.name(),
            is_spy: self.spy,
            default_answer: self.settings.default_answer,
            invocations: self.invocations(),
            stub_rules: self.stubs.len(),
        }
    }

    /// Forget every stub rule and every recorded invocation.
    pub fn reset(&self) {
        debug!(self.logger, "Reset");
        self.stubs.clear();
        self.ledger.clear();
    }

    /// Forget every recorded invocation, stub rules are kept.
    pub fn clear_invocations(&self) {
        debug!(self.logger, "Clear invocations");
        self.ledger.clear();
    }

    #[doc(hidden)]
    pub fn missing_real_instance(&self, method: MethodId) -> DoubleError {
        DoubleError::UnstubbedCallOnStrictDouble {
            call: format!("{}.{method}", self.name),
            reason: "no real instance to delegate to".to_string(),
        }
    }

    #[doc(hidden)]
    pub fn missing_default_value<R>(&self, method: MethodId) -> DoubleError {
        DoubleError::UnstubbedCallOnStrictDouble {
            call: format!("{}.{method}", self.name),
            reason: format!(
                "`{}` has no default value, the call must be stubbed",
                type_name::<R>()
            ),
        }
    }

    fn configuration_error(&self, method: MethodId, reason: String) -> DoubleError {
        DoubleError::StubConfigurationError {
            double: self.name.clone(),
            method: method.to_string(),
            reason,
        }
    }
}

impl std::fmt::Debug for Double {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Double")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("spy", &self.spy)
            .finish_non_exhaustive()
    }
}

fn describe_call(record: &CallRecord) -> String {
    format!(
        "{}.{}({})",
        record.double_name, record.method, record.arguments
    )
}
