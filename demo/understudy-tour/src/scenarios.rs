use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};

use anyhow::{Context, anyhow, ensure};
use clap::ValueEnum;
use serde::Serialize;
use slog::{Logger, debug, info, warn};
use strum::{Display, EnumIter};

use understudy::test_tools::DoubleBuilder;
use understudy::{
    ArgumentCaptor, CallRecord, Configuration, DefaultAnswer, Double, DoubleRegistry,
    DoubleSettings, StdResult, TestDouble, any, at_least, at_least_once, at_most, ignore_stubs,
    never, once, that, times, verify_no_more_interactions, verify_order,
    verify_zero_interactions,
};

use crate::list::{ListApi, ListDouble, Playlist, SharedLinkedList};
use crate::report::{ScenarioOutcome, TourReport};

/// The usage patterns walked through by the tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display, EnumIter, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    VerifyBehaviour,
    Stubbing,
    ArgumentMatchers,
    InvocationCounts,
    StubbedErrors,
    VerificationInOrder,
    ZeroInteractions,
    RedundantInvocations,
    ConsecutiveCalls,
    CallbackAnswers,
    SpyingOnRealObjects,
    PartialDoubles,
    SmartNulls,
    ArgumentCapture,
    ResetDouble,
    IgnoreStubs,
    DoubleDetails,
    ExplicitInjection,
    ConfiguredDefaultAnswer,
}

/// State of a running scenario: its registry and the invocations kept for the report.
pub struct Stage {
    registry: DoubleRegistry,
    logger: Logger,
    invocations: Vec<CallRecord>,
}

impl Stage {
    fn new(configuration: &Configuration, logger: Logger) -> Self {
        Self {
            registry: DoubleRegistry::from_configuration(configuration, &logger),
            logger,
            invocations: Vec::new(),
        }
    }

    /// A pure double answering unstubbed calls with default values.
    fn list(&self) -> ListDouble {
        self.registry.double_with_settings(DoubleSettings::default())
    }

    fn spy(&self) -> ListDouble {
        self.registry
            .spy::<ListDouble>(Box::new(SharedLinkedList::default()))
    }

    /// Keep the invocations of the double for the report.
    fn keep(&mut self, double: &Double) {
        self.invocations.extend(double.invocations());
    }
}

/// Run scenarios, each one with its own registry.
pub struct Tour {
    configuration: Configuration,
    logger: Logger,
}

impl Tour {
    pub fn new(configuration: Configuration, logger: Logger) -> Self {
        Self {
            configuration,
            logger,
        }
    }

    pub fn run(&self, scenarios: &[Scenario]) -> TourReport {
        TourReport {
            outcomes: scenarios.iter().map(|s| self.run_scenario(*s)).collect(),
        }
    }

    fn run_scenario(&self, scenario: Scenario) -> ScenarioOutcome {
        let logger = self.logger.new(slog::o!("scenario" => scenario.to_string()));
        info!(logger, ">> Run scenario");
        let mut stage = Stage::new(&self.configuration, logger.clone());

        let result = silent_catch_unwind(|| scenario.play(&mut stage))
            .map_err(|message| anyhow!("scenario raised: {message}"))
            .and_then(|result| result);
        if let Err(error) = &result {
            warn!(logger, "Scenario failed"; "error" => format!("{error:#}"));
        }

        let mut invocations = stage.invocations;
        invocations.sort_by_key(|record| record.sequence);
        ScenarioOutcome {
            scenario,
            success: result.is_ok(),
            error: result.err().map(|error| format!("{error:#}")),
            invocations: invocations.iter().map(CallRecord::summary).collect(),
        }
    }
}

impl Scenario {
    fn play(self, stage: &mut Stage) -> StdResult<()> {
        match self {
            Scenario::VerifyBehaviour => verify_behaviour(stage),
            Scenario::Stubbing => stubbing(stage),
            Scenario::ArgumentMatchers => argument_matchers(stage),
            Scenario::InvocationCounts => invocation_counts(stage),
            Scenario::StubbedErrors => stubbed_errors(stage),
            Scenario::VerificationInOrder => verification_in_order(stage),
            Scenario::ZeroInteractions => zero_interactions(stage),
            Scenario::RedundantInvocations => redundant_invocations(stage),
            Scenario::ConsecutiveCalls => consecutive_calls(stage),
            Scenario::CallbackAnswers => callback_answers(stage),
            Scenario::SpyingOnRealObjects => spying_on_real_objects(stage),
            Scenario::PartialDoubles => partial_doubles(stage),
            Scenario::SmartNulls => smart_nulls(stage),
            Scenario::ArgumentCapture => argument_capture(stage),
            Scenario::ResetDouble => reset_double(stage),
            Scenario::IgnoreStubs => ignore_stubbed_calls(stage),
            Scenario::DoubleDetails => double_details(stage),
            Scenario::ExplicitInjection => explicit_injection(stage),
            Scenario::ConfiguredDefaultAnswer => configured_default_answer(stage),
        }
    }
}

thread_local! {
    static SILENCED_PANICS: Cell<usize> = const { Cell::new(0) };
}

static SILENT_PANIC_HOOK: Once = Once::new();

/// Install, once per process, a panic hook muting the panics of the threads running a
/// [silent_catch_unwind] and delegating the others to the previous hook.
fn install_silent_panic_hook() {
    SILENT_PANIC_HOOK.call_once(|| {
        let previous_hook = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if SILENCED_PANICS.with(Cell::get) == 0 {
                previous_hook(info);
            }
        }));
    });
}

/// Run the call, hiding the panic message it may raise, and return that message as error.
fn silent_catch_unwind<T>(call: impl FnOnce() -> T) -> Result<T, String> {
    install_silent_panic_hook();
    SILENCED_PANICS.with(|silenced| silenced.set(silenced.get() + 1));
    let result = panic::catch_unwind(AssertUnwindSafe(call));
    SILENCED_PANICS.with(|silenced| silenced.set(silenced.get() - 1));

    result.map_err(|payload| {
        payload
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
            .unwrap_or_else(|| "unknown error".to_string())
    })
}

/// Run a call expected to raise and return the raised message.
fn expect_raise<T>(call: impl FnOnce() -> T) -> StdResult<String> {
    match silent_catch_unwind(call) {
        Ok(_) => Err(anyhow!("the call was expected to raise")),
        Err(message) => Ok(message),
    }
}

fn verify_behaviour(stage: &mut Stage) -> StdResult<()> {
    let list = stage.list();

    list.add("one".to_string());
    list.clear();

    list.verify_add(once(), "one")?;
    list.verify_clear(once())?;
    stage.keep(list.double());

    Ok(())
}

fn stubbing(stage: &mut Stage) -> StdResult<()> {
    let list = stage.list();
    list.when_get(0).then_return(Some("first".to_string()));
    list.when_get(1)
        .then_raise(anyhow!("index out of bounds: 1"));

    ensure!(list.get(0) == Some("first".to_string()), "get(0) should be stubbed");
    ensure!(list.get(0) == Some("first".to_string()), "get(0) should be stubbed");
    ensure!(list.get(999).is_none(), "get(999) is not stubbed");
    let raised = expect_raise(|| list.get(1))?;
    debug!(stage.logger, "get(1) raised"; "message" => &raised);

    list.verify_get(times(2), 0)?;
    let error = list
        .verify_get(times(3), 0)
        .err()
        .context("get(0) was invoked twice, not three times")?;
    debug!(stage.logger, "Expected verification failure"; "error" => error.to_string());
    stage.keep(list.double());

    Ok(())
}

fn argument_matchers(stage: &mut Stage) -> StdResult<()> {
    let list = stage.list();
    list.when_get(any()).then_return(Some("element".to_string()));
    list.when_add(that("a non empty title", |title: &String| !title.is_empty()))
        .then_return(true);

    ensure!(list.get(999) == Some("element".to_string()), "any index should match");
    ensure!(list.add("title".to_string()), "non empty titles should be accepted");
    ensure!(!list.add(String::new()), "empty titles should not match");

    list.verify_get(times(1), any())?;
    list.verify_add(times(2), any())?;
    stage.keep(list.double());

    Ok(())
}

fn invocation_counts(stage: &mut Stage) -> StdResult<()> {
    let list = stage.list();

    list.add("once".to_string());
    list.verify_add(once(), "once")?;
    list.verify_add(times(1), "once")?;

    list.add("twice".to_string());
    list.add("twice".to_string());
    list.verify_add(times(2), "twice")?;

    for _ in 0..3 {
        list.add("three times".to_string());
    }
    list.verify_add(times(3), "three times")?;
    list.verify_add(never(), "never happened")?;
    list.verify_add(at_least_once(), "three times")?;
    list.verify_add(at_least(2), "three times")?;
    list.verify_add(at_most(5), "three times")?;
    stage.keep(list.double());

    Ok(())
}

fn stubbed_errors(stage: &mut Stage) -> StdResult<()> {
    let list = stage.list();
    list.when_clear().then_raise(anyhow!("clear is not supported"));

    let raised = expect_raise(|| list.clear())?;
    ensure!(
        raised == "clear is not supported",
        "unexpected raised message: {raised}"
    );
    list.verify_clear(once())?;
    stage.keep(list.double());

    Ok(())
}

fn verification_in_order(stage: &mut Stage) -> StdResult<()> {
    let single = stage.list();
    single.add("was added first".to_string());
    single.add("was added second".to_string());

    let mut in_order = stage.registry.in_order(&[single.double()]);
    in_order.verify(&single.add_call("was added first"))?;
    in_order.verify(&single.add_call("was added second"))?;

    let first = stage.list();
    let second = stage.list();
    first.add("was called first".to_string());
    second.add("was called three".to_string());
    first.add("was called two".to_string());
    second.add("was called four".to_string());

    let mut in_order = stage.registry.in_order(&[first.double(), second.double()]);
    in_order.verify(&first.add_call("was called first"))?;
    in_order.verify(&second.add_call("was called three"))?;
    in_order.verify(&first.add_call("was called two"))?;
    in_order.verify(&second.add_call("was called four"))?;

    verify_order(&[first.add_call(any()), second.add_call(any())])?;
    ensure!(
        verify_order(&[second.add_call("was called four"), first.add_call(any())]).is_err(),
        "nothing happened on first after the last call on second"
    );

    stage.keep(single.double());
    stage.keep(first.double());
    stage.keep(second.double());

    Ok(())
}

fn zero_interactions(stage: &mut Stage) -> StdResult<()> {
    let list_two = stage.list();
    let list_three = stage.list();

    verify_zero_interactions(&[list_two.double(), list_three.double()])?;

    Ok(())
}

fn redundant_invocations(stage: &mut Stage) -> StdResult<()> {
    let list = stage.list();
    list.add("one".to_string());
    list.add("two".to_string());

    list.verify_add(once(), "one")?;
    let error = verify_no_more_interactions(&[list.double()])
        .err()
        .context("add(two) is not verified yet")?;
    debug!(stage.logger, "Redundant invocation found"; "error" => error.to_string());

    list.verify_add(once(), "two")?;
    verify_no_more_interactions(&[list.double()])?;
    stage.keep(list.double());

    Ok(())
}

fn consecutive_calls(stage: &mut Stage) -> StdResult<()> {
    let list = stage.list();
    list.when_get(1)
        .then_return(Some("foo".to_string()))
        .then_raise(anyhow!("no more foo"));

    ensure!(list.get(1) == Some("foo".to_string()), "first call returns foo");
    let raised = expect_raise(|| list.get(1))?;
    ensure!(raised == "no more foo", "unexpected raised message: {raised}");
    stage.keep(list.double());

    Ok(())
}

fn callback_answers(stage: &mut Stage) -> StdResult<()> {
    let list = stage.list();
    list.when_get(any()).then_answer(|invocation| {
        Some(format!(
            "{}.{} called with arguments: {}",
            invocation.double_name, invocation.method, invocation.arguments
        ))
    });

    let answer = list.get(213);
    ensure!(
        answer == Some(format!("{}.get called with arguments: 213", list.double().name())),
        "unexpected answer: {answer:?}"
    );
    stage.keep(list.double());

    Ok(())
}

fn spying_on_real_objects(stage: &mut Stage) -> StdResult<()> {
    let spy = stage.spy();
    spy.when_size().then_return(100);

    spy.add("one".to_string());
    spy.add("two".to_string());

    ensure!(spy.get(0) == Some("one".to_string()), "get(0) reaches the real list");
    ensure!(spy.size() == 100, "size() is stubbed");
    spy.verify_add(once(), "one")?;
    spy.verify_add(once(), "two")?;

    let empty_spy = stage.spy();
    empty_spy.when_get(0).then_return(Some("foo".to_string()));
    ensure!(
        empty_spy.get(0) == Some("foo".to_string()),
        "stubbing a spy does not call the real list"
    );

    stage.keep(spy.double());
    stage.keep(empty_spy.double());

    Ok(())
}

fn partial_doubles(stage: &mut Stage) -> StdResult<()> {
    let spy = stage.spy();
    spy.when_add(any()).then_return(false);
    spy.when_add("123").then_call_real_method()?;

    ensure!(spy.add("123".to_string()), "add(123) reaches the real list");
    ensure!(!spy.add("456".to_string()), "add(456) is stubbed");
    ensure!(spy.size() == 1, "only 123 was added to the real list");
    stage.keep(spy.double());

    Ok(())
}

fn smart_nulls(stage: &mut Stage) -> StdResult<()> {
    let list: ListDouble = stage.registry.double_with_settings(
        DoubleSettings::default().with_default_answer(DefaultAnswer::ReturnsSmartNulls),
    );

    list.add("123".to_string());
    ensure!(list.get(0).is_none(), "smart nulls are default values");
    stage.keep(list.double());

    Ok(())
}

fn argument_capture(stage: &mut Stage) -> StdResult<()> {
    let list = stage.list();
    list.add("123".to_string());

    let argument = ArgumentCaptor::<String>::new();
    list.verify_add(once(), argument.capture())?;
    ensure!(
        argument.value() == Some("123".to_string()),
        "unexpected captured value: {:?}",
        argument.value()
    );
    stage.keep(list.double());

    Ok(())
}

fn reset_double(stage: &mut Stage) -> StdResult<()> {
    let list = stage.list();
    list.when_size().then_return(10);
    list.add("1".to_string());
    ensure!(list.size() == 10, "size() is stubbed");

    list.double().reset();

    ensure!(list.size() == 0, "stub rules are forgotten");
    list.verify_add(never(), any())?;
    list.verify_size(once())?;
    stage.keep(list.double());

    Ok(())
}

fn ignore_stubbed_calls(stage: &mut Stage) -> StdResult<()> {
    let list = stage.list();
    let other = stage.list();
    list.when_get(0).then_return(Some("first".to_string()));

    list.get(0);
    list.add("one".to_string());
    other.clear();
    list.verify_add(once(), "one")?;
    other.verify_clear(once())?;

    verify_no_more_interactions(&ignore_stubs(&[list.double(), other.double()]))?;
    stage.keep(list.double());
    stage.keep(other.double());

    Ok(())
}

fn double_details(stage: &mut Stage) -> StdResult<()> {
    let list = stage.list();
    let spy = stage.spy();
    list.when_size().then_return(3);
    list.size();

    let details = list.double().details();
    ensure!(!details.is_spy, "a pure double is not a spy");
    ensure!(details.stub_rules == 1, "one stub rule was registered");
    ensure!(spy.double().details().is_spy, "a spy is a spy");
    info!(
        stage.logger, "Double details";
        "name" => &details.name, "capability" => details.capability,
        "invocations" => details.invocations.len()
    );
    stage.keep(list.double());

    Ok(())
}

fn explicit_injection(stage: &mut Stage) -> StdResult<()> {
    let titles = DoubleBuilder::<ListDouble>::configure(&stage.registry, |titles| {
        titles.when_get(0).then_return(Some("Intro".to_string()));
        titles.when_size().then_return(1);
        titles.when_clear().then_do_nothing();
    });

    let playlist = Playlist::new(titles.clone());
    ensure!(
        playlist.now_playing() == Some("Intro".to_string()),
        "the injected double answers the playlist"
    );
    playlist.restart();
    titles.verify_clear(once())?;

    let spied_titles: Arc<ListDouble> = DoubleBuilder::<ListDouble>::configure_spy(
        &stage.registry,
        Box::new(SharedLinkedList::default()),
        |_| {},
    );
    let playlist = Playlist::new(spied_titles.clone());
    playlist.enqueue("Outro");
    ensure!(
        playlist.now_playing() == Some("Outro".to_string()),
        "the spied list stores the titles"
    );

    stage.keep(titles.double());
    stage.keep(spied_titles.double());

    Ok(())
}

fn configured_default_answer(stage: &mut Stage) -> StdResult<()> {
    let list: ListDouble = stage.registry.double();
    let default_answer = list.double().settings().default_answer;

    match default_answer {
        DefaultAnswer::ReturnsDefaults | DefaultAnswer::ReturnsSmartNulls => {
            ensure!(list.size() == 0, "unstubbed size() returns its default value");
        }
        DefaultAnswer::Strict | DefaultAnswer::CallsRealMethods => {
            let raised = expect_raise(|| list.size())?;
            debug!(stage.logger, "Unstubbed call raised"; "message" => &raised);
        }
    }
    info!(stage.logger, "Configured default answer"; "default_answer" => %default_answer);
    stage.keep(list.double());

    Ok(())
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;
    use understudy::test_tools::TestLogger;

    use super::*;

    fn tour(configuration: Configuration) -> Tour {
        Tour::new(configuration, TestLogger::stdout())
    }

    #[test]
    fn every_scenario_succeeds_with_default_configuration() {
        let scenarios: Vec<Scenario> = Scenario::iter().collect();

        let report = tour(Configuration::default()).run(&scenarios);

        assert_eq!(scenarios.len(), report.outcomes.len());
        let failed: Vec<_> = report
            .outcomes
            .iter()
            .filter(|o| !o.success)
            .map(|o| (o.scenario, o.error.clone()))
            .collect();
        assert!(failed.is_empty(), "failed scenarios: {failed:?}");
    }

    #[test]
    fn every_scenario_succeeds_with_strict_configuration() {
        let configuration = Configuration {
            default_answer: DefaultAnswer::ReturnsDefaults,
            strict: true,
        };

        let report = tour(configuration).run(&Scenario::iter().collect::<Vec<_>>());

        assert_eq!(0, report.failures(), "report:\n{report}");
    }

    #[test]
    fn report_keeps_invocations_in_call_order() {
        let report = tour(Configuration::default()).run(&[Scenario::VerificationInOrder]);

        let sequences: Vec<u64> = report.outcomes[0]
            .invocations
            .iter()
            .map(|invocation| invocation.sequence)
            .collect();
        assert_eq!(6, sequences.len());
        assert!(sequences.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn scenario_names_are_kebab_case() {
        assert_eq!("verify-behaviour", Scenario::VerifyBehaviour.to_string());
        assert_eq!(
            Scenario::SpyingOnRealObjects,
            Scenario::from_str("spying-on-real-objects", false).unwrap()
        );
    }

    #[test]
    fn expect_raise_fails_when_the_call_returns() {
        let mut stage = Stage::new(&Configuration::default(), TestLogger::stdout());
        let list = stage.list();
        list.add("one".to_string());
        stage.keep(list.double());

        let error = expect_raise(|| list.size()).expect_err("size() does not raise");

        assert!(error.to_string().contains("expected to raise"));
        assert_eq!(1, stage.invocations.len());
    }

    #[test]
    fn expect_raise_returns_the_raised_message() {
        let stage = Stage::new(&Configuration::default(), TestLogger::stdout());
        let list = stage.list();
        list.when_size().then_raise(anyhow!("size is unknown"));

        let message = expect_raise(|| list.size()).unwrap();

        assert_eq!("size is unknown", message);
    }

    #[test]
    fn concurrent_and_nested_raises_restore_the_panic_reporting() {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| {
                    for _ in 0..20 {
                        let nested = silent_catch_unwind(|| expect_raise::<()>(|| panic!("inner")))
                            .unwrap()
                            .unwrap();
                        assert_eq!("inner", nested);
                    }
                    SILENCED_PANICS.with(Cell::get)
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(0, handle.join().unwrap());
        }
        assert_eq!(0, SILENCED_PANICS.with(Cell::get));
    }
}
