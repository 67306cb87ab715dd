use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use slog::{Logger, debug};

use crate::capability::{CapabilitySet, TestDouble};
use crate::configuration::{Configuration, DoubleSettings};
use crate::double::Double;
use crate::entities::DoubleId;
use crate::ledger::SequenceClock;
use crate::logging::LoggerExtensions;
use crate::verification::InOrder;

/// Factory of the doubles of one test.
///
/// Doubles created by the same registry share a sequence clock, so that calls made on
/// different doubles can be ordered against each other.
pub struct DoubleRegistry {
    clock: Arc<SequenceClock>,
    next_id: AtomicU64,
    settings: DoubleSettings,
    logger: Logger,
}

impl DoubleRegistry {
    /// Create a registry with the default settings.
    pub fn new(logger: &Logger) -> Self {
        Self::from_configuration(&Configuration::default(), logger)
    }

    /// Create a registry whose doubles use the settings of the configuration by default.
    pub fn from_configuration(configuration: &Configuration, logger: &Logger) -> Self {
        Self {
            clock: Arc::new(SequenceClock::new()),
            next_id: AtomicU64::new(0),
            settings: configuration.double_settings(),
            logger: logger.new_with_component_name::<Self>(),
        }
    }

    /// Settings given to doubles created without explicit settings.
    pub fn default_settings(&self) -> &DoubleSettings {
        &self.settings
    }

    /// Create a typed double, spying on `real` if given.
    pub fn create<D: TestDouble>(&self, real: Option<Box<D::Real>>, settings: DoubleSettings) -> D {
        let double = self.create_double(D::capabilities(), settings, real.is_some());

        D::assemble(double, real)
    }

    /// Create a pure double with the registry default settings.
    pub fn double<D: TestDouble>(&self) -> D {
        self.create(None, self.settings.clone())
    }

    /// Create a pure double with the given settings.
    pub fn double_with_settings<D: TestDouble>(&self, settings: DoubleSettings) -> D {
        self.create(None, settings)
    }

    /// Create a double spying on the real instance: unstubbed calls are delegated to it.
    pub fn spy<D: TestDouble>(&self, real: Box<D::Real>) -> D {
        self.create(Some(real), self.settings.clone())
    }

    /// Create the core of a double, for forwarding implementations written by hand.
    pub fn create_double(
        &self,
        capabilities: CapabilitySet,
        settings: DoubleSettings,
        spy: bool,
    ) -> Double {
        let id = DoubleId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let double = Double::new(
            id,
            capabilities,
            settings,
            spy,
            self.clock.clone(),
            &self.logger,
        );
        debug!(
            self.logger, "Double created";
            "name" => double.name(), "spy" => spy,
            "default_answer" => %double.settings().default_answer
        );

        double
    }

    /// Create an ordering verifier over the given doubles.
    pub fn in_order<'a>(&self, doubles: &[&'a Double]) -> InOrder<'a> {
        InOrder::new(doubles, &self.logger)
    }
}
