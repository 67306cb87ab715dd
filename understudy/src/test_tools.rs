//! Tools to write tests with doubles: loggers and a builder configuring a double in an
//! isolated block.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use slog::{Drain, Logger};
use slog_async::Async;
use slog_term::{CompactFormat, FullFormat, PlainDecorator, PlainSyncDecorator};

use crate::capability::TestDouble;
use crate::registry::DoubleRegistry;

/// Loggers for tests.
pub struct TestLogger;

impl TestLogger {
    fn from_writer<W: io::Write + Send + 'static>(writer: W) -> Logger {
        let decorator = PlainDecorator::new(writer);
        let drain = CompactFormat::new(decorator).build().fuse();
        let drain = Async::new(drain).build().fuse();
        Logger::root(Arc::new(drain), slog::o!())
    }

    /// Logger writing to the test output, captured by the test harness.
    pub fn stdout() -> Logger {
        Self::from_writer(slog_term::TestStdoutWriter)
    }

    /// Synchronous logger writing in memory, with a handle to read what was logged.
    pub fn memory() -> (Logger, LogCapture) {
        let capture = LogCapture::default();
        let decorator = PlainSyncDecorator::new(capture.clone());
        let drain = FullFormat::new(decorator).build().fuse();

        (Logger::root(drain, slog::o!()), capture)
    }
}

/// In memory log sink filled by [TestLogger::memory].
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Everything logged so far.
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Helper to create a configured double.
///
/// This allows creation of the double in a dedicated block isolated from the remaining test
/// code, ready to be injected into the unit under test.
pub struct DoubleBuilder<D: TestDouble> {
    phantom: std::marker::PhantomData<D>,
}

impl<D: TestDouble> DoubleBuilder<D> {
    /// Create a new double from the registry and program it with the given configuration.
    ///
    /// The type must be specified either:
    /// ```
    /// use understudy::{DoubleRegistry, test_tools::{DoubleBuilder, TestLogger}};
    ///
    /// pub trait Clock {
    ///     fn now(&self) -> u64;
    /// }
    ///
    /// understudy::double! {
    ///     pub struct ClockDouble for Clock {
    ///         fn now(&self) -> u64;
    ///     }
    /// }
    ///
    /// let registry = DoubleRegistry::new(&TestLogger::stdout());
    ///
    /// // from the builder generic
    /// let clock = DoubleBuilder::<ClockDouble>::configure(&registry, |clock| {
    ///     clock.when_now().then_return(12);
    /// });
    ///
    /// // or from the closure parameter
    /// let clock = DoubleBuilder::configure(&registry, |clock: &ClockDouble| {
    ///     clock.when_now().then_return(12);
    /// });
    /// assert_eq!(12, clock.now());
    /// ```
    pub fn configure(registry: &DoubleRegistry, double_config: impl FnOnce(&D)) -> Arc<D> {
        let double = registry.double::<D>();
        double_config(&double);
        Arc::new(double)
    }

    /// Same as [configure][Self::configure] but spying on a real instance.
    pub fn configure_spy(
        registry: &DoubleRegistry,
        real: Box<D::Real>,
        double_config: impl FnOnce(&D),
    ) -> Arc<D> {
        let double = registry.spy::<D>(real);
        double_config(&double);
        Arc::new(double)
    }
}
