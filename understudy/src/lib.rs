#![warn(missing_docs)]

//! Test doubles for Rust unit tests.
//!
//! Provide:
//! - A [DoubleRegistry] creating doubles, either pure or backed by a real instance (spies).
//! - A stub table programming responses per call pattern, see [Double::when] and
//!   [OngoingStubbing].
//! - [Argument matchers][matcher] and [captors][ArgumentCaptor].
//! - An invocation [ledger] per double and the [verification] operations evaluated against it.
//! - The [double!] macro generating a forwarding implementation of a trait, with typed
//!   stubbing and verification helpers per method.
//!
//! ```
//! use understudy::{DoubleRegistry, test_tools::TestLogger, times};
//!
//! pub trait Catalog {
//!     fn title(&self, index: usize) -> String;
//! }
//!
//! understudy::double! {
//!     pub struct CatalogDouble for Catalog {
//!         fn title(&self, index: usize) -> String;
//!     }
//! }
//!
//! let registry = DoubleRegistry::new(&TestLogger::stdout());
//! let catalog: CatalogDouble = registry.double();
//! catalog.when_title(0).then_return("first".to_string());
//!
//! assert_eq!("first", catalog.title(0));
//! assert_eq!("", catalog.title(1));
//! catalog.verify_title(times(1), 0).unwrap();
//! ```

mod answer;
mod capability;
pub mod configuration;
mod double;
mod double_macro;
mod entities;
mod errors;
pub mod ledger;
pub mod logging;
pub mod matcher;
mod registry;
mod stub_table;
pub mod test_tools;
pub mod verification;

pub use answer::{DefaultProbe, LacksDefault, ProvidesDefault, Resolution, raise};
pub use capability::{Capability, CapabilitySet, TestDouble};
pub use configuration::{Configuration, DefaultAnswer, DoubleSettings};
pub use double::{Double, DoubleDetails};
pub use entities::{Argument, Arguments, CallRecord, CallSummary, DoubleId, MethodId, Sequence};
pub use errors::{DoubleError, VerificationFailure};
pub use matcher::{ArgumentCaptor, ArgumentMatcher, Matcher, any, eq, that};
pub use registry::DoubleRegistry;
pub use stub_table::OngoingStubbing;
pub use verification::{
    CallQuery, InOrder, Times, at_least, at_least_once, at_most, ignore_stubs, never, once,
    times, verify_count, verify_no_more_interactions, verify_order, verify_zero_interactions,
};

#[doc(hidden)]
pub use paste;

/// Generic error type
pub type StdError = anyhow::Error;

/// Generic result type
pub type StdResult<T> = anyhow::Result<T, StdError>;
