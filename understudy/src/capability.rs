use std::any::TypeId;

use crate::double::Double;
use crate::entities::MethodId;

/// One method a double exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    /// Method name
    pub method: MethodId,

    /// Number of arguments, receiver excluded
    pub arity: usize,

    /// Identity of the return type
    pub return_type: TypeId,

    /// Name of the return type, for diagnostics
    pub return_type_name: &'static str,
}

impl Capability {
    /// Describe a method returning `R`.
    pub fn new<R: 'static>(method: MethodId, arity: usize) -> Self {
        Self {
            method,
            arity,
            return_type: TypeId::of::<R>(),
            return_type_name: std::any::type_name::<R>(),
        }
    }
}

/// The method signatures of a doubled interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySet {
    name: &'static str,
    capabilities: Vec<Capability>,
}

impl CapabilitySet {
    /// Create a capability set for the interface with the given name.
    pub fn new(name: &'static str, capabilities: Vec<Capability>) -> Self {
        Self { name, capabilities }
    }

    /// Name of the doubled interface.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Find the capability of the given method.
    pub fn get(&self, method: &str) -> Option<&Capability> {
        self.capabilities.iter().find(|c| c.method == method)
    }

    /// All declared capabilities.
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }
}

/// A type standing in for an interface, built around a [Double].
///
/// Implementations are generated by the [double!][crate::double] macro.
pub trait TestDouble: Sized {
    /// The doubled interface, as a trait object type.
    type Real: ?Sized;

    /// Method signatures of the doubled interface.
    fn capabilities() -> CapabilitySet;

    /// Assemble the double from its core and an optional real instance to spy on.
    fn assemble(double: Double, real: Option<Box<Self::Real>>) -> Self;

    /// Core of the double, used for stubbing and verification.
    fn double(&self) -> &Double;
}
