/// Generate a double of a trait.
///
/// Given a trait and the signatures of its methods, generates:
/// - the double struct, created with a [DoubleRegistry][crate::DoubleRegistry],
/// - its [TestDouble][crate::TestDouble] implementation,
/// - the implementation of the trait, recording every call then answering it from the stub
///   rules, the real instance for spies, or the default answer,
/// - typed helpers per method `m`: `when_m(matchers..)` to stub it, `verify_m(times,
///   matchers..)` to verify its number of invocations and `m_call(matchers..)` to build a
///   [CallQuery][crate::CallQuery] for ordering verifications.
///
/// Methods must take `&self` and owned arguments that are `Clone + Debug + Send + Sync`.
/// Errors that cannot be returned through the trait (strict doubles, stubbed errors) are
/// raised, see [raise][crate::raise].
///
/// ```
/// use std::sync::Arc;
/// use understudy::{DoubleRegistry, any, at_least_once, never, test_tools::TestLogger};
///
/// pub trait Inventory {
///     fn count(&self, item: String) -> u32;
///     fn restock(&self, item: String, quantity: u32);
/// }
///
/// understudy::double! {
///     /// Double of the inventory
///     pub struct InventoryDouble for Inventory {
///         fn count(&self, item: String) -> u32;
///         fn restock(&self, item: String, quantity: u32);
///     }
/// }
///
/// struct Shop {
///     inventory: Arc<dyn Inventory + Send + Sync>,
/// }
///
/// impl Shop {
///     fn sell(&self, item: &str) {
///         if self.inventory.count(item.to_string()) < 2 {
///             self.inventory.restock(item.to_string(), 10);
///         }
///     }
/// }
///
/// let registry = DoubleRegistry::new(&TestLogger::stdout());
/// let inventory: Arc<InventoryDouble> = Arc::new(registry.double());
/// inventory.when_count("apple").then_return(1);
/// inventory.when_count("pear").then_return(5);
///
/// let shop = Shop { inventory: inventory.clone() };
/// shop.sell("apple");
/// shop.sell("pear");
///
/// inventory.verify_restock(at_least_once(), "apple", 10).unwrap();
/// inventory.verify_restock(never(), "pear", any()).unwrap();
/// ```
#[macro_export]
macro_rules! double {
    (
        $(#[$meta:meta])*
        $vis:vis struct $double:ident for $capability:path {
            $(
                $(#[$method_meta:meta])*
                fn $method:ident(&self $(, $arg:ident : $arg_ty:ty)* $(,)?) $(-> $ret:ty)?;
            )*
        }
    ) => {
        $(#[$meta])*
        $vis struct $double {
            double: $crate::Double,
            real: ::std::option::Option<
                ::std::boxed::Box<dyn $capability + ::std::marker::Send + ::std::marker::Sync>,
            >,
        }

        impl $crate::TestDouble for $double {
            type Real = dyn $capability + ::std::marker::Send + ::std::marker::Sync;

            fn capabilities() -> $crate::CapabilitySet {
                $crate::CapabilitySet::new(
                    stringify!($capability),
                    vec![$(
                        $crate::Capability::new::<$crate::double_return_type!($($ret)?)>(
                            stringify!($method),
                            $crate::double_count!($($arg)*),
                        )
                    ),*],
                )
            }

            fn assemble(
                double: $crate::Double,
                real: ::std::option::Option<::std::boxed::Box<Self::Real>>,
            ) -> Self {
                Self { double, real }
            }

            fn double(&self) -> &$crate::Double {
                &self.double
            }
        }

        impl $capability for $double {
            $(
                $(#[$method_meta])*
                fn $method(&self $(, $arg: $arg_ty)*) $(-> $ret)? {
                    #[allow(unused_imports)]
                    use $crate::{LacksDefault as _, ProvidesDefault as _};

                    let arguments = $crate::Arguments::new(vec![
                        $($crate::Argument::new(::std::clone::Clone::clone(&$arg))),*
                    ]);
                    match self
                        .double
                        .resolve::<$crate::double_return_type!($($ret)?)>(stringify!($method), arguments)
                    {
                        Ok($crate::Resolution::Value(value)) => value,
                        Ok($crate::Resolution::Raise(error)) => $crate::raise(error),
                        Ok($crate::Resolution::CallRealMethod) => match &self.real {
                            Some(real) => real.$method($($arg),*),
                            None => $crate::raise(
                                self.double.missing_real_instance(stringify!($method)),
                            ),
                        },
                        Ok($crate::Resolution::Default) => {
                            match (&$crate::DefaultProbe::<$crate::double_return_type!($($ret)?)>::new())
                                .default_value()
                            {
                                Some(value) => value,
                                None => $crate::raise(
                                    self.double.missing_default_value::<
                                        $crate::double_return_type!($($ret)?)
                                    >(stringify!($method)),
                                ),
                            }
                        }
                        Err(error) => $crate::raise(error),
                    }
                }
            )*
        }

        $crate::paste::paste! {
            impl $double {
                $(
                    #[doc = concat!(
                        "Stub the calls of `", stringify!($method),
                        "` whose arguments are accepted by the matchers."
                    )]
                    #[allow(dead_code)]
                    #[must_use = "a stubbing registers no rule until a then_* response is given"]
                    $vis fn [<when_ $method>](
                        &self
                        $(, $arg: impl ::std::convert::Into<$crate::Matcher<$arg_ty>>)*
                    ) -> $crate::OngoingStubbing<'_, $crate::double_return_type!($($ret)?)> {
                        self.double
                            .when(
                                stringify!($method),
                                vec![$(
                                    ::std::convert::Into::<$crate::Matcher<$arg_ty>>::into($arg)
                                        .into_inner()
                                ),*],
                            )
                            .unwrap_or_else(|error| $crate::raise(error))
                    }

                    #[doc = concat!(
                        "Verify the number of invocations of `", stringify!($method),
                        "` whose arguments are accepted by the matchers."
                    )]
                    #[allow(dead_code)]
                    $vis fn [<verify_ $method>](
                        &self,
                        times: $crate::Times
                        $(, $arg: impl ::std::convert::Into<$crate::Matcher<$arg_ty>>)*
                    ) -> ::std::result::Result<(), $crate::DoubleError> {
                        self.[<$method _call>]($($arg),*).verify(times)
                    }

                    #[doc = concat!(
                        "Query of the invocations of `", stringify!($method),
                        "` whose arguments are accepted by the matchers."
                    )]
                    #[allow(dead_code)]
                    $vis fn [<$method _call>](
                        &self
                        $(, $arg: impl ::std::convert::Into<$crate::Matcher<$arg_ty>>)*
                    ) -> $crate::CallQuery<'_> {
                        $crate::CallQuery::new(
                            &self.double,
                            stringify!($method),
                            vec![$(
                                ::std::convert::Into::<$crate::Matcher<$arg_ty>>::into($arg)
                                    .into_inner()
                            ),*],
                        )
                    }
                )*
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! double_return_type {
    () => {
        ()
    };
    ($ret:ty) => {
        $ret
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! double_count {
    () => {
        0usize
    };
    ($head:ident $($tail:ident)*) => {
        1usize + $crate::double_count!($($tail)*)
    };
}
