// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Generates a clonable, thread-safe wrapper around a user-supplied single-argument closure.
///
/// The generated type stores an `Arc<dyn Fn(..) + Send + Sync>` and provides:
/// - `new(f)` to wrap any matching closure
/// - `call(&self, arg)` to invoke it
/// - `Clone` and an opaque `Debug`
///
/// ```rust,ignore
/// define_fn_wrapper!(EnableIf<Req>(Fn(&Req) -> bool));
/// define_fn_wrapper!(OnLaunch(Fn(OnLaunchArgs)));
/// ```
macro_rules! define_fn_wrapper {
    (@traits $name:ident<$($generics:ident),*>) => {
        impl<$($generics),*> Clone for $name<$($generics),*> {
            fn clone(&self) -> Self {
                Self(std::sync::Arc::clone(&self.0))
            }
        }

        impl<$($generics),*> std::fmt::Debug for $name<$($generics),*> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name)).finish()
            }
        }
    };

    ($name:ident<$($generics:ident),*>(Fn($arg:ty) -> $ret:ty)) => {
        pub(crate) struct $name<$($generics),*>(std::sync::Arc<dyn Fn($arg) -> $ret + Send + Sync>);

        impl<$($generics),*> $name<$($generics),*> {
            pub(crate) fn new(f: impl Fn($arg) -> $ret + Send + Sync + 'static) -> Self {
                Self(std::sync::Arc::new(f))
            }

            pub(crate) fn call(&self, arg: $arg) -> $ret {
                (self.0)(arg)
            }
        }

        $crate::utils::define_fn_wrapper!(@traits $name<$($generics),*>);
    };

    ($name:ident(Fn($arg:ty))) => {
        pub(crate) struct $name(std::sync::Arc<dyn Fn($arg) + Send + Sync>);

        impl $name {
            pub(crate) fn new(f: impl Fn($arg) + Send + Sync + 'static) -> Self {
                Self(std::sync::Arc::new(f))
            }

            pub(crate) fn call(&self, arg: $arg) {
                (self.0)(arg);
            }
        }

        $crate::utils::define_fn_wrapper!(@traits $name<>);
    };
}

pub(crate) use define_fn_wrapper;
