//! Per-request hook scope.
//!
//! A `HookScope` is created when a request enters the pipeline and dropped
//! once the response body has been sent, or earlier if the request's future
//! or body is dropped. It carries typed values between the request and
//! response phases and runs registered finalizers exactly once on drop,
//! whatever the exit path: normal completion, inner service error, panic
//! unwinding or cancellation.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use axum::http::StatusCode;

/// Work deferred to request teardown.
pub type Finalizer = Box<dyn FnOnce(&Teardown<'_>) + Send>;

/// Facility accepting finalizers for the current request.
pub trait FinalizerRegistry {
    fn register_finalizer(&mut self, finalizer: Finalizer);
}

/// What a finalizer can see about the finished request.
pub struct Teardown<'a> {
    status: Option<StatusCode>,
    values: &'a HashMap<TypeId, Box<dyn Any + Send>>,
}

impl Teardown<'_> {
    /// Status of the response sent, or `None` if no response was produced.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// A value left in the scope by a hook.
    pub fn get<T: Send + 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }
}

/// Typed storage and finalizers for one request.
#[derive(Default)]
pub struct HookScope {
    values: HashMap<TypeId, Box<dyn Any + Send>>,
    finalizers: Vec<Finalizer>,
    status: Option<StatusCode>,
}

impl HookScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, returning the previous one of the same type.
    pub fn insert<T: Send + 'static>(&mut self, value: T) -> Option<T> {
        self.values
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn get<T: Send + 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    /// Take a value out of the scope.
    pub fn remove<T: Send + 'static>(&mut self) -> Option<T> {
        self.values
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }

    /// Number of finalizers waiting for teardown.
    pub fn pending_finalizers(&self) -> usize {
        self.finalizers.len()
    }

    /// Record the status of the response leaving the pipeline.
    pub(crate) fn complete(&mut self, status: StatusCode) {
        self.status = Some(status);
    }
}

impl FinalizerRegistry for HookScope {
    fn register_finalizer(&mut self, finalizer: Finalizer) {
        self.finalizers.push(finalizer);
    }
}

impl Drop for HookScope {
    fn drop(&mut self) {
        let finalizers = std::mem::take(&mut self.finalizers);
        if finalizers.is_empty() {
            return;
        }
        let teardown = Teardown {
            status: self.status,
            values: &self.values,
        };
        for finalizer in finalizers {
            if catch_unwind(AssertUnwindSafe(|| finalizer(&teardown))).is_err() {
                tracing::error!("Request finalizer panicked");
            }
        }
    }
}
