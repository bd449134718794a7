//! Context initializers.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt::Debug;
use std::marker::PhantomData;

/// Produces the context of an invocation from its arguments.
///
/// Runs exactly once per invocation, before any stage.
#[async_trait]
pub trait Initializer<A, C>: Send + Sync {
    /// Creates the context.
    async fn initialize(&self, arguments: &A) -> anyhow::Result<C>;
}

/// A synchronous function-based initializer.
pub struct FnInitializer<A, C, F> {
    func: F,
    _phantom: PhantomData<fn(&A) -> C>,
}

impl<A, C, F> FnInitializer<A, C, F> {
    /// Creates a new function-based initializer.
    pub fn new(func: F) -> Self
    where
        F: Fn(&A) -> anyhow::Result<C> + Send + Sync,
    {
        Self {
            func,
            _phantom: PhantomData,
        }
    }
}

impl<A, C, F> Debug for FnInitializer<A, C, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnInitializer").finish_non_exhaustive()
    }
}

#[async_trait]
impl<A, C, F> Initializer<A, C> for FnInitializer<A, C, F>
where
    A: Send + Sync + 'static,
    C: Send + 'static,
    F: Fn(&A) -> anyhow::Result<C> + Send + Sync,
{
    async fn initialize(&self, arguments: &A) -> anyhow::Result<C> {
        (self.func)(arguments)
    }
}

/// An async function-based initializer.
pub struct AsyncFnInitializer<A, C, F> {
    func: F,
    _phantom: PhantomData<fn(&A) -> C>,
}

impl<A, C, F> AsyncFnInitializer<A, C, F> {
    /// Creates a new async function-based initializer.
    pub fn new(func: F) -> Self
    where
        F: for<'a> Fn(&'a A) -> BoxFuture<'a, anyhow::Result<C>> + Send + Sync,
    {
        Self {
            func,
            _phantom: PhantomData,
        }
    }
}

impl<A, C, F> Debug for AsyncFnInitializer<A, C, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFnInitializer").finish_non_exhaustive()
    }
}

#[async_trait]
impl<A, C, F> Initializer<A, C> for AsyncFnInitializer<A, C, F>
where
    A: Send + Sync + 'static,
    C: Send + 'static,
    F: for<'a> Fn(&'a A) -> BoxFuture<'a, anyhow::Result<C>> + Send + Sync,
{
    async fn initialize(&self, arguments: &A) -> anyhow::Result<C> {
        (self.func)(arguments).await
    }
}
