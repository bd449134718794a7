//! Interceptors (middleware) for stage execution.

mod chain;
mod hooks;
mod logging;

pub use chain::{Middleware, MiddlewareChain, MiddlewarePayload, Next};
pub use hooks::{HookMiddleware, StageHooks};
pub use logging::{LogStageMiddleware, TimingMiddleware};
