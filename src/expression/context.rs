//! Configuration bundles threaded through type resolution and evaluation.

use crate::expression::{ExpressionError, ExpressionResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation signal
///
/// Clones observe the same flag, so the owner of a flow can cancel work
/// running on any stage it handed a clone to.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Settings consulted while evaluating expressions
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    pub cancel: CancelFlag,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel_flag(cancel: CancelFlag) -> Self {
        Self { cancel }
    }

    /// Fail with `Cancelled` once the flag has been raised
    pub fn check_cancelled(&self) -> ExpressionResult<()> {
        if self.cancel.is_cancelled() {
            Err(ExpressionError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Settings consulted while resolving types
#[derive(Debug, Clone)]
pub struct SemaContext {
    /// Whether function calls may appear in the expression
    pub allow_functions: bool,
}

impl Default for SemaContext {
    fn default() -> Self {
        Self {
            allow_functions: true,
        }
    }
}

impl SemaContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that rejects every function call
    pub fn without_functions() -> Self {
        Self {
            allow_functions: false,
        }
    }
}
