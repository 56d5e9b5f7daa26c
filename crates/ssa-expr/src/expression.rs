//! The `Expression` trait and the two trivial implementations the kernel
//! ships with.

use std::fmt;

use crate::{EvalContext, EvalResult, NameResolver};

/// An opaque numeric function of the current simulation snapshot.
///
/// `bind` is called before the first evaluation of every run, and again
/// whenever the set of named variables visible to the expression grows.
/// Names that cannot be resolved are not an error at bind time; reading one
/// during `evaluate` is.
pub trait Expression: fmt::Debug {
    fn bind(&mut self, resolver: &dyn NameResolver) -> EvalResult<()>;

    fn evaluate(&self, ctx: &mut EvalContext<'_>) -> EvalResult<f64>;

    /// Forget everything `bind` resolved.
    fn unbind(&mut self) {}

    fn clone_box(&self) -> Box<dyn Expression>;
}

impl Clone for Box<dyn Expression> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A fixed value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Constant(pub f64);

impl Expression for Constant {
    fn bind(&mut self, _resolver: &dyn NameResolver) -> EvalResult<()> {
        Ok(())
    }

    fn evaluate(&self, _ctx: &mut EvalContext<'_>) -> EvalResult<f64> {
        Ok(self.0)
    }

    fn clone_box(&self) -> Box<dyn Expression> {
        Box::new(*self)
    }
}

/// `1.0` with probability `p`, else `0.0`.  One uniform draw per evaluation.
///
/// The usual branch condition: route a unit one way with probability `p`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bernoulli {
    pub p: f64,
}

impl Bernoulli {
    pub fn new(p: f64) -> Self {
        Self { p }
    }
}

impl Expression for Bernoulli {
    fn bind(&mut self, _resolver: &dyn NameResolver) -> EvalResult<()> {
        Ok(())
    }

    fn evaluate(&self, ctx: &mut EvalContext<'_>) -> EvalResult<f64> {
        Ok(if ctx.rng.uniform01() < self.p { 1.0 } else { 0.0 })
    }

    fn clone_box(&self) -> Box<dyn Expression> {
        Box::new(*self)
    }
}
