//! Arithmetic expressions parsed from strings by `meval`.
//!
//! Free identifiers are resolved at bind time through the supplied
//! [`NameResolver`]: species names read counts, `time`/`t` reads the clock,
//! `rand` draws a fresh `U[0, 1)` on every read, and named variables read the
//! call's variable table.  `pi` and `e` are constants unless shadowed.
//!
//! `meval` has no comparison operators, so branch conditions are written
//! arithmetically: `floor(rand + p)` is 1 with probability `p`, and
//! `bernoulli(p)` is the same thing spelled out.
//!
//! Functions: `sqrt exp ln log10 abs sin cos tan floor ceil round signum`
//! (one argument), `uniform(a, b)`, `bernoulli(p)`, and variadic `min`/`max`.

use std::cell::RefCell;
use std::str::FromStr;

use meval::tokenizer::Token;
use meval::{ContextProvider, FuncEvalError};
use ssa_core::SimRng;

use crate::{
    EvalContext, EvalError, EvalResult, Expression, NameResolver, NamedVar, SpeciesCounts,
    VarSlot,
};

/// An `Expression` backed by a parsed `meval::Expr`.
#[derive(Clone, Debug)]
pub struct MevalExpression {
    source:   String,
    expr:     meval::Expr,
    names:    Vec<String>,
    bindings: Vec<(String, VarSlot)>,
}

impl MevalExpression {
    pub fn parse(source: &str) -> EvalResult<Self> {
        let expr = meval::Expr::from_str(source).map_err(|err| EvalError::Parse {
            source_text: source.to_owned(),
            message:     err.to_string(),
        })?;
        let mut names: Vec<String> = Vec::new();
        for token in expr.iter() {
            if let Token::Var(name) = token {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        Ok(Self {
            source: source.to_owned(),
            expr,
            names,
            bindings: Vec::new(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Identifiers read as variables (not called), in first-seen order.
    pub fn free_names(&self) -> &[String] {
        &self.names
    }

    /// Names that resolved at the last `bind`.
    pub fn bound_names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|(name, _)| name.as_str())
    }
}

impl FromStr for MevalExpression {
    type Err = EvalError;

    fn from_str(s: &str) -> EvalResult<Self> {
        Self::parse(s)
    }
}

impl Expression for MevalExpression {
    fn bind(&mut self, resolver: &dyn NameResolver) -> EvalResult<()> {
        self.bindings = self
            .names
            .iter()
            .filter_map(|name| resolver.resolve(name).map(|slot| (name.clone(), slot)))
            .collect();
        Ok(())
    }

    fn unbind(&mut self) {
        self.bindings.clear();
    }

    fn evaluate(&self, ctx: &mut EvalContext<'_>) -> EvalResult<f64> {
        let rng = RefCell::new(&mut *ctx.rng);
        let failure = RefCell::new(None);
        let scope = Scope {
            bindings: &self.bindings,
            time:     ctx.time,
            counts:   ctx.counts,
            vars:     ctx.vars,
            rng:      &rng,
            failure:  &failure,
        };

        match self.expr.eval_with_context(scope) {
            Ok(value) if value.is_finite() => Ok(value),
            Ok(_) => Err(EvalError::Domain(self.source.clone())),
            Err(err) => Err(failure
                .into_inner()
                .unwrap_or_else(|| EvalError::Failed(err.to_string()))),
        }
    }

    fn clone_box(&self) -> Box<dyn Expression> {
        Box::new(self.clone())
    }
}

// ── meval bridge ──────────────────────────────────────────────────────────────

/// Per-evaluation view handed to `meval`.  `ContextProvider` only gets `&self`,
/// so the RNG and the first failure sit behind `RefCell`s.
struct Scope<'s, 'r> {
    bindings: &'s [(String, VarSlot)],
    time:     f64,
    counts:   &'s dyn SpeciesCounts,
    vars:     &'s [NamedVar],
    rng:      &'s RefCell<&'r mut SimRng>,
    failure:  &'s RefCell<Option<EvalError>>,
}

impl Scope<'_, '_> {
    fn fail(&self, err: EvalError) {
        let mut slot = self.failure.borrow_mut();
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    fn uniform01(&self) -> f64 {
        self.rng.borrow_mut().uniform01()
    }

    fn arity(&self, name: &str, expected: usize, args: &[f64]) -> Result<(), FuncEvalError> {
        if args.len() == expected {
            return Ok(());
        }
        self.fail(EvalError::Arity {
            name: name.to_owned(),
            expected,
            got: args.len(),
        });
        Err(FuncEvalError::NumberArgs(expected))
    }
}

impl ContextProvider for Scope<'_, '_> {
    fn get_var(&self, name: &str) -> Option<f64> {
        let slot = self
            .bindings
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, slot)| *slot);

        let value = match slot {
            Some(VarSlot::Species(id)) => Some(self.counts.count_of(id) as f64),
            Some(VarSlot::Named(pos)) => self.vars.get(pos).map(|(_, v)| *v),
            Some(VarSlot::Time) => Some(self.time),
            Some(VarSlot::Random) => Some(self.uniform01()),
            None => match name {
                "pi" => Some(std::f64::consts::PI),
                "e" => Some(std::f64::consts::E),
                _ => None,
            },
        };
        if value.is_none() {
            self.fail(EvalError::UnboundVariable(name.to_owned()));
        }
        value
    }

    fn eval_func(&self, name: &str, args: &[f64]) -> Result<f64, FuncEvalError> {
        let unary: Option<fn(f64) -> f64> = match name {
            "sqrt" => Some(f64::sqrt),
            "exp" => Some(f64::exp),
            "ln" => Some(f64::ln),
            "log10" => Some(f64::log10),
            "abs" => Some(f64::abs),
            "sin" => Some(f64::sin),
            "cos" => Some(f64::cos),
            "tan" => Some(f64::tan),
            "floor" => Some(f64::floor),
            "ceil" => Some(f64::ceil),
            "round" => Some(f64::round),
            "signum" => Some(f64::signum),
            _ => None,
        };
        if let Some(f) = unary {
            self.arity(name, 1, args)?;
            return Ok(f(args[0]));
        }

        match name {
            "uniform" => {
                self.arity(name, 2, args)?;
                let (lo, hi) = (args[0], args[1]);
                Ok(lo + (hi - lo) * self.uniform01())
            }
            "bernoulli" => {
                self.arity(name, 1, args)?;
                Ok(if self.uniform01() < args[0] { 1.0 } else { 0.0 })
            }
            "min" | "max" => {
                if args.is_empty() {
                    self.fail(EvalError::Arity { name: name.to_owned(), expected: 1, got: 0 });
                    return Err(FuncEvalError::TooFewArguments);
                }
                let pick: fn(f64, f64) -> f64 = if name == "min" { f64::min } else { f64::max };
                Ok(args[1..].iter().copied().fold(args[0], pick))
            }
            _ => {
                self.fail(EvalError::UnknownFunction(name.to_owned()));
                Err(FuncEvalError::UnknownFunction)
            }
        }
    }
}
