//! `ssa-expr` — the expression collaborator used for custom reaction rates
//! and branch conditions.
//!
//! The simulation kernel never inspects expression syntax.  It only needs
//! three things from an expression:
//!
//! ```text
//! bind(resolver)     resolve free names to slots (species, time, rand, named vars)
//! evaluate(ctx)      produce an f64 from the current snapshot
//! clone_box()        value-semantics copy for reuse across reactions
//! ```
//!
//! # Crate layout
//!
//! | Module        | Contents                                                 |
//! |---------------|----------------------------------------------------------|
//! | [`context`]   | `EvalContext`, `SpeciesCounts`, `VarSlot`, `SymbolTable` |
//! | [`expression`]| `Expression` trait, `Constant`, `Bernoulli`              |
//! | [`meval_expr`]| `MevalExpression` (arithmetic strings via `meval`)       |
//! | [`error`]     | `EvalError`, `EvalResult<T>`                             |

pub mod context;
pub mod error;
pub mod expression;
pub mod meval_expr;


pub use context::{EvalContext, NameResolver, NamedVar, SpeciesCounts, SymbolTable, VarSlot};
pub use error::{EvalError, EvalResult};
pub use expression::{Bernoulli, Constant, Expression};
pub use meval_expr::MevalExpression;
