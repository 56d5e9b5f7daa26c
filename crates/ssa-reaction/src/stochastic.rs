//! Propensity-driven reactions.
//!
//! # Participants
//!
//! ```text
//! role         side       consumed on fire   counts toward rate
//! reactant     reactants  yes                yes
//! modifier     reactants  no                 yes
//! product      products   (added)            no
//! transformee  both       no                 yes — and `transform` is applied on fire
//! ```
//!
//! A transformee is stored as a modifier on the reactant side plus a
//! modifier-flagged entry on the product side.  The same species may not be
//! both a plain reactant and a modifier, nor a plain product and a
//! transformee.

use std::fmt;

use ssa_core::{SimRng, SpeciesId};
use ssa_expr::{EvalContext, EvalResult, Expression, NameResolver};
use ssa_species::{FireContext, SpeciesArena};

use crate::{ReactionError, ReactionResult};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    Reactant,
    Modifier,
    Product,
    Transformee,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Reactant    => "reactant",
            Role::Modifier    => "modifier",
            Role::Product     => "product",
            Role::Transformee => "transformee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side-entry of a reaction.  `modifier` means "not consumed" on the
/// reactant side and "transformed, not added" on the product side.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    pub species:  SpeciesId,
    pub stoich:   u64,
    pub modifier: bool,
}

/// Where a reaction's propensity comes from.
#[derive(Debug, Clone)]
pub enum Rate {
    /// Mass action: `k · ∏ falling_factorial(count, stoich)`.
    Constant(f64),
    /// Any expression of the current snapshot.
    Custom(Box<dyn Expression>),
}

/// `c · (c−1) · … · (c−s+1)`: ordered ways to pick `s` of `c` units without
/// replacement.  Zero when `c < s`.
pub fn falling_factorial(count: u64, stoich: u64) -> f64 {
    if count < stoich {
        return 0.0;
    }
    (0..stoich).map(|i| (count - i) as f64).product()
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Side {
    Reactants,
    Products,
}

#[derive(Debug, Clone)]
pub struct StochasticReaction {
    name:      String,
    reactants: Vec<Participant>,
    products:  Vec<Participant>,
    rate:      Rate,
}

impl StochasticReaction {
    pub fn new(name: impl Into<String>, rate: Rate) -> ReactionResult<Self> {
        let name = name.into();
        if let Rate::Constant(k) = rate {
            if !k.is_finite() || k < 0.0 {
                return Err(ReactionError::InvalidParameter {
                    reaction: name,
                    message:  format!("rate constant must be finite and non-negative, got {k}"),
                });
            }
        }
        Ok(Self {
            name,
            reactants: Vec::new(),
            products: Vec::new(),
            rate,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reactants(&self) -> &[Participant] {
        &self.reactants
    }

    pub fn products(&self) -> &[Participant] {
        &self.products
    }

    pub fn rate(&self) -> &Rate {
        &self.rate
    }

    // ── Registration ──────────────────────────────────────────────────────

    pub fn add_reactant(&mut self, species: SpeciesId, stoich: u64) -> ReactionResult<()> {
        self.register(Side::Reactants, species, stoich, false, false)
    }

    pub fn add_modifier(&mut self, species: SpeciesId, stoich: u64) -> ReactionResult<()> {
        self.register(Side::Reactants, species, stoich, true, false)
    }

    pub fn add_product(&mut self, species: SpeciesId, stoich: u64) -> ReactionResult<()> {
        self.register(Side::Products, species, stoich, false, false)
    }

    /// Require `stoich` units to be present, and transform `stoich` of them
    /// on every firing.
    pub fn add_transformee(&mut self, species: SpeciesId, stoich: u64) -> ReactionResult<()> {
        self.register(Side::Reactants, species, stoich, true, true)?;
        self.register(Side::Products, species, stoich, true, false)
    }

    /// Same species and role again adds to the stoichiometry (or, for the
    /// presence requirement of a transformee, keeps the larger one).  A
    /// different role on the same side is a conflict.
    fn register(
        &mut self,
        side:     Side,
        species:  SpeciesId,
        stoich:   u64,
        modifier: bool,
        keep_max: bool,
    ) -> ReactionResult<()> {
        if stoich == 0 {
            return Err(ReactionError::ZeroStoichiometry {
                reaction: self.name.clone(),
                species,
            });
        }
        let list = match side {
            Side::Reactants => &mut self.reactants,
            Side::Products => &mut self.products,
        };
        match list.iter_mut().find(|p| p.species == species) {
            Some(existing) if existing.modifier == modifier => {
                existing.stoich = if keep_max {
                    existing.stoich.max(stoich)
                } else {
                    existing.stoich + stoich
                };
                Ok(())
            }
            Some(existing) => Err(ReactionError::RoleConflict {
                reaction:  self.name.clone(),
                species,
                existing:  role_of(side, existing.modifier),
                requested: role_of(side, modifier),
            }),
            None => {
                list.push(Participant { species, stoich, modifier });
                Ok(())
            }
        }
    }

    // ── Runtime ───────────────────────────────────────────────────────────

    pub fn bind(&mut self, resolver: &dyn NameResolver) -> EvalResult<()> {
        match &mut self.rate {
            Rate::Constant(_) => Ok(()),
            Rate::Custom(expr) => expr.bind(resolver),
        }
    }

    pub fn unbind(&mut self) {
        if let Rate::Custom(expr) = &mut self.rate {
            expr.unbind();
        }
    }

    /// Current propensity.  Exactly 0 whenever some reactant (modifiers
    /// included) has fewer units than its stoichiometry.
    pub fn compute_rate(&self, species: &SpeciesArena, time: f64, rng: &mut SimRng) -> EvalResult<f64> {
        let short = self
            .reactants
            .iter()
            .any(|r| species.count(r.species) < r.stoich);
        if short {
            return Ok(0.0);
        }
        match &self.rate {
            Rate::Constant(k) => Ok(self
                .reactants
                .iter()
                .map(|r| falling_factorial(species.count(r.species), r.stoich))
                .fold(*k, |acc, f| acc * f)),
            Rate::Custom(expr) => {
                let mut ctx = EvalContext::new(time, species, &[], rng);
                expr.evaluate(&mut ctx)
            }
        }
    }

    /// Consume reactants, then add products and transform transformees.
    ///
    /// Not atomic: if a later step fails, earlier mutations stay applied.
    pub fn fire(&self, species: &mut SpeciesArena, ctx: &mut FireContext<'_>) -> ReactionResult<()> {
        for r in self.reactants.iter().filter(|r| !r.modifier) {
            species.remove(r.species, r.stoich, ctx)?;
        }
        for p in &self.products {
            if p.modifier {
                species.transform(p.species, p.stoich, ctx)?;
            } else {
                species.add(p.species, p.stoich, &[], ctx)?;
            }
        }
        Ok(())
    }
}

fn role_of(side: Side, modifier: bool) -> Role {
    match (side, modifier) {
        (Side::Reactants, false) => Role::Reactant,
        (Side::Reactants, true) => Role::Modifier,
        (Side::Products, false) => Role::Product,
        (Side::Products, true) => Role::Transformee,
    }
}
