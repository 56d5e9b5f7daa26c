//! Fluent, name-based builder for constructing a [`Sim`].

use std::collections::HashMap;
use std::fmt::Display;

use ssa_core::{SimConfig, SpeciesId};
use ssa_expr::Expression;
use ssa_reaction::{DelayReaction, Rate, Reaction, Role, StochasticReaction, TimerReaction};
use ssa_species::{BranchNode, IndividualPool, SimpleCounter, Species, SpeciesArena, Term};

use crate::{Sim, SimError, SimResult};

type NamedTerms = Vec<(String, u64)>;

enum SpeciesDef {
    Counter {
        name:    String,
        initial: u64,
    },
    Pool {
        name:            String,
        initial:         u64,
        report_removals: bool,
    },
    Branch {
        name:      String,
        condition: Box<dyn Expression>,
        on_true:   NamedTerms,
        on_false:  NamedTerms,
    },
}

impl SpeciesDef {
    fn name(&self) -> &str {
        match self {
            SpeciesDef::Counter { name, .. }
            | SpeciesDef::Pool { name, .. }
            | SpeciesDef::Branch { name, .. } => name,
        }
    }
}

enum ReactionDef {
    Stochastic {
        name:         String,
        rate:         Rate,
        participants: Vec<(Role, String, u64)>,
    },
    Delay {
        name:       String,
        pool:       String,
        delay:      f64,
        products:   NamedTerms,
        forward_as: Option<String>,
    },
    Timer {
        name:     String,
        at:       f64,
        products: NamedTerms,
    },
}

impl ReactionDef {
    fn name(&self) -> &str {
        match self {
            ReactionDef::Stochastic { name, .. }
            | ReactionDef::Delay { name, .. }
            | ReactionDef::Timer { name, .. } => name,
        }
    }
}

/// Fluent builder for [`Sim`].
///
/// Species and reactions refer to each other by name, in any order; names
/// are resolved and every registration is validated in [`build`](Self::build).
/// Species ids follow registration order.
///
/// # Example
///
/// ```rust,ignore
/// let sim = SimBuilder::new(SimConfig::new(7, 0.5))
///     .counter("X", 100)
///     .pool("Cells", 10)
///     .stochastic("divide", Rate::Constant(0.1)).modifier("Cells", 1).product("Cells", 1).done()
///     .delay("die", "Cells", 30.0, &[])
///     .timer("pulse", 5.0, &[("X", 50)])
///     .build()?;
/// ```
pub struct SimBuilder {
    config:    SimConfig,
    species:   Vec<SpeciesDef>,
    reactions: Vec<ReactionDef>,
}

impl SimBuilder {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            species: Vec::new(),
            reactions: Vec::new(),
        }
    }

    // ── Species ───────────────────────────────────────────────────────────

    /// A count-only species.
    pub fn counter(mut self, name: impl Into<String>, initial: u64) -> Self {
        self.species.push(SpeciesDef::Counter { name: name.into(), initial });
        self
    }

    /// An identity-tracking species whose units remember their creation time
    /// and modification count.
    pub fn pool(self, name: impl Into<String>, initial: u64) -> Self {
        self.pool_with_reports(name, initial, false)
    }

    /// Like [`pool`](Self::pool); with `report_removals` every unit leaving the
    /// pool is passed to [`SimObserver::on_unit_removed`][crate::SimObserver::on_unit_removed].
    pub fn pool_with_reports(
        mut self,
        name:            impl Into<String>,
        initial:         u64,
        report_removals: bool,
    ) -> Self {
        self.species.push(SpeciesDef::Pool {
            name: name.into(),
            initial,
            report_removals,
        });
        self
    }

    /// A routing node: each unit added to it is forwarded to `on_true` when
    /// `condition` evaluates non-zero, and to `on_false` otherwise.
    pub fn branch(
        mut self,
        name:      impl Into<String>,
        condition: impl Expression + 'static,
        on_true:   &[(&str, u64)],
        on_false:  &[(&str, u64)],
    ) -> Self {
        self.species.push(SpeciesDef::Branch {
            name:      name.into(),
            condition: Box::new(condition),
            on_true:   owned_terms(on_true),
            on_false:  owned_terms(on_false),
        });
        self
    }

    // ── Reactions ─────────────────────────────────────────────────────────

    /// Start a propensity-driven reaction; finish it with
    /// [`StochasticBuilder::done`].
    pub fn stochastic(self, name: impl Into<String>, rate: Rate) -> StochasticBuilder {
        StochasticBuilder {
            parent:       self,
            name:         name.into(),
            rate,
            participants: Vec::new(),
        }
    }

    /// Fires `delay` after the creation of the oldest unit of `pool`,
    /// removing that unit and adding `products`.
    pub fn delay(
        mut self,
        name:     impl Into<String>,
        pool:     impl Into<String>,
        delay:    f64,
        products: &[(&str, u64)],
    ) -> Self {
        self.reactions.push(ReactionDef::Delay {
            name:       name.into(),
            pool:       pool.into(),
            delay,
            products:   owned_terms(products),
            forward_as: None,
        });
        self
    }

    /// Like [`delay`](Self::delay), and passes the removed unit's
    /// modification count to the products as the variable `forward_as`.
    pub fn delay_forwarding(
        mut self,
        name:       impl Into<String>,
        pool:       impl Into<String>,
        delay:      f64,
        products:   &[(&str, u64)],
        forward_as: impl Into<String>,
    ) -> Self {
        self.reactions.push(ReactionDef::Delay {
            name:       name.into(),
            pool:       pool.into(),
            delay,
            products:   owned_terms(products),
            forward_as: Some(forward_as.into()),
        });
        self
    }

    /// Fires once at time `at`, adding `products`.
    pub fn timer(mut self, name: impl Into<String>, at: f64, products: &[(&str, u64)]) -> Self {
        self.reactions.push(ReactionDef::Timer {
            name: name.into(),
            at,
            products: owned_terms(products),
        });
        self
    }

    // ── Build ─────────────────────────────────────────────────────────────

    /// Resolve names, validate the model, and return a ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim> {
        self.config.validate()?;

        let mut ids: HashMap<String, SpeciesId> = HashMap::new();
        for (i, def) in self.species.iter().enumerate() {
            let id = SpeciesId::try_from(i).map_err(config)?;
            if ids.insert(def.name().to_owned(), id).is_some() {
                return Err(config(format!("duplicate species name `{}`", def.name())));
            }
        }
        check_branch_cycles(&self.species, &ids)?;

        let mut arena = SpeciesArena::new();
        for def in self.species {
            let species = match def {
                SpeciesDef::Counter { name, initial } => {
                    Species::Counter(SimpleCounter::new(name, initial))
                }
                SpeciesDef::Pool { name, initial, report_removals } => Species::Pool(
                    IndividualPool::new(name, initial).with_removal_reports(report_removals),
                ),
                SpeciesDef::Branch { name, condition, on_true, on_false } => {
                    let on_true = resolve_terms(&ids, &name, &on_true)?;
                    let on_false = resolve_terms(&ids, &name, &on_false)?;
                    Species::Branch(BranchNode::new(name, condition, on_true, on_false))
                }
            };
            let name = species.name().to_owned();
            arena
                .insert(species)
                .ok_or_else(|| config(format!("duplicate species name `{name}`")))?;
        }

        let mut reaction_names: Vec<String> = Vec::with_capacity(self.reactions.len());
        let mut reactions = Vec::with_capacity(self.reactions.len());
        for def in self.reactions {
            if reaction_names.iter().any(|n| n == def.name()) {
                return Err(config(format!("duplicate reaction name `{}`", def.name())));
            }
            reaction_names.push(def.name().to_owned());
            reactions.push(build_reaction(def, &ids, &arena)?);
        }

        Ok(Sim::new(self.config, arena, reactions))
    }
}

// ── StochasticBuilder ─────────────────────────────────────────────────────────

/// Participants of one stochastic reaction under construction.
pub struct StochasticBuilder {
    parent:       SimBuilder,
    name:         String,
    rate:         Rate,
    participants: Vec<(Role, String, u64)>,
}

impl StochasticBuilder {
    /// Consumed on firing; counts toward the propensity.
    pub fn reactant(self, species: &str, stoich: u64) -> Self {
        self.with(Role::Reactant, species, stoich)
    }

    /// Counts toward the propensity; not consumed.
    pub fn modifier(self, species: &str, stoich: u64) -> Self {
        self.with(Role::Modifier, species, stoich)
    }

    pub fn product(self, species: &str, stoich: u64) -> Self {
        self.with(Role::Product, species, stoich)
    }

    /// Required present like a modifier; on firing `stoich` of its units get
    /// their modification count incremented.
    pub fn transformee(self, species: &str, stoich: u64) -> Self {
        self.with(Role::Transformee, species, stoich)
    }

    /// Register the reaction and return to the model builder.
    pub fn done(self) -> SimBuilder {
        let mut parent = self.parent;
        parent.reactions.push(ReactionDef::Stochastic {
            name:         self.name,
            rate:         self.rate,
            participants: self.participants,
        });
        parent
    }

    fn with(mut self, role: Role, species: &str, stoich: u64) -> Self {
        self.participants.push((role, species.to_owned(), stoich));
        self
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn config(err: impl Display) -> SimError {
    SimError::Config(err.to_string())
}

fn owned_terms(terms: &[(&str, u64)]) -> NamedTerms {
    terms.iter().map(|&(name, n)| (name.to_owned(), n)).collect()
}

fn resolve(ids: &HashMap<String, SpeciesId>, owner: &str, name: &str) -> SimResult<SpeciesId> {
    ids.get(name)
        .copied()
        .ok_or_else(|| config(format!("`{owner}` references unknown species `{name}`")))
}

fn resolve_terms(
    ids:   &HashMap<String, SpeciesId>,
    owner: &str,
    terms: &[(String, u64)],
) -> SimResult<Vec<Term>> {
    terms
        .iter()
        .map(|(name, stoich)| {
            if *stoich == 0 {
                return Err(config(format!("`{owner}`: stoichiometry of `{name}` must be positive")));
            }
            Ok(Term::new(resolve(ids, owner, name)?, *stoich))
        })
        .collect()
}

fn build_reaction(
    def:   ReactionDef,
    ids:   &HashMap<String, SpeciesId>,
    arena: &SpeciesArena,
) -> SimResult<Reaction> {
    match def {
        ReactionDef::Stochastic { name, rate, participants } => {
            let mut r = StochasticReaction::new(&name, rate).map_err(config)?;
            for (role, species, stoich) in &participants {
                let id = resolve(ids, &name, species)?;
                let added = match role {
                    Role::Reactant => r.add_reactant(id, *stoich),
                    Role::Modifier => r.add_modifier(id, *stoich),
                    Role::Product => r.add_product(id, *stoich),
                    Role::Transformee => r.add_transformee(id, *stoich),
                };
                added.map_err(|err| config(format!("{err} (`{species}`)")))?;
            }
            Ok(Reaction::Stochastic(r))
        }
        ReactionDef::Delay { name, pool, delay, products, forward_as } => {
            let id = resolve(ids, &name, &pool)?;
            match arena.get(id) {
                Some(Species::Pool(_)) => {}
                Some(other) => {
                    return Err(config(format!(
                        "delay `{name}` is bound to {} `{pool}`; it needs an individual pool",
                        other.kind()
                    )));
                }
                None => return Err(config(format!("delay `{name}`: unknown species `{pool}`"))),
            }
            let mut r = DelayReaction::new(&name, id, delay).map_err(config)?;
            if let Some(var) = forward_as {
                r = r.forward_modifications_as(var);
            }
            for term in resolve_terms(ids, &name, &products)? {
                r.add_product(term.species, term.stoich).map_err(config)?;
            }
            Ok(Reaction::Delay(r))
        }
        ReactionDef::Timer { name, at, products } => {
            let mut r = TimerReaction::new(&name, at).map_err(config)?;
            for term in resolve_terms(ids, &name, &products)? {
                r.add_product(term.species, term.stoich).map_err(config)?;
            }
            Ok(Reaction::Timer(r))
        }
    }
}

/// Reject branch nodes that can route a unit back into themselves, which
/// would recurse without bound on the first add.
fn check_branch_cycles(species: &[SpeciesDef], ids: &HashMap<String, SpeciesId>) -> SimResult<()> {
    #[derive(Copy, Clone, PartialEq)]
    enum Mark {
        New,
        Open,
        Done,
    }

    // Edges between branch nodes only; counters and pools end a route.
    let edges: Vec<Vec<usize>> = species
        .iter()
        .map(|def| match def {
            SpeciesDef::Branch { on_true, on_false, .. } => on_true
                .iter()
                .chain(on_false)
                .filter_map(|(name, _)| ids.get(name).map(|id| id.index()))
                .filter(|&i| matches!(species[i], SpeciesDef::Branch { .. }))
                .collect(),
            _ => Vec::new(),
        })
        .collect();

    fn visit(node: usize, edges: &[Vec<usize>], marks: &mut [Mark]) -> Option<usize> {
        marks[node] = Mark::Open;
        for &next in &edges[node] {
            match marks[next] {
                Mark::Open => return Some(next),
                Mark::New => {
                    if let Some(hit) = visit(next, edges, marks) {
                        return Some(hit);
                    }
                }
                Mark::Done => {}
            }
        }
        marks[node] = Mark::Done;
        None
    }

    let mut marks = vec![Mark::New; species.len()];
    for start in 0..species.len() {
        if marks[start] == Mark::New {
            if let Some(hit) = visit(start, &edges, &mut marks) {
                return Err(config(format!(
                    "branch routing cycle through `{}`",
                    species[hit].name()
                )));
            }
        }
    }
    Ok(())
}
