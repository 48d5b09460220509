//! Declarative move archetypes and the registry keyed by variable type.
//!
//! An archetype names the shape of the neighbourhood it can handle through
//! [`SlotSpec`]s: exactly one sampled-variable slot plus connected-factor
//! slots. Synthesis matches those slots against a latent variable's
//! connected factors and hands the result to [`MoveArchetype::instantiate`]
//! as a [`Wiring`].

use std::any::{type_name, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use pgm_core::{
    downcast_factor, downcast_variable, AsAny, ErrorInfo, Factor, PgmError, Variable,
};

use crate::config::ProposalConfig;
use crate::kernel::{Proposal, SelfContainedMove};
use crate::moves::{IntegerGibbs, IntegerRandomWalk, RealRandomWalk};
use crate::variables::{IntVar, RealVar};

/// How many factors a connected-factor slot receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly one factor.
    One,
    /// Every remaining matching factor, possibly none.
    All,
}

/// Which factors a connected-factor slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorRequirement {
    /// Any factor.
    Any,
    /// Factors of one concrete type.
    OfType {
        /// Type accepted by the slot.
        type_id: TypeId,
        /// Type name, for diagnostics.
        label: &'static str,
    },
}

impl FactorRequirement {
    /// Requirement accepting only `F`.
    pub fn of<F: Factor>() -> Self {
        FactorRequirement::OfType {
            type_id: TypeId::of::<F>(),
            label: type_name::<F>(),
        }
    }

    /// Whether `factor` satisfies the requirement.
    pub fn matches(&self, factor: &dyn Factor) -> bool {
        match self {
            FactorRequirement::Any => true,
            FactorRequirement::OfType { type_id, .. } => factor.concrete_type_id() == *type_id,
        }
    }
}

/// One declared slot of an archetype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotSpec {
    /// The variable the move samples.
    SampledVariable {
        /// Slot name.
        name: &'static str,
        /// Variable type the archetype handles.
        type_id: TypeId,
        /// Type name, for diagnostics.
        label: &'static str,
    },
    /// Factors connected to the sampled variable.
    ConnectedFactor {
        /// Slot name.
        name: &'static str,
        /// Factors the slot accepts.
        requirement: FactorRequirement,
        /// How many factors the slot receives.
        cardinality: Cardinality,
    },
}

impl SlotSpec {
    /// Sampled-variable slot of type `V`.
    pub fn sampled_variable<V: Variable>(name: &'static str) -> Self {
        SlotSpec::SampledVariable {
            name,
            type_id: TypeId::of::<V>(),
            label: type_name::<V>(),
        }
    }

    /// Slot taking exactly one factor of type `F`.
    pub fn factor<F: Factor>(name: &'static str) -> Self {
        SlotSpec::ConnectedFactor {
            name,
            requirement: FactorRequirement::of::<F>(),
            cardinality: Cardinality::One,
        }
    }

    /// Slot taking every remaining factor of type `F`.
    pub fn factors<F: Factor>(name: &'static str) -> Self {
        SlotSpec::ConnectedFactor {
            name,
            requirement: FactorRequirement::of::<F>(),
            cardinality: Cardinality::All,
        }
    }

    /// Slot taking every remaining factor.
    pub fn any_factors(name: &'static str) -> Self {
        SlotSpec::ConnectedFactor {
            name,
            requirement: FactorRequirement::Any,
            cardinality: Cardinality::All,
        }
    }

    /// Slot name.
    pub fn name(&self) -> &'static str {
        match self {
            SlotSpec::SampledVariable { name, .. } | SlotSpec::ConnectedFactor { name, .. } => {
                *name
            }
        }
    }
}

/// What an archetype instantiates to.
pub enum MoveBody {
    /// Proposal wrapped by the engine in a Metropolis-Hastings step.
    Proposal(Box<dyn Proposal>),
    /// Move that runs its own update.
    SelfContained(Box<dyn SelfContainedMove>),
}

impl fmt::Debug for MoveBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveBody::Proposal(_) => write!(f, "MoveBody::Proposal"),
            MoveBody::SelfContained(_) => write!(f, "MoveBody::SelfContained"),
        }
    }
}

/// Typed access to the variable and factors bound to an archetype's slots.
pub struct Wiring {
    variable: Rc<dyn Variable>,
    path: String,
    connected: Vec<Rc<dyn Factor>>,
    slots: BTreeMap<&'static str, Vec<Rc<dyn Factor>>>,
}

impl Wiring {
    pub(crate) fn new(
        variable: Rc<dyn Variable>,
        path: String,
        connected: Vec<Rc<dyn Factor>>,
        slots: BTreeMap<&'static str, Vec<Rc<dyn Factor>>>,
    ) -> Self {
        Self {
            variable,
            path,
            connected,
            slots,
        }
    }

    /// Discovery path of the sampled variable.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Sampled variable as a trait object.
    pub fn variable_handle(&self) -> &Rc<dyn Variable> {
        &self.variable
    }

    /// Sampled variable as its concrete type.
    pub fn variable<V: Variable>(&self) -> Result<Rc<V>, PgmError> {
        downcast_variable::<V>(&self.variable).ok_or_else(|| {
            self.mismatch("variable", type_name::<V>(), AsAny::type_label(&*self.variable))
        })
    }

    /// Every factor connected to the sampled variable, in discovery order.
    pub fn connected_factors(&self) -> &[Rc<dyn Factor>] {
        &self.connected
    }

    /// Factors bound to `slot`.
    pub fn factor_refs(&self, slot: &str) -> Result<&[Rc<dyn Factor>], PgmError> {
        self.slots.get(slot).map(Vec::as_slice).ok_or_else(|| {
            PgmError::Config(
                ErrorInfo::new("unknown-slot", "archetype read a slot it did not declare")
                    .with_context("slot", slot)
                    .with_context("variable", self.path.clone()),
            )
        })
    }

    /// The single factor bound to `slot`, as its concrete type.
    pub fn factor<F: Factor>(&self, slot: &str) -> Result<Rc<F>, PgmError> {
        match self.factor_refs(slot)? {
            [only] => self.downcast::<F>(slot, only),
            bound => Err(PgmError::Config(
                ErrorInfo::new("slot-cardinality", "slot does not hold exactly one factor")
                    .with_context("slot", slot)
                    .with_context("bound", bound.len().to_string())
                    .with_context("variable", self.path.clone()),
            )),
        }
    }

    /// Every factor bound to `slot`, as concrete type `F`.
    pub fn factors<F: Factor>(&self, slot: &str) -> Result<Vec<Rc<F>>, PgmError> {
        self.factor_refs(slot)?
            .iter()
            .map(|factor| self.downcast::<F>(slot, factor))
            .collect()
    }

    fn downcast<F: Factor>(&self, slot: &str, factor: &Rc<dyn Factor>) -> Result<Rc<F>, PgmError> {
        downcast_factor::<F>(factor)
            .ok_or_else(|| self.mismatch(slot, type_name::<F>(), AsAny::type_label(&**factor)))
    }

    fn mismatch(&self, slot: &str, expected: &str, found: &str) -> PgmError {
        PgmError::Config(
            ErrorInfo::new("wiring-type-mismatch", "slot content has an unexpected type")
                .with_context("slot", slot)
                .with_context("expected", expected)
                .with_context("found", found)
                .with_context("variable", self.path.clone()),
        )
    }
}

impl fmt::Debug for Wiring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wiring")
            .field("path", &self.path)
            .field("connected", &self.connected.len())
            .field("slots", &self.slots.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A move template applicable to variables of one type.
pub trait MoveArchetype {
    /// Stable name used in move labels.
    fn name(&self) -> &str;

    /// Declared slots.
    fn slots(&self) -> Vec<SlotSpec>;

    /// Builds the move from matched slots.
    fn instantiate(&self, wiring: Wiring) -> Result<MoveBody, PgmError>;
}

struct RegistryEntry {
    label: &'static str,
    archetypes: Vec<Box<dyn MoveArchetype>>,
}

/// Ordered archetype lists keyed by variable type.
#[derive(Default)]
pub struct MoveRegistry {
    entries: BTreeMap<TypeId, RegistryEntry>,
}

impl MoveRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in archetypes for [`RealVar`] and [`IntVar`].
    pub fn with_defaults(config: &ProposalConfig) -> Self {
        let mut registry = Self::new();
        registry.register::<RealVar>(vec![Box::new(RealRandomWalk::new(config.real_step_sd))]);
        registry.register::<IntVar>(vec![Box::new(IntegerGibbs), Box::new(IntegerRandomWalk)]);
        registry
    }

    /// Replaces the archetype list for variables of type `V`. An empty list
    /// means such variables get no moves.
    pub fn register<V: Variable>(&mut self, archetypes: Vec<Box<dyn MoveArchetype>>) -> &mut Self {
        self.entries.insert(
            TypeId::of::<V>(),
            RegistryEntry {
                label: type_name::<V>(),
                archetypes,
            },
        );
        self
    }

    /// Appends one archetype to the list for `V`.
    pub fn push<V: Variable>(&mut self, archetype: impl MoveArchetype + 'static) -> &mut Self {
        self.entries
            .entry(TypeId::of::<V>())
            .or_insert_with(|| RegistryEntry {
                label: type_name::<V>(),
                archetypes: Vec::new(),
            })
            .archetypes
            .push(Box::new(archetype));
        self
    }

    /// Archetypes registered for a variable type, in declaration order.
    pub fn lookup(&self, type_id: TypeId) -> Option<&[Box<dyn MoveArchetype>]> {
        self.entries
            .get(&type_id)
            .map(|entry| entry.archetypes.as_slice())
    }
}

impl fmt::Debug for MoveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for entry in self.entries.values() {
            let names: Vec<&str> = entry.archetypes.iter().map(|a| a.name()).collect();
            map.entry(&entry.label, &names);
        }
        map.finish()
    }
}
