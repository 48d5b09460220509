use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use pgm_core::{AsAny, ErrorInfo, Factor, PgmError};
use tracing::debug;

use crate::kernel::{MhMove, Sampler};
use crate::model::ProbabilityModel;
use crate::registry::{Cardinality, MoveArchetype, MoveBody, MoveRegistry, SlotSpec, Wiring};

type SlotBindings = BTreeMap<&'static str, Vec<Rc<dyn Factor>>>;

/// Builds the samplers for every latent variable of `model`.
///
/// Variables are visited in discovery order and their archetypes in
/// registration order; every applicable archetype yields one sampler.
pub fn synthesize(
    model: &ProbabilityModel,
    registry: &MoveRegistry,
) -> Result<Vec<Sampler>, PgmError> {
    let mut samplers = Vec::new();
    for &id in model.latent_variables() {
        let variable = model.variable(id)?;
        let path = model.name_of(id)?;
        let type_id = variable.concrete_type_id();
        let type_label = AsAny::type_label(&**variable);
        let archetypes = registry.lookup(type_id).ok_or_else(|| {
            PgmError::Config(
                ErrorInfo::new(
                    "missing-archetypes",
                    "no archetype list is registered for the variable type",
                )
                .with_context("variable", path)
                .with_context("type", type_label)
                .with_hint("register an empty list to leave such variables unsampled"),
            )
        })?;
        if archetypes.is_empty() {
            debug!(variable = path, "no archetypes registered; variable is left unsampled");
            continue;
        }

        let connected = model.connected_factors(id)?;
        for archetype in archetypes {
            let slots = archetype.slots();
            validate_slots(&**archetype, &slots, type_id, path)?;
            let Some(bindings) = match_slots(&slots, &connected) else {
                debug!(
                    variable = path,
                    archetype = archetype.name(),
                    factors = connected.len(),
                    "archetype not applicable"
                );
                continue;
            };
            let label = format!("{}@{}", archetype.name(), path);
            let wiring = Wiring::new(
                Rc::clone(variable),
                path.to_string(),
                connected.clone(),
                bindings,
            );
            let sampler = match archetype.instantiate(wiring)? {
                MoveBody::Proposal(proposal) => Sampler::Metropolis(MhMove::new(
                    label,
                    Rc::clone(variable),
                    connected.clone(),
                    proposal,
                )),
                MoveBody::SelfContained(body) => Sampler::SelfContained { label, body },
            };
            debug!(sampler = sampler.label(), "move synthesized");
            samplers.push(sampler);
        }
    }
    Ok(samplers)
}

fn validate_slots(
    archetype: &dyn MoveArchetype,
    slots: &[SlotSpec],
    variable_type: TypeId,
    path: &str,
) -> Result<(), PgmError> {
    let invalid = |code: &str, message: &str| {
        ErrorInfo::new(code, message)
            .with_context("archetype", archetype.name())
            .with_context("variable", path)
    };

    let sampled: Vec<&SlotSpec> = slots
        .iter()
        .filter(|slot| matches!(slot, SlotSpec::SampledVariable { .. }))
        .collect();
    let [SlotSpec::SampledVariable { type_id, label, .. }] = sampled.as_slice() else {
        return Err(PgmError::Config(
            invalid(
                "sampled-slot-count",
                "an archetype declares exactly one sampled-variable slot",
            )
            .with_context("declared", sampled.len().to_string()),
        ));
    };

    let mut names = BTreeSet::new();
    for slot in slots {
        if !names.insert(slot.name()) {
            return Err(PgmError::Config(
                invalid("duplicate-slot", "slot names must be unique")
                    .with_context("slot", slot.name()),
            ));
        }
    }

    if *type_id != variable_type {
        return Err(PgmError::Config(
            invalid(
                "sampled-type-mismatch",
                "sampled slot type differs from the registered variable type",
            )
            .with_context("slot-type", *label),
        ));
    }
    Ok(())
}

/// Binds the connected factors to the connected-factor slots.
///
/// `One` slots are filled first, in declaration order, each taking the first
/// unclaimed matching factor; `All` slots then take every remaining match.
/// Returns `None` when a `One` slot stays empty or a factor stays unclaimed.
fn match_slots(slots: &[SlotSpec], factors: &[Rc<dyn Factor>]) -> Option<SlotBindings> {
    let mut claimed = vec![false; factors.len()];
    let mut bindings = SlotBindings::new();

    for slot in slots {
        if let SlotSpec::ConnectedFactor {
            name,
            requirement,
            cardinality: Cardinality::One,
        } = slot
        {
            let index = (0..factors.len())
                .find(|&i| !claimed[i] && requirement.matches(&*factors[i]))?;
            claimed[index] = true;
            bindings.insert(*name, vec![Rc::clone(&factors[index])]);
        }
    }

    for slot in slots {
        if let SlotSpec::ConnectedFactor {
            name,
            requirement,
            cardinality: Cardinality::All,
        } = slot
        {
            let mut taken = Vec::new();
            for (index, factor) in factors.iter().enumerate() {
                if !claimed[index] && requirement.matches(&**factor) {
                    claimed[index] = true;
                    taken.push(Rc::clone(factor));
                }
            }
            bindings.insert(*name, taken);
        }
    }

    if claimed.iter().all(|&c| c) {
        Some(bindings)
    } else {
        None
    }
}
