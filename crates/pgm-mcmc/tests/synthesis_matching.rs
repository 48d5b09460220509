use std::rc::Rc;

use pgm_core::{Factor, Members, ObjectRef, PgmError, RngHandle};
use pgm_mcmc::{
    synthesize, DiscreteUniform, Exponential, IntVar, IntegerGibbs, IntegerRandomWalk,
    ModelBuilder, MoveArchetype, MoveBody, MoveRegistry, Normal, Poisson, ProbabilityModel,
    Proposal, ProposalConfig, RealRandomWalk, RealVar, Sampler, SlotSpec, Wiring,
};
use proptest::prelude::*;

#[derive(Debug)]
struct Pull {
    x: Rc<RealVar>,
}

impl Factor for Pull {
    fn log_density(&self) -> f64 {
        -self.x.get() * self.x.get()
    }

    fn members(&self, members: &mut Members) {
        members.field("x", ObjectRef::variable(&self.x));
    }
}

struct Stay;

impl Proposal for Stay {
    fn propose(&mut self, _rng: &mut RngHandle) -> Result<f64, PgmError> {
        Ok(0.0)
    }
}

const SLOT_NAMES: [&str; 4] = ["first", "second", "third", "fourth"];

/// Archetype with `ones` exactly-one `Pull` slots and optionally a list slot
/// taking every remaining `Pull`.
struct PullArchetype {
    ones: usize,
    with_list: bool,
}

impl MoveArchetype for PullArchetype {
    fn name(&self) -> &str {
        "pulls"
    }

    fn slots(&self) -> Vec<SlotSpec> {
        let mut slots = vec![SlotSpec::sampled_variable::<RealVar>("x")];
        slots.extend(
            SLOT_NAMES[..self.ones]
                .iter()
                .map(|name| SlotSpec::factor::<Pull>(*name)),
        );
        if self.with_list {
            slots.push(SlotSpec::factors::<Pull>("rest"));
        }
        slots
    }

    fn instantiate(&self, wiring: Wiring) -> Result<MoveBody, PgmError> {
        for name in &SLOT_NAMES[..self.ones] {
            wiring.factor::<Pull>(name)?;
        }
        if self.with_list {
            wiring.factors::<Pull>("rest")?;
        }
        Ok(MoveBody::Proposal(Box::new(Stay)))
    }
}

fn pull_model(count: usize) -> (Rc<RealVar>, ProbabilityModel) {
    let x = RealVar::new(0.0);
    let mut builder = ModelBuilder::new();
    for i in 0..count {
        let pull = Rc::new(Pull { x: x.clone() });
        builder = builder.root(format!("pull{i}"), ObjectRef::factor(&pull));
    }
    (x, builder.build().unwrap())
}

fn applicable(ones: usize, with_list: bool, factors: usize) -> bool {
    let (_x, model) = pull_model(factors);
    let mut registry = MoveRegistry::new();
    registry.push::<RealVar>(PullArchetype { ones, with_list });
    let samplers = synthesize(&model, &registry).unwrap();
    !samplers.is_empty()
}

#[test]
fn exact_slots_match_only_the_exact_factor_count() {
    assert!(!applicable(2, false, 1));
    assert!(applicable(2, false, 2));
    assert!(!applicable(2, false, 3));
}

#[test]
fn list_slot_absorbs_extra_factors() {
    assert!(!applicable(2, true, 1));
    assert!(applicable(2, true, 2));
    assert!(applicable(2, true, 3));
}

proptest! {
    #[test]
    fn applicability_follows_the_slot_counts(
        ones in 0usize..4,
        with_list in any::<bool>(),
        factors in 1usize..7,
    ) {
        let expected = factors >= ones && (with_list || factors == ones);
        prop_assert_eq!(applicable(ones, with_list, factors), expected);
    }
}

#[test]
fn exact_slots_take_factors_in_discovery_order() {
    struct Order;
    impl MoveArchetype for Order {
        fn name(&self) -> &str {
            "order"
        }
        fn slots(&self) -> Vec<SlotSpec> {
            vec![
                SlotSpec::sampled_variable::<RealVar>("x"),
                SlotSpec::factor::<Pull>("head"),
                SlotSpec::factors::<Pull>("tail"),
            ]
        }
        fn instantiate(&self, wiring: Wiring) -> Result<MoveBody, PgmError> {
            let head = wiring.factor_refs("head")?;
            let tail = wiring.factor_refs("tail")?;
            let connected = wiring.connected_factors();
            assert_eq!(connected.len(), 3);
            assert!(Rc::ptr_eq(&head[0], &connected[0]));
            assert!(Rc::ptr_eq(&tail[0], &connected[1]));
            assert!(Rc::ptr_eq(&tail[1], &connected[2]));
            Ok(MoveBody::Proposal(Box::new(Stay)))
        }
    }

    let (_x, model) = pull_model(3);
    let mut registry = MoveRegistry::new();
    registry.push::<RealVar>(Order);
    assert_eq!(synthesize(&model, &registry).unwrap().len(), 1);
}

#[test]
fn every_applicable_archetype_yields_a_sampler() {
    let k = IntVar::new(1);
    let support = DiscreteUniform::new(&k, 0, 3);
    let likelihood = Poisson::new(&k, 2.0);
    let model = ModelBuilder::new()
        .root("support", ObjectRef::factor(&support))
        .root("likelihood", ObjectRef::factor(&likelihood))
        .build()
        .unwrap();
    let registry = MoveRegistry::with_defaults(&ProposalConfig::default());
    let samplers = synthesize(&model, &registry).unwrap();

    let labels: Vec<&str> = samplers.iter().map(Sampler::label).collect();
    assert_eq!(
        labels,
        vec![
            "integer-gibbs@support.realization",
            "integer-random-walk@support.realization"
        ]
    );
    assert!(matches!(samplers[0], Sampler::SelfContained { .. }));
    assert!(matches!(samplers[1], Sampler::Metropolis(_)));
}

#[test]
fn archetype_missing_a_required_factor_is_skipped() {
    let k = IntVar::new(1);
    let likelihood = Poisson::new(&k, 2.0);
    let model = ModelBuilder::new()
        .root("likelihood", ObjectRef::factor(&likelihood))
        .build()
        .unwrap();
    let mut registry = MoveRegistry::new();
    registry.register::<IntVar>(vec![Box::new(IntegerGibbs), Box::new(IntegerRandomWalk)]);
    let samplers = synthesize(&model, &registry).unwrap();
    assert_eq!(samplers.len(), 1);
    assert_eq!(samplers[0].label(), "integer-random-walk@likelihood.realization");
}

#[test]
fn observed_variables_are_not_sampled() {
    let mu = RealVar::new(0.0);
    let y = RealVar::observed(1.0);
    let prior = Normal::new(&mu, 0.0, 1.0);
    let likelihood = Normal::new(&y, &mu, 1.0);
    let model = ModelBuilder::new()
        .root("prior", ObjectRef::factor(&prior))
        .root("likelihood", ObjectRef::factor(&likelihood))
        .build()
        .unwrap();
    assert_eq!(model.latent_variables().len(), 1);

    let registry = MoveRegistry::with_defaults(&ProposalConfig::default());
    let samplers = synthesize(&model, &registry).unwrap();
    assert_eq!(samplers.len(), 1);
    let Sampler::Metropolis(mh) = &samplers[0] else {
        panic!("expected a metropolis move");
    };
    assert_eq!(mh.factors().len(), 2);
}

#[test]
fn unregistered_variable_type_is_a_configuration_error() {
    let x = RealVar::new(1.0);
    let prior = Exponential::new(&x, 1.0);
    let model = ModelBuilder::new()
        .root("prior", ObjectRef::factor(&prior))
        .build()
        .unwrap();
    let mut registry = MoveRegistry::new();
    registry.push::<IntVar>(IntegerRandomWalk);

    let err = synthesize(&model, &registry).unwrap_err();
    assert!(matches!(err, PgmError::Config(ref info) if info.code == "missing-archetypes"));
    assert_eq!(
        err.info().context.get("variable").map(String::as_str),
        Some("prior.realization")
    );
}

#[test]
fn empty_archetype_list_leaves_the_variable_unsampled() {
    let x = RealVar::new(1.0);
    let prior = Exponential::new(&x, 1.0);
    let model = ModelBuilder::new()
        .root("prior", ObjectRef::factor(&prior))
        .build()
        .unwrap();
    let mut registry = MoveRegistry::new();
    registry.register::<RealVar>(Vec::new());
    assert!(synthesize(&model, &registry).unwrap().is_empty());
}

struct BadSlots(Vec<SlotSpec>);

impl MoveArchetype for BadSlots {
    fn name(&self) -> &str {
        "bad-slots"
    }

    fn slots(&self) -> Vec<SlotSpec> {
        self.0.clone()
    }

    fn instantiate(&self, _wiring: Wiring) -> Result<MoveBody, PgmError> {
        Ok(MoveBody::Proposal(Box::new(Stay)))
    }
}

fn slot_error(slots: Vec<SlotSpec>) -> PgmError {
    let (_x, model) = pull_model(1);
    let mut registry = MoveRegistry::new();
    registry.push::<RealVar>(BadSlots(slots));
    synthesize(&model, &registry).unwrap_err()
}

#[test]
fn malformed_slot_declarations_are_rejected() {
    let err = slot_error(vec![SlotSpec::any_factors("factors")]);
    assert_eq!(err.code(), "sampled-slot-count");

    let err = slot_error(vec![
        SlotSpec::sampled_variable::<RealVar>("x"),
        SlotSpec::sampled_variable::<RealVar>("y"),
        SlotSpec::any_factors("factors"),
    ]);
    assert_eq!(err.code(), "sampled-slot-count");

    let err = slot_error(vec![
        SlotSpec::sampled_variable::<RealVar>("x"),
        SlotSpec::any_factors("x"),
    ]);
    assert_eq!(err.code(), "duplicate-slot");

    let err = slot_error(vec![
        SlotSpec::sampled_variable::<IntVar>("x"),
        SlotSpec::any_factors("factors"),
    ]);
    assert!(matches!(err, PgmError::Config(ref info) if info.code == "sampled-type-mismatch"));
}

#[test]
fn reading_the_wiring_as_the_wrong_type_is_a_configuration_error() {
    struct WrongType;
    impl MoveArchetype for WrongType {
        fn name(&self) -> &str {
            "wrong-type"
        }
        fn slots(&self) -> Vec<SlotSpec> {
            vec![
                SlotSpec::sampled_variable::<RealVar>("x"),
                SlotSpec::any_factors("factors"),
            ]
        }
        fn instantiate(&self, wiring: Wiring) -> Result<MoveBody, PgmError> {
            wiring.factors::<Exponential>("factors")?;
            Ok(MoveBody::Proposal(Box::new(Stay)))
        }
    }

    let (_x, model) = pull_model(1);
    let mut registry = MoveRegistry::new();
    registry.push::<RealVar>(WrongType);
    let err = synthesize(&model, &registry).unwrap_err();
    assert!(matches!(err, PgmError::Config(ref info) if info.code == "wiring-type-mismatch"));

    let mut registry = MoveRegistry::new();
    registry.push::<RealVar>(RealRandomWalk::new(1.0));
    registry.push::<RealVar>(BadSlots(vec![
        SlotSpec::sampled_variable::<RealVar>("x"),
        SlotSpec::any_factors("factors"),
    ]));
    assert_eq!(synthesize(&model, &registry).unwrap().len(), 2);
}

#[test]
fn unbounded_gibbs_support_is_rejected() {
    let k = IntVar::new(0);
    let support = DiscreteUniform::new(&k, 0, i64::MAX);
    let model = ModelBuilder::new()
        .root("support", ObjectRef::factor(&support))
        .build()
        .unwrap();
    let mut registry = MoveRegistry::new();
    registry.push::<IntVar>(IntegerGibbs);
    assert_eq!(
        synthesize(&model, &registry).unwrap_err().code(),
        "unsupported-support"
    );
}
