//! Author-facing object contract.
//!
//! Model authors build ordinary `Rc`-shared structures and describe the
//! references each object holds through [`Members`]. The connectivity engine
//! only ever sees objects through [`ObjectRef`], so a model never writes graph
//! construction code itself.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use crate::errors::PgmError;
use crate::value::VariableValue;

/// Object-safe access to the concrete type behind a trait object.
pub trait AsAny: Any {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// Converts a shared handle into `Rc<dyn Any>` for downcasting.
    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any>;
    /// Fully qualified name of the concrete type.
    fn type_label(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn type_label(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Mutable stochastic state. Traversal stops at variables.
///
/// Implementations use interior mutability: a variable is shared by every
/// factor that reads it and by the moves that update it.
pub trait Variable: AsAny + fmt::Debug {
    /// Current value snapshot.
    fn value(&self) -> VariableValue;

    /// Overwrites the state with a previously taken snapshot.
    fn restore(&self, value: &VariableValue) -> Result<(), PgmError>;

    /// Observed variables are conditioned on and never sampled.
    fn is_observed(&self) -> bool {
        false
    }
}

/// A log-density contribution over the variables it references.
pub trait Factor: AsAny + fmt::Debug {
    /// Log density of the current state; `-inf` outside the support, never NaN
    /// for a reachable state.
    fn log_density(&self) -> f64;

    /// Declares the references this factor reads.
    fn members(&self, members: &mut Members);
}

/// Aggregate or helper object traversed through its members.
pub trait Component: AsAny + fmt::Debug {
    /// Declares the references held by this component.
    fn members(&self, members: &mut Members);
}

impl dyn Variable {
    /// [`TypeId`] of the concrete variable type.
    pub fn concrete_type_id(&self) -> TypeId {
        AsAny::as_any(self).type_id()
    }

    /// Borrows the concrete variable type, if it matches.
    pub fn downcast_ref<V: Variable>(&self) -> Option<&V> {
        AsAny::as_any(self).downcast_ref::<V>()
    }
}

impl dyn Factor {
    /// [`TypeId`] of the concrete factor type.
    pub fn concrete_type_id(&self) -> TypeId {
        AsAny::as_any(self).type_id()
    }

    /// Borrows the concrete factor type, if it matches.
    pub fn downcast_ref<F: Factor>(&self) -> Option<&F> {
        AsAny::as_any(self).downcast_ref::<F>()
    }
}

/// Recovers the concrete handle behind a shared variable.
pub fn downcast_variable<V: Variable>(variable: &Rc<dyn Variable>) -> Option<Rc<V>> {
    Rc::downcast::<V>(AsAny::into_any_rc(Rc::clone(variable))).ok()
}

/// Recovers the concrete handle behind a shared factor.
pub fn downcast_factor<F: Factor>(factor: &Rc<dyn Factor>) -> Option<Rc<F>> {
    Rc::downcast::<F>(AsAny::into_any_rc(Rc::clone(factor))).ok()
}

/// Reference identity of a shared object: the address of its allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectIdentity(usize);

impl ObjectIdentity {
    fn of<T: ?Sized>(rc: &Rc<T>) -> Self {
        Self(Rc::as_ptr(rc) as *const () as usize)
    }

    /// Raw address backing the identity.
    pub fn as_raw(&self) -> usize {
        self.0
    }
}

/// A classified reference to an author object.
#[derive(Clone)]
pub enum ObjectRef {
    /// Leaf variable.
    Variable(Rc<dyn Variable>),
    /// Factor; its members are traversed.
    Factor(Rc<dyn Factor>),
    /// Aggregate/helper object; its members are traversed.
    Component(Rc<dyn Component>),
    /// Primitive or unannotated data; traversal stops without a node.
    Opaque,
}

impl ObjectRef {
    /// Wraps a shared variable.
    pub fn variable<V: Variable>(variable: &Rc<V>) -> Self {
        ObjectRef::Variable(Rc::clone(variable) as Rc<dyn Variable>)
    }

    /// Wraps a shared factor.
    pub fn factor<F: Factor>(factor: &Rc<F>) -> Self {
        ObjectRef::Factor(Rc::clone(factor) as Rc<dyn Factor>)
    }

    /// Wraps a shared component.
    pub fn component<C: Component>(component: &Rc<C>) -> Self {
        ObjectRef::Component(Rc::clone(component) as Rc<dyn Component>)
    }

    /// Identity of the referenced object, `None` for opaque data.
    pub fn identity(&self) -> Option<ObjectIdentity> {
        match self {
            ObjectRef::Variable(rc) => Some(ObjectIdentity::of(rc)),
            ObjectRef::Factor(rc) => Some(ObjectIdentity::of(rc)),
            ObjectRef::Component(rc) => Some(ObjectIdentity::of(rc)),
            ObjectRef::Opaque => None,
        }
    }

    /// Whether this reference points at a variable.
    pub fn is_variable(&self) -> bool {
        matches!(self, ObjectRef::Variable(_))
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectRef::Variable(rc) => write!(f, "Variable({})", AsAny::type_label(&**rc)),
            ObjectRef::Factor(rc) => write!(f, "Factor({})", AsAny::type_label(&**rc)),
            ObjectRef::Component(rc) => write!(f, "Component({})", AsAny::type_label(&**rc)),
            ObjectRef::Opaque => write!(f, "Opaque"),
        }
    }
}

/// Label of a member within its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberLabel {
    /// Named field.
    Field(&'static str),
    /// Element `index` of the indexed collection held in a named field.
    Element(&'static str, usize),
}

impl fmt::Display for MemberLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberLabel::Field(name) => write!(f, "{name}"),
            MemberLabel::Element(name, index) => write!(f, "{name}[{index}]"),
        }
    }
}

/// Role a member plays for its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    /// Ordinary argument or parameter.
    Argument,
    /// The variable whose distribution the owning factor defines.
    Defines,
}

/// One declared member reference.
#[derive(Debug, Clone)]
pub struct Member {
    /// Label of the member within its owner.
    pub label: MemberLabel,
    /// Referenced object.
    pub target: ObjectRef,
    /// Role of the member.
    pub role: MemberRole,
}

/// Collector passed to `members()` implementations.
///
/// Types built by embedding a base part forward to the base's `members()`
/// before declaring their own, so inherited members are traversed too.
#[derive(Debug, Default)]
pub struct Members {
    entries: Vec<Member>,
}

impl Members {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a named member.
    pub fn field(&mut self, name: &'static str, target: ObjectRef) -> &mut Self {
        self.push(MemberLabel::Field(name), target, MemberRole::Argument)
    }

    /// Declares the variable the owning factor defines the distribution of.
    pub fn defines(&mut self, name: &'static str, target: ObjectRef) -> &mut Self {
        self.push(MemberLabel::Field(name), target, MemberRole::Defines)
    }

    /// Declares every element of an indexed collection held in `name`.
    pub fn elements<I>(&mut self, name: &'static str, targets: I) -> &mut Self
    where
        I: IntoIterator<Item = ObjectRef>,
    {
        for (index, target) in targets.into_iter().enumerate() {
            self.push(
                MemberLabel::Element(name, index),
                target,
                MemberRole::Argument,
            );
        }
        self
    }

    /// Declares a member holding opaque data.
    pub fn opaque(&mut self, name: &'static str) -> &mut Self {
        self.push(
            MemberLabel::Field(name),
            ObjectRef::Opaque,
            MemberRole::Argument,
        )
    }

    fn push(&mut self, label: MemberLabel, target: ObjectRef, role: MemberRole) -> &mut Self {
        self.entries.push(Member {
            label,
            target,
            role,
        });
        self
    }

    /// Declared members in declaration order.
    pub fn entries(&self) -> &[Member] {
        &self.entries
    }

    /// Consumes the collector.
    pub fn into_entries(self) -> Vec<Member> {
        self.entries
    }
}
