#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use pgm_core::{
    Component, ErrorInfo, Factor, Members, ObjectRef, PgmError, Variable, VariableValue,
};

#[derive(Debug)]
pub struct Real(pub Cell<f64>);

impl Variable for Real {
    fn value(&self) -> VariableValue {
        VariableValue::Real(self.0.get())
    }

    fn restore(&self, value: &VariableValue) -> Result<(), PgmError> {
        let v = value
            .as_real()
            .ok_or_else(|| PgmError::Usage(ErrorInfo::new("kind", "expected real")))?;
        self.0.set(v);
        Ok(())
    }
}

pub fn real(value: f64) -> Rc<Real> {
    Rc::new(Real(Cell::new(value)))
}

/// Factor whose members are supplied by the test.
#[derive(Debug, Default)]
pub struct Link {
    pub fields: Vec<(&'static str, ObjectRef)>,
    pub defines: Option<(&'static str, ObjectRef)>,
}

impl Link {
    pub fn with(fields: Vec<(&'static str, ObjectRef)>) -> Rc<Self> {
        Rc::new(Self {
            fields,
            defines: None,
        })
    }
}

impl Factor for Link {
    fn log_density(&self) -> f64 {
        0.0
    }

    fn members(&self, members: &mut Members) {
        if let Some((name, target)) = &self.defines {
            members.defines(*name, target.clone());
        }
        for (name, target) in &self.fields {
            members.field(*name, target.clone());
        }
    }
}

/// Shared, mutable list of references.
#[derive(Debug, Default)]
pub struct Bag {
    pub items: RefCell<Vec<ObjectRef>>,
}

impl Bag {
    pub fn with(items: Vec<ObjectRef>) -> Rc<Self> {
        Rc::new(Self {
            items: RefCell::new(items),
        })
    }

    pub fn clear(&self) {
        self.items.borrow_mut().clear();
    }
}

impl Component for Bag {
    fn members(&self, members: &mut Members) {
        members.elements("items", self.items.borrow().iter().cloned());
    }
}

/// Enclosing instance for back-reference tests.
#[derive(Debug)]
pub struct Outer {
    pub inner: RefCell<Option<Rc<Inner>>>,
    pub x: Rc<Real>,
}

impl Component for Outer {
    fn members(&self, members: &mut Members) {
        members.field("x", ObjectRef::variable(&self.x));
        match &*self.inner.borrow() {
            Some(inner) => members.field("inner", ObjectRef::component(inner)),
            None => members.opaque("inner"),
        };
    }
}

/// Inner object holding a weak back-reference to its enclosing instance.
#[derive(Debug)]
pub struct Inner {
    pub outer: Weak<Outer>,
}

impl Component for Inner {
    fn members(&self, members: &mut Members) {
        match self.outer.upgrade() {
            Some(outer) => members.field("outer", ObjectRef::component(&outer)),
            None => members.opaque("outer"),
        };
    }
}
