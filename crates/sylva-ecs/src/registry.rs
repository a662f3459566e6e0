//! The component registry.
//!
//! Registered components are reachable three ways, all kept in step: an
//! ordered list (registration order drives per-entity destruction and
//! teardown), a `TypeId` map for typed access, and a stable string name
//! map for introspection.

use std::any::{type_name, Any, TypeId};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::interface::{ErasedInterface, Interface};

/// Which index-table implementation a component uses.
///
/// `Flat` is a dense vector, best when most entities carry the component;
/// `Hashed` is a map, best when few do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IndexKind {
    /// Dense slot-indexed vector.
    #[default]
    Flat,
    /// Slot-keyed hash map.
    Hashed,
}

#[derive(Default)]
pub(crate) struct ComponentRegistry {
    ordered: Vec<Rc<dyn ErasedInterface>>,
    by_type: IndexMap<TypeId, Rc<dyn Any>>,
    by_name: IndexMap<String, usize>,
}

impl ComponentRegistry {
    /// Register an interface under a type and a stable name.
    ///
    /// Panics when either the type or the name is already taken.
    pub(crate) fn insert<C: 'static>(&mut self, name: &str, iface: Rc<Interface<C>>) {
        let tid = TypeId::of::<C>();
        assert!(
            !self.by_type.contains_key(&tid),
            "component type `{}` registered twice",
            type_name::<C>()
        );
        assert!(
            !self.by_name.contains_key(name),
            "component name `{name}` registered twice"
        );
        self.by_name.insert(name.to_string(), self.ordered.len());
        self.ordered.push(iface.clone() as Rc<dyn ErasedInterface>);
        self.by_type.insert(tid, iface as Rc<dyn Any>);
    }

    /// Typed view of `C`'s interface.
    ///
    /// Panics when `C` is not registered.
    pub(crate) fn typed<C: 'static>(&self) -> &Interface<C> {
        match self.by_type.get(&TypeId::of::<C>()) {
            Some(rc) => match rc.downcast_ref::<Interface<C>>() {
                Some(iface) => iface,
                None => panic!("component registry entry has the wrong type"),
            },
            None => panic!("component type `{}` is not registered", type_name::<C>()),
        }
    }

    /// Shared ownership of `C`'s interface, for wiring closures that
    /// outlive the registration call.
    ///
    /// Panics when `C` is not registered.
    pub(crate) fn typed_rc<C: 'static>(&self) -> Rc<Interface<C>> {
        match self.by_type.get(&TypeId::of::<C>()) {
            Some(rc) => match Rc::downcast::<Interface<C>>(rc.clone()) {
                Ok(iface) => iface,
                Err(_) => panic!("component registry entry has the wrong type"),
            },
            None => panic!("component type `{}` is not registered", type_name::<C>()),
        }
    }

    pub(crate) fn count(&self) -> usize {
        self.ordered.len()
    }

    pub(crate) fn erased(&self, i: usize) -> &Rc<dyn ErasedInterface> {
        &self.ordered[i]
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Rc<dyn ErasedInterface>> {
        self.ordered.iter()
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub(crate) fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }
}
