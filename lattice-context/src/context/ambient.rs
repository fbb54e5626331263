//! Ambient Child Context
//!
//! The ambient mapping associates context IDs with the provider instance
//! nearest to the current point in the tree. Each provider exposes a
//! mapping with only its own entry ([`ProviderInstance::child_context`]);
//! the renderer merges it over the mapping inherited from above and hands
//! the result to the provider's descendants.
//!
//! Merging is additive across different contexts. An inner provider for
//! the same context shadows the outer one within its subtree.
//!
//! # Scope Stack
//!
//! Renderers that walk the tree depth-first can use [`AmbientScope`]
//! instead of threading mappings by hand: entering a scope pushes the
//! merged mapping onto a thread-local stack, and dropping the guard pops
//! it again. [`use_context`] reads from the top of the stack.
//!
//! [`ProviderInstance::child_context`]: super::ProviderInstance::child_context

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::descriptor::{ContextDescriptor, ContextId};
use super::provider::{ProviderInner, ProviderInstance};
use crate::error::{ContextError, Result};

/// Mapping from context ID to the nearest provider instance.
#[derive(Clone, Default)]
pub struct ChildContext {
    providers: IndexMap<ContextId, Rc<dyn Any>>,
}

impl ChildContext {
    /// Create an empty mapping, as seen at the root of the tree.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn single(id: ContextId, provider: Rc<dyn Any>) -> Self {
        let mut providers = IndexMap::with_capacity(1);
        providers.insert(id, provider);
        Self { providers }
    }

    /// Merge a child's entries over this mapping.
    ///
    /// Entries of `child` replace entries with the same ID.
    pub fn merged(&self, child: &ChildContext) -> ChildContext {
        let mut providers = self.providers.clone();
        for (id, provider) in &child.providers {
            providers.insert(*id, Rc::clone(provider));
        }
        Self { providers }
    }

    /// Number of contexts with a provider in scope.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check whether no provider is in scope.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Check whether a provider for the given context is in scope.
    pub fn contains(&self, id: ContextId) -> bool {
        self.providers.contains_key(&id)
    }

    /// Find the nearest provider for a context.
    pub fn provider<T: 'static>(
        &self,
        context: &ContextDescriptor<T>,
    ) -> Result<Option<ProviderInstance<T>>> {
        let id = context.id();
        let Some(entry) = self.providers.get(&id) else {
            return Ok(None);
        };

        Rc::clone(entry)
            .downcast::<ProviderInner<T>>()
            .map(|inner| Some(ProviderInstance::from_inner(inner)))
            .map_err(|_| ContextError::TypeMismatch { id })
    }

    /// The value a consumer of `context` sees here: the nearest provider's
    /// value, or the default value when there is no provider.
    pub fn resolve<T: Clone + 'static>(&self, context: &ContextDescriptor<T>) -> Result<T> {
        Ok(match self.provider(context)? {
            Some(provider) => provider.value(),
            None => context.default_value().clone(),
        })
    }
}

impl fmt::Debug for ChildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.providers.keys()).finish()
    }
}

thread_local! {
    static SCOPE_STACK: RefCell<Vec<ChildContext>> = RefCell::new(Vec::new());
}

/// Guard that pops the ambient scope when dropped.
pub struct AmbientScope {
    depth: usize,
}

impl AmbientScope {
    /// Enter the subtree of a provider.
    ///
    /// `child` is merged over the current scope. The scope is exited when
    /// the returned guard is dropped.
    pub fn enter(child: &ChildContext) -> Self {
        let depth = SCOPE_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let merged = match stack.last() {
                Some(outer) => outer.merged(child),
                None => child.clone(),
            };
            stack.push(merged);
            stack.len()
        });

        Self { depth }
    }

    /// Check if any scope is active.
    pub fn is_active() -> bool {
        SCOPE_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// Number of nested scopes.
    pub fn depth() -> usize {
        SCOPE_STACK.with(|stack| stack.borrow().len())
    }

    /// Get the mapping of the innermost scope, or an empty one.
    pub fn current() -> ChildContext {
        SCOPE_STACK.with(|stack| stack.borrow().last().cloned().unwrap_or_default())
    }
}

impl Drop for AmbientScope {
    fn drop(&mut self) {
        SCOPE_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            debug_assert_eq!(
                stack.len(),
                self.depth,
                "AmbientScope dropped out of order"
            );
            stack.pop();
        });
    }
}

/// Resolve a context's value from the innermost [`AmbientScope`].
pub fn use_context<T: Clone + 'static>(context: &ContextDescriptor<T>) -> Result<T> {
    AmbientScope::current().resolve(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::DirtyQueue;
    use crate::context::create_context;

    fn queue() -> Rc<DirtyQueue> {
        Rc::new(DirtyQueue::new())
    }

    #[test]
    fn empty_mapping_resolves_default() {
        let context = create_context(11);
        let root = ChildContext::new();

        assert!(root.provider(&context).unwrap().is_none());
        assert_eq!(root.resolve(&context).unwrap(), 11);
    }

    #[test]
    fn different_contexts_compose() {
        let a = create_context(0);
        let b = create_context("none");
        let pa = a.provider().instantiate(1, queue());
        let pb = b.provider().instantiate("b", queue());

        let scope = pa.child_context().merged(&pb.child_context());
        assert_eq!(scope.len(), 2);
        assert_eq!(scope.resolve(&a).unwrap(), 1);
        assert_eq!(scope.resolve(&b).unwrap(), "b");
    }

    #[test]
    fn inner_provider_shadows_outer() {
        let context = create_context(0);
        let outer = context.provider().instantiate(1, queue());
        let inner = context.provider().instantiate(2, queue());

        let outer_scope = outer.child_context();
        let inner_scope = outer_scope.merged(&inner.child_context());

        assert_eq!(outer_scope.resolve(&context).unwrap(), 1);
        assert_eq!(inner_scope.resolve(&context).unwrap(), 2);
        assert_eq!(inner_scope.len(), 1);
    }

    #[test]
    fn resolve_reads_the_live_value() {
        let context = create_context(0);
        let provider = context.provider().instantiate(1, queue());
        let scope = provider.child_context();

        provider.set_value(5);
        assert_eq!(scope.resolve(&context).unwrap(), 5);
    }

    #[test]
    fn scopes_nest_and_unwind() {
        let context = create_context(0);
        let outer = context.provider().instantiate(1, queue());
        let inner = context.provider().instantiate(2, queue());

        assert!(!AmbientScope::is_active());
        assert_eq!(use_context(&context).unwrap(), 0);

        {
            let _outer = AmbientScope::enter(&outer.child_context());
            assert_eq!(use_context(&context).unwrap(), 1);

            {
                let _inner = AmbientScope::enter(&inner.child_context());
                assert_eq!(AmbientScope::depth(), 2);
                assert_eq!(use_context(&context).unwrap(), 2);
            }

            assert_eq!(use_context(&context).unwrap(), 1);
        }

        assert!(!AmbientScope::is_active());
        assert_eq!(use_context(&context).unwrap(), 0);
    }
}
