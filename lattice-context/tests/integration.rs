//! Integration Tests for Context Propagation
//!
//! These tests drive providers, consumers and the render queue together the
//! way a renderer would.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use lattice_context::{
    create_context, use_context, AmbientScope, ChildContext, Component, ComponentId,
    ConsumerHandle, ContextRuntime, DirtyQueue, ProviderInstance, RenderQueue, ShouldUpdate,
};

/// Render queue that records every request and can run a hook per component.
#[derive(Default)]
struct RecordingQueue {
    log: RefCell<Vec<ComponentId>>,
    hooks: RefCell<HashMap<ComponentId, Box<dyn Fn()>>>,
}

impl RecordingQueue {
    fn on_enqueue(&self, component: ComponentId, hook: impl Fn() + 'static) {
        self.hooks.borrow_mut().insert(component, Box::new(hook));
    }

    fn count(&self, component: ComponentId) -> usize {
        self.log.borrow().iter().filter(|id| **id == component).count()
    }

    fn take(&self) -> Vec<ComponentId> {
        std::mem::take(&mut *self.log.borrow_mut())
    }
}

impl RenderQueue for RecordingQueue {
    fn enqueue_render(&self, component: ComponentId) {
        self.log.borrow_mut().push(component);
        if let Some(hook) = self.hooks.borrow().get(&component) {
            hook();
        }
    }
}

fn greater_than() -> Option<ShouldUpdate<i32>> {
    Some(Rc::new(|next: &i32, prev: &i32| next > prev))
}

struct Tree {
    queue: Rc<RecordingQueue>,
    runtime: ContextRuntime,
}

impl Tree {
    fn new() -> Self {
        let queue = Rc::new(RecordingQueue::default());
        let runtime = ContextRuntime::new(queue.clone());
        Self { queue, runtime }
    }
}

/// The documented scenario: A always re-renders, B only when the value grows.
#[test]
fn selective_rerender_scenario() {
    let tree = Tree::new();
    let context = create_context(0);

    let provider = tree.runtime.mount_provider(&context.provider(), 1);
    let scope = provider.child_context();
    let a = tree.runtime.mount_consumer(&context.consumer(), &scope, None).unwrap();
    let b = tree
        .runtime
        .mount_consumer(&context.consumer(), &scope, greater_than())
        .unwrap();

    assert_eq!(a.context(), 1);
    assert_eq!(b.context(), 1);

    // 1 -> 2: both render
    provider.update(2);
    assert_eq!(tree.queue.take(), vec![a.id(), b.id()]);
    assert_eq!(a.context(), 2);
    assert_eq!(b.context(), 2);

    // 2 -> 1: only A renders, B still observes the new value
    provider.update(1);
    assert_eq!(tree.queue.take(), vec![a.id()]);
    assert_eq!(a.context(), 1);
    assert_eq!(b.context(), 1);
}

/// Unmounting A before an update leaves only B in the pass.
#[test]
fn unmounted_consumer_is_skipped() {
    let tree = Tree::new();
    let context = create_context(0);

    let provider = tree.runtime.mount_provider(&context.provider(), 1);
    let scope = provider.child_context();
    let a = tree.runtime.mount_consumer(&context.consumer(), &scope, None).unwrap();
    let b = tree
        .runtime
        .mount_consumer(&context.consumer(), &scope, greater_than())
        .unwrap();

    a.component().unmount();
    assert_eq!(provider.subscribers(), vec![b.id()]);

    provider.update(2);
    assert_eq!(tree.queue.take(), vec![b.id()]);
    assert_eq!(a.context(), 1);
    assert_eq!(b.context(), 2);
}

/// A consumer the renderer dropped without unmounting is not rendered again.
#[test]
fn dropped_consumer_is_not_rendered() {
    let tree = Tree::new();
    let context = create_context(0);

    let provider = tree.runtime.mount_provider(&context.provider(), 1);
    let scope = provider.child_context();
    let kept = tree.runtime.mount_consumer(&context.consumer(), &scope, None).unwrap();
    let dropped_id = {
        let dropped = tree.runtime.mount_consumer(&context.consumer(), &scope, None).unwrap();
        assert_eq!(provider.subscriber_count(), 2);
        dropped.id()
    };

    assert_eq!(provider.subscriber_count(), 1);
    assert!(!provider.is_subscribed(dropped_id));

    assert_eq!(provider.update(2), 1);
    assert_eq!(tree.queue.take(), vec![kept.id()]);
}

/// Every change is one render request per unconditional subscriber.
#[test]
fn one_request_per_change() {
    let tree = Tree::new();
    let context = create_context(0);

    let provider = tree.runtime.mount_provider(&context.provider(), 0);
    let scope = provider.child_context();
    let a = tree.runtime.mount_consumer(&context.consumer(), &scope, None).unwrap();

    let values = [1, 2, 2, 3, 3, 3, 1, 0];
    let mut changes = 0;
    let mut previous = 0;
    for value in values {
        if value != previous {
            changes += 1;
        }
        provider.update(value);
        previous = value;

        // Visited or not, the observed value always matches the provider.
        assert_eq!(a.context(), provider.value());
    }

    assert_eq!(tree.queue.count(a.id()), changes);
}

/// A declining comparison never requests a render but keeps the value fresh.
#[test]
fn declining_subscriber_stays_consistent() {
    let tree = Tree::new();
    let context = create_context(0);

    let provider = tree.runtime.mount_provider(&context.provider(), 10);
    let never: ShouldUpdate<i32> = Rc::new(|_: &i32, _: &i32| false);
    let lazy = tree
        .runtime
        .mount_consumer(&context.consumer(), &provider.child_context(), Some(never))
        .unwrap();

    for value in [11, 12, 5, 40] {
        provider.update(value);
        assert_eq!(lazy.render(|v| *v), value);
    }
    assert_eq!(tree.queue.count(lazy.id()), 0);
}

/// Unmounting a later subscriber during the pass: it is not notified, the
/// rest are visited exactly once.
#[test]
fn unmount_during_notification_pass() {
    let tree = Tree::new();
    let context = create_context(0);

    let provider = tree.runtime.mount_provider(&context.provider(), 0);
    let scope = provider.child_context();
    let a = tree.runtime.mount_consumer(&context.consumer(), &scope, None).unwrap();
    let b = tree.runtime.mount_consumer(&context.consumer(), &scope, None).unwrap();
    let c = tree.runtime.mount_consumer(&context.consumer(), &scope, None).unwrap();

    let b_component = b.component().clone();
    tree.queue.on_enqueue(a.id(), move || b_component.unmount());

    assert_eq!(provider.update(1), 2);
    assert_eq!(tree.queue.take(), vec![a.id(), c.id()]);
    assert_eq!(b.context(), 0);
    assert_eq!(c.context(), 1);

    // B stays gone for later passes too.
    provider.update(2);
    assert_eq!(tree.queue.take(), vec![a.id(), c.id()]);
}

/// A subscriber unmounting itself mid-pass does not disturb its neighbours.
#[test]
fn self_unmount_during_notification_pass() {
    let tree = Tree::new();
    let context = create_context(0);

    let provider = tree.runtime.mount_provider(&context.provider(), 0);
    let scope = provider.child_context();
    let a = tree.runtime.mount_consumer(&context.consumer(), &scope, None).unwrap();
    let b = tree.runtime.mount_consumer(&context.consumer(), &scope, None).unwrap();
    let c = tree.runtime.mount_consumer(&context.consumer(), &scope, None).unwrap();

    let b_component = b.component().clone();
    tree.queue.on_enqueue(b.id(), move || b_component.unmount());

    provider.update(1);
    assert_eq!(tree.queue.take(), vec![a.id(), b.id(), c.id()]);

    provider.update(2);
    assert_eq!(tree.queue.take(), vec![a.id(), c.id()]);
    assert_eq!(provider.subscriber_count(), 2);
}

/// A comparison function that unmounts its own component gets no render.
#[test]
fn comparison_unmounting_its_component_gets_no_render() {
    let tree = Tree::new();
    let context = create_context(0);
    let provider = tree.runtime.mount_provider(&context.provider(), 0);

    let component = Component::new();
    let handle = ConsumerHandle::new(component.clone(), 0);
    provider
        .subscribe(
            &handle,
            Some(Rc::new(move |_: &i32, _: &i32| {
                component.unmount();
                true
            })),
        )
        .unwrap();

    assert_eq!(provider.update(1), 0);
    assert_eq!(tree.queue.count(handle.id()), 0);
    assert_eq!(provider.subscriber_count(), 0);
}

/// Providers of different contexts never notify each other's subscribers.
#[test]
fn providers_do_not_cross_notify() {
    let tree = Tree::new();
    let numbers = create_context(0);
    let names = create_context(String::new());

    let number_provider = tree.runtime.mount_provider(&numbers.provider(), 1);
    let name_provider = tree
        .runtime
        .mount_provider(&names.provider(), String::from("ada"));
    let scope = number_provider
        .child_context()
        .merged(&name_provider.child_context());

    let n = tree.runtime.mount_consumer(&numbers.consumer(), &scope, None).unwrap();
    let s = tree.runtime.mount_consumer(&names.consumer(), &scope, None).unwrap();

    number_provider.update(2);
    assert_eq!(tree.queue.take(), vec![n.id()]);
    assert_eq!(s.context(), "ada");

    name_provider.update(String::from("grace"));
    assert_eq!(tree.queue.take(), vec![s.id()]);
    assert_eq!(n.context(), 2);
}

/// Nested providers of one context: consumers follow the nearest one.
#[test]
fn nearest_provider_wins() {
    let tree = Tree::new();
    let context = create_context(0);

    let outer = tree.runtime.mount_provider(&context.provider(), 1);
    let inner = tree.runtime.mount_provider(&context.provider(), 2);
    let outer_scope = outer.child_context();
    let inner_scope = outer_scope.merged(&inner.child_context());

    let near_outer = tree
        .runtime
        .mount_consumer(&context.consumer(), &outer_scope, None)
        .unwrap();
    let near_inner = tree
        .runtime
        .mount_consumer(&context.consumer(), &inner_scope, None)
        .unwrap();

    assert_eq!(near_outer.context(), 1);
    assert_eq!(near_inner.context(), 2);

    outer.update(10);
    assert_eq!(tree.queue.take(), vec![near_outer.id()]);
    assert_eq!(near_inner.context(), 2);
}

/// Consumers with no provider above them render the default value.
#[test]
fn default_value_without_provider() {
    let tree = Tree::new();
    let context = create_context("fallback");

    let consumer = tree
        .runtime
        .mount_consumer(&context.consumer(), &ChildContext::new(), None)
        .unwrap();
    assert_eq!(consumer.render(|value| value.to_string()), "fallback");
    assert_eq!(use_context(&context).unwrap(), "fallback");
}

/// Shared values are compared by pointer, not contents.
#[test]
fn pointer_values_change_on_replacement() {
    let tree = Tree::new();
    let context = create_context(Rc::new(Vec::<u32>::new()));

    let items = Rc::new(vec![1, 2]);
    let provider: ProviderInstance<Rc<Vec<u32>>> =
        tree.runtime.mount_provider(&context.provider(), items.clone());
    let consumer = tree
        .runtime
        .mount_consumer(&context.consumer(), &provider.child_context(), None)
        .unwrap();

    assert_eq!(provider.update(items.clone()), 0);
    assert_eq!(provider.update(Rc::new(vec![1, 2])), 1);
    assert_eq!(tree.queue.count(consumer.id()), 1);
}

/// Teardown registered before subscribing still runs after unmount.
#[test]
fn existing_teardown_is_preserved() {
    let tree = Tree::new();
    let context = create_context(0);
    let provider = tree.runtime.mount_provider(&context.provider(), 0);

    let log = Rc::new(RefCell::new(Vec::new()));
    let component = Component::new();
    let log_clone = log.clone();
    component.on_unmount(move || log_clone.borrow_mut().push("teardown"));

    let handle = ConsumerHandle::new(component.clone(), 0);
    provider.subscribe(&handle, None).unwrap();

    let provider_clone = provider.clone();
    let id = component.id();
    let log_clone = log.clone();
    component.on_unmount(move || {
        // Subscriptions are already released when teardown runs.
        assert!(!provider_clone.is_subscribed(id));
        log_clone.borrow_mut().push("after");
    });

    component.unmount();
    assert_eq!(*log.borrow(), vec!["teardown", "after"]);
    assert_eq!(provider.subscriber_count(), 0);
}

/// A full render loop: flush the queue, render the dirty consumers from the
/// ambient scope, and check what they saw.
#[test]
fn render_loop_observes_latest_value() {
    let queue = Rc::new(DirtyQueue::new());
    let runtime = ContextRuntime::new(queue.clone());
    let context = create_context(0);

    let provider = runtime.mount_provider(&context.provider(), 1);
    let _scope = AmbientScope::enter(&provider.child_context());
    let consumers: Vec<_> = (0..3)
        .map(|_| {
            runtime
                .mount_consumer(&context.consumer(), &AmbientScope::current(), None)
                .unwrap()
        })
        .collect();

    provider.update(2);
    provider.update(3);
    let dirty = queue.drain();
    assert_eq!(dirty.len(), 3);
    assert_eq!(queue.requests(), 6);

    for consumer in &consumers {
        assert!(dirty.contains(&consumer.id()));
        assert_eq!(consumer.render(|value| *value), 3);
        assert_eq!(consumer.context(), use_context(&context).unwrap());
    }
}
