//! Listener contract and attachment helpers.
//!
//! Anything that wants to receive broadcasts implements [`Listener`] and is
//! shared with the channel as an `Rc<dyn Listener<T>>`. Identity is the
//! allocation behind the `Rc`, never the priority: two listeners may share a
//! priority and remain distinct.
//!
//! [`FnListener`] wraps a closure for consumers that do not want a dedicated
//! type. [`Subscription`] ties a registration to a scope: the listener is
//! unregistered when the guard is dropped.

use std::rc::Rc;

use crate::channel::broadcast::Channel;

/// Consumer of a channel's broadcasts.
pub trait Listener<T> {
    /// Called once per broadcast with the raised value.
    fn on_raised(&self, value: &T);

    /// Delivery order within one broadcast. Higher values run earlier;
    /// listeners with equal priority run in registration order.
    fn priority(&self) -> i32 {
        0
    }
}

/// Closure-backed [`Listener`].
///
/// ```
/// use signalrelay::channel::{Channel, FnListener, Listener};
/// use std::rc::Rc;
///
/// let channel = Channel::<i32>::new();
/// let listener: Rc<dyn Listener<i32>> = FnListener::new(10, |v: &i32| println!("got {v}"));
/// channel.register(&listener);
/// channel.raise(42);
/// ```
pub struct FnListener<T> {
    priority: i32,
    callback: Box<dyn Fn(&T)>,
}

impl<T> FnListener<T> {
    /// Wrap `callback` with the given priority.
    pub fn new(priority: i32, callback: impl Fn(&T) + 'static) -> Rc<Self> {
        Rc::new(Self {
            priority,
            callback: Box::new(callback),
        })
    }
}

impl<T> Listener<T> for FnListener<T> {
    fn on_raised(&self, value: &T) {
        (self.callback)(value);
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// Scoped registration of one listener on one channel.
///
/// Created by [`Channel::subscribe`]. The listener stays registered for the
/// lifetime of the guard and is unregistered on drop, so a consumer that owns
/// a `Subscription` cannot leak its registration.
#[must_use = "dropping a Subscription immediately unregisters its listener"]
pub struct Subscription<T: Clone + 'static> {
    channel: Rc<Channel<T>>,
    listener: Rc<dyn Listener<T>>,
}

impl<T: Clone + 'static> Subscription<T> {
    pub(crate) fn new(channel: Rc<Channel<T>>, listener: Rc<dyn Listener<T>>) -> Self {
        Self { channel, listener }
    }

    /// The listener held by this subscription.
    pub fn listener(&self) -> &Rc<dyn Listener<T>> {
        &self.listener
    }

    /// Explicitly end the subscription. Equivalent to dropping the guard.
    pub fn detach(self) {}
}

impl<T: Clone + 'static> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.channel.unregister(self.listener.as_ref());
    }
}
