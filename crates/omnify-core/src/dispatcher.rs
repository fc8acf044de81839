//! Ordered first-match event routing
//!
//! Routes are tried in registration order. The first classifier that claims a
//! message gets its handler run and no later route is consulted, so controls
//! must be registered ahead of the generic note/strum routes.

use crate::midi::MidiMessage;

/// Result of classifying a message.
///
/// `NoMatch` is distinct from any claimed value: a claimed CC value of 0 is
/// still a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim<T> {
    Claimed(T),
    NoMatch,
}

impl<T> Claim<T> {
    pub fn is_claimed(&self) -> bool {
        matches!(self, Self::Claimed(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Claim<U> {
        match self {
            Self::Claimed(v) => Claim::Claimed(f(v)),
            Self::NoMatch => Claim::NoMatch,
        }
    }
}

impl<T> From<Option<T>> for Claim<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Claimed(v),
            None => Self::NoMatch,
        }
    }
}

type Route<C> = Box<dyn Fn(&mut C, &MidiMessage) -> Option<Vec<MidiMessage>> + Send>;

/// Dispatches messages to handlers operating on a context `C`
pub struct EventDispatcher<C> {
    routes: Vec<(&'static str, Route<C>)>,
}

impl<C> Default for EventDispatcher<C> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<C> EventDispatcher<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. `classifier` inspects the message (and context) and
    /// `handler` receives whatever it claimed.
    pub fn register<T, M, H>(&mut self, name: &'static str, classifier: M, handler: H)
    where
        C: 'static,
        M: Fn(&C, &MidiMessage) -> Claim<T> + Send + 'static,
        H: Fn(&mut C, T) -> Vec<MidiMessage> + Send + 'static,
    {
        let route = move |ctx: &mut C, msg: &MidiMessage| match classifier(&*ctx, msg) {
            Claim::Claimed(value) => Some(handler(ctx, value)),
            Claim::NoMatch => None,
        };
        self.routes.push((name, Box::new(route)));
    }

    /// Run the first claiming route. `None` means nobody claimed the message.
    pub fn dispatch(&self, ctx: &mut C, msg: &MidiMessage) -> Option<Vec<MidiMessage>> {
        for (name, route) in &self.routes {
            if let Some(out) = route(ctx, msg) {
                tracing::trace!(route = *name, %msg, produced = out.len(), "Dispatched");
                return Some(out);
            }
        }
        None
    }

    pub fn route_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.routes.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
