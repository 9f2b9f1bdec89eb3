//! Central event queue.
//!
//! Gameplay code registers plain [`Subscription`] records (who, for what,
//! plus a small opaque payload) instead of handing out closures.  Events
//! are queued while the spatial world is mutated and fanned out in one
//! [`EventQueue::dispatch`] call between frames.

use hecs::Entity;
use std::collections::{BTreeSet, VecDeque};

use super::ZoneChange;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    ChangedZone,
    Activate,
}

/// Entity `entity` tried to use whatever is around or in front of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Activation {
    pub entity: Entity,
    pub in_radius: BTreeSet<Entity>,
    /// Nearest first.
    pub looking_at: Vec<Entity>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    ChangedZone(ZoneChange),
    Activate(Activation),
}

impl GameEvent {
    #[inline]
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::ChangedZone(_) => EventKind::ChangedZone,
            GameEvent::Activate(_) => EventKind::Activate,
        }
    }

    /// Whether `ent` is a target of this event: the mover for a zone
    /// change, anything in reach for an activation.
    pub fn concerns(&self, ent: Entity) -> bool {
        match self {
            GameEvent::ChangedZone(c) => c.entity == ent,
            GameEvent::Activate(a) => a.in_radius.contains(&ent) || a.looking_at.contains(&ent),
        }
    }
}

/// `entity: None` listens to every event of `kind`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subscription {
    pub entity: Option<Entity>,
    pub kind: EventKind,
    pub payload: u32,
}

impl Subscription {
    #[inline]
    fn wants(&self, event: &GameEvent) -> bool {
        self.kind == event.kind() && self.entity.is_none_or(|e| event.concerns(e))
    }
}

/// One matched (subscription, event) pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    pub subscription: Subscription,
    pub event: GameEvent,
}

#[derive(Default, Debug)]
pub struct EventQueue {
    pending: VecDeque<GameEvent>,
    subscriptions: Vec<Subscription>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, event: GameEvent) {
        self.pending.push_back(event);
    }

    pub fn subscribe(&mut self, sub: Subscription) {
        self.subscriptions.push(sub);
    }

    /// Drop every subscription held by `ent`.
    pub fn unsubscribe(&mut self, ent: Entity) {
        self.subscriptions.retain(|s| s.entity != Some(ent));
    }

    #[inline]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Drain the queue.  Deliveries come out in event order, then in
    /// subscription order.
    pub fn dispatch(&mut self) -> Vec<Delivery> {
        let mut out = Vec::new();
        while let Some(event) = self.pending.pop_front() {
            for sub in &self.subscriptions {
                if sub.wants(&event) {
                    out.push(Delivery {
                        subscription: *sub,
                        event: event.clone(),
                    });
                }
            }
        }
        out
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
