//! Focus arbitration between carousels mounted on the same page.
//!
//! One [`FocusArbiter`] is shared by every carousel on a page and is passed in
//! at construction. Each carousel registers for an identity; the focused
//! identity is the one that saw the latest pointer, touch or wheel activity
//! inside its own bounds. A page-level press outside every focus-managed
//! element drops focus.

use log::debug;
use serde::Serialize;
use std::{cell::Cell, fmt, rc::Rc};

/// Class-equivalent marker carried by elements that take part in focus arbitration.
pub const FOCUS_MANAGED_MARKER: &str = "focus-manager";

/// Identity of one mounted carousel. Issued once, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct InstanceId(u64);

impl InstanceId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Target of a page-level press, as seen by the capture-phase release rule.
pub trait HitTarget {
    /// True when the target or one of its ancestors carries `marker`.
    fn closest(&self, marker: &str) -> bool;
}

/// Ancestor-or-self chain of an element, innermost first; each entry is that
/// element's class list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementPath(Vec<Vec<String>>);

impl ElementPath {
    pub fn new(chain: Vec<Vec<String>>) -> Self {
        Self(chain)
    }

    /// Path of a carousel's own viewport element.
    pub fn carousel(focus_managed: bool) -> Self {
        let mut classes = vec!["carousel".to_string()];
        if focus_managed {
            classes.push(FOCUS_MANAGED_MARKER.to_string());
        }
        Self(vec![classes, vec!["body".to_string()]])
    }
}

impl HitTarget for ElementPath {
    fn closest(&self, marker: &str) -> bool {
        self.0.iter().any(|classes| classes.iter().any(|c| c == marker))
    }
}

#[derive(Debug, Default)]
pub struct FocusArbiter {
    focused: Cell<u64>,
    counter: Cell<u64>,
}

impl FocusArbiter {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Issues the next identity. The handle gives it up on drop.
    pub fn register(self: &Rc<Self>) -> FocusHandle {
        let id = self.counter.get() + 1;
        self.counter.set(id);
        debug!("focus: registered #{id}");
        FocusHandle {
            id: InstanceId(id),
            arbiter: Rc::clone(self),
        }
    }

    pub fn focused(&self) -> Option<InstanceId> {
        match self.focused.get() {
            0 => None,
            id => Some(InstanceId(id)),
        }
    }

    pub fn has_focus(&self, id: InstanceId) -> bool {
        self.focused.get() == id.0
    }

    pub fn claim(&self, id: InstanceId) {
        if self.focused.get() != id.0 {
            debug!("focus: {id} claims");
        }
        self.focused.set(id.0);
    }

    /// Capture-phase rule for page-level pointer-down / touch-start. Returns
    /// true when focus was dropped.
    pub fn release_outside<T: HitTarget + ?Sized>(&self, target: &T) -> bool {
        if self.focused.get() == 0 || target.closest(FOCUS_MANAGED_MARKER) {
            return false;
        }
        debug!("focus: press outside managed elements, dropping #{}", self.focused.get());
        self.focused.set(0);
        true
    }

    fn relinquish(&self, id: InstanceId) {
        if self.focused.get() == id.0 {
            self.focused.set(0);
        }
    }
}

/// Registration of one carousel with the arbiter.
#[derive(Debug)]
pub struct FocusHandle {
    id: InstanceId,
    arbiter: Rc<FocusArbiter>,
}

impl FocusHandle {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn has_focus(&self) -> bool {
        self.arbiter.has_focus(self.id)
    }

    pub fn claim(&self) {
        self.arbiter.claim(self.id);
    }
}

impl Drop for FocusHandle {
    fn drop(&mut self) {
        debug!("focus: unregistered {}", self.id);
        self.arbiter.relinquish(self.id);
    }
}
