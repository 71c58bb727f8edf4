//! Stage - ordered container of active controls
//!
//! Children are appended in registration order and never reordered. A control
//! is removed only once it has been observed inactive during a scheduler
//! pass; removal is by value, so a pruned control can never reappear in the
//! stage. Iteration order is stable except for those removals.

use crate::stage::Control;

/// The ordered container of active controls for one running application
pub struct Stage {
    children: Vec<Control>,
}

impl Stage {
    /// Create an empty stage
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
        }
    }

    /// Append a control; insertion order is registration order
    pub fn add_child(&mut self, control: Control) {
        self.children.push(control);
    }

    /// Number of controls currently on the stage
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the stage has no controls
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Get a control by position
    pub fn child(&self, index: usize) -> Option<&Control> {
        self.children.get(index)
    }

    /// Get a mutable control by position
    pub fn child_mut(&mut self, index: usize) -> Option<&mut Control> {
        self.children.get_mut(index)
    }

    /// Remove the control at the given position, preserving the order of the
    /// remaining tail
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds (callers only remove at positions
    /// they just inspected).
    pub fn remove_child(&mut self, index: usize) -> Control {
        self.children.remove(index)
    }

    /// All controls in insertion order
    pub fn children(&self) -> &[Control] {
        &self.children
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
