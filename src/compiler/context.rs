use rustc_hash::FxHashMap;

use super::error::{CompileError, CompileResult};
use crate::asm::Label;

/// Mutable state threaded through one compilation.
///
/// The slot and label counters only ever grow, including across snapshots:
/// [`CompileContext::resume_after`] carries them back from a snapshot while
/// dropping the snapshot's variable declarations.
#[derive(Debug, Clone, Default)]
pub struct CompileContext {
    variables: FxHashMap<i64, usize>,
    next_slot: usize,
    next_label: u32,
    last_label: Option<Label>,
}

impl CompileContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id` and returns its slot. A name that is already visible
    /// keeps the slot it has.
    pub fn declare(&mut self, id: i64) -> usize {
        if let Some(&slot) = self.variables.get(&id) {
            return slot;
        }
        let slot = self.next_slot;
        self.next_slot += 1;
        self.variables.insert(id, slot);
        slot
    }

    pub fn slot(&self, id: i64) -> CompileResult<usize> {
        self.variables
            .get(&id)
            .copied()
            .ok_or(CompileError::UndeclaredVariable { id })
    }

    pub fn is_declared(&self, id: i64) -> bool {
        self.variables.contains_key(&id)
    }

    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Most recent label left behind by a finished node.
    pub fn last_label(&self) -> Option<Label> {
        self.last_label
    }

    pub(crate) fn set_last_label(&mut self, label: Label) {
        self.last_label = Some(label);
    }

    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// Picks the counters back up after `snapshot` was used for a child.
    pub fn resume_after(&mut self, snapshot: CompileContext) {
        self.next_slot = self.next_slot.max(snapshot.next_slot);
        self.next_label = self.next_label.max(snapshot.next_label);
        self.last_label = snapshot.last_label;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_each_name_once() {
        let mut context = CompileContext::new();
        assert_eq!(context.declare(7), 0);
        assert_eq!(context.declare(3), 1);
        assert_eq!(context.declare(7), 0);
        assert_eq!(context.slot(3), Ok(1));
        assert_eq!(
            context.slot(4),
            Err(CompileError::UndeclaredVariable { id: 4 })
        );
    }

    #[test]
    fn snapshot_hides_declarations_but_keeps_counters() {
        let mut context = CompileContext::new();
        context.declare(0);
        context.new_label();

        let mut scoped = context.snapshot();
        assert!(scoped.is_declared(0));
        assert_eq!(scoped.declare(1), 1);
        assert_eq!(scoped.new_label(), Label(1));
        context.resume_after(scoped);

        assert!(!context.is_declared(1));
        assert_eq!(context.declare(2), 2);
        assert_eq!(context.new_label(), Label(2));
        assert_eq!(context.last_label(), None);
    }
}
