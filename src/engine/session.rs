//! Per-conversation mutable state.
//!
//! Everything that changes while a conversation runs lives here: the deferred
//! reply memory, the per-decomposition last-reassembly table and the quit
//! flag. The compiled script never changes after compilation, so one
//! [`crate::CompiledScript`] can back any number of session states; each
//! state must be owned by exactly one conversation.

use super::compile::CompiledScript;
use super::memory::Memory;

#[derive(Debug, Clone)]
pub(crate) struct SessionState {
    pub memory: Memory,
    /// `last_choice[rule][decomposition]` is the reassembly index used on the
    /// previous match of that decomposition, or -1 when it has not fired yet
    /// (or after a wrap-around reset). Indexed by the compiled (rank-sorted)
    /// rule order.
    pub last_choice: Vec<Vec<isize>>,
    pub quit: bool,
}

impl SessionState {
    pub fn new(script: &CompiledScript) -> SessionState {
        SessionState {
            memory: Memory::new(),
            last_choice: script
                .keywords
                .iter()
                .map(|rule| vec![-1; rule.decompositions.len()])
                .collect(),
            quit: false,
        }
    }

    /// Return to the just-created state without touching the compiled script.
    pub fn reset(&mut self) {
        self.memory.clear();
        for row in &mut self.last_choice {
            row.fill(-1);
        }
        self.quit = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Script;

    #[test]
    fn reset_restores_initial_state() {
        let compiled = CompiledScript::compile(&Script::doctor()).unwrap();
        let mut state = SessionState::new(&compiled);

        state.memory.save("parked".to_string(), 20);
        state.last_choice[0][0] = 3;
        state.quit = true;

        state.reset();
        assert!(state.memory.is_empty());
        assert_eq!(state.last_choice[0][0], -1);
        assert!(!state.quit);
    }
}
