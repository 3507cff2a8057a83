//! Small shared utilities.

mod slot_arena;

pub use slot_arena::SlotArena;
