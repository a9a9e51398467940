// Deterministic safety floor: red-flag evaluation that runs independently of
// any language-model output.

pub mod handlers;
pub mod red_flags;
