// Assessment: builds the prompt from an intake, calls the language model,
// validates (and at most once repairs) its JSON, then applies the red-flag
// safety override.

pub mod format;
pub mod handlers;
pub mod prompts;
pub mod schema;
pub mod service;
