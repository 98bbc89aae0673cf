//! Context assembly and token budgeting.

pub mod composer;
pub mod token;

pub use composer::{
    ContextComposer, DEFAULT_MAX_CONTEXT_TOKENS, DOCUMENTS_HEADER, STRUCTURED_HEADER,
};
pub use token::estimate_tokens;
