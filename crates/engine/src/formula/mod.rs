// Formula parsing, evaluation and rewriting

pub mod eval;
pub mod functions;
pub mod parser;
pub mod refs;
pub mod rewrite;
