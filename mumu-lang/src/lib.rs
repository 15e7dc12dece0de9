#![allow(clippy::style)]

pub mod syntax;

pub mod parse {
    pub mod token;
    pub mod parser;
    pub mod err;

    pub use parser::Parser;
}

pub mod statics {
    pub mod ctx;
    pub mod builtin;
    pub mod tyck;
    pub mod err;
    mod fmt;
    #[cfg(test)]
    mod tests;

    pub use builtin::default_typing_context;
    pub use ctx::TypingContext;
    pub use tyck::type_program;
}

pub mod dynamics {
    pub mod eval;
    mod subst;
    pub mod err;

    pub use eval::{Interpreter, InterpreterOptions};
}

pub mod utils {
    pub mod fmt;
    pub mod span;
}

pub mod prelude {
    pub use crate::utils::fmt::{Args, FmtArgs};
}

pub mod mumu;
