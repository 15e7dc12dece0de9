//! Phase façade: parse, typecheck and run programs in one place.

use crate::dynamics::err::RuntimeError;
use crate::dynamics::eval::{Interpreter, InterpreterOptions};
use crate::parse::err::ParseError;
use crate::parse::parser::Parser;
use crate::statics::builtin::default_typing_context;
use crate::statics::ctx::TypingContext;
use crate::statics::err::TyckErrors;
use crate::statics::tyck;
use crate::syntax::{Producer, Program};
use std::io::Write;

/// A parsed program together with the id counters the interpreter inherits.
#[derive(Debug)]
pub struct Parsed {
    pub program: Program,
    pub n_vars: usize,
    pub n_covars: usize,
}

pub fn parse(input: &str, ctx: &mut TypingContext) -> Result<Parsed, ParseError> {
    let mut parser = Parser::new(ctx);
    let program = parser.parse_program(input)?;
    Ok(Parsed { program, n_vars: parser.n_vars(), n_covars: parser.n_covars() })
}

pub fn typecheck(parsed: &mut Parsed, ctx: &mut TypingContext) -> Result<(), TyckErrors> {
    tyck::type_program(&mut parsed.program, ctx)
}

pub fn run(
    parsed: Parsed, ctx: &TypingContext, options: InterpreterOptions, out: &mut dyn Write,
) -> Result<Vec<Producer>, RuntimeError> {
    let mut interpreter =
        Interpreter::new(parsed.n_vars, parsed.n_covars, parsed.program, options, out, Some(ctx));
    interpreter.run()
}

/// Parse, typecheck and run quietly, stringifying phase errors.
pub fn run_returning(input: &str) -> Result<Vec<Producer>, String> {
    let mut ctx = default_typing_context();
    let mut parsed = parse(input, &mut ctx).map_err(|err| err.to_string())?;
    typecheck(&mut parsed, &mut ctx).map_err(|err| err.to_string())?;
    let mut sink = std::io::sink();
    run(parsed, &ctx, InterpreterOptions::default(), &mut sink).map_err(|err| err.to_string())
}
