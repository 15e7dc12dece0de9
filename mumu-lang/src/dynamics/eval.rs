use super::err::RuntimeError;
use super::subst;
use crate::statics::ctx::TypingContext;
use crate::syntax::*;
use crate::utils::fmt::{Args, FmtArgs};
use std::collections::HashMap;
use std::io::Write;
use std::mem;

/// What to echo while running; everything off by default.
#[derive(Clone, Copy, Debug, Default)]
pub struct InterpreterOptions {
    /// Print definitions before running.
    pub print_definitions: bool,
    /// Print each statement before executing it.
    pub print_start: bool,
    /// Print intermediate statements.
    pub print_intermediate: bool,
    /// Print final results.
    pub print_results: bool,
    /// Print the reduction rule applied at each step.
    pub print_info: bool,
    /// Print types in definitions and initial statements.
    pub print_types: bool,
}

const INFO_DEFINITIONS: &str = "-- Definitions --";
const INFO_START: &str = "-- Evaluating next statement --";
const INFO_ARITHMETIC: &str = "-- Reduce: Arithmetic --";
const INFO_ARITHMETIC_FOCUS_L: &str = "-- Focus: Arithmetic (left) --";
const INFO_ARITHMETIC_FOCUS_R: &str = "-- Focus: Arithmetic (right) --";
const INFO_IFZ_FOCUS: &str = "-- Focus: If-zero --";
const INFO_IFZ_ZERO: &str = "-- Reduce: If-zero (zero) --";
const INFO_IFZ_OTHER: &str = "-- Reduce: If-zero (other) --";
const INFO_MU: &str = "-- Reduce: Mu --";
const INFO_MU_TILDE: &str = "-- Reduce: Mu' --";
const INFO_FINISHED: &str = "-- Finished! --";

const FOCUS_VAR_ARITH_L: &str = "_ar_l";
const FOCUS_VAR_ARITH_R: &str = "_ar_r";
const FOCUS_VAR_IFZ: &str = "_ifz";

fn focus_var_name(name: &str, index: usize) -> String {
    format!("_{}_{}", name, index)
}

enum Step {
    Next(Statement),
    Done(Producer),
}

/// Small-step reducer with on-the-fly focusing. Single-shot: the fresh-id
/// counters it inherits from the parser advance as focusing introduces
/// new (co)variables.
pub struct Interpreter<'run> {
    options: InterpreterOptions,
    /// Typing context, only consulted for rendering.
    ctx: Option<&'run TypingContext>,
    finished: bool,
    out: &'run mut dyn Write,
    n_vars: usize,
    n_covars: usize,
    definitions: Vec<Definition>,
    statements: Vec<Statement>,
}

impl<'run> Interpreter<'run> {
    pub fn new(
        n_vars: usize, n_covars: usize, program: Program, options: InterpreterOptions,
        out: &'run mut dyn Write, ctx: Option<&'run TypingContext>,
    ) -> Self {
        Interpreter {
            options,
            ctx,
            finished: false,
            out,
            n_vars,
            n_covars,
            definitions: program.definitions,
            statements: program.statements,
        }
    }

    /// Run every program statement down to its result producer.
    pub fn run(&mut self) -> Result<Vec<Producer>, RuntimeError> {
        if self.finished {
            return Err(RuntimeError::AlreadyRun);
        }
        if self.options.print_definitions {
            self.print_info(INFO_DEFINITIONS);
            let fargs = self.typed_args();
            for definition in &self.definitions {
                let _ = writeln!(self.out, "{}", definition.fmt_args(fargs));
            }
        }
        let statements = mem::take(&mut self.statements);
        let mut results = Vec::new();
        for stmt in statements {
            let mut steps = 0usize;
            let mut current = Step::Next(stmt);
            if self.options.print_start {
                self.print_info(INFO_START);
                if let Step::Next(stmt) = &current {
                    let fargs = self.typed_args();
                    let _ = writeln!(self.out, "{}", stmt.fmt_args(fargs));
                }
            }
            loop {
                match current {
                    Step::Next(stmt) => {
                        if self.options.print_intermediate && steps > 0 {
                            let _ = writeln!(self.out, "{}", stmt.fmt());
                        }
                        steps += 1;
                        current = self.step(stmt)?;
                    }
                    Step::Done(result) => {
                        if self.options.print_results {
                            let _ = writeln!(self.out, "{}", result.fmt());
                        }
                        results.push(result);
                        break;
                    }
                }
            }
        }
        self.finished = true;
        Ok(results)
    }

    fn step(&mut self, stmt: Statement) -> Result<Step, RuntimeError> {
        match stmt {
            Statement::Arithmetic(arith) => self.step_arithmetic(arith),
            Statement::Ifz(ifz) => self.step_ifz(ifz),
            Statement::Cut(cut) => self.step_cut(cut),
            Statement::Call(call) => self.step_call(call),
        }
    }

    fn step_arithmetic(&mut self, mut stmt: Arithmetic) -> Result<Step, RuntimeError> {
        if !is_value(&mut stmt.left) {
            self.print_info(INFO_ARITHMETIC_FOCUS_L);
            return Ok(Step::Next(self.focus_arithmetic(stmt, true).into()));
        }
        if !is_value(&mut stmt.right) {
            self.print_info(INFO_ARITHMETIC_FOCUS_R);
            return Ok(Step::Next(self.focus_arithmetic(stmt, false).into()));
        }
        let computed = match (&stmt.left, &stmt.right) {
            (Producer::Int(left), Producer::Int(right)) => {
                Some(do_arithmetic(stmt.op, left.value, right.value))
            }
            _ => None,
        };
        match computed {
            Some(value) => {
                self.print_info(INFO_ARITHMETIC);
                Ok(Step::Next(
                    Cut {
                        producer: IntLiteral { value, ty: None }.into(),
                        consumer: stmt.after,
                    }
                    .into(),
                ))
            }
            // Value operands that are not integer literals cannot reduce.
            None => Err(self.stuck(stmt.into())),
        }
    }

    fn step_ifz(&mut self, mut stmt: Ifz) -> Result<Step, RuntimeError> {
        if !is_value(&mut stmt.condition) {
            self.print_info(INFO_IFZ_FOCUS);
            return Ok(Step::Next(self.focus_ifz(stmt).into()));
        }
        let zero = match &stmt.condition {
            Producer::Int(lit) => Some(lit.value == 0),
            _ => None,
        };
        match zero {
            Some(true) => {
                self.print_info(INFO_IFZ_ZERO);
                Ok(Step::Next(*stmt.if_zero))
            }
            Some(false) => {
                self.print_info(INFO_IFZ_OTHER);
                Ok(Step::Next(*stmt.if_other))
            }
            None => Err(self.stuck(stmt.into())),
        }
    }

    fn step_cut(&mut self, cut: Cut) -> Result<Step, RuntimeError> {
        let Cut { producer, consumer } = cut;
        // A mu producer captures the consumer outright.
        let mut producer = match producer {
            Producer::Mu(mu) => {
                let Mu { coarg_id, body, .. } = mu;
                let mut body = *body;
                let covars = HashMap::from([(coarg_id, &consumer)]);
                subst::statement(&mut body, &HashMap::new(), &covars);
                self.print_info(INFO_MU);
                return Ok(Step::Next(body));
            }
            producer => producer,
        };
        if !is_value(&mut producer) {
            // The producer cannot be a mu here, so the only reducible shape
            // left is a constructor with a non-value argument; a free
            // variable in a cut is stuck.
            let mut ctor = match producer {
                Producer::Constructor(ctor) => ctor,
                producer => return Err(self.stuck(Cut { producer, consumer }.into())),
            };
            let index = match find_non_value(&mut ctor.args) {
                Some(index) => index,
                None => unreachable!("a non-value constructor has a non-value argument"),
            };
            self.print_info(&format!("-- Focus: Constructor {} ({}) --", ctor.name, index));
            let mu = self.focus_constructor(ctor, index);
            return Ok(Step::Next(Cut { producer: mu.into(), consumer }.into()));
        }
        // The producer is a value from here on.
        match (producer, consumer) {
            (producer, Consumer::MuTilde(mu)) => {
                let MuTilde { arg_id, body, .. } = mu;
                let mut body = *body;
                let vars = HashMap::from([(arg_id, &producer)]);
                subst::statement(&mut body, &vars, &HashMap::new());
                self.print_info(INFO_MU_TILDE);
                Ok(Step::Next(body))
            }
            (Producer::Constructor(ctor), Consumer::Case(mut case)) => {
                let index = case
                    .clauses
                    .iter()
                    .position(|clause| clause.abstraction_id == ctor.abstraction_id);
                match index {
                    Some(index) => {
                        self.print_info(&format!("-- Reduce: Case {} --", ctor.name));
                        let clause = case.clauses.swap_remove(index);
                        Ok(Step::Next(eval_clause(clause, ctor.args, ctor.coargs)))
                    }
                    None => Err(self.stuck(
                        Cut { producer: ctor.into(), consumer: case.into() }.into(),
                    )),
                }
            }
            (Producer::Cocase(mut cocase), Consumer::Destructor(mut dtor)) => {
                if let Some(index) = find_non_value(&mut dtor.args) {
                    self.print_info(&format!("-- Focus: Destructor {} ({}) --", dtor.name, index));
                    let mu_tilde = self.focus_destructor(dtor, index);
                    return Ok(Step::Next(
                        Cut { producer: cocase.into(), consumer: mu_tilde.into() }.into(),
                    ));
                }
                let index = cocase
                    .clauses
                    .iter()
                    .position(|clause| clause.abstraction_id == dtor.abstraction_id);
                match index {
                    Some(index) => {
                        self.print_info(&format!("-- Reduce: Cocase {} --", dtor.name));
                        let clause = cocase.clauses.swap_remove(index);
                        Ok(Step::Next(eval_clause(clause, dtor.args, dtor.coargs)))
                    }
                    None => Err(self.stuck(
                        Cut { producer: cocase.into(), consumer: dtor.into() }.into(),
                    )),
                }
            }
            (producer, Consumer::End(_)) => {
                self.print_info(INFO_FINISHED);
                Ok(Step::Done(producer))
            }
            (producer, consumer) => Err(self.stuck(Cut { producer, consumer }.into())),
        }
    }

    fn step_call(&mut self, mut stmt: Call) -> Result<Step, RuntimeError> {
        if let Some(index) = find_non_value(&mut stmt.args) {
            self.print_info(&format!("-- Focus: Call {} ({}) --", stmt.name, index));
            return Ok(Step::Next(self.focus_call(stmt, index).into()));
        }
        // All arguments are values; expand a copy of the definition's body.
        let (mut body, def_name, arg_ids, coarg_ids) = {
            let definition = &self.definitions[stmt.def_id.0];
            (
                definition.body.clone(),
                definition.name.clone(),
                definition.arg_ids.clone(),
                definition.coarg_ids.clone(),
            )
        };
        debug_assert_eq!(arg_ids.len(), stmt.args.len());
        debug_assert_eq!(coarg_ids.len(), stmt.coargs.len());
        let vars: subst::VarMap = arg_ids.iter().copied().zip(stmt.args.iter()).collect();
        let covars: subst::CovarMap = coarg_ids.iter().copied().zip(stmt.coargs.iter()).collect();
        subst::statement(&mut body, &vars, &covars);
        self.print_info(&format!("-- Reduce: Call {} --", def_name));
        Ok(Step::Next(body))
    }

    /// `C[p] ⇝ [p (mu' x C[x])]` for a non-value operand of an arithmetic
    /// statement.
    fn focus_arithmetic(&mut self, mut stmt: Arithmetic, focus_left: bool) -> Cut {
        let name = if focus_left { FOCUS_VAR_ARITH_L } else { FOCUS_VAR_ARITH_R };
        let var_id = self.fresh_var_id();
        let slot = if focus_left { &mut stmt.left } else { &mut stmt.right };
        let extracted =
            mem::replace(slot, Variable { var_id, name: name.to_owned(), ty: None }.into());
        wrap_focus(extracted, var_id, name.to_owned(), stmt.into())
    }

    fn focus_ifz(&mut self, mut stmt: Ifz) -> Cut {
        let var_id = self.fresh_var_id();
        let extracted = mem::replace(
            &mut stmt.condition,
            Variable { var_id, name: FOCUS_VAR_IFZ.to_owned(), ty: None }.into(),
        );
        wrap_focus(extracted, var_id, FOCUS_VAR_IFZ.to_owned(), stmt.into())
    }

    fn focus_call(&mut self, mut stmt: Call, index: usize) -> Cut {
        let name = focus_var_name(&stmt.name, index);
        let var_id = self.fresh_var_id();
        let extracted = mem::replace(
            &mut stmt.args[index],
            Variable { var_id, name: name.clone(), ty: None }.into(),
        );
        wrap_focus(extracted, var_id, name, stmt.into())
    }

    /// Lift a constructor's first non-value argument: the constructor is
    /// rebuilt around a fresh variable and the whole thing becomes a mu
    /// abstraction that first evaluates the argument.
    fn focus_constructor(&mut self, mut ctor: Constructor, index: usize) -> Mu {
        let name = focus_var_name(&ctor.name, index);
        let covar_id = self.fresh_covar_id();
        let var_id = self.fresh_var_id();
        let extracted = mem::replace(
            &mut ctor.args[index],
            Variable { var_id, name: name.clone(), ty: None }.into(),
        );
        let inner = Cut {
            producer: ctor.into(),
            consumer: Covariable { covar_id, name: name.clone(), ty: None }.into(),
        };
        let outer = wrap_focus(extracted, var_id, name.clone(), inner.into());
        Mu { coarg_id: covar_id, coarg_name: name, body: Box::new(outer.into()), ty: None }
    }

    /// The symmetric construction for destructors, with the variable and
    /// covariable roles swapped.
    fn focus_destructor(&mut self, mut dtor: Destructor, index: usize) -> MuTilde {
        let name = focus_var_name(&dtor.name, index);
        let outer_var_id = self.fresh_var_id();
        let inner_var_id = self.fresh_var_id();
        let extracted = mem::replace(
            &mut dtor.args[index],
            Variable { var_id: inner_var_id, name: name.clone(), ty: None }.into(),
        );
        let inner = Cut {
            producer: Variable { var_id: outer_var_id, name: name.clone(), ty: None }.into(),
            consumer: dtor.into(),
        };
        let outer = wrap_focus(extracted, inner_var_id, name.clone(), inner.into());
        MuTilde { arg_id: outer_var_id, arg_name: name, body: Box::new(outer.into()), ty: None }
    }

    fn fresh_var_id(&mut self) -> VarId {
        let id = VarId(self.n_vars);
        self.n_vars += 1;
        id
    }

    fn fresh_covar_id(&mut self) -> CovarId {
        let id = CovarId(self.n_covars);
        self.n_covars += 1;
        id
    }

    fn stuck(&self, stmt: Statement) -> RuntimeError {
        RuntimeError::StuckComputation { statement: stmt.fmt() }
    }

    fn print_info(&mut self, info: &str) {
        if self.options.print_info {
            let _ = writeln!(self.out, "{}", info);
        }
    }

    fn typed_args(&self) -> Args<'run> {
        Args { ascii: true, with_types: self.options.print_types, ctx: self.ctx }
    }
}

/// The shared focusing wrapper; the caller has already swapped the fresh
/// variable into the hole of `body`.
fn wrap_focus(extracted: Producer, var_id: VarId, name: String, body: Statement) -> Cut {
    Cut {
        producer: extracted,
        consumer: MuTilde { arg_id: var_id, arg_name: name, body: Box::new(body), ty: None }.into(),
    }
}

/// Substitute a matched structor's (co)arguments into the clause body.
fn eval_clause(clause: Clause, args: Vec<Producer>, coargs: Vec<Consumer>) -> Statement {
    let Clause { arg_ids, coarg_ids, mut body, .. } = clause;
    debug_assert_eq!(arg_ids.len(), args.len());
    debug_assert_eq!(coarg_ids.len(), coargs.len());
    let vars: subst::VarMap = arg_ids.iter().copied().zip(args.iter()).collect();
    let covars: subst::CovarMap = coarg_ids.iter().copied().zip(coargs.iter()).collect();
    subst::statement(&mut body, &vars, &covars);
    body
}

/// Integer arithmetic; division and modulus by zero totalise instead of
/// failing.
fn do_arithmetic(op: ArithOp, left: i64, right: i64) -> i64 {
    match op {
        ArithOp::Add => left.wrapping_add(right),
        ArithOp::Sub => left.wrapping_sub(right),
        ArithOp::Mul => left.wrapping_mul(right),
        ArithOp::Div => {
            if right == 0 {
                1
            } else {
                left.wrapping_div(right)
            }
        }
        ArithOp::Mod => {
            if right == 0 {
                left
            } else {
                left.wrapping_rem(right)
            }
        }
    }
}

/// A producer is a value iff it is an integer literal, a cocase, or a
/// constructor all of whose arguments are values (coargs do not count).
/// The result is cached on the constructor node.
pub fn is_value(prod: &mut Producer) -> bool {
    match prod {
        Producer::Int(_) | Producer::Cocase(_) => true,
        Producer::Constructor(ctor) => match ctor.is_value {
            Some(cached) => cached,
            None => {
                let value = ctor.args.iter_mut().all(is_value);
                ctor.is_value = Some(value);
                value
            }
        },
        Producer::Variable(_) | Producer::Mu(_) => false,
    }
}

/// Index of the leftmost non-value argument, if any.
fn find_non_value(args: &mut [Producer]) -> Option<usize> {
    args.iter_mut().position(|arg| !is_value(arg))
}
