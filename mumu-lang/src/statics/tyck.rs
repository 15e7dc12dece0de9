use super::builtin;
use super::ctx::{StrongTypeHandle, TypingContext};
use super::err::{TyckError, TyckErrors};
use crate::syntax::*;
use crate::utils::fmt::FmtArgs;
use std::collections::HashMap;

/// Constraint-emitting checker for the two-sided calculus: producers are
/// checked to *have* a type, consumers to *consume* one, statements to be
/// internally consistent.
pub struct Typer<'ctx> {
    ctx: &'ctx mut TypingContext,
    /// Abstraction of each definition, indexed by `DefId`.
    def_abstractions: Vec<AbstractionId>,
    int_type: StrongTypeHandle,
    var_types: HashMap<VarId, StrongTypeHandle>,
    covar_types: HashMap<CovarId, StrongTypeHandle>,
    current_definition: Option<AbstractionId>,
}

impl<'ctx> Typer<'ctx> {
    pub fn new(ctx: &'ctx mut TypingContext, def_abstractions: Vec<AbstractionId>) -> Self {
        let int_type = ctx.primitive_prototype(builtin::types::INTEGER);
        Typer {
            ctx,
            def_abstractions,
            int_type,
            var_types: HashMap::new(),
            covar_types: HashMap::new(),
            current_definition: None,
        }
    }

    pub fn check_producer(
        &mut self, prod: &mut Producer, ty: StrongTypeHandle,
    ) -> Result<(), TyckError> {
        match prod {
            Producer::Variable(var) => {
                // All occurrences of one variable share one type.
                let var_ty = self.var_type(var.var_id);
                let context = var.fmt();
                self.try_unify(ty, var_ty, &context)?;
                var.ty = Some(var_ty.weak());
            }
            Producer::Int(lit) => {
                let int_type = self.int_type;
                let context = lit.fmt();
                self.try_unify(ty, int_type, &context)?;
                lit.ty = Some(int_type.weak());
            }
            Producer::Mu(mu) => {
                let coarg_ty = self.fresh_covar(mu.coarg_id);
                let context = mu.fmt();
                // Cannot fail, the covariable's type is fresh.
                self.try_unify(ty, coarg_ty, &context)?;
                self.check_statement(&mut mu.body)?;
                mu.ty = Some(coarg_ty.weak());
            }
            Producer::Constructor(ctor) => {
                let context = ctor.fmt();
                let result = self.check_abstraction(
                    ctor.abstraction_id,
                    &mut ctor.args,
                    &mut ctor.coargs,
                    &context,
                    Some(ty),
                )?;
                ctor.ty = result.map(StrongTypeHandle::weak);
            }
            Producer::Cocase(cocase) => {
                for clause in &mut cocase.clauses {
                    self.check_clause(clause, ty)?;
                }
                cocase.ty = Some(ty.weak());
            }
        }
        Ok(())
    }

    pub fn check_consumer(
        &mut self, cons: &mut Consumer, ty: StrongTypeHandle,
    ) -> Result<(), TyckError> {
        match cons {
            Consumer::Covariable(covar) => {
                let covar_ty = self.covar_type(covar.covar_id);
                let context = covar.fmt();
                self.try_unify(ty, covar_ty, &context)?;
                covar.ty = Some(covar_ty.weak());
            }
            Consumer::MuTilde(mu) => {
                let arg_ty = self.fresh_var(mu.arg_id);
                let context = mu.fmt();
                // Cannot fail, the variable's type is fresh.
                self.try_unify(ty, arg_ty, &context)?;
                self.check_statement(&mut mu.body)?;
                mu.ty = Some(arg_ty.weak());
            }
            Consumer::Destructor(dtor) => {
                let context = dtor.fmt();
                let result = self.check_abstraction(
                    dtor.abstraction_id,
                    &mut dtor.args,
                    &mut dtor.coargs,
                    &context,
                    Some(ty),
                )?;
                dtor.ty = result.map(StrongTypeHandle::weak);
            }
            Consumer::Case(case) => {
                for clause in &mut case.clauses {
                    self.check_clause(clause, ty)?;
                }
                case.ty = Some(ty.weak());
            }
            Consumer::End(end) => {
                // End consumes anything.
                end.ty = Some(ty.weak());
            }
        }
        Ok(())
    }

    pub fn check_statement(&mut self, stmt: &mut Statement) -> Result<(), TyckError> {
        match stmt {
            Statement::Arithmetic(arith) => {
                let int_type = self.int_type;
                self.check_producer(&mut arith.left, int_type)?;
                self.check_producer(&mut arith.right, int_type)?;
                self.check_consumer(&mut arith.after, int_type)?;
            }
            Statement::Ifz(ifz) => {
                let int_type = self.int_type;
                self.check_producer(&mut ifz.condition, int_type)?;
                self.check_statement(&mut ifz.if_zero)?;
                self.check_statement(&mut ifz.if_other)?;
            }
            Statement::Cut(cut) => {
                let cut_ty = self.ctx.fresh_type_variable();
                self.check_producer(&mut cut.producer, cut_ty)?;
                self.check_consumer(&mut cut.consumer, cut_ty)?;
            }
            Statement::Call(call) => {
                let abstraction_id = self.def_abstractions[call.def_id.0];
                let context = call.fmt();
                self.check_abstraction(
                    abstraction_id,
                    &mut call.args,
                    &mut call.coargs,
                    &context,
                    None,
                )?;
            }
        }
        Ok(())
    }

    pub fn check_clause(&mut self, clause: &mut Clause, ty: StrongTypeHandle) -> Result<(), TyckError> {
        for &arg in &clause.arg_ids {
            self.fresh_var(arg);
        }
        for &coarg in &clause.coarg_ids {
            self.fresh_covar(coarg);
        }
        let instance = self.ctx.instantiate(clause.abstraction_id);
        debug_assert!(instance.ty.is_some());
        debug_assert_eq!(instance.args.len(), clause.arg_ids.len());
        debug_assert_eq!(instance.coargs.len(), clause.coarg_ids.len());
        let context = clause.fmt();
        // Totality and polarity were settled at parse time, but the clauses'
        // type parameters can still differ.
        if let Some(instance_ty) = instance.ty {
            self.try_unify(ty, instance_ty, &context)?;
        }
        for (i, &arg_id) in clause.arg_ids.iter().enumerate() {
            let var_ty = self.var_type(arg_id);
            self.try_unify(var_ty, instance.args[i], &context)?;
        }
        for (i, &coarg_id) in clause.coarg_ids.iter().enumerate() {
            let covar_ty = self.covar_type(coarg_id);
            self.try_unify(covar_ty, instance.coargs[i], &context)?;
        }
        self.check_statement(&mut clause.body)
    }

    pub fn check_definition(&mut self, definition: &mut Definition) -> Result<(), TyckError> {
        for &arg in &definition.arg_ids {
            self.fresh_var(arg);
        }
        for &coarg in &definition.coarg_ids {
            self.fresh_covar(coarg);
        }
        let (abs_args, abs_coargs) = {
            let abstraction = self.ctx.abstraction(definition.abstraction_id);
            debug_assert!(abstraction.ty.is_none());
            (abstraction.args.clone(), abstraction.coargs.clone())
        };
        debug_assert_eq!(abs_args.len(), definition.arg_ids.len());
        debug_assert_eq!(abs_coargs.len(), definition.coarg_ids.len());
        // Recursive calls must see the definition's own signature.
        self.current_definition = Some(definition.abstraction_id);
        let result = self.check_definition_inner(definition, &abs_args, &abs_coargs);
        self.current_definition = None;
        result
    }

    fn check_definition_inner(
        &mut self, definition: &mut Definition, abs_args: &[TypeHandle],
        abs_coargs: &[TypeHandle],
    ) -> Result<(), TyckError> {
        let context = definition.fmt();
        for (i, &arg_id) in definition.arg_ids.iter().enumerate() {
            let var_ty = self.var_type(arg_id);
            self.try_unify(var_ty, StrongTypeHandle(abs_args[i].0), &context)?;
        }
        for (i, &coarg_id) in definition.coarg_ids.iter().enumerate() {
            let covar_ty = self.covar_type(coarg_id);
            self.try_unify(covar_ty, StrongTypeHandle(abs_coargs[i].0), &context)?;
        }
        // Checked last; the definition may call itself.
        self.check_statement(&mut definition.body)
    }

    fn check_abstraction(
        &mut self, id: AbstractionId, args: &mut [Producer], coargs: &mut [Consumer],
        context: &str, ty: Option<StrongTypeHandle>,
    ) -> Result<Option<StrongTypeHandle>, TyckError> {
        let instance = if self.current_definition == Some(id) {
            // Recursive call: no generalisation.
            self.ctx.abstraction_prototype(id)
        } else {
            self.ctx.instantiate(id)
        };
        debug_assert_eq!(instance.ty.is_some(), ty.is_some());
        debug_assert_eq!(instance.args.len(), args.len());
        debug_assert_eq!(instance.coargs.len(), coargs.len());
        for (arg, &arg_ty) in args.iter_mut().zip(&instance.args) {
            self.check_producer(arg, arg_ty)?;
        }
        for (coarg, &coarg_ty) in coargs.iter_mut().zip(&instance.coargs) {
            self.check_consumer(coarg, coarg_ty)?;
        }
        if let (Some(expected), Some(result)) = (ty, instance.ty) {
            self.try_unify(expected, result, context)?;
        }
        Ok(instance.ty)
    }

    /// Type of a variable occurrence; the first encounter of an id
    /// allocates its type variable.
    fn var_type(&mut self, id: VarId) -> StrongTypeHandle {
        if let Some(&ty) = self.var_types.get(&id) {
            return ty;
        }
        let ty = self.ctx.fresh_type_variable();
        self.var_types.insert(id, ty);
        ty
    }

    fn covar_type(&mut self, id: CovarId) -> StrongTypeHandle {
        if let Some(&ty) = self.covar_types.get(&id) {
            return ty;
        }
        let ty = self.ctx.fresh_type_variable();
        self.covar_types.insert(id, ty);
        ty
    }

    fn fresh_var(&mut self, id: VarId) -> StrongTypeHandle {
        // One binder per variable id.
        debug_assert!(!self.var_types.contains_key(&id));
        let ty = self.ctx.fresh_type_variable();
        self.var_types.insert(id, ty);
        ty
    }

    fn fresh_covar(&mut self, id: CovarId) -> StrongTypeHandle {
        debug_assert!(!self.covar_types.contains_key(&id));
        let ty = self.ctx.fresh_type_variable();
        self.covar_types.insert(id, ty);
        ty
    }

    fn try_unify(
        &mut self, a: StrongTypeHandle, b: StrongTypeHandle, context: &str,
    ) -> Result<(), TyckError> {
        self.ctx
            .unify(a, b)
            .map_err(|cause| TyckError { context: context.to_owned(), cause })
    }
}

/// Typecheck a whole program, accumulating every error instead of stopping
/// at the first.
pub fn type_program(program: &mut Program, ctx: &mut TypingContext) -> Result<(), TyckErrors> {
    let def_abstractions =
        program.definitions.iter().map(|definition| definition.abstraction_id).collect();
    let mut typer = Typer::new(ctx, def_abstractions);
    let mut errors = Vec::new();
    for definition in &mut program.definitions {
        if let Err(err) = typer.check_definition(definition) {
            errors.push(err);
        }
    }
    for statement in &mut program.statements {
        if let Err(err) = typer.check_statement(statement) {
            errors.push(err);
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TyckErrors(errors))
    }
}
