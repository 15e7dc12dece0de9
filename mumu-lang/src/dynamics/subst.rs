use crate::syntax::*;
use std::collections::HashMap;

pub(super) type VarMap<'a> = HashMap<VarId, &'a Producer>;
pub(super) type CovarMap<'a> = HashMap<CovarId, &'a Consumer>;

/// Replace free (co)variables in a producer. Replacement values are cloned
/// at each insertion point, so the AST stays a tree. Constructor value
/// caches are dropped along the way: substituting a value for a variable
/// can promote a constructor to a value.
pub(super) fn producer(prod: &mut Producer, vars: &VarMap, covars: &CovarMap) {
    match prod {
        Producer::Variable(var) => {
            if let Some(&replacement) = vars.get(&var.var_id) {
                *prod = replacement.clone();
            }
        }
        Producer::Int(_) => {}
        Producer::Mu(mu) => {
            // The bound covariable is no longer free in the body.
            let mut covars = covars.clone();
            covars.remove(&mu.coarg_id);
            statement(&mut mu.body, vars, &covars);
        }
        Producer::Constructor(ctor) => {
            if ctor.is_value == Some(false) {
                ctor.is_value = None;
            }
            for arg in &mut ctor.args {
                producer(arg, vars, covars);
            }
            for coarg in &mut ctor.coargs {
                consumer(coarg, vars, covars);
            }
        }
        Producer::Cocase(cocase) => {
            for cl in &mut cocase.clauses {
                clause(cl, vars, covars);
            }
        }
    }
}

pub(super) fn consumer(cons: &mut Consumer, vars: &VarMap, covars: &CovarMap) {
    match cons {
        Consumer::Covariable(covar) => {
            if let Some(&replacement) = covars.get(&covar.covar_id) {
                *cons = replacement.clone();
            }
        }
        Consumer::MuTilde(mu) => {
            // The bound variable is no longer free in the body.
            let mut vars = vars.clone();
            vars.remove(&mu.arg_id);
            statement(&mut mu.body, &vars, covars);
        }
        Consumer::Destructor(dtor) => {
            for arg in &mut dtor.args {
                producer(arg, vars, covars);
            }
            for coarg in &mut dtor.coargs {
                consumer(coarg, vars, covars);
            }
        }
        Consumer::Case(case) => {
            for cl in &mut case.clauses {
                clause(cl, vars, covars);
            }
        }
        Consumer::End(_) => {}
    }
}

pub(super) fn statement(stmt: &mut Statement, vars: &VarMap, covars: &CovarMap) {
    match stmt {
        Statement::Arithmetic(arith) => {
            producer(&mut arith.left, vars, covars);
            producer(&mut arith.right, vars, covars);
            consumer(&mut arith.after, vars, covars);
        }
        Statement::Ifz(ifz) => {
            producer(&mut ifz.condition, vars, covars);
            statement(&mut ifz.if_zero, vars, covars);
            statement(&mut ifz.if_other, vars, covars);
        }
        Statement::Cut(cut) => {
            producer(&mut cut.producer, vars, covars);
            consumer(&mut cut.consumer, vars, covars);
        }
        Statement::Call(call) => {
            for arg in &mut call.args {
                producer(arg, vars, covars);
            }
            for coarg in &mut call.coargs {
                consumer(coarg, vars, covars);
            }
        }
    }
}

fn clause(cl: &mut Clause, vars: &VarMap, covars: &CovarMap) {
    // Clause binders shadow all their (co)argument ids.
    let mut vars = vars.clone();
    let mut covars = covars.clone();
    for arg in &cl.arg_ids {
        vars.remove(arg);
    }
    for coarg in &cl.coarg_ids {
        covars.remove(coarg);
    }
    statement(&mut cl.body, &vars, &covars);
}
