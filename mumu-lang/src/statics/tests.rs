use super::builtin::{default_typing_context, structors, types};
use super::err::UnifyError;

#[test]
fn builtin_registry_is_complete() {
    let ctx = default_typing_context();
    assert_eq!(ctx.type_name(types::INTEGER), "Integer");
    assert_eq!(ctx.type_name(types::LIST), "List");
    assert_eq!(ctx.type_name(types::LAMBDA), "Lambda");
    let list_structors: Vec<_> = ctx.structors_like(structors::LIST_NIL).iter().copied().collect();
    assert_eq!(list_structors, vec![structors::LIST_NIL, structors::LIST_CONS]);
    let stream_structors: Vec<_> =
        ctx.structors_like(structors::STREAM_TAIL).iter().copied().collect();
    assert_eq!(stream_structors, vec![structors::STREAM_HEAD, structors::STREAM_TAIL]);
    assert_eq!(ctx.abstraction(structors::LAMBDA_AP).arity(), 1);
    assert_eq!(ctx.abstraction(structors::LAMBDA_AP).coarity(), 1);
    assert_eq!(ctx.abstraction(structors::LIST_CONS).arity(), 2);
}

#[test]
fn unify_variable_then_idempotent() {
    let mut ctx = default_typing_context();
    let var = ctx.fresh_type_variable();
    let int = ctx.primitive_prototype(types::INTEGER);
    ctx.unify(var, int).unwrap();
    assert_eq!(ctx.render_type(var.weak()), "Integer");
    // A successful unification stays successful and changes nothing.
    ctx.unify(var, int).unwrap();
    ctx.unify(int, var).unwrap();
    assert_eq!(ctx.render_type(var.weak()), "Integer");
}

#[test]
fn unify_concrete_mismatch() {
    let mut ctx = default_typing_context();
    let cons = ctx.instantiate(structors::LIST_CONS);
    let int = ctx.primitive_prototype(types::INTEGER);
    let err = ctx.unify(int, cons.ty.unwrap()).unwrap_err();
    assert!(matches!(err, UnifyError::Mismatch { .. }));
    assert!(err.to_string().contains("different type constructors"));
}

#[test]
fn occurs_check_rejects_cycles() {
    let mut ctx = default_typing_context();
    let element = ctx.fresh_type_variable();
    let cons = ctx.instantiate(structors::LIST_CONS);
    // cons: args = [a, List a], result = List a
    ctx.unify(element, cons.args[0]).unwrap();
    let err = ctx.unify(element, cons.ty.unwrap()).unwrap_err();
    assert!(matches!(err, UnifyError::Occurs { .. }));
}

#[test]
fn unify_deep_parameters() {
    let mut ctx = default_typing_context();
    let first = ctx.instantiate(structors::LIST_CONS);
    let second = ctx.instantiate(structors::LIST_CONS);
    let int = ctx.primitive_prototype(types::INTEGER);
    ctx.unify(first.args[0], int).unwrap();
    // Unifying the two list types propagates Integer into the second.
    ctx.unify(first.ty.unwrap(), second.ty.unwrap()).unwrap();
    assert_eq!(ctx.render_type(second.args[0].weak()), "Integer");
}

#[test]
fn instantiate_is_fresh_per_use() {
    let mut ctx = default_typing_context();
    let first = ctx.instantiate(structors::LIST_CONS);
    let second = ctx.instantiate(structors::LIST_CONS);
    let int = ctx.primitive_prototype(types::INTEGER);
    ctx.unify(first.args[0], int).unwrap();
    assert_eq!(ctx.render_type(first.args[0].weak()), "Integer");
    // The second instance's element type is untouched.
    assert_ne!(ctx.render_type(second.args[0].weak()), "Integer");
}

#[test]
fn instance_shares_parameters_internally() {
    let mut ctx = default_typing_context();
    let cons = ctx.instantiate(structors::LIST_CONS);
    let int = ctx.primitive_prototype(types::INTEGER);
    // Unifying the element type shows up in the result and the tail.
    ctx.unify(cons.args[0], int).unwrap();
    assert_eq!(ctx.render_type(cons.ty.unwrap().weak()), "(List Integer)");
    assert_eq!(ctx.render_type(cons.args[1].weak()), "(List Integer)");
}

#[test]
fn definition_signatures_are_plain_variables() {
    let mut ctx = default_typing_context();
    let id = ctx.add_definition("Twice", 1, 1);
    let abstraction = ctx.abstraction(id);
    assert!(abstraction.ty.is_none());
    assert_eq!(abstraction.arity(), 1);
    assert_eq!(abstraction.coarity(), 1);
    // The prototype aliases those same variables.
    let proto = ctx.abstraction_prototype(id);
    assert_eq!(proto.args[0].weak(), ctx.abstraction(id).args[0]);
}
