use super::ctx::{TypeId, TypeTemplate, TypingContext};

/// Builtin type ids; the indices are part of the external contract.
pub mod types {
    use super::TypeId;

    pub const INTEGER: TypeId = TypeId(0);
    pub const LIST: TypeId = TypeId(1);
    pub const PAIR: TypeId = TypeId(2);
    pub const STREAM: TypeId = TypeId(3);
    pub const LAZY_PAIR: TypeId = TypeId(4);
    pub const LAMBDA: TypeId = TypeId(5);
}

/// Builtin structor ids, in registration order.
pub mod structors {
    use crate::syntax::AbstractionId;

    pub const LIST_NIL: AbstractionId = AbstractionId(0);
    pub const LIST_CONS: AbstractionId = AbstractionId(1);
    pub const PAIR_PAIR: AbstractionId = AbstractionId(2);
    pub const STREAM_HEAD: AbstractionId = AbstractionId(3);
    pub const STREAM_TAIL: AbstractionId = AbstractionId(4);
    pub const LAZY_PAIR_FST: AbstractionId = AbstractionId(5);
    pub const LAZY_PAIR_SND: AbstractionId = AbstractionId(6);
    pub const LAMBDA_AP: AbstractionId = AbstractionId(7);
}

/// A fresh typing context holding the whole builtin family:
/// `Integer`, `List`, `Pair` (data) and `Stream`, `LazyPair`, `Lambda`
/// (codata) with their structors.
pub fn default_typing_context() -> TypingContext {
    use TypeTemplate::{Concrete, Param};

    let mut ctx = TypingContext::new();

    let integer = ctx.add_type_prototype("Integer", 0);
    let list = ctx.add_type_prototype("List", 1);
    let pair = ctx.add_type_prototype("Pair", 2);
    let stream = ctx.add_type_prototype("Stream", 1);
    let lazy_pair = ctx.add_type_prototype("LazyPair", 2);
    let lambda = ctx.add_type_prototype("Lambda", 2);
    debug_assert_eq!(
        [integer, list, pair, stream, lazy_pair, lambda],
        [types::INTEGER, types::LIST, types::PAIR, types::STREAM, types::LAZY_PAIR, types::LAMBDA]
    );

    let nil = ctx.add_structor("Nil", types::LIST, vec![], vec![]);
    let cons = ctx.add_structor(
        "Cons",
        types::LIST,
        vec![Param(0), Concrete { type_id: types::LIST, params: vec![Param(0)] }],
        vec![],
    );
    let pair_pair = ctx.add_structor("Pair", types::PAIR, vec![Param(0), Param(1)], vec![]);
    let head = ctx.add_structor("Head", types::STREAM, vec![], vec![Param(0)]);
    let tail = ctx.add_structor(
        "Tail",
        types::STREAM,
        vec![],
        vec![Concrete { type_id: types::STREAM, params: vec![Param(0)] }],
    );
    let fst = ctx.add_structor("Fst", types::LAZY_PAIR, vec![], vec![Param(0)]);
    let snd = ctx.add_structor("Snd", types::LAZY_PAIR, vec![], vec![Param(1)]);
    let ap = ctx.add_structor("Ap", types::LAMBDA, vec![Param(0)], vec![Param(1)]);
    debug_assert_eq!(
        [nil, cons, pair_pair, head, tail, fst, snd, ap],
        [
            structors::LIST_NIL,
            structors::LIST_CONS,
            structors::PAIR_PAIR,
            structors::STREAM_HEAD,
            structors::STREAM_TAIL,
            structors::LAZY_PAIR_FST,
            structors::LAZY_PAIR_SND,
            structors::LAMBDA_AP,
        ]
    );

    ctx
}
