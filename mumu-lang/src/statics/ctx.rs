use super::err::UnifyError;
use crate::syntax::{AbstractionId, TypeHandle};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub usize);

/// A `TypeHandle` that additionally conveys the right to unify at the handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StrongTypeHandle(pub(crate) usize);

impl StrongTypeHandle {
    pub fn weak(self) -> TypeHandle {
        TypeHandle(self.0)
    }
}

impl From<StrongTypeHandle> for TypeHandle {
    fn from(handle: StrongTypeHandle) -> Self {
        TypeHandle(handle.0)
    }
}

/// One slot of the type store.
#[derive(Clone, Debug)]
pub enum TypeInstance {
    /// A unification variable; the id only feeds `?N` rendering.
    Var { id: usize },
    Concrete(ConcreteType),
    /// Union-find forwarding link.
    Forward(TypeHandle),
}

/// A type constructor application, e.g. `List α`.
#[derive(Clone, Debug)]
pub struct ConcreteType {
    pub type_id: TypeId,
    pub params: Vec<TypeHandle>,
}

/// Shape of a structor's (co)argument relative to the parameters of its
/// result type.
#[derive(Clone, Debug)]
pub enum TypeTemplate {
    Param(usize),
    Concrete { type_id: TypeId, params: Vec<TypeTemplate> },
}

/// Typing signature of a structor or a top-level definition.
#[derive(Clone, Debug)]
pub struct Abstraction {
    /// Result type; absent for definitions, whose instances are statements.
    pub ty: Option<TypeHandle>,
    pub name: String,
    pub args: Vec<TypeHandle>,
    pub coargs: Vec<TypeHandle>,
}

impl Abstraction {
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn coarity(&self) -> usize {
        self.coargs.len()
    }
}

/// An abstraction whose handles may be unified at; produced by
/// `instantiate` and `abstraction_prototype`.
#[derive(Clone, Debug)]
pub struct AbstractionInstance {
    pub ty: Option<StrongTypeHandle>,
    pub name: String,
    pub args: Vec<StrongTypeHandle>,
    pub coargs: Vec<StrongTypeHandle>,
}

/// Owns all type state: prototypes, abstraction signatures and the
/// union-find store of type instances.
#[derive(Default)]
pub struct TypingContext {
    /// Handles of free instances of types, cloned before use.
    type_prototypes: Vec<TypeHandle>,
    type_names: Vec<String>,
    /// Structor sets per type, for totality checks.
    type_structors: BTreeMap<TypeHandle, BTreeSet<AbstractionId>>,
    abstractions: Vec<Abstraction>,
    /// Prototypes and the types of actual producers, consumers and binders.
    types: Vec<TypeInstance>,
}

impl TypingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type_prototype(&mut self, name: &str, n_params: usize) -> TypeId {
        let type_id = TypeId(self.type_prototypes.len());
        let proto = TypeHandle(self.types.len());
        self.types.push(TypeInstance::Concrete(ConcreteType { type_id, params: Vec::new() }));
        let params: Vec<TypeHandle> =
            (0..n_params).map(|_| self.fresh_type_variable().weak()).collect();
        let TypeInstance::Concrete(concrete) = &mut self.types[proto.0] else {
            unreachable!("the prototype slot was just created concrete")
        };
        concrete.params = params;
        self.type_prototypes.push(proto);
        self.type_names.push(name.to_owned());
        type_id
    }

    pub fn add_structor(
        &mut self, name: &str, type_id: TypeId, args: Vec<TypeTemplate>,
        coargs: Vec<TypeTemplate>,
    ) -> AbstractionId {
        let proto = self.type_prototypes[type_id.0];
        let params = match &self.types[proto.0] {
            TypeInstance::Concrete(concrete) => concrete.params.clone(),
            _ => unreachable!("type prototypes are concrete"),
        };
        let arg_handles: Vec<TypeHandle> =
            args.iter().map(|arg| self.instantiate_template(arg, &params)).collect();
        let coarg_handles: Vec<TypeHandle> =
            coargs.iter().map(|coarg| self.instantiate_template(coarg, &params)).collect();
        let id = AbstractionId(self.abstractions.len());
        self.abstractions.push(Abstraction {
            ty: Some(proto),
            name: name.to_owned(),
            args: arg_handles,
            coargs: coarg_handles,
        });
        self.type_structors.entry(proto).or_default().insert(id);
        id
    }

    pub fn add_definition(&mut self, name: &str, arity: usize, coarity: usize) -> AbstractionId {
        let args = (0..arity).map(|_| self.fresh_type_variable().weak()).collect();
        let coargs = (0..coarity).map(|_| self.fresh_type_variable().weak()).collect();
        let id = AbstractionId(self.abstractions.len());
        self.abstractions.push(Abstraction { ty: None, name: name.to_owned(), args, coargs });
        id
    }

    pub fn type_instance(&self, handle: TypeHandle) -> &TypeInstance {
        &self.types[self.resolve(handle).0]
    }

    pub fn type_prototype(&self, id: TypeId) -> TypeHandle {
        self.type_prototypes[id.0]
    }

    /// Strong handle to a parameterless type's prototype, which is safe to
    /// unify at because there are no parameter variables to mangle.
    pub fn primitive_prototype(&self, id: TypeId) -> StrongTypeHandle {
        let proto = self.type_prototypes[id.0];
        debug_assert!(matches!(
            &self.types[proto.0],
            TypeInstance::Concrete(concrete) if concrete.params.is_empty()
        ));
        StrongTypeHandle(proto.0)
    }

    pub fn abstraction(&self, id: AbstractionId) -> &Abstraction {
        &self.abstractions[id.0]
    }

    /// Instance aliasing the abstraction's own signature handles.
    /// Unification through it mutates the stored signature; the typer relies
    /// on this for recursive calls.
    pub fn abstraction_prototype(&self, id: AbstractionId) -> AbstractionInstance {
        let abstraction = &self.abstractions[id.0];
        AbstractionInstance {
            ty: abstraction.ty.map(|ty| StrongTypeHandle(ty.0)),
            name: abstraction.name.clone(),
            args: abstraction.args.iter().map(|arg| StrongTypeHandle(arg.0)).collect(),
            coargs: abstraction.coargs.iter().map(|coarg| StrongTypeHandle(coarg.0)).collect(),
        }
    }

    pub fn type_name(&self, id: TypeId) -> &str {
        &self.type_names[id.0]
    }

    /// All structors sharing the result type of `id`.
    pub fn structors_like(&self, id: AbstractionId) -> &BTreeSet<AbstractionId> {
        let Some(ty) = self.abstractions[id.0].ty else {
            unreachable!("definitions have no structor set")
        };
        &self.type_structors[&ty]
    }

    /// Clone the abstraction's reachable type state, replacing each variable
    /// by one consistent fresh variable.
    pub fn instantiate(&mut self, id: AbstractionId) -> AbstractionInstance {
        let (name, args, coargs, ty) = {
            let abstraction = &self.abstractions[id.0];
            (
                abstraction.name.clone(),
                abstraction.args.clone(),
                abstraction.coargs.clone(),
                abstraction.ty,
            )
        };
        let mut map = HashMap::new();
        let fresh_args = args.iter().map(|&arg| self.clone_type_rec(arg, &mut map)).collect();
        let fresh_coargs =
            coargs.iter().map(|&coarg| self.clone_type_rec(coarg, &mut map)).collect();
        let fresh_ty = ty.map(|ty| self.clone_type_rec(ty, &mut map));
        AbstractionInstance { ty: fresh_ty, name, args: fresh_args, coargs: fresh_coargs }
    }

    pub fn fresh_type_variable(&mut self) -> StrongTypeHandle {
        let id = self.types.len();
        self.types.push(TypeInstance::Var { id });
        StrongTypeHandle(id)
    }

    pub fn unify(&mut self, a: StrongTypeHandle, b: StrongTypeHandle) -> Result<(), UnifyError> {
        self.unify_rec(a.weak(), b.weak())
    }

    pub fn render_type(&self, handle: TypeHandle) -> String {
        match &self.types[self.resolve(handle).0] {
            TypeInstance::Var { id } => format!("?{}", id),
            TypeInstance::Concrete(concrete) => {
                if concrete.params.is_empty() {
                    self.type_name(concrete.type_id).to_owned()
                } else {
                    let params: Vec<_> =
                        concrete.params.iter().map(|&param| self.render_type(param)).collect();
                    format!("({} {})", self.type_name(concrete.type_id), params.join(" "))
                }
            }
            TypeInstance::Forward(_) => unreachable!("resolved handles are direct"),
        }
    }

    fn unify_rec(&mut self, a: TypeHandle, b: TypeHandle) -> Result<(), UnifyError> {
        let a = self.deref(a);
        let b = self.deref(b);
        if a == b {
            return Ok(());
        }
        // Put the variable, if any, on the left.
        let (a, b) = if matches!(self.types[b.0], TypeInstance::Var { .. }) { (b, a) } else { (a, b) };
        if matches!(self.types[a.0], TypeInstance::Var { .. }) {
            if self.occurs(a, b) {
                return Err(self.unify_error(true, a, b));
            }
            self.types[a.0] = TypeInstance::Forward(b);
            return Ok(());
        }
        let (a_id, a_params, b_id, b_params) = match (&self.types[a.0], &self.types[b.0]) {
            (TypeInstance::Concrete(ca), TypeInstance::Concrete(cb)) => {
                (ca.type_id, ca.params.clone(), cb.type_id, cb.params.clone())
            }
            _ => unreachable!("dereferenced non-variables are concrete"),
        };
        if a_id != b_id {
            return Err(self.unify_error(false, a, b));
        }
        debug_assert_eq!(a_params.len(), b_params.len());
        for (pa, pb) in a_params.into_iter().zip(b_params) {
            self.unify_rec(pa, pb)?;
        }
        Ok(())
    }

    fn unify_error(&self, occurs: bool, a: TypeHandle, b: TypeHandle) -> UnifyError {
        let lhs = self.render_type(a);
        let rhs = self.render_type(b);
        if occurs {
            UnifyError::Occurs { lhs, rhs }
        } else {
            UnifyError::Mismatch { lhs, rhs }
        }
    }

    fn occurs(&mut self, a: TypeHandle, b: TypeHandle) -> bool {
        let b = self.deref(b);
        let params = match &self.types[b.0] {
            TypeInstance::Var { .. } => return a == b,
            TypeInstance::Concrete(concrete) => concrete.params.clone(),
            TypeInstance::Forward(_) => unreachable!("dereferenced handles are direct"),
        };
        params.into_iter().any(|param| self.occurs(a, param))
    }

    fn clone_type_rec(
        &mut self, handle: TypeHandle, map: &mut HashMap<usize, StrongTypeHandle>,
    ) -> StrongTypeHandle {
        let handle = self.deref(handle);
        if let Some(&fresh) = map.get(&handle.0) {
            return fresh;
        }
        match self.types[handle.0].clone() {
            TypeInstance::Var { .. } => {
                let fresh = self.fresh_type_variable();
                map.insert(handle.0, fresh);
                fresh
            }
            TypeInstance::Concrete(concrete) => {
                let fresh = StrongTypeHandle(self.types.len());
                self.types.push(TypeInstance::Concrete(ConcreteType {
                    type_id: concrete.type_id,
                    params: Vec::new(),
                }));
                map.insert(handle.0, fresh);
                let params: Vec<TypeHandle> = concrete
                    .params
                    .iter()
                    .map(|&param| self.clone_type_rec(param, map).weak())
                    .collect();
                let TypeInstance::Concrete(slot) = &mut self.types[fresh.0] else {
                    unreachable!("the clone slot was just created concrete")
                };
                slot.params = params;
                fresh
            }
            TypeInstance::Forward(_) => unreachable!("dereferenced handles are direct"),
        }
    }

    fn instantiate_template(
        &mut self, template: &TypeTemplate, params: &[TypeHandle],
    ) -> TypeHandle {
        match template {
            TypeTemplate::Param(i) => params[*i],
            TypeTemplate::Concrete { type_id, params: children } => {
                let children: Vec<TypeHandle> = children
                    .iter()
                    .map(|child| self.instantiate_template(child, params))
                    .collect();
                let handle = TypeHandle(self.types.len());
                self.types.push(TypeInstance::Concrete(ConcreteType {
                    type_id: *type_id,
                    params: children,
                }));
                handle
            }
        }
    }

    /// Follow forwarding links, compressing the chain.
    fn deref(&mut self, handle: TypeHandle) -> TypeHandle {
        let mut target = handle;
        while let TypeInstance::Forward(next) = &self.types[target.0] {
            target = *next;
        }
        let mut cursor = handle;
        while cursor != target {
            let next = match &self.types[cursor.0] {
                TypeInstance::Forward(next) => *next,
                _ => break,
            };
            self.types[cursor.0] = TypeInstance::Forward(target);
            cursor = next;
        }
        target
    }

    /// Follow forwarding links without compressing; for `&self` callers.
    fn resolve(&self, handle: TypeHandle) -> TypeHandle {
        let mut target = handle;
        while let TypeInstance::Forward(next) = &self.types[target.0] {
            target = *next;
        }
        target
    }
}
