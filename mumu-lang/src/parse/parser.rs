use super::err::{what, ParseError, ParseErrorKind};
use super::token::{Tok, Tokens};
use crate::statics::builtin::structors;
use crate::statics::ctx::TypingContext;
use crate::syntax::*;
use std::collections::HashMap;

/// Whether a syntax element lives on the producer or the consumer side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Polarity {
    Producer,
    Consumer,
}

#[derive(Clone, Copy, Debug)]
struct ArityInfo {
    arity: usize,
    coarity: usize,
}

/// Surface table of the builtin structors: name, signature, (co)arity and
/// which side of a cut they belong to.
const BUILTIN_STRUCTORS: &[(&str, AbstractionId, ArityInfo, Polarity)] = &[
    ("Nil", structors::LIST_NIL, ArityInfo { arity: 0, coarity: 0 }, Polarity::Producer),
    ("Cons", structors::LIST_CONS, ArityInfo { arity: 2, coarity: 0 }, Polarity::Producer),
    ("Pair", structors::PAIR_PAIR, ArityInfo { arity: 2, coarity: 0 }, Polarity::Producer),
    ("Head", structors::STREAM_HEAD, ArityInfo { arity: 0, coarity: 1 }, Polarity::Consumer),
    ("Tail", structors::STREAM_TAIL, ArityInfo { arity: 0, coarity: 1 }, Polarity::Consumer),
    ("Fst", structors::LAZY_PAIR_FST, ArityInfo { arity: 0, coarity: 1 }, Polarity::Consumer),
    ("Snd", structors::LAZY_PAIR_SND, ArityInfo { arity: 0, coarity: 1 }, Polarity::Consumer),
    ("Ap", structors::LAMBDA_AP, ArityInfo { arity: 1, coarity: 1 }, Polarity::Consumer),
];

/// Recursive-descent parser over the token stream. Resolves names to fresh
/// ids, enforces (co)arity, and checks that clause sets are total for
/// exactly one type. Definitions are registered in the typing context as
/// they are parsed so the typer can look them up later.
pub struct Parser<'ctx> {
    ctx: &'ctx mut TypingContext,
    n_vars: usize,
    n_covars: usize,
    /// Per-name scope stacks; the top of a stack is the innermost binder.
    var_ctx: HashMap<String, Vec<VarId>>,
    covar_ctx: HashMap<String, Vec<CovarId>>,
    def_ids: HashMap<String, DefId>,
    constructor_ids: HashMap<&'static str, AbstractionId>,
    destructor_ids: HashMap<&'static str, AbstractionId>,
    structor_arity: HashMap<AbstractionId, ArityInfo>,
    def_arity: HashMap<DefId, ArityInfo>,
}

impl<'ctx> Parser<'ctx> {
    pub fn new(ctx: &'ctx mut TypingContext) -> Self {
        let mut constructor_ids = HashMap::new();
        let mut destructor_ids = HashMap::new();
        let mut structor_arity = HashMap::new();
        for &(name, id, info, polarity) in BUILTIN_STRUCTORS {
            structor_arity.insert(id, info);
            match polarity {
                Polarity::Producer => constructor_ids.insert(name, id),
                Polarity::Consumer => destructor_ids.insert(name, id),
            };
        }
        Parser {
            ctx,
            n_vars: 0,
            n_covars: 0,
            var_ctx: HashMap::new(),
            covar_ctx: HashMap::new(),
            def_ids: HashMap::new(),
            constructor_ids,
            destructor_ids,
            structor_arity,
            def_arity: HashMap::new(),
        }
    }

    /// No. of variable ids handed out; seeds the interpreter's freshener.
    pub fn n_vars(&self) -> usize {
        self.n_vars
    }

    /// No. of covariable ids handed out.
    pub fn n_covars(&self) -> usize {
        self.n_covars
    }

    pub fn parse_program(&mut self, input: &str) -> Result<Program, ParseError> {
        let mut toks = Tokens::new(input);
        let mut program = Program::default();
        while let Some((tok, line)) = toks.peek() {
            match tok {
                Tok::BracketOpen => {
                    let cut = self.parse_cut(&mut toks)?;
                    program.statements.push(cut.into());
                }
                Tok::ParenOpen => {
                    let is_def = matches!(
                        toks.peek_second(),
                        Some((Tok::Word(word), _)) if word == kw::DEF
                    );
                    if is_def {
                        let definition = self.parse_definition(&mut toks)?;
                        program.definitions.push(definition);
                    } else {
                        let statement = self.parse_statement(&mut toks)?;
                        program.statements.push(statement);
                    }
                }
                other => {
                    return Err(self.error_at(
                        line,
                        what::DEF_OR_STMT,
                        line,
                        ParseErrorKind::UnexpectedToken(other.to_string()),
                    ))
                }
            }
        }
        Ok(program)
    }

    pub fn parse_producer(&mut self, toks: &mut Tokens) -> Result<Producer, ParseError> {
        let line = toks.line();
        match toks.peek() {
            Some((Tok::Word(word), _)) => {
                if word.starts_with(|c: char| c.is_alphabetic()) {
                    Ok(self.parse_variable(toks)?.into())
                } else if word.starts_with(|c: char| c.is_ascii_digit()) || word.starts_with('-') {
                    Ok(self.parse_int(toks)?.into())
                } else {
                    Err(self.unexpected(toks, what::PRODUCER, line))
                }
            }
            Some((Tok::ParenOpen, _)) => match toks.peek_second() {
                Some((Tok::Word(word), _)) if word == kw::MU || word == kw::MU_UNICODE => {
                    Ok(self.parse_mu(toks)?.into())
                }
                Some((Tok::Word(word), _)) if word == kw::COCASE => {
                    Ok(self.parse_cocase(toks)?.into())
                }
                _ => Ok(self.parse_constructor(toks)?.into()),
            },
            _ => Err(self.unexpected(toks, what::PRODUCER, line)),
        }
    }

    pub fn parse_consumer(&mut self, toks: &mut Tokens) -> Result<Consumer, ParseError> {
        let line = toks.line();
        match toks.peek() {
            Some((Tok::Word(word), _)) => {
                if word == kw::END {
                    Ok(self.parse_end(toks)?.into())
                } else if word.starts_with(|c: char| c.is_alphabetic()) {
                    Ok(self.parse_covariable(toks)?.into())
                } else {
                    Err(self.unexpected(toks, what::CONSUMER, line))
                }
            }
            Some((Tok::ParenOpen, _)) => match toks.peek_second() {
                Some((Tok::Word(word), _))
                    if word == kw::MU_TILDE || word == kw::MU_TILDE_UNICODE =>
                {
                    Ok(self.parse_mu_tilde(toks)?.into())
                }
                Some((Tok::Word(word), _)) if word == kw::CASE => {
                    Ok(self.parse_case(toks)?.into())
                }
                _ => Ok(self.parse_destructor(toks)?.into()),
            },
            _ => Err(self.unexpected(toks, what::CONSUMER, line)),
        }
    }

    pub fn parse_statement(&mut self, toks: &mut Tokens) -> Result<Statement, ParseError> {
        let line = toks.line();
        match toks.peek() {
            Some((Tok::BracketOpen, _)) => Ok(self.parse_cut(toks)?.into()),
            Some((Tok::ParenOpen, _)) => match toks.peek_second() {
                Some((Tok::Word(word), _)) if ArithOp::from_symbol(word).is_some() => {
                    Ok(self.parse_arithmetic(toks)?.into())
                }
                Some((Tok::Word(word), _)) if word == kw::IFZ => {
                    Ok(self.parse_ifz(toks)?.into())
                }
                Some((Tok::Word(word), _)) if word.starts_with(|c: char| c.is_alphabetic()) => {
                    Ok(self.parse_call(toks)?.into())
                }
                _ => Err(self.unexpected_second(toks, what::STATEMENT, line)),
            },
            _ => Err(self.unexpected(toks, what::STATEMENT, line)),
        }
    }

    pub fn parse_definition(&mut self, toks: &mut Tokens) -> Result<Definition, ParseError> {
        let start_line = toks.line();
        self.expect(toks, Tok::ParenOpen, what::DEFINITION, start_line)?;
        let (word, word_line) = self.read_word(toks, what::DEFINITION, start_line)?;
        if word != kw::DEF {
            return Err(self.error_at(
                word_line,
                what::DEFINITION,
                start_line,
                ParseErrorKind::UnexpectedToken(word.to_owned()),
            ));
        }
        let (name, name_line) = self.read_word(toks, what::DEFINITION, start_line)?;
        if self.def_ids.contains_key(name) {
            return Err(self.error_at(
                name_line,
                what::DEFINITION,
                start_line,
                ParseErrorKind::DuplicateDefinition(name.to_owned()),
            ));
        }
        if name == kw::IFZ {
            // The only possible conflict; ifz is the only statement keyword.
            return Err(self.error_at(
                name_line,
                what::DEFINITION,
                start_line,
                ParseErrorKind::ReservedName(name.to_owned()),
            ));
        }
        let def_id = DefId(self.def_ids.len());
        self.def_ids.insert(name.to_owned(), def_id);
        let name = name.to_owned();
        let arg_names = self.parse_name_list(toks, what::PARAMETER)?;
        let coarg_names = self.parse_name_list(toks, what::COPARAMETER)?;
        let arg_ids = self.push_vars(&arg_names);
        let coarg_ids = self.push_covars(&coarg_names);
        self.def_arity
            .insert(def_id, ArityInfo { arity: arg_ids.len(), coarity: coarg_ids.len() });
        let abstraction_id = self.ctx.add_definition(&name, arg_ids.len(), coarg_ids.len());
        let body = self.parse_statement(toks);
        self.pop_vars(&arg_names);
        self.pop_covars(&coarg_names);
        let body = body?;
        self.expect(toks, Tok::ParenClose, what::DEFINITION, start_line)?;
        Ok(Definition { abstraction_id, name, arg_names, coarg_names, arg_ids, coarg_ids, body })
    }

    fn parse_variable(&mut self, toks: &mut Tokens) -> Result<Variable, ParseError> {
        let start_line = toks.line();
        let (name, line) = self.read_word(toks, what::VARIABLE, start_line)?;
        match self.var_ctx.get(name).and_then(|stack| stack.last()) {
            Some(&var_id) => Ok(Variable { var_id, name: name.to_owned(), ty: None }),
            None => Err(self.error_at(
                line,
                what::VARIABLE,
                line,
                ParseErrorKind::UnknownName { kind: what::VARIABLE, name: name.to_owned() },
            )),
        }
    }

    fn parse_int(&mut self, toks: &mut Tokens) -> Result<IntLiteral, ParseError> {
        let start_line = toks.line();
        let (literal, line) = self.read_word(toks, what::VALUE, start_line)?;
        match literal.parse::<i64>() {
            Ok(value) => Ok(IntLiteral { value, ty: None }),
            Err(_) => Err(self.error_at(
                line,
                what::VALUE,
                line,
                ParseErrorKind::InvalidIntLiteral(literal.to_owned()),
            )),
        }
    }

    fn parse_mu(&mut self, toks: &mut Tokens) -> Result<Mu, ParseError> {
        let start_line = toks.line();
        self.expect(toks, Tok::ParenOpen, what::MU, start_line)?;
        let (word, word_line) = self.read_word(toks, what::MU, start_line)?;
        if word != kw::MU && word != kw::MU_UNICODE {
            return Err(self.error_at(
                word_line,
                what::MU,
                start_line,
                ParseErrorKind::UnexpectedToken(word.to_owned()),
            ));
        }
        let (coarg_name, _) = self.read_word(toks, what::MU, start_line)?;
        let coarg_id = self.fresh_covar_id();
        self.covar_ctx.entry(coarg_name.to_owned()).or_default().push(coarg_id);
        let body = self.parse_statement(toks);
        self.pop_covar(coarg_name);
        let body = body?;
        self.expect(toks, Tok::ParenClose, what::MU, start_line)?;
        Ok(Mu {
            coarg_id,
            coarg_name: coarg_name.to_owned(),
            body: Box::new(body),
            ty: None,
        })
    }

    fn parse_constructor(&mut self, toks: &mut Tokens) -> Result<Constructor, ParseError> {
        let (abstraction_id, name, args, coargs) = self.parse_structor(toks, Polarity::Producer)?;
        Ok(Constructor { abstraction_id, name, args, coargs, is_value: None, ty: None })
    }

    fn parse_cocase(&mut self, toks: &mut Tokens) -> Result<Cocase, ParseError> {
        let start_line = toks.line();
        self.expect(toks, Tok::ParenOpen, what::COCASE, start_line)?;
        let (word, word_line) = self.read_word(toks, what::COCASE, start_line)?;
        if word != kw::COCASE {
            return Err(self.error_at(
                word_line,
                what::COCASE,
                start_line,
                ParseErrorKind::UnexpectedToken(word.to_owned()),
            ));
        }
        let clauses = self.parse_clauses(toks, Polarity::Producer, start_line)?;
        self.expect(toks, Tok::ParenClose, what::COCASE, start_line)?;
        Ok(Cocase { clauses, ty: None })
    }

    fn parse_covariable(&mut self, toks: &mut Tokens) -> Result<Covariable, ParseError> {
        let start_line = toks.line();
        let (name, line) = self.read_word(toks, what::COVARIABLE, start_line)?;
        match self.covar_ctx.get(name).and_then(|stack| stack.last()) {
            Some(&covar_id) => Ok(Covariable { covar_id, name: name.to_owned(), ty: None }),
            None => Err(self.error_at(
                line,
                what::COVARIABLE,
                line,
                ParseErrorKind::UnknownName { kind: what::COVARIABLE, name: name.to_owned() },
            )),
        }
    }

    fn parse_mu_tilde(&mut self, toks: &mut Tokens) -> Result<MuTilde, ParseError> {
        let start_line = toks.line();
        self.expect(toks, Tok::ParenOpen, what::MU_TILDE, start_line)?;
        let (word, word_line) = self.read_word(toks, what::MU_TILDE, start_line)?;
        if word != kw::MU_TILDE && word != kw::MU_TILDE_UNICODE {
            return Err(self.error_at(
                word_line,
                what::MU_TILDE,
                start_line,
                ParseErrorKind::UnexpectedToken(word.to_owned()),
            ));
        }
        let (arg_name, _) = self.read_word(toks, what::MU_TILDE, start_line)?;
        let arg_id = self.fresh_var_id();
        self.var_ctx.entry(arg_name.to_owned()).or_default().push(arg_id);
        let body = self.parse_statement(toks);
        self.pop_var(arg_name);
        let body = body?;
        self.expect(toks, Tok::ParenClose, what::MU_TILDE, start_line)?;
        Ok(MuTilde { arg_id, arg_name: arg_name.to_owned(), body: Box::new(body), ty: None })
    }

    fn parse_destructor(&mut self, toks: &mut Tokens) -> Result<Destructor, ParseError> {
        let (abstraction_id, name, args, coargs) = self.parse_structor(toks, Polarity::Consumer)?;
        Ok(Destructor { abstraction_id, name, args, coargs, ty: None })
    }

    fn parse_case(&mut self, toks: &mut Tokens) -> Result<Case, ParseError> {
        let start_line = toks.line();
        self.expect(toks, Tok::ParenOpen, what::CASE, start_line)?;
        let (word, word_line) = self.read_word(toks, what::CASE, start_line)?;
        if word != kw::CASE {
            return Err(self.error_at(
                word_line,
                what::CASE,
                start_line,
                ParseErrorKind::UnexpectedToken(word.to_owned()),
            ));
        }
        let clauses = self.parse_clauses(toks, Polarity::Consumer, start_line)?;
        self.expect(toks, Tok::ParenClose, what::CASE, start_line)?;
        Ok(Case { clauses, ty: None })
    }

    fn parse_end(&mut self, toks: &mut Tokens) -> Result<End, ParseError> {
        let line = toks.line();
        let (word, _) = self.read_word(toks, what::END, line)?;
        if word != kw::END {
            return Err(self.error_at(
                line,
                what::END,
                line,
                ParseErrorKind::UnexpectedToken(word.to_owned()),
            ));
        }
        Ok(End { ty: None })
    }

    fn parse_arithmetic(&mut self, toks: &mut Tokens) -> Result<Arithmetic, ParseError> {
        let start_line = toks.line();
        self.expect(toks, Tok::ParenOpen, what::ARITHMETIC, start_line)?;
        let (word, word_line) = self.read_word(toks, what::ARITHMETIC, start_line)?;
        let Some(op) = ArithOp::from_symbol(word) else {
            return Err(self.error_at(
                word_line,
                what::ARITHMETIC,
                start_line,
                ParseErrorKind::UnexpectedToken(word.to_owned()),
            ));
        };
        let left = self.parse_producer(toks)?;
        let right = self.parse_producer(toks)?;
        let after = self.parse_consumer(toks)?;
        self.expect(toks, Tok::ParenClose, what::ARITHMETIC, start_line)?;
        Ok(Arithmetic { op, left, right, after })
    }

    fn parse_ifz(&mut self, toks: &mut Tokens) -> Result<Ifz, ParseError> {
        let start_line = toks.line();
        self.expect(toks, Tok::ParenOpen, what::IFZ, start_line)?;
        let (word, word_line) = self.read_word(toks, what::IFZ, start_line)?;
        if word != kw::IFZ {
            return Err(self.error_at(
                word_line,
                what::IFZ,
                start_line,
                ParseErrorKind::UnexpectedToken(word.to_owned()),
            ));
        }
        let condition = self.parse_producer(toks)?;
        let if_zero = self.parse_statement(toks)?;
        let if_other = self.parse_statement(toks)?;
        self.expect(toks, Tok::ParenClose, what::IFZ, start_line)?;
        Ok(Ifz { condition, if_zero: Box::new(if_zero), if_other: Box::new(if_other) })
    }

    fn parse_cut(&mut self, toks: &mut Tokens) -> Result<Cut, ParseError> {
        let start_line = toks.line();
        self.expect(toks, Tok::BracketOpen, what::CUT, start_line)?;
        let producer = self.parse_producer(toks)?;
        let consumer = self.parse_consumer(toks)?;
        self.expect(toks, Tok::BracketClose, what::CUT, start_line)?;
        Ok(Cut { producer, consumer })
    }

    fn parse_call(&mut self, toks: &mut Tokens) -> Result<Call, ParseError> {
        let start_line = toks.line();
        self.expect(toks, Tok::ParenOpen, what::CALL, start_line)?;
        let (name, name_line) = self.read_word(toks, what::CALL, start_line)?;
        let Some(&def_id) = self.def_ids.get(name) else {
            return Err(self.error_at(
                name_line,
                what::CALL,
                start_line,
                ParseErrorKind::UnknownName { kind: what::DEFINITION, name: name.to_owned() },
            ));
        };
        let name = name.to_owned();
        let info = self.def_arity[&def_id];
        let args = self.parse_list(toks, what::PRODUCER, Self::parse_producer)?;
        let coargs = self.parse_list(toks, what::CONSUMER, Self::parse_consumer)?;
        if args.len() != info.arity {
            return Err(self.arity_mismatch(toks, what::CALL, start_line, "arity", &name, info.arity, args.len()));
        }
        if coargs.len() != info.coarity {
            return Err(self.arity_mismatch(toks, what::CALL, start_line, "coarity", &name, info.coarity, coargs.len()));
        }
        self.expect(toks, Tok::ParenClose, what::CALL, start_line)?;
        Ok(Call { def_id, name, args, coargs })
    }

    /// Shared implementation for case and cocase clauses; cocase clauses
    /// pattern-match destructors, case clauses constructors.
    fn parse_clause(&mut self, toks: &mut Tokens, polarity: Polarity) -> Result<Clause, ParseError> {
        let (clause_kind, structor_kind) = match polarity {
            Polarity::Producer => (what::COCASE_CLAUSE, what::DESTRUCTOR),
            Polarity::Consumer => (what::CASE_CLAUSE, what::CONSTRUCTOR),
        };
        let start_line = toks.line();
        self.expect(toks, Tok::ParenOpen, clause_kind, start_line)?;
        let (name, name_line) = self.read_word(toks, clause_kind, start_line)?;
        let ids = match polarity {
            Polarity::Producer => &self.destructor_ids,
            Polarity::Consumer => &self.constructor_ids,
        };
        let Some(&structor_id) = ids.get(name) else {
            return Err(self.error_at(
                name_line,
                clause_kind,
                start_line,
                ParseErrorKind::UnknownName { kind: structor_kind, name: name.to_owned() },
            ));
        };
        let name = name.to_owned();
        let info = self.structor_arity[&structor_id];
        let mut arg_names = Vec::new();
        if info.arity > 0 {
            arg_names = self.parse_name_list(toks, what::PARAMETER)?;
        }
        if arg_names.len() != info.arity {
            return Err(self.arity_mismatch(toks, clause_kind, start_line, "arity", &name, info.arity, arg_names.len()));
        }
        let mut coarg_names = Vec::new();
        if info.coarity > 0 {
            coarg_names = self.parse_name_list(toks, what::COPARAMETER)?;
        }
        if coarg_names.len() != info.coarity {
            return Err(self.arity_mismatch(toks, clause_kind, start_line, "coarity", &name, info.coarity, coarg_names.len()));
        }
        let arg_ids = self.push_vars(&arg_names);
        let coarg_ids = self.push_covars(&coarg_names);
        let body = self.parse_statement(toks);
        self.pop_vars(&arg_names);
        self.pop_covars(&coarg_names);
        let body = body?;
        self.expect(toks, Tok::ParenClose, what::CLAUSE, start_line)?;
        Ok(Clause {
            abstraction_id: structor_id,
            structor_name: name,
            arg_names,
            coarg_names,
            arg_ids,
            coarg_ids,
            body,
        })
    }

    /// Shared implementation for constructors and destructors.
    fn parse_structor(
        &mut self, toks: &mut Tokens, polarity: Polarity,
    ) -> Result<(AbstractionId, String, Vec<Producer>, Vec<Consumer>), ParseError> {
        let context = match polarity {
            Polarity::Producer => what::CONSTRUCTOR,
            Polarity::Consumer => what::DESTRUCTOR,
        };
        let start_line = toks.line();
        self.expect(toks, Tok::ParenOpen, context, start_line)?;
        let (name, name_line) = self.read_word(toks, context, start_line)?;
        let ids = match polarity {
            Polarity::Producer => &self.constructor_ids,
            Polarity::Consumer => &self.destructor_ids,
        };
        let Some(&structor_id) = ids.get(name) else {
            return Err(self.error_at(
                name_line,
                context,
                start_line,
                ParseErrorKind::UnknownName { kind: context, name: name.to_owned() },
            ));
        };
        let name = name.to_owned();
        let info = self.structor_arity[&structor_id];
        let mut args = Vec::new();
        if info.arity > 0 {
            args = self.parse_list(toks, what::ARGUMENT, Self::parse_producer)?;
        }
        if args.len() != info.arity {
            return Err(self.arity_mismatch(toks, context, start_line, "arity", &name, info.arity, args.len()));
        }
        let mut coargs = Vec::new();
        if info.coarity > 0 {
            coargs = self.parse_list(toks, what::COARGUMENT, Self::parse_consumer)?;
        }
        if coargs.len() != info.coarity {
            return Err(self.arity_mismatch(toks, context, start_line, "coarity", &name, info.coarity, coargs.len()));
        }
        self.expect(toks, Tok::ParenClose, context, start_line)?;
        Ok((structor_id, name, args, coargs))
    }

    /// Parse a clause list and verify it is non-empty, free of duplicates
    /// and total for exactly one data/codata type.
    fn parse_clauses(
        &mut self, toks: &mut Tokens, polarity: Polarity, start_line: usize,
    ) -> Result<Vec<Clause>, ParseError> {
        let (clause_kind, expression_kind) = match polarity {
            Polarity::Producer => (what::COCASE_CLAUSE, what::COCASE),
            Polarity::Consumer => (what::CASE_CLAUSE, what::CASE),
        };
        let clauses =
            self.parse_list(toks, clause_kind, |parser, toks| parser.parse_clause(toks, polarity))?;
        let Some(first) = clauses.first() else {
            return Err(self.error_at(
                toks.line(),
                expression_kind,
                start_line,
                ParseErrorKind::EmptyClauseList,
            ));
        };
        let mut expected = self.ctx.structors_like(first.abstraction_id).clone();
        for clause in &clauses {
            if !expected.remove(&clause.abstraction_id) {
                return Err(self.error_at(
                    toks.line(),
                    expression_kind,
                    start_line,
                    ParseErrorKind::MismatchedClause(clause.structor_name.clone()),
                ));
            }
        }
        if !expected.is_empty() {
            return Err(self.error_at(
                toks.line(),
                expression_kind,
                start_line,
                ParseErrorKind::IncompleteClauses,
            ));
        }
        Ok(clauses)
    }

    fn parse_list<T>(
        &mut self, toks: &mut Tokens, kind: &str,
        mut parse: impl FnMut(&mut Self, &mut Tokens) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        let context = format!("{} list", kind);
        let start_line = toks.line();
        match toks.peek() {
            Some((Tok::ParenOpen, _)) => {
                toks.bump();
            }
            _ => return Err(self.unexpected(toks, &context, start_line)),
        }
        let mut result = Vec::new();
        loop {
            match toks.peek() {
                Some((Tok::ParenClose, _)) => {
                    toks.bump();
                    break;
                }
                Some(_) => result.push(parse(self, toks)?),
                None => return Err(self.unexpected(toks, &context, start_line)),
            }
        }
        Ok(result)
    }

    fn parse_name_list(&mut self, toks: &mut Tokens, kind: &'static str) -> Result<Vec<String>, ParseError> {
        self.parse_list(toks, kind, |parser, toks| {
            let line = toks.line();
            parser.read_word(toks, kind, line).map(|(word, _)| word.to_owned())
        })
    }

    fn push_vars(&mut self, names: &[String]) -> Vec<VarId> {
        names
            .iter()
            .map(|name| {
                let id = self.fresh_var_id();
                self.var_ctx.entry(name.clone()).or_default().push(id);
                id
            })
            .collect()
    }

    fn push_covars(&mut self, names: &[String]) -> Vec<CovarId> {
        names
            .iter()
            .map(|name| {
                let id = self.fresh_covar_id();
                self.covar_ctx.entry(name.clone()).or_default().push(id);
                id
            })
            .collect()
    }

    fn pop_vars(&mut self, names: &[String]) {
        for name in names {
            self.pop_var(name);
        }
    }

    fn pop_covars(&mut self, names: &[String]) {
        for name in names {
            self.pop_covar(name);
        }
    }

    fn pop_var(&mut self, name: &str) {
        if let Some(stack) = self.var_ctx.get_mut(name) {
            stack.pop();
        }
    }

    fn pop_covar(&mut self, name: &str) {
        if let Some(stack) = self.covar_ctx.get_mut(name) {
            stack.pop();
        }
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

    fn read_word<'i>(
        &self, toks: &mut Tokens<'i>, context: &str, context_line: usize,
    ) -> Result<(&'i str, usize), ParseError> {
        match toks.peek() {
            Some((Tok::Word(word), line)) => {
                toks.bump();
                Ok((word, line))
            }
            _ => Err(self.unexpected(toks, context, context_line)),
        }
    }

    fn expect(
        &self, toks: &mut Tokens, expected: Tok, context: &str, context_line: usize,
    ) -> Result<(), ParseError> {
        match toks.peek() {
            Some((tok, _)) if tok == expected => {
                toks.bump();
                Ok(())
            }
            _ => Err(self.unexpected(toks, context, context_line)),
        }
    }

    fn unexpected(&self, toks: &Tokens, context: &str, context_line: usize) -> ParseError {
        let (kind, cause_line) = match toks.peek() {
            Some((tok, line)) => (ParseErrorKind::UnexpectedToken(tok.to_string()), line),
            None => (ParseErrorKind::UnexpectedEof, toks.eof_line()),
        };
        self.error_at(cause_line, context, context_line, kind)
    }

    fn unexpected_second(&self, toks: &Tokens, context: &str, context_line: usize) -> ParseError {
        let (kind, cause_line) = match toks.peek_second() {
            Some((tok, line)) => (ParseErrorKind::UnexpectedToken(tok.to_string()), line),
            None => (ParseErrorKind::UnexpectedEof, toks.eof_line()),
        };
        self.error_at(cause_line, context, context_line, kind)
    }

    fn arity_mismatch(
        &self, toks: &Tokens, context: &str, context_line: usize, polarity: &'static str,
        name: &str, expected: usize, actual: usize,
    ) -> ParseError {
        self.error_at(
            toks.line(),
            context,
            context_line,
            ParseErrorKind::ArityMismatch { polarity, name: name.to_owned(), expected, actual },
        )
    }

    fn error_at(
        &self, cause_line: usize, context: &str, context_line: usize, kind: ParseErrorKind,
    ) -> ParseError {
        ParseError { cause_line, context_line, context: context.to_owned(), kind }
    }
}
