use mumu_lang::dynamics::err::RuntimeError;
use mumu_lang::dynamics::eval::{Interpreter, InterpreterOptions};
use mumu_lang::mumu;
use mumu_lang::parse::err::ParseErrorKind;
use mumu_lang::prelude::*;
use mumu_lang::statics::default_typing_context;
use mumu_lang::statics::err::TyckErrors;
use mumu_lang::syntax::*;

/// Arithmetic, ifz and a mu' abstraction in one statement.
const STMT_IFZ_SIMPLE: &str = "(- 2 2 (mu' x (ifz x [123 <END>] [x <END>])))\n";

/// Variable, covariable and definition names live in separate tables.
const DEF_SILLY: &str = "(def foo (foo) (foo) [foo foo])\n";

/// Map `f` over `xs` and feed the result into `then`.
const DEF_LIST_MAP: &str = "\
(def ListMap (f xs) (then)
  [xs
   (case ((Nil         [(Nil) then])
          (Cons (x xs) [(Cons ((mu xThen [f (Ap (x) (xThen))])
                               (mu xsThen (ListMap (f xs) (xsThen)))))
                        then])))])
";

/// Sum the components of `p` and feed the result into `then`.
const DEF_PAIR_SUM: &str = "\
(def PairSum (p) (then)
  [p (case ((Pair (a b) (+ a b then))))])
";

/// Combine ListMap and PairSum over a two-element list of pairs.
const STMT_MAP_SUM_PAIR: &str = "\
(ListMap ((cocase ((Ap (p) (then) (PairSum (p) (then)))))
          (Cons ((Pair (1 2)) (Cons ((Pair (3 4)) (Nil))))))
         (<END>))
";

/// Ill-typed: a list holding both an integer and a list.
const STMT_POLY_LIST_BAD: &str = "[(Cons (1 (Cons ((Nil) (Nil))))) <END>]";

/// Ill-typed: the recursive call would need a generalised signature.
const DEF_POLY_RECURSION_BAD: &str = "\
(def PolyRec (x) ()
   (PolyRec ((Pair (x x))) ()))";

fn run_source(source: &str) -> Vec<String> {
    let results = mumu::run_returning(source).unwrap();
    results.iter().map(|result| result.fmt()).collect()
}

fn parse_err(source: &str) -> ParseErrorKind {
    let mut ctx = default_typing_context();
    match mumu::parse(source, &mut ctx) {
        Ok(_) => panic!("expected a parse error"),
        Err(err) => err.kind,
    }
}

fn tyck_errs(source: &str) -> TyckErrors {
    let mut ctx = default_typing_context();
    let mut parsed = mumu::parse(source, &mut ctx).unwrap();
    match mumu::typecheck(&mut parsed, &mut ctx) {
        Ok(()) => panic!("expected a type error"),
        Err(errs) => errs,
    }
}

fn prog_test(file: &str) -> Result<Vec<String>, String> {
    let mut path = std::path::PathBuf::from("tests/progs");
    path.push(file);
    let buf = std::fs::read_to_string(path).map_err(|err| err.to_string())?;
    let results = mumu::run_returning(&buf)?;
    Ok(results.iter().map(|result| result.fmt()).collect())
}

macro_rules! mk_prog_test {
    ($test_name:ident, $file_name:expr, $expected:expr) => {
        #[test]
        fn $test_name() {
            assert_eq!(prog_test($file_name).unwrap(), $expected);
        }
    };
}

mod prog_tests {
    use super::*;

    mk_prog_test!(arith, "arith.mumu", vec!["123"]);
    mk_prog_test!(map_sum, "map-sum.mumu", vec!["(Cons (3 (Cons (7 (Nil)))))"]);
    mk_prog_test!(streams, "streams.mumu", vec!["7", "7"]);
    mk_prog_test!(lazy_pair, "lazy-pair.mumu", vec!["1", "2"]);
    mk_prog_test!(lambda, "lambda.mumu", vec!["42"]);
}

mod parse_tests {
    use super::*;

    #[test]
    fn parses_the_map_sum_program() {
        let source = [DEF_LIST_MAP, DEF_PAIR_SUM, STMT_MAP_SUM_PAIR].concat();
        let mut ctx = default_typing_context();
        let parsed = mumu::parse(&source, &mut ctx).unwrap();
        assert_eq!(parsed.program.definitions.len(), 2);
        assert_eq!(parsed.program.statements.len(), 1);
        assert!(parsed.n_vars > 0);
        assert!(parsed.n_covars > 0);
    }

    #[test]
    fn namespaces_are_separate() {
        let mut ctx = default_typing_context();
        mumu::parse(DEF_SILLY, &mut ctx).unwrap();
    }

    #[test]
    fn shadowing_rebinds_to_the_innermost_binder() {
        let mut ctx = default_typing_context();
        mumu::parse("[(mu a [(mu a [1 a]) a]) <END>]", &mut ctx).unwrap();
    }

    #[test]
    fn unknown_variable() {
        assert_eq!(
            parse_err("[x <END>]"),
            ParseErrorKind::UnknownName { kind: "variable", name: "x".to_owned() }
        );
    }

    #[test]
    fn unknown_covariable() {
        assert_eq!(
            parse_err("[1 k]"),
            ParseErrorKind::UnknownName { kind: "covariable", name: "k".to_owned() }
        );
    }

    #[test]
    fn unknown_definition() {
        assert_eq!(
            parse_err("(Frobnicate () ())"),
            ParseErrorKind::UnknownName { kind: "definition", name: "Frobnicate".to_owned() }
        );
    }

    #[test]
    fn unknown_structor() {
        assert_eq!(
            parse_err("[(Snoc (1)) <END>]"),
            ParseErrorKind::UnknownName { kind: "constructor", name: "Snoc".to_owned() }
        );
    }

    #[test]
    fn constructor_arity_mismatch() {
        assert_eq!(
            parse_err("[(Cons (1)) <END>]"),
            ParseErrorKind::ArityMismatch {
                polarity: "arity",
                name: "Cons".to_owned(),
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn duplicate_definition() {
        let source = [DEF_SILLY, DEF_SILLY].concat();
        assert_eq!(parse_err(&source), ParseErrorKind::DuplicateDefinition("foo".to_owned()));
    }

    #[test]
    fn ifz_is_reserved() {
        assert_eq!(
            parse_err("(def ifz () () [1 <END>])"),
            ParseErrorKind::ReservedName("ifz".to_owned())
        );
    }

    #[test]
    fn empty_clause_list() {
        assert_eq!(parse_err("[(Nil) (case ())]"), ParseErrorKind::EmptyClauseList);
    }

    #[test]
    fn incomplete_clause_list() {
        assert_eq!(
            parse_err("[(Nil) (case ((Nil [1 <END>])))]"),
            ParseErrorKind::IncompleteClauses
        );
    }

    #[test]
    fn duplicated_clause() {
        assert_eq!(
            parse_err("[(Nil) (case ((Nil [1 <END>]) (Nil [2 <END>])))]"),
            ParseErrorKind::MismatchedClause("Nil".to_owned())
        );
    }

    #[test]
    fn clause_of_the_wrong_type() {
        assert_eq!(
            parse_err("[(Nil) (case ((Nil [1 <END>]) (Pair (a b) [a <END>])))]"),
            ParseErrorKind::MismatchedClause("Pair".to_owned())
        );
    }

    #[test]
    fn invalid_integer_literal() {
        assert_eq!(parse_err("[1x <END>]"), ParseErrorKind::InvalidIntLiteral("1x".to_owned()));
        assert_eq!(parse_err("[- <END>]"), ParseErrorKind::InvalidIntLiteral("-".to_owned()));
    }

    #[test]
    fn unexpected_end_of_input() {
        assert_eq!(parse_err("[1"), ParseErrorKind::UnexpectedEof);
    }

    #[test]
    fn errors_carry_both_lines() {
        let mut ctx = default_typing_context();
        let err = mumu::parse("(def Foo () ()\n\n [1 <END>]", &mut ctx).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
        assert_eq!(err.context_line, 1);
        assert_eq!(err.cause_line, 3);
    }
}

mod roundtrip_tests {
    use super::*;

    fn print_once(source: &str) -> String {
        let mut ctx = default_typing_context();
        let parsed = mumu::parse(source, &mut ctx).unwrap();
        parsed.program.fmt()
    }

    #[test]
    fn printing_is_a_parser_fixpoint() {
        let source =
            [DEF_SILLY, DEF_LIST_MAP, DEF_PAIR_SUM, STMT_MAP_SUM_PAIR, STMT_IFZ_SIMPLE].concat();
        let first = print_once(&source);
        let second = print_once(&first);
        assert_eq!(first, second);
    }

    #[test]
    fn ascii_and_unicode_mu_are_interchangeable() {
        let mut ctx = default_typing_context();
        let parsed = mumu::parse("[(μ a (- 1 2 (μ' x [x a]))) <END>]", &mut ctx).unwrap();
        let ascii = parsed.program.fmt();
        assert_eq!(ascii, "[(mu a (- 1 2 (mu' x [x a]))) <END>]\n");
        let unicode = parsed.program.fmt_args(Args::new().unicode());
        assert_eq!(unicode, "[(μ a (- 1 2 (μ' x [x a]))) <END>]\n");
    }

    #[test]
    fn structors_print_without_empty_argument_lists() {
        let mut ctx = default_typing_context();
        let parsed = mumu::parse("[(Cons ((Pair (1 2)) (Nil))) <END>]", &mut ctx).unwrap();
        assert_eq!(parsed.program.fmt(), "[(Cons ((Pair (1 2)) (Nil))) <END>]\n");
    }
}

mod tyck_tests {
    use super::*;

    fn typechecks(source: &str) {
        let mut ctx = default_typing_context();
        let mut parsed = mumu::parse(source, &mut ctx).unwrap();
        mumu::typecheck(&mut parsed, &mut ctx).unwrap();
    }

    #[test]
    fn arithmetic_statement_typechecks() {
        typechecks(STMT_IFZ_SIMPLE);
    }

    #[test]
    fn silly_definition_typechecks() {
        typechecks(DEF_SILLY);
    }

    #[test]
    fn map_sum_program_typechecks() {
        typechecks(&[DEF_LIST_MAP, DEF_PAIR_SUM, STMT_MAP_SUM_PAIR].concat());
    }

    #[test]
    fn polymorphic_list_is_rejected() {
        let errs = tyck_errs(STMT_POLY_LIST_BAD);
        assert!(errs.to_string().contains("different type constructors"));
    }

    #[test]
    fn polymorphic_recursion_is_rejected() {
        tyck_errs(DEF_POLY_RECURSION_BAD);
    }

    #[test]
    fn list_meeting_stream_is_rejected() {
        let errs = tyck_errs("[(Nil) (Head ((mu' x [x <END>])))]");
        assert!(errs.to_string().contains("different type constructors"));
    }

    #[test]
    fn errors_are_accumulated_across_statements() {
        let source = [STMT_POLY_LIST_BAD, "\n", "[(Pair (1 2)) (Head ((mu' x [x <END>])))]"]
            .concat();
        let errs = tyck_errs(&source);
        assert_eq!(errs.0.len(), 2);
    }

    #[test]
    fn checked_nodes_carry_types() {
        let mut ctx = default_typing_context();
        let mut parsed = mumu::parse("[1 <END>]", &mut ctx).unwrap();
        mumu::typecheck(&mut parsed, &mut ctx).unwrap();
        let typed = parsed.program.fmt_args(Args::new().typed(&ctx));
        assert_eq!(typed, "[1: Integer <END>: Integer]\n");
    }
}

mod eval_tests {
    use super::*;

    #[test]
    fn arithmetic_ifz_result() {
        assert_eq!(run_source(STMT_IFZ_SIMPLE), vec!["123"]);
    }

    #[test]
    fn map_sum_over_list_of_pairs() {
        let source = [DEF_LIST_MAP, DEF_PAIR_SUM, STMT_MAP_SUM_PAIR].concat();
        assert_eq!(run_source(&source), vec!["(Cons (3 (Cons (7 (Nil)))))"]);
    }

    #[test]
    fn negative_zero_is_zero() {
        assert_eq!(run_source("(ifz -0 [1 <END>] [2 <END>])"), vec!["1"]);
    }

    #[test]
    fn division_by_zero_yields_one() {
        assert_eq!(run_source("(/ 7 0 (mu' x [x <END>]))"), vec!["1"]);
    }

    #[test]
    fn modulus_by_zero_yields_the_left_operand() {
        assert_eq!(run_source("(% 7 0 (mu' x [x <END>]))"), vec!["7"]);
    }

    #[test]
    fn constructor_focusing_evaluates_arguments_first() {
        let source = "[(Cons ((mu a [1 a]) (Nil)))
                       (case ((Nil [0 <END>]) (Cons (x xs) [x <END>])))]";
        assert_eq!(run_source(source), vec!["1"]);
    }

    #[test]
    fn destructor_focusing_evaluates_arguments_first() {
        let source = "[(cocase ((Ap (x) (k) (+ x 1 k))))
                       (Ap ((mu a [41 a])) ((mu' r [r <END>])))]";
        assert_eq!(run_source(source), vec!["42"]);
    }

    #[test]
    fn statements_run_in_sequence() {
        let source = "[1 <END>]\n[2 <END>]\n[3 <END>]";
        assert_eq!(run_source(source), vec!["1", "2", "3"]);
    }

    #[test]
    fn interpreter_is_single_shot() {
        let mut ctx = default_typing_context();
        let mut parsed = mumu::parse("[1 <END>]", &mut ctx).unwrap();
        mumu::typecheck(&mut parsed, &mut ctx).unwrap();
        let mut sink = std::io::sink();
        let mut interpreter = Interpreter::new(
            parsed.n_vars,
            parsed.n_covars,
            parsed.program,
            InterpreterOptions::default(),
            &mut sink,
            None,
        );
        interpreter.run().unwrap();
        assert!(matches!(interpreter.run(), Err(RuntimeError::AlreadyRun)));
    }

    #[test]
    fn variable_in_cut_is_stuck() {
        // Not expressible in the surface syntax; built by hand to exercise
        // the safety net.
        let program = Program {
            definitions: vec![],
            statements: vec![Cut {
                producer: Variable { var_id: VarId(0), name: "x".to_owned(), ty: None }.into(),
                consumer: End { ty: None }.into(),
            }
            .into()],
        };
        let mut sink = std::io::sink();
        let mut interpreter =
            Interpreter::new(1, 0, program, InterpreterOptions::default(), &mut sink, None);
        let err = interpreter.run().unwrap_err();
        assert!(matches!(err, RuntimeError::StuckComputation { .. }));
        assert!(err.to_string().contains("[x <END>]"));
    }

    fn trace(source: &str) -> String {
        let mut ctx = default_typing_context();
        let mut parsed = mumu::parse(source, &mut ctx).unwrap();
        mumu::typecheck(&mut parsed, &mut ctx).unwrap();
        let mut out = Vec::new();
        let options = InterpreterOptions {
            print_definitions: true,
            print_start: true,
            print_intermediate: true,
            print_results: true,
            print_info: true,
            print_types: false,
        };
        mumu::run(parsed, &ctx, options, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn reduction_is_deterministic() {
        let source = [DEF_LIST_MAP, DEF_PAIR_SUM, STMT_MAP_SUM_PAIR].concat();
        assert_eq!(trace(&source), trace(&source));
    }

    #[test]
    fn trace_names_the_rules_applied() {
        let source = [DEF_LIST_MAP, DEF_PAIR_SUM, STMT_MAP_SUM_PAIR].concat();
        let trace = trace(&source);
        assert!(trace.contains("-- Definitions --"));
        assert!(trace.contains("-- Evaluating next statement --"));
        assert!(trace.contains("-- Reduce: Call ListMap --"));
        assert!(trace.contains("-- Reduce: Case Cons --"));
        assert!(trace.contains("-- Focus: Constructor Cons (0) --"));
        assert!(trace.contains("-- Reduce: Cocase Ap --"));
        assert!(trace.contains("-- Reduce: Arithmetic --"));
        assert!(trace.contains("-- Finished! --"));
    }

    #[test]
    fn focus_variables_are_fresh_and_named_after_their_origin() {
        let source = "(+ (mu a [1 a]) 2 (mu' x [x <END>]))";
        let trace = trace(source);
        assert!(trace.contains("-- Focus: Arithmetic (left) --"));
        assert!(trace.contains("_ar_l"));
        assert_eq!(run_source(source), vec!["3"]);
    }
}
