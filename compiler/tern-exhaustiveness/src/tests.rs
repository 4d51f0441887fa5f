//! End-to-end tests for the analysis, driven through small hand-built type
//! stores. Every test spells out the match it is checking in a comment,
//! using `match` syntax for readability.
use std::cell::RefCell;

use pretty_assertions::assert_eq;
use tern_source::location::Span;
use tern_types::{
    CtorDef, CtorDesc, CtorTag, DataCtors, DataTy, FieldDef, HasTyStore, RecordTy, RowField,
    RowFieldStatus, RowId, Ty, TyId, TyStore, VariantRow,
};

use crate::{
    diagnostics::{CheckError, ExhaustivenessError, ExhaustivenessWarning},
    matrix::Matrix,
    pat::{Constant, MatchArm, Pat, PatKind},
    stack::PatStack,
    storage::PatId,
    Coverage, ExhaustivenessChecker, ExhaustivenessEnv,
};

struct TestEnv {
    tys: TyStore,
}

impl HasTyStore for TestEnv {
    fn tys(&self) -> &TyStore {
        &self.tys
    }
}

impl ExhaustivenessEnv for TestEnv {}

/// An environment that records which rows the analysis closed, on top of
/// actually closing them.
struct RecordingEnv {
    tys: TyStore,
    closed: RefCell<Vec<RowId>>,
}

impl HasTyStore for RecordingEnv {
    fn tys(&self) -> &TyStore {
        &self.tys
    }
}

impl ExhaustivenessEnv for RecordingEnv {
    fn close_variant_row(&self, row: RowId) {
        self.closed.borrow_mut().push(row);
        self.tys().close_row(row);
    }
}

/// `Option := None | Some(int)`
fn option_store() -> (TestEnv, TyId) {
    let mut tys = TyStore::new();
    let int = tys.common.int;
    let ty = tys.create(Ty::Data(DataTy {
        name: "Option".into(),
        ctors: DataCtors::Defined(vec![CtorDef::unit("None"), CtorDef::new("Some", vec![int])]),
    }));

    (TestEnv { tys }, ty)
}

/// `Letter := A | B`, and the product `(Letter, int)`.
fn pair_store() -> (TestEnv, TyId, TyId) {
    let mut tys = TyStore::new();
    let int = tys.common.int;
    let letters = tys.create(Ty::Data(DataTy {
        name: "Letter".into(),
        ctors: DataCtors::Defined(vec![CtorDef::unit("A"), CtorDef::unit("B")]),
    }));
    let pair = tys.create(Ty::Tuple(vec![letters, int]));

    (TestEnv { tys }, pair, letters)
}

/// A variant row over the given labels, none of them carrying a payload.
fn row_store(labels: &[(&str, RowFieldStatus)], closed: bool) -> (TestEnv, TyId, RowId) {
    let mut tys = TyStore::new();
    let fields =
        labels.iter().map(|&(label, status)| RowField::new(label, None, status)).collect();
    let row = tys.create_row(VariantRow::new(fields, closed));
    let ty = tys.create(Ty::Variant(row));

    (TestEnv { tys }, ty, row)
}

fn wild<E: ExhaustivenessEnv>(
    chk: &mut ExhaustivenessChecker<'_, E>,
    ty: TyId,
    span: Span,
) -> PatId {
    chk.make_pat(Pat::new(PatKind::Wild, ty, span))
}

fn int_pat<E: ExhaustivenessEnv>(
    chk: &mut ExhaustivenessChecker<'_, E>,
    value: i64,
    span: Span,
) -> PatId {
    let int = chk.tys().common.int;
    chk.make_pat(Pat::new(PatKind::Const(Constant::int(value)), int, span))
}

fn ctor<E: ExhaustivenessEnv>(
    chk: &mut ExhaustivenessChecker<'_, E>,
    ty: TyId,
    name: &str,
    args: Vec<PatId>,
    span: Span,
) -> PatId {
    let desc = chk.tys().ctor_named(ty, name).unwrap();
    chk.make_pat(Pat::new(PatKind::Ctor(desc, args), ty, span))
}

fn variant<E: ExhaustivenessEnv>(
    chk: &mut ExhaustivenessChecker<'_, E>,
    ty: TyId,
    label: &str,
    arg: Option<PatId>,
    span: Span,
) -> PatId {
    chk.make_pat(Pat::new(PatKind::Variant { label: label.into(), arg }, ty, span))
}

fn or_pat<E: ExhaustivenessEnv>(
    chk: &mut ExhaustivenessChecker<'_, E>,
    ty: TyId,
    lhs: PatId,
    rhs: PatId,
) -> PatId {
    let span = chk.get_pat(lhs).span.join(chk.get_pat(rhs).span);
    chk.make_pat(Pat::new(PatKind::Or(lhs, rhs), ty, span))
}

/// Run `check_match` over arms built by the closure, returning the verdict
/// and the diagnostics.
fn run_match<E: ExhaustivenessEnv>(
    env: &E,
    ty: TyId,
    build: impl FnOnce(&mut ExhaustivenessChecker<'_, E>) -> Vec<MatchArm>,
) -> (Coverage, Vec<ExhaustivenessError>, Vec<ExhaustivenessWarning>) {
    let mut checker = ExhaustivenessChecker::new(Span::new(0, 1), env);
    let arms = build(&mut checker);
    let verdict = checker.check_match(&arms, ty).unwrap();
    let (errors, warnings) = checker.into_diagnostics().into_diagnostics();

    (verdict, errors, warnings)
}

#[test]
fn missing_constructor_becomes_the_witness() {
    let (env, option) = option_store();

    // match x { Some(_) => ... }
    let (verdict, errors, warnings) = run_match(&env, option, |chk| {
        let arg = wild(chk, chk.tys().common.int, Span::default());
        let some = ctor(chk, option, "Some", vec![arg], Span::new(10, 17));
        vec![MatchArm::new(some)]
    });

    assert_eq!(verdict, Coverage::Partial);
    assert_eq!(
        errors,
        vec![ExhaustivenessError::NonExhaustiveMatch {
            location: Span::new(0, 1),
            uncovered: vec!["None".into()],
            may_be_guarded: false,
        }]
    );
    assert!(warnings.is_empty());
}

#[test]
fn constant_coverage_is_tracked_under_constructors() {
    let (env, option) = option_store();

    // match x { Some(0) => ..., None => ... }
    let (verdict, errors, _) = run_match(&env, option, |chk| {
        let zero = int_pat(chk, 0, Span::default());
        let some_zero = ctor(chk, option, "Some", vec![zero], Span::new(10, 17));
        let none = ctor(chk, option, "None", vec![], Span::new(20, 24));
        vec![MatchArm::new(some_zero), MatchArm::new(none)]
    });

    assert_eq!(verdict, Coverage::Partial);
    assert_eq!(
        errors,
        vec![ExhaustivenessError::NonExhaustiveMatch {
            location: Span::new(0, 1),
            uncovered: vec!["Some(1)".into()],
            may_be_guarded: false,
        }]
    );
}

#[test]
fn total_match_produces_no_diagnostics() {
    let (env, option) = option_store();

    // match x { Some(_) => ..., None => ... }
    let (verdict, errors, warnings) = run_match(&env, option, |chk| {
        let arg = wild(chk, chk.tys().common.int, Span::default());
        let some = ctor(chk, option, "Some", vec![arg], Span::new(10, 17));
        let none = ctor(chk, option, "None", vec![], Span::new(20, 24));
        vec![MatchArm::new(some), MatchArm::new(none)]
    });

    assert_eq!(verdict, Coverage::Total);
    assert!(errors.is_empty());
    assert!(warnings.is_empty());
}

#[test]
fn empty_match_reports_a_wildcard_witness() {
    let (env, option) = option_store();

    let (verdict, errors, _) = run_match(&env, option, |_| vec![]);

    assert_eq!(verdict, Coverage::Partial);
    assert_eq!(
        errors,
        vec![ExhaustivenessError::NonExhaustiveMatch {
            location: Span::new(0, 1),
            uncovered: vec!["_".into()],
            may_be_guarded: false,
        }]
    );
}

#[test]
fn shadowed_clause_is_reported() {
    let (env, option) = option_store();

    // match x { _ => ..., Some(_) => ... }
    let (verdict, _, warnings) = run_match(&env, option, |chk| {
        let catch_all = wild(chk, option, Span::new(10, 11));
        let arg = wild(chk, chk.tys().common.int, Span::default());
        let some = ctor(chk, option, "Some", vec![arg], Span::new(20, 27));
        vec![MatchArm::new(catch_all), MatchArm::new(some)]
    });

    assert_eq!(verdict, Coverage::Total);
    assert_eq!(
        warnings,
        vec![ExhaustivenessWarning::UnusedMatchCase {
            location: Span::new(20, 27),
            pat: "Some(_)".into(),
        }]
    );
}

#[test]
fn guarded_clauses_carry_no_coverage() {
    let (env, option) = option_store();

    // match x { Some(_) if g => ..., Some(_) => ..., None => ... }
    let (verdict, errors, warnings) = run_match(&env, option, |chk| {
        let arg = wild(chk, chk.tys().common.int, Span::default());
        let guarded = ctor(chk, option, "Some", vec![arg], Span::new(10, 17));
        let arg = wild(chk, chk.tys().common.int, Span::default());
        let some = ctor(chk, option, "Some", vec![arg], Span::new(20, 27));
        let none = ctor(chk, option, "None", vec![], Span::new(30, 34));
        vec![MatchArm::guarded(guarded), MatchArm::new(some), MatchArm::new(none)]
    });

    // the second `Some(_)` is reachable precisely because the first one is
    // guarded
    assert_eq!(verdict, Coverage::Total);
    assert!(errors.is_empty());
    assert!(warnings.is_empty());
}

#[test]
fn guard_note_rides_the_error() {
    let (env, option) = option_store();

    // match x { None if g => ..., Some(_) => ... }
    let (verdict, errors, _) = run_match(&env, option, |chk| {
        let none = ctor(chk, option, "None", vec![], Span::new(10, 14));
        let arg = wild(chk, chk.tys().common.int, Span::default());
        let some = ctor(chk, option, "Some", vec![arg], Span::new(20, 27));
        vec![MatchArm::guarded(none), MatchArm::new(some)]
    });

    assert_eq!(verdict, Coverage::Partial);
    assert_eq!(
        errors,
        vec![ExhaustivenessError::NonExhaustiveMatch {
            location: Span::new(0, 1),
            uncovered: vec!["None".into()],
            may_be_guarded: true,
        }]
    );
}

#[test]
fn dead_or_alternative_is_reported_once() {
    let (env, _) = option_store();
    let int = env.tys.common.int;

    // match x { 1 => ..., 1 | 2 => ..., _ => ... }
    let (verdict, _, warnings) = run_match(&env, int, |chk| {
        let first = int_pat(chk, 1, Span::new(10, 11));
        let lhs = int_pat(chk, 1, Span::new(20, 21));
        let rhs = int_pat(chk, 2, Span::new(24, 25));
        let both = or_pat(chk, int, lhs, rhs);
        let catch_all = wild(chk, int, Span::new(30, 31));
        vec![MatchArm::new(first), MatchArm::new(both), MatchArm::new(catch_all)]
    });

    assert_eq!(verdict, Coverage::Total);
    assert_eq!(
        warnings,
        vec![ExhaustivenessWarning::UnusedOrAlternative {
            location: Span::new(20, 21),
            pat: "1".into(),
        }]
    );
}

#[test]
fn duplicate_alternative_within_one_clause_is_dead() {
    let (env, option) = option_store();

    // match x { Some(0) | Some(0) => ... }; the clause matches, its second
    // spelling never does
    let (verdict, errors, warnings) = run_match(&env, option, |chk| {
        let zero = int_pat(chk, 0, Span::default());
        let lhs = ctor(chk, option, "Some", vec![zero], Span::new(10, 17));
        let zero = int_pat(chk, 0, Span::default());
        let rhs = ctor(chk, option, "Some", vec![zero], Span::new(20, 27));
        let both = or_pat(chk, option, lhs, rhs);
        vec![MatchArm::new(both)]
    });

    assert_eq!(verdict, Coverage::Partial);
    assert_eq!(
        errors,
        vec![ExhaustivenessError::NonExhaustiveMatch {
            location: Span::new(0, 1),
            uncovered: vec!["None".into()],
            may_be_guarded: false,
        }]
    );
    assert_eq!(
        warnings,
        vec![ExhaustivenessWarning::UnusedOrAlternative {
            location: Span::new(20, 27),
            pat: "Some(0)".into(),
        }]
    );
}

#[test]
fn generated_or_patterns_stay_opaque() {
    let (env, _) = option_store();
    let int = env.tys.common.int;

    // the same match as above, except the or-pattern is a desugaring
    // artifact; its dead alternative stays unreported
    let (verdict, _, warnings) = run_match(&env, int, |chk| {
        let first = int_pat(chk, 1, Span::new(10, 11));
        let lhs = chk.make_pat(Pat::generated(PatKind::Const(Constant::int(1)), int));
        let rhs = chk.make_pat(Pat::generated(PatKind::Const(Constant::int(2)), int));
        let both = chk.make_pat(Pat::generated(PatKind::Or(lhs, rhs), int));
        let catch_all = wild(chk, int, Span::new(30, 31));
        vec![MatchArm::new(first), MatchArm::new(both), MatchArm::new(catch_all)]
    });

    assert_eq!(verdict, Coverage::Total);
    assert!(warnings.is_empty());
}

#[test]
fn absent_labels_are_vacuously_covered() {
    let (env, ty, _) =
        row_store(&[("A", RowFieldStatus::Present), ("B", RowFieldStatus::Absent)], true);

    // match x { `A => ..., `B => ... }; no value carries `B
    let (verdict, errors, warnings) = run_match(&env, ty, |chk| {
        let a = variant(chk, ty, "A", None, Span::new(10, 12));
        let b = variant(chk, ty, "B", None, Span::new(20, 22));
        vec![MatchArm::new(a), MatchArm::new(b)]
    });

    assert_eq!(verdict, Coverage::Total);
    assert!(errors.is_empty());
    assert_eq!(
        warnings,
        vec![ExhaustivenessWarning::UnusedMatchCase {
            location: Span::new(20, 22),
            pat: "`B".into(),
        }]
    );

    // and the oracle agrees that nothing satisfies `B
    let mut checker = ExhaustivenessChecker::new(Span::new(0, 1), &env);
    let a = variant(&mut checker, ty, "A", None, Span::default());
    let b = variant(&mut checker, ty, "B", None, Span::default());
    let mut matrix = Matrix::empty();
    checker.push_row(&mut matrix, PatStack::singleton(a));
    assert!(!checker.satisfiable(&matrix, &[b]).unwrap());
}

#[test]
fn tuple_witnesses_rebuild_the_product() {
    let (env, pair, letters) = pair_store();
    let int = env.tys.common.int;

    // match x { (A, _) => ..., (B, 1) => ... }
    let (verdict, errors, _) = run_match(&env, pair, |chk| {
        let a = ctor(chk, letters, "A", vec![], Span::default());
        let any = wild(chk, int, Span::default());
        let left = chk.make_pat(Pat::new(PatKind::Tuple(vec![a, any]), pair, Span::new(10, 16)));

        let b = ctor(chk, letters, "B", vec![], Span::default());
        let one = int_pat(chk, 1, Span::default());
        let right = chk.make_pat(Pat::new(PatKind::Tuple(vec![b, one]), pair, Span::new(20, 26)));

        vec![MatchArm::new(left), MatchArm::new(right)]
    });

    assert_eq!(verdict, Coverage::Partial);
    assert_eq!(
        errors,
        vec![ExhaustivenessError::NonExhaustiveMatch {
            location: Span::new(0, 1),
            uncovered: vec!["(B, 2)".into()],
            may_be_guarded: false,
        }]
    );
}

#[test]
fn record_witnesses_name_their_fields() {
    let mut tys = TyStore::new();
    let int = tys.common.int;
    let letters = tys.create(Ty::Data(DataTy {
        name: "Letter".into(),
        ctors: DataCtors::Defined(vec![CtorDef::unit("A"), CtorDef::unit("B")]),
    }));
    let point = tys.create(Ty::Record(RecordTy {
        name: "Point".into(),
        fields: vec![
            FieldDef { name: "x".into(), ty: letters },
            FieldDef { name: "y".into(), ty: int },
        ],
    }));
    let env = TestEnv { tys };

    // match p { Point { x: A, .. } => ... }
    let (verdict, errors, _) = run_match(&env, point, |chk| {
        let a = ctor(chk, letters, "A", vec![], Span::default());
        let pat = chk.make_pat(Pat::new(PatKind::Record(vec![(0, a)]), point, Span::new(10, 20)));
        vec![MatchArm::new(pat)]
    });

    assert_eq!(verdict, Coverage::Partial);
    assert_eq!(
        errors,
        vec![ExhaustivenessError::NonExhaustiveMatch {
            location: Span::new(0, 1),
            uncovered: vec!["{x: B, y: _}".into()],
            may_be_guarded: false,
        }]
    );
}

#[test]
fn char_witnesses_prefer_friendly_letters() {
    let (env, _) = option_store();
    let char_ty = env.tys.common.char;

    // match c { 'a' => ..., 'b' => ... }
    let (_, errors, _) = run_match(&env, char_ty, |chk| {
        let a = chk.make_pat(Pat::new(
            PatKind::Const(Constant::Char(b'a')),
            char_ty,
            Span::new(10, 13),
        ));
        let b = chk.make_pat(Pat::new(
            PatKind::Const(Constant::Char(b'b')),
            char_ty,
            Span::new(20, 23),
        ));
        vec![MatchArm::new(a), MatchArm::new(b)]
    });

    assert_eq!(
        errors,
        vec![ExhaustivenessError::NonExhaustiveMatch {
            location: Span::new(0, 1),
            uncovered: vec!["'c'".into()],
            may_be_guarded: false,
        }]
    );
}

#[test]
fn enumerating_every_char_is_total() {
    let (env, _) = option_store();
    let char_ty = env.tys.common.char;

    // match c { '\x00' => ..., ..., '\xff' => ... }; all 256 values listed
    let (verdict, errors, warnings) = run_match(&env, char_ty, |chk| {
        (0..=255u8)
            .map(|value| {
                let span = Span::new(value as usize, value as usize + 1);
                let pat =
                    chk.make_pat(Pat::new(PatKind::Const(Constant::Char(value)), char_ty, span));
                MatchArm::new(pat)
            })
            .collect()
    });

    assert_eq!(verdict, Coverage::Total);
    assert!(errors.is_empty());
    assert!(warnings.is_empty());

    // one value short of the full range, the leftover is the witness
    let (verdict, errors, _) = run_match(&env, char_ty, |chk| {
        (0..=255u8)
            .filter(|&value| value != b'b')
            .map(|value| {
                let span = Span::new(value as usize, value as usize + 1);
                let pat =
                    chk.make_pat(Pat::new(PatKind::Const(Constant::Char(value)), char_ty, span));
                MatchArm::new(pat)
            })
            .collect()
    });

    assert_eq!(verdict, Coverage::Partial);
    assert_eq!(
        errors,
        vec![ExhaustivenessError::NonExhaustiveMatch {
            location: Span::new(0, 1),
            uncovered: vec!["'b'".into()],
            may_be_guarded: false,
        }]
    );
}

#[test]
fn constant_witnesses_stay_fresh() {
    let (env, _) = option_store();

    // integers: one past the largest listed constant, keeping the sign
    let int = env.tys.common.int;
    let (_, errors, _) = run_match(&env, int, |chk| {
        let pat = int_pat(chk, -5, Span::new(10, 12));
        vec![MatchArm::new(pat)]
    });
    let ExhaustivenessError::NonExhaustiveMatch { uncovered, .. } = &errors[0] else {
        panic!("expected a non-exhaustive error");
    };
    assert_eq!(uncovered, &["-4".to_string()]);

    // strings: one asterisk longer than anything listed
    let str_ty = env.tys.common.str;
    let (_, errors, _) = run_match(&env, str_ty, |chk| {
        let lit = chk.make_pat(Pat::new(
            PatKind::Const(Constant::Str("hi".into())),
            str_ty,
            Span::new(10, 14),
        ));
        vec![MatchArm::new(lit)]
    });
    let ExhaustivenessError::NonExhaustiveMatch { uncovered, .. } = &errors[0] else {
        panic!("expected a non-exhaustive error");
    };
    assert_eq!(uncovered, &["\"***\"".to_string()]);

    // floats: numerically past the largest spelled constant
    let float_ty = env.tys.common.float;
    let (_, errors, _) = run_match(&env, float_ty, |chk| {
        let lit = chk.make_pat(Pat::new(
            PatKind::Const(Constant::Float("1.5".into())),
            float_ty,
            Span::new(10, 13),
        ));
        vec![MatchArm::new(lit)]
    });
    let ExhaustivenessError::NonExhaustiveMatch { uncovered, .. } = &errors[0] else {
        panic!("expected a non-exhaustive error");
    };
    assert_eq!(uncovered, &["2.5".to_string()]);
}

#[test]
fn array_witnesses_use_the_smallest_missing_length() {
    let mut tys = TyStore::new();
    let int = tys.common.int;
    let ints = tys.create(Ty::Array(int));
    let env = TestEnv { tys };

    // match xs { [] => ..., [_] => ... }
    let (verdict, errors, _) = run_match(&env, ints, |chk| {
        let empty = chk.make_pat(Pat::new(PatKind::Array(vec![]), ints, Span::new(10, 12)));
        let elem = wild(chk, int, Span::default());
        let one = chk.make_pat(Pat::new(PatKind::Array(vec![elem]), ints, Span::new(20, 23)));
        vec![MatchArm::new(empty), MatchArm::new(one)]
    });

    assert_eq!(verdict, Coverage::Partial);
    assert_eq!(
        errors,
        vec![ExhaustivenessError::NonExhaustiveMatch {
            location: Span::new(0, 1),
            uncovered: vec!["[_, _]".into()],
            may_be_guarded: false,
        }]
    );

    // a trailing catch-all settles every length
    let (verdict, errors, _) = run_match(&env, ints, |chk| {
        let empty = chk.make_pat(Pat::new(PatKind::Array(vec![]), ints, Span::new(10, 12)));
        let elem = wild(chk, int, Span::default());
        let one = chk.make_pat(Pat::new(PatKind::Array(vec![elem]), ints, Span::new(20, 23)));
        let rest = wild(chk, ints, Span::new(30, 31));
        vec![MatchArm::new(empty), MatchArm::new(one), MatchArm::new(rest)]
    });

    assert_eq!(verdict, Coverage::Total);
    assert!(errors.is_empty());
}

#[test]
fn open_rows_stay_open_without_a_catch_all() {
    let mut tys = TyStore::new();
    let fields = vec![
        RowField::new("A", None, RowFieldStatus::Present),
        RowField::new("B", None, RowFieldStatus::Present),
    ];
    let row = tys.create_row(VariantRow::new(fields, false));
    let ty = tys.create(Ty::Variant(row));
    let env = RecordingEnv { tys, closed: RefCell::new(Vec::new()) };

    // match x { `A => ..., `B => ... }; the row could still grow
    let (verdict, errors, _) = run_match(&env, ty, |chk| {
        let a = variant(chk, ty, "A", None, Span::new(10, 12));
        let b = variant(chk, ty, "B", None, Span::new(20, 22));
        vec![MatchArm::new(a), MatchArm::new(b)]
    });

    assert_eq!(verdict, Coverage::Partial);
    assert_eq!(
        errors,
        vec![ExhaustivenessError::NonExhaustiveMatch {
            location: Span::new(0, 1),
            uncovered: vec!["`AnyExtraTag".into()],
            may_be_guarded: false,
        }]
    );
    assert!(env.closed.borrow().is_empty());
    assert!(!env.tys().row(row).is_closed());
}

#[test]
fn catch_all_closes_the_open_row() {
    let mut tys = TyStore::new();
    let fields = vec![
        RowField::new("A", None, RowFieldStatus::Present),
        RowField::new("B", None, RowFieldStatus::Present),
    ];
    let row = tys.create_row(VariantRow::new(fields, false));
    let ty = tys.create(Ty::Variant(row));
    let env = RecordingEnv { tys, closed: RefCell::new(Vec::new()) };

    // match x { `A => ..., `B => ..., _ => ... }
    let (verdict, errors, _) = run_match(&env, ty, |chk| {
        let a = variant(chk, ty, "A", None, Span::new(10, 12));
        let b = variant(chk, ty, "B", None, Span::new(20, 22));
        let rest = wild(chk, ty, Span::new(30, 31));
        vec![MatchArm::new(a), MatchArm::new(b), MatchArm::new(rest)]
    });

    assert_eq!(verdict, Coverage::Total);
    assert!(errors.is_empty());
    assert_eq!(env.closed.borrow().as_slice(), &[row]);
    assert!(env.tys().row(row).is_closed());

    // with the row now closed, the same match without the catch-all has
    // become total, and the row is not reported closed a second time
    let (verdict, errors, warnings) = run_match(&env, ty, |chk| {
        let a = variant(chk, ty, "A", None, Span::new(10, 12));
        let b = variant(chk, ty, "B", None, Span::new(20, 22));
        vec![MatchArm::new(a), MatchArm::new(b)]
    });

    assert_eq!(verdict, Coverage::Total);
    assert!(errors.is_empty());
    assert!(warnings.is_empty());
    assert_eq!(env.closed.borrow().len(), 1);
}

#[test]
fn rows_close_through_product_columns() {
    let mut tys = TyStore::new();
    let int = tys.common.int;
    let fields = vec![RowField::new("A", None, RowFieldStatus::Present)];
    let row = tys.create_row(VariantRow::new(fields, false));
    let variant_ty = tys.create(Ty::Variant(row));
    let pair = tys.create(Ty::Tuple(vec![variant_ty, int]));
    let env = RecordingEnv { tys, closed: RefCell::new(Vec::new()) };

    // match x { (`A, 1) => ..., _ => ... }
    let (verdict, _, _) = run_match(&env, pair, |chk| {
        let a = variant(chk, variant_ty, "A", None, Span::default());
        let one = int_pat(chk, 1, Span::default());
        let left = chk.make_pat(Pat::new(PatKind::Tuple(vec![a, one]), pair, Span::new(10, 17)));
        let rest = wild(chk, pair, Span::new(20, 21));
        vec![MatchArm::new(left), MatchArm::new(rest)]
    });

    assert_eq!(verdict, Coverage::Total);
    assert_eq!(env.closed.borrow().as_slice(), &[row]);
}

#[test]
fn enumerating_extensions_is_reported_partial() {
    let mut tys = TyStore::new();
    let exn = tys.create(Ty::Data(DataTy { name: "Exn".into(), ctors: DataCtors::Extensible }));
    let not_found = CtorDesc {
        name: "NotFound".into(),
        tag: CtorTag::Extension(tys.fresh_extension()),
        arity: 0,
        consts: 0,
        blocks: 0,
    };
    let env = TestEnv { tys };

    // match e { NotFound => ... }; the population is open-ended
    let mut checker = ExhaustivenessChecker::new(Span::new(0, 1), &env).with_fragile_lint();
    let pat = checker.make_pat(Pat::new(PatKind::Ctor(not_found, vec![]), exn, Span::new(10, 18)));
    let verdict = checker.check_match(&[MatchArm::new(pat)], exn).unwrap();
    let (errors, warnings) = checker.into_diagnostics().into_diagnostics();

    assert_eq!(verdict, Coverage::Partial);
    assert_eq!(
        errors,
        vec![ExhaustivenessError::NonExhaustiveMatch {
            location: Span::new(0, 1),
            uncovered: vec!["*extension*".into()],
            may_be_guarded: false,
        }]
    );
    // naming the constructors is the robust spelling, not the fragile one
    assert!(warnings.is_empty());
}

#[test]
fn catch_all_over_a_closed_sum_is_fragile() {
    let (env, option) = option_store();

    // match x { Some(_) => ..., _ => ... }; a new constructor of Option
    // would slip into the catch-all without anyone noticing
    let mut checker = ExhaustivenessChecker::new(Span::new(0, 1), &env).with_fragile_lint();
    let arg = wild(&mut checker, env.tys.common.int, Span::default());
    let some = ctor(&mut checker, option, "Some", vec![arg], Span::new(10, 17));
    let rest = wild(&mut checker, option, Span::new(20, 21));
    let verdict =
        checker.check_match(&[MatchArm::new(some), MatchArm::new(rest)], option).unwrap();
    let (errors, warnings) = checker.into_diagnostics().into_diagnostics();

    assert_eq!(verdict, Coverage::Total);
    assert!(errors.is_empty());
    assert_eq!(
        warnings,
        vec![ExhaustivenessWarning::FragileMatch {
            location: Span::new(20, 21),
            ty: "Option".into(),
        }]
    );
}

#[test]
fn naming_every_constructor_is_robust() {
    let (env, option) = option_store();

    // match x { Some(_) => ..., None => ... }; a new constructor would be
    // reported missing, not silently absorbed
    let mut checker = ExhaustivenessChecker::new(Span::new(0, 1), &env).with_fragile_lint();
    let arg = wild(&mut checker, env.tys.common.int, Span::default());
    let some = ctor(&mut checker, option, "Some", vec![arg], Span::new(10, 17));
    let none = ctor(&mut checker, option, "None", vec![], Span::new(20, 24));
    let verdict =
        checker.check_match(&[MatchArm::new(some), MatchArm::new(none)], option).unwrap();
    let (errors, warnings) = checker.into_diagnostics().into_diagnostics();

    assert_eq!(verdict, Coverage::Total);
    assert!(errors.is_empty());
    assert!(warnings.is_empty());
}

#[test]
fn extensible_matches_are_not_flagged_fragile() {
    let mut tys = TyStore::new();
    let exn = tys.create(Ty::Data(DataTy { name: "Exn".into(), ctors: DataCtors::Extensible }));
    let not_found = CtorDesc {
        name: "NotFound".into(),
        tag: CtorTag::Extension(tys.fresh_extension()),
        arity: 0,
        consts: 0,
        blocks: 0,
    };
    let env = TestEnv { tys };

    // match e { NotFound => ..., _ => ... }; the catch-all is the only
    // possible spelling over an open-ended population
    let mut checker = ExhaustivenessChecker::new(Span::new(0, 1), &env).with_fragile_lint();
    let named =
        checker.make_pat(Pat::new(PatKind::Ctor(not_found, vec![]), exn, Span::new(10, 18)));
    let rest = wild(&mut checker, exn, Span::new(20, 21));
    let verdict =
        checker.check_match(&[MatchArm::new(named), MatchArm::new(rest)], exn).unwrap();
    let (errors, warnings) = checker.into_diagnostics().into_diagnostics();

    assert_eq!(verdict, Coverage::Total);
    assert!(errors.is_empty());
    assert!(warnings.is_empty());
}

#[test]
fn irrefutable_bindings_must_cover_their_type() {
    let (env, option) = option_store();
    let int = env.tys.common.int;

    let mut checker = ExhaustivenessChecker::new(Span::new(0, 1), &env);
    let first = wild(&mut checker, option, Span::default());
    let arg = wild(&mut checker, int, Span::default());
    let second = ctor(&mut checker, option, "Some", vec![arg], Span::new(5, 12));

    // `let _ = x` covers everything
    assert_eq!(checker.check_irrefutable(first, option).unwrap(), Coverage::Total);
    assert!(!checker.diagnostics().has_errors());

    // `let Some(_) = x` does not
    assert_eq!(checker.check_irrefutable(second, option).unwrap(), Coverage::Partial);
    let (errors, _) = checker.into_diagnostics().into_diagnostics();
    assert_eq!(
        errors,
        vec![ExhaustivenessError::RefutablePat {
            location: Span::new(5, 12),
            uncovered: vec!["None".into()],
        }]
    );
}

#[test]
fn dominated_rows_are_stripped() {
    let (env, option) = option_store();
    let int = env.tys.common.int;

    let mut checker = ExhaustivenessChecker::new(Span::new(0, 1), &env);
    let one = int_pat(&mut checker, 1, Span::default());
    let some_one = ctor(&mut checker, option, "Some", vec![one], Span::default());
    let any = wild(&mut checker, int, Span::default());
    let some_any = ctor(&mut checker, option, "Some", vec![any], Span::default());
    let none = ctor(&mut checker, option, "None", vec![], Span::default());

    let minimal = checker.minimal_rows(&[some_one, some_any, none]).unwrap();
    assert_eq!(minimal, vec![some_any, none]);
}

#[test]
fn or_alternatives_collapse_to_the_antichain() {
    let (env, option) = option_store();

    let mut checker = ExhaustivenessChecker::new(Span::new(0, 1), &env);
    let one = int_pat(&mut checker, 1, Span::default());
    let some_one = ctor(&mut checker, option, "Some", vec![one], Span::default());
    let one_again = int_pat(&mut checker, 1, Span::default());
    let duplicate = ctor(&mut checker, option, "Some", vec![one_again], Span::default());
    let none = ctor(&mut checker, option, "None", vec![], Span::default());

    let inner = or_pat(&mut checker, option, duplicate, none);
    let whole = or_pat(&mut checker, option, some_one, inner);

    let collapsed = checker.collapse_or(whole).unwrap();
    let leaves = checker.flatten_or(collapsed);
    let rendered: Vec<String> = leaves.iter().map(|&leaf| checker.render_pat(leaf)).collect();
    assert_eq!(rendered, vec!["Some(1)".to_string(), "None".to_string()]);
}

#[test]
fn joins_cover_both_sides() {
    let (env, option) = option_store();
    let int = env.tys.common.int;

    let mut checker = ExhaustivenessChecker::new(Span::new(0, 1), &env);
    let one = int_pat(&mut checker, 1, Span::default());
    let some_one = ctor(&mut checker, option, "Some", vec![one], Span::default());
    let any = wild(&mut checker, int, Span::default());
    let some_any = ctor(&mut checker, option, "Some", vec![any], Span::default());
    let none = ctor(&mut checker, option, "None", vec![], Span::default());

    assert!(checker.covers(some_any, some_one).unwrap());
    assert!(!checker.covers(some_one, some_any).unwrap());
    assert!(!checker.compatible(some_one, none).unwrap());

    let joined = checker.lub(some_one, some_any).unwrap();
    assert!(checker.covers(joined, some_one).unwrap());
    assert!(checker.covers(joined, some_any).unwrap());
    assert_eq!(checker.render_pat(joined), "Some(_)");

    // constants of different kinds are malformed input, not a disjoint pair
    let one = int_pat(&mut checker, 1, Span::default());
    let char_ty = checker.tys().common.char;
    let a = checker.make_pat(Pat::new(
        PatKind::Const(Constant::Char(b'a')),
        char_ty,
        Span::default(),
    ));
    assert_eq!(checker.compatible(one, a), Err(CheckError::ConstantMismatch));
}

#[test]
fn incompatible_patterns_have_no_join() {
    let (env, option) = option_store();

    let mut checker = ExhaustivenessChecker::new(Span::new(0, 1), &env);
    let one = int_pat(&mut checker, 1, Span::default());
    let some_one = ctor(&mut checker, option, "Some", vec![one], Span::default());
    let none = ctor(&mut checker, option, "None", vec![], Span::default());

    // disjoint constructors share no instance, so nothing joins them
    assert_eq!(checker.lub(some_one, none), Err(CheckError::IncompatiblePatterns));

    // likewise for distinct constants of one kind
    let one = int_pat(&mut checker, 1, Span::default());
    let two = int_pat(&mut checker, 2, Span::default());
    assert_eq!(checker.lub(one, two), Err(CheckError::IncompatiblePatterns));
}

#[test]
fn tuple_width_collisions_are_malformed() {
    let mut tys = TyStore::new();
    let int = tys.common.int;
    let pair = tys.create(Ty::Tuple(vec![int, int]));
    let triple = tys.create(Ty::Tuple(vec![int, int, int]));
    let env = TestEnv { tys };

    // a two-column product never lines up with a three-column one; this is
    // malformed input, not a disjoint pair
    let mut checker = ExhaustivenessChecker::new(Span::new(0, 1), &env);
    let a = int_pat(&mut checker, 1, Span::default());
    let b = wild(&mut checker, int, Span::default());
    let two = checker.make_pat(Pat::new(PatKind::Tuple(vec![a, b]), pair, Span::default()));
    let x = wild(&mut checker, int, Span::default());
    let y = wild(&mut checker, int, Span::default());
    let z = wild(&mut checker, int, Span::default());
    let three = checker.make_pat(Pat::new(PatKind::Tuple(vec![x, y, z]), triple, Span::default()));

    assert_eq!(
        checker.compatible(two, three),
        Err(CheckError::ShapeMismatch { expected: 2, found: 3 })
    );
    assert_eq!(
        checker.covers(three, two),
        Err(CheckError::ShapeMismatch { expected: 3, found: 2 })
    );
}

#[test]
fn subsumption_is_a_preorder_with_joins_on_top() {
    let (env, option) = option_store();
    let int = env.tys.common.int;

    // a small, fully enumerated pattern universe over Option
    let mut checker = ExhaustivenessChecker::new(Span::new(0, 1), &env);
    let mut pats = vec![wild(&mut checker, option, Span::default())];
    let none = ctor(&mut checker, option, "None", vec![], Span::default());
    pats.push(none);
    for value in 0..3 {
        let constant = int_pat(&mut checker, value, Span::default());
        pats.push(ctor(&mut checker, option, "Some", vec![constant], Span::default()));
    }
    let arg = wild(&mut checker, int, Span::default());
    pats.push(ctor(&mut checker, option, "Some", vec![arg], Span::default()));
    let some_zero = pats[2];
    pats.push(or_pat(&mut checker, option, some_zero, none));

    for &p in &pats {
        assert!(checker.covers(p, p).unwrap(), "{} must cover itself", checker.render_pat(p));
    }

    for &p in &pats {
        for &q in &pats {
            for &r in &pats {
                if checker.covers(p, q).unwrap() && checker.covers(q, r).unwrap() {
                    assert!(
                        checker.covers(p, r).unwrap(),
                        "{} covers {} covers {}",
                        checker.render_pat(p),
                        checker.render_pat(q),
                        checker.render_pat(r),
                    );
                }
            }
        }
    }

    for &p in &pats {
        for &q in &pats {
            if checker.compatible(p, q).unwrap() {
                let join = checker.lub(p, q).unwrap();
                assert!(
                    checker.covers(join, p).unwrap() && checker.covers(join, q).unwrap(),
                    "{} must cover {} and {}",
                    checker.render_pat(join),
                    checker.render_pat(p),
                    checker.render_pat(q),
                );
            }
        }
    }
}

#[test]
fn witnesses_escape_every_row() {
    let (env, option) = option_store();

    let mut checker = ExhaustivenessChecker::new(Span::new(0, 1), &env);
    let zero = int_pat(&mut checker, 0, Span::default());
    let some_zero = ctor(&mut checker, option, "Some", vec![zero], Span::default());
    let one = int_pat(&mut checker, 1, Span::default());
    let some_one = ctor(&mut checker, option, "Some", vec![one], Span::default());
    let none = ctor(&mut checker, option, "None", vec![], Span::default());

    let cases: Vec<Vec<PatId>> = vec![
        vec![some_zero],
        vec![some_zero, some_one],
        vec![none],
        vec![none, some_zero],
    ];

    for rows in cases {
        let mut matrix = Matrix::empty();
        for &row in &rows {
            checker.push_row(&mut matrix, PatStack::singleton(row));
        }

        let witness = checker.find_witness(&matrix, 1, None).unwrap().unwrap();
        assert_eq!(witness.len(), 1);
        for &row in &rows {
            assert!(
                !checker.compatible(row, witness[0]).unwrap(),
                "{} must not reach the witness {}",
                checker.render_pat(row),
                checker.render_pat(witness[0]),
            );
        }
    }
}

#[test]
fn malformed_clauses_never_block_redundancy() {
    let (env, _) = option_store();
    let char_ty = env.tys.common.char;

    let mut checker = ExhaustivenessChecker::new(Span::new(0, 1), &env);
    let first = int_pat(&mut checker, 1, Span::new(10, 11));
    let shadowed = int_pat(&mut checker, 1, Span::new(20, 21));
    let stray = checker.make_pat(Pat::new(
        PatKind::Const(Constant::Char(b'a')),
        char_ty,
        Span::new(30, 33),
    ));

    // the mixed-kind clause cannot be analysed against the integer ones;
    // it is skipped while the clauses around it still report
    checker.check_redundant(&[
        MatchArm::new(first),
        MatchArm::new(shadowed),
        MatchArm::new(stray),
    ]);

    let (errors, warnings) = checker.into_diagnostics().into_diagnostics();
    assert!(errors.is_empty());
    assert_eq!(
        warnings,
        vec![ExhaustivenessWarning::UnusedMatchCase {
            location: Span::new(20, 21),
            pat: "1".into(),
        }]
    );
}

#[test]
fn witness_and_oracle_agree() {
    let (env, option) = option_store();
    let int = env.tys.common.int;

    let mut checker = ExhaustivenessChecker::new(Span::new(0, 1), &env);

    // a covering matrix: no witness, and nothing satisfies a wildcard probe
    let arg = wild(&mut checker, int, Span::default());
    let some_any = ctor(&mut checker, option, "Some", vec![arg], Span::default());
    let none = ctor(&mut checker, option, "None", vec![], Span::default());
    let mut covering = Matrix::empty();
    checker.push_row(&mut covering, PatStack::singleton(some_any));
    checker.push_row(&mut covering, PatStack::singleton(none));

    let probe = wild(&mut checker, option, Span::default());
    assert_eq!(checker.find_witness(&covering, 1, None).unwrap(), None);
    assert!(!checker.satisfiable(&covering, &[probe]).unwrap());

    // a leaky matrix: the witness exists exactly when the oracle says so
    let one = int_pat(&mut checker, 1, Span::default());
    let some_one = ctor(&mut checker, option, "Some", vec![one], Span::default());
    let mut leaky = Matrix::empty();
    checker.push_row(&mut leaky, PatStack::singleton(some_one));

    let probe = wild(&mut checker, option, Span::default());
    let witness = checker.find_witness(&leaky, 1, None).unwrap();
    assert!(witness.is_some());
    assert!(checker.satisfiable(&leaky, &[probe]).unwrap());
}
