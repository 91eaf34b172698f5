//! End-to-end scenarios: the worked two-variable example, free-variable
//! unboundedness, the two classic cycling instances, branch and bound, and
//! an infeasible program.

use num_bigint::BigInt;
use rstest::rstest;

use linprog_tutor::bnb::BnbSolver;
use linprog_tutor::{Model, Outcome, Phase, PivotRule, Quiet, Rational, Tableau};

fn rational(n: i64, d: i64) -> Rational {
    Rational::new(BigInt::from(n), BigInt::from(d))
}

fn solve(text: &str) -> (Tableau, Outcome) {
    let model = Model::parse(text).unwrap();
    let mut tab = Tableau::new(&model, false);
    let outcome = tab.solve(-1, &mut Quiet).unwrap();
    (tab, outcome)
}

const TWO_VAR: &str = "max 6x + 4y\nst\n6x + 8y <= 12\n10x + 5y <= 10\nend";

#[test]
fn two_variable_max_reaches_the_exact_optimum() {
    let (tab, outcome) = solve(TWO_VAR);
    assert_eq!(outcome, Outcome::Optimal);
    assert_eq!(tab.objective_value(), rational(36, 5));

    let soln = tab.solution();
    assert_eq!(soln[0], ("(Obj)".to_string(), rational(36, 5)));
    let x = soln.iter().find(|(v, _)| v == "X").unwrap();
    let y = soln.iter().find(|(v, _)| v == "Y").unwrap();
    assert_eq!(x.1, rational(2, 5));
    assert_eq!(y.1, rational(6, 5));

    // maximization optimum: sigma <= 0 on every column, and the objective
    // equals -obj_dir * sigma_0
    for c in 1..tab.cols() {
        assert!(tab.row(0)[c] <= rational(0, 1));
    }
    assert_eq!(tab.objective_value(), -tab.row(0)[0].clone());
}

#[test]
fn basic_columns_are_unit_vectors_after_the_solve() {
    let (tab, _) = solve(TWO_VAR);
    for (r, &b) in tab.basis().iter().enumerate().skip(1) {
        for rr in 0..=tab.num_constraints() {
            let expect = if rr == r { rational(1, 1) } else { rational(0, 1) };
            assert_eq!(tab.row(rr)[b], expect);
        }
    }
    for rr in 1..=tab.num_constraints() {
        assert!(tab.row(rr)[0] >= rational(0, 1));
    }
}

#[test]
fn free_variables_without_bounds_make_it_unbounded() {
    let (tab, outcome) = solve(
        "max 6x + 4y + z2 + z1\n\
         st\n\
         6x + 8y <= 12\n\
         10x + 5y <= 10\n\
         free: z1, z2\n\
         end",
    );
    assert_eq!(outcome, Outcome::Unbounded);
    assert_eq!(tab.phase, Phase::Unbounded);
}

const BEALE: &str = "max 3/4X1 -150X2 +1/50X3 -6X4\n\
                     st\n\
                     1/4X1 -60X2 -1/25X3 + 9X4 < 0\n\
                     1/2X1 -90X2 -1/50X3 + 3X4 < 0\n\
                     end";

/// Beale's instance cycles under a naive largest-sigma simplex. Bland's
/// rule terminates finitely; so does the default rule once flat wolf breaks
/// the degenerate ties. Without its classic third constraint the LP is
/// unbounded, which is exactly what a terminating solver must report.
#[rstest]
#[case(PivotRule::SmallestIndex, false)]
#[case(PivotRule::LargestSigma, true)]
fn beale_terminates(#[case] rule: PivotRule, #[case] wolf: bool) {
    let model = Model::parse(BEALE).unwrap();
    let mut tab = Tableau::new(&model, false);
    tab.rule = rule;
    tab.flat_wolf = wolf;
    let outcome = tab.solve(10_000, &mut Quiet).unwrap();
    assert_eq!(outcome, Outcome::Unbounded);
}

#[test]
fn marshall_suurballe_terminates_under_blands_rule() {
    let model = Model::parse(
        "MIN -.4 X1 - .4 X2 + 1.8 X3\n\
         ST\n\
         .6 x1 - 6.4 x2 + 4.8 x3 < 0\n\
         .2 x1 - 1.8 x2 + .6 x3 < 0\n\
         .4 x1 - 1.6 x2 + .2 x3 < 0\n\
         END",
    )
    .unwrap();
    let mut tab = Tableau::new(&model, false);
    tab.rule = PivotRule::SmallestIndex;
    tab.flat_wolf = false;
    let outcome = tab.solve(10_000, &mut Quiet).unwrap();
    assert_eq!(outcome, Outcome::Unbounded);
}

#[test]
fn branch_and_bound_explores_until_integer_feasible() {
    let model = Model::parse(
        "max 100 x1 + 150 x2\n\
         st\n\
         8000 x1 + 4000 x2 <= 40000\n\
         15 x1 + 30 x2 <= 200\n\
         int: x1, x2\n\
         end",
    )
    .unwrap();
    let morig = model.constraints.len();

    let mut solver = BnbSolver::new(model, false, &mut Quiet).unwrap();
    // the root relaxation has a fractional component
    let root = solver.nodes[0].soln.as_ref().unwrap();
    assert!(root
        .iter()
        .skip(1)
        .any(|(_, val)| !val.is_integer()));
    assert_eq!(
        root.iter().find(|(v, _)| v == "X1").unwrap().1,
        rational(20, 9)
    );

    solver.solve(&mut Quiet).unwrap();
    assert!(solver.choose_node().is_none());

    // every node solved exactly the original rows plus one bound per level
    for node in &solver.nodes {
        assert_eq!(node.rows_solved, morig + node.depth);
    }
    // an integer-feasible node was reached along the way
    assert!(solver.nodes.iter().any(|n| {
        n.soln.as_ref().is_some_and(|soln| {
            soln.iter()
                .skip(1)
                .all(|(v, val)| (v != "X1" && v != "X2") || val.is_integer())
        })
    }));
}

#[test]
fn sign_flipped_row_is_infeasible_through_phase_one() {
    let (tab, outcome) = solve("max x\nst\nx <= -1\nend");
    assert_eq!(outcome, Outcome::Infeasible);
    assert_eq!(tab.phase, Phase::One);
    // phase I ends with sigma_0 = 1 != 0
    assert_eq!(tab.row(0)[0], rational(1, 1));
}

#[test]
fn replaying_the_history_reproduces_the_final_basis() {
    let (mut tab, outcome) = solve("min x + y\nst\nx + y >= 2\nx <= 3\nend");
    assert_eq!(outcome, Outcome::Optimal);
    let basis = tab.basis().to_vec();
    let sigma = tab.row(0).to_vec();
    let rhs: Vec<Rational> = (0..=tab.num_constraints())
        .map(|r| tab.row(r)[0].clone())
        .collect();

    let mut sink = linprog_tutor::LineSink::new(Vec::new());
    tab.auto_replay(&mut sink).unwrap();
    sink.finish().unwrap();

    assert_eq!(tab.basis(), &basis[..]);
    assert_eq!(tab.row(0), &sigma[..]);
    for r in 0..=tab.num_constraints() {
        assert_eq!(tab.row(r)[0], rhs[r]);
    }
}
