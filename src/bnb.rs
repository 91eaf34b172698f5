//! Branch and bound over the simplex engine.
//!
//! The driver owns an arena of nodes (parent/child links are indices, so
//! the tree needs no ownership cycles) and transiently mutates the shared
//! model: before each child solve the non-original rows are truncated away
//! and the ancestor bounds are re-installed by walking parent links.
//!
//! No pruning by bound: the driver is educational and explores whatever
//! node the selection rule (or the user) picks.

use num_bigint::BigInt;
use num_traits::One;
use tracing::info;

use crate::error::SolverError;
use crate::frontend::{check_ask, Frontend};
use crate::model::Model;
use crate::tableau::{Outcome, Tableau};
use crate::Rational;

/// One subproblem: the bound it adds over its parent and the solution of
/// its LP relaxation (`None` when infeasible or unbounded).
#[derive(Debug, Clone)]
pub struct Node {
    pub id: usize,
    /// The added bound as text, e.g. `X1 <= 2`; `root` for the root.
    pub note: String,
    pub parent: Option<usize>,
    pub left: Option<usize>,
    pub right: Option<usize>,
    pub soln: Option<Vec<(String, Rational)>>,
    /// Number of ancestor bounds, i.e. the node's depth in the tree.
    pub depth: usize,
    /// Constraint count of the relaxation this node solved.
    pub rows_solved: usize,
}

pub struct BnbSolver {
    pub nodes: Vec<Node>,
    model: Model,
    /// Constraint count of the original model; everything beyond it is a
    /// transient bound row.
    morig: usize,
    int_vars: Vec<String>,
    interactive: bool,
}

impl BnbSolver {
    /// Builds the driver and solves the root LP relaxation.
    pub fn new(
        model: Model,
        interactive: bool,
        ui: &mut dyn Frontend,
    ) -> Result<BnbSolver, SolverError> {
        let morig = model.constraints.len();
        let int_vars = model.int_vars.clone();
        let mut solver = BnbSolver {
            nodes: Vec::new(),
            model,
            morig,
            int_vars,
            interactive,
        };
        solver.solve_node(None, "root", ui)?;
        Ok(solver)
    }

    /// Installs the ancestor bounds, solves the relaxation, and records the
    /// new node. Returns its arena index.
    fn solve_node(
        &mut self,
        parent: Option<usize>,
        note: &str,
        ui: &mut dyn Frontend,
    ) -> Result<usize, SolverError> {
        let mut bounds: Vec<String> = Vec::new();
        if parent.is_some() {
            bounds.push(note.to_string());
        }
        let mut p = parent;
        while let Some(i) = p {
            let node = &self.nodes[i];
            if node.parent.is_some() {
                bounds.push(node.note.clone());
            }
            p = node.parent;
        }

        self.model.truncate_constraints(self.morig);
        for bound in bounds.iter().rev() {
            self.model
                .add_constraint_line(bound)
                .expect("generated bound parses");
        }
        ui.say(&self.model.to_string());

        let mut tab = Tableau::new(&self.model, false);
        let outcome = tab.solve(-1, ui)?;
        let soln = (outcome == Outcome::Optimal).then(|| tab.solution());

        let id = self.nodes.len();
        self.nodes.push(Node {
            id,
            note: note.to_string(),
            parent,
            left: None,
            right: None,
            soln,
            depth: bounds.len(),
            rows_solved: self.model.constraints.len(),
        });
        Ok(id)
    }

    /// First node with unexplored children, a solution, and an
    /// integer-required variable at a fractional value.
    pub fn choose_node(&self) -> Option<usize> {
        self.nodes.iter().position(|node| {
            node.left.is_none()
                && node.soln.as_ref().is_some_and(|soln| {
                    soln.iter()
                        .skip(1)
                        .any(|(v, val)| self.int_vars.contains(v) && !val.is_integer())
                })
        })
    }

    /// First integer-required variable of the node with a fractional value,
    /// as an index into its solution vector.
    pub fn choose_var(&self, node: usize) -> Option<usize> {
        let soln = self.nodes[node].soln.as_ref()?;
        for v in &self.int_vars {
            if let Some(vi) = soln.iter().position(|(name, _)| name == v) {
                if !soln[vi].1.is_integer() {
                    return Some(vi);
                }
            }
        }
        None
    }

    /// Splits `node` on variable `vi`: children bounded by `v <= k` and
    /// `v >= k+1` with `k = floor(value)`, both solved immediately.
    pub fn drill(
        &mut self,
        node: usize,
        vi: usize,
        ui: &mut dyn Frontend,
    ) -> Result<(), SolverError> {
        let (name, value) = {
            let soln = self.nodes[node]
                .soln
                .as_ref()
                .expect("drilled node has a solution");
            (soln[vi].0.clone(), soln[vi].1.clone())
        };
        let k = value.floor().to_integer();
        info!(node, var = %name, "drill");

        let left_note = format!("{} <= {}", name, k);
        let left = self.solve_node(Some(node), &left_note, ui)?;
        self.nodes[node].left = Some(left);

        let right_note = format!("{} >= {}", name, &k + BigInt::one());
        let right = self.solve_node(Some(node), &right_note, ui)?;
        self.nodes[node].right = Some(right);
        Ok(())
    }

    /// Explores the tree to completion: automatically in batch mode, or
    /// driven by node/variable prompts when interactive.
    pub fn solve(&mut self, ui: &mut dyn Frontend) -> Result<(), SolverError> {
        if self.interactive {
            loop {
                let answer = ui.ask("Continue? [y]/n");
                let answer = answer.trim();
                if !(answer.is_empty() || answer.eq_ignore_ascii_case("y")) {
                    break;
                }
                ui.say("Current B&B tree:");
                self.print_tree(ui);
                let Some(node) = self.ask_node(ui) else {
                    ui.say("All nodes explored!");
                    break;
                };
                let Some(vi) = self.ask_var(node, ui) else {
                    continue;
                };
                self.drill(node, vi, ui)?;
            }
        } else {
            while let Some(node) = self.choose_node() {
                let vi = self
                    .choose_var(node)
                    .expect("chosen node has a fractional integer variable");
                self.drill(node, vi, ui)?;
            }
            ui.say("All nodes explored!");
            ui.say("Current B&B tree:");
            self.print_tree(ui);
        }
        Ok(())
    }

    fn ask_node(&self, ui: &mut dyn Frontend) -> Option<usize> {
        let ser = self.nodes.len();
        let choices: Vec<String> = (0..ser).map(|i| i.to_string()).collect();
        loop {
            let s = check_ask(
                ui,
                &format!("Choose node, 0-{} [auto]:", ser - 1),
                "-1",
                &choices,
            );
            if let Ok(c) = s.parse::<usize>() {
                let node = &self.nodes[c];
                if node.left.is_some() || node.soln.is_none() {
                    ui.say("Bad choice!");
                    continue;
                }
                return Some(c);
            }
            let auto = self.choose_node();
            match auto {
                Some(i) => ui.say(&format!("Chosen [{}].", i)),
                None => ui.say("Chosen [none]."),
            }
            return auto;
        }
    }

    fn ask_var(&self, node: usize, ui: &mut dyn Frontend) -> Option<usize> {
        loop {
            ui.say(&format!("{:?}", self.int_vars));
            let v = check_ask(ui, "Choose variable [auto]:", "", &self.int_vars);
            if !v.is_empty() {
                let soln = self.nodes[node]
                    .soln
                    .as_ref()
                    .expect("asked node has a solution");
                match soln.iter().position(|(name, _)| name == &v) {
                    Some(vi) if !soln[vi].1.is_integer() => return Some(vi),
                    _ => {
                        ui.say("Bad choice!");
                        continue;
                    }
                }
            }
            let auto = self.choose_var(node);
            if let Some(vi) = auto {
                let soln = self.nodes[node]
                    .soln
                    .as_ref()
                    .expect("asked node has a solution");
                ui.say(&format!("Chosen '{}'.", soln[vi].0));
            }
            return auto;
        }
    }

    pub fn print_tree(&self, ui: &mut dyn Frontend) {
        self.print_subtree(0, String::new(), ui);
    }

    fn print_subtree(&self, id: usize, offset: String, ui: &mut dyn Frontend) {
        let node = &self.nodes[id];
        let soln_text = match &node.soln {
            Some(soln) => soln
                .iter()
                .map(|(v, f)| format!("{}:{}", v, f))
                .collect::<Vec<_>>()
                .join(","),
            None => "Infeasible".to_string(),
        };
        ui.say(&format!("{}[{}]{}: {}", offset, node.id, node.note, soln_text));
        if let Some(left) = node.left {
            let deeper = format!("{}   ", offset);
            self.print_subtree(left, deeper.clone(), ui);
            if let Some(right) = node.right {
                self.print_subtree(right, deeper, ui);
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::Quiet;
    use num_bigint::BigInt;

    fn rational(n: i64, d: i64) -> Rational {
        Rational::new(BigInt::from(n), BigInt::from(d))
    }

    fn ip_model() -> Model {
        Model::parse(
            "max 100 x1 + 150 x2\n\
             st\n\
             8000 x1 + 4000 x2 <= 40000\n\
             15 x1 + 30 x2 <= 200\n\
             int: x1, x2\n\
             end",
        )
        .unwrap()
    }

    #[test]
    fn root_relaxation_is_fractional() {
        let solver = BnbSolver::new(ip_model(), false, &mut Quiet).unwrap();
        let soln = solver.nodes[0].soln.as_ref().unwrap();
        let x1 = soln.iter().find(|(v, _)| v == "X1").unwrap();
        let x2 = soln.iter().find(|(v, _)| v == "X2").unwrap();
        assert_eq!(x1.1, rational(20, 9));
        assert_eq!(x2.1, rational(50, 9));
        assert_eq!(solver.choose_node(), Some(0));
    }

    #[test]
    fn drill_adds_one_bound_per_depth_level() {
        let mut solver = BnbSolver::new(ip_model(), false, &mut Quiet).unwrap();
        let vi = solver.choose_var(0).unwrap();
        solver.drill(0, vi, &mut Quiet).unwrap();
        assert_eq!(solver.nodes.len(), 3);
        for node in &solver.nodes[1..] {
            assert_eq!(node.depth, 1);
            assert_eq!(node.rows_solved, solver.morig + node.depth);
            assert_eq!(node.parent, Some(0));
        }
        // children bound the first fractional integer variable x1 = 20/9
        assert_eq!(solver.nodes[1].note, "X1 <= 2");
        assert_eq!(solver.nodes[2].note, "X1 >= 3");
    }

    #[test]
    fn automatic_search_terminates_with_an_integer_node() {
        let mut solver = BnbSolver::new(ip_model(), false, &mut Quiet).unwrap();
        solver.solve(&mut Quiet).unwrap();
        assert!(solver.choose_node().is_none());
        for node in &solver.nodes {
            assert_eq!(node.rows_solved, solver.morig + node.depth);
        }
        // the finished tree contains an integer-feasible node
        assert!(solver.nodes.iter().any(|n| {
            n.soln.as_ref().is_some_and(|soln| {
                soln.iter()
                    .skip(1)
                    .all(|(v, val)| !solver.int_vars.contains(v) || val.is_integer())
            })
        }));
    }

    #[test]
    fn ancestor_bounds_are_rebuilt_from_parent_links() {
        let mut solver = BnbSolver::new(ip_model(), false, &mut Quiet).unwrap();
        let vi = solver.choose_var(0).unwrap();
        solver.drill(0, vi, &mut Quiet).unwrap();
        // drill a grandchild and check its depth and row count
        if let Some(c) = solver.choose_node() {
            if let Some(v) = solver.choose_var(c) {
                solver.drill(c, v, &mut Quiet).unwrap();
                let grandchild = solver.nodes.last().unwrap();
                assert_eq!(grandchild.depth, solver.nodes[c].depth + 1);
                assert_eq!(
                    grandchild.rows_solved,
                    solver.morig + grandchild.depth
                );
            }
        }
    }
}
