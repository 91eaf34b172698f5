//! Derives and prints the optimum report: solution and reduced costs,
//! constraint activities and shadow prices, and the two sensitivity range
//! tables. Console mode pads with double tabs; formula mode emits `=`
//! prefixed cells for the replay file.

use num_traits::Zero;

use crate::frontend::Frontend;
use crate::replay;
use crate::tableau::sensitivity::Sensitivity;
use crate::tableau::{Phase, Tableau};
use crate::Rational;

fn cell(value: &Rational, formula: bool) -> String {
    if formula {
        format!("={}", value)
    } else {
        value.to_string()
    }
}

fn sep(formula: bool) -> &'static str {
    if formula {
        "\t"
    } else {
        "\t\t"
    }
}

/// Full post-solve report with prompts: tables, then the optional save of a
/// replay file. Also handles the no-optimum case.
pub fn report(tab: &mut Tableau, ui: &mut dyn Frontend) {
    if tab.phase != Phase::Two {
        ui.say("No optimal solution");
        replay::savework(tab, ui);
        return;
    }
    let sens = tab.sensitivity();
    print_solution(tab, ui, false);
    print_constraints(tab, &sens, ui, false);
    if !ui.ask("Sensitivity Report?[y]/n").contains('n') {
        print_coef_ranges(tab, ui, false);
        print_rhs_ranges(tab, &sens, ui, false);
    }
    replay::savework(tab, ui);
}

/// Variable activities and reduced costs. Shadow columns of free variables
/// are listed as their own rows, showing the split the solver worked with.
pub(crate) fn print_solution(tab: &Tableau, ui: &mut dyn Frontend, formula: bool) {
    ui.say(&format!("Optimal objective value: {}", tab.objective_value()));
    ui.say("Optimal Solution:");
    ui.say("Variable\tActivity\tReduced Cost");
    let s = sep(formula);
    for (i, v) in tab.vars.iter().enumerate().skip(1) {
        if v.starts_with(['#', '@', '$']) {
            break;
        }
        let (activity, reduced) = match tab.basis().iter().position(|&b| b == i) {
            Some(r) => (tab.row(r)[0].clone(), Rational::zero()),
            None => (Rational::zero(), -tab.row(0)[i].clone()),
        };
        ui.say(&format!(
            "{}{}{}{}{}",
            v,
            s,
            cell(&activity, formula),
            s,
            cell(&reduced, formula)
        ));
    }
}

/// Slack/surplus activity and shadow price per constraint.
pub(crate) fn print_constraints(
    tab: &Tableau,
    sens: &Sensitivity,
    ui: &mut dyn Frontend,
    formula: bool,
) {
    ui.say("Constraint Activities:");
    ui.say("ID\tSlack/Surplus\tShadow Price");
    let s = sep(formula);
    for i in 1..=tab.num_constraints() {
        let col = ["#", "$"]
            .iter()
            .find_map(|prefix| {
                let name = format!("{}{}", prefix, i);
                tab.vars().iter().position(|v| *v == name)
            });
        let activity = col
            .and_then(|col| tab.basis().iter().position(|&b| b == col))
            .map(|r| tab.row(r)[0].clone())
            .unwrap_or_else(Rational::zero);
        let name = row_label(tab, i);
        ui.say(&format!(
            "{}\t{}{}{}",
            name,
            cell(&activity, formula),
            s,
            cell(&sens.shadow[i - 1], formula)
        ));
    }
}

/// Objective-coefficient ranging for every structural column.
pub(crate) fn print_coef_ranges(tab: &Tableau, ui: &mut dyn Frontend, formula: bool) {
    ui.say("Sensitivity on coefficients:");
    ui.say("Variable\tLower Bound\tCoefficient\tUpper Bound");
    let s = sep(formula);
    for (i, v) in tab.vars().iter().enumerate().skip(1) {
        if v.starts_with(['#', '@', '$']) {
            break;
        }
        let (lower, coeff, upper) = tab.coef_range(i);
        ui.say(&format!(
            "{}{}{}{}{}{}{}",
            v,
            s,
            lower.cell(formula),
            s,
            cell(&coeff, formula),
            s,
            upper.cell(formula)
        ));
    }
}

/// RHS ranging per constraint.
pub(crate) fn print_rhs_ranges(
    tab: &Tableau,
    sens: &Sensitivity,
    ui: &mut dyn Frontend,
    formula: bool,
) {
    ui.say("Sensitivity on R.H.S.:");
    ui.say("ID\tLower Bound\tCurrent Value\tUpper Bound");
    let s = sep(formula);
    for i in 0..tab.num_constraints() {
        let name = row_label(tab, i + 1);
        ui.say(&format!(
            "{}\t{}{}{}{}{}",
            name,
            sens.rhs_lower[i].cell(formula),
            s,
            cell(&tab.original_rhs()[i], formula),
            s,
            sens.rhs_upper[i].cell(formula)
        ));
    }
}

fn row_label(tab: &Tableau, i: usize) -> String {
    let name = &tab.row_names()[i];
    if name.is_empty() {
        i.to_string()
    } else {
        name.clone()
    }
}
