//! Tab-separated rendering of the tableau: an iteration tag plus column
//! labels, one row per basic variable, and the σ row.

use std::fmt;

use super::Tableau;

impl Tableau {
    /// Renders the tableau. `mark` stars a row (0 for none), `iteration`
    /// overrides the iteration tag (defaults to the pivot count), `formula`
    /// switches the spreadsheet-recomputable cell form on.
    pub fn render(&self, mark: usize, iteration: Option<usize>, formula: bool) -> String {
        let itn = iteration.unwrap_or(self.hist.len());
        let mut lines: Vec<String> = Vec::new();

        let mut header: Vec<String> = Vec::with_capacity(self.cols + 1);
        header.push(format!("[{}]", itn));
        header.extend(self.vars[..self.cols].iter().cloned());
        lines.push(header.join("\t"));

        for (r, row) in self.rows.iter().enumerate() {
            let mut label = if self.base[r] == 0 {
                "sigma".to_string()
            } else {
                self.vars[self.base[r]].clone()
            };
            if mark != 0 && r == mark {
                label.push('*');
            }
            let mut cells = Vec::with_capacity(self.cols + 1);
            cells.push(label);
            for c in 0..self.cols {
                let cell = row[c].to_string();
                cells.push(if formula { format!("={}", cell) } else { cell });
            }
            lines.push(cells.join("\t"));
        }

        if !formula {
            lines.push(format!(
                "column select: {}, per[t]urbation: {}, [w]olf: {}",
                self.rule.label(),
                self.virtual_perturbation,
                self.flat_wolf
            ));
        }
        lines.join("\n")
    }
}

impl fmt::Display for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(0, None, false))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::Model;
    use crate::Tableau;

    fn tableau() -> Tableau {
        let model =
            Model::parse("max 6x + 4y\nst\n6x + 8y <= 12\n10x + 5y <= 10\nend").unwrap();
        Tableau::new(&model, false)
    }

    #[test]
    fn header_and_row_labels() {
        let tab = tableau();
        let text = tab.render(0, Some(0), false);
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "[0]\t(RHS)\tX\tY\t$1\t$2");
        assert!(lines.next().unwrap().starts_with("sigma\t"));
        assert!(lines.next().unwrap().starts_with("$1\t12\t6\t8"));
        assert!(lines.next().unwrap().starts_with("$2\t10\t10\t5"));
        assert!(text.ends_with("per[t]urbation: false, [w]olf: true"));
    }

    #[test]
    fn formula_mode_prefixes_cells_and_drops_the_status_line() {
        let tab = tableau();
        let text = tab.render(0, Some(0), true);
        assert!(text.contains("\t=12\t=6\t=8"));
        assert!(!text.contains("column select"));
    }

    #[test]
    fn pivot_row_is_starred() {
        let mut tab = tableau();
        tab.pivot(2, 1);
        let text = tab.render(2, None, false);
        assert!(text.lines().nth(3).unwrap().starts_with("X*\t"));
    }
}
