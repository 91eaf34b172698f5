//! Writes a finished solve to a tab-separated file a spreadsheet can
//! recompute: the model text, every tableau of both phases in formula mode,
//! and the four report tables. The first line puts the text `Infty` in cell
//! B1 so that infinite bounds, emitted as `=B1`, resolve to it.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tracing::info;

use crate::error::SolverError;
use crate::frontend::{Frontend, LineSink};
use crate::tableau::Tableau;

/// Replays `tab`'s finished solve into the file at `path`.
pub fn save_replay(tab: &mut Tableau, path: &Path) -> Result<(), SolverError> {
    let file = File::create(path)?;
    let mut sink = LineSink::new(BufWriter::new(file));
    sink.say("NOTE:\tInfty\tdenotes infinity.");
    sink.say("HINT: You can format numbers as fractions in excel.");
    sink.say(&tab.text().to_string());
    tab.auto_replay(&mut sink)?;
    sink.say("");
    sink.finish()?;
    info!(path = %path.display(), "replay saved");
    Ok(())
}

/// Asks for a file name and saves the replay there (with an `.xls` suffix,
/// which spreadsheet applications open as tab-separated text). An empty
/// answer skips.
pub(crate) fn savework(tab: &mut Tableau, ui: &mut dyn Frontend) {
    let name = ui.ask("Save to file (return to skip):");
    let name = name.trim();
    if name.is_empty() {
        return;
    }
    let path = format!("{}.xls", name);
    match save_replay(tab, Path::new(&path)) {
        Ok(()) => ui.say(&format!("saved to file: {}", path)),
        Err(e) => ui.say(&format!("could not save: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::Quiet;
    use crate::model::Model;
    use crate::tableau::Outcome;

    #[test]
    fn replay_file_has_the_note_header_and_formula_tables() {
        let model = Model::parse(
            "max 6x + 4y\nst\n6x + 8y <= 12\n10x + 5y <= 10\nend",
        )
        .unwrap();
        let mut tab = Tableau::new(&model, false);
        assert_eq!(tab.solve(-1, &mut Quiet).unwrap(), Outcome::Optimal);

        let stamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "linprog_tutor_replay_{}_{}.xls",
            std::process::id(),
            stamp
        ));
        save_replay(&mut tab, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "NOTE:\tInfty\tdenotes infinity.");
        assert!(text.contains("Max 6 X +4 Y"));
        assert!(text.contains("Subject To"));
        // one tableau per recorded pivot plus the initial one
        let tableau_headers = text.matches("\t(RHS)\t").count();
        assert_eq!(tableau_headers, tab.history().len());
        assert!(text.contains("=6/5"));
        assert!(text.contains("Sensitivity on coefficients:"));
        assert!(text.contains("Sensitivity on R.H.S.:"));
    }
}
