use thiserror::Error;

/// Fatal conditions raised by the simplex engine and its drivers.
///
/// Infeasibility, unboundedness and the iteration cap are *outcomes*, not
/// errors; see [`crate::tableau::Outcome`].
#[derive(Debug, Error)]
pub enum SolverError {
    /// Phase I ended with an artificial variable stuck in a basis row that
    /// has no non-artificial column to pivot in. The row is redundant in a
    /// way the canonical form cannot repair, so the solve is aborted rather
    /// than silently continued.
    #[error("cannot drive artificial variable {0} out of the basis")]
    StuckArtificial(String),

    /// I/O failure while writing a replay file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
