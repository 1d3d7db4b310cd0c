//! Progress events published while a run is active.

/// Snapshot after one completion: display name of the source that just
/// finished, completed count and batch size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckProgress {
    pub name: String,
    pub checked: usize,
    pub total: usize,
}

impl CheckProgress {
    /// Operator-facing line, e.g. `Example (3/10)`.
    pub fn message(&self) -> String {
        if self.name.is_empty() {
            format!("({}/{})", self.checked, self.total)
        } else {
            format!("{} ({}/{})", self.name, self.checked, self.total)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckEvent {
    Progress(CheckProgress),
    /// A run was requested while another was still in progress.
    Rejected,
    /// The run ended (completed or stopped); progress is back to zero.
    Done,
}
