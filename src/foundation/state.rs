use std::fmt;

/// Lifecycle of a step-driven machine (virtual machine or renderer).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MachineStatus {
    Ready,
    Finished,
    /// A step failed; the machine refuses further steps.
    Faulted,
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ready => "ready",
            Self::Finished => "finished",
            Self::Faulted => "faulted",
        })
    }
}

/// Result of advancing a machine by one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepResult {
    Running,
    Finished,
}
