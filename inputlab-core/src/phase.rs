use serde::{Deserialize, Serialize};

/// Lifecycle shared by every diagnostic test.
#[derive(Copy, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestPhase {
    #[default]
    Idle,
    Running,
    Finished,
}

impl TestPhase {
    pub fn allows_input(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Phase reached by the start/stop toggle. A finished test starts over.
    pub fn next(&self) -> Self {
        use TestPhase::*;
        match self {
            Idle => Running,
            Running => Finished,
            Finished => Running,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_cycles_through_running() {
        let p = TestPhase::default();
        assert!(p.is_idle());
        assert_eq!(p.next(), TestPhase::Running);
        assert_eq!(p.next().next(), TestPhase::Finished);
        assert_eq!(p.next().next().next(), TestPhase::Running);
        assert!(TestPhase::Running.allows_input());
        assert!(!TestPhase::Finished.allows_input());
    }
}
