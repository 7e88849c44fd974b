use tracing::debug;

/// The five screens of the walkthrough, in their fixed order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    Introduction,
    Dataset,
    Parameters,
    Training,
    Playground,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Introduction,
        WizardStep::Dataset,
        WizardStep::Parameters,
        WizardStep::Training,
        WizardStep::Playground,
    ];

    /// Transition table: the canonical successor of each step.
    /// `Playground` is terminal.
    pub fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::Introduction => Some(WizardStep::Dataset),
            WizardStep::Dataset => Some(WizardStep::Parameters),
            WizardStep::Parameters => Some(WizardStep::Training),
            WizardStep::Training => Some(WizardStep::Playground),
            WizardStep::Playground => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            WizardStep::Introduction => 0,
            WizardStep::Dataset => 1,
            WizardStep::Parameters => 2,
            WizardStep::Training => 3,
            WizardStep::Playground => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<WizardStep> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardStep::Introduction => "Introduction",
            WizardStep::Dataset => "Dataset",
            WizardStep::Parameters => "Parameters",
            WizardStep::Training => "Training",
            WizardStep::Playground => "Playground",
        }
    }
}

/// Linear five-step flow with a completed-set unlock rule.
///
/// Forward progress only happens through [`Wizard::complete`]; free
/// navigation is limited to completed steps plus the current one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wizard {
    current: WizardStep,
    // Insertion order is kept for display only; membership is what matters.
    completed: Vec<WizardStep>,
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            current: WizardStep::Introduction,
            completed: Vec::new(),
        }
    }

    pub fn current(&self) -> WizardStep {
        self.current
    }

    pub fn completed(&self) -> &[WizardStep] {
        &self.completed
    }

    pub fn is_completed(&self, step: WizardStep) -> bool {
        self.completed.contains(&step)
    }

    /// Whether `step` may be navigated to right now.
    pub fn is_unlocked(&self, step: WizardStep) -> bool {
        step == self.current || self.is_completed(step)
    }

    /// Mark `step` completed (idempotent) and move to `next`.
    ///
    /// The successor is not checked here; callers pass their own fixed
    /// successor, or use [`Wizard::complete_current`].
    pub fn complete(&mut self, step: WizardStep, next: WizardStep) {
        if !self.is_completed(step) {
            self.completed.push(step);
        }
        debug!(?step, ?next, "Wizard step completed");
        self.current = next;
    }

    /// Complete the current step and advance along the transition table.
    /// Returns the new step, or `None` when the current step is terminal.
    pub fn complete_current(&mut self) -> Option<WizardStep> {
        let step = self.current;
        let next = step.next()?;
        self.complete(step, next);
        Some(next)
    }

    /// Jump to an unlocked step. Locked targets are silently ignored.
    pub fn navigate_to(&mut self, step: WizardStep) -> bool {
        if !self.is_unlocked(step) {
            debug!(?step, current = ?self.current, "Navigation to locked step ignored");
            return false;
        }
        self.current = step;
        true
    }

    pub fn restart(&mut self) {
        self.current = WizardStep::Introduction;
        self.completed.clear();
    }
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}
