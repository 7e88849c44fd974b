use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of examples required before the dataset step can be completed.
pub const MIN_EXAMPLES: usize = 5;

/// A single input/output pair used to prime the simulated tuned model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    #[serde(rename = "text_input")]
    pub input: String,
    pub output: String,
}

impl TrainingExample {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Built-in seed set: a small sentiment-classification task.
pub fn default_examples() -> Vec<TrainingExample> {
    vec![
        TrainingExample::new("Classify sentiment: I really love this dish.", "Positive"),
        TrainingExample::new("Classify sentiment: The service was terrible.", "Negative"),
        TrainingExample::new(
            "Classify sentiment: The bus arrived 15 minutes late.",
            "Negative",
        ),
        TrainingExample::new(
            "Classify sentiment: The weather is ordinary today.",
            "Neutral",
        ),
        TrainingExample::new(
            "Classify sentiment: The movie was wonderful and moving.",
            "Positive",
        ),
    ]
}

/// Ordered collection of training examples.
///
/// Entries are immutable once appended; the only mutations are `add`,
/// `remove_at` and `reset_to_default`. Duplicates are allowed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExampleSet {
    examples: Vec<TrainingExample>,
}

impl ExampleSet {
    pub fn new() -> Self {
        Self {
            examples: Vec::new(),
        }
    }

    pub fn from_examples(examples: Vec<TrainingExample>) -> Self {
        Self { examples }
    }

    /// Append a pair. Returns `false` (and leaves the set untouched) when
    /// either side is blank after trimming.
    pub fn add(&mut self, input: &str, output: &str) -> bool {
        if input.trim().is_empty() || output.trim().is_empty() {
            return false;
        }

        self.examples.push(TrainingExample::new(input, output));
        debug!(len = self.examples.len(), "Example added");
        true
    }

    /// Remove the example at `index`. Out-of-range indices are ignored.
    pub fn remove_at(&mut self, index: usize) -> Option<TrainingExample> {
        if index >= self.examples.len() {
            return None;
        }

        let removed = self.examples.remove(index);
        debug!(index, len = self.examples.len(), "Example removed");
        Some(removed)
    }

    /// Replace the whole set with the built-in seed examples.
    pub fn reset_to_default(&mut self) {
        self.examples = default_examples();
    }

    /// Replace the whole set (used when importing a dataset file).
    pub fn replace_all(&mut self, examples: Vec<TrainingExample>) {
        self.examples = examples;
    }

    pub fn examples(&self) -> &[TrainingExample] {
        &self.examples
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// How many more examples are needed before the dataset step unlocks.
    pub fn remaining_required(&self) -> usize {
        MIN_EXAMPLES.saturating_sub(self.examples.len())
    }

    pub fn meets_minimum(&self) -> bool {
        self.examples.len() >= MIN_EXAMPLES
    }

    /// First `n` examples, for previews.
    pub fn preview(&self, n: usize) -> &[TrainingExample] {
        &self.examples[..n.min(self.examples.len())]
    }
}

impl Default for ExampleSet {
    /// The application starts with the seed set already loaded.
    fn default() -> Self {
        Self::from_examples(default_examples())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_rejects_blank_fields() {
        let mut set = ExampleSet::new();

        assert!(!set.add("", "out"));
        assert!(!set.add("in", ""));
        assert!(!set.add("   ", "out"));
        assert!(!set.add("in", "\t\n"));
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_add_keeps_original_text() {
        let mut set = ExampleSet::new();
        assert!(set.add("  padded input ", "output"));
        assert_eq!(set.examples()[0].input, "  padded input ");
    }

    #[test]
    fn test_duplicates_allowed() {
        let mut set = ExampleSet::new();
        assert!(set.add("same", "same"));
        assert!(set.add("same", "same"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_length_tracks_net_adds_and_removals() {
        let mut set = ExampleSet::new();
        let mut expected = 0usize;

        for i in 0..12 {
            let input = if i % 4 == 3 { " ".to_string() } else { format!("in {i}") };
            if set.add(&input, "out") {
                expected += 1;
            }
            if i % 3 == 2 && set.remove_at(0).is_some() {
                expected -= 1;
            }
            assert_eq!(set.len(), expected);
        }
    }

    #[test]
    fn test_remove_at_out_of_range_is_noop() {
        let mut set = ExampleSet::default();
        assert!(set.remove_at(5).is_none());
        assert!(set.remove_at(usize::MAX).is_none());
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn test_remove_at_preserves_order() {
        let mut set = ExampleSet::new();
        set.add("a", "1");
        set.add("b", "2");
        set.add("c", "3");

        let removed = set.remove_at(1).expect("index 1 exists");
        assert_eq!(removed.input, "b");
        let inputs: Vec<_> = set.examples().iter().map(|e| e.input.as_str()).collect();
        assert_eq!(inputs, vec!["a", "c"]);
    }

    #[test]
    fn test_gate_for_all_lengths() {
        let mut set = ExampleSet::new();
        for len in 0..10 {
            assert_eq!(set.len(), len);
            assert_eq!(set.meets_minimum(), len >= MIN_EXAMPLES);
            assert_eq!(set.remaining_required(), MIN_EXAMPLES.saturating_sub(len));
            set.add("x", "y");
        }
    }

    #[test]
    fn test_reset_to_default_replaces_everything() {
        let mut set = ExampleSet::new();
        set.add("custom", "pair");
        set.reset_to_default();

        assert_eq!(set.len(), 5);
        assert_eq!(set.examples(), default_examples().as_slice());
    }

    #[test]
    fn test_preview_clamps() {
        let set = ExampleSet::default();
        assert_eq!(set.preview(3).len(), 3);
        assert_eq!(set.preview(50).len(), 5);
        assert!(ExampleSet::new().preview(3).is_empty());
    }
}
