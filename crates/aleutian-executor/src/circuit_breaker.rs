// ABOUTME: Count-based circuit breaker: blocks a tool once its cumulative
// ABOUTME: call count reaches a threshold, with a consecutive-fire early-return

/// Tracks how many times in a row the circuit breaker (count-based or
/// semantic-repetition) has fired for whichever tool is currently being
/// processed. Reset whenever the invocation loop moves to a different tool
/// (spec.md §4.4 step 10) — a single running counter, not one per tool,
/// mirroring the source's "consecutive-CB-fire" language.
#[derive(Debug, Default)]
pub struct ConsecutiveFireTracker {
    tool: Option<String>,
    fires: u32,
}

impl ConsecutiveFireTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observes that `tool` is the invocation now being processed, resetting
    /// the counter if it differs from the tool the counter was tracking.
    pub fn note_tool(&mut self, tool: &str) {
        if self.tool.as_deref() != Some(tool) {
            self.tool = Some(tool.to_string());
            self.fires = 0;
        }
    }

    /// Records a circuit-breaker fire for `tool`, returning the new
    /// consecutive count.
    pub fn record_fire(&mut self, tool: &str) -> u32 {
        self.note_tool(tool);
        self.fires += 1;
        self.fires
    }
}

/// Whether `count` (the cumulative number of times `tool` has already run,
/// before this invocation) has reached `threshold`.
pub fn breaker_should_fire(count: usize, threshold: usize) -> bool {
    count >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_accumulate_for_the_same_tool() {
        let mut tracker = ConsecutiveFireTracker::new();
        assert_eq!(tracker.record_fire("find-callers"), 1);
        assert_eq!(tracker.record_fire("find-callers"), 2);
    }

    #[test]
    fn switching_tools_resets_the_counter() {
        let mut tracker = ConsecutiveFireTracker::new();
        tracker.record_fire("find-callers");
        tracker.record_fire("find-callers");
        assert_eq!(tracker.record_fire("find-callees"), 1);
    }

    #[test]
    fn threshold_check() {
        assert!(!breaker_should_fire(1, 2));
        assert!(breaker_should_fire(2, 2));
        assert!(breaker_should_fire(3, 2));
    }
}
