use std::time::Duration;

use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use crate::registry::OutputLanguage;
use crate::session::local_now;

const BASE_STEP_DELAY: Duration = Duration::from_millis(500);
const STEP_DELAY_INCREMENT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinkingStep {
    pub text: String,
    pub delay: Duration,
}

impl ThinkingStep {
    fn new(text: String) -> Self {
        let delay = step_delay(&text);
        Self { text, delay }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThinkingOutcome {
    Completed,
    Cancelled,
}

/// Cosmetic progress steps shown while a reply is being generated. The
/// sequence never blocks the model call: callers run it next to the call and
/// cancel it once the call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinkingSequence {
    steps: Vec<ThinkingStep>,
}

impl ThinkingSequence {
    pub fn for_language(language: OutputLanguage) -> Self {
        let steps = [
            "Analyzing the problem...".to_string(),
            format!("Considering best practices for {language}..."),
            "Evaluating potential solutions...".to_string(),
            "Checking for edge cases...".to_string(),
            "Optimizing for readability and performance...".to_string(),
            "Formulating explanation and examples...".to_string(),
        ];
        Self {
            steps: steps.into_iter().map(ThinkingStep::new).collect(),
        }
    }

    pub fn steps(&self) -> &[ThinkingStep] {
        &self.steps
    }

    pub fn total_delay(&self) -> Duration {
        self.steps.iter().map(|step| step.delay).sum()
    }

    /// Shows each step and waits its delay, stopping as soon as `cancel`
    /// fires.
    pub async fn run<F>(&self, cancel: &CancellationToken, mut on_step: F) -> ThinkingOutcome
    where
        F: FnMut(&ThinkingStep, OffsetDateTime),
    {
        for step in &self.steps {
            if cancel.is_cancelled() {
                return ThinkingOutcome::Cancelled;
            }
            on_step(step, local_now());

            tokio::select! {
                _ = cancel.cancelled() => return ThinkingOutcome::Cancelled,
                _ = tokio::time::sleep(step.delay) => {}
            }
        }
        ThinkingOutcome::Completed
    }
}

/// `500ms + (checksum % 7) * 100ms`, where the checksum is the byte sum of
/// the step text. Stable across runs, unlike a seeded hash.
pub fn step_delay(text: &str) -> Duration {
    let checksum = text.bytes().map(u32::from).sum::<u32>();
    BASE_STEP_DELAY + STEP_DELAY_INCREMENT * (checksum % 7)
}

#[cfg(test)]
mod tests {
    use super::{ThinkingOutcome, ThinkingSequence, step_delay};
    use crate::registry::OutputLanguage;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn sequence_mentions_selected_language() {
        let sequence = ThinkingSequence::for_language(OutputLanguage::Rust);
        let texts = sequence
            .steps()
            .iter()
            .map(|step| step.text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(texts.len(), 6);
        assert_eq!(texts[0], "Analyzing the problem...");
        assert_eq!(texts[1], "Considering best practices for Rust...");
        assert_eq!(texts[5], "Formulating explanation and examples...");
    }

    #[test]
    fn step_delay_stays_within_bounds_and_is_deterministic() {
        for text in ["", "a", "Checking for edge cases...", "Considering best practices for C#..."] {
            let delay = step_delay(text);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1100));
            assert_eq!(delay, step_delay(text));
        }
        // 'a' is 97, 97 % 7 == 6
        assert_eq!(step_delay("a"), Duration::from_millis(1100));
        assert_eq!(step_delay(""), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn run_completes_all_steps_when_not_cancelled() {
        let sequence = ThinkingSequence::for_language(OutputLanguage::Go);
        let cancel = CancellationToken::new();
        let mut seen = Vec::new();

        let outcome = sequence
            .run(&cancel, |step, _at| seen.push(step.text.clone()))
            .await;

        assert_eq!(outcome, ThinkingOutcome::Completed);
        assert_eq!(seen.len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_when_cancelled_mid_sequence() {
        let sequence = ThinkingSequence::for_language(OutputLanguage::Python);
        let cancel = CancellationToken::new();
        let mut seen = 0;

        let canceller = {
            let cancel = cancel.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                cancel.cancel();
            }
        };
        let (outcome, ()) = tokio::join!(sequence.run(&cancel, |_, _| seen += 1), canceller);

        assert_eq!(outcome, ThinkingOutcome::Cancelled);
        assert_eq!(seen, 1);
    }

    #[tokio::test]
    async fn run_with_cancelled_token_shows_nothing() {
        let sequence = ThinkingSequence::for_language(OutputLanguage::Java);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut seen = 0;
        let outcome = sequence.run(&cancel, |_, _| seen += 1).await;
        assert_eq!(outcome, ThinkingOutcome::Cancelled);
        assert_eq!(seen, 0);
    }
}
