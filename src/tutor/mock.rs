//! Mock tutor responder for local testing without a model backend.
//!
//! Replies come from a fixed table of canned Polish messages.  The incoming
//! message is classified by keyword; within a class, replies are picked
//! round-robin from a single counter shared by every class.  A greeting
//! restarts the counter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rand_core::{OsRng, RngCore};
use tracing::debug;

/// Delay used for entries that do not set their own.
const DEFAULT_DELAY_MS: u64 = 2000;

/// Keyword class of a student message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Greeting,
    MathQuestion,
    HelpRequest,
    Confusion,
    Default,
}

#[derive(Debug, Clone, Copy)]
pub struct MockResponse {
    pub message: &'static str,
    pub delay_ms: Option<u64>,
}

const GREETING: &[MockResponse] = &[MockResponse {
    message: "Cześć! 😊 Jestem Mentavo, Twoim korepetytorem matematyki. W czym mogę Ci dziś pomóc?",
    delay_ms: Some(1500),
}];

const MATH_QUESTION: &[MockResponse] = &[
    MockResponse {
        message: "Świetne pytanie! 🤔 Zanim przejdziemy do rozwiązania, powiedz mi - co już wiesz o tym zagadnieniu?",
        delay_ms: Some(2000),
    },
    MockResponse {
        message: "Rozumiem! Spróbujmy to rozwiązać krok po kroku. Jaki byłby pierwszy krok według Ciebie?",
        delay_ms: Some(2500),
    },
    MockResponse {
        message: "Dokładnie! 👍 Teraz gdy mamy ten krok, co myślisz, że powinniśmy zrobić dalej?",
        delay_ms: Some(2000),
    },
];

const HELP_REQUEST: &[MockResponse] = &[MockResponse {
    message: "Oczywiście, chętnie pomogę! 😊 Zamiast od razu podać odpowiedź, spróbujmy razem. Co przychodzi Ci do głowy, gdy patrzysz na to zadanie?",
    delay_ms: Some(1800),
}];

const CONFUSION: &[MockResponse] = &[MockResponse {
    message: "Widzę, że to może być trudne. Nie martw się! 💪 Spróbujmy uprościć. Czy znasz podstawowy wzór na to zagadnienie?",
    delay_ms: Some(2200),
}];

const DEFAULT: &[MockResponse] = &[
    MockResponse {
        message: "Interesujące podejście! 🤔 Czy możesz mi wyjaśnić, jak doszedłeś do tego wniosku?",
        delay_ms: Some(2000),
    },
    MockResponse {
        message: "Świetnie myślisz! 👍 A co by się stało, gdybyśmy spróbowali to zrobić inaczej?",
        delay_ms: Some(1900),
    },
    MockResponse {
        message: "Dobra robota! 😊 Teraz spróbuj zastosować tę samą logikę do następnego kroku.",
        delay_ms: Some(2100),
    },
];

impl ResponseKind {
    /// Classify a message.  Checks run in priority order; the first match wins.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        let has_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if has_any(&["cześć", "hej", "witaj"]) {
            ResponseKind::Greeting
        } else if has_any(&["pomóż", "pomocy", "nie rozumiem"]) {
            ResponseKind::HelpRequest
        } else if lower.contains('?') && has_any(&["jak", "co", "dlaczego"]) {
            ResponseKind::MathQuestion
        } else if has_any(&["nie wiem", "trudne", "za ciężkie"]) {
            ResponseKind::Confusion
        } else {
            ResponseKind::Default
        }
    }

    pub fn responses(self) -> &'static [MockResponse] {
        match self {
            ResponseKind::Greeting => GREETING,
            ResponseKind::MathQuestion => MATH_QUESTION,
            ResponseKind::HelpRequest => HELP_REQUEST,
            ResponseKind::Confusion => CONFUSION,
            ResponseKind::Default => DEFAULT,
        }
    }
}

/// Round-robin canned responder.  Shared across requests; clone the `Arc`
/// that owns it rather than the struct so the counter stays shared.
#[derive(Debug)]
pub struct MockTutor {
    index: AtomicUsize,
    simulate_delay: bool,
}

impl MockTutor {
    pub fn new(simulate_delay: bool) -> Self {
        Self { index: AtomicUsize::new(0), simulate_delay }
    }

    /// Pick the next canned reply for `message` without waiting.
    pub fn next_response(&self, message: &str) -> MockResponse {
        let kind = ResponseKind::classify(message);
        if kind == ResponseKind::Greeting {
            self.index.store(0, Ordering::SeqCst);
        }
        let responses = kind.responses();
        let i = self.index.fetch_add(1, Ordering::SeqCst);
        let response = responses[i % responses.len()];
        debug!(?kind, index = i, "mock tutor picked response");
        response
    }

    /// Pick a reply and wait for its simulated latency.
    pub async fn respond(&self, message: &str) -> String {
        let response = self.next_response(message);
        if self.simulate_delay {
            let delay = response.delay_ms.unwrap_or(DEFAULT_DELAY_MS);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        response.message.to_string()
    }

    /// Start a new conversation.
    pub fn reset(&self) {
        self.index.store(0, Ordering::SeqCst);
    }

    pub fn index(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }
}

/// How long a "tutor is typing" indicator should show: 1.5–2.5 s.
pub fn typing_delay() -> Duration {
    Duration::from_millis(1500 + u64::from(OsRng.next_u32() % 1000))
}

/// Whether a message likely warrants a longer answer.
pub fn needs_longer_response(message: &str) -> bool {
    message.chars().count() > 100 || message.contains("wyjaśnij") || message.contains("opisz")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_priorities() {
        assert_eq!(ResponseKind::classify("Hej, jak leci?"), ResponseKind::Greeting);
        assert_eq!(ResponseKind::classify("Nie rozumiem tego"), ResponseKind::HelpRequest);
        assert_eq!(ResponseKind::classify("Jak policzyć deltę?"), ResponseKind::MathQuestion);
        assert_eq!(ResponseKind::classify("nie wiem"), ResponseKind::Confusion);
        assert_eq!(ResponseKind::classify("x = 4"), ResponseKind::Default);
    }

    #[test]
    fn question_word_without_mark_is_not_a_question() {
        assert_eq!(ResponseKind::classify("dlaczego tak"), ResponseKind::Default);
    }

    #[test]
    fn round_robin_shares_one_counter() {
        let mock = MockTutor::new(false);
        let a = mock.next_response("x = 1").message;
        let b = mock.next_response("x = 2").message;
        assert_eq!(a, DEFAULT[0].message);
        assert_eq!(b, DEFAULT[1].message);
        // Counter is 2 now; a math question picks MATH_QUESTION[2].
        assert_eq!(mock.next_response("Co dalej?").message, MATH_QUESTION[2].message);
        assert_eq!(mock.next_response("x = 3").message, DEFAULT[0].message);
    }

    #[test]
    fn greeting_resets_counter() {
        let mock = MockTutor::new(false);
        mock.next_response("x");
        mock.next_response("y");
        assert_eq!(mock.next_response("Cześć!").message, GREETING[0].message);
        assert_eq!(mock.index(), 1);
        assert_eq!(mock.next_response("z").message, DEFAULT[1].message);
    }

    #[test]
    fn reset_restarts_from_first_entry() {
        let mock = MockTutor::new(false);
        mock.next_response("a");
        mock.reset();
        assert_eq!(mock.index(), 0);
        assert_eq!(mock.next_response("b").message, DEFAULT[0].message);
    }

    #[tokio::test(start_paused = true)]
    async fn respond_waits_for_entry_delay() {
        let mock = MockTutor::new(true);
        let start = tokio::time::Instant::now();
        let reply = mock.respond("witaj").await;
        assert_eq!(reply, GREETING[0].message);
        assert!(start.elapsed() >= Duration::from_millis(1500));
    }

    #[test]
    fn typing_delay_in_range() {
        for _ in 0..50 {
            let d = typing_delay();
            assert!(d >= Duration::from_millis(1500) && d < Duration::from_millis(2500));
        }
    }

    #[test]
    fn longer_response_heuristic() {
        assert!(needs_longer_response("wyjaśnij mi całki"));
        assert!(needs_longer_response("opisz to"));
        assert!(needs_longer_response(&"a".repeat(101)));
        assert!(!needs_longer_response("ok"));
    }
}
