//! PTY (console) channel: reads lines from stdin, asks the tutor, prints the
//! reply to stdout.
//!
//! The console is a single conversation for the configured user.  It keeps
//! the history and message count the web client would normally send, so
//! the lesson flags (first contact, calibration reminder) behave the same.
//! `/reset` starts a new conversation.  Runs until the `shutdown` token is
//! cancelled (Ctrl-C) or stdin is closed.
//!
//! With pacing on (`[llm.mock] simulate_delay`), the typing indicator stays
//! up for at least a human-like [`typing_delay`] even when the backend
//! answers instantly.

use std::io::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::llm::{ChatTurn, Role};
use crate::tutor::mock::{needs_longer_response, typing_delay};
use crate::tutor::{TutorRequest, TutorService};

use super::{Channel, ChannelFuture};

const RESET_COMMAND: &str = "/reset";

pub struct PtyChannel {
    channel_id: String,
    user_id: String,
    service: TutorService,
    pace: bool,
}

impl PtyChannel {
    pub fn new(
        channel_id: impl Into<String>,
        user_id: impl Into<String>,
        service: TutorService,
        pace: bool,
    ) -> Self {
        Self { channel_id: channel_id.into(), user_id: user_id.into(), service, pace }
    }
}

impl Channel for PtyChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ChannelFuture {
        let session = ConsoleSession::new(self.user_id, self.service, self.pace);
        Box::pin(run_pty(self.channel_id, session, shutdown))
    }
}

/// Conversation state of the console user.
pub struct ConsoleSession {
    user_id: String,
    service: TutorService,
    history: Vec<ChatTurn>,
    message_count: u32,
    pace: bool,
}

impl ConsoleSession {
    pub fn new(user_id: impl Into<String>, service: TutorService, pace: bool) -> Self {
        Self { user_id: user_id.into(), service, history: Vec::new(), message_count: 0, pace }
    }

    pub fn message_count(&self) -> u32 {
        self.message_count
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.message_count = 0;
        self.service.reset_conversation();
    }

    /// Send one student line and record both sides in the history.
    pub async fn send(&mut self, message: &str) -> Result<String, AppError> {
        let req = TutorRequest {
            user_id: self.user_id.clone(),
            message: message.to_string(),
            message_count: self.message_count,
            history: self.history.clone(),
            ..TutorRequest::default()
        };
        let reply = self.service.reply(req).await?;

        self.history.push(ChatTurn { role: Role::User, content: message.to_string() });
        self.history.push(ChatTurn { role: Role::Assistant, content: reply.reply.clone() });
        self.message_count += 1;
        Ok(reply.reply)
    }

    /// [`send`](Self::send), held for at least [`typing_delay`] when pacing.
    pub async fn send_paced(&mut self, message: &str) -> Result<String, AppError> {
        if !self.pace {
            return self.send(message).await;
        }
        let pause = typing_delay();
        let (result, ()) = tokio::join!(self.send(message), tokio::time::sleep(pause));
        result
    }
}

/// Indicator line shown while the tutor works on `message`.
pub fn typing_indicator(tutor_name: &str, message: &str) -> String {
    if needs_longer_response(message) {
        format!("{tutor_name} pisze dłuższą odpowiedź…")
    } else {
        format!("{tutor_name} pisze…")
    }
}

async fn run_pty(
    channel_id: String,
    mut session: ConsoleSession,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let tutor_name = session.service.tutor_name().to_string();
    info!(%channel_id, user_id = %session.user_id, "pty channel started");
    println!("─────────────────────────────────");
    println!(" {tutor_name}  (/reset = nowa rozmowa, Ctrl-C = koniec)");
    println!("─────────────────────────────────");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                println!();
                info!(%channel_id, "pty channel shutting down");
                break;
            }

            line = lines.next_line() => {
                let input = match line {
                    Err(e) => {
                        warn!(%channel_id, "pty read error: {e}");
                        break;
                    }
                    Ok(None) => {
                        info!(%channel_id, "pty stdin closed");
                        break;
                    }
                    Ok(Some(input)) => input,
                };
                let input = input.trim();
                if input.is_empty() {
                    continue;
                }
                if input == RESET_COMMAND {
                    session.reset();
                    println!("[nowa rozmowa]");
                    continue;
                }

                debug!(%channel_id, len = input.len(), "pty received line");
                println!("{}", typing_indicator(&tutor_name, input));

                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!(%channel_id, "pty channel shutting down mid-request");
                        break;
                    }
                    result = session.send_paced(input) => match result {
                        Ok(reply) => println!("{reply}\n"),
                        Err(e) => {
                            warn!(%channel_id, error = %e, "tutor request failed");
                            println!("[błąd] {e}\n");
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::llm::LlmProvider;
    use crate::llm::providers::dummy::DummyProvider;
    use crate::store::{JsonStore, StoreHandle};
    use crate::tutor::{ContextBuilder, ContextSettings, PromptStyle, TutorSettings};

    fn session() -> (TempDir, ConsoleSession) {
        let dir = TempDir::new().unwrap();
        let store = StoreHandle::new(Arc::new(JsonStore::open(dir.path()).unwrap()));
        let service = TutorService::new(
            LlmProvider::Dummy(DummyProvider),
            ContextBuilder::new(store.clone(), ContextSettings::default()),
            store,
            TutorSettings {
                tutor_name: "Mentavo".into(),
                prompt_style: PromptStyle::Gadie,
                calibration_interval: 8,
            },
        );
        (dir, ConsoleSession::new("console", service, false))
    }

    #[tokio::test]
    async fn history_and_count_grow_per_message() {
        let (_d, mut s) = session();
        assert_eq!(s.send("2x = 4").await.unwrap(), "[echo] 2x = 4");
        s.send("x = 2").await.unwrap();
        assert_eq!(s.message_count(), 2);
        assert_eq!(s.history.len(), 4);
        assert_eq!(s.history[1].role, Role::Assistant);
        assert_eq!(s.history[2].content, "x = 2");
    }

    #[tokio::test]
    async fn failed_request_leaves_state_untouched() {
        let (_d, mut s) = session();
        assert!(s.send("   ").await.is_err());
        assert_eq!(s.message_count(), 0);
        assert!(s.history.is_empty());
    }

    #[test]
    fn indicator_announces_longer_answers() {
        assert_eq!(typing_indicator("Mentavo", "x = 2"), "Mentavo pisze…");
        assert_eq!(
            typing_indicator("Mentavo", "wyjaśnij mi deltę"),
            "Mentavo pisze dłuższą odpowiedź…"
        );
        assert_eq!(typing_indicator("Mentavo", &"a".repeat(101)), "Mentavo pisze dłuższą odpowiedź…");
    }

    #[tokio::test(start_paused = true)]
    async fn paced_send_holds_for_typing_delay() {
        let (_d, s) = session();
        let mut s = ConsoleSession { pace: true, ..s };
        let start = tokio::time::Instant::now();
        assert_eq!(s.send_paced("x = 2").await.unwrap(), "[echo] x = 2");
        assert!(start.elapsed() >= std::time::Duration::from_millis(1500));
        assert_eq!(s.message_count(), 1);
    }

    #[tokio::test]
    async fn unpaced_send_returns_immediately() {
        let (_d, mut s) = session();
        let start = std::time::Instant::now();
        s.send_paced("x = 2").await.unwrap();
        assert!(start.elapsed() < std::time::Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn reset_clears_conversation() {
        let (_d, mut s) = session();
        s.send("hej").await.unwrap();
        s.reset();
        assert_eq!(s.message_count(), 0);
        assert!(s.history.is_empty());
    }
}
