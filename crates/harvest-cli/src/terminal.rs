//! Terminal helpers: OSC 52 clipboard and yes/no prompts.

use std::future::Future;
use std::io::{self, BufRead, IsTerminal, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use harvest_checkout::{CheckoutError, Clipboard};

/// Copies through the terminal emulator with an OSC 52 escape sequence.
///
/// Works over SSH as long as the terminal supports OSC 52.
pub struct TerminalClipboard<W: Write + Send> {
    out: W,
}

impl TerminalClipboard<io::Stdout> {
    /// Clipboard on stdout; unavailable when stdout is not a terminal
    pub fn stdout() -> Option<Self> {
        let out = io::stdout();
        out.is_terminal().then_some(Self { out })
    }
}

#[cfg(test)]
impl<W: Write + Send> TerminalClipboard<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Clipboard for TerminalClipboard<W> {
    fn set_text(&mut self, text: &str) -> harvest_checkout::Result<()> {
        let encoded = STANDARD.encode(text);
        write!(self.out, "\x1b]52;c;{encoded}\x07")
            .and_then(|()| self.out.flush())
            .map_err(|e| CheckoutError::Clipboard(e.to_string()))
    }
}

/// Ask a yes/no question on stderr; anything but `y`/`yes` is no
pub fn confirm(question: &str, input: &mut impl BufRead) -> bool {
    eprint!("{question} [y/N] ");
    let _ = io::stderr().flush();

    let mut answer = String::new();
    if input.read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Run a blocking prompt off the runtime, giving up when `cancel` resolves.
///
/// Returns `None` if cancelled. The prompt thread is left blocked on its
/// read; the runtime is shut down without waiting for it.
pub async fn confirm_or_cancel<P, C>(prompt: P, cancel: C) -> Option<bool>
where
    P: FnOnce() -> bool + Send + 'static,
    C: Future<Output = ()>,
{
    let answer = tokio::task::spawn_blocking(prompt);
    tokio::select! {
        answer = answer => Some(answer.unwrap_or(false)),
        () = cancel => None,
    }
}

/// Whether prompts can be answered
pub fn interactive() -> bool {
    io::stdin().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osc52_sequence() {
        let mut clipboard = TerminalClipboard::new(Vec::new());
        clipboard.set_text("LIC-123").unwrap();

        let written = String::from_utf8(clipboard.into_inner()).unwrap();
        assert_eq!(written, "\x1b]52;c;TElDLTEyMw==\x07");
    }

    #[tokio::test]
    async fn test_answered_prompt() {
        assert_eq!(confirm_or_cancel(|| true, std::future::pending()).await, Some(true));
        assert_eq!(confirm_or_cancel(|| false, std::future::pending()).await, Some(false));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_waiting_prompt() {
        let (answer_tx, answer_rx) = std::sync::mpsc::channel::<bool>();
        let outcome = confirm_or_cancel(move || answer_rx.recv().unwrap_or(false), async {}).await;
        assert_eq!(outcome, None);
        drop(answer_tx);
    }

    #[test]
    fn test_confirm_answers() {
        assert!(confirm("Try again?", &mut "y\n".as_bytes()));
        assert!(confirm("Try again?", &mut " YES \n".as_bytes()));
        assert!(!confirm("Try again?", &mut "n\n".as_bytes()));
        assert!(!confirm("Try again?", &mut "".as_bytes()));
    }
}
