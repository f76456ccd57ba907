//! Clipboard access for copying license keys and order ids.

use crate::error::{CheckoutError, Result};

/// Somewhere text can be copied to
pub trait Clipboard: Send {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// Clipboard that keeps the text in memory
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Option<String>,
    unavailable: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard whose writes always fail
    pub fn unavailable() -> Self {
        Self {
            contents: None,
            unavailable: true,
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl Clipboard for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        if self.unavailable {
            return Err(CheckoutError::Clipboard("clipboard unavailable".into()));
        }
        self.contents = Some(text.to_string());
        Ok(())
    }
}
