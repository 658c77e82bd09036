//! Clipboard access for the copy action.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard write failed: {0}")]
    Write(String),
}

/// Somewhere to put copied payloads.
pub trait Clipboard {
    fn set_text(&mut self, contents: &str) -> Result<(), ClipboardError>;
}

/// OS clipboard via arboard. Opened on first use and kept open, since some
/// platforms drop the contents when the owning handle goes away.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self { inner: None }
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, contents: &str) -> Result<(), ClipboardError> {
        let clipboard = match self.inner.as_mut() {
            Some(c) => c,
            None => {
                let c = arboard::Clipboard::new()
                    .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
                self.inner.insert(c)
            }
        };
        clipboard
            .set_text(contents.to_string())
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

/// In-process clipboard. Optionally fails every write.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
    pub fail_with: Option<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            contents: None,
            fail_with: Some(reason.into()),
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn set_text(&mut self, contents: &str) -> Result<(), ClipboardError> {
        if let Some(reason) = &self.fail_with {
            return Err(ClipboardError::Write(reason.clone()));
        }
        self.contents = Some(contents.to_string());
        Ok(())
    }
}
