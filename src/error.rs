// A tiny error type so we don't rely on anyhow/thiserror.
// Every variant states *where* things went wrong.
use std::fmt::{self, Display};

#[derive(Debug)]
pub enum Error {
    WindowInit(String),   // Creating the window failed
    WindowUpdate(String), // Updating the window buffer failed
    SourceInit(String),   // Opening a frame source failed
    SourceFrame(String),  // Grabbing/decoding a frame failed
    Config(String),       // The pieces were wired together inconsistently
}

impl Display for Error {
    // This decides how the error is printed to your console.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::WindowInit(s) => write!(f, "Window init error: {s}"),
            Error::WindowUpdate(s) => write!(f, "Window update error: {s}"),
            Error::SourceInit(s) => write!(f, "Source init error: {s}"),
            Error::SourceFrame(s) => write!(f, "Source frame error: {s}"),
            Error::Config(s) => write!(f, "Config error: {s}"),
        }
    }
}

// We don't implement std::error::Error for now to keep things minimal.
// It's easy to add later when we wire in more components.
