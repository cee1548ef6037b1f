use std::fmt;

/// What went wrong, grouped by the part of the kiosk that raised it. Most
/// callers only log these; `kioskd check` exits non-zero on them, and the
/// playback path tells a missing media file apart from a renderer that
/// could not be started.
#[derive(Debug)]
pub enum Error {
    /// Configuration unreadable, unparsable, or out of range.
    Config(String),
    /// A media path that does not exist or cannot be used.
    Media(String),
    /// A renderer process that failed to spawn or be controlled.
    Renderer(String),
    /// A button line that could not be sampled.
    Input(String),
}

impl Error {
    pub fn config<M: Into<String>>(msg: M) -> Self {
        Self::Config(msg.into())
    }

    pub fn media<M: Into<String>>(msg: M) -> Self {
        Self::Media(msg.into())
    }

    pub fn renderer<M: Into<String>>(msg: M) -> Self {
        Self::Renderer(msg.into())
    }

    pub fn input<M: Into<String>>(msg: M) -> Self {
        Self::Input(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Media(msg) => write!(f, "media: {msg}"),
            Self::Renderer(msg) => write!(f, "renderer: {msg}"),
            Self::Input(msg) => write!(f, "input: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
