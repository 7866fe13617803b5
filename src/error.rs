//! Error handling for surface and context operations.

use std::fmt;

/// A specialized [`Result`] type for rendering-surface operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for all surface, format, and context operations.
#[derive(Debug, Clone)]
pub struct Error {
    /// The raw code of the underlying error.
    raw_code: Option<i64>,

    /// The raw message from the os in case it could be obtained.
    raw_os_message: Option<String>,

    /// The simplified error kind to handle matching.
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(
        raw_code: Option<i64>,
        raw_os_message: Option<String>,
        kind: ErrorKind,
    ) -> Self {
        Self { raw_code, raw_os_message, kind }
    }

    pub(crate) fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(None, Some(message.into()), kind)
    }

    /// Helper to check that error is [`ErrorKind::NotSupported`].
    #[inline]
    pub fn not_supported(&self) -> bool {
        matches!(&self.kind, ErrorKind::NotSupported(_))
    }

    /// The underlying error kind.
    #[inline]
    pub fn error_kind(&self) -> ErrorKind {
        self.kind
    }

    /// The underlying raw code in case it's present.
    #[inline]
    pub fn raw_code(&self) -> Option<i64> {
        self.raw_code
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(raw_code) = self.raw_code {
            write!(f, "[{raw_code:x}] ")?;
        }

        let msg = if let Some(raw_os_message) = self.raw_os_message.as_ref() {
            raw_os_message
        } else {
            self.kind.as_str()
        };

        write!(f, "{msg}")
    }
}

impl std::error::Error for Error {}

/// Build an error with just a kind.
impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error { raw_code: None, raw_os_message: None, kind }
    }
}

/// A list specifying general categories of failures in the native graphics
/// platform interface.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested display wasn't found or some required symbol in it was
    /// missing.
    NotFound,

    /// Failed to perform resource initialization.
    InitializationFailed,

    /// The requested capabilities are contradictory.
    ///
    /// For example a pixel buffer was requested together with color-index
    /// rendering, or both sharing directives were given at once.
    BadCapabilities,

    /// No native format matched the requested capabilities.
    NoMatchingFormat,

    /// Context creation failed or an operation was given a dead context.
    BadContext,

    /// Invalid config was passed, or the config query failed.
    BadConfig,

    /// The surface is invalid or could not be created.
    BadSurface,

    /// The pbuffer could not be allocated.
    BadPbuffer,

    /// The widget named in a sharing directive does not exist.
    BadShareTarget,

    /// The display is no longer valid.
    BadDisplay,

    /// Bad native window was provided.
    BadNativeWindow,

    /// The widget is in the failed-window state and cannot draw.
    BadWindow,

    /// The operation is not supported by the platform.
    NotSupported(&'static str),

    /// The misc error that can't be classified occurred.
    Misc,
}

impl ErrorKind {
    pub(crate) fn as_str(&self) -> &'static str {
        use ErrorKind::*;
        match *self {
            NotFound => "not found",
            InitializationFailed => "initialization failed",
            BadCapabilities => "the requested capabilities are contradictory",
            NoMatchingFormat => "couldn't choose pixel format",
            BadContext => "failed to create GL rendering context",
            BadConfig => "argument does not name a valid config",
            BadSurface => "argument does not name a valid surface",
            BadPbuffer => "unable to allocate pbuffer",
            BadShareTarget => "invalid widget specified in a sharing option",
            BadDisplay => "argument does not name a valid display",
            BadNativeWindow => "argument does not refer to a valid native window",
            BadWindow => "the widget window is in the failed state",
            NotSupported(reason) => reason,
            Misc => "misc platform error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
