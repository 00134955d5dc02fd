use std::fmt;

/// Errors raised at the JSON boundary of a map
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// Malformed or mistyped input while decoding
    Decode {
        context: String,
        line: usize,
        column: usize,
    },
    /// Failure while encoding
    Encode {
        context: String,
    },
}

impl MapError {
    /// Create a decode error without position information
    pub fn decode(context: impl Into<String>) -> Self {
        MapError::Decode {
            context: context.into(),
            line: 0,
            column: 0,
        }
    }

    pub fn encode(context: impl Into<String>) -> Self {
        MapError::Encode {
            context: context.into(),
        }
    }

    pub fn context(&self) -> &str {
        match self {
            MapError::Decode { context, .. } => context,
            MapError::Encode { context } => context,
        }
    }
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Decode { context, line: 0, .. } => {
                write!(f, "Decode error: {}", context)
            }
            MapError::Decode { context, line, column } => {
                write!(f, "Decode error at line {} column {}: {}", line, column, context)
            }
            MapError::Encode { context } => {
                write!(f, "Encode error: {}", context)
            }
        }
    }
}

impl std::error::Error for MapError {}

// serde_json does not tell encode and decode errors apart, so encoders map
// their errors explicitly with `MapError::encode`.
impl From<serde_json::Error> for MapError {
    fn from(error: serde_json::Error) -> Self {
        MapError::Decode {
            context: error.to_string(),
            line: error.line(),
            column: error.column(),
        }
    }
}

/// Result type alias for map operations that can fail
pub type MapResult<T> = Result<T, MapError>;

/// Extension trait for attaching context to errors
pub trait ResultExt<T> {
    /// Replace the error context, keeping its kind and position
    fn context(self, context: impl Into<String>) -> MapResult<T>;

    /// Like `context`, but only builds the message on error
    fn map_err_context<F>(self, f: F) -> MapResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<MapError>,
{
    fn context(self, context: impl Into<String>) -> MapResult<T> {
        self.map_err_context(|| context.into())
    }

    fn map_err_context<F>(self, f: F) -> MapResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let mut err = e.into();
            let context = f();
            match &mut err {
                MapError::Decode { context: ctx, .. } => *ctx = format!("{}: {}", context, ctx),
                MapError::Encode { context: ctx } => *ctx = format!("{}: {}", context, ctx),
            }
            err
        })
    }
}
