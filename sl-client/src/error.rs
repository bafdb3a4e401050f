//! Error types and result definitions for semantic layer operations.
//!
//! Every failure that crosses the client boundary is an [`SlError`] classified by an
//! [`ErrorKind`]. Errors capture their callsite and a backtrace, may carry a dynamic detail
//! and an originating source error, and can be enriched with query diagnostics (query id,
//! last observed status, exceeded timeout, elapsed time) that are rendered by [`fmt::Display`].
//! Several errors can be aggregated into one, which is how failed concurrent page fetches are
//! reported.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{QueryId, QueryStatus};
use crate::transport::{ColumnarStatusCode, ColumnarTransportError};

/// Convenient result type for semantic layer operations using [`SlError`] as the error type.
pub type SlResult<T> = Result<T, SlError>;

/// Query diagnostics attached to an error.
#[derive(Debug, Clone, Default, PartialEq)]
struct QueryContext {
    query_id: Option<QueryId>,
    last_status: Option<QueryStatus>,
    timeout: Option<Duration>,
    elapsed: Option<Duration>,
}

impl QueryContext {
    fn is_empty(&self) -> bool {
        self == &QueryContext::default()
    }
}

/// Detailed payload stored for single [`SlError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    context: QueryContext,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type for semantic layer operations.
#[derive(Debug, Clone)]
pub struct SlError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    Single(Box<ErrorPayload>),
    /// Multiple aggregated errors, for example one per failed page fetch.
    Many {
        errors: Vec<SlError>,
        location: &'static Location<'static>,
    },
}

/// Specific categories of errors that can occur while talking to the semantic layer.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Caller Errors
    InvalidQuery,
    Session,
    UnsupportedOperation,

    // Timeout Errors
    ConnectTimeout,
    ExecuteTimeout,
    RetryTimeout,

    // Remote Errors
    Auth,
    QueryFailed,
    Transport,

    // Result Errors
    SchemaMismatch,
    Decode,
    InvalidData,

    // IO & Serialization Errors
    IoError,
    SerializationError,
    DeserializationError,

    ConfigError,

    // Unknown / Uncategorized
    Unknown,
}

impl ErrorKind {
    /// Returns `true` for the kinds that specialize the timeout category.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ErrorKind::ConnectTimeout | ErrorKind::ExecuteTimeout | ErrorKind::RetryTimeout
        )
    }
}

impl SlError {
    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For multiple errors, returns the kind of the first error or [`ErrorKind::Unknown`]
    /// if the error list is empty.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns all [`ErrorKind`]s present in this error.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::Single(ref payload) => vec![payload.kind],
            ErrorRepr::Many { ref errors, .. } => {
                errors.iter().flat_map(|err| err.kinds()).collect()
            }
        }
    }

    /// Returns the static description, or [`None`] for aggregated errors.
    pub fn description(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => Some(payload.description.as_ref()),
            ErrorRepr::Many { .. } => None,
        }
    }

    /// Returns the detailed error information if available.
    ///
    /// For multiple errors, returns the detail of the first error that has one.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.detail()),
        }
    }

    /// Returns the id of the query this error relates to, if known.
    pub fn query_id(&self) -> Option<&QueryId> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.context.query_id.as_ref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.query_id()),
        }
    }

    /// Returns the last query status observed before the error, if any.
    pub fn last_status(&self) -> Option<QueryStatus> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.context.last_status,
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.last_status()),
        }
    }

    /// Returns the budget that was exceeded, for timeout errors.
    pub fn timeout(&self) -> Option<Duration> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.context.timeout,
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.timeout()),
        }
    }

    /// Returns the time spent before giving up, for timeout errors.
    pub fn elapsed(&self) -> Option<Duration> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.context.elapsed,
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.elapsed()),
        }
    }

    /// Returns the aggregated errors, or an empty slice for single errors.
    pub fn errors(&self) -> &[SlError] {
        match self.repr {
            ErrorRepr::Single(_) => &[],
            ErrorRepr::Many { ref errors, .. } => errors,
        }
    }

    /// Returns the captured backtrace for this error.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self.repr {
            ErrorRepr::Single(ref payload) => Some(payload.backtrace.as_ref()),
            ErrorRepr::Many { .. } => None,
        }
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.location,
            ErrorRepr::Many { location, .. } => location,
        }
    }

    /// Attaches an originating [`error::Error`] to this error and returns the modified instance.
    ///
    /// Has no effect on aggregated errors, which forward their first error as source.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }
        self
    }

    /// Attaches the id of the query this error relates to.
    pub fn with_query_id(mut self, query_id: QueryId) -> Self {
        if let Some(context) = self.context_mut() {
            context.query_id = Some(query_id);
        }
        self
    }

    /// Attaches the last observed query status.
    pub fn with_last_status(mut self, status: QueryStatus) -> Self {
        if let Some(context) = self.context_mut() {
            context.last_status = Some(status);
        }
        self
    }

    /// Attaches the budget that was exceeded.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if let Some(context) = self.context_mut() {
            context.timeout = Some(timeout);
        }
        self
    }

    /// Attaches the time spent before giving up.
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        if let Some(context) = self.context_mut() {
            context.elapsed = Some(elapsed);
        }
        self
    }

    fn context_mut(&mut self) -> Option<&mut QueryContext> {
        match self.repr {
            ErrorRepr::Single(ref mut payload) => Some(&mut payload.context),
            ErrorRepr::Many { .. } => None,
        }
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        SlError {
            repr: ErrorRepr::Single(Box::new(ErrorPayload {
                kind,
                description,
                detail,
                context: QueryContext::default(),
                source,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            })),
        }
    }
}

impl PartialEq for SlError {
    fn eq(&self, other: &SlError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (ErrorRepr::Many { errors: a, .. }, ErrorRepr::Many { errors: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Hash for SlError {
    /// Hashes only the kind and static description so that repeated occurrences of the
    /// same failure group together regardless of location, detail or query context.
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.repr).hash(state);
        match &self.repr {
            ErrorRepr::Single(payload) => {
                payload.kind.hash(state);
                payload.description.hash(state);
            }
            ErrorRepr::Many { errors, .. } => {
                errors.len().hash(state);
                for error in errors {
                    error.hash(state);
                }
            }
        }
    }
}

impl fmt::Display for SlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                let location = payload.location;
                write!(
                    f,
                    "[{:?}] {} @ {}:{}:{}",
                    payload.kind,
                    payload.description,
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                write_context(&payload.context, f, 1)?;
                write_detail(payload.detail.as_deref(), f, 1)?;
                write_backtrace(payload.backtrace.as_ref(), f, 1)?;

                Ok(())
            }
            ErrorRepr::Many { errors, location } => {
                let count = errors.len();
                write!(
                    f,
                    "[Many] {} error{} aggregated @ {}:{}:{}",
                    count,
                    if count == 1 { "" } else { "s" },
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                if errors.is_empty() {
                    write!(f, "\n  (no inner errors provided)")?;
                }

                for (index, error) in errors.iter().enumerate() {
                    let rendered = format!("{error}");
                    let mut lines = rendered.lines();
                    match lines.next() {
                        Some(first_line) => write!(f, "\n  {}. {}", index + 1, first_line)?,
                        None => write!(f, "\n  {}.", index + 1)?,
                    }

                    for line in lines {
                        if line.is_empty() {
                            write!(f, "\n     ")?;
                        } else {
                            write!(f, "\n     {line}")?;
                        }
                    }
                }

                Ok(())
            }
        }
    }
}

impl error::Error for SlError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source as &(dyn error::Error + 'static)),
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

/// Writes the query diagnostics, one per line.
fn write_context(context: &QueryContext, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
    if context.is_empty() {
        return Ok(());
    }

    let indent_str = "  ".repeat(indent);
    if let Some(query_id) = &context.query_id {
        write!(f, "\n{indent_str}Query id: {query_id}")?;
    }
    if let Some(status) = context.last_status {
        write!(f, "\n{indent_str}Last status: {status}")?;
    }
    if let Some(timeout) = context.timeout {
        write!(f, "\n{indent_str}Timeout: {}ms", timeout.as_millis())?;
    }
    if let Some(elapsed) = context.elapsed {
        write!(f, "\n{indent_str}Elapsed: {}ms", elapsed.as_millis())?;
    }

    Ok(())
}

/// Writes the captured backtrace with indentation.
fn write_backtrace(
    backtrace: &Backtrace,
    f: &mut fmt::Formatter<'_>,
    indent: usize,
) -> fmt::Result {
    let indent_str = "  ".repeat(indent);

    let rendered_backtrace = format!("{backtrace}");
    if !rendered_backtrace.trim().is_empty() {
        write!(f, "\n{indent_str}Backtrace:")?;
        for line in rendered_backtrace.lines() {
            if line.trim().is_empty() {
                write!(f, "\n{indent_str}  ")?;
            } else {
                write!(f, "\n{indent_str}  {line}")?;
            }
        }
    }

    Ok(())
}

/// Writes the detail block with indentation.
fn write_detail(detail: Option<&str>, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
    let Some(detail) = detail else {
        return Ok(());
    };

    let indent_str = "  ".repeat(indent);
    if detail.trim().is_empty() {
        return write!(f, "\n{indent_str}Detail: <empty>");
    }

    write!(f, "\n{indent_str}Detail:")?;
    for line in detail.lines() {
        if line.trim().is_empty() {
            write!(f, "\n{indent_str}  ")?;
        } else {
            write!(f, "\n{indent_str}  {line}")?;
        }
    }

    Ok(())
}

/// Creates an [`SlError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for SlError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> SlError {
        SlError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates an [`SlError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for SlError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> SlError {
        SlError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Creates an [`SlError`] from a vector of errors for aggregation.
///
/// A vector holding exactly one error yields that error unchanged.
impl<E> From<Vec<E>> for SlError
where
    E: Into<SlError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> SlError {
        let location = Location::caller();

        let mut errors: Vec<SlError> = errors.into_iter().map(Into::into).collect();
        if errors.len() == 1 {
            if let Some(error) = errors.pop() {
                return error;
            }
        }

        SlError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}

/// Converts [`std::io::Error`] to [`SlError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for SlError {
    #[track_caller]
    fn from(err: std::io::Error) -> SlError {
        let detail = err.to_string();
        SlError::from_components(
            ErrorKind::IoError,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`serde_json::Error`] to [`SlError`] with the appropriate error kind.
impl From<serde_json::Error> for SlError {
    #[track_caller]
    fn from(err: serde_json::Error) -> SlError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => (ErrorKind::IoError, "JSON I/O operation failed"),
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
        };

        let detail = err.to_string();
        SlError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`base64::DecodeError`] to [`SlError`] with [`ErrorKind::Decode`].
impl From<base64::DecodeError> for SlError {
    #[track_caller]
    fn from(err: base64::DecodeError) -> SlError {
        let detail = err.to_string();
        SlError::from_components(
            ErrorKind::Decode,
            Cow::Borrowed("Base64 decoding of the result table failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`arrow::error::ArrowError`] to [`SlError`].
///
/// Schema errors map to [`ErrorKind::SchemaMismatch`], everything else to [`ErrorKind::Decode`].
impl From<arrow::error::ArrowError> for SlError {
    #[track_caller]
    fn from(err: arrow::error::ArrowError) -> SlError {
        let (kind, description) = match &err {
            arrow::error::ArrowError::SchemaError(_) => {
                (ErrorKind::SchemaMismatch, "Arrow schemas are incompatible")
            }
            _ => (ErrorKind::Decode, "Arrow stream decoding failed"),
        };

        let detail = err.to_string();
        SlError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`reqwest::Error`] to [`SlError`] with the appropriate error kind.
///
/// Timeouts while connecting map to [`ErrorKind::ConnectTimeout`], other timeouts to
/// [`ErrorKind::ExecuteTimeout`], and `401`/`403` responses to [`ErrorKind::Auth`].
impl From<reqwest::Error> for SlError {
    #[track_caller]
    fn from(err: reqwest::Error) -> SlError {
        let status = err.status().map(|status| status.as_u16());
        let (kind, description) = if err.is_timeout() && err.is_connect() {
            (ErrorKind::ConnectTimeout, "Connecting to the semantic layer timed out")
        } else if err.is_timeout() {
            (ErrorKind::ExecuteTimeout, "Semantic layer request timed out")
        } else if matches!(status, Some(401 | 403)) {
            (ErrorKind::Auth, "Semantic layer rejected the credentials")
        } else if err.is_decode() {
            (
                ErrorKind::DeserializationError,
                "Semantic layer response could not be decoded",
            )
        } else {
            (ErrorKind::Transport, "Semantic layer request failed")
        };

        let detail = err.to_string();
        SlError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`ColumnarTransportError`] to [`SlError`] based on its status code.
impl From<ColumnarTransportError> for SlError {
    #[track_caller]
    fn from(err: ColumnarTransportError) -> SlError {
        let (kind, description) = match err.code {
            ColumnarStatusCode::Unauthenticated | ColumnarStatusCode::Unauthorized => {
                (ErrorKind::Auth, "Columnar transport rejected the credentials")
            }
            ColumnarStatusCode::InvalidArgument => {
                (ErrorKind::QueryFailed, "Columnar query was rejected")
            }
            ColumnarStatusCode::Timeout => {
                (ErrorKind::ExecuteTimeout, "Columnar query timed out")
            }
            ColumnarStatusCode::Other => (ErrorKind::Transport, "Columnar transport failed"),
        };

        let detail = err.message.clone();
        SlError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}
