//! Error construction shorthands.

/// Builds an [`crate::error::SlError`] from a kind and a static description.
///
/// A third argument adds detail: `detail = <String>` moves an owned string in, any other
/// expression is rendered with [`ToString`]. `source: <error>` attaches the underlying error.
#[macro_export]
macro_rules! sl_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::SlError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::sl_error!($kind, $desc).with_source($source)
    };
    ($kind:expr, $desc:expr, detail = $detail:expr) => {
        $crate::error::SlError::from(($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::sl_error!($kind, $desc, detail = $detail.to_string())
    };
}

/// Returns early with an [`crate::error::SlError`] built by [`sl_error!`].
#[macro_export]
macro_rules! bail {
    ($($args:tt)+) => {
        return ::core::result::Result::Err($crate::sl_error!($($args)+))
    };
}
