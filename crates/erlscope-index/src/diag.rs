//! Application-level errors.

#[doc(hidden)]
pub use ecow::{eco_format, EcoString};

/// A result type with a string error message.
pub type StrResult<T> = Result<T, EcoString>;

/// Early-return with a [`StrResult`].
///
/// ```
/// # use erlscope_index::bail;
/// # use erlscope_index::diag::StrResult;
/// fn check(name: &str) -> StrResult<()> {
///     if name.is_empty() {
///         bail!("module name must not be empty");
///     }
///     Ok(())
/// }
/// # assert!(check("").is_err());
/// ```
#[macro_export]
macro_rules! bail {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        return Err($crate::diag::eco_format!($fmt, $($arg),*).into())
    };
}
