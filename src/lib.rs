//! A retention policy engine for GitHub Actions workflow runs.
//!
//! Given every recorded run of a repository and a declarative [`config::Options`], the engine
//! partitions runs into those to delete and those to keep, then drives deletion through an
//! [`github::ActionsApi`] collaborator.
//!
//! See: [`janitor::Janitor`], [`retention`]

pub mod cli;
pub mod config;
pub mod env;
pub mod framework;
pub mod github;
pub mod janitor;
pub mod report;
pub mod retention;
pub mod workflow;

/// A shorthand to define a statically allocated variable using a [`std::sync::LazyLock`].
///
/// # Examples
///
/// ```rust
/// use workflow_retention::static_lazy_lock;
/// use std::sync::LazyLock;
///
/// static_lazy_lock! {
///     pub VAR_1: String = String::from("a static variable");
/// }
/// // ...equals to...
/// pub static VAR_2: LazyLock<String> = LazyLock::new(|| String::from("a static variable"));
///
/// assert_eq!(*VAR_1, *VAR_2);
/// ```
#[macro_export]
macro_rules! static_lazy_lock {
    ($(#[$meta:meta])* $vis:vis $name:ident: $type:ty = $expr:expr $(;)?) => {
        $(#[$meta])*
        $vis static $name: $crate::__priv_macro_use::LazyLock<$type> =
            $crate::__priv_macro_use::LazyLock::new(|| $expr);
    };
}

#[doc(hidden)]
pub mod __priv_macro_use {
    pub use std::sync::LazyLock;
}
