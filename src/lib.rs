pub mod config;
pub mod error;
pub mod i18n;

pub use error::{I18nError, I18nResult};
