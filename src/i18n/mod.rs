//! Internationalization (i18n) module.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for all supported languages and their metadata
//! - `language`: Type-safe `Language` validated against the registry
//! - `strings`: Canonical UI labels and their per-language translated tables
//! - `metrics`: Translation observability counters
//!
//! # Example
//!
//! ```rust,ignore
//! use anonymous_news::i18n::{Language, UiStringCache};
//!
//! let japanese = Language::from_code("ja")?;
//! let labels = ui_cache.get(&translator, japanese).await;
//! println!("{}", labels.get("siteTitle"));
//! ```

mod language;
mod metrics;
mod registry;
mod strings;

pub use language::{Language, UnknownLanguage};
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LanguageConfig, LanguageRegistry};
pub use strings::{UiStringCache, UiStrings, CANONICAL_UI_TEXTS};
