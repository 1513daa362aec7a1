//! Usage analytics
//!
//! Process-local counters for link creations and redirects. Counters only
//! ever increase; readers get a copied [`AnalyticsSnapshot`].

pub mod counters;
pub mod models;

pub use counters::Analytics;
pub use models::{AnalyticsSnapshot, TopUrl};
