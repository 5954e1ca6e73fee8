//! Feature engineering: bureau history aggregation and the master-table join.

pub mod aggregate;
pub mod join;

pub use aggregate::BureauAggregator;
pub use join::FeatureJoiner;
