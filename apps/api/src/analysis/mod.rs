// Analysis-record pipeline: normalization, dashboard aggregation, history views.
// All functions here are synchronous and pure; they read snapshots and return new values.

pub mod aggregate;
pub mod normalize;
pub mod view;
