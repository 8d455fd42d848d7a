pub mod gitlab;
pub mod group_stats;
