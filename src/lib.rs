// Library modules for huematch
// This allows tests to access internal modules

pub mod api;
pub mod artwork;
pub mod cache;
pub mod color;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod matcher;
pub mod models;
pub mod providers;
pub mod service;
pub mod tracks;

#[cfg(test)]
pub mod test_utils;
