mod leaderboard_entry;
mod track;

pub use leaderboard_entry::LeaderboardEntry;
pub use track::{ColoredTrack, Rgb, Track};
