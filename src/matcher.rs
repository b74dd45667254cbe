use crate::models::{ColoredTrack, Rgb};

/// The chosen candidate and how far its colour is from the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult<'a> {
    pub track: &'a ColoredTrack,
    pub distance: u32,
}

/// L1 (Manhattan) distance in RGB space.
pub fn color_distance(a: Rgb, b: Rgb) -> u32 {
    a.channels()
        .into_iter()
        .zip(b.channels())
        .map(|(x, y)| u32::from(x.abs_diff(y)))
        .sum()
}

/// Closest candidate by colour distance. Exact distance ties go to the higher
/// playcount; full ties keep the earlier candidate.
pub fn find_closest(target: Rgb, candidates: &[ColoredTrack]) -> Option<MatchResult<'_>> {
    let mut best: Option<MatchResult<'_>> = None;

    for candidate in candidates {
        let distance = color_distance(target, candidate.rgb);
        tracing::debug!(
            "Track: {} by {} -> RGB: {:?} -> Distance: {}",
            candidate.track.name,
            candidate.track.artist,
            candidate.rgb,
            distance
        );

        let replaces = match &best {
            None => true,
            Some(current) => {
                distance < current.distance
                    || (distance == current.distance
                        && candidate.track.playcount > current.track.track.playcount)
            }
        };

        if replaces {
            best = Some(MatchResult {
                track: candidate,
                distance,
            });
        }
    }

    best
}
