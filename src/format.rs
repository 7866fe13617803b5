//! Rating and selection of native format candidates.
//!
//! Platform capability queries return a list of candidate formats with
//! trade-offs between acceleration, color depth, depth-buffer precision,
//! and multisampling. The selection among them must be deterministic, so
//! every backend funnels its candidates through the comparator defined
//! here.

use std::cmp::Ordering;

/// The acceleration tier reported for a format candidate.
///
/// The discriminant order matters: a lower tier is always preferred, before
/// any other criterion is looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Acceleration {
    /// Fully conformant, hardware accelerated.
    Full,

    /// Conformant but marked slow by the driver.
    Slow,

    /// Non-conformant.
    NonConformant,
}

/// The rating of one format candidate.
///
/// Candidates are compared on four criteria in strict priority order:
/// acceleration tier (lower wins), total color buffer bits (higher wins),
/// depth-buffer bits (higher wins), multisample count (higher wins). The
/// first differing criterion decides; a full tie keeps the earlier
/// candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatRating {
    /// The acceleration tier.
    pub acceleration: Acceleration,

    /// Total number of color buffer bits.
    pub color_bits: u32,

    /// Number of depth buffer bits.
    pub depth_bits: u32,

    /// Number of samples per pixel when multisampling.
    pub samples: u32,
}

impl FormatRating {
    /// Whether `self` strictly beats `other`.
    pub fn is_better_than(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Greater
    }
}

impl Ord for FormatRating {
    fn cmp(&self, other: &Self) -> Ordering {
        // A "greater" rating is a better one, so the acceleration tier
        // compares reversed.
        other
            .acceleration
            .cmp(&self.acceleration)
            .then_with(|| self.color_bits.cmp(&other.color_bits))
            .then_with(|| self.depth_bits.cmp(&other.depth_bits))
            .then_with(|| self.samples.cmp(&other.samples))
    }
}

impl PartialOrd for FormatRating {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pick the index of the best-rated candidate, keeping the earlier one on
/// ties.
pub fn pick_best<I>(ratings: I) -> Option<usize>
where
    I: IntoIterator<Item = FormatRating>,
{
    let mut best: Option<(usize, FormatRating)> = None;
    for (index, rating) in ratings.into_iter().enumerate() {
        match &best {
            Some((_, incumbent)) if !rating.is_better_than(incumbent) => (),
            _ => best = Some((index, rating)),
        }
    }

    best.map(|(index, _)| index)
}

/// The capabilities a negotiated format actually satisfies.
///
/// Negotiation may relax or upgrade parts of the request, e.g. hand out a
/// double-buffered format for a single-buffer request. The widget re-syncs
/// its bookkeeping from this record after negotiation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatDetails {
    /// The format is RGBA rather than color index.
    pub rgba: bool,

    /// The format is double buffered.
    pub double_buffered: bool,

    /// The format carries a depth buffer.
    pub has_depth: bool,

    /// The format carries an alpha channel.
    pub has_alpha: bool,

    /// The format carries a stencil buffer.
    pub has_stencil: bool,

    /// The format carries an accumulation buffer.
    pub has_accum: bool,

    /// The format is a native quad-buffered stereo format.
    pub native_stereo: bool,

    /// The number of samples per pixel, zero without multisampling.
    pub samples: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(
        acceleration: Acceleration,
        color_bits: u32,
        depth_bits: u32,
        samples: u32,
    ) -> FormatRating {
        FormatRating { acceleration, color_bits, depth_bits, samples }
    }

    #[test]
    fn acceleration_outranks_everything() {
        // The second candidate wins purely on the acceleration tier, even
        // though every other field is worse.
        let candidates = [
            rating(Acceleration::Slow, 24, 16, 0),
            rating(Acceleration::Full, 16, 24, 4),
        ];
        assert_eq!(pick_best(candidates), Some(1));
    }

    #[test]
    fn criteria_cascade_in_order() {
        let base = rating(Acceleration::Full, 24, 24, 0);

        let more_colors = rating(Acceleration::Full, 32, 16, 0);
        assert!(more_colors.is_better_than(&base));

        let more_depth = rating(Acceleration::Full, 24, 32, 0);
        assert!(more_depth.is_better_than(&base));
        assert!(more_colors.is_better_than(&more_depth));

        let more_samples = rating(Acceleration::Full, 24, 24, 4);
        assert!(more_samples.is_better_than(&base));
        assert!(more_depth.is_better_than(&more_samples));
    }

    #[test]
    fn full_tie_keeps_the_first_candidate() {
        let candidates = [
            rating(Acceleration::Full, 24, 24, 4),
            rating(Acceleration::Full, 24, 24, 4),
            rating(Acceleration::Full, 24, 24, 4),
        ];
        assert_eq!(pick_best(candidates), Some(0));
    }

    #[test]
    fn reduction_agrees_with_sorting() {
        let candidates = vec![
            rating(Acceleration::Slow, 32, 32, 8),
            rating(Acceleration::Full, 16, 16, 0),
            rating(Acceleration::Full, 24, 16, 0),
            rating(Acceleration::Full, 24, 24, 0),
            rating(Acceleration::NonConformant, 32, 32, 16),
        ];

        let picked = pick_best(candidates.iter().copied()).unwrap();

        let mut sorted = candidates.clone();
        sorted.sort();
        assert_eq!(candidates[picked], *sorted.last().unwrap());
        assert_eq!(picked, 3);
    }

    #[test]
    fn empty_candidate_list_yields_none() {
        assert_eq!(pick_best(std::iter::empty()), None);
    }
}
