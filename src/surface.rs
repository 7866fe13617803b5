//! Surface kinds and pbuffer allocation policy.

use log::warn;

use crate::error::Result;

/// The kind of native drawable a widget renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// An on-screen (child) window.
    Window,

    /// An off-screen pixel buffer.
    Pbuffer,
}

/// Allocate a pbuffer, shrinking the request until the platform accepts it.
///
/// Each dimension is first clamped to the platform minimum. On failure the
/// request is retried with both dimensions halved (odd remainders round
/// up), but only when `largest` was asked for; once either dimension sits
/// at the minimum the failure is final. The loop strictly shrinks, so
/// termination is immediate from the arithmetic.
///
/// Returns the allocation together with the dimensions actually used.
pub(crate) fn alloc_with_shrink<T>(
    mut width: u32,
    mut height: u32,
    (min_width, min_height): (u32, u32),
    largest: bool,
    mut try_alloc: impl FnMut(u32, u32) -> Result<T>,
) -> Result<(T, u32, u32)> {
    loop {
        width = width.max(min_width);
        height = height.max(min_height);

        match try_alloc(width, height) {
            Ok(alloc) => return Ok((alloc, width, height)),
            Err(err) if !largest || width == min_width || height == min_height => return Err(err),
            Err(_) => {
                width = width / 2 + width % 2;
                height = height / 2 + height % 2;
                warn!("pbuffer allocation failed, retrying at {width}x{height}");
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn first_attempt_success_keeps_requested_size() {
        let (value, w, h) =
            alloc_with_shrink(256, 128, (1, 1), false, |w, h| Ok((w, h))).unwrap();
        assert_eq!(value, (256, 128));
        assert_eq!((w, h), (256, 128));
    }

    #[test]
    fn requests_below_minimum_are_clamped_up() {
        let (_, w, h) = alloc_with_shrink(2, 3, (16, 16), false, |w, h| Ok((w, h))).unwrap();
        assert_eq!((w, h), (16, 16));
    }

    #[test]
    fn failure_without_largest_is_final() {
        let mut attempts = 0;
        let result = alloc_with_shrink(512, 512, (1, 1), false, |_, _| {
            attempts += 1;
            Err::<(), _>(ErrorKind::BadPbuffer.into())
        });
        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }

    #[test]
    fn shrink_halves_and_rounds_odd_dimensions_up() {
        let mut sizes = Vec::new();
        let result = alloc_with_shrink(100, 25, (4, 4), true, |w, h| {
            sizes.push((w, h));
            Err::<(), _>(ErrorKind::BadPbuffer.into())
        });
        assert!(result.is_err());
        // 25 → 13 → 7 → 4 shows the round-up on odd remainders.
        assert_eq!(sizes, [(100, 25), (50, 13), (25, 7), (13, 4)]);
    }

    #[test]
    fn shrink_stops_succeeding_at_reduced_size() {
        let (value, w, h) = alloc_with_shrink(64, 64, (1, 1), true, |w, h| {
            if w > 16 {
                Err(ErrorKind::BadPbuffer.into())
            } else {
                Ok(w * h)
            }
        })
        .unwrap();
        assert_eq!((w, h), (16, 16));
        assert_eq!(value, 256);
    }

    #[test]
    fn failure_at_minimum_is_hard_even_with_largest() {
        let mut attempts = 0;
        let result = alloc_with_shrink(8, 8, (8, 8), true, |_, _| {
            attempts += 1;
            Err::<(), _>(ErrorKind::BadPbuffer.into())
        });
        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }
}
