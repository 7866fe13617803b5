//! Stereo display techniques and the per-eye projection math.
//!
//! The projection helpers are pure arithmetic: they produce the clipping
//! bounds to hand to `glFrustum`/`glOrtho` plus the camera translation
//! that follows, shifted horizontally for the active eye. The eye offset
//! and the post-projection translation must stay in the caller's model
//! units.

/// The stereo display technique configured for a widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StereoMode {
    /// Monoscopic rendering.
    #[default]
    None,

    /// Render the left-eye view only.
    LeftEye,

    /// Render the right-eye view only.
    RightEye,

    /// Native quad-buffered stereo; needs platform support.
    Native,

    /// Old-style SGI interlaced stereo.
    SgiOldStyle,

    /// Red/blue anaglyph.
    Anaglyph,

    /// Side-by-side, eyes crossed.
    CrossEye,

    /// Side-by-side, eyes parallel.
    WallEye,

    /// DTI flat-panel stereo.
    Dti,

    /// Row-interleaved stereo.
    RowInterleaved,
}

impl StereoMode {
    /// Whether the technique asks the platform for a quad-buffered format.
    #[inline]
    pub fn wants_native_format(self) -> bool {
        self == StereoMode::Native
    }
}

/// Which stereo buffer the next draw targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StereoBuffer {
    /// No specific eye.
    #[default]
    None,

    /// The left-eye buffer.
    Left,

    /// The right-eye buffer.
    Right,
}

/// The stereo parameters a projection is computed from.
#[derive(Debug, Clone, Copy)]
pub struct StereoParams {
    /// The configured stereo technique.
    pub mode: StereoMode,

    /// The buffer currently being drawn.
    pub buffer: StereoBuffer,

    /// Distance between the eyes.
    pub eye_separation: f64,

    /// Distance to the plane both eyes converge on.
    pub convergence: f64,
}

/// A projection volume adjusted for the active eye.
///
/// Feed `left..far` to the platform's frustum/ortho call, then translate
/// the camera by `camera_shift_x` along X.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
    pub near: f64,
    pub far: f64,

    /// The camera translation applied after the projection, the negative
    /// of the eye shift.
    pub camera_shift_x: f64,
}

impl Projection {
    /// Per-eye perspective projection bounds.
    ///
    /// The single-eye techniques force their eye regardless of the current
    /// buffer; otherwise the buffer decides.
    pub fn frustum(
        params: &StereoParams,
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    ) -> Self {
        let eye_offset = if params.mode == StereoMode::LeftEye
            || params.buffer == StereoBuffer::Left
        {
            -params.eye_separation / 2.0
        } else if params.mode == StereoMode::RightEye || params.buffer == StereoBuffer::Right {
            params.eye_separation / 2.0
        } else {
            0.0
        };

        Self::with_offset(params, eye_offset, left, right, bottom, top, near, far)
    }

    /// Per-eye orthographic projection bounds.
    ///
    /// Only the current buffer picks the eye here; the single-eye modes
    /// draw through the buffer selection.
    pub fn ortho(
        params: &StereoParams,
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    ) -> Self {
        let eye_offset = match params.buffer {
            StereoBuffer::Left => -params.eye_separation / 2.0,
            StereoBuffer::Right => params.eye_separation / 2.0,
            StereoBuffer::None => 0.0,
        };

        Self::with_offset(params, eye_offset, left, right, bottom, top, near, far)
    }

    #[allow(clippy::too_many_arguments)]
    fn with_offset(
        params: &StereoParams,
        eye_offset: f64,
        left: f64,
        right: f64,
        mut bottom: f64,
        mut top: f64,
        near: f64,
        far: f64,
    ) -> Self {
        let eye_shift = (params.convergence - near) * (eye_offset / params.convergence);

        // The side-by-side techniques render into half-height viewports;
        // widen the volume to compensate.
        if matches!(params.mode, StereoMode::CrossEye | StereoMode::WallEye) {
            let delta = (top - bottom) / 2.0;
            top += delta;
            bottom -= delta;
        }

        Projection {
            left: left + eye_shift,
            right: right + eye_shift,
            bottom,
            top,
            near,
            far,
            camera_shift_x: -eye_shift,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn params(mode: StereoMode, buffer: StereoBuffer) -> StereoParams {
        StereoParams { mode, buffer, eye_separation: 2.0, convergence: 35.0 }
    }

    #[test]
    fn left_eye_frustum_shift() {
        let p = params(StereoMode::Native, StereoBuffer::Left);
        let proj = Projection::frustum(&p, -1.0, 1.0, -1.0, 1.0, 1.0, 10.0);

        // eye offset −1.0, shift = (35 − 1) × (−1/35)
        let expected_shift = 34.0 * (-1.0 / 35.0);
        assert!((proj.left - (-1.0 + expected_shift)).abs() < EPS);
        assert!((proj.right - (1.0 + expected_shift)).abs() < EPS);
        assert!((proj.camera_shift_x - -expected_shift).abs() < EPS);
        assert!((expected_shift - -0.9714285714285714).abs() < EPS);

        // Vertical bounds are untouched outside the side-by-side modes.
        assert_eq!(proj.bottom, -1.0);
        assert_eq!(proj.top, 1.0);
        assert_eq!(proj.near, 1.0);
        assert_eq!(proj.far, 10.0);
    }

    #[test]
    fn right_eye_mirrors_left() {
        let p = params(StereoMode::Native, StereoBuffer::Right);
        let proj = Projection::frustum(&p, -1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
        let left = Projection::frustum(
            &params(StereoMode::Native, StereoBuffer::Left),
            -1.0,
            1.0,
            -1.0,
            1.0,
            1.0,
            10.0,
        );
        assert!((proj.camera_shift_x + left.camera_shift_x).abs() < EPS);
        assert!((proj.left + left.right).abs() < EPS);
    }

    #[test]
    fn single_eye_mode_overrides_buffer_for_frustum() {
        let p = params(StereoMode::LeftEye, StereoBuffer::None);
        let proj = Projection::frustum(&p, -1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
        assert!(proj.camera_shift_x > 0.0);

        // Ortho only honors the buffer selection.
        let ortho = Projection::ortho(&p, -1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
        assert_eq!(ortho.camera_shift_x, 0.0);
    }

    #[test]
    fn no_eye_means_no_shift() {
        let p = params(StereoMode::None, StereoBuffer::None);
        let proj = Projection::frustum(&p, -2.0, 2.0, -1.5, 1.5, 0.5, 100.0);
        assert_eq!(proj.left, -2.0);
        assert_eq!(proj.right, 2.0);
        assert_eq!(proj.camera_shift_x, 0.0);
    }

    #[test]
    fn cross_eye_widens_vertical_bounds() {
        let p = params(StereoMode::CrossEye, StereoBuffer::Left);
        let proj = Projection::frustum(&p, -1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
        assert_eq!(proj.top, 2.0);
        assert_eq!(proj.bottom, -2.0);

        let wall = Projection::frustum(
            &params(StereoMode::WallEye, StereoBuffer::Left),
            -1.0,
            1.0,
            -1.0,
            1.0,
            1.0,
            10.0,
        );
        assert_eq!(wall.top, 2.0);
        assert_eq!(wall.bottom, -2.0);
    }
}
