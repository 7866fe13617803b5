//! The declarative description of a requested rendering surface.
//!
//! A [`ConfigTemplate`] is filled in once, when the widget is configured,
//! and stays read-only afterwards. The platform backends turn it into a
//! concrete pixel format; see [`crate::format`] for how candidates are
//! ranked.

use crate::context::GlProfile;
use crate::error::{ErrorKind, Result};
use crate::stereo::StereoMode;

/// Builder for the [`ConfigTemplate`].
#[derive(Debug, Default, Clone)]
pub struct ConfigTemplateBuilder {
    template: ConfigTemplate,
}

impl ConfigTemplateBuilder {
    /// Create a new configuration template builder.
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    /// The type of the color buffer.
    ///
    /// By default a true-color buffer with at least one bit per channel is
    /// requested.
    #[inline]
    pub fn with_buffer_type(mut self, color_buffer_type: ColorBufferType) -> Self {
        self.template.color_buffer_type = color_buffer_type;
        self
    }

    /// Number of alpha bits in the color buffer.
    ///
    /// By default no alpha channel is requested.
    #[inline]
    pub fn with_alpha_size(mut self, alpha_size: u8) -> Self {
        self.template.alpha_size = Some(alpha_size);
        self
    }

    /// Number of bits in the depth buffer.
    ///
    /// By default no depth buffer is requested.
    #[inline]
    pub fn with_depth_size(mut self, depth_size: u8) -> Self {
        self.template.depth_size = Some(depth_size);
        self
    }

    /// Number of bits in the stencil buffer.
    ///
    /// By default no stencil buffer is requested.
    #[inline]
    pub fn with_stencil_size(mut self, stencil_size: u8) -> Self {
        self.template.stencil_size = Some(stencil_size);
        self
    }

    /// Per-channel sizes of the accumulation buffer.
    ///
    /// By default no accumulation buffer is requested. The alpha size is
    /// only forwarded to the platform when an alpha channel was requested
    /// as well.
    #[inline]
    pub fn with_accum_size(mut self, accum_size: AccumBufferSize) -> Self {
        self.template.accum_size = Some(accum_size);
        self
    }

    /// Whether double buffering should be used.
    ///
    /// By default `false` is requested. When a platform only offers
    /// double-buffered formats for a single-buffer request, rendering is
    /// redirected to the front buffer instead.
    #[inline]
    pub fn with_double_buffering(mut self, double_buffering: bool) -> Self {
        self.template.double_buffering = double_buffering;
        self
    }

    /// Whether multisampled formats should be picked.
    ///
    /// By default `false` is requested. Platforms without the relevant
    /// extension report an error instead of silently degrading.
    #[inline]
    pub fn with_multisampling(mut self, multisampling: bool) -> Self {
        self.template.multisampling = multisampling;
        self
    }

    /// Number of auxiliary buffers.
    ///
    /// By default `0` is requested.
    #[inline]
    pub fn with_aux_buffers(mut self, aux_buffers: u8) -> Self {
        self.template.aux_buffers = aux_buffers;
        self
    }

    /// The stereo display technique.
    ///
    /// [`StereoMode::Native`] asks the platform for a quad-buffered format;
    /// the software techniques only influence the projection helpers.
    #[inline]
    pub fn with_stereo(mut self, stereo: StereoMode) -> Self {
        self.template.stereo = stereo;
        self
    }

    /// The OpenGL profile to create contexts with.
    ///
    /// By default the legacy profile is requested.
    #[inline]
    pub fn with_profile(mut self, profile: GlProfile) -> Self {
        self.template.profile = profile;
        self
    }

    /// Whether the widget renders to an off-screen pixel buffer instead of
    /// a window.
    #[inline]
    pub fn with_pbuffer(mut self, pbuffer: bool) -> Self {
        self.template.pbuffer = pbuffer;
        self
    }

    /// Whether a failed pbuffer allocation may retry with smaller sizes.
    #[inline]
    pub fn with_largest_pbuffer(mut self, largest_pbuffer: bool) -> Self {
        self.template.largest_pbuffer = largest_pbuffer;
        self
    }

    /// Whether a private read/write colormap should be allocated for
    /// color-index rendering.
    #[inline]
    pub fn with_private_colormap(mut self, private_colormap: bool) -> Self {
        self.template.private_colormap = private_colormap;
        self
    }

    /// The swap interval applied to the widget's surface.
    ///
    /// By default `1` is requested.
    #[inline]
    pub fn with_swap_interval(mut self, swap_interval: u16) -> Self {
        self.template.swap_interval = swap_interval;
        self
    }

    /// Eye separation for the stereo projection helpers, in model units.
    #[inline]
    pub fn with_eye_separation(mut self, eye_separation: f64) -> Self {
        self.template.eye_separation = eye_separation;
        self
    }

    /// Convergence distance for the stereo projection helpers, in model
    /// units.
    #[inline]
    pub fn with_convergence(mut self, convergence: f64) -> Self {
        self.template.convergence = convergence;
        self
    }

    /// Share server-side objects (display lists) with the widget carrying
    /// the given identifier or pathname.
    ///
    /// Mutually exclusive with [`Self::share_context_with`].
    #[inline]
    pub fn share_lists_with(mut self, ident: impl Into<String>) -> Self {
        self.template.share_lists_with = Some(ident.into());
        self
    }

    /// Share the whole rendering context with the widget carrying the given
    /// identifier or pathname.
    ///
    /// Mutually exclusive with [`Self::share_lists_with`].
    #[inline]
    pub fn share_context_with(mut self, ident: impl Into<String>) -> Self {
        self.template.share_context_with = Some(ident.into());
        self
    }

    /// Build the template to match the native formats against.
    #[must_use]
    pub fn build(self) -> ConfigTemplate {
        self.template
    }
}

/// The rendering-surface capabilities requested for one widget.
#[derive(Debug, Clone)]
pub struct ConfigTemplate {
    /// The type of the backing color buffer.
    pub(crate) color_buffer_type: ColorBufferType,

    /// Bits of alpha in the color buffer, if any.
    pub(crate) alpha_size: Option<u8>,

    /// Bits of depth in the depth buffer, if any.
    pub(crate) depth_size: Option<u8>,

    /// Bits of stencil in the stencil buffer, if any.
    pub(crate) stencil_size: Option<u8>,

    /// Per-channel accumulation buffer sizes, if any.
    pub(crate) accum_size: Option<AccumBufferSize>,

    /// The surface should be double buffered.
    pub(crate) double_buffering: bool,

    /// The format should carry a multisample buffer.
    pub(crate) multisampling: bool,

    /// The number of auxiliary buffers.
    pub(crate) aux_buffers: u8,

    /// The stereo display technique.
    pub(crate) stereo: StereoMode,

    /// The context profile to request.
    pub(crate) profile: GlProfile,

    /// The widget renders into an off-screen pixel buffer.
    pub(crate) pbuffer: bool,

    /// Retry failed pbuffer allocations with smaller sizes.
    pub(crate) largest_pbuffer: bool,

    /// Allocate a private read/write colormap.
    pub(crate) private_colormap: bool,

    /// The swap interval for the widget surface.
    pub(crate) swap_interval: u16,

    /// Distance between the stereo eyes, in model units.
    pub(crate) eye_separation: f64,

    /// Distance to the stereo convergence plane, in model units.
    pub(crate) convergence: f64,

    /// Identifier of the widget to share display lists with.
    pub(crate) share_lists_with: Option<String>,

    /// Identifier of the widget to share the whole context with.
    pub(crate) share_context_with: Option<String>,
}

impl Default for ConfigTemplate {
    fn default() -> Self {
        ConfigTemplate {
            color_buffer_type: ColorBufferType::Rgb { r_size: 1, g_size: 1, b_size: 1 },

            alpha_size: None,

            depth_size: None,

            stencil_size: None,

            accum_size: None,

            double_buffering: false,

            multisampling: false,

            aux_buffers: 0,

            stereo: StereoMode::None,

            profile: GlProfile::Legacy,

            pbuffer: false,
            largest_pbuffer: false,

            private_colormap: false,

            swap_interval: 1,

            eye_separation: 2.0,
            convergence: 35.0,

            share_lists_with: None,
            share_context_with: None,
        }
    }
}

impl ConfigTemplate {
    /// Check the template for contradictory requests.
    ///
    /// This runs before any native resource is touched, so a rejected
    /// template leaves no partial state behind.
    pub fn validate(&self) -> Result<()> {
        if self.pbuffer && self.color_buffer_type == ColorBufferType::Indexed {
            return Err(crate::error::Error::with_message(
                ErrorKind::BadCapabilities,
                "pbuffer rendering requires RGBA mode",
            ));
        }

        if self.share_lists_with.is_some() && self.share_context_with.is_some() {
            return Err(crate::error::Error::with_message(
                ErrorKind::BadCapabilities,
                "the sharelist and sharecontext options are mutually exclusive",
            ));
        }

        Ok(())
    }

    /// The sharing directive carried by the template, if any.
    pub(crate) fn share_directive(&self) -> Option<(ShareKind, &str)> {
        if let Some(ident) = self.share_lists_with.as_deref() {
            Some((ShareKind::DisplayLists, ident))
        } else {
            self.share_context_with.as_deref().map(|ident| (ShareKind::Context, ident))
        }
    }

    /// Whether the template asks for color-index rendering.
    #[inline]
    pub fn is_color_index(&self) -> bool {
        self.color_buffer_type == ColorBufferType::Indexed
    }

    /// Whether the template asks for double buffering.
    #[inline]
    pub fn double_buffering(&self) -> bool {
        self.double_buffering
    }

    /// The requested context profile.
    #[inline]
    pub fn profile(&self) -> GlProfile {
        self.profile
    }

    /// The requested stereo technique.
    #[inline]
    pub fn stereo(&self) -> StereoMode {
        self.stereo
    }
}

/// The two kinds of context sharing a widget can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShareKind {
    /// Share server-side objects by adopting the donor context wholesale.
    DisplayLists,

    /// Alias the donor context while keeping an own negotiated format.
    Context,
}

/// The buffer type backed by the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBufferType {
    /// The backing buffer is using RGB format.
    Rgb {
        /// Minimum size of the red component in bits.
        r_size: u8,
        /// Minimum size of the green component in bits.
        g_size: u8,
        /// Minimum size of the blue component in bits.
        b_size: u8,
    },

    /// The backing buffer holds color-map indices.
    Indexed,
}

/// Requested per-channel sizes of the accumulation buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccumBufferSize {
    /// Size of the red component in bits.
    pub red: u8,
    /// Size of the green component in bits.
    pub green: u8,
    /// Size of the blue component in bits.
    pub blue: u8,
    /// Size of the alpha component in bits.
    pub alpha: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_widget_option_table() {
        let template = ConfigTemplate::default();
        assert_eq!(
            template.color_buffer_type,
            ColorBufferType::Rgb { r_size: 1, g_size: 1, b_size: 1 }
        );
        assert!(!template.double_buffering);
        assert_eq!(template.depth_size, None);
        assert_eq!(template.alpha_size, None);
        assert_eq!(template.swap_interval, 1);
        assert_eq!(template.profile, GlProfile::Legacy);
        assert_eq!(template.eye_separation, 2.0);
        assert_eq!(template.convergence, 35.0);
        assert!(template.validate().is_ok());
    }

    #[test]
    fn color_index_pbuffer_is_rejected() {
        let template = ConfigTemplateBuilder::new()
            .with_buffer_type(ColorBufferType::Indexed)
            .with_pbuffer(true)
            .build();

        let err = template.validate().unwrap_err();
        assert_eq!(err.error_kind(), ErrorKind::BadCapabilities);
        assert!(err.to_string().contains("RGBA"));
    }

    #[test]
    fn conflicting_share_directives_are_rejected() {
        let template = ConfigTemplateBuilder::new()
            .share_lists_with("a")
            .share_context_with("b")
            .build();

        let err = template.validate().unwrap_err();
        assert_eq!(err.error_kind(), ErrorKind::BadCapabilities);
    }

    #[test]
    fn share_directive_resolution() {
        let lists = ConfigTemplateBuilder::new().share_lists_with("donor").build();
        assert_eq!(lists.share_directive(), Some((ShareKind::DisplayLists, "donor")));

        let ctx = ConfigTemplateBuilder::new().share_context_with(".top.donor").build();
        assert_eq!(ctx.share_directive(), Some((ShareKind::Context, ".top.donor")));

        assert_eq!(ConfigTemplate::default().share_directive(), None);
    }
}
