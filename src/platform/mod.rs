//! The native platform interface and backend selection.
//!
//! Every platform variant exposes the same capability set through
//! [`GlPlatform`]: negotiate a format, create contexts and drawables, bind
//! and swap, read pixels back. The widget lifecycle in [`crate::widget`]
//! is written once against this trait; the backends differ only in how
//! they talk to the native API.

use std::fmt;

use bitflags::bitflags;

use crate::config::ConfigTemplate;
use crate::context::GlProfile;
use crate::error::Result;
use crate::format::FormatDetails;
use crate::photo::ColorRamps;

#[cfg(glx_backend)]
pub mod glx;

#[cfg(wgl_backend)]
pub mod wgl;

#[cfg(nsgl_backend)]
pub mod nsgl;

#[cfg(glx_backend)]
pub use glx::Platform as NativePlatform;

#[cfg(wgl_backend)]
pub use wgl::Platform as NativePlatform;

#[cfg(nsgl_backend)]
pub use nsgl::Platform as NativePlatform;

bitflags! {
    /// The optional capabilities a native display connection reported.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DisplayFeatures: u32 {
        /// Multisampled pixel formats can be negotiated.
        const MULTISAMPLING_PIXEL_FORMATS = 0b0000_0001;

        /// Off-screen pixel buffers can be allocated.
        const PBUFFER_SURFACES            = 0b0000_0010;

        /// Contexts can be created with an explicit version and profile.
        const CREATE_CONTEXT_WITH_VERSION = 0b0000_0100;

        /// The swap interval of a surface can be adjusted.
        const SWAP_CONTROL                = 0b0000_1000;
    }
}

/// The capability set a platform backend provides to the widget lifecycle.
///
/// Backends are cheap to clone (they share one native connection
/// internally); native resources release themselves when their handles are
/// dropped.
pub trait GlPlatform: Clone + fmt::Debug + Sized + 'static {
    /// The negotiated native format.
    type Config: Clone + fmt::Debug;

    /// The native rendering context.
    type Context: fmt::Debug;

    /// The native drawable a context renders into.
    type Surface: fmt::Debug;

    /// The native window handle handed back to the toolkit.
    type Window: Copy + fmt::Debug;

    /// The parent the toolkit asks the widget to create its window under.
    type Parent: Copy + fmt::Debug;

    /// Negotiate the best native format for the template.
    ///
    /// Must not return a format violating a required flag; may relax exact
    /// channel depths. Requesting multisampling or pbuffers on a platform
    /// without the capability-query extension is an error, not a silent
    /// downgrade.
    fn choose_config(&self, template: &ConfigTemplate) -> Result<Self::Config>;

    /// The capabilities the negotiated format actually satisfies.
    fn describe_config(&self, config: &Self::Config) -> FormatDetails;

    /// Whether a context negotiated for `donor` can be driven through a
    /// widget holding `own`.
    fn formats_compatible(&self, own: &Self::Config, donor: &Self::Config) -> bool;

    /// Create a fresh rendering context for the format.
    fn create_context(&self, config: &Self::Config, profile: GlProfile) -> Result<Self::Context>;

    /// Make a context current with no drawable attached, so GL calls made
    /// before the widget is mapped have somewhere to go.
    fn make_current_without_surface(&self, context: &Self::Context) -> Result<()>;

    /// Create the on-screen drawable and the toolkit-facing window handle.
    fn create_window_surface(
        &self,
        config: &Self::Config,
        template: &ConfigTemplate,
        parent: Self::Parent,
        width: u32,
        height: u32,
    ) -> Result<(Self::Surface, Self::Window)>;

    /// Create a plain, non-GL window.
    ///
    /// This backs the "window creation never fails" contract, so it cannot
    /// fail itself.
    fn create_placeholder_window(&self, parent: Self::Parent, width: u32, height: u32)
        -> Self::Window;

    /// The smallest pbuffer the platform will hand out.
    fn pbuffer_min_size(&self, context: &Self::Context) -> (u32, u32);

    /// One pbuffer allocation attempt at exactly the given size.
    fn create_pbuffer(
        &self,
        config: &Self::Config,
        context: &Self::Context,
        width: u32,
        height: u32,
    ) -> Result<Self::Surface>;

    /// Bind the context and surface as current for the calling thread.
    fn make_current(&self, context: &Self::Context, surface: &Self::Surface) -> Result<()>;

    /// Whether the context's attached drawable is the given surface.
    fn surface_is_bound(&self, context: &Self::Context, surface: &Self::Surface) -> bool;

    /// Re-attach the context to the given surface.
    fn bind_surface(&self, context: &Self::Context, surface: &Self::Surface) -> Result<()>;

    /// Release whatever context is current on the calling thread.
    fn clear_current(&self);

    /// Present the back buffer of a double-buffered surface.
    fn swap_buffers(&self, context: &Self::Context, surface: &Self::Surface) -> Result<()>;

    /// Flush the GL command stream of the current context.
    fn flush(&self);

    /// Apply a swap interval to the surface.
    fn set_swap_interval(
        &self,
        context: &Self::Context,
        surface: &Self::Surface,
        interval: u16,
    ) -> Result<()>;

    /// Redirect drawing and reading to the front buffer.
    ///
    /// Used when a single-buffer request could only be satisfied with a
    /// double-buffered format.
    fn force_front_buffer_rendering(
        &self,
        context: &Self::Context,
        surface: &Self::Surface,
    ) -> Result<()>;

    /// Copy the masked GL state from one context to another.
    fn copy_context(&self, from: &Self::Context, to: &Self::Context, mask: u32) -> Result<()>;

    /// Read the color buffer back as tightly packed RGBA8 rows, bottom-up.
    ///
    /// `read_front` selects the front buffer; `ramps` installs the
    /// index-to-RGB pixel maps for color-index formats. Pixel-store state
    /// is saved and restored around the read.
    fn read_pixels(
        &self,
        context: &Self::Context,
        surface: &Self::Surface,
        width: u32,
        height: u32,
        read_front: bool,
        ramps: Option<&ColorRamps>,
    ) -> Result<Vec<u8>>;

    /// The color-index depth of the context, in bits.
    fn index_bits(&self, context: &Self::Context) -> u8;

    /// The GL extensions string of the context.
    ///
    /// Legacy profiles use the single-string query; core profiles
    /// enumerate indexed strings joined with spaces.
    fn extensions(&self, context: &Self::Context, profile: GlProfile) -> Result<String>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! An in-memory platform for exercising the widget lifecycle without a
    //! display server.

    use std::cell::RefCell;
    use std::rc::Rc;

    use super::GlPlatform;
    use crate::config::ConfigTemplate;
    use crate::context::GlProfile;
    use crate::error::{ErrorKind, Result};
    use crate::format::FormatDetails;
    use crate::photo::ColorRamps;

    #[derive(Debug, Default)]
    pub(crate) struct FakeState {
        serial: u64,

        pub contexts_created: usize,
        pub contexts_destroyed: usize,
        pub surfaces_created: usize,
        pub surfaces_destroyed: usize,
        pub placeholder_windows: usize,

        pub fail_choose_config: bool,
        pub fail_create_context: bool,
        pub fail_window: bool,
        /// Fail pbuffer attempts wider than this.
        pub pbuffer_max_width: Option<u32>,
        pub pbuffer_min: (u32, u32),

        pub details: FormatDetails,
        pub compat_token: u32,
        pub index_bits: u8,

        pub current_context: Option<u64>,
        /// Per-context attached surface; only `bind_surface` changes it.
        pub attachments: Vec<(u64, u64)>,
        pub rebinds: usize,
        pub clears: usize,
        pub swaps: usize,
        pub flushes: usize,
        pub front_buffer_forced: usize,
        pub swap_intervals: Vec<u16>,
        pub copies: Vec<(u64, u64, u32)>,
        pub extension_queries: usize,
        pub ramps_seen: bool,
    }

    #[derive(Clone, Debug)]
    pub(crate) struct FakePlatform {
        state: Rc<RefCell<FakeState>>,
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub(crate) struct FakeConfig {
        pub compat_token: u32,
    }

    #[derive(Debug)]
    pub(crate) struct FakeContext {
        pub serial: u64,
        state: Rc<RefCell<FakeState>>,
    }

    impl Drop for FakeContext {
        fn drop(&mut self) {
            self.state.borrow_mut().contexts_destroyed += 1;
        }
    }

    #[derive(Debug)]
    pub(crate) struct FakeSurface {
        pub serial: u64,
        state: Rc<RefCell<FakeState>>,
    }

    impl Drop for FakeSurface {
        fn drop(&mut self) {
            self.state.borrow_mut().surfaces_destroyed += 1;
        }
    }

    impl FakePlatform {
        pub fn new() -> Self {
            let state = FakeState {
                details: FormatDetails { rgba: true, ..Default::default() },
                pbuffer_min: (1, 1),
                index_bits: 4,
                ..Default::default()
            };
            Self { state: Rc::new(RefCell::new(state)) }
        }

        pub fn state(&self) -> std::cell::Ref<'_, FakeState> {
            self.state.borrow()
        }

        pub fn state_mut(&self) -> std::cell::RefMut<'_, FakeState> {
            self.state.borrow_mut()
        }

        pub fn new_context(&self) -> FakeContext {
            let mut state = self.state.borrow_mut();
            state.serial += 1;
            state.contexts_created += 1;
            FakeContext { serial: state.serial, state: Rc::clone(&self.state) }
        }

        fn new_surface(&self) -> FakeSurface {
            let mut state = self.state.borrow_mut();
            state.serial += 1;
            state.surfaces_created += 1;
            FakeSurface { serial: state.serial, state: Rc::clone(&self.state) }
        }
    }

    impl GlPlatform for FakePlatform {
        type Config = FakeConfig;
        type Context = FakeContext;
        type Parent = u64;
        type Surface = FakeSurface;
        type Window = u64;

        fn choose_config(&self, _template: &ConfigTemplate) -> Result<Self::Config> {
            let state = self.state.borrow();
            if state.fail_choose_config {
                return Err(ErrorKind::NoMatchingFormat.into());
            }
            Ok(FakeConfig { compat_token: state.compat_token })
        }

        fn describe_config(&self, _config: &Self::Config) -> FormatDetails {
            self.state.borrow().details
        }

        fn formats_compatible(&self, own: &Self::Config, donor: &Self::Config) -> bool {
            own.compat_token == donor.compat_token
        }

        fn create_context(
            &self,
            _config: &Self::Config,
            _profile: GlProfile,
        ) -> Result<Self::Context> {
            if self.state.borrow().fail_create_context {
                return Err(ErrorKind::BadContext.into());
            }
            Ok(self.new_context())
        }

        fn make_current_without_surface(&self, context: &Self::Context) -> Result<()> {
            self.state.borrow_mut().current_context = Some(context.serial);
            Ok(())
        }

        fn create_window_surface(
            &self,
            _config: &Self::Config,
            _template: &ConfigTemplate,
            _parent: Self::Parent,
            _width: u32,
            _height: u32,
        ) -> Result<(Self::Surface, Self::Window)> {
            if self.state.borrow().fail_window {
                return Err(ErrorKind::BadSurface.into());
            }
            let surface = self.new_surface();
            let window = surface.serial;
            Ok((surface, window))
        }

        fn create_placeholder_window(
            &self,
            _parent: Self::Parent,
            _width: u32,
            _height: u32,
        ) -> Self::Window {
            let mut state = self.state.borrow_mut();
            state.placeholder_windows += 1;
            state.serial += 1;
            state.serial
        }

        fn pbuffer_min_size(&self, _context: &Self::Context) -> (u32, u32) {
            self.state.borrow().pbuffer_min
        }

        fn create_pbuffer(
            &self,
            _config: &Self::Config,
            _context: &Self::Context,
            width: u32,
            _height: u32,
        ) -> Result<Self::Surface> {
            if let Some(max_width) = self.state.borrow().pbuffer_max_width {
                if width > max_width {
                    return Err(ErrorKind::BadPbuffer.into());
                }
            }
            Ok(self.new_surface())
        }

        fn make_current(&self, context: &Self::Context, _surface: &Self::Surface) -> Result<()> {
            self.state.borrow_mut().current_context = Some(context.serial);
            Ok(())
        }

        fn surface_is_bound(&self, context: &Self::Context, surface: &Self::Surface) -> bool {
            self.state
                .borrow()
                .attachments
                .iter()
                .any(|&(ctx, surf)| ctx == context.serial && surf == surface.serial)
        }

        fn bind_surface(&self, context: &Self::Context, surface: &Self::Surface) -> Result<()> {
            let mut state = self.state.borrow_mut();
            state.attachments.retain(|&(ctx, _)| ctx != context.serial);
            state.attachments.push((context.serial, surface.serial));
            state.rebinds += 1;
            Ok(())
        }

        fn clear_current(&self) {
            let mut state = self.state.borrow_mut();
            state.current_context = None;
            state.clears += 1;
        }

        fn swap_buffers(&self, _context: &Self::Context, _surface: &Self::Surface) -> Result<()> {
            self.state.borrow_mut().swaps += 1;
            Ok(())
        }

        fn flush(&self) {
            self.state.borrow_mut().flushes += 1;
        }

        fn set_swap_interval(
            &self,
            _context: &Self::Context,
            _surface: &Self::Surface,
            interval: u16,
        ) -> Result<()> {
            self.state.borrow_mut().swap_intervals.push(interval);
            Ok(())
        }

        fn force_front_buffer_rendering(
            &self,
            _context: &Self::Context,
            _surface: &Self::Surface,
        ) -> Result<()> {
            self.state.borrow_mut().front_buffer_forced += 1;
            Ok(())
        }

        fn copy_context(&self, from: &Self::Context, to: &Self::Context, mask: u32) -> Result<()> {
            self.state.borrow_mut().copies.push((from.serial, to.serial, mask));
            Ok(())
        }

        fn read_pixels(
            &self,
            _context: &Self::Context,
            _surface: &Self::Surface,
            width: u32,
            height: u32,
            _read_front: bool,
            ramps: Option<&ColorRamps>,
        ) -> Result<Vec<u8>> {
            self.state.borrow_mut().ramps_seen |= ramps.is_some();
            // Mark the bottom GL row so flips are observable.
            let pitch = width as usize * crate::photo::PIXEL_SIZE;
            let mut data = vec![0u8; pitch * height as usize];
            data[..pitch].fill(0xAB);
            Ok(data)
        }

        fn index_bits(&self, _context: &Self::Context) -> u8 {
            self.state.borrow().index_bits
        }

        fn extensions(&self, _context: &Self::Context, profile: GlProfile) -> Result<String> {
            self.state.borrow_mut().extension_queries += 1;
            if profile.is_core() {
                Ok("GL_ARB_indexed GL_ARB_other".into())
            } else {
                Ok("GL_ARB_legacy GL_ARB_other".into())
            }
        }
    }
}
