//! The macOS/NSOpenGL platform backend.
//!
//! The backend runs on the main thread only, which is where AppKit keeps
//! its views anyway; the platform handle carries the proof.

use std::fmt;
use std::rc::Rc;

use objc2::MainThreadMarker;
use objc2_app_kit::NSView;
use objc2_core_foundation::{CFBundle, CFString};
use once_cell::unsync::OnceCell;

use crate::error::{ErrorKind, Result};
use crate::gl::Gl;

pub(crate) mod appkit;
pub mod config;
pub mod context;
pub mod surface;

pub use config::Config;
pub use context::Context;
pub use surface::Surface;

use appkit::NSOpenGLContext;

// From the pixel-buffer extension; absent from the generated bindings.
const MIN_PBUFFER_VIEWPORT_DIMS_APPLE: u32 = 0x8AD0;

/// The macOS/NSOpenGL platform handle.
#[derive(Clone)]
pub struct Platform {
    inner: Rc<PlatformInner>,
}

struct PlatformInner {
    mtm: MainThreadMarker,
    gl: OnceCell<Gl>,
}

impl Platform {
    /// Open the backend.
    ///
    /// Fails off the main thread; AppKit views cannot be driven from
    /// anywhere else.
    pub fn new() -> Result<Self> {
        let mtm = MainThreadMarker::new()
            .ok_or(ErrorKind::NotSupported("NSOpenGL widgets require the main thread"))?;
        Ok(Self { inner: Rc::new(PlatformInner { mtm, gl: OnceCell::new() }) })
    }

    fn gl(&self) -> &Gl {
        self.inner.gl.get_or_init(|| Gl::load_with(get_proc_address))
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform").finish()
    }
}

fn get_proc_address(addr: &str) -> *const std::ffi::c_void {
    let framework_name = CFString::from_static_str("com.apple.opengl");
    let framework = match unsafe { CFBundle::bundle_with_identifier(Some(&framework_name)) } {
        Some(framework) => framework,
        None => return std::ptr::null(),
    };
    let symbol_name = CFString::from_str(addr);
    unsafe { framework.function_pointer_for_name(Some(&symbol_name)) }.cast()
}

impl crate::platform::GlPlatform for Platform {
    type Config = Config;
    type Context = Context;
    type Parent = *mut NSView;
    type Surface = Surface;
    type Window = *mut NSView;

    fn choose_config(&self, template: &crate::config::ConfigTemplate) -> Result<Self::Config> {
        config::find_config(template)
    }

    fn describe_config(&self, config: &Self::Config) -> crate::format::FormatDetails {
        config.details()
    }

    fn formats_compatible(&self, own: &Self::Config, donor: &Self::Config) -> bool {
        own.color_size() == donor.color_size()
            && own.details().double_buffered == donor.details().double_buffered
    }

    fn create_context(
        &self,
        config: &Self::Config,
        _profile: crate::context::GlProfile,
    ) -> Result<Self::Context> {
        // The profile already went into the pixel format.
        context::create_context(config)
    }

    fn make_current_without_surface(&self, context: &Self::Context) -> Result<()> {
        context.make_current();
        Ok(())
    }

    fn create_window_surface(
        &self,
        _config: &Self::Config,
        _template: &crate::config::ConfigTemplate,
        parent: Self::Parent,
        width: u32,
        height: u32,
    ) -> Result<(Self::Surface, Self::Window)> {
        surface::create_view_surface(self.inner.mtm, parent, width, height)
    }

    fn create_placeholder_window(
        &self,
        parent: Self::Parent,
        width: u32,
        height: u32,
    ) -> Self::Window {
        match surface::create_view_surface(self.inner.mtm, parent, width, height) {
            Ok((surface, raw)) => {
                // A plain view with no GL attached; the toolkit keeps it.
                std::mem::forget(surface);
                raw
            },
            Err(_) => parent,
        }
    }

    fn pbuffer_min_size(&self, _context: &Self::Context) -> (u32, u32) {
        let mut dims = [0i32; 2];
        unsafe {
            self.gl().GetIntegerv(MIN_PBUFFER_VIEWPORT_DIMS_APPLE, dims.as_mut_ptr());
        }
        (dims[0].max(1) as u32, dims[1].max(1) as u32)
    }

    fn create_pbuffer(
        &self,
        config: &Self::Config,
        context: &Self::Context,
        width: u32,
        height: u32,
    ) -> Result<Self::Surface> {
        let has_alpha = config.details().has_alpha;
        surface::create_pbuffer(context, has_alpha, width, height)
    }

    fn make_current(&self, context: &Self::Context, _surface: &Self::Surface) -> Result<()> {
        context.make_current();
        Ok(())
    }

    fn surface_is_bound(&self, context: &Self::Context, surface: &Self::Surface) -> bool {
        context.surface_is_bound(surface)
    }

    fn bind_surface(&self, context: &Self::Context, surface: &Self::Surface) -> Result<()> {
        context.update();
        context.bind_surface(surface);
        Ok(())
    }

    fn clear_current(&self) {
        NSOpenGLContext::clearCurrentContext();
    }

    fn swap_buffers(&self, context: &Self::Context, _surface: &Self::Surface) -> Result<()> {
        context.flush_buffer();
        Ok(())
    }

    fn flush(&self) {
        unsafe {
            self.gl().Flush();
        }
    }

    fn set_swap_interval(
        &self,
        context: &Self::Context,
        _surface: &Self::Surface,
        interval: u16,
    ) -> Result<()> {
        context.set_swap_interval(interval);
        Ok(())
    }

    fn force_front_buffer_rendering(
        &self,
        context: &Self::Context,
        surface: &Self::Surface,
    ) -> Result<()> {
        context.make_current();
        context.bind_surface(surface);
        crate::gl_utils::force_front_buffer(self.gl());
        Ok(())
    }

    fn copy_context(&self, from: &Self::Context, to: &Self::Context, mask: u32) -> Result<()> {
        to.copy_from(from, mask);
        Ok(())
    }

    fn read_pixels(
        &self,
        _context: &Self::Context,
        _surface: &Self::Surface,
        width: u32,
        height: u32,
        read_front: bool,
        ramps: Option<&crate::photo::ColorRamps>,
    ) -> Result<Vec<u8>> {
        Ok(crate::gl_utils::read_rgba_pixels(self.gl(), width, height, read_front, ramps))
    }

    fn index_bits(&self, _context: &Self::Context) -> u8 {
        crate::gl_utils::index_bits(self.gl())
    }

    fn extensions(
        &self,
        _context: &Self::Context,
        profile: crate::context::GlProfile,
    ) -> Result<String> {
        crate::gl_utils::extensions_string(self.gl(), !profile.is_core())
    }
}
