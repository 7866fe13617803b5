//! The X11/GLX platform backend.

use std::cell::Cell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_int, c_void};

use glutin_glx_sys::{glx, glx_extra};
use libloading::Library;
use once_cell::sync::Lazy;
use x11_dl::xlib::{self, Xlib, XErrorEvent};

use crate::error::{Error, ErrorKind, Result};

pub mod config;
pub mod context;
pub mod display;
pub mod surface;

pub use config::Config;
pub use context::Context;
pub use display::Display;
pub use surface::Surface;

/// The loaded GLX symbol table.
pub(crate) struct Glx(glx::Glx);

// The table only holds function pointers resolved once at load time.
unsafe impl Send for Glx {}
unsafe impl Sync for Glx {}

impl std::ops::Deref for Glx {
    type Target = glx::Glx;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// The loaded GLX extension symbol table.
pub(crate) struct GlxExtra(glx_extra::Glx);

unsafe impl Send for GlxExtra {}
unsafe impl Sync for GlxExtra {}

impl std::ops::Deref for GlxExtra {
    type Target = glx_extra::Glx;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub(crate) static XLIB: Lazy<Option<Xlib>> = Lazy::new(|| Xlib::open().ok());

pub(crate) static GLX: Lazy<Option<Glx>> = Lazy::new(|| {
    let paths = ["libGL.so.1", "libGL.so"];
    let lib = paths.iter().find_map(|path| unsafe { Library::new(path).ok() })?;
    // The symbol table borrows from the library for the lifetime of the
    // process.
    let lib: &'static Library = Box::leak(Box::new(lib));
    Some(Glx(glx::Glx::load_with(|symbol| {
        let symbol = match CString::new(symbol) {
            Ok(symbol) => symbol,
            Err(_) => return std::ptr::null(),
        };
        unsafe {
            lib.get::<*mut c_void>(symbol.as_bytes_with_nul())
                .map(|sym| *sym as *const c_void)
                .unwrap_or(std::ptr::null())
        }
    })))
});

pub(crate) static GLX_EXTRA: Lazy<Option<GlxExtra>> = Lazy::new(|| {
    let glx = GLX.as_ref()?;
    Some(GlxExtra(glx_extra::Glx::load_with(|proc_name| {
        let proc_name = match CString::new(proc_name) {
            Ok(proc_name) => proc_name,
            Err(_) => return std::ptr::null(),
        };
        unsafe { glx.GetProcAddress(proc_name.as_ptr() as *const _) as *const c_void }
    })))
});

/// The X11/GLX platform handle.
#[derive(Debug, Clone)]
pub struct Platform {
    pub(crate) display: Display,
}

impl Platform {
    /// Open the backend over an existing Xlib connection.
    ///
    /// # Safety
    ///
    /// The handle must point at a valid, open Xlib display that outlives
    /// the platform and every widget created from it.
    pub unsafe fn new(display: raw_window_handle::RawDisplayHandle) -> Result<Self> {
        Ok(Self { display: Display::new(display)? })
    }
}

impl crate::platform::GlPlatform for Platform {
    type Config = Config;
    type Context = Context;
    type Parent = x11_dl::xlib::Window;
    type Surface = Surface;
    type Window = x11_dl::xlib::Window;

    fn choose_config(&self, template: &crate::config::ConfigTemplate) -> Result<Self::Config> {
        self.display.find_best_config(template)
    }

    fn describe_config(&self, config: &Self::Config) -> crate::format::FormatDetails {
        config.details()
    }

    fn formats_compatible(&self, own: &Self::Config, donor: &Self::Config) -> bool {
        // A context only transfers between widgets on the same visual.
        own.visual_id() == donor.visual_id()
    }

    fn create_context(
        &self,
        config: &Self::Config,
        profile: crate::context::GlProfile,
    ) -> Result<Self::Context> {
        self.display.create_context(config, profile)
    }

    fn make_current_without_surface(&self, _context: &Self::Context) -> Result<()> {
        // GLX cannot bind a context without a drawable; early GL calls on
        // this platform go to whatever context the thread already has.
        Ok(())
    }

    fn create_window_surface(
        &self,
        config: &Self::Config,
        template: &crate::config::ConfigTemplate,
        parent: Self::Parent,
        width: u32,
        height: u32,
    ) -> Result<(Self::Surface, Self::Window)> {
        self.display.create_window_surface(config, template, parent, width, height)
    }

    fn create_placeholder_window(
        &self,
        parent: Self::Parent,
        width: u32,
        height: u32,
    ) -> Self::Window {
        self.display.create_placeholder_window(parent, width, height)
    }

    fn pbuffer_min_size(&self, _context: &Self::Context) -> (u32, u32) {
        (1, 1)
    }

    fn create_pbuffer(
        &self,
        config: &Self::Config,
        _context: &Self::Context,
        width: u32,
        height: u32,
    ) -> Result<Self::Surface> {
        self.display.create_pbuffer(config, width, height)
    }

    fn make_current(&self, context: &Self::Context, surface: &Self::Surface) -> Result<()> {
        self.display.make_current(context, surface.drawable())
    }

    fn surface_is_bound(&self, context: &Self::Context, surface: &Self::Surface) -> bool {
        self.display.is_bound(context, surface)
    }

    fn bind_surface(&self, context: &Self::Context, surface: &Self::Surface) -> Result<()> {
        // Binding a GLX context always names the drawable.
        self.display.make_current(context, surface.drawable())
    }

    fn clear_current(&self) {
        self.display.clear_current();
    }

    fn swap_buffers(&self, _context: &Self::Context, surface: &Self::Surface) -> Result<()> {
        self.display.swap_buffers(surface)
    }

    fn flush(&self) {
        unsafe {
            self.display.gl().Flush();
        }
    }

    fn set_swap_interval(
        &self,
        _context: &Self::Context,
        surface: &Self::Surface,
        interval: u16,
    ) -> Result<()> {
        self.display.set_swap_interval(surface, interval)
    }

    fn force_front_buffer_rendering(
        &self,
        context: &Self::Context,
        surface: &Self::Surface,
    ) -> Result<()> {
        self.display.make_current(context, surface.drawable())?;
        crate::gl_utils::force_front_buffer(self.display.gl());
        Ok(())
    }

    fn copy_context(&self, from: &Self::Context, to: &Self::Context, mask: u32) -> Result<()> {
        self.display.copy_context(from, to, mask)
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
        Ok(crate::gl_utils::read_rgba_pixels(self.display.gl(), width, height, read_front, ramps))
    }

    fn index_bits(&self, _context: &Self::Context) -> u8 {
        crate::gl_utils::index_bits(self.display.gl())
    }

    fn extensions(
        &self,
        _context: &Self::Context,
        profile: crate::context::GlProfile,
    ) -> Result<String> {
        crate::gl_utils::extensions_string(self.display.gl(), !profile.is_core())
    }
}

thread_local! {
    static X_ERROR_CODE: Cell<u8> = const { Cell::new(0) };
}

unsafe extern "C" fn x_error_trap(_dpy: *mut xlib::Display, event: *mut XErrorEvent) -> c_int {
    X_ERROR_CODE.with(|code| code.set((*event).error_code));
    0
}

/// Run an Xlib/GLX call with errors trapped instead of routed to the
/// process-wide handler, turning any X error into a [`Result`].
pub(crate) fn with_x_error_trap<T>(
    xlib: &Xlib,
    dpy: *mut xlib::Display,
    f: impl FnOnce() -> T,
) -> Result<T> {
    unsafe {
        X_ERROR_CODE.with(|code| code.set(0));
        let previous = (xlib.XSetErrorHandler)(Some(x_error_trap));
        let value = f();
        (xlib.XSync)(dpy, 0);
        (xlib.XSetErrorHandler)(previous);

        let code = X_ERROR_CODE.with(|code| code.get());
        if code == 0 {
            return Ok(value);
        }

        let mut buffer = [0 as std::os::raw::c_char; 256];
        (xlib.XGetErrorText)(dpy, code as c_int, buffer.as_mut_ptr(), buffer.len() as c_int);
        let message = CStr::from_ptr(buffer.as_ptr()).to_string_lossy().into_owned();
        Err(Error::new(Some(code as i64), Some(message), ErrorKind::Misc))
    }
}
