//! The Windows/WGL platform backend.

use std::ffi::{CString, OsStr};
use std::os::raw::c_void;
use std::os::windows::ffi::OsStrExt;

use windows_sys::Win32::Foundation::HWND;
use windows_sys::Win32::Graphics::Gdi::{GetDC, ReleaseDC, HDC};
use windows_sys::Win32::Graphics::OpenGL::{
    ChoosePixelFormat, SetPixelFormat, PFD_DOUBLEBUFFER, PFD_DRAW_TO_WINDOW, PFD_MAIN_PLANE,
    PFD_SUPPORT_OPENGL, PFD_TYPE_RGBA, PIXELFORMATDESCRIPTOR,
};
use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
use windows_sys::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, RegisterClassW, CS_HREDRAW, CS_OWNDC,
    CS_VREDRAW, WNDCLASSW, WS_CHILD, WS_CLIPCHILDREN, WS_CLIPSIBLINGS, WS_EX_NOPARENTNOTIFY,
    WS_POPUP,
};

use glutin_wgl_sys::{wgl, wgl_extra};

use crate::error::{Error, ErrorKind, Result};

pub mod config;
pub mod context;
pub mod display;
pub mod surface;

pub use config::Config;
pub use context::Context;
pub use display::Display;
pub use surface::Surface;

pub(crate) type WglExtra = wgl_extra::Wgl;

const WINDOW_CLASS_NAME: &str = "TkglRenderWindow";

/// The Windows/WGL platform handle.
#[derive(Debug, Clone)]
pub struct Platform {
    pub(crate) display: Display,
}

impl Platform {
    /// Open the backend, probing the driver's WGL extensions.
    ///
    /// # Safety
    ///
    /// Must be called on the thread that owns the windows the widgets will
    /// be parented into.
    pub unsafe fn new() -> Result<Self> {
        Ok(Self { display: Display::new()? })
    }
}

impl crate::platform::GlPlatform for Platform {
    type Config = Config;
    type Context = Context;
    type Parent = HWND;
    type Surface = Surface;
    type Window = HWND;

    fn choose_config(&self, template: &crate::config::ConfigTemplate) -> Result<Self::Config> {
        self.display.find_best_config(template)
    }

    fn describe_config(&self, config: &Self::Config) -> crate::format::FormatDetails {
        config.details()
    }

    fn formats_compatible(&self, own: &Self::Config, donor: &Self::Config) -> bool {
        // A context only transfers between DCs of the same pixel format.
        own.pixel_format_index() == donor.pixel_format_index()
    }

    fn create_context(
        &self,
        config: &Self::Config,
        profile: crate::context::GlProfile,
    ) -> Result<Self::Context> {
        self.display.create_context(config, profile)
    }

    fn make_current_without_surface(&self, context: &Self::Context) -> Result<()> {
        // Bind through the hidden window the context was created on.
        self.display.make_current(context, context.hidden_hdc())
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
        context: &Self::Context,
        width: u32,
        height: u32,
    ) -> Result<Self::Surface> {
        self.display.create_pbuffer(config, context, width, height)
    }

    fn make_current(&self, context: &Self::Context, surface: &Self::Surface) -> Result<()> {
        self.display.make_current(context, surface.hdc())
    }

    fn surface_is_bound(&self, context: &Self::Context, surface: &Self::Surface) -> bool {
        self.display.is_bound(context, surface)
    }

    fn bind_surface(&self, context: &Self::Context, surface: &Self::Surface) -> Result<()> {
        // Binding a WGL context always names the device context.
        self.display.make_current(context, surface.hdc())
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
        _surface: &Self::Surface,
        interval: u16,
    ) -> Result<()> {
        self.display.set_swap_interval(interval)
    }

    fn force_front_buffer_rendering(
        &self,
        context: &Self::Context,
        surface: &Self::Surface,
    ) -> Result<()> {
        self.display.make_current(context, surface.hdc())?;
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

pub(crate) fn last_os_error(kind: ErrorKind) -> Error {
    let os = std::io::Error::last_os_error();
    Error::new(os.raw_os_error().map(|code| code as i64), Some(os.to_string()), kind)
}

pub(crate) fn wide(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(Some(0)).collect()
}

/// Register (idempotently) the window class used for rendering windows.
pub(crate) fn ensure_window_class() {
    let class_name = wide(WINDOW_CLASS_NAME);
    unsafe {
        let mut class: WNDCLASSW = std::mem::zeroed();
        class.style = CS_HREDRAW | CS_VREDRAW | CS_OWNDC;
        class.lpfnWndProc = Some(DefWindowProcW);
        class.hInstance = GetModuleHandleW(std::ptr::null());
        class.lpszClassName = class_name.as_ptr();
        // Re-registration fails harmlessly once the class exists.
        RegisterClassW(&class);
    }
}

/// A window plus its device context, released together.
pub(crate) struct WindowDc {
    pub hwnd: HWND,
    pub hdc: HDC,
}

impl WindowDc {
    pub(crate) fn create(parent: HWND, width: u32, height: u32) -> Result<Self> {
        ensure_window_class();
        let class_name = wide(WINDOW_CLASS_NAME);

        let (style, ex_style) = if parent != 0 {
            (WS_CHILD | WS_CLIPCHILDREN | WS_CLIPSIBLINGS, WS_EX_NOPARENTNOTIFY)
        } else {
            (WS_POPUP | WS_CLIPCHILDREN, WS_EX_NOPARENTNOTIFY)
        };

        unsafe {
            let hwnd = CreateWindowExW(
                ex_style,
                class_name.as_ptr(),
                std::ptr::null(),
                style,
                0,
                0,
                width as i32,
                height as i32,
                parent,
                0,
                GetModuleHandleW(std::ptr::null()),
                std::ptr::null(),
            );
            if hwnd == 0 {
                return Err(last_os_error(ErrorKind::BadNativeWindow));
            }

            let hdc = GetDC(hwnd);
            if hdc == 0 {
                DestroyWindow(hwnd);
                return Err(last_os_error(ErrorKind::BadNativeWindow));
            }

            Ok(Self { hwnd, hdc })
        }
    }

}

impl Drop for WindowDc {
    fn drop(&mut self) {
        unsafe {
            if self.hdc != 0 {
                ReleaseDC(self.hwnd, self.hdc);
            }
            if self.hwnd != 0 {
                DestroyWindow(self.hwnd);
            }
        }
    }
}

impl std::fmt::Debug for WindowDc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowDc").field("hwnd", &self.hwnd).field("hdc", &self.hdc).finish()
    }
}

/// Create the hidden probe window every driver query runs against.
///
/// WGL can only be asked about pixel formats through a device context
/// that already carries a simple GL-capable format.
pub(crate) fn create_probe_window() -> Result<WindowDc> {
    let window = WindowDc::create(0, 1, 1)?;

    let mut descriptor: PIXELFORMATDESCRIPTOR = unsafe { std::mem::zeroed() };
    descriptor.nSize = std::mem::size_of::<PIXELFORMATDESCRIPTOR>() as u16;
    descriptor.nVersion = 1;
    descriptor.dwFlags = PFD_DRAW_TO_WINDOW | PFD_SUPPORT_OPENGL | PFD_DOUBLEBUFFER;
    descriptor.iPixelType = PFD_TYPE_RGBA;
    descriptor.cColorBits = 24;
    descriptor.cDepthBits = 24;
    descriptor.iLayerType = PFD_MAIN_PLANE;

    unsafe {
        let format = ChoosePixelFormat(window.hdc, &descriptor);
        if format == 0 {
            return Err(last_os_error(ErrorKind::NoMatchingFormat));
        }
        if SetPixelFormat(window.hdc, format, &descriptor) == 0 {
            return Err(last_os_error(ErrorKind::NoMatchingFormat));
        }
    }

    Ok(window)
}

pub(crate) fn get_proc_address(lib_opengl32: isize, addr: &str) -> *const c_void {
    let addr = match CString::new(addr) {
        Ok(addr) => addr,
        Err(_) => return std::ptr::null(),
    };
    unsafe {
        let ptr = wgl::GetProcAddress(addr.as_ptr()) as *const c_void;
        if !ptr.is_null() {
            return ptr;
        }
        // GL 1.1 entry points live in opengl32.dll itself.
        windows_sys::Win32::System::LibraryLoader::GetProcAddress(
            lib_opengl32,
            addr.as_ptr().cast(),
        )
        .map(|f| f as *const c_void)
        .unwrap_or(std::ptr::null())
    }
}
