//! The drawables a WGL context renders into.

use std::fmt;
use std::os::raw::{c_int, c_void};

use windows_sys::Win32::Foundation::{HMODULE, HWND};
use windows_sys::Win32::Graphics::Gdi::{ReleaseDC, HDC};
use windows_sys::Win32::Graphics::OpenGL::SwapBuffers;
use windows_sys::Win32::UI::WindowsAndMessaging::{ShowWindow, SW_HIDE};

use crate::config::ConfigTemplate;
use crate::error::{Error, ErrorKind, Result};
use crate::surface::SurfaceKind;

use super::config::Config;
use super::context::{set_config_on_dc, Context};
use super::display::Display;
use super::{get_proc_address, last_os_error, WindowDc};

// From WGL_ARB_pbuffer, which the generated extension table does not
// cover; the entry points are resolved by hand below.
pub(crate) const DRAW_TO_PBUFFER_ARB: c_int = 0x202D;

pub(crate) type HPbufferArb = *const c_void;

/// The `WGL_ARB_pbuffer` entry points, resolved through
/// `wglGetProcAddress` while the probe context is current.
#[allow(clippy::type_complexity)]
pub(crate) struct PbufferFns {
    pub(crate) create:
        unsafe extern "system" fn(HDC, c_int, c_int, c_int, *const c_int) -> HPbufferArb,
    pub(crate) get_dc: unsafe extern "system" fn(HPbufferArb) -> HDC,
    pub(crate) release_dc: unsafe extern "system" fn(HPbufferArb, HDC) -> c_int,
    pub(crate) destroy: unsafe extern "system" fn(HPbufferArb) -> c_int,
}

impl PbufferFns {
    pub(crate) unsafe fn load(lib_opengl32: HMODULE) -> Option<Self> {
        let load = |name: &str| {
            let ptr = get_proc_address(lib_opengl32, name);
            (!ptr.is_null()).then_some(ptr)
        };
        Some(Self {
            create: std::mem::transmute(load("wglCreatePbufferARB")?),
            get_dc: std::mem::transmute(load("wglGetPbufferDCARB")?),
            release_dc: std::mem::transmute(load("wglReleasePbufferDCARB")?),
            destroy: std::mem::transmute(load("wglDestroyPbufferARB")?),
        })
    }
}

impl fmt::Debug for PbufferFns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PbufferFns").finish()
    }
}

impl Display {
    pub(crate) fn create_window_surface(
        &self,
        config: &Config,
        _template: &ConfigTemplate,
        parent: HWND,
        width: u32,
        height: u32,
    ) -> Result<(Surface, HWND)> {
        let window = WindowDc::create(parent, width, height)?;
        set_config_on_dc(window.hdc, config)?;

        // The toolkit takes over the window; the surface keeps the DC.
        let (hwnd, hdc) = (window.hwnd, window.hdc);
        std::mem::forget(window);

        let surface = Surface {
            display: self.clone(),
            hwnd,
            hdc,
            pbuffer: std::ptr::null(),
            kind: SurfaceKind::Window,
        };
        Ok((surface, hwnd))
    }

    pub(crate) fn create_placeholder_window(
        &self,
        parent: HWND,
        width: u32,
        height: u32,
    ) -> HWND {
        match WindowDc::create(parent, width.max(1), height.max(1)) {
            Ok(window) => {
                let (hwnd, hdc) = (window.hwnd, window.hdc);
                std::mem::forget(window);
                unsafe {
                    ReleaseDC(hwnd, hdc);
                    ShowWindow(hwnd, SW_HIDE);
                }
                hwnd
            },
            // A window the toolkit can track always comes back, even if
            // it is the desktop-parented null case.
            Err(_) => 0,
        }
    }

    pub(crate) fn create_pbuffer(
        &self,
        config: &Config,
        context: &Context,
        width: u32,
        height: u32,
    ) -> Result<Surface> {
        let fns = self
            .inner
            .pbuffer_fns
            .as_ref()
            .ok_or(ErrorKind::NotSupported("pbuffers are not supported"))?;

        unsafe {
            let attrs = [0 as c_int];
            let pbuffer = (fns.create)(
                context.hidden_hdc(),
                config.pixel_format_index(),
                width as c_int,
                height as c_int,
                attrs.as_ptr(),
            );
            if pbuffer.is_null() {
                return Err(Error::with_message(
                    ErrorKind::BadPbuffer,
                    "unable to allocate pbuffer",
                ));
            }

            let hdc = (fns.get_dc)(pbuffer);
            if hdc == 0 {
                (fns.destroy)(pbuffer);
                return Err(last_os_error(ErrorKind::BadPbuffer));
            }

            Ok(Surface {
                display: self.clone(),
                hwnd: 0,
                hdc,
                pbuffer,
                kind: SurfaceKind::Pbuffer,
            })
        }
    }

    pub(crate) fn swap_buffers(&self, surface: &Surface) -> Result<()> {
        unsafe {
            if SwapBuffers(surface.hdc) == 0 {
                return Err(last_os_error(ErrorKind::BadSurface));
            }
        }
        Ok(())
    }
}

/// The drawable side of a widget: a child window's DC or a pbuffer.
///
/// The toolkit owns the window itself, so dropping a window surface only
/// releases the DC; pbuffers are destroyed outright.
pub struct Surface {
    display: Display,
    hwnd: HWND,
    hdc: HDC,
    pbuffer: HPbufferArb,
    kind: SurfaceKind,
}

impl Surface {
    pub(crate) fn hdc(&self) -> HDC {
        self.hdc
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        unsafe {
            match self.kind {
                SurfaceKind::Window => {
                    ReleaseDC(self.hwnd, self.hdc);
                },
                SurfaceKind::Pbuffer => {
                    if let Some(fns) = self.display.inner.pbuffer_fns.as_ref() {
                        (fns.release_dc)(self.pbuffer, self.hdc);
                        (fns.destroy)(self.pbuffer);
                    }
                },
            }
        }
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("hwnd", &self.hwnd)
            .field("hdc", &self.hdc)
            .field("kind", &self.kind)
            .finish()
    }
}
