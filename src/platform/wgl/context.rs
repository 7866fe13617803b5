//! Creation and binding of the `HGLRC`.

use std::fmt;
use std::os::raw::{c_int, c_void};

use glutin_wgl_sys::{wgl, wgl_extra};
use windows_sys::Win32::Graphics::OpenGL::{
    DescribePixelFormat, SetPixelFormat, PIXELFORMATDESCRIPTOR,
};

use crate::context::GlProfile;
use crate::error::{ErrorKind, Result};
use crate::platform::DisplayFeatures;

use super::config::Config;
use super::display::Display;
use super::surface::Surface;
use super::{last_os_error, WindowDc};

impl Display {
    pub(crate) fn create_context(&self, config: &Config, profile: GlProfile) -> Result<Context> {
        // A rendering context can only be created through a device context
        // that already carries the negotiated format, and the widget's own
        // window may not exist yet. A hidden window bridges the gap and
        // doubles as the binding target before the widget is mapped.
        let hidden = WindowDc::create(0, 1, 1)?;
        set_config_on_dc(hidden.hdc, config)?;

        let raw = if self.inner.features.contains(DisplayFeatures::CREATE_CONTEXT_WITH_VERSION) {
            let wgl_extra = self.inner.wgl_extra.as_ref().ok_or(ErrorKind::NotFound)?;
            let (major, minor) = profile.version();
            let mut attrs = Vec::<c_int>::with_capacity(8);

            attrs.push(wgl_extra::CONTEXT_MAJOR_VERSION_ARB as c_int);
            attrs.push(major as c_int);
            attrs.push(wgl_extra::CONTEXT_MINOR_VERSION_ARB as c_int);
            attrs.push(minor as c_int);

            attrs.push(wgl_extra::CONTEXT_PROFILE_MASK_ARB as c_int);
            if profile.is_core() {
                attrs.push(wgl_extra::CONTEXT_CORE_PROFILE_BIT_ARB as c_int);
            } else {
                attrs.push(wgl_extra::CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB as c_int);
            }

            attrs.push(0);

            unsafe {
                wgl_extra.CreateContextAttribsARB(
                    hidden.hdc as *const c_void,
                    std::ptr::null(),
                    attrs.as_ptr(),
                )
            }
        } else {
            if profile.is_core() {
                return Err(ErrorKind::NotSupported(
                    "core profiles need the WGL_ARB_create_context extension",
                )
                .into());
            }
            unsafe { wgl::CreateContext(hidden.hdc as *const c_void) }
        };

        if raw.is_null() {
            return Err(last_os_error(ErrorKind::BadContext));
        }

        Ok(Context { raw: WglContext(raw), hidden })
    }

    pub(crate) fn make_current(
        &self,
        context: &Context,
        hdc: windows_sys::Win32::Graphics::Gdi::HDC,
    ) -> Result<()> {
        unsafe {
            if wgl::MakeCurrent(hdc as *const c_void, context.raw.0) == 0 {
                return Err(last_os_error(ErrorKind::BadContext));
            }
        }
        Ok(())
    }

    pub(crate) fn clear_current(&self) {
        unsafe {
            wgl::MakeCurrent(std::ptr::null(), std::ptr::null());
        }
    }

    pub(crate) fn copy_context(&self, from: &Context, to: &Context, mask: u32) -> Result<()> {
        unsafe {
            if wgl::CopyContext(from.raw.0, to.raw.0, mask) == 0 {
                return Err(last_os_error(ErrorKind::BadContext));
            }
        }
        Ok(())
    }

    pub(crate) fn is_bound(&self, context: &Context, surface: &Surface) -> bool {
        unsafe {
            wgl::GetCurrentContext() == context.raw.0
                && wgl::GetCurrentDC() == surface.hdc() as *const c_void
        }
    }

    pub(crate) fn set_swap_interval(&self, interval: u16) -> Result<()> {
        let wgl_extra = match self.inner.wgl_extra.as_ref() {
            Some(wgl_extra)
                if self.inner.features.contains(DisplayFeatures::SWAP_CONTROL)
                    && wgl_extra.SwapIntervalEXT.is_loaded() =>
            {
                wgl_extra
            },
            _ => {
                return Err(
                    ErrorKind::NotSupported("swap control extensions are not supported").into()
                )
            },
        };

        unsafe {
            if wgl_extra.SwapIntervalEXT(interval as c_int) == 0 {
                return Err(last_os_error(ErrorKind::Misc));
            }
        }
        Ok(())
    }
}

pub(crate) fn set_config_on_dc(
    hdc: windows_sys::Win32::Graphics::Gdi::HDC,
    config: &Config,
) -> Result<()> {
    unsafe {
        let mut descriptor: PIXELFORMATDESCRIPTOR = std::mem::zeroed();
        if DescribePixelFormat(
            hdc,
            config.pixel_format_index(),
            std::mem::size_of::<PIXELFORMATDESCRIPTOR>() as u32,
            &mut descriptor,
        ) == 0
        {
            return Err(last_os_error(ErrorKind::BadConfig));
        }

        if SetPixelFormat(hdc, config.pixel_format_index(), &descriptor) == 0 {
            return Err(last_os_error(ErrorKind::BadConfig));
        }
    }
    Ok(())
}

/// A WGL rendering context together with the hidden window it was created
/// on; deletes itself when dropped.
pub struct Context {
    raw: WglContext,
    pub(crate) hidden: WindowDc,
}

impl Context {
    pub(crate) fn hidden_hdc(&self) -> windows_sys::Win32::Graphics::Gdi::HDC {
        self.hidden.hdc
    }
}

struct WglContext(*const c_void);

impl Drop for WglContext {
    fn drop(&mut self) {
        unsafe {
            wgl::DeleteContext(self.0);
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("raw", &self.raw.0).finish()
    }
}
