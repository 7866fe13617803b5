//! Creation and binding of the `GLXContext`.

use std::fmt;
use std::ops::Deref;
use std::os::raw::c_int;

use glutin_glx_sys::glx::types::{GLXContext, GLXDrawable};
use glutin_glx_sys::glx_extra;

use crate::context::GlProfile;
use crate::error::{ErrorKind, Result};
use crate::platform::DisplayFeatures;

use super::config::Config;
use super::display::Display;
use super::surface::Surface;
use super::with_x_error_trap;

impl Display {
    pub(crate) fn create_context(&self, config: &Config, profile: GlProfile) -> Result<Context> {
        let context = if self.inner.features.contains(DisplayFeatures::CREATE_CONTEXT_WITH_VERSION)
            && self.inner.glx_extra.is_some()
        {
            self.create_context_arb(config, profile)?
        } else {
            if profile.is_core() {
                return Err(ErrorKind::NotSupported(
                    "core profiles need the GLX_ARB_create_context extension",
                )
                .into());
            }
            self.create_context_legacy(config)?
        };

        if context.is_null() {
            return Err(ErrorKind::BadContext.into());
        }

        Ok(Context { display: self.clone(), raw: GlxContext(context) })
    }

    fn create_context_arb(&self, config: &Config, profile: GlProfile) -> Result<GLXContext> {
        let extra = self.inner.glx_extra.ok_or(ErrorKind::NotFound)?;
        let (major, minor) = profile.version();

        let attrs = [
            glx_extra::CONTEXT_MAJOR_VERSION_ARB as c_int,
            major as c_int,
            glx_extra::CONTEXT_MINOR_VERSION_ARB as c_int,
            minor as c_int,
            0,
        ];

        with_x_error_trap(self.inner.xlib, self.inner.raw, || unsafe {
            extra.CreateContextAttribsARB(
                self.inner.raw.cast(),
                *config.inner.raw,
                std::ptr::null(),
                // Indirect contexts are rejected by modern servers.
                1,
                attrs.as_ptr(),
            )
        })
    }

    fn create_context_legacy(&self, config: &Config) -> Result<GLXContext> {
        with_x_error_trap(self.inner.xlib, self.inner.raw, || unsafe {
            self.inner.glx.CreateContext(
                self.inner.raw.cast(),
                config.visual().cast(),
                std::ptr::null(),
                1,
            )
        })
    }

    pub(crate) fn make_current(&self, context: &Context, drawable: GLXDrawable) -> Result<()> {
        with_x_error_trap(self.inner.xlib, self.inner.raw, || unsafe {
            self.inner.glx.MakeCurrent(self.inner.raw.cast(), drawable, *context.raw);
        })
    }

    pub(crate) fn clear_current(&self) {
        unsafe {
            self.inner.glx.MakeCurrent(self.inner.raw.cast(), 0, std::ptr::null());
        }
    }

    pub(crate) fn copy_context(&self, from: &Context, to: &Context, mask: u32) -> Result<()> {
        with_x_error_trap(self.inner.xlib, self.inner.raw, || unsafe {
            self.inner.glx.CopyContext(self.inner.raw.cast(), *from.raw, *to.raw, mask as _);
        })
    }

    pub(crate) fn is_bound(&self, context: &Context, surface: &Surface) -> bool {
        unsafe {
            self.inner.glx.GetCurrentContext() == *context.raw
                && self.inner.glx.GetCurrentDrawable() == surface.drawable()
        }
    }

    pub(crate) fn set_swap_interval(&self, surface: &Surface, interval: u16) -> Result<()> {
        let extra = match self.inner.glx_extra {
            Some(extra) if self.inner.features.contains(DisplayFeatures::SWAP_CONTROL) => extra,
            _ => {
                return Err(
                    ErrorKind::NotSupported("swap control extensions are not supported").into()
                )
            },
        };

        if self.inner.client_extensions.contains("GLX_EXT_swap_control") {
            with_x_error_trap(self.inner.xlib, self.inner.raw, || unsafe {
                extra.SwapIntervalEXT(self.inner.raw.cast(), surface.drawable(), interval as _);
            })
        } else if self.inner.client_extensions.contains("GLX_MESA_swap_control") {
            unsafe {
                extra.SwapIntervalMESA(interval as _);
            }
            Ok(())
        } else {
            unsafe {
                extra.SwapIntervalSGI(interval as _);
            }
            Ok(())
        }
    }
}

/// A GLX rendering context; destroys itself when dropped.
pub struct Context {
    display: Display,
    raw: GlxContext,
}

impl Drop for Context {
    fn drop(&mut self) {
        unsafe {
            self.display.inner.glx.DestroyContext(self.display.inner.raw.cast(), *self.raw);
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("raw", &self.raw).finish()
    }
}

#[derive(Debug)]
struct GlxContext(GLXContext);

impl Deref for GlxContext {
    type Target = GLXContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
