//! Creation and binding of the `NSOpenGLContext`.

use std::fmt;

use objc2::rc::Retained;

use crate::error::{ErrorKind, Result};

use super::appkit::{NSOpenGLCPSwapInterval, NSOpenGLContext};
use super::config::Config;
use super::surface::Surface;

pub(crate) fn create_context(config: &Config) -> Result<Context> {
    let raw = NSOpenGLContext::newWithFormat_shareContext(&config.raw, None)
        .ok_or(ErrorKind::BadContext)?;
    Ok(Context { raw })
}

/// A wrapper around the `NSOpenGLContext`.
pub struct Context {
    pub(crate) raw: Retained<NSOpenGLContext>,
}

impl Context {
    pub(crate) fn make_current(&self) {
        self.raw.makeCurrentContext();
    }

    pub(crate) fn bind_surface(&self, surface: &Surface) {
        match surface {
            Surface::View(view) => unsafe {
                self.raw.setView(Some(view));
            },
            Surface::Pbuffer(pbuffer) => unsafe {
                let screen = self.raw.currentVirtualScreen();
                self.raw.setPixelBuffer(pbuffer, 0, 0, screen);
            },
        }
    }

    pub(crate) fn surface_is_bound(&self, surface: &Surface) -> bool {
        match surface {
            Surface::View(view) => match self.raw.view() {
                Some(bound) => Retained::as_ptr(&bound) == Retained::as_ptr(view),
                None => false,
            },
            // The pixel buffer cannot be queried back; rebinding it is
            // cheap and idempotent, so report it as never bound.
            Surface::Pbuffer(_) => false,
        }
    }

    pub(crate) fn flush_buffer(&self) {
        self.raw.flushBuffer();
    }

    pub(crate) fn update(&self) {
        self.raw.update();
    }

    pub(crate) fn set_swap_interval(&self, interval: u16) {
        let interval = interval as super::appkit::GLint;
        unsafe {
            self.raw.setValues_forParameter(&interval, NSOpenGLCPSwapInterval);
        }
    }

    pub(crate) fn copy_from(&self, source: &Context, mask: u32) {
        unsafe {
            self.raw.copyAttributesFromContext_withMask(&source.raw, mask);
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("raw", &self.raw).finish()
    }
}
