//! The X drawables a GLX context renders into.

use std::fmt;
use std::os::raw::c_int;

use glutin_glx_sys::glx;
use glutin_glx_sys::glx::types::GLXDrawable;
use x11_dl::xlib;

use crate::config::ConfigTemplate;
use crate::error::{Error, ErrorKind, Result};
use crate::surface::SurfaceKind;

use super::config::Config;
use super::display::Display;
use super::with_x_error_trap;

// The widget window wants the whole event dispatch the toolkit expects.
const ALL_EVENTS_MASK: std::os::raw::c_long = xlib::KeyPressMask
    | xlib::KeyReleaseMask
    | xlib::ButtonPressMask
    | xlib::ButtonReleaseMask
    | xlib::EnterWindowMask
    | xlib::LeaveWindowMask
    | xlib::PointerMotionMask
    | xlib::ExposureMask
    | xlib::VisibilityChangeMask
    | xlib::FocusChangeMask
    | xlib::PropertyChangeMask
    | xlib::ColormapChangeMask;

impl Display {
    pub(crate) fn create_window_surface(
        &self,
        config: &Config,
        template: &ConfigTemplate,
        parent: xlib::Window,
        width: u32,
        height: u32,
    ) -> Result<(Surface, xlib::Window)> {
        let xlib = self.inner.xlib;
        let raw = self.inner.raw;

        let visual_info = unsafe { &*config.visual() };
        let colormap = self.pick_colormap(config, template, visual_info);

        let window = with_x_error_trap(xlib, raw, || unsafe {
            let mut swa: xlib::XSetWindowAttributes = std::mem::zeroed();
            swa.background_pixmap = 0;
            swa.border_pixel = 0;
            swa.colormap = colormap;
            swa.event_mask = ALL_EVENTS_MASK;

            (xlib.XCreateWindow)(
                raw,
                parent,
                0,
                0,
                width,
                height,
                0,
                visual_info.depth,
                xlib::InputOutput as std::os::raw::c_uint,
                visual_info.visual,
                xlib::CWBackPixmap | xlib::CWBorderPixel | xlib::CWColormap | xlib::CWEventMask,
                &mut swa,
            )
        })?;

        if window == 0 {
            return Err(ErrorKind::BadNativeWindow.into());
        }

        // The window manager has to install the widget's colormap when the
        // cursor enters it, which matters for color-index rendering.
        unsafe {
            let mut windows = [window];
            (xlib.XSetWMColormapWindows)(raw, window, windows.as_mut_ptr(), 1);
        }

        let surface = Surface {
            display: self.clone(),
            drawable: window as GLXDrawable,
            kind: SurfaceKind::Window,
        };
        Ok((surface, window))
    }

    fn pick_colormap(
        &self,
        config: &Config,
        template: &ConfigTemplate,
        visual_info: &xlib::XVisualInfo,
    ) -> xlib::Colormap {
        let xlib = self.inner.xlib;
        let raw = self.inner.raw;
        let screen = self.inner.screen;

        unsafe {
            let default_visual = (xlib.XDefaultVisual)(raw, screen);
            let root = (xlib.XRootWindow)(raw, visual_info.screen);

            if !template.is_color_index() {
                if visual_info.visual == default_visual {
                    (xlib.XDefaultColormap)(raw, screen)
                } else {
                    (xlib.XCreateColormap)(raw, root, visual_info.visual, xlib::AllocNone)
                }
            } else if template.private_colormap {
                // A writable map, so the application can install its own
                // index colors.
                (xlib.XCreateColormap)(raw, root, visual_info.visual, xlib::AllocAll)
            } else if visual_info.visual == default_visual {
                (xlib.XDefaultColormap)(raw, screen)
            } else {
                (xlib.XCreateColormap)(raw, root, visual_info.visual, xlib::AllocNone)
            }
        }
    }

    pub(crate) fn create_placeholder_window(
        &self,
        parent: xlib::Window,
        width: u32,
        height: u32,
    ) -> xlib::Window {
        let xlib = self.inner.xlib;
        unsafe {
            (xlib.XCreateSimpleWindow)(
                self.inner.raw,
                parent,
                0,
                0,
                width.max(1),
                height.max(1),
                0,
                0,
                0,
            )
        }
    }

    pub(crate) fn create_pbuffer(
        &self,
        config: &Config,
        width: u32,
        height: u32,
    ) -> Result<Surface> {
        let attrs = [
            glx::PRESERVED_CONTENTS as c_int,
            1,
            glx::PBUFFER_WIDTH as c_int,
            width as c_int,
            glx::PBUFFER_HEIGHT as c_int,
            height as c_int,
            0,
        ];

        let pbuffer = with_x_error_trap(self.inner.xlib, self.inner.raw, || unsafe {
            self.inner.glx.CreatePbuffer(
                self.inner.raw.cast(),
                *config.inner.raw,
                attrs.as_ptr(),
            )
        })
        .map_err(|_| Error::with_message(ErrorKind::BadPbuffer, "unable to allocate pbuffer"))?;

        if pbuffer == 0 {
            return Err(Error::with_message(ErrorKind::BadPbuffer, "unable to allocate pbuffer"));
        }

        Ok(Surface { display: self.clone(), drawable: pbuffer, kind: SurfaceKind::Pbuffer })
    }

    pub(crate) fn swap_buffers(&self, surface: &Surface) -> Result<()> {
        with_x_error_trap(self.inner.xlib, self.inner.raw, || unsafe {
            self.inner.glx.SwapBuffers(self.inner.raw.cast(), surface.drawable);
        })
    }
}

/// The drawable side of a widget: the widget's X window or its pbuffer.
///
/// The toolkit owns the X window proper, so only pbuffers are released on
/// drop.
pub struct Surface {
    display: Display,
    drawable: GLXDrawable,
    kind: SurfaceKind,
}

impl Surface {
    pub(crate) fn drawable(&self) -> GLXDrawable {
        self.drawable
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        if self.kind == SurfaceKind::Pbuffer {
            unsafe {
                self.display
                    .inner
                    .glx
                    .DestroyPbuffer(self.display.inner.raw.cast(), self.drawable);
            }
        }
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("drawable", &self.drawable)
            .field("kind", &self.kind)
            .finish()
    }
}
