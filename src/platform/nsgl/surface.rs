//! The NSView and pixel-buffer drawables.

use std::fmt;

use objc2::rc::Retained;
use objc2::{MainThreadMarker, MainThreadOnly};
use objc2_app_kit::NSView;
use objc2_foundation::{NSPoint, NSRect, NSSize};

use crate::error::{Error, ErrorKind, Result};

use super::appkit::NSOpenGLPixelBuffer;
use super::context::Context;

// Not exported by the system GL headers anymore, still understood by the
// pixel-buffer machinery.
const GL_TEXTURE_2D: u32 = 0x0DE1;
const GL_TEXTURE_RECTANGLE: u32 = 0x84F5;
const GL_RGB: u32 = 0x1907;
const GL_RGBA: u32 = 0x1908;

/// The drawable side of a widget: a subview of the toolkit window, or an
/// off-screen pixel buffer.
pub enum Surface {
    View(Retained<NSView>),
    Pbuffer(Retained<NSOpenGLPixelBuffer>),
}

pub(crate) fn create_view_surface(
    mtm: MainThreadMarker,
    parent: *mut NSView,
    width: u32,
    height: u32,
) -> Result<(Surface, *mut NSView)> {
    if parent.is_null() {
        return Err(ErrorKind::BadNativeWindow.into());
    }

    let frame = NSRect::new(
        NSPoint::new(0.0, 0.0),
        NSSize::new(width as f64, height as f64),
    );
    let view = unsafe { NSView::initWithFrame(NSView::alloc(mtm), frame) };
    unsafe {
        view.setWantsBestResolutionOpenGLSurface(false);
        (*parent).addSubview(&view);
    }

    let raw = Retained::as_ptr(&view) as *mut NSView;
    Ok((Surface::View(view), raw))
}

pub(crate) fn create_pbuffer(
    context: &Context,
    has_alpha: bool,
    width: u32,
    height: u32,
) -> Result<Surface> {
    let target = if width.is_power_of_two() && height.is_power_of_two() {
        GL_TEXTURE_2D
    } else {
        GL_TEXTURE_RECTANGLE
    };
    let internal_format = if has_alpha { GL_RGBA } else { GL_RGB };

    let pbuffer = NSOpenGLPixelBuffer::newWithTextureTarget(
        target,
        internal_format,
        0,
        width as i32,
        height as i32,
    )
    .ok_or_else(|| Error::with_message(ErrorKind::BadPbuffer, "unable to allocate pbuffer"))?;

    // Attaching allocates the framebuffer storage.
    let surface = Surface::Pbuffer(pbuffer);
    context.bind_surface(&surface);
    Ok(surface)
}

impl Drop for Surface {
    fn drop(&mut self) {
        if let Surface::View(view) = self {
            view.removeFromSuperview();
        }
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Surface::View(view) => f.debug_tuple("Surface::View").field(view).finish(),
            Surface::Pbuffer(pbuffer) => f.debug_tuple("Surface::Pbuffer").field(pbuffer).finish(),
        }
    }
}
