//! GL helpers shared by the platform backends.
//!
//! The backends only need a handful of GL entry points: the pixel
//! readback behind screenshots, the extension-string queries, and the
//! front-buffer redirection for emulated single buffering. The bindings
//! are generated at build time and loaded through the platform's
//! `get_proc_address`.

use std::ffi::CStr;

use crate::error::{ErrorKind, Result};
use crate::gl::types::{GLenum, GLint};
use crate::gl::{self, Gl};
use crate::photo::ColorRamps;

/// Saves the pixel-pack state on creation and restores it on drop, so a
/// readback leaves the caller's GL state untouched.
struct PixelPackGuard<'a> {
    gl: &'a Gl,
    alignment: GLint,
    row_length: GLint,
    swap_bytes: GLint,
    skip_rows: GLint,
    skip_pixels: GLint,
}

impl<'a> PixelPackGuard<'a> {
    fn new(gl: &'a Gl) -> Self {
        unsafe {
            let mut guard = PixelPackGuard {
                gl,
                alignment: 0,
                row_length: 0,
                swap_bytes: 0,
                skip_rows: 0,
                skip_pixels: 0,
            };
            gl.GetIntegerv(gl::PACK_ALIGNMENT, &mut guard.alignment);
            gl.GetIntegerv(gl::PACK_ROW_LENGTH, &mut guard.row_length);
            gl.GetIntegerv(gl::PACK_SWAP_BYTES, &mut guard.swap_bytes);
            gl.GetIntegerv(gl::PACK_SKIP_ROWS, &mut guard.skip_rows);
            gl.GetIntegerv(gl::PACK_SKIP_PIXELS, &mut guard.skip_pixels);
            guard
        }
    }
}

impl Drop for PixelPackGuard<'_> {
    fn drop(&mut self) {
        unsafe {
            self.gl.PixelStorei(gl::PACK_ALIGNMENT, self.alignment);
            self.gl.PixelStorei(gl::PACK_ROW_LENGTH, self.row_length);
            self.gl.PixelStorei(gl::PACK_SWAP_BYTES, self.swap_bytes);
            self.gl.PixelStorei(gl::PACK_SKIP_ROWS, self.skip_rows);
            self.gl.PixelStorei(gl::PACK_SKIP_PIXELS, self.skip_pixels);
        }
    }
}

/// Read the color buffer as tightly packed RGBA8, bottom-up.
///
/// The read-buffer selection and pixel-pack state are restored before
/// returning. `ramps` installs the index-to-RGB pixel maps of color-index
/// formats for the duration of the read.
pub(crate) fn read_rgba_pixels(
    gl: &Gl,
    width: u32,
    height: u32,
    read_front: bool,
    ramps: Option<&ColorRamps>,
) -> Vec<u8> {
    let mut data = vec![0u8; width as usize * height as usize * 4];

    unsafe {
        let mut saved_read_buffer: GLint = 0;
        gl.GetIntegerv(gl::READ_BUFFER, &mut saved_read_buffer);
        if read_front {
            gl.ReadBuffer(gl::FRONT);
        }

        if let Some(ramps) = ramps {
            let size = ramps.len() as GLint;
            gl.PixelMapfv(gl::PIXEL_MAP_I_TO_R, size, ramps.red().as_ptr());
            gl.PixelMapfv(gl::PIXEL_MAP_I_TO_G, size, ramps.green().as_ptr());
            gl.PixelMapfv(gl::PIXEL_MAP_I_TO_B, size, ramps.blue().as_ptr());
        }

        {
            let _guard = PixelPackGuard::new(gl);
            gl.PixelStorei(gl::PACK_ALIGNMENT, 4);
            gl.PixelStorei(gl::PACK_SWAP_BYTES, 0);
            gl.PixelStorei(gl::PACK_ROW_LENGTH, 0);
            gl.PixelStorei(gl::PACK_SKIP_ROWS, 0);
            gl.PixelStorei(gl::PACK_SKIP_PIXELS, 0);
            gl.ReadPixels(
                0,
                0,
                width as GLint,
                height as GLint,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                data.as_mut_ptr().cast(),
            );
        }

        gl.ReadBuffer(saved_read_buffer as GLenum);
    }

    data
}

/// Redirect drawing and reading to the front buffer.
pub(crate) fn force_front_buffer(gl: &Gl) {
    unsafe {
        gl.DrawBuffer(gl::FRONT);
        gl.ReadBuffer(gl::FRONT);
    }
}

/// The color-index depth reported by the current context.
pub(crate) fn index_bits(gl: &Gl) -> u8 {
    unsafe {
        let mut bits: GLint = 0;
        gl.GetIntegerv(gl::INDEX_BITS, &mut bits);
        bits.clamp(0, 16) as u8
    }
}

/// The extensions string of the current context.
///
/// Legacy contexts expose one space-separated string; core contexts only
/// support the indexed query, whose entries are joined with spaces here.
pub(crate) fn extensions_string(gl: &Gl, legacy: bool) -> Result<String> {
    unsafe {
        if legacy {
            let raw = gl.GetString(gl::EXTENSIONS);
            if raw.is_null() {
                return Err(ErrorKind::BadContext.into());
            }
            return Ok(CStr::from_ptr(raw.cast()).to_string_lossy().into_owned());
        }

        let mut count: GLint = 0;
        gl.GetIntegerv(gl::NUM_EXTENSIONS, &mut count);

        let mut extensions = String::new();
        for index in 0..count.max(0) as u32 {
            let raw = gl.GetStringi(gl::EXTENSIONS, index);
            if raw.is_null() {
                continue;
            }
            if !extensions.is_empty() {
                extensions.push(' ');
            }
            extensions.push_str(&CStr::from_ptr(raw.cast()).to_string_lossy());
        }

        Ok(extensions)
    }
}
