//! Building and describing the `NSOpenGLPixelFormat`.

use std::fmt;

use objc2::rc::Retained;

use crate::config::{ColorBufferType, ConfigTemplate};
use crate::context::GlProfile;
use crate::error::{ErrorKind, Result};
use crate::format::FormatDetails;

use super::appkit::{
    GLint, NSOpenGLPFAAccumSize, NSOpenGLPFAAlphaSize, NSOpenGLPFAAuxBuffers,
    NSOpenGLPFAColorSize, NSOpenGLPFADepthSize, NSOpenGLPFADoubleBuffer, NSOpenGLPFAMinimumPolicy,
    NSOpenGLPFAMultisample, NSOpenGLPFAOpenGLProfile, NSOpenGLPFASampleBuffers,
    NSOpenGLPFASamples, NSOpenGLPFAStencilSize, NSOpenGLPFAStereo, NSOpenGLPixelFormat,
    NSOpenGLPixelFormatAttribute, NSOpenGLProfileVersion3_2Core, NSOpenGLProfileVersion4_1Core,
    NSOpenGLProfileVersionLegacy,
};

pub(crate) fn find_config(template: &ConfigTemplate) -> Result<Config> {
    let (r_size, g_size, b_size) = match template.color_buffer_type {
        ColorBufferType::Rgb { r_size, g_size, b_size } => (r_size, g_size, b_size),
        ColorBufferType::Indexed => {
            return Err(
                ErrorKind::NotSupported("color index mode is not supported with NSOpenGL").into()
            )
        },
    };

    let mut attrs = Vec::<NSOpenGLPixelFormatAttribute>::with_capacity(32);

    attrs.push(NSOpenGLPFAMinimumPolicy);

    // Only the combined size can be requested, not per-channel depths.
    attrs.push(NSOpenGLPFAColorSize);
    attrs.push(r_size as u32 + g_size as u32 + b_size as u32);

    if let Some(alpha_size) = template.alpha_size {
        attrs.push(NSOpenGLPFAAlphaSize);
        attrs.push(alpha_size as u32);
    }

    if let Some(depth_size) = template.depth_size {
        attrs.push(NSOpenGLPFADepthSize);
        attrs.push(depth_size as u32);
    }

    if template.double_buffering {
        attrs.push(NSOpenGLPFADoubleBuffer);
    }

    if let Some(stencil_size) = template.stencil_size {
        attrs.push(NSOpenGLPFAStencilSize);
        attrs.push(stencil_size as u32);
    }

    if let Some(accum) = template.accum_size {
        let alpha = if template.alpha_size.is_some() { accum.alpha } else { 0 };
        attrs.push(NSOpenGLPFAAccumSize);
        attrs.push(accum.red as u32 + accum.green as u32 + accum.blue as u32 + alpha as u32);
    }

    if template.multisampling {
        attrs.push(NSOpenGLPFAMultisample);
        attrs.push(NSOpenGLPFASampleBuffers);
        attrs.push(1);
        attrs.push(NSOpenGLPFASamples);
        attrs.push(2);
    }

    if template.aux_buffers != 0 {
        attrs.push(NSOpenGLPFAAuxBuffers);
        attrs.push(template.aux_buffers as u32);
    }

    if template.stereo.wants_native_format() {
        attrs.push(NSOpenGLPFAStereo);
    }

    attrs.push(NSOpenGLPFAOpenGLProfile);
    attrs.push(match template.profile {
        GlProfile::Legacy => NSOpenGLProfileVersionLegacy,
        GlProfile::Core3_2 => NSOpenGLProfileVersion3_2Core,
        GlProfile::Core4_1 | GlProfile::System => NSOpenGLProfileVersion4_1Core,
    });

    // Terminate attrs with zero.
    attrs.push(0);

    let raw = NSOpenGLPixelFormat::newWithAttributes(&attrs)
        .ok_or(ErrorKind::NoMatchingFormat)?;

    Ok(Config { raw })
}

/// A wrapper around the `NSOpenGLPixelFormat`.
#[derive(Clone)]
pub struct Config {
    pub(crate) raw: Retained<NSOpenGLPixelFormat>,
}

impl Config {
    fn raw_attribute(&self, attribute: NSOpenGLPixelFormatAttribute) -> GLint {
        let mut value = 0;
        unsafe {
            // The attributes do differ per monitor; zero is the primary
            // one.
            self.raw.getValues_forAttribute_forVirtualScreen(&mut value, attribute, 0);
        }
        value
    }

    pub(crate) fn details(&self) -> FormatDetails {
        FormatDetails {
            rgba: true,
            double_buffered: self.raw_attribute(NSOpenGLPFADoubleBuffer) != 0,
            has_depth: self.raw_attribute(NSOpenGLPFADepthSize) != 0,
            has_alpha: self.raw_attribute(NSOpenGLPFAAlphaSize) != 0,
            has_stencil: self.raw_attribute(NSOpenGLPFAStencilSize) != 0,
            has_accum: self.raw_attribute(NSOpenGLPFAAccumSize) != 0,
            native_stereo: self.raw_attribute(NSOpenGLPFAStereo) != 0,
            samples: self.raw_attribute(NSOpenGLPFASamples).max(0) as u32,
        }
    }

    pub(crate) fn color_size(&self) -> GLint {
        self.raw_attribute(NSOpenGLPFAColorSize)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config").field("raw", &self.raw).finish()
    }
}
