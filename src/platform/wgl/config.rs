//! Pixel-format negotiation over WGL.

use std::fmt;
use std::os::raw::c_int;
use std::rc::Rc;

use glutin_wgl_sys::wgl_extra;
use windows_sys::Win32::Graphics::Gdi::HDC;
use windows_sys::Win32::Graphics::OpenGL::{
    ChoosePixelFormat, DescribePixelFormat, PFD_DOUBLEBUFFER, PFD_DRAW_TO_WINDOW, PFD_MAIN_PLANE,
    PFD_STEREO, PFD_SUPPORT_OPENGL, PFD_TYPE_COLORINDEX, PFD_TYPE_RGBA, PIXELFORMATDESCRIPTOR,
};

use crate::config::{ColorBufferType, ConfigTemplate};
use crate::error::{ErrorKind, Result};
use crate::format::{pick_best, Acceleration, FormatDetails, FormatRating};
use crate::platform::DisplayFeatures;

use super::display::Display;
use super::last_os_error;

/// The maximum amount of candidate formats to query.
const MAX_QUERY_CONFIGS: usize = 256;

impl Display {
    pub(crate) fn find_best_config(&self, template: &ConfigTemplate) -> Result<Config> {
        let hdc = self.probe_hdc();
        match self.inner.wgl_extra.as_ref() {
            Some(wgl_extra) if wgl_extra.ChoosePixelFormatARB.is_loaded() => {
                self.find_best_config_arb(template, hdc, wgl_extra)
            },
            _ => self.find_config_legacy(template, hdc),
        }
    }

    /// Query every matching format through the capability-query extension
    /// and rank the candidates.
    fn find_best_config_arb(
        &self,
        template: &ConfigTemplate,
        hdc: HDC,
        wgl_extra: &super::WglExtra,
    ) -> Result<Config> {
        if template.multisampling
            && !self.inner.features.contains(DisplayFeatures::MULTISAMPLING_PIXEL_FORMATS)
        {
            return Err(ErrorKind::NotSupported("multisampling not supported").into());
        }

        if template.pbuffer && !self.inner.features.contains(DisplayFeatures::PBUFFER_SURFACES) {
            return Err(ErrorKind::NotSupported("pbuffers are not supported").into());
        }

        let mut attrs = Vec::<c_int>::with_capacity(40);

        attrs.push(wgl_extra::DRAW_TO_WINDOW_ARB as c_int);
        attrs.push(1);
        attrs.push(wgl_extra::SUPPORT_OPENGL_ARB as c_int);
        attrs.push(1);

        attrs.push(wgl_extra::PIXEL_TYPE_ARB as c_int);
        match template.color_buffer_type {
            ColorBufferType::Rgb { r_size, g_size, b_size } => {
                attrs.push(wgl_extra::TYPE_RGBA_ARB as c_int);

                attrs.push(wgl_extra::RED_BITS_ARB as c_int);
                attrs.push(r_size as c_int);
                attrs.push(wgl_extra::GREEN_BITS_ARB as c_int);
                attrs.push(g_size as c_int);
                attrs.push(wgl_extra::BLUE_BITS_ARB as c_int);
                attrs.push(b_size as c_int);

                if let Some(alpha_size) = template.alpha_size {
                    attrs.push(wgl_extra::ALPHA_BITS_ARB as c_int);
                    attrs.push(alpha_size as c_int);
                }
            },
            ColorBufferType::Indexed => {
                attrs.push(wgl_extra::TYPE_COLORINDEX_ARB as c_int);
            },
        }

        if let Some(depth_size) = template.depth_size {
            attrs.push(wgl_extra::DEPTH_BITS_ARB as c_int);
            attrs.push(depth_size as c_int);
        }

        if template.double_buffering {
            attrs.push(wgl_extra::DOUBLE_BUFFER_ARB as c_int);
            attrs.push(1);
        }

        if let Some(stencil_size) = template.stencil_size {
            attrs.push(wgl_extra::STENCIL_BITS_ARB as c_int);
            attrs.push(stencil_size as c_int);
        }

        if let Some(accum) = template.accum_size {
            attrs.push(wgl_extra::ACCUM_RED_BITS_ARB as c_int);
            attrs.push(accum.red as c_int);
            attrs.push(wgl_extra::ACCUM_GREEN_BITS_ARB as c_int);
            attrs.push(accum.green as c_int);
            attrs.push(wgl_extra::ACCUM_BLUE_BITS_ARB as c_int);
            attrs.push(accum.blue as c_int);
            if template.alpha_size.is_some() {
                attrs.push(wgl_extra::ACCUM_ALPHA_BITS_ARB as c_int);
                attrs.push(accum.alpha as c_int);
            }
        }

        if template.stereo.wants_native_format() {
            attrs.push(wgl_extra::STEREO_ARB as c_int);
            attrs.push(1);
        }

        if template.multisampling {
            attrs.push(wgl_extra::SAMPLE_BUFFERS_ARB as c_int);
            attrs.push(1);
            attrs.push(wgl_extra::SAMPLES_ARB as c_int);
            attrs.push(2);
        }

        if template.pbuffer {
            attrs.push(super::surface::DRAW_TO_PBUFFER_ARB);
            attrs.push(1);
        }

        if template.aux_buffers != 0 {
            attrs.push(wgl_extra::AUX_BUFFERS_ARB as c_int);
            attrs.push(template.aux_buffers as c_int);
        }

        attrs.push(0);

        let mut formats = [0 as c_int; MAX_QUERY_CONFIGS];
        let mut num_formats = 0u32;
        unsafe {
            if wgl_extra.ChoosePixelFormatARB(
                hdc as *const _,
                attrs.as_ptr(),
                std::ptr::null(),
                formats.len() as u32,
                formats.as_mut_ptr(),
                &mut num_formats,
            ) == 0
                || num_formats == 0
            {
                return Err(ErrorKind::NoMatchingFormat.into());
            }
        }

        let candidates = &formats[..(num_formats as usize).min(formats.len())];
        let ratings = candidates
            .iter()
            .map(|&format| self.rate_config_arb(wgl_extra, hdc, format));
        let best = pick_best(ratings).ok_or(ErrorKind::NoMatchingFormat)?;

        Ok(Config {
            inner: Rc::new(ConfigInner {
                display: self.clone(),
                pixel_format_index: candidates[best],
                descriptor: None,
            }),
        })
    }

    fn rate_config_arb(
        &self,
        wgl_extra: &super::WglExtra,
        hdc: HDC,
        format: c_int,
    ) -> FormatRating {
        let query = |attr: u32| {
            let mut value = 0;
            unsafe {
                wgl_extra.GetPixelFormatAttribivARB(
                    hdc as *const _,
                    format,
                    0,
                    1,
                    [attr as c_int].as_ptr(),
                    &mut value,
                );
            }
            value
        };

        let acceleration = match query(wgl_extra::ACCELERATION_ARB) as u32 {
            wgl_extra::FULL_ACCELERATION_ARB => Acceleration::Full,
            wgl_extra::GENERIC_ACCELERATION_ARB => Acceleration::Slow,
            _ => Acceleration::NonConformant,
        };

        FormatRating {
            acceleration,
            color_bits: query(wgl_extra::COLOR_BITS_ARB) as u32,
            depth_bits: query(wgl_extra::DEPTH_BITS_ARB) as u32,
            samples: query(wgl_extra::SAMPLES_ARB) as u32,
        }
    }

    /// The legacy chooser returns exactly one candidate and cannot express
    /// multisampling or pbuffers at all.
    fn find_config_legacy(&self, template: &ConfigTemplate, hdc: HDC) -> Result<Config> {
        if template.multisampling {
            return Err(ErrorKind::NotSupported("multisampling not supported").into());
        }
        if template.pbuffer {
            return Err(ErrorKind::NotSupported("pbuffers are not supported").into());
        }

        let mut descriptor: PIXELFORMATDESCRIPTOR = unsafe { std::mem::zeroed() };
        descriptor.nSize = std::mem::size_of::<PIXELFORMATDESCRIPTOR>() as u16;
        descriptor.nVersion = 1;
        descriptor.dwFlags = PFD_DRAW_TO_WINDOW | PFD_SUPPORT_OPENGL;
        if template.double_buffering {
            descriptor.dwFlags |= PFD_DOUBLEBUFFER;
        }
        if template.stereo.wants_native_format() {
            descriptor.dwFlags |= PFD_STEREO;
        }
        descriptor.iLayerType = PFD_MAIN_PLANE;

        match template.color_buffer_type {
            ColorBufferType::Rgb { r_size, g_size, b_size } => {
                descriptor.iPixelType = PFD_TYPE_RGBA;
                descriptor.cColorBits =
                    (r_size as u16 + g_size as u16 + b_size as u16).min(255) as u8;
                descriptor.cAlphaBits = template.alpha_size.unwrap_or(0);
            },
            ColorBufferType::Indexed => {
                descriptor.iPixelType = PFD_TYPE_COLORINDEX;
                descriptor.cColorBits = 8;
            },
        }
        descriptor.cDepthBits = template.depth_size.unwrap_or(0);
        descriptor.cStencilBits = template.stencil_size.unwrap_or(0);
        descriptor.cAuxBuffers = template.aux_buffers;

        unsafe {
            let pixel_format_index = ChoosePixelFormat(hdc, &descriptor);
            if pixel_format_index == 0 {
                return Err(ErrorKind::NoMatchingFormat.into());
            }

            let mut chosen: PIXELFORMATDESCRIPTOR = std::mem::zeroed();
            if DescribePixelFormat(
                hdc,
                pixel_format_index,
                std::mem::size_of::<PIXELFORMATDESCRIPTOR>() as u32,
                &mut chosen,
            ) == 0
            {
                return Err(last_os_error(ErrorKind::BadConfig));
            }

            Ok(Config {
                inner: Rc::new(ConfigInner {
                    display: self.clone(),
                    pixel_format_index,
                    descriptor: Some(chosen),
                }),
            })
        }
    }
}

/// A negotiated pixel-format index.
#[derive(Clone)]
pub struct Config {
    pub(crate) inner: Rc<ConfigInner>,
}

pub(crate) struct ConfigInner {
    pub(crate) display: Display,
    pub(crate) pixel_format_index: c_int,
    /// The legacy descriptor, when the format came from the legacy
    /// chooser.
    pub(crate) descriptor: Option<PIXELFORMATDESCRIPTOR>,
}

impl Config {
    pub(crate) fn pixel_format_index(&self) -> c_int {
        self.inner.pixel_format_index
    }

    pub(crate) fn details(&self) -> FormatDetails {
        let hdc = self.inner.display.probe_hdc();
        if let Some(wgl_extra) = self.inner.display.inner.wgl_extra.as_ref() {
            let query = |attr: u32| {
                let mut value = 0;
                unsafe {
                    wgl_extra.GetPixelFormatAttribivARB(
                        hdc as *const _,
                        self.inner.pixel_format_index,
                        0,
                        1,
                        [attr as c_int].as_ptr(),
                        &mut value,
                    );
                }
                value
            };

            return FormatDetails {
                rgba: query(wgl_extra::PIXEL_TYPE_ARB) as u32 == wgl_extra::TYPE_RGBA_ARB,
                double_buffered: query(wgl_extra::DOUBLE_BUFFER_ARB) != 0,
                has_depth: query(wgl_extra::DEPTH_BITS_ARB) != 0,
                has_alpha: query(wgl_extra::ALPHA_BITS_ARB) != 0,
                has_stencil: query(wgl_extra::STENCIL_BITS_ARB) != 0,
                has_accum: query(wgl_extra::ACCUM_RED_BITS_ARB) != 0,
                native_stereo: query(wgl_extra::STEREO_ARB) != 0,
                samples: query(wgl_extra::SAMPLES_ARB) as u32,
            };
        }

        let descriptor = match self.inner.descriptor {
            Some(descriptor) => descriptor,
            None => return FormatDetails::default(),
        };
        FormatDetails {
            rgba: descriptor.iPixelType == PFD_TYPE_RGBA,
            double_buffered: (descriptor.dwFlags & PFD_DOUBLEBUFFER) != 0,
            has_depth: descriptor.cDepthBits != 0,
            has_alpha: descriptor.cAlphaBits != 0,
            has_stencil: descriptor.cStencilBits != 0,
            has_accum: descriptor.cAccumBits != 0,
            native_stereo: (descriptor.dwFlags & PFD_STEREO) != 0,
            samples: 0,
        }
    }

}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("pixel_format_index", &self.inner.pixel_format_index)
            .finish()
    }
}
