//! Finding and describing the `GLXFBConfig`.

use std::fmt;
use std::ops::Deref;
use std::os::raw::c_int;
use std::rc::Rc;
use std::slice;

use glutin_glx_sys::glx;
use glutin_glx_sys::glx::types::GLXFBConfig;

use crate::config::{ColorBufferType, ConfigTemplate};
use crate::error::{ErrorKind, Result};
use crate::format::{pick_best, Acceleration, FormatDetails, FormatRating};
use crate::platform::DisplayFeatures;

use super::display::Display;

impl Display {
    pub(crate) fn find_best_config(&self, template: &ConfigTemplate) -> Result<Config> {
        if template.multisampling
            && !self.inner.features.contains(DisplayFeatures::MULTISAMPLING_PIXEL_FORMATS)
        {
            return Err(ErrorKind::NotSupported("multisampling not supported").into());
        }

        if template.pbuffer
            && !self.inner.features.contains(DisplayFeatures::PBUFFER_SURFACES)
        {
            return Err(ErrorKind::NotSupported("pbuffers are not supported").into());
        }

        let mut config_attributes = Vec::<c_int>::with_capacity(32);

        // Color buffer type and channel sizes.
        config_attributes.push(glx::RENDER_TYPE as c_int);
        match template.color_buffer_type {
            ColorBufferType::Rgb { r_size, g_size, b_size } => {
                config_attributes.push(glx::RGBA_BIT as c_int);

                config_attributes.push(glx::RED_SIZE as c_int);
                config_attributes.push(r_size as c_int);
                config_attributes.push(glx::GREEN_SIZE as c_int);
                config_attributes.push(g_size as c_int);
                config_attributes.push(glx::BLUE_SIZE as c_int);
                config_attributes.push(b_size as c_int);

                if let Some(alpha_size) = template.alpha_size {
                    config_attributes.push(glx::ALPHA_SIZE as c_int);
                    config_attributes.push(alpha_size as c_int);
                }
            },
            ColorBufferType::Indexed => {
                config_attributes.push(glx::COLOR_INDEX_BIT as c_int);

                config_attributes.push(glx::BUFFER_SIZE as c_int);
                config_attributes.push(1);
            },
        }

        if let Some(depth_size) = template.depth_size {
            config_attributes.push(glx::DEPTH_SIZE as c_int);
            config_attributes.push(depth_size as c_int);
        }

        if template.double_buffering {
            config_attributes.push(glx::DOUBLEBUFFER as c_int);
            config_attributes.push(1);
        }

        if let Some(stencil_size) = template.stencil_size {
            config_attributes.push(glx::STENCIL_SIZE as c_int);
            config_attributes.push(stencil_size as c_int);
        }

        if let Some(accum) = template.accum_size {
            config_attributes.push(glx::ACCUM_RED_SIZE as c_int);
            config_attributes.push(accum.red as c_int);
            config_attributes.push(glx::ACCUM_GREEN_SIZE as c_int);
            config_attributes.push(accum.green as c_int);
            config_attributes.push(glx::ACCUM_BLUE_SIZE as c_int);
            config_attributes.push(accum.blue as c_int);
            if template.alpha_size.is_some() {
                config_attributes.push(glx::ACCUM_ALPHA_SIZE as c_int);
                config_attributes.push(accum.alpha as c_int);
            }
        }

        if template.stereo.wants_native_format() {
            config_attributes.push(glx::STEREO as c_int);
            config_attributes.push(1);
        }

        if template.multisampling {
            config_attributes.push(glx::SAMPLE_BUFFERS as c_int);
            config_attributes.push(1);
            config_attributes.push(glx::SAMPLES as c_int);
            config_attributes.push(2);
        }

        if template.pbuffer {
            config_attributes.push(glx::DRAWABLE_TYPE as c_int);
            config_attributes.push((glx::WINDOW_BIT | glx::PBUFFER_BIT) as c_int);
        }

        if template.aux_buffers != 0 {
            config_attributes.push(glx::AUX_BUFFERS as c_int);
            config_attributes.push(template.aux_buffers as c_int);
        }

        // Push X11 `None` to terminate the list.
        config_attributes.push(0);

        let raw_configs = unsafe {
            let mut num_configs = 0;
            let raw_configs = self.inner.glx.ChooseFBConfig(
                self.inner.raw.cast(),
                self.inner.screen,
                config_attributes.as_ptr(),
                &mut num_configs,
            );

            if raw_configs.is_null() || num_configs == 0 {
                return Err(ErrorKind::NoMatchingFormat.into());
            }

            let configs = slice::from_raw_parts(raw_configs, num_configs as usize).to_vec();

            // Free the memory from the Xlib, since we've just copied it.
            (self.inner.xlib.XFree)(raw_configs as *mut _);

            configs
        };

        // Rank every candidate and keep the best one.
        let ratings = raw_configs.iter().map(|&raw| self.rate_config(raw));
        let best = pick_best(ratings).ok_or(ErrorKind::NoMatchingFormat)?;

        self.wrap_config(raw_configs[best])
    }

    fn rate_config(&self, raw: GLXFBConfig) -> FormatRating {
        let caveat = self.raw_attribute(raw, glx::CONFIG_CAVEAT as c_int);
        let acceleration = match caveat as u32 {
            glx::SLOW_CONFIG => Acceleration::Slow,
            glx::NON_CONFORMANT_CONFIG => Acceleration::NonConformant,
            _ => Acceleration::Full,
        };

        FormatRating {
            acceleration,
            color_bits: self.raw_attribute(raw, glx::BUFFER_SIZE as c_int) as u32,
            depth_bits: self.raw_attribute(raw, glx::DEPTH_SIZE as c_int) as u32,
            samples: self.raw_attribute(raw, glx::SAMPLES as c_int) as u32,
        }
    }

    fn wrap_config(&self, raw: GLXFBConfig) -> Result<Config> {
        let raw_visual = unsafe {
            self.inner.glx.GetVisualFromFBConfig(self.inner.raw.cast(), raw)
        };
        if raw_visual.is_null() {
            return Err(ErrorKind::NoMatchingFormat.into());
        }

        let inner = Rc::new(ConfigInner {
            display: self.clone(),
            raw: GlxConfig(raw),
            visual: VisualInfo { raw: raw_visual.cast(), xlib: self.inner.xlib },
        });
        Ok(Config { inner })
    }

    fn raw_attribute(&self, raw: GLXFBConfig, attr: c_int) -> c_int {
        unsafe {
            let mut val = 0;
            self.inner.glx.GetFBConfigAttrib(self.inner.raw.cast(), raw, attr, &mut val);
            val
        }
    }
}

/// A wrapper around `GLXFBConfig` and the visual it resolves to.
#[derive(Clone)]
pub struct Config {
    pub(crate) inner: Rc<ConfigInner>,
}

impl Config {
    fn raw_attribute(&self, attr: c_int) -> c_int {
        self.inner.display.raw_attribute(*self.inner.raw, attr)
    }

    pub(crate) fn visual_id(&self) -> u64 {
        unsafe { (*self.inner.visual.raw).visualid as u64 }
    }

    pub(crate) fn visual(&self) -> *mut x11_dl::xlib::XVisualInfo {
        self.inner.visual.raw
    }

    pub(crate) fn details(&self) -> FormatDetails {
        FormatDetails {
            rgba: (self.raw_attribute(glx::RENDER_TYPE as c_int) as u32 & glx::RGBA_BIT) != 0,
            double_buffered: self.raw_attribute(glx::DOUBLEBUFFER as c_int) != 0,
            has_depth: self.raw_attribute(glx::DEPTH_SIZE as c_int) != 0,
            has_alpha: self.raw_attribute(glx::ALPHA_SIZE as c_int) != 0,
            has_stencil: self.raw_attribute(glx::STENCIL_SIZE as c_int) != 0,
            has_accum: self.raw_attribute(glx::ACCUM_RED_SIZE as c_int) != 0,
            native_stereo: self.raw_attribute(glx::STEREO as c_int) != 0,
            samples: self.raw_attribute(glx::SAMPLES as c_int) as u32,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("raw", &self.inner.raw)
            .field("visual_id", &self.visual_id())
            .finish()
    }
}

pub(crate) struct ConfigInner {
    pub(crate) display: Display,
    pub(crate) raw: GlxConfig,
    visual: VisualInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GlxConfig(GLXFBConfig);

impl Deref for GlxConfig {
    type Target = GLXFBConfig;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

struct VisualInfo {
    raw: *mut x11_dl::xlib::XVisualInfo,
    xlib: &'static x11_dl::xlib::Xlib,
}

impl Drop for VisualInfo {
    fn drop(&mut self) {
        unsafe {
            (self.xlib.XFree)(self.raw as *mut _);
        }
    }
}
