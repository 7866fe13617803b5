//! WGL display initialization and extension loading.

use std::collections::HashSet;
use std::ffi::CStr;
use std::fmt;
use std::rc::Rc;

use glutin_wgl_sys::wgl;
use once_cell::unsync::OnceCell;
use windows_sys::Win32::Foundation::HMODULE;
use windows_sys::Win32::System::LibraryLoader::LoadLibraryW;

use crate::error::{ErrorKind, Result};
use crate::gl::Gl;
use crate::platform::DisplayFeatures;

use super::surface::PbufferFns;
use super::{create_probe_window, get_proc_address, last_os_error, wide, WglExtra};

/// A handle to the system's WGL implementation.
#[derive(Clone)]
pub struct Display {
    pub(crate) inner: Rc<DisplayInner>,
}

pub(crate) struct DisplayInner {
    pub(crate) lib_opengl32: HMODULE,
    pub(crate) wgl_extra: Option<WglExtra>,
    pub(crate) pbuffer_fns: Option<PbufferFns>,
    pub(crate) client_extensions: HashSet<String>,
    pub(crate) features: DisplayFeatures,
    /// A hidden window whose DC carries a basic GL format; every
    /// window-less driver query goes through it.
    pub(crate) probe: super::WindowDc,
    pub(crate) gl: OnceCell<Gl>,
}

impl Display {
    pub(crate) unsafe fn new() -> Result<Self> {
        let name = wide("opengl32.dll");
        let lib_opengl32 = LoadLibraryW(name.as_ptr());
        if lib_opengl32 == 0 {
            return Err(ErrorKind::NotFound.into());
        }

        // The extension pointers can only be resolved with a context
        // current, and a context needs a window; probe through a hidden
        // one.
        let probe = create_probe_window()?;
        let context = wgl::CreateContext(probe.hdc as *const _);
        if context.is_null() {
            return Err(last_os_error(ErrorKind::InitializationFailed));
        }
        wgl::MakeCurrent(probe.hdc as *const _, context);

        let wgl_extra = WglExtra::load_with(|addr| get_proc_address(lib_opengl32, addr));
        let client_extensions = load_extensions(probe.hdc, &wgl_extra);
        let pbuffer_fns = if client_extensions.contains("WGL_ARB_pbuffer") {
            PbufferFns::load(lib_opengl32)
        } else {
            None
        };

        wgl::MakeCurrent(std::ptr::null(), std::ptr::null());
        wgl::DeleteContext(context);

        let features =
            Self::extract_display_features(&client_extensions, pbuffer_fns.is_some());
        let wgl_extra = client_extensions
            .contains("WGL_ARB_pixel_format")
            .then_some(wgl_extra);

        let inner = Rc::new(DisplayInner {
            lib_opengl32,
            wgl_extra,
            pbuffer_fns,
            client_extensions,
            features,
            probe,
            gl: OnceCell::new(),
        });
        Ok(Display { inner })
    }

    pub(crate) fn probe_hdc(&self) -> windows_sys::Win32::Graphics::Gdi::HDC {
        self.inner.probe.hdc
    }

    fn extract_display_features(
        extensions: &HashSet<String>,
        pbuffer_fns_loaded: bool,
    ) -> DisplayFeatures {
        let mut features = DisplayFeatures::empty();

        features.set(
            DisplayFeatures::MULTISAMPLING_PIXEL_FORMATS,
            extensions.contains("WGL_ARB_pixel_format")
                && extensions.contains("WGL_ARB_multisample"),
        );

        features.set(
            DisplayFeatures::PBUFFER_SURFACES,
            extensions.contains("WGL_ARB_pixel_format") && pbuffer_fns_loaded,
        );

        features.set(
            DisplayFeatures::CREATE_CONTEXT_WITH_VERSION,
            extensions.contains("WGL_ARB_create_context"),
        );

        features.set(DisplayFeatures::SWAP_CONTROL, extensions.contains("WGL_EXT_swap_control"));

        features
    }

    /// The features the driver supports.
    pub fn supported_features(&self) -> DisplayFeatures {
        self.inner.features
    }

    /// The GL symbol table, loaded on first use once a context is current.
    pub(crate) fn gl(&self) -> &Gl {
        self.inner
            .gl
            .get_or_init(|| Gl::load_with(|addr| get_proc_address(self.inner.lib_opengl32, addr)))
    }
}

impl fmt::Debug for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Display")
            .field("features", &self.inner.features)
            .field("extensions", &self.inner.client_extensions)
            .finish()
    }
}

fn load_extensions(
    hdc: windows_sys::Win32::Graphics::Gdi::HDC,
    wgl_extra: &WglExtra,
) -> HashSet<String> {
    let extensions = unsafe {
        if wgl_extra.GetExtensionsStringARB.is_loaded() {
            CStr::from_ptr(wgl_extra.GetExtensionsStringARB(hdc as *const _))
        } else if wgl_extra.GetExtensionsStringEXT.is_loaded() {
            CStr::from_ptr(wgl_extra.GetExtensionsStringEXT())
        } else {
            return HashSet::new();
        }
    };

    extensions
        .to_string_lossy()
        .split(' ')
        .filter(|ext| !ext.is_empty())
        .map(str::to_owned)
        .collect()
}
