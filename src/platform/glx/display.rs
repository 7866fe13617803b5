//! The GLX display connection.

use std::collections::HashSet;
use std::ffi::{CStr, CString};
use std::fmt;
use std::os::raw::c_int;
use std::rc::Rc;

use once_cell::unsync::OnceCell;
use raw_window_handle::RawDisplayHandle;
use x11_dl::xlib::Xlib;

use crate::error::{Error, ErrorKind, Result};
use crate::gl::Gl;
use crate::platform::DisplayFeatures;

use super::{Glx, GlxExtra, GLX, GLX_EXTRA, XLIB};

/// A connection to an X server, with the GLX entry points loaded.
#[derive(Clone)]
pub struct Display {
    pub(crate) inner: Rc<DisplayInner>,
}

pub(crate) struct DisplayInner {
    pub(crate) glx: &'static Glx,
    pub(crate) glx_extra: Option<&'static GlxExtra>,
    pub(crate) xlib: &'static Xlib,
    pub(crate) raw: *mut x11_dl::xlib::Display,
    pub(crate) screen: c_int,
    pub(crate) version: (c_int, c_int),
    pub(crate) features: DisplayFeatures,
    pub(crate) client_extensions: HashSet<String>,
    pub(crate) gl: OnceCell<Gl>,
}

impl Display {
    pub(crate) unsafe fn new(display: RawDisplayHandle) -> Result<Self> {
        let (raw, screen) = match display {
            RawDisplayHandle::Xlib(handle) => {
                let raw = handle.display.ok_or(ErrorKind::BadDisplay)?.as_ptr();
                (raw as *mut x11_dl::xlib::Display, handle.screen as c_int)
            },
            _ => {
                return Err(
                    ErrorKind::NotSupported("provided native display isn't supported").into()
                )
            },
        };

        let xlib = XLIB.as_ref().ok_or(ErrorKind::NotFound)?;
        let glx = GLX.as_ref().ok_or(ErrorKind::NotFound)?;

        unsafe {
            let (mut error_base, mut event_base) = (0, 0);
            if glx.QueryExtension(raw.cast(), &mut error_base, &mut event_base) == 0 {
                return Err(Error::with_message(
                    ErrorKind::InitializationFailed,
                    "X server is missing OpenGL GLX extension",
                ));
            }
        }

        let version = unsafe {
            let (mut major, mut minor) = (0, 0);
            if glx.QueryVersion(raw.cast(), &mut major, &mut minor) == 0 {
                return Err(ErrorKind::InitializationFailed.into());
            }
            (major, minor)
        };

        if version < (1, 3) {
            return Err(ErrorKind::NotSupported("GLX 1.3 or newer is required").into());
        }

        let client_extensions = unsafe { query_extensions(glx, raw, screen) };
        let features = Self::extract_display_features(&client_extensions, version);

        let inner = Rc::new(DisplayInner {
            glx,
            glx_extra: GLX_EXTRA.as_ref(),
            xlib,
            raw,
            screen,
            version,
            features,
            client_extensions,
            gl: OnceCell::new(),
        });

        Ok(Self { inner })
    }

    fn extract_display_features(
        extensions: &HashSet<String>,
        version: (c_int, c_int),
    ) -> DisplayFeatures {
        let mut features = DisplayFeatures::empty();

        features.set(
            DisplayFeatures::MULTISAMPLING_PIXEL_FORMATS,
            version >= (1, 4)
                || extensions.contains("GLX_ARB_multisample")
                || extensions.contains("GLX_SGIS_multisample"),
        );

        features.set(DisplayFeatures::PBUFFER_SURFACES, version >= (1, 3));

        features.set(
            DisplayFeatures::CREATE_CONTEXT_WITH_VERSION,
            extensions.contains("GLX_ARB_create_context"),
        );

        features.set(
            DisplayFeatures::SWAP_CONTROL,
            extensions.contains("GLX_EXT_swap_control")
                || extensions.contains("GLX_SGI_swap_control")
                || extensions.contains("GLX_MESA_swap_control"),
        );

        features
    }

    /// The features the connection supports.
    pub fn supported_features(&self) -> DisplayFeatures {
        self.inner.features
    }

    /// The GLX version of the server.
    pub fn version(&self) -> (i32, i32) {
        self.inner.version
    }

    pub(crate) fn get_proc_address(&self, addr: &str) -> *const std::ffi::c_void {
        let addr = CString::new(addr).unwrap_or_default();
        unsafe { self.inner.glx.GetProcAddress(addr.as_ptr() as *const _) as *const _ }
    }

    /// The GL symbol table, loaded on first use once a context is current.
    pub(crate) fn gl(&self) -> &Gl {
        self.inner.gl.get_or_init(|| Gl::load_with(|symbol| self.get_proc_address(symbol)))
    }
}

impl fmt::Debug for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Display")
            .field("raw", &self.inner.raw)
            .field("screen", &self.inner.screen)
            .field("version", &self.inner.version)
            .field("features", &self.inner.features)
            .finish()
    }
}

unsafe fn query_extensions(
    glx: &Glx,
    raw: *mut x11_dl::xlib::Display,
    screen: c_int,
) -> HashSet<String> {
    let extensions = glx.QueryExtensionsString(raw.cast(), screen);
    if extensions.is_null() {
        return HashSet::new();
    }

    CStr::from_ptr(extensions)
        .to_string_lossy()
        .split(' ')
        .filter(|ext| !ext.is_empty())
        .map(str::to_owned)
        .collect()
}
