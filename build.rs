use std::env;
use std::fs::File;
use std::path::PathBuf;

use cfg_aliases::cfg_aliases;
use gl_generator::{Api, Fallbacks, Profile, Registry, StructGenerator};

fn main() {
    cfg_aliases! {
        // Systems.
        free_unix: { all(unix, not(any(target_os = "macos", target_os = "android"))) },
        macos: { target_os = "macos" },

        // Backends.
        x11_platform: { all(feature = "x11", free_unix) },
        glx_backend: { all(feature = "glx", x11_platform) },
        wgl_backend: { all(feature = "wgl", windows) },
        nsgl_backend: { macos },
        native_backend: { any(glx_backend, wgl_backend, nsgl_backend) },
    }

    // GL bindings for the readback/extension paths. The compatibility
    // profile registry keeps the pixel-map and attrib-stack entry points
    // that color-index rendering needs.
    let dest = PathBuf::from(&env::var("OUT_DIR").unwrap());
    let mut file = File::create(dest.join("gl_bindings.rs")).unwrap();
    let registry = Registry::new(Api::Gl, (3, 2), Profile::Compatibility, Fallbacks::All, []);
    registry.write_bindings(StructGenerator, &mut file).unwrap();
}
