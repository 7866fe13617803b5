//! Native OpenGL rendering surfaces for toolkit-embedded widgets.
//!
//! The purpose of this library is to manage the native half of a GL widget
//! living inside a windowing toolkit: pick a pixel format matching a
//! declarative capability request, create the native drawable and the
//! OpenGL [`Widget`] context bound to it, wire sibling widgets that share
//! one context, and expose the small set of operations redraw callbacks
//! need (make current, swap buffers, copy context state, take a
//! screenshot, query extensions).
//!
//! Start by describing the surface you want with a
//! [`ConfigTemplateBuilder`]; the resulting [`ConfigTemplate`] is the
//! widget's read-only configuration. Create a [`Registry`] per UI thread
//! and hand both to [`Widget::new`]. The host toolkit then drives the
//! lifecycle: [`Widget::create_context`] once the widget is configured,
//! [`Widget::make_window`] when the native window must exist (this call
//! never fails — on trouble the widget degrades to a placeholder window),
//! [`Widget::make_current`] and [`Widget::swap_buffers`] around redraws,
//! and [`Widget::destroy`] on teardown. A context shared between widgets
//! is released only when its last user goes away, in whatever order the
//! widgets are destroyed.
//!
//! Platform backends exist for X11/GLX, Windows/WGL, and macOS/NSOpenGL;
//! the one matching the target is exported as
//! [`platform::NativePlatform`]. Everything above the
//! [`platform::GlPlatform`] trait is platform independent.
//!
//! [`Widget`]: crate::widget::Widget
//! [`Widget::new`]: crate::widget::Widget::new
//! [`Widget::create_context`]: crate::widget::Widget::create_context
//! [`Widget::make_window`]: crate::widget::Widget::make_window
//! [`Widget::make_current`]: crate::widget::Widget::make_current
//! [`Widget::swap_buffers`]: crate::widget::Widget::swap_buffers
//! [`Widget::destroy`]: crate::widget::Widget::destroy
//! [`ConfigTemplate`]: crate::config::ConfigTemplate
//! [`ConfigTemplateBuilder`]: crate::config::ConfigTemplateBuilder
//! [`Registry`]: crate::registry::Registry

#![deny(missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod config;
pub mod context;
pub mod error;
pub mod format;
pub mod photo;
pub mod platform;
pub mod registry;
pub mod stereo;
pub mod surface;
pub mod widget;

#[cfg(native_backend)]
pub(crate) mod gl_utils;

#[cfg(native_backend)]
#[allow(non_camel_case_types, non_snake_case, non_upper_case_globals, unused)]
pub(crate) mod gl {
    include!(concat!(env!("OUT_DIR"), "/gl_bindings.rs"));
}

/// The widget type backed by the platform's native GL interface.
#[cfg(native_backend)]
pub type NativeWidget = widget::Widget<platform::NativePlatform>;
