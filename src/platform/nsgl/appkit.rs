//! The NSOpenGL slice of AppKit.
//!
//! AppKit's OpenGL classes are deprecated, so the bindings here declare
//! just the selectors this backend drives.
#![allow(non_snake_case, non_upper_case_globals)]

use objc2::rc::{Allocated, Retained};
use objc2::runtime::NSObject;
use objc2::{extern_class, msg_send, AllocAnyThread, ClassType};
use objc2_app_kit::NSView;

pub(crate) type GLint = i32;

extern_class!(
    #[unsafe(super(NSObject))]
    #[derive(Debug, PartialEq, Eq, Hash)]
    pub(crate) struct NSOpenGLContext;
);

impl NSOpenGLContext {
    pub(crate) fn newWithFormat_shareContext(
        format: &NSOpenGLPixelFormat,
        share: Option<&NSOpenGLContext>,
    ) -> Option<Retained<Self>> {
        let this: Allocated<Self> = Self::alloc();
        unsafe { msg_send![this, initWithFormat: format, shareContext: share] }
    }

    pub(crate) fn clearCurrentContext() {
        unsafe { msg_send![Self::class(), clearCurrentContext] }
    }

    pub(crate) fn makeCurrentContext(&self) {
        unsafe { msg_send![self, makeCurrentContext] }
    }

    pub(crate) fn update(&self) {
        unsafe { msg_send![self, update] }
    }

    pub(crate) fn flushBuffer(&self) {
        unsafe { msg_send![self, flushBuffer] }
    }

    pub(crate) fn view(&self) -> Option<Retained<NSView>> {
        unsafe { msg_send![self, view] }
    }

    pub(crate) unsafe fn setView(&self, view: Option<&NSView>) {
        unsafe { msg_send![self, setView: view] }
    }

    pub(crate) fn currentVirtualScreen(&self) -> GLint {
        unsafe { msg_send![self, currentVirtualScreen] }
    }

    pub(crate) unsafe fn setPixelBuffer(
        &self,
        pixel_buffer: &NSOpenGLPixelBuffer,
        cube_map_face: u32,
        mip_map_level: GLint,
        virtual_screen: GLint,
    ) {
        unsafe {
            msg_send![
                self,
                setPixelBuffer: pixel_buffer,
                cubeMapFace: cube_map_face,
                mipMapLevel: mip_map_level,
                currentVirtualScreen: virtual_screen,
            ]
        }
    }

    pub(crate) unsafe fn setValues_forParameter(
        &self,
        values: *const GLint,
        parameter: NSOpenGLContextParameter,
    ) {
        unsafe { msg_send![self, setValues: values, forParameter: parameter] }
    }

    pub(crate) unsafe fn copyAttributesFromContext_withMask(
        &self,
        context: &NSOpenGLContext,
        mask: u32,
    ) {
        unsafe { msg_send![self, copyAttributesFromContext: context, withMask: mask] }
    }
}

extern_class!(
    #[unsafe(super(NSObject))]
    #[derive(Debug, PartialEq, Eq, Hash)]
    pub(crate) struct NSOpenGLPixelFormat;
);

impl NSOpenGLPixelFormat {
    pub(crate) fn newWithAttributes(
        attrs: &[NSOpenGLPixelFormatAttribute],
    ) -> Option<Retained<Self>> {
        debug_assert_eq!(attrs.last(), Some(&0));
        let this: Allocated<Self> = Self::alloc();
        unsafe { msg_send![this, initWithAttributes: attrs.as_ptr()] }
    }

    pub(crate) unsafe fn getValues_forAttribute_forVirtualScreen(
        &self,
        values: *mut GLint,
        attribute: NSOpenGLPixelFormatAttribute,
        screen: GLint,
    ) {
        unsafe {
            msg_send![self, getValues: values, forAttribute: attribute, forVirtualScreen: screen]
        }
    }
}

extern_class!(
    #[unsafe(super(NSObject))]
    #[derive(Debug, PartialEq, Eq, Hash)]
    pub(crate) struct NSOpenGLPixelBuffer;
);

impl NSOpenGLPixelBuffer {
    pub(crate) fn newWithTextureTarget(
        target: u32,
        internal_format: u32,
        max_mip_map_level: GLint,
        pixels_wide: GLint,
        pixels_high: GLint,
    ) -> Option<Retained<Self>> {
        let this: Allocated<Self> = Self::alloc();
        unsafe {
            msg_send![
                this,
                initWithTextureTarget: target,
                textureInternalFormat: internal_format,
                textureMaxMipMapLevel: max_mip_map_level,
                pixelsWide: pixels_wide,
                pixelsHigh: pixels_high,
            ]
        }
    }
}

pub(crate) type NSOpenGLContextParameter = isize;
pub(crate) const NSOpenGLCPSwapInterval: NSOpenGLContextParameter = 222;

pub(crate) type NSOpenGLPixelFormatAttribute = u32;
pub(crate) const NSOpenGLPFADoubleBuffer: NSOpenGLPixelFormatAttribute = 5;
pub(crate) const NSOpenGLPFAStereo: NSOpenGLPixelFormatAttribute = 6;
pub(crate) const NSOpenGLPFAAuxBuffers: NSOpenGLPixelFormatAttribute = 7;
pub(crate) const NSOpenGLPFAColorSize: NSOpenGLPixelFormatAttribute = 8;
pub(crate) const NSOpenGLPFAAlphaSize: NSOpenGLPixelFormatAttribute = 11;
pub(crate) const NSOpenGLPFADepthSize: NSOpenGLPixelFormatAttribute = 12;
pub(crate) const NSOpenGLPFAStencilSize: NSOpenGLPixelFormatAttribute = 13;
pub(crate) const NSOpenGLPFAAccumSize: NSOpenGLPixelFormatAttribute = 14;
pub(crate) const NSOpenGLPFAMinimumPolicy: NSOpenGLPixelFormatAttribute = 51;
pub(crate) const NSOpenGLPFASampleBuffers: NSOpenGLPixelFormatAttribute = 55;
pub(crate) const NSOpenGLPFASamples: NSOpenGLPixelFormatAttribute = 56;
pub(crate) const NSOpenGLPFAMultisample: NSOpenGLPixelFormatAttribute = 59;
pub(crate) const NSOpenGLPFAOpenGLProfile: NSOpenGLPixelFormatAttribute = 99;
pub(crate) const NSOpenGLProfileVersionLegacy: NSOpenGLPixelFormatAttribute = 0x1000;
pub(crate) const NSOpenGLProfileVersion3_2Core: NSOpenGLPixelFormatAttribute = 0x3200;
pub(crate) const NSOpenGLProfileVersion4_1Core: NSOpenGLPixelFormatAttribute = 0x4100;
