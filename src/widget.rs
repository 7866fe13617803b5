//! The per-widget surface and context lifecycle.
//!
//! A [`Widget`] owns one native drawable and a handle to one rendering
//! context, which it may share with sibling widgets. The host toolkit
//! drives the lifecycle: [`Widget::create_context`] when the widget is
//! configured, [`Widget::make_window`] when the native window must come
//! into existence, [`Widget::make_current`] and [`Widget::swap_buffers`]
//! around redraws, [`Widget::destroy`] on teardown.
//!
//! `make_window` never fails: when anything goes wrong the widget enters a
//! terminal failed state and hands the toolkit a plain placeholder window,
//! so the toolkit's own window bookkeeping stays intact while drawing
//! operations report errors.

use log::{debug, warn};

use crate::config::{ConfigTemplate, ShareKind};
use crate::context::{ContextId, SharedContext};
use crate::error::{Error, ErrorKind, Result};
use crate::format::FormatDetails;
use crate::photo::{ColorRamps, PixelBlock};
use crate::platform::GlPlatform;
use crate::registry::{Registry, WidgetKey};
use crate::stereo::{Projection, StereoBuffer, StereoParams};
use crate::surface::alloc_with_shrink;

/// One toolkit-embedded GL widget.
#[derive(Debug)]
pub struct Widget<P: GlPlatform> {
    platform: P,
    key: WidgetKey,
    template: ConfigTemplate,
    details: FormatDetails,
    width: u32,
    height: u32,
    bad_window: bool,
    config: Option<P::Config>,
    context: Option<SharedContext<P>>,
    surface: Option<P::Surface>,
    window: Option<P::Window>,
    ramps: Option<ColorRamps>,
    extensions: Option<String>,
    stereo_buffer: StereoBuffer,
}

impl<P: GlPlatform> Widget<P> {
    /// Create a widget record and register it.
    ///
    /// The template is validated before anything else happens; a rejected
    /// template registers nothing and allocates no native resource.
    pub fn new(
        platform: P,
        registry: &mut Registry<P>,
        template: ConfigTemplate,
        ident: Option<&str>,
        pathname: &str,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        template.validate()?;
        let key = registry.register(ident, pathname);
        Ok(Self {
            platform,
            key,
            template,
            details: FormatDetails::default(),
            width,
            height,
            bad_window: false,
            config: None,
            context: None,
            surface: None,
            window: None,
            ramps: None,
            extensions: None,
            stereo_buffer: StereoBuffer::None,
        })
    }

    /// The registry key of this widget.
    #[inline]
    pub fn key(&self) -> WidgetKey {
        self.key
    }

    /// The widget width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The widget height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether window creation has failed terminally.
    #[inline]
    pub fn is_bad_window(&self) -> bool {
        self.bad_window
    }

    /// The identity of the context this widget draws through, if any.
    #[inline]
    pub fn context_id(&self) -> Option<ContextId> {
        self.context.as_ref().map(SharedContext::id)
    }

    /// The capabilities the negotiated format actually satisfies.
    #[inline]
    pub fn format_details(&self) -> FormatDetails {
        self.details
    }

    /// The template the widget was configured with.
    #[inline]
    pub fn template(&self) -> &ConfigTemplate {
        &self.template
    }

    /// The native window handle, once `make_window` ran.
    #[inline]
    pub fn window(&self) -> Option<P::Window> {
        self.window
    }

    /// Select which stereo buffer subsequent projections target.
    #[inline]
    pub fn set_stereo_buffer(&mut self, buffer: StereoBuffer) {
        self.stereo_buffer = buffer;
    }

    /// Create the widget's rendering context.
    ///
    /// Idempotent: once a context exists the call is a no-op. Sharing
    /// directives resolve through the registry; both sharing modes alias
    /// the donor's underlying context (selective display-list-only sharing
    /// is not expressible through the native interfaces this crate
    /// targets), with the difference that `sharelist` adopts the donor's
    /// format wholesale while `sharecontext` negotiates its own format and
    /// insists it is compatible with the donor's.
    pub fn create_context(&mut self, registry: &mut Registry<P>) -> Result<()> {
        if self.context.is_some() {
            return Ok(());
        }

        let (config, context) = match self.template.share_directive() {
            Some((ShareKind::DisplayLists, ident)) => {
                let donor = registry.find(ident).ok_or_else(|| {
                    Error::with_message(
                        ErrorKind::BadShareTarget,
                        "invalid widget specified in the sharelist option",
                    )
                })?;
                let context = registry.context(donor).cloned().ok_or_else(|| {
                    Error::with_message(
                        ErrorKind::BadShareTarget,
                        "the sharelist widget has no rendering context",
                    )
                })?;
                let config = registry.format(donor).cloned().ok_or(ErrorKind::BadConfig)?;
                (config, context)
            },
            Some((ShareKind::Context, ident)) => {
                let donor = registry.find(ident).ok_or_else(|| {
                    Error::with_message(
                        ErrorKind::BadShareTarget,
                        "invalid widget specified in the sharecontext option",
                    )
                })?;
                let context = registry.context(donor).cloned().ok_or_else(|| {
                    Error::with_message(
                        ErrorKind::BadShareTarget,
                        "the sharecontext widget has no rendering context",
                    )
                })?;
                let config = self.platform.choose_config(&self.template)?;
                let donor_config = registry.format(donor).ok_or(ErrorKind::BadConfig)?;
                if !self.platform.formats_compatible(&config, donor_config) {
                    return Err(Error::with_message(
                        ErrorKind::BadCapabilities,
                        "unable to share OpenGL context",
                    ));
                }
                (config, context)
            },
            None => {
                let config = self.platform.choose_config(&self.template)?;
                let raw = self.platform.create_context(&config, self.template.profile())?;
                // Keep a context current from the moment it exists, so GL
                // calls issued by callbacks before the widget is mapped
                // have somewhere to go.
                self.platform.make_current_without_surface(&raw)?;
                (config, SharedContext::new(raw))
            },
        };

        self.details = self.platform.describe_config(&config);
        debug!("negotiated format for widget {:?}: {:?}", self.key, self.details);

        registry.set_context(self.key, Some(context.clone()));
        registry.set_format(self.key, Some(config.clone()));
        self.config = Some(config);
        self.context = Some(context);
        Ok(())
    }

    /// Bring the widget's native window into existence.
    ///
    /// This must always hand the toolkit a usable window handle, so every
    /// internal failure downgrades to a plain placeholder window and marks
    /// the widget as failed instead of propagating.
    pub fn make_window(&mut self, registry: &mut Registry<P>, parent: P::Parent) -> P::Window {
        if self.bad_window {
            return self.remember_placeholder(parent);
        }

        match self.try_make_window(registry, parent) {
            Ok(window) => window,
            Err(err) => {
                warn!("widget {:?} window creation failed: {err}; using a placeholder", self.key);
                self.bad_window = true;
                self.surface = None;
                self.remember_placeholder(parent)
            },
        }
    }

    fn remember_placeholder(&mut self, parent: P::Parent) -> P::Window {
        let window = self.platform.create_placeholder_window(
            parent,
            self.width.max(1),
            self.height.max(1),
        );
        self.window = Some(window);
        window
    }

    fn try_make_window(&mut self, registry: &mut Registry<P>, parent: P::Parent) -> Result<P::Window> {
        // Stale color-index state from a previous window is discarded.
        self.ramps = None;

        self.create_context(registry)?;
        let config = self.config.clone().ok_or(ErrorKind::BadConfig)?;

        let window = if self.template.pbuffer {
            let min = self.with_context(|platform, context| Ok(platform.pbuffer_min_size(context)))?;
            let largest = self.template.largest_pbuffer;
            let (width, height) = (self.width, self.height);
            let platform = self.platform.clone();
            let (surface, width, height) = {
                let context = self.context.as_ref().ok_or(ErrorKind::BadContext)?;
                alloc_with_shrink(width, height, min, largest, |w, h| {
                    platform.create_pbuffer(&config, context.raw(), w, h)
                })?
            };
            self.width = width;
            self.height = height;
            self.surface = Some(surface);
            // The toolkit still gets a (hidden) 1×1 window to track.
            self.platform.create_placeholder_window(parent, 1, 1)
        } else {
            let (surface, window) = self.platform.create_window_surface(
                &config,
                &self.template,
                parent,
                self.width,
                self.height,
            )?;

            if !self.template.double_buffering() && self.details.double_buffered {
                // The platform only had double-buffered formats on offer;
                // draw to the front buffer to mimic single buffering.
                self.with_context(|platform, context| {
                    platform.force_front_buffer_rendering(context, &surface)
                })?;
            }

            if let Err(err) = self.with_context(|platform, context| {
                platform.set_swap_interval(context, &surface, self.template.swap_interval)
            }) {
                debug!("swap interval not applied for widget {:?}: {err}", self.key);
            }

            self.surface = Some(surface);
            window
        };

        if self.template.is_color_index() {
            let bits = self.with_context(|platform, context| Ok(platform.index_bits(context)))?;
            self.ramps = Some(ColorRamps::with_index_bits(bits));
        }

        self.window = Some(window);
        Ok(window)
    }

    fn with_context<T>(
        &self,
        f: impl FnOnce(&P, &P::Context) -> Result<T>,
    ) -> Result<T> {
        let context = self.context.as_ref().ok_or(ErrorKind::BadContext)?;
        f(&self.platform, context.raw())
    }

    /// Make this widget's context current for the calling thread.
    ///
    /// When the context is shared, another widget may have left it attached
    /// to its own drawable; in that case the context is re-attached to this
    /// widget's surface before it becomes current. Without a context the
    /// call is a safe no-op.
    pub fn make_current(&self, registry: &Registry<P>) -> Result<()> {
        let (context, surface) = match (self.context.as_ref(), self.surface.as_ref()) {
            (Some(context), Some(surface)) => (context, surface),
            _ => return Ok(()),
        };

        if registry.other_sharing(self.key).is_some()
            && !self.platform.surface_is_bound(context.raw(), surface)
        {
            self.platform.bind_surface(context.raw(), surface)?;
        }

        self.platform.make_current(context.raw(), surface)
    }

    /// Present what was drawn.
    ///
    /// Swaps the buffers of a double-buffered widget, flushes otherwise.
    /// Callable only while the widget's context is current.
    pub fn swap_buffers(&self) -> Result<()> {
        if self.bad_window {
            return Err(ErrorKind::BadWindow.into());
        }

        if self.details.double_buffered {
            let context = self.context.as_ref().ok_or(ErrorKind::BadContext)?;
            let surface = self.surface.as_ref().ok_or(ErrorKind::BadSurface)?;
            self.platform.swap_buffers(context.raw(), surface)
        } else {
            self.platform.flush();
            Ok(())
        }
    }

    /// Copy the masked GL state from one widget's context to another's.
    ///
    /// When both widgets alias the same underlying context the current
    /// binding is released for the duration of the copy and restored
    /// afterwards, as the native interfaces require.
    pub fn copy_context(
        from: &Self,
        to: &Self,
        mask: u32,
        registry: &Registry<P>,
    ) -> Result<()> {
        let from_context = from.context.as_ref().ok_or(ErrorKind::BadContext)?;
        let to_context = to.context.as_ref().ok_or(ErrorKind::BadContext)?;

        let same = from_context.id() == to_context.id();
        if same {
            from.platform.clear_current();
        }

        let result = from.platform.copy_context(from_context.raw(), to_context.raw(), mask);

        if same {
            to.make_current(registry)?;
        }

        result
    }

    /// Read the widget's color buffer into an RGBA image block.
    ///
    /// Double-buffered widgets read the front buffer (the image last
    /// presented); color-index widgets go through their index-to-RGB
    /// ramps. The rows come back top-down, ready for an image consumer.
    pub fn take_photo(&self) -> Result<PixelBlock> {
        if self.bad_window {
            return Err(ErrorKind::BadWindow.into());
        }
        let context = self.context.as_ref().ok_or(ErrorKind::BadContext)?;
        let surface = self.surface.as_ref().ok_or(ErrorKind::BadSurface)?;

        let data = self.platform.read_pixels(
            context.raw(),
            surface,
            self.width,
            self.height,
            self.details.double_buffered,
            self.ramps.as_ref(),
        )?;

        let mut block = PixelBlock::from_raw(self.width, self.height, data);
        block.flip_vertically();
        Ok(block)
    }

    /// The GL extensions supported by the widget's context.
    ///
    /// The string is queried once and cached for the widget's lifetime.
    pub fn get_extensions(&mut self) -> Result<&str> {
        if self.extensions.is_none() {
            let context = self.context.as_ref().ok_or(ErrorKind::BadContext)?;
            let extensions =
                self.platform.extensions(context.raw(), self.template.profile())?;
            self.extensions = Some(extensions);
        }

        match self.extensions.as_deref() {
            Some(extensions) => Ok(extensions),
            None => Err(ErrorKind::BadContext.into()),
        }
    }

    /// The color ramps of a color-index widget.
    pub fn color_ramps_mut(&mut self) -> Option<&mut ColorRamps> {
        self.ramps.as_mut()
    }

    /// Per-eye perspective projection for the widget's stereo setup.
    pub fn frustum(
        &self,
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    ) -> Projection {
        Projection::frustum(&self.stereo_params(), left, right, bottom, top, near, far)
    }

    /// Per-eye orthographic projection for the widget's stereo setup.
    pub fn ortho(
        &self,
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    ) -> Projection {
        Projection::ortho(&self.stereo_params(), left, right, bottom, top, near, far)
    }

    fn stereo_params(&self) -> StereoParams {
        StereoParams {
            mode: self.template.stereo(),
            buffer: self.stereo_buffer,
            eye_separation: self.template.eye_separation,
            convergence: self.template.convergence,
        }
    }

    /// Release the widget's native resources.
    ///
    /// The drawable always dies with the widget; the context only dies
    /// when no other registered widget shares it, which holds regardless
    /// of the order sharing widgets are destroyed in.
    pub fn destroy(&mut self, registry: &mut Registry<P>) {
        self.platform.clear_current();
        self.extensions = None;
        self.ramps = None;
        self.surface = None;
        self.window = None;
        registry.unregister(self.key);
        self.context = None;
        self.config = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColorBufferType, ConfigTemplateBuilder};
    use crate::platform::testing::FakePlatform;
    use crate::stereo::StereoMode;

    type TestRegistry = Registry<FakePlatform>;

    fn new_widget(
        platform: &FakePlatform,
        registry: &mut TestRegistry,
        template: ConfigTemplate,
        ident: &str,
    ) -> Widget<FakePlatform> {
        Widget::new(
            platform.clone(),
            registry,
            template,
            Some(ident),
            &format!(".top.{ident}"),
            64,
            48,
        )
        .unwrap()
    }

    fn plain_template() -> ConfigTemplate {
        ConfigTemplateBuilder::new().build()
    }

    #[test]
    fn create_context_is_idempotent() {
        let platform = FakePlatform::new();
        let mut registry = TestRegistry::new();
        let mut widget = new_widget(&platform, &mut registry, plain_template(), "a");

        widget.create_context(&mut registry).unwrap();
        let id = widget.context_id().unwrap();
        widget.create_context(&mut registry).unwrap();

        assert_eq!(widget.context_id(), Some(id));
        assert_eq!(platform.state().contexts_created, 1);
        // A fresh context is made current right away.
        assert!(platform.state().current_context.is_some());
    }

    #[test]
    fn invalid_template_registers_nothing() {
        let platform = FakePlatform::new();
        let mut registry = TestRegistry::new();
        let template = ConfigTemplateBuilder::new()
            .with_buffer_type(ColorBufferType::Indexed)
            .with_pbuffer(true)
            .build();

        let result = Widget::new(platform, &mut registry, template, Some("bad"), ".bad", 8, 8);
        assert!(result.is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn sharelist_adopts_donor_context_and_format() {
        let platform = FakePlatform::new();
        let mut registry = TestRegistry::new();
        let mut donor = new_widget(&platform, &mut registry, plain_template(), "donor");
        donor.create_context(&mut registry).unwrap();

        let template = ConfigTemplateBuilder::new().share_lists_with("donor").build();
        let mut sharer = new_widget(&platform, &mut registry, template, "sharer");
        sharer.create_context(&mut registry).unwrap();

        assert_eq!(sharer.context_id(), donor.context_id());
        assert_eq!(platform.state().contexts_created, 1);
    }

    #[test]
    fn sharelist_with_unknown_widget_errors() {
        let platform = FakePlatform::new();
        let mut registry = TestRegistry::new();
        let template = ConfigTemplateBuilder::new().share_lists_with("nobody").build();
        let mut widget = new_widget(&platform, &mut registry, template, "w");

        let err = widget.create_context(&mut registry).unwrap_err();
        assert_eq!(err.error_kind(), ErrorKind::BadShareTarget);
        assert!(err.to_string().contains("sharelist"));
        assert_eq!(platform.state().contexts_created, 0);
    }

    #[test]
    fn sharecontext_requires_compatible_formats() {
        let platform = FakePlatform::new();
        let mut registry = TestRegistry::new();
        let mut donor = new_widget(&platform, &mut registry, plain_template(), "donor");
        donor.create_context(&mut registry).unwrap();

        // The platform now negotiates a different format family.
        platform.state_mut().compat_token = 7;

        let template = ConfigTemplateBuilder::new().share_context_with("donor").build();
        let mut sharer = new_widget(&platform, &mut registry, template, "sharer");
        let err = sharer.create_context(&mut registry).unwrap_err();
        assert!(err.to_string().contains("unable to share OpenGL context"));
    }

    #[test]
    fn sharecontext_aliases_on_compatible_formats() {
        let platform = FakePlatform::new();
        let mut registry = TestRegistry::new();
        let mut donor = new_widget(&platform, &mut registry, plain_template(), "donor");
        donor.create_context(&mut registry).unwrap();

        let template = ConfigTemplateBuilder::new().share_context_with(".top.donor").build();
        let mut sharer = new_widget(&platform, &mut registry, template, "sharer");
        sharer.create_context(&mut registry).unwrap();

        assert_eq!(sharer.context_id(), donor.context_id());
        assert_eq!(platform.state().contexts_created, 1);
    }

    #[test]
    fn shared_context_is_freed_exactly_once_in_any_order() {
        // Destroying the donor first must keep the context alive for the
        // sharer; destroying the last sharer frees it exactly once.
        for donor_first in [true, false] {
            let platform = FakePlatform::new();
            let mut registry = TestRegistry::new();
            let mut donor = new_widget(&platform, &mut registry, plain_template(), "donor");
            donor.create_context(&mut registry).unwrap();

            let template = ConfigTemplateBuilder::new().share_context_with("donor").build();
            let mut sharer = new_widget(&platform, &mut registry, template, "sharer");
            sharer.create_context(&mut registry).unwrap();

            let (mut first, mut second) =
                if donor_first { (donor, sharer) } else { (sharer, donor) };

            first.destroy(&mut registry);
            assert_eq!(platform.state().contexts_destroyed, 0);
            assert!(second.context_id().is_some());

            second.destroy(&mut registry);
            assert_eq!(platform.state().contexts_destroyed, 1);
            assert!(registry.is_empty());
        }
    }

    #[test]
    fn scenario_share_create_destroy() {
        let platform = FakePlatform::new();
        platform.state_mut().details.double_buffered = true;
        platform.state_mut().details.has_depth = true;
        let mut registry = TestRegistry::new();

        let template_a = ConfigTemplateBuilder::new()
            .with_double_buffering(true)
            .with_depth_size(16)
            .build();
        let mut a = new_widget(&platform, &mut registry, template_a, "a");
        a.make_window(&mut registry, 0);

        let template_b = ConfigTemplateBuilder::new().share_context_with("a").build();
        let mut b = new_widget(&platform, &mut registry, template_b, "b");
        b.make_window(&mut registry, 0);

        assert_eq!(a.context_id(), b.context_id());

        a.destroy(&mut registry);

        assert!(b.context_id().is_some());
        b.make_current(&registry).unwrap();
        b.swap_buffers().unwrap();

        b.destroy(&mut registry);
        assert!(registry.is_empty());
        assert_eq!(platform.state().contexts_destroyed, 1);
    }

    #[test]
    fn make_window_failure_returns_placeholder_and_marks_bad() {
        let platform = FakePlatform::new();
        platform.state_mut().fail_window = true;
        let mut registry = TestRegistry::new();
        let mut widget = new_widget(&platform, &mut registry, plain_template(), "w");

        let _window = widget.make_window(&mut registry, 0);
        assert!(widget.is_bad_window());
        assert_eq!(platform.state().placeholder_windows, 1);

        // Further requests keep producing placeholders without touching
        // the native path again.
        let _again = widget.make_window(&mut registry, 0);
        assert_eq!(platform.state().placeholder_windows, 2);

        // Draw operations report errors instead of crashing.
        assert_eq!(widget.swap_buffers().unwrap_err().error_kind(), ErrorKind::BadWindow);
        assert_eq!(widget.take_photo().unwrap_err().error_kind(), ErrorKind::BadWindow);
        widget.destroy(&mut registry);
    }

    #[test]
    fn negotiation_failure_also_downgrades_make_window() {
        let platform = FakePlatform::new();
        platform.state_mut().fail_choose_config = true;
        let mut registry = TestRegistry::new();
        let mut widget = new_widget(&platform, &mut registry, plain_template(), "w");

        let _window = widget.make_window(&mut registry, 0);
        assert!(widget.is_bad_window());
        assert!(widget.context_id().is_none());
    }

    #[test]
    fn make_current_without_context_is_a_noop() {
        let platform = FakePlatform::new();
        let mut registry = TestRegistry::new();
        let widget = new_widget(&platform, &mut registry, plain_template(), "w");
        widget.make_current(&registry).unwrap();
        assert_eq!(platform.state().rebinds, 0);
    }

    #[test]
    fn alternating_shared_widgets_rebind_the_surface() {
        let platform = FakePlatform::new();
        let mut registry = TestRegistry::new();
        let mut a = new_widget(&platform, &mut registry, plain_template(), "a");
        a.make_window(&mut registry, 0);

        let template = ConfigTemplateBuilder::new().share_context_with("a").build();
        let mut b = new_widget(&platform, &mut registry, template, "b");
        b.make_window(&mut registry, 0);

        a.make_current(&registry).unwrap();
        b.make_current(&registry).unwrap();
        a.make_current(&registry).unwrap();
        // Repeating the same widget does not rebind again.
        a.make_current(&registry).unwrap();

        assert_eq!(platform.state().rebinds, 3);
    }

    #[test]
    fn unshared_widget_never_rebinds() {
        let platform = FakePlatform::new();
        let mut registry = TestRegistry::new();
        let mut widget = new_widget(&platform, &mut registry, plain_template(), "w");
        widget.make_window(&mut registry, 0);

        widget.make_current(&registry).unwrap();
        widget.make_current(&registry).unwrap();
        assert_eq!(platform.state().rebinds, 0);
    }

    #[test]
    fn swap_semantics_follow_the_negotiated_format() {
        let platform = FakePlatform::new();
        platform.state_mut().details.double_buffered = true;
        let mut registry = TestRegistry::new();
        let template = ConfigTemplateBuilder::new().with_double_buffering(true).build();
        let mut widget = new_widget(&platform, &mut registry, template, "w");
        widget.make_window(&mut registry, 0);
        widget.swap_buffers().unwrap();
        assert_eq!(platform.state().swaps, 1);
        assert_eq!(platform.state().flushes, 0);

        let platform = FakePlatform::new();
        let mut registry = TestRegistry::new();
        let mut widget = new_widget(&platform, &mut registry, plain_template(), "w");
        widget.make_window(&mut registry, 0);
        widget.swap_buffers().unwrap();
        assert_eq!(platform.state().swaps, 0);
        assert_eq!(platform.state().flushes, 1);
    }

    #[test]
    fn single_buffer_request_on_double_format_forces_front_buffer() {
        let platform = FakePlatform::new();
        platform.state_mut().details.double_buffered = true;
        let mut registry = TestRegistry::new();
        let mut widget = new_widget(&platform, &mut registry, plain_template(), "w");
        widget.make_window(&mut registry, 0);
        assert_eq!(platform.state().front_buffer_forced, 1);
    }

    #[test]
    fn swap_interval_is_applied_to_window_surfaces() {
        let platform = FakePlatform::new();
        let mut registry = TestRegistry::new();
        let template = ConfigTemplateBuilder::new().with_swap_interval(0).build();
        let mut widget = new_widget(&platform, &mut registry, template, "w");
        widget.make_window(&mut registry, 0);
        assert_eq!(platform.state().swap_intervals, [0]);
    }

    #[test]
    fn pbuffer_widget_shrinks_to_granted_size() {
        let platform = FakePlatform::new();
        platform.state_mut().pbuffer_max_width = Some(16);
        let mut registry = TestRegistry::new();
        let template = ConfigTemplateBuilder::new()
            .with_pbuffer(true)
            .with_largest_pbuffer(true)
            .build();
        let mut widget = new_widget(&platform, &mut registry, template, "w");

        widget.make_window(&mut registry, 0);
        assert!(!widget.is_bad_window());
        assert_eq!(widget.width(), 16);
        assert_eq!(widget.height(), 12);
        // Pbuffer widgets still hand the toolkit a placeholder window.
        assert_eq!(platform.state().placeholder_windows, 1);
    }

    #[test]
    fn pbuffer_failure_without_largest_goes_bad() {
        let platform = FakePlatform::new();
        platform.state_mut().pbuffer_max_width = Some(16);
        let mut registry = TestRegistry::new();
        let template = ConfigTemplateBuilder::new().with_pbuffer(true).build();
        let mut widget = new_widget(&platform, &mut registry, template, "w");

        widget.make_window(&mut registry, 0);
        assert!(widget.is_bad_window());
    }

    #[test]
    fn photo_flips_readback_rows() {
        let platform = FakePlatform::new();
        let mut registry = TestRegistry::new();
        let mut widget = new_widget(&platform, &mut registry, plain_template(), "w");
        widget.make_window(&mut registry, 0);

        let block = widget.take_photo().unwrap();
        assert_eq!(block.width(), 64);
        assert_eq!(block.height(), 48);

        // The fake marks the bottom GL row; after the flip it must sit in
        // the last image row and nowhere else.
        let pitch = block.pitch();
        let data = block.data();
        assert!(data[(47 * pitch)..].iter().all(|&b| b == 0xAB));
        assert!(data[..47 * pitch].iter().all(|&b| b == 0));
    }

    #[test]
    fn color_index_widgets_get_ramps_and_use_them() {
        let platform = FakePlatform::new();
        platform.state_mut().details.rgba = false;
        platform.state_mut().index_bits = 3;
        let mut registry = TestRegistry::new();
        let template = ConfigTemplateBuilder::new()
            .with_buffer_type(ColorBufferType::Indexed)
            .build();
        let mut widget = new_widget(&platform, &mut registry, template, "w");
        widget.make_window(&mut registry, 0);

        assert_eq!(widget.color_ramps_mut().map(|r| r.len()), Some(8));
        widget.take_photo().unwrap();
        assert!(platform.state().ramps_seen);
    }

    #[test]
    fn extensions_are_cached_per_widget() {
        let platform = FakePlatform::new();
        let mut registry = TestRegistry::new();
        let mut widget = new_widget(&platform, &mut registry, plain_template(), "w");
        widget.make_window(&mut registry, 0);

        let first = widget.get_extensions().unwrap().to_owned();
        let second = widget.get_extensions().unwrap().to_owned();
        assert_eq!(first, second);
        assert_eq!(platform.state().extension_queries, 1);
    }

    #[test]
    fn copy_between_distinct_contexts_keeps_binding() {
        let platform = FakePlatform::new();
        let mut registry = TestRegistry::new();
        let mut a = new_widget(&platform, &mut registry, plain_template(), "a");
        a.make_window(&mut registry, 0);
        let mut b = new_widget(&platform, &mut registry, plain_template(), "b");
        b.make_window(&mut registry, 0);

        let clears_before = platform.state().clears;
        Widget::copy_context(&a, &b, 0xFFFF_FFFF, &registry).unwrap();
        assert_eq!(platform.state().clears, clears_before);
        assert_eq!(platform.state().copies.len(), 1);
    }

    #[test]
    fn copy_over_an_aliased_context_clears_and_restores() {
        let platform = FakePlatform::new();
        let mut registry = TestRegistry::new();
        let mut a = new_widget(&platform, &mut registry, plain_template(), "a");
        a.make_window(&mut registry, 0);
        let template = ConfigTemplateBuilder::new().share_context_with("a").build();
        let mut b = new_widget(&platform, &mut registry, template, "b");
        b.make_window(&mut registry, 0);

        let clears_before = platform.state().clears;
        Widget::copy_context(&a, &b, 1, &registry).unwrap();
        assert_eq!(platform.state().clears, clears_before + 1);
        // The destination ends up current again.
        assert!(platform.state().current_context.is_some());
    }

    #[test]
    fn stereo_projection_uses_widget_configuration() {
        let platform = FakePlatform::new();
        let mut registry = TestRegistry::new();
        let template = ConfigTemplateBuilder::new().with_stereo(StereoMode::Native).build();
        let mut widget = new_widget(&platform, &mut registry, template, "w");
        widget.set_stereo_buffer(StereoBuffer::Left);

        let projection = widget.frustum(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
        let shift = 34.0 * (-1.0 / 35.0);
        assert!((projection.left - (-1.0 + shift)).abs() < 1e-9);
        assert!((projection.camera_shift_x - -shift).abs() < 1e-9);
    }

    #[test]
    fn destroy_releases_surface_and_registry_entry() {
        let platform = FakePlatform::new();
        let mut registry = TestRegistry::new();
        let mut widget = new_widget(&platform, &mut registry, plain_template(), "w");
        widget.make_window(&mut registry, 0);

        widget.destroy(&mut registry);
        assert!(registry.is_empty());
        assert_eq!(platform.state().surfaces_destroyed, platform.state().surfaces_created);
        assert_eq!(platform.state().contexts_destroyed, 1);
    }
}
