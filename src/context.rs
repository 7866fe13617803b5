//! Rendering-context handles and sharing.

use std::fmt;
use std::num::NonZeroU64;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::platform::GlPlatform;

/// The OpenGL profile to create contexts with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GlProfile {
    /// The legacy compatibility profile, version 2.1.
    #[default]
    Legacy,

    /// The 3.2 core profile.
    Core3_2,

    /// The 4.1 core profile.
    Core4_1,

    /// Whatever the system considers current; treated as the 4.1 core
    /// profile.
    System,
}

impl GlProfile {
    /// The context version requested from the platform.
    pub fn version(self) -> (u8, u8) {
        match self {
            GlProfile::Legacy => (2, 1),
            GlProfile::Core3_2 => (3, 2),
            GlProfile::Core4_1 | GlProfile::System => (4, 1),
        }
    }

    /// Whether the profile is a core profile.
    pub fn is_core(self) -> bool {
        !matches!(self, GlProfile::Legacy)
    }
}

/// Identity of an underlying native context state.
///
/// Two widgets share a context exactly when their handles carry the same
/// id. The id survives aliasing, so the "is this context still in use by
/// someone else" question is a plain equality check instead of a pointer
/// comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(NonZeroU64);

impl ContextId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        let id = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN))
    }
}

/// A shared handle to one native rendering context.
///
/// All widgets drawing through the same underlying context hold clones of
/// one `SharedContext`; the native context is destroyed when the last clone
/// is dropped, no matter in which order the sharing widgets go away.
pub struct SharedContext<P: GlPlatform> {
    inner: Rc<ContextShared<P>>,
}

struct ContextShared<P: GlPlatform> {
    id: ContextId,
    raw: P::Context,
}

impl<P: GlPlatform> SharedContext<P> {
    /// Wrap a freshly created native context.
    pub(crate) fn new(raw: P::Context) -> Self {
        Self { inner: Rc::new(ContextShared { id: ContextId::next(), raw }) }
    }

    /// The identity of the underlying context state.
    #[inline]
    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    /// The backend context object.
    #[inline]
    pub(crate) fn raw(&self) -> &P::Context {
        &self.inner.raw
    }

    /// The number of live handles to the underlying context.
    pub(crate) fn sharers(&self) -> usize {
        Rc::strong_count(&self.inner)
    }
}

impl<P: GlPlatform> Clone for SharedContext<P> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<P: GlPlatform> fmt::Debug for SharedContext<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedContext")
            .field("id", &self.inner.id)
            .field("raw", &self.inner.raw)
            .field("sharers", &self.sharers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_versions() {
        assert_eq!(GlProfile::Legacy.version(), (2, 1));
        assert_eq!(GlProfile::Core3_2.version(), (3, 2));
        assert_eq!(GlProfile::Core4_1.version(), (4, 1));
        assert_eq!(GlProfile::System.version(), (4, 1));
        assert!(!GlProfile::Legacy.is_core());
        assert!(GlProfile::System.is_core());
    }

    #[test]
    fn ids_are_unique() {
        let a = ContextId::next();
        let b = ContextId::next();
        assert_ne!(a, b);
    }
}
