//! The per-thread registry of live widgets.
//!
//! The registry answers two questions: "which widget does this sharing
//! directive name" and "does any other widget draw through this context".
//! One registry instance belongs to one UI thread; the shell constructs it
//! at startup and passes it to the widget operations explicitly. Widget
//! counts stay small, so a prepend-insert list with linear scans is all the
//! structure this needs.

use crate::context::SharedContext;
use crate::platform::GlPlatform;

/// A stable handle to one registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetKey(u64);

/// The registry of live widgets on one thread.
#[derive(Debug)]
pub struct Registry<P: GlPlatform> {
    entries: Vec<Entry<P>>,
    next_key: u64,
}

#[derive(Debug)]
struct Entry<P: GlPlatform> {
    key: WidgetKey,
    ident: Option<String>,
    pathname: String,
    context: Option<SharedContext<P>>,
    config: Option<P::Config>,
}

impl<P: GlPlatform> Registry<P> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { entries: Vec::new(), next_key: 1 }
    }

    /// Register a widget under its user identifier and toolkit pathname.
    ///
    /// New widgets go to the front of the list; lookups return the first
    /// match.
    pub fn register(&mut self, ident: Option<&str>, pathname: &str) -> WidgetKey {
        let key = WidgetKey(self.next_key);
        self.next_key += 1;
        self.entries.insert(0, Entry {
            key,
            ident: ident.map(str::to_owned),
            pathname: pathname.to_owned(),
            context: None,
            config: None,
        });
        key
    }

    /// Remove a widget from the registry.
    pub fn unregister(&mut self, key: WidgetKey) {
        self.entries.retain(|entry| entry.key != key);
    }

    /// Find a widget by user identifier or toolkit pathname.
    ///
    /// Toolkit pathnames start with a dot, so a leading `.` selects the
    /// pathname namespace and anything else the user identifier.
    pub fn find(&self, ident: &str) -> Option<WidgetKey> {
        let entry = if ident.starts_with('.') {
            self.entries.iter().find(|entry| entry.pathname == ident)
        } else {
            self.entries.iter().find(|entry| entry.ident.as_deref() == Some(ident))
        };
        entry.map(|entry| entry.key)
    }

    /// Record (or clear) the context a widget draws through.
    pub(crate) fn set_context(&mut self, key: WidgetKey, context: Option<SharedContext<P>>) {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.key == key) {
            entry.context = context;
        }
    }

    /// The context recorded for a widget.
    pub(crate) fn context(&self, key: WidgetKey) -> Option<&SharedContext<P>> {
        self.entries.iter().find(|entry| entry.key == key)?.context.as_ref()
    }

    /// Record the format a widget was negotiated.
    pub(crate) fn set_format(&mut self, key: WidgetKey, config: Option<P::Config>) {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.key == key) {
            entry.config = config;
        }
    }

    /// The negotiated format recorded for a widget.
    pub(crate) fn format(&self, key: WidgetKey) -> Option<&P::Config> {
        self.entries.iter().find(|entry| entry.key == key)?.config.as_ref()
    }

    /// Any *other* widget drawing through the same context as the given
    /// one.
    pub fn other_sharing(&self, key: WidgetKey) -> Option<WidgetKey> {
        let id = self.context(key)?.id();
        self.entries
            .iter()
            .find(|entry| {
                entry.key != key && entry.context.as_ref().map(SharedContext::id) == Some(id)
            })
            .map(|entry| entry.key)
    }

    /// The number of registered widgets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no widgets.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: GlPlatform> Default for Registry<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::FakePlatform;

    type TestRegistry = Registry<FakePlatform>;

    #[test]
    fn lookup_by_ident_and_pathname() {
        let mut registry = TestRegistry::new();
        let a = registry.register(Some("alpha"), ".top.alpha");
        let b = registry.register(Some("beta"), ".top.beta");
        let c = registry.register(None, ".top.gamma");

        assert_eq!(registry.find("alpha"), Some(a));
        assert_eq!(registry.find("beta"), Some(b));
        assert_eq!(registry.find(".top.gamma"), Some(c));
        assert_eq!(registry.find(".top.alpha"), Some(a));
        assert_eq!(registry.find("gamma"), None);
        assert_eq!(registry.find(".top.delta"), None);
    }

    #[test]
    fn unregister_leaves_other_entries_intact() {
        let mut registry = TestRegistry::new();
        let keys: Vec<_> = (0..5)
            .map(|i| registry.register(Some(&format!("w{i}")), &format!(".w{i}")))
            .collect();

        registry.unregister(keys[2]);

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.find("w2"), None);
        for (i, key) in keys.iter().enumerate() {
            if i != 2 {
                assert_eq!(registry.find(&format!("w{i}")), Some(*key));
            }
        }
    }

    #[test]
    fn first_match_wins_for_duplicate_idents() {
        let mut registry = TestRegistry::new();
        let older = registry.register(Some("dup"), ".a");
        let newer = registry.register(Some("dup"), ".b");

        // Insertion prepends, so the most recently registered widget is
        // found first.
        assert_eq!(registry.find("dup"), Some(newer));
        registry.unregister(newer);
        assert_eq!(registry.find("dup"), Some(older));
    }

    #[test]
    fn context_sharing_lookup() {
        let platform = FakePlatform::new();
        let mut registry = TestRegistry::new();
        let a = registry.register(Some("a"), ".a");
        let b = registry.register(Some("b"), ".b");
        let c = registry.register(Some("c"), ".c");

        let shared = SharedContext::new(platform.new_context());
        registry.set_context(a, Some(shared.clone()));
        registry.set_context(b, Some(shared));
        registry.set_context(c, Some(SharedContext::new(platform.new_context())));

        assert_eq!(registry.other_sharing(a), Some(b));
        assert_eq!(registry.other_sharing(b), Some(a));
        assert_eq!(registry.other_sharing(c), None);

        registry.set_context(b, None);
        assert_eq!(registry.other_sharing(a), None);
    }
}
