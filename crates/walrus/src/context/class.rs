use ahash::AHashMap;
use indexmap::IndexSet;

use crate::{mangle::mangle, scope::ScopeKeyword, tracer::ConvertTracer};

/// Names bound by assignment expressions directly in a class body.
///
/// Such a binding is stored in the class namespace through `locals()`, so it
/// lands exactly where the original assignment would and stays visible to
/// later statements of the body.
#[derive(Debug)]
pub(crate) struct ClassState {
    class_name: String,
    /// Mangled member names, in order of first binding.
    members: IndexSet<String>,
    /// Names the body declares `global` or `nonlocal`; these bind outside the
    /// class and go through wrapper functions instead.
    external_overrides: AHashMap<String, ScopeKeyword>,
}

impl ClassState {
    pub(crate) fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_owned(),
            members: IndexSet::new(),
            external_overrides: AHashMap::new(),
        }
    }

    pub(super) fn record_override(&mut self, name: &str, keyword: ScopeKeyword) {
        self.external_overrides.insert(name.to_owned(), keyword);
    }

    pub(super) fn is_overridden(&self, name: &str) -> bool {
        self.external_overrides.contains_key(name)
    }

    pub(super) fn override_keyword(&self, name: &str) -> Option<ScopeKeyword> {
        self.external_overrides.get(name).copied()
    }

    /// Returns the namespace key for `name`, registering it on first use.
    pub(super) fn slot(&mut self, name: &str, uid: &str, tracer: &mut impl ConvertTracer) -> String {
        let key = mangle(name, &self.class_name).into_owned();
        if self.members.insert(key.clone()) {
            tracer.on_class_slot(&self.class_name, &key, uid);
        }
        key
    }

    #[cfg(test)]
    pub(super) fn members(&self) -> &IndexSet<String> {
        &self.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracer::{RecordingTracer, TraceEvent};

    #[test]
    fn slots_are_mangled_and_registered_once() {
        let mut state = ClassState::new("_Config");
        let mut tracer = RecordingTracer::new();
        assert_eq!(state.slot("__secret", "0", &mut tracer), "_Config__secret");
        assert_eq!(state.slot("__secret", "1", &mut tracer), "_Config__secret");
        assert_eq!(state.slot("plain", "2", &mut tracer), "plain");
        assert_eq!(
            state.members().iter().map(String::as_str).collect::<Vec<_>>(),
            ["_Config__secret", "plain"]
        );
        assert_eq!(
            tracer.events().len(),
            2,
            "only the first binding of a member is traced: {:?}",
            tracer.events()
        );
        assert!(matches!(&tracer.events()[0], TraceEvent::ClassSlot { uid, .. } if uid == "0"));
    }

    #[test]
    fn overrides_take_keyword() {
        let mut state = ClassState::new("A");
        state.record_override("x", ScopeKeyword::Nonlocal);
        assert!(state.is_overridden("x"));
        assert!(!state.is_overridden("y"));
        assert_eq!(state.override_keyword("x"), Some(ScopeKeyword::Nonlocal));
    }
}
