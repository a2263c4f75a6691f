//! The provider registry (§7): the one place new vendors get wired in.

use std::collections::HashMap;
use std::sync::Arc;

use freshell_types::ProviderId;

use crate::traits::Provider;

pub struct Registry {
    providers: HashMap<ProviderId, Arc<dyn Provider>>,
}

impl Registry {
    pub fn new() -> Self {
        let mut providers: HashMap<ProviderId, Arc<dyn Provider>> = HashMap::new();
        providers.insert(ProviderId::Claude, Arc::new(crate::claude::ClaudeProvider));
        providers.insert(ProviderId::Codex, Arc::new(crate::codex::CodexProvider));
        Self { providers }
    }

    pub fn get(&self, id: ProviderId) -> Option<Arc<dyn Provider>> {
        self.providers.get(&id).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProviderId, &Arc<dyn Provider>)> {
        self.providers.iter()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_both_known_providers() {
        let registry = Registry::new();
        assert!(registry.get(ProviderId::Claude).is_some());
        assert!(registry.get(ProviderId::Codex).is_some());
    }
}
