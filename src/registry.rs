use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::catalog::{Catalog, Domain, Vocabulary};
use crate::config::EngineConfig;
use crate::enrich::EnrichmentProvider;
use crate::store::Collection;
use crate::types::{
    Action, ActionType, ActionTypeDescription, Condition, ConditionType, ConditionTypeDescription,
    RuleError,
};

/// Binds one domain's owner-scoped base collection to that domain's catalog.
///
/// This is the only path from rules, conditions and actions to type
/// behavior. The base collection is scoped once, here, so no condition ever
/// has to exclude invalid records itself.
#[derive(Clone)]
pub struct Registry<C: Collection> {
    catalog: Catalog,
    base: C,
    provider: Option<Arc<dyn EnrichmentProvider>>,
    config: EngineConfig,
}

impl<C: Collection> Registry<C> {
    /// `collection` is the owner's unrestricted collection; the domain's
    /// scope is applied to it here.
    #[must_use]
    pub fn new(domain: Domain, collection: C, vocabulary: &Vocabulary) -> Self {
        let catalog = Catalog::for_domain(domain, vocabulary);
        let base = collection.restrict(catalog.scope().clone());
        Self {
            catalog,
            base,
            provider: None,
            config: EngineConfig::default(),
        }
    }

    /// Wire in the provider that enrichment actions consult.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn EnrichmentProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn domain(&self) -> Domain {
        self.catalog.domain()
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn provider(&self) -> Option<&dyn EnrichmentProvider> {
        self.provider.as_deref()
    }

    /// The scoped, otherwise unrestricted starting collection.
    #[must_use]
    pub fn base_collection(&self) -> C {
        self.base.clone()
    }

    /// # Errors
    ///
    /// [`RuleError::UnsupportedConditionType`] for an undeclared key.
    pub fn resolve_condition(&self, key: &str) -> Result<&ConditionType, RuleError> {
        self.catalog.condition_type(key)
    }

    /// # Errors
    ///
    /// [`RuleError::UnsupportedActionType`] for an undeclared key.
    pub fn resolve_action(&self, key: &str) -> Result<&ActionType, RuleError> {
        self.catalog.action_type(key)
    }

    /// Restrict the base collection to the records matching every condition
    /// in `conditions`.
    ///
    /// # Errors
    ///
    /// Any [`RuleError`] raised while resolving or building the conditions.
    pub fn evaluate(&self, conditions: &[Condition]) -> Result<C, RuleError> {
        crate::evaluate::evaluate(self, &self.base, conditions, None)
    }

    /// Like [`Registry::evaluate`], starting from `collection` instead of the
    /// base collection.
    ///
    /// # Errors
    ///
    /// Any [`RuleError`] raised while resolving or building the conditions.
    pub fn evaluate_within(&self, collection: &C, conditions: &[Condition]) -> Result<C, RuleError> {
        crate::evaluate::evaluate(self, collection, conditions, None)
    }

    /// Run one action against an already filtered collection. Returns the
    /// number of records written.
    ///
    /// # Errors
    ///
    /// [`RuleError`] for an unknown action type or invalid value, otherwise
    /// the store's or provider's own error.
    pub fn execute(
        &self,
        action: &Action,
        matched: &C,
        ignore_attribute_locks: bool,
    ) -> Result<usize, crate::EngineError> {
        crate::execute::execute(self, action, matched, ignore_attribute_locks)
    }

    /// The authoring-form shape of every condition and action type.
    #[must_use]
    pub fn describe(&self) -> RegistryDescription {
        RegistryDescription {
            domain: self.domain(),
            conditions: self
                .catalog
                .condition_types()
                .iter()
                .map(ConditionType::describe)
                .collect(),
            actions: self
                .catalog
                .action_types()
                .iter()
                .map(ActionType::describe)
                .collect(),
        }
    }
}

impl<C: Collection + fmt::Debug> fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("domain", &self.domain())
            .field("base", &self.base)
            .field("provider", &self.provider.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Serializable catalog shape for rendering an authoring form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryDescription {
    pub domain: Domain,
    pub conditions: Vec<ConditionTypeDescription>,
    pub actions: Vec<ActionTypeDescription>,
}
