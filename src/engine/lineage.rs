//! Ancestor chain of the locator being resolved
//!
//! Each branch of a walk carries its own [`Lineage`]: a persistent list of
//! locator identities from the root down. Siblings share their parent's
//! links, so descending is O(1) and branches never see each other. The
//! same record may therefore be visited on two different branches; only a
//! locator that reappears among its own ancestors is a cycle.

use crate::core::{EngineConfig, Error, Result};
use crate::types::{Address, Locator};
use std::sync::Arc;

#[derive(Debug)]
struct Link {
    identity: String,
    parent: Option<Arc<Link>>,
}

/// Identities from the root locator to the current one
#[derive(Debug, Clone, Default)]
pub struct Lineage {
    tail: Option<Arc<Link>>,
    depth: usize,
}

impl Lineage {
    /// Empty lineage for a new request
    pub fn root() -> Self {
        Self::default()
    }

    /// Number of locators entered so far
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// True if `identity` is already on the chain
    pub fn contains(&self, identity: &str) -> bool {
        let mut link = self.tail.as_deref();
        while let Some(current) = link {
            if current.identity == identity {
                return true;
            }
            link = current.parent.as_deref();
        }
        false
    }

    /// Descend into `locator`, one level deeper
    pub fn enter<A: Address>(&self, locator: &Locator<A>, config: &EngineConfig) -> Result<Self> {
        if self.depth >= config.max_depth {
            return Err(Error::DepthExceeded {
                max_depth: config.max_depth,
            });
        }
        let mut next = self.push(locator.identity(), config)?;
        next.depth += 1;
        Ok(next)
    }

    /// Descend into one record fetched through the current locator
    ///
    /// Does not count towards the depth limit.
    pub fn enter_record<A: Address>(&self, narrowed: &Locator<A>, config: &EngineConfig) -> Result<Self> {
        let identity = narrowed.identity();
        if self.tail.as_ref().is_some_and(|tail| tail.identity == identity) {
            return Ok(self.clone());
        }
        self.push(identity, config)
    }

    fn push(&self, identity: String, config: &EngineConfig) -> Result<Self> {
        if config.detect_cycles && self.contains(&identity) {
            return Err(Error::CycleDetected { locator: identity });
        }
        Ok(Self {
            tail: Some(Arc::new(Link {
                identity,
                parent: self.tail.clone(),
            })),
            depth: self.depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentPath;

    fn user(id: &str) -> Locator<DocumentPath> {
        Locator::single("user", DocumentPath::new(["users"], [id]))
    }

    #[test]
    fn test_repeated_ancestor_is_a_cycle() {
        let config = EngineConfig::default();
        let lineage = Lineage::root().enter(&user("u1"), &config).unwrap();
        let lineage = lineage.enter(&user("u2"), &config).unwrap();

        let err = lineage.enter(&user("u1"), &config).unwrap_err();
        assert!(matches!(err, Error::CycleDetected { .. }));
    }

    #[test]
    fn test_siblings_do_not_see_each_other() {
        let config = EngineConfig::default();
        let root = Lineage::root().enter(&user("u0"), &config).unwrap();
        let left = root.enter(&user("u1"), &config).unwrap();
        assert!(left.contains("user:users/u1"));
        assert!(root.enter(&user("u1"), &config).is_ok());
        assert_eq!(left.depth(), 2);
    }

    #[test]
    fn test_depth_limit() {
        let config = EngineConfig {
            max_depth: 2,
            ..EngineConfig::default()
        };
        let lineage = Lineage::root().enter(&user("a"), &config).unwrap();
        let lineage = lineage.enter(&user("b"), &config).unwrap();
        let err = lineage.enter(&user("c"), &config).unwrap_err();
        assert!(matches!(err, Error::DepthExceeded { max_depth: 2 }));
    }

    #[test]
    fn test_cycle_detection_can_be_disabled() {
        let config = EngineConfig {
            detect_cycles: false,
            ..EngineConfig::default()
        };
        let lineage = Lineage::root().enter(&user("u1"), &config).unwrap();
        assert!(lineage.enter(&user("u1"), &config).is_ok());
    }

    #[test]
    fn test_narrowed_record_of_single_locator_is_not_a_cycle() {
        let config = EngineConfig::default();
        let lineage = Lineage::root().enter(&user("u1"), &config).unwrap();
        let narrowed = user("u1").narrow("u1");
        assert!(lineage.enter_record(&narrowed, &config).is_ok());
    }
}
