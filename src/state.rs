//! Copy-on-write world states.
//!
//! Key invariants:
//! - A state never changes once built; transitions create children.
//! - Reads merge a node's own entries with its ancestors' (merge-on-read).
//! - The ancestry chain is bounded: past the configured depth a child is
//!   flattened into a single self-contained node.
//! - Equality and hashing are by resolved content, never by identity.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use crate::error::ExecutionError;
use crate::fluent::GroundFluent;
use crate::value::Value;

/// Default number of ancestors a state may have before it is flattened.
pub const MAX_ANCESTORS: usize = 20;

#[derive(Debug)]
struct StateNode {
    values: HashMap<GroundFluent, Value>,
    parent: Option<Arc<StateNode>>,
    ancestors: usize,
    max_ancestors: usize,
    fingerprint: OnceLock<[u8; 32]>,
}

/// An immutable assignment of values to ground fluents.
///
/// Cloning a state is cheap: it shares the underlying node.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use plansim::{Environment, Fluent, State, Type, Value};
///
/// let env = Environment::new();
/// let fuel = Fluent::new(&env, "fuel", Type::int(), Vec::new()).unwrap();
/// let key = fuel.ground(Vec::new()).unwrap();
///
/// let root = State::new(HashMap::from([(key.clone(), Value::Int(3))]));
/// let child = root.make_child(HashMap::from([(key.clone(), Value::Int(2))]));
///
/// assert_eq!(root.lookup(&key).unwrap(), &Value::Int(3));
/// assert_eq!(child.lookup(&key).unwrap(), &Value::Int(2));
/// ```
#[derive(Clone)]
pub struct State {
    node: Arc<StateNode>,
}

impl State {
    /// Creates a root state with the default ancestry bound.
    #[must_use]
    pub fn new(values: HashMap<GroundFluent, Value>) -> Self {
        Self::with_max_ancestors(values, MAX_ANCESTORS)
    }

    /// Creates a root state whose descendants flatten after `max_ancestors` links.
    #[must_use]
    pub fn with_max_ancestors(values: HashMap<GroundFluent, Value>, max_ancestors: usize) -> Self {
        Self {
            node: Arc::new(StateNode {
                values,
                parent: None,
                ancestors: 0,
                max_ancestors: max_ancestors.max(1),
                fingerprint: OnceLock::new(),
            }),
        }
    }

    /// Returns the value of `fluent`.
    pub fn lookup(&self, fluent: &GroundFluent) -> Result<&Value, ExecutionError> {
        let mut node = Some(&self.node);
        while let Some(n) = node {
            if let Some(v) = n.values.get(fluent) {
                return Ok(v);
            }
            node = n.parent.as_ref();
        }
        Err(ExecutionError::UndefinedFluent {
            fluent: fluent.to_string(),
        })
    }

    /// Returns a new state that reads `updates` first and this state otherwise.
    #[must_use]
    pub fn make_child(&self, updates: HashMap<GroundFluent, Value>) -> Self {
        let max_ancestors = self.node.max_ancestors;
        if self.node.ancestors + 1 >= max_ancestors {
            let mut values = self.values();
            values.extend(updates);
            return Self::with_max_ancestors(values, max_ancestors);
        }
        Self {
            node: Arc::new(StateNode {
                values: updates,
                parent: Some(Arc::clone(&self.node)),
                ancestors: self.node.ancestors + 1,
                max_ancestors,
                fingerprint: OnceLock::new(),
            }),
        }
    }

    /// Resolves the full content of the state.
    #[must_use]
    pub fn values(&self) -> HashMap<GroundFluent, Value> {
        let mut chain = Vec::with_capacity(self.node.ancestors + 1);
        let mut node = Some(&self.node);
        while let Some(n) = node {
            chain.push(n);
            node = n.parent.as_ref();
        }
        let mut values = HashMap::new();
        for n in chain.into_iter().rev() {
            values.extend(n.values.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        values
    }

    /// Number of ancestors linked behind this state.
    #[must_use]
    pub fn ancestors(&self) -> usize {
        self.node.ancestors
    }

    /// Stable digest of the resolved content.
    ///
    /// Entries are hashed in a canonical order, so two states with the same
    /// content share a fingerprint regardless of how they were derived.
    #[must_use]
    pub fn fingerprint(&self) -> [u8; 32] {
        *self.node.fingerprint.get_or_init(|| {
            let mut entries: Vec<(String, String)> = self
                .values()
                .into_iter()
                .map(|(k, v)| (k.to_string(), format!("{}:{v}", v.type_name())))
                .collect();
            entries.sort();
            let mut hasher = blake3::Hasher::new();
            for (k, v) in &entries {
                hasher.update(k.as_bytes());
                hasher.update(b"=");
                hasher.update(v.as_bytes());
                hasher.update(b";");
            }
            *hasher.finalize().as_bytes()
        })
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node) || self.values() == other.values()
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint().hash(state);
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<(String, String)> = self
            .values()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        entries.sort();
        f.debug_map().entries(entries).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::environment::Environment;
    use crate::fluent::Fluent;
    use crate::types::Type;

    fn keys(n: usize) -> Vec<GroundFluent> {
        let env = Environment::new();
        (0..n)
            .map(|i| {
                Fluent::new(&env, format!("f{i}"), Type::int(), Vec::new())
                    .unwrap()
                    .ground(Vec::new())
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_child_does_not_touch_parent() {
        let k = keys(2);
        let root = State::new(HashMap::from([
            (k[0].clone(), Value::Int(1)),
            (k[1].clone(), Value::Int(2)),
        ]));
        let child = root.make_child(HashMap::from([(k[0].clone(), Value::Int(10))]));
        assert_eq!(root.lookup(&k[0]).unwrap(), &Value::Int(1));
        assert_eq!(child.lookup(&k[0]).unwrap(), &Value::Int(10));
        assert_eq!(child.lookup(&k[1]).unwrap(), &Value::Int(2));
        assert_eq!(child.ancestors(), 1);
    }

    #[test]
    fn test_undefined_fluent() {
        let k = keys(2);
        let root = State::new(HashMap::from([(k[0].clone(), Value::Int(1))]));
        assert!(matches!(
            root.lookup(&k[1]),
            Err(ExecutionError::UndefinedFluent { .. })
        ));
    }

    #[test]
    fn test_chain_is_flattened() {
        let k = keys(1);
        let mut state = State::with_max_ancestors(HashMap::from([(k[0].clone(), Value::Int(0))]), 3);
        for i in 1..=10 {
            state = state.make_child(HashMap::from([(k[0].clone(), Value::Int(i))]));
            assert!(state.ancestors() < 3);
        }
        assert_eq!(state.lookup(&k[0]).unwrap(), &Value::Int(10));
    }

    #[test]
    fn test_equality_and_hash_by_content() {
        let k = keys(2);
        let a = State::new(HashMap::from([
            (k[0].clone(), Value::Int(1)),
            (k[1].clone(), Value::Int(2)),
        ]));
        let b = State::new(HashMap::from([(k[0].clone(), Value::Int(5))]))
            .make_child(HashMap::from([(k[1].clone(), Value::Int(2))]))
            .make_child(HashMap::from([(k[0].clone(), Value::Int(1))]));
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut visited = HashSet::new();
        visited.insert(a);
        assert!(!visited.insert(b));
    }

    #[test]
    fn test_numeric_kinds_fingerprint_differently() {
        let k = keys(1);
        let int = State::new(HashMap::from([(k[0].clone(), Value::Int(1))]));
        let real = State::new(HashMap::from([(k[0].clone(), Value::from(1.0))]));
        assert_ne!(int, real);
        assert_ne!(int.fingerprint(), real.fingerprint());
    }
}
