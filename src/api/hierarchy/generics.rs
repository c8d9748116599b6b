use crate::config::{EmptyPathPolicy, HierarchyPolicy};
use diesel::result::Error as DieselError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub type OwnerId = Uuid;

pub const PATH_SEPARATOR: char = '/';

#[derive(Error, Debug)]
pub enum HierarchyError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DieselError),

    #[error("Cycle detected in hierarchy at node {0}")]
    CyclicHierarchy(i32),

    #[error("Path contains no names")]
    EmptyPath,

    #[error("Concurrent creation of '{0}' could not be resolved")]
    Conflict(String),
}

/// A tag or folder: a record that may point at a parent of its own kind.
pub trait HierarchyNode {
    fn id(&self) -> i32;
    fn name(&self) -> &str;
    fn parent_id(&self) -> Option<i32>;
    fn owner_id(&self) -> OwnerId;
}

/// Read access to one kind of hierarchy, always scoped to an owner.
pub trait HierarchyLookup {
    type Node: HierarchyNode;

    fn find(
        &mut self,
        owner: OwnerId,
        parent_id: Option<i32>,
        name: &str,
    ) -> Result<Option<Self::Node>, HierarchyError>;

    /// `None` for roots, and for nodes whose parent is gone or belongs to
    /// someone else.
    fn load_parent(
        &mut self,
        owner: OwnerId,
        node: &Self::Node,
    ) -> Result<Option<Self::Node>, HierarchyError>;
}

pub trait HierarchyStore: HierarchyLookup {
    /// Stores whose sibling names are unique fail with
    /// [`HierarchyError::Conflict`] on a duplicate.
    fn create(
        &mut self,
        owner: OwnerId,
        parent_id: Option<i32>,
        name: &str,
    ) -> Result<Self::Node, HierarchyError>;
}

/// Names from the root down to `node`, inclusive.
pub fn path_components<L: HierarchyLookup>(
    lookup: &mut L,
    owner: OwnerId,
    node: &L::Node,
) -> Result<Vec<String>, HierarchyError> {
    let mut names = vec![node.name().to_string()];
    let mut visited = HashSet::from([node.id()]);

    let mut current = lookup.load_parent(owner, node)?;
    while let Some(parent) = current {
        if !visited.insert(parent.id()) {
            return Err(HierarchyError::CyclicHierarchy(parent.id()));
        }
        names.push(parent.name().to_string());
        current = lookup.load_parent(owner, &parent)?;
    }

    names.reverse();
    Ok(names)
}

/// The `/`-joined names from the root down to `node`.
pub fn full_path<L: HierarchyLookup>(
    lookup: &mut L,
    owner: OwnerId,
    node: &L::Node,
) -> Result<String, HierarchyError> {
    Ok(path_components(lookup, owner, node)?.join("/"))
}

/// Splits a `/`-delimited path into its component names.
///
/// Empty and whitespace-only segments are dropped, so leading, trailing and
/// repeated separators are harmless. With `normalize_names` each component is
/// trimmed and lower-cased.
pub fn split_path(full_name: &str, policy: &HierarchyPolicy) -> Result<Vec<String>, HierarchyError> {
    let names: Vec<String> = full_name
        .trim()
        .split(PATH_SEPARATOR)
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            if policy.normalize_names {
                part.trim().to_lowercase()
            } else {
                part.to_string()
            }
        })
        .collect();

    if names.is_empty() && policy.empty_path == EmptyPathPolicy::Reject {
        return Err(HierarchyError::EmptyPath);
    }
    Ok(names)
}

/// Walks `names` from the root, reusing existing nodes and creating missing
/// ones. Returns the whole chain, root first.
///
/// A `Conflict` from the store means another unit of work created the same
/// node after our lookup; the lookup is retried once before giving up.
pub fn find_or_create_path<S: HierarchyStore>(
    store: &mut S,
    owner: OwnerId,
    names: &[String],
) -> Result<Vec<S::Node>, HierarchyError> {
    let mut chain: Vec<S::Node> = Vec::with_capacity(names.len());

    for name in names {
        let parent_id = chain.last().map(HierarchyNode::id);

        let node = match store.find(owner, parent_id, name)? {
            Some(existing) => {
                debug!("Reusing '{}' (id {}) under {:?}", name, existing.id(), parent_id);
                existing
            }
            None => match store.create(owner, parent_id, name) {
                Ok(created) => {
                    info!("Created '{}' (id {}) under {:?}", name, created.id(), parent_id);
                    created
                }
                Err(HierarchyError::Conflict(_)) => {
                    warn!("'{}' was created concurrently under {:?}, retrying lookup", name, parent_id);
                    store
                        .find(owner, parent_id, name)?
                        .ok_or_else(|| HierarchyError::Conflict(name.clone()))?
                }
                Err(e) => return Err(e),
            },
        };

        chain.push(node);
    }

    Ok(chain)
}

/// Whether making `new_parent` the parent of `node_id` would close a loop.
pub fn would_create_cycle<L: HierarchyLookup>(
    lookup: &mut L,
    owner: OwnerId,
    node_id: i32,
    new_parent: &L::Node,
) -> Result<bool, HierarchyError> {
    if new_parent.id() == node_id {
        return Ok(true);
    }

    let mut visited = HashSet::from([new_parent.id()]);
    let mut current = lookup.load_parent(owner, new_parent)?;
    while let Some(ancestor) = current {
        if ancestor.id() == node_id {
            return Ok(true);
        }
        if !visited.insert(ancestor.id()) {
            return Err(HierarchyError::CyclicHierarchy(ancestor.id()));
        }
        current = lookup.load_parent(owner, &ancestor)?;
    }
    Ok(false)
}

/// Every node of one owner's hierarchy held in memory, for answering list and
/// tree requests without a query per ancestor.
#[derive(Debug)]
pub struct HierarchyArena<N> {
    nodes: HashMap<i32, N>,
    children: HashMap<i32, Vec<i32>>,
    ids: Vec<i32>,
}

impl<N: HierarchyNode + Clone> HierarchyArena<N> {
    pub fn new(nodes: Vec<N>) -> Self {
        let mut ids: Vec<i32> = nodes.iter().map(HierarchyNode::id).collect();
        ids.sort_unstable();

        let mut children: HashMap<i32, Vec<i32>> = HashMap::new();
        for node in &nodes {
            if let Some(pid) = node.parent_id() {
                children.entry(pid).or_default().push(node.id());
            }
        }
        for list in children.values_mut() {
            list.sort_unstable();
        }

        Self {
            nodes: nodes.into_iter().map(|n| (n.id(), n)).collect(),
            children,
            ids,
        }
    }

    pub fn get(&self, id: i32) -> Option<&N> {
        self.nodes.get(&id)
    }

    /// Nodes in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &N> {
        self.ids.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn child_ids(&self, id: i32) -> Vec<i32> {
        self.children.get(&id).cloned().unwrap_or_default()
    }

    /// Nodes without a parent, or whose parent is not in the arena.
    pub fn root_ids(&self) -> Vec<i32> {
        self.iter()
            .filter(|n| n.parent_id().map_or(true, |pid| !self.nodes.contains_key(&pid)))
            .map(HierarchyNode::id)
            .collect()
    }
}

impl<N: HierarchyNode + Clone> HierarchyLookup for HierarchyArena<N> {
    type Node = N;

    fn find(
        &mut self,
        owner: OwnerId,
        parent_id: Option<i32>,
        name: &str,
    ) -> Result<Option<N>, HierarchyError> {
        Ok(self
            .iter()
            .find(|n| n.owner_id() == owner && n.parent_id() == parent_id && n.name() == name)
            .cloned())
    }

    fn load_parent(&mut self, owner: OwnerId, node: &N) -> Result<Option<N>, HierarchyError> {
        Ok(node
            .parent_id()
            .and_then(|pid| self.nodes.get(&pid))
            .filter(|parent| parent.owner_id() == owner)
            .cloned())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HierarchyTreeNode {
    pub id: i32,
    pub name: String,
    pub full_path: String,
    pub children: Vec<HierarchyTreeNode>,
}

/// Builds nested trees from an arena. Nodes caught in a parent cycle are never
/// reachable from a root and are left out.
pub fn build_forest<N: HierarchyNode + Clone>(arena: &HierarchyArena<N>) -> Vec<HierarchyTreeNode> {
    fn build_subtree<N: HierarchyNode + Clone>(
        arena: &HierarchyArena<N>,
        node: &N,
        prefix: Option<&str>,
    ) -> HierarchyTreeNode {
        let full_path = match prefix {
            Some(p) => format!("{}{}{}", p, PATH_SEPARATOR, node.name()),
            None => node.name().to_string(),
        };

        let children = arena
            .child_ids(node.id())
            .into_iter()
            .filter_map(|child_id| arena.get(child_id))
            .map(|child| build_subtree(arena, child, Some(&full_path)))
            .collect();

        HierarchyTreeNode {
            id: node.id(),
            name: node.name().to_string(),
            full_path,
            children,
        }
    }

    arena
        .root_ids()
        .into_iter()
        .filter_map(|id| arena.get(id))
        .map(|root| build_subtree(arena, root, None))
        .collect()
}
