pub mod folders;
pub mod generics;
pub mod tags;

pub use generics::{
    build_forest, find_or_create_path, full_path, split_path, would_create_cycle, HierarchyArena,
    HierarchyError, HierarchyLookup, HierarchyNode, HierarchyStore, HierarchyTreeNode, OwnerId,
};
