use super::generics::{
    build_forest, HierarchyArena, HierarchyError, HierarchyLookup, HierarchyNode, HierarchyStore,
    HierarchyTreeNode, OwnerId,
};
use crate::api::error::ApiResult;
use crate::api::extract::CurrentUser;
use crate::api::state::AppState;
use crate::tables::{Folder, NewFolder};
use axum::{extract::State, Json};
use diesel::prelude::*;

impl HierarchyNode for Folder {
    fn id(&self) -> i32 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn parent_id(&self) -> Option<i32> {
        self.parent_id
    }

    fn owner_id(&self) -> OwnerId {
        self.owner_id
    }
}

/// Folder hierarchy backed by the `folders` table. Sibling names are not
/// unique, so `create` never conflicts.
pub struct FolderStore<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> FolderStore<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }
}

impl HierarchyLookup for FolderStore<'_> {
    type Node = Folder;

    fn find(
        &mut self,
        owner: OwnerId,
        parent: Option<i32>,
        folder_name: &str,
    ) -> Result<Option<Folder>, HierarchyError> {
        use crate::schema::folders::dsl::*;

        let mut query = folders
            .filter(owner_id.eq(owner))
            .filter(name.eq(folder_name))
            .select(Folder::as_select())
            .order(id.asc())
            .into_boxed();

        query = match parent {
            Some(pid) => query.filter(parent_id.eq(pid)),
            None => query.filter(parent_id.is_null()),
        };

        Ok(query.first(self.conn).optional()?)
    }

    fn load_parent(
        &mut self,
        owner: OwnerId,
        node: &Folder,
    ) -> Result<Option<Folder>, HierarchyError> {
        match node.parent_id {
            Some(pid) => Ok(Folder::get_owned(self.conn, owner, pid)?),
            None => Ok(None),
        }
    }
}

impl HierarchyStore for FolderStore<'_> {
    fn create(
        &mut self,
        owner: OwnerId,
        parent: Option<i32>,
        folder_name: &str,
    ) -> Result<Folder, HierarchyError> {
        use crate::schema::folders;

        let new_folder = NewFolder {
            name: folder_name,
            parent_id: parent,
            owner_id: owner,
        };

        Ok(diesel::insert_into(folders::table)
            .values(&new_folder)
            .returning(Folder::as_returning())
            .get_result(self.conn)?)
    }
}

pub fn load_folder_arena(
    conn: &mut PgConnection,
    owner: OwnerId,
) -> QueryResult<HierarchyArena<Folder>> {
    Ok(HierarchyArena::new(Folder::get_all_owned(conn, owner)?))
}

/// The owner's folders, row-locked for the rest of the current transaction.
pub fn lock_folder_arena(
    conn: &mut PgConnection,
    owner: OwnerId,
) -> QueryResult<HierarchyArena<Folder>> {
    Ok(HierarchyArena::new(Folder::lock_all_owned(conn, owner)?))
}

pub async fn get_folder_tree(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<HierarchyTreeNode>>> {
    let mut conn = state.conn()?;
    let arena = load_folder_arena(&mut conn, user.id())?;
    Ok(Json(build_forest(&arena)))
}
