use super::generics::{
    build_forest, HierarchyArena, HierarchyError, HierarchyLookup, HierarchyNode, HierarchyStore,
    HierarchyTreeNode, OwnerId,
};
use crate::api::error::ApiResult;
use crate::api::extract::CurrentUser;
use crate::api::state::AppState;
use crate::tables::{NewTag, Tag};
use axum::{extract::State, Json};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

impl HierarchyNode for Tag {
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

/// Tag hierarchy backed by the `tags` table.
///
/// `create` runs in a nested transaction so a unique violation only rolls
/// back to its savepoint and the surrounding walk can retry the lookup.
pub struct TagStore<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> TagStore<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }
}

impl HierarchyLookup for TagStore<'_> {
    type Node = Tag;

    fn find(
        &mut self,
        owner: OwnerId,
        parent: Option<i32>,
        tag_name: &str,
    ) -> Result<Option<Tag>, HierarchyError> {
        use crate::schema::tags::dsl::*;

        let mut query = tags
            .filter(owner_id.eq(owner))
            .filter(name.eq(tag_name))
            .select(Tag::as_select())
            .into_boxed();

        query = match parent {
            Some(pid) => query.filter(parent_id.eq(pid)),
            None => query.filter(parent_id.is_null()),
        };

        Ok(query.first(self.conn).optional()?)
    }

    fn load_parent(&mut self, owner: OwnerId, node: &Tag) -> Result<Option<Tag>, HierarchyError> {
        match node.parent_id {
            Some(pid) => Ok(Tag::get_owned(self.conn, owner, pid)?),
            None => Ok(None),
        }
    }
}

impl HierarchyStore for TagStore<'_> {
    fn create(
        &mut self,
        owner: OwnerId,
        parent: Option<i32>,
        tag_name: &str,
    ) -> Result<Tag, HierarchyError> {
        use crate::schema::tags;

        let new_tag = NewTag {
            name: tag_name,
            parent_id: parent,
            owner_id: owner,
        };

        self.conn
            .transaction::<Tag, DieselError, _>(|conn| {
                diesel::insert_into(tags::table)
                    .values(&new_tag)
                    .returning(Tag::as_returning())
                    .get_result(conn)
            })
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    HierarchyError::Conflict(tag_name.to_string())
                }
                other => HierarchyError::DatabaseError(other),
            })
    }
}

/// All of one owner's tags, loaded once.
pub fn load_tag_arena(conn: &mut PgConnection, owner: OwnerId) -> QueryResult<HierarchyArena<Tag>> {
    Ok(HierarchyArena::new(Tag::get_all_owned(conn, owner)?))
}

pub async fn get_tag_tree(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<HierarchyTreeNode>>> {
    let mut conn = state.conn()?;
    let arena = load_tag_arena(&mut conn, user.id())?;
    Ok(Json(build_forest(&arena)))
}
