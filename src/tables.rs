use crate::schema::*;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl User {
    pub fn get_by_id(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<Option<Self>> {
        use crate::schema::users::dsl::*;
        users
            .find(user_id)
            .select(User::as_select())
            .first(conn)
            .optional()
    }

    pub fn find_by_username(conn: &mut PgConnection, name: &str) -> QueryResult<Option<Self>> {
        use crate::schema::users::dsl::*;
        users
            .filter(username.eq(name))
            .select(User::as_select())
            .first(conn)
            .optional()
    }

    pub fn get_page(conn: &mut PgConnection, skip: i64, limit: i64) -> QueryResult<Vec<Self>> {
        use crate::schema::users::dsl::*;
        users
            .order(username.asc())
            .offset(skip)
            .limit(limit)
            .select(User::as_select())
            .load(conn)
    }
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub email: &'a str,
    pub hashed_password: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub is_active: bool,
    pub is_superuser: bool,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = folders)]
pub struct Folder {
    pub id: i32,
    pub name: String,
    pub parent_id: Option<i32>,
    pub owner_id: Uuid,
}

impl Folder {
    pub fn get_owned(conn: &mut PgConnection, owner: Uuid, folder_id: i32) -> QueryResult<Option<Self>> {
        use crate::schema::folders::dsl::*;
        folders
            .filter(id.eq(folder_id))
            .filter(owner_id.eq(owner))
            .select(Folder::as_select())
            .first(conn)
            .optional()
    }

    pub fn get_all_owned(conn: &mut PgConnection, owner: Uuid) -> QueryResult<Vec<Self>> {
        use crate::schema::folders::dsl::*;
        folders
            .filter(owner_id.eq(owner))
            .order(id.asc())
            .select(Folder::as_select())
            .load(conn)
    }

    /// Like `get_all_owned`, but row-locks every folder of `owner` until the
    /// surrounding transaction ends. Concurrent moves of the same owner's
    /// folders are serialized behind this lock.
    pub fn lock_all_owned(conn: &mut PgConnection, owner: Uuid) -> QueryResult<Vec<Self>> {
        use crate::schema::folders::dsl::*;
        folders
            .filter(owner_id.eq(owner))
            .order(id.asc())
            .select(Folder::as_select())
            .for_update()
            .load(conn)
    }
}

#[derive(Insertable)]
#[diesel(table_name = folders)]
pub struct NewFolder<'a> {
    pub name: &'a str,
    pub parent_id: Option<i32>,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = tags)]
pub struct Tag {
    pub id: i32,
    pub name: String,
    pub parent_id: Option<i32>,
    pub owner_id: Uuid,
}

impl Tag {
    pub fn get_owned(conn: &mut PgConnection, owner: Uuid, tag_id: i32) -> QueryResult<Option<Self>> {
        use crate::schema::tags::dsl::*;
        tags.filter(id.eq(tag_id))
            .filter(owner_id.eq(owner))
            .select(Tag::as_select())
            .first(conn)
            .optional()
    }

    pub fn get_all_owned(conn: &mut PgConnection, owner: Uuid) -> QueryResult<Vec<Self>> {
        use crate::schema::tags::dsl::*;
        tags.filter(owner_id.eq(owner))
            .order(id.asc())
            .select(Tag::as_select())
            .load(conn)
    }

    /// Returns how many of `tag_ids` exist and belong to `owner`.
    pub fn count_owned(conn: &mut PgConnection, owner: Uuid, tag_ids: &[i32]) -> QueryResult<i64> {
        use crate::schema::tags::dsl::*;
        tags.filter(owner_id.eq(owner))
            .filter(id.eq_any(tag_ids))
            .count()
            .get_result(conn)
    }
}

#[derive(Insertable)]
#[diesel(table_name = tags)]
pub struct NewTag<'a> {
    pub name: &'a str,
    pub parent_id: Option<i32>,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = notes)]
pub struct Note {
    pub id: i32,
    pub title: String,
    pub body: String,
    pub folder_id: Option<i32>,
    pub owner_id: Uuid,
    pub created_at: chrono::NaiveDateTime,
    pub modified_at: chrono::NaiveDateTime,
}

impl Note {
    pub fn get_owned(conn: &mut PgConnection, owner: Uuid, note_id: i32) -> QueryResult<Option<Self>> {
        use crate::schema::notes::dsl::*;
        notes
            .filter(id.eq(note_id))
            .filter(owner_id.eq(owner))
            .select(Note::as_select())
            .first(conn)
            .optional()
    }

    pub fn get_all_owned(
        conn: &mut PgConnection,
        owner: Uuid,
        in_folder: Option<i32>,
    ) -> QueryResult<Vec<Self>> {
        use crate::schema::notes::dsl::*;
        let mut query = notes
            .filter(owner_id.eq(owner))
            .select(Note::as_select())
            .order(id.asc())
            .into_boxed();
        if let Some(fid) = in_folder {
            query = query.filter(folder_id.eq(fid));
        }
        query.load(conn)
    }
}

#[derive(Insertable)]
#[diesel(table_name = notes)]
pub struct NewNote<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub folder_id: Option<i32>,
    pub owner_id: Uuid,
    pub created_at: chrono::NaiveDateTime,
    pub modified_at: chrono::NaiveDateTime,
}

#[derive(Debug, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = note_tags)]
pub struct NoteTag {
    pub note_id: i32,
    pub tag_id: i32,
}

impl NoteTag {
    /// Groups the tag ids linked to each of `note_ids` by note id.
    pub fn tag_ids_by_note(
        conn: &mut PgConnection,
        note_ids: &[i32],
    ) -> QueryResult<HashMap<i32, Vec<i32>>> {
        use crate::schema::note_tags::dsl::*;

        let links = note_tags
            .filter(note_id.eq_any(note_ids))
            .order((note_id.asc(), tag_id.asc()))
            .select(NoteTag::as_select())
            .load(conn)?;

        let mut grouped: HashMap<i32, Vec<i32>> = HashMap::new();
        for link in links {
            grouped.entry(link.note_id).or_default().push(link.tag_id);
        }
        Ok(grouped)
    }

    /// Replaces every tag link of a note with `tag_ids`.
    pub fn replace_for_note(
        conn: &mut PgConnection,
        target_note: i32,
        tag_ids: &[i32],
    ) -> QueryResult<()> {
        use crate::schema::note_tags::dsl::*;

        diesel::delete(note_tags.filter(note_id.eq(target_note))).execute(conn)?;

        let links: Vec<NewNoteTag> = tag_ids
            .iter()
            .map(|t| NewNoteTag {
                note_id: target_note,
                tag_id: *t,
            })
            .collect();

        if !links.is_empty() {
            diesel::insert_into(note_tags).values(&links).execute(conn)?;
        }
        Ok(())
    }
}

#[derive(Insertable)]
#[diesel(table_name = note_tags)]
pub struct NewNoteTag {
    pub note_id: i32,
    pub tag_id: i32,
}
