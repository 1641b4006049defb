//! [`SqliteStore`], the SQLite implementation of [`CatalogStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{
  Connection, OptionalExtension as _, functions::FunctionFlags, params,
};
use uuid::Uuid;

use vitrine_core::{
  profile::{NewProfile, Profile, ProfileFilter, ProfilePatch},
  store::CatalogStore,
  tag::{NewTag, Tag, TagDetail, TagPatch, TagSummary},
};

use crate::{
  Error, Result,
  encode::{
    PROFILE_COLUMNS, RawProfile, RawTag, RawTagSummary, TAG_COLUMNS,
    FOLD_FN, encode_dt, encode_followers, encode_uuid, fold_case,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Vitrine catalog backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Every
/// `call` runs on the connection's own thread, so a check-then-write inside
/// one closure is atomic with respect to other callers.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// A write refused on domain grounds, carried out of a `call` closure.
enum Rejected {
  UsernameTaken,
  TagNameTaken,
  UnknownTag(Uuid),
}

impl Rejected {
  fn into_error(self, name: String) -> Error {
    match self {
      Rejected::UsernameTaken => Error::UsernameTaken(name),
      Rejected::TagNameTaken => Error::TagNameTaken(name),
      Rejected::UnknownTag(id) => Error::UnknownTag(id),
    }
  }
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        register_functions(conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers (run on the connection thread) ──────────────────────────────

fn select_tag(conn: &Connection, tag_id: &str) -> rusqlite::Result<Option<RawTag>> {
  conn
    .query_row(
      &format!("SELECT {TAG_COLUMNS} FROM tags t WHERE t.tag_id = ?1"),
      params![tag_id],
      RawTag::from_row,
    )
    .optional()
}

fn select_tags_of(conn: &Connection, profile_id: &str) -> rusqlite::Result<Vec<RawTag>> {
  let mut stmt = conn.prepare_cached(&format!(
    "SELECT {TAG_COLUMNS}
     FROM tags t
     JOIN profile_tags pt ON pt.tag_id = t.tag_id
     WHERE pt.profile_id = ?1
     ORDER BY t.name"
  ))?;
  let tags = stmt
    .query_map(params![profile_id], RawTag::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(tags)
}

fn attach_tags(
  conn: &Connection,
  mut profiles: Vec<RawProfile>,
) -> rusqlite::Result<Vec<RawProfile>> {
  for profile in &mut profiles {
    profile.tags = select_tags_of(conn, &profile.profile_id)?;
  }
  Ok(profiles)
}

/// `column` must be a unique column of `profiles`.
fn select_profile_by(
  conn: &Connection,
  column: &'static str,
  value: &str,
) -> rusqlite::Result<Option<RawProfile>> {
  let raw = conn
    .query_row(
      &format!("SELECT {PROFILE_COLUMNS} FROM profiles p WHERE p.{column} = ?1"),
      params![value],
      RawProfile::from_row,
    )
    .optional()?;
  match raw {
    Some(mut raw) => {
      raw.tags = select_tags_of(conn, &raw.profile_id)?;
      Ok(Some(raw))
    }
    None => Ok(None),
  }
}

/// Per-connection SQL functions the queries below rely on.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
  conn.create_scalar_function(
    FOLD_FN,
    1,
    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
    |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| fold_case(&s))),
  )
}

fn exists(conn: &Connection, sql: &str, value: &str) -> rusqlite::Result<bool> {
  Ok(conn.query_row(sql, params![value], |_| Ok(())).optional()?.is_some())
}

/// The first id in `tag_ids` with no `tags` row.
fn first_unknown_tag(conn: &Connection, tag_ids: &[Uuid]) -> rusqlite::Result<Option<Uuid>> {
  for id in tag_ids {
    if !exists(conn, "SELECT 1 FROM tags WHERE tag_id = ?1", &encode_uuid(*id))? {
      return Ok(Some(*id));
    }
  }
  Ok(None)
}

fn link_tags(conn: &Connection, profile_id: &str, tag_ids: &[Uuid]) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare_cached(
    "INSERT OR IGNORE INTO profile_tags (profile_id, tag_id) VALUES (?1, ?2)",
  )?;
  for id in tag_ids {
    stmt.execute(params![profile_id, encode_uuid(*id)])?;
  }
  Ok(())
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Tags ──────────────────────────────────────────────────────────────────

  async fn create_tag(&self, input: NewTag) -> Result<Tag> {
    let tag = Tag {
      tag_id:     Uuid::new_v4(),
      name:       input.name,
      color:      input.color,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(tag.tag_id);
    let name   = tag.name.clone();
    let color  = tag.color.clone();
    let at_str = encode_dt(tag.created_at);

    let outcome = self
      .conn
      .call(move |conn| {
        if exists(conn, "SELECT 1 FROM tags WHERE name = ?1", &name)? {
          return Ok(Err(Rejected::TagNameTaken));
        }
        conn.execute(
          "INSERT INTO tags (tag_id, name, color, created_at) VALUES (?1, ?2, ?3, ?4)",
          params![id_str, name, color, at_str],
        )?;
        Ok(Ok(()))
      })
      .await?;

    outcome.map_err(|r| r.into_error(tag.name.clone()))?;
    Ok(tag)
  }

  async fn get_tag(&self, id: Uuid) -> Result<Option<TagDetail>> {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| {
        let Some(tag) = select_tag(conn, &id_str)? else {
          return Ok(None);
        };
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROFILE_COLUMNS}
           FROM profiles p
           JOIN profile_tags pt ON pt.profile_id = p.profile_id
           WHERE pt.tag_id = ?1
           ORDER BY p.followers DESC, p.username ASC"
        ))?;
        let profiles = stmt
          .query_map(params![id_str], RawProfile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some((tag, attach_tags(conn, profiles)?)))
      })
      .await?;

    raw
      .map(|(tag, profiles)| -> Result<TagDetail> {
        Ok(TagDetail {
          tag:      tag.into_tag()?,
          profiles: profiles
            .into_iter()
            .map(RawProfile::into_profile)
            .collect::<Result<_>>()?,
        })
      })
      .transpose()
  }

  async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
    let name = name.to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {TAG_COLUMNS} FROM tags t WHERE t.name = ?1"),
              params![name],
              RawTag::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTag::into_tag).transpose()
  }

  async fn list_tags(&self) -> Result<Vec<TagSummary>> {
    let raws: Vec<RawTagSummary> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TAG_COLUMNS}, COUNT(pt.profile_id)
           FROM tags t
           LEFT JOIN profile_tags pt ON pt.tag_id = t.tag_id
           GROUP BY t.tag_id
           ORDER BY t.name ASC"
        ))?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawTagSummary {
              tag:           RawTag::from_row(row)?,
              profile_count: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTagSummary::into_summary).collect()
  }

  async fn update_tag(&self, id: Uuid, patch: TagPatch) -> Result<Option<Tag>> {
    let id_str = encode_uuid(id);
    let taken_name = patch.name.clone().unwrap_or_default();

    let outcome = self
      .conn
      .call(move |conn| {
        if select_tag(conn, &id_str)?.is_none() {
          return Ok(Ok(None));
        }
        if let Some(name) = &patch.name {
          let clash = conn
            .query_row(
              "SELECT 1 FROM tags WHERE name = ?1 AND tag_id != ?2",
              params![name, id_str],
              |_| Ok(()),
            )
            .optional()?;
          if clash.is_some() {
            return Ok(Err(Rejected::TagNameTaken));
          }
        }
        conn.execute(
          "UPDATE tags
           SET name  = COALESCE(?2, name),
               color = COALESCE(?3, color)
           WHERE tag_id = ?1",
          params![id_str, patch.name, patch.color],
        )?;
        Ok(Ok(select_tag(conn, &id_str)?))
      })
      .await?;

    outcome
      .map_err(|r| r.into_error(taken_name))?
      .map(RawTag::into_tag)
      .transpose()
  }

  async fn delete_tag(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let deleted = self
      .conn
      .call(move |conn| Ok(conn.execute("DELETE FROM tags WHERE tag_id = ?1", params![id_str])?))
      .await?;
    Ok(deleted > 0)
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn create_profile(&self, input: NewProfile) -> Result<Profile> {
    let id_str    = encode_uuid(Uuid::new_v4());
    let at_str    = encode_dt(Utc::now());
    let username  = input.username.clone();
    let followers = encode_followers(input.followers);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if exists(&tx, "SELECT 1 FROM profiles WHERE username = ?1", &input.username)? {
          return Ok(Err(Rejected::UsernameTaken));
        }
        if let Some(unknown) = first_unknown_tag(&tx, &input.tag_ids)? {
          return Ok(Err(Rejected::UnknownTag(unknown)));
        }
        tx.execute(
          "INSERT INTO profiles (
             profile_id, username, full_name, profile_pic, bio,
             followers, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
          params![
            id_str,
            input.username,
            input.full_name,
            input.profile_pic,
            input.bio,
            followers,
            at_str,
          ],
        )?;
        link_tags(&tx, &id_str, &input.tag_ids)?;
        let created = select_profile_by(&tx, "profile_id", &id_str)?;
        tx.commit()?;
        Ok(Ok(created))
      })
      .await?;

    outcome
      .map_err(|r| r.into_error(username.clone()))?
      .ok_or_else(|| Error::UsernameTaken(username))?
      .into_profile()
  }

  async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_profile_by(conn, "profile_id", &id_str)?))
      .await?;
    raw.map(RawProfile::into_profile).transpose()
  }

  async fn find_profile_by_username(&self, username: &str) -> Result<Option<Profile>> {
    let username = username.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(select_profile_by(conn, "username", &username)?))
      .await?;
    raw.map(RawProfile::into_profile).transpose()
  }

  async fn list_profiles(&self, filter: &ProfileFilter) -> Result<Vec<Profile>> {
    // Both filters compare case-folded text; wildcards in the needle are
    // plain characters to `instr`.
    let text_needle = filter
      .text
      .as_deref()
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(fold_case);
    let tag_name = filter
      .tag
      .as_deref()
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(fold_case);

    let raws: Vec<RawProfile> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROFILE_COLUMNS}
           FROM profiles p
           WHERE (?1 IS NULL
                  OR instr({FOLD_FN}(p.username),  ?1) > 0
                  OR instr({FOLD_FN}(p.full_name), ?1) > 0
                  OR instr({FOLD_FN}(p.bio),       ?1) > 0)
             AND (?2 IS NULL OR EXISTS (
                  SELECT 1
                  FROM profile_tags pt
                  JOIN tags t ON t.tag_id = pt.tag_id
                  WHERE pt.profile_id = p.profile_id
                    AND {FOLD_FN}(t.name) = ?2))
           ORDER BY p.followers DESC, p.username ASC"
        ))?;
        let rows = stmt
          .query_map(params![text_needle, tag_name], RawProfile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(attach_tags(conn, rows)?)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_profile).collect()
  }

  async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> Result<Option<Profile>> {
    let id_str    = encode_uuid(id);
    let at_str    = encode_dt(Utc::now());
    let followers = patch.followers.map(encode_followers);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !exists(&tx, "SELECT 1 FROM profiles WHERE profile_id = ?1", &id_str)? {
          return Ok(Ok(None));
        }
        if let Some(tag_ids) = &patch.tag_ids {
          if let Some(unknown) = first_unknown_tag(&tx, tag_ids)? {
            return Ok(Err(Rejected::UnknownTag(unknown)));
          }
        }
        tx.execute(
          "UPDATE profiles
           SET full_name  = COALESCE(?2, full_name),
               bio        = COALESCE(?3, bio),
               followers  = COALESCE(?4, followers),
               updated_at = ?5
           WHERE profile_id = ?1",
          params![id_str, patch.full_name, patch.bio, followers, at_str],
        )?;
        if let Some(tag_ids) = &patch.tag_ids {
          tx.execute("DELETE FROM profile_tags WHERE profile_id = ?1", params![id_str])?;
          link_tags(&tx, &id_str, tag_ids)?;
        }
        let updated = select_profile_by(&tx, "profile_id", &id_str)?;
        tx.commit()?;
        Ok(Ok(updated))
      })
      .await?;

    outcome
      .map_err(|r| r.into_error(String::new()))?
      .map(RawProfile::into_profile)
      .transpose()
  }

  async fn delete_profile(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM profiles WHERE profile_id = ?1", params![id_str])?)
      })
      .await?;
    Ok(deleted > 0)
  }
}
