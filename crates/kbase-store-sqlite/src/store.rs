//! [`SqliteStore`]: the SQLite implementation of [`CatalogStore`] and
//! [`AdminStore`].

use std::{collections::HashMap, path::Path};

use rusqlite::{
  OptionalExtension as _,
  functions::{Context, FunctionFlags},
  types::Value,
};
use uuid::Uuid;

use kbase_core::{
  admin::{AdminPrincipal, AdminStore},
  article::{Article, ArticleStatus},
  category::MainCategory,
  slug::SlugScope,
  store::{ArticleOrder, ArticleQuery, ArticleTotals, CatalogStore, Purged, TextField},
  subcategory::SubCategory,
};

use crate::{
  Error, Result,
  encode::{
    ADMIN_COLUMNS, ARTICLE_COLUMNS, CATEGORY_COLUMNS, RawAdmin, RawArticle, RawCategory,
    RawSubCategory, SUBCATEGORY_COLUMNS, decode_uuid, encode_dt, encode_status, encode_tags,
    encode_uuid,
  },
  schema::SCHEMA,
};

/// Case-insensitive substring test registered on every connection.
///
/// `LIKE` only folds ASCII, so text search goes through this instead.
fn kb_contains(ctx: &Context<'_>) -> rusqlite::Result<bool> {
  let haystack: Option<String> = ctx.get(0)?;
  let needle: String = ctx.get(1)?;
  Ok(haystack.is_some_and(|h| h.to_lowercase().contains(&needle)))
}

/// Map a unique-index violation to a slug conflict in `scope`.
fn conflict_in(scope: SlugScope, slug: String) -> impl FnOnce(tokio_rusqlite::Error) -> Error {
  move |e| {
    let e = Error::from(e);
    if e.is_constraint() { Error::SlugConflict { scope, slug } } else { e }
  }
}

/// `WHERE` clause and bound values for an [`ArticleQuery`].
fn article_filter(query: &ArticleQuery) -> (String, Vec<Value>) {
  let mut conds: Vec<String> = vec![];
  let mut params: Vec<Value> = vec![];

  if let Some(ids) = &query.subcategory_ids {
    if ids.is_empty() {
      conds.push("0".into());
    } else {
      conds.push(format!("subcategory_id IN ({})", placeholders(ids.len())));
      params.extend(ids.iter().map(|id| Value::Text(encode_uuid(*id))));
    }
  }
  if let Some(status) = query.status {
    conds.push("status = ?".into());
    params.push(Value::Text(encode_status(status)));
  }
  if let Some(slug) = &query.slug {
    conds.push("slug = ?".into());
    params.push(Value::Text(slug.clone()));
  }
  if let Some(text) = &query.text {
    let needle = text.needle.to_lowercase();
    let ors: Vec<&str> = text
      .fields
      .iter()
      .map(|f| match f {
        TextField::Title => "kb_contains(title, ?)",
        TextField::Content => "kb_contains(content, ?)",
        TextField::Excerpt => "kb_contains(excerpt, ?)",
      })
      .collect();
    if ors.is_empty() {
      conds.push("0".into());
    } else {
      conds.push(format!("({})", ors.join(" OR ")));
      params.extend(ors.iter().map(|_| Value::Text(needle.clone())));
    }
  }

  let where_clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  (where_clause, params)
}

fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

// ─── Store ───────────────────────────────────────────────────────────────────

/// A kbase catalog backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  async fn init(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.create_scalar_function(
          "kb_contains",
          2,
          FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
          kb_contains,
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `sql` with one bound id and report whether any row changed.
  async fn execute_by_id(&self, sql: &'static str, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(sql, rusqlite::params![id_str])?))
      .await?;
    Ok(changed > 0)
  }
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Categories ────────────────────────────────────────────────────────────

  async fn insert_category(&self, category: MainCategory) -> Result<()> {
    let slug = category.slug.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO categories (
             id, name, slug, description, icon, sort_order, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            encode_uuid(category.id),
            category.name,
            category.slug,
            category.description,
            category.icon,
            category.order,
            encode_dt(category.created_at),
            encode_dt(category.updated_at),
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(conflict_in(SlugScope::Categories, slug))
  }

  async fn get_category(&self, id: Uuid) -> Result<Option<MainCategory>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"),
              rusqlite::params![id_str],
              RawCategory::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawCategory::into_category).transpose()
  }

  async fn find_category_by_slug(&self, slug: &str) -> Result<Option<MainCategory>> {
    let slug = slug.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = ?1"),
              rusqlite::params![slug],
              RawCategory::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawCategory::into_category).transpose()
  }

  async fn list_categories(&self) -> Result<Vec<MainCategory>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CATEGORY_COLUMNS} FROM categories
           ORDER BY sort_order ASC, created_at ASC, rowid ASC"
        ))?;
        let rows = stmt
          .query_map([], RawCategory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawCategory::into_category).collect()
  }

  async fn update_category(&self, category: MainCategory) -> Result<bool> {
    let slug = category.slug.clone();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE categories
           SET name = ?2, slug = ?3, description = ?4, icon = ?5,
               sort_order = ?6, updated_at = ?7
           WHERE id = ?1",
          rusqlite::params![
            encode_uuid(category.id),
            category.name,
            category.slug,
            category.description,
            category.icon,
            category.order,
            encode_dt(category.updated_at),
          ],
        )?)
      })
      .await
      .map_err(conflict_in(SlugScope::Categories, slug))?;
    Ok(changed > 0)
  }

  async fn delete_category(&self, id: Uuid) -> Result<bool> {
    self.execute_by_id("DELETE FROM categories WHERE id = ?1", id).await
  }

  async fn count_categories(&self) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))?))
      .await?;
    Ok(n as u64)
  }

  // ── Subcategories ─────────────────────────────────────────────────────────

  async fn insert_subcategory(&self, subcategory: SubCategory) -> Result<()> {
    let scope = SlugScope::Subcategories(subcategory.main_category_id);
    let slug = subcategory.slug.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subcategories (
             id, main_category_id, name, slug, description, sort_order,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            encode_uuid(subcategory.id),
            encode_uuid(subcategory.main_category_id),
            subcategory.name,
            subcategory.slug,
            subcategory.description,
            subcategory.order,
            encode_dt(subcategory.created_at),
            encode_dt(subcategory.updated_at),
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(conflict_in(scope, slug))
  }

  async fn get_subcategory(&self, id: Uuid) -> Result<Option<SubCategory>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SUBCATEGORY_COLUMNS} FROM subcategories WHERE id = ?1"),
              rusqlite::params![id_str],
              RawSubCategory::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawSubCategory::into_subcategory).transpose()
  }

  async fn find_subcategories_by_slug(&self, slug: &str) -> Result<Vec<SubCategory>> {
    let slug = slug.to_owned();
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBCATEGORY_COLUMNS} FROM subcategories
           WHERE slug = ?1
           ORDER BY created_at ASC, rowid ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![slug], RawSubCategory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawSubCategory::into_subcategory).collect()
  }

  async fn list_subcategories(&self, main_category_id: Option<Uuid>) -> Result<Vec<SubCategory>> {
    let parent = main_category_id.map(encode_uuid);
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBCATEGORY_COLUMNS} FROM subcategories
           WHERE ?1 IS NULL OR main_category_id = ?1
           ORDER BY sort_order ASC, created_at ASC, rowid ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![parent], RawSubCategory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawSubCategory::into_subcategory).collect()
  }

  async fn update_subcategory(&self, subcategory: SubCategory) -> Result<bool> {
    let scope = SlugScope::Subcategories(subcategory.main_category_id);
    let slug = subcategory.slug.clone();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subcategories
           SET main_category_id = ?2, name = ?3, slug = ?4, description = ?5,
               sort_order = ?6, updated_at = ?7
           WHERE id = ?1",
          rusqlite::params![
            encode_uuid(subcategory.id),
            encode_uuid(subcategory.main_category_id),
            subcategory.name,
            subcategory.slug,
            subcategory.description,
            subcategory.order,
            encode_dt(subcategory.updated_at),
          ],
        )?)
      })
      .await
      .map_err(conflict_in(scope, slug))?;
    Ok(changed > 0)
  }

  async fn delete_subcategory(&self, id: Uuid) -> Result<bool> {
    self.execute_by_id("DELETE FROM subcategories WHERE id = ?1", id).await
  }

  async fn delete_subcategories_of(&self, main_category_id: Uuid) -> Result<u64> {
    let id_str = encode_uuid(main_category_id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM subcategories WHERE main_category_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(n as u64)
  }

  async fn count_subcategories(&self, main_category_id: Option<Uuid>) -> Result<u64> {
    let parent = main_category_id.map(encode_uuid);
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM subcategories WHERE ?1 IS NULL OR main_category_id = ?1",
          rusqlite::params![parent],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(n as u64)
  }

  // ── Articles ──────────────────────────────────────────────────────────────

  async fn insert_article(&self, article: Article) -> Result<()> {
    let scope = SlugScope::Articles(article.subcategory_id);
    let slug = article.slug.clone();
    let tags = encode_tags(&article.tags)?;
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO articles (
             id, subcategory_id, title, slug, excerpt, content, status,
             sort_order, featured, tags, views, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
          rusqlite::params![
            encode_uuid(article.id),
            encode_uuid(article.subcategory_id),
            article.title,
            article.slug,
            article.excerpt,
            article.content,
            encode_status(article.status),
            article.order,
            article.featured,
            tags,
            article.views as i64,
            encode_dt(article.created_at),
            encode_dt(article.updated_at),
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(conflict_in(scope, slug))
  }

  async fn get_article(&self, id: Uuid) -> Result<Option<Article>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"),
              rusqlite::params![id_str],
              RawArticle::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawArticle::into_article).transpose()
  }

  async fn list_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>> {
    let (where_clause, mut params) = article_filter(query);
    let order_clause = match query.order {
      ArticleOrder::Display => "ORDER BY sort_order ASC, created_at DESC, rowid DESC",
      ArticleOrder::Oldest => "ORDER BY created_at ASC, rowid ASC",
      ArticleOrder::Storage => "ORDER BY rowid ASC",
    };
    let limit_clause = match query.limit {
      Some(limit) => {
        params.push(Value::Integer(limit as i64));
        "LIMIT ?"
      }
      None => "",
    };
    let sql =
      format!("SELECT {ARTICLE_COLUMNS} FROM articles {where_clause} {order_clause} {limit_clause}");

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawArticle::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawArticle::into_article).collect()
  }

  async fn count_articles(&self, query: &ArticleQuery) -> Result<u64> {
    let (where_clause, params) = article_filter(query);
    let sql = format!("SELECT COUNT(*) FROM articles {where_clause}");
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, rusqlite::params_from_iter(params.iter()), |r| r.get(0))?)
      })
      .await?;
    Ok(n as u64)
  }

  async fn article_counts_by_subcategory(
    &self,
    status: Option<ArticleStatus>,
  ) -> Result<HashMap<Uuid, u64>> {
    let status = status.map(encode_status);
    let rows: Vec<(String, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT subcategory_id, COUNT(*) FROM articles
           WHERE ?1 IS NULL OR status = ?1
           GROUP BY subcategory_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![status], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(id, n)| Ok((decode_uuid(&id)?, n as u64)))
      .collect()
  }

  async fn article_totals(&self) -> Result<ArticleTotals> {
    let (published, draft, views): (i64, i64, i64) = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT
             COALESCE(SUM(status = 'published'), 0),
             COALESCE(SUM(status = 'draft'), 0),
             COALESCE(SUM(views), 0)
           FROM articles",
          [],
          |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?)
      })
      .await?;
    Ok(ArticleTotals {
      published: published as u64,
      draft:     draft as u64,
      views:     views as u64,
    })
  }

  async fn update_article(&self, article: Article) -> Result<bool> {
    let scope = SlugScope::Articles(article.subcategory_id);
    let slug = article.slug.clone();
    let tags = encode_tags(&article.tags)?;
    let changed = self
      .conn
      .call(move |conn| {
        // `views` and `created_at` are deliberately absent.
        Ok(conn.execute(
          "UPDATE articles
           SET subcategory_id = ?2, title = ?3, slug = ?4, excerpt = ?5,
               content = ?6, status = ?7, sort_order = ?8, featured = ?9,
               tags = ?10, updated_at = ?11
           WHERE id = ?1",
          rusqlite::params![
            encode_uuid(article.id),
            encode_uuid(article.subcategory_id),
            article.title,
            article.slug,
            article.excerpt,
            article.content,
            encode_status(article.status),
            article.order,
            article.featured,
            tags,
            encode_dt(article.updated_at),
          ],
        )?)
      })
      .await
      .map_err(conflict_in(scope, slug))?;
    Ok(changed > 0)
  }

  async fn increment_views(&self, id: Uuid) -> Result<bool> {
    self
      .execute_by_id("UPDATE articles SET views = views + 1 WHERE id = ?1", id)
      .await
  }

  async fn delete_article(&self, id: Uuid) -> Result<bool> {
    self.execute_by_id("DELETE FROM articles WHERE id = ?1", id).await
  }

  async fn delete_articles_in(&self, subcategory_ids: &[Uuid]) -> Result<u64> {
    if subcategory_ids.is_empty() {
      return Ok(0);
    }
    let sql = format!(
      "DELETE FROM articles WHERE subcategory_id IN ({})",
      placeholders(subcategory_ids.len())
    );
    let ids: Vec<String> = subcategory_ids.iter().copied().map(encode_uuid).collect();
    let n = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params_from_iter(ids.iter()))?))
      .await?;
    Ok(n as u64)
  }

  // ── Slugs ─────────────────────────────────────────────────────────────────

  async fn slug_in_use(&self, scope: SlugScope, slug: &str, except: Option<Uuid>) -> Result<bool> {
    let (sql, parent) = match scope {
      SlugScope::Categories => (
        "SELECT EXISTS(SELECT 1 FROM categories WHERE slug = ?1 AND id != ?2)",
        None,
      ),
      SlugScope::Subcategories(parent) => (
        "SELECT EXISTS(SELECT 1 FROM subcategories
           WHERE slug = ?1 AND id != ?2 AND main_category_id = ?3)",
        Some(encode_uuid(parent)),
      ),
      SlugScope::Articles(parent) => (
        "SELECT EXISTS(SELECT 1 FROM articles
           WHERE slug = ?1 AND id != ?2 AND subcategory_id = ?3)",
        Some(encode_uuid(parent)),
      ),
    };
    let slug = slug.to_owned();
    let except = except.map(encode_uuid).unwrap_or_default();

    self
      .conn
      .call(move |conn| {
        let taken = match parent {
          Some(parent) => {
            conn.query_row(sql, rusqlite::params![slug, except, parent], |r| r.get(0))?
          }
          None => conn.query_row(sql, rusqlite::params![slug, except], |r| r.get(0))?,
        };
        Ok(taken)
      })
      .await
      .map_err(Error::from)
  }

  // ── Cascades ──────────────────────────────────────────────────────────────

  async fn purge_category(&self, id: Uuid) -> Result<Purged> {
    let id_str = encode_uuid(id);
    let purged = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let articles = tx.execute(
          "DELETE FROM articles WHERE subcategory_id IN
             (SELECT id FROM subcategories WHERE main_category_id = ?1)",
          rusqlite::params![id_str],
        )?;
        let subcategories = tx.execute(
          "DELETE FROM subcategories WHERE main_category_id = ?1",
          rusqlite::params![id_str],
        )?;
        let root = tx.execute("DELETE FROM categories WHERE id = ?1", rusqlite::params![id_str])?;
        tx.commit()?;
        Ok(Purged {
          articles:      articles as u64,
          subcategories: subcategories as u64,
          root:          root > 0,
        })
      })
      .await?;
    Ok(purged)
  }

  async fn purge_subcategory(&self, id: Uuid) -> Result<Purged> {
    let id_str = encode_uuid(id);
    let purged = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let articles = tx.execute(
          "DELETE FROM articles WHERE subcategory_id = ?1",
          rusqlite::params![id_str],
        )?;
        let root =
          tx.execute("DELETE FROM subcategories WHERE id = ?1", rusqlite::params![id_str])?;
        tx.commit()?;
        Ok(Purged {
          articles:      articles as u64,
          subcategories: root as u64,
          root:          root > 0,
        })
      })
      .await?;
    Ok(purged)
  }
}

// ─── AdminStore impl ─────────────────────────────────────────────────────────

impl AdminStore for SqliteStore {
  type Error = Error;

  async fn insert_admin(&self, admin: AdminPrincipal) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO admins (id, username, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(username) DO NOTHING",
          rusqlite::params![
            encode_uuid(admin.id),
            admin.username,
            admin.password_hash,
            encode_dt(admin.created_at),
          ],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn insert_first_admin(&self, admin: AdminPrincipal) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO admins (id, username, password_hash, created_at)
           SELECT ?1, ?2, ?3, ?4
           WHERE NOT EXISTS (SELECT 1 FROM admins)",
          rusqlite::params![
            encode_uuid(admin.id),
            admin.username,
            admin.password_hash,
            encode_dt(admin.created_at),
          ],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn find_admin(&self, username: &str) -> Result<Option<AdminPrincipal>> {
    let username = username.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE username = ?1"),
              rusqlite::params![username],
              RawAdmin::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawAdmin::into_admin).transpose()
  }

  async fn get_admin(&self, id: Uuid) -> Result<Option<AdminPrincipal>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = ?1"),
              rusqlite::params![id_str],
              RawAdmin::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawAdmin::into_admin).transpose()
  }

  async fn count_admins(&self) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM admins", [], |r| r.get(0))?))
      .await?;
    Ok(n as u64)
  }

  async fn set_admin_password(&self, id: Uuid, password_hash: String) -> Result<bool> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE admins SET password_hash = ?2 WHERE id = ?1",
          rusqlite::params![id_str, password_hash],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }
}
