//! Substring search over articles.
//!
//! This is filtering, not ranking: results come back in storage order.

use std::sync::Arc;

use tracing::debug;

use crate::{
  Error, Result,
  article::{Article, ArticleStatus},
  store::{ArticleOrder, ArticleQuery, CatalogStore, StoreResultExt as _, TextField, TextFilter},
};

/// Shortest public query accepted, in characters.
pub const MIN_QUERY_CHARS: usize = 2;

/// Upper bound on public search results.
pub const MAX_RESULTS: usize = 20;

/// The admin listing's text filter: title or content, any status, no cap.
/// A blank search means no filter.
pub fn admin_text_filter(search: &str) -> Option<TextFilter> {
  let needle = search.trim();
  if needle.is_empty() {
    return None;
  }
  Some(TextFilter {
    needle: needle.to_owned(),
    fields: vec![TextField::Title, TextField::Content],
  })
}

pub struct SearchEngine<S> {
  store: Arc<S>,
}

impl<S> Clone for SearchEngine<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: CatalogStore> SearchEngine<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Published articles whose title, content or excerpt contains `query`,
  /// ignoring case. At most `limit` results, never more than
  /// [`MAX_RESULTS`]. The query is matched as given, whitespace included.
  pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Article>> {
    if query.chars().count() < MIN_QUERY_CHARS {
      return Err(Error::Validation(format!(
        "search query must be at least {MIN_QUERY_CHARS} characters"
      )));
    }

    let filter = ArticleQuery {
      status: Some(ArticleStatus::Published),
      text: Some(TextFilter {
        needle: query.to_owned(),
        fields: vec![TextField::Title, TextField::Content, TextField::Excerpt],
      }),
      order: ArticleOrder::Storage,
      limit: Some(limit.min(MAX_RESULTS)),
      ..Default::default()
    };
    let hits = self.store.list_articles(&filter).await.lift()?;
    debug!(needle = query, hits = hits.len(), "search");
    Ok(hits)
  }
}
