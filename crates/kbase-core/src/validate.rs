//! Input checks shared by the create and update paths.

use crate::{Error, Result};

/// A slug must be non-empty and already in canonical slug form: lowercase
/// ASCII alphanumerics separated by single hyphens.
pub fn slug(s: &str) -> Result<()> {
  if s.is_empty() {
    return Err(Error::Validation("slug must not be empty".into()));
  }
  if ::slug::slugify(s) != s {
    return Err(Error::Validation(format!(
      "slug {s:?} must be lowercase letters, digits and single hyphens"
    )));
  }
  Ok(())
}

pub fn non_blank(field: &'static str, s: &str) -> Result<()> {
  if s.trim().is_empty() {
    return Err(Error::Validation(format!("`{field}` must not be blank")));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn canonical_slugs_pass() {
    assert!(slug("guides").is_ok());
    assert!(slug("getting-started-2").is_ok());
  }

  #[test]
  fn non_canonical_slugs_fail() {
    for bad in ["", "Guides", "two  words", "trailing-", "-leading", "a--b", "émoji"] {
      assert!(slug(bad).is_err(), "{bad:?} should be rejected");
    }
  }

  #[test]
  fn blank_names_fail() {
    assert!(non_blank("name", "  ").is_err());
    assert!(non_blank("name", "Guides").is_ok());
  }
}
