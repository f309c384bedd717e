//! Sparse update fields.
//!
//! A [`Patch`] distinguishes a field the caller left out of the payload from
//! one the caller explicitly set to `null`. Patch structs mark every field
//! `#[serde(default)]` so an omitted key deserialises to [`Patch::Absent`].

use serde::{Deserialize, Deserializer};

use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
  /// The field was not present in the payload; leave it untouched.
  #[default]
  Absent,
  /// The field was present and `null`.
  Null,
  Set(T),
}

impl<T> Patch<T> {
  pub fn is_absent(&self) -> bool { matches!(self, Self::Absent) }

  /// The new value if one was supplied.
  pub fn value(&self) -> Option<&T> {
    match self {
      Self::Set(v) => Some(v),
      _ => None,
    }
  }

  /// Resolve a patch for a field that has no meaningful `null`.
  pub fn required(self, field: &'static str) -> Result<Option<T>> {
    match self {
      Self::Absent => Ok(None),
      Self::Null => Err(Error::Validation(format!("`{field}` cannot be null"))),
      Self::Set(v) => Ok(Some(v)),
    }
  }

  /// Resolve a patch for a field where `null` means "reset to the default".
  pub fn or_reset(self, default: impl FnOnce() -> T) -> Option<T> {
    match self {
      Self::Absent => None,
      Self::Null => Some(default()),
      Self::Set(v) => Some(v),
    }
  }
}

impl<T> From<T> for Patch<T> {
  fn from(v: T) -> Self { Self::Set(v) }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
  T: Deserialize<'de>,
{
  fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    Ok(match Option::<T>::deserialize(deserializer)? {
      Some(v) => Self::Set(v),
      None => Self::Null,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Default, Deserialize)]
  #[serde(default)]
  struct Body {
    name:  Patch<String>,
    order: Patch<i64>,
  }

  #[test]
  fn absent_null_and_set_are_distinct() {
    let body: Body = serde_json::from_str(r#"{"name": null}"#).unwrap();
    assert_eq!(body.name, Patch::Null);
    assert_eq!(body.order, Patch::Absent);

    let body: Body = serde_json::from_str(r#"{"order": 3}"#).unwrap();
    assert_eq!(body.name, Patch::Absent);
    assert_eq!(body.order, Patch::Set(3));
  }

  #[test]
  fn null_on_required_field_is_rejected() {
    let err = Patch::<String>::Null.required("name").unwrap_err();
    assert!(matches!(err, Error::Validation(ref m) if m.contains("name")));
    assert_eq!(Patch::Set(1).required("order").unwrap(), Some(1));
    assert_eq!(Patch::<i64>::Absent.required("order").unwrap(), None);
  }

  #[test]
  fn null_on_defaulted_field_resets() {
    let reset = Patch::<String>::Null.or_reset(String::new);
    assert_eq!(reset.as_deref(), Some(""));
    assert_eq!(Patch::<String>::Absent.or_reset(String::new), None);
  }
}
