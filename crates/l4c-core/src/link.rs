//! Categorised links shown on a portfolio page, and the positioning rules for
//! importing repositories as links.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, remote::RepoRecord};

// ─── Category ────────────────────────────────────────────────────────────────

/// The section of the page a link belongs to. Positions are ordered within a
/// category; declaration order is page order.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LinkCategory {
  Personal,
  Projects,
  Blogs,
  Achievements,
  Contact,
  Social,
  Custom,
}

impl LinkCategory {
  pub fn heading(self) -> &'static str {
    match self {
      Self::Personal => "About",
      Self::Projects => "Projects",
      Self::Blogs => "Writing",
      Self::Achievements => "Achievements",
      Self::Contact => "Contact",
      Self::Social => "Social",
      Self::Custom => "More",
    }
  }
}

// ─── Link ────────────────────────────────────────────────────────────────────

/// Repository details carried by links created from an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMetadata {
  pub repo_id:  i64,
  pub owner:    String,
  pub language: Option<String>,
  pub stars:    i64,
  pub forks:    i64,
  #[serde(default)]
  pub topics:   Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
  pub link_id:     Uuid,
  pub user_id:     Uuid,
  pub title:       String,
  pub url:         String,
  pub description: Option<String>,
  pub category:    LinkCategory,
  pub icon:        Option<String>,
  pub position:    i64,
  pub is_active:   bool,
  pub click_count: i64,
  pub metadata:    Option<RepoMetadata>,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::PortfolioStore::add_link`] and
/// [`crate::store::PortfolioStore::insert_links`].
#[derive(Debug, Clone)]
pub struct NewLink {
  pub user_id:     Uuid,
  pub title:       String,
  pub url:         String,
  pub description: Option<String>,
  pub category:    LinkCategory,
  pub icon:        Option<String>,
  /// `None` appends after the current maximum position in the category.
  pub position:    Option<i64>,
  pub metadata:    Option<RepoMetadata>,
}

impl NewLink {
  /// Trim and check the user-supplied fields.
  pub fn validate(mut self) -> Result<Self> {
    self.title = self.title.trim().to_owned();
    self.url = self.url.trim().to_owned();
    if self.title.is_empty() {
      return Err(Error::Validation("link title is required".into()));
    }
    validate_url(&self.url)?;
    Ok(self)
  }
}

/// Partial link update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkUpdate {
  pub title:       Option<String>,
  pub url:         Option<String>,
  pub description: Option<String>,
  pub category:    Option<LinkCategory>,
  pub icon:        Option<String>,
  pub position:    Option<i64>,
  pub is_active:   Option<bool>,
}

impl LinkUpdate {
  pub fn validate(self) -> Result<Self> {
    if let Some(title) = &self.title
      && title.trim().is_empty()
    {
      return Err(Error::Validation("link title cannot be empty".into()));
    }
    if let Some(url) = &self.url {
      validate_url(url.trim())?;
    }
    Ok(self)
  }

  pub fn apply(self, link: &mut Link) {
    if let Some(title) = self.title {
      link.title = title.trim().to_owned();
    }
    if let Some(url) = self.url {
      link.url = url.trim().to_owned();
    }
    if let Some(description) = self.description {
      let d = description.trim();
      link.description = (!d.is_empty()).then(|| d.to_owned());
    }
    if let Some(category) = self.category {
      link.category = category;
    }
    if let Some(icon) = self.icon {
      link.icon = (!icon.is_empty()).then_some(icon);
    }
    if let Some(position) = self.position {
      link.position = position;
    }
    if let Some(active) = self.is_active {
      link.is_active = active;
    }
  }
}

fn validate_url(url: &str) -> Result<()> {
  let scheme_ok = url.starts_with("https://")
    || url.starts_with("http://")
    || url.starts_with("mailto:");
  if !scheme_ok || url.len() > 2048 {
    return Err(Error::Validation(format!("invalid link url: {url:?}")));
  }
  Ok(())
}

// ─── Import ──────────────────────────────────────────────────────────────────

/// Turn fetched repositories into links appended to `category`.
///
/// Positions continue from `max_position` (the current maximum in the
/// category, `None` if it is empty) in input order.
pub fn plan_import(
  user_id: Uuid,
  category: LinkCategory,
  max_position: Option<i64>,
  repos: Vec<RepoRecord>,
) -> Vec<NewLink> {
  let first = max_position.map_or(0, |m| m + 1);
  repos
    .into_iter()
    .zip(first..)
    .map(|(repo, position)| NewLink {
      user_id,
      title: repo.name,
      url: repo.url,
      description: repo.description.filter(|d| !d.trim().is_empty()),
      category,
      icon: Some("github".to_owned()),
      position: Some(position),
      metadata: Some(RepoMetadata {
        repo_id:  repo.id,
        owner:    repo.owner,
        language: repo.language,
        stars:    repo.stars,
        forks:    repo.forks,
        topics:   repo.topics,
      }),
    })
    .collect()
}
