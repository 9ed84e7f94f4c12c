//! The read model for a public portfolio page: never stored, always
//! assembled from the owner's rows at request time.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;

use crate::{
  engagement::Testimonial,
  link::{Link, LinkCategory},
  profile::User,
  template::TemplateId,
};

/// The public subset of a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicProfile {
  pub username:        String,
  pub display_name:    String,
  pub profile_title:   Option<String>,
  pub bio:             Option<String>,
  pub avatar_url:      Option<String>,
  pub location:        Option<String>,
  pub website:         Option<String>,
  pub company:         Option<String>,
  pub github_username: Option<String>,
}

impl From<&User> for PublicProfile {
  fn from(u: &User) -> Self {
    Self {
      username:        u.username.clone(),
      display_name:    u.display_name().to_owned(),
      profile_title:   u.profile_title.clone(),
      bio:             u.bio.clone(),
      avatar_url:      u.avatar_url.clone(),
      location:        u.location.clone(),
      website:         u.website.clone(),
      company:         u.company.clone(),
      github_username: u.github_username.clone(),
    }
  }
}

/// One section of the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkGroup {
  pub category: LinkCategory,
  pub links:    Vec<Link>,
}

/// What the page needs to embed the voice widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
  pub assistant_id: String,
  pub public_key:   String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioView {
  pub template:     TemplateId,
  pub profile:      PublicProfile,
  pub groups:       Vec<LinkGroup>,
  pub testimonials: Vec<Testimonial>,
  pub assistant:    Option<WidgetConfig>,
}

/// Active links grouped by category in page order, each group sorted by
/// position. Empty categories are omitted.
pub fn group_links(links: Vec<Link>) -> Vec<LinkGroup> {
  LinkCategory::iter()
    .filter_map(|category| {
      let mut in_category: Vec<Link> = links
        .iter()
        .filter(|l| l.is_active && l.category == category)
        .cloned()
        .collect();
      if in_category.is_empty() {
        return None;
      }
      in_category.sort_by_key(|l| (l.position, l.created_at));
      Some(LinkGroup { category, links: in_category })
    })
    .collect()
}
