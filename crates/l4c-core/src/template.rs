//! Visual templates for the public portfolio page.
//!
//! The set is closed. A stored template identifier that does not match any
//! variant resolves to [`TemplateId::DeveloperDark`].

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TemplateId {
  #[default]
  DeveloperDark,
  MinimalistLight,
  GithubFocus,
  Terminal,
  SleekPortfolio,
}

impl TemplateId {
  /// Resolve a stored identifier, falling back to the default template.
  pub fn resolve(stored: &str) -> Self {
    stored.trim().parse().unwrap_or_default()
  }

  /// Premium templates require an active trial or subscription.
  pub fn is_premium(self) -> bool {
    matches!(self, Self::GithubFocus | Self::Terminal | Self::SleekPortfolio)
  }

  pub fn display_name(self) -> &'static str {
    match self {
      Self::DeveloperDark => "Developer Dark",
      Self::MinimalistLight => "Minimalist Light",
      Self::GithubFocus => "GitHub Focus",
      Self::Terminal => "Terminal",
      Self::SleekPortfolio => "Sleek Portfolio",
    }
  }
}
