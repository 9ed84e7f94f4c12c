//! One module per [`TemplateId`] variant, and the table that maps between
//! them.

use l4c_core::{template::TemplateId, view::PortfolioView};

use crate::Result;

mod developer_dark;
mod github_focus;
mod minimalist_light;
mod sleek_portfolio;
mod terminal;

pub(crate) type RenderFn = fn(&PortfolioView) -> Result<String>;

const TABLE: [(TemplateId, RenderFn); 5] = [
  (TemplateId::DeveloperDark, developer_dark::render),
  (TemplateId::MinimalistLight, minimalist_light::render),
  (TemplateId::GithubFocus, github_focus::render),
  (TemplateId::Terminal, terminal::render),
  (TemplateId::SleekPortfolio, sleek_portfolio::render),
];

pub(crate) fn lookup(id: TemplateId) -> RenderFn {
  TABLE
    .iter()
    .find(|(t, _)| *t == id)
    .map_or(developer_dark::render, |(_, f)| *f)
}
