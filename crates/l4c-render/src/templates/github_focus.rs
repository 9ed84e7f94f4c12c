//! Repository cards with language, stars and forks, GitHub style.

use std::fmt::Write as _;

use l4c_core::{
  link::{Link, LinkCategory},
  view::PortfolioView,
};

use crate::{
  Result,
  html::{detail_items, document, esc, link_anchor, testimonials},
};

const CSS: &str = "\
body{margin:0;background:#f6f8fa;color:#1f2328;font-family:-apple-system,Segoe UI,sans-serif}\
.layout{display:flex;gap:32px;max-width:1040px;margin:0 auto;padding:40px 20px}\
aside{flex:0 0 260px}main{flex:1}.avatar{width:100%;border-radius:50%;border:1px solid #d0d7de}\
h1{font-size:1.6rem;margin:12px 0 0}.handle{color:#656d76;font-size:1.2rem;font-weight:300}\
.details{list-style:none;padding:0;color:#656d76}.label{font-weight:600}\
.repos{display:grid;grid-template-columns:repeat(auto-fill,minmax(300px,1fr));gap:16px}\
.repo{background:#fff;border:1px solid #d0d7de;border-radius:6px;padding:16px}\
.repo a{color:#0969da;font-weight:600;text-decoration:none}\
.meta{color:#656d76;font-size:.8rem;margin-top:8px}.meta span{margin-right:16px}\
.links a{color:#0969da}.testimonial{border:1px solid #d0d7de;border-radius:6px;\
padding:12px;background:#fff}.rating{color:#bf8700}.l4c-footer{text-align:center;color:#656d76}";

fn repo_card(out: &mut String, link: &Link) -> Result<()> {
  writeln!(out, "<article class=\"repo\">")?;
  link_anchor(out, link, "repo-name")?;
  if let Some(desc) = &link.description {
    writeln!(out, "<p>{}</p>", esc(desc))?;
  }
  if let Some(meta) = &link.metadata {
    write!(out, "<div class=\"meta\">")?;
    if let Some(lang) = &meta.language {
      write!(out, "<span class=\"language\">{}</span>", esc(lang))?;
    }
    write!(out, "<span class=\"stars\">★ {}</span>", meta.stars)?;
    write!(out, "<span class=\"forks\">⑂ {}</span>", meta.forks)?;
    writeln!(out, "</div>")?;
  }
  writeln!(out, "</article>")?;
  Ok(())
}

pub(crate) fn render(view: &PortfolioView) -> Result<String> {
  let p = &view.profile;
  document(view, CSS, |out| {
    writeln!(out, "<div class=\"layout\">")?;
    writeln!(out, "<aside>")?;
    if let Some(avatar) = &p.avatar_url {
      writeln!(out, "<img class=\"avatar\" src=\"{}\" alt=\"\">", esc(avatar))?;
    }
    writeln!(out, "<h1>{}</h1>", esc(&p.display_name))?;
    let handle = p.github_username.as_deref().unwrap_or(&p.username);
    writeln!(out, "<p class=\"handle\">{}</p>", esc(handle))?;
    if let Some(bio) = &p.bio {
      writeln!(out, "<p>{}</p>", esc(bio))?;
    }
    writeln!(out, "<ul class=\"details\">")?;
    detail_items(out, &[
      ("Title", p.profile_title.as_deref()),
      ("Company", p.company.as_deref()),
      ("Location", p.location.as_deref()),
      ("Website", p.website.as_deref()),
    ])?;
    writeln!(out, "</ul>")?;
    writeln!(out, "</aside>")?;

    writeln!(out, "<main>")?;
    for group in &view.groups {
      writeln!(out, "<h2>{}</h2>", group.category.heading())?;
      if group.category == LinkCategory::Projects {
        writeln!(out, "<div class=\"repos\">")?;
        for link in &group.links {
          repo_card(out, link)?;
        }
        writeln!(out, "</div>")?;
      } else {
        writeln!(out, "<ul class=\"links\">")?;
        for link in &group.links {
          write!(out, "<li>")?;
          link_anchor(out, link, "link")?;
          writeln!(out, "</li>")?;
        }
        writeln!(out, "</ul>")?;
      }
    }
    testimonials(out, &view.testimonials, "Endorsements")?;
    writeln!(out, "</main>")?;
    writeln!(out, "</div>")?;
    Ok(())
  })
}
