//! The default template: dark cards grouped by section.

use std::fmt::Write as _;

use l4c_core::view::PortfolioView;

use crate::{
  Result,
  html::{detail_items, document, esc, link_anchor, testimonials},
};

const CSS: &str = "\
body{margin:0;background:#0d1117;color:#c9d1d9;font-family:system-ui,sans-serif}\
main{max-width:720px;margin:0 auto;padding:48px 20px}\
header{text-align:center;margin-bottom:40px}\
.avatar{width:112px;height:112px;border-radius:50%;border:3px solid #30363d}\
h1{color:#f0f6fc;margin:16px 0 4px}h2{color:#58a6ff;font-size:1rem;text-transform:uppercase}\
.title{color:#8b949e}.details{list-style:none;padding:0;color:#8b949e}\
.card{display:block;padding:14px 18px;margin:8px 0;background:#161b22;border:1px solid #30363d;\
border-radius:10px;color:#f0f6fc;text-decoration:none}.card:hover{border-color:#58a6ff}\
.desc{display:block;color:#8b949e;font-size:.9rem;margin-top:4px}\
.testimonial{background:#161b22;border-left:3px solid #58a6ff;margin:12px 0;padding:12px 16px}\
.rating{color:#e3b341}.l4c-footer{text-align:center;color:#484f58;padding:24px}";

pub(crate) fn render(view: &PortfolioView) -> Result<String> {
  let p = &view.profile;
  document(view, CSS, |out| {
    writeln!(out, "<main>")?;
    writeln!(out, "<header>")?;
    if let Some(avatar) = &p.avatar_url {
      writeln!(out, "<img class=\"avatar\" src=\"{}\" alt=\"\">", esc(avatar))?;
    }
    writeln!(out, "<h1>{}</h1>", esc(&p.display_name))?;
    if let Some(title) = &p.profile_title {
      writeln!(out, "<p class=\"title\">{}</p>", esc(title))?;
    }
    if let Some(bio) = &p.bio {
      writeln!(out, "<p class=\"bio\">{}</p>", esc(bio))?;
    }
    writeln!(out, "<ul class=\"details\">")?;
    detail_items(out, &[
      ("Company", p.company.as_deref()),
      ("Location", p.location.as_deref()),
      ("GitHub", p.github_username.as_deref()),
    ])?;
    writeln!(out, "</ul>")?;
    writeln!(out, "</header>")?;

    for group in &view.groups {
      writeln!(out, "<section class=\"links\" id=\"{}\">", group.category)?;
      writeln!(out, "<h2>{}</h2>", group.category.heading())?;
      for link in &group.links {
        link_anchor(out, link, "card")?;
        if let Some(desc) = &link.description {
          writeln!(out, "<span class=\"desc\">{}</span>", esc(desc))?;
        }
      }
      writeln!(out, "</section>")?;
    }

    testimonials(out, &view.testimonials, "What people say")?;
    writeln!(out, "</main>")?;
    Ok(())
  })
}
