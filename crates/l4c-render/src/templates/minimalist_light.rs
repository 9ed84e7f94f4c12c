//! A plain, light single column.

use std::fmt::Write as _;

use l4c_core::view::PortfolioView;

use crate::{
  Result,
  html::{document, esc, link_anchor, testimonials},
};

const CSS: &str = "\
body{margin:0;background:#fff;color:#222;font-family:Georgia,serif;line-height:1.6}\
main{max-width:600px;margin:0 auto;padding:64px 24px}\
h1{font-weight:400;font-size:2rem;margin:0}h2{font-size:.85rem;letter-spacing:.1em;\
text-transform:uppercase;color:#888;margin-top:40px}\
.title{color:#666;margin:4px 0 24px}ul{list-style:none;padding:0}li{margin:6px 0}\
a{color:#222}a:hover{color:#0a58ca}.testimonial{margin:16px 0;font-style:italic}\
.rating{font-style:normal;color:#b8860b}.l4c-footer{text-align:center;color:#aaa;padding:32px}";

pub(crate) fn render(view: &PortfolioView) -> Result<String> {
  let p = &view.profile;
  document(view, CSS, |out| {
    writeln!(out, "<main>")?;
    writeln!(out, "<h1>{}</h1>", esc(&p.display_name))?;
    if let Some(title) = &p.profile_title {
      writeln!(out, "<p class=\"title\">{}</p>", esc(title))?;
    }
    if let Some(bio) = &p.bio {
      writeln!(out, "<p>{}</p>", esc(bio))?;
    }
    for group in &view.groups {
      writeln!(out, "<h2>{}</h2>", group.category.heading())?;
      writeln!(out, "<ul>")?;
      for link in &group.links {
        write!(out, "<li>")?;
        link_anchor(out, link, "link")?;
        writeln!(out, "</li>")?;
      }
      writeln!(out, "</ul>")?;
    }
    testimonials(out, &view.testimonials, "Kind words")?;
    writeln!(out, "</main>")?;
    Ok(())
  })
}
