//! A full-width hero followed by a card grid.

use std::fmt::Write as _;

use l4c_core::view::PortfolioView;

use crate::{
  Result,
  html::{detail_items, document, esc, link_anchor, testimonials},
};

const CSS: &str = "\
body{margin:0;background:#0b0b10;color:#e8e8f0;font-family:Inter,system-ui,sans-serif}\
.hero{padding:96px 24px 72px;text-align:center;\
background:radial-gradient(circle at top,#3b2a6b 0%,#0b0b10 70%)}\
.hero h1{font-size:3rem;margin:0;background:linear-gradient(90deg,#a78bfa,#60a5fa);\
-webkit-background-clip:text;color:transparent}.hero .title{color:#b4b4c8;font-size:1.2rem}\
.avatar{width:128px;height:128px;border-radius:24px;object-fit:cover}\
.details{list-style:none;padding:0;display:flex;gap:24px;justify-content:center;color:#9090a8}\
.grid{max-width:1100px;margin:0 auto;padding:24px;display:grid;\
grid-template-columns:repeat(auto-fill,minmax(240px,1fr));gap:20px}\
.tile{background:#15151f;border:1px solid #26263a;border-radius:16px;padding:20px}\
.tile h2{font-size:.8rem;color:#a78bfa;text-transform:uppercase;margin-top:0}\
.tile a{display:block;color:#e8e8f0;margin:10px 0;text-decoration:none}.tile a:hover{color:#60a5fa}\
.testimonials{max-width:1100px;margin:0 auto;padding:24px}\
.testimonial{background:#15151f;border-radius:16px;padding:20px;margin:12px 0}\
.rating{color:#fbbf24}.l4c-footer{text-align:center;color:#505068;padding:40px}";

pub(crate) fn render(view: &PortfolioView) -> Result<String> {
  let p = &view.profile;
  document(view, CSS, |out| {
    writeln!(out, "<section class=\"hero\">")?;
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
      ("@", p.company.as_deref()),
      ("⌖", p.location.as_deref()),
    ])?;
    writeln!(out, "</ul>")?;
    writeln!(out, "</section>")?;

    writeln!(out, "<div class=\"grid\">")?;
    for group in &view.groups {
      writeln!(out, "<div class=\"tile\">")?;
      writeln!(out, "<h2>{}</h2>", group.category.heading())?;
      for link in &group.links {
        link_anchor(out, link, "tile-link")?;
      }
      writeln!(out, "</div>")?;
    }
    writeln!(out, "</div>")?;
    testimonials(out, &view.testimonials, "Testimonials")?;
    Ok(())
  })
}
