//! A shell session: every section is the output of a command.

use std::fmt::Write as _;

use l4c_core::view::PortfolioView;

use crate::{
  Result,
  html::{document, esc, link_anchor, testimonials},
};

const CSS: &str = "\
body{margin:0;background:#000;color:#33ff66;font-family:'JetBrains Mono',Menlo,monospace}\
main{max-width:860px;margin:0 auto;padding:32px 20px}\
.window{border:1px solid #1f5f2f;border-radius:6px;padding:20px;background:#020a04}\
.prompt{color:#7cf0a0}.prompt::before{content:'$ ';color:#2aa84a}\
.out{margin:4px 0 18px 0;white-space:pre-wrap}a{color:#aaffcc}a::before{content:'-> '}\
h2{display:none}.testimonial{margin:8px 0;border-left:2px dashed #1f5f2f;padding-left:12px}\
.rating{color:#ffd866}.l4c-footer{text-align:center;color:#1f5f2f;padding:20px}";

pub(crate) fn render(view: &PortfolioView) -> Result<String> {
  let p = &view.profile;
  let user = esc(&p.username).into_owned();
  document(view, CSS, |out| {
    writeln!(out, "<main><div class=\"window\">")?;
    writeln!(out, "<p class=\"prompt\">whoami</p>")?;
    write!(out, "<p class=\"out\">{}", esc(&p.display_name))?;
    if let Some(title) = &p.profile_title {
      write!(out, " :: {}", esc(title))?;
    }
    writeln!(out, "</p>")?;
    if let Some(bio) = &p.bio {
      writeln!(out, "<p class=\"prompt\">cat ~/about.txt</p>")?;
      writeln!(out, "<p class=\"out\">{}</p>", esc(bio))?;
    }
    for group in &view.groups {
      writeln!(out, "<p class=\"prompt\">ls ~/{user}/{}</p>", group.category)?;
      writeln!(out, "<div class=\"out\">")?;
      for link in &group.links {
        link_anchor(out, link, "entry")?;
        writeln!(out, "<br>")?;
      }
      writeln!(out, "</div>")?;
    }
    if !view.testimonials.is_empty() {
      writeln!(out, "<p class=\"prompt\">tail ~/testimonials.log</p>")?;
      testimonials(out, &view.testimonials, "testimonials")?;
    }
    writeln!(out, "<p class=\"prompt\"><span class=\"cursor\">_</span></p>")?;
    writeln!(out, "</div></main>")?;
    Ok(())
  })
}
