//! Markup shared by every template: the document shell, escaping, links,
//! testimonials and the voice widget.

use std::{borrow::Cow, fmt::Write as _};

use l4c_core::{
  engagement::Testimonial,
  link::Link,
  view::{PortfolioView, WidgetConfig},
};
use quick_xml::escape::escape;

use crate::Result;

const VAPI_WIDGET_SRC: &str =
  "https://cdn.jsdelivr.net/gh/VapiAI/html-script-tag@latest/dist/assets/index.js";

/// Escape text for use in element content or a quoted attribute.
pub(crate) fn esc(s: &str) -> Cow<'_, str> { escape(s) }

/// Write a complete HTML document: `head` metadata and `css` from the
/// template, then `body`, then the shared scripts.
pub(crate) fn document(
  view: &PortfolioView,
  css: &str,
  body: impl FnOnce(&mut String) -> Result<()>,
) -> Result<String> {
  let profile = &view.profile;
  let mut out = String::with_capacity(8 * 1024);

  let title = match &profile.profile_title {
    Some(t) => format!("{} | {}", profile.display_name, t),
    None => profile.display_name.clone(),
  };
  let description = profile
    .bio
    .as_deref()
    .unwrap_or("Developer portfolio built with Link4Coders");

  writeln!(out, "<!DOCTYPE html>")?;
  writeln!(out, "<html lang=\"en\" data-template=\"{}\">", view.template)?;
  writeln!(out, "<head>")?;
  writeln!(out, "<meta charset=\"utf-8\">")?;
  writeln!(out, "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">")?;
  writeln!(out, "<title>{}</title>", esc(&title))?;
  writeln!(out, "<meta name=\"description\" content=\"{}\">", esc(description))?;
  writeln!(out, "<meta property=\"og:title\" content=\"{}\">", esc(&title))?;
  if let Some(avatar) = &profile.avatar_url {
    writeln!(out, "<meta property=\"og:image\" content=\"{}\">", esc(avatar))?;
  }
  writeln!(out, "<style>{css}</style>")?;
  writeln!(out, "</head>")?;
  writeln!(out, "<body>")?;

  body(&mut out)?;

  writeln!(out, "<footer class=\"l4c-footer\">Built with Link4Coders</footer>")?;
  click_script(&mut out)?;
  if let Some(widget) = &view.assistant {
    widget_script(&mut out, widget)?;
  }
  writeln!(out, "</body>")?;
  writeln!(out, "</html>")?;
  Ok(out)
}

/// An anchor that reports its click before navigating.
pub(crate) fn link_anchor(out: &mut String, link: &Link, class: &str) -> Result<()> {
  write!(
    out,
    "<a class=\"{class}\" href=\"{}\" data-link-id=\"{}\" rel=\"noopener\" target=\"_blank\">",
    esc(&link.url),
    link.link_id
  )?;
  write!(out, "{}", esc(&link.title))?;
  write!(out, "</a>")?;
  Ok(())
}

/// Approved testimonials; nothing when there are none.
pub(crate) fn testimonials(out: &mut String, items: &[Testimonial], heading: &str) -> Result<()> {
  if items.is_empty() {
    return Ok(());
  }
  writeln!(out, "<section class=\"testimonials\">")?;
  writeln!(out, "<h2>{}</h2>", esc(heading))?;
  for t in items {
    writeln!(out, "<blockquote class=\"testimonial\">")?;
    let stars = usize::from(t.rating.min(5));
    writeln!(
      out,
      "<p class=\"rating\" aria-label=\"{stars} out of 5\">{}{}</p>",
      "★".repeat(stars),
      "☆".repeat(5 - stars)
    )?;
    writeln!(out, "<p>{}</p>", esc(&t.content))?;
    let byline = [Some(t.author_name.as_str()), t.author_title.as_deref(), t.author_company.as_deref()]
      .into_iter()
      .flatten()
      .map(|s| esc(s).into_owned())
      .collect::<Vec<_>>()
      .join(", ");
    writeln!(out, "<footer>{byline}</footer>")?;
    writeln!(out, "</blockquote>")?;
  }
  writeln!(out, "</section>")?;
  Ok(())
}

/// Optional profile fields as `<li>` items, skipping blanks.
pub(crate) fn detail_items(out: &mut String, items: &[(&str, Option<&str>)]) -> Result<()> {
  for (label, value) in items {
    if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
      writeln!(out, "<li><span class=\"label\">{}</span> {}</li>", esc(label), esc(v))?;
    }
  }
  Ok(())
}

fn click_script(out: &mut String) -> Result<()> {
  writeln!(
    out,
    "<script>document.addEventListener('click',function(e){{\
var a=e.target.closest('a[data-link-id]');if(!a)return;\
navigator.sendBeacon('/api/links/'+a.dataset.linkId+'/click');}});</script>"
  )?;
  Ok(())
}

fn widget_script(out: &mut String, widget: &WidgetConfig) -> Result<()> {
  writeln!(
    out,
    "<div id=\"l4c-voice\" data-assistant-id=\"{}\" data-public-key=\"{}\"></div>",
    esc(&widget.assistant_id),
    esc(&widget.public_key)
  )?;
  writeln!(out, "<script src=\"{VAPI_WIDGET_SRC}\" defer async></script>")?;
  writeln!(
    out,
    "<script>window.addEventListener('load',function(){{\
var c=document.getElementById('l4c-voice').dataset;\
window.vapiSDK&&window.vapiSDK.run({{apiKey:c.publicKey,assistant:c.assistantId}});}});</script>"
  )?;
  Ok(())
}
