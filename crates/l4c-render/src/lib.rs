//! Public portfolio page rendering for Link4Coders.
//!
//! Turns a [`PortfolioView`] into a complete HTML document using the view's
//! template. Pure and synchronous; no HTTP or database dependencies. All user
//! supplied text is HTML-escaped.
//!
//! # Quick start
//!
//! ```no_run
//! # fn page(view: &l4c_core::view::PortfolioView) -> l4c_render::Result<()> {
//! let html = l4c_render::render(view)?;
//! assert!(html.starts_with("<!DOCTYPE html>"));
//! # Ok(())
//! # }
//! ```

pub mod error;
mod html;
mod templates;

pub use error::{Error, Result};
use l4c_core::view::PortfolioView;

/// Render `view` with the template it names.
///
/// The view's template is expected to be the *effective* one, already
/// resolved against the owner's access.
pub fn render(view: &PortfolioView) -> Result<String> {
  let render_fn = templates::lookup(view.template);
  render_fn(view)
}
