//! # tomboy-zim-export
//!
//! A CLI tool that converts [Tomboy](https://wiki.gnome.org/Apps/Tomboy) and
//! [Gnote](https://wiki.gnome.org/Apps/Gnote) notes into [Zim](https://zim-wiki.org) wiki pages.
//!
//! ## What it does
//!
//! Tomboy and Gnote keep every note as a small XML file (`*.note`). This tool reads
//! each one, turns its rich-text body into Zim markup and writes a `.txt` page
//! named after the note title. Bold, italic, strikethrough, highlight and
//! monospace text keep their styling; links between notes become `[[wiki links]]`;
//! bullet lists keep their nesting. Notes filed in a notebook land in a
//! subdirectory named after it.
//!
//! Source notes are only read, never modified. Every run is a fresh export; pages
//! already in the destination are overwritten.
//!
//! ## Usage
//!
//! ```sh
//! tomboy-zim-export --source-dir ~/.local/share/gnote --dest-dir ~/Notebooks/Notes
//! ```
//!
//! Defaults can be persisted in `~/.config/tomboy-zim-export/config.toml`.
//!
//! ## Compatibility
//!
//! Tested with note format versions `0.2` and `0.3`. Other versions are converted on
//! a best-effort basis with a warning.
pub mod exporter;
pub mod note;
pub mod parallel;
pub mod process;
pub mod renderer;
#[cfg(feature = "sequential")]
pub mod sequential;
pub mod utils;
