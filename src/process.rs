use crate::exporter::{self, ZimPage};
use crate::note::{self, NoteError};
use crate::renderer;
use eyre::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    Created,
    /// A page with the same path was already there and got replaced.
    Overwritten,
}

/// Per-run counters. Each worker keeps its own and they are merged at the end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub created: usize,
    pub overwritten: usize,
    pub errors: usize,
}

impl Tally {
    pub fn record(&mut self, result: ProcessResult) {
        match result {
            ProcessResult::Created => self.created += 1,
            ProcessResult::Overwritten => self.overwritten += 1,
        }
    }

    pub fn merge(self, other: Tally) -> Tally {
        Tally {
            created: self.created + other.created,
            overwritten: self.overwritten + other.overwritten,
            errors: self.errors + other.errors,
        }
    }

    pub fn converted(&self) -> usize {
        self.created + self.overwritten
    }

    pub fn summary(&self) -> String {
        format!(
            "Conversion complete (with {} error(s)). {} converted ({} created, {} overwritten).",
            self.errors,
            self.converted(),
            self.created,
            self.overwritten
        )
    }

    pub fn log_summary(&self) {
        info!("{}", self.summary());
    }
}

/// Whether `err` should stop the whole run rather than just this note.
pub fn halts_run(err: &eyre::Report, strict: bool) -> bool {
    strict
        && err
            .downcast_ref::<NoteError>()
            .is_some_and(NoteError::halts_in_strict_mode)
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Convert one `.note` file into a Zim page under `dest_dir`.
pub fn convert_note(path: &Path, dest_dir: &Path) -> Result<ProcessResult> {
    let name = display_name(path);
    info!("Converting: {}", name);

    let xml = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read: {}", path.display()))?;
    let note = note::parse_note(&xml)?;

    if !note::is_supported_version(note.version.as_deref()) {
        warn!(
            "{}: only tested with Tomboy note version 0.2 and 0.3 (found {})",
            name,
            note.version.as_deref().unwrap_or("none")
        );
    }
    if let Some(folder) = &note.notebook {
        info!(" Filing in folder: {}", folder);
    }

    let rendered = renderer::render_content(&note.content);
    for diagnostic in &rendered.diagnostics {
        warn!("{}: {}", name, diagnostic);
    }

    let out_path = exporter::page_path(dest_dir, note.notebook.as_deref(), &note.title);
    let result = write_page(
        &out_path,
        &ZimPage {
            title: &note.title,
            body: &rendered.text,
            last_change_date: &note.last_change_date,
            create_date: &note.create_date,
        },
    )?;
    debug!("Wrote {}", out_path.display());
    Ok(result)
}

// The page is rendered in memory and moved into place with a rename, so two
// notes that map to the same path never interleave their bytes.
fn write_page(out_path: &Path, page: &ZimPage<'_>) -> Result<ProcessResult> {
    let parent = out_path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .wrap_err_with(|| format!("Failed to create folder: {}", parent.display()))?;

    let mut buf = Vec::new();
    exporter::write_zim_page(&mut buf, page)
        .wrap_err_with(|| format!("Failed to render: {}", out_path.display()))?;

    let mut tmp = NamedTempFile::new_in(parent)
        .wrap_err_with(|| format!("Failed to create temporary file in: {}", parent.display()))?;
    tmp.write_all(&buf)
        .and_then(|()| tmp.flush())
        .wrap_err_with(|| format!("Failed to write: {}", out_path.display()))?;

    let result = if out_path.exists() {
        ProcessResult::Overwritten
    } else {
        ProcessResult::Created
    };
    tmp.persist(out_path)
        .map_err(|e| e.error)
        .wrap_err_with(|| format!("Failed to create: {}", out_path.display()))?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const NOTE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<note version="0.3" xmlns="http://beatniksoftware.com/tomboy">
  <title>Meeting: Notes/Today</title>
  <text xml:space="preserve"><note-content version="0.1">Meeting: Notes/Today
Hello</note-content></text>
  <last-change-date>2021-03-01T10:20:30.1234560+01:00</last-change-date>
  <create-date>2020-12-24T08:00:00.0000000+01:00</create-date>
  <tags><tag>system:notebook:Work</tag></tags>
</note>"#;

    #[test]
    fn writes_page_into_notebook_folder() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let path = src.path().join("a.note");
        fs::write(&path, NOTE).unwrap();

        let result = convert_note(&path, dest.path()).unwrap();
        assert_eq!(result, ProcessResult::Created);

        let page = dest.path().join("Work/Meeting__Notes_Today.txt");
        assert_eq!(
            fs::read_to_string(&page).unwrap(),
            "====== Meeting: Notes/Today ======\n\
             Hello\n\
             \n\
             Last changed (in Tomboy/Gnote): 2021-03-01 10:20:30\n\
             Note created (in Tomboy/Gnote): 2020-12-24 08:00:00\n"
        );

        let again = convert_note(&path, dest.path()).unwrap();
        assert_eq!(again, ProcessResult::Overwritten);
    }

    #[test]
    fn strict_mode_halts_only_on_missing_title_or_content() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        let untitled = src.path().join("untitled.note");
        fs::write(
            &untitled,
            r#"<note version="0.3" xmlns="http://beatniksoftware.com/tomboy"><text><note-content>x</note-content></text></note>"#,
        )
        .unwrap();
        let err = convert_note(&untitled, dest.path()).unwrap_err();
        assert!(halts_run(&err, true));
        assert!(!halts_run(&err, false));

        let broken = src.path().join("broken.note");
        fs::write(&broken, "<note><title>").unwrap();
        let err = convert_note(&broken, dest.path()).unwrap_err();
        assert!(!halts_run(&err, true));

        assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
    }

    #[test]
    fn tallies_merge() {
        let mut a = Tally::default();
        a.record(ProcessResult::Created);
        a.errors = 1;
        let mut b = Tally::default();
        b.record(ProcessResult::Overwritten);
        b.record(ProcessResult::Created);

        let total = a.merge(b);
        assert_eq!(total.created, 2);
        assert_eq!(total.overwritten, 1);
        assert_eq!(total.errors, 1);
        assert_eq!(total.converted(), 3);
        assert_eq!(
            total.summary(),
            "Conversion complete (with 1 error(s)). 3 converted (2 created, 1 overwritten)."
        );
    }

    #[test]
    fn concurrent_writes_to_one_path_never_mix() {
        let dest = TempDir::new().unwrap();
        let out_path = dest.path().join("Same.txt");
        let long_body = "A".repeat(64 * 1024);
        let pages = [
            ZimPage {
                title: "a/b",
                body: &long_body,
                last_change_date: "x",
                create_date: "y",
            },
            ZimPage {
                title: "a b",
                body: "short",
                last_change_date: "x",
                create_date: "y",
            },
        ];
        let expected: Vec<String> = pages
            .iter()
            .map(|p| {
                let mut buf = Vec::new();
                exporter::write_zim_page(&mut buf, p).unwrap();
                String::from_utf8(buf).unwrap()
            })
            .collect();

        for _ in 0..20 {
            std::thread::scope(|s| {
                for page in &pages {
                    let out_path = &out_path;
                    s.spawn(move || write_page(out_path, page).unwrap());
                }
            });
            let written = fs::read_to_string(&out_path).unwrap();
            assert!(expected.contains(&written), "page was mixed: {} bytes", written.len());
        }

        // Only the final page is left behind, no temporary files.
        assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 1);
    }
}
