use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// Everything that ends up in one Zim page.
pub struct ZimPage<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub last_change_date: &'a str,
    pub create_date: &'a str,
}

pub fn write_zim_page<W: Write>(writer: &mut W, page: &ZimPage<'_>) -> std::io::Result<()> {
    writeln!(writer, "====== {} ======", page.title)?;
    writeln!(writer, "{}", page.body)?;
    writeln!(writer)?;
    writeln!(
        writer,
        "Last changed (in Tomboy/Gnote): {}",
        page.last_change_date
    )?;
    writeln!(writer, "Note created (in Tomboy/Gnote): {}", page.create_date)?;
    Ok(())
}

/// Replace characters that are unsafe in Zim page file names with `_`.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '/' | '&' | '<' | '>' | ':' | ';' | ' ' => '_',
            other => other,
        })
        .collect()
}

/// `<dest>/<folder>/<sanitized title>.txt`, without the folder segment when
/// the note belongs to no notebook.
///
/// Only plain components of the notebook name are kept, so a name like
/// `/etc` or `../x` still lands inside `dest`.
pub fn page_path(dest: &Path, folder: Option<&str>, title: &str) -> PathBuf {
    let mut path = dest.to_path_buf();
    if let Some(folder) = folder {
        path.extend(Path::new(folder).components().filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        }));
    }
    path.push(format!("{}.txt", sanitize_title(title)));
    path
}
