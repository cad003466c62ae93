use std::path::{Path, PathBuf};

/// `<dir>/<stem>_ATUALIZADA.xlsx`, next to the master workbook.
pub fn default_output_path(master: &str) -> String {
    let p = Path::new(master);
    let stem = p
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("master");
    let name = format!("{}_ATUALIZADA.xlsx", stem);
    let out: PathBuf = match p.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    };
    out.display().to_string()
}
