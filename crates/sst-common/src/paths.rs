//! Canonical input URLs and output artifact paths.
//!
//! Everything here is pure string manipulation. Output paths have the same
//! shape whether they end up on a local disk or in a bucket; only the
//! storage backend decides how they are read and written.

use chrono::NaiveDate;

use crate::product::{date_folder, source_filename, JPL_BASE, JPL_SENTINEL};

/// Path of an output artifact relative to an output root:
/// `YYYY/MM/DD/<source filename with .nc replaced by suffix>`.
pub fn output_key(date: NaiveDate, suffix: &str) -> String {
    let filename = source_filename(date);
    let stem = filename.strip_suffix(".nc").unwrap_or(&filename);
    format!("{}/{}{}", date_folder(date), stem, suffix)
}

/// Output path under `base`, joined with `/`.
pub fn output_path(base: &str, date: NaiveDate, suffix: &str) -> String {
    join(base, &output_key(date, suffix))
}

/// True when `source` names the remote JPL archive.
pub fn is_remote_source(source: &str) -> bool {
    source.eq_ignore_ascii_case(JPL_SENTINEL)
}

/// Location of the source NetCDF for a date: a URL into the JPL archive for
/// the `JPL` sentinel, otherwise a file inside the given folder.
pub fn input_path(source: &str, date: NaiveDate) -> String {
    if is_remote_source(source) {
        format!("{}{}", JPL_BASE, source_filename(date))
    } else {
        join(source, &source_filename(date))
    }
}

/// Join two path fragments with exactly one `/` between them.
pub fn join(base: &str, rest: &str) -> String {
    let base = base.trim_end_matches('/');
    let rest = rest.trim_start_matches('/');
    match (base.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{}/{}", base, rest),
    }
}

/// Final path component, `"x"` for `"a/b/x"`.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Filename minus its last extension, `"a.stac-item"` for `"dir/a.stac-item.json"`.
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}
