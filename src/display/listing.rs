//! Listing display formatting
//!
//! Formats root snapshots either as a one-line summary or as a table when
//! file details were collected.

use crate::storage::{FileEntry, Listing, RootListing};

/// Format several root listings, one block per root
pub fn format_listing(listings: &[RootListing]) -> String {
    listings
        .iter()
        .map(format_root_listing)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the listing of a single root
pub fn format_root_listing(listing: &RootListing) -> String {
    let label = listing.root.label();
    let files = match &listing.listing {
        Listing::Empty => return format!("{}: No Files Found\n", label),
        Listing::Files(files) => files,
    };

    if files.iter().all(|f| f.details.is_none()) {
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        return format!("{} ({}): {}\n", label, files.len(), paths.join(", "));
    }

    let mut output = format!("{} ({}):\n", label, files.len());
    output.push_str(&format_detail_table(files));
    output
}

fn format_detail_table(files: &[FileEntry]) -> String {
    let path_width = files
        .iter()
        .map(|f| f.path.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "  {:<path_width$}  {:>10}  {:<6}  {}\n",
        "Path",
        "Size",
        "Kind",
        "Modified",
        path_width = path_width,
    ));
    output.push_str(&format!(
        "  {:-<path_width$}  {:->10}  {:-<6}  {:-<16}\n",
        "",
        "",
        "",
        "",
        path_width = path_width,
    ));

    for file in files {
        let (size, kind, modified) = match &file.details {
            Some(details) => (
                format_size(details.size_bytes),
                details
                    .kind
                    .map(|k| k.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                details
                    .modified
                    .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };

        output.push_str(&format!(
            "  {:<path_width$}  {:>10}  {:<6}  {}\n",
            file.path,
            size,
            kind,
            modified,
            path_width = path_width,
        ));
    }

    output
}

/// Format a byte count with a binary unit
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
