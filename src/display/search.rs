//! Search result formatting

use std::collections::BTreeMap;

use crate::storage::SearchMatch;

/// Format the results of a multi-query search, one line per query
pub fn format_search_results(results: &BTreeMap<String, Vec<SearchMatch>>) -> String {
    let mut output = String::new();

    for (query, matches) in results {
        if matches.is_empty() {
            output.push_str(&format!("{}: File Not Found\n", query));
            continue;
        }

        let found: Vec<String> = matches
            .iter()
            .map(|m| format!("{} ({})", m.path, m.root.label()))
            .collect();
        output.push_str(&format!("{}: {}\n", query, found.join(", ")));
    }

    output
}
