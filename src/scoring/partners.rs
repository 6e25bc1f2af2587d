// Partner-name resolution. Adapts the teacher's small string-formatting
// helper style (`output/mod.rs::truncate_chars`) to list-truncation:
// resolve author_id -> handle (our Post has no nickname field, so unlike
// the nickname fallback named in spec §4.4, resolution falls straight
// through to the literal `user_{id}` form — see DESIGN.md).

use crate::model::UsernameIndex;

const MAX_PARTNERS_SHOWN: usize = 5;

/// Resolve a single author_id to its display handle.
pub fn resolve_handle(author_id: &str, username_index: &UsernameIndex) -> String {
    match username_index.handle_of(author_id) {
        Some(handle) if !handle.is_empty() => handle.to_string(),
        _ => format!("user_{author_id}"),
    }
}

/// Format a partner handle list: first five in insertion order, followed by
/// "and N more" when there are more than five.
pub fn format_partner_list(handles: &[String]) -> String {
    let shown: Vec<&str> = handles.iter().take(MAX_PARTNERS_SHOWN).map(String::as_str).collect();
    let mut out = shown.join(", ");
    if handles.len() > MAX_PARTNERS_SHOWN {
        out.push_str(&format!(" and {} more", handles.len() - MAX_PARTNERS_SHOWN));
    }
    out
}
