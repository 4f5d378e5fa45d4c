use crate::QueryParams;

/// Render an RFC 8288 `Link` header with `next`/`prev` relations.
///
/// The caller's query is cloned; `cursor` is overwritten per relation.
/// Returns an empty string when neither cursor is present.
pub fn build_link_header(
    base_url: &str,
    query: &QueryParams,
    next_cursor: Option<&str>,
    prev_cursor: Option<&str>,
) -> String {
    let mut query = query.clone();
    let mut links = Vec::with_capacity(2);

    for (rel, cursor) in [("next", next_cursor), ("prev", prev_cursor)] {
        let Some(cursor) = cursor.filter(|c| !c.is_empty()) else {
            continue;
        };
        query.set("cursor", cursor);
        links.push(format!("<{}?{}>; rel=\"{}\"", base_url, query.encode(), rel));
    }

    links.join(", ")
}
