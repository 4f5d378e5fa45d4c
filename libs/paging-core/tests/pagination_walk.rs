//! Walks whole collections through the cursor chain.

use paging_core::{Cursor, Page, Paginator, QueryParams};

#[derive(Clone, Debug, PartialEq)]
struct Item {
    id: String,
    category: &'static str,
}

fn catalog(n: usize) -> Vec<Item> {
    (1..=n)
        .map(|i| Item {
            id: format!("{i:03}"),
            category: if i % 3 == 0 { "tools" } else { "books" },
        })
        .collect()
}

fn walk(items: &[Item], limit: usize) -> Vec<Item> {
    let paginator = Paginator::new("item").base_url("/items");
    let mut cursor = Cursor::default();
    let mut seen = Vec::new();

    for _ in 0..=items.len() + 1 {
        let page = paginator.paginate(items, &cursor, limit, |i: &Item| i.id.as_str());
        seen.extend(page.items);
        match page.next_cursor {
            Some(token) => cursor = Cursor::decode(&token).expect("server-issued cursor"),
            None => return seen,
        }
    }
    panic!("cursor chain did not terminate");
}

#[test]
fn following_next_cursor_reproduces_collection() {
    for (n, limit) in [(30, 5), (31, 5), (1, 10), (7, 1), (10, 10), (0, 3)] {
        let items = catalog(n);
        assert_eq!(walk(&items, limit), items, "n={n} limit={limit}");
    }
}

#[test]
fn following_next_cursor_over_filtered_view() {
    let tools: Vec<Item> = catalog(40)
        .into_iter()
        .filter(|i| i.category == "tools")
        .collect();
    assert_eq!(walk(&tools, 4), tools);
}

#[test]
fn thirty_items_page_two_has_next_link() {
    let items = catalog(30);
    let paginator = Paginator::new("item")
        .base_url("/items")
        .extra_query(QueryParams::new());

    let first = paginator.paginate(&items, &Cursor::default(), 5, |i: &Item| i.id.as_str());
    assert_eq!(first.items.len(), 5);
    let token = first.next_cursor.expect("first page has next");
    assert_eq!(Cursor::decode(&token).unwrap().value, "005");

    let second = paginator.paginate(
        &items,
        &Cursor::decode(&token).unwrap(),
        5,
        |i: &Item| i.id.as_str(),
    );
    let ids: Vec<&str> = second.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["006", "007", "008", "009", "010"]);
    assert!(second.link_header.contains("rel=\"next\""));
    assert!(second.link_header.contains("rel=\"prev\""));

    let page = Page::from_result(second, 5);
    assert_eq!(page.total, 30);
    assert_eq!(page.page_info.limit, 5);
    assert!(page.page_info.next_cursor.is_some());
}
