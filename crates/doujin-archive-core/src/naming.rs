//! Canonical folder names for resolved works.

use rusqlite::Connection;

use crate::error::{Error, Result};
use crate::normalize::normalize_for_filename;
use crate::persistence::{self, CircleCredit, Namespace};

/// Separator used between circles, authors and sources
pub const LIST_SEPARATOR: &str = "、";

/// Build the canonical folder name of a work:
/// `｛Type｝[Circle (Author)、Circle] Title （Source、Source） #id<id>`,
/// filename-normalized as a whole.
pub fn compose_folder_name(conn: &Connection, work_id: i64) -> Result<String> {
    let work = persistence::get_work(conn, work_id)?.ok_or(Error::WorkNotFound(work_id))?;

    let type_name = match work.type_id {
        Some(id) => persistence::dictionary_name(conn, Namespace::Type, id)?,
        None => None,
    };
    let credits = persistence::circle_credits(conn, work_id)?;
    let sources = persistence::source_names(conn, work_id)?;

    let mut parts = vec![
        format!(
            "｛{}｝[{}]",
            type_name.unwrap_or_default(),
            circle_segment(&credits)
        ),
        work.title.unwrap_or_default(),
    ];
    if !sources.is_empty() {
        parts.push(format!("（{}）", sources.join(LIST_SEPARATOR)));
    }
    parts.push(id_stamp(work_id));

    Ok(normalize_for_filename(&parts.join(" ")))
}

/// Trailing stamp that keeps composed names unique
pub fn id_stamp(work_id: i64) -> String {
    format!("#id{}", work_id)
}

/// `Circle (A1、A2)` per distinct circle in first-seen order, joined by `、`
fn circle_segment(credits: &[CircleCredit]) -> String {
    let mut circles: Vec<(&str, Vec<&str>)> = Vec::new();

    for credit in credits {
        let author = credit.author.as_deref().filter(|a| !a.is_empty());
        match circles.iter_mut().find(|(name, _)| *name == credit.circle) {
            Some((_, authors)) => authors.extend(author),
            None => circles.push((credit.circle.as_str(), author.into_iter().collect())),
        }
    }

    circles
        .into_iter()
        .map(|(circle, authors)| {
            if authors.is_empty() {
                circle.to_string()
            } else {
                format!("{} ({})", circle, authors.join(LIST_SEPARATOR))
            }
        })
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::Catalog;
    use std::path::Path;

    fn credit(circle: &str, author: Option<&str>) -> CircleCredit {
        CircleCredit {
            circle: circle.into(),
            author: author.map(str::to_string),
        }
    }

    #[test]
    fn test_circle_segment_groups_authors() {
        let credits = vec![
            credit("C1", Some("A1")),
            credit("C2", None),
            credit("C1", Some("A2")),
            credit("C3", Some("")),
        ];
        assert_eq!(circle_segment(&credits), "C1 (A1、A2)、C2、C3");
        assert_eq!(circle_segment(&[]), "");
    }

    #[test]
    fn test_compose_full_work() {
        let catalog = Catalog::open_in_memory().unwrap();
        let conn = catalog.conn();

        conn.execute_batch(
            "INSERT INTO types (id, name) VALUES (1, 'CG集');
             INSERT INTO circles (id, name) VALUES (1, 'C1'), (2, 'C2');
             INSERT INTO authors (id, name) VALUES (1, 'A1');
             INSERT INTO sources (id, name) VALUES (1, 'S1'), (2, 'S2');
             INSERT INTO works (id, folder_path, original_name, image_count, status, type_id, title)
                 VALUES (7, '/archive/p', 'orig', 0, 'confirmed', 1, 'Title');
             INSERT INTO work_circle_authors (work_id, circle_id, author_id) VALUES (7, 1, 1);
             INSERT INTO work_circle_authors (work_id, circle_id, author_id) VALUES (7, 2, NULL);
             INSERT INTO work_sources (work_id, source_id) VALUES (7, 1);
             INSERT INTO work_sources (work_id, source_id) VALUES (7, 2);",
        )
        .unwrap();

        let name = compose_folder_name(conn, 7).unwrap();
        assert_eq!(
            name,
            normalize_for_filename("｛CG集｝[C1 (A1)、C2] Title （S1、S2） #id7")
        );
        assert_eq!(name, "{CG集}[C1 (A1)、C2] Title (S1、S2) #id7");
    }

    #[test]
    fn test_compose_without_sources_omits_segment() {
        let catalog = Catalog::open_in_memory().unwrap();
        let conn = catalog.conn();
        let id = persistence::insert_work(conn, Path::new("/archive/x"), "x", 0).unwrap();
        let circle = persistence::insert_dictionary_entry(conn, Namespace::Circle, "C").unwrap();
        persistence::link_circle_author(conn, id, circle, None).unwrap();
        conn.execute("UPDATE works SET title = 'A/B' WHERE id = ?1", [id])
            .unwrap();

        let name = compose_folder_name(conn, id).unwrap();
        assert_eq!(name, format!("{{}}[C] A／B #id{}", id));
    }

    #[test]
    fn test_compose_unknown_work_is_not_found() {
        let catalog = Catalog::open_in_memory().unwrap();
        let result = compose_folder_name(catalog.conn(), 99);
        assert!(matches!(result, Err(Error::WorkNotFound(99))));
    }

    #[test]
    fn test_identical_records_get_distinct_names() {
        let catalog = Catalog::open_in_memory().unwrap();
        let conn = catalog.conn();
        let a = persistence::insert_work(conn, Path::new("/archive/a"), "same", 0).unwrap();
        let b = persistence::insert_work(conn, Path::new("/archive/b"), "same", 0).unwrap();

        assert_ne!(
            compose_folder_name(conn, a).unwrap(),
            compose_folder_name(conn, b).unwrap()
        );
    }
}
