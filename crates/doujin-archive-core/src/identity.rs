//! Resolution of raw text fragments to stable dictionary ids.

use log::debug;
use rusqlite::Connection;
use std::collections::HashMap;

use crate::normalize::{normalize_for_filename, normalize_for_matching};
use crate::persistence::{self, Namespace, PersistenceResult};

/// Maps matching keys to dictionary ids, one table per namespace.
///
/// Each namespace is loaded from the catalog on first use and updated on
/// every insert, so a lookup never rescans the dictionary. When several
/// stored names share a key the lowest id wins, which is what a scan in
/// insertion order would return.
///
/// The index trusts that it sees every write to the dictionaries. Call
/// [`IdentityResolver::invalidate`] after a rolled-back transaction.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    index: HashMap<Namespace, HashMap<String, i64>>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the entry whose name matches `raw`, inserting a new entry
    /// (stored filename-normalized) when nothing matches
    pub fn resolve(
        &mut self,
        conn: &Connection,
        namespace: Namespace,
        raw: &str,
    ) -> PersistenceResult<i64> {
        let key = normalize_for_matching(raw);
        let keys = self.namespace_index(conn, namespace)?;

        if let Some(&id) = keys.get(&key) {
            return Ok(id);
        }

        let safe_name = normalize_for_filename(raw);
        let id = persistence::insert_dictionary_entry(conn, namespace, &safe_name)?;
        keys.insert(key, id);
        Ok(id)
    }

    /// Forget every cached namespace
    pub fn invalidate(&mut self) {
        self.index.clear();
    }

    fn namespace_index(
        &mut self,
        conn: &Connection,
        namespace: Namespace,
    ) -> PersistenceResult<&mut HashMap<String, i64>> {
        if !self.index.contains_key(&namespace) {
            let mut keys = HashMap::new();
            for entry in persistence::dictionary_entries(conn, namespace)? {
                keys.entry(normalize_for_matching(&entry.name))
                    .or_insert(entry.id);
            }
            debug!(
                "Indexed {} keys for {}",
                keys.len(),
                namespace.table()
            );
            self.index.insert(namespace, keys);
        }
        Ok(self.index.entry(namespace).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::Catalog;

    #[test]
    fn test_spelling_variants_share_an_id() {
        let catalog = Catalog::open_in_memory().unwrap();
        let conn = catalog.conn();
        let mut resolver = IdentityResolver::new();

        let first = resolver.resolve(conn, Namespace::Source, "Fate/Grand Order").unwrap();
        let second = resolver.resolve(conn, Namespace::Source, "ＦＡＴＥ・grand order").unwrap();
        let third = resolver.resolve(conn, Namespace::Source, "fate grand-order!").unwrap();

        assert_eq!(first, second);
        assert_eq!(first, third);

        let entries = persistence::dictionary_entries(conn, Namespace::Source).unwrap();
        assert_eq!(entries.len(), 1);
        // Stored in its filename-safe form
        assert_eq!(entries[0].name, "Fate／Grand Order");
    }

    #[test]
    fn test_insertion_order_does_not_change_identity() {
        let a = "サークル・ABC";
        let b = "サークルａｂｃ";

        for (x, y) in [(a, b), (b, a)] {
            let catalog = Catalog::open_in_memory().unwrap();
            let mut resolver = IdentityResolver::new();
            let id_x = resolver.resolve(catalog.conn(), Namespace::Circle, x).unwrap();
            let id_y = resolver.resolve(catalog.conn(), Namespace::Circle, y).unwrap();
            assert_eq!(id_x, id_y);
        }
    }

    #[test]
    fn test_namespaces_are_independent() {
        let catalog = Catalog::open_in_memory().unwrap();
        let conn = catalog.conn();
        let mut resolver = IdentityResolver::new();

        resolver.resolve(conn, Namespace::Circle, "Same").unwrap();
        resolver.resolve(conn, Namespace::Author, "Same").unwrap();

        assert_eq!(persistence::dictionary_entries(conn, Namespace::Circle).unwrap().len(), 1);
        assert_eq!(persistence::dictionary_entries(conn, Namespace::Author).unwrap().len(), 1);
        assert!(persistence::dictionary_entries(conn, Namespace::Type).unwrap().is_empty());
    }

    #[test]
    fn test_fresh_resolver_finds_existing_rows() {
        let catalog = Catalog::open_in_memory().unwrap();
        let conn = catalog.conn();

        let id = IdentityResolver::new()
            .resolve(conn, Namespace::Type, "CG集")
            .unwrap();
        let again = IdentityResolver::new()
            .resolve(conn, Namespace::Type, "ＣＧ集")
            .unwrap();
        assert_eq!(id, again);
    }

    #[test]
    fn test_lowest_id_wins_among_colliding_names() {
        let catalog = Catalog::open_in_memory().unwrap();
        let conn = catalog.conn();

        // Rows written outside the resolver may collide on their key
        let first = persistence::insert_dictionary_entry(conn, Namespace::Author, "A-1").unwrap();
        persistence::insert_dictionary_entry(conn, Namespace::Author, "a1").unwrap();

        let mut resolver = IdentityResolver::new();
        assert_eq!(resolver.resolve(conn, Namespace::Author, "A 1").unwrap(), first);
    }

    #[test]
    fn test_invalidate_reloads_from_catalog() {
        let mut catalog = Catalog::open_in_memory().unwrap();
        let mut resolver = IdentityResolver::new();

        let result: PersistenceResult<i64> = catalog.transaction(|conn| {
            resolver.resolve(conn, Namespace::Circle, "Ghost")?;
            Err(crate::persistence::PersistenceError::InvalidValue("abort".into()))
        });
        assert!(result.is_err());
        resolver.invalidate();

        let id = resolver
            .resolve(catalog.conn(), Namespace::Circle, "Ghost")
            .unwrap();
        let entries = persistence::dictionary_entries(catalog.conn(), Namespace::Circle).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, id);
    }
}
