//! Entity trait: identity that survives snapshot replacement.

/// Something with a stable identifier.
///
/// Items and ledger entries are entities: two snapshots of the same item
/// share an id even when every other field differs.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}

/// First entity in `entities` carrying `id`.
pub fn find_by_id<'a, E: Entity>(entities: &'a [E], id: &E::Id) -> Option<&'a E> {
    entities.iter().find(|e| e.id() == id)
}

/// Successor collection with the entity carrying `id` rebuilt by `f`; every
/// other entity is cloned unchanged.
pub fn replace_by_id<E, F>(entities: &[E], id: &E::Id, f: F) -> Vec<E>
where
    E: Entity + Clone,
    F: Fn(&E) -> E,
{
    entities
        .iter()
        .map(|e| if e.id() == id { f(e) } else { e.clone() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        label: &'static str,
    }

    impl Entity for Row {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }
    }

    #[test]
    fn replace_touches_only_the_matching_entity() {
        let rows = vec![Row { id: 1, label: "a" }, Row { id: 2, label: "b" }];
        let next = replace_by_id(&rows, &2, |r| Row { label: "z", ..r.clone() });

        assert_eq!(next[0], rows[0]);
        assert_eq!(find_by_id(&next, &2).map(|r| r.label), Some("z"));
        assert!(find_by_id(&next, &3).is_none());
        assert_eq!(rows[1].label, "b");
    }
}
