//! Records that point at each other by key.
//!
//! Some records name the next record of the same type through a key field
//! (a belt's `output_id` holds the `id` of the belt it feeds). Chains end at
//! a sentinel key. Links are resolved through a lookup table, never through
//! references held inside records.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::value::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSpec {
    pub key_field: &'static str,
    pub next_field: &'static str,
    pub sentinel: i64,
}

impl LinkSpec {
    /// Belts feed the belt whose `id` equals their `output_id`; `-1` ends.
    pub const BELT: LinkSpec = LinkSpec {
        key_field: "id",
        next_field: "output_id",
        sentinel: -1,
    };
}

/// Walks the chain starting at the record keyed `start`.
///
/// The returned records are in chain order and end with the record whose
/// next pointer is the sentinel; starting at the sentinel yields no records.
/// Revisiting a key fails with [`Error::CyclicLinkedStructure`], a next key
/// with no record in `pool` with [`Error::BrokenLink`], and reaching a key
/// held by more than one record with [`Error::DuplicateLinkKey`].
pub fn follow<'a, I>(pool: I, start: i64, spec: &LinkSpec) -> Result<Vec<&'a Record>>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut by_key: HashMap<i64, &'a Record> = HashMap::new();
    let mut duplicates = HashSet::new();
    for record in pool {
        let key = key_of(record, spec.key_field)?;
        if by_key.insert(key, record).is_some() {
            duplicates.insert(key);
        }
    }

    let mut chain = Vec::new();
    if start == spec.sentinel {
        return Ok(chain);
    }
    let mut seen = HashSet::new();
    let mut from = spec.sentinel;
    let mut key = start;
    loop {
        if !seen.insert(key) {
            return Err(Error::CyclicLinkedStructure { key });
        }
        if duplicates.contains(&key) {
            return Err(Error::DuplicateLinkKey { key });
        }
        let record = by_key
            .get(&key)
            .copied()
            .ok_or(Error::BrokenLink { from, to: key })?;
        chain.push(record);
        let next = key_of(record, spec.next_field)?;
        if next == spec.sentinel {
            return Ok(chain);
        }
        from = key;
        key = next;
    }
}

fn key_of(record: &Record, field: &str) -> Result<i64> {
    match record.get(field) {
        Some(value) => value.as_i64().ok_or_else(|| Error::TypeMismatch {
            field: field.to_string(),
            expected: "integer",
            found: value.type_name(),
        }),
        None => Err(Error::MissingField {
            record: record.kind(),
            field: field.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{LinkSpec, follow};
    use crate::error::{Error, ErrorKind};
    use crate::schema::RecordType;
    use crate::value::{Record, Value};

    fn belt(id: i32, output_id: i32) -> Record {
        Record::new(RecordType::Belt)
            .push("id", Value::I32(id))
            .push("output_id", Value::I32(output_id))
    }

    #[test]
    fn chain_stops_at_sentinel() {
        let pool = [belt(3, -1), belt(1, 2), belt(2, 3), belt(9, 1)];
        let chain = follow(&pool, 1, &LinkSpec::BELT).unwrap();
        let ids: Vec<i64> = chain.iter().filter_map(|r| r.int("id")).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn single_terminal_node() {
        let pool = [belt(7, -1)];
        assert_eq!(follow(&pool, 7, &LinkSpec::BELT).unwrap().len(), 1);
    }

    #[test]
    fn cycle_is_reported_not_followed() {
        let pool = [belt(1, 2), belt(2, 3), belt(3, 1)];
        let err = follow(&pool, 1, &LinkSpec::BELT).unwrap_err();
        assert!(matches!(err, Error::CyclicLinkedStructure { key: 1 }));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let pool = [belt(4, 4)];
        let err = follow(&pool, 4, &LinkSpec::BELT).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CyclicLinkedStructure);
    }

    #[test]
    fn dangling_pointer_is_a_broken_link() {
        let pool = [belt(1, 2), belt(2, 8)];
        let err = follow(&pool, 1, &LinkSpec::BELT).unwrap_err();
        assert!(matches!(err, Error::BrokenLink { from: 2, to: 8 }));
    }

    #[test]
    fn starting_at_the_sentinel_is_an_empty_chain() {
        let pool = [belt(1, -1)];
        assert!(follow(&pool, -1, &LinkSpec::BELT).unwrap().is_empty());
    }

    #[test]
    fn reached_duplicate_key_is_ambiguous() {
        let pool = [belt(1, 2), belt(2, -1), belt(2, 1)];
        let err = follow(&pool, 1, &LinkSpec::BELT).unwrap_err();
        assert!(matches!(err, Error::DuplicateLinkKey { key: 2 }));
    }

    #[test]
    fn unreached_duplicates_are_ignored() {
        let pool = [belt(0, -1), belt(0, -1), belt(5, 6), belt(6, -1)];
        assert_eq!(follow(&pool, 5, &LinkSpec::BELT).unwrap().len(), 2);
    }
}
