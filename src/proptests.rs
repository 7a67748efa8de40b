use super::*;

use crate::codec::{decode_bytes, encode_bytes};
use crate::node::{Node, LEAF_LEVEL};
use crate::varint::{decode_varint, encode_varint, SATURATED_VALUE, SATURATION_THRESHOLD};
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};

fn validate_tree(t: &IpTree) {
    let mut leaf_count = 0usize;
    t.for_each_branch(|path, children| {
        assert!(path.len() <= LEAF_LEVEL, "branch below the leaf level");
        for (b, node) in children {
            match node {
                Node::Leaf(_) => {
                    assert_eq!(path.len(), LEAF_LEVEL, "leaf at depth {} (byte {})", path.len(), b);
                    leaf_count += 1;
                }
                Node::Branch(grand) => {
                    assert!(path.len() < LEAF_LEVEL, "branch at the leaf level");
                    assert!(!grand.is_empty(), "empty branch left behind at {:?}+{}", path, b);
                }
            }
        }
    });

    assert_eq!(leaf_count, t.len(), "reachable leaf count must match IpTree::len");
    assert_eq!(t.count(), t.len());
    assert_eq!(t.ipv4_count() + t.ipv6_count(), t.len());
}

#[derive(Clone, Debug)]
enum Op {
    Insert(Address, u64),
    Append(Address),
    Remove(Address),
    Get(Address),
    Roundtrip,
}

fn address_strategy() -> impl Strategy<Value = Address> + Clone {
    // Small pools so that inserts, removes and lookups collide often.
    prop_oneof![
        4 => (0u8..4, 0u8..4).prop_map(|(a, b)| Address::from(Ipv4Addr::new(10, 0, a, b))),
        4 => (0u16..4, 0u16..4)
            .prop_map(|(a, b)| Address::from(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, a, 0, b))),
        1 => any::<[u8; 16]>().prop_map(Address::from),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let address = address_strategy();
    let op = prop_oneof![
        30 => (address.clone(), 0u64..100_000).prop_map(|(a, d)| Op::Insert(a, d)),
        20 => address.clone().prop_map(Op::Append),
        25 => address.clone().prop_map(Op::Remove),
        24 => address.clone().prop_map(Op::Get),
        1 => Just(Op::Roundtrip),
    ];
    prop::collection::vec(op, 0..=500)
}

fn tree_strategy() -> impl Strategy<Value = IpTree> {
    prop::collection::vec((address_strategy(), any::<u64>()), 0..=64)
        .prop_map(|entries| entries.into_iter().collect::<IpTree>())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut t = IpTree::new();
        let mut m: BTreeMap<Address, u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(address, delta) => {
                    let is_new_t = t.insert(address, delta);
                    let is_new_m = !m.contains_key(&address);
                    *m.entry(address).or_insert(0) += delta;
                    prop_assert_eq!(is_new_t, is_new_m);
                }
                Op::Append(address) => {
                    let is_new_t = t.append(address);
                    let is_new_m = !m.contains_key(&address);
                    *m.entry(address).or_insert(0) += 1;
                    prop_assert_eq!(is_new_t, is_new_m);
                }
                Op::Remove(address) => {
                    prop_assert_eq!(t.remove(address), m.remove(&address));
                }
                Op::Get(address) => {
                    prop_assert_eq!(t.get(address), m.get(&address).copied());
                }
                Op::Roundtrip => {
                    let back = IpTree::decode(&t.encode()).unwrap();
                    prop_assert_eq!(back.to_map(usize::MAX), t.to_map(usize::MAX));
                    t = back;
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_tree(&t);
        let got: Vec<(Address, u64)> = t.iter().collect();
        let expected: Vec<(Address, u64)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_encode_is_normal_form(t in tree_strategy()) {
        let bytes = encode_bytes(&t);
        let back = decode_bytes(&bytes).unwrap();
        validate_tree(&back);
        prop_assert_eq!(back.len(), t.len());
        prop_assert_eq!(encode_bytes(&back), bytes);
    }

    #[test]
    fn prop_roundtrip_below_threshold(
        entries in prop::collection::vec((address_strategy(), 0..SATURATION_THRESHOLD), 0..=64)
    ) {
        let mut t = IpTree::new();
        for (address, counter) in entries {
            // Overwrite rather than accumulate so counters stay below the threshold.
            t.remove(address);
            t.insert(address, counter);
        }
        let back = IpTree::decode(&t.encode()).unwrap();
        prop_assert_eq!(back.to_map(usize::MAX), t.to_map(usize::MAX));
    }

    #[test]
    fn prop_to_map_respects_limit(t in tree_strategy(), limit in 0usize..80) {
        let map = t.to_map(limit);
        prop_assert_eq!(map.len(), limit.min(t.len()));
    }

    #[test]
    fn prop_varint(value in any::<u64>()) {
        let mut buf = [0u8; 4];
        let n = encode_varint(value, &mut buf);
        let (decoded, consumed) = decode_varint(&buf[..n]).unwrap();
        prop_assert_eq!(consumed, n);
        if value < SATURATION_THRESHOLD {
            prop_assert_eq!(decoded, value);
        } else {
            prop_assert_eq!(decoded, SATURATED_VALUE);
        }
    }

    #[test]
    fn prop_decode_arbitrary_bytes(body in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut bytes = codec::MAGIC.to_vec();
        bytes.extend_from_slice(&body);
        if let Ok(t) = decode_bytes(&bytes) {
            // Whatever was accepted must be a well-formed tree.
            validate_tree(&t);
            prop_assert_eq!(t.iter().count(), t.len());
        }
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

fn small_set() -> Vec<Address> {
    ["0.0.0.0", "0.0.0.1", "10.0.0.1", "10.1.0.1", "::", "::1"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect()
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = small_set();
    let mut reference: Option<Vec<u8>> = None;

    for_each_permutation(&keys, |perm| {
        let mut t = IpTree::new();
        for a in perm {
            assert!(t.append(a));
            assert!(!t.append(a));
        }
        validate_tree(&t);

        let bytes = encode_bytes(&t);
        let expected = reference.get_or_insert_with(|| bytes.clone());
        assert_eq!(&bytes, expected, "encoding depends on insert order");
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys = small_set();
    let base: IpTree = keys.iter().map(|&a| (a, 1)).collect();

    for_each_permutation(&keys, |perm| {
        let mut t = base.clone();
        let mut remaining = keys.len();

        for a in perm {
            assert_eq!(t.remove(a), Some(1));
            remaining -= 1;
            assert_eq!(t.len(), remaining);
            validate_tree(&t);
        }
        assert!(t.is_empty());
        assert_eq!(encode_bytes(&t), codec::MAGIC.to_vec());
    });
}
