use std::thread;

use xlist::{XList, XListError};

/// Forward and backward traversal must agree with each other and with `len`.
fn assert_links<T>(list: &XList<T>, expected: &[T])
where
    T: Clone + PartialEq + std::fmt::Debug,
{
    assert_eq!(list.len(), expected.len());
    assert_eq!(list.is_empty(), expected.is_empty());
    assert_eq!(list.to_vec(), expected);

    let mut backward = Vec::new();
    list.for_each_rev(|index, value| {
        assert_eq!(index, expected.len() - 1 - backward.len());
        backward.push(value.clone());
    });
    backward.reverse();
    assert_eq!(backward, expected);

    assert_eq!(list.first().as_ref(), expected.first());
    assert_eq!(list.last().as_ref(), expected.last());
}

#[test]
fn construction() {
    let empty = XList::<u8>::new();
    assert_links(&empty, &[]);
    assert_links(&XList::<u8>::default(), &[]);

    let from_vec = XList::from(vec![1, 2, 3]);
    assert_links(&from_vec, &[1, 2, 3]);

    let collected: XList<_> = (1..=4).collect();
    assert_links(&collected, &[1, 2, 3, 4]);

    let mut extended = XList::from(vec![1]);
    extended.extend([2, 3]);
    assert_links(&extended, &[1, 2, 3]);
}

#[test]
fn push_and_append() {
    let list = XList::new();
    list.push_back(1);
    list.push_back(2);
    list.append([3, 4, 5]);
    list.append(Vec::new());
    assert_links(&list, &[1, 2, 3, 4, 5]);

    list.clear();
    assert_links(&list, &[]);
    list.push_back(7);
    assert_links(&list, &[7]);
}

#[test]
fn insert() {
    let list = XList::new();
    list.insert(0, [3, 4]).unwrap();
    list.insert(0, [1, 2]).unwrap();
    list.insert(4, [6]).unwrap();
    list.insert(4, [5]).unwrap();
    assert_links(&list, &[1, 2, 3, 4, 5, 6]);

    assert_eq!(
        list.insert(7, [0]),
        Err(XListError::InvalidIndex { index: 7, len: 6 })
    );
    assert_links(&list, &[1, 2, 3, 4, 5, 6]);
}

#[test]
fn at() {
    let list = XList::from(vec!['a', 'b', 'c', 'd', 'e']);
    for (index, expected) in ['a', 'b', 'c', 'd', 'e'].into_iter().enumerate() {
        assert_eq!(list.at(index), Some(expected));
    }
    assert_eq!(list.at(5), None);
    assert_eq!(XList::<char>::new().first(), None);
}

#[test]
fn replace() {
    let list = XList::from(vec![1, 2, 3]);
    assert_eq!(list.replace(1, 20), Ok(2));
    assert_eq!(list.replace_last(30), Ok(3));
    assert_links(&list, &[1, 20, 30]);

    assert_eq!(
        list.replace(3, 0),
        Err(XListError::InvalidIndex { index: 3, len: 3 })
    );

    let empty = XList::new();
    assert_eq!(empty.replace(0, 1), Err(XListError::ElementNotFound));
    assert_eq!(empty.replace_last(1), Err(XListError::ElementNotFound));
}

#[test]
fn delete() {
    let list = XList::from(vec![1, 2, 3, 4, 5]);
    assert_eq!(list.delete_at(0), Ok(1));
    assert_links(&list, &[2, 3, 4, 5]);
    assert_eq!(list.delete_at(2), Ok(4));
    assert_links(&list, &[2, 3, 5]);
    assert_eq!(list.delete_last(), Ok(5));
    assert_links(&list, &[2, 3]);
    assert_eq!(
        list.delete_at(2),
        Err(XListError::InvalidIndex { index: 2, len: 2 })
    );

    assert_eq!(list.delete_at(1), Ok(3));
    assert_eq!(list.delete_last(), Ok(2));
    assert_links(&list, &[]);
    assert_eq!(list.delete_last(), Err(XListError::ElementNotFound));
    assert_eq!(list.delete_at(0), Err(XListError::ElementNotFound));
}

#[test]
fn swap() {
    let list = XList::from(vec![1, 2, 3, 4]);
    list.swap(0, 3).unwrap();
    list.swap(1, 1).unwrap();
    assert_links(&list, &[4, 2, 3, 1]);
    assert_eq!(
        list.swap(0, 4),
        Err(XListError::InvalidIndex { index: 4, len: 4 })
    );
}

#[test]
fn iteration() {
    let list = XList::from(vec![10, 20, 30]);

    let mut seen = Vec::new();
    list.for_each(|index, value| seen.push((index, *value)));
    assert_eq!(seen, [(0, 10), (1, 20), (2, 30)]);

    seen.clear();
    list.for_each_rev(|index, value| seen.push((index, *value)));
    assert_eq!(seen, [(2, 30), (1, 20), (0, 10)]);
}

#[test]
fn modify() {
    let list = XList::from(vec![1, 2, 3]);
    list.modify(|index, value| *value *= 10 + index as i32)
        .modify_rev(|index, value| *value -= index as i32);
    assert_links(&list, &[10, 21, 34]);

    let mut order = Vec::new();
    list.modify_rev(|index, _| order.push(index));
    assert_eq!(order, [2, 1, 0]);
}

#[test]
fn find() {
    let list = XList::from(vec![1, 2, 3, 4, 5, 6]);

    let even = list.find(|_, value| value % 2 == 0);
    assert_links(&even, &[2, 4, 6]);

    let tail = list.find(|index, _| index >= 4);
    assert_links(&tail, &[5, 6]);

    assert!(list.find(|_, _| false).is_empty());
    assert_links(&list, &[1, 2, 3, 4, 5, 6]);
}

#[test]
fn contains_all() {
    let list = XList::from(vec!["a", "b", "c"]);
    assert!(list.contains_all(&["c", "a"]));
    assert!(!list.contains_all(&["a", "z"]));
    assert!(!XList::<&str>::new().contains_all(&["a"]));
}

#[test]
fn concat() {
    let a = XList::from(vec![1, 2]);
    let b = XList::from(vec![3]);
    let joined = a.concat(&b);

    assert_links(&joined, &[1, 2, 3]);
    assert_links(&a, &[1, 2]);
    assert_links(&b, &[3]);
    assert_links(&a.concat(&XList::new()), &[1, 2]);
}

#[test]
fn move_from() {
    let dst = XList::from(vec![1, 2]);
    let src = XList::from(vec![3, 4]);
    dst.move_from(&src);
    assert_links(&dst, &[1, 2, 3, 4]);
    assert_links(&src, &[]);

    dst.move_from(&src);
    assert_links(&dst, &[1, 2, 3, 4]);

    let empty = XList::new();
    empty.move_from(&dst);
    assert_links(&empty, &[1, 2, 3, 4]);
    assert_links(&dst, &[]);

    empty.move_from(&empty);
    assert_links(&empty, &[1, 2, 3, 4]);
}

#[test]
fn move_at() {
    let dst = XList::from(vec![1, 5]);
    dst.move_at(1, &XList::from(vec![2, 3, 4])).unwrap();
    assert_links(&dst, &[1, 2, 3, 4, 5]);

    dst.move_at(0, &XList::from(vec![0])).unwrap();
    dst.move_at(6, &XList::from(vec![6])).unwrap();
    assert_links(&dst, &[0, 1, 2, 3, 4, 5, 6]);

    let src = XList::from(vec![9]);
    assert_eq!(
        dst.move_at(8, &src),
        Err(XListError::InvalidIndex { index: 8, len: 7 })
    );
    assert_links(&src, &[9]);
}

#[test]
fn marks() {
    let list = XList::from(vec![1, 2, 3, 4]);
    list.mark_at(1).unwrap();
    list.mark_at(3).unwrap();
    assert_eq!(
        list.mark_at(4),
        Err(XListError::InvalidIndex { index: 4, len: 4 })
    );

    let marked: Vec<bool> = (0..5).map(|i| list.is_marked_at(i)).collect();
    assert_eq!(marked, [false, true, false, true, false]);

    // Exchanging payloads leaves the marks in place.
    list.swap(0, 1).unwrap();
    assert!(list.is_marked_at(1));
    assert!(!list.is_marked_at(0));

    list.unmark_at(1).unwrap();
    assert!(!list.is_marked_at(1));

    list.mark_all();
    assert!((0..4).all(|i| list.is_marked_at(i)));
    assert!(!list.clone().is_marked_at(0));
    list.unmark_all();
    assert!((0..4).all(|i| !list.is_marked_at(i)));
}

#[test]
fn set() {
    let list = XList::from(vec![1, 2, 3]);
    list.mark_at(0).unwrap();

    list.set([7, 8]);
    assert_links(&list, &[7, 8]);
    assert!(!list.is_marked_at(0));

    list.set(Vec::new());
    assert_links(&list, &[7, 8]);
}

#[test]
fn copy_range() {
    let list = XList::from(vec![0, 1, 2, 3, 4]);

    assert_links(&list.copy_range(1..=3).unwrap(), &[1, 2, 3]);
    assert_links(&list.copy_range(..2).unwrap(), &[0, 1]);
    assert_links(&list.copy_range(3..).unwrap(), &[3, 4]);
    assert_links(&list.copy_range(..).unwrap(), &[0, 1, 2, 3, 4]);
    assert_links(&list.copy_range(2..2).unwrap(), &[]);

    assert_eq!(
        list.copy_range(3..=5).unwrap_err(),
        XListError::InvalidIndex { index: 5, len: 5 }
    );
    assert_eq!(
        list.copy_range(4..2).unwrap_err(),
        XListError::InvalidIndex { index: 4, len: 5 }
    );
    assert_links(&list, &[0, 1, 2, 3, 4]);
}

#[test]
fn append_unique() {
    let list = XList::new();
    list.append_unique(["a", "b", "a"]);
    assert_links(&list, &["a", "b"]);

    list.append_unique(["b", "c", "c", "a", "d"]);
    assert_links(&list, &["a", "b", "c", "d"]);

    list.append_unique(Vec::new());
    assert_links(&list, &["a", "b", "c", "d"]);
}

#[test]
fn contains_all_large() {
    let list: XList<u32> = (0..10_000).collect();
    let wanted: Vec<u32> = (0..10_000).rev().collect();
    assert!(list.contains_all(&wanted));
    assert!(list.contains_all(&[]));
    assert!(!list.contains_all(&[9_999, 10_000]));
}

#[test]
fn read_guard() {
    let list = XList::from(vec![1, 2, 3, 4, 5]);
    let guard = list.read();

    assert_eq!(guard.len(), 5);
    assert!(!guard.is_empty());
    assert_eq!(guard.get(3), Some(&4));
    assert_eq!(guard.get(5), None);
    assert_eq!(guard.first(), Some(&1));
    assert_eq!(guard.last(), Some(&5));

    assert_eq!(guard.iter().copied().collect::<Vec<_>>(), [1, 2, 3, 4, 5]);
    assert_eq!(guard.iter_rev().copied().collect::<Vec<_>>(), [5, 4, 3, 2, 1]);
    assert_eq!(guard.iter().len(), 5);
    assert_eq!((&guard).into_iter().sum::<i32>(), 15);

    let mid = guard.range(1..4).unwrap();
    assert_eq!(mid.len(), 3);
    assert_eq!(mid.rev().copied().collect::<Vec<_>>(), [4, 3, 2]);
    assert_eq!(guard.range(5..).unwrap().count(), 0);
    assert_eq!(
        guard.range(..=5).err(),
        Some(XListError::InvalidIndex { index: 5, len: 5 })
    );

    drop(guard);
    list.push_back(6);
    assert_eq!(list.read().last(), Some(&6));

    let empty = XList::<i32>::new();
    let guard = empty.read();
    assert!(guard.is_empty());
    assert_eq!(guard.iter().next(), None);
    assert_eq!(guard.first(), None);
}

#[test]
fn range_cursor_walks_both_ways() {
    let list = XList::from(vec![10, 11, 12, 13, 14, 15]);
    let guard = list.read();

    let mut cursor = guard.cursor(..).unwrap();
    assert_eq!(cursor.index(), None);
    assert_eq!(cursor.current(), None);

    let mut forward = Vec::new();
    while let Some(value) = cursor.next_value() {
        forward.push(*value);
    }
    assert_eq!(forward, [10, 11, 12, 13, 14, 15]);
    assert_eq!(cursor.index(), Some(5));

    // Stuck at the end, going back works.
    assert!(!cursor.move_next());
    assert_eq!(cursor.prev_value(), Some(&14));
    assert_eq!(cursor.index(), Some(4));

    cursor.reset(2..=4).unwrap();
    assert_eq!(cursor.index(), None);
    assert_eq!(cursor.range(), 2..5);

    let mut backward = Vec::new();
    while let Some(value) = cursor.prev_value() {
        backward.push(*value);
    }
    assert_eq!(backward, [14, 13, 12]);
    assert!(!cursor.move_prev());
    assert_eq!(cursor.current(), Some(&12));

    assert_eq!(cursor.seek(3), Some(&13));
    assert_eq!(cursor.seek(5), None);
    assert_eq!(cursor.seek(1), None);
    assert_eq!(cursor.index(), Some(3));
    assert_eq!(cursor.first(), Some(&12));
    assert_eq!(cursor.last(), Some(&14));

    assert_eq!(
        cursor.reset(4..7).unwrap_err(),
        XListError::InvalidIndex { index: 6, len: 6 }
    );

    let mut empty = guard.cursor(3..3).unwrap();
    assert!(!empty.move_next());
    assert!(!empty.move_prev());
    assert_eq!(empty.first(), None);

    assert!(guard.cursor(2..=6).is_err());
}

#[test]
fn clone_and_debug() {
    let list = XList::from(vec![String::from("a"), String::from("b")]);
    let copy = list.clone();
    copy.replace(0, String::from("z")).unwrap();

    assert_eq!(format!("{list:?}"), r#"["a", "b"]"#);
    assert_eq!(format!("{copy:?}"), r#"["z", "b"]"#);
}

#[test]
fn error_display() {
    assert_eq!(
        XListError::InvalidIndex { index: 3, len: 2 }.to_string(),
        "invalid index 3 for list of length 2"
    );
    assert_eq!(XListError::ElementNotFound.to_string(), "element not found");

    let err: Box<dyn std::error::Error> = Box::new(XListError::ElementNotFound);
    assert_eq!(err.to_string(), "element not found");
}

#[test]
fn concurrent_writers() {
    let list = XList::new();
    let threads = 8;
    let per_thread = 1_000;

    thread::scope(|s| {
        for t in 0..threads {
            let list = &list;
            s.spawn(move || {
                for i in 0..per_thread {
                    list.push_back(t * per_thread + i);
                }
            });
        }
    });

    assert_eq!(list.len(), threads * per_thread);
    list.sort();
    assert_links(&list, &(0..threads * per_thread).collect::<Vec<_>>());
}

#[test]
fn concurrent_moves_in_both_directions() {
    let a = XList::from((0..100).collect::<Vec<_>>());
    let b = XList::from((100..200).collect::<Vec<_>>());

    thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..200 {
                a.move_from(&b);
            }
        });
        s.spawn(|| {
            for _ in 0..200 {
                b.move_from(&a);
            }
        });
    });

    assert_eq!(a.len() + b.len(), 200);
    let mut all = a.to_vec();
    all.extend(b.to_vec());
    all.sort();
    assert_eq!(all, (0..200).collect::<Vec<_>>());
}
