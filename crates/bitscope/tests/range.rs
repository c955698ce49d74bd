use bitscope::range::{BitRange, RangeError};

fn r(start: u64, end: u64) -> BitRange {
    BitRange::new(start, end).expect("valid range")
}

#[test]
fn count_and_half_open_boundaries() {
    for a in 0..24u64 {
        for b in a..24u64 {
            let range = r(a, b);
            assert_eq!(range.count(), b - a);
            assert!(!range.contains(b), "{} must not contain its end", range);
            if a < b {
                assert!(range.contains(a), "{} must contain its start", range);
                assert!(range.contains(b - 1));
            } else {
                // degenerate ranges contain nothing, not even their start
                assert!(!range.contains(a));
                assert!(range.is_empty());
            }
        }
    }
}

#[test]
fn reversed_range_is_rejected() {
    assert_eq!(
        BitRange::new(9, 8),
        Err(RangeError::Reversed { start: 9, end: 8 })
    );
}

#[test]
fn negative_endpoints_are_rejected() {
    assert_eq!(
        BitRange::try_from((-1, 8)),
        Err(RangeError::Negative { start: -1, end: 8 })
    );
    assert_eq!(
        BitRange::try_from((0, -8)),
        Err(RangeError::Negative { start: 0, end: -8 })
    );
    assert_eq!(BitRange::try_from((16, 24)), Ok(r(16, 24)));
    assert!(matches!(
        BitRange::try_from((24, 16)),
        Err(RangeError::Reversed { .. })
    ));
}

#[test]
fn extent_overflow_is_rejected() {
    assert_eq!(BitRange::from_extent(16, 8), Ok(r(16, 24)));
    assert_eq!(
        BitRange::from_extent(u64::MAX, 1),
        Err(RangeError::Overflow {
            start: u64::MAX,
            size: 1
        })
    );
    assert!(BitRange::byte(u64::MAX / 8 + 1).is_err());
    assert_eq!(BitRange::byte(2), Ok(r(16, 24)));
}

#[test]
fn intersection_is_commutative() {
    let samples = [
        r(0, 0),
        r(0, 8),
        r(3, 5),
        r(4, 12),
        r(8, 16),
        r(10, 10),
        r(15, 40),
        r(32, 33),
    ];
    for a in &samples {
        for b in &samples {
            assert_eq!(a.intersect(b), b.intersect(a), "{} vs {}", a, b);
        }
    }
}

#[test]
fn disjoint_ranges_intersect_to_nothing() {
    let a = r(0, 8);
    let b = r(8, 16);
    let c = r(20, 30);
    assert_eq!(a.intersect(&b).count(), 0);
    assert_eq!(a.intersect(&c).count(), 0);
    assert_eq!(c.intersect(&a), r(20, 20));
    assert!(!a.overlaps(&b));
}

#[test]
fn overlapping_intersection() {
    let a = r(4, 12);
    let b = r(8, 16);
    assert_eq!(a.intersect(&b), r(8, 12));
    assert_eq!(a.intersect(&b).count(), 4);
    assert!(a.overlaps(&b));
    assert_eq!(r(0, 64).intersect(&r(16, 24)), r(16, 24));
}

#[test]
fn equality_is_structural() {
    assert_eq!(r(16, 24), BitRange::from_extent(16, 8).unwrap());
    assert_ne!(r(16, 24), r(16, 25));
    assert_ne!(r(16, 16), r(17, 17));
}

#[test]
fn byte_span_and_display() {
    assert_eq!(r(16, 24).byte_span(), Some((2, 2)));
    assert_eq!(r(12, 20).byte_span(), Some((1, 2)));
    assert_eq!(r(5, 5).byte_span(), None);
    assert_eq!(r(16, 24).to_string(), "[16, 24)");
    assert_eq!(
        RangeError::Reversed { start: 2, end: 1 }.to_string(),
        "invalid bit range: start 2 > end 1"
    );
}
