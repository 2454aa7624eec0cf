use super::*;

use crate::bitmap::PixelBuffer;
use crate::foundation::core::IRect;

fn bitmap(width: u32, height: u32) -> Bitmap {
    let buf = PixelBuffer::new(width, height, vec![0u8; (width * height * 4) as usize]).unwrap();
    Bitmap::new(buf)
}

#[test]
fn aliasing_views_produce_identical_keys() {
    let a = bitmap(8, 8);
    let b = a.clone();
    assert_eq!(build_bitmap_key(&a), build_bitmap_key(&b));

    let sub_a = a.subset(IRect::from_pt_size(1, 1, 4, 4)).unwrap();
    let sub_b = b.subset(IRect::from_pt_size(1, 1, 4, 4)).unwrap();
    assert_eq!(build_bitmap_key(&sub_a), build_bitmap_key(&sub_b));
}

#[test]
fn distinct_subsets_produce_distinct_keys() {
    let a = bitmap(8, 8);
    let left = a.subset(IRect::from_pt_size(0, 0, 4, 8)).unwrap();
    let right = a.subset(IRect::from_pt_size(4, 0, 4, 8)).unwrap();
    assert_ne!(build_bitmap_key(&left), build_bitmap_key(&right));
    assert_ne!(build_bitmap_key(&a), build_bitmap_key(&left));
}

#[test]
fn mutation_changes_the_key() {
    let a = bitmap(4, 4);
    let before = build_bitmap_key(&a);
    a.pixel_buffer().write_pixels(|px| px[0] = 0xff);
    assert_ne!(before, build_bitmap_key(&a));
}

#[test]
fn distinct_buffers_produce_distinct_keys() {
    // Same dimensions and subset, but independent generations.
    assert_ne!(build_bitmap_key(&bitmap(4, 4)), build_bitmap_key(&bitmap(4, 4)));
}

#[test]
fn key_equality_is_domain_scoped() {
    let data = [1, 2, 3, 4, 5];
    let d1 = Domain::generate();
    let d2 = Domain::generate();
    assert_ne!(d1, d2);
    assert_eq!(ContentKey::new(d1, data, "a"), ContentKey::new(d1, data, "a"));
    assert_ne!(ContentKey::new(d1, data, "a"), ContentKey::new(d2, data, "a"));
}

#[test]
fn tag_is_excluded_from_equality_and_hash() {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let d = Domain::generate();
    let data = [9; KEY_DATA_LEN];
    let a = ContentKey::new(d, data, "one");
    let b = ContentKey::new(d, data, "two");
    assert_eq!(a, b);

    let mut ha = DefaultHasher::new();
    let mut hb = DefaultHasher::new();
    a.hash(&mut ha);
    b.hash(&mut hb);
    assert_eq!(ha.finish(), hb.finish());
}

#[test]
fn bitmap_keys_carry_the_proxy_cache_tag() {
    let key = build_bitmap_key(&bitmap(2, 2));
    assert_eq!(key.tag(), "ProxyCache");
}
