use std::collections::HashSet;

use rivd_storage::Column;

#[test]
fn column_index_bit_and_name_are_unique() {
    let mut seen = 0u32;
    let mut names = HashSet::new();
    for (idx, column) in Column::ALL.iter().copied().enumerate() {
        assert_eq!(column.index(), idx);
        assert_eq!(column.bit(), 1u32 << idx);
        assert_eq!(seen & column.bit(), 0, "duplicate bit for {column:?}");
        seen |= column.bit();
        assert!(names.insert(column.as_str()), "duplicate name for {column:?}");
    }
    assert_eq!(seen.count_ones() as usize, Column::ALL.len());
}
