//! Shared index test data: ten ascending values, each paired with an
//! ascending item key.

pub(crate) const ITEMS: [&str; 10] = [
    "01B8NDW533F20DBGJVEDSHW3BZ",
    "01B8NDW533J6NQMYM9T10B1K3C",
    "01B8NDW533KBPAZ0NDHEKWEDRX",
    "01B8NDW533MP71DEHZD7AV97D1",
    "01B8NDW533SKQ86B97Y8H888C8",
    "01B8NDW533SKRR70MF8F7548MH",
    "01B8NDW533TSVGB126Q71TSQBY",
    "01B8NDW533WWDAKNXKDRJ87RTZ",
    "01B8NDW533Z1X4VPV9AJ6F0SDM",
    "01B8NE6WJ0MJ8N4QQAJZ6GNG7S",
];

pub(crate) const VALUES: [&str; 10] = [
    "aa zero", "bb one", "cc two", "dd three", "ee four", "ff five", "gg six", "hh seven",
    "ii eight", "jj nine",
];

pub(crate) fn item(i: usize) -> Vec<u8> {
    crate::key::key_from_string(ITEMS[i])
}

pub(crate) fn value(i: usize) -> Vec<u8> {
    VALUES[i].as_bytes().to_vec()
}

/// Indexes `value(i) -> item(i)` for every pair.
pub(crate) fn add_items(idx: &mut dyn crate::index::SecondaryIndex) {
    for i in 0..ITEMS.len() {
        idx.add(&value(i), &item(i)).unwrap();
    }
}
