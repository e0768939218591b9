use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const SHORT_NAME_HEAD: usize = 14;
const SHORT_NAME_TAIL: usize = 6;

pub fn short_name(id: &str) -> String {
    let chars = id.chars().count();
    if chars <= SHORT_NAME_HEAD + SHORT_NAME_TAIL + 1 {
        return id.to_owned();
    }

    let head = id.chars().take(SHORT_NAME_HEAD).collect::<String>();
    let tail = id.chars().skip(chars - SHORT_NAME_TAIL).collect::<String>();
    format!("{head}…{tail}")
}

pub fn format_elapsed_ms(timestamp_ms: Option<u64>) -> String {
    match timestamp_ms {
        Some(ms) if ms >= 1000 => format!("{:.2} s", ms as f64 / 1000.0),
        Some(ms) => format!("{ms} ms"),
        None => "n/a".to_owned(),
    }
}

pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_ids_are_kept() {
        assert_eq!(short_name("A"), "A");
        assert_eq!(short_name("0123456789abcdefghij"), "0123456789abcdefghij");
    }

    #[test]
    fn long_ids_are_abbreviated() {
        let id = "enr:-IS4QBISSFfBzsBrjq61iSIxPMfp5ShBTW6KQUglzH_tj8_SJaeh-SYN1ZHCCIyg";
        assert_eq!(short_name(id), "enr:-IS4QBISSF…HCCIyg");
    }

    #[test]
    fn elapsed_formatting() {
        assert_eq!(format_elapsed_ms(Some(14)), "14 ms");
        assert_eq!(format_elapsed_ms(Some(1500)), "1.50 s");
        assert_eq!(format_elapsed_ms(None), "n/a");
    }

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let (x, y) = stable_pair("node");
        assert_eq!(stable_pair("node"), (x, y));
        assert!((-1.0..=1.0).contains(&x) && (-1.0..=1.0).contains(&y));
    }
}
