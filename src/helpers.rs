use formato::Formato;

const UNIT: u64 = 1024;
const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

///bytes below 1024 as integer, otherwise scaled to the unit that keeps the value below 1024
pub fn nice_size(bytes: u64) -> String {
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    //PB is the largest unit, anything bigger stays in PB
    while n >= UNIT && exp < UNITS.len() - 1 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!("{:.1} {}", bytes as f64 / div as f64, UNITS[exp])
}

///nice size followed by the exact count, e.g. `1.5 KB (1,536 B)`
pub fn nice_size_exact(bytes: u64) -> String {
    if bytes < UNIT {
        nice_size(bytes)
    } else {
        format!("{} ({} B)", nice_size(bytes), (bytes as f64).formato("#,###"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_are_bytes() {
        assert_eq!(nice_size(0), "0 B");
        assert_eq!(nice_size(512), "512 B");
        assert_eq!(nice_size(1023), "1023 B");
    }

    #[test]
    fn scaled_values() {
        assert_eq!(nice_size(1024), "1.0 KB");
        assert_eq!(nice_size(1536), "1.5 KB");
        assert_eq!(nice_size(2048), "2.0 KB");
        assert_eq!(nice_size(1048576), "1.0 MB");
        assert_eq!(nice_size(3145728), "3.0 MB");
        assert_eq!(nice_size(1073741824), "1.0 GB");
        assert_eq!(nice_size(1099511627776), "1.0 TB");
        assert_eq!(nice_size(1125899906842624), "1.0 PB");
    }

    #[test]
    fn huge_values_stay_in_petabytes() {
        assert_eq!(nice_size(1024 * 1125899906842624), "1024.0 PB");
        assert!(nice_size(u64::MAX).ends_with(" PB"));
    }

    #[test]
    fn exact_adds_separated_count() {
        assert_eq!(nice_size_exact(100), "100 B");
        assert_eq!(nice_size_exact(1048576), "1.0 MB (1,048,576 B)");
    }
}
