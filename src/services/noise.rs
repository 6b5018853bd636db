/// Routine-announcement filter: a title is noise when it contains any of the
/// configured phrases, case-insensitively. Empty titles are not noise so the
/// pipeline can still report them as having nothing to analyze.
pub fn is_noise(title: &str, patterns: &[String]) -> bool {
    if title.is_empty() {
        return false;
    }

    let normalized_title = title.trim().to_lowercase();
    patterns
        .iter()
        .any(|pattern| normalized_title.contains(&pattern.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> Vec<String> {
        vec![
            "Laporan Kepemilikan Saham".to_string(),
            "Jadwal Dividen Tunai".to_string(),
            "Informasi Kupon".to_string(),
        ]
    }

    #[test]
    fn ownership_report_is_noise() {
        assert!(is_noise("Laporan Kepemilikan Saham - PT X", &patterns()));
    }

    #[test]
    fn acquisition_title_is_not_noise() {
        assert!(!is_noise("Akuisisi PT Y oleh PT Z", &patterns()));
    }

    #[test]
    fn empty_title_is_not_noise() {
        assert!(!is_noise("", &patterns()));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(is_noise("LAPORAN KEPEMILIKAN SAHAM PT ABC Tbk", &patterns()));
        assert!(is_noise("  jadwal dividen tunai Q3  ", &patterns()));
    }
}
