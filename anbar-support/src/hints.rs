//! "Did you mean?" suggestions for unknown service ids and class names.

/// Ranks registered ids against a requested one and returns the closest
/// matches, best first.
///
/// Scoring favors substring containment, then a shared prefix of at least
/// three characters. Ties break alphabetically so output is stable.
///
/// # Examples
/// ```
/// use anbar_support::hints::closest_matches;
///
/// let available = ["Logger", "Database", "UserRepo"];
/// let hints = closest_matches("logger", &available, 3);
/// assert_eq!(hints, vec!["Logger".to_string()]);
/// ```
pub fn closest_matches<S: AsRef<str>>(
    requested: &str,
    available: &[S],
    max: usize,
) -> Vec<String> {
    let wanted = requested.to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter_map(|candidate| {
            let candidate = candidate.as_ref();
            if candidate == requested {
                return None;
            }

            let lower = candidate.to_lowercase();
            if lower.contains(&wanted) || wanted.contains(&lower) {
                return Some((candidate, 100));
            }

            let shared = lower
                .chars()
                .zip(wanted.chars())
                .take_while(|(a, b)| a == b)
                .count();
            if shared >= 3 {
                return Some((candidate, shared * 10));
            }

            None
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored
        .into_iter()
        .take(max)
        .map(|(candidate, _)| candidate.to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_match_wins() {
        let available = ["Logger", "LoggerFactory", "Database"];
        let hints = closest_matches("logger", &available, 2);
        assert_eq!(hints, vec!["Logger".to_string(), "LoggerFactory".to_string()]);
    }

    #[test]
    fn shared_prefix_scores() {
        let available = ["Database", "DataSink"];
        let hints = closest_matches("Databse", &available, 3);
        assert_eq!(hints[0], "Database");
    }

    #[test]
    fn no_match_is_empty() {
        let available = ["Logger"];
        assert!(closest_matches("Xyz", &available, 3).is_empty());
    }

    #[test]
    fn exact_id_is_excluded() {
        // an id that exists is never suggested for itself
        let available = ["Logger"];
        assert!(closest_matches("Logger", &available, 3).is_empty());
    }

    #[test]
    fn respects_max() {
        let available = ["Log", "Logger", "Logging"];
        assert_eq!(closest_matches("log", &available, 2).len(), 2);
    }
}
