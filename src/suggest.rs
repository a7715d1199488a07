//! "did you mean" hints for undeclared names.

fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut diag = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            let cost = usize::from(ca != cb);
            row[j + 1] = (above + 1).min(row[j] + 1).min(diag + cost);
            diag = above;
        }
    }
    row[b.len()]
}

/// Closest candidate within `max(1, min(2, len / 2))` edits. Ties go to
/// the lexicographically smallest name so output is stable.
pub fn closest<'a, I>(input: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let limit = (input.chars().count() / 2).clamp(1, 2);

    let mut best: Option<(usize, &str)> = None;
    for candidate in candidates {
        if candidate == input || candidate.starts_with("__") {
            continue;
        }
        let d = edit_distance(input, candidate);
        if d > limit {
            continue;
        }
        best = match best {
            Some((bd, bc)) if bd < d || (bd == d && bc <= candidate) => Some((bd, bc)),
            _ => Some((d, candidate)),
        };
    }
    best.map(|(_, name)| name.to_string())
}

/// Help line for a diagnostic, if any candidate is close enough.
pub fn did_you_mean<'a, I>(input: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    closest(input, candidates).map(|name| format!("did you mean '{}'?", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_basics() {
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("count", "cnt"), 2);
        assert_eq!(edit_distance("same", "same"), 0);
    }

    #[test]
    fn close_name_is_found() {
        assert_eq!(closest("conut", ["count", "total"]), Some("count".to_string()));
    }

    #[test]
    fn far_names_are_ignored() {
        assert_eq!(closest("x", ["counter", "total"]), None);
    }

    #[test]
    fn ties_are_deterministic() {
        assert_eq!(closest("aa", ["ac", "ab"]), Some("ab".to_string()));
        assert_eq!(closest("aa", ["ab", "ac"]), Some("ab".to_string()));
    }

    #[test]
    fn hidden_names_are_never_suggested() {
        assert_eq!(closest("__idx", ["__idx0"]), None);
    }

    #[test]
    fn help_text() {
        assert_eq!(
            did_you_mean("prnt", ["print_all", "pint"]),
            Some("did you mean 'pint'?".to_string())
        );
    }
}
