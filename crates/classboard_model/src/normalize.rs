//! Roll and display-name normalization.
//!
//! Rolls are human-assigned and canonical only after upper-casing.
//! Display names carry inline markers: `*` counts stars, `(v)`/`(vv)`
//! counts vetos. Normalization strips both to recover a stable base name
//! usable as a secondary matching key across peers.

/// Canonicalizes a roll code: trimmed and upper-cased.
pub fn normalize_roll(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Reduces a display name to a stable lowercase alphanumeric key.
///
/// Star and veto markers are stripped first so `"Jay Arya***"` and
/// `"Jay Arya (v)"` normalize to the same key.
pub fn normalize_name_key(value: &str) -> String {
    let stripped = strip_markers(value);
    stripped
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Extracts `(base_name, stars, vetos)` from a marked-up display name.
///
/// `*` characters anywhere count as stars; parenthesized runs of `v`/`V`
/// count one veto per letter. The base name keeps its original casing with
/// markers removed and whitespace collapsed.
pub fn parse_name_meta(raw: &str) -> (String, i64, i64) {
    let stars = raw.chars().filter(|c| *c == '*').count() as i64;
    let vetos = count_veto_markers(raw);
    let base = strip_markers(raw);
    let base = collapse_spaces(&base);
    if base.is_empty() {
        (raw.trim().to_string(), stars, vetos)
    } else {
        (base, stars, vetos)
    }
}

fn count_veto_markers(raw: &str) -> i64 {
    let mut total = 0i64;
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '(' {
            continue;
        }
        let mut run = 0i64;
        let mut closed = false;
        for inner in chars.by_ref() {
            match inner {
                'v' | 'V' => run += 1,
                ')' => {
                    closed = true;
                    break;
                }
                _ => {
                    run = 0;
                    // Not a veto group; skip to its closing paren.
                    for rest in chars.by_ref() {
                        if rest == ')' {
                            break;
                        }
                    }
                    break;
                }
            }
        }
        if closed && run > 0 {
            total += run;
        }
    }
    total
}

fn strip_markers(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {}
            '(' => {
                // Drop any parenthesized group: veto markers and post tags
                // like (CR) both live outside the base name.
                for inner in chars.by_ref() {
                    if inner == ')' {
                        break;
                    }
                }
            }
            _ => out.push(c),
        }
    }
    out.trim().to_string()
}

fn collapse_spaces(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut last_space = false;
    for c in value.trim().chars() {
        if c.is_whitespace() {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
        } else {
            out.push(c);
            last_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roll_uppercased() {
        assert_eq!(normalize_roll(" ea25d20 "), "EA25D20");
    }

    #[test]
    fn name_meta_extraction() {
        let (base, stars, vetos) = parse_name_meta("Harsh Mallik****** (VVV) (L)");
        assert_eq!(base, "Harsh Mallik");
        assert_eq!(stars, 6);
        assert_eq!(vetos, 3);
    }

    #[test]
    fn name_meta_plain() {
        let (base, stars, vetos) = parse_name_meta("Afreen Khatun");
        assert_eq!(base, "Afreen Khatun");
        assert_eq!(stars, 0);
        assert_eq!(vetos, 0);
    }

    #[test]
    fn post_tags_do_not_count_as_vetos() {
        let (base, stars, vetos) = parse_name_meta("Riya Singh (RM)");
        assert_eq!(base, "Riya Singh");
        assert_eq!(stars, 0);
        assert_eq!(vetos, 0);
    }

    #[test]
    fn name_key_is_marker_insensitive() {
        assert_eq!(
            normalize_name_key("Jay Arya***"),
            normalize_name_key("jay arya (v)")
        );
        assert_eq!(normalize_name_key("Jay Arya***"), "jayarya");
    }

    #[test]
    fn all_marker_name_falls_back_to_raw() {
        let (base, stars, _) = parse_name_meta("***");
        assert_eq!(base, "***");
        assert_eq!(stars, 3);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_name_meta_never_panics(raw in ".*") {
                let (_, stars, vetos) = parse_name_meta(&raw);
                prop_assert!(stars >= 0);
                prop_assert!(vetos >= 0);
            }

            #[test]
            fn normalize_roll_is_idempotent(raw in ".*") {
                let once = normalize_roll(&raw);
                prop_assert_eq!(normalize_roll(&once), once.clone());
            }

            #[test]
            fn name_key_is_ascii_lowercase(raw in ".*") {
                let key = normalize_name_key(&raw);
                prop_assert!(key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
            }
        }
    }
}
