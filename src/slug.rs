//! Slug generation and label cleanup.

/// Turn a human-readable label into a slug.
///
/// Lowercases, drops apostrophes, replaces every run of other
/// non-alphanumeric characters with a single `-`, and trims dashes.
///
/// # Examples
///
/// ```rust
/// use zzmod::slug::sluggify;
///
/// assert_eq!(sluggify("Effect: Inspire Courage"), "effect-inspire-courage");
/// assert_eq!(sluggify("Giant's Stature (Medium)"), "giants-stature-medium");
/// assert_eq!(sluggify("  --Bless--  "), "bless");
/// ```
pub fn sluggify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars().filter(|c| !matches!(c, '\'' | '\u{2019}')) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Strip a leading `"Category: "` title and a trailing `" (suffix)"`.
///
/// The prefix is everything up to and including the first colon, plus the
/// whitespace after it, when at least one character precedes the colon.
/// The suffix is a final parenthesized group with non-empty contents,
/// plus the whitespace before it.
///
/// # Examples
///
/// ```rust
/// use zzmod::slug::strip_label;
///
/// assert_eq!(strip_label("Effect: Heroism"), "Heroism");
/// assert_eq!(strip_label("Spell Effect: Bless (Level 3)"), "Bless");
/// assert_eq!(strip_label("Shield"), "Shield");
/// assert_eq!(strip_label("Stance ()"), "Stance ()");
/// ```
pub fn strip_label(label: &str) -> &str {
    let without_prefix = match label.find(':') {
        Some(idx) if idx > 0 => label[idx + 1..].trim_start(),
        _ => label,
    };
    strip_parenthetical_suffix(without_prefix)
}

fn strip_parenthetical_suffix(label: &str) -> &str {
    let Some(inner) = label.strip_suffix(')') else {
        return label;
    };
    // The group may not contain another ')', so search after the last one.
    let search_from = inner.rfind(')').map_or(0, |idx| idx + 1);
    let Some(open) = inner[search_from..].find('(').map(|idx| idx + search_from) else {
        return label;
    };
    if open + 1 == inner.len() {
        return label;
    }
    label[..open].trim_end()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sluggify_basic() {
        assert_eq!(sluggify("Shield"), "shield");
        assert_eq!(sluggify("Clumsy 2"), "clumsy-2");
        assert_eq!(sluggify("Rage!"), "rage");
        assert_eq!(sluggify("Mage  Armor"), "mage-armor");
    }

    #[test]
    fn test_sluggify_apostrophes() {
        assert_eq!(sluggify("Hunter's Edge"), "hunters-edge");
        assert_eq!(sluggify("Hunter\u{2019}s Edge"), "hunters-edge");
    }

    #[test]
    fn test_sluggify_empty() {
        assert_eq!(sluggify(""), "");
        assert_eq!(sluggify("---"), "");
    }

    #[test]
    fn test_strip_label_prefix() {
        assert_eq!(strip_label("Effect: Rage"), "Rage");
        assert_eq!(strip_label("Effect:Rage"), "Rage");
        assert_eq!(strip_label(": Rage"), ": Rage");
        assert_eq!(strip_label("Aura: Effect: Rage"), "Effect: Rage");
    }

    #[test]
    fn test_strip_label_suffix() {
        assert_eq!(strip_label("Rage (Animal)"), "Rage");
        assert_eq!(strip_label("Rage(Animal)"), "Rage");
        assert_eq!(strip_label("Rage (a) (b)"), "Rage (a)");
        assert_eq!(strip_label("Rage (a (b)"), "Rage");
        assert_eq!(strip_label("Rage (Animal) x"), "Rage (Animal) x");
    }

    #[test]
    fn test_strip_label_prefix_consumes_parenthesis() {
        // prefix removal happens first and can eat the opening parenthesis
        assert_eq!(strip_label("Rage (a: b)"), "b)");
    }
}
