//! Set semantics over embedded `Vec` collections.
//!
//! The aggregate keeps its collections as plain vectors so documents stay
//! ordered and readable; uniqueness is enforced by these helpers with an
//! explicit comparison function instead of normalizing stored values.

/// Returns `true` when any element matches `target` under `same`.
pub fn contains_by<T, Q: ?Sized>(items: &[T], target: &Q, same: impl Fn(&T, &Q) -> bool) -> bool {
    items.iter().any(|item| same(item, target))
}

/// Appends `item` unless an equivalent element is already present.
///
/// Returns `true` when the collection changed.
pub fn insert_unique_by<T>(items: &mut Vec<T>, item: T, same: impl Fn(&T, &T) -> bool) -> bool {
    if contains_by(items, &item, &same) {
        return false;
    }
    items.push(item);
    true
}

/// Removes every element matching `target` and returns how many were dropped.
pub fn remove_all_by<T, Q: ?Sized>(
    items: &mut Vec<T>,
    target: &Q,
    same: impl Fn(&T, &Q) -> bool,
) -> usize {
    let before = items.len();
    items.retain(|item| !same(item, target));
    before - items.len()
}

/// Case-insensitive string equality using Unicode lower-case folding.
///
/// Locale independent: the same pair always compares the same way.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_unique_is_idempotent() {
        let mut items = vec![1, 2];
        assert!(insert_unique_by(&mut items, 3, |a, b| a == b));
        assert!(!insert_unique_by(&mut items, 3, |a, b| a == b));
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_insert_keeps_first_casing() {
        let mut roles = vec!["Admin".to_string()];
        let inserted =
            insert_unique_by(&mut roles, "ADMIN".to_string(), |a, b| eq_ignore_case(a, b));

        assert!(!inserted);
        assert_eq!(roles, vec!["Admin".to_string()]);
    }

    #[test]
    fn test_remove_all_by_removes_every_match() {
        let mut items = vec!["a".to_string(), "A".to_string(), "b".to_string()];
        let removed = remove_all_by(&mut items, "a", |item: &String, target: &str| {
            eq_ignore_case(item, target)
        });

        assert_eq!(removed, 2);
        assert_eq!(items, vec!["b".to_string()]);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut items = vec![1, 2];
        assert_eq!(remove_all_by(&mut items, &5, |a, b| a == b), 0);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_eq_ignore_case() {
        assert!(eq_ignore_case("Admin", "aDMIN"));
        assert!(eq_ignore_case("ÉDITEUR", "éditeur"));
        assert!(!eq_ignore_case("admin", "admins"));
        assert!(eq_ignore_case("", ""));
    }
}
