use crate::field::Field;

/// Comparison operators a [`Predicate`] can apply between a tuple's field
/// and a constant.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Op {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEq,
    LessThan,
    LessThanOrEq,
    /// SQL-style wildcard match against a string field: `%` matches any
    /// run of characters, `_` matches exactly one.
    Like,
}

/// A single-field filter condition: `tuple[field_index] <op> constant`.
#[derive(Clone, Debug)]
pub struct Predicate {
    field_index: usize,
    op: Op,
    constant: Field,
}

impl Predicate {
    pub fn new(field_index: usize, op: Op, constant: Field) -> Predicate {
        Predicate {
            field_index,
            op,
            constant,
        }
    }

    pub fn field_index(&self) -> usize {
        self.field_index
    }

    pub fn filter(&self, field: &Field) -> bool {
        if self.op == Op::Like {
            return match (field, &self.constant) {
                (Field::Str(value), Field::Str(pattern)) => like_match(value, pattern),
                _ => false,
            };
        }

        match self.op {
            Op::Equals => field == &self.constant,
            Op::NotEquals => field != &self.constant,
            Op::GreaterThan => field.partial_cmp(&self.constant) == Some(std::cmp::Ordering::Greater),
            Op::GreaterThanOrEq => matches!(
                field.partial_cmp(&self.constant),
                Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
            ),
            Op::LessThan => field.partial_cmp(&self.constant) == Some(std::cmp::Ordering::Less),
            Op::LessThanOrEq => matches!(
                field.partial_cmp(&self.constant),
                Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
            ),
            Op::Like => unreachable!(),
        }
    }
}

/// Anchored `%`/`_` wildcard match, case-sensitive.
fn like_match(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    like_match_from(&value, &pattern)
}

fn like_match_from(value: &[char], pattern: &[char]) -> bool {
    match pattern.first() {
        None => value.is_empty(),
        Some('%') => {
            (0..=value.len()).any(|i| like_match_from(&value[i..], &pattern[1..]))
        }
        Some('_') => !value.is_empty() && like_match_from(&value[1..], &pattern[1..]),
        Some(c) => !value.is_empty() && value[0] == *c && like_match_from(&value[1..], &pattern[1..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equals_matches_same_value() {
        let p = Predicate::new(0, Op::Equals, Field::Int(4));
        assert!(p.filter(&Field::Int(4)));
        assert!(!p.filter(&Field::Int(5)));
    }

    #[test]
    fn ordering_operators_compare_ints() {
        let gt = Predicate::new(0, Op::GreaterThan, Field::Int(4));
        assert!(gt.filter(&Field::Int(5)));
        assert!(!gt.filter(&Field::Int(4)));

        let lte = Predicate::new(0, Op::LessThanOrEq, Field::Int(4));
        assert!(lte.filter(&Field::Int(4)));
        assert!(lte.filter(&Field::Int(3)));
        assert!(!lte.filter(&Field::Int(5)));
    }

    #[test]
    fn like_wildcard_percent_and_underscore() {
        let p = Predicate::new(0, Op::Like, Field::Str("a%c_".to_string()));
        assert!(p.filter(&Field::Str("abcd".to_string())));
        assert!(!p.filter(&Field::Str("abc".to_string())));
    }

    #[test]
    fn like_on_non_string_field_never_matches() {
        let p = Predicate::new(0, Op::Like, Field::Str("%".to_string()));
        assert!(!p.filter(&Field::Int(1)));
    }
}
