//! Hierarchical section numbers ("1", "1.2", "1.2.3").

/// Three-level heading counter. The table of contents and the body each
/// run their own instance over the same heading sequence, so both produce
/// identical numbers.
#[derive(Debug, Clone, Default)]
pub(crate) struct SectionCounter {
    counters: [u32; 3],
}

impl SectionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance for a heading of `level` and return its number.
    ///
    /// Levels deeper than 3 share the third counter. A level-3 heading
    /// directly under a level-1 heading keeps a zero middle component
    /// ("1.0.1").
    pub fn next(&mut self, level: u8) -> String {
        let [c1, c2, c3] = &mut self.counters;
        match level {
            0 | 1 => {
                *c1 += 1;
                *c2 = 0;
                *c3 = 0;
                format!("{c1}")
            }
            2 => {
                *c2 += 1;
                *c3 = 0;
                format!("{c1}.{c2}")
            }
            _ => {
                *c3 += 1;
                format!("{c1}.{c2}.{c3}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number_all(levels: &[u8]) -> Vec<String> {
        let mut counter = SectionCounter::new();
        levels.iter().map(|&l| counter.next(l)).collect()
    }

    #[test]
    fn nested_numbering() {
        assert_eq!(
            number_all(&[1, 2, 2, 1, 3]),
            vec!["1", "1.1", "1.2", "2", "2.0.1"]
        );
    }

    #[test]
    fn deep_levels_share_third_counter() {
        assert_eq!(
            number_all(&[1, 2, 3, 4, 5, 2, 6]),
            vec!["1", "1.1", "1.1.1", "1.1.2", "1.1.3", "1.2", "1.2.1"]
        );
    }

    #[test]
    fn leading_subsection_starts_from_zero() {
        assert_eq!(number_all(&[2, 3]), vec!["0.1", "0.1.1"]);
    }
}
