//! Glass scenarios, one suite per concern

pub mod blending;
pub mod mask;

use crate::runner::TestSuite;

/// Create all test suites
pub fn all_suites() -> Vec<TestSuite> {
    vec![
        shapes::suite(),
        blending::suite(),
        glass::suite(),
        mask::suite(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_case_names_are_unique() {
        let mut seen = HashSet::new();
        for suite in all_suites() {
            assert!(!suite.cases.is_empty(), "suite {} is empty", suite.name);
            for name in suite.qualified_names() {
                assert!(seen.insert(name.clone()), "duplicate case {}", name);
            }
        }
    }
}
