//! The persisted set of `(course, grade)` pairs a poll cycle diffs against.

use crate::types::NO_GRADE;
use std::collections::BTreeSet;

/// The full set of known `(course name, grade)` pairs as of the last
/// successful poll. Ordered, so diffs iterate in ascending course-name
/// order and notification slots are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeSnapshot {
    entries: BTreeSet<(String, String)>,
}

impl GradeSnapshot {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            entries: pairs.into_iter().collect(),
        }
    }

    /// Decodes the stored line format: one `"course: grade"` per line.
    /// Blank lines are skipped; a line without the separator is treated as
    /// an ungraded course.
    pub fn decode(raw: &str) -> Self {
        let entries = raw
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| match line.split_once(": ") {
                Some((course, grade)) => (course.to_string(), grade.to_string()),
                None => (line.to_string(), NO_GRADE.to_string()),
            })
            .collect();
        Self { entries }
    }

    pub fn encode(&self) -> String {
        let lines: Vec<String> = self
            .entries
            .iter()
            .map(|(course, grade)| format!("{course}: {grade}"))
            .collect();
        lines.join("\n")
    }

    /// Pairs present in `self` but not in `other`, ascending by course name.
    pub fn difference<'a>(&'a self, other: &'a GradeSnapshot) -> Vec<&'a (String, String)> {
        self.entries.difference(&other.entries).collect()
    }

    /// Whether any pair (graded or not) carries this course name.
    pub fn contains_course(&self, name: &str) -> bool {
        self.entries.iter().any(|(course, _)| course == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> GradeSnapshot {
        GradeSnapshot::from_pairs(
            raw.iter()
                .map(|(c, g)| (c.to_string(), g.to_string())),
        )
    }

    #[test]
    fn encode_decode_preserves_pairs() {
        let snapshot = pairs(&[("Math", "85"), ("Physics", NO_GRADE)]);
        let decoded = GradeSnapshot::decode(&snapshot.encode());
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn decode_skips_blank_lines_and_tolerates_odd_grades() {
        let decoded = GradeSnapshot::decode("Math: 85\n\nSeminar: Pass: with honors\n");
        assert_eq!(decoded.len(), 2);
        // Only the first separator splits, so the grade keeps its colon.
        assert!(decoded
            .iter()
            .any(|(c, g)| c == "Seminar" && g == "Pass: with honors"));
    }

    #[test]
    fn decode_without_separator_falls_back_to_ungraded() {
        let decoded = GradeSnapshot::decode("Orphan line");
        assert!(decoded.contains_course("Orphan line"));
        assert!(decoded.iter().all(|(_, g)| g == NO_GRADE));
    }

    #[test]
    fn difference_is_ascending_by_course() {
        let new = pairs(&[("Zoology", "70"), ("Algebra", "90"), ("Math", "85")]);
        let old = pairs(&[("Math", "85")]);
        let diff: Vec<&str> = new
            .difference(&old)
            .iter()
            .map(|(c, _)| c.as_str())
            .collect();
        assert_eq!(diff, vec!["Algebra", "Zoology"]);
    }

    #[test]
    fn contains_course_ignores_grade() {
        let snapshot = pairs(&[("Math", NO_GRADE)]);
        assert!(snapshot.contains_course("Math"));
        assert!(!snapshot.contains_course("Physics"));
    }
}
