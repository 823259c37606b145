//! Catalogue classification rules.
//!
//! The catalogue's top-level grouping is closed: a program is either the
//! reserved literal or starts with one of a fixed set of tier prefixes.
//! Everything after the prefix is deliberately unconstrained, and the
//! `semester`/`subject` grouping keys are opaque strings (no case folding,
//! no trimming beyond presence checks).

use crate::constants::{PROGRAM_TIER_PREFIXES, RESERVED_PROGRAM};
use crate::error::AppError;

/// Whether a program value is accepted by the catalogue.
///
/// Accepts the reserved literal (case-insensitive) or any value beginning
/// with one of the tier prefixes (case-insensitive prefix match).
pub fn is_valid_program(program: &str) -> bool {
    if program.eq_ignore_ascii_case(RESERVED_PROGRAM) {
        return true;
    }
    PROGRAM_TIER_PREFIXES.iter().any(|prefix| {
        program
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

/// Validated grouping keys for one catalogued file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub program: String,
    pub semester: String,
    pub subject: String,
}

impl Classification {
    /// Validate presence and the program predicate. Values are stored as
    /// given; the catalogue performs no further normalization.
    pub fn new(
        program: impl Into<String>,
        semester: impl Into<String>,
        subject: impl Into<String>,
    ) -> Result<Self, AppError> {
        let program = program.into();
        let semester = semester.into();
        let subject = subject.into();

        if program.trim().is_empty() || semester.trim().is_empty() || subject.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Missing required field: program, semester and subject are all required"
                    .to_string(),
            ));
        }

        if !is_valid_program(&program) {
            return Err(AppError::InvalidInput(format!(
                "Program must start with 'Diploma' or 'Bachelors', or be 'Basics' (got '{}')",
                program
            )));
        }

        Ok(Classification {
            program,
            semester,
            subject,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_literal_accepted_case_insensitively() {
        assert!(is_valid_program("basics"));
        assert!(is_valid_program("Basics"));
        assert!(is_valid_program("BASICS"));
    }

    #[test]
    fn test_tier_prefixes_accepted() {
        assert!(is_valid_program("Diploma in ICT"));
        assert!(is_valid_program("diploma in agriculture"));
        assert!(is_valid_program("Bachelors of Science"));
        assert!(is_valid_program("BACHELORS"));
    }

    #[test]
    fn test_predicate_is_permissive_after_the_prefix() {
        assert!(is_valid_program("DiplomaXYZ-2024 (evening)"));
        assert!(is_valid_program("Bachelors"));
    }

    #[test]
    fn test_other_programs_rejected() {
        assert!(!is_valid_program("Masters of Science"));
        assert!(!is_valid_program("Invalid"));
        assert!(!is_valid_program("basic"));
        assert!(!is_valid_program(""));
        // Reserved literal is an exact match, not a prefix
        assert!(!is_valid_program("basics101"));
    }

    #[test]
    fn test_classification_requires_all_fields() {
        assert!(Classification::new("Basics", "", "Math").is_err());
        assert!(Classification::new("", "1", "Math").is_err());
        assert!(Classification::new("Basics", "1", "   ").is_err());
        assert!(Classification::new("Basics", "1", "Math").is_ok());
    }

    #[test]
    fn test_classification_keeps_values_verbatim() {
        let class = Classification::new("Diploma in ICT", "Sem 2", "Data Structures").unwrap();
        assert_eq!(class.program, "Diploma in ICT");
        assert_eq!(class.semester, "Sem 2");
        assert_eq!(class.subject, "Data Structures");
    }

    #[test]
    fn test_invalid_program_reports_invalid_input() {
        let err = Classification::new("Masters", "1", "Math").unwrap_err();
        match err {
            AppError::InvalidInput(msg) => assert!(msg.contains("Masters")),
            _ => panic!("Expected InvalidInput"),
        }
    }
}
