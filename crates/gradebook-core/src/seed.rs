//! Demonstration data for a first run.

use crate::registry::{AssessmentRegistry, NewQuestion};

/// Fill an empty registry with three students and two short tests.
pub(crate) fn populate(registry: &mut AssessmentRegistry) {
    let students = [
        ("Alexei Ivanov", "Group 101", "ivanov@edu.example"),
        ("Maria Petrova", "Group 101", "petrova@edu.example"),
        ("Dmitri Sidorov", "Group 102", "sidorov@edu.example"),
    ];
    for (name, group, email) in students {
        if let Err(e) = registry.add_student(name, group, email) {
            tracing::warn!("skipping demo student {name}: {e}");
        }
    }

    let tests = (
        registry.add_test("Mathematics - basic level", "Mathematics", 45),
        registry.add_test("Programming fundamentals", "Computer science", 60),
    );
    let (Ok(math), Ok(programming)) = tests else {
        tracing::warn!("skipping demo tests: no test ids left");
        return;
    };

    let questions = [
        (
            math,
            NewQuestion::single_choice("What is 2 + 2 * 2?", ["6", "8", "10"], ["6"]),
        ),
        (
            math,
            NewQuestion::multiple_choice(
                "Which of these numbers are prime?",
                ["2", "4", "7", "9", "11"],
                ["2", "7", "11"],
            ),
        ),
        (
            math,
            NewQuestion::free_text("State the Pythagorean theorem").with_points(3.0),
        ),
        (
            programming,
            NewQuestion::single_choice(
                "What is a variable in programming?",
                ["A named place in memory that holds data", "A data type", "A function"],
                ["A named place in memory that holds data"],
            ),
        ),
        (
            programming,
            NewQuestion::multiple_choice(
                "Which of these languages are object-oriented?",
                ["Python", "C++", "Java", "HTML"],
                ["Python", "C++", "Java"],
            ),
        ),
    ];

    for (test_id, question) in questions {
        if let Err(e) = registry.add_question_to_test(test_id, question) {
            tracing::warn!("skipping demo question: {e}");
        }
    }

    tracing::info!("seeded demonstration data");
}
