//! Default exercise catalog.
//!
//! This module provides the built-in exercises a timer run can be labelled
//! with, plus the lookups the exercise picker needs.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

#[allow(clippy::too_many_arguments)]
fn exercise(
    id: &str,
    name: &str,
    group: &str,
    icon_key: &str,
    category: ExerciseCategory,
    description: &str,
    muscles: &[&str],
    difficulty: Difficulty,
    equipment: &str,
) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        group: group.into(),
        icon_key: icon_key.into(),
        category,
        description: description.into(),
        muscles: muscles.iter().map(|m| (*m).into()).collect(),
        difficulty,
        equipment: equipment.into(),
    }
}

/// Builds the default catalog with the built-in exercises
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference.
pub fn build_default_catalog() -> Catalog {
    use Difficulty::*;
    use ExerciseCategory::*;

    let exercises = vec![
        // ====================================================================
        // Compound lifts
        // ====================================================================
        exercise(
            "squat",
            "Squat",
            "Legs",
            "dumbbell",
            Multiarticular,
            "Foundational lift for leg and glute strength",
            &["Quadriceps", "Glutes", "Hamstrings"],
            Intermediate,
            "Barbell or dumbbells",
        ),
        exercise(
            "bench_press",
            "Bench Press",
            "Chest",
            "dumbbell",
            Multiarticular,
            "Primary builder for chest, shoulders and triceps",
            &["Pectorals", "Front deltoids", "Triceps"],
            Intermediate,
            "Barbell or dumbbells",
        ),
        exercise(
            "deadlift",
            "Deadlift",
            "Back",
            "dumbbell",
            Multiarticular,
            "Full posterior-chain lift for functional strength",
            &["Lower back", "Glutes", "Hamstrings", "Trapezius"],
            Advanced,
            "Barbell",
        ),
        exercise(
            "pull_ups",
            "Pull-ups",
            "Back",
            "dumbbell",
            Multiarticular,
            "Bodyweight pull for back and biceps",
            &["Lats", "Biceps", "Rear deltoids"],
            Advanced,
            "Pull-up bar",
        ),
        exercise(
            "military_press",
            "Military Press",
            "Shoulders",
            "dumbbell",
            Multiarticular,
            "Overhead press for shoulders and core stability",
            &["Deltoids", "Triceps", "Core"],
            Intermediate,
            "Barbell or dumbbells",
        ),
        // ====================================================================
        // Isolation
        // ====================================================================
        exercise(
            "barbell_curl",
            "Barbell Curl",
            "Biceps",
            "dumbbell",
            Isolation,
            "Direct biceps isolation",
            &["Biceps brachii"],
            Beginner,
            "Barbell or dumbbells",
        ),
        exercise(
            "tricep_extension",
            "Triceps Extension",
            "Triceps",
            "dumbbell",
            Isolation,
            "Direct triceps isolation",
            &["Triceps brachii"],
            Beginner,
            "Dumbbells or cable",
        ),
        exercise(
            "leg_extension",
            "Leg Extension",
            "Legs",
            "dumbbell",
            Isolation,
            "Quadriceps isolation",
            &["Quadriceps"],
            Beginner,
            "Machine or dumbbells",
        ),
        // ====================================================================
        // Cardio
        // ====================================================================
        exercise(
            "treadmill",
            "Treadmill",
            "Cardio",
            "running",
            Cardio,
            "Low-impact cardio for warm-ups or recovery",
            &["Quadriceps", "Glutes", "Calves"],
            Beginner,
            "Treadmill",
        ),
        exercise(
            "rowing",
            "Rowing",
            "Cardio",
            "rowing",
            Cardio,
            "Whole-body cardio",
            &["Back", "Legs", "Arms", "Core"],
            Intermediate,
            "Rowing machine",
        ),
        exercise(
            "bike",
            "Stationary Bike",
            "Cardio",
            "bike",
            Cardio,
            "Low-impact cardio for legs and conditioning",
            &["Quadriceps", "Glutes", "Calves"],
            Beginner,
            "Stationary bike",
        ),
        // ====================================================================
        // Core
        // ====================================================================
        exercise(
            "plank",
            "Plank",
            "Core",
            "yoga",
            Core,
            "Isometric hold for core strength",
            &["Rectus abdominis", "Transverse abdominis", "Obliques"],
            Intermediate,
            "Bodyweight only",
        ),
        exercise(
            "crunch",
            "Crunch",
            "Core",
            "yoga",
            Core,
            "Basic rectus abdominis exercise",
            &["Rectus abdominis"],
            Beginner,
            "Bodyweight only",
        ),
        // ====================================================================
        // Flexibility
        // ====================================================================
        exercise(
            "hamstring_stretch",
            "Hamstring Stretch",
            "Flexibility",
            "stretching",
            Flexibility,
            "Essential stretch for leg flexibility",
            &["Hamstrings", "Glutes"],
            Beginner,
            "Bodyweight only",
        ),
    ];

    Catalog { exercises }
}

fn sorted_by_name(mut exercises: Vec<&Exercise>) -> Vec<&Exercise> {
    exercises.sort_by(|a, b| a.name.cmp(&b.name));
    exercises
}

impl Catalog {
    /// All exercises, ordered by group then name
    pub fn get_all(&self) -> Vec<&Exercise> {
        let mut all: Vec<&Exercise> = self.exercises.iter().collect();
        all.sort_by(|a, b| a.group.cmp(&b.group).then_with(|| a.name.cmp(&b.name)));
        all
    }

    pub fn by_id(&self, id: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    /// Exercises in one muscle group, ordered by name
    pub fn by_group(&self, group: &str) -> Vec<&Exercise> {
        sorted_by_name(self.exercises.iter().filter(|e| e.group == group).collect())
    }

    /// Exercises in one category, ordered by name
    pub fn by_category(&self, category: ExerciseCategory) -> Vec<&Exercise> {
        sorted_by_name(
            self.exercises
                .iter()
                .filter(|e| e.category == category)
                .collect(),
        )
    }

    /// Case-insensitive search over name, group and description, optionally
    /// restricted to one category. An empty query matches everything.
    pub fn search(&self, query: &str, category: Option<ExerciseCategory>) -> Vec<&Exercise> {
        let needle = query.trim().to_lowercase();
        self.get_all()
            .into_iter()
            .filter(|e| {
                needle.is_empty()
                    || e.name.to_lowercase().contains(&needle)
                    || e.group.to_lowercase().contains(&needle)
                    || e.description.to_lowercase().contains(&needle)
            })
            .filter(|e| category.map_or(true, |c| e.category == c))
            .collect()
    }

    /// Validate the catalog for internal consistency
    ///
    /// Returns a list of validation errors, or empty vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for exercise in &self.exercises {
            if !seen.insert(exercise.id.as_str()) {
                errors.push(format!("Duplicate exercise id '{}'", exercise.id));
            }
            if exercise.name.trim().is_empty() {
                errors.push(format!("Exercise '{}' has an empty name", exercise.id));
            }
        }

        errors
    }
}
