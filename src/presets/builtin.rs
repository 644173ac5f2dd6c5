//! Built-in preset library.
//!
//! Built-ins are compiled in, never mutated, and keep this declaration order
//! in the catalog. Users can hide them but not delete them.

use super::Preset;
use crate::types::DurationSet;

struct Builtin {
    name: &'static str,
    label: &'static str,
    durations: DurationSet,
    repeat_minutes: u32,
}

const fn builtin(name: &'static str, label: &'static str, durations: DurationSet) -> Builtin {
    Builtin {
        name,
        label,
        durations,
        repeat_minutes: 5,
    }
}

const BUILTINS: [Builtin; 10] = [
    builtin("box_4_4_4_4", "Box 4-4-4-4", DurationSet::new(4, 4, 4, 4)),
    builtin("relax_4_7_8", "Relax 4-7-8", DurationSet::new(4, 7, 8, 0)),
    builtin("coherent_5_5", "Coherent 5-5", DurationSet::new(5, 0, 5, 0)),
    builtin("resonant_6_6", "Resonant 6-6", DurationSet::new(6, 0, 6, 0)),
    builtin("equal_4_4", "Equal 4-4", DurationSet::new(4, 0, 4, 0)),
    builtin("pursed_2_4", "Pursed-lip 2-4", DurationSet::new(2, 0, 4, 0)),
    builtin("extended_4_6", "Extended exhale 4-6", DurationSet::new(4, 0, 6, 0)),
    builtin("extended_4_8", "Extended exhale 4-8", DurationSet::new(4, 0, 8, 0)),
    builtin("triangle_3_3_3", "Triangle 3-3-3", DurationSet::new(3, 3, 3, 0)),
    builtin("calm_4_4_6_2", "Calm 4-4-6-2", DurationSet::new(4, 4, 6, 2)),
];

/// The built-in presets in declaration order.
pub fn builtin_presets() -> Vec<Preset> {
    BUILTINS
        .iter()
        .map(|b| Preset {
            name: b.name.to_string(),
            label: b.label.to_string(),
            durations: b.durations,
            repeat_minutes: b.repeat_minutes,
            is_custom: false,
        })
        .collect()
}

/// True if `name` identifies a built-in preset.
pub fn is_builtin_name(name: &str) -> bool {
    BUILTINS.iter().any(|b| b.name == name)
}
