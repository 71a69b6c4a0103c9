// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::config::{feature_map_from_prefixes, CutoffRule, DataRange, GuardConfig};

/// Production configuration tables for the die-casting line.
///
/// Cut-offs come from the process engineers; data ranges from the historical
/// sensor extremes; good-sample means from the empirical average of passing
/// parts; step sizes are 15% of each variable's standard deviation.
pub fn die_casting_defaults() -> GuardConfig {
    let mut config = GuardConfig::default();

    let cutoffs: [(&str, CutoffRule); 10] = [
        ("low_section_speed", CutoffRule::band(100.0, 114.0)),
        ("high_section_speed", CutoffRule::low(100.0)),
        ("coolant_temp", CutoffRule::low(20.0)),
        ("biscuit_thickness", CutoffRule::band(42.0, 56.0)),
        ("sleeve_temperature", CutoffRule::low(128.0)),
        ("cast_pressure", CutoffRule::low(314.0)),
        ("upper_mold_temp1", CutoffRule::low(103.0)),
        ("upper_mold_temp2", CutoffRule::low(80.0)),
        ("lower_mold_temp1", CutoffRule::low(92.0)),
        ("lower_mold_temp2", CutoffRule::low(71.0)),
    ];
    for (variable, rule) in cutoffs {
        config.cutoffs.insert(variable.to_string(), rule);
    }

    let ranges: [(&str, f64, f64); 15] = [
        ("production_cycletime", 60.0, 500.0),
        ("facility_operation_cycleTime", 60.0, 500.0),
        ("molten_volume", -1.0, 600.0),
        ("molten_temp", 70.0, 750.0),
        ("sleeve_temperature", 20.0, 1000.0),
        ("cast_pressure", 40.0, 370.0),
        ("biscuit_thickness", 0.0, 450.0),
        ("low_section_speed", 0.0, 200.0),
        ("high_section_speed", 0.0, 400.0),
        ("physical_strength", 0.0, 750.0),
        ("upper_mold_temp1", 10.0, 400.0),
        ("upper_mold_temp2", 10.0, 250.0),
        ("lower_mold_temp1", 10.0, 400.0),
        ("lower_mold_temp2", 10.0, 550.0),
        ("coolant_temp", 10.0, 50.0),
    ];
    for (variable, min, max) in ranges {
        config
            .data_ranges
            .insert(variable.to_string(), DataRange::new(min, max));
    }

    let good_means: [(&str, f64); 15] = [
        ("production_cycletime", 122.7),
        ("facility_operation_cycleTime", 121.3),
        ("molten_volume", 88.9),
        ("molten_temp", 720.2),
        ("sleeve_temperature", 446.5),
        ("cast_pressure", 328.5),
        ("biscuit_thickness", 49.9),
        ("low_section_speed", 110.0),
        ("high_section_speed", 112.7),
        ("physical_strength", 701.9),
        ("upper_mold_temp1", 184.9),
        ("upper_mold_temp2", 163.3),
        ("lower_mold_temp1", 202.5),
        ("lower_mold_temp2", 196.3),
        ("coolant_temp", 32.5),
    ];
    for (variable, mean) in good_means {
        config.good_means.insert(variable.to_string(), mean);
    }

    let steps: [(&str, f64); 15] = [
        ("production_cycletime", 2.1),
        ("facility_operation_cycleTime", 1.8),
        ("molten_volume", 5.6),
        ("molten_temp", 2.1),
        ("sleeve_temperature", 14.5),
        ("cast_pressure", 5.4),
        ("biscuit_thickness", 3.8),
        ("low_section_speed", 1.9),
        ("high_section_speed", 2.3),
        ("physical_strength", 5.4),
        ("upper_mold_temp1", 7.3),
        ("upper_mold_temp2", 4.1),
        ("lower_mold_temp1", 8.3),
        ("lower_mold_temp2", 6.7),
        ("coolant_temp", 0.4),
    ];
    for (variable, step) in steps {
        config.adjustment_steps.insert(variable.to_string(), step);
    }

    let process_vars: [(&str, &[&str]); 5] = [
        ("molten", &["num__molten_temp", "num__molten_volume"]),
        (
            "slurry",
            &["num__sleeve_temperature", "num__EMS_operation_time"],
        ),
        (
            "injection",
            &[
                "num__cast_pressure",
                "num__low_section_speed",
                "num__high_section_speed",
                "num__biscuit_thickness",
            ],
        ),
        (
            "solidify",
            &[
                "num__upper_mold_temp1",
                "num__upper_mold_temp2",
                "num__lower_mold_temp1",
                "num__lower_mold_temp2",
                "num__coolant_temp",
            ],
        ),
        (
            "overall",
            &[
                "num__facility_operation_cycleTime",
                "num__production_cycletime",
                "num__count",
                "cat__working_active",
                "cat__working_stopped",
                "cat__tryshot_signal_A",
                "cat__tryshot_signal_D",
            ],
        ),
    ];
    let mut encoded_columns = Vec::new();
    for (process, variables) in process_vars {
        let variables: Vec<String> = variables.iter().map(|v| v.to_string()).collect();
        encoded_columns.extend(variables.iter().cloned());
        config.process_vars.insert(process.to_string(), variables);
    }
    // Ranged variables outside any process group still need a mapping for
    // attribution lookups.
    for variable in config.data_ranges.keys() {
        let encoded = format!("num__{variable}");
        if !encoded_columns.contains(&encoded) {
            encoded_columns.push(encoded);
        }
    }
    config.feature_map =
        feature_map_from_prefixes(encoded_columns.iter().map(String::as_str));

    let display_names: [(&str, &str); 16] = [
        ("production_cycletime", "Production cycle time"),
        ("facility_operation_cycleTime", "Facility operation cycle time"),
        ("molten_volume", "Molten metal volume"),
        ("molten_temp", "Molten metal temperature"),
        ("sleeve_temperature", "Sleeve temperature"),
        ("cast_pressure", "Casting pressure"),
        ("biscuit_thickness", "Biscuit thickness"),
        ("low_section_speed", "Low-section speed"),
        ("high_section_speed", "High-section speed"),
        ("physical_strength", "Physical strength"),
        ("upper_mold_temp1", "Upper mold temperature 1"),
        ("upper_mold_temp2", "Upper mold temperature 2"),
        ("lower_mold_temp1", "Lower mold temperature 1"),
        ("lower_mold_temp2", "Lower mold temperature 2"),
        ("coolant_temp", "Coolant temperature"),
        ("EMS_operation_time", "EMS operation time"),
    ];
    for (variable, pretty) in display_names {
        config
            .display_names
            .insert(variable.to_string(), pretty.to_string());
    }

    config
}
