// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![expect(clippy::unwrap_used, reason = "example code")]

//! This example loads clock definitions from JSON and registers them.

use lazy_clock::{ClockConfig, ClockRegistry, ClockSignal};
use sim_tick::Kernel;

const CLOCKS: &str = r#"{
    "cpu": {
        "period": { "secs": 0, "nanos": 1000 },
        "duty": 0.5
    },
    "uart": {
        "period": { "secs": 0, "nanos": 8680 },
        "offset": { "secs": 0, "nanos": 500 },
        "first_edge": "negative",
        "time_shift": "PT0.000000250S",
        "reset_policy": "clear_history"
    }
}"#;

fn main() {
    let configs: std::collections::BTreeMap<String, ClockConfig> = serde_json::from_str(CLOCKS).unwrap();

    let kernel = Kernel::new();
    let registry = ClockRegistry::new(&kernel);

    for (name, config) in configs {
        let clock = registry.global(&name, config).unwrap();
        println!(
            "{name}: period {:?}, rising at {:?}, falling at {:?}, shift {}",
            clock.period(),
            clock.posedge_offset(),
            clock.negedge_offset(),
            clock.time_shift(),
        );
    }

    // Serialize the live configuration back, including any runtime changes.
    let cpu = registry.lookup("cpu").unwrap();
    cpu.set_duty_cycle(0.25).unwrap();
    println!("{}", serde_json::to_string_pretty(&cpu.config()).unwrap());
}
