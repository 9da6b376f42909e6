#![no_main]

use eggtimer::config::TimerConfig;
use eggtimer::definition::{RegexDefinition, SegmentDefinition};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Config parsing must reject bad input without panicking
        let _ = TimerConfig::from_toml_str(input);

        // Any line must be safe to match; a tag is always a slice of the line
        let def = RegexDefinition::new("F", r"^start (\S+)", r"^finish (\S+)")
            .expect("static patterns compile");
        for line in input.lines() {
            if let Some(tag) = def.is_start(line).or_else(|| def.is_finish(line)) {
                assert!(!tag.is_empty());
                assert!(line.contains(tag));
            }
        }
    }
});
