//! Canned chatbox messages.
//!
//! Each preset is a template rendered in [`Mode::Templated`](super::Mode).

/// A named template that can be loaded into the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub template: &'static str,
}

pub const PRESETS: [Preset; 4] = [
    Preset {
        name: "stats-high",
        template: "GPU [RTX 4090]: {{ pad(random(), 2) }}%, Temp: {{ pad(random(), 2) }}°C\n\
                   CPU [Ryzen Threadripper Pro 7995wx]: {{ pad(random(), 2) }}%, Temp: {{ pad(random(), 2) }}°C\n\
                   RAM [Corsair 128Go]: {{ pad(random(), 2) }}%",
    },
    Preset {
        name: "stats-low",
        template: "GPU [Intel UHD Graphics]: {{ pad(random(), 2) }}%, Temp: {{ pad(random(), 2) }}°C\n\
                   CPU [Intel Celeron n4120]: {{ pad(random(), 2) }}%, Temp: {{ pad(random(), 2) }}°C\n\
                   RAM [Samsung 512Mo]: {{ pad(random(), 2) }}%",
    },
    Preset {
        name: "clock",
        template: "⌛ {{ zpad(hour(), 2) }}:{{ zpad(minute(), 2) }} ⌛",
    },
    Preset {
        name: "heartbeat",
        template: "♥ {{ pad(random(20, 500), 3) }} BPM ♥",
    },
];

/// Look up a preset by its 1-based number.
pub fn by_number(number: usize) -> Option<&'static Preset> {
    number.checked_sub(1).and_then(|index| PRESETS.get(index))
}
