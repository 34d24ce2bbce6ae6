//! Message rendering.
//!
//! Turns the raw buffer content into the text that goes on the wire,
//! according to the buffer's mode. Rendering is pure apart from the
//! randomness and clock handed in through [`Facilities`].

pub mod presets;
pub mod template;

use chrono::{DateTime, FixedOffset, Local};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

pub use template::TemplateError;

/// Rendering strategies selectable through the buffer's mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Send the content verbatim.
    Passthrough,
    /// Evaluate `{{ ... }}` expressions in the content.
    Templated,
}

impl Mode {
    pub fn code(self) -> i32 {
        match self {
            Mode::Passthrough => 0,
            Mode::Templated => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Passthrough => "passthrough",
            Mode::Templated => "template",
        }
    }
}

impl TryFrom<i32> for Mode {
    type Error = RenderError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::Passthrough),
            1 => Ok(Mode::Templated),
            other => Err(RenderError::UnknownMode(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("message is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("unknown mode {0}")]
    UnknownMode(i32),
}

/// Wall-clock source available to templates.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Local system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// The only sources of non-determinism a template can reach.
pub struct Facilities {
    rng: StdRng,
    clock: Box<dyn Clock>,
}

impl Facilities {
    pub fn new(rng: StdRng, clock: Box<dyn Clock>) -> Self {
        Self { rng, clock }
    }

    /// Entropy-seeded randomness and the system clock.
    pub fn system() -> Self {
        Self::new(StdRng::from_entropy(), Box::new(SystemClock))
    }

    /// Fixed seed, caller-supplied clock. Rendering becomes reproducible.
    pub fn seeded(seed: u64, clock: impl Clock + 'static) -> Self {
        Self::new(StdRng::seed_from_u64(seed), Box::new(clock))
    }

    pub(crate) fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub(crate) fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now()
    }
}

/// Render `raw` according to `mode`.
pub fn render(mode: i32, raw: &[u8], facilities: &mut Facilities) -> Result<String, RenderError> {
    match Mode::try_from(mode)? {
        Mode::Passthrough => Ok(std::str::from_utf8(raw)?.to_string()),
        Mode::Templated => {
            let source = std::str::from_utf8(raw)?;
            Ok(template::render(source, facilities)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_facilities(seed: u64) -> Facilities {
        let at = FixedOffset::east_opt(3600)
            .and_then(|tz| tz.with_ymd_and_hms(2024, 3, 9, 14, 7, 30).single())
            .expect("valid timestamp");
        Facilities::seeded(seed, FixedClock(at))
    }

    #[test]
    fn passthrough_returns_text_verbatim() {
        let mut facilities = fixed_facilities(1);
        let text = "héllo {{ not evaluated }}\nsecond line";
        let out = render(0, text.as_bytes(), &mut facilities).expect("render");
        assert_eq!(out, text);
    }

    #[test]
    fn passthrough_rejects_invalid_utf8() {
        let mut facilities = fixed_facilities(1);
        let err = render(0, &[0x66, 0xff, 0xfe], &mut facilities).unwrap_err();
        assert!(matches!(err, RenderError::Decode(_)));
    }

    #[test]
    fn templated_evaluates_arithmetic() {
        let mut facilities = fixed_facilities(1);
        let out = render(1, b"Hello {{1+1}}", &mut facilities).expect("render");
        assert_eq!(out, "Hello 2");
    }

    #[test]
    fn templated_is_deterministic_with_fixed_facilities() {
        let template = b"{{ random(0, 1000) }} {{ random() }} {{ zpad(hour(), 2) }}:{{ zpad(minute(), 2) }}";
        let first = render(1, template, &mut fixed_facilities(99)).expect("render");
        let second = render(1, template, &mut fixed_facilities(99)).expect("render");
        assert_eq!(first, second);
        assert!(first.ends_with("14:07"));
    }

    #[test]
    fn templated_rejects_disallowed_capability() {
        let mut facilities = fixed_facilities(1);
        let err = render(1, b"{{ os.system('ls') }}", &mut facilities).unwrap_err();
        assert!(matches!(err, RenderError::Template(_)));
    }

    #[test]
    fn unknown_mode_is_reported() {
        let mut facilities = fixed_facilities(1);
        let err = render(7, b"text", &mut facilities).unwrap_err();
        assert_eq!(err, RenderError::UnknownMode(7));
    }
}
