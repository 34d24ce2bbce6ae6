use chatcast::buffer::{BufferError, MessageBuffer, BUFFER_CAPACITY};
use chatcast::render::template::{Builtin, Template};
use chatcast::render::{render, Facilities, FixedClock, RenderError};
use chrono::{FixedOffset, TimeZone};

fn fixed(seed: u64) -> Facilities {
    let at = FixedOffset::east_opt(-5 * 3600)
        .and_then(|tz| tz.with_ymd_and_hms(2025, 6, 1, 21, 45, 12).single())
        .expect("valid timestamp");
    Facilities::seeded(seed, FixedClock(at))
}

#[test]
fn hello_template_scenario() {
    let buffer = MessageBuffer::default();
    buffer.set(b"Hello {{1+1}}").expect("set");
    buffer.set_mode(1);

    let snapshot = buffer.snapshot();
    let out = render(snapshot.mode, &snapshot.content, &mut fixed(0)).expect("render");
    assert_eq!(out, "Hello 2");
}

#[test]
fn passthrough_round_trips_utf8() {
    let samples = [
        "",
        "plain",
        "♥ 120 BPM ♥",
        "multi\nline\n",
        "{{ braces are literal in passthrough }}",
    ];
    for sample in samples {
        let out = render(0, sample.as_bytes(), &mut fixed(0)).expect("render");
        assert_eq!(out, sample);
    }
}

#[test]
fn same_seed_and_clock_give_same_output() {
    let template = "{{ random() }}/{{ random(1, 6) }}/{{ now('%Y-%m-%d %H:%M') }}/{{ unix() }}";
    let first = render(1, template.as_bytes(), &mut fixed(1234)).expect("render");
    let second = render(1, template.as_bytes(), &mut fixed(1234)).expect("render");
    assert_eq!(first, second);
    assert!(first.contains("2025-06-01 21:45"));
}

#[test]
fn template_sandbox_has_no_host_access() {
    let attempts = [
        "{{ os.system('id') }}",
        "{{ open('/etc/passwd') }}",
        "{{ env('HOME') }}",
        "{{ __import__('os') }}",
        "{{ eval('1') }}",
    ];
    for attempt in attempts {
        let err = render(1, attempt.as_bytes(), &mut fixed(0)).unwrap_err();
        assert!(
            matches!(err, RenderError::Template(_)),
            "{attempt} should be rejected, got {err:?}"
        );
    }
}

#[test]
fn builtins_have_names_and_nest() {
    for builtin in Builtin::ALL {
        assert!(!builtin.name().is_empty());
    }
    assert!(Template::parse("{{ max(min(3, 4), abs(-2)) }}").is_ok());
}

#[test]
fn oversized_set_keeps_previous_content() {
    let buffer = MessageBuffer::default();
    buffer.set(b"previous").expect("set");
    let err = buffer.set(&vec![b'z'; BUFFER_CAPACITY + 100]).unwrap_err();
    assert!(matches!(err, BufferError::CapacityExceeded { .. }));
    assert_eq!(buffer.snapshot().content, b"previous");
}

#[test]
fn deeply_nested_template_is_rejected_not_fatal() {
    let parens = format!("{{{{{}1{}}}}}", "(".repeat(2045), ")".repeat(2045));
    let negations = format!("{{{{{}1}}}}", "-".repeat(4091));

    for template in [parens, negations] {
        let buffer = MessageBuffer::default();
        buffer.replace(template.as_bytes(), 1).expect("fits in buffer");
        let snapshot = buffer.snapshot();
        let err = render(snapshot.mode, &snapshot.content, &mut fixed(0)).unwrap_err();
        assert!(matches!(err, RenderError::Template(_)), "{err:?}");
    }
}
